//! End-to-end coordinator scenarios against the in-memory backend

use std::sync::Arc;
use std::time::Duration;

use cardstock::testing::{source, MemoryConfigStore, MockBackend};
use cardstock::{coordinator, reducer, AppAction, AppState, Engine, Face, SearchQuery};
use cardstock_core::{eventually, ListenerRuntime, RecordingMiddleware, TaskManager};
use tokio::sync::Mutex;

const TIMEOUT: Duration = Duration::from_secs(5);

async fn backend_with_defaults() -> Arc<MockBackend> {
    let backend = Arc::new(MockBackend::new());
    backend.set_sources(vec![source("drive-a", 1)]).await;
    backend
        .set_cardbacks(vec!["back-a".into(), "back-b".into()])
        .await;
    backend
}

async fn started_engine(backend: Arc<MockBackend>) -> Engine {
    let engine = Engine::start(backend, Arc::new(MemoryConfigStore::default()));
    engine.configure_backend("http://localhost:8000");
    engine
        .wait_until(|s| s.settings.loaded, TIMEOUT)
        .await
        .expect("settings loaded after connect");
    engine
}

fn front_image(state: &AppState, slot: usize) -> Option<String> {
    state
        .project
        .member(slot, Face::Front)
        .and_then(|m| m.selected_image.clone())
}

#[tokio::test]
async fn import_autoselects_first_result_for_every_copy() {
    let backend = backend_with_defaults().await;
    backend
        .set_results(
            SearchQuery::card("my search query"),
            vec!["r1".into(), "r2".into(), "r3".into()],
        )
        .await;
    let engine = started_engine(backend).await;

    engine.import_text("2x my search query");

    engine
        .wait_until(
            |s| {
                s.project.len() == 2
                    && front_image(s, 0).as_deref() == Some("r1")
                    && front_image(s, 1).as_deref() == Some("r1")
            },
            TIMEOUT,
        )
        .await
        .expect("both fronts picked the top result");

    engine.shutdown().await;
}

#[tokio::test]
async fn navigation_cycles_one_slot_without_touching_its_twin() {
    let backend = backend_with_defaults().await;
    backend
        .set_results(
            SearchQuery::card("my search query"),
            vec!["r1".into(), "r2".into(), "r3".into()],
        )
        .await;
    let engine = started_engine(backend).await;

    engine.import_text("2x my search query");
    engine
        .wait_until(|s| front_image(s, 0).as_deref() == Some("r1"), TIMEOUT)
        .await
        .expect("autoselect");

    engine.next_image(0, Face::Front).await;
    engine
        .wait_until(|s| front_image(s, 0).as_deref() == Some("r2"), TIMEOUT)
        .await
        .expect("next");

    // Wrap backwards past the start.
    engine.previous_image(0, Face::Front).await;
    engine
        .wait_until(|s| front_image(s, 0).as_deref() == Some("r1"), TIMEOUT)
        .await
        .expect("previous");
    engine.previous_image(0, Face::Front).await;
    engine
        .wait_until(|s| front_image(s, 0).as_deref() == Some("r3"), TIMEOUT)
        .await
        .expect("previous wraps");

    // The sibling slot never moved.
    engine
        .state(|s| assert_eq!(front_image(s, 1).as_deref(), Some("r1")))
        .await;

    engine.shutdown().await;
}

#[tokio::test]
async fn back_faces_follow_the_default_cardback() {
    let backend = backend_with_defaults().await;
    backend
        .set_results(SearchQuery::card("island"), vec!["i1".into()])
        .await;
    let engine = started_engine(backend).await;

    engine.import_text("1 island");

    engine
        .wait_until(
            |s| {
                s.project.cardback.as_deref() == Some("back-a")
                    && s.project
                        .member(0, Face::Back)
                        .and_then(|m| m.selected_image.as_deref())
                        == Some("back-a")
            },
            TIMEOUT,
        )
        .await
        .expect("unqueried back tracks the project cardback");

    engine.shutdown().await;
}

#[tokio::test]
async fn cardback_rotates_to_first_remaining_valid_entry() {
    let backend = backend_with_defaults().await;
    let engine = started_engine(backend.clone()).await;

    engine
        .wait_until(|s| s.project.cardback.as_deref() == Some("back-a"), TIMEOUT)
        .await
        .expect("initial cardback");

    // The list changes from [back-a, back-b] to [back-b, back-c] while
    // back-a is selected: the new cardback is back-b, not None.
    backend
        .set_cardbacks(vec!["back-b".into(), "back-c".into()])
        .await;
    let mut settings = engine.state(|s| s.settings.settings.clone()).await;
    settings.fuzzy_search = true;
    engine.update_settings(settings);

    engine
        .wait_until(|s| s.project.cardback.as_deref() == Some("back-b"), TIMEOUT)
        .await
        .expect("first remaining valid cardback selected");

    engine.shutdown().await;
}

#[tokio::test]
async fn vanished_selection_is_recorded_and_cleared() {
    let backend = backend_with_defaults().await;
    backend
        .set_results(SearchQuery::card("island"), vec!["x".into(), "y".into()])
        .await;
    let engine = started_engine(backend.clone()).await;

    engine.import_text("1 island");
    engine
        .wait_until(|s| front_image(s, 0).as_deref() == Some("x"), TIMEOUT)
        .await
        .expect("autoselect");

    // A re-search no longer contains the selection.
    backend
        .set_results(SearchQuery::card("island"), vec!["y".into(), "z".into()])
        .await;
    let mut settings = engine.state(|s| s.settings.settings.clone()).await;
    settings.min_dpi = 300;
    engine.update_settings(settings);

    engine
        .wait_until(
            |s| {
                s.invalid
                    .get(0, Face::Front)
                    .is_some_and(|r| r.identifier == "x")
                    && front_image(s, 0).is_none()
            },
            TIMEOUT,
        )
        .await
        .expect("invalid record created, selection cleared");

    engine.shutdown().await;
}

#[tokio::test]
async fn query_edit_clears_warning_and_selects_first_result() {
    let backend = backend_with_defaults().await;
    backend
        .set_results(SearchQuery::card("island"), vec!["x".into()])
        .await;
    backend
        .set_results(SearchQuery::card("swamp"), vec!["s1".into(), "s2".into()])
        .await;
    let engine = started_engine(backend.clone()).await;

    engine.import_text("1 island");
    engine
        .wait_until(|s| front_image(s, 0).as_deref() == Some("x"), TIMEOUT)
        .await
        .expect("autoselect");

    // Seed a warning, then edit the query: the warning dies with the edit.
    engine.dispatch(AppAction::InvalidRecord {
        slot: 0,
        face: Face::Front,
        query: SearchQuery::card("island"),
        identifier: "x".into(),
    });
    engine.set_query(0, Face::Front, SearchQuery::card("swamp"));

    engine
        .wait_until(
            |s| {
                s.invalid.is_empty()
                    && s.project
                        .member(0, Face::Front)
                        .and_then(|m| m.query.clone())
                        == Some(SearchQuery::card("swamp"))
                    && front_image(s, 0).as_deref() == Some("s1")
            },
            TIMEOUT,
        )
        .await
        .expect("warning cleared and first result selected");

    engine.shutdown().await;
}

#[tokio::test]
async fn query_edit_with_no_results_clears_the_selection() {
    let backend = backend_with_defaults().await;
    backend
        .set_results(SearchQuery::card("island"), vec!["x".into()])
        .await;
    let engine = started_engine(backend).await;

    engine.import_text("1 island");
    engine
        .wait_until(|s| front_image(s, 0).as_deref() == Some("x"), TIMEOUT)
        .await
        .expect("autoselect");

    // The mock returns an empty hit list for unknown queries.
    engine.set_query(0, Face::Front, SearchQuery::card("no such card"));

    engine
        .wait_until(
            |s| {
                s.search.contains(&SearchQuery::card("no such card"))
                    && front_image(s, 0).is_none()
            },
            TIMEOUT,
        )
        .await
        .expect("empty results clear the selection");

    engine.shutdown().await;
}

#[tokio::test]
async fn settings_change_refetches_without_stale_entries() {
    let backend = backend_with_defaults().await;
    backend
        .set_results(SearchQuery::card("island"), vec!["old-1".into()])
        .await;
    backend
        .set_results(SearchQuery::card("swamp"), vec!["sw-1".into()])
        .await;
    let engine = started_engine(backend.clone()).await;

    engine.import_text("1 island\n1 swamp");
    engine
        .wait_until(
            |s| {
                s.search.contains(&SearchQuery::card("island"))
                    && s.search.contains(&SearchQuery::card("swamp"))
            },
            TIMEOUT,
        )
        .await
        .expect("initial results cached");

    let calls_before = backend.search_calls().await;
    backend
        .set_results(SearchQuery::card("island"), vec!["new-1".into()])
        .await;

    let mut settings = engine.state(|s| s.settings.settings.clone()).await;
    settings.fuzzy_search = true;
    engine.update_settings(settings);

    engine
        .wait_until(
            |s| {
                s.search.get(&SearchQuery::card("island"))
                    == Some(["new-1".to_string()].as_slice())
                    && s.search.contains(&SearchQuery::card("swamp"))
            },
            TIMEOUT,
        )
        .await
        .expect("every referenced query refetched, no stale hits");

    assert!(backend.search_calls().await > calls_before);

    engine.shutdown().await;
}

#[tokio::test]
async fn bulk_change_version_updates_all_targets() {
    let backend = backend_with_defaults().await;
    backend
        .set_results(
            SearchQuery::card("island"),
            vec!["r1".into(), "r2".into(), "r3".into()],
        )
        .await;
    let engine = started_engine(backend).await;

    engine.import_text("2x island");
    engine
        .wait_until(
            |s| front_image(s, 0).is_some() && front_image(s, 1).is_some(),
            TIMEOUT,
        )
        .await
        .expect("autoselect");

    engine.set_selected_images(vec![(0, Face::Front), (1, Face::Front)], Some("r3".into()));

    engine
        .wait_until(
            |s| {
                front_image(s, 0).as_deref() == Some("r3")
                    && front_image(s, 1).as_deref() == Some("r3")
            },
            TIMEOUT,
        )
        .await
        .expect("both members changed in one transaction");

    engine.shutdown().await;
}

#[tokio::test]
async fn deleting_a_slot_renumbers_the_rest_and_their_warnings() {
    let backend = backend_with_defaults().await;
    backend
        .set_results(SearchQuery::card("island"), vec!["i1".into()])
        .await;
    backend
        .set_results(SearchQuery::card("swamp"), vec!["s1".into()])
        .await;
    backend
        .set_results(SearchQuery::card("forest"), vec!["f1".into()])
        .await;
    let engine = started_engine(backend).await;

    engine.import_text("1 island\n1 swamp\n1 forest");
    engine
        .wait_until(
            |s| (0..3).all(|slot| front_image(s, slot).is_some()),
            TIMEOUT,
        )
        .await
        .expect("autoselect");

    engine.dispatch(AppAction::InvalidRecord {
        slot: 2,
        face: Face::Front,
        query: SearchQuery::card("forest"),
        identifier: "gone".into(),
    });
    engine
        .wait_until(|s| s.invalid.get(2, Face::Front).is_some(), TIMEOUT)
        .await
        .expect("warning recorded");

    engine.delete_slots(vec![0]);

    engine
        .wait_until(
            |s| {
                s.project.len() == 2
                    && front_image(s, 0).as_deref() == Some("s1")
                    && front_image(s, 1).as_deref() == Some("f1")
                    && s.invalid.get(1, Face::Front).is_some()
                    && s.invalid.get(2, Face::Front).is_none()
            },
            TIMEOUT,
        )
        .await
        .expect("slots and warnings renumbered together");

    engine.shutdown().await;
}

#[tokio::test]
async fn clearing_a_back_query_reverts_to_the_project_cardback() {
    let backend = backend_with_defaults().await;
    backend
        .set_results(SearchQuery::card("island"), vec!["i1".into()])
        .await;
    backend
        .set_results(SearchQuery::card("custom back"), vec!["cb1".into()])
        .await;
    let engine = started_engine(backend).await;

    engine.import_text("1 island");
    engine
        .wait_until(|s| s.project.cardback.as_deref() == Some("back-a"), TIMEOUT)
        .await
        .expect("default cardback");

    engine.set_query(0, Face::Back, SearchQuery::card("custom back"));
    engine
        .wait_until(
            |s| {
                s.project
                    .member(0, Face::Back)
                    .and_then(|m| m.selected_image.as_deref())
                    == Some("cb1")
            },
            TIMEOUT,
        )
        .await
        .expect("explicit back query selected its first result");

    engine.clear_queries(vec![(0, Face::Back)]);

    engine
        .wait_until(
            |s| {
                let back = s.project.member(0, Face::Back);
                back.is_some_and(|m| {
                    m.query.is_none() && m.selected_image.as_deref() == Some("back-a")
                })
            },
            TIMEOUT,
        )
        .await
        .expect("cleared back reverts to the project cardback");

    engine.shutdown().await;
}

#[tokio::test]
async fn card_documents_are_fetched_for_new_identifiers() {
    let backend = backend_with_defaults().await;
    backend
        .set_results(SearchQuery::card("island"), vec!["i1".into(), "i2".into()])
        .await;
    let engine = started_engine(backend).await;

    engine.import_text("1 island");

    engine
        .wait_until(
            |s| {
                s.cards.contains("i1")
                    && s.cards.contains("i2")
                    && s.cards.contains("back-a")
                    && s.cards.contains("back-b")
            },
            TIMEOUT,
        )
        .await
        .expect("metadata cached for results and cardbacks");

    engine.shutdown().await;
}

#[tokio::test]
async fn clearing_the_backend_invalidates_caches() {
    let backend = backend_with_defaults().await;
    backend
        .set_results(SearchQuery::card("island"), vec!["i1".into()])
        .await;
    let engine = started_engine(backend).await;

    engine.import_text("1 island");
    // Let every fetch chain settle first, so no straggler repopulates the
    // caches after the clear.
    engine
        .wait_until(
            |s| {
                s.search.contains(&SearchQuery::card("island"))
                    && s.cards.contains("i1")
                    && s.cards.contains("back-a")
                    && s.cards.contains("back-b")
                    && s.project.cardback.is_some()
            },
            TIMEOUT,
        )
        .await
        .expect("results cached");

    engine.clear_backend();

    engine
        .wait_until(
            |s| {
                !s.backend.configured()
                    && s.search.results.is_empty()
                    && s.cardbacks.cardbacks.is_empty()
                    && s.cards.cards.is_empty()
            },
            TIMEOUT,
        )
        .await
        .expect("caches dropped with the connection");

    engine.shutdown().await;
}

#[tokio::test]
async fn fetch_failure_reports_one_keyed_notification() {
    let backend = Arc::new(MockBackend::new());
    backend.fail("sources").await;
    let engine = Engine::start(backend.clone(), Arc::new(MemoryConfigStore::default()));

    engine.configure_backend("http://localhost:8000");
    engine
        .wait_until(|s| s.notifications.get("fetch-sources").is_some(), TIMEOUT)
        .await
        .expect("failure surfaced as a notification");

    // A repeated failure replaces the notification instead of stacking.
    engine.configure_backend("http://other:8000");
    tokio::time::sleep(Duration::from_millis(100)).await;
    engine
        .state(|s| {
            assert_eq!(s.notifications.errors.len(), 1);
            assert!(s.sources.sources.is_empty());
        })
        .await;

    // Recovery: the next connect succeeds and loads settings.
    backend.succeed("sources").await;
    backend.set_sources(vec![source("drive-a", 1)]).await;
    engine.configure_backend("http://localhost:8000");
    engine
        .wait_until(|s| s.settings.loaded, TIMEOUT)
        .await
        .expect("recovered after the endpoint came back");

    engine.shutdown().await;
}

#[tokio::test]
async fn cardback_rule_dispatches_only_on_actual_change() {
    let recorder = RecordingMiddleware::new();
    let mut runtime =
        ListenerRuntime::with_middleware(AppState::default(), reducer, recorder.clone());

    let backend = Arc::new(MockBackend::new());
    let config = Arc::new(MemoryConfigStore::default());
    let tasks = Arc::new(Mutex::new(TaskManager::new(runtime.dispatcher())));
    coordinator::register(runtime.listeners(), backend, config, tasks);

    let handle = runtime.handle();
    let dispatcher = runtime.dispatcher();
    let cancel = runtime.cancellation_token();
    let loop_task = tokio::spawn(runtime.run());

    dispatcher.dispatch(AppAction::CardbacksDidLoad {
        cardbacks: vec!["back-a".into(), "back-b".into()],
    });
    eventually(&handle, TIMEOUT, |s: &AppState| {
        s.project.cardback.as_deref() == Some("back-a")
    })
    .await;

    // The same list again: the rule runs but must stay quiet.
    dispatcher.dispatch(AppAction::CardbacksDidLoad {
        cardbacks: vec!["back-a".into(), "back-b".into()],
    });
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(recorder.count("ProjectSetCardback"), 1);

    cancel.cancel();
    loop_task.await.expect("loop exits");
}
