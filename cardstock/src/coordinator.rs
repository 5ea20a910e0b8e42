//! The Reactive Coordinator: cross-store consistency rules
//!
//! Each rule is an independent listener: a trigger over the dispatch
//! stream plus an async reaction that reads current state and dispatches
//! compensating transitions. Rules never call each other; cascades happen
//! through the dispatch loop (a reaction's action may match another
//! rule's trigger). Reactions re-read state after every await and never
//! retry a failed fetch: failures land in the notification store and the
//! dependent reactions simply do not fire.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use cardstock_core::{ListenerRegistry, TaskManager};
use tokio::sync::Mutex;
use tracing::warn;

use crate::action::AppAction;
use crate::backend::{Backend, BackendError, CARDS_PAGE_SIZE};
use crate::config::{load_settings, ConfigStore};
use crate::model::{Face, SearchQuery};
use crate::selectors;
use crate::state::{AppState, SearchSettings};

/// How long a query-edit reaction waits for its results before giving up.
pub const SEARCH_WAIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Notification ids for fetch failures; repeats replace.
pub const FETCH_SOURCES: &str = "fetch-sources";
pub const FETCH_SEARCH_RESULTS: &str = "fetch-search-results";
pub const FETCH_CARDS: &str = "fetch-cards";
pub const FETCH_CARDBACKS: &str = "fetch-cardbacks";

type SharedTasks = Arc<Mutex<TaskManager<AppAction>>>;

/// Register every coordinator rule.
pub fn register<B, C>(
    registry: &mut ListenerRegistry<AppState, AppAction>,
    backend: Arc<B>,
    config: Arc<C>,
    tasks: SharedTasks,
) where
    B: Backend,
    C: ConfigStore,
{
    // Backend configured: learn which sources exist.
    let fetch_backend = backend.clone();
    let fetch_tasks = tasks.clone();
    registry.on(
        "fetch-sources",
        |action, changed, _state| changed && matches!(action, AppAction::BackendConfigure { .. }),
        move |_action, _ctx| {
            let backend = fetch_backend.clone();
            let tasks = fetch_tasks.clone();
            async move {
                tasks.lock().await.spawn("sources", async move {
                    match backend.sources().await {
                        Ok(sources) => AppAction::SourcesDidLoad { sources },
                        Err(err) => fetch_error(FETCH_SOURCES, "Failed to fetch sources", err),
                    }
                });
            }
        },
    );

    // Source list known: restore persisted settings scoped to it.
    let load_config = config.clone();
    registry.on(
        "load-settings",
        |action, _changed, _state| matches!(action, AppAction::SourcesDidLoad { .. }),
        move |_action, ctx| {
            let config = load_config.clone();
            async move {
                let known = ctx.with(|s: &AppState| s.sources.sources.clone()).await;
                let settings = load_settings(config.as_ref(), &known);
                ctx.dispatch(AppAction::SettingsDidLoad { settings });
            }
        },
    );

    // Backend configured or cleared: previously cached results are for the
    // wrong backend now.
    registry.on(
        "invalidate-caches",
        |action, changed, _state| {
            changed
                && matches!(
                    action,
                    AppAction::BackendConfigure { .. } | AppAction::BackendClear
                )
        },
        |_action, ctx| async move {
            ctx.dispatch(AppAction::CachesClear);
        },
    );

    // Settings actually changed: restart the caches from scratch.
    registry.on(
        "settings-changed",
        |action, changed, _state| {
            changed
                && matches!(
                    action,
                    AppAction::SettingsDidLoad { .. } | AppAction::SettingsUpdate { .. }
                )
        },
        |_action, ctx| async move {
            let ready = ctx
                .with(|s: &AppState| s.backend.configured() && selectors::enabled_sources_valid(s))
                .await;
            if ready {
                ctx.dispatch(AppAction::CachesClear);
            }
        },
    );

    // Caches restarted: re-fetch everything the project references. The
    // snapshot is taken after the clear landed, so the fetches carry the
    // new generation and a straggler from before the clear gets dropped.
    let refetch_backend = backend.clone();
    let refetch_tasks = tasks.clone();
    registry.on(
        "refetch-after-clear",
        |action, changed, _state| changed && matches!(action, AppAction::CachesClear),
        move |_action, ctx| {
            let backend = refetch_backend.clone();
            let tasks = refetch_tasks.clone();
            async move {
                let (ready, settings, queries, generation) = ctx
                    .with(|s: &AppState| {
                        (
                            s.backend.configured()
                                && s.settings.loaded
                                && selectors::enabled_sources_valid(s),
                            s.settings.settings.clone(),
                            s.project.queries().into_iter().collect::<Vec<_>>(),
                            s.search.generation,
                        )
                    })
                    .await;
                if !ready {
                    return;
                }
                spawn_cardbacks_fetch(&tasks, backend.clone(), settings.clone()).await;
                if !queries.is_empty() {
                    spawn_search_fetch(&tasks, backend, settings, queries, generation).await;
                }
            }
        },
    );

    // The project now references queries it didn't before: fetch the ones
    // not already cached.
    let new_backend = backend.clone();
    let new_tasks = tasks.clone();
    registry.on(
        "fetch-new-queries",
        |action, changed, _state| {
            changed
                && matches!(
                    action,
                    AppAction::ProjectAddSlots { .. } | AppAction::ProjectSetQuery { .. }
                )
        },
        move |_action, ctx| {
            let backend = new_backend.clone();
            let tasks = new_tasks.clone();
            async move {
                let (ready, settings, missing, generation) = ctx
                    .with(|s: &AppState| {
                        let missing: Vec<SearchQuery> = s
                            .project
                            .queries()
                            .into_iter()
                            .filter(|q| !s.search.contains(q))
                            .collect();
                        (
                            s.backend.configured()
                                && s.settings.loaded
                                && selectors::enabled_sources_valid(s),
                            s.settings.settings.clone(),
                            missing,
                            s.search.generation,
                        )
                    })
                    .await;
                if !ready || missing.is_empty() {
                    return;
                }
                spawn_search_fetch(&tasks, backend, settings, missing, generation).await;
            }
        },
    );

    // Cardback list refetched: keep the project cardback valid, defaulting
    // to the top-ranked entry. Dispatches only when the value changes.
    registry.on(
        "default-cardback",
        |action, _changed, _state| matches!(action, AppAction::CardbacksDidLoad { .. }),
        |_action, ctx| async move {
            let (current, desired) = ctx
                .with(|s: &AppState| {
                    let current = s.project.cardback.clone();
                    let desired = match current.as_deref() {
                        Some(cardback) if s.cardbacks.contains(cardback) => current.clone(),
                        _ => s.cardbacks.first().map(str::to_string),
                    };
                    (current, desired)
                })
                .await;
            if desired != current {
                ctx.dispatch(AppAction::ProjectSetCardback { cardback: desired });
            }
        },
    );

    // The user edited a query: drop any stale warning for that face, wait
    // for the results to land, then pick a default image.
    registry.on(
        "query-edited",
        |action, changed, _state| changed && matches!(action, AppAction::ProjectSetQuery { .. }),
        |action, ctx| async move {
            let AppAction::ProjectSetQuery { slot, face, query } = action else {
                return;
            };
            // Explicit user intent supersedes any prior warning.
            ctx.dispatch(AppAction::InvalidClear { slot, face });

            let awaited = query.clone();
            if ctx
                .wait_for(
                    move |s: &AppState| s.search.contains(&awaited),
                    SEARCH_WAIT_TIMEOUT,
                )
                .await
                .is_err()
            {
                warn!(
                    slot,
                    face = ?face,
                    query = %query,
                    "timed out waiting for search results, leaving selection unchanged"
                );
                return;
            }

            // Read-after-await: the member may have been edited again while
            // the results were in flight.
            let selection = ctx
                .with(|s: &AppState| {
                    let member = s.project.member(slot, face)?;
                    if member.query.as_ref() != Some(&query) {
                        return None;
                    }
                    Some(
                        s.search
                            .get(&query)
                            .and_then(|results| results.first().cloned()),
                    )
                })
                .await;
            if let Some(image) = selection {
                ctx.dispatch(AppAction::ProjectSetSelectedImages {
                    targets: vec![(slot, face)],
                    image,
                });
            }
        },
    );

    // Fresh results landed: reconcile every member that draws from them.
    registry.on(
        "apply-results",
        |action, changed, _state| {
            changed && matches!(action, AppAction::SearchResultsDidLoad { .. })
        },
        |action, ctx| async move {
            let AppAction::SearchResultsDidLoad { results, .. } = action else {
                return;
            };
            let updated: HashSet<SearchQuery> = results
                .into_iter()
                .flat_map(|(query, by_type)| {
                    by_type.into_keys().map(move |card_type| SearchQuery {
                        query: query.clone(),
                        card_type,
                    })
                })
                .collect();

            let (invalids, clears, selects) = ctx
                .with(|s: &AppState| {
                    let mut invalids = Vec::new();
                    let mut clears: Vec<(usize, Face)> = Vec::new();
                    let mut selects: BTreeMap<String, Vec<(usize, Face)>> = BTreeMap::new();
                    for (index, slot) in s.project.slots.iter().enumerate() {
                        for face in Face::both() {
                            let Some(member) = slot.member(face) else {
                                continue;
                            };
                            let Some(query) = member.query.as_ref() else {
                                continue;
                            };
                            if !updated.contains(query) {
                                continue;
                            }
                            let results = s.search.get(query).unwrap_or(&[]);
                            match member.selected_image.as_deref() {
                                Some(image) if !results.iter().any(|r| r == image) => {
                                    // Warn only when there was something to
                                    // pick instead; an empty result list is
                                    // its own signal.
                                    if !results.is_empty() {
                                        invalids.push((
                                            index,
                                            face,
                                            query.clone(),
                                            image.to_string(),
                                        ));
                                    }
                                    clears.push((index, face));
                                }
                                None => {
                                    if let Some(first) = results.first() {
                                        selects
                                            .entry(first.clone())
                                            .or_default()
                                            .push((index, face));
                                    }
                                }
                                _ => {}
                            }
                        }
                    }
                    (invalids, clears, selects)
                })
                .await;

            for (slot, face, query, identifier) in invalids {
                ctx.dispatch(AppAction::InvalidRecord {
                    slot,
                    face,
                    query,
                    identifier,
                });
            }
            if !clears.is_empty() {
                ctx.dispatch(AppAction::ProjectSetSelectedImages {
                    targets: clears,
                    image: None,
                });
            }
            for (image, targets) in selects {
                ctx.dispatch(AppAction::ProjectSetSelectedImages {
                    targets,
                    image: Some(image),
                });
            }
        },
    );

    // Results or cardbacks landed: fill the metadata cache for any
    // identifiers we have not seen yet.
    let docs_backend = backend;
    let docs_tasks = tasks;
    registry.on(
        "fetch-card-documents",
        |action, changed, _state| {
            changed
                && matches!(
                    action,
                    AppAction::SearchResultsDidLoad { .. } | AppAction::CardbacksDidLoad { .. }
                )
        },
        move |_action, ctx| {
            let backend = docs_backend.clone();
            let tasks = docs_tasks.clone();
            async move {
                let missing = ctx.with(selectors::missing_card_documents).await;
                if missing.is_empty() {
                    return;
                }
                for chunk in missing.chunks(CARDS_PAGE_SIZE) {
                    let identifiers = chunk.to_vec();
                    let key = format!("cards:{}", identifiers[0]);
                    let backend = backend.clone();
                    tasks.lock().await.spawn(key, async move {
                        match backend.cards(&identifiers).await {
                            Ok(cards) => AppAction::CardDocumentsDidLoad { cards },
                            Err(err) => {
                                fetch_error(FETCH_CARDS, "Failed to fetch card data", err)
                            }
                        }
                    });
                }
            }
        },
    );
}

async fn spawn_search_fetch<B: Backend>(
    tasks: &Mutex<TaskManager<AppAction>>,
    backend: Arc<B>,
    settings: SearchSettings,
    queries: Vec<SearchQuery>,
    generation: u64,
) {
    let key = search_task_key(generation, &queries);
    tasks.lock().await.spawn(key, async move {
        match backend.search_results(&settings, &queries).await {
            Ok(results) => AppAction::SearchResultsDidLoad {
                generation,
                results,
            },
            Err(err) => fetch_error(
                FETCH_SEARCH_RESULTS,
                "Failed to fetch search results",
                err,
            ),
        }
    });
}

async fn spawn_cardbacks_fetch<B: Backend>(
    tasks: &Mutex<TaskManager<AppAction>>,
    backend: Arc<B>,
    settings: SearchSettings,
) {
    tasks.lock().await.spawn("cardbacks", async move {
        match backend.cardbacks(&settings).await {
            Ok(cardbacks) => AppAction::CardbacksDidLoad { cardbacks },
            Err(err) => fetch_error(FETCH_CARDBACKS, "Failed to fetch cardbacks", err),
        }
    });
}

/// Identical fetch batches replace each other; distinct batches coexist.
fn search_task_key(generation: u64, queries: &[SearchQuery]) -> String {
    let mut parts: Vec<String> = queries.iter().map(ToString::to_string).collect();
    parts.sort();
    format!("search:{generation}:{}", parts.join("|"))
}

fn fetch_error(id: &str, name: &str, err: BackendError) -> AppAction {
    tracing::error!(id, error = %err, "backend fetch failed");
    AppAction::ErrorReport {
        id: id.to_string(),
        name: name.to_string(),
        message: Some(err.to_string()),
    }
}
