//! Persisted search-settings configuration
//!
//! Search settings round-trip through a local JSON file. Reading reconciles
//! against the currently known source list; writing happens only on
//! explicit user edits (via [`SettingsPersistMiddleware`]), never from
//! coordinator reactions.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use cardstock_core::Middleware;
use serde::{Deserialize, Serialize};

use crate::action::AppAction;
use crate::model::SourceDescriptor;
use crate::state::SearchSettings;

/// On-disk payload.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedSettings {
    pub settings: SearchSettings,
}

/// Where search settings are persisted between sessions.
pub trait ConfigStore: Send + Sync + 'static {
    /// Read the persisted payload; `None` when absent or unreadable.
    fn load(&self) -> Option<PersistedSettings>;

    /// Write the payload.
    fn save(&self, settings: &PersistedSettings) -> io::Result<()>;
}

/// JSON file in the platform config directory.
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    /// Use an explicit file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The default location under the platform config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("cardstock").join("settings.json"))
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Option<PersistedSettings> {
        let raw = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(settings) => Some(settings),
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "ignoring unreadable settings file"
                );
                None
            }
        }
    }

    fn save(&self, settings: &PersistedSettings) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(settings).map_err(io::Error::other)?;
        fs::write(&self.path, raw)
    }
}

/// Reconcile persisted settings against the known source list.
///
/// Unknown source keys are pruned, newly known sources are appended
/// enabled (so fresh installs search everything), and inverted DPI bounds
/// are reordered.
pub fn load_settings<C: ConfigStore>(store: &C, known: &[SourceDescriptor]) -> SearchSettings {
    let mut settings = store
        .load()
        .map(|persisted| persisted.settings)
        .unwrap_or_default();
    settings
        .sources
        .retain(|key| known.iter().any(|source| &source.key == key));
    for source in known {
        if !settings.sources.contains(&source.key) {
            settings.sources.push(source.key.clone());
        }
    }
    if settings.min_dpi > settings.max_dpi {
        std::mem::swap(&mut settings.min_dpi, &mut settings.max_dpi);
    }
    settings
}

/// Persists settings on explicit user edits.
///
/// Watches the dispatch stream for state-changing [`AppAction::SettingsUpdate`]
/// and writes the new settings through the injected store. Loads
/// (`SettingsDidLoad`) pass by untouched.
pub struct SettingsPersistMiddleware<C> {
    store: Arc<C>,
}

impl<C: ConfigStore> SettingsPersistMiddleware<C> {
    pub fn new(store: Arc<C>) -> Self {
        Self { store }
    }
}

impl<C: ConfigStore> Middleware<AppAction> for SettingsPersistMiddleware<C> {
    fn before(&mut self, _action: &AppAction) {}

    fn after(&mut self, action: &AppAction, state_changed: bool) {
        if !state_changed {
            return;
        }
        if let AppAction::SettingsUpdate { settings } = action {
            let payload = PersistedSettings {
                settings: settings.clone(),
            };
            if let Err(err) = self.store.save(&payload) {
                tracing::error!(error = %err, "failed to persist search settings");
            }
        }
    }
}
