//! Persisted UI preferences.
//!
//! The only datum that survives across sessions is whether the user has
//! dismissed the welcome banner. It has no expiry.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::PreferencesError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub hide_welcome: bool,
}

/// Preferences plus the file they are persisted to.
///
/// A store without a path keeps everything in memory; used when no config
/// directory exists and in tests.
#[derive(Debug, Clone, Default)]
pub struct PreferenceStore {
    path: Option<PathBuf>,
    prefs: Preferences,
}

impl PreferenceStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load preferences from `path`. A missing file yields defaults.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, PreferencesError> {
        let path = path.into();
        let prefs = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| PreferencesError::MalformedJson {
                path: path.clone(),
                message: e.to_string(),
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Preferences::default(),
            Err(e) => return Err(PreferencesError::io(path, e)),
        };
        Ok(Self {
            path: Some(path),
            prefs,
        })
    }

    /// Like [`load`](Self::load), but a broken file is logged and replaced
    /// by defaults on the next save.
    pub fn load_or_default(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match Self::load(&path) {
            Ok(store) => store,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable preferences");
                Self {
                    path: Some(path),
                    prefs: Preferences::default(),
                }
            }
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn preferences(&self) -> Preferences {
        self.prefs
    }

    pub fn hide_welcome(&self) -> bool {
        self.prefs.hide_welcome
    }

    /// Set the welcome flag and write it through.
    pub fn set_hide_welcome(&mut self, hide: bool) -> Result<(), PreferencesError> {
        self.prefs.hide_welcome = hide;
        self.save()
    }

    fn save(&self) -> Result<(), PreferencesError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PreferencesError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(&self.prefs).map_err(|e| {
            PreferencesError::MalformedJson {
                path: path.clone(),
                message: e.to_string(),
            }
        })?;
        std::fs::write(path, json).map_err(|e| PreferencesError::io(path, e))?;
        tracing::debug!(path = %path.display(), "preferences saved");
        Ok(())
    }
}
