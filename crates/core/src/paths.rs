//! Centralized path functions for app storage locations.

use std::path::PathBuf;

/// App config root: `~/Library/Application Support/demetsiiify/` (macOS) or
/// `~/.config/demetsiiify/` (Linux).
pub fn app_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("demetsiiify"))
}

/// Persisted UI preferences: `<app_config_dir>/preferences.json`.
pub fn preferences_path() -> Option<PathBuf> {
    app_config_dir().map(|d| d.join("preferences.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preferences_path() {
        // Not every CI sandbox has a config dir.
        if let Some(path) = preferences_path() {
            assert!(path.to_string_lossy().contains("demetsiiify"));
            assert!(path.to_string_lossy().ends_with("preferences.json"));
        }
    }
}
