//! Settings discovery and persistence
//!
//! The provider configuration is the only durable state the assistant
//! keeps. It lives in a JSON settings file (the desktop counterpart of the
//! web editor's local storage) found through a discovery hierarchy:
//! 1. Current directory: ./.dca/settings.json
//! 2. User settings: ~/.dca/settings.json
//!
//! Absence is not an error: with no settings, AI features are disabled and
//! the factory hands back no provider. Saving always replaces the file
//! wholesale; the configuration is never partially mutated.

use crate::env;
use crate::llm::ProviderConfig;
use std::env as std_env;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

/// Settings discovery system
pub struct SettingsStore;

impl SettingsStore {
    /// Discover and load the provider configuration, `None` when no
    /// settings file exists anywhere in the hierarchy.
    pub fn load() -> anyhow::Result<Option<ProviderConfig>> {
        let Some(path) = Self::find_settings_file() else {
            info!("no settings file found, AI features disabled");
            return Ok(None);
        };
        info!("loading settings from: {:?}", path);
        let content = fs::read_to_string(&path)?;
        let config: ProviderConfig = serde_json::from_str(&content)?;
        Ok(Some(config))
    }

    /// Save `config`, replacing any previous settings wholesale. Writes to
    /// the discovered location, or creates the user settings file when
    /// nothing exists yet.
    pub fn save(config: &ProviderConfig) -> anyhow::Result<PathBuf> {
        let path = Self::find_settings_file()
            .map(Ok)
            .unwrap_or_else(Self::default_settings_path)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(config)?;
        fs::write(&path, content)?;
        info!("saved settings to: {:?}", path);
        Ok(path)
    }

    /// Find the settings file using the discovery hierarchy.
    pub fn find_settings_file() -> Option<PathBuf> {
        for candidate in Self::get_settings_candidates() {
            debug!("checking for settings file: {:?}", candidate);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        None
    }

    /// Candidate settings paths in priority order.
    fn get_settings_candidates() -> Vec<PathBuf> {
        let mut candidates = Vec::new();

        if let Ok(current_dir) = std_env::current_dir() {
            candidates.push(env::local_settings_file_path(&current_dir));
        }
        if let Some(home_dir) = Self::get_home_dir() {
            candidates.push(env::user_settings_file_path(&home_dir));
        }

        candidates
    }

    fn default_settings_path() -> anyhow::Result<PathBuf> {
        let home = Self::get_home_dir()
            .ok_or_else(|| anyhow::anyhow!("could not determine home directory"))?;
        Ok(env::user_settings_file_path(&home))
    }

    fn get_home_dir() -> Option<PathBuf> {
        std_env::var("HOME")
            .ok()
            .or_else(|| std_env::var("USERPROFILE").ok())
            .map(PathBuf::from)
    }

    /// Show settings discovery information for debugging.
    pub fn show_discovery_info() {
        println!("Settings Discovery Hierarchy:");
        println!();

        let candidates = Self::get_settings_candidates();
        for (i, candidate) in candidates.iter().enumerate() {
            let status = if candidate.is_file() {
                "EXISTS"
            } else {
                "NOT FOUND"
            };
            println!("  {}. {:?} - {}", i + 1, candidate, status);
        }

        println!();
        match Self::find_settings_file() {
            Some(found) => println!("Active settings: {:?}", found),
            None => println!("Active settings: none (AI features disabled)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn settings_round_trip_through_a_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");

        let config = ProviderConfig::OpenAiCompatible {
            model: "llama3".into(),
            base_url: "http://localhost:11434/v1".into(),
            api_key: None,
            origin: None,
        };

        fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
        let loaded: ProviderConfig =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn web_storage_payload_loads_unchanged() {
        // Settings written by the web editor must load as-is.
        let stored = r#"{"provider":"gemini","model":"gemini-2.5-flash","apiKey":"abc"}"#;
        let config: ProviderConfig = serde_json::from_str(stored).unwrap();
        assert_eq!(config.provider_name(), "gemini");
        assert_eq!(config.model(), "gemini-2.5-flash");
    }

    #[test]
    fn candidates_prefer_the_local_directory() {
        let candidates = SettingsStore::get_settings_candidates();
        assert!(!candidates.is_empty());
        assert!(candidates[0].ends_with(".dca/settings.json"));
    }
}
