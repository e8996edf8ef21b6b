//! Runtime settings
//!
//! Read from an optional JSON file. Missing or malformed files fall back to
//! the defaults so a game can always start.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::consts::{EVENT_QUEUE_CAPACITY, TICK_HZ};

/// Phrase list read when no path is given
pub const DEFAULT_PHRASE_FILE: &str = "MasterPhrases.txt";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Fixed RNG seed; a fresh one is drawn when absent
    pub seed: Option<u64>,
    /// One phrase per line, one wave per phrase
    pub phrase_file: PathBuf,
    /// Simulation steps per second
    pub tick_hz: u32,
    /// Keystrokes buffered between ticks before new ones are dropped
    pub event_queue_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: None,
            phrase_file: PathBuf::from(DEFAULT_PHRASE_FILE),
            tick_hz: TICK_HZ,
            event_queue_capacity: EVENT_QUEUE_CAPACITY,
        }
    }
}

impl Settings {
    /// Load settings from `path`, or the defaults if it can't be read.
    pub fn load(path: &Path) -> Self {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(err) => {
                log::info!("Using default settings ({}: {err})", path.display());
                return Self::default();
            }
        };
        match serde_json::from_str(&json) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(err) => {
                log::warn!("Ignoring malformed settings in {}: {err}", path.display());
                Self::default()
            }
        }
    }

    /// Like `load`, but a missing file is created holding the defaults so
    /// the player has something to edit.
    pub fn load_or_create(path: &Path) -> Self {
        if path.exists() {
            return Self::load(path);
        }
        let settings = Self::default();
        if let Err(err) = settings.save(path) {
            log::warn!("Could not write default settings to {}: {err}", path.display());
        }
        settings
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
        fs::write(path, json)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }

    /// Tick rate clamped to something the loop can keep up with
    pub fn effective_tick_hz(&self) -> u32 {
        self.tick_hz.clamp(1, 1000)
    }

    /// Sleep between ticks
    pub fn tick_interval_ms(&self) -> u64 {
        1000 / u64::from(self.effective_tick_hz())
    }

    /// Queue capacity, at least one slot
    pub fn effective_queue_capacity(&self) -> usize {
        self.event_queue_capacity.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("battle-keys-{}-{name}", std::process::id()))
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let settings = Settings::load(&temp_path("does-not-exist.json"));
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.tick_interval_ms(), 16);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let path = temp_path("partial.json");
        fs::write(&path, r#"{ "seed": 42, "tick_hz": 30 }"#).unwrap();
        let settings = Settings::load(&path);
        fs::remove_file(&path).ok();
        assert_eq!(settings.seed, Some(42));
        assert_eq!(settings.tick_hz, 30);
        assert_eq!(settings.phrase_file, PathBuf::from(DEFAULT_PHRASE_FILE));
        assert_eq!(settings.event_queue_capacity, EVENT_QUEUE_CAPACITY);
    }

    #[test]
    fn test_malformed_json_uses_defaults() {
        let path = temp_path("bad.json");
        fs::write(&path, "{ seed: ").unwrap();
        let settings = Settings::load(&path);
        fs::remove_file(&path).ok();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_save_then_load() {
        let path = temp_path("saved.json");
        let settings = Settings { seed: Some(7), tick_hz: 120, ..Default::default() };
        settings.save(&path).unwrap();
        let loaded = Settings::load(&path);
        fs::remove_file(&path).ok();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_load_or_create_writes_defaults() {
        let path = temp_path("created.json");
        fs::remove_file(&path).ok();
        let settings = Settings::load_or_create(&path);
        assert_eq!(settings, Settings::default());
        assert!(path.exists());

        fs::write(&path, r#"{ "seed": 5 }"#).unwrap();
        let settings = Settings::load_or_create(&path);
        fs::remove_file(&path).ok();
        assert_eq!(settings.seed, Some(5));
    }

    #[test]
    fn test_effective_values_clamped() {
        let settings = Settings { tick_hz: 0, event_queue_capacity: 0, ..Default::default() };
        assert_eq!(settings.effective_tick_hz(), 1);
        assert_eq!(settings.tick_interval_ms(), 1000);
        assert_eq!(settings.effective_queue_capacity(), 1);
    }
}
