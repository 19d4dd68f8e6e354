use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock, time::Duration};

/// Environment variable naming the settings file.
pub const SETTINGS_PATH_ENV: &str = "CLASSPULSE_SETTINGS";
/// Forces simulation mode on when set to `1` or `true`.
pub const SIMULATION_ENV: &str = "CLASSPULSE_SIMULATION";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineSettings {
    pub tick_interval_ms: u64,
    pub clock_interval_ms: u64,
    pub feed_interval_ms: u64,
    /// Random walk and synthetic classifier feed instead of a real classifier.
    pub simulation: bool,
    pub initial_score: u8,
    pub initial_student_count: u32,
    /// Fixed seed for reproducible simulated sessions.
    pub rng_seed: Option<u64>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 3_000,
            clock_interval_ms: 1_000,
            feed_interval_ms: 5_000,
            simulation: false,
            initial_score: 78,
            initial_student_count: 42,
            rng_seed: None,
        }
    }
}

impl EngineSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn clock_interval(&self) -> Duration {
        Duration::from_millis(self.clock_interval_ms.max(1))
    }

    pub fn feed_interval(&self) -> Duration {
        Duration::from_millis(self.feed_interval_ms.max(1))
    }

    pub fn apply_env(mut self) -> Self {
        let forced = std::env::var(SIMULATION_ENV)
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        if forced {
            self.simulation = true;
        }
        self
    }
}

pub struct SettingsStore {
    path: Option<PathBuf>,
    data: RwLock<EngineSettings>,
}

impl SettingsStore {
    /// Loads settings from `path`; a missing path or file yields defaults.
    pub fn new(path: Option<PathBuf>) -> Result<Self> {
        let data = match &path {
            Some(path) if path.exists() => {
                let contents = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read settings from {}", path.display()))?;
                serde_json::from_str(&contents)
                    .with_context(|| format!("Invalid settings in {}", path.display()))?
            }
            _ => EngineSettings::default(),
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(std::env::var_os(SETTINGS_PATH_ENV).map(PathBuf::from))
    }

    pub fn engine(&self) -> EngineSettings {
        match self.data.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn update_engine(&self, settings: EngineSettings) -> Result<()> {
        let mut guard = match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = settings;
        self.persist(&guard)
    }

    fn persist(&self, data: &EngineSettings) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(path, serialized)
            .with_context(|| format!("Failed to write settings to {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(Some(dir.path().join("absent.json"))).unwrap();
        assert_eq!(store.engine(), EngineSettings::default());

        let store = SettingsStore::new(None).unwrap();
        assert_eq!(store.engine().tick_interval(), Duration::from_secs(3));
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "simulation": true, "tick_interval_ms": 500 }"#).unwrap();

        let settings = SettingsStore::new(Some(path)).unwrap().engine();
        assert!(settings.simulation);
        assert_eq!(settings.tick_interval(), Duration::from_millis(500));
        assert_eq!(settings.initial_score, 78);
    }

    #[test]
    fn updates_are_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::new(Some(path.clone())).unwrap();

        let mut settings = store.engine();
        settings.rng_seed = Some(9);
        store.update_engine(settings.clone()).unwrap();

        let reloaded = SettingsStore::new(Some(path)).unwrap();
        assert_eq!(reloaded.engine(), settings);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json").unwrap();
        assert!(SettingsStore::new(Some(path)).is_err());
    }
}
