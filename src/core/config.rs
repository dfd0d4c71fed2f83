use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::BrainError;

/// Construction parameters for a [`Brain`](crate::brain::Brain).
///
/// `num_actions` is the number of actions the world offers; the brain always
/// appends one extra "do nothing" action on top of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrainConfig {
    pub num_sensors: usize,
    pub num_actions: usize,

    /// Unique name; namespaces the snapshot and report files.
    pub name: String,

    /// Base directory for snapshots and reports. Always injected by the
    /// caller; nothing is derived from where the crate is installed.
    pub log_dir: PathBuf,

    /// Time steps between checkpoints.
    pub backup_interval: u64,

    /// Leaky-integrator time constant for satisfaction. Larger is slower.
    pub satisfaction_time_constant: f32,

    /// Disable exploration in the default action selector.
    pub exploit: bool,

    /// Seed for the default collaborators. `None` seeds from the clock.
    pub seed: Option<u64>,
}

impl Default for BrainConfig {
    fn default() -> Self {
        Self {
            num_sensors: 1,
            num_actions: 1,
            name: "test_brain".to_string(),
            log_dir: PathBuf::from("log"),
            backup_interval: 10_000,
            satisfaction_time_constant: 1_000.0,
            exploit: false,
            seed: None,
        }
    }
}

impl BrainConfig {
    pub fn new(num_sensors: usize, num_actions: usize) -> Self {
        Self {
            num_sensors,
            num_actions,
            ..Default::default()
        }
    }

    /// Internal action count, including the trailing "do nothing" action.
    pub fn total_actions(&self) -> usize {
        self.num_actions + 1
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.num_sensors == 0 {
            return Err("num_sensors must be > 0");
        }
        if self.backup_interval == 0 {
            return Err("backup_interval must be > 0");
        }
        if !self.satisfaction_time_constant.is_finite() || self.satisfaction_time_constant < 1.0 {
            return Err("satisfaction_time_constant must be finite and >= 1");
        }
        if self.name.is_empty() {
            return Err("name must not be empty");
        }
        if self
            .name
            .chars()
            .any(|c| std::path::is_separator(c) || c == '\0')
        {
            return Err("name must not contain path separators");
        }
        Ok(())
    }

    /// Load a JSON config file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, BrainError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let cfg: Self = serde_json::from_str(&text)
            .map_err(|e| BrainError::Config(format!("{}: {e}", path.display())))?;
        cfg.validate()
            .map_err(|e| BrainError::Config(e.to_string()))?;
        Ok(cfg)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = dir.into();
        self
    }

    pub fn with_backup_interval(mut self, steps: u64) -> Self {
        self.backup_interval = steps;
        self
    }

    pub fn with_satisfaction_time_constant(mut self, tau: f32) -> Self {
        self.satisfaction_time_constant = tau;
        self
    }

    pub fn with_exploit(mut self, exploit: bool) -> Self {
        self.exploit = exploit;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn do_nothing_action_is_appended() {
        assert_eq!(BrainConfig::new(3, 2).total_actions(), 3);
        assert_eq!(BrainConfig::new(3, 0).total_actions(), 1);
    }

    #[test]
    fn validate_rejects_degenerate_values() {
        assert!(BrainConfig::new(3, 2).validate().is_ok());
        assert!(BrainConfig::new(0, 2).validate().is_err());
        assert!(BrainConfig::new(3, 2)
            .with_backup_interval(0)
            .validate()
            .is_err());
        assert!(BrainConfig::new(3, 2)
            .with_satisfaction_time_constant(f32::NAN)
            .validate()
            .is_err());
        assert!(BrainConfig::new(3, 2)
            .with_name("../escape")
            .validate()
            .is_err());
    }

    #[test]
    fn json_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brain.json");
        std::fs::write(&path, r#"{ "num_sensors": 4, "num_actions": 2, "name": "rover" }"#)
            .unwrap();

        let cfg = BrainConfig::from_json_file(&path).unwrap();
        assert_eq!(cfg.num_sensors, 4);
        assert_eq!(cfg.name, "rover");
        assert_eq!(cfg.backup_interval, 10_000);
    }

    #[test]
    fn json_file_is_validated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brain.json");
        std::fs::write(&path, r#"{ "num_sensors": 0 }"#).unwrap();

        assert!(matches!(
            BrainConfig::from_json_file(&path),
            Err(BrainError::Config(_))
        ));
    }
}
