//! Reward-history reporting sink.
//!
//! Rendering is left to whatever consumes the file: the agent writes the raw
//! series (`steps` against `history`) as pretty JSON next to its snapshots.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct RewardHistoryReport<'a> {
    pub name: &'a str,
    pub steps: &'a [u64],
    pub history: &'a [f32],
    pub performance: f32,
}

/// Owned form of [`RewardHistoryReport`], for readers of the report file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RewardHistory {
    pub name: String,
    pub steps: Vec<u64>,
    pub history: Vec<f32>,
    pub performance: f32,
}

pub fn reward_history_path(log_dir: &Path, name: &str) -> PathBuf {
    log_dir.join(format!("reward_history_{name}.json"))
}

/// Write the report, creating `log_dir` if needed. Returns the file written.
pub fn write_reward_history(log_dir: &Path, report: &RewardHistoryReport<'_>) -> io::Result<PathBuf> {
    std::fs::create_dir_all(log_dir)?;
    let path = reward_history_path(log_dir, report.name);
    let json = serde_json::to_vec_pretty(report)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    std::fs::write(&path, json)?;
    Ok(path)
}

pub fn read_reward_history(path: &Path) -> io::Result<RewardHistory> {
    let bytes = std::fs::read(path)?;
    serde_json::from_slice(&bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
