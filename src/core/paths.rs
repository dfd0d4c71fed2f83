//! Where a brain keeps its files.
//!
//! Everything hangs off an explicit base directory handed in through the
//! configuration. `os_default_log_dir` is only a convenience for callers that
//! want the platform data directory:
//! - Linux: ~/.local/share/becca/
//! - Windows: %APPDATA%\becca\
//! - MacOS: ~/Library/Application Support/becca/

use std::path::{Path, PathBuf};

use crate::report;

const SNAPSHOT_EXTENSION: &str = "becca";
const SECONDARY_SUFFIX: &str = ".bak";
const TEMP_SUFFIX: &str = ".tmp";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePaths {
    log_dir: PathBuf,
    name: String,
}

impl StoragePaths {
    pub fn new(log_dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            log_dir: log_dir.into(),
            name: name.into(),
        }
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// `<log_dir>/<name>.becca`
    pub fn primary(&self) -> PathBuf {
        self.log_dir
            .join(format!("{}.{SNAPSHOT_EXTENSION}", self.name))
    }

    /// The "last known good" copy: primary path plus `.bak`.
    pub fn secondary(&self) -> PathBuf {
        append_suffix(&self.primary(), SECONDARY_SUFFIX)
    }

    /// Sibling written first and renamed over `target` once complete.
    pub fn temp_for(target: &Path) -> PathBuf {
        append_suffix(target, TEMP_SUFFIX)
    }

    pub fn reward_report(&self) -> PathBuf {
        report::reward_history_path(&self.log_dir, &self.name)
    }
}

/// `<platform data dir>/becca`, if the platform has one.
pub fn os_default_log_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|base| base.join("becca"))
}

fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(suffix);
    PathBuf::from(s)
}
