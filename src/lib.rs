//! # becca
//!
//! Orchestration core of a brain-inspired reinforcement learning agent.
//!
//! Every time step the brain takes a sensor vector and a reward, and runs a
//! fixed pipeline over five pluggable collaborators: attention, memory,
//! action selection, forward prediction, and reward learning. An affect
//! tracks satisfaction and a lifetime reward history. The whole agent is
//! checkpointed periodically and can resume from disk.
//!
//! ## Quick Start
//!
//! ```no_run
//! use becca::prelude::*;
//!
//! let cfg = BrainConfig::new(4, 2)
//!     .with_name("grid_world")
//!     .with_log_dir("log")
//!     .with_seed(42);
//! let mut brain = Brain::new(cfg).unwrap().restore();
//!
//! let actions = brain.sense_act_learn(&[0.0, 1.0, 0.0, 0.5], 0.25).unwrap();
//! assert_eq!(actions.len(), 3); // two actions plus "do nothing"
//!
//! let performance = brain.report_performance();
//! ```
//!
//! ## Feature Flags
//!
//! - `parallel`: run the independent learning updates of each cycle on rayon
//!   (`cargo test --features parallel` exercises that path)
//!
//! ## Modules
//!
//! - [`brain`]: the orchestrator, checkpoint and restore
//! - [`pipeline`]: one cycle as typed stages
//! - [`collaborators`]: the role traits, and [`regions`] for default implementations
//! - [`affect`]: satisfaction and reward history
//! - [`snapshot`]: the on-disk brain image
//! - [`observer`]: read-only summaries

#[path = "core/affect.rs"]
pub mod affect;

#[path = "core/brain.rs"]
pub mod brain;

#[path = "core/collaborators.rs"]
pub mod collaborators;

#[path = "core/config.rs"]
pub mod config;

#[path = "core/error.rs"]
pub mod error;

#[path = "core/paths.rs"]
pub mod paths;

#[path = "core/pipeline.rs"]
pub mod pipeline;

#[path = "core/prng.rs"]
pub mod prng;

#[path = "core/regions/mod.rs"]
pub mod regions;

#[path = "core/report.rs"]
pub mod report;

#[path = "core/snapshot.rs"]
pub mod snapshot;

#[path = "core/storage.rs"]
pub mod storage;

pub mod observer;

/// Prelude module for convenient imports.
///
/// ```
/// use becca::prelude::*;
/// ```
pub mod prelude {
    pub use crate::affect::{clip_reward, Affect};
    pub use crate::brain::Brain;
    pub use crate::collaborators::{
        ActionPredictor, ActionSelector, AttentionSystem, Collaborators, MemorySystem,
        RewardModel,
    };
    pub use crate::config::BrainConfig;
    pub use crate::error::{BrainError, SnapshotError};
    pub use crate::observer::{BrainObserver, BrainSummary};
    pub use crate::paths::StoragePaths;
    pub use crate::regions::{Amygdala, Cerebellum, Cingulate, Ganglia, Hippocampus};
}
