//! The cognitive subsystems a [`Brain`](crate::brain::Brain) sequences each cycle.
//!
//! Each role is an object-safe trait. The brain owns one boxed instance per
//! role and lends its cross-cycle buffers to them as `&[f32]` for the length
//! of a single call; implementations must not hold on to them.
//!
//! Persistence contract shared by every role:
//! - `kind()` is a stable tag written into snapshots. A snapshot only loads
//!   into a brain whose collaborators report the same kinds.
//! - `save_state_bytes()` serializes the full internal state.
//! - `load_state_bytes()` builds a *new* instance from those bytes and leaves
//!   `self` untouched, so a failed restore never leaves a half-loaded brain.

use std::io;
use std::path::Path;

use crate::config::BrainConfig;
use crate::regions::{Amygdala, Cerebellum, Cingulate, Ganglia, Hippocampus};

/// Learns which features predict reward.
pub trait RewardModel: Send {
    fn kind(&self) -> &'static str;

    /// Estimated reward per feature, `num_sensors` long.
    fn reward_by_feature(&self) -> &[f32];

    fn learn(&mut self, features: &[f32], reward: f32);

    fn save_state_bytes(&self) -> io::Result<Vec<u8>>;
    fn load_state_bytes(&self, bytes: &[u8]) -> io::Result<Box<dyn RewardModel>>;

    fn visualize(&self, _name: &str, _log_dir: &Path) {}
}

/// Singles out one feature per cycle for privileged processing.
pub trait AttentionSystem: Send {
    fn kind(&self) -> &'static str;

    /// Returns `(attended feature index, its activity)`. `predicted_features`
    /// is the prediction made at the end of the previous cycle.
    fn attend(&mut self, features: &[f32], predicted_features: &[f32]) -> (usize, f32);

    fn save_state_bytes(&self) -> io::Result<Vec<u8>>;
    fn load_state_bytes(&self, bytes: &[u8]) -> io::Result<Box<dyn AttentionSystem>>;

    fn visualize(&self, _name: &str, _log_dir: &Path) {}
}

/// Episodic memory of attended events; scores the available decisions.
pub trait MemorySystem: Send {
    fn kind(&self) -> &'static str;

    fn attend(&mut self, attended: usize, activity: f32);

    /// One score per action, `num_actions` long (including "do nothing").
    fn decision_scores(&mut self, reward_by_feature: &[f32], goals: &[f32]) -> Vec<f32>;

    fn learn(&mut self, decision_index: usize);

    fn save_state_bytes(&self) -> io::Result<Vec<u8>>;
    fn load_state_bytes(&self, bytes: &[u8]) -> io::Result<Box<dyn MemorySystem>>;

    fn visualize(&self, _name: &str, _log_dir: &Path) {}
}

/// Turns decision scores into an action vector and maintains goals.
pub trait ActionSelector: Send {
    fn kind(&self) -> &'static str;

    /// Current goal activity per feature, `num_sensors` long.
    fn goals(&self) -> &[f32];

    /// Returns `(actions, decision_index)`. Actions are expected to be binary
    /// and `num_actions` long; `predicted_actions` comes from the previous cycle.
    fn decide(
        &mut self,
        features: &[f32],
        predicted_actions: &[f32],
        decision_scores: &[f32],
    ) -> (Vec<f32>, usize);

    fn save_state_bytes(&self) -> io::Result<Vec<u8>>;
    fn load_state_bytes(&self, bytes: &[u8]) -> io::Result<Box<dyn ActionSelector>>;

    fn visualize(&self, _name: &str, _log_dir: &Path) {}
}

/// Forward model: what comes next, given what was sensed and done.
pub trait ActionPredictor: Send {
    fn kind(&self) -> &'static str;

    /// Returns `(predicted_features, predicted_actions)` for the next cycle.
    fn predict(&mut self, features: &[f32], actions: &[f32]) -> (Vec<f32>, Vec<f32>);

    fn learn(&mut self, features: &[f32], actions: &[f32]);

    fn save_state_bytes(&self) -> io::Result<Vec<u8>>;
    fn load_state_bytes(&self, bytes: &[u8]) -> io::Result<Box<dyn ActionPredictor>>;

    fn visualize(&self, _name: &str, _log_dir: &Path) {}
}

/// One instance of every collaborator role.
pub struct Collaborators {
    pub reward: Box<dyn RewardModel>,
    pub attention: Box<dyn AttentionSystem>,
    pub memory: Box<dyn MemorySystem>,
    pub selector: Box<dyn ActionSelector>,
    pub predictor: Box<dyn ActionPredictor>,
}

/// The `kind()` tags of a collaborator set, in snapshot order.
pub type CollaboratorKinds = [&'static str; 5];

impl Collaborators {
    /// The default brain regions, sized for `cfg`.
    pub fn standard(cfg: &BrainConfig) -> Self {
        let n = cfg.num_sensors;
        let m = cfg.total_actions();
        Self {
            reward: Box::new(Amygdala::new(n)),
            attention: Box::new(Cingulate::new(n)),
            memory: Box::new(Hippocampus::new(n, m)),
            selector: Box::new(Ganglia::new(n, m, cfg.exploit, cfg.seed)),
            predictor: Box::new(Cerebellum::new(n, m)),
        }
    }

    pub fn kinds(&self) -> CollaboratorKinds {
        [
            self.reward.kind(),
            self.attention.kind(),
            self.memory.kind(),
            self.selector.kind(),
            self.predictor.kind(),
        ]
    }

    pub fn visualize(&self, name: &str, log_dir: &Path) {
        self.reward.visualize(name, log_dir);
        self.predictor.visualize(name, log_dir);
        self.attention.visualize(name, log_dir);
        self.memory.visualize(name, log_dir);
        self.selector.visualize(name, log_dir);
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("kinds", &self.kinds())
            .finish()
    }
}
