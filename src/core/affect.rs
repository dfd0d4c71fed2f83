//! Affect: reward filtered into a slow mood signal, plus a lifetime reward log.
//!
//! `satisfaction` is a leaky integrator over clipped reward. Between reports the
//! raw reward is also accumulated; each report flushes the accumulator into
//! one entry of `reward_history`, stamped with the brain's age.

use std::io::{self, Read, Write};
use std::path::Path;

use tracing::warn;

use crate::report::{self, RewardHistoryReport};
use crate::storage;

const AFFECT_STATE_VERSION: u32 = 1;

/// Clip reward into [-1, 1]. Out-of-range reward saturates, it is never an error.
///
/// This is the single clipping policy of the agent: the brain clips once per
/// cycle and hands the same value to `Affect` and to the reward model.
#[inline]
pub fn clip_reward(reward: f32) -> f32 {
    if reward.is_nan() {
        return 0.0;
    }
    reward.clamp(-1.0, 1.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Affect {
    satisfaction: f32,
    satisfaction_time_constant: f32,
    cumulative_reward: f32,
    time_since_reward_log: u64,
    reward_history: Vec<f32>,
    reward_steps: Vec<u64>,
}

impl Default for Affect {
    fn default() -> Self {
        Self::new(1_000.0)
    }
}

impl Affect {
    pub fn new(satisfaction_time_constant: f32) -> Self {
        Self {
            satisfaction: 0.0,
            satisfaction_time_constant: satisfaction_time_constant.max(1.0),
            cumulative_reward: 0.0,
            time_since_reward_log: 0,
            reward_history: Vec::new(),
            reward_steps: Vec::new(),
        }
    }

    pub fn satisfaction(&self) -> f32 {
        self.satisfaction
    }

    pub fn satisfaction_time_constant(&self) -> f32 {
        self.satisfaction_time_constant
    }

    pub fn reward_history(&self) -> &[f32] {
        &self.reward_history
    }

    pub fn reward_steps(&self) -> &[u64] {
        &self.reward_steps
    }

    /// Updates since the last flush into the history.
    pub fn pending_updates(&self) -> u64 {
        self.time_since_reward_log
    }

    /// Fold one reward into satisfaction and the pending accumulator.
    pub fn update(&mut self, reward: f32) -> f32 {
        let reward = clip_reward(reward);

        let rate = 1.0 / self.satisfaction_time_constant;
        self.satisfaction = (self.satisfaction * (1.0 - rate) + reward * rate).clamp(-1.0, 1.0);

        self.cumulative_reward += reward;
        self.time_since_reward_log += 1;

        self.satisfaction
    }

    /// Move the pending accumulator into the history.
    ///
    /// No-op when nothing was accumulated since the last flush, so repeated
    /// reports never add degenerate entries. Returns whether an entry was added.
    pub fn flush(&mut self, timestep: u64) -> bool {
        if self.time_since_reward_log == 0 {
            return false;
        }
        // The `+ 1` in the denominator is part of the reported metric.
        let period_average = self.cumulative_reward / (self.time_since_reward_log + 1) as f32;
        self.reward_history.push(period_average);
        self.reward_steps.push(timestep);
        self.cumulative_reward = 0.0;
        self.time_since_reward_log = 0;
        true
    }

    /// Lifetime mean of the per-period averages; `0.0` before the first flush.
    pub fn performance(&self) -> f32 {
        if self.reward_history.is_empty() {
            return 0.0;
        }
        self.reward_history.iter().sum::<f32>() / self.reward_history.len() as f32
    }

    /// Flush, compute performance and hand the history to the report sink.
    ///
    /// A failing sink is logged and does not affect the returned value.
    pub fn visualize(&mut self, timestep: u64, name: &str, log_dir: &Path) -> f32 {
        self.flush(timestep);
        let performance = self.performance();

        let report = RewardHistoryReport {
            name,
            steps: &self.reward_steps,
            history: &self.reward_history,
            performance,
        };
        if let Err(e) = report::write_reward_history(log_dir, &report) {
            warn!("Failed to write reward history for {name}: {e}");
        }

        performance
    }

    pub(crate) fn write_state<W: Write>(&self, w: &mut W) -> io::Result<()> {
        storage::write_u32_le(w, AFFECT_STATE_VERSION)?;
        storage::write_f32_le(w, self.satisfaction)?;
        storage::write_f32_le(w, self.satisfaction_time_constant)?;
        storage::write_f32_le(w, self.cumulative_reward)?;
        storage::write_u64_le(w, self.time_since_reward_log)?;
        storage::write_f32_slice(w, &self.reward_history)?;
        storage::write_u32_le(w, self.reward_steps.len() as u32)?;
        for &s in &self.reward_steps {
            storage::write_u64_le(w, s)?;
        }
        Ok(())
    }

    pub(crate) fn read_state<R: Read>(r: &mut R) -> io::Result<Self> {
        if storage::read_u32_le(r)? != AFFECT_STATE_VERSION {
            return Err(storage::invalid_data("unsupported affect state version"));
        }
        let satisfaction = storage::read_f32_le(r)?;
        let satisfaction_time_constant = storage::read_f32_le(r)?;
        let cumulative_reward = storage::read_f32_le(r)?;
        let time_since_reward_log = storage::read_u64_le(r)?;
        let reward_history = storage::read_f32_vec(r)?;
        let steps_n = storage::read_u32_le(r)? as usize;
        if steps_n != reward_history.len() {
            return Err(storage::invalid_data("reward history/steps length mismatch"));
        }
        let mut reward_steps = Vec::with_capacity(steps_n);
        for _ in 0..steps_n {
            reward_steps.push(storage::read_u64_le(r)?);
        }

        if !(-1.0..=1.0).contains(&satisfaction) || !(satisfaction_time_constant >= 1.0) {
            return Err(storage::invalid_data("affect state out of range"));
        }

        Ok(Self {
            satisfaction,
            satisfaction_time_constant,
            cumulative_reward,
            time_since_reward_log,
            reward_history,
            reward_steps,
        })
    }
}
