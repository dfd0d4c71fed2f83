use std::io;

use crate::collaborators::MemorySystem;
use crate::storage;

use super::{read_header, write_header};

const STATE_VERSION: u32 = 1;
const NO_DECISION: u32 = u32::MAX;

/// How much of the attended trace survives each new attention event.
const TRACE_DECAY: f32 = 0.5;
/// Rate at which decision→outcome associations track the observed trace.
const OUTCOME_RATE: f32 = 0.1;
/// Bonus for decisions that have rarely been taken.
const CURIOSITY: f32 = 0.05;

/// Memory of what tends to get attended after each decision.
///
/// `outcomes[f * num_actions + a]` estimates how strongly feature `f` shows up
/// in the attended trace after decision `a`. A decision's score is the value
/// of its expected outcome (reward estimate plus goal activity per feature),
/// plus a curiosity bonus that fades as the decision is used.
#[derive(Debug, Clone, PartialEq)]
pub struct Hippocampus {
    num_sensors: usize,
    num_actions: usize,
    trace: Vec<f32>,
    outcomes: Vec<f32>,
    decision_counts: Vec<u64>,
    last_decision: Option<usize>,
}

impl Hippocampus {
    pub fn new(num_sensors: usize, num_actions: usize) -> Self {
        Self {
            num_sensors,
            num_actions,
            trace: vec![0.0; num_sensors],
            outcomes: vec![0.0; num_sensors * num_actions],
            decision_counts: vec![0; num_actions],
            last_decision: None,
        }
    }

    /// Expected activity of `feature` after `decision`.
    pub fn expected_outcome(&self, feature: usize, decision: usize) -> f32 {
        if feature >= self.num_sensors || decision >= self.num_actions {
            return 0.0;
        }
        self.outcomes[feature * self.num_actions + decision]
    }

    pub fn decision_counts(&self) -> &[u64] {
        &self.decision_counts
    }
}

impl MemorySystem for Hippocampus {
    fn kind(&self) -> &'static str {
        "hippocampus"
    }

    fn attend(&mut self, attended: usize, activity: f32) {
        for t in &mut self.trace {
            *t *= TRACE_DECAY;
        }
        if let Some(t) = self.trace.get_mut(attended) {
            *t = (*t + activity.clamp(0.0, 1.0)).min(1.0);
        }

        // Credit what is attended now to the decision taken last cycle.
        if let Some(a) = self.last_decision {
            let m = self.num_actions;
            for (f, &t) in self.trace.iter().enumerate() {
                let o = &mut self.outcomes[f * m + a];
                *o += OUTCOME_RATE * (t - *o);
            }
        }
    }

    fn decision_scores(&mut self, reward_by_feature: &[f32], goals: &[f32]) -> Vec<f32> {
        let m = self.num_actions;
        (0..m)
            .map(|a| {
                let value: f32 = (0..self.num_sensors)
                    .map(|f| {
                        let worth = reward_by_feature.get(f).copied().unwrap_or(0.0)
                            + goals.get(f).copied().unwrap_or(0.0);
                        self.outcomes[f * m + a] * worth
                    })
                    .sum();
                value + CURIOSITY / (1.0 + self.decision_counts[a] as f32)
            })
            .collect()
    }

    fn learn(&mut self, decision_index: usize) {
        if decision_index < self.num_actions {
            self.decision_counts[decision_index] += 1;
            self.last_decision = Some(decision_index);
        } else {
            self.last_decision = None;
        }
    }

    fn save_state_bytes(&self) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        write_header(&mut out, STATE_VERSION, self.num_sensors, self.num_actions)?;
        storage::write_f32_slice(&mut out, &self.trace)?;
        storage::write_f32_slice(&mut out, &self.outcomes)?;
        for &c in &self.decision_counts {
            storage::write_u64_le(&mut out, c)?;
        }
        storage::write_u32_le(
            &mut out,
            self.last_decision.map_or(NO_DECISION, |a| a as u32),
        )?;
        Ok(out)
    }

    fn load_state_bytes(&self, bytes: &[u8]) -> io::Result<Box<dyn MemorySystem>> {
        let (n, m) = (self.num_sensors, self.num_actions);
        let mut r = io::Cursor::new(bytes);
        read_header(&mut r, STATE_VERSION, n, m)?;
        let trace = storage::read_f32_vec_exact(&mut r, n)?;
        let outcomes = storage::read_f32_vec_exact(&mut r, n * m)?;
        let mut decision_counts = Vec::with_capacity(m);
        for _ in 0..m {
            decision_counts.push(storage::read_u64_le(&mut r)?);
        }
        let last_decision = match storage::read_u32_le(&mut r)? {
            NO_DECISION => None,
            a if (a as usize) < m => Some(a as usize),
            _ => return Err(storage::invalid_data("last decision out of range")),
        };
        Ok(Box::new(Self {
            num_sensors: n,
            num_actions: m,
            trace,
            outcomes,
            decision_counts,
            last_decision,
        }))
    }
}
