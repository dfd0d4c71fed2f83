use std::io;

use crate::collaborators::ActionSelector;
use crate::prng::Prng;
use crate::storage;

use super::{read_header, write_header};

const STATE_VERSION: u32 = 1;

/// Chance of a random decision per cycle while exploring.
const EXPLORATION: f32 = 0.1;
/// Weight of the forward model's predicted actions next to decision scores.
const HABIT_WEIGHT: f32 = 0.2;
/// Per-decision fade of goal activity.
const GOAL_DECAY: f32 = 0.05;

/// Action selection: one decision per cycle, emitted as a one-hot action vector.
///
/// The last action is the brain's "do nothing" action. When several options
/// tie for the best combined score and "do nothing" is among them, the brain
/// does nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct Ganglia {
    num_actions: usize,
    exploit: bool,
    goals: Vec<f32>,
    rng: Prng,
}

impl Ganglia {
    pub fn new(num_sensors: usize, num_actions: usize, exploit: bool, seed: Option<u64>) -> Self {
        Self {
            num_actions,
            exploit,
            goals: vec![0.0; num_sensors],
            rng: Prng::from_seed(seed),
        }
    }

    fn choose(&self, combined: &[f32]) -> usize {
        let do_nothing = self.num_actions - 1;
        let mut best = do_nothing;
        for (i, &v) in combined.iter().enumerate() {
            if v > combined[best] || (combined[best].is_nan() && !v.is_nan()) {
                best = i;
            }
        }
        best
    }
}

impl ActionSelector for Ganglia {
    fn kind(&self) -> &'static str {
        "ganglia"
    }

    fn goals(&self) -> &[f32] {
        &self.goals
    }

    fn decide(
        &mut self,
        features: &[f32],
        predicted_actions: &[f32],
        decision_scores: &[f32],
    ) -> (Vec<f32>, usize) {
        let m = self.num_actions;
        if m == 0 {
            return (Vec::new(), 0);
        }

        let combined: Vec<f32> = (0..m)
            .map(|a| {
                decision_scores.get(a).copied().unwrap_or(0.0)
                    + HABIT_WEIGHT * predicted_actions.get(a).copied().unwrap_or(0.0)
            })
            .collect();

        let mut decision = self.choose(&combined);
        if !self.exploit && self.rng.chance(EXPLORATION) {
            decision = self.rng.below(m);
        }

        // Goals fade, and the features behind a promising decision become goals.
        let promise = if combined[decision].is_nan() {
            0.0
        } else {
            combined[decision].clamp(0.0, 1.0)
        };
        for (g, &f) in self.goals.iter_mut().zip(features) {
            *g = ((1.0 - GOAL_DECAY) * *g + GOAL_DECAY * promise * f.clamp(0.0, 1.0))
                .clamp(0.0, 1.0);
        }

        let mut actions = vec![0.0; m];
        actions[decision] = 1.0;
        (actions, decision)
    }

    fn save_state_bytes(&self) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        write_header(&mut out, STATE_VERSION, self.goals.len(), self.num_actions)?;
        storage::write_f32_slice(&mut out, &self.goals)?;
        storage::write_u64_le(&mut out, self.rng.state())?;
        Ok(out)
    }

    /// The exploit switch is configuration and stays with the live instance.
    fn load_state_bytes(&self, bytes: &[u8]) -> io::Result<Box<dyn ActionSelector>> {
        let (n, m) = (self.goals.len(), self.num_actions);
        let mut r = io::Cursor::new(bytes);
        read_header(&mut r, STATE_VERSION, n, m)?;
        let goals = storage::read_f32_vec_exact(&mut r, n)?;
        let rng = Prng::from_state(storage::read_u64_le(&mut r)?);
        Ok(Box::new(Self {
            num_actions: m,
            exploit: self.exploit,
            goals,
            rng,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exploiting_picks_best_score_as_one_hot() {
        let mut ganglia = Ganglia::new(2, 3, true, Some(1));
        let (actions, decision) = ganglia.decide(&[1.0, 0.0], &[0.0; 3], &[0.1, 0.9, 0.2]);
        assert_eq!(decision, 1);
        assert_eq!(actions, vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn ties_resolve_to_do_nothing() {
        let mut ganglia = Ganglia::new(2, 3, true, Some(1));
        let (actions, decision) = ganglia.decide(&[0.0, 1.0], &[0.0; 3], &[0.0; 3]);
        assert_eq!(decision, 2);
        assert_eq!(actions, vec![0.0, 0.0, 1.0]);
    }

    #[test]
    fn predicted_actions_act_as_habit() {
        let mut ganglia = Ganglia::new(1, 3, true, Some(1));
        let (_, decision) = ganglia.decide(&[0.0], &[1.0, 0.0, 0.0], &[0.0, 0.1, 0.0]);
        assert_eq!(decision, 0);
    }

    #[test]
    fn actions_are_always_binary_and_full_width() {
        let mut ganglia = Ganglia::new(2, 4, false, Some(99));
        for step in 0..500 {
            let s = (step % 7) as f32 / 7.0;
            let (actions, decision) = ganglia.decide(&[s, 1.0 - s], &[s; 4], &[s, 0.2, 0.1, 0.0]);
            assert_eq!(actions.len(), 4);
            assert!(actions.iter().all(|&a| a == 0.0 || a == 1.0));
            assert_eq!(actions.iter().sum::<f32>(), 1.0);
            assert_eq!(actions[decision], 1.0);
        }
    }

    #[test]
    fn goals_follow_promising_decisions() {
        let mut ganglia = Ganglia::new(2, 2, true, Some(1));
        for _ in 0..100 {
            ganglia.decide(&[1.0, 0.0], &[0.0; 2], &[0.8, 0.0]);
        }
        assert!(ganglia.goals()[0] > 0.5);
        assert_eq!(ganglia.goals()[1], 0.0);
    }

    #[test]
    fn restored_selector_continues_the_same_random_sequence() {
        let mut a = Ganglia::new(1, 3, false, Some(5));
        a.decide(&[0.5], &[0.0; 3], &[0.0; 3]);
        let mut b = Ganglia::new(1, 3, false, Some(77))
            .load_state_bytes(&a.save_state_bytes().unwrap())
            .unwrap();

        for _ in 0..50 {
            assert_eq!(
                a.decide(&[0.5], &[0.0; 3], &[0.0; 3]).1,
                b.decide(&[0.5], &[0.0; 3], &[0.0; 3]).1
            );
        }
    }
}
