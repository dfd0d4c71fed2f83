use std::io;

use crate::collaborators::RewardModel;
use crate::storage;

use super::{read_header, write_header};

const STATE_VERSION: u32 = 1;
const DEFAULT_LEARNING_RATE: f32 = 0.01;

/// Per-feature reward estimate.
///
/// Each feature's estimate moves toward the observed reward in proportion to
/// how active the feature was, so rarely-seen features change slowly.
#[derive(Debug, Clone, PartialEq)]
pub struct Amygdala {
    learning_rate: f32,
    reward_by_feature: Vec<f32>,
}

impl Amygdala {
    pub fn new(num_sensors: usize) -> Self {
        Self {
            learning_rate: DEFAULT_LEARNING_RATE,
            reward_by_feature: vec![0.0; num_sensors],
        }
    }

    pub fn with_learning_rate(mut self, rate: f32) -> Self {
        self.learning_rate = rate.clamp(0.0, 1.0);
        self
    }
}

impl RewardModel for Amygdala {
    fn kind(&self) -> &'static str {
        "amygdala"
    }

    fn reward_by_feature(&self) -> &[f32] {
        &self.reward_by_feature
    }

    fn learn(&mut self, features: &[f32], reward: f32) {
        for (estimate, &activity) in self.reward_by_feature.iter_mut().zip(features) {
            let activity = activity.clamp(0.0, 1.0);
            *estimate += self.learning_rate * activity * (reward - *estimate);
        }
    }

    fn save_state_bytes(&self) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        write_header(&mut out, STATE_VERSION, self.reward_by_feature.len(), 0)?;
        storage::write_f32_le(&mut out, self.learning_rate)?;
        storage::write_f32_slice(&mut out, &self.reward_by_feature)?;
        Ok(out)
    }

    fn load_state_bytes(&self, bytes: &[u8]) -> io::Result<Box<dyn RewardModel>> {
        let n = self.reward_by_feature.len();
        let mut r = io::Cursor::new(bytes);
        read_header(&mut r, STATE_VERSION, n, 0)?;
        let learning_rate = storage::read_f32_le(&mut r)?;
        let reward_by_feature = storage::read_f32_vec_exact(&mut r, n)?;
        Ok(Box::new(Self {
            learning_rate,
            reward_by_feature,
        }))
    }
}
