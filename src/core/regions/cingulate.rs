use std::io;
use std::path::Path;

use tracing::info;

use crate::collaborators::AttentionSystem;
use crate::storage;

use super::{argmax, read_header, write_header};

const STATE_VERSION: u32 = 1;

/// Weight of raw activity next to surprise when picking what to attend.
const ACTIVITY_BIAS: f32 = 0.1;

/// Attention: pick the feature that most violates last cycle's prediction.
///
/// Score is `|feature - predicted| + ACTIVITY_BIAS * feature`, so with no
/// surprise at all the most active feature still wins.
#[derive(Debug, Clone, PartialEq)]
pub struct Cingulate {
    attention_counts: Vec<u64>,
}

impl Cingulate {
    pub fn new(num_sensors: usize) -> Self {
        Self {
            attention_counts: vec![0; num_sensors],
        }
    }

    /// How often each feature has been attended.
    pub fn attention_counts(&self) -> &[u64] {
        &self.attention_counts
    }
}

impl AttentionSystem for Cingulate {
    fn kind(&self) -> &'static str {
        "cingulate"
    }

    fn attend(&mut self, features: &[f32], predicted_features: &[f32]) -> (usize, f32) {
        let scores: Vec<f32> = features
            .iter()
            .enumerate()
            .map(|(i, &f)| {
                let p = predicted_features.get(i).copied().unwrap_or(0.0);
                (f - p).abs() + ACTIVITY_BIAS * f
            })
            .collect();

        let Some(attended) = argmax(&scores) else {
            return (0, 0.0);
        };
        if let Some(c) = self.attention_counts.get_mut(attended) {
            *c += 1;
        }
        (attended, features[attended])
    }

    fn save_state_bytes(&self) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        write_header(&mut out, STATE_VERSION, self.attention_counts.len(), 0)?;
        for &c in &self.attention_counts {
            storage::write_u64_le(&mut out, c)?;
        }
        Ok(out)
    }

    fn load_state_bytes(&self, bytes: &[u8]) -> io::Result<Box<dyn AttentionSystem>> {
        let n = self.attention_counts.len();
        let mut r = io::Cursor::new(bytes);
        read_header(&mut r, STATE_VERSION, n, 0)?;
        let mut attention_counts = Vec::with_capacity(n);
        for _ in 0..n {
            attention_counts.push(storage::read_u64_le(&mut r)?);
        }
        Ok(Box::new(Self { attention_counts }))
    }

    fn visualize(&self, name: &str, _log_dir: &Path) {
        if let Some(top) = argmax(
            &self
                .attention_counts
                .iter()
                .map(|&c| c as f32)
                .collect::<Vec<_>>(),
        ) {
            info!(
                "{name}: most attended feature is {top} ({} times)",
                self.attention_counts[top]
            );
        }
    }
}
