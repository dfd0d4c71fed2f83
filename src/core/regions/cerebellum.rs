use std::io;

use crate::collaborators::ActionPredictor;
use crate::storage;

use super::{read_header, write_header};

const STATE_VERSION: u32 = 1;
const DEFAULT_LEARNING_RATE: f32 = 0.05;

/// Linear forward model over the joint `(features, actions)` vector.
///
/// `weights[j * d + i]` maps input component `i` of one cycle to output
/// component `j` of the next, with `d = num_sensors + num_actions`. Learning is
/// a normalised delta rule on consecutive realised pairs (the step shrinks with
/// the squared norm of the input); predictions are clamped to [0, 1] like the
/// signals they stand for.
#[derive(Debug, Clone, PartialEq)]
pub struct Cerebellum {
    num_sensors: usize,
    num_actions: usize,
    learning_rate: f32,
    weights: Vec<f32>,
    previous: Option<Vec<f32>>,
}

impl Cerebellum {
    pub fn new(num_sensors: usize, num_actions: usize) -> Self {
        let d = num_sensors + num_actions;
        Self {
            num_sensors,
            num_actions,
            learning_rate: DEFAULT_LEARNING_RATE,
            weights: vec![0.0; d * d],
            previous: None,
        }
    }

    pub fn with_learning_rate(mut self, rate: f32) -> Self {
        self.learning_rate = rate.clamp(0.0, 1.0);
        self
    }

    fn width(&self) -> usize {
        self.num_sensors + self.num_actions
    }

    /// Join features and actions into one input vector of exactly `width()`.
    fn joint(&self, features: &[f32], actions: &[f32]) -> Vec<f32> {
        let mut x = Vec::with_capacity(self.width());
        x.extend((0..self.num_sensors).map(|i| features.get(i).copied().unwrap_or(0.0)));
        x.extend((0..self.num_actions).map(|i| actions.get(i).copied().unwrap_or(0.0)));
        x
    }

    fn forward(&self, x: &[f32]) -> Vec<f32> {
        let d = self.width();
        (0..d)
            .map(|j| {
                let row = &self.weights[j * d..(j + 1) * d];
                row.iter().zip(x).map(|(w, xi)| w * xi).sum::<f32>()
            })
            .collect()
    }
}

impl ActionPredictor for Cerebellum {
    fn kind(&self) -> &'static str {
        "cerebellum"
    }

    fn predict(&mut self, features: &[f32], actions: &[f32]) -> (Vec<f32>, Vec<f32>) {
        let x = self.joint(features, actions);
        let mut y: Vec<f32> = self
            .forward(&x)
            .into_iter()
            .map(|v| if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) })
            .collect();
        let predicted_actions = y.split_off(self.num_sensors);
        (y, predicted_actions)
    }

    fn learn(&mut self, features: &[f32], actions: &[f32]) {
        let now = self.joint(features, actions);
        if let Some(prev) = self.previous.take() {
            let d = self.width();
            let expected = self.forward(&prev);
            // Scaled by input energy so the step stays stable at any width.
            let eta = self.learning_rate / (1.0 + prev.iter().map(|x| x * x).sum::<f32>());
            for j in 0..d {
                let err = now[j] - expected[j];
                if err == 0.0 || !err.is_finite() {
                    continue;
                }
                let row = &mut self.weights[j * d..(j + 1) * d];
                for (w, &xi) in row.iter_mut().zip(&prev) {
                    *w += eta * err * xi;
                }
            }
        }
        self.previous = Some(now);
    }

    fn save_state_bytes(&self) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        write_header(&mut out, STATE_VERSION, self.num_sensors, self.num_actions)?;
        storage::write_f32_le(&mut out, self.learning_rate)?;
        storage::write_f32_slice(&mut out, &self.weights)?;
        match &self.previous {
            Some(prev) => {
                storage::write_u8(&mut out, 1)?;
                storage::write_f32_slice(&mut out, prev)?;
            }
            None => storage::write_u8(&mut out, 0)?,
        }
        Ok(out)
    }

    fn load_state_bytes(&self, bytes: &[u8]) -> io::Result<Box<dyn ActionPredictor>> {
        let (n, m) = (self.num_sensors, self.num_actions);
        let d = n + m;
        let mut r = io::Cursor::new(bytes);
        read_header(&mut r, STATE_VERSION, n, m)?;
        let learning_rate = storage::read_f32_le(&mut r)?;
        let weights = storage::read_f32_vec_exact(&mut r, d * d)?;
        let previous = match storage::read_u8(&mut r)? {
            0 => None,
            1 => Some(storage::read_f32_vec_exact(&mut r, d)?),
            _ => return Err(storage::invalid_data("bad cerebellum flag")),
        };
        Ok(Box::new(Self {
            num_sensors: n,
            num_actions: m,
            learning_rate,
            weights,
            previous,
        }))
    }
}
