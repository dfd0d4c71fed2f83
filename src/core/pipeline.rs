//! One sense→act→learn cycle as a chain of typed stages.
//!
//! ```text
//! Attending ──attend──▶ Deciding ──decide──▶ Predicting ──predict──▶ Learning ──learn──▶ CycleOutcome
//! ```
//!
//! Every stage consumes the previous one, so attention cannot run after the
//! decision, prediction cannot be skipped, and learning only ever sees this
//! cycle's realised features and actions. The brain's cross-cycle buffers are
//! lent to the stages that read them and are never stored in a stage.
//!
//! Widths of collaborator output are checked where they enter the pipeline;
//! a wrong width aborts the cycle with [`BrainError::Collaborator`].

use crate::affect::Affect;
use crate::collaborators::Collaborators;
use crate::error::BrainError;

/// Sensor and action widths the cycle is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub num_sensors: usize,
    pub num_actions: usize,
}

/// Entry point: validated features waiting for attention.
#[derive(Debug)]
pub struct Attending {
    geometry: Geometry,
    features: Vec<f32>,
}

/// Attention is done; memory has seen the attended event.
#[derive(Debug)]
pub struct Deciding {
    geometry: Geometry,
    features: Vec<f32>,
    attended: usize,
}

/// An action was chosen; the forward model has not run yet.
#[derive(Debug)]
pub struct Predicting {
    geometry: Geometry,
    features: Vec<f32>,
    attended: usize,
    actions: Vec<f32>,
    decision_index: usize,
}

/// Predictions for the next cycle exist; learning is pending.
#[derive(Debug)]
pub struct Learning {
    features: Vec<f32>,
    outcome: CycleOutcome,
}

/// Everything a finished cycle produced.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleOutcome {
    pub actions: Vec<f32>,
    pub decision_index: usize,
    pub attended: usize,
    pub predicted_features: Vec<f32>,
    pub predicted_actions: Vec<f32>,
}

pub struct Cycle;

impl Cycle {
    /// Sensors pass straight through as features.
    pub fn begin(geometry: Geometry, sensors: &[f32]) -> Result<Attending, BrainError> {
        if sensors.len() != geometry.num_sensors {
            return Err(BrainError::SensorWidth {
                expected: geometry.num_sensors,
                got: sensors.len(),
            });
        }
        Ok(Attending {
            geometry,
            features: sensors.to_vec(),
        })
    }
}

impl Attending {
    pub fn features(&self) -> &[f32] {
        &self.features
    }

    /// `predicted_features` must be the prediction made by the previous cycle.
    pub fn attend(self, c: &mut Collaborators, predicted_features: &[f32]) -> Deciding {
        let (attended, activity) = c.attention.attend(&self.features, predicted_features);
        c.memory.attend(attended, activity);
        Deciding {
            geometry: self.geometry,
            features: self.features,
            attended,
        }
    }
}

impl Deciding {
    pub fn attended(&self) -> usize {
        self.attended
    }

    /// `predicted_actions` must be the prediction made by the previous cycle.
    pub fn decide(
        self,
        c: &mut Collaborators,
        predicted_actions: &[f32],
    ) -> Result<Predicting, BrainError> {
        let decision_scores = c
            .memory
            .decision_scores(c.reward.reward_by_feature(), c.selector.goals());
        let (actions, decision_index) =
            c.selector
                .decide(&self.features, predicted_actions, &decision_scores);
        check_width("action selector", self.geometry.num_actions, actions.len())?;

        Ok(Predicting {
            geometry: self.geometry,
            features: self.features,
            attended: self.attended,
            actions,
            decision_index,
        })
    }
}

impl Predicting {
    pub fn actions(&self) -> &[f32] {
        &self.actions
    }

    pub fn predict(self, c: &mut Collaborators) -> Result<Learning, BrainError> {
        let (predicted_features, predicted_actions) =
            c.predictor.predict(&self.features, &self.actions);
        check_width(
            "action predictor (features)",
            self.geometry.num_sensors,
            predicted_features.len(),
        )?;
        check_width(
            "action predictor (actions)",
            self.geometry.num_actions,
            predicted_actions.len(),
        )?;

        Ok(Learning {
            features: self.features,
            outcome: CycleOutcome {
                actions: self.actions,
                decision_index: self.decision_index,
                attended: self.attended,
                predicted_features,
                predicted_actions,
            },
        })
    }
}

impl Learning {
    pub fn outcome(&self) -> &CycleOutcome {
        &self.outcome
    }

    /// Learn from this cycle's features, actions and (already clipped) reward.
    ///
    /// The four updates touch disjoint state. With the `parallel` feature they
    /// run on the rayon pool; `cargo test --features parallel` covers that path.
    pub fn learn(self, c: &mut Collaborators, affect: &mut Affect, reward: f32) -> CycleOutcome {
        let features = &self.features;
        let actions = &self.outcome.actions;
        let decision_index = self.outcome.decision_index;
        let Collaborators {
            reward: reward_model,
            predictor,
            memory,
            ..
        } = c;

        #[cfg(feature = "parallel")]
        {
            rayon::join(
                || {
                    rayon::join(
                        || reward_model.learn(features, reward),
                        || predictor.learn(features, actions),
                    )
                },
                || {
                    rayon::join(
                        || memory.learn(decision_index),
                        || affect.update(reward),
                    )
                },
            );
        }

        #[cfg(not(feature = "parallel"))]
        {
            reward_model.learn(features, reward);
            predictor.learn(features, actions);
            memory.learn(decision_index);
            affect.update(reward);
        }

        self.outcome
    }
}

fn check_width(stage: &'static str, expected: usize, got: usize) -> Result<(), BrainError> {
    if expected != got {
        return Err(BrainError::Collaborator {
            stage,
            expected,
            got,
        });
    }
    Ok(())
}
