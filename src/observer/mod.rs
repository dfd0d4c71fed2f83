use crate::brain::Brain;

/// A read-only snapshot of where a brain stands.
///
/// Observers cannot mutate or steer the brain. Taking a summary allocates only
/// the name; the cycle loop is unaffected.
#[derive(Debug, Clone, PartialEq)]
pub struct BrainSummary {
    pub name: String,
    pub timestep: u64,
    pub num_sensors: usize,
    /// Includes the "do nothing" action.
    pub num_actions: usize,
    pub satisfaction: f32,
    /// Lifetime performance over the flushed reward periods.
    pub performance: f32,
    pub reward_periods: usize,
    /// Rewards accumulated since the last report.
    pub pending_updates: u64,
}

pub struct BrainObserver<'a> {
    brain: &'a Brain,
}

impl<'a> BrainObserver<'a> {
    pub fn new(brain: &'a Brain) -> Self {
        Self { brain }
    }

    pub fn summary(&self) -> BrainSummary {
        let affect = self.brain.affect();
        BrainSummary {
            name: self.brain.name().to_string(),
            timestep: self.brain.timestep(),
            num_sensors: self.brain.num_sensors(),
            num_actions: self.brain.num_actions(),
            satisfaction: affect.satisfaction(),
            performance: affect.performance(),
            reward_periods: affect.reward_history().len(),
            pending_updates: affect.pending_updates(),
        }
    }
}
