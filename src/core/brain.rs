//! The brain: owns the collaborators, the affect, and the buffers that carry
//! predictions from one cycle to the next.
//!
//! A cycle (`sense_act_learn`) always runs attention → memory → decision →
//! prediction → learning, then checkpoints every `backup_interval` steps.
//! Checkpoints and restores never fail the caller: problems are logged and
//! the brain keeps the best state it has.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use tracing::{debug, error, info, warn};

use crate::affect::{clip_reward, Affect};
use crate::collaborators::Collaborators;
use crate::config::BrainConfig;
use crate::error::{BrainError, SnapshotError};
use crate::paths::StoragePaths;
use crate::pipeline::{Cycle, CycleOutcome, Geometry};
use crate::snapshot::{self, LoadedImage};
use crate::storage;

#[derive(Debug)]
pub struct Brain {
    cfg: BrainConfig,
    paths: StoragePaths,

    num_sensors: usize,
    /// Includes the trailing "do nothing" action.
    num_actions: usize,

    timestep: u64,
    predicted_features: Vec<f32>,
    predicted_actions: Vec<f32>,

    affect: Affect,
    collaborators: Collaborators,
}

impl Brain {
    /// A fresh brain wired with the default regions.
    pub fn new(cfg: BrainConfig) -> Result<Self, BrainError> {
        cfg.validate()
            .map_err(|e| BrainError::Config(e.to_string()))?;
        let collaborators = Collaborators::standard(&cfg);
        Self::with_collaborators(cfg, collaborators)
    }

    /// A fresh brain wired with caller-supplied collaborators.
    pub fn with_collaborators(
        cfg: BrainConfig,
        collaborators: Collaborators,
    ) -> Result<Self, BrainError> {
        cfg.validate()
            .map_err(|e| BrainError::Config(e.to_string()))?;

        let num_sensors = cfg.num_sensors;
        let num_actions = cfg.total_actions();
        if collaborators.reward.reward_by_feature().len() != num_sensors {
            return Err(BrainError::Config(format!(
                "reward model covers {} features, brain has {num_sensors}",
                collaborators.reward.reward_by_feature().len()
            )));
        }
        if collaborators.selector.goals().len() != num_sensors {
            return Err(BrainError::Config(format!(
                "action selector tracks {} goals, brain has {num_sensors} features",
                collaborators.selector.goals().len()
            )));
        }

        Ok(Self {
            paths: StoragePaths::new(&cfg.log_dir, &cfg.name),
            num_sensors,
            num_actions,
            timestep: 0,
            predicted_features: vec![0.0; num_sensors],
            predicted_actions: vec![0.0; num_actions],
            affect: Affect::new(cfg.satisfaction_time_constant),
            collaborators,
            cfg,
        })
    }

    pub fn name(&self) -> &str {
        &self.cfg.name
    }

    pub fn config(&self) -> &BrainConfig {
        &self.cfg
    }

    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    pub fn num_sensors(&self) -> usize {
        self.num_sensors
    }

    pub fn num_actions(&self) -> usize {
        self.num_actions
    }

    /// Age in cycles.
    pub fn timestep(&self) -> u64 {
        self.timestep
    }

    pub fn backup_interval(&self) -> u64 {
        self.cfg.backup_interval
    }

    pub fn predicted_features(&self) -> &[f32] {
        &self.predicted_features
    }

    pub fn predicted_actions(&self) -> &[f32] {
        &self.predicted_actions
    }

    pub fn affect(&self) -> &Affect {
        &self.affect
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    fn geometry(&self) -> Geometry {
        Geometry {
            num_sensors: self.num_sensors,
            num_actions: self.num_actions,
        }
    }

    /// Run one cycle: take sensors and reward in, hand actions back.
    ///
    /// Sensor values are fuzzy in [0, 1]: 0.5 means "on half the time" or
    /// "50% likely on", not "half as strong". Reward may be any real number
    /// and is clipped to [-1, 1]. The returned actions are `num_actions()`
    /// long; the last one is "do nothing".
    pub fn sense_act_learn(&mut self, sensors: &[f32], reward: f32) -> Result<Vec<f32>, BrainError> {
        let attending = Cycle::begin(self.geometry(), sensors)?;
        self.timestep += 1;

        let deciding = attending.attend(&mut self.collaborators, &self.predicted_features);
        let predicting = deciding.decide(&mut self.collaborators, &self.predicted_actions)?;
        let learning = predicting.predict(&mut self.collaborators)?;
        let CycleOutcome {
            actions,
            decision_index,
            attended,
            predicted_features,
            predicted_actions,
        } = learning.learn(&mut self.collaborators, &mut self.affect, clip_reward(reward));

        // Read by attention and decision at the start of the next cycle.
        self.predicted_features = predicted_features;
        self.predicted_actions = predicted_actions;

        debug!(
            timestep = self.timestep,
            attended, decision_index, "cycle complete"
        );

        if self.timestep % self.cfg.backup_interval == 0 {
            self.backup();
        }
        Ok(actions)
    }

    /// Report on the brain's state: its age, each collaborator's own report,
    /// and the reward history.
    pub fn visualize(&mut self) {
        info!("{} is {} time steps old", self.cfg.name, self.timestep);
        self.collaborators
            .visualize(&self.cfg.name, self.paths.log_dir());
        self.affect
            .visualize(self.timestep, &self.cfg.name, self.paths.log_dir());
    }

    /// Lifetime average reward per period. Also checkpoints the brain.
    pub fn report_performance(&mut self) -> f32 {
        let performance =
            self.affect
                .visualize(self.timestep, &self.cfg.name, self.paths.log_dir());
        info!("Final performance is {performance:.3}");
        self.backup();
        performance
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Persistence
    // ─────────────────────────────────────────────────────────────────────────

    pub fn save_image_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        snapshot::save_image_to(w, self)
    }

    pub fn save_image_bytes(&self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.save_image_to(&mut buf)?;
        Ok(buf)
    }

    /// Exact serialized size in bytes of the current image.
    pub fn image_size_bytes(&self) -> io::Result<usize> {
        let mut cw = storage::CountingWriter::new();
        self.save_image_to(&mut cw)?;
        Ok(cw.written())
    }

    /// Write the brain image to the primary path and to the secondary
    /// "last known good" path.
    ///
    /// The image is encoded once; each copy is written to a temporary sibling
    /// and renamed into place, independently of the other. Returns `true` only
    /// if both copies landed. Never panics or propagates an error.
    pub fn backup(&self) -> bool {
        let bytes = match self.save_image_bytes() {
            Ok(b) => b,
            Err(e) => {
                error!("Failed to serialize brain {}: {e}", self.cfg.name);
                return false;
            }
        };

        if let Err(e) = fs::create_dir_all(self.paths.log_dir()) {
            error!(
                "Failed to create log directory {:?}: {e}",
                self.paths.log_dir()
            );
            return false;
        }

        let primary = self.paths.primary();
        let primary_ok = match write_atomically(&primary, &bytes) {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to save brain to {:?}: {e}", primary);
                false
            }
        };

        let secondary = self.paths.secondary();
        let secondary_ok = match write_atomically(&secondary, &bytes) {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to save brain backup to {:?}: {e}", secondary);
                false
            }
        };

        if primary_ok && secondary_ok {
            info!(
                "✓ Brain {} saved at timestep {} ({} bytes)",
                self.cfg.name,
                self.timestep,
                bytes.len()
            );
        }
        primary_ok && secondary_ok
    }

    /// Decode the primary snapshot against this brain without changing it.
    pub fn try_restore(&self) -> Result<LoadedImage, SnapshotError> {
        let mut file = io::BufReader::new(File::open(self.paths.primary())?);
        snapshot::load_image_from(&mut file, self)
    }

    /// Resume from the primary snapshot if it is readable and matches this
    /// brain's geometry and schema; otherwise keep this fresh brain.
    pub fn restore(self) -> Brain {
        let path = self.paths.primary();
        match self.try_restore() {
            Ok(image) => {
                info!(
                    "Brain restored at timestep {} from {:?}",
                    image.timestep, path
                );
                self.adopt(image)
            }
            Err(SnapshotError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                info!("No saved brain at {:?}; starting fresh", path);
                self
            }
            Err(e) if e.is_mismatch() => {
                warn!(
                    "The brain {:?} does not match this world ({e}); creating a new brain from scratch",
                    path
                );
                self
            }
            Err(e) => {
                warn!("Could not load brain from {:?}: {e}; starting fresh", path);
                self
            }
        }
    }

    fn adopt(mut self, image: LoadedImage) -> Brain {
        self.timestep = image.timestep;
        self.predicted_features = image.predicted_features;
        self.predicted_actions = image.predicted_actions;
        self.affect = image.affect;
        self.collaborators = image.collaborators;
        self
    }
}

/// Write `bytes` to a temporary sibling of `path`, flush it to disk, then
/// rename it over `path`. A crash leaves either the old or the new file.
fn write_atomically(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp = StoragePaths::temp_for(path);
    let result = (|| {
        let mut out = File::create(&tmp)?;
        out.write_all(bytes)?;
        out.sync_all()?;
        fs::rename(&tmp, path)
    })();
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::collaborators::{
        ActionPredictor, ActionSelector, AttentionSystem, MemorySystem, RewardModel,
    };

    type Log = Arc<Mutex<Vec<String>>>;

    fn log_line(log: &Log, line: impl Into<String>) {
        log.lock().unwrap().push(line.into());
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    }

    fn config(dir: &Path, num_sensors: usize, num_actions: usize) -> BrainConfig {
        BrainConfig::new(num_sensors, num_actions)
            .with_name("test_brain")
            .with_log_dir(dir)
            .with_seed(42)
    }

    // Stub collaborators: record what they were handed, return fixed shapes.

    #[derive(Clone)]
    struct StubReward {
        log: Log,
        estimates: Vec<f32>,
        saves: Arc<AtomicUsize>,
    }

    impl RewardModel for StubReward {
        fn kind(&self) -> &'static str {
            "stub"
        }
        fn reward_by_feature(&self) -> &[f32] {
            &self.estimates
        }
        fn learn(&mut self, features: &[f32], reward: f32) {
            log_line(&self.log, format!("reward.learn {features:?} {reward}"));
        }
        fn save_state_bytes(&self) -> io::Result<Vec<u8>> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
        fn load_state_bytes(&self, _bytes: &[u8]) -> io::Result<Box<dyn RewardModel>> {
            Ok(Box::new(self.clone()))
        }
    }

    #[derive(Clone)]
    struct StubAttention {
        log: Log,
    }

    impl AttentionSystem for StubAttention {
        fn kind(&self) -> &'static str {
            "stub"
        }
        fn attend(&mut self, _features: &[f32], predicted_features: &[f32]) -> (usize, f32) {
            log_line(&self.log, format!("attention.attend {predicted_features:?}"));
            (0, 1.0)
        }
        fn save_state_bytes(&self) -> io::Result<Vec<u8>> {
            Ok(Vec::new())
        }
        fn load_state_bytes(&self, _bytes: &[u8]) -> io::Result<Box<dyn AttentionSystem>> {
            Ok(Box::new(self.clone()))
        }
    }

    /// Always scores every decision zero.
    #[derive(Clone)]
    struct StubMemory {
        log: Log,
        num_actions: usize,
    }

    impl MemorySystem for StubMemory {
        fn kind(&self) -> &'static str {
            "stub"
        }
        fn attend(&mut self, attended: usize, _activity: f32) {
            log_line(&self.log, format!("memory.attend {attended}"));
        }
        fn decision_scores(&mut self, _reward: &[f32], _goals: &[f32]) -> Vec<f32> {
            log_line(&self.log, "memory.decision_scores");
            vec![0.0; self.num_actions]
        }
        fn learn(&mut self, decision_index: usize) {
            log_line(&self.log, format!("memory.learn {decision_index}"));
        }
        fn save_state_bytes(&self) -> io::Result<Vec<u8>> {
            Ok(Vec::new())
        }
        fn load_state_bytes(&self, _bytes: &[u8]) -> io::Result<Box<dyn MemorySystem>> {
            Ok(Box::new(self.clone()))
        }
    }

    #[derive(Clone)]
    struct StubSelector {
        log: Log,
        goals: Vec<f32>,
        width: usize,
    }

    impl ActionSelector for StubSelector {
        fn kind(&self) -> &'static str {
            "stub"
        }
        fn goals(&self) -> &[f32] {
            &self.goals
        }
        fn decide(
            &mut self,
            _features: &[f32],
            predicted_actions: &[f32],
            _scores: &[f32],
        ) -> (Vec<f32>, usize) {
            log_line(&self.log, format!("selector.decide {predicted_actions:?}"));
            let mut actions = vec![0.0; self.width];
            if let Some(a) = actions.first_mut() {
                *a = 1.0;
            }
            (actions, 0)
        }
        fn save_state_bytes(&self) -> io::Result<Vec<u8>> {
            Ok(Vec::new())
        }
        fn load_state_bytes(&self, _bytes: &[u8]) -> io::Result<Box<dyn ActionSelector>> {
            Ok(Box::new(self.clone()))
        }
    }

    /// Predicts half of this cycle's features and echoes the actions.
    #[derive(Clone)]
    struct StubPredictor {
        log: Log,
    }

    impl ActionPredictor for StubPredictor {
        fn kind(&self) -> &'static str {
            "stub"
        }
        fn predict(&mut self, features: &[f32], actions: &[f32]) -> (Vec<f32>, Vec<f32>) {
            log_line(&self.log, "predictor.predict");
            (features.iter().map(|f| f * 0.5).collect(), actions.to_vec())
        }
        fn learn(&mut self, features: &[f32], actions: &[f32]) {
            log_line(&self.log, format!("predictor.learn {features:?} {actions:?}"));
        }
        fn save_state_bytes(&self) -> io::Result<Vec<u8>> {
            Ok(Vec::new())
        }
        fn load_state_bytes(&self, _bytes: &[u8]) -> io::Result<Box<dyn ActionPredictor>> {
            Ok(Box::new(self.clone()))
        }
    }

    struct Stubs {
        log: Log,
        saves: Arc<AtomicUsize>,
        collaborators: Collaborators,
    }

    fn stubs(num_sensors: usize, num_actions: usize, selector_width: usize) -> Stubs {
        let log: Log = Arc::default();
        let saves = Arc::new(AtomicUsize::new(0));
        let collaborators = Collaborators {
            reward: Box::new(StubReward {
                log: log.clone(),
                estimates: vec![0.0; num_sensors],
                saves: saves.clone(),
            }),
            attention: Box::new(StubAttention { log: log.clone() }),
            memory: Box::new(StubMemory {
                log: log.clone(),
                num_actions,
            }),
            selector: Box::new(StubSelector {
                log: log.clone(),
                goals: vec![0.0; num_sensors],
                width: selector_width,
            }),
            predictor: Box::new(StubPredictor { log: log.clone() }),
        };
        Stubs {
            log,
            saves,
            collaborators,
        }
    }

    #[test]
    fn timestep_counts_cycles() {
        let dir = tempfile::tempdir().unwrap();
        let mut brain = Brain::new(config(dir.path(), 4, 2)).unwrap();
        assert_eq!(brain.timestep(), 0);
        for n in 1..=25u64 {
            brain.sense_act_learn(&[0.0, 0.5, 1.0, 0.0], 0.1).unwrap();
            assert_eq!(brain.timestep(), n);
        }
    }

    #[test]
    fn fresh_brain_has_zeroed_buffers_and_extra_action() {
        let dir = tempfile::tempdir().unwrap();
        let brain = Brain::new(config(dir.path(), 3, 2)).unwrap();
        assert_eq!(brain.num_actions(), 3);
        assert_eq!(brain.predicted_features(), &[0.0; 3]);
        assert_eq!(brain.predicted_actions(), &[0.0; 3]);
    }

    #[test]
    fn zero_decision_scores_still_yield_full_width_actions() {
        let dir = tempfile::tempdir().unwrap();
        let s = stubs(3, 3, 3);
        let mut brain = Brain::with_collaborators(config(dir.path(), 3, 2), s.collaborators).unwrap();

        for _ in 0..3 {
            let actions = brain.sense_act_learn(&[0.0, 1.0, 0.0], 0.2).unwrap();
            assert_eq!(actions.len(), 3);
        }
        assert_eq!(brain.timestep(), 3);
    }

    #[test]
    fn default_regions_emit_binary_actions() {
        let dir = tempfile::tempdir().unwrap();
        let mut brain = Brain::new(config(dir.path(), 3, 2)).unwrap();
        for step in 0..200 {
            let on = (step % 3) as usize;
            let mut sensors = [0.0; 3];
            sensors[on] = 1.0;
            let actions = brain
                .sense_act_learn(&sensors, if on == 1 { 1.0 } else { -0.2 })
                .unwrap();
            assert_eq!(actions.len(), brain.num_actions());
            assert!(actions.iter().all(|&a| a == 0.0 || a == 1.0));
        }
        let s = brain.affect().satisfaction();
        assert!((-1.0..=1.0).contains(&s));
    }

    #[test]
    fn collaborators_run_in_pipeline_order() {
        let dir = tempfile::tempdir().unwrap();
        let s = stubs(2, 2, 2);
        let log = s.log.clone();
        let mut brain = Brain::with_collaborators(config(dir.path(), 2, 1), s.collaborators).unwrap();

        brain.sense_act_learn(&[1.0, 0.0], 0.0).unwrap();

        let calls: Vec<String> = log
            .lock()
            .unwrap()
            .iter()
            .map(|l| l.split(' ').next().unwrap_or_default().to_string())
            .collect();
        assert_eq!(
            &calls[..5],
            &[
                "attention.attend",
                "memory.attend",
                "memory.decision_scores",
                "selector.decide",
                "predictor.predict",
            ]
        );
        let mut learning = calls[5..].to_vec();
        learning.sort();
        assert_eq!(learning, vec!["memory.learn", "predictor.learn", "reward.learn"]);
    }

    #[test]
    fn attention_and_decision_see_previous_cycle_prediction() {
        let dir = tempfile::tempdir().unwrap();
        let s = stubs(2, 2, 2);
        let log = s.log.clone();
        let mut brain = Brain::with_collaborators(config(dir.path(), 2, 1), s.collaborators).unwrap();

        brain.sense_act_learn(&[1.0, 0.5], 0.0).unwrap();
        brain.sense_act_learn(&[0.0, 0.0], 0.0).unwrap();

        let lines = log.lock().unwrap().clone();
        let attends: Vec<&String> = lines
            .iter()
            .filter(|l| l.starts_with("attention.attend"))
            .collect();
        assert_eq!(attends[0], "attention.attend [0.0, 0.0]");
        assert_eq!(attends[1], "attention.attend [0.5, 0.25]");

        let decides: Vec<&String> = lines
            .iter()
            .filter(|l| l.starts_with("selector.decide"))
            .collect();
        assert_eq!(decides[0], "selector.decide [0.0, 0.0]");
        assert_eq!(decides[1], "selector.decide [1.0, 0.0]");

        assert_eq!(brain.predicted_features(), &[0.0, 0.0]);
    }

    #[test]
    fn learning_sees_this_cycle_and_one_clipped_reward() {
        let dir = tempfile::tempdir().unwrap();
        let s = stubs(2, 2, 2);
        let log = s.log.clone();
        let mut brain = Brain::with_collaborators(config(dir.path(), 2, 1), s.collaborators).unwrap();

        brain.sense_act_learn(&[0.25, 0.75], 5.0).unwrap();

        let lines = log.lock().unwrap().clone();
        assert!(lines.contains(&"reward.learn [0.25, 0.75] 1".to_string()));
        assert!(lines.contains(&"predictor.learn [0.25, 0.75] [1.0, 0.0]".to_string()));
        assert!(lines.contains(&"memory.learn 0".to_string()));
        assert_eq!(brain.affect().pending_updates(), 1);
        assert!(brain.affect().satisfaction() > 0.0);
    }

    #[test]
    fn wrong_sensor_width_is_rejected_before_the_clock_ticks() {
        let dir = tempfile::tempdir().unwrap();
        let mut brain = Brain::new(config(dir.path(), 3, 2)).unwrap();
        let err = brain.sense_act_learn(&[1.0], 0.0).unwrap_err();
        assert!(matches!(err, BrainError::SensorWidth { expected: 3, got: 1 }));
        assert_eq!(brain.timestep(), 0);
    }

    #[test]
    fn collaborator_width_fault_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let s = stubs(2, 2, 5);
        let mut brain = Brain::with_collaborators(config(dir.path(), 2, 1), s.collaborators).unwrap();

        let err = brain.sense_act_learn(&[1.0, 0.0], 0.0).unwrap_err();
        assert!(matches!(
            err,
            BrainError::Collaborator {
                expected: 2,
                got: 5,
                ..
            }
        ));
    }

    #[test]
    fn mis_sized_collaborators_are_rejected_at_construction() {
        let dir = tempfile::tempdir().unwrap();
        let s = stubs(4, 3, 3);
        assert!(matches!(
            Brain::with_collaborators(config(dir.path(), 3, 2), s.collaborators),
            Err(BrainError::Config(_))
        ));
        assert!(Brain::new(config(dir.path(), 0, 2)).is_err());
    }

    #[test]
    fn checkpoint_fires_every_backup_interval() {
        let dir = tempfile::tempdir().unwrap();
        let s = stubs(2, 2, 2);
        let saves = s.saves.clone();
        let cfg = config(dir.path(), 2, 1).with_backup_interval(5);
        let mut brain = Brain::with_collaborators(cfg, s.collaborators).unwrap();

        for step in 1..=12u64 {
            brain.sense_act_learn(&[0.0, 1.0], 0.0).unwrap();
            let expected = (step / 5) as usize;
            assert_eq!(saves.load(Ordering::SeqCst), expected, "after step {step}");
        }
        assert!(brain.paths().primary().exists());
    }

    #[test]
    fn backup_writes_identical_primary_and_secondary() {
        let dir = tempfile::tempdir().unwrap();
        let mut brain = Brain::new(config(dir.path(), 3, 2)).unwrap();
        brain.sense_act_learn(&[1.0, 0.0, 0.0], 0.5).unwrap();

        assert!(brain.backup());
        let primary = fs::read(brain.paths().primary()).unwrap();
        let secondary = fs::read(brain.paths().secondary()).unwrap();
        assert_eq!(primary, secondary);
        assert_eq!(primary.len(), brain.image_size_bytes().unwrap());
        assert!(!StoragePaths::temp_for(&brain.paths().primary()).exists());
    }

    #[test]
    fn failed_backup_does_not_interrupt_the_cycle() {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("occupied");
        fs::write(&blocker, b"not a directory").unwrap();

        let cfg = config(&blocker, 2, 1).with_backup_interval(1);
        let mut brain = Brain::new(cfg).unwrap();
        assert!(!brain.backup());
        for _ in 0..3 {
            assert_eq!(brain.sense_act_learn(&[0.5, 0.5], 0.0).unwrap().len(), 2);
        }
        assert_eq!(brain.timestep(), 3);
    }

    #[test]
    fn backup_then_restore_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut brain = Brain::new(config(dir.path(), 3, 2)).unwrap();
        for step in 0..7 {
            let x = step as f32 / 7.0;
            brain.sense_act_learn(&[x, 1.0 - x, 0.5], x - 0.5).unwrap();
        }
        let age = brain.timestep();
        brain.affect.flush(age);
        assert!(brain.backup());

        let restored = Brain::new(config(dir.path(), 3, 2)).unwrap().restore();
        assert_eq!(restored.timestep(), 7);
        assert_eq!(restored.predicted_features(), brain.predicted_features());
        assert_eq!(restored.predicted_actions(), brain.predicted_actions());
        assert_eq!(restored.affect(), brain.affect());
        assert_eq!(
            restored.save_image_bytes().unwrap(),
            brain.save_image_bytes().unwrap()
        );
    }

    #[test]
    fn restored_brain_continues_like_the_original() {
        let dir = tempfile::tempdir().unwrap();
        let mut original = Brain::new(config(dir.path(), 2, 2)).unwrap();
        for _ in 0..10 {
            original.sense_act_learn(&[1.0, 0.0], 0.3).unwrap();
        }
        assert!(original.backup());
        let mut restored = Brain::new(config(dir.path(), 2, 2)).unwrap().restore();

        for step in 0..20 {
            let sensors = if step % 2 == 0 { [1.0, 0.0] } else { [0.0, 1.0] };
            assert_eq!(
                original.sense_act_learn(&sensors, 0.1).unwrap(),
                restored.sense_act_learn(&sensors, 0.1).unwrap()
            );
        }
    }

    #[test]
    fn restore_keeps_fresh_brain_on_geometry_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let mut old = Brain::new(config(dir.path(), 3, 2)).unwrap();
        old.sense_act_learn(&[1.0, 1.0, 1.0], 1.0).unwrap();
        assert!(old.backup());

        let restored = Brain::new(config(dir.path(), 4, 2)).unwrap().restore();
        assert_eq!(restored.num_sensors(), 4);
        assert_eq!(restored.num_actions(), 3);
        assert_eq!(restored.timestep(), 0);

        let restored = Brain::new(config(dir.path(), 3, 1)).unwrap().restore();
        assert_eq!(restored.num_actions(), 2);
        assert_eq!(restored.timestep(), 0);
    }

    #[test]
    fn restore_keeps_fresh_brain_when_collaborators_differ() {
        let dir = tempfile::tempdir().unwrap();
        let mut old = Brain::new(config(dir.path(), 2, 1)).unwrap();
        old.sense_act_learn(&[1.0, 0.0], 0.0).unwrap();
        assert!(old.backup());

        let s = stubs(2, 2, 2);
        let fresh = Brain::with_collaborators(config(dir.path(), 2, 1), s.collaborators).unwrap();
        assert!(fresh.try_restore().unwrap_err().is_mismatch());
        assert_eq!(fresh.restore().timestep(), 0);
    }

    #[test]
    fn restore_survives_missing_and_corrupt_files() {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();

        let fresh = Brain::new(config(dir.path(), 2, 1)).unwrap();
        assert!(matches!(fresh.try_restore(), Err(SnapshotError::Io(_))));
        assert_eq!(fresh.restore().timestep(), 0);

        let mut old = Brain::new(config(dir.path(), 2, 1)).unwrap();
        old.sense_act_learn(&[1.0, 0.0], 0.0).unwrap();
        assert!(old.backup());
        let path = old.paths().primary();
        let mut bytes = fs::read(&path).unwrap();
        bytes.truncate(bytes.len() / 2);
        fs::write(&path, &bytes).unwrap();

        let restored = Brain::new(config(dir.path(), 2, 1)).unwrap().restore();
        assert_eq!(restored.timestep(), 0);
        assert_eq!(restored.predicted_features(), &[0.0, 0.0]);
    }

    #[test]
    fn visualize_flushes_affect_and_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let mut brain = Brain::new(config(dir.path(), 2, 1)).unwrap();
        for _ in 0..4 {
            brain.sense_act_learn(&[1.0, 0.0], 1.0).unwrap();
        }
        brain.visualize();
        brain.visualize();

        assert_eq!(brain.affect().reward_history(), &[0.8]);
        assert_eq!(brain.affect().reward_steps(), &[4]);
        let report = crate::report::read_reward_history(&brain.paths().reward_report()).unwrap();
        assert_eq!(report.steps, vec![4]);
    }

    #[test]
    fn report_performance_checkpoints() {
        let dir = tempfile::tempdir().unwrap();
        let mut brain = Brain::new(config(dir.path(), 2, 1)).unwrap();
        for _ in 0..3 {
            brain.sense_act_learn(&[0.0, 1.0], -1.0).unwrap();
        }
        let performance = brain.report_performance();
        assert!((performance + 0.75).abs() < 1e-6);
        assert!(brain.paths().primary().exists());
        assert!(brain.paths().secondary().exists());
    }
}
