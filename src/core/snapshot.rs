//! Versioned, chunked brain image.
//!
//! Layout: `MAGIC`, `u32` version, then LZ4 chunks (see
//! [`storage::write_chunk_lz4`]) in any order:
//!
//! | tag    | payload |
//! |--------|---------|
//! | `SCHM` | structural parameters ([`Schema`]) |
//! | `STAT` | timestep |
//! | `PRED` | predicted features, predicted actions |
//! | `AFCT` | affect state |
//! | `RWRD` `ATTN` `MEMO` `SELE` `PRDC` | collaborator state blobs |
//!
//! Unknown chunks are skipped. A missing chunk, an unknown version, or any
//! difference between the stored schema and the live brain rejects the image.
//! Nothing is applied to the live brain until every chunk has decoded.

use std::collections::HashMap;
use std::io::{self, Read, Write};

use crate::affect::Affect;
use crate::brain::Brain;
use crate::collaborators::Collaborators;
use crate::error::SnapshotError;
use crate::storage;

pub const MAGIC: &[u8; 8] = b"BECCAIMG";
pub const VERSION_V1: u32 = 1;
pub const VERSION_CURRENT: u32 = VERSION_V1;

const TAG_SCHEMA: [u8; 4] = *b"SCHM";
const TAG_STATE: [u8; 4] = *b"STAT";
const TAG_PREDICTIONS: [u8; 4] = *b"PRED";
const TAG_AFFECT: [u8; 4] = *b"AFCT";
const TAG_REWARD: [u8; 4] = *b"RWRD";
const TAG_ATTENTION: [u8; 4] = *b"ATTN";
const TAG_MEMORY: [u8; 4] = *b"MEMO";
const TAG_SELECTOR: [u8; 4] = *b"SELE";
const TAG_PREDICTOR: [u8; 4] = *b"PRDC";

/// Everything that must agree between an image and the brain loading it.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub num_sensors: usize,
    pub num_actions: usize,
    pub name: String,
    pub satisfaction_time_constant: f32,
    pub collaborator_kinds: Vec<String>,
}

impl Schema {
    pub fn of(brain: &Brain) -> Self {
        Self {
            num_sensors: brain.num_sensors(),
            num_actions: brain.num_actions(),
            name: brain.name().to_string(),
            satisfaction_time_constant: brain.affect().satisfaction_time_constant(),
            collaborator_kinds: brain
                .collaborators()
                .kinds()
                .iter()
                .map(|k| k.to_string())
                .collect(),
        }
    }

    fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        storage::write_u32_le(w, self.num_sensors as u32)?;
        storage::write_u32_le(w, self.num_actions as u32)?;
        storage::write_string(w, &self.name)?;
        storage::write_f32_le(w, self.satisfaction_time_constant)?;
        storage::write_u32_le(w, self.collaborator_kinds.len() as u32)?;
        for k in &self.collaborator_kinds {
            storage::write_string(w, k)?;
        }
        Ok(())
    }

    fn read<R: Read>(r: &mut R) -> io::Result<Self> {
        let num_sensors = storage::read_u32_le(r)? as usize;
        let num_actions = storage::read_u32_le(r)? as usize;
        let name = storage::read_string(r)?;
        let satisfaction_time_constant = storage::read_f32_le(r)?;
        let kinds_n = storage::read_u32_le(r)? as usize;
        if kinds_n > 64 {
            return Err(storage::invalid_data("implausible collaborator count"));
        }
        let mut collaborator_kinds = Vec::with_capacity(kinds_n);
        for _ in 0..kinds_n {
            collaborator_kinds.push(storage::read_string(r)?);
        }
        Ok(Self {
            num_sensors,
            num_actions,
            name,
            satisfaction_time_constant,
            collaborator_kinds,
        })
    }

    /// Geometry first, so a sensor/action mismatch is what gets reported.
    pub fn check_against(&self, current: &Schema) -> Result<(), SnapshotError> {
        if self.num_sensors != current.num_sensors {
            return Err(SnapshotError::mismatch(
                "num_sensors",
                self.num_sensors,
                current.num_sensors,
            ));
        }
        if self.num_actions != current.num_actions {
            return Err(SnapshotError::mismatch(
                "num_actions",
                self.num_actions,
                current.num_actions,
            ));
        }
        if self.name != current.name {
            return Err(SnapshotError::mismatch("name", &self.name, &current.name));
        }
        if self.satisfaction_time_constant.to_bits() != current.satisfaction_time_constant.to_bits()
        {
            return Err(SnapshotError::mismatch(
                "satisfaction_time_constant",
                self.satisfaction_time_constant,
                current.satisfaction_time_constant,
            ));
        }
        if self.collaborator_kinds != current.collaborator_kinds {
            return Err(SnapshotError::mismatch(
                "collaborator kinds",
                self.collaborator_kinds.join(","),
                current.collaborator_kinds.join(","),
            ));
        }
        Ok(())
    }
}

/// A fully decoded image, ready to replace a brain's learned state.
#[derive(Debug)]
pub struct LoadedImage {
    pub timestep: u64,
    pub predicted_features: Vec<f32>,
    pub predicted_actions: Vec<f32>,
    pub affect: Affect,
    pub collaborators: Collaborators,
}

pub fn save_image_to<W: Write>(w: &mut W, brain: &Brain) -> io::Result<()> {
    w.write_all(MAGIC)?;
    storage::write_u32_le(w, VERSION_CURRENT)?;

    let mut schema = Vec::new();
    Schema::of(brain).write(&mut schema)?;
    storage::write_chunk_lz4(w, TAG_SCHEMA, &schema)?;

    let mut state = Vec::with_capacity(8);
    storage::write_u64_le(&mut state, brain.timestep())?;
    storage::write_chunk_lz4(w, TAG_STATE, &state)?;

    let mut predictions = Vec::new();
    storage::write_f32_slice(&mut predictions, brain.predicted_features())?;
    storage::write_f32_slice(&mut predictions, brain.predicted_actions())?;
    storage::write_chunk_lz4(w, TAG_PREDICTIONS, &predictions)?;

    let mut affect = Vec::new();
    brain.affect().write_state(&mut affect)?;
    storage::write_chunk_lz4(w, TAG_AFFECT, &affect)?;

    let c = brain.collaborators();
    storage::write_chunk_lz4(w, TAG_REWARD, &c.reward.save_state_bytes()?)?;
    storage::write_chunk_lz4(w, TAG_ATTENTION, &c.attention.save_state_bytes()?)?;
    storage::write_chunk_lz4(w, TAG_MEMORY, &c.memory.save_state_bytes()?)?;
    storage::write_chunk_lz4(w, TAG_SELECTOR, &c.selector.save_state_bytes()?)?;
    storage::write_chunk_lz4(w, TAG_PREDICTOR, &c.predictor.save_state_bytes()?)?;
    Ok(())
}

/// Decode an image against the live brain `current` without touching it.
pub fn load_image_from<R: Read>(r: &mut R, current: &Brain) -> Result<LoadedImage, SnapshotError> {
    let magic = storage::read_exact::<8, _>(r)?;
    if &magic != MAGIC {
        return Err(SnapshotError::Format("bad brain image magic".to_string()));
    }
    let version = storage::read_u32_le(r)?;
    if version != VERSION_CURRENT {
        return Err(SnapshotError::UnsupportedVersion(version));
    }

    let mut chunks: HashMap<[u8; 4], Vec<u8>> = HashMap::new();
    while let Some((tag, payload)) = storage::read_chunk_lz4(r)? {
        chunks.insert(tag, payload);
    }
    let mut take_chunk = |tag: [u8; 4]| {
        chunks.remove(&tag).ok_or_else(|| {
            SnapshotError::Format(format!("missing {} chunk", String::from_utf8_lossy(&tag)))
        })
    };

    let stored = Schema::read(&mut io::Cursor::new(take_chunk(TAG_SCHEMA)?))?;
    stored.check_against(&Schema::of(current))?;

    let timestep = storage::read_u64_le(&mut io::Cursor::new(take_chunk(TAG_STATE)?))?;

    let predictions = take_chunk(TAG_PREDICTIONS)?;
    let mut cursor = io::Cursor::new(predictions);
    let predicted_features = storage::read_f32_vec_exact(&mut cursor, current.num_sensors())?;
    let predicted_actions = storage::read_f32_vec_exact(&mut cursor, current.num_actions())?;

    let affect = Affect::read_state(&mut io::Cursor::new(take_chunk(TAG_AFFECT)?))?;

    let live = current.collaborators();
    let collaborators = Collaborators {
        reward: live
            .reward
            .load_state_bytes(&take_chunk(TAG_REWARD)?)
            .map_err(|e| collaborator_error("reward model", e))?,
        attention: live
            .attention
            .load_state_bytes(&take_chunk(TAG_ATTENTION)?)
            .map_err(|e| collaborator_error("attention", e))?,
        memory: live
            .memory
            .load_state_bytes(&take_chunk(TAG_MEMORY)?)
            .map_err(|e| collaborator_error("memory", e))?,
        selector: live
            .selector
            .load_state_bytes(&take_chunk(TAG_SELECTOR)?)
            .map_err(|e| collaborator_error("action selector", e))?,
        predictor: live
            .predictor
            .load_state_bytes(&take_chunk(TAG_PREDICTOR)?)
            .map_err(|e| collaborator_error("action predictor", e))?,
    };

    Ok(LoadedImage {
        timestep,
        predicted_features,
        predicted_actions,
        affect,
        collaborators,
    })
}

fn collaborator_error(role: &str, e: io::Error) -> SnapshotError {
    SnapshotError::Format(format!("{role} state: {e}"))
}
