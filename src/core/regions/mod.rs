//! Default collaborator implementations, named after the brain regions they
//! loosely stand in for.
//!
//! They are small, deterministic (given a seed) numeric models that honour the
//! collaborator contracts; swap any of them out through
//! [`Collaborators`](crate::collaborators::Collaborators).

mod amygdala;
mod cerebellum;
mod cingulate;
mod ganglia;
mod hippocampus;

pub use amygdala::Amygdala;
pub use cerebellum::Cerebellum;
pub use cingulate::Cingulate;
pub use ganglia::Ganglia;
pub use hippocampus::Hippocampus;

use std::io::{self, Read, Write};

use crate::storage;

/// Every region state blob starts with `version, num_sensors, num_actions`.
fn write_header<W: Write>(w: &mut W, version: u32, n: usize, m: usize) -> io::Result<()> {
    storage::write_u32_le(w, version)?;
    storage::write_u32_le(w, n as u32)?;
    storage::write_u32_le(w, m as u32)
}

fn read_header<R: Read>(r: &mut R, version: u32, n: usize, m: usize) -> io::Result<()> {
    if storage::read_u32_le(r)? != version {
        return Err(storage::invalid_data("unsupported region state version"));
    }
    let stored_n = storage::read_u32_le(r)? as usize;
    let stored_m = storage::read_u32_le(r)? as usize;
    if stored_n != n || stored_m != m {
        return Err(storage::invalid_data("region state geometry mismatch"));
    }
    Ok(())
}

/// Index of the largest value. Ties keep the earlier index; NaN never wins.
fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}
