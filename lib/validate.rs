//! Structural checks performed once per run, before any state is touched.

use itertools::Itertools;
use rustc_hash::{ FxHashMap, FxHashSet };
use crate::{
    circuit::{ Circuit, Operation },
    error::InvalidCircuit,
};

/// Maximum number of qubits in a single measurement.
///
/// Sampling a measurement enumerates and stores a weight for every one of its
/// 2<sup>width</sup> candidate outcomes, so the cap keeps that table within a
/// few hundred megabytes.
pub const MAX_MEASUREMENT_WIDTH: usize = 24;

/// Check that `circuit` can be sampled.
///
/// The circuit must contain at least one measurement, and for every qubit
/// that is measured, its last measurement must also be the last operation to
/// touch it. Additionally, measurement keys must be unique, every measurement
/// must target between 1 and [`MAX_MEASUREMENT_WIDTH`] qubits, and no
/// operation may name the same qubit twice.
pub fn validate<G>(circuit: &Circuit<G>) -> Result<(), InvalidCircuit> {
    // qubit -> (moment index, whether that operation was a measurement)
    let mut last_touch: FxHashMap<usize, (usize, bool)> = FxHashMap::default();
    // qubit -> key of its most recent measurement
    let mut last_meas: FxHashMap<usize, &str> = FxHashMap::default();
    let mut keys: FxHashSet<&str> = FxHashSet::default();

    for (t, moment) in circuit.moments().iter().enumerate() {
        for op in moment.operations().iter() {
            if let Some(q) = op.targets().iter().duplicates().next() {
                return Err(InvalidCircuit::DuplicateTarget(*q));
            }
            if let Operation::Measure { targets, key } = op {
                if targets.is_empty() {
                    return Err(InvalidCircuit::EmptyMeasurement(key.clone()));
                }
                if targets.len() > MAX_MEASUREMENT_WIDTH {
                    return Err(InvalidCircuit::TooWide {
                        key: key.clone(),
                        width: targets.len(),
                        max: MAX_MEASUREMENT_WIDTH,
                    });
                }
                if !keys.insert(key.as_str()) {
                    return Err(InvalidCircuit::DuplicateKey(key.clone()));
                }
                targets.iter()
                    .for_each(|q| { last_meas.insert(*q, key.as_str()); });
            }
            let is_meas = op.is_measurement();
            op.targets().iter()
                .for_each(|q| { last_touch.insert(*q, (t, is_meas)); });
        }
    }

    if keys.is_empty() { return Err(InvalidCircuit::NoMeasurements); }

    let violation
        = last_meas.iter()
        .filter_map(|(q, key)| {
            let (t, is_meas) = last_touch[q];
            (!is_meas).then_some((*q, t, *key))
        })
        .min_by_key(|(q, ..)| *q);
    match violation {
        Some((qubit, moment, key)) => {
            Err(InvalidCircuit::OperationAfterMeasurement {
                qubit,
                moment,
                key: key.to_string(),
            })
        },
        None => Ok(()),
    }
}
