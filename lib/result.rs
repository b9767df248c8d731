//! Accumulation of per-repetition measurement outcomes.

use std::{ collections::BTreeMap, fmt };
use itertools::Itertools;
use rustc_hash::FxHashMap;

/// Encode a bit-vector as an integer, with the first bit as the most
/// significant.
pub fn bits_to_int(bits: &[bool]) -> u64 {
    bits.iter().fold(0, |acc, b| (acc << 1) | u64::from(*b))
}

/// Decode the `width` least significant bits of `k` into a bit-vector, most
/// significant first.
pub fn int_to_bits(k: u64, width: usize) -> Vec<bool> {
    (0..width).rev().map(|j| (k >> j) & 1 == 1).collect()
}

/// Outcomes recorded under a single measurement key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyRecord {
    qubits: Vec<usize>,
    shots: Vec<Vec<bool>>,
}

impl KeyRecord {
    /// Return the measured qubits, in the order bits are stored.
    pub fn qubits(&self) -> &[usize] { &self.qubits }

    /// Return one bit-vector per repetition.
    pub fn shots(&self) -> &[Vec<bool>] { &self.shots }
}

/// Classical results of a run: for every measurement key, an ordered sequence
/// of bit-vectors with one entry per repetition.
///
/// Two records are equal if and only if they hold the same keys with the same
/// outcomes in the same repetition order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResultRecord {
    records: BTreeMap<String, KeyRecord>,
}

impl ResultRecord {
    /// Create a new, empty record.
    pub fn new() -> Self { Self::default() }

    /// Record the outcome of measurement `key` on `qubits` in the
    /// `repetition`-th repetition.
    ///
    /// *Panics if `repetition` is not the next unrecorded repetition for
    /// `key`, or if `bits` does not match the width of earlier outcomes.*
    pub fn record(
        &mut self,
        key: &str,
        qubits: &[usize],
        repetition: usize,
        bits: Vec<bool>,
    ) {
        let entry
            = self.records.entry(key.to_string())
            .or_insert_with(|| {
                KeyRecord { qubits: qubits.to_vec(), shots: Vec::new() }
            });
        if repetition != entry.shots.len() {
            panic!(
                "ResultRecord::record: expected repetition {} for key '{}', \
                got {}",
                entry.shots.len(), key, repetition,
            );
        }
        if bits.len() != entry.qubits.len() {
            panic!(
                "ResultRecord::record: key '{}' holds {}-bit outcomes, got {}",
                key, entry.qubits.len(), bits.len(),
            );
        }
        entry.shots.push(bits);
    }

    /// Return the number of repetitions recorded.
    pub fn repetitions(&self) -> usize {
        self.records.values().map(|rec| rec.shots.len()).max().unwrap_or(0)
    }

    /// Iterate over all measurement keys, in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.records.keys().map(|k| k.as_str())
    }

    /// Return the full record for `key`.
    pub fn get(&self, key: &str) -> Option<&KeyRecord> { self.records.get(key) }

    /// Return the qubits measured under `key`.
    pub fn qubits(&self, key: &str) -> Option<&[usize]> {
        self.records.get(key).map(|rec| rec.qubits())
    }

    /// Return the bit-vectors recorded under `key`, one per repetition.
    pub fn measurements(&self, key: &str) -> Option<&[Vec<bool>]> {
        self.records.get(key).map(|rec| rec.shots())
    }

    /// Return the integer-encoded outcome of `key` in the `repetition`-th
    /// repetition.
    pub fn outcome(&self, key: &str, repetition: usize) -> Option<u64> {
        self.records.get(key)
            .and_then(|rec| rec.shots.get(repetition))
            .map(Vec::as_slice)
            .map(bits_to_int)
    }

    /// Return integer-encoded outcomes of `key` in repetition order.
    pub fn outcomes(&self, key: &str) -> Option<Vec<u64>> {
        self.records.get(key)
            .map(|rec| {
                rec.shots.iter().map(Vec::as_slice).map(bits_to_int).collect()
            })
    }

    /// Count the occurrences of each distinct outcome of `key`.
    ///
    /// Outcomes are encoded by [`bits_to_int`]; an unknown key gives an empty
    /// histogram.
    pub fn histogram(&self, key: &str) -> FxHashMap<u64, usize> {
        let mut counts: FxHashMap<u64, usize> = FxHashMap::default();
        if let Some(rec) = self.records.get(key) {
            rec.shots.iter()
                .for_each(|b| { *counts.entry(bits_to_int(b)).or_insert(0) += 1; });
        }
        counts
    }
}

impl fmt::Display for ResultRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.records.len();
        for (i, (key, rec)) in self.records.iter().enumerate() {
            let columns
                = (0..rec.qubits.len())
                .map(|j| {
                    rec.shots.iter()
                        .map(|bits| if bits[j] { '1' } else { '0' })
                        .collect::<String>()
                })
                .join(", ");
            write!(f, "{}={}", key, columns)?;
            if i < n - 1 { writeln!(f)?; }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn bit_encoding_is_big_endian() {
        assert_eq!(bits_to_int(&[true, false, false]), 4);
        assert_eq!(bits_to_int(&[false, true, true]), 3);
        assert_eq!(bits_to_int(&[]), 0);
        assert_eq!(int_to_bits(6, 3), vec![true, true, false]);
        assert_eq!(bits_to_int(&int_to_bits(0b10110, 5)), 0b10110);
    }

    #[test]
    fn histogram_counts_outcomes() {
        let mut rec = ResultRecord::new();
        rec.record("z", &[0, 1], 0, vec![false, false]);
        rec.record("z", &[0, 1], 1, vec![true, true]);
        rec.record("z", &[0, 1], 2, vec![true, true]);
        let hist = rec.histogram("z");
        assert_eq!(hist.len(), 2);
        assert_eq!(hist[&0], 1);
        assert_eq!(hist[&3], 2);
        assert!(rec.histogram("nope").is_empty());
        assert_eq!(rec.repetitions(), 3);
        assert_eq!(rec.outcome("z", 1), Some(3));
        assert_eq!(rec.outcomes("z"), Some(vec![0, 3, 3]));
        assert_eq!(rec.qubits("z"), Some(&[0, 1][..]));
    }

    #[test]
    fn equality_is_order_sensitive() {
        let mut a = ResultRecord::new();
        a.record("m", &[0], 0, vec![false]);
        a.record("m", &[0], 1, vec![true]);
        let mut b = ResultRecord::new();
        b.record("m", &[0], 0, vec![true]);
        b.record("m", &[0], 1, vec![false]);
        assert_eq!(a.histogram("m"), b.histogram("m"));
        assert_ne!(a, b);
    }

    #[test]
    #[should_panic]
    fn record_rejects_skipped_repetition() {
        let mut rec = ResultRecord::new();
        rec.record("m", &[0], 1, vec![true]);
    }

    #[test]
    fn display_columns_per_qubit() {
        let mut rec = ResultRecord::new();
        rec.record("a", &[0, 1], 0, vec![false, true]);
        rec.record("a", &[0, 1], 1, vec![true, true]);
        rec.record("b", &[2], 0, vec![false]);
        rec.record("b", &[2], 1, vec![true]);
        assert_eq!(rec.to_string(), "a=01, 11\nb=01");
    }
}
