//! Dense state-vector representation.
//!
//! An *n*-qubit state is stored as 2<sup>*n*</sup> complex amplitudes indexed
//! big-endian: qubit 0 is the most significant bit of the basis index. This
//! module supplies the [`apply`] and [`probability`] capabilities for use with
//! [`Simulator`][crate::sim::Simulator].

use nalgebra as na;
use num_complex::Complex64 as C64;
use crate::{
    circuit::Action,
    error::{ BackendError, BackendResult },
    gate::Gate,
};

// bit mask for qubit `q` in an `n`-qubit big-endian index
pub(crate) fn mask(n: usize, q: usize) -> usize { 1 << (n - 1 - q) }

pub(crate) fn check_qubits(n: usize, qubits: &[usize]) -> BackendResult<()> {
    match qubits.iter().find(|q| **q >= n) {
        Some(q) => Err(BackendError::QubitOutOfRange { qubit: *q, n }),
        None => Ok(()),
    }
}

pub(crate) fn check_arity(gate: &Gate, targets: &[usize]) -> BackendResult<()> {
    if gate.arity() == targets.len() {
        Ok(())
    } else {
        Err(BackendError::ArityMismatch {
            gate: gate.to_string(),
            expected: gate.arity(),
            found: targets.len(),
        })
    }
}

pub(crate) fn check_outcome(qubits: &[usize], bits: &[bool])
    -> BackendResult<()>
{
    if qubits.len() == bits.len() {
        Ok(())
    } else {
        Err(BackendError::OutcomeLength {
            expected: qubits.len(),
            found: bits.len(),
        })
    }
}

// `true` if basis index `i` agrees with `bits` on `qubits`
pub(crate) fn consistent(n: usize, i: usize, qubits: &[usize], bits: &[bool])
    -> bool
{
    qubits.iter().zip(bits)
        .all(|(q, b)| (i & mask(n, *q) != 0) == *b)
}

/// Multiply `u` into the subspace of `targets` of an `n`-qubit amplitude
/// vector, conjugating `u` first if `conj` is `true`.
///
/// The first target is the most significant bit of `u`'s row/column index.
pub(crate) fn apply_unitary(
    amps: &mut [C64],
    n: usize,
    targets: &[usize],
    u: &na::DMatrix<C64>,
    conj: bool,
) {
    let k = targets.len();
    let dim = 1_usize << k;
    let target_mask: usize
        = targets.iter().map(|q| mask(n, *q)).fold(0, |acc, m| acc | m);
    // offsets[j] is the index shift for local basis state j
    let offsets: Vec<usize>
        = (0..dim)
        .map(|j| {
            targets.iter().enumerate()
                .filter(|(t, _)| (j >> (k - 1 - t)) & 1 == 1)
                .map(|(_, q)| mask(n, *q))
                .fold(0, |acc, m| acc | m)
        })
        .collect();
    let mut old: Vec<C64> = vec![C64::from(0.0); dim];
    for base in (0..amps.len()).filter(|i| i & target_mask == 0) {
        old.iter_mut().zip(&offsets)
            .for_each(|(a, off)| { *a = amps[base | off]; });
        for (r, off) in offsets.iter().enumerate() {
            amps[base | off]
                = old.iter().enumerate()
                .map(|(c, a)| {
                    let urc = u[(r, c)];
                    if conj { urc.conj() * a } else { urc * a }
                })
                .sum();
        }
    }
}

/// A pure state of a finite register of qubits.
#[derive(Clone, Debug, PartialEq)]
pub struct StateVec {
    n: usize,
    amps: Vec<C64>,
}

impl StateVec {
    /// Create a new state of `n` qubits initialized to ∣0...0⟩.
    pub fn new(n: usize) -> Self { Self::basis(n, 0) }

    /// Create a new state of `n` qubits in the `k`-th computational basis
    /// state (big-endian).
    ///
    /// *Panics if `k >= 2^n`.*
    pub fn basis(n: usize, k: usize) -> Self {
        let mut amps = vec![C64::from(0.0); 1 << n];
        if k >= amps.len() {
            panic!("StateVec::basis: basis index out of range");
        }
        amps[k] = C64::from(1.0);
        Self { n, amps }
    }

    /// Create a state from raw amplitudes, normalizing them.
    ///
    /// Returns `None` if the length is not a power of two or the vector has
    /// zero norm.
    pub fn from_amps(amps: Vec<C64>) -> Option<Self> {
        if !amps.len().is_power_of_two() { return None; }
        let n = amps.len().trailing_zeros() as usize;
        let mut state = Self { n, amps };
        let norm = state.norm_sqr().sqrt();
        (norm > 0.0).then(|| {
            state.amps.iter_mut().for_each(|a| { *a /= norm; });
            state
        })
    }

    /// Return the number of qubits.
    pub fn num_qubits(&self) -> usize { self.n }

    /// Return the amplitudes, indexed big-endian.
    pub fn amps(&self) -> &[C64] { &self.amps }

    fn norm_sqr(&self) -> f64 { self.amps.iter().map(|a| a.norm_sqr()).sum() }

    /// Apply a gate to `targets`.
    pub fn apply_gate(&mut self, gate: &Gate, targets: &[usize])
        -> BackendResult<&mut Self>
    {
        check_arity(gate, targets)?;
        check_qubits(self.n, targets)?;
        apply_unitary(&mut self.amps, self.n, targets, gate.matrix(), false);
        Ok(self)
    }

    /// Return the probability of observing `bits` on `qubits`.
    pub fn probability(&self, qubits: &[usize], bits: &[bool])
        -> BackendResult<f64>
    {
        check_qubits(self.n, qubits)?;
        check_outcome(qubits, bits)?;
        let p: f64
            = self.amps.iter().enumerate()
            .filter(|(i, _)| consistent(self.n, *i, qubits, bits))
            .map(|(_, a)| a.norm_sqr())
            .sum();
        Ok(p)
    }

    /// Project onto the subspace where `qubits` read `bits` and renormalize.
    pub fn collapse(&mut self, qubits: &[usize], bits: &[bool])
        -> BackendResult<&mut Self>
    {
        let p = self.probability(qubits, bits)?;
        if p <= 0.0 {
            return Err(BackendError::ImpossibleOutcome { qubits: qubits.to_vec() });
        }
        let renorm = p.sqrt();
        let n = self.n;
        self.amps.iter_mut().enumerate()
            .for_each(|(i, a)| {
                if consistent(n, i, qubits, bits) {
                    *a /= renorm;
                } else {
                    *a = C64::from(0.0);
                }
            });
        Ok(self)
    }
}

/// Apply capability for [`StateVec`].
pub fn apply(state: &mut StateVec, action: Action<'_, Gate>)
    -> BackendResult<()>
{
    match action {
        Action::Gate { gate, targets }
            => state.apply_gate(gate, targets).map(|_| ()),
        Action::Collapse { targets, outcome }
            => state.collapse(targets, outcome).map(|_| ()),
    }
}

/// Probability capability for [`StateVec`].
pub fn probability(state: &StateVec, qubits: &[usize], bits: &[bool])
    -> BackendResult<f64>
{
    state.probability(qubits, bits)
}
