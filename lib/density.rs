//! Dense density-matrix representation.
//!
//! An *n*-qubit density matrix ρ is stored row-major as a flat vector of
//! 4<sup>*n*</sup> entries, i.e. as a 2*n*-qubit "state" whose first *n*
//! qubits index rows and last *n* qubits index columns. Gates then act as
//! *U* on the row qubits and *U*\* on the column qubits, which reuses the
//! state-vector kernel.

use num_complex::Complex64 as C64;
use crate::{
    circuit::Action,
    error::{ BackendError, BackendResult },
    gate::Gate,
    statevec::{
        self,
        apply_unitary,
        check_arity,
        check_outcome,
        check_qubits,
        consistent,
        StateVec,
    },
};

/// A mixed state of a finite register of qubits.
#[derive(Clone, Debug, PartialEq)]
pub struct DensityMatrix {
    n: usize,
    rho: Vec<C64>,
}

impl DensityMatrix {
    /// Create a new density matrix of `n` qubits initialized to ∣0...0⟩⟨0...0∣.
    pub fn new(n: usize) -> Self {
        let mut rho = vec![C64::from(0.0); 1 << (2 * n)];
        rho[0] = C64::from(1.0);
        Self { n, rho }
    }

    /// Return the number of qubits.
    pub fn num_qubits(&self) -> usize { self.n }

    /// Return the (`r`, `c`) element of ρ.
    ///
    /// *Panics if either index is out of bounds.*
    pub fn get(&self, r: usize, c: usize) -> C64 {
        let dim = 1 << self.n;
        if r >= dim || c >= dim {
            panic!("DensityMatrix::get: index out of bounds");
        }
        self.rho[(r << self.n) | c]
    }

    /// Return the trace of ρ.
    pub fn trace(&self) -> f64 {
        (0..1_usize << self.n).map(|k| self.get(k, k).re).sum()
    }

    /// Apply a gate to `targets`.
    pub fn apply_gate(&mut self, gate: &Gate, targets: &[usize])
        -> BackendResult<&mut Self>
    {
        check_arity(gate, targets)?;
        check_qubits(self.n, targets)?;
        let n2 = 2 * self.n;
        let cols: Vec<usize> = targets.iter().map(|q| q + self.n).collect();
        apply_unitary(&mut self.rho, n2, targets, gate.matrix(), false);
        apply_unitary(&mut self.rho, n2, &cols, gate.matrix(), true);
        Ok(self)
    }

    /// Return the probability of observing `bits` on `qubits`.
    pub fn probability(&self, qubits: &[usize], bits: &[bool])
        -> BackendResult<f64>
    {
        check_qubits(self.n, qubits)?;
        check_outcome(qubits, bits)?;
        let p: f64
            = (0..1_usize << self.n)
            .filter(|k| consistent(self.n, *k, qubits, bits))
            .map(|k| self.get(k, k).re)
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
        let n = self.n;
        let col_mask = (1_usize << n) - 1;
        self.rho.iter_mut().enumerate()
            .for_each(|(i, a)| {
                let r = i >> n;
                let c = i & col_mask;
                if consistent(n, r, qubits, bits) && consistent(n, c, qubits, bits) {
                    *a /= p;
                } else {
                    *a = C64::from(0.0);
                }
            });
        Ok(self)
    }
}

impl From<&StateVec> for DensityMatrix {
    fn from(state: &StateVec) -> Self {
        let amps = state.amps();
        let rho: Vec<C64>
            = amps.iter()
            .flat_map(|r| amps.iter().map(move |c| r * c.conj()))
            .collect();
        Self { n: state.num_qubits(), rho }
    }
}

/// Apply capability for [`DensityMatrix`].
pub fn apply(state: &mut DensityMatrix, action: Action<'_, Gate>)
    -> BackendResult<()>
{
    match action {
        Action::Gate { gate, targets }
            => state.apply_gate(gate, targets).map(|_| ()),
        Action::Collapse { targets, outcome }
            => state.collapse(targets, outcome).map(|_| ()),
    }
}

/// Probability capability for [`DensityMatrix`].
pub fn probability(state: &DensityMatrix, qubits: &[usize], bits: &[bool])
    -> BackendResult<f64>
{
    state.probability(qubits, bits)
}

#[cfg(test)]
mod test {
    use super::*;

    const EPSILON: f64 = 1e-12;

    fn close(a: &DensityMatrix, b: &DensityMatrix) -> bool {
        a.n == b.n
            && a.rho.iter().zip(&b.rho).all(|(x, y)| (x - y).norm() < EPSILON)
    }

    #[test]
    fn matches_pure_state() {
        let gates: [(Gate, &[usize]); 5] = [
            (Gate::H, &[0]),
            (Gate::T, &[0]),
            (Gate::CX, &[0, 2]),
            (Gate::S, &[2]),
            (Gate::Swap, &[1, 2]),
        ];
        let mut sv = StateVec::new(3);
        let mut dm = DensityMatrix::new(3);
        for (g, t) in gates.iter() {
            sv.apply_gate(g, t).unwrap();
            dm.apply_gate(g, t).unwrap();
        }
        assert!(close(&dm, &DensityMatrix::from(&sv)));
        assert!((dm.trace() - 1.0).abs() < EPSILON);
        for k in 0..8_usize {
            let bits = [k & 4 != 0, k & 2 != 0, k & 1 != 0];
            let p_sv = statevec::probability(&sv, &[0, 1, 2], &bits).unwrap();
            let p_dm = probability(&dm, &[0, 1, 2], &bits).unwrap();
            assert!((p_sv - p_dm).abs() < EPSILON);
        }
    }

    #[test]
    fn collapse_matches_pure_state() {
        let mut sv = StateVec::new(2);
        sv.apply_gate(&Gate::H, &[0]).unwrap()
            .apply_gate(&Gate::CX, &[0, 1]).unwrap();
        let mut dm = DensityMatrix::from(&sv);
        sv.collapse(&[1], &[true]).unwrap();
        dm.collapse(&[1], &[true]).unwrap();
        assert!(close(&dm, &DensityMatrix::from(&sv)));
        assert!((dm.get(3, 3).re - 1.0).abs() < EPSILON);
    }

    #[test]
    fn impossible_collapse() {
        let mut dm = DensityMatrix::new(2);
        assert_eq!(
            dm.collapse(&[0, 1], &[false, true]).unwrap_err(),
            BackendError::ImpossibleOutcome { qubits: vec![0, 1] },
        );
    }
}
