//! Stabilizer tableau representation for Clifford circuits.
//!
//! States are stored in the form of Aaronson and Gottesman's "CHP" tableau:
//! `n` destabilizer rows, then `n` stabilizer rows, then one scratch row, with
//! the Pauli bits of every row packed into `u32`s. Only Clifford gates can be
//! applied; [`Gate::T`] and [`Gate::Tdg`] are rejected with
//! [`BackendError::NonClifford`].
//!
//! Outcome probabilities of a stabilizer state are always 0, 1, or a power of
//! ½, and are computed here by post-selecting qubits one at a time on a copy
//! of the tableau.

use itertools::Itertools;
use ndarray::{ self as nd, s };
use crate::{
    circuit::Action,
    error::{ BackendError, BackendResult },
    gate::Gate,
    statevec::{ check_arity, check_outcome, check_qubits },
};

const PW: [u32; 32] = [ // PW[i] = 2^i
    1, 2, 4, 8, 16, 32, 64, 128, 256, 512, 1024, 2048, 4096, 8192, 16384, 32768,
    65536, 131072, 262144, 524288, 1048576, 2097152, 4194304, 8388608, 16777216,
    33554432, 67108864, 134217728, 268435456, 536870912, 1073741824, 2147483648
];

/// A stabilizer state of a finite register of qubits, identified by its
/// stabilizer group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stab {
    n: usize,
    // `x` and `z` are bit arrays of size (2n + 1) × n; for space efficiency,
    // the columns are packed into u32s
    x: nd::Array2<u32>, // Pauli-X bits; size (2n + 1) × (floor(n / 32) + 1)
    z: nd::Array2<u32>, // Pauli-Z bits; size (2n + 1) × (floor(n / 32) + 1)
    r: nd::Array1<u8>, // Phases (0 for +1, 2 for -1); size 2n + 1
}

impl Stab {
    /// Create a new stabilizer state of size `n` initialized to ∣0...0⟩.
    pub fn new(n: usize) -> Self {
        let over32: usize = (n >> 5) + 1;
        let mut x: nd::Array2<u32> = nd::Array2::zeros((2 * n + 1, over32));
        let mut z: nd::Array2<u32> = nd::Array2::zeros((2 * n + 1, over32));
        let r: nd::Array1<u8> = nd::Array1::zeros(2 * n + 1);
        for i in 0..n {
            x[[i, i >> 5]] = PW[i & 31];
            z[[i + n, i >> 5]] = PW[i & 31];
        }
        Self { n, x, z, r }
    }

    /// Return the number of qubits.
    pub fn num_qubits(&self) -> usize { self.n }

    pub fn apply_h(&mut self, k: usize) -> &mut Self {
        let k5: usize = k >> 5;
        let pw: u32 = PW[k & 31];
        let mut tmp: u32;
        for ((x_i_k5, z_i_k5), r_i) in
            self.x.slice_mut(s![.., k5]).iter_mut()
                .zip(self.z.slice_mut(s![.., k5]).iter_mut())
                .zip(self.r.iter_mut())
                .take(2 * self.n)
        {
            tmp = *x_i_k5;
            *x_i_k5 ^= (*x_i_k5 ^ *z_i_k5) & pw;
            *z_i_k5 ^= (*z_i_k5 ^ tmp) & pw;
            if *x_i_k5 & pw != 0 && *z_i_k5 & pw != 0 { *r_i = (*r_i + 2) % 4; }
        }
        self
    }

    pub fn apply_s(&mut self, k: usize) -> &mut Self {
        let k5: usize = k >> 5;
        let pw: u32 = PW[k & 31];
        for ((x_i_k5, z_i_k5), r_i) in
            self.x.slice_mut(s![.., k5]).iter_mut()
                .zip(self.z.slice_mut(s![.., k5]).iter_mut())
                .zip(self.r.iter_mut())
                .take(2 * self.n)
        {
            if *x_i_k5 & pw != 0 && *z_i_k5 & pw != 0 { *r_i = (*r_i + 2) % 4; }
            *z_i_k5 ^= *x_i_k5 & pw;
        }
        self
    }

    pub fn apply_sdg(&mut self, k: usize) -> &mut Self {
        self.apply_s(k).apply_z(k)
    }

    // X and Z only flip signs of anticommuting rows
    pub fn apply_x(&mut self, k: usize) -> &mut Self {
        let k5: usize = k >> 5;
        let pw: u32 = PW[k & 31];
        for (z_i_k5, r_i) in
            self.z.slice(s![.., k5]).iter()
                .zip(self.r.iter_mut())
                .take(2 * self.n)
        {
            if *z_i_k5 & pw != 0 { *r_i = (*r_i + 2) % 4; }
        }
        self
    }

    pub fn apply_z(&mut self, k: usize) -> &mut Self {
        let k5: usize = k >> 5;
        let pw: u32 = PW[k & 31];
        for (x_i_k5, r_i) in
            self.x.slice(s![.., k5]).iter()
                .zip(self.r.iter_mut())
                .take(2 * self.n)
        {
            if *x_i_k5 & pw != 0 { *r_i = (*r_i + 2) % 4; }
        }
        self
    }

    pub fn apply_y(&mut self, k: usize) -> &mut Self {
        self.apply_x(k).apply_z(k)
    }

    pub fn apply_cnot(&mut self, a: usize, b: usize) -> &mut Self {
        let a5: usize = a >> 5;
        let b5: usize = b >> 5;
        let pwa: u32 = PW[a & 31];
        let pwb: u32 = PW[b & 31];
        for ((mut x_i, mut z_i), r_i) in
            self.x.axis_iter_mut(nd::Axis(0))
                .zip(self.z.axis_iter_mut(nd::Axis(0)))
                .zip(self.r.iter_mut())
                .take(2 * self.n)
        {
            if x_i[a5] & pwa != 0 { x_i[b5] ^= pwb; }
            if z_i[b5] & pwb != 0 { z_i[a5] ^= pwa; }
            if x_i[a5] & pwa != 0 && z_i[b5] & pwb != 0
                && x_i[b5] & pwb != 0 && z_i[a5] & pwa != 0
            { *r_i = (*r_i + 2) % 4; }
            if x_i[a5] & pwa != 0 && z_i[b5] & pwb != 0
                && x_i[b5] & pwb == 0 && z_i[a5] & pwa == 0
            { *r_i = (*r_i + 2) % 4; }
        }
        self
    }

    pub fn apply_cz(&mut self, a: usize, b: usize) -> &mut Self {
        self.apply_h(b).apply_cnot(a, b).apply_h(b)
    }

    pub fn apply_swap(&mut self, a: usize, b: usize) -> &mut Self {
        self.apply_cnot(a, b).apply_cnot(b, a).apply_cnot(a, b)
    }

    /// Perform the action of a gate on `targets`.
    pub fn apply_gate(&mut self, gate: &Gate, targets: &[usize])
        -> BackendResult<&mut Self>
    {
        check_arity(gate, targets)?;
        check_qubits(self.n, targets)?;
        match (gate, targets) {
            (Gate::I, _) => Ok(self),
            (Gate::H, &[k]) => Ok(self.apply_h(k)),
            (Gate::X, &[k]) => Ok(self.apply_x(k)),
            (Gate::Y, &[k]) => Ok(self.apply_y(k)),
            (Gate::Z, &[k]) => Ok(self.apply_z(k)),
            (Gate::S, &[k]) => Ok(self.apply_s(k)),
            (Gate::Sdg, &[k]) => Ok(self.apply_sdg(k)),
            (Gate::CX, &[a, b]) => Ok(self.apply_cnot(a, b)),
            (Gate::CZ, &[a, b]) => Ok(self.apply_cz(a, b)),
            (Gate::Swap, &[a, b]) => Ok(self.apply_swap(a, b)),
            _ => Err(BackendError::NonClifford(gate.to_string())),
        }
    }

    fn row_copy(&mut self, a: usize, b: usize) -> &mut Self {
        // set row b equal to row a
        for (mut x__j, mut z__j) in
            self.x.axis_iter_mut(nd::Axis(1))
                .zip(self.z.axis_iter_mut(nd::Axis(1)))
        {
            x__j[b] = x__j[a];
            z__j[b] = z__j[a];
        }
        self.r[b] = self.r[a];
        self
    }

    // set row k equal to the o-th observable (X_1, ... X_n, Z_1, ..., Z_n)
    fn row_set(&mut self, o: usize, k: usize) -> &mut Self {
        self.x.slice_mut(s![k, ..]).fill(0);
        self.z.slice_mut(s![k, ..]).fill(0);
        self.r[k] = 0;
        if o < self.n {
            self.x[[k, o >> 5]] = PW[o & 31];
        } else {
            let o = o - self.n;
            self.z[[k, o >> 5]] = PW[o & 31];
        }
        self
    }

    // return the phase (0, ..., 3) when row b is left-multiplied by row a
    fn row_mul_phase(&self, a: usize, b: usize) -> u8 {
        let mut e: i32 = 0;
        let xa = self.x.slice(s![a, ..]);
        let xb = self.x.slice(s![b, ..]);
        let za = self.z.slice(s![a, ..]);
        let zb = self.z.slice(s![b, ..]);
        for ((&xaj, &xbj), (&zaj, &zbj)) in
            xa.iter().zip(xb).zip(za.iter().zip(zb))
        {
            for &pw in PW.iter() {
                if xaj & pw != 0 && zaj & pw == 0 {
                    if xbj & pw != 0 && zbj & pw != 0 { e += 1; }
                    if xbj & pw == 0 && zbj & pw != 0 { e -= 1; }
                }
                if xaj & pw != 0 && zaj & pw != 0 {
                    if xbj & pw == 0 && zbj & pw != 0 { e += 1; }
                    if xbj & pw != 0 && zbj & pw == 0 { e -= 1; }
                }
                if xaj & pw == 0 && zaj & pw != 0 {
                    if xbj & pw != 0 && zbj & pw == 0 { e += 1; }
                    if xbj & pw != 0 && zbj & pw != 0 { e -= 1; }
                }
            }
        }
        e = (e + i32::from(self.r[b]) + i32::from(self.r[a])).rem_euclid(4);
        e as u8
    }

    // left-multiply row b by row a
    fn row_mul(&mut self, a: usize, b: usize) -> &mut Self {
        self.r[b] = self.row_mul_phase(a, b);
        for (mut x__j, mut z__j) in
            self.x.axis_iter_mut(nd::Axis(1))
                .zip(self.z.axis_iter_mut(nd::Axis(1)))
        {
            x__j[b] ^= x__j[a];
            z__j[b] ^= z__j[a];
        }
        self
    }

    /// Post-select qubit `k` on a Z-basis outcome.
    ///
    /// Returns the probability of that outcome before the projection, which is
    /// ½ for a random measurement and 1 for a deterministic one. If the outcome
    /// is impossible, `None` is returned and `self` is left unchanged.
    pub fn postselect(&mut self, k: usize, outcome: bool) -> Option<f64> {
        let n = self.n;
        let k5: usize = k >> 5;
        let pw: u32 = PW[k & 31];

        // a stabilizer anticommuting with Z_k makes the outcome random
        let p: Option<usize>
            = self.x.slice(s![n..2 * n, k5]).iter()
            .position(|x_q_k5| x_q_k5 & pw != 0);

        if let Some(p) = p {
            self.row_copy(p + n, p);
            self.row_set(k + n, p + n);
            self.r[p + n] = 2 * u8::from(outcome);
            for i in 0..2 * n {
                if i != p && self.x[[i, k5]] & pw != 0 { self.row_mul(p, i); }
            }
            Some(0.5)
        } else {
            // otherwise Z_k is (up to sign) a product of stabilizers, which is
            // accumulated in the scratch row
            let m: usize
                = self.x.slice(s![..n, k5]).iter()
                .position(|x_q_k5| x_q_k5 & pw != 0)?;
            self.row_copy(m + n, 2 * n);
            for i in m + 1..n {
                if self.x[[i, k5]] & pw != 0 { self.row_mul(i + n, 2 * n); }
            }
            let det = self.r[2 * n] != 0;
            self.x.slice_mut(s![2 * n, ..]).fill(0);
            self.z.slice_mut(s![2 * n, ..]).fill(0);
            self.r[2 * n] = 0;
            (det == outcome).then_some(1.0)
        }
    }

    /// Return the probability of observing `bits` on `qubits`.
    pub fn probability(&self, qubits: &[usize], bits: &[bool])
        -> BackendResult<f64>
    {
        check_qubits(self.n, qubits)?;
        check_outcome(qubits, bits)?;
        let mut scratch = self.clone();
        let mut p: f64 = 1.0;
        for (q, b) in qubits.iter().zip(bits) {
            match scratch.postselect(*q, *b) {
                Some(pk) => { p *= pk; },
                None => { return Ok(0.0); },
            }
        }
        Ok(p)
    }

    /// Project onto the subspace where `qubits` read `bits`.
    ///
    /// If the outcome is impossible, an error is returned and `self` may be
    /// partially projected.
    pub fn collapse(&mut self, qubits: &[usize], bits: &[bool])
        -> BackendResult<&mut Self>
    {
        check_qubits(self.n, qubits)?;
        check_outcome(qubits, bits)?;
        for (q, b) in qubits.iter().zip(bits) {
            if self.postselect(*q, *b).is_none() {
                return Err(
                    BackendError::ImpossibleOutcome { qubits: qubits.to_vec() });
            }
        }
        Ok(self)
    }

    /// Render the stabilizer generators as signed Pauli strings, e.g. `+XX`.
    pub fn stabilizers(&self) -> Vec<String> {
        let n = self.n;
        (n..2 * n)
            .map(|i| {
                let sign = if self.r[i] == 0 { '+' } else { '-' };
                let ops
                    = (0..n)
                    .map(|j| {
                        let pw = PW[j & 31];
                        let xij = self.x[[i, j >> 5]] & pw != 0;
                        let zij = self.z[[i, j >> 5]] & pw != 0;
                        match (xij, zij) {
                            (false, false) => 'I',
                            (true, false) => 'X',
                            (true, true) => 'Y',
                            (false, true) => 'Z',
                        }
                    })
                    .join("");
                format!("{}{}", sign, ops)
            })
            .collect()
    }
}

/// Apply capability for [`Stab`].
pub fn apply(state: &mut Stab, action: Action<'_, Gate>) -> BackendResult<()> {
    match action {
        Action::Gate { gate, targets }
            => state.apply_gate(gate, targets).map(|_| ()),
        Action::Collapse { targets, outcome }
            => state.collapse(targets, outcome).map(|_| ()),
    }
}

/// Probability capability for [`Stab`].
pub fn probability(state: &Stab, qubits: &[usize], bits: &[bool])
    -> BackendResult<f64>
{
    state.probability(qubits, bits)
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::{ rngs::StdRng, SeedableRng };
    use crate::{
        circuit::Operation,
        gate::random_circuit,
        statevec::StateVec,
    };

    #[test]
    fn ghz_probabilities() {
        let mut stab = Stab::new(3);
        stab.apply_h(0).apply_cnot(0, 1).apply_cnot(1, 2);
        assert_eq!(stab.probability(&[0, 1, 2], &[false, false, false]).unwrap(), 0.5);
        assert_eq!(stab.probability(&[0, 1, 2], &[true, true, true]).unwrap(), 0.5);
        assert_eq!(stab.probability(&[0, 2], &[true, false]).unwrap(), 0.0);
        assert_eq!(stab.probability(&[1], &[true]).unwrap(), 0.5);
    }

    #[test]
    fn single_qubit_signs() {
        let mut stab = Stab::new(1);
        assert_eq!(stab.stabilizers(), vec!["+Z".to_string()]);
        stab.apply_x(0);
        assert_eq!(stab.stabilizers(), vec!["-Z".to_string()]);
        stab.apply_h(0);
        assert_eq!(stab.stabilizers(), vec!["-X".to_string()]);
        stab.apply_s(0);
        assert_eq!(stab.stabilizers(), vec!["-Y".to_string()]);
        stab.apply_sdg(0);
        assert_eq!(stab.stabilizers(), vec!["-X".to_string()]);
    }

    #[test]
    fn collapse_is_sticky() {
        let mut stab = Stab::new(2);
        stab.apply_h(0).apply_cnot(0, 1);
        stab.collapse(&[1], &[true]).unwrap();
        assert_eq!(stab.probability(&[0], &[true]).unwrap(), 1.0);
        assert_eq!(stab.probability(&[0, 1], &[true, true]).unwrap(), 1.0);
        let before = stab.clone();
        assert_eq!(
            stab.collapse(&[0], &[false]).unwrap_err(),
            BackendError::ImpossibleOutcome { qubits: vec![0] },
        );
        assert_eq!(stab, before);
    }

    #[test]
    fn rejects_non_clifford() {
        let mut stab = Stab::new(1);
        assert_eq!(
            stab.apply_gate(&Gate::T, &[0]).unwrap_err(),
            BackendError::NonClifford("T".into()),
        );
    }

    #[test]
    fn matches_state_vector_on_random_cliffords() {
        let mut rng = StdRng::seed_from_u64(10546);
        let gates = [
            Gate::H, Gate::S, Gate::Sdg, Gate::X, Gate::Y, Gate::Z,
            Gate::CX, Gate::CZ, Gate::Swap,
        ];
        let n = 4;
        for _ in 0..20 {
            let circuit = random_circuit(n, 12, 0.8, &gates, &mut rng);
            let mut stab = Stab::new(n);
            let mut sv = StateVec::new(n);
            for op in circuit.operations() {
                if let Operation::Gate { gate, targets } = op {
                    stab.apply_gate(gate, targets).unwrap();
                    sv.apply_gate(gate, targets).unwrap();
                }
            }
            for k in 0..1_usize << n {
                let bits: Vec<bool> = (0..n).map(|j| k >> (n - 1 - j) & 1 == 1).collect();
                let qubits: Vec<usize> = (0..n).collect();
                let p_stab = stab.probability(&qubits, &bits).unwrap();
                let p_sv = sv.probability(&qubits, &bits).unwrap();
                assert!((p_stab - p_sv).abs() < 1e-9);
            }
        }
    }
}
