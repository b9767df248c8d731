//! Expansion of near-Clifford circuits into sums of Clifford circuits.
//!
//! Each *T* gate is written as a linear combination *T* = *a I* + *b S*, with
//! *b* = (1 - ω) / (1 - *i*), *a* = 1 - *b*, and ω = e<sup>*i*π/4</sup>;
//! *T*<sup>†</sup> is expanded with conjugated coefficients over *I* and
//! *S*<sup>†</sup>. A circuit with *t* such gates becomes 2<sup>*t*</sup>
//! Clifford circuits, each weighted by the product of its chosen
//! coefficients, which can then be run on a [`Stab`].
//!
//! Alternatively, [`NearClifford`] samples a single branch as the circuit is
//! applied, picking *I* or *S* (*S*<sup>†</sup>) at every *T*-type gate with
//! probability proportional to the magnitude of its coefficient. Its
//! [`apply`] and [`probability`] capabilities let a
//! [`Simulator`][crate::sim::Simulator] sample Clifford+*T* circuits on a
//! stabilizer tableau directly.

use std::{
    f64::consts::FRAC_PI_4,
    sync::{ Arc, Mutex, PoisonError },
};
use num_complex::Complex64 as C64;
use once_cell::sync::Lazy;
use rand::{ rngs::StdRng, Rng, SeedableRng };
use crate::{
    circuit::{ Action, Circuit, Operation },
    error::BackendResult,
    gate::Gate,
    stab::Stab,
};

// coefficient on S in the expansion of T
static COEF_S: Lazy<C64> = Lazy::new(|| {
    let omega = C64::from_polar(1.0, FRAC_PI_4);
    (C64::from(1.0) - omega) / C64::new(1.0, -1.0)
});

// coefficient on I in the expansion of T
static COEF_I: Lazy<C64> = Lazy::new(|| C64::from(1.0) - *COEF_S);

// probability of taking the S branch of a T-type gate
static PROB_S: Lazy<f64> = Lazy::new(|| {
    let (ci, cs) = (COEF_I.norm(), COEF_S.norm());
    cs / (ci + cs)
});

/// Return the (I, S) coefficients used to expand a single [`Gate::T`].
pub fn t_coefficients() -> (C64, C64) { (*COEF_I, *COEF_S) }

fn is_t(gate: &Gate) -> bool { matches!(gate, Gate::T | Gate::Tdg) }

/// Count the number of non-Clifford gates in `circuit`.
pub fn t_count(circuit: &Circuit<Gate>) -> usize {
    circuit.operations()
        .filter(|op| matches!(op, Operation::Gate { gate, .. } if is_t(gate)))
        .count()
}

/// Expand `circuit` into a weighted sum of Clifford circuits.
///
/// Branches are ordered so that the `j`-th *T*-type gate (in moment order)
/// corresponds to bit `t - 1 - j` of the branch index, with a 0 selecting
/// *I*. Measurements and all Clifford gates are carried over unchanged.
pub fn decompose(circuit: &Circuit<Gate>) -> Vec<(Circuit<Gate>, C64)> {
    let t = t_count(circuit);
    let (ci, cs) = t_coefficients();
    (0..1_usize << t)
        .map(|branch| {
            let mut j: usize = 0;
            let mut amp = C64::from(1.0);
            let expanded
                = circuit.map_gates(|gate| {
                    if !is_t(gate) { return *gate; }
                    let take_s = (branch >> (t - 1 - j)) & 1 == 1;
                    j += 1;
                    match (gate, take_s) {
                        (Gate::T, false) => { amp *= ci; Gate::I },
                        (Gate::T, true) => { amp *= cs; Gate::S },
                        (_, false) => { amp *= ci.conj(); Gate::I },
                        (_, true) => { amp *= cs.conj(); Gate::Sdg },
                    }
                });
            (expanded, amp)
        })
        .collect()
}

/// A stabilizer state that absorbs *T*-type gates by sampling one Clifford
/// branch of their expansion.
///
/// Clones share a single branch generator, so every trajectory cloned from
/// the same initial state draws its own branch choices. For a fixed seed,
/// sequential runs starting from a freshly constructed state are
/// reproducible; under
/// [`run_parallel`][crate::sim::Simulator::run_parallel] the assignment of
/// branch choices to repetitions depends on scheduling.
#[derive(Clone, Debug)]
pub struct NearClifford {
    stab: Stab,
    rng: Arc<Mutex<StdRng>>,
}

impl NearClifford {
    /// Create a new state of `n` qubits initialized to ∣0...0⟩.
    ///
    /// If `seed` is `None`, branch choices are seeded from system entropy.
    pub fn new(n: usize, seed: Option<u64>) -> Self {
        Self::from_stab(Stab::new(n), seed)
    }

    /// Wrap an existing stabilizer state.
    pub fn from_stab(stab: Stab, seed: Option<u64>) -> Self {
        let rng
            = seed.map(StdRng::seed_from_u64)
            .unwrap_or_else(StdRng::from_entropy);
        Self { stab, rng: Arc::new(Mutex::new(rng)) }
    }

    /// Return the underlying stabilizer state.
    pub fn stab(&self) -> &Stab { &self.stab }

    fn take_s_branch(&self) -> bool {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.gen::<f64>() < *PROB_S
    }

    /// Apply a gate to `targets`, replacing *T*-type gates with a sampled
    /// Clifford branch.
    pub fn apply_gate(&mut self, gate: &Gate, targets: &[usize])
        -> BackendResult<&mut Self>
    {
        let branch
            = match gate {
                Gate::T if self.take_s_branch() => Gate::S,
                Gate::Tdg if self.take_s_branch() => Gate::Sdg,
                Gate::T | Gate::Tdg => Gate::I,
                other => *other,
            };
        self.stab.apply_gate(&branch, targets)?;
        Ok(self)
    }
}

/// Apply capability for [`NearClifford`].
pub fn apply(state: &mut NearClifford, action: Action<'_, Gate>)
    -> BackendResult<()>
{
    match action {
        Action::Gate { gate, targets }
            => state.apply_gate(gate, targets).map(|_| ()),
        Action::Collapse { targets, outcome }
            => state.stab.collapse(targets, outcome).map(|_| ()),
    }
}

/// Probability capability for [`NearClifford`].
pub fn probability(state: &NearClifford, qubits: &[usize], bits: &[bool])
    -> BackendResult<f64>
{
    state.stab.probability(qubits, bits)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        error::{ BackendError, RunError },
        gate::random_circuit,
        sim::Simulator,
        stab,
        statevec::{ self, StateVec },
    };

    const EPSILON: f64 = 1e-12;

    fn run_gates(n: usize, circuit: &Circuit<Gate>) -> StateVec {
        let mut state = StateVec::new(n);
        for op in circuit.operations() {
            if let Operation::Gate { gate, targets } = op {
                state.apply_gate(gate, targets).unwrap();
            }
        }
        state
    }

    #[test]
    fn coefficients_reproduce_t() {
        let (ci, cs) = t_coefficients();
        // T = diag(1, ω), S = diag(1, i)
        assert!((ci + cs - C64::from(1.0)).norm() < EPSILON);
        assert!((ci + cs * C64::i() - C64::from_polar(1.0, FRAC_PI_4)).norm() < EPSILON);
    }

    #[test]
    fn clifford_circuit_is_unchanged() {
        let circuit: Circuit<Gate>
            = [
                Operation::gate(Gate::H, [0]),
                Operation::gate(Gate::CX, [0, 1]),
                Operation::measure([0, 1], "z"),
            ]
            .into_iter()
            .collect();
        let terms = decompose(&circuit);
        assert_eq!(terms.len(), 1);
        assert_eq!(terms[0].0, circuit);
        assert_eq!(terms[0].1, C64::from(1.0));
    }

    #[test]
    fn single_t_gives_identity_and_phase() {
        let circuit: Circuit<Gate>
            = [Operation::gate(Gate::T, [0]), Operation::measure([0], "z")]
            .into_iter()
            .collect();
        let terms = decompose(&circuit);
        assert_eq!(terms.len(), 2);
        let first: Vec<_> = terms[0].0.operations().cloned().collect();
        let second: Vec<_> = terms[1].0.operations().cloned().collect();
        assert_eq!(first[0], Operation::gate(Gate::I, [0]));
        assert_eq!(second[0], Operation::gate(Gate::S, [0]));
        assert_eq!(first[1], Operation::measure([0], "z"));
    }

    #[test]
    fn weighted_sum_reproduces_state() {
        let circuit: Circuit<Gate>
            = [
                Operation::gate(Gate::H, [0]),
                Operation::gate(Gate::H, [1]),
                Operation::gate(Gate::T, [0]),
                Operation::gate(Gate::CX, [0, 1]),
                Operation::gate(Gate::Tdg, [1]),
                Operation::gate(Gate::H, [1]),
                Operation::gate(Gate::T, [1]),
            ]
            .into_iter()
            .collect();
        let exact = run_gates(2, &circuit);
        let terms = decompose(&circuit);
        assert_eq!(terms.len(), 8);
        let mut sum = vec![C64::from(0.0); 4];
        for (c, amp) in terms.iter() {
            assert!(
                c.operations().all(|op| match op {
                    Operation::Gate { gate, .. } => gate.is_clifford(),
                    Operation::Measure { .. } => true,
                })
            );
            let branch = run_gates(2, c);
            sum.iter_mut().zip(branch.amps())
                .for_each(|(s, a)| { *s += amp * a; });
        }
        assert!(
            sum.iter().zip(exact.amps())
                .all(|(s, e)| (s - e).norm() < EPSILON)
        );
    }

    #[test]
    fn branch_probability_is_even() {
        // |a| = |b| for the T expansion
        assert!((*PROB_S - 0.5).abs() < EPSILON);
    }

    #[test]
    fn near_clifford_matches_state_vector() {
        let circuit: Circuit<Gate>
            = [
                Operation::gate(Gate::H, [0]),
                Operation::gate(Gate::CX, [0, 1]),
                Operation::gate(Gate::X, [2]),
                Operation::gate(Gate::T, [2]),
                Operation::measure([0, 1, 2], "z"),
            ]
            .into_iter()
            .collect();

        let plain
            = Simulator::new(Stab::new(3), stab::apply, stab::probability)
            .with_seed(1)
            .run(&circuit, 1);
        assert!(matches!(
            plain,
            Err(RunError::Backend(BackendError::NonClifford(_))),
        ));

        let sv
            = Simulator::new(StateVec::new(3), statevec::apply, statevec::probability)
            .with_seed(1)
            .run(&circuit, 100)
            .unwrap();
        let nc
            = Simulator::new(NearClifford::new(3, Some(1)), apply, probability)
            .with_seed(1)
            .run(&circuit, 100)
            .unwrap();
        assert_eq!(nc, sv);
    }

    #[test]
    fn clifford_circuits_are_unaffected() {
        let mut rng = StdRng::seed_from_u64(10546);
        let gates = [Gate::H, Gate::CX, Gate::S];
        let mut circuit = random_circuit(3, 100, 0.5, &gates, &mut rng);
        circuit.push(Operation::measure([0, 1, 2], "z"));
        let st
            = Simulator::new(Stab::new(3), stab::apply, stab::probability)
            .with_seed(1)
            .run(&circuit, 100)
            .unwrap();
        let nc
            = Simulator::new(NearClifford::new(3, Some(1)), apply, probability)
            .with_seed(1)
            .run(&circuit, 100)
            .unwrap();
        assert_eq!(nc, st);
    }

    #[test]
    fn trajectories_draw_separate_branches() {
        // T on |+> leaves +X on the I branch and gives +Y on the S branch
        let mut init = NearClifford::new(1, Some(7));
        init.apply_gate(&Gate::H, &[0]).unwrap();
        let n_s
            = (0..1000)
            .filter(|_| {
                let mut state = init.clone();
                state.apply_gate(&Gate::T, &[0]).unwrap();
                state.stab().stabilizers() == vec!["+Y".to_string()]
            })
            .count();
        assert!((400..=600).contains(&n_s));
    }
}
