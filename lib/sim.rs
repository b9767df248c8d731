//! Main driver for sampling trajectories through a circuit.
//!
//! A [`Simulator`] holds an initial state and two capability functions:
//!
//! - `apply(&mut state, action)`, which performs a gate or a post-measurement
//!   collapse ([`Action`]) in place;
//! - `probability(&state, qubits, bits)`, which returns the (not necessarily
//!   normalized) weight of observing `bits` on `qubits`.
//!
//! Nothing else about the state is assumed beyond [`Clone`], so the same
//! simulator drives state vectors, density matrices, stabilizer tableaux, or
//! anything else that can satisfy both contracts.
//!
//! # Example
//! ```
//! use bgls::{
//!     circuit::{ Circuit, Operation },
//!     gate::Gate,
//!     sim::Simulator,
//!     statevec::{ self, StateVec },
//! };
//!
//! let circuit: Circuit<Gate>
//!     = [
//!         Operation::gate(Gate::H, [0]),
//!         Operation::gate(Gate::CX, [0, 1]),
//!         Operation::measure([0, 1], "z"),
//!     ]
//!     .into_iter()
//!     .collect();
//!
//! let sim
//!     = Simulator::new(StateVec::new(2), statevec::apply, statevec::probability)
//!     .with_seed(10546);
//! let results = sim.run(&circuit, 100).unwrap();
//! assert!(results.histogram("z").keys().all(|k| *k == 0 || *k == 3));
//! ```

use rayon::prelude::*;
use tracing::{ debug, debug_span, trace };
use crate::{
    circuit::{ Action, Circuit, Operation, QubitOrder },
    error::RunError,
    result::ResultRecord,
    rng::RandomSource,
    sample::MeasurementSampler,
    validate::validate,
};

/// Construction-time options for a [`Simulator`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Config {
    /// Master seed for all sampling draws. If `None`, each run draws a fresh
    /// seed from system entropy.
    pub seed: Option<u64>,
    /// Total outcome weights at or below this value are reported as
    /// [`RunError::NumericAnomaly`].
    pub zero_tolerance: f64,
}

impl Default for Config {
    fn default() -> Self { Self { seed: None, zero_tolerance: 1e-12 } }
}

impl Config {
    pub fn new() -> Self { Self::default() }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_zero_tolerance(mut self, zero_tolerance: f64) -> Self {
        self.zero_tolerance = zero_tolerance;
        self
    }
}

// outcomes of a single trajectory, in the order measurements were visited
type Trajectory<'c> = Vec<(&'c str, &'c [usize], Vec<bool>)>;

/// Samples measurement outcomes of a circuit, one trajectory per repetition.
#[derive(Clone, Debug)]
pub struct Simulator<S, A, P> {
    initial_state: S,
    apply: A,
    probability: P,
    config: Config,
}

impl<S, A, P> Simulator<S, A, P> {
    /// Create a new simulator with default [`Config`].
    ///
    /// `initial_state` is never modified; each repetition works on its own
    /// clone.
    pub fn new(initial_state: S, apply: A, probability: P) -> Self {
        Self { initial_state, apply, probability, config: Config::default() }
    }

    /// Seed all sampling draws.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Replace the configuration wholesale.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &Config { &self.config }

    pub fn initial_state(&self) -> &S { &self.initial_state }

    fn sampler(&self) -> MeasurementSampler<'_, A, P> {
        MeasurementSampler::new(
            &self.apply, &self.probability, self.config.zero_tolerance)
    }

    // replay the whole circuit once on a fresh copy of the initial state
    fn trajectory<'c, G, E>(
        &self,
        circuit: &'c Circuit<G>,
        order: &QubitOrder,
        rng: &mut RandomSource,
    ) -> Result<Trajectory<'c>, RunError<E>>
    where
        S: Clone,
        A: Fn(&mut S, Action<'_, G>) -> Result<(), E>,
        P: Fn(&S, &[usize], &[bool]) -> Result<f64, E>,
    {
        let sampler = self.sampler();
        let mut state = self.initial_state.clone();
        let mut outcomes: Trajectory<'c> = Vec::new();
        for moment in circuit.moments().iter() {
            for op in order.arrange(moment).into_iter() {
                match op {
                    Operation::Gate { gate, targets } => {
                        (self.apply)(&mut state, Action::Gate { gate, targets })
                            .map_err(RunError::Backend)?;
                    },
                    Operation::Measure { targets, key } => {
                        let bits = sampler.sample(&mut state, targets, rng)?;
                        trace!(key = key.as_str(), ?bits, "measured");
                        outcomes.push((key.as_str(), targets.as_slice(), bits));
                    },
                }
            }
        }
        Ok(outcomes)
    }

    fn assemble(trajectories: Vec<Trajectory<'_>>) -> ResultRecord {
        let mut record = ResultRecord::new();
        for (rep, outcomes) in trajectories.into_iter().enumerate() {
            for (key, qubits, bits) in outcomes.into_iter() {
                record.record(key, qubits, rep, bits);
            }
        }
        record
    }

    /// Sample `repetitions` trajectories of `circuit`, visiting operations
    /// within each moment in declaration order.
    ///
    /// The circuit is validated once before anything is simulated; on any
    /// error no partial results are returned.
    pub fn run<G, E>(&self, circuit: &Circuit<G>, repetitions: usize)
        -> Result<ResultRecord, RunError<E>>
    where
        S: Clone,
        A: Fn(&mut S, Action<'_, G>) -> Result<(), E>,
        P: Fn(&S, &[usize], &[bool]) -> Result<f64, E>,
    {
        self.run_with_order(circuit, repetitions, &QubitOrder::Declaration)
    }

    /// Like [`Self::run`], but visiting operations within each moment
    /// according to `order`.
    pub fn run_with_order<G, E>(
        &self,
        circuit: &Circuit<G>,
        repetitions: usize,
        order: &QubitOrder,
    ) -> Result<ResultRecord, RunError<E>>
    where
        S: Clone,
        A: Fn(&mut S, Action<'_, G>) -> Result<(), E>,
        P: Fn(&S, &[usize], &[bool]) -> Result<f64, E>,
    {
        validate(circuit)?;
        let master = RandomSource::new(self.config.seed);
        let _span
            = debug_span!("run", repetitions, seed = master.seed()).entered();
        debug!(moments = circuit.len(), "starting sequential run");
        let trajectories: Vec<Trajectory<'_>>
            = (0..repetitions)
            .map(|rep| {
                let mut rng = master.substream(rep as u64);
                self.trajectory(circuit, order, &mut rng)
            })
            .collect::<Result<_, _>>()?;
        Ok(Self::assemble(trajectories))
    }

    /// Like [`Self::run`], but with repetitions distributed over the global
    /// `rayon` thread pool.
    ///
    /// Every repetition draws from its own substream of the master seed, so
    /// for a fixed seed the result is identical to that of [`Self::run`].
    pub fn run_parallel<G, E>(&self, circuit: &Circuit<G>, repetitions: usize)
        -> Result<ResultRecord, RunError<E>>
    where
        S: Clone + Sync,
        A: Fn(&mut S, Action<'_, G>) -> Result<(), E> + Sync,
        P: Fn(&S, &[usize], &[bool]) -> Result<f64, E> + Sync,
        G: Sync,
        E: Send,
    {
        self.run_parallel_with_order(circuit, repetitions, &QubitOrder::Declaration)
    }

    /// Like [`Self::run_with_order`], but with repetitions distributed over
    /// the global `rayon` thread pool.
    pub fn run_parallel_with_order<G, E>(
        &self,
        circuit: &Circuit<G>,
        repetitions: usize,
        order: &QubitOrder,
    ) -> Result<ResultRecord, RunError<E>>
    where
        S: Clone + Sync,
        A: Fn(&mut S, Action<'_, G>) -> Result<(), E> + Sync,
        P: Fn(&S, &[usize], &[bool]) -> Result<f64, E> + Sync,
        G: Sync,
        E: Send,
    {
        validate(circuit)?;
        let master = RandomSource::new(self.config.seed);
        let _span
            = debug_span!("run_parallel", repetitions, seed = master.seed())
            .entered();
        debug!(moments = circuit.len(), "starting parallel run");
        let trajectories: Vec<Trajectory<'_>>
            = (0..repetitions).into_par_iter()
            .map(|rep| {
                let mut rng = master.substream(rep as u64);
                self.trajectory(circuit, order, &mut rng)
            })
            .collect::<Result<_, _>>()?;
        Ok(Self::assemble(trajectories))
    }
}
