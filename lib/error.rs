//! Error types for circuit validation, sampling, and the bundled state
//! representations.

use thiserror::Error;

/// A structural problem with a circuit, detected before any repetition is
/// simulated.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InvalidCircuit {
    /// The circuit contains no measurements at all.
    #[error("circuit contains no measurements")]
    NoMeasurements,

    /// A qubit is acted on after its last measurement.
    #[error(
        "qubit {qubit} is acted on in moment {moment} after its terminal \
        measurement '{key}'"
    )]
    OperationAfterMeasurement {
        qubit: usize,
        moment: usize,
        key: String,
    },

    /// Two operations in the same moment share a qubit.
    #[error("qubit {0} is targeted more than once in a single moment")]
    OverlappingMoment(usize),

    /// A single operation names the same qubit more than once.
    #[error("qubit {0} is targeted more than once by a single operation")]
    DuplicateTarget(usize),

    /// Two measurements share a key.
    #[error("measurement key '{0}' is used more than once")]
    DuplicateKey(String),

    /// A measurement with no target qubits.
    #[error("measurement '{0}' has no target qubits")]
    EmptyMeasurement(String),

    /// A measurement whose outcomes cannot be enumerated as `u64`s.
    #[error("measurement '{key}' targets {width} qubits; at most {max} allowed")]
    TooWide {
        key: String,
        width: usize,
        max: usize,
    },
}

/// Returned by [`Simulator::run`][crate::sim::Simulator::run] and friends.
///
/// `E` is the error type of the caller-supplied capabilities, which is passed
/// through untouched.
#[derive(Debug, Error)]
pub enum RunError<E> {
    /// The circuit failed validation; nothing was simulated.
    #[error(transparent)]
    InvalidCircuit(#[from] InvalidCircuit),

    /// Outcome weights for a measurement were unusable.
    #[error("ill-defined outcome distribution for qubits {qubits:?}: {anomaly}")]
    NumericAnomaly {
        qubits: Vec<usize>,
        anomaly: Anomaly,
    },

    /// A capability function failed.
    #[error(transparent)]
    Backend(E),
}

/// What was wrong with a set of outcome weights.
#[derive(Copy, Clone, Debug, PartialEq, Error)]
pub enum Anomaly {
    /// A single candidate was given a negative or non-finite weight.
    #[error("candidate {candidate} has weight {weight:e}")]
    Weight {
        candidate: u64,
        weight: f64,
    },

    /// The weights summed to something non-finite or not above the zero
    /// tolerance.
    #[error("total weight {0:e} is not usable")]
    Total(f64),
}

/// Errors raised by the state representations shipped with this crate.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BackendError {
    /// A qubit index was not less than the register size.
    #[error("qubit index {qubit} is out of range for {n} qubits")]
    QubitOutOfRange {
        qubit: usize,
        n: usize,
    },

    /// The number of targets did not match what the gate acts on.
    #[error("gate {gate} acts on {expected} qubit(s), but {found} were given")]
    ArityMismatch {
        gate: String,
        expected: usize,
        found: usize,
    },

    /// A stabilizer state was asked to apply a non-Clifford gate.
    #[error("gate {0} is not a Clifford operation")]
    NonClifford(String),

    /// A collapse was requested onto an outcome with zero probability.
    #[error("cannot collapse qubits {qubits:?} onto an outcome of zero probability")]
    ImpossibleOutcome {
        qubits: Vec<usize>,
    },

    /// A bit-vector's length did not match the number of qubits it describes.
    #[error("expected {expected} bit(s), but {found} were given")]
    OutcomeLength {
        expected: usize,
        found: usize,
    },
}

/// Shorthand for results from the bundled state representations.
pub type BackendResult<T> = Result<T, BackendError>;
