#![allow(non_snake_case)]

//! Gate-by-gate trajectory sampling of quantum circuits.
//!
//! Measurement outcomes are drawn one repetition at a time by replaying a
//! circuit on a fresh copy of an initial state and, at every measurement,
//! sampling an outcome from the marginal weights reported by the state before
//! collapsing onto it. The sampler is agnostic to how states are represented:
//! it only needs a function that applies an operation to a state and one that
//! reports the weight of a candidate outcome. Three representations are
//! included: dense state vectors ([`statevec`]), density matrices
//! ([`density`]), and stabilizer tableaux ([`stab`]), the latter of which can
//! be combined with [`clifford`] to handle circuits with a few *T* gates.

pub mod circuit;
pub mod clifford;
pub mod density;
pub mod error;
pub mod gate;
pub mod result;
pub mod rng;
pub mod sample;
pub mod sim;
pub mod stab;
pub mod statevec;
pub mod validate;

pub use circuit::{ Circuit, Moment, Operation, QubitOrder };
pub use error::{ Anomaly, BackendError, InvalidCircuit, RunError };
pub use result::ResultRecord;
pub use sim::{ Config, Simulator };
