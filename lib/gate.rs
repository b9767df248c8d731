//! A small concrete gate set for use with the bundled state representations.
//!
//! Gates here carry no qubit indices; targets are attached by
//! [`Operation::Gate`][crate::circuit::Operation::Gate]. Multi-qubit gates
//! interpret their targets in order, so for `CX` the first target is the
//! control.

use std::fmt;
use nalgebra as na;
use num_complex::Complex64 as C64;
use once_cell::sync::Lazy;
use rand::Rng;
use crate::circuit::{ Circuit, Moment, Operation };

/// Description of a single gate.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Gate {
    /// Identity
    I,
    /// Hadamard
    H,
    /// π rotation about X
    X,
    /// π rotation about Y
    Y,
    /// π rotation about Z
    Z,
    /// π/2 rotation about Z
    S,
    /// -π/2 rotation about Z
    Sdg,
    /// π/4 rotation about Z
    T,
    /// -π/4 rotation about Z
    Tdg,
    /// Z-controlled π rotation about X.
    CX,
    /// Z-controlled π rotation about Z.
    CZ,
    /// Swap
    Swap,
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

macro_rules! c {
    ( $re:expr ) => { C64 { re: $re, im: 0.0 } };
    ( $re:expr, $im:expr ) => { C64 { re: $re, im: $im } };
}

fn mat2(elems: [C64; 4]) -> na::DMatrix<C64> {
    na::DMatrix::from_row_slice(2, 2, &elems)
}

fn mat4(elems: [C64; 16]) -> na::DMatrix<C64> {
    na::DMatrix::from_row_slice(4, 4, &elems)
}

static MAT_I: Lazy<na::DMatrix<C64>>
    = Lazy::new(|| mat2([c!(1.0), c!(0.0), c!(0.0), c!(1.0)]));

static MAT_H: Lazy<na::DMatrix<C64>>
    = Lazy::new(|| {
        use std::f64::consts::FRAC_1_SQRT_2 as R;
        mat2([c!(R), c!(R), c!(R), c!(-R)])
    });

static MAT_X: Lazy<na::DMatrix<C64>>
    = Lazy::new(|| mat2([c!(0.0), c!(1.0), c!(1.0), c!(0.0)]));

static MAT_Y: Lazy<na::DMatrix<C64>>
    = Lazy::new(|| mat2([c!(0.0), c!(0.0, -1.0), c!(0.0, 1.0), c!(0.0)]));

static MAT_Z: Lazy<na::DMatrix<C64>>
    = Lazy::new(|| mat2([c!(1.0), c!(0.0), c!(0.0), c!(-1.0)]));

static MAT_S: Lazy<na::DMatrix<C64>>
    = Lazy::new(|| mat2([c!(1.0), c!(0.0), c!(0.0), C64::i()]));

static MAT_SDG: Lazy<na::DMatrix<C64>>
    = Lazy::new(|| mat2([c!(1.0), c!(0.0), c!(0.0), -C64::i()]));

static MAT_T: Lazy<na::DMatrix<C64>>
    = Lazy::new(|| {
        use std::f64::consts::FRAC_PI_4 as PI4;
        mat2([c!(1.0), c!(0.0), c!(0.0), C64::cis(PI4)])
    });

static MAT_TDG: Lazy<na::DMatrix<C64>>
    = Lazy::new(|| {
        use std::f64::consts::FRAC_PI_4 as PI4;
        mat2([c!(1.0), c!(0.0), c!(0.0), C64::cis(-PI4)])
    });

static MAT_CX: Lazy<na::DMatrix<C64>>
    = Lazy::new(|| mat4([
        c!(1.0), c!(0.0), c!(0.0), c!(0.0),
        c!(0.0), c!(1.0), c!(0.0), c!(0.0),
        c!(0.0), c!(0.0), c!(0.0), c!(1.0),
        c!(0.0), c!(0.0), c!(1.0), c!(0.0),
    ]));

static MAT_CZ: Lazy<na::DMatrix<C64>>
    = Lazy::new(|| mat4([
        c!(1.0), c!(0.0), c!(0.0), c!(0.0),
        c!(0.0), c!(1.0), c!(0.0), c!(0.0),
        c!(0.0), c!(0.0), c!(1.0), c!(0.0),
        c!(0.0), c!(0.0), c!(0.0), c!(-1.0),
    ]));

static MAT_SWAP: Lazy<na::DMatrix<C64>>
    = Lazy::new(|| mat4([
        c!(1.0), c!(0.0), c!(0.0), c!(0.0),
        c!(0.0), c!(0.0), c!(1.0), c!(0.0),
        c!(0.0), c!(1.0), c!(0.0), c!(0.0),
        c!(0.0), c!(0.0), c!(0.0), c!(1.0),
    ]));

impl Gate {
    /// Return the number of qubits the gate acts on.
    pub fn arity(&self) -> usize {
        match self {
            Self::CX | Self::CZ | Self::Swap => 2,
            _ => 1,
        }
    }

    /// Return `true` if `self` belongs to the Clifford group.
    pub fn is_clifford(&self) -> bool { !matches!(self, Self::T | Self::Tdg) }

    /// Return the gate's unitary in the computational basis of its targets,
    /// with the first target as the most significant bit.
    pub fn matrix(&self) -> &'static na::DMatrix<C64> {
        match self {
            Self::I => &*MAT_I,
            Self::H => &*MAT_H,
            Self::X => &*MAT_X,
            Self::Y => &*MAT_Y,
            Self::Z => &*MAT_Z,
            Self::S => &*MAT_S,
            Self::Sdg => &*MAT_SDG,
            Self::T => &*MAT_T,
            Self::Tdg => &*MAT_TDG,
            Self::CX => &*MAT_CX,
            Self::CZ => &*MAT_CZ,
            Self::Swap => &*MAT_SWAP,
        }
    }

    /// Sample a gate uniformly from `domain`.
    ///
    /// *Panics if `domain` is empty.*
    pub fn sample<R>(domain: &[Self], rng: &mut R) -> Self
    where R: Rng + ?Sized
    {
        if domain.is_empty() { panic!("Gate::sample: empty gate domain"); }
        domain[rng.gen_range(0..domain.len())]
    }
}

/// Generate a random circuit of `n_moments` moments on `nqubits` qubits.
///
/// Each moment is filled by visiting the qubits in a random order and, with
/// probability `op_density`, placing a gate drawn uniformly from `gates` on
/// the next free qubits. Gates that do not fit in the remaining free qubits
/// are skipped. No measurements are added.
///
/// *Panics if `op_density` is not a valid probability or `gates` is empty.*
pub fn random_circuit<R>(
    nqubits: usize,
    n_moments: usize,
    op_density: f64,
    gates: &[Gate],
    rng: &mut R,
) -> Circuit<Gate>
where R: Rng + ?Sized
{
    if !(0.0..=1.0).contains(&op_density) {
        panic!("random_circuit: op density must be a valid probability");
    }
    let mut circuit: Circuit<Gate> = Circuit::new();
    let mut free: Vec<usize> = Vec::with_capacity(nqubits);
    for _ in 0..n_moments {
        free.clear();
        free.extend(0..nqubits);
        let mut ops: Vec<Operation<Gate>> = Vec::new();
        while !free.is_empty() {
            let gate = Gate::sample(gates, rng);
            let k = gate.arity();
            let head = free.swap_remove(rng.gen_range(0..free.len()));
            if rng.gen::<f64>() >= op_density || free.len() + 1 < k {
                continue;
            }
            let mut targets = vec![head];
            for _ in 1..k {
                targets.push(free.swap_remove(rng.gen_range(0..free.len())));
            }
            ops.push(Operation::Gate { gate, targets });
        }
        circuit.push_moment(Moment::from_disjoint(ops));
    }
    circuit
}
