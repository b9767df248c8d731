//! Circuits as ordered sequences of moments.
//!
//! A [`Circuit`] is generic over the gate identifier `G`; nothing in the
//! sampling core looks inside a gate, it only hands gates back to the
//! caller-supplied apply capability as an [`Action`].

use std::fmt;
use itertools::Itertools;
use rustc_hash::FxHashSet;
use crate::error::InvalidCircuit;

/// A single operation in a circuit.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Operation<G> {
    /// A gate acting on an ordered tuple of qubits.
    Gate { gate: G, targets: Vec<usize> },
    /// A computational-basis measurement of an ordered tuple of qubits, whose
    /// outcomes are recorded under `key`.
    Measure { targets: Vec<usize>, key: String },
}

impl<G> Operation<G> {
    /// Create a gate operation.
    pub fn gate<I>(gate: G, targets: I) -> Self
    where I: IntoIterator<Item = usize>
    {
        Self::Gate { gate, targets: targets.into_iter().collect() }
    }

    /// Create a measurement operation.
    pub fn measure<I, K>(targets: I, key: K) -> Self
    where
        I: IntoIterator<Item = usize>,
        K: Into<String>,
    {
        Self::Measure { targets: targets.into_iter().collect(), key: key.into() }
    }

    /// Return the qubits the operation acts on, in order.
    pub fn targets(&self) -> &[usize] {
        match self {
            Self::Gate { targets, .. } => targets,
            Self::Measure { targets, .. } => targets,
        }
    }

    /// Return `true` if `self` is a measurement.
    pub fn is_measurement(&self) -> bool { matches!(self, Self::Measure { .. }) }

    /// Return the measurement key, if `self` is a measurement.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Gate { .. } => None,
            Self::Measure { key, .. } => Some(key),
        }
    }
}

impl<G: fmt::Display> fmt::Display for Operation<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gate { gate, targets }
                => write!(f, "{}({})", gate, targets.iter().join(", ")),
            Self::Measure { targets, key }
                => write!(f, "M[{}]({})", key, targets.iter().join(", ")),
        }
    }
}

/// What the apply capability is asked to do to a state.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Action<'a, G> {
    /// Apply a gate to the given qubits.
    Gate { gate: &'a G, targets: &'a [usize] },
    /// Project the given qubits onto a definite computational-basis outcome,
    /// `outcome[j]` being the value of `targets[j]`.
    Collapse { targets: &'a [usize], outcome: &'a [bool] },
}

/// A set of operations on pairwise-disjoint qubits, applied at one logical
/// time step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Moment<G> {
    ops: Vec<Operation<G>>,
}

impl<G> Default for Moment<G> {
    fn default() -> Self { Self { ops: Vec::new() } }
}

impl<G> Moment<G> {
    /// Create a new moment, verifying that no two operations share a qubit.
    pub fn new<I>(ops: I) -> Result<Self, InvalidCircuit>
    where I: IntoIterator<Item = Operation<G>>
    {
        let mut moment = Self::default();
        for op in ops.into_iter() {
            if let Some(q) = moment.first_overlap(&op) {
                return Err(InvalidCircuit::OverlappingMoment(q));
            }
            moment.ops.push(op);
        }
        Ok(moment)
    }

    // callers guarantee that `ops` act on pairwise-disjoint qubits
    pub(crate) fn from_disjoint(ops: Vec<Operation<G>>) -> Self { Self { ops } }

    fn first_overlap(&self, op: &Operation<G>) -> Option<usize> {
        op.targets().iter().copied()
            .find(|q| self.ops.iter().any(|o| o.targets().contains(q)))
    }

    /// Return `true` if any operation in `self` acts on a qubit in `qubits`.
    pub fn touches(&self, qubits: &[usize]) -> bool {
        self.ops.iter()
            .any(|op| op.targets().iter().any(|q| qubits.contains(q)))
    }

    /// Return the operations in declaration order.
    pub fn operations(&self) -> &[Operation<G>] { &self.ops }

    pub fn len(&self) -> usize { self.ops.len() }

    pub fn is_empty(&self) -> bool { self.ops.is_empty() }
}

/// Rule for ordering operations within a moment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum QubitOrder {
    /// Operations are visited in the order they were added to the moment.
    #[default]
    Declaration,
    /// Operations are visited by the earliest position of any of their
    /// targets in the list; unlisted qubits rank last and ties keep
    /// declaration order.
    Explicit(Vec<usize>),
}

impl QubitOrder {
    fn rank(&self, op_targets: &[usize]) -> usize {
        match self {
            Self::Declaration => 0,
            Self::Explicit(order) => {
                op_targets.iter()
                    .filter_map(|q| order.iter().position(|p| p == q))
                    .min()
                    .unwrap_or(usize::MAX)
            },
        }
    }

    /// Return the operations of `moment` in traversal order.
    pub fn arrange<'a, G>(&self, moment: &'a Moment<G>)
        -> Vec<&'a Operation<G>>
    {
        // stable sort, so equal ranks stay in declaration order
        moment.ops.iter()
            .sorted_by_key(|op| self.rank(op.targets()))
            .collect()
    }
}

/// An ordered sequence of [`Moment`]s.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Circuit<G> {
    moments: Vec<Moment<G>>,
}

impl<G> Default for Circuit<G> {
    fn default() -> Self { Self { moments: Vec::new() } }
}

impl<G> FromIterator<Operation<G>> for Circuit<G> {
    fn from_iter<I>(iter: I) -> Self
    where I: IntoIterator<Item = Operation<G>>
    {
        let mut circuit = Self::default();
        iter.into_iter().for_each(|op| { circuit.push(op); });
        circuit
    }
}

impl<G> Circuit<G> {
    /// Create a new, empty circuit.
    pub fn new() -> Self { Self::default() }

    /// Create a circuit from pre-built moments.
    pub fn from_moments<I>(moments: I) -> Self
    where I: IntoIterator<Item = Moment<G>>
    {
        Self { moments: moments.into_iter().collect() }
    }

    /// Append an operation, placing it in the last moment if it shares no
    /// qubits with that moment and in a new moment otherwise.
    pub fn push(&mut self, op: Operation<G>) -> &mut Self {
        match self.moments.last_mut() {
            Some(last) if last.first_overlap(&op).is_none()
                => { last.ops.push(op); },
            _ => { self.moments.push(Moment { ops: vec![op] }); },
        }
        self
    }

    /// Append a whole moment.
    pub fn push_moment(&mut self, moment: Moment<G>) -> &mut Self {
        self.moments.push(moment);
        self
    }

    /// Append all moments of another circuit.
    pub fn extend(&mut self, other: Self) -> &mut Self {
        self.moments.extend(other.moments);
        self
    }

    /// Return the moments in order.
    pub fn moments(&self) -> &[Moment<G>] { &self.moments }

    pub fn len(&self) -> usize { self.moments.len() }

    pub fn is_empty(&self) -> bool { self.moments.is_empty() }

    /// Iterate over all operations, moment by moment.
    pub fn operations(&self) -> impl Iterator<Item = &Operation<G>> + '_ {
        self.moments.iter().flat_map(|m| m.ops.iter())
    }

    /// Return the set of all qubits acted on by the circuit, sorted.
    pub fn qubits(&self) -> Vec<usize> {
        self.operations()
            .flat_map(|op| op.targets().iter().copied())
            .collect::<FxHashSet<usize>>()
            .into_iter()
            .sorted()
            .collect()
    }

    /// Return a new circuit with every gate passed through `f`.
    pub fn map_gates<H, F>(&self, mut f: F) -> Circuit<H>
    where
        G: Clone,
        F: FnMut(&G) -> H,
    {
        let moments
            = self.moments.iter()
            .map(|m| {
                let ops
                    = m.ops.iter()
                    .map(|op| match op {
                        Operation::Gate { gate, targets }
                            => Operation::Gate {
                                gate: f(gate),
                                targets: targets.clone(),
                            },
                        Operation::Measure { targets, key }
                            => Operation::Measure {
                                targets: targets.clone(),
                                key: key.clone(),
                            },
                    })
                    .collect();
                Moment { ops }
            })
            .collect();
        Circuit { moments }
    }
}

impl<G: fmt::Display> fmt::Display for Circuit<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (t, moment) in self.moments.iter().enumerate() {
            write!(f, "{}: {}", t, moment.ops.iter().join(" "))?;
            if t < self.moments.len() - 1 { writeln!(f)?; }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::gate::Gate;

    #[test]
    fn moment_rejects_overlap() {
        let res = Moment::new([
            Operation::gate(Gate::H, [0]),
            Operation::gate(Gate::CX, [1, 0]),
        ]);
        assert_eq!(res, Err(InvalidCircuit::OverlappingMoment(0)));
    }

    #[test]
    fn push_packs_disjoint_ops() {
        let circuit: Circuit<Gate>
            = [
                Operation::gate(Gate::H, [0]),
                Operation::gate(Gate::X, [1]),
                Operation::gate(Gate::CX, [0, 1]),
                Operation::measure([0, 1], "z"),
            ]
            .into_iter()
            .collect();
        assert_eq!(circuit.len(), 3);
        assert_eq!(circuit.moments()[0].len(), 2);
        assert_eq!(circuit.qubits(), vec![0, 1]);
    }

    #[test]
    fn explicit_order_ranks_by_earliest_target() {
        let moment = Moment::new([
            Operation::gate(Gate::H, [0]),
            Operation::gate(Gate::X, [5]),
            Operation::gate(Gate::CX, [3, 1]),
            Operation::gate(Gate::Z, [2]),
        ])
        .unwrap();
        let order = QubitOrder::Explicit(vec![1, 2, 0]);
        let visited: Vec<&[usize]>
            = order.arrange(&moment).into_iter()
            .map(|op| op.targets())
            .collect();
        assert_eq!(visited, vec![&[3, 1][..], &[2][..], &[0][..], &[5][..]]);

        let visited: Vec<&[usize]>
            = QubitOrder::Declaration.arrange(&moment).into_iter()
            .map(|op| op.targets())
            .collect();
        assert_eq!(visited, vec![&[0][..], &[5][..], &[3, 1][..], &[2][..]]);
    }
}
