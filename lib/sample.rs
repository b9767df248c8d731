//! Drawing a single measurement outcome from a probability oracle.
//!
//! Candidates are enumerated exhaustively in big-endian integer order over the
//! measured qubits: candidate `k` assigns bit `(k >> (n - 1 - j)) & 1` to the
//! `j`-th measured qubit, so the first qubit listed in the measurement is the
//! most significant. The sampler knows nothing about the state's
//! representation: weights come from the probability capability and the
//! post-measurement collapse is delegated to the apply capability as an
//! [`Action::Collapse`].

use crate::{
    circuit::Action,
    error::{ Anomaly, RunError },
    result::int_to_bits,
    rng::RandomSource,
};

/// Samples measurement outcomes through a pair of capability functions.
#[derive(Copy, Clone, Debug)]
pub struct MeasurementSampler<'a, A, P> {
    apply: &'a A,
    probability: &'a P,
    zero_tolerance: f64,
}

impl<'a, A, P> MeasurementSampler<'a, A, P> {
    /// Create a new sampler.
    ///
    /// Distributions whose total weight is not greater than `zero_tolerance`
    /// are rejected as numerically ill-defined.
    pub fn new(apply: &'a A, probability: &'a P, zero_tolerance: f64) -> Self {
        Self { apply, probability, zero_tolerance }
    }

    /// Compute the (unnormalized) weight of every candidate outcome for
    /// `qubits`, in canonical order.
    ///
    /// The full table of 2<sup>`qubits.len()`</sup> weights is held in memory;
    /// [`validate`][crate::validate::validate] caps measurement widths at
    /// [`MAX_MEASUREMENT_WIDTH`][crate::validate::MAX_MEASUREMENT_WIDTH].
    pub fn weights<S, E>(&self, state: &S, qubits: &[usize])
        -> Result<Vec<f64>, RunError<E>>
    where P: Fn(&S, &[usize], &[bool]) -> Result<f64, E>
    {
        let n = qubits.len();
        let mut candidate: Vec<bool> = vec![false; n];
        let mut weights: Vec<f64> = Vec::with_capacity(1 << n);
        for k in 0..(1_u64 << n) {
            candidate.iter_mut().enumerate()
                .for_each(|(j, b)| { *b = (k >> (n - 1 - j)) & 1 == 1; });
            let w
                = (self.probability)(state, qubits, &candidate)
                .map_err(RunError::Backend)?;
            if !w.is_finite() || w < 0.0 {
                return Err(RunError::NumericAnomaly {
                    qubits: qubits.to_vec(),
                    anomaly: Anomaly::Weight { candidate: k, weight: w },
                });
            }
            weights.push(w);
        }
        Ok(weights)
    }

    /// Select a candidate index given weights and a uniform draw `u` in
    /// `[0, 1)`.
    ///
    /// Returns the first index whose cumulative weight exceeds `u` times the
    /// total. If rounding leaves every cumulative sum at or below that
    /// threshold, the last candidate with non-zero weight is chosen instead.
    pub fn select<E>(&self, qubits: &[usize], weights: &[f64], u: f64)
        -> Result<usize, RunError<E>>
    {
        let total: f64 = weights.iter().sum();
        if !(total > self.zero_tolerance) || !total.is_finite() {
            return Err(RunError::NumericAnomaly {
                qubits: qubits.to_vec(),
                anomaly: Anomaly::Total(total),
            });
        }
        let threshold = u * total;
        let mut acc: f64 = 0.0;
        for (k, w) in weights.iter().enumerate() {
            acc += w;
            if acc > threshold { return Ok(k); }
        }
        // floating-point shortfall; total > 0 guarantees a non-zero weight
        Ok(weights.iter().rposition(|w| *w > 0.0).unwrap_or(weights.len() - 1))
    }

    /// Sample an outcome for `qubits` and collapse `state` onto it.
    ///
    /// Exactly one value is drawn from `rng`. The returned bit-vector is in the
    /// order of `qubits`.
    pub fn sample<S, G, E>(
        &self,
        state: &mut S,
        qubits: &[usize],
        rng: &mut RandomSource,
    ) -> Result<Vec<bool>, RunError<E>>
    where
        A: Fn(&mut S, Action<'_, G>) -> Result<(), E>,
        P: Fn(&S, &[usize], &[bool]) -> Result<f64, E>,
    {
        let weights = self.weights(state, qubits)?;
        let k = self.select(qubits, &weights, rng.draw())?;
        let outcome = int_to_bits(k as u64, qubits.len());
        (self.apply)(state, Action::Collapse { targets: qubits, outcome: &outcome })
            .map_err(RunError::Backend)?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::convert::Infallible;

    // a "state" that is just a fixed table of weights over two qubits, which
    // records every collapse it is asked to perform
    #[derive(Clone, Debug, Default)]
    struct Table {
        weights: [f64; 4],
        collapsed: Vec<Vec<bool>>,
    }

    fn apply(state: &mut Table, action: Action<'_, ()>)
        -> Result<(), Infallible>
    {
        if let Action::Collapse { outcome, .. } = action {
            state.collapsed.push(outcome.to_vec());
        }
        Ok(())
    }

    fn probability(state: &Table, _qubits: &[usize], bits: &[bool])
        -> Result<f64, Infallible>
    {
        let k = usize::from(bits[0]) * 2 + usize::from(bits[1]);
        Ok(state.weights[k])
    }

    type Sampler<'a>
        = MeasurementSampler<
            'a,
            fn(&mut Table, Action<'_, ()>) -> Result<(), Infallible>,
            fn(&Table, &[usize], &[bool]) -> Result<f64, Infallible>,
        >;

    #[test]
    fn weights_in_big_endian_order() {
        let a: fn(&mut Table, Action<'_, ()>) -> Result<(), Infallible> = apply;
        let p: fn(&Table, &[usize], &[bool]) -> Result<f64, Infallible>
            = probability;
        let sampler: Sampler = MeasurementSampler::new(&a, &p, 1e-12);
        let state = Table { weights: [1.0, 2.0, 3.0, 4.0], ..Table::default() };
        let w = sampler.weights::<_, Infallible>(&state, &[4, 7]).unwrap();
        assert_eq!(w, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn select_uses_unnormalized_cdf() {
        let sampler = MeasurementSampler::new(&(), &(), 1e-12);
        let w = [0.0, 2.0, 0.0, 2.0];
        assert_eq!(sampler.select::<Infallible>(&[0, 1], &w, 0.0).unwrap(), 1);
        assert_eq!(sampler.select::<Infallible>(&[0, 1], &w, 0.49).unwrap(), 1);
        assert_eq!(sampler.select::<Infallible>(&[0, 1], &w, 0.5).unwrap(), 3);
        assert_eq!(sampler.select::<Infallible>(&[0, 1], &w, 0.99).unwrap(), 3);
    }

    #[test]
    fn select_clamps_to_last_nonzero() {
        let sampler = MeasurementSampler::new(&(), &(), 1e-12);
        // a draw of (almost) 1 against an inexact total
        let w = [0.1, 0.2, 0.7, 0.0];
        let k = sampler.select::<Infallible>(&[0, 1], &w, 1.0).unwrap();
        assert_eq!(k, 2);
    }

    #[test]
    fn zero_total_is_anomalous() {
        let sampler = MeasurementSampler::new(&(), &(), 1e-12);
        let res = sampler.select::<Infallible>(&[0, 1], &[0.0; 4], 0.3);
        assert!(matches!(
            res,
            Err(RunError::NumericAnomaly { anomaly: Anomaly::Total(t), .. }) if t == 0.0
        ));
    }

    #[test]
    fn negative_weight_is_anomalous() {
        let a: fn(&mut Table, Action<'_, ()>) -> Result<(), Infallible> = apply;
        let p: fn(&Table, &[usize], &[bool]) -> Result<f64, Infallible>
            = probability;
        let sampler: Sampler = MeasurementSampler::new(&a, &p, 1e-12);
        let mut state = Table { weights: [0.5, -0.1, 0.3, 0.3], ..Table::default() };
        let mut rng = RandomSource::new(Some(1));
        let res = sampler.sample(&mut state, &[0, 1], &mut rng);
        match res {
            Err(err @ RunError::NumericAnomaly { .. }) => {
                assert!(matches!(
                    err,
                    RunError::NumericAnomaly {
                        anomaly: Anomaly::Weight { candidate: 1, weight },
                        ..
                    } if weight == -0.1
                ));
                assert!(err.to_string().contains("candidate 1"));
            },
            other => panic!("expected a bad weight, got {:?}", other),
        }
        assert!(state.collapsed.is_empty());
    }

    #[test]
    fn sample_collapses_onto_drawn_outcome() {
        let a: fn(&mut Table, Action<'_, ()>) -> Result<(), Infallible> = apply;
        let p: fn(&Table, &[usize], &[bool]) -> Result<f64, Infallible>
            = probability;
        let sampler: Sampler = MeasurementSampler::new(&a, &p, 1e-12);
        let mut state = Table { weights: [0.0, 0.0, 5.0, 0.0], ..Table::default() };
        let mut rng = RandomSource::new(Some(3));
        let outcome = sampler.sample(&mut state, &[0, 1], &mut rng).unwrap();
        assert_eq!(outcome, vec![true, false]);
        assert_eq!(state.collapsed, vec![vec![true, false]]);
    }
}
