use crate::error::EngineError;
use rand::Rng;
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Exact finite distribution over outcomes of type `V`.
///
/// Outcomes are deduplicated by value equality and their masses summed;
/// support order is first-seen order, so iteration is deterministic for a
/// deterministic program.
#[derive(Debug, Clone, PartialEq)]
pub struct Marginal<V> {
    support: Vec<(V, f64)>,
}

impl<V: Clone + Eq + Hash> Marginal<V> {
    /// Normalizes log-weighted outcomes into an exact posterior. Branches
    /// with weight negative infinity carry no mass; when nothing else
    /// remains the posterior support is empty and the call fails.
    pub(crate) fn from_log_weighted(outcomes: Vec<(V, f64)>) -> Result<Self, EngineError> {
        let shift = outcomes
            .iter()
            .map(|(_, log_weight)| *log_weight)
            .fold(f64::NEG_INFINITY, f64::max);
        if !shift.is_finite() {
            return Err(EngineError::EmptySupport);
        }

        let mut support: Vec<(V, f64)> = Vec::new();
        let mut slots: HashMap<V, usize> = HashMap::new();
        for (value, log_weight) in outcomes {
            if log_weight == f64::NEG_INFINITY {
                continue;
            }
            let mass = (log_weight - shift).exp();
            match slots.get(&value) {
                Some(&slot) => support[slot].1 += mass,
                None => {
                    slots.insert(value.clone(), support.len());
                    support.push((value, mass));
                }
            }
        }

        let total: f64 = support.iter().map(|(_, mass)| mass).sum();
        for entry in &mut support {
            entry.1 /= total;
        }
        Ok(Self { support })
    }

    pub fn len(&self) -> usize {
        self.support.len()
    }

    pub fn is_empty(&self) -> bool {
        self.support.is_empty()
    }

    /// (value, probability) pairs in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&V, f64)> {
        self.support.iter().map(|(value, prob)| (value, *prob))
    }

    pub fn support(&self) -> impl Iterator<Item = &V> {
        self.support.iter().map(|(value, _)| value)
    }

    pub(crate) fn value_at(&self, index: usize) -> &V {
        &self.support[index].0
    }

    /// Probability of `value`; 0 when the value is outside the support.
    pub fn prob(&self, value: &V) -> f64 {
        self.support
            .iter()
            .find(|(known, _)| known == value)
            .map(|(_, prob)| *prob)
            .unwrap_or(0.0)
    }

    /// Log-probability of `value`; negative infinity outside the support.
    pub fn log_prob(&self, value: &V) -> f64 {
        let prob = self.prob(value);
        if prob > 0.0 {
            prob.ln()
        } else {
            f64::NEG_INFINITY
        }
    }

    /// Draws one outcome proportionally to its mass.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> &V {
        let mut remaining = rng.gen_range(0.0..1.0);
        for (value, prob) in &self.support {
            if remaining < *prob {
                return value;
            }
            remaining -= prob;
        }
        // rounding pushed the draw past the last bucket
        &self.support[self.support.len() - 1].0
    }

    /// Order-sensitive digest of the support and its masses, usable as a
    /// cache key component for distribution-valued arguments.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        for (value, prob) in &self.support {
            value.hash(&mut hasher);
            prob.to_bits().hash(&mut hasher);
        }
        hasher.finish()
    }
}
