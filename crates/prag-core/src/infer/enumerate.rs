use crate::error::EngineError;
use crate::infer::marginal::Marginal;
use std::hash::Hash;

/// One execution of a probabilistic program during exhaustive enumeration.
///
/// The driver re-runs the program once per combination of choice-point
/// indices. A trace replays the forced index prefix handed to it and records
/// the support size of every choice point it visits, so the driver can
/// advance through the combination space odometer-style.
#[derive(Debug)]
pub struct Trace {
    forced: Vec<usize>,
    taken: Vec<usize>,
    sizes: Vec<usize>,
    log_weight: f64,
    scale: f64,
}

impl Trace {
    fn new(forced: &[usize]) -> Self {
        Self {
            forced: forced.to_vec(),
            taken: Vec::new(),
            sizes: Vec::new(),
            log_weight: 0.0,
            scale: 1.0,
        }
    }

    /// Introduces a choice point over `weights` and returns the branch index
    /// taken on this run. Weights need not be normalized; they must sum to a
    /// positive finite value.
    pub fn sample(&mut self, site: &'static str, weights: &[f64]) -> Result<usize, EngineError> {
        let total = positive_total(site, weights)?;
        let index = self.forced.get(self.taken.len()).copied().unwrap_or(0);
        self.taken.push(index);
        self.sizes.push(weights.len());
        self.push_probability(weights[index] / total);
        Ok(index)
    }

    /// Conditions a choice point on an observed branch instead of exploring
    /// it: the branch's probability enters the trace weight and the index is
    /// returned unchanged.
    pub fn observe(
        &mut self,
        site: &'static str,
        weights: &[f64],
        index: usize,
    ) -> Result<usize, EngineError> {
        let total = positive_total(site, weights)?;
        let probability = weights.get(index).copied().unwrap_or(0.0) / total;
        self.push_probability(probability);
        Ok(index)
    }

    /// Draws from an already-computed exact marginal.
    pub fn sample_from<V: Clone + Eq + Hash>(
        &mut self,
        site: &'static str,
        marginal: &Marginal<V>,
    ) -> Result<V, EngineError> {
        let weights: Vec<f64> = marginal.iter().map(|(_, prob)| prob).collect();
        let index = self.sample(site, &weights)?;
        Ok(marginal.value_at(index).clone())
    }

    /// Conditions on an already-computed marginal yielding `value`. A value
    /// outside the marginal's support excludes the branch.
    pub fn observe_from<V: Clone + Eq + Hash>(&mut self, marginal: &Marginal<V>, value: &V) {
        self.push_log(marginal.log_prob(value));
    }

    /// Adds an arbitrary log-weight to the current branch.
    pub fn factor(&mut self, log_weight: f64) {
        self.push_log(log_weight);
    }

    /// Exactly removes the current branch when `keep` is false.
    pub fn condition(&mut self, keep: bool) {
        if !keep {
            self.log_weight = f64::NEG_INFINITY;
        }
    }

    /// Runs `body` with every weight statement inside it scaled by `factor`.
    pub fn scaled<T>(
        &mut self,
        factor: f64,
        body: impl FnOnce(&mut Self) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let previous = self.scale;
        self.scale = previous * factor;
        let result = body(self);
        self.scale = previous;
        result
    }

    fn push_probability(&mut self, probability: f64) {
        self.push_log(if probability > 0.0 {
            probability.ln()
        } else {
            f64::NEG_INFINITY
        });
    }

    fn push_log(&mut self, log_weight: f64) {
        if log_weight == f64::NEG_INFINITY {
            self.log_weight = f64::NEG_INFINITY;
        } else {
            self.log_weight += self.scale * log_weight;
        }
    }
}

fn positive_total(site: &'static str, weights: &[f64]) -> Result<f64, EngineError> {
    let total: f64 = weights.iter().sum();
    if total > 0.0 && total.is_finite() {
        Ok(total)
    } else {
        Err(EngineError::DegenerateWeights { site })
    }
}

/// Exhaustively enumerates a finite-support probabilistic program and
/// normalizes the accumulated branch weights into an exact posterior.
///
/// The program is a deterministic function of the choices its trace hands
/// out, so re-running it with a different forced prefix walks a different
/// branch of the choice tree. Termination follows from every choice point
/// having finite support and the program making finitely many choices.
pub fn enumerate<V, F>(mut program: F) -> Result<Marginal<V>, EngineError>
where
    V: Clone + Eq + Hash,
    F: FnMut(&mut Trace) -> Result<V, EngineError>,
{
    let mut outcomes = Vec::new();
    let mut forced: Vec<usize> = Vec::new();
    loop {
        let mut trace = Trace::new(&forced);
        let value = program(&mut trace)?;
        outcomes.push((value, trace.log_weight));
        match next_assignment(&trace.taken, &trace.sizes) {
            Some(next) => forced = next,
            None => break,
        }
    }
    Marginal::from_log_weighted(outcomes)
}

/// Deepest-first increment over the visited choice points; `None` once every
/// combination has been run.
fn next_assignment(taken: &[usize], sizes: &[usize]) -> Option<Vec<usize>> {
    for depth in (0..taken.len()).rev() {
        if taken[depth] + 1 < sizes[depth] {
            let mut next = taken[..depth].to_vec();
            next.push(taken[depth] + 1);
            return Some(next);
        }
    }
    None
}
