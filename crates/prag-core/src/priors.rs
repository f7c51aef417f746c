use crate::error::EngineError;
use crate::infer::Trace;
use crate::model::spec::DomainSpec;
use crate::model::world::WorldMask;
use std::sync::Arc;

/// Prior distributions over worlds, contexts, utterances, and QUDs, all
/// drawn from the domain specification.
#[derive(Debug, Clone)]
pub struct Priors {
    spec: Arc<DomainSpec>,
}

impl Priors {
    pub fn new(spec: Arc<DomainSpec>) -> Self {
        Self { spec }
    }

    /// Draws a world as a one-hot mask.
    ///
    /// Weights are uniform when `uniform` is set or the specification
    /// declares none; otherwise the declared per-world weights apply. A
    /// context mask zeroes excluded worlds and renormalizes, failing when no
    /// mass survives. An observed world fixes the draw to the index
    /// recovered from its single set bit.
    pub fn world_prior(
        &self,
        trace: &mut Trace,
        context: Option<WorldMask>,
        observed: Option<WorldMask>,
        uniform: bool,
    ) -> Result<WorldMask, EngineError> {
        let count = self.spec.world_count();
        let mut weights: Vec<f64> = match (uniform, self.spec.world_weights()) {
            (false, Some(declared)) => declared.to_vec(),
            _ => vec![1.0 / count as f64; count],
        };

        if let Some(mask) = context {
            for (index, weight) in weights.iter_mut().enumerate() {
                if !mask.contains(index) {
                    *weight = 0.0;
                }
            }
            let total: f64 = weights.iter().sum();
            if total <= 0.0 {
                return Err(EngineError::DegenerateWorldPrior { context: mask });
            }
            for weight in &mut weights {
                *weight /= total;
            }
        }

        let index = match observed {
            Some(mask) => {
                let index = mask
                    .solo_index()
                    .ok_or(EngineError::ObservedWorldNotSingular { mask })?;
                trace.observe("world", &weights, index)
            }
            None => trace.sample("world", &weights),
        }?;
        Ok(WorldMask::solo(index))
    }

    /// Draws a context uniformly from the enumerated context set.
    pub fn context_prior(&self, trace: &mut Trace) -> Result<WorldMask, EngineError> {
        let contexts = self.spec.contexts();
        let weights = vec![1.0 / contexts.len() as f64; contexts.len()];
        let index = trace.sample("context", &weights)?;
        Ok(contexts[index])
    }

    /// Draws an utterance label from the cost-adjusted prior
    /// `softmax(log(1/n) - cost_multiplier * cost)`.
    pub fn utterance_prior(
        &self,
        trace: &mut Trace,
        cost_multiplier: f64,
    ) -> Result<String, EngineError> {
        let lexicon = self.spec.lexicon();
        let uniform = 1.0 / lexicon.len() as f64;
        let logits: Vec<f64> = lexicon
            .labels()
            .map(|label| uniform.ln() - cost_multiplier * lexicon.cost(label))
            .collect();
        let weights = softmax(&logits);
        let index = trace.sample("utterance", &weights)?;
        Ok(lexicon.label(index).to_string())
    }

    /// Draws (or fixes, when observed) a QUD label uniformly. Only the
    /// uniform, observation-conditioned mode exists; the world/context
    /// conditioned mode is an open extension point and fails explicitly.
    pub fn qud_prior(
        &self,
        trace: &mut Trace,
        world: WorldMask,
        context: WorldMask,
        observed: Option<&str>,
        uniform: bool,
    ) -> Result<String, EngineError> {
        if !uniform {
            return Err(EngineError::QudPriorUnsupported);
        }
        let _ = (world, context);

        let labels = self.spec.qud_labels();
        let weights = vec![1.0 / labels.len() as f64; labels.len()];
        let index = match observed {
            Some(label) => {
                let index = labels
                    .iter()
                    .position(|known| *known == label)
                    .ok_or_else(|| EngineError::UnknownQud(label.to_string()))?;
                trace.observe("qud", &weights, index)
            }
            None => trace.sample("qud", &weights),
        }?;
        Ok(labels[index].to_string())
    }
}

fn softmax(logits: &[f64]) -> Vec<f64> {
    let shift = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|logit| (logit - shift).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|exp| exp / total).collect()
}

#[cfg(test)]
mod tests {
    use super::Priors;
    use crate::error::EngineError;
    use crate::infer::enumerate;
    use crate::model::spec::DomainSpec;
    use crate::model::world::WorldMask;
    use std::sync::Arc;

    fn priors(world_prior: Option<&str>) -> Priors {
        let prior_block = world_prior
            .map(|block| format!("\"world_prior\": {block},"))
            .unwrap_or_default();
        let raw = format!(
            r#"{{
                "worlds": {{"a": "A", "b": "B", "c": "C"}},
                {prior_block}
                "utterances": {{"left": [1, 1, 0]}},
                "quds": {{"side": {{"lo": [1, 1, 0], "hi": [0, 0, 1]}}}}
            }}"#
        );
        let spec = DomainSpec::from_json_str(&raw).expect("parse domain");
        Priors::new(Arc::new(spec))
    }

    #[test]
    fn world_prior_defaults_to_uniform() {
        let priors = priors(None);
        let marginal =
            enumerate(|trace| priors.world_prior(trace, None, None, false)).expect("enumerate");
        for index in 0..3 {
            assert!((marginal.prob(&WorldMask::solo(index)) - 1.0 / 3.0).abs() < 1e-12);
        }
    }

    #[test]
    fn declared_weights_shape_the_world_prior() {
        let priors = priors(Some(r#"{"a": 1.0, "b": 1.0, "c": 2.0}"#));
        let marginal =
            enumerate(|trace| priors.world_prior(trace, None, None, false)).expect("enumerate");
        assert!((marginal.prob(&WorldMask::solo(2)) - 0.5).abs() < 1e-12);
        // the uniform flag overrides the declared weights
        let uniform =
            enumerate(|trace| priors.world_prior(trace, None, None, true)).expect("enumerate");
        assert!((uniform.prob(&WorldMask::solo(2)) - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn context_masks_renormalize_the_world_prior() {
        let priors = priors(Some(r#"{"a": 3.0, "b": 1.0, "c": 4.0}"#));
        let context = WorldMask::from_bits(0b011);
        let marginal = enumerate(|trace| priors.world_prior(trace, Some(context), None, false))
            .expect("enumerate");
        assert!((marginal.prob(&WorldMask::solo(0)) - 0.75).abs() < 1e-12);
        assert!((marginal.prob(&WorldMask::solo(1)) - 0.25).abs() < 1e-12);
        assert_eq!(marginal.prob(&WorldMask::solo(2)), 0.0);
    }

    #[test]
    fn empty_context_intersection_is_a_failure() {
        let priors = priors(Some(r#"{"a": 1.0, "b": 1.0, "c": 0.0}"#));
        let context = WorldMask::from_bits(0b100);
        let result = enumerate(|trace| priors.world_prior(trace, Some(context), None, false));
        assert_eq!(
            result.expect_err("no surviving mass"),
            EngineError::DegenerateWorldPrior { context }
        );
    }

    #[test]
    fn observed_world_fixes_the_draw() {
        let priors = priors(None);
        let observed = WorldMask::solo(1);
        let marginal = enumerate(|trace| priors.world_prior(trace, None, Some(observed), false))
            .expect("enumerate");
        assert_eq!(marginal.len(), 1);
        assert_eq!(marginal.prob(&observed), 1.0);
    }

    #[test]
    fn observed_world_must_be_one_hot() {
        let priors = priors(None);
        let mask = WorldMask::from_bits(0b011);
        let result = enumerate(|trace| priors.world_prior(trace, None, Some(mask), false));
        assert_eq!(
            result.expect_err("two set bits"),
            EngineError::ObservedWorldNotSingular { mask }
        );
    }

    #[test]
    fn utterance_prior_penalizes_costly_utterances() {
        let priors = priors(None);
        let marginal =
            enumerate(|trace| priors.utterance_prior(trace, 0.5)).expect("enumerate");
        // "_" was injected with cost 0; "left" costs 1
        let null = marginal.prob(&"_".to_string());
        let left = marginal.prob(&"left".to_string());
        assert!(null > left);
        assert!((left / null - (-0.5f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn zero_cost_multiplier_keeps_the_utterance_prior_uniform() {
        let priors = priors(None);
        let marginal = enumerate(|trace| priors.utterance_prior(trace, 0.0)).expect("enumerate");
        assert!((marginal.prob(&"left".to_string()) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn qud_prior_observation_fixes_the_label() {
        let priors = priors(None);
        let marginal =
            enumerate(|trace| priors.qud_prior(trace, WorldMask::solo(0), WorldMask::full(3), Some("side"), true))
                .expect("enumerate");
        assert_eq!(marginal.prob(&"side".to_string()), 1.0);
    }

    #[test]
    fn non_uniform_qud_prior_is_not_supported() {
        let priors = priors(None);
        let result = enumerate(|trace| {
            priors.qud_prior(trace, WorldMask::solo(0), WorldMask::full(3), None, false)
        });
        assert_eq!(
            result.expect_err("unsupported mode"),
            EngineError::QudPriorUnsupported
        );
    }

    #[test]
    fn unknown_observed_qud_is_a_failure() {
        let priors = priors(None);
        let result = enumerate(|trace| {
            priors.qud_prior(trace, WorldMask::solo(0), WorldMask::full(3), Some("ghost"), true)
        });
        assert_eq!(
            result.expect_err("unknown label"),
            EngineError::UnknownQud("ghost".to_string())
        );
    }
}
