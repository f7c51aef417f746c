use crate::cache::{Cached, CacheStats, MarginalCache, Query};
use crate::error::EngineError;
use crate::infer::{Marginal, enumerate};
use crate::model::qud::Qud;
use crate::model::spec::DomainSpec;
use crate::model::world::WorldMask;
use crate::priors::Priors;
use core::fmt;
use core::str::FromStr;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Which marginal the pragmatic listener reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputSpace {
    World,
    Context,
}

impl FromStr for OutputSpace {
    type Err = EngineError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "world" => Ok(OutputSpace::World),
            "context" => Ok(OutputSpace::Context),
            other => Err(EngineError::InvalidOutputSpace(other.to_string())),
        }
    }
}

impl fmt::Display for OutputSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputSpace::World => "world",
            OutputSpace::Context => "context",
        })
    }
}

/// Speaker rationality and production-cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeakerConfig {
    /// Scale applied to every weight statement in the speaker program; larger
    /// values sharpen the preference for informative utterances.
    pub alpha: f64,
    /// Scale applied to utterance costs inside the utterance prior.
    pub cost_multiplier: f64,
}

impl Default for SpeakerConfig {
    fn default() -> Self {
        Self {
            alpha: 1000.0,
            cost_multiplier: 0.02,
        }
    }
}

/// The three mutually recursive reasoners over one immutable domain.
///
/// Every reasoner is an exact probabilistic program over finite support, and
/// every returned marginal is an exact posterior. Posteriors are memoized
/// for the engine's lifetime keyed by reasoner identity plus argument tuple,
/// so each distinct query is enumerated at most once; recursion bottoms out
/// because the roles nest in a fixed order (listener, speaker, listener).
/// Construct a fresh engine for an isolated cache.
#[derive(Debug)]
pub struct RsaEngine {
    spec: Arc<DomainSpec>,
    priors: Priors,
    cache: Mutex<MarginalCache>,
}

impl RsaEngine {
    pub fn new(spec: DomainSpec) -> Self {
        let spec = Arc::new(spec);
        Self {
            priors: Priors::new(Arc::clone(&spec)),
            spec,
            cache: Mutex::new(MarginalCache::new()),
        }
    }

    pub fn spec(&self) -> &DomainSpec {
        &self.spec
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.lock().stats()
    }

    /// Posterior over worlds given an utterance taken literally: worlds
    /// compatible with the context and the utterance's meaning, weighted by
    /// the unconditioned world prior. Incompatible worlds carry exactly zero
    /// mass.
    pub fn literal_listener(
        &self,
        utterance: &str,
        context: WorldMask,
    ) -> Result<Marginal<WorldMask>, EngineError> {
        let query = Query::literal(utterance, context);
        if let Some(found) = self.cache.lock().lookup(&query).and_then(Cached::into_worlds) {
            return Ok(found);
        }

        let meaning = self.spec.meaning(utterance);
        let marginal = enumerate(|trace| {
            let world = self.priors.world_prior(trace, None, None, false)?;
            trace.condition(!(world & context & meaning).is_empty());
            Ok(world)
        })?;

        self.cache.lock().store(query, Cached::Worlds(marginal.clone()));
        Ok(marginal)
    }

    /// Posterior over utterances for a speaker conveying the QUD value of
    /// `world`, with default rationality parameters.
    pub fn speaker(
        &self,
        world: WorldMask,
        qud: &str,
        context: WorldMask,
    ) -> Result<Marginal<String>, EngineError> {
        self.speaker_with(world, qud, context, SpeakerConfig::default())
    }

    /// Under log-weight scale `alpha`, draws an utterance from the
    /// cost-weighted prior and conditions on the literal listener's
    /// posterior, projected onto the QUD, matching the world's true QUD
    /// value. An utterance no literal listener could interpret in this
    /// context contributes zero mass to its branch.
    pub fn speaker_with(
        &self,
        world: WorldMask,
        qud: &str,
        context: WorldMask,
        config: SpeakerConfig,
    ) -> Result<Marginal<String>, EngineError> {
        let query = Query::speaker(world, qud, context, config.alpha, config.cost_multiplier);
        if let Some(found) = self
            .cache
            .lock()
            .lookup(&query)
            .and_then(Cached::into_utterances)
        {
            return Ok(found);
        }

        let target = self.qud(qud)?.alternative_for(world)?;
        let marginal = enumerate(|trace| {
            trace.scaled(config.alpha, |trace| {
                let utterance = self.priors.utterance_prior(trace, config.cost_multiplier)?;
                match self.literal_listener(&utterance, context) {
                    Ok(literal) => {
                        let projected = self.project(&literal, qud)?;
                        trace.observe_from(&projected, &target);
                    }
                    Err(EngineError::EmptySupport) => trace.condition(false),
                    Err(error) => return Err(error),
                }
                Ok(utterance)
            })
        })?;

        self.cache
            .lock()
            .store(query, Cached::Utterances(marginal.clone()));
        Ok(marginal)
    }

    /// Posterior over worlds (or contexts) for a listener reasoning about a
    /// rational speaker, with default rationality parameters.
    pub fn pragmatic_listener(
        &self,
        utterance: &str,
        qud: &str,
        output: OutputSpace,
    ) -> Result<Marginal<WorldMask>, EngineError> {
        self.pragmatic_listener_with(utterance, qud, output, SpeakerConfig::default())
    }

    /// Jointly samples a context and a world admissible in it, fixes the QUD
    /// by observation, and conditions on the speaker having produced the
    /// heard utterance; reports the world or the context marginal.
    pub fn pragmatic_listener_with(
        &self,
        utterance: &str,
        qud: &str,
        output: OutputSpace,
        config: SpeakerConfig,
    ) -> Result<Marginal<WorldMask>, EngineError> {
        let query = Query::pragmatic(utterance, qud, output, config.alpha, config.cost_multiplier);
        if let Some(found) = self.cache.lock().lookup(&query).and_then(Cached::into_worlds) {
            return Ok(found);
        }

        let heard = utterance.to_string();
        let marginal = enumerate(|trace| {
            let context = self.priors.context_prior(trace)?;
            let world = self.priors.world_prior(trace, Some(context), None, true)?;
            self.priors.qud_prior(trace, world, context, Some(qud), true)?;

            match self.speaker_with(world, qud, context, config) {
                Ok(speaker) => trace.observe_from(&speaker, &heard),
                Err(EngineError::EmptySupport) => trace.condition(false),
                Err(error) => return Err(error),
            }

            Ok(match output {
                OutputSpace::World => world,
                OutputSpace::Context => context,
            })
        })?;

        self.cache.lock().store(query, Cached::Worlds(marginal.clone()));
        Ok(marginal)
    }

    /// Collapses a world-level posterior onto the QUD's alternative space;
    /// the returned marginal ranges over alternative indices.
    pub fn project(
        &self,
        dist: &Marginal<WorldMask>,
        qud: &str,
    ) -> Result<Marginal<usize>, EngineError> {
        let query = Query::projection(dist.fingerprint(), qud);
        if let Some(found) = self
            .cache
            .lock()
            .lookup(&query)
            .and_then(Cached::into_alternatives)
        {
            return Ok(found);
        }

        let partition = self.qud(qud)?;
        let marginal = enumerate(|trace| {
            let world = trace.sample_from("projection", dist)?;
            partition.alternative_for(world)
        })?;

        self.cache
            .lock()
            .store(query, Cached::Alternatives(marginal.clone()));
        Ok(marginal)
    }

    pub fn world_labels(&self) -> &[String] {
        self.spec.world_labels()
    }

    pub fn utterance_labels(&self) -> Vec<&str> {
        self.spec.lexicon().labels().collect()
    }

    pub fn qud_labels(&self) -> Vec<&str> {
        self.spec.qud_labels()
    }

    pub fn alternative_labels(&self, qud: &str) -> Result<Vec<&str>, EngineError> {
        Ok(self.qud(qud)?.alternative_labels().collect())
    }

    pub fn context_masks(&self) -> &[WorldMask] {
        self.spec.contexts()
    }

    pub fn context_labels(&self) -> Vec<String> {
        self.spec
            .contexts()
            .iter()
            .map(|mask| mask.to_string())
            .collect()
    }

    fn qud(&self, label: &str) -> Result<&Qud, EngineError> {
        self.spec
            .qud(label)
            .ok_or_else(|| EngineError::UnknownQud(label.to_string()))
    }
}
