use crate::model::world::WorldMask;
use thiserror::Error;

/// Failures surfaced by the priors, the enumeration facility, and the
/// reasoners. A failure is local to the invocation that produced it; a call
/// either resolves its exact marginal or fails as a whole.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Enumeration finished with every branch excluded.
    #[error("inference produced an empty posterior support")]
    EmptySupport,
    #[error("weights at choice point '{site}' do not sum to a positive value")]
    DegenerateWeights { site: &'static str },
    #[error("world prior has no mass inside context {context}")]
    DegenerateWorldPrior { context: WorldMask },
    #[error("observed world {mask} is not a one-hot indicator")]
    ObservedWorldNotSingular { mask: WorldMask },
    #[error("unknown QUD '{0}'")]
    UnknownQud(String),
    #[error("a QUD prior conditioned on world and context is not supported")]
    QudPriorUnsupported,
    #[error("no alternative of QUD '{qud}' covers world {world}")]
    NoMatchingAlternative { qud: String, world: WorldMask },
    #[error("invalid output space '{0}', expected 'world' or 'context'")]
    InvalidOutputSpace(String),
}
