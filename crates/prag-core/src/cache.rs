use crate::infer::Marginal;
use crate::model::world::WorldMask;
use crate::reasoner::OutputSpace;
use std::collections::HashMap;

/// Cache key: reasoner identity plus its full argument tuple.
///
/// Floating-point arguments are keyed by bit pattern and a projected source
/// distribution by its value fingerprint, so two calls with value-equal but
/// separately constructed arguments land on the same entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Query {
    LiteralListener {
        utterance: String,
        context: WorldMask,
    },
    Speaker {
        world: WorldMask,
        qud: String,
        context: WorldMask,
        alpha: u64,
        cost_multiplier: u64,
    },
    PragmaticListener {
        utterance: String,
        qud: String,
        output: OutputSpace,
        alpha: u64,
        cost_multiplier: u64,
    },
    Projection {
        source: u64,
        qud: String,
    },
}

impl Query {
    pub fn literal(utterance: &str, context: WorldMask) -> Self {
        Query::LiteralListener {
            utterance: utterance.to_string(),
            context,
        }
    }

    pub fn speaker(
        world: WorldMask,
        qud: &str,
        context: WorldMask,
        alpha: f64,
        cost_multiplier: f64,
    ) -> Self {
        Query::Speaker {
            world,
            qud: qud.to_string(),
            context,
            alpha: alpha.to_bits(),
            cost_multiplier: cost_multiplier.to_bits(),
        }
    }

    pub fn pragmatic(
        utterance: &str,
        qud: &str,
        output: OutputSpace,
        alpha: f64,
        cost_multiplier: f64,
    ) -> Self {
        Query::PragmaticListener {
            utterance: utterance.to_string(),
            qud: qud.to_string(),
            output,
            alpha: alpha.to_bits(),
            cost_multiplier: cost_multiplier.to_bits(),
        }
    }

    pub fn projection(source: u64, qud: &str) -> Self {
        Query::Projection {
            source,
            qud: qud.to_string(),
        }
    }
}

/// Typed payload stored per query; the variant mirrors the query's outcome
/// space.
#[derive(Debug, Clone)]
pub enum Cached {
    Worlds(Marginal<WorldMask>),
    Utterances(Marginal<String>),
    Alternatives(Marginal<usize>),
}

impl Cached {
    pub fn into_worlds(self) -> Option<Marginal<WorldMask>> {
        match self {
            Cached::Worlds(marginal) => Some(marginal),
            _ => None,
        }
    }

    pub fn into_utterances(self) -> Option<Marginal<String>> {
        match self {
            Cached::Utterances(marginal) => Some(marginal),
            _ => None,
        }
    }

    pub fn into_alternatives(self) -> Option<Marginal<usize>> {
        match self {
            Cached::Alternatives(marginal) => Some(marginal),
            _ => None,
        }
    }
}

/// Hit/miss counters; lets tests observe that each distinct argument tuple
/// is enumerated at most once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Memo table for computed marginals. Entries live as long as the engine
/// that owns the cache; there is no eviction.
#[derive(Debug, Default)]
pub struct MarginalCache {
    entries: HashMap<Query, Cached>,
    stats: CacheStats,
}

impl MarginalCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached marginal for `query`, counting a hit or a miss.
    pub fn lookup(&mut self, query: &Query) -> Option<Cached> {
        match self.entries.get(query) {
            Some(cached) => {
                self.stats.hits += 1;
                Some(cached.clone())
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Stores the computed marginal for `query`; the first write wins.
    pub fn store(&mut self, query: Query, value: Cached) {
        self.entries.entry(query).or_insert(value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}
