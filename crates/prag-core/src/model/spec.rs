use crate::model::context::enumerate_contexts;
use crate::model::qud::Qud;
use crate::model::utterance::Lexicon;
use crate::model::world::{MAX_WORLDS, WorldMask};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpecError {
    #[error("failed to parse domain specification: {0}")]
    Json(#[from] serde_json::Error),
    #[error("'{0}' is missing from the domain specification")]
    MissingField(&'static str),
    #[error("'{0}' does not have the expected shape")]
    WrongShape(&'static str),
    #[error("display label for world '{id}' must be a string")]
    WorldLabel { id: String },
    #[error("domain must declare between 1 and {MAX_WORLDS} worlds, found {0}")]
    WorldCount(usize),
    #[error("'{field}' entry '{entry}' must be a 0/1 vector of length {expected}")]
    BadIndicator {
        field: &'static str,
        entry: String,
        expected: usize,
    },
    #[error("world prior references unknown world id '{0}'")]
    UnknownWorldId(String),
    #[error("world prior is missing a weight for world '{0}'")]
    MissingWeight(String),
    #[error("world prior weight for '{0}' must be a non-negative finite number")]
    BadWeight(String),
    #[error("world prior weights must sum to a positive value")]
    ZeroPriorMass,
    #[error("context set is empty; declare more worlds or an explicit context list")]
    NoContexts,
    #[error("'quds' must declare at least one question")]
    NoQuds,
    #[error("QUD '{0}' declares no alternatives")]
    EmptyQud(String),
}

/// The parsed, validated, immutable description of the finite universe:
/// world labels, context masks, utterance meanings, QUD partitions, and
/// optional world-prior weights.
#[derive(Debug, Clone)]
pub struct DomainSpec {
    world_ids: Vec<String>,
    world_labels: Vec<String>,
    world_weights: Option<Vec<f64>>,
    contexts: Vec<WorldMask>,
    lexicon: Lexicon,
    quds: Vec<Qud>,
}

impl DomainSpec {
    pub fn from_json_str(raw: &str) -> Result<Self, SpecError> {
        let value: Value = serde_json::from_str(raw)?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Result<Self, SpecError> {
        let root = value.as_object().ok_or(SpecError::WrongShape("domain"))?;

        let worlds = root
            .get("worlds")
            .ok_or(SpecError::MissingField("worlds"))?
            .as_object()
            .ok_or(SpecError::WrongShape("worlds"))?;
        let mut world_ids = Vec::with_capacity(worlds.len());
        let mut world_labels = Vec::with_capacity(worlds.len());
        for (id, label) in worlds {
            let label = label
                .as_str()
                .ok_or_else(|| SpecError::WorldLabel { id: id.clone() })?;
            world_ids.push(id.clone());
            world_labels.push(label.to_string());
        }
        let n_worlds = world_ids.len();
        if n_worlds == 0 || n_worlds > MAX_WORLDS {
            return Err(SpecError::WorldCount(n_worlds));
        }

        let world_weights = match root.get("world_prior") {
            Some(value) => Some(parse_world_weights(value, &world_ids)?),
            None => None,
        };

        let explicit_contexts = match root.get("contexts") {
            Some(value) => {
                let rows = value.as_array().ok_or(SpecError::WrongShape("contexts"))?;
                let mut contexts = Vec::with_capacity(rows.len());
                for (index, row) in rows.iter().enumerate() {
                    contexts.push(parse_indicator(
                        "contexts",
                        &index.to_string(),
                        row,
                        n_worlds,
                    )?);
                }
                Some(contexts)
            }
            None => None,
        };
        let contexts = enumerate_contexts(explicit_contexts, n_worlds);
        if contexts.is_empty() {
            return Err(SpecError::NoContexts);
        }

        let utterances = root
            .get("utterances")
            .ok_or(SpecError::MissingField("utterances"))?
            .as_object()
            .ok_or(SpecError::WrongShape("utterances"))?;
        let mut entries = Vec::with_capacity(utterances.len());
        for (label, row) in utterances {
            entries.push((
                label.clone(),
                parse_indicator("utterances", label, row, n_worlds)?,
            ));
        }
        let lexicon = Lexicon::new(entries, n_worlds);

        let quds_table = root
            .get("quds")
            .ok_or(SpecError::MissingField("quds"))?
            .as_object()
            .ok_or(SpecError::WrongShape("quds"))?;
        let mut quds = Vec::with_capacity(quds_table.len());
        for (label, alternatives) in quds_table {
            let table = alternatives
                .as_object()
                .ok_or(SpecError::WrongShape("quds"))?;
            if table.is_empty() {
                return Err(SpecError::EmptyQud(label.clone()));
            }
            let mut parsed = Vec::with_capacity(table.len());
            for (alternative, row) in table {
                parsed.push((
                    alternative.clone(),
                    parse_indicator("quds", alternative, row, n_worlds)?,
                ));
            }
            quds.push(Qud::new(label.clone(), parsed));
        }
        if quds.is_empty() {
            return Err(SpecError::NoQuds);
        }

        Ok(Self {
            world_ids,
            world_labels,
            world_weights,
            contexts,
            lexicon,
            quds,
        })
    }

    pub fn world_count(&self) -> usize {
        self.world_ids.len()
    }

    pub fn world_ids(&self) -> &[String] {
        &self.world_ids
    }

    pub fn world_labels(&self) -> &[String] {
        &self.world_labels
    }

    /// Index of the world declared under `id`.
    pub fn world_index(&self, id: &str) -> Option<usize> {
        self.world_ids.iter().position(|known| known == id)
    }

    /// Declared per-world prior weights, when the specification carries any.
    pub fn world_weights(&self) -> Option<&[f64]> {
        self.world_weights.as_deref()
    }

    pub fn contexts(&self) -> &[WorldMask] {
        &self.contexts
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Literal meaning of `utterance`, with the null-utterance fallback.
    pub fn meaning(&self, utterance: &str) -> WorldMask {
        self.lexicon.meaning(utterance)
    }

    pub fn quds(&self) -> &[Qud] {
        &self.quds
    }

    pub fn qud(&self, label: &str) -> Option<&Qud> {
        self.quds.iter().find(|qud| qud.label() == label)
    }

    pub fn qud_labels(&self) -> Vec<&str> {
        self.quds.iter().map(Qud::label).collect()
    }

    /// Mask covering every declared world.
    pub fn full_mask(&self) -> WorldMask {
        WorldMask::full(self.world_count())
    }
}

fn parse_world_weights(value: &Value, world_ids: &[String]) -> Result<Vec<f64>, SpecError> {
    let table = value
        .as_object()
        .ok_or(SpecError::WrongShape("world_prior"))?;
    for id in table.keys() {
        if !world_ids.contains(id) {
            return Err(SpecError::UnknownWorldId(id.clone()));
        }
    }
    let mut weights = Vec::with_capacity(world_ids.len());
    for id in world_ids {
        let weight = table
            .get(id)
            .ok_or_else(|| SpecError::MissingWeight(id.clone()))?
            .as_f64()
            .ok_or_else(|| SpecError::BadWeight(id.clone()))?;
        if !weight.is_finite() || weight < 0.0 {
            return Err(SpecError::BadWeight(id.clone()));
        }
        weights.push(weight);
    }
    if weights.iter().sum::<f64>() <= 0.0 {
        return Err(SpecError::ZeroPriorMass);
    }
    Ok(weights)
}

fn parse_indicator(
    field: &'static str,
    entry: &str,
    value: &Value,
    expected: usize,
) -> Result<WorldMask, SpecError> {
    let bad = || SpecError::BadIndicator {
        field,
        entry: entry.to_string(),
        expected,
    };
    let row = value.as_array().ok_or_else(bad)?;
    if row.len() != expected {
        return Err(bad());
    }
    let mut flags = Vec::with_capacity(expected);
    for element in row {
        let flag = match element {
            Value::Bool(flag) => u8::from(*flag),
            Value::Number(number) => match number.as_u64() {
                Some(flag @ (0 | 1)) => flag as u8,
                _ => return Err(bad()),
            },
            _ => return Err(bad()),
        };
        flags.push(flag);
    }
    WorldMask::from_indicator(&flags).ok_or_else(bad)
}

#[cfg(test)]
mod tests {
    use super::{DomainSpec, SpecError};
    use crate::model::utterance::NULL_UTTERANCE;
    use crate::model::world::WorldMask;

    const SPRINTER_DOMAIN: &str = r#"{
        "worlds": {
            "w0": "Olympic-caliber sprinter",
            "w1": "retired sprinter",
            "w2": "office clerk",
            "w3": "surgeon"
        },
        "contexts": [[1, 1, 1, 1]],
        "utterances": {
            "Olympic sprinter": [1, 0, 0, 0],
            "works indoors": [0, 1, 1, 1]
        },
        "quds": {
            "profession": {
                "athlete": [1, 0, 0, 0],
                "non-athlete": [0, 1, 1, 1]
            }
        }
    }"#;

    #[test]
    fn parses_a_complete_domain() {
        let spec = DomainSpec::from_json_str(SPRINTER_DOMAIN).expect("parse domain");
        assert_eq!(spec.world_count(), 4);
        assert_eq!(spec.world_labels()[2], "office clerk");
        assert_eq!(spec.contexts(), &[WorldMask::full(4)]);
        assert_eq!(spec.meaning("Olympic sprinter"), WorldMask::solo(0));
        // the null utterance was injected and backs the fallback
        assert_eq!(spec.meaning(NULL_UTTERANCE), WorldMask::full(4));
        assert_eq!(spec.meaning("no such label"), WorldMask::full(4));
        assert_eq!(spec.qud_labels(), vec!["profession"]);
    }

    #[test]
    fn declaration_order_of_worlds_is_preserved() {
        let spec = DomainSpec::from_json_str(SPRINTER_DOMAIN).expect("parse domain");
        assert_eq!(
            spec.world_ids(),
            &["w0".to_string(), "w1".into(), "w2".into(), "w3".into()]
        );
        assert_eq!(spec.world_index("w3"), Some(3));
    }

    #[test]
    fn contexts_are_generated_when_not_declared() {
        let raw = r#"{
            "worlds": {"a": "A", "b": "B", "c": "C"},
            "utterances": {"x": [1, 0, 0]},
            "quds": {"q": {"left": [1, 1, 0], "right": [0, 0, 1]}}
        }"#;
        let spec = DomainSpec::from_json_str(raw).expect("parse domain");
        let bits: Vec<u32> = spec.contexts().iter().map(|mask| mask.bits()).collect();
        assert_eq!(bits, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn indicator_length_mismatch_is_rejected() {
        let raw = r#"{
            "worlds": {"a": "A", "b": "B"},
            "utterances": {"x": [1, 0, 0]},
            "quds": {"q": {"all": [1, 1]}}
        }"#;
        match DomainSpec::from_json_str(raw) {
            Err(SpecError::BadIndicator {
                field, expected, ..
            }) => {
                assert_eq!(field, "utterances");
                assert_eq!(expected, 2);
            }
            other => panic!("expected BadIndicator, got {other:?}"),
        }
    }

    #[test]
    fn world_prior_must_cover_known_worlds_only() {
        let raw = r#"{
            "worlds": {"a": "A", "b": "B"},
            "world_prior": {"a": 1.0, "b": 2.0, "ghost": 3.0},
            "utterances": {"x": [1, 0]},
            "quds": {"q": {"all": [1, 1]}}
        }"#;
        assert!(matches!(
            DomainSpec::from_json_str(raw),
            Err(SpecError::UnknownWorldId(id)) if id == "ghost"
        ));
    }

    #[test]
    fn single_world_domains_need_an_explicit_context() {
        let raw = r#"{
            "worlds": {"only": "Only"},
            "utterances": {"x": [1]},
            "quds": {"q": {"all": [1]}}
        }"#;
        assert!(matches!(
            DomainSpec::from_json_str(raw),
            Err(SpecError::NoContexts)
        ));
    }

    #[test]
    fn declared_weights_are_aligned_with_world_order() {
        let raw = r#"{
            "worlds": {"a": "A", "b": "B"},
            "world_prior": {"b": 3.0, "a": 1.0},
            "utterances": {"x": [1, 0]},
            "quds": {"q": {"all": [1, 1]}}
        }"#;
        let spec = DomainSpec::from_json_str(raw).expect("parse domain");
        assert_eq!(spec.world_weights(), Some(&[1.0, 3.0][..]));
    }
}
