use prag_core::model::world::WorldMask;
use prag_core::reasoner::OutputSpace;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read scenario {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse scenario {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid scenario in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: ValidationError,
    },
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("scenario declares no queries")]
    NoQueries,
    #[error("query {index}: {reason}")]
    InvalidQuery { index: usize, reason: String },
}

/// Root scenario configuration loaded from YAML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ScenarioConfig {
    /// Path to the domain specification JSON.
    pub domain: PathBuf,
    pub queries: Vec<QueryConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// When set, every query result is also rendered as a bar chart here.
    #[serde(default)]
    pub plots_dir: Option<PathBuf>,
}

impl ScenarioConfig {
    /// Load and validate a scenario from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_buf = path.to_path_buf();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path_buf.clone(),
        })?;
        let reader = BufReader::new(file);
        let cfg: ScenarioConfig =
            serde_yaml::from_reader(reader).map_err(|source| ConfigError::Parse {
                source,
                path: path_buf.clone(),
            })?;
        cfg.validate().map_err(|source| ConfigError::Invalid {
            path: path_buf,
            source,
        })?;
        Ok(cfg)
    }

    /// Validate the scenario without performing I/O.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.queries.is_empty() {
            return Err(ValidationError::NoQueries);
        }
        for (index, query) in self.queries.iter().enumerate() {
            query.validate(index)?;
        }
        Ok(())
    }
}

/// One reasoner invocation from the scenario file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "reasoner", rename_all = "snake_case")]
pub enum QueryConfig {
    LiteralListener {
        utterance: String,
        context: Vec<u8>,
    },
    Speaker {
        world: String,
        qud: String,
        context: Vec<u8>,
        #[serde(default)]
        alpha: Option<f64>,
        #[serde(default)]
        cost_multiplier: Option<f64>,
    },
    PragmaticListener {
        utterance: String,
        qud: String,
        #[serde(default = "default_output")]
        output: String,
        #[serde(default)]
        alpha: Option<f64>,
        #[serde(default)]
        cost_multiplier: Option<f64>,
    },
}

fn default_output() -> String {
    "world".to_string()
}

impl QueryConfig {
    fn validate(&self, index: usize) -> Result<(), ValidationError> {
        match self {
            QueryConfig::LiteralListener { context, .. } => validate_indicator(index, context),
            QueryConfig::Speaker { context, .. } => validate_indicator(index, context),
            QueryConfig::PragmaticListener { output, .. } => output
                .parse::<OutputSpace>()
                .map(|_| ())
                .map_err(|error| ValidationError::InvalidQuery {
                    index,
                    reason: error.to_string(),
                }),
        }
    }
}

fn validate_indicator(index: usize, values: &[u8]) -> Result<(), ValidationError> {
    if values.is_empty() || WorldMask::from_indicator(values).is_none() {
        return Err(ValidationError::InvalidQuery {
            index,
            reason: "context must be a non-empty 0/1 vector".to_string(),
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Default tracing directive; `RUST_LOG` still wins when set.
    #[serde(default)]
    pub level: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::{QueryConfig, ScenarioConfig, ValidationError};
    use std::io::Write;

    const BASIC_YAML: &str = r#"
domain: "lab/sprinter.json"
queries:
  - reasoner: pragmatic_listener
    utterance: "Olympic sprinter"
    qud: "profession"
    output: "world"
  - reasoner: literal_listener
    utterance: "Olympic sprinter"
    context: [1, 1, 1, 1]
  - reasoner: speaker
    world: "w0"
    qud: "profession"
    context: [1, 1, 1, 1]
    alpha: 4.0
logging:
  level: "debug"
"#;

    #[test]
    fn loads_and_validates_a_basic_scenario() {
        let cfg: ScenarioConfig = serde_yaml::from_str(BASIC_YAML).expect("parse yaml");
        cfg.validate().expect("validate");
        assert_eq!(cfg.queries.len(), 3);
        assert_eq!(cfg.logging.level.as_deref(), Some("debug"));
        match &cfg.queries[2] {
            QueryConfig::Speaker {
                alpha,
                cost_multiplier,
                ..
            } => {
                assert_eq!(*alpha, Some(4.0));
                assert_eq!(*cost_multiplier, None);
            }
            other => panic!("expected a speaker query, got {other:?}"),
        }
    }

    #[test]
    fn pragmatic_listener_output_defaults_to_world() {
        let raw = r#"
domain: "d.json"
queries:
  - reasoner: pragmatic_listener
    utterance: "hi"
    qud: "q"
"#;
        let cfg: ScenarioConfig = serde_yaml::from_str(raw).expect("parse yaml");
        match &cfg.queries[0] {
            QueryConfig::PragmaticListener { output, .. } => assert_eq!(output, "world"),
            other => panic!("expected a pragmatic listener query, got {other:?}"),
        }
    }

    #[test]
    fn invalid_output_space_fails_validation() {
        let raw = r#"
domain: "d.json"
queries:
  - reasoner: pragmatic_listener
    utterance: "hi"
    qud: "q"
    output: "posterior"
"#;
        let cfg: ScenarioConfig = serde_yaml::from_str(raw).expect("parse yaml");
        assert!(matches!(
            cfg.validate(),
            Err(ValidationError::InvalidQuery { index: 0, .. })
        ));
    }

    #[test]
    fn malformed_context_vector_fails_validation() {
        let raw = r#"
domain: "d.json"
queries:
  - reasoner: literal_listener
    utterance: "hi"
    context: [1, 2, 0]
"#;
        let cfg: ScenarioConfig = serde_yaml::from_str(raw).expect("parse yaml");
        assert!(matches!(
            cfg.validate(),
            Err(ValidationError::InvalidQuery { index: 0, .. })
        ));
    }

    #[test]
    fn empty_query_lists_are_rejected() {
        let raw = r#"
domain: "d.json"
queries: []
"#;
        let cfg: ScenarioConfig = serde_yaml::from_str(raw).expect("parse yaml");
        assert!(matches!(cfg.validate(), Err(ValidationError::NoQueries)));
    }

    #[test]
    fn from_path_loads_a_file_on_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(BASIC_YAML.as_bytes()).expect("write yaml");
        let cfg = ScenarioConfig::from_path(file.path()).expect("load scenario");
        assert_eq!(cfg.queries.len(), 3);
    }
}
