use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing::{Level, event};

use prag_core::model::spec::DomainSpec;
use prag_core::model::world::WorldMask;
use prag_core::reasoner::{OutputSpace, RsaEngine, SpeakerConfig};
use prag_lab::config::{QueryConfig, ScenarioConfig};
use prag_lab::logging::init_logging;
use prag_lab::{plot, render};

/// Scenario harness for the pragmatic reasoning engine.
#[derive(Debug, Parser)]
#[command(
    name = "prag-lab",
    author,
    version,
    about = "Runs reasoner queries from a scenario file"
)]
struct Cli {
    /// Path to the YAML scenario file.
    #[arg(short, long, value_name = "FILE", default_value = "lab/scenario.yaml")]
    config: PathBuf,

    /// Override the plot output directory.
    #[arg(long, value_name = "DIR")]
    plots_dir: Option<PathBuf>,

    /// Exit after validating the scenario file (no queries are run).
    #[arg(long)]
    validate_only: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = ScenarioConfig::from_path(&cli.config)?;

    if let Some(dir) = cli.plots_dir {
        config.plots_dir = Some(dir);
    }

    init_logging(config.logging.level.as_deref())?;

    if cli.validate_only {
        println!("scenario OK: {} queries", config.queries.len());
        return Ok(());
    }

    let raw = fs::read_to_string(&config.domain)
        .with_context(|| format!("reading domain specification {}", config.domain.display()))?;
    let spec = DomainSpec::from_json_str(&raw)?;
    let engine = RsaEngine::new(spec);

    for (index, query) in config.queries.iter().enumerate() {
        run_query(&engine, index, query, config.plots_dir.as_deref())?;
    }

    let stats = engine.cache_stats();
    event!(
        target: "prag_lab::run",
        Level::INFO,
        hits = stats.hits,
        misses = stats.misses,
        "cache summary"
    );
    Ok(())
}

fn run_query(
    engine: &RsaEngine,
    index: usize,
    query: &QueryConfig,
    plots_dir: Option<&Path>,
) -> anyhow::Result<()> {
    let (title, rows) = match query {
        QueryConfig::LiteralListener { utterance, context } => {
            let context = indicator(context)?;
            let marginal = engine.literal_listener(utterance, context)?;
            (
                format!("literal listener: \"{utterance}\""),
                render::world_rows(engine, &marginal),
            )
        }
        QueryConfig::Speaker {
            world,
            qud,
            context,
            alpha,
            cost_multiplier,
        } => {
            let context = indicator(context)?;
            let world_index = engine
                .spec()
                .world_index(world)
                .with_context(|| format!("unknown world id '{world}'"))?;
            let marginal = engine.speaker_with(
                WorldMask::solo(world_index),
                qud,
                context,
                speaker_config(*alpha, *cost_multiplier),
            )?;
            (
                format!("speaker: world {world}, QUD {qud}"),
                render::utterance_rows(&marginal),
            )
        }
        QueryConfig::PragmaticListener {
            utterance,
            qud,
            output,
            alpha,
            cost_multiplier,
        } => {
            let output: OutputSpace = output.parse()?;
            let marginal = engine.pragmatic_listener_with(
                utterance,
                qud,
                output,
                speaker_config(*alpha, *cost_multiplier),
            )?;
            (
                format!("pragmatic listener ({output}): \"{utterance}\", QUD {qud}"),
                render::world_rows(engine, &marginal),
            )
        }
    };

    println!("{}", render::table(&title, &rows));
    event!(
        target: "prag_lab::run",
        Level::INFO,
        query = index,
        support = rows.len(),
        "query resolved"
    );

    if let Some(dir) = plots_dir {
        let path = plot::render_bar_chart(dir, &format!("query_{index}"), &title, &rows)?;
        event!(
            target: "prag_lab::run",
            Level::DEBUG,
            plot = %path.display(),
            "plot written"
        );
    }
    Ok(())
}

fn indicator(values: &[u8]) -> anyhow::Result<WorldMask> {
    WorldMask::from_indicator(values).context("context vector must contain only 0 and 1")
}

fn speaker_config(alpha: Option<f64>, cost_multiplier: Option<f64>) -> SpeakerConfig {
    let base = SpeakerConfig::default();
    SpeakerConfig {
        alpha: alpha.unwrap_or(base.alpha),
        cost_multiplier: cost_multiplier.unwrap_or(base.cost_multiplier),
    }
}
