use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt};

/// Installs the fmt subscriber. The configured level seeds the filter;
/// `RUST_LOG` wins when present.
pub fn init_logging(level: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.unwrap_or("info")));
    fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|error| anyhow!("installing tracing subscriber: {error}"))
}
