use anyhow::Result;
use tracing_subscriber::EnvFilter;

use vecadd_bench::config::{BenchConfig, ConfigSource, LogFormat};

fn main() -> Result<()> {
    let (config, source) = BenchConfig::resolve();

    // Initialize tracing; RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match config.logging.format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }

    match source {
        ConfigSource::File(path) => tracing::info!(path = %path.display(), "loaded configuration"),
        ConfigSource::Defaults => tracing::debug!("no config file given, using compiled-in defaults"),
        ConfigSource::Fallback { path, error } => tracing::warn!(
            path = %path.display(),
            %error,
            "config file could not be loaded, using defaults"
        ),
    }

    let stdout = std::io::stdout();
    vecadd_bench::run(&config, &mut stdout.lock())?;

    Ok(())
}
