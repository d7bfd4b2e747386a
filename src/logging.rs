use anyhow::{Context, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// `RUST_LOG` wins over the configured level; `verbose` forces debug output.
pub fn init(verbose: bool, level: &str) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(level)
                .with_context(|| format!("invalid log level: {}", level))?,
        }
    };
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .try_init();
    Ok(())
}
