//! Tracing subscriber setup.
//!
//! Verbosity from the CLI wins; otherwise `RUST_LOG` is honored and the
//! default is `error`. Set `RIPOTI_LOG_FORMAT=json` for structured output.

use anyhow::Result;
use std::env;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if a subscriber is already installed.
pub fn init(level: Option<Level>) -> Result<()> {
    let filter = match level {
        Some(level) => EnvFilter::new(level.to_string().to_lowercase()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error")),
    };

    let json = env::var("RIPOTI_LOG_FORMAT").is_ok_and(|format| format == "json");

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .try_init()?;
    }

    Ok(())
}
