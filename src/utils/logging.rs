//! Diagnostic logging setup.
//!
//! The full-screen chat owns the terminal, so it only logs when a file is
//! given. One-shot commands log to stderr. `RUST_LOG` overrides the default
//! filter in both cases.

use std::error::Error;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const FILE_DEFAULT_FILTER: &str = "polymind=info";
const STDERR_DEFAULT_FILTER: &str = "polymind=warn";

#[derive(Debug, Clone, Copy)]
pub enum LogTarget<'a> {
    /// Append to the given file.
    File(&'a Path),
    /// Write to stderr.
    Stderr,
    /// Install nothing.
    Disabled,
}

fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

pub fn init_tracing(target: LogTarget<'_>) -> Result<(), Box<dyn Error>> {
    match target {
        LogTarget::Disabled => Ok(()),
        LogTarget::Stderr => tracing_subscriber::registry()
            .with(env_filter(STDERR_DEFAULT_FILTER))
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false)
                    .with_target(false),
            )
            .try_init()
            .map_err(|err| -> Box<dyn Error> { Box::new(err) }),
        LogTarget::File(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::registry()
                .with(env_filter(FILE_DEFAULT_FILTER))
                .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
                .try_init()
                .map_err(|err| -> Box<dyn Error> { Box::new(err) })
        }
    }
}
