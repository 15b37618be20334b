//! Diagnostics go to stderr through `tracing`; reports stay on stdout.

use std::{io::IsTerminal, sync::Once};

use tracing_subscriber::{EnvFilter, filter::LevelFilter};

static CHUNKLOAD_LOG_ENV_VAR: &str = "CHUNKLOAD_LOG";

/// Crates whose level follows `CHUNKLOAD_LOG` unless `RUST_LOG` names them
const WORKSPACE_CRATES: &[&str] = &["chunkload", "chunkload_core", "chunkload_reports"];

/// Initializes the tracing subscriber. `debug` lowers the default workspace
/// level from `info` to `debug`.
pub fn init(debug: bool) {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let (env_filter, log_level) = env_filter_and_log_level(debug);

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_ansi(std::io::stderr().is_terminal())
            .init();

        tracing::debug!("log level: {}", log_level);
    });
}

fn env_filter_and_log_level(debug: bool) -> (EnvFilter, String) {
    let directive_string = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();
    let mut env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::ERROR.into())
        .parse_lossy(&directive_string);

    let default_level = if debug { "debug" } else { "info" };
    let log_level =
        std::env::var(CHUNKLOAD_LOG_ENV_VAR).unwrap_or_else(|_| default_level.to_string());

    for crate_name in WORKSPACE_CRATES {
        if directive_string.contains(&format!("{crate_name}=")) {
            continue;
        }
        match format!("{crate_name}={log_level}").parse() {
            Ok(directive) => env_filter = env_filter.add_directive(directive),
            Err(e) => eprintln!("ignoring invalid {}: {}", CHUNKLOAD_LOG_ENV_VAR, e),
        }
    }

    (env_filter, log_level)
}
