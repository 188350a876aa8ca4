//! Log setup for the binaries.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `lexrag=debug`.
pub const LOG_ENV: &str = "LEXRAG_LOG";

/// Installs a stderr `fmt` subscriber filtered by `LEXRAG_LOG` (default `info`).
///
/// Stdout stays free for answers and rendered context. Calling this twice is
/// harmless; the second install is ignored.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
