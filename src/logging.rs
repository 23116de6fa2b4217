//! Structured logging setup. Called once from the binary entry point.

use std::io;

/// Installs a JSON-formatted `tracing` subscriber writing to stderr, honoring
/// `RUST_LOG` (falling back to `info`). Safe to call more than once in a
/// single process (e.g. across tests in the same binary); later calls are
/// no-ops since `set_global_default` has already run.
pub fn init() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .json()
        .flatten_event(true)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_target(true)
        .try_init();
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init();
        init();
    }
}
