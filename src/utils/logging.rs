use tracing::debug;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "TIMEFLOW_LOG";

/// Install the stderr subscriber. `TIMEFLOW_LOG` overrides the level chosen by `--debug`.
///
/// Returns false when a global subscriber was already installed; that one stays in place.
pub(crate) fn init_logging(debug: bool) -> bool {
    let fallback = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));

    match tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
    {
        Ok(()) => true,
        Err(e) => {
            // reaches whichever subscriber won the race
            debug!(event = "dashboard.logging.already_initialized", error = %e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_keeps_existing_subscriber() {
        init_logging(false);
        assert!(!init_logging(true));
    }
}
