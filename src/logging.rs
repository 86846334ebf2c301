use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "PORYDEX_LOG";

/// Install the global fmt subscriber on stderr.
///
/// `PORYDEX_LOG` wins over `default_filter`; "info" is used when neither is
/// set. With `enabled` false nothing is installed, which keeps log lines off
/// the alternate screen while the terminal UI runs.
pub fn init(default_filter: Option<&str>, enabled: bool) {
    if !enabled {
        return;
    }

    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_filter.unwrap_or("info")));

    // A subscriber may already be set when called twice (tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
