use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

/// Initialize structured logging on stderr.
///
/// `RUST_LOG` wins over `log_level` when set. Colors are used only when
/// stderr is a terminal. Calling this twice keeps the first subscriber.
pub fn init(log_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .try_init();
}

/// Level implied by the command-line flags.
pub fn level(log_level: &str, verbose: bool) -> &str {
    if verbose {
        "debug"
    } else {
        log_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_means_debug() {
        assert_eq!(level("warn", true), "debug");
        assert_eq!(level("warn", false), "warn");
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init("info");
        init("debug");
    }
}
