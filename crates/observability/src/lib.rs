//! Tracing setup shared by the demetsiiify binaries.
//!
//! Output is quiet by default: the terminal UI prints its own progress with
//! `eprintln!` and indicatif, so only warnings reach stderr unless the user
//! asks for more via `DEMETSIIIFY_LOG` or `-v`.

use tracing_subscriber::EnvFilter;

/// Environment variable holding an `EnvFilter` directive.
pub const LOG_ENV: &str = "DEMETSIIIFY_LOG";

/// Directive used for a given number of `-v` flags.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "warn,demetsiiify=info,demetsiiify_client=info,demetsiiify_core=info",
        2 => "info,demetsiiify=debug,demetsiiify_client=debug,demetsiiify_core=debug",
        _ => "debug,demetsiiify=trace,demetsiiify_client=trace,demetsiiify_core=trace",
    }
}

/// Build the filter. An explicit `-v` wins over the environment.
pub fn build_filter(verbosity: u8) -> EnvFilter {
    if verbosity == 0 {
        if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) {
            return filter;
        }
    }
    EnvFilter::new(default_directive(verbosity))
}

/// Install the global compact subscriber writing to stderr.
///
/// Returns an error if a global subscriber is already set.
pub fn init_tracing(
    verbosity: u8,
) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    tracing_subscriber::fmt()
        .with_env_filter(build_filter(verbosity))
        .with_writer(std::io::stderr)
        .with_target(verbosity > 1)
        .compact()
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_quiet_by_default() {
        assert_eq!(default_directive(0), "warn");
    }

    #[test]
    fn test_verbosity_saturates() {
        assert_eq!(default_directive(3), default_directive(9));
        assert!(default_directive(1).contains("demetsiiify_client=info"));
    }

    #[test]
    fn test_explicit_verbosity_builds_filter() {
        let filter = build_filter(2);
        assert!(filter.to_string().contains("demetsiiify_client=debug"));
    }
}
