//! Diagnostic output for the binaries.
//!
//! Library code only emits `tracing` events; installing a subscriber is left
//! to whoever drives it.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Map the number of `-v` flags on the command line to a level
pub fn level_for(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Install a global subscriber writing to stderr. `RUST_LOG` takes precedence
/// over `verbosity`. Calling this more than once has no effect.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_for(verbosity).as_str()));
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer()
              .compact()
              .with_target(false)
              .with_writer(std::io::stderr));
    // Err only if a subscriber is already installed
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest(/**/ v, expected,
             case(0, Level::WARN),
             case(1, Level::INFO),
             case(2, Level::DEBUG),
             case(3, Level::TRACE),
             case(9, Level::TRACE),
    )]
    fn verbosity_levels(v: u8, expected: Level) {
        assert_eq!(level_for(v), expected);
    }

    #[test]
    fn init_twice_is_harmless() {
        init(1);
        init(3);
        tracing::info!("still alive");
    }
}
