use std::ops::RangeInclusive;

use itertools::Itertools;

use crate::{Error, Result};

/// Parse `"a,b,c"` into a triplet, as used for shapes and ranges on the
/// command line.
pub fn parse_triplet<T: std::str::FromStr>(s: &str) -> Result<[T; 3]> {
    let bad = || Error::Parse { expected: "a triplet `a,b,c`", input: s.into() };
    let (x, y, z) = s.split(',')
        .map(|v| v.trim().parse::<T>().map_err(|_| bad()))
        .collect_tuple()
        .ok_or_else(bad)?;
    Ok([x?, y?, z?])
}

/// Parse `"lo..=hi"` into an inclusive range.
pub fn parse_inclusive_range<T: std::str::FromStr>(s: &str) -> Result<RangeInclusive<T>> {
    let bad = || Error::Parse { expected: "an inclusive range `lo..=hi`", input: s.into() };
    let (lo, hi) = s.split_once("..=").ok_or_else(bad)?;
    let parse = |v: &str| v.trim().parse::<T>().map_err(|_| bad());
    Ok(parse(lo)?..=parse(hi)?)
}

/// Group numeric digits to facilitate reading long numbers
pub fn group_digits<F: std::fmt::Display>(n: F) -> String {
    use numsep::{separate, Locale};
    separate(n, Locale::English)
}

pub mod timing {

    use super::group_digits;
    use std::time::Instant;

    pub struct Progress {
        previous: Instant,
    }

    impl Progress {

        #[allow(clippy::new_without_default)]
        pub fn new() -> Self { Self { previous: Instant::now() } }

        /// Log message, start timer.
        pub fn start(&mut self, message: &str) {
            tracing::info!("{message} ...");
            self.start_timer();
        }

        // Log time elapsed since last start or done
        pub fn done(&mut self) {
            tracing::info!("done in {} ms", group_digits(self.previous.elapsed().as_millis()));
            self.start_timer();
        }

        // Log message followed by time elapsed since last start or done
        pub fn done_with_message(&mut self, message: &str) {
            tracing::info!("{message}: {} ms",
                           group_digits(self.previous.elapsed().as_millis()));
            self.start_timer();
        }

        fn start_timer(&mut self) { self.previous = Instant::now() }
    }
}
