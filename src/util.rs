//! Timing helpers for the generation passes.

use std::time::{Duration, Instant};

/// Logs how long a pass took when dropped.
///
/// ```ignore
/// let _t = Timed::info("hydraulic erosion");
/// // logs "hydraulic erosion: 1.234s" when `_t` goes out of scope
/// ```
pub struct Timed {
    label: &'static str,
    start: Instant,
    level: log::Level,
}

impl Timed {
    pub fn info(label: &'static str) -> Self {
        Self::at(label, log::Level::Info)
    }

    pub fn debug(label: &'static str) -> Self {
        Self::at(label, log::Level::Debug)
    }

    fn at(label: &'static str, level: log::Level) -> Self {
        log::trace!("{label}...");
        Self { label, start: Instant::now(), level }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for Timed {
    fn drop(&mut self) {
        log::log!(self.level, "{}: {:.3?}", self.label, self.elapsed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_grows() {
        let t = Timed::debug("test");
        let first = t.elapsed();
        std::thread::sleep(Duration::from_millis(2));
        assert!(t.elapsed() > first);
    }
}
