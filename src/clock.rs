use std::time::{SystemTime, UNIX_EPOCH};

pub const MICROS_PER_SEC: u64 = 1_000_000;

/// A source of timestamps for the queue.
///
/// Element and directory names are derived from the current time, so the
/// clock is injectable to make naming deterministic in tests.
pub trait Clock: Send + Sync + 'static {
    /// Returns the current time in microseconds since the UNIX epoch.
    fn now_micros(&self) -> u64;
}

/// A clock that uses `std::time::SystemTime`.
///
/// This is the default implementation. It is susceptible to NTP adjustments,
/// which can make successive element names go backwards in rare cases.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_micros(&self) -> u64 {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before UNIX epoch");
        u64::try_from(timestamp.as_micros()).expect("system time exceeds timestamp range")
    }
}

/// A clock that uses the CPU's Time-Stamp Counter (TSC) via the `quanta` crate.
///
/// It anchors to SystemTime at initialization and then uses TSC ticks to
/// progress, so the names it produces never jump backwards within a process.
#[derive(Debug, Clone)]
pub struct QuantaClock {
    clock: quanta::Clock,
    start_wall_micros: u64,
    start_instant: quanta::Instant,
}

impl Default for QuantaClock {
    fn default() -> Self {
        let clock = quanta::Clock::new();
        let start_instant = clock.now();
        let start_wall_micros = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before UNIX epoch")
            .as_micros() as u64;

        Self {
            clock,
            start_wall_micros,
            start_instant,
        }
    }
}

impl QuantaClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for QuantaClock {
    fn now_micros(&self) -> u64 {
        let delta = self.clock.now().duration_since(self.start_instant);
        self.start_wall_micros + delta.as_micros() as u64
    }
}
