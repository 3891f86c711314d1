//! Tunable settings of the core, and their defaults.

use std::time::Duration;
use crate::status::EventMask;


/// capacity of the message channel from core to host
pub const MESSAGE_QUEUE_SIZE: usize = 10;

/// timing and indication settings, given at core creation
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Config {
    /// period of [crate::Core::tick]
    pub tick: Duration,
    /// maximum delay between two valid host/core exchanges when the watchdog is enabled
    pub watchdog_timeout: Duration,
    /// period of the poll messages, the host worker should run at least this often
    pub poll_interval: Duration,
    /// initial indication mode
    pub event_mask: EventMask,
    /// whether the watchdog is enabled at creation
    pub watchdog: bool,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(10),
            watchdog_timeout: Duration::from_millis(100),
            poll_interval: Duration::from_millis(10),
            event_mask: EventMask::free_running(),
            watchdog: false,
        }
    }
}
impl Config {
    /// number of ticks covering the given duration, at least one
    pub fn ticks(&self, duration: Duration) -> u32 {
        let tick = self.tick.as_nanos().max(1);
        let ticks = (duration.as_nanos() + tick - 1) / tick;
        u32::try_from(ticks).unwrap_or(u32::MAX).max(1)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_round_up() {
        let config = Config::default();
        assert_eq!(config.ticks(config.watchdog_timeout), 10);
        assert_eq!(config.ticks(Duration::from_millis(11)), 2);
        assert_eq!(config.ticks(Duration::ZERO), 1);
        assert_eq!(config.ticks(Duration::from_secs(u64::MAX)), u32::MAX);
    }
}
