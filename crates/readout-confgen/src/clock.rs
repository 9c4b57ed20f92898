//! Derived timing quantities of the emulated readout clock.
//!
//! A WIB frame carries 25 ticks and a superchunk groups 12 frames, so one
//! superchunk is emitted every `25 * 12` clock ticks. Slowing the emulated
//! data down divides every rate by the slowdown factor.

use crate::config::CLOCK_SPEED_HZ;

/// Clock ticks per emitted superchunk.
const TICKS_PER_SUPERCHUNK: f64 = 25.0 * 12.0;

/// Clock model for a given slowdown factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockModel {
    pub clock_speed_hz: u64,
    pub slowdown_factor: f64,
}

impl ClockModel {
    pub fn new(slowdown_factor: f64) -> Self {
        Self {
            clock_speed_hz: CLOCK_SPEED_HZ,
            slowdown_factor,
        }
    }

    fn clock(&self) -> f64 {
        self.clock_speed_hz as f64
    }

    /// Superchunk rate of the fake card reader, in kHz.
    pub fn rate_khz(&self) -> f64 {
        self.clock() / (TICKS_PER_SUPERCHUNK * self.slowdown_factor * 1000.0)
    }

    /// Latency buffer depth: three seconds of superchunks.
    pub fn latency_buffer_size(&self) -> f64 {
        3.0 * self.clock() / (TICKS_PER_SUPERCHUNK * self.slowdown_factor)
    }

    /// Effective clock frequency after slowdown.
    pub fn clock_frequency_hz(&self) -> f64 {
        self.clock() / self.slowdown_factor
    }

    /// Ticks between triggers so that `trigger_rate_hz` holds in wall-clock time.
    pub fn trigger_interval_ticks(&self, trigger_rate_hz: f64) -> i64 {
        ((1.0 / trigger_rate_hz) * self.clock() / self.slowdown_factor).floor() as i64
    }

    /// Trigger delay placing triggers well inside the latency buffer.
    pub fn trigger_delay_ticks(&self) -> i64 {
        (2.0 * self.clock() / self.slowdown_factor).floor() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * b.abs().max(1.0)
    }

    #[test]
    fn test_rate_khz_closed_form() {
        for slowdown in [1.0, 10.0, 100.0] {
            let clock = ClockModel::new(slowdown);
            let expected = 50_000_000.0 / (25.0 * 12.0 * slowdown * 1000.0);
            assert!(close(clock.rate_khz(), expected), "slowdown {slowdown}");
        }
        assert!(close(ClockModel::new(1.0).rate_khz(), 166.666_666_666_666_66));
    }

    #[test]
    fn test_latency_buffer_closed_form() {
        assert_eq!(ClockModel::new(1.0).latency_buffer_size(), 500_000.0);
        assert_eq!(ClockModel::new(10.0).latency_buffer_size(), 50_000.0);
        assert_eq!(ClockModel::new(100.0).latency_buffer_size(), 5_000.0);
    }

    #[test]
    fn test_trigger_ticks() {
        let clock = ClockModel::new(10.0);
        assert_eq!(clock.trigger_interval_ticks(1.0), 5_000_000);
        assert_eq!(clock.trigger_interval_ticks(3.0), 1_666_666);
        assert_eq!(clock.trigger_delay_ticks(), 10_000_000);
        assert_eq!(clock.clock_frequency_hz(), 5_000_000.0);
    }

    #[test]
    fn test_fractional_slowdown_floors() {
        let clock = ClockModel::new(3.0);
        // 50e6 / 3 = 16666666.67
        assert_eq!(clock.trigger_interval_ticks(1.0), 16_666_666);
        assert_eq!(clock.trigger_delay_ticks(), 33_333_333);
    }
}
