//! Run statistics for the emitter: packet counters, achieved rate and
//! data-interval jitter.
//!
//! Counters are for reporting only; nothing in the send schedule reads them.

use average::{Estimate, Variance};
use std::{
    fmt,
    time::{Duration, Instant},
};

/// Live counters owned by the emitter loop.
pub struct RunStats {
    started: Instant,
    data_sent: u64,
    discovery_sent: u64,
    send_failures: u64,
    last_data_at: Option<Instant>,
    /// Measured spacing between successful data sends (seconds)
    intervals: Variance,
}

impl RunStats {
    pub fn new(started: Instant) -> Self {
        Self {
            started,
            data_sent: 0,
            discovery_sent: 0,
            send_failures: 0,
            last_data_at: None,
            intervals: Variance::new(),
        }
    }

    #[inline]
    pub fn record_data(&mut self, at: Instant) {
        if let Some(last) = self.last_data_at {
            self.intervals.add(at.duration_since(last).as_secs_f64());
        }
        self.last_data_at = Some(at);
        self.data_sent += 1;
    }

    #[inline]
    pub fn record_discovery(&mut self) {
        self.discovery_sent += 1;
    }

    #[inline]
    pub fn record_failure(&mut self) {
        self.send_failures += 1;
    }

    pub fn data_sent(&self) -> u64 {
        self.data_sent
    }

    pub fn discovery_sent(&self) -> u64 {
        self.discovery_sent
    }

    pub fn send_failures(&self) -> u64 {
        self.send_failures
    }

    /// Data packets per second since start; 0 until time has passed.
    pub fn achieved_rate(&self, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(self.started).as_secs_f64();
        if elapsed > 0.0 {
            self.data_sent as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn summary(&self, now: Instant, last_angle_deg: f64) -> RunSummary {
        let has_intervals = !self.intervals.is_empty();
        RunSummary {
            packets_sent: self.data_sent,
            discovery_sent: self.discovery_sent,
            send_failures: self.send_failures,
            duration: now.saturating_duration_since(self.started),
            average_rate_hz: self.achieved_rate(now),
            mean_interval_ms: has_intervals.then(|| self.intervals.mean() * 1_000.0),
            interval_stddev_ms: (self.intervals.len() > 1)
                .then(|| self.intervals.sample_variance().sqrt() * 1_000.0),
            last_angle_deg,
        }
    }
}

/// Final report produced when the loop stops.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub packets_sent: u64,
    pub discovery_sent: u64,
    pub send_failures: u64,
    pub duration: Duration,
    pub average_rate_hz: f64,
    pub mean_interval_ms: Option<f64>,
    pub interval_stddev_ms: Option<f64>,
    pub last_angle_deg: f64,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total packets sent: {}", self.packets_sent)?;
        writeln!(f, "Discovery packets:  {}", self.discovery_sent)?;
        if self.send_failures > 0 {
            writeln!(f, "Send failures:      {}", self.send_failures)?;
        }
        writeln!(f, "Last angle:         {:.2}°", self.last_angle_deg)?;
        if let Some(mean) = self.mean_interval_ms {
            write!(f, "Data interval:      {:.3} ms mean", mean)?;
            if let Some(stddev) = self.interval_stddev_ms {
                write!(f, ", {:.3} ms stddev", stddev)?;
            }
            writeln!(f)?;
        }
        writeln!(f, "Average rate: {:.1} Hz", self.average_rate_hz)?;
        write!(f, "Duration: {:.1} seconds", self.duration.as_secs_f64())
    }
}
