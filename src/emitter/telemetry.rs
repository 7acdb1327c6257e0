//! telemetry.rs
//! Real-time emitter loop: angle samples on the data channel, presence probes on
//! the discovery channel, each on its own timer.
//! - Pacing: SpinSleeper yields a fixed 1 ms quantum between iterations
//! - Ordering: a due discovery send goes out before a due data send in the same iteration
//! - Losses: failed sends are logged and counted; the schedule still advances

use log::{debug, info, trace, warn};
use spin_sleep::{SpinSleeper, SpinStrategy};
use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

use crate::config::{DISCOVERY_INTERVAL, EmitterConfig, LOOP_QUANTUM, STATUS_INTERVAL};
use crate::emitter::{
    packet::{DISCOVERY_PAYLOAD, encode_angle},
    policy::AngleGenerator,
    transport::{Channel, Transport},
};
use crate::utils::metrics::{RunStats, RunSummary};

/// What a single loop iteration did.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Tick {
    /// A discovery probe was due (and attempted)
    pub discovery: bool,
    /// Angle put on the wire; `None` when no data packet was due or the send failed
    pub data: Option<f32>,
}

pub struct Emitter<T: Transport> {
    transport: T,
    generator: AngleGenerator,
    data_interval: Duration,
    last_data: Option<Instant>,
    last_discovery: Instant,
    last_status: Instant,
    stats: RunStats,
}

impl<T: Transport> Emitter<T> {
    /// Build the emitter state once at startup.
    ///
    /// The first data packet is due immediately; the first discovery probe is
    /// due one discovery interval after `start`.
    pub fn new(config: &EmitterConfig, transport: T, start: Instant) -> Self {
        let generator = AngleGenerator::new(
            config.mode,
            config.speed_deg_s,
            config.data_interval_secs(),
            config.seed,
        );

        Self {
            transport,
            generator,
            data_interval: config.data_interval(),
            last_data: None,
            last_discovery: start,
            last_status: start,
            stats: RunStats::new(start),
        }
    }

    pub fn angle(&self) -> f64 {
        self.generator.angle()
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// One loop iteration at monotonic time `now` and wall-clock `wall_secs`
    /// (seconds since the Unix epoch, used by the Sine policy).
    pub fn step(&mut self, now: Instant, wall_secs: f64) -> Tick {
        let mut tick = Tick::default();

        // 1. Discovery: fixed cadence, independent of the data rate
        if now.saturating_duration_since(self.last_discovery) >= DISCOVERY_INTERVAL {
            match self.transport.send(Channel::Discovery, DISCOVERY_PAYLOAD) {
                Ok(_) => {
                    self.stats.record_discovery();
                    trace!("Sent discovery probe");
                }
                Err(e) => {
                    self.stats.record_failure();
                    warn!("Failed to send discovery probe: {}", e);
                }
            }
            self.last_discovery = now;
            tick.discovery = true;
        }

        // 2. Data: at most one packet per nominal interval
        let data_due = self
            .last_data
            .is_none_or(|last| now.saturating_duration_since(last) >= self.data_interval);

        if data_due {
            let angle = self.generator.advance(wall_secs);
            let payload = encode_angle(angle);

            match self.transport.send(Channel::Data, &payload) {
                Ok(_) => {
                    self.stats.record_data(now);
                    tick.data = Some(f32::from_le_bytes(payload));
                    trace!("Sent angle {:.3} (packet {})", angle, self.stats.data_sent());
                }
                Err(e) => {
                    self.stats.record_failure();
                    warn!("Failed to send angle packet: {}", e);
                }
            }
            self.last_data = Some(now);

            if now.saturating_duration_since(self.last_status) >= STATUS_INTERVAL {
                info!(
                    "Angle: {:6.2}° | Packets: {:5} | Rate: {:6.1} Hz",
                    angle,
                    self.stats.data_sent(),
                    self.stats.achieved_rate(now)
                );
                self.last_status = now;
            }
        }

        tick
    }

    /// Run until `running` is cleared, then release the transport and return
    /// the final summary.
    pub fn run(mut self, running: &AtomicBool) -> RunSummary {
        let sleeper = loop_sleeper();
        debug!(
            "Emitter loop started: mode={}, data interval={:?}",
            self.generator.mode(),
            self.data_interval
        );

        while running.load(Ordering::Relaxed) {
            self.step(Instant::now(), wall_clock_secs());
            sleeper.sleep(LOOP_QUANTUM);
        }

        let summary = self.summary(Instant::now());
        debug!("Emitter loop stopped after {} packets", summary.packets_sent);
        summary
    }

    pub fn summary(&self, now: Instant) -> RunSummary {
        self.stats.summary(now, self.generator.angle())
    }
}

/// Sleeper used for the loop quantum.
pub fn loop_sleeper() -> SpinSleeper {
    SpinSleeper::new(100_000).with_spin_strategy(SpinStrategy::YieldThread)
}

/// Wall-clock seconds since the Unix epoch (0 if the clock is before it).
pub fn wall_clock_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::packet::{Packet, decode_angle};
    use crate::emitter::policy::GenerationMode;
    use std::io;

    /// Records every datagram; optionally fails the data channel.
    #[derive(Default)]
    struct RecordingTransport {
        sent: Vec<(Channel, Vec<u8>)>,
        fail_data: bool,
    }

    impl RecordingTransport {
        fn count(&self, channel: Channel) -> usize {
            self.sent.iter().filter(|(c, _)| *c == channel).count()
        }

        fn angles(&self) -> Vec<f32> {
            self.sent
                .iter()
                .filter(|(c, _)| *c == Channel::Data)
                .filter_map(|(_, p)| decode_angle(p))
                .collect()
        }
    }

    impl Transport for RecordingTransport {
        fn send(&mut self, channel: Channel, payload: &[u8]) -> io::Result<usize> {
            if self.fail_data && channel == Channel::Data {
                return Err(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"));
            }
            self.sent.push((channel, payload.to_vec()));
            Ok(payload.len())
        }
    }

    fn config(mode: GenerationMode, rate_hz: f64) -> EmitterConfig {
        EmitterConfig {
            mode,
            rate_hz,
            seed: Some(1),
            ..Default::default()
        }
    }

    /// Drive the emitter on a synthetic clock, one step per loop quantum.
    fn drive(emitter: &mut Emitter<RecordingTransport>, start: Instant, steps: u64) {
        for k in 0..steps {
            let now = start + LOOP_QUANTUM * k as u32;
            emitter.step(now, (LOOP_QUANTUM * k as u32).as_secs_f64());
        }
    }

    #[test]
    fn test_static_10hz_for_one_second() {
        let start = Instant::now();
        let mut emitter = Emitter::new(
            &config(GenerationMode::Static, 10.0),
            RecordingTransport::default(),
            start,
        );

        drive(&mut emitter, start, 1_000);

        let angles = emitter.transport().angles();
        assert!((9..=11).contains(&angles.len()), "sent {}", angles.len());
        assert!(angles.iter().all(|&a| a == 45.0));
        assert_eq!(emitter.transport().count(Channel::Discovery), 0);
        assert_eq!(emitter.stats().data_sent(), angles.len() as u64);
    }

    #[test]
    fn test_rotate_four_sends_reach_180() {
        let mut cfg = config(GenerationMode::Rotate, 2.0);
        cfg.speed_deg_s = 90.0;
        let start = Instant::now();
        let mut emitter = Emitter::new(&cfg, RecordingTransport::default(), start);

        for i in 0..4u32 {
            let tick = emitter.step(start + Duration::from_millis(500) * i, 0.0);
            assert!(tick.data.is_some());
        }

        assert_eq!(emitter.transport().angles(), vec![45.0, 90.0, 135.0, 180.0]);
        assert_eq!(emitter.angle(), 180.0);
    }

    #[test]
    fn test_data_not_resent_before_interval() {
        let start = Instant::now();
        let mut emitter = Emitter::new(
            &config(GenerationMode::Static, 10.0),
            RecordingTransport::default(),
            start,
        );

        assert!(emitter.step(start, 0.0).data.is_some());
        assert!(emitter.step(start + Duration::from_millis(99), 0.0).data.is_none());
        assert!(emitter.step(start + Duration::from_millis(100), 0.0).data.is_some());
    }

    #[test]
    fn test_discovery_cadence_independent_of_rate() {
        for rate in [1.0, 100.0, 500.0] {
            let start = Instant::now();
            let mut emitter = Emitter::new(
                &config(GenerationMode::Static, rate),
                RecordingTransport::default(),
                start,
            );

            // 0 ..= 10 s inclusive: probes at 2, 4, 6, 8, 10 s
            drive(&mut emitter, start, 10_001);

            let transport = emitter.transport();
            assert_eq!(transport.count(Channel::Discovery), 5, "rate {}", rate);
            assert!(
                transport
                    .sent
                    .iter()
                    .filter(|(c, _)| *c == Channel::Discovery)
                    .all(|(_, p)| Packet::parse(p) == Some(Packet::Discovery))
            );
        }
    }

    #[test]
    fn test_discovery_precedes_data_in_same_iteration() {
        let start = Instant::now();
        let mut emitter = Emitter::new(
            &config(GenerationMode::Static, 0.5),
            RecordingTransport::default(),
            start,
        );

        emitter.step(start, 0.0);
        let tick = emitter.step(start + DISCOVERY_INTERVAL, 0.0);
        assert!(tick.discovery);
        assert_eq!(tick.data, Some(45.0));

        let channels: Vec<Channel> = emitter.transport().sent.iter().map(|(c, _)| *c).collect();
        assert_eq!(channels, vec![Channel::Data, Channel::Discovery, Channel::Data]);
    }

    #[test]
    fn test_measured_interval_converges_within_quantum() {
        for rate in [30.0, 100.0, 250.0] {
            let start = Instant::now();
            let mut emitter = Emitter::new(
                &config(GenerationMode::Rotate, rate),
                RecordingTransport::default(),
                start,
            );

            drive(&mut emitter, start, 5_000);

            let summary = emitter.summary(start + LOOP_QUANTUM * 5_000);
            let mean_ms = summary.mean_interval_ms.unwrap();
            let nominal_ms = 1_000.0 / rate;
            assert!(
                mean_ms >= nominal_ms - 1e-6 && mean_ms <= nominal_ms + LOOP_QUANTUM.as_secs_f64() * 1_000.0,
                "rate {}: mean {} nominal {}",
                rate,
                mean_ms,
                nominal_ms
            );
        }
    }

    #[test]
    fn test_sine_uses_wall_clock_at_send() {
        let start = Instant::now();
        let mut emitter = Emitter::new(
            &config(GenerationMode::Sine, 10.0),
            RecordingTransport::default(),
            start,
        );

        let wall = 1_700_000_123.25;
        let sent = emitter.step(start, wall).data.unwrap();
        let expected = (180.0 + 180.0 * (0.5 * wall).sin()) as f32;
        assert_eq!(sent, expected);
    }

    #[test]
    fn test_failed_sends_are_counted_and_schedule_advances() {
        let start = Instant::now();
        let transport = RecordingTransport {
            fail_data: true,
            ..Default::default()
        };
        let mut emitter = Emitter::new(&config(GenerationMode::Static, 10.0), transport, start);

        let tick = emitter.step(start, 0.0);
        assert_eq!(tick.data, None);
        drive(&mut emitter, start + Duration::from_millis(100), 900);

        // Ten due cycles, all lost; no retry storm at the loop quantum
        assert_eq!(emitter.stats().data_sent(), 0);
        assert_eq!(emitter.stats().send_failures(), 10);
    }

    #[test]
    fn test_run_stops_when_flag_cleared() {
        let running = AtomicBool::new(false);
        let emitter = Emitter::new(
            &config(GenerationMode::Static, 100.0),
            RecordingTransport::default(),
            Instant::now(),
        );

        let summary = emitter.run(&running);
        assert_eq!(summary.packets_sent, 0);
        assert_eq!(summary.discovery_sent, 0);
    }

    #[test]
    fn test_wall_clock_is_after_epoch() {
        assert!(wall_clock_secs() > 1_600_000_000.0);
    }
}
