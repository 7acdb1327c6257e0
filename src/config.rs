//! Emitter configuration: defaults, validation and endpoint resolution.
//!
//! Every option has a default matching the ESP32 firmware being emulated, so
//! a bare `EmitterConfig::default()` streams a 30 deg/s rotation to
//! `127.0.0.1:5005` at 100 Hz and announces itself on port 5006.

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr, ToSocketAddrs},
    time::Duration,
};

use crate::emitter::policy::GenerationMode;
use crate::error::{Error, Result};

pub const DEFAULT_TARGET_HOST: &str = "127.0.0.1";
pub const DEFAULT_DATA_PORT: u16 = 5005;
pub const DEFAULT_DISCOVERY_PORT: u16 = 5006;
pub const DEFAULT_RATE_HZ: f64 = 100.0;
pub const DEFAULT_SPEED_DEG_S: f64 = 30.0;

/// Fixed discovery cadence (not user-configurable).
pub const DISCOVERY_INTERVAL: Duration = Duration::from_secs(2);

/// Sleep between loop iterations. Bounds CPU use while still allowing ~1 kHz.
pub const LOOP_QUANTUM: Duration = Duration::from_millis(1);

/// Cadence of the console status line.
pub const STATUS_INTERVAL: Duration = Duration::from_secs(1);

/// Highest rate the 1 ms loop quantum can keep pace with.
pub const MAX_PACED_RATE_HZ: f64 = 1_000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct EmitterConfig {
    pub target_host: String,
    pub data_port: u16,
    pub discovery_port: u16,
    /// Data packet frequency (Hz)
    pub rate_hz: f64,
    pub mode: GenerationMode,
    /// Rotation speed (deg/s), Rotate mode only
    pub speed_deg_s: f64,
    /// RandomWalk seed; OS entropy when `None`
    pub seed: Option<u64>,
    /// Core to pin the emitter thread to
    pub pin_core: Option<usize>,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            target_host: DEFAULT_TARGET_HOST.to_string(),
            data_port: DEFAULT_DATA_PORT,
            discovery_port: DEFAULT_DISCOVERY_PORT,
            rate_hz: DEFAULT_RATE_HZ,
            mode: GenerationMode::Rotate,
            speed_deg_s: DEFAULT_SPEED_DEG_S,
            seed: None,
            pin_core: None,
        }
    }
}

/// Destinations for both channels, resolved once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoints {
    pub data: SocketAddr,
    pub discovery: SocketAddr,
}

impl EmitterConfig {
    /// Reject rates and speeds the loop cannot turn into a schedule.
    pub fn validate(&self) -> Result<()> {
        if !self.rate_hz.is_finite() || self.rate_hz <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "send rate must be a positive number of Hz, got {}",
                self.rate_hz
            )));
        }
        if Duration::try_from_secs_f64(self.data_interval_secs()).is_err() {
            return Err(Error::InvalidConfig(format!(
                "send rate {} Hz gives a data interval too long to schedule",
                self.rate_hz
            )));
        }
        if !self.speed_deg_s.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "rotation speed must be finite, got {}",
                self.speed_deg_s
            )));
        }
        if !(self.speed_deg_s * self.data_interval_secs()).is_finite() {
            return Err(Error::InvalidConfig(format!(
                "rotation speed {} deg/s overflows a {} Hz send interval",
                self.speed_deg_s, self.rate_hz
            )));
        }
        if self.target_host.trim().is_empty() {
            return Err(Error::InvalidConfig("target host is empty".to_string()));
        }
        if self.rate_hz > MAX_PACED_RATE_HZ {
            log::warn!(
                "Send rate {:.1} Hz exceeds what a {:?} loop quantum can sustain; achieved rate will be lower",
                self.rate_hz,
                LOOP_QUANTUM
            );
        }
        Ok(())
    }

    /// Nominal spacing between data packets (1 / rate).
    ///
    /// Saturates for rates `validate()` rejects as unschedulable.
    pub fn data_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.data_interval_secs()).unwrap_or(Duration::MAX)
    }

    pub fn data_interval_secs(&self) -> f64 {
        1.0 / self.rate_hz
    }

    /// Resolve the data target and pick the discovery destination.
    ///
    /// Discovery goes straight to the target when it is a loopback address,
    /// otherwise to the limited broadcast address so receivers are reached
    /// without knowing their address. Data always goes to the target.
    pub fn resolve_endpoints(&self) -> Result<Endpoints> {
        let ip = resolve_ipv4(&self.target_host)?;
        let discovery_ip = if ip.is_loopback() {
            ip
        } else {
            Ipv4Addr::BROADCAST
        };

        Ok(Endpoints {
            data: SocketAddr::from((ip, self.data_port)),
            discovery: SocketAddr::from((discovery_ip, self.discovery_port)),
        })
    }
}

fn resolve_ipv4(host: &str) -> Result<Ipv4Addr> {
    let host = host.trim();
    if let Ok(ip) = host.parse::<Ipv4Addr>() {
        return Ok(ip);
    }

    // Port is irrelevant here; only the address is kept.
    let addrs = (host, 0)
        .to_socket_addrs()
        .map_err(|_| Error::Resolve(host.to_string()))?;

    addrs
        .filter_map(|addr| match addr.ip() {
            IpAddr::V4(v4) => Some(v4),
            IpAddr::V6(_) => None,
        })
        .next()
        .ok_or_else(|| Error::Resolve(host.to_string()))
}
