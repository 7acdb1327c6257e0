
//! # Encoder Simulator Entry Point
//! Emulates an ESP32 + AS5600 rotary encoder streaming angle telemetry over UDP,
//! so a receiving application can be developed without the hardware.
//!
//! ## Channels
//! - **Data (default 5005):** 4-byte little-endian f32 angle, at `--rate` Hz.
//! - **Discovery (default 5006):** `DISCOVER` probe every 2 s, sent to loopback
//!   for a loopback target and to 255.255.255.255 otherwise.
//!
//! ## Modes
//! - **rotate:** continuous rotation at `--speed` deg/s.
//! - **sine:** 180 + 180 sin(0.5 t) sweep.
//! - **static:** fixed 45 deg.
//! - **random:** random walk in +/- 5 deg steps.
//!
//! Runs until Ctrl+C, then prints a run summary.

use clap::Parser;
use log::{error, info, warn};
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Instant,
};

use encoder_sim::{
    Emitter, EmitterConfig, Error, GenerationMode, Result, UdpTransport,
    config::{DEFAULT_DATA_PORT, DEFAULT_DISCOVERY_PORT, DEFAULT_TARGET_HOST},
};

/// Simulate an ESP32 sending AS5600 angle data over UDP
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Target PC IP address or host name
    #[arg(long, default_value = DEFAULT_TARGET_HOST)]
    target_ip: String,

    /// Data port
    #[arg(long, default_value_t = DEFAULT_DATA_PORT)]
    data_port: u16,

    /// Discovery port
    #[arg(long, default_value_t = DEFAULT_DISCOVERY_PORT)]
    discovery_port: u16,

    /// Send rate in Hz
    #[arg(long, default_value_t = 100.0)]
    rate: f64,

    /// Simulation mode
    #[arg(long, value_enum, default_value_t = GenerationMode::Rotate)]
    mode: GenerationMode,

    /// Rotation speed in degrees/sec (rotate mode)
    #[arg(long, default_value_t = 30.0, allow_negative_numbers = true)]
    speed: f64,

    /// Seed for the random walk (reproducible runs)
    #[arg(long)]
    seed: Option<u64>,

    /// Pin the emitter thread to this CPU core
    #[arg(long)]
    pin_core: Option<usize>,
}

impl From<Args> for EmitterConfig {
    fn from(args: Args) -> Self {
        Self {
            target_host: args.target_ip,
            data_port: args.data_port,
            discovery_port: args.discovery_port,
            rate_hz: args.rate,
            mode: args.mode,
            speed_deg_s: args.speed,
            seed: args.seed,
            pin_core: args.pin_core,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stdout)
        .init();

    let config = EmitterConfig::from(Args::parse());
    config.validate()?;
    let endpoints = config.resolve_endpoints()?;

    print_banner(&config);

    // Sockets live until the emitter is dropped at the end of run()
    let transport = UdpTransport::open(endpoints)?;
    info!(
        "Streaming to {} (discovery -> {})",
        endpoints.data, endpoints.discovery
    );

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        r.store(false, Ordering::Relaxed);
    })
    .map_err(|e| Error::Signal(e.to_string()))?;

    if let Some(core) = config.pin_core {
        pin_to_core(core);
    }

    println!("\nPress Ctrl+C to stop\n");

    let emitter = Emitter::new(&config, transport, Instant::now());
    let summary = emitter.run(&running);

    println!("\n\nStopped by user\n");
    println!("{}", summary);
    Ok(())
}

fn print_banner(config: &EmitterConfig) {
    println!("{}", "=".repeat(60));
    println!("ENCODER SIMULATOR");
    println!("{}", "=".repeat(60));
    println!("Target IP:       {}", config.target_host);
    println!("Data Port:       {}", config.data_port);
    println!("Discovery Port:  {}", config.discovery_port);
    println!("Send Rate:       {:.1} Hz", config.rate_hz);
    println!("Mode:            {}", config.mode);
    if config.mode == GenerationMode::Rotate {
        println!("Rotation Speed:  {:.1} deg/sec", config.speed_deg_s);
    }
    if let Some(seed) = config.seed {
        println!("Seed:            {}", seed);
    }
    println!("{}", "=".repeat(60));
}

/// Best-effort pinning of the current (emitter) thread; failures only log.
fn pin_to_core(core: usize) {
    let core_ids = core_affinity::get_core_ids().unwrap_or_default();
    match core_ids.get(core) {
        Some(core_id) => {
            if core_affinity::set_for_current(*core_id) {
                info!("Emitter pinned to core {}", core);
            } else {
                error!("Failed to pin emitter to core {}", core);
            }
        }
        None => warn!(
            "Core {} not found among {} available cores; running unpinned",
            core,
            core_ids.len()
        ),
    }
}
