//! policy.rs
//! Angle generation policies for the simulated AS5600 encoder.
//! - Rotate: continuous rotation at a fixed speed, advanced by the nominal send interval
//! - Sine: absolute function of wall-clock time, centred on 180 deg
//! - Static: constant 45 deg
//! - RandomWalk: +/- 5 deg uniform steps, wrapped to [0, 360)

use clap::ValueEnum;
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::fmt;

pub const STATIC_ANGLE_DEG: f64 = 45.0;
pub const RANDOM_STEP_DEG: f64 = 5.0;
pub const SINE_CENTER_DEG: f64 = 180.0;
pub const SINE_AMPLITUDE_DEG: f64 = 180.0;
/// Angular frequency of the sine sweep (rad/s).
pub const SINE_OMEGA: f64 = 0.5;

const FULL_TURN_DEG: f64 = 360.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum GenerationMode {
    /// Continuous rotation at `--speed` deg/s
    Rotate,
    /// Sine sweep over [0, 360] with a ~12.6 s period
    Sine,
    /// Fixed 45 deg
    Static,
    /// Random walk in +/- 5 deg steps
    #[value(name = "random")]
    RandomWalk,
}

impl GenerationMode {
    pub fn name(&self) -> &'static str {
        match self {
            GenerationMode::Rotate => "rotate",
            GenerationMode::Sine => "sine",
            GenerationMode::Static => "static",
            GenerationMode::RandomWalk => "random",
        }
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Wrap an angle into [0, 360), also after narrowing to the f32 wire format.
///
/// Anything that would round up to 360.0 (in f64 via `rem_euclid`, or in f32
/// on the wire, e.g. 359.999999999) is folded back to 0.
#[inline]
pub fn wrap_degrees(angle_deg: f64) -> f64 {
    let wrapped = angle_deg.rem_euclid(FULL_TURN_DEG);
    if wrapped >= FULL_TURN_DEG || wrapped as f32 >= FULL_TURN_DEG as f32 {
        0.0
    } else {
        wrapped
    }
}

/// Compute the next angle for `mode`.
///
/// `interval_s` is the nominal configured data interval, not the measured
/// time since the last send. `wall_secs` is wall-clock time in seconds since
/// the Unix epoch. Only RandomWalk draws from `rng`.
pub fn next_angle<R: Rng + ?Sized>(
    mode: GenerationMode,
    previous_deg: f64,
    speed_deg_s: f64,
    interval_s: f64,
    wall_secs: f64,
    rng: &mut R,
) -> f64 {
    match mode {
        GenerationMode::Rotate => wrap_degrees(previous_deg + speed_deg_s * interval_s),
        GenerationMode::Sine => SINE_CENTER_DEG + SINE_AMPLITUDE_DEG * (wall_secs * SINE_OMEGA).sin(),
        GenerationMode::Static => STATIC_ANGLE_DEG,
        GenerationMode::RandomWalk => {
            let step = rng.random_range(-RANDOM_STEP_DEG..=RANDOM_STEP_DEG);
            wrap_degrees(previous_deg + step)
        }
    }
}

/// Stateful angle source owned by the emitter: current angle, policy
/// parameters and the RandomWalk generator.
pub struct AngleGenerator {
    mode: GenerationMode,
    speed_deg_s: f64,
    interval_s: f64,
    angle_deg: f64,
    rng: StdRng,
}

impl AngleGenerator {
    pub fn new(mode: GenerationMode, speed_deg_s: f64, interval_s: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self {
            mode,
            speed_deg_s,
            interval_s,
            angle_deg: 0.0,
            rng,
        }
    }

    pub fn mode(&self) -> GenerationMode {
        self.mode
    }

    /// Current angle (deg); 0 before the first advance.
    pub fn angle(&self) -> f64 {
        self.angle_deg
    }

    /// Advance one data cycle and return the new angle.
    pub fn advance(&mut self, wall_secs: f64) -> f64 {
        self.angle_deg = next_angle(
            self.mode,
            self.angle_deg,
            self.speed_deg_s,
            self.interval_s,
            wall_secs,
            &mut self.rng,
        );
        self.angle_deg
    }
}
