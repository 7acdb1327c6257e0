//! encoder_sim: UDP test-data generator emulating a rotary-encoder sensor.
//!
//! Streams simulated angle readings (4-byte LE f32 datagrams) to a target
//! host and periodically broadcasts a `DISCOVER` probe so a receiving
//! application can find the sender without hardware attached.

pub mod config;
pub mod emitter;
pub mod error;
pub mod utils;

pub use config::{EmitterConfig, Endpoints};
pub use emitter::{Emitter, GenerationMode, UdpTransport};
pub use error::{Error, Result};
pub use utils::metrics::RunSummary;
