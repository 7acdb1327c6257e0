// Telemetry Emitter: simulated AS5600 encoder on an ESP32.
// Generates angle samples with one of four policies, frames them as 4-byte
// little-endian floats and streams them over UDP, while announcing itself on
// a separate discovery port every 2 seconds.

pub mod packet;
pub mod policy;
pub mod telemetry;
pub mod transport;

pub use policy::GenerationMode;
pub use telemetry::{Emitter, Tick};
pub use transport::{Channel, Transport, UdpTransport};
