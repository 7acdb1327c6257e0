//! Error types for the encoder simulator

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Encoder simulator error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Socket could not be created, configured or bound
    #[error("Failed to set up {what} socket: {source}")]
    SocketSetup {
        /// Which channel the socket belongs to
        what: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Target host did not resolve to an IPv4 address
    #[error("Cannot resolve target host '{0}' to an IPv4 address")]
    Resolve(String),

    /// Shutdown handler could not be installed
    #[error("Error setting Ctrl-C handler: {0}")]
    Signal(String),
}
