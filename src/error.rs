//! Crate-wide error taxonomy.
//!
//! Variant names follow the error kinds named in the gateway's
//! component design: framing and decode errors that the receive path
//! swallows after logging, plus the few that must propagate (send
//! failures, I/O setup failures).

/// Errors produced anywhere in the gateway pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Fewer bytes than the minimum for the frame type the framer/decoder detected.
    #[error("short frame: got {got} bytes, need at least {need}")]
    ShortFrame {
        /// Bytes available.
        got: usize,
        /// Bytes required.
        need: usize,
    },

    /// No valid `DLE + {STX,ACK,NAK}` pair found.
    #[error("bad sync bytes")]
    BadSync,

    /// XOR checksum did not match the trailing CKS byte.
    #[error("bad checksum: want 0x{want:02x}, got 0x{got:02x}")]
    BadChecksum {
        /// Checksum computed over the frame.
        want: u8,
        /// Checksum byte found on the wire.
        got: u8,
    },

    /// A message frame's trailer was not `DLE ETX` where expected.
    #[error("bad trailer")]
    BadTrailer,

    /// Second header byte was not one of STX/ACK/NAK.
    #[error("unknown frame type byte 0x{0:02x}")]
    UnknownType(u8),

    /// Command code is not present in the catalogue.
    #[error("unknown command code 0x{0:04x}")]
    UnknownCommand(u16),

    /// Payload failed the catalogue entry's length predicate.
    #[error("bad payload length: {len} bytes")]
    BadLength {
        /// Payload length actually observed.
        len: usize,
    },

    /// A field failed to parse or build (bad numeral, out of range, wrong width).
    #[error("malformed field {field}: {reason}")]
    MalformedField {
        /// Field name.
        field: String,
        /// Human-readable reason.
        reason: String,
    },

    /// Socket send failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Command code is not buildable (not a query/setting direction), or unknown.
    #[error("command 0x{0:04x} is not buildable")]
    NotBuildable(u16),

    /// Underlying I/O error (socket bind, log file open, etc).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
