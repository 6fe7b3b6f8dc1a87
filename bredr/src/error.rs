// Error taxonomy for the sniffer core.

use std::io;

use thiserror::Error;

/// Unified error type returned by every layer of the sniffer core.
///
/// Variants are grouped by the taxonomy of the system they come from: serial
/// bringup, the wire framer, the dissector, capture sinks, and process
/// lifecycle. Most variants are non-fatal by policy (checksum failures,
/// malformed dissector fields, sink write errors) and are handled by the
/// call site rather than propagated out of the RX loop; see each
/// component's module docs for which.
#[derive(Error, Debug)]
#[repr(i32)]
#[non_exhaustive]
pub enum SnifferError {
    #[error("failed to open serial device")]
    DeviceUnavailable(#[from] io::Error) = -1,

    #[error("firmware did not respond to version probe; flash the board firmware")]
    FirmwareUnresponsive = -2,

    #[error("invalid BD_ADDR string: expected six colon-separated hex octets")]
    InvalidBdAddr = -3,

    #[error("BT_RX/BT_TX frame checksum mismatch")]
    ChecksumError = -4,

    #[error("frame ended before its declared length")]
    ShortFrame = -5,

    #[error("field did not decode to a valid value")]
    MalformedField = -6,

    #[error("capture sink write failed")]
    SinkWriteError = -7,

    #[error("external helper process exited unexpectedly")]
    HelperCrashed = -8,

    #[error("interrupted")]
    Interrupted = -9,

    #[error("pseudo-terminal allocation failed")]
    PtyUnavailable(#[source] nix::Error) = -10,

    #[error("unknown wire protocol tag byte {0:#04x}")]
    UnknownTag(u8) = -11,
}

impl SnifferError {
    /// Stable numeric code, mirrored from the discriminant of each variant.
    pub fn code(&self) -> i32 {
        match self {
            SnifferError::DeviceUnavailable(_) => -1,
            SnifferError::FirmwareUnresponsive => -2,
            SnifferError::InvalidBdAddr => -3,
            SnifferError::ChecksumError => -4,
            SnifferError::ShortFrame => -5,
            SnifferError::MalformedField => -6,
            SnifferError::SinkWriteError => -7,
            SnifferError::HelperCrashed => -8,
            SnifferError::Interrupted => -9,
            SnifferError::PtyUnavailable(_) => -10,
            SnifferError::UnknownTag(_) => -11,
        }
    }

    /// True for errors that §7 classifies as frame/sink-local: the caller
    /// should log and continue rather than unwind the RX loop.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SnifferError::ChecksumError
                | SnifferError::ShortFrame
                | SnifferError::MalformedField
                | SnifferError::SinkWriteError
                | SnifferError::HelperCrashed
                | SnifferError::UnknownTag(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SnifferError>;
