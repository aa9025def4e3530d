//! Fatal diagnostic codes and handler outcomes.
//!
//! Nothing in this crate stops the machine or jumps into loaded code
//! directly. A handler that hits an unrecoverable condition returns
//! [`Outcome::Halt`]; a completed, validated transfer returns
//! [`Outcome::Boot`]. The driving loop turns these into the platform's
//! halt and launch primitives, which keeps every handler an ordinary,
//! testable function.

use core::fmt;

use lanboot_hal::ImageEntry;

/// Unrecoverable boot failures, each with a stable one-byte diagnostic code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalCode {
    /// No usable response from the network within the retry budget
    NoResponse,
    /// The server-name field is not a dotted-decimal address
    InvalidBootServer,
    /// The loaded image does not start with the expected version signature
    VersionMismatch,
    /// The server rejected or could not serve the requested file
    FileNotFound,
    /// Internal inconsistency, e.g. an image overrunning its destination
    Internal,
}

impl FatalCode {
    /// The byte written to the diagnostic status location.
    pub const fn code(self) -> u8 {
        match self {
            FatalCode::NoResponse => 2,
            FatalCode::InvalidBootServer => 3,
            FatalCode::VersionMismatch => 5,
            FatalCode::FileNotFound => 6,
            FatalCode::Internal => 7,
        }
    }
}

impl fmt::Display for FatalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FatalCode::NoResponse => write!(f, "no response"),
            FatalCode::InvalidBootServer => write!(f, "invalid boot server address"),
            FatalCode::VersionMismatch => write!(f, "image version mismatch"),
            FatalCode::FileNotFound => write!(f, "file not found"),
            FatalCode::Internal => write!(f, "internal error"),
        }
    }
}

/// What the driving loop should do after a handler has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Keep processing frames
    Continue,
    /// Stop permanently and report the diagnostic code
    Halt(FatalCode),
    /// Transfer control into the loaded image; the loop never returns here
    Boot(ImageEntry),
}
