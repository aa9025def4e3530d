//! # LanBoot HAL - Hardware Abstraction Layer
//!
//! This crate defines the traits through which the boot-time protocol core
//! reaches the hardware it runs on. The core never touches a controller
//! register, a status display, or a jump target directly; it only talks to
//! these traits.
//!
//! ## Design Philosophy
//!
//! The HAL is designed to be:
//! - **Minimal**: Only exposes what the boot sequence needs
//! - **Byte-oriented**: Frames and diagnostic codes cross this boundary as
//!   plain bytes, so the protocol crates stay platform-agnostic
//! - **Testable**: Every trait has an obvious in-memory test double

#![no_std]

pub mod launch;
pub mod link;
pub mod status;
pub mod time;

pub use launch::{ImageEntry, ImageLauncher};
pub use link::LinkDriver;
pub use status::StatusSink;
pub use time::TickSource;

/// Result type for HAL operations
pub type HalResult<T> = Result<T, HalError>;

/// Errors that can occur in HAL operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalError {
    /// The link-layer controller rejected or dropped a transmission
    TxFailed,
    /// The physical link is down
    LinkDown,
    /// The controller has not been initialized
    NotInitialized,
    /// Hardware reported an unspecified error
    HardwareError,
}
