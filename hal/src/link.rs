//! Link-layer driver abstraction.
//!
//! The protocol core sends and receives whole Ethernet frames through this
//! trait. Hardware initialization, receive filtering and buffer management
//! are the driver's business; the core only ever sees one frame at a time.

use crate::HalResult;

/// A raw Ethernet frame driver.
pub trait LinkDriver {
    /// The station (MAC) address of this node.
    fn hw_address(&self) -> [u8; 6];

    /// Transmit one complete frame (Ethernet header included).
    fn send(&mut self, frame: &[u8]) -> HalResult<()>;

    /// Poll for one received frame.
    ///
    /// Copies the frame into `buf` and returns its length, or `None` when
    /// nothing has arrived. Frames longer than `buf` are dropped by the
    /// driver.
    fn poll(&mut self, buf: &mut [u8]) -> HalResult<Option<usize>>;
}
