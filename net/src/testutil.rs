//! In-memory link driver for unit tests.

use lanboot_hal::{HalResult, LinkDriver};

use crate::framing::MAX_FRAME;

/// Captures transmitted frames; never receives anything.
#[derive(Debug)]
pub(crate) struct TestLink {
    /// Number of frames sent
    pub sent: usize,
    buf: [u8; MAX_FRAME],
    len: usize,
}

impl TestLink {
    pub fn new() -> Self {
        Self {
            sent: 0,
            buf: [0; MAX_FRAME],
            len: 0,
        }
    }

    /// The most recently transmitted frame.
    pub fn last(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

impl LinkDriver for TestLink {
    fn hw_address(&self) -> [u8; 6] {
        [0x02, 0x4C, 0x42, 0x00, 0x00, 0x01]
    }

    fn send(&mut self, frame: &[u8]) -> HalResult<()> {
        self.buf[..frame.len()].copy_from_slice(frame);
        self.len = frame.len();
        self.sent += 1;
        Ok(())
    }

    fn poll(&mut self, _buf: &mut [u8]) -> HalResult<Option<usize>> {
        Ok(None)
    }
}
