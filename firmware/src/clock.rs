//! Free-running tick counter.

use lanboot_hal::TickSource;
use spin::Mutex;

/// Tick counter advanced by the platform's periodic timer event and read
/// by the driving loop. The mutex is the single exclusion boundary between
/// the timer context and the boot sequence.
#[derive(Debug)]
pub struct TickCounter {
    ticks: Mutex<u32>,
}

impl TickCounter {
    /// Counter starting at zero.
    pub const fn new() -> Self {
        Self {
            ticks: Mutex::new(0),
        }
    }

    /// Advance by one tick. Called from the timer event.
    pub fn advance(&self) {
        let mut ticks = self.ticks.lock();
        *ticks = ticks.wrapping_add(1);
    }

    /// Current tick count.
    pub fn get(&self) -> u32 {
        *self.ticks.lock()
    }
}

impl Default for TickCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSource for &TickCounter {
    fn ticks(&self) -> u32 {
        self.get()
    }
}

impl TickSource for TickCounter {
    fn ticks(&self) -> u32 {
        self.get()
    }
}
