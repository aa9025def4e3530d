//! # LanBoot Firmware - driving loop
//!
//! Owns the protocol state and the destination image region, polls the
//! link driver, feeds each received frame into the protocol core, and acts
//! on the core's terminal outcomes: a fatal code goes to the status sink
//! and stops the machine, a validated image goes to the launcher and never
//! comes back. Timeout-driven retransmission lives here too; the protocol
//! core itself never waits.

#![no_std]

pub mod clock;
pub mod sequencer;

pub use clock::TickCounter;
pub use sequencer::{Sequencer, Step};
