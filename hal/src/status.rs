//! Diagnostic status output.

/// Sink for the single-byte diagnostic codes the boot sequence emits.
///
/// On real hardware this is typically a fixed status location (a border
/// color, an LED bank, a debug port). The sink must not fail; there is
/// nowhere left to report a failure to.
pub trait StatusSink {
    /// Record the diagnostic code of an unrecoverable error.
    fn fatal(&mut self, code: u8);
}
