//! Boot sequencer: the loop that drives one boot attempt.

use lanboot_hal::{ImageEntry, ImageLauncher, LinkDriver, StatusSink, TickSource};
use lanboot_net::dispatch;
use lanboot_net::framing::MAX_FRAME;
use lanboot_net::{FatalCode, NetState, Outcome, TransferState};

/// Ticks of silence before the outstanding request is re-issued.
pub const RETRY_TICKS: u32 = 100;

/// What one polling step produced; [`Sequencer::run`] acts on these,
/// [`Sequencer::step`] exposes them for the tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Nothing arrived and no timeout fired
    Idle,
    /// One frame was dispatched
    Handled,
    /// Silence long enough that a request was re-issued
    Resent,
    /// A handler escalated to a fatal halt
    Fatal(FatalCode),
    /// The image is loaded and validated
    Launch(ImageEntry),
}

/// Drives a boot attempt over the HAL collaborators.
#[derive(Debug)]
pub struct Sequencer<'a, L, S, C> {
    link: L,
    status: S,
    clock: C,
    net: NetState,
    image: &'a mut [u8],
    rx: [u8; MAX_FRAME],
    last_activity: u32,
}

impl<'a, L, S, C> Sequencer<'a, L, S, C>
where
    L: LinkDriver,
    S: StatusSink,
    C: TickSource,
{
    /// Sequencer for one boot attempt. `xid` is the transaction id
    /// generated for this attempt; `image` is the destination region the
    /// boot image streams into.
    pub fn new(link: L, status: S, clock: C, image: &'a mut [u8], xid: [u8; 4]) -> Self {
        let mac = link.hw_address();
        let last_activity = clock.ticks();
        Self {
            link,
            status,
            clock,
            net: NetState::new(mac, xid),
            image,
            rx: [0; MAX_FRAME],
            last_activity,
        }
    }

    /// Broadcast the initial configuration request.
    pub fn start(&mut self) {
        log::info!("requesting boot configuration");
        if let Err(err) = self
            .net
            .client
            .send_request(&mut self.net.framer, &mut self.link)
        {
            log::warn!("configuration request not sent: {:?}", err);
        }
        self.last_activity = self.clock.ticks();
    }

    /// Poll the link once and dispatch whatever arrived.
    pub fn step(&mut self) -> Step {
        match self.link.poll(&mut self.rx) {
            Err(err) => {
                log::warn!("link receive failed: {:?}", err);
                Step::Idle
            }
            Ok(None) => {
                let now = self.clock.ticks();
                if now.wrapping_sub(self.last_activity) >= RETRY_TICKS {
                    self.resend();
                    self.last_activity = now;
                    Step::Resent
                } else {
                    Step::Idle
                }
            }
            Ok(Some(len)) => {
                self.last_activity = self.clock.ticks();
                let frame = &self.rx[..len.min(MAX_FRAME)];
                match dispatch::handle_frame(&mut self.net, self.image, frame, &mut self.link) {
                    Outcome::Continue => Step::Handled,
                    Outcome::Halt(code) => Step::Fatal(code),
                    Outcome::Boot(entry) => Step::Launch(entry),
                }
            }
        }
    }

    /// Run the boot attempt to its terminal state.
    pub fn run<X: ImageLauncher>(mut self, mut launcher: X) -> ! {
        self.start();
        loop {
            match self.step() {
                Step::Fatal(code) => self.fatal(code),
                Step::Launch(entry) => {
                    log::info!("transferring control to the loaded image");
                    launcher.launch(entry)
                }
                Step::Idle | Step::Handled | Step::Resent => {}
            }
        }
    }

    fn resend(&mut self) {
        let NetState {
            config,
            client,
            transfer,
            framer,
        } = &mut self.net;

        let result = if transfer.state() == TransferState::Receiving {
            log::info!("silence on the wire, re-requesting boot image");
            transfer.resend_request(config, framer, &mut self.link)
        } else {
            log::info!("silence on the wire, re-requesting configuration");
            client.send_request(framer, &mut self.link)
        };
        if let Err(err) = result {
            log::warn!("retransmit failed: {:?}", err);
        }
    }

    fn fatal(&mut self, code: FatalCode) -> ! {
        log::error!("fatal: {} (code {})", code, code.code());
        self.status.fatal(code.code());
        loop {
            core::hint::spin_loop();
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
