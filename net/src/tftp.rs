//! File-transfer client (TFTP, RFC 1350).
//!
//! Issues the read request for the boot image and streams the answering
//! data blocks straight into the destination memory region. Every block of
//! the maximum size means more are coming; the first short block ends the
//! transfer, at which point the image's version signature decides between
//! handing control over and halting.

use heapless::Vec;
use lanboot_hal::{HalResult, ImageEntry, LinkDriver};

use crate::addr::MacAddress;
use crate::config::AddressConfig;
use crate::fault::{FatalCode, Outcome};
use crate::framing::{Endpoint, Framer};
use crate::wire::{TftpView, PORT_TFTP_SERVER};

/// Maximum payload of one data block; the final block is strictly shorter.
pub const BLOCK_MAX: usize = 512;

/// Capacity of the stored boot filename.
pub const MAX_FILENAME: usize = 128;

/// Expected first byte of a loaded image. The value doubles as a harmless
/// flag-only instruction, so execution may begin at the signature byte
/// itself.
pub const IMAGE_SIGNATURE: u8 = 0x3F;

const OPCODE_RRQ: u16 = 1;
const OPCODE_DATA: u16 = 3;
const OPCODE_ACK: u16 = 4;
const OPCODE_ERROR: u16 = 5;

/// "illegal TFTP operation"
const ERROR_ILLEGAL: u16 = 4;

/// Transfer mode for the read request, NUL included
const MODE_OCTET: &[u8] = b"octet\0";

/// First client port; a fresh port is taken for every request
const EPHEMERAL_PORT_START: u16 = 0xC000;

/// Where the transfer currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    /// No read request issued yet
    AwaitingRequest,
    /// Blocks are being received
    Receiving,
    /// Final block accepted and the image validated (terminal)
    Done,
}

/// Streams one file into a destination region, block by block.
#[derive(Debug)]
pub struct TftpClient {
    state: TransferState,
    /// Write offset into the destination region; advances monotonically by
    /// exactly the bytes copied from each accepted block
    cursor: usize,
    expected_block: u16,
    client_port: u16,
    /// Source port the server settled on, learned from its first block
    server_port: Option<u16>,
    filename: Vec<u8, MAX_FILENAME>,
}

impl TftpClient {
    /// Client with no transfer in progress.
    pub fn new() -> Self {
        Self {
            state: TransferState::AwaitingRequest,
            cursor: 0,
            expected_block: 1,
            client_port: EPHEMERAL_PORT_START,
            server_port: None,
            filename: Vec::new(),
        }
    }

    /// Current transfer state.
    pub fn state(&self) -> TransferState {
        self.state
    }

    /// Bytes written to the destination region so far.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The port inbound data blocks are addressed to.
    pub fn client_port(&self) -> u16 {
        self.client_port
    }

    /// The filename of the running (or last requested) transfer.
    pub fn filename(&self) -> &[u8] {
        &self.filename
    }

    /// Issue a read request for `filename` to the configured server.
    pub fn request<L: LinkDriver>(
        &mut self,
        filename: &[u8],
        config: &AddressConfig,
        framer: &mut Framer,
        link: &mut L,
    ) -> HalResult<()> {
        let n = filename.len().min(MAX_FILENAME);
        self.filename = Vec::from_slice(&filename[..n]).unwrap_or_default();
        self.send_read_request(config, framer, link)
    }

    /// Re-issue the read request for the stored filename, restarting the
    /// transfer from block 1. Called by the driving loop after silence.
    pub fn resend_request<L: LinkDriver>(
        &mut self,
        config: &AddressConfig,
        framer: &mut Framer,
        link: &mut L,
    ) -> HalResult<()> {
        self.send_read_request(config, framer, link)
    }

    fn send_read_request<L: LinkDriver>(
        &mut self,
        config: &AddressConfig,
        framer: &mut Framer,
        link: &mut L,
    ) -> HalResult<()> {
        self.client_port = self.client_port.checked_add(1).unwrap_or(EPHEMERAL_PORT_START);
        self.expected_block = 1;
        self.cursor = 0;
        self.server_port = None;
        self.state = TransferState::Receiving;

        log::info!("requesting boot image from {}", config.server_address);

        // The server's hardware address is unknown at this point, so the
        // request goes to the broadcast station address.
        let payload_len = 2 + self.filename.len() + 1 + MODE_OCTET.len();
        framer.begin_udp(
            MacAddress::BROADCAST,
            config.host_address,
            config.server_address,
            self.client_port,
            PORT_TFTP_SERVER,
            payload_len,
        );
        framer.push(&OPCODE_RRQ.to_be_bytes());
        framer.push(&self.filename);
        framer.push(&[0]);
        framer.push(MODE_OCTET);
        framer.send(link)
    }

    /// Handle one datagram addressed to the transfer port.
    ///
    /// Sequencing lives here: in-window blocks are acknowledged, duplicates
    /// are re-acknowledged without being delivered again, out-of-window
    /// blocks draw an error packet, and only the next expected block
    /// reaches [`Self::on_data_block`].
    pub fn on_packet<L: LinkDriver>(
        &mut self,
        packet: &[u8],
        from: &Endpoint,
        config: &AddressConfig,
        image: &mut [u8],
        framer: &mut Framer,
        link: &mut L,
    ) -> Outcome {
        if self.state != TransferState::Receiving {
            return Outcome::Continue;
        }
        let Some(view) = TftpView::new(packet) else {
            return Outcome::Continue;
        };
        if view.opcode() != OPCODE_DATA {
            // ERROR, RRQ, WRQ, ACK: all wrong
            return Outcome::Halt(FatalCode::FileNotFound);
        }
        if view.data().len() > BLOCK_MAX {
            log::warn!("oversized data block, dropped");
            return Outcome::Continue;
        }

        let block = view.block_no();
        let in_window = block == self.expected_block
            || block == self.expected_block.wrapping_sub(1);
        let from_server = self.expected_block == 1 || self.server_port == Some(from.port);
        if !in_window || !from_server {
            self.send_error(from, config, framer, link);
            return Outcome::Continue;
        }

        self.server_port = Some(from.port);
        self.send_ack(block, from, config, framer, link);

        if block == self.expected_block {
            self.expected_block = self.expected_block.wrapping_add(1);
            self.on_data_block(view.data(), image)
        } else {
            // duplicate of the previous block: re-acknowledged only
            Outcome::Continue
        }
    }

    /// Consume one in-order data block.
    ///
    /// Copies the payload to the cursor and advances it. A full-size block
    /// keeps the transfer in the receiving state; a short block is the last
    /// one, and the image's first byte must then carry the version
    /// signature before control may be transferred.
    pub fn on_data_block(&mut self, payload: &[u8], image: &mut [u8]) -> Outcome {
        let Some(end) = self.cursor.checked_add(payload.len()).filter(|&e| e <= image.len())
        else {
            return Outcome::Halt(FatalCode::Internal);
        };
        image[self.cursor..end].copy_from_slice(payload);
        self.cursor = end;

        if payload.len() == BLOCK_MAX {
            return Outcome::Continue;
        }

        self.state = TransferState::Done;
        if image.first() != Some(&IMAGE_SIGNATURE) {
            return Outcome::Halt(FatalCode::VersionMismatch);
        }
        log::info!("image complete: {} bytes", self.cursor);
        Outcome::Boot(ImageEntry {
            base: 0,
            len: self.cursor,
        })
    }

    fn send_ack<L: LinkDriver>(
        &self,
        block: u16,
        from: &Endpoint,
        config: &AddressConfig,
        framer: &mut Framer,
        link: &mut L,
    ) {
        framer.begin_udp(
            from.mac,
            config.host_address,
            from.ip,
            self.client_port,
            from.port,
            4,
        );
        framer.push(&OPCODE_ACK.to_be_bytes());
        framer.push(&block.to_be_bytes());
        if let Err(err) = framer.send(link) {
            log::warn!("ack not sent: {:?}", err);
        }
    }

    fn send_error<L: LinkDriver>(
        &self,
        from: &Endpoint,
        config: &AddressConfig,
        framer: &mut Framer,
        link: &mut L,
    ) {
        framer.begin_udp(
            from.mac,
            config.host_address,
            from.ip,
            self.client_port,
            from.port,
            5,
        );
        framer.push(&OPCODE_ERROR.to_be_bytes());
        framer.push(&ERROR_ILLEGAL.to_be_bytes());
        framer.push(&[0]); // no particular message
        if let Err(err) = framer.send(link) {
            log::warn!("error packet not sent: {:?}", err);
        }
    }
}

impl Default for TftpClient {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TESTS
// =============================================================================
