//! # LanBoot Net - boot-time network protocol core
//!
//! Everything needed to boot a diskless machine over one Ethernet segment:
//! broadcast a boot-configuration request, accept the reply that assigns a
//! host address, a boot-server address and a boot filename, stream the boot
//! image into memory block by block, validate its signature, and hand the
//! driving loop a terminal [`Outcome`]. Diagnostic echo probes and ARP
//! queries for the configured address are answered along the way.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        dispatch                              │
//! │   EtherType demux → IPv4 sanity/checksums → port demux       │
//! ├───────────────┬───────────────┬───────────────┬──────────────┤
//! │     arp       │     echo      │    bootcfg    │     tftp     │
//! │  ARP replies  │  ping replies │  reply parse  │  image load  │
//! ├───────────────┴───────────────┴───────────────┴──────────────┤
//! │              framing / checksum / wire / addr                │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! All buffers are fixed-size and parsed in a single pass; there is no heap.
//! Handlers never return recoverable errors: a frame is either applied,
//! silently dropped, or escalated to a fatal [`Outcome::Halt`].

#![no_std]

pub mod addr;
pub mod arp;
pub mod bootcfg;
pub mod checksum;
pub mod config;
pub mod dispatch;
pub mod echo;
pub mod fault;
pub mod framing;
pub mod tftp;
pub mod wire;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::AddressConfig;
pub use fault::{FatalCode, Outcome};
pub use tftp::TransferState;

use bootcfg::ConfigClient;
use framing::Framer;
use tftp::TftpClient;

/// All mutable protocol state for one boot attempt.
///
/// One instance lives for the whole attempt and is passed by reference into
/// every handler; nothing in this crate is shared across execution contexts.
#[derive(Debug)]
pub struct NetState {
    /// Negotiated host and boot-server addresses
    pub config: AddressConfig,
    /// Configuration-reply handler, keyed by the boot transaction id
    pub client: ConfigClient,
    /// File-transfer client and its cursor
    pub transfer: TftpClient,
    /// Outbound packet assembly
    pub framer: Framer,
}

impl NetState {
    /// Fresh state for a boot attempt with the given station address and
    /// transaction id.
    pub fn new(mac: [u8; 6], xid: [u8; 4]) -> Self {
        Self {
            config: AddressConfig::new(),
            client: ConfigClient::new(xid),
            transfer: TftpClient::new(),
            framer: Framer::new(mac),
        }
    }
}
