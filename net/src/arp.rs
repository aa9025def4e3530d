//! ARP responder (RFC 826).
//!
//! Answers requests for the configured host address so the boot server can
//! address its data blocks to us once the configuration reply has been
//! applied. Anything that is not such a request is ignored.

use lanboot_hal::LinkDriver;

use crate::addr::{Ipv4Address, MacAddress};
use crate::framing::Framer;
use crate::wire::{ArpView, ETHERTYPE_ARP, ETHERTYPE_IPV4};

/// Answer one inbound ARP packet, or ignore it.
pub fn on_arp<L: LinkDriver>(
    packet: &[u8],
    host: Ipv4Address,
    framer: &mut Framer,
    link: &mut L,
) {
    let Some(view) = ArpView::new(packet) else {
        return;
    };
    if view.hw_type() != 1
        || view.proto_type() != ETHERTYPE_IPV4
        || view.hw_len() != 6
        || view.proto_len() != 4
        || view.operation() != ArpView::OP_REQUEST
    {
        return;
    }
    if host.is_unspecified() || view.target_proto() != host {
        return;
    }

    let our_mac = framer.mac();
    let mut reply = [0u8; ArpView::SIZE];
    reply[0..2].copy_from_slice(&1u16.to_be_bytes());
    reply[2..4].copy_from_slice(&ETHERTYPE_IPV4.to_be_bytes());
    reply[4] = 6;
    reply[5] = 4;
    reply[6..8].copy_from_slice(&ArpView::OP_REPLY.to_be_bytes());
    reply[8..14].copy_from_slice(&our_mac.octets);
    reply[14..18].copy_from_slice(&host.octets);
    reply[18..24].copy_from_slice(&view.sender_hw().octets);
    reply[24..28].copy_from_slice(&view.sender_proto().octets);

    framer.begin_frame(view.sender_hw(), ETHERTYPE_ARP);
    framer.push(&reply);
    if let Err(err) = framer.send(link) {
        log::warn!("arp reply not sent: {:?}", err);
    }
}

// =============================================================================
// TESTS
// =============================================================================
