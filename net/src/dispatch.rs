//! Inbound frame demultiplexer.
//!
//! One call per received frame; the selected handler runs to completion
//! before the next frame is looked at. Frames that fail a sanity or
//! checksum test are dropped here, so the protocol handlers below only
//! ever see well-formed records.

use lanboot_hal::LinkDriver;

use crate::addr::{Ipv4Address, MacAddress};
use crate::checksum::{self, Checksum};
use crate::fault::Outcome;
use crate::framing::Endpoint;
use crate::wire::{
    EthernetView, IpFlags, Ipv4View, UdpView, ETHERTYPE_ARP, ETHERTYPE_IPV4,
    PORT_BOOTP_CLIENT, PROTO_ICMP, PROTO_UDP,
};
use crate::{arp, echo, NetState};

/// Demultiplex one received frame into the matching handler.
pub fn handle_frame<L: LinkDriver>(
    state: &mut NetState,
    image: &mut [u8],
    frame: &[u8],
    link: &mut L,
) -> Outcome {
    let Some(eth) = EthernetView::new(frame) else {
        return Outcome::Continue;
    };
    match eth.ethertype() {
        ETHERTYPE_ARP => {
            arp::on_arp(
                eth.payload(),
                state.config.host_address,
                &mut state.framer,
                link,
            );
            Outcome::Continue
        }
        ETHERTYPE_IPV4 => handle_ipv4(state, image, eth.src(), eth.payload(), link),
        _ => Outcome::Continue,
    }
}

fn handle_ipv4<L: LinkDriver>(
    state: &mut NetState,
    image: &mut [u8],
    from_mac: MacAddress,
    packet: &[u8],
    link: &mut L,
) -> Outcome {
    let Some(ip) = Ipv4View::new(packet) else {
        return Outcome::Continue;
    };

    // IPv4 tag, minimal..maximal header length
    if !(0x45..=0x4F).contains(&ip.version_ihl()) {
        return Outcome::Continue;
    }
    let header_len = ip.header_len();
    let total_len = usize::from(ip.total_len());
    if total_len < header_len || total_len > packet.len() {
        return Outcome::Continue;
    }
    if ip.frag_offset() != 0 || ip.flags().contains(IpFlags::MF) {
        return Outcome::Continue;
    }
    // once an address is set, traffic for anyone else is ignored
    if state.config.is_configured() && ip.dst() != state.config.host_address {
        return Outcome::Continue;
    }
    if !checksum::verify(&packet[..header_len]) {
        log::debug!("bad IP checksum, dropped");
        return Outcome::Continue;
    }

    let payload = &packet[header_len..total_len];
    match ip.protocol() {
        PROTO_ICMP => {
            let from = Endpoint {
                mac: from_mac,
                ip: ip.src(),
                port: 0,
            };
            echo::on_echo(
                payload,
                &from,
                state.config.host_address,
                &mut state.framer,
                link,
            );
            Outcome::Continue
        }
        PROTO_UDP => handle_udp(state, image, from_mac, ip.src(), ip.dst(), payload, link),
        _ => Outcome::Continue,
    }
}

fn handle_udp<L: LinkDriver>(
    state: &mut NetState,
    image: &mut [u8],
    from_mac: MacAddress,
    src_ip: Ipv4Address,
    dst_ip: Ipv4Address,
    datagram: &[u8],
    link: &mut L,
) -> Outcome {
    let Some(udp) = UdpView::new(datagram) else {
        return Outcome::Continue;
    };
    let claimed = usize::from(udp.length());
    if claimed < UdpView::SIZE || claimed > datagram.len() {
        log::debug!("truncated UDP datagram, dropped");
        return Outcome::Continue;
    }
    // a zero checksum means the sender did not compute one
    if udp.checksum() != 0 && !udp_checksum_ok(src_ip, dst_ip, &datagram[..claimed]) {
        log::debug!("bad UDP checksum, dropped");
        return Outcome::Continue;
    }

    let payload = &datagram[UdpView::SIZE..claimed];
    let from = Endpoint {
        mac: from_mac,
        ip: src_ip,
        port: udp.src_port(),
    };

    let NetState {
        config,
        client,
        transfer,
        framer,
    } = state;

    match udp.dst_port() {
        PORT_BOOTP_CLIENT => client.on_reply(payload, config, transfer, framer, link),
        port if port == transfer.client_port() => {
            transfer.on_packet(payload, &from, config, image, framer, link)
        }
        _ => Outcome::Continue,
    }
}

/// Verify a UDP checksum, pseudo-header included.
fn udp_checksum_ok(src: Ipv4Address, dst: Ipv4Address, segment: &[u8]) -> bool {
    let mut cs = Checksum::new();
    cs.add(&src.octets)
        .add(&dst.octets)
        .add(&[0, PROTO_UDP])
        .add(&(segment.len() as u16).to_be_bytes())
        .add(segment);
    cs.folded() == 0xFFFF
}

// =============================================================================
// TESTS
// =============================================================================
