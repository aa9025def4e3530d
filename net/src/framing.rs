//! Outbound packet assembly.
//!
//! One fixed transmit buffer, filled header-first from a constant IPv4
//! template: version/IHL and TTL never change, the identification field
//! counts up, and the header checksum is computed in place before the
//! payload is appended. The UDP checksum is left zero on transmit, which
//! the protocol permits.

use lanboot_hal::{HalResult, LinkDriver};

use crate::addr::{Ipv4Address, MacAddress};
use crate::checksum::checksum_of;
use crate::wire::{Ipv4View, UdpView, ETHERTYPE_IPV4, PROTO_UDP};

/// Largest frame this firmware sends or accepts.
pub const MAX_FRAME: usize = 1514;

/// Time-to-live for every datagram we originate
const TTL: u8 = 64;

/// Where a received datagram came from; used to address replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    /// Sender station address
    pub mac: MacAddress,
    /// Sender protocol address
    pub ip: Ipv4Address,
    /// Sender port (zero for portless protocols)
    pub port: u16,
}

/// Assembles one outbound frame at a time into a fixed buffer.
#[derive(Debug)]
pub struct Framer {
    mac: MacAddress,
    ident: u16,
    buf: [u8; MAX_FRAME],
    len: usize,
    payload_start: usize,
}

impl Framer {
    /// New assembler for a node with the given station address.
    pub fn new(mac: [u8; 6]) -> Self {
        Self {
            mac: MacAddress::new(mac),
            ident: 0,
            buf: [0; MAX_FRAME],
            len: 0,
            payload_start: 0,
        }
    }

    /// Our station address.
    pub fn mac(&self) -> MacAddress {
        self.mac
    }

    /// Start a raw frame: Ethernet header only.
    pub fn begin_frame(&mut self, dst: MacAddress, ethertype: u16) {
        self.len = 0;
        self.push(&dst.octets);
        let src = self.mac;
        self.push(&src.octets);
        self.push(&ethertype.to_be_bytes());
        self.payload_start = self.len;
    }

    /// Start an IPv4 datagram carrying `payload_len` bytes of `protocol`.
    pub fn begin_ipv4(
        &mut self,
        dst_mac: MacAddress,
        src_ip: Ipv4Address,
        dst_ip: Ipv4Address,
        protocol: u8,
        payload_len: usize,
    ) {
        self.begin_frame(dst_mac, ETHERTYPE_IPV4);
        self.ident = self.ident.wrapping_add(1);

        let total = (Ipv4View::MIN_SIZE + payload_len) as u16;
        let mut header = [0u8; Ipv4View::MIN_SIZE];
        header[0] = 0x45;
        header[2..4].copy_from_slice(&total.to_be_bytes());
        header[4..6].copy_from_slice(&self.ident.to_be_bytes());
        header[6..8].copy_from_slice(&0x4000u16.to_be_bytes()); // Don't Fragment
        header[8] = TTL;
        header[9] = protocol;
        header[12..16].copy_from_slice(&src_ip.octets);
        header[16..20].copy_from_slice(&dst_ip.octets);
        let cs = checksum_of(&header);
        header[10..12].copy_from_slice(&cs.to_be_bytes());

        self.push(&header);
        self.payload_start = self.len;
    }

    /// Start a UDP datagram carrying `payload_len` bytes.
    pub fn begin_udp(
        &mut self,
        dst_mac: MacAddress,
        src_ip: Ipv4Address,
        dst_ip: Ipv4Address,
        src_port: u16,
        dst_port: u16,
        payload_len: usize,
    ) {
        let udp_len = (UdpView::SIZE + payload_len) as u16;
        self.begin_ipv4(dst_mac, src_ip, dst_ip, PROTO_UDP, usize::from(udp_len));

        let mut header = [0u8; UdpView::SIZE];
        header[0..2].copy_from_slice(&src_port.to_be_bytes());
        header[2..4].copy_from_slice(&dst_port.to_be_bytes());
        header[4..6].copy_from_slice(&udp_len.to_be_bytes());
        // checksum stays zero
        self.push(&header);
        self.payload_start = self.len;
    }

    /// Append payload bytes to the frame under construction.
    pub fn push(&mut self, bytes: &[u8]) {
        debug_assert!(self.len + bytes.len() <= MAX_FRAME);
        let n = bytes.len().min(MAX_FRAME - self.len);
        self.buf[self.len..self.len + n].copy_from_slice(&bytes[..n]);
        self.len += n;
    }

    /// The payload region pushed since the innermost header, for in-place
    /// patching (echo replies rewrite type and checksum here).
    pub fn payload_mut(&mut self) -> &mut [u8] {
        &mut self.buf[self.payload_start..self.len]
    }

    /// Hand the assembled frame to the link driver.
    pub fn send<L: LinkDriver>(&mut self, link: &mut L) -> HalResult<()> {
        link.send(&self.buf[..self.len])
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum;
    use crate::testutil::TestLink;
    use crate::wire::{EthernetView, PROTO_ICMP};

    #[test]
    fn test_udp_frame_layout() {
        let mut link = TestLink::new();
        let mut framer = Framer::new([2, 0, 0, 0, 0, 1]);
        framer.begin_udp(
            MacAddress::BROADCAST,
            Ipv4Address::new(10, 0, 0, 9),
            Ipv4Address::new(10, 0, 0, 1),
            0xC001,
            69,
            4,
        );
        framer.push(&[0xDE, 0xAD, 0xBE, 0xEF]);
        framer.send(&mut link).expect("send");

        assert_eq!(link.sent, 1);
        let frame = link.last();
        assert_eq!(frame.len(), EthernetView::SIZE + Ipv4View::MIN_SIZE + 8 + 4);

        let eth = EthernetView::new(frame).expect("eth");
        assert_eq!(eth.ethertype(), ETHERTYPE_IPV4);
        assert_eq!(eth.src(), MacAddress::new([2, 0, 0, 0, 0, 1]));

        let ip = Ipv4View::new(eth.payload()).expect("ip");
        assert_eq!(ip.protocol(), PROTO_UDP);
        assert_eq!(usize::from(ip.total_len()), Ipv4View::MIN_SIZE + 8 + 4);
        assert!(checksum::verify(&eth.payload()[..Ipv4View::MIN_SIZE]));

        let udp = UdpView::new(&eth.payload()[Ipv4View::MIN_SIZE..]).expect("udp");
        assert_eq!(udp.src_port(), 0xC001);
        assert_eq!(udp.dst_port(), 69);
        assert_eq!(udp.length(), 12);
        assert_eq!(udp.checksum(), 0);
    }

    #[test]
    fn test_identification_increments() {
        let mut link = TestLink::new();
        let mut framer = Framer::new([2, 0, 0, 0, 0, 1]);
        let src = Ipv4Address::new(10, 0, 0, 9);
        let dst = Ipv4Address::new(10, 0, 0, 1);

        framer.begin_ipv4(MacAddress::BROADCAST, src, dst, PROTO_ICMP, 0);
        framer.send(&mut link).expect("send");
        let first = {
            let frame = link.last();
            u16::from_be_bytes([frame[18], frame[19]])
        };

        framer.begin_ipv4(MacAddress::BROADCAST, src, dst, PROTO_ICMP, 0);
        framer.send(&mut link).expect("send");
        let second = {
            let frame = link.last();
            u16::from_be_bytes([frame[18], frame[19]])
        };

        assert_eq!(second, first.wrapping_add(1));
    }

    #[test]
    fn test_payload_mut_covers_pushed_payload() {
        let mut framer = Framer::new([2, 0, 0, 0, 0, 1]);
        framer.begin_ipv4(
            MacAddress::BROADCAST,
            Ipv4Address::new(10, 0, 0, 9),
            Ipv4Address::new(10, 0, 0, 1),
            PROTO_ICMP,
            3,
        );
        framer.push(&[1, 2, 3]);
        assert_eq!(framer.payload_mut(), &mut [1, 2, 3]);
    }
}
