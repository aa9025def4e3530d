//! Fixed-layout views over received wire records.
//!
//! Every record is parsed in place as a bounded byte view; constructors
//! check the minimum length once, accessors then index freely within it.
//! Offsets are named constants, with the layout arithmetic checked at
//! compile time.

use bitflags::bitflags;
use static_assertions::const_assert_eq;

use crate::addr::{Ipv4Address, MacAddress};

/// EtherType for IPv4
pub const ETHERTYPE_IPV4: u16 = 0x0800;
/// EtherType for ARP
pub const ETHERTYPE_ARP: u16 = 0x0806;

/// IPv4 protocol number for ICMP
pub const PROTO_ICMP: u8 = 1;
/// IPv4 protocol number for UDP
pub const PROTO_UDP: u8 = 17;

/// Boot-configuration server port
pub const PORT_BOOTP_SERVER: u16 = 67;
/// Boot-configuration client port
pub const PORT_BOOTP_CLIENT: u16 = 68;
/// File-transfer server port
pub const PORT_TFTP_SERVER: u16 = 69;

fn be16(buf: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([buf[offset], buf[offset + 1]])
}

fn ipv4_at(buf: &[u8], offset: usize) -> Ipv4Address {
    Ipv4Address::new(buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3])
}

// =============================================================================
// ETHERNET
// =============================================================================

/// Ethernet frame view
#[derive(Debug, Clone, Copy)]
pub struct EthernetView<'a>(&'a [u8]);

impl<'a> EthernetView<'a> {
    /// Header size
    pub const SIZE: usize = 14;

    const SRC: usize = 6;
    const ETHERTYPE: usize = 12;

    /// View over a whole received frame
    pub fn new(frame: &'a [u8]) -> Option<Self> {
        (frame.len() >= Self::SIZE).then_some(Self(frame))
    }

    /// Source station address
    pub fn src(&self) -> MacAddress {
        let mut octets = [0u8; 6];
        octets.copy_from_slice(&self.0[Self::SRC..Self::SRC + 6]);
        MacAddress::new(octets)
    }

    /// EtherType field
    pub fn ethertype(&self) -> u16 {
        be16(self.0, Self::ETHERTYPE)
    }

    /// Everything after the Ethernet header
    pub fn payload(&self) -> &'a [u8] {
        &self.0[Self::SIZE..]
    }
}

// =============================================================================
// IPv4
// =============================================================================

bitflags! {
    /// IPv4 header flag bits (the 3-bit field above the fragment offset)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IpFlags: u8 {
        /// Don't Fragment
        const DF = 0b010;
        /// More Fragments
        const MF = 0b001;
    }
}

/// IPv4 datagram view (header plus payload)
#[derive(Debug, Clone, Copy)]
pub struct Ipv4View<'a>(&'a [u8]);

impl<'a> Ipv4View<'a> {
    /// Minimum header size (no options)
    pub const MIN_SIZE: usize = 20;

    const VERSION_IHL: usize = 0;
    const TOTAL_LENGTH: usize = 2;
    const FLAGS_FRAGMENT: usize = 6;
    const PROTOCOL: usize = 9;
    const CHECKSUM: usize = 10;
    const SRC: usize = 12;
    const DST: usize = 16;

    /// View over a datagram; requires at least a minimal header
    pub fn new(packet: &'a [u8]) -> Option<Self> {
        (packet.len() >= Self::MIN_SIZE).then_some(Self(packet))
    }

    /// Combined version/IHL byte
    pub fn version_ihl(&self) -> u8 {
        self.0[Self::VERSION_IHL]
    }

    /// Header length in bytes
    pub fn header_len(&self) -> usize {
        usize::from(self.version_ihl() & 0x0F) * 4
    }

    /// Total datagram length
    pub fn total_len(&self) -> u16 {
        be16(self.0, Self::TOTAL_LENGTH)
    }

    /// Header flag bits
    pub fn flags(&self) -> IpFlags {
        IpFlags::from_bits_truncate((be16(self.0, Self::FLAGS_FRAGMENT) >> 13) as u8)
    }

    /// Fragment offset in bytes
    pub fn frag_offset(&self) -> u16 {
        (be16(self.0, Self::FLAGS_FRAGMENT) & 0x1FFF) * 8
    }

    /// Payload protocol number
    pub fn protocol(&self) -> u8 {
        self.0[Self::PROTOCOL]
    }

    /// Header checksum field
    pub fn checksum(&self) -> u16 {
        be16(self.0, Self::CHECKSUM)
    }

    /// Source address
    pub fn src(&self) -> Ipv4Address {
        ipv4_at(self.0, Self::SRC)
    }

    /// Destination address
    pub fn dst(&self) -> Ipv4Address {
        ipv4_at(self.0, Self::DST)
    }
}

// =============================================================================
// UDP
// =============================================================================

/// UDP datagram view (header plus payload)
#[derive(Debug, Clone, Copy)]
pub struct UdpView<'a>(&'a [u8]);

impl<'a> UdpView<'a> {
    /// Header size
    pub const SIZE: usize = 8;

    const SRC_PORT: usize = 0;
    const DST_PORT: usize = 2;
    const LENGTH: usize = 4;
    const CHECKSUM: usize = 6;

    /// View over a UDP datagram
    pub fn new(datagram: &'a [u8]) -> Option<Self> {
        (datagram.len() >= Self::SIZE).then_some(Self(datagram))
    }

    /// Source port
    pub fn src_port(&self) -> u16 {
        be16(self.0, Self::SRC_PORT)
    }

    /// Destination port
    pub fn dst_port(&self) -> u16 {
        be16(self.0, Self::DST_PORT)
    }

    /// Length claimed by the UDP header (header included)
    pub fn length(&self) -> u16 {
        be16(self.0, Self::LENGTH)
    }

    /// Checksum field (zero means "not used")
    pub fn checksum(&self) -> u16 {
        be16(self.0, Self::CHECKSUM)
    }
}

// =============================================================================
// BOOT-CONFIGURATION REPLY
// =============================================================================

/// Boot-configuration (BOOTP) record view.
///
/// Fixed 300-byte layout: the assigned client address is immediately
/// followed by the server address, so both are applied with one 8-byte
/// copy. The two text fields are NUL-terminated within their slots.
#[derive(Debug, Clone, Copy)]
pub struct BootRecordView<'a>(&'a [u8]);

impl<'a> BootRecordView<'a> {
    /// Total record size
    pub const SIZE: usize = 300;

    /// Operation code offset
    pub const OP: usize = 0;
    /// Transaction id offset
    pub const XID: usize = 4;
    /// Assigned client address offset
    pub const YIADDR: usize = 16;
    /// Server address offset
    pub const SIADDR: usize = 20;
    /// Client hardware address offset
    pub const CHADDR: usize = 28;
    /// Server-name text field offset
    pub const SNAME: usize = 44;
    /// Server-name field size
    pub const SNAME_LEN: usize = 64;
    /// Boot-filename text field offset
    pub const FILE: usize = 108;
    /// Boot-filename field size
    pub const FILE_LEN: usize = 128;
    /// Vendor area size (trailing, unused here)
    pub const VEND_LEN: usize = 64;

    /// Operation code: request
    pub const OP_REQUEST: u8 = 1;
    /// Operation code: reply
    pub const OP_REPLY: u8 = 2;

    /// View over a full-size record
    pub fn new(record: &'a [u8]) -> Option<Self> {
        (record.len() >= Self::SIZE).then_some(Self(record))
    }

    /// Operation code
    pub fn op(&self) -> u8 {
        self.0[Self::OP]
    }

    /// Transaction id bytes
    pub fn xid(&self) -> &'a [u8] {
        &self.0[Self::XID..Self::XID + 4]
    }

    /// The 8-byte block holding the assigned client address followed by the
    /// server address
    pub fn address_block(&self) -> &'a [u8] {
        &self.0[Self::YIADDR..Self::YIADDR + 8]
    }

    /// Server-name text field (full slot)
    pub fn server_name(&self) -> &'a [u8] {
        &self.0[Self::SNAME..Self::SNAME + Self::SNAME_LEN]
    }

    /// Boot-filename text field (full slot)
    pub fn boot_file(&self) -> &'a [u8] {
        &self.0[Self::FILE..Self::FILE + Self::FILE_LEN]
    }
}

// The server address must directly follow the assigned client address (the
// handler copies both as one block), and the text fields must pack exactly
// into the fixed record size.
const_assert_eq!(BootRecordView::SIADDR, BootRecordView::YIADDR + 4);
const_assert_eq!(BootRecordView::SNAME, BootRecordView::CHADDR + 16);
const_assert_eq!(BootRecordView::FILE, BootRecordView::SNAME + BootRecordView::SNAME_LEN);
const_assert_eq!(
    BootRecordView::SIZE,
    BootRecordView::FILE + BootRecordView::FILE_LEN + BootRecordView::VEND_LEN
);

// =============================================================================
// FILE-TRANSFER DATA BLOCK
// =============================================================================

/// File-transfer (TFTP) packet view
#[derive(Debug, Clone, Copy)]
pub struct TftpView<'a>(&'a [u8]);

impl<'a> TftpView<'a> {
    /// Opcode + block number
    pub const HEADER_SIZE: usize = 4;

    const OPCODE: usize = 0;
    const BLOCK_NO: usize = 2;

    /// View over a transfer packet
    pub fn new(packet: &'a [u8]) -> Option<Self> {
        (packet.len() >= Self::HEADER_SIZE).then_some(Self(packet))
    }

    /// Packet opcode
    pub fn opcode(&self) -> u16 {
        be16(self.0, Self::OPCODE)
    }

    /// Block number
    pub fn block_no(&self) -> u16 {
        be16(self.0, Self::BLOCK_NO)
    }

    /// Data payload (everything after the header)
    pub fn data(&self) -> &'a [u8] {
        &self.0[Self::HEADER_SIZE..]
    }
}

// =============================================================================
// ECHO (ICMP)
// =============================================================================

/// Echo request/reply record view
#[derive(Debug, Clone, Copy)]
pub struct EchoView<'a>(&'a [u8]);

impl<'a> EchoView<'a> {
    /// Minimum record size (type, code, checksum, identifier, sequence)
    pub const HEADER_SIZE: usize = 8;

    /// Type byte offset
    pub const TYPE: usize = 0;
    /// Checksum field offset
    pub const CHECKSUM: usize = 2;

    /// View over an echo record
    pub fn new(record: &'a [u8]) -> Option<Self> {
        (record.len() >= Self::HEADER_SIZE).then_some(Self(record))
    }

    /// Record type
    pub fn kind(&self) -> u8 {
        self.0[Self::TYPE]
    }

    /// Checksum field
    pub fn checksum(&self) -> u16 {
        be16(self.0, Self::CHECKSUM)
    }
}

// =============================================================================
// ARP
// =============================================================================

/// ARP packet view
#[derive(Debug, Clone, Copy)]
pub struct ArpView<'a>(&'a [u8]);

impl<'a> ArpView<'a> {
    /// Packet size (Ethernet/IPv4)
    pub const SIZE: usize = 28;

    /// Operation: request
    pub const OP_REQUEST: u16 = 1;
    /// Operation: reply
    pub const OP_REPLY: u16 = 2;

    const HW_TYPE: usize = 0;
    const PROTO_TYPE: usize = 2;
    const HW_LEN: usize = 4;
    const PROTO_LEN: usize = 5;
    const OPERATION: usize = 6;
    const SENDER_HW: usize = 8;
    const SENDER_PROTO: usize = 14;
    const TARGET_PROTO: usize = 24;

    /// View over an ARP packet
    pub fn new(packet: &'a [u8]) -> Option<Self> {
        (packet.len() >= Self::SIZE).then_some(Self(packet))
    }

    /// Hardware type (1 = Ethernet)
    pub fn hw_type(&self) -> u16 {
        be16(self.0, Self::HW_TYPE)
    }

    /// Protocol type
    pub fn proto_type(&self) -> u16 {
        be16(self.0, Self::PROTO_TYPE)
    }

    /// Hardware address length
    pub fn hw_len(&self) -> u8 {
        self.0[Self::HW_LEN]
    }

    /// Protocol address length
    pub fn proto_len(&self) -> u8 {
        self.0[Self::PROTO_LEN]
    }

    /// Operation code
    pub fn operation(&self) -> u16 {
        be16(self.0, Self::OPERATION)
    }

    /// Sender hardware address
    pub fn sender_hw(&self) -> MacAddress {
        let mut octets = [0u8; 6];
        octets.copy_from_slice(&self.0[Self::SENDER_HW..Self::SENDER_HW + 6]);
        MacAddress::new(octets)
    }

    /// Sender protocol address
    pub fn sender_proto(&self) -> Ipv4Address {
        ipv4_at(self.0, Self::SENDER_PROTO)
    }

    /// Target protocol address
    pub fn target_proto(&self) -> Ipv4Address {
        ipv4_at(self.0, Self::TARGET_PROTO)
    }
}

const_assert_eq!(ArpView::SIZE, ArpView::TARGET_PROTO + 4);

// =============================================================================
// TESTS
// =============================================================================
