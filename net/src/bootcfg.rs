//! Boot-configuration client (BOOTP, RFC 951).
//!
//! Broadcasts the boot-configuration request and applies the reply that
//! answers it: host and server addresses, an optional textual server
//! address override, and the boot filename. A reply is either applied or
//! discarded without side effects; the only error that escapes is the
//! fatal "invalid boot server address" halt.

use lanboot_hal::{HalResult, LinkDriver};

use crate::addr::{Ipv4Address, MacAddress};
use crate::config::AddressConfig;
use crate::fault::{FatalCode, Outcome};
use crate::framing::Framer;
use crate::tftp::TftpClient;
use crate::wire::{BootRecordView, PORT_BOOTP_CLIENT, PORT_BOOTP_SERVER};

/// Filename requested when the reply's filename field is empty.
pub const DEFAULT_BOOT_FILE: &[u8] = b"spboot.bin";

/// Hardware type code for 10 Mbps Ethernet
const HTYPE_ETHERNET: u8 = 1;

/// Handles the configuration exchange for one boot attempt.
#[derive(Debug)]
pub struct ConfigClient {
    /// Transaction id generated before the request went out; replies must
    /// echo it byte for byte.
    xid: [u8; 4],
}

impl ConfigClient {
    /// Client for one boot attempt, correlated by `xid`.
    pub const fn new(xid: [u8; 4]) -> Self {
        Self { xid }
    }

    /// The transaction id this client was created with.
    pub const fn xid(&self) -> [u8; 4] {
        self.xid
    }

    /// Broadcast the 300-byte configuration request.
    pub fn send_request<L: LinkDriver>(
        &self,
        framer: &mut Framer,
        link: &mut L,
    ) -> HalResult<()> {
        let mut record = [0u8; BootRecordView::SIZE];
        record[BootRecordView::OP] = BootRecordView::OP_REQUEST;
        record[1] = HTYPE_ETHERNET;
        record[2] = 6; // hardware address length
        record[BootRecordView::XID..BootRecordView::XID + 4].copy_from_slice(&self.xid);
        record[BootRecordView::CHADDR..BootRecordView::CHADDR + 6]
            .copy_from_slice(&framer.mac().octets);

        framer.begin_udp(
            MacAddress::BROADCAST,
            Ipv4Address::ANY,
            Ipv4Address::BROADCAST,
            PORT_BOOTP_CLIENT,
            PORT_BOOTP_SERVER,
            record.len(),
        );
        framer.push(&record);
        framer.send(link)
    }

    /// Apply or discard one inbound configuration reply.
    ///
    /// On acceptance the address store is overwritten, the boot filename is
    /// resolved, and the file-transfer request goes out. Replies with the
    /// wrong operation code or transaction id are discarded silently.
    pub fn on_reply<L: LinkDriver>(
        &self,
        reply: &[u8],
        config: &mut AddressConfig,
        transfer: &mut TftpClient,
        framer: &mut Framer,
        link: &mut L,
    ) -> Outcome {
        let Some(record) = BootRecordView::new(reply) else {
            return Outcome::Continue;
        };
        if record.op() != BootRecordView::OP_REPLY {
            return Outcome::Continue;
        }
        if record.xid() != self.xid {
            return Outcome::Continue;
        }

        config.apply_address_block(record.address_block());

        let server_name = record.server_name();
        if server_name[0] != 0 {
            match parse_dotted_quad(server_name) {
                Ok(address) => config.server_address = address,
                Err(code) => return Outcome::Halt(code),
            }
        }

        let file = record.boot_file();
        let filename = if file[0] != 0 {
            text_field(file)
        } else {
            DEFAULT_BOOT_FILE
        };

        log::info!(
            "configured: host {} server {}",
            config.host_address,
            config.server_address
        );

        if let Err(err) = transfer.request(filename, config, framer, link) {
            // the retry loop will re-issue the request after silence
            log::warn!("read request not sent: {:?}", err);
        }
        Outcome::Continue
    }
}

/// The NUL-terminated content of a fixed-size text field.
fn text_field(field: &[u8]) -> &[u8] {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    &field[..end]
}

/// Parse a dotted-decimal address of exactly four octets.
///
/// Each octet accumulates decimal digits into an 8-bit value; a value past
/// 255 wraps modulo 256 without complaint, and a trailing period after the
/// fourth octet is accepted. Anything else that is not a digit, a period
/// between octets, or the terminating NUL is an invalid boot server
/// address.
fn parse_dotted_quad(text: &[u8]) -> Result<Ipv4Address, FatalCode> {
    let byte = |pos: usize| text.get(pos).copied().unwrap_or(0);
    let mut octets = [0u8; 4];
    let mut pos = 0;

    for (index, octet) in octets.iter_mut().enumerate() {
        if !byte(pos).is_ascii_digit() {
            return Err(FatalCode::InvalidBootServer);
        }
        let mut acc: u8 = 0;
        while byte(pos).is_ascii_digit() {
            acc = acc.wrapping_mul(10).wrapping_add(byte(pos) - b'0');
            pos += 1;
        }
        *octet = acc;

        match byte(pos) {
            b'.' => pos += 1,
            0 if index == 3 => {}
            _ => return Err(FatalCode::InvalidBootServer),
        }
    }

    Ok(Ipv4Address::from_octets(octets))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::TestLink;
    use crate::wire::{EthernetView, Ipv4View, UdpView};

    const XID: [u8; 4] = [0xA5, 0x01, 0x22, 0x10];
    const MAC: [u8; 6] = [0x02, 0x4C, 0x42, 0x00, 0x00, 0x01];

    fn reply(xid: [u8; 4], sname: &[u8], file: &[u8]) -> [u8; BootRecordView::SIZE] {
        let mut record = [0u8; BootRecordView::SIZE];
        record[BootRecordView::OP] = BootRecordView::OP_REPLY;
        record[BootRecordView::XID..BootRecordView::XID + 4].copy_from_slice(&xid);
        record[BootRecordView::YIADDR..BootRecordView::YIADDR + 8]
            .copy_from_slice(&[192, 168, 0, 30, 192, 168, 0, 1]);
        record[BootRecordView::SNAME..BootRecordView::SNAME + sname.len()]
            .copy_from_slice(sname);
        record[BootRecordView::FILE..BootRecordView::FILE + file.len()].copy_from_slice(file);
        record
    }

    struct Fixture {
        client: ConfigClient,
        config: AddressConfig,
        transfer: TftpClient,
        framer: Framer,
        link: TestLink,
    }

    fn fixture() -> Fixture {
        Fixture {
            client: ConfigClient::new(XID),
            config: AddressConfig::new(),
            transfer: TftpClient::new(),
            framer: Framer::new(MAC),
            link: TestLink::new(),
        }
    }

    impl Fixture {
        fn deliver(&mut self, record: &[u8]) -> Outcome {
            self.client.on_reply(
                record,
                &mut self.config,
                &mut self.transfer,
                &mut self.framer,
                &mut self.link,
            )
        }
    }

    #[test]
    fn test_wrong_op_discarded() {
        let mut fx = fixture();
        let mut record = reply(XID, b"", b"");
        record[BootRecordView::OP] = BootRecordView::OP_REQUEST;
        assert_eq!(fx.deliver(&record), Outcome::Continue);
        assert!(!fx.config.is_configured());
        assert_eq!(fx.link.sent, 0);
    }

    #[test]
    fn test_wrong_xid_discarded() {
        let mut fx = fixture();
        let record = reply([1, 2, 3, 4], b"", b"");
        assert_eq!(fx.deliver(&record), Outcome::Continue);
        assert!(!fx.config.is_configured());
        assert_eq!(fx.link.sent, 0);
    }

    #[test]
    fn test_addresses_copied_as_block() {
        let mut fx = fixture();
        let record = reply(XID, b"", b"");
        assert_eq!(fx.deliver(&record), Outcome::Continue);
        assert_eq!(fx.config.host_address, Ipv4Address::new(192, 168, 0, 30));
        // server defaults to the second address in the block
        assert_eq!(fx.config.server_address, Ipv4Address::new(192, 168, 0, 1));
    }

    #[test]
    fn test_server_name_overrides_server_address() {
        let mut fx = fixture();
        let record = reply(XID, b"10.0.0.5\0", b"");
        assert_eq!(fx.deliver(&record), Outcome::Continue);
        assert_eq!(fx.config.host_address, Ipv4Address::new(192, 168, 0, 30));
        assert_eq!(fx.config.server_address, Ipv4Address::new(10, 0, 0, 5));
    }

    #[test]
    fn test_octet_overflow_wraps() {
        // 300 mod 256 == 44: the 8-bit accumulator wraps without a range
        // check, matching the long-standing behavior of this parser
        let mut fx = fixture();
        let record = reply(XID, b"300.1.1.1\0", b"");
        assert_eq!(fx.deliver(&record), Outcome::Continue);
        assert_eq!(fx.config.server_address, Ipv4Address::new(44, 1, 1, 1));
    }

    #[test]
    fn test_three_octets_fatal() {
        let mut fx = fixture();
        let record = reply(XID, b"1.2.3\0", b"");
        assert_eq!(
            fx.deliver(&record),
            Outcome::Halt(FatalCode::InvalidBootServer)
        );
    }

    #[test]
    fn test_non_digit_fatal() {
        let mut fx = fixture();
        let record = reply(XID, b"10.0.0.x\0", b"");
        assert_eq!(
            fx.deliver(&record),
            Outcome::Halt(FatalCode::InvalidBootServer)
        );
    }

    #[test]
    fn test_trailing_period_tolerated() {
        let mut fx = fixture();
        let record = reply(XID, b"10.0.0.5.\0", b"");
        assert_eq!(fx.deliver(&record), Outcome::Continue);
        assert_eq!(fx.config.server_address, Ipv4Address::new(10, 0, 0, 5));
    }

    #[test]
    fn test_empty_octet_fatal() {
        let mut fx = fixture();
        let record = reply(XID, b"10..0.5\0", b"");
        assert_eq!(
            fx.deliver(&record),
            Outcome::Halt(FatalCode::InvalidBootServer)
        );
    }

    #[test]
    fn test_default_filename_requested() {
        let mut fx = fixture();
        let record = reply(XID, b"", b"");
        fx.deliver(&record);
        assert_eq!(fx.link.sent, 1);
        assert_eq!(fx.transfer.filename(), DEFAULT_BOOT_FILE);
    }

    #[test]
    fn test_reply_filename_requested() {
        let mut fx = fixture();
        let record = reply(XID, b"", b"kernel.img\0");
        fx.deliver(&record);
        assert_eq!(fx.transfer.filename(), b"kernel.img");
    }

    #[test]
    fn test_reply_application_is_idempotent() {
        let mut fx = fixture();
        let record = reply(XID, b"10.0.0.5\0", b"");
        fx.deliver(&record);
        let first = fx.config;
        fx.deliver(&record);
        assert_eq!(fx.config, first);
    }

    #[test]
    fn test_request_record_layout() {
        let mut fx = fixture();
        fx.client
            .send_request(&mut fx.framer, &mut fx.link)
            .expect("send");
        assert_eq!(fx.link.sent, 1);

        let eth = EthernetView::new(fx.link.last()).expect("eth");
        assert!(eth.src().octets == MAC);
        let ip = Ipv4View::new(eth.payload()).expect("ip");
        assert_eq!(ip.dst(), Ipv4Address::BROADCAST);
        let datagram = &eth.payload()[Ipv4View::MIN_SIZE..];
        let udp = UdpView::new(datagram).expect("udp");
        assert_eq!(udp.src_port(), PORT_BOOTP_CLIENT);
        assert_eq!(udp.dst_port(), PORT_BOOTP_SERVER);

        let record = &datagram[UdpView::SIZE..];
        assert_eq!(record.len(), BootRecordView::SIZE);
        assert_eq!(record[BootRecordView::OP], BootRecordView::OP_REQUEST);
        assert_eq!(record[1], HTYPE_ETHERNET);
        assert_eq!(record[2], 6);
        assert_eq!(&record[BootRecordView::XID..BootRecordView::XID + 4], &XID);
        assert_eq!(
            &record[BootRecordView::CHADDR..BootRecordView::CHADDR + 6],
            &MAC
        );
    }

    #[test]
    fn test_parse_dotted_quad_plain() {
        assert_eq!(
            parse_dotted_quad(b"192.168.0.254\0"),
            Ok(Ipv4Address::new(192, 168, 0, 254))
        );
    }

    #[test]
    fn test_parse_rejects_leading_period() {
        assert_eq!(
            parse_dotted_quad(b".1.2.3.4\0"),
            Err(FatalCode::InvalidBootServer)
        );
    }
}
