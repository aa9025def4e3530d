//! Echo responder (ICMP echo, RFC 792).
//!
//! Turns an echo request into an echo reply by rewriting the type byte and
//! recomputing the checksum over the whole record, then sends it back with
//! source and destination swapped. Everything else is a silent no-op; this
//! responder never halts the machine.

use lanboot_hal::LinkDriver;

use crate::addr::Ipv4Address;
use crate::checksum::checksum_of;
use crate::framing::{Endpoint, Framer};
use crate::wire::{EchoView, PROTO_ICMP};

/// Type byte of an echo request
pub const ECHO_REQUEST: u8 = 8;
/// Type byte of an echo reply
pub const ECHO_REPLY: u8 = 0;

/// Answer one inbound echo record, or ignore it.
pub fn on_echo<L: LinkDriver>(
    record: &[u8],
    from: &Endpoint,
    host: Ipv4Address,
    framer: &mut Framer,
    link: &mut L,
) {
    let Some(view) = EchoView::new(record) else {
        return;
    };
    if view.kind() != ECHO_REQUEST {
        return;
    }

    framer.begin_ipv4(from.mac, host, from.ip, PROTO_ICMP, record.len());
    framer.push(record);

    let reply = framer.payload_mut();
    reply[EchoView::TYPE] = ECHO_REPLY;
    reply[EchoView::CHECKSUM] = 0;
    reply[EchoView::CHECKSUM + 1] = 0;
    let cs = checksum_of(reply);
    reply[EchoView::CHECKSUM..EchoView::CHECKSUM + 2].copy_from_slice(&cs.to_be_bytes());

    if let Err(err) = framer.send(link) {
        log::warn!("echo reply not sent: {:?}", err);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addr::MacAddress;
    use crate::checksum;
    use crate::testutil::TestLink;
    use crate::wire::{EthernetView, Ipv4View};

    fn probe() -> Endpoint {
        Endpoint {
            mac: MacAddress::new([2, 0, 0, 0, 0, 7]),
            ip: Ipv4Address::new(192, 168, 0, 40),
            port: 0,
        }
    }

    fn respond(record: &[u8]) -> (TestLink, Framer) {
        let mut link = TestLink::new();
        let mut framer = Framer::new([0x02, 0x4C, 0x42, 0x00, 0x00, 0x01]);
        on_echo(
            record,
            &probe(),
            Ipv4Address::new(192, 168, 0, 30),
            &mut framer,
            &mut link,
        );
        (link, framer)
    }

    #[test]
    fn test_request_is_answered() {
        let mut record = [0u8; 16];
        record[0] = ECHO_REQUEST;
        record[4..8].copy_from_slice(&[0x13, 0x37, 0x00, 0x01]);
        record[8..16].copy_from_slice(b"payload!");
        let cs = checksum_of(&record);
        record[2..4].copy_from_slice(&cs.to_be_bytes());

        let (link, _) = respond(&record);
        assert_eq!(link.sent, 1);

        let eth = EthernetView::new(link.last()).expect("eth");
        let ip = Ipv4View::new(eth.payload()).expect("ip");
        assert_eq!(ip.protocol(), PROTO_ICMP);
        assert_eq!(ip.src(), Ipv4Address::new(192, 168, 0, 30));
        assert_eq!(ip.dst(), Ipv4Address::new(192, 168, 0, 40));

        let reply = &eth.payload()[Ipv4View::MIN_SIZE..];
        assert_eq!(reply.len(), record.len());
        assert_eq!(reply[0], ECHO_REPLY);
        // payload is echoed back unchanged
        assert_eq!(&reply[4..], &record[4..]);
        // re-summing the whole reply yields zero
        assert!(checksum::verify(reply));
    }

    #[test]
    fn test_odd_length_request() {
        let mut record = [0u8; 13];
        record[0] = ECHO_REQUEST;
        record[8..13].copy_from_slice(b"hello");

        let (link, _) = respond(&record);
        assert_eq!(link.sent, 1);
        let eth = EthernetView::new(link.last()).expect("eth");
        let reply = &eth.payload()[Ipv4View::MIN_SIZE..];
        assert!(checksum::verify(reply));
    }

    #[test]
    fn test_other_type_ignored() {
        let mut record = [0u8; 16];
        record[0] = 13; // timestamp request
        let (link, _) = respond(&record);
        assert_eq!(link.sent, 0);
    }

    #[test]
    fn test_truncated_record_ignored() {
        let record = [ECHO_REQUEST, 0, 0, 0];
        let (link, _) = respond(&record);
        assert_eq!(link.sent, 0);
    }
}
