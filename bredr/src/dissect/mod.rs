//! BR/EDR dissector: turns a BT_RX/BT_TX frame's payload into a layered
//! struct, degrading gracefully at whichever layer the data stops making
//! sense rather than discarding the whole frame.
//!
//! Layering is meta -> baseband -> (conditionally) ACL -> (conditionally)
//! LMP. Each layer is attempted only if the one above it parsed and, for
//! ACL/LMP, only if the packet type / LLID says the layer should be there.
//! A missing or malformed layer simply leaves the corresponding field
//! `None` — a summary is always produced from whatever did parse.

pub mod acl;
pub mod baseband;
pub mod lmp;
pub mod lmp_body;
pub mod meta;
pub mod tables;

use crate::cursor::Cursor;

use acl::{AclHeader, Llid};
use baseband::BasebandHeader;
use lmp::LmpPdu;
use meta::EspBredrMeta;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Rx,
    Tx,
}

/// A BT_RX/BT_TX frame, dissected as far as its bytes allow.
#[derive(Clone, Debug)]
pub struct DissectedFrame {
    pub direction: Direction,
    pub meta: Option<EspBredrMeta>,
    pub baseband: Option<BasebandHeader>,
    pub acl: Option<AclHeader>,
    pub lmp: Option<LmpPdu>,
    /// Bytes following an ACL header whose LLID is an L2CAP fragment, not
    /// LMP. Full L2CAP dissection is out of scope; the fragment is kept
    /// opaque for the capture sinks to carry downstream.
    pub l2cap_payload: Option<Vec<u8>>,
    pub summary: String,
}

/// Dissects one sniffed over-the-air frame. Never fails — a frame that
/// doesn't parse at all still comes back with every optional field `None`
/// and a summary describing the failure, per the "always produce a
/// summary" error policy.
pub fn dissect(direction: Direction, data: &[u8]) -> DissectedFrame {
    let mut cursor = Cursor::new(data);

    let meta = EspBredrMeta::parse(&mut cursor).ok();
    let baseband = meta.and_then(|_| BasebandHeader::parse(&mut cursor).ok());

    let acl = baseband
        .filter(|b| b.packet_type.has_acl_header())
        .and_then(|_| AclHeader::parse(&mut cursor).ok());

    let lmp = acl
        .filter(|a| a.llid == Llid::Lmp)
        .and_then(|_| LmpPdu::parse(&mut cursor).ok());

    let l2cap_payload = acl
        .filter(|a| a.llid != Llid::Lmp)
        .map(|_| cursor.remaining().to_vec());

    let summary = summarize(&meta, &baseband, &acl, &lmp, &l2cap_payload, data.len());

    DissectedFrame { direction, meta, baseband, acl, lmp, l2cap_payload, summary }
}

fn summarize(
    meta: &Option<EspBredrMeta>,
    baseband: &Option<BasebandHeader>,
    acl: &Option<AclHeader>,
    lmp: &Option<LmpPdu>,
    l2cap_payload: &Option<Vec<u8>>,
    frame_len: usize,
) -> String {
    if let Some(pdu) = lmp {
        return pdu.summary();
    }
    if let (Some(acl), Some(payload)) = (acl, l2cap_payload) {
        return format!("L2CAP llid={:?} len={}", acl.llid, payload.len());
    }
    if let Some(bb) = baseband {
        return format!("baseband type={:?} lt_addr={}", bb.packet_type, bb.lt_addr);
    }
    if let Some(meta) = meta {
        return format!("channel={} clk={:#010x}", meta.channel, meta.clk);
    }
    format!("malformed frame ({frame_len} bytes)")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lmp_detach_frame() -> Vec<u8> {
        // meta: clk, channel, packed byte (6 bytes)
        let mut buf = vec![0x01, 0x02, 0x03, 0x04, 10, 0b1000_0001];
        // baseband: flow=0, type=Dm1(0x03), lt_addr=0; arqn/seqn/hec=0
        buf.push(0b0_0011_000);
        buf.push(0x00);
        // ACL header: len, flow=0, llid=Lmp(3); dummy byte
        buf.push(0b00000_0_11);
        buf.push(0x00);
        // LMP: opcode=7 (detach), tid=0, error_code=0x13
        buf.push(0b0000111_0);
        buf.push(0x13);
        buf
    }

    #[test]
    fn full_stack_dissects_to_lmp_summary() {
        let buf = lmp_detach_frame();
        let frame = dissect(Direction::Rx, &buf);
        assert!(frame.meta.is_some());
        assert!(frame.baseband.is_some());
        assert!(frame.acl.is_some());
        assert!(frame.lmp.is_some());
        assert_eq!(frame.summary, "LMP detach tid=0 error=remote_user_terminated_connection");
    }

    #[test]
    fn short_frame_degrades_to_malformed_summary() {
        let frame = dissect(Direction::Rx, &[0x01, 0x02]);
        assert!(frame.meta.is_none());
        assert_eq!(frame.summary, "malformed frame (2 bytes)");
    }

    #[test]
    fn non_acl_baseband_type_has_no_acl_or_lmp_layer() {
        // meta (6 bytes) + baseband: type=Poll(0x01), no ACL header follows.
        let mut buf = vec![0x00, 0x00, 0x00, 0x00, 1, 0x00];
        buf.push(0b0_0001_000);
        buf.push(0x00);
        let frame = dissect(Direction::Tx, &buf);
        assert!(frame.baseband.is_some());
        assert!(frame.acl.is_none());
        assert!(frame.lmp.is_none());
        assert!(frame.summary.starts_with("baseband type="));
    }
}
