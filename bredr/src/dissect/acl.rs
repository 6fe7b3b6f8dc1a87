//! BT_ACL_Hdr: the 2-byte ACL header that follows a baseband header whose
//! type carries one (DM1, DH1/2-DH1, DV/3-DH1).

use crate::cursor::{Cursor, msb_field_u8};
use crate::error::{Result, SnifferError};

/// Logical Link Identifier — the authoritative successor selector, per the
/// dissector's open question resolution: baseband `type` only predicts
/// whether an ACL header is present, LLID decides what follows it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Llid {
    Undefined,
    L2capContinuation,
    L2capStartOrNoFrag,
    Lmp,
}

impl Llid {
    fn from_bits(v: u8) -> Self {
        match v {
            0 => Llid::Undefined,
            1 => Llid::L2capContinuation,
            2 => Llid::L2capStartOrNoFrag,
            3 => Llid::Lmp,
            _ => unreachable!("2-bit field"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AclHeader {
    pub len: u8,
    pub flow: bool,
    pub llid: Llid,
    pub dummy: u8,
}

impl AclHeader {
    pub fn parse(cursor: &mut Cursor) -> Result<Self> {
        let b0 = cursor.read_u8().ok_or(SnifferError::ShortFrame)?;
        let dummy = cursor.read_u8().ok_or(SnifferError::ShortFrame)?;

        // b0, MSB-first: len:5, flow:1, llid:2
        let len = msb_field_u8(b0, 0, 5);
        let flow = msb_field_u8(b0, 5, 1) != 0;
        let llid = Llid::from_bits(msb_field_u8(b0, 6, 2));

        Ok(Self {
            len,
            flow,
            llid,
            dummy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn llid_selects_lmp() {
        // len=5 (0b00101), flow=1, llid=3 (Lmp), MSB-first
        let b0 = 0b00101_1_11u8;
        let buf = [b0, 0x00];
        let mut c = Cursor::new(&buf);
        let hdr = AclHeader::parse(&mut c).unwrap();
        assert_eq!(hdr.len, 5);
        assert!(hdr.flow);
        assert_eq!(hdr.llid, Llid::Lmp);
    }

    #[test]
    fn llid_selects_l2cap() {
        let b0 = 0b00000_0_10u8;
        let buf = [b0, 0x00];
        let mut c = Cursor::new(&buf);
        let hdr = AclHeader::parse(&mut c).unwrap();
        assert_eq!(hdr.llid, Llid::L2capStartOrNoFrag);
    }
}
