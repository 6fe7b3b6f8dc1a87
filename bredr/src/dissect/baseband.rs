//! BT_Baseband: the 3-byte over-the-air baseband header.

use crate::cursor::{Cursor, msb_field_u8};
use crate::error::{Result, SnifferError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PacketType {
    Null,
    Poll,
    Fhs,
    /// DM1 (type 0x03)
    Dm1,
    /// DH1/2-DH1 (type 0x04)
    Dh1Or2Dh1,
    /// DV/3-DH1 (type 0x08)
    DvOr3Dh1,
    Other(u8),
}

impl PacketType {
    fn from_bits(v: u8) -> Self {
        match v {
            0x00 => PacketType::Null,
            0x01 => PacketType::Poll,
            0x02 => PacketType::Fhs,
            0x03 => PacketType::Dm1,
            0x04 => PacketType::Dh1Or2Dh1,
            0x08 => PacketType::DvOr3Dh1,
            other => PacketType::Other(other),
        }
    }

    /// True if this baseband type carries an ACL header, per the binding
    /// table (`bind_layers(BT_Baseband, BT_ACL_Hdr, type=...)`). DM1 is
    /// included even though real DM1 frames may carry LMP directly at the
    /// link level — the ACL header's LLID field is the true downstream
    /// selector, not the baseband type; see the dissector module docs.
    pub fn has_acl_header(self) -> bool {
        matches!(
            self,
            PacketType::Dm1 | PacketType::Dh1Or2Dh1 | PacketType::DvOr3Dh1
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BasebandHeader {
    pub flow: bool,
    pub packet_type: PacketType,
    pub lt_addr: u8,
    pub arqn: bool,
    pub seqn: bool,
    pub hec: u8,
}

impl BasebandHeader {
    pub fn parse(cursor: &mut Cursor) -> Result<Self> {
        let b0 = cursor.read_u8().ok_or(SnifferError::ShortFrame)?;
        let b1 = cursor.read_u8().ok_or(SnifferError::ShortFrame)?;

        // b0, MSB-first: flow:1, type:4, lt_addr:3
        let flow = msb_field_u8(b0, 0, 1) != 0;
        let packet_type = PacketType::from_bits(msb_field_u8(b0, 1, 4));
        let lt_addr = msb_field_u8(b0, 5, 3);

        // b1, MSB-first: arqn:1, seqn:1, hec:6
        let arqn = msb_field_u8(b1, 0, 1) != 0;
        let seqn = msb_field_u8(b1, 1, 1) != 0;
        let hec = msb_field_u8(b1, 2, 6);

        Ok(Self {
            flow,
            packet_type,
            lt_addr,
            arqn,
            seqn,
            hec,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acl_carrying_types_per_spec_property_7() {
        assert!(PacketType::Dm1.has_acl_header());
        assert!(PacketType::Dh1Or2Dh1.has_acl_header());
        assert!(PacketType::DvOr3Dh1.has_acl_header());
        assert!(!PacketType::Null.has_acl_header());
        assert!(!PacketType::Poll.has_acl_header());
        assert!(!PacketType::Fhs.has_acl_header());
    }

    #[test]
    fn parses_packed_header() {
        // flow=1, type=0x04 (Dh1Or2Dh1), lt_addr=0b101, MSB-first
        let b0 = 0b1_0100_101u8;
        let b1 = 0u8;
        let buf = [b0, b1];
        let mut c = Cursor::new(&buf);
        let hdr = BasebandHeader::parse(&mut c).unwrap();
        assert!(hdr.flow);
        assert_eq!(hdr.packet_type, PacketType::Dh1Or2Dh1);
        assert_eq!(hdr.lt_addr, 0b101);
    }
}
