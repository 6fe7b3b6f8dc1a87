//! LMP PDU header: opcode and transaction ID, plus the extended-opcode
//! escape, carried by every ACL payload whose LLID selects LMP.
//!
//! The header's two bytes (one, or two when the opcode escapes to the
//! extended table) are parsed here; the body layout is delegated to
//! [`super::lmp_body`]. Truncation of any bytes left over after the body is
//! applied exactly once, in this module, rather than by each body parser —
//! several body layouts end before the segment they were handed does, and
//! repeating the discard in every arm of `lmp_body::parse_base`/`parse_ext`
//! would just be the same three lines copied thirty times.

use crate::cursor::{Cursor, msb_field_u8};
use crate::error::Result;

use super::lmp_body::{self, LmpBody};
use super::tables;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LmpHeader {
    pub tid: bool,
    pub opcode: u8,
    pub ext_opcode: Option<u8>,
}

impl LmpHeader {
    /// Opcode 127 escapes to the extended table; every other value is a
    /// base-table opcode read directly from this header's first byte.
    const ESCAPE: u8 = 127;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LmpPdu {
    pub header: LmpHeader,
    pub body: LmpBody,
}

impl LmpPdu {
    /// Parses the LMP header and body from a cursor scoped to exactly this
    /// PDU's bytes. A malformed or short body degrades to
    /// [`LmpBody::Opaque`] holding whatever bytes remained rather than
    /// failing the whole frame; only a missing header is a hard error,
    /// since without it there is nothing to degrade into.
    pub fn parse(cursor: &mut Cursor) -> Result<Self> {
        let header = parse_header(cursor)?;

        let body = match header.ext_opcode {
            Some(ext_opcode) => lmp_body::parse_ext(ext_opcode, cursor),
            None => lmp_body::parse_base(header.opcode, cursor),
        }
        .unwrap_or_else(|_| LmpBody::Opaque(cursor.remaining().to_vec()));

        // Centralized truncation: whatever the body parser left behind is
        // intentionally discarded, once, regardless of opcode.
        let _ = cursor.remaining();

        Ok(Self { header, body })
    }

    /// A one-line human-readable description, using the named opcode/ext
    /// opcode tables where available and falling back to the raw numeric
    /// value otherwise, plus the body's own resolved detail (error code,
    /// version string, or feature-flag names) when the body carries one.
    pub fn summary(&self) -> String {
        let name = match self.header.ext_opcode {
            Some(ext) => tables::ext_opcode_name(ext)
                .map(str::to_string)
                .unwrap_or_else(|| format!("ext_opcode_{ext}")),
            None => tables::base_opcode_name(self.header.opcode)
                .map(str::to_string)
                .unwrap_or_else(|| format!("opcode_{}", self.header.opcode)),
        };
        match self.body.detail() {
            Some(detail) => format!("LMP {name} tid={} {detail}", self.header.tid as u8),
            None => format!("LMP {name} tid={}", self.header.tid as u8),
        }
    }
}

fn parse_header(cursor: &mut Cursor) -> Result<LmpHeader> {
    let b0 = cursor.read_u8().ok_or(crate::error::SnifferError::ShortFrame)?;

    // b0, MSB-first: opcode:7, tid:1
    let opcode = msb_field_u8(b0, 0, 7);
    let tid = msb_field_u8(b0, 7, 1) != 0;

    let ext_opcode = if opcode == LmpHeader::ESCAPE {
        Some(cursor.read_u8().ok_or(crate::error::SnifferError::ShortFrame)?)
    } else {
        None
    };

    Ok(LmpHeader { tid, opcode, ext_opcode })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_opcode_header_has_no_ext_byte() {
        // opcode=37 (version_req), tid=1
        let b0 = 0b0100101_1u8;
        let buf = [b0, 0x08, 0x0F, 0x00, 0x09, 0x61];
        let mut c = Cursor::new(&buf);
        let pdu = LmpPdu::parse(&mut c).unwrap();
        assert_eq!(pdu.header.opcode, 37);
        assert!(pdu.header.tid);
        assert_eq!(pdu.header.ext_opcode, None);
        assert!(matches!(pdu.body, LmpBody::VersionReq { version: 8, .. }));
        assert_eq!(pdu.summary(), "LMP version_req tid=1 version=4.2");
    }

    #[test]
    fn escape_opcode_reads_ext_opcode_byte() {
        // opcode=127 (escape), tid=0, ext_opcode=3 (features_req_ext)
        let b0 = 0b1111111_0u8;
        let mut buf = vec![b0, 0x03, 0x01, 0x02];
        buf.extend_from_slice(&[0; 8]);
        let mut c = Cursor::new(&buf);
        let pdu = LmpPdu::parse(&mut c).unwrap();
        assert_eq!(pdu.header.opcode, 127);
        assert_eq!(pdu.header.ext_opcode, Some(3));
        assert!(matches!(pdu.body, LmpBody::FeaturesReqExt { .. }));
    }

    #[test]
    fn trailing_bytes_are_discarded_once_centrally() {
        // detach body is one byte (error_code); two extra bytes follow and
        // must vanish without producing an error or an Opaque fallback.
        let b0 = 0b0000111_0u8; // opcode=7 (detach), tid=0
        let buf = [b0, 0x13, 0xAA, 0xBB];
        let mut c = Cursor::new(&buf);
        let pdu = LmpPdu::parse(&mut c).unwrap();
        assert_eq!(pdu.body, LmpBody::Detach { error_code: 0x13 });
    }

    #[test]
    fn short_body_degrades_to_opaque() {
        // name_res declares name_len=5 but no fragment bytes follow.
        let b0 = 0b0000010_0u8; // opcode=2 (name_res), tid=0
        let buf = [b0, 0x00, 0x05];
        let mut c = Cursor::new(&buf);
        let pdu = LmpPdu::parse(&mut c).unwrap();
        assert!(matches!(pdu.body, LmpBody::Opaque(_)));
    }
}
