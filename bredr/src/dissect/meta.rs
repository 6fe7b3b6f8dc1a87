//! ESP32_BREDR meta header: the board's 6-byte per-frame radio metadata
//! (clock, channel, and encryption/role/EDR flags), the first thing
//! dissected in every BT_RX/BT_TX frame. This is the "controller status"
//! header described in prose elsewhere in the wire protocol — clock and
//! channel plus one packed flag byte, not a separate header in its own
//! right.

use crate::cursor::{Cursor, msb_field_u8};
use crate::error::{Result, SnifferError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EspBredrMeta {
    pub clk: u32,
    pub channel: u8,
    pub is_eir: bool,
    pub rx_encrypted: bool,
    pub tx_encrypted: bool,
    pub role: Role,
    pub is_edr: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Master,
    Slave,
}

impl EspBredrMeta {
    pub fn parse(cursor: &mut Cursor) -> Result<Self> {
        let clk = cursor.read_le_u32().ok_or(SnifferError::ShortFrame)?;
        let channel = cursor.read_u8().ok_or(SnifferError::ShortFrame)?;
        let packed = cursor.read_u8().ok_or(SnifferError::ShortFrame)?;

        // packed byte, MSB-first: is_eir:1, rx_enc:1, tx_enc:1, rfu:3, role:1, is_edr:1
        let is_eir = msb_field_u8(packed, 0, 1) != 0;
        let rx_encrypted = msb_field_u8(packed, 1, 1) != 0;
        let tx_encrypted = msb_field_u8(packed, 2, 1) != 0;
        let role = if msb_field_u8(packed, 6, 1) != 0 {
            Role::Slave
        } else {
            Role::Master
        };
        let is_edr = msb_field_u8(packed, 7, 1) != 0;

        Ok(Self {
            clk,
            channel,
            is_eir,
            rx_encrypted,
            tx_encrypted,
            role,
            is_edr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fixed_layout() {
        // clk=0x04030201 LE, channel=39, packed byte: is_eir|is_edr set, role=Master
        let buf = [0x01, 0x02, 0x03, 0x04, 39, 0b1000_0001];
        let mut c = Cursor::new(&buf);
        let meta = EspBredrMeta::parse(&mut c).unwrap();
        assert_eq!(meta.clk, 0x04030201);
        assert_eq!(meta.channel, 39);
        assert!(meta.is_eir);
        assert!(meta.is_edr);
        assert_eq!(meta.role, Role::Master);
        assert!(!meta.rx_encrypted);
        assert!(!meta.tx_encrypted);
    }
}
