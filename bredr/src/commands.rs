//! Controller Commands: short serial writes that configure the board.

use crate::config::BdAddr;
use crate::error::Result;
use crate::serial::{SerialReader, SerialWriter};

pub const OP_ENABLE_LMP_SNIFFING: u8 = 0x81;
pub const OP_SET_BDADDR: u8 = 0x87;
pub const OP_DISABLE_POLL_NULL: u8 = 0x89;
pub const OP_RESET: u8 = 0x86;
pub const OP_VERSION: u8 = 0xEE;
const CONFIG_ACK: u8 = 0xAA;

/// Sends `0xEE` and reads back the ASCII version line. Must be called
/// during bringup; callers should apply the read timeout themselves and
/// surface `FirmwareUnresponsive` on a timed-out read, per §4.E.
pub async fn get_version(writer: &SerialWriter, reader: &mut SerialReader) -> Result<String> {
    writer.write_all(&[OP_VERSION]).await?;
    reader.read_line().await
}

/// `0x81 v` — enable (v=1) or disable (v=0) LMP sniffing. Fire-and-forget.
pub async fn enable_sniffing(writer: &SerialWriter, enable: bool) -> Result<()> {
    writer
        .write_all(&[OP_ENABLE_LMP_SNIFFING, enable as u8])
        .await
}

/// `0x89 v` followed by a 1-byte ack read.
pub async fn disable_poll_null(
    writer: &SerialWriter,
    reader: &mut SerialReader,
    disable: bool,
) -> Result<()> {
    writer
        .write_all(&[OP_DISABLE_POLL_NULL, disable as u8])
        .await?;
    reader.read_u8().await?;
    Ok(())
}

/// `0x87 b0..b5` — sets the local BD_ADDR, byte-reversed from string form.
/// Fire-and-forget.
pub async fn set_bdaddr(writer: &SerialWriter, addr: BdAddr) -> Result<()> {
    let mut bytes = vec![OP_SET_BDADDR];
    bytes.extend_from_slice(&addr.wire_bytes());
    writer.write_all(&bytes).await
}

/// `0x86 0x86 0xAA` — soft reset over the already-open serial link.
/// Fire-and-forget.
pub async fn soft_reset(writer: &SerialWriter) -> Result<()> {
    writer.write_all(&[OP_RESET, OP_RESET, CONFIG_ACK]).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_bdaddr_wire_order_matches_spec_example() {
        // S2: host AA:BB:CC:DD:EE:FF -> 87 FF EE DD CC BB AA
        let addr: BdAddr = "AA:BB:CC:DD:EE:FF".parse().unwrap();
        let mut bytes = vec![OP_SET_BDADDR];
        bytes.extend_from_slice(&addr.wire_bytes());
        assert_eq!(bytes, vec![0x87, 0xFF, 0xEE, 0xDD, 0xCC, 0xBB, 0xAA]);
    }

    #[test]
    fn soft_reset_opcode_sequence() {
        assert_eq!([OP_RESET, OP_RESET, CONFIG_ACK], [0x86, 0x86, 0xAA]);
    }
}
