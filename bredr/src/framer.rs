//! Wire Framer: parses one frame at a time from the serial byte stream.
//!
//! The protocol is strictly length-prefixed per tag, so the framer holds no
//! state across frames — a checksum failure or a malformed length is fully
//! consumed before being reported, and the next read starts cleanly at the
//! following tag byte.

use tracing::{trace, warn};

use crate::error::{Result, SnifferError};
use crate::serial::SerialReader;

pub const TAG_H4_CMD: u8 = 0x01;
pub const TAG_H4_ACL: u8 = 0x02;
pub const TAG_H4_EVT: u8 = 0x04;
pub const TAG_BT_RX: u8 = 0xA7;
pub const TAG_BT_TX: u8 = 0xBB;
pub const TAG_LOG: u8 = 0x7F;
pub const TAG_CHECKSUM_ERROR: u8 = 0xA8;
pub const TAG_CONFIG_AUTO_EMPTY_PDU: u8 = 0xA9;
pub const TAG_CONFIG_ACK: u8 = 0xAA;
pub const TAG_CONFIG_LOG_TX: u8 = 0xCC;

/// One frame reassembled from the wire protocol.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WireFrame {
    /// An H4 HCI event frame, destined for the PTY master.
    HciEvt { opcode: u8, payload: Vec<u8> },
    /// An H4 HCI ACL data frame, destined for the PTY master.
    HciAcl { handle: u16, payload: Vec<u8> },
    /// An H4 HCI command frame (unexpected from the board, but framed the
    /// same way the host would send one).
    HciCmd { opcode: u16, payload: Vec<u8> },
    /// A sniffed over-the-air frame received by the board.
    BtRx { data: Vec<u8> },
    /// A sniffed over-the-air frame transmitted by the board.
    BtTx { data: Vec<u8> },
    /// A diagnostic text line; consumed but not dissected.
    Log(String),
}

impl WireFrame {
    /// Reassembles `tag || header || payload` exactly as it arrived on the
    /// wire, for HCI variants only — this is what the HCI bridge forwards
    /// to the PTY master unmodified.
    pub fn h4_bytes(&self) -> Option<Vec<u8>> {
        match self {
            WireFrame::HciEvt { opcode, payload } => {
                let mut out = Vec::with_capacity(3 + payload.len());
                out.push(TAG_H4_EVT);
                out.push(*opcode);
                out.push(payload.len() as u8);
                out.extend_from_slice(payload);
                Some(out)
            }
            WireFrame::HciAcl { handle, payload } => {
                let mut out = Vec::with_capacity(5 + payload.len());
                out.push(TAG_H4_ACL);
                out.extend_from_slice(&handle.to_le_bytes());
                out.extend_from_slice(&(payload.len() as u16).to_le_bytes());
                out.extend_from_slice(payload);
                Some(out)
            }
            WireFrame::HciCmd { opcode, payload } => {
                let mut out = Vec::with_capacity(4 + payload.len());
                out.push(TAG_H4_CMD);
                out.extend_from_slice(&opcode.to_le_bytes());
                out.push(payload.len() as u8);
                out.extend_from_slice(payload);
                Some(out)
            }
            WireFrame::BtRx { .. } | WireFrame::BtTx { .. } | WireFrame::Log(_) => None,
        }
    }
}

/// Reads one frame from `serial`, looping past silently-consumed
/// acknowledgement tags and dropped (checksum-failed) BT frames. Returns
/// `Ok(None)` only if a frame was entirely consumed but produced nothing
/// dispatchable (e.g. a checksum failure, which is logged and swallowed
/// here rather than returned as an error — see [`SnifferError::is_recoverable`]).
pub async fn read_frame(serial: &mut SerialReader) -> Result<Option<WireFrame>> {
    loop {
        let tag = serial.read_u8().await?;
        match tag {
            TAG_H4_EVT => {
                let opcode = serial.read_u8().await?;
                let length = serial.read_u8().await?;
                let payload = read_payload(serial, length as usize).await?;
                return Ok(Some(WireFrame::HciEvt { opcode, payload }));
            }
            TAG_H4_ACL => {
                let handle = read_le_u16(serial).await?;
                let length = read_le_u16(serial).await?;
                let payload = read_payload(serial, length as usize).await?;
                return Ok(Some(WireFrame::HciAcl { handle, payload }));
            }
            TAG_H4_CMD => {
                let opcode = read_le_u16(serial).await?;
                let length = serial.read_u8().await?;
                let payload = read_payload(serial, length as usize).await?;
                return Ok(Some(WireFrame::HciCmd { opcode, payload }));
            }
            TAG_BT_RX | TAG_BT_TX => {
                let size = read_le_u16(serial).await?;
                let data = read_payload(serial, size as usize).await?;
                let checksum = serial.read_u8().await?;
                let sum = data.iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
                if sum != checksum {
                    warn!(
                        expected = checksum,
                        computed = sum,
                        "BT_RX/BT_TX checksum mismatch, dropping frame"
                    );
                    continue;
                }
                return Ok(Some(if tag == TAG_BT_RX {
                    WireFrame::BtRx { data }
                } else {
                    WireFrame::BtTx { data }
                }));
            }
            TAG_LOG => {
                let line = serial.read_line().await?;
                trace!(%line, "board log line");
                return Ok(Some(WireFrame::Log(line)));
            }
            TAG_CHECKSUM_ERROR | TAG_CONFIG_AUTO_EMPTY_PDU | TAG_CONFIG_ACK
            | TAG_CONFIG_LOG_TX => {
                // Acknowledgements; no body follows.
                continue;
            }
            other => {
                warn!(tag = format!("{other:#04x}"), "unknown wire protocol tag");
                return Err(SnifferError::UnknownTag(other));
            }
        }
    }
}

async fn read_le_u16(serial: &mut SerialReader) -> Result<u16> {
    let mut buf = [0u8; 2];
    serial.read_exact(&mut buf).await?;
    Ok(u16::from_le_bytes(buf))
}

async fn read_payload(serial: &mut SerialReader, len: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    serial.read_exact(&mut buf).await?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checksum(data: &[u8]) -> u8 {
        data.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
    }

    #[test]
    fn bt_rx_checksum_matches_spec_example() {
        // S3: A7 03 00 01 02 03 06
        let data = [0x01u8, 0x02, 0x03];
        assert_eq!(checksum(&data), 0x06);
    }

    #[test]
    fn bt_rx_checksum_fail_example() {
        // S4: A7 03 00 01 02 03 07 -- declared checksum does not match.
        let data = [0x01u8, 0x02, 0x03];
        assert_ne!(checksum(&data), 0x07);
    }

    #[test]
    fn hci_evt_roundtrips_to_h4_bytes() {
        let frame = WireFrame::HciEvt {
            opcode: 0x0C,
            payload: vec![0x01, 0x10, 0x00, 0x04],
        };
        assert_eq!(
            frame.h4_bytes().unwrap(),
            vec![TAG_H4_EVT, 0x0C, 0x04, 0x01, 0x10, 0x00, 0x04]
        );
    }

    #[test]
    fn bt_frames_have_no_h4_representation() {
        assert!(WireFrame::BtRx { data: vec![] }.h4_bytes().is_none());
        assert!(WireFrame::BtTx { data: vec![] }.h4_bytes().is_none());
    }
}
