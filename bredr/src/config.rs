//! Runtime configuration for the sniffer core, assembled by a CLI layer and
//! handed to [`crate::orchestrator::run`] by value.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::SnifferError;

/// A 48-bit Bluetooth device address.
///
/// Wire form is the byte-reverse of the colon-hex string form: parsing
/// `"AA:BB:CC:DD:EE:FF"` yields `[0xFF, 0xEE, 0xDD, 0xCC, 0xBB, 0xAA]`, ready
/// to append after the `0x87` set-BD_ADDR opcode.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BdAddr(pub [u8; 6]);

impl BdAddr {
    /// Bytes in wire order (string-order reversed), as sent after `0x87`.
    pub fn wire_bytes(&self) -> [u8; 6] {
        let mut out = self.0;
        out.reverse();
        out
    }
}

impl FromStr for BdAddr {
    type Err = SnifferError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 6 {
            return Err(SnifferError::InvalidBdAddr);
        }
        let mut bytes = [0u8; 6];
        for (i, part) in parts.iter().enumerate() {
            if part.len() != 2 {
                return Err(SnifferError::InvalidBdAddr);
            }
            bytes[i] = u8::from_str_radix(part, 16).map_err(|_| SnifferError::InvalidBdAddr)?;
        }
        Ok(BdAddr(bytes))
    }
}

impl fmt::Display for BdAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl fmt::Debug for BdAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BdAddr({self})")
    }
}

/// Which reset path to take during bringup, mirroring the two reset
/// mechanisms the board firmware supports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResetMode {
    /// Toggle DTR/RTS through the OS serial layer, then wait ~0.8s.
    Hard,
    /// Send `0x86 0x86 0xAA` over the already-open serial link.
    Soft,
    /// Skip reset entirely; assume the board is already in a clean state.
    None,
}

/// Bluetooth link role, determining which side drives the connection and
/// which helper program (if any) gets spawned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Master,
    Slave,
}

#[derive(Clone, Debug)]
pub struct SnifferConfig {
    /// Serial device path, e.g. `/dev/ttyUSB0`.
    pub port: PathBuf,
    /// Baud rate; the board firmware typically runs 921,600 or 4,000,000.
    pub baud: u32,
    /// Local BD_ADDR programmed into the board during bringup.
    pub host_addr: BdAddr,
    /// Remote BD_ADDR, if this sniffer is acting as the connection initiator.
    pub target_addr: Option<BdAddr>,
    pub reset_mode: ResetMode,
    /// Enable the FIFO sink and spawn an external viewer.
    pub live_wireshark: bool,
    /// Print a per-frame summary line to the terminal.
    pub live_terminal: bool,
    /// Do not spawn any external host-stack helper process.
    pub bridge_only: bool,
    /// pcap file output path.
    pub pcap_path: PathBuf,
    /// Path to the helper program's executable, used unless `bridge_only`.
    pub helper_path: Option<PathBuf>,
}

impl SnifferConfig {
    pub fn role(&self) -> Role {
        if self.target_addr.is_some() {
            Role::Master
        } else {
            Role::Slave
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_colon_hex() {
        let addr: BdAddr = "AA:BB:CC:DD:EE:FF".parse().unwrap();
        assert_eq!(addr.0, [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
    }

    #[test]
    fn wire_bytes_are_reversed() {
        let addr: BdAddr = "AA:BB:CC:DD:EE:FF".parse().unwrap();
        assert_eq!(addr.wire_bytes(), [0xFF, 0xEE, 0xDD, 0xCC, 0xBB, 0xAA]);
    }

    #[test]
    fn rejects_malformed_addr() {
        assert!("AA:BB:CC".parse::<BdAddr>().is_err());
        assert!("GG:BB:CC:DD:EE:FF".parse::<BdAddr>().is_err());
    }

    #[test]
    fn is_case_insensitive() {
        let addr: BdAddr = "aa:bb:cc:dd:ee:ff".parse().unwrap();
        assert_eq!(addr.0, [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
    }
}
