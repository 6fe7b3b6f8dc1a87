#![warn(missing_debug_implementations)]
#![warn(missing_copy_implementations)]

//! Host-side core of a Bluetooth BR/EDR (Classic) sniffer that cooperates
//! with USB-attached ESP32 firmware over a custom serial wire protocol.
//!
//! The crate is organized the way the wire data flows: [`serial`] owns the
//! UART device, [`framer`] reassembles the wire protocol's tagged frames
//! from it, [`commands`] drives bringup, [`pty`] and [`bridge`] expose the
//! board's HCI controller to a standard Bluetooth host stack over a
//! pseudo-terminal, [`dissect`] turns sniffed over-the-air frames into
//! structured data, and [`capture`] writes them out to pcap/FIFO sinks.
//! [`orchestrator`] wires all of the above into the running sniffer.

pub mod bridge;
pub mod capture;
pub mod commands;
pub mod config;
pub mod cursor;
pub mod dissect;
pub mod error;
pub mod framer;
pub mod orchestrator;
pub mod pty;
pub mod serial;

pub use config::{BdAddr, ResetMode, Role, SnifferConfig};
pub use error::{Result, SnifferError};
