//! Capture Pipeline: wraps a dissected frame in the record format Wireshark
//! expects and fans it out to whichever sinks are configured.
//!
//! Record format is `HCI_PHDR{direction} || HCI_Hdr{type=9} || data`: a
//! 4-byte big-endian direction field (the same shape as the well-known
//! `DLT_BLUETOOTH_HCI_H4_WITH_PHDR` pseudo-header) followed by a 1-byte HCI
//! packet-type indicator fixed at the vendor value `9` (ESP32-BREDR meta),
//! followed by the frame's raw over-the-air bytes. Each record is carried
//! as the packet data of a pcap-ng Enhanced Packet Block, per §4.G/§6's
//! pcap-ng requirement — a Section Header Block and one Interface
//! Description Block (link type `DLT_BLUETOOTH_HCI_H4_WITH_PHDR`) are
//! written once per sink before any packet block.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::{error, info, warn};

use crate::dissect::Direction;
use crate::error::Result;

pub const DEFAULT_FIFO_PATH: &str = "/tmp/fifocap.fifo";

const LINKTYPE_BLUETOOTH_HCI_H4_WITH_PHDR: u16 = 201;
const HCI_PACKET_TYPE_ESP32_BREDR_META: u8 = 9;

const BLOCK_TYPE_SECTION_HEADER: u32 = 0x0A0D0D0A;
const BLOCK_TYPE_INTERFACE_DESCRIPTION: u32 = 0x00000001;
const BLOCK_TYPE_ENHANCED_PACKET: u32 = 0x00000006;
const BYTE_ORDER_MAGIC: u32 = 0x1A2B3C4D;

macro_rules! le_vec {
    ( $( $x:expr ),* ) => {
        Vec::<u8>::new().into_iter()
        $( .chain($x.to_le_bytes()) )*
        .collect::<Vec<u8>>()
    };
}

/// Builds one capture record: pseudo-header + HCI header + raw frame bytes.
pub fn build_record(direction: Direction, data: &[u8]) -> Vec<u8> {
    let direction_field: u32 = match direction {
        Direction::Rx => 1,
        Direction::Tx => 0,
    };
    let header: Vec<u8> = {
        let mut h = direction_field.to_be_bytes().to_vec();
        h.push(HCI_PACKET_TYPE_ESP32_BREDR_META);
        h
    };
    let mut record = Vec::with_capacity(header.len() + data.len());
    record.extend_from_slice(&header);
    record.extend_from_slice(data);
    record
}

fn now_since_epoch() -> Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
}

/// Wraps a block body in its Type/Length...Length framing, padding the body
/// to a 4-byte boundary as pcap-ng requires (`Block Total Length` appears
/// both before and after the body, which is how a reader can walk the file
/// backwards as well as forwards).
fn pcapng_block(block_type: u32, body: &[u8]) -> Vec<u8> {
    let pad = (4 - body.len() % 4) % 4;
    let total_len = (12 + body.len() + pad) as u32;
    let mut out = Vec::with_capacity(total_len as usize);
    out.extend_from_slice(&block_type.to_le_bytes());
    out.extend_from_slice(&total_len.to_le_bytes());
    out.extend_from_slice(body);
    out.extend(std::iter::repeat_n(0u8, pad));
    out.extend_from_slice(&total_len.to_le_bytes());
    out
}

/// Section Header Block: one per file/FIFO, written before anything else.
fn pcapng_section_header() -> Vec<u8> {
    let body = le_vec![BYTE_ORDER_MAGIC, 1u16, 0u16, -1i64];
    pcapng_block(BLOCK_TYPE_SECTION_HEADER, &body)
}

/// Interface Description Block: declares the link type for interface 0,
/// the only interface this sniffer ever records packets for.
fn pcapng_interface_description() -> Vec<u8> {
    let body = le_vec![LINKTYPE_BLUETOOTH_HCI_H4_WITH_PHDR, 0u16, 0u32];
    pcapng_block(BLOCK_TYPE_INTERFACE_DESCRIPTION, &body)
}

/// Enhanced Packet Block carrying one capture record at microsecond
/// resolution (the pcap-ng default `if_tsresol`, left undeclared).
fn pcapng_enhanced_packet(timestamp: Duration, record: &[u8]) -> Vec<u8> {
    let ts = timestamp.as_micros() as u64;
    let mut body = le_vec![
        0u32,
        (ts >> 32) as u32,
        (ts & 0xFFFF_FFFF) as u32,
        record.len() as u32,
        record.len() as u32
    ];
    body.extend_from_slice(record);
    pcapng_block(BLOCK_TYPE_ENHANCED_PACKET, &body)
}

/// Writes the Section Header Block and one Interface Description Block, the
/// fixed preamble every pcap-ng sink needs before its first packet block.
fn write_pcapng_preamble(file: &mut File) -> std::io::Result<()> {
    file.write_all(&pcapng_section_header())?;
    file.write_all(&pcapng_interface_description())
}

/// A single capture sink. Implementations MUST be fail-soft: a write
/// failure is reported once via `Err` so the orchestrator can log and
/// disable the sink, per §7's `SinkWriteError` policy — subsequent frames
/// are simply not offered to a disabled sink again.
pub trait CaptureSink: std::fmt::Debug + Send {
    fn write_record(&mut self, direction: Direction, data: &[u8]) -> Result<()>;
}

/// pcap-ng file sink, widened to group/other read on POSIX so an operator
/// without elevated privileges can `tail`/copy it off-box.
#[derive(Debug)]
pub struct PcapFileSink {
    file: File,
}

impl PcapFileSink {
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let mut file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(path)
            .map_err(crate::error::SnifferError::DeviceUnavailable)?;
        write_pcapng_preamble(&mut file).map_err(crate::error::SnifferError::DeviceUnavailable)?;
        widen_permissions(path);
        info!(?path, "pcap-ng file sink opened");
        Ok(Self { file })
    }
}

impl CaptureSink for PcapFileSink {
    fn write_record(&mut self, direction: Direction, data: &[u8]) -> Result<()> {
        let record = build_record(direction, data);
        let block = pcapng_enhanced_packet(now_since_epoch(), &record);
        self.file
            .write_all(&block)
            .and_then(|_| self.file.flush())
            .map_err(crate::error::SnifferError::DeviceUnavailable)
    }
}

#[cfg(unix)]
fn widen_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    match std::fs::metadata(path) {
        Ok(meta) => {
            let mut perms = meta.permissions();
            perms.set_mode(0o666);
            if let Err(e) = std::fs::set_permissions(path, perms) {
                warn!(?path, error = %e, "failed to widen pcap file permissions");
            }
        }
        Err(e) => warn!(?path, error = %e, "failed to stat pcap file for permission widening"),
    }
}

#[cfg(not(unix))]
fn widen_permissions(_path: &Path) {}

/// FIFO (named pipe) sink for a live Wireshark viewer. The pipe is
/// unlinked and recreated fresh on every construction so a stale reader
/// from a previous run can never wedge the new one, per §5's resource
/// discipline note.
#[derive(Debug)]
pub struct FifoSink {
    file: File,
    wrote_header: bool,
}

impl FifoSink {
    pub fn create(path: &Path) -> Result<Self> {
        match std::fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(?path, error = %e, "failed to remove stale FIFO"),
        }
        #[cfg(unix)]
        {
            use nix::sys::stat::Mode;
            nix::unistd::mkfifo(path, Mode::from_bits_truncate(0o666))
                .map_err(crate::error::SnifferError::PtyUnavailable)?;
        }
        let file = OpenOptions::new()
            .write(true)
            .open(path)
            .map_err(crate::error::SnifferError::DeviceUnavailable)?;
        info!(?path, "FIFO sink opened, waiting for a viewer");
        Ok(Self { file, wrote_header: false })
    }
}

impl CaptureSink for FifoSink {
    fn write_record(&mut self, direction: Direction, data: &[u8]) -> Result<()> {
        if !self.wrote_header {
            write_pcapng_preamble(&mut self.file)
                .map_err(crate::error::SnifferError::DeviceUnavailable)?;
            self.wrote_header = true;
        }
        let record = build_record(direction, data);
        let block = pcapng_enhanced_packet(now_since_epoch(), &record);
        self.file
            .write_all(&block)
            .and_then(|_| self.file.flush())
            .map_err(crate::error::SnifferError::DeviceUnavailable)
    }
}

/// Fans a frame out to every still-enabled sink. A sink whose write fails
/// is logged and dropped from the list — one bad sink never stops another
/// or the RX loop, per §7.
#[derive(Debug, Default)]
pub struct CapturePipeline {
    sinks: Vec<Box<dyn CaptureSink>>,
}

impl CapturePipeline {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn add_sink(&mut self, sink: Box<dyn CaptureSink>) {
        self.sinks.push(sink);
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn dispatch(&mut self, direction: Direction, data: &[u8]) {
        let mut failed = Vec::new();
        for (i, sink) in self.sinks.iter_mut().enumerate() {
            if let Err(e) = sink.write_record(direction, data) {
                error!(sink = i, error = %e, "capture sink write failed, disabling it");
                failed.push(i);
            }
        }
        for i in failed.into_iter().rev() {
            self.sinks.remove(i);
        }
    }
}

pub fn default_pcap_path() -> PathBuf {
    PathBuf::from("logs/capture.pcap")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_layout_matches_direction_and_type() {
        let rx = build_record(Direction::Rx, &[0xAA, 0xBB]);
        assert_eq!(rx, vec![0, 0, 0, 1, HCI_PACKET_TYPE_ESP32_BREDR_META, 0xAA, 0xBB]);

        let tx = build_record(Direction::Tx, &[0xCC]);
        assert_eq!(tx, vec![0, 0, 0, 0, HCI_PACKET_TYPE_ESP32_BREDR_META, 0xCC]);
    }

    #[test]
    fn section_header_has_block_type_and_byte_order_magic() {
        let shb = pcapng_section_header();
        assert_eq!(&shb[0..4], &BLOCK_TYPE_SECTION_HEADER.to_le_bytes());
        assert_eq!(&shb[8..12], &BYTE_ORDER_MAGIC.to_le_bytes());
        // Block Total Length is repeated at the start and end of the block.
        assert_eq!(&shb[0..4].len(), &4);
        assert_eq!(&shb[4..8], &shb[shb.len() - 4..]);
    }

    #[test]
    fn interface_description_declares_the_link_type() {
        let idb = pcapng_interface_description();
        assert_eq!(&idb[0..4], &BLOCK_TYPE_INTERFACE_DESCRIPTION.to_le_bytes());
        assert_eq!(&idb[8..10], &LINKTYPE_BLUETOOTH_HCI_H4_WITH_PHDR.to_le_bytes());
    }

    #[test]
    fn enhanced_packet_block_carries_the_record_bytes_and_lengths() {
        let record = build_record(Direction::Rx, &[0xAA, 0xBB, 0xCC]);
        let epb = pcapng_enhanced_packet(Duration::from_micros(42), &record);
        assert_eq!(&epb[0..4], &BLOCK_TYPE_ENHANCED_PACKET.to_le_bytes());
        // captured len and original len both equal record.len(), packed at offsets 20/24.
        assert_eq!(&epb[20..24], &(record.len() as u32).to_le_bytes());
        assert_eq!(&epb[24..28], &(record.len() as u32).to_le_bytes());
        assert!(epb.windows(record.len()).any(|w| w == record.as_slice()));
        // Total block length is a multiple of 4 even though the 6-byte
        // record above is not.
        assert_eq!(epb.len() % 4, 0);
    }

    #[derive(Debug, Default)]
    struct FailingSink;
    impl CaptureSink for FailingSink {
        fn write_record(&mut self, _direction: Direction, _data: &[u8]) -> Result<()> {
            Err(crate::error::SnifferError::SinkWriteError)
        }
    }

    #[test]
    fn a_failing_sink_is_disabled_without_affecting_others() {
        #[derive(Debug, Default)]
        struct CountingSink(u32);
        impl CaptureSink for CountingSink {
            fn write_record(&mut self, _direction: Direction, _data: &[u8]) -> Result<()> {
                self.0 += 1;
                Ok(())
            }
        }

        let mut pipeline = CapturePipeline::new();
        pipeline.add_sink(Box::new(FailingSink));
        pipeline.add_sink(Box::new(CountingSink(0)));

        pipeline.dispatch(Direction::Rx, &[0x01]);
        assert_eq!(pipeline.sinks.len(), 1);
        pipeline.dispatch(Direction::Rx, &[0x02]);
        assert_eq!(pipeline.sinks.len(), 1);
    }
}
