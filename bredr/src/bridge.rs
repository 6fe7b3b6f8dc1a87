//! HCI Bridge: two transparent byte pipes between the PTY master and the
//! UART, neither of which interprets HCI semantics at this layer.

use tracing::trace;

use crate::error::Result;
use crate::framer::WireFrame;
use crate::pty::PtyMaster;
use crate::serial::SerialWriter;

const COPY_CHUNK: usize = 1024;

/// Thread **B**: host→controller path. Reads bytes from the PTY master as
/// the host stack writes its own H4-framed commands/data, and writes them
/// to the UART unmodified, one chunk at a time, in the order received.
/// Returns when the PTY master read fails (the PTY was torn down).
pub async fn pty_to_uart_loop(mut pty_read: PtyMaster, uart: SerialWriter) -> Result<()> {
    let mut buf = [0u8; COPY_CHUNK];
    loop {
        let n = pty_read.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        trace!(n, "pty->uart");
        uart.write_all(&buf[..n]).await?;
    }
}

/// Controller→host path, called by the rx-loop for every HCI-shaped frame
/// the wire framer produces. Reassembles `tag || header || payload` exactly
/// as it arrived and writes it to the PTY master so the host stack sees an
/// ordinary H4 UART byte stream. Frames with no H4 representation (BT_RX,
/// BT_TX, Log) are silently ignored — they are routed to the dissector and
/// capture pipeline instead, never to the bridge.
pub async fn steer_to_pty(pty_write: &mut PtyMaster, frame: &WireFrame) -> Result<()> {
    if let Some(bytes) = frame.h4_bytes() {
        trace!(len = bytes.len(), "uart->pty");
        pty_write.write_all(&bytes).await?;
    }
    Ok(())
}
