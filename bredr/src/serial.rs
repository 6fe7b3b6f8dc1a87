//! Serial Line I/O: opens and configures the UART to the board.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{self, AsyncReadExt, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::Mutex;
use tokio_serial::{SerialPort, SerialPortBuilderExt};
use tracing::{debug, warn};

use crate::error::{Result, SnifferError};

const READ_TIMEOUT: Duration = Duration::from_secs(1);

/// An open, configured connection to the board's UART.
///
/// No hardware or software flow control; a 1-second read timeout lets
/// callers observe shutdown without blocking forever on a quiet line.
#[derive(Debug)]
pub struct SerialLine {
    port: tokio_serial::SerialStream,
}

impl SerialLine {
    /// Opens `path` at `baud`, no flow control, 1s read timeout.
    ///
    /// Applies a platform low-latency hint on POSIX if available; failure
    /// to do so is logged and otherwise ignored, per §4.A.
    pub fn open(path: &Path, baud: u32) -> Result<Self> {
        let port = tokio_serial::new(path.to_string_lossy().to_string(), baud)
            .timeout(READ_TIMEOUT)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| SnifferError::DeviceUnavailable(e.into()))?;

        apply_low_latency_hint(path);

        Ok(Self { port })
    }

    /// Reads exactly `n` bytes, blocking (cooperatively) until they arrive
    /// or the read timeout elapses.
    pub async fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.port
            .read_exact(buf)
            .await
            .map_err(SnifferError::DeviceUnavailable)
    }

    pub async fn read_u8(&mut self) -> Result<u8> {
        let mut b = [0u8; 1];
        self.read_exact(&mut b).await?;
        Ok(b[0])
    }

    /// Reads a single ASCII line terminated by `\n`, used by the firmware
    /// version probe.
    pub async fn read_line(&mut self) -> Result<String> {
        let mut line = Vec::new();
        loop {
            let b = self.read_u8().await?;
            if b == b'\n' {
                break;
            }
            line.push(b);
        }
        String::from_utf8(line).map_err(|_| SnifferError::MalformedField)
    }

    pub async fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        self.port
            .write_all(buf)
            .await
            .map_err(SnifferError::DeviceUnavailable)
    }

    /// Toggles DTR/RTS low then high with a short settle delay, the board's
    /// hard reset path. Per §4.H step 2 / the supplemented reset detail,
    /// this is a full ~0.8s sequence: the caller need not sleep afterward.
    pub async fn hard_reset(&mut self) -> Result<()> {
        self.port
            .write_data_terminal_ready(false)
            .map_err(|e| SnifferError::DeviceUnavailable(e.into()))?;
        self.port
            .write_request_to_send(false)
            .map_err(|e| SnifferError::DeviceUnavailable(e.into()))?;
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.port
            .write_data_terminal_ready(true)
            .map_err(|e| SnifferError::DeviceUnavailable(e.into()))?;
        self.port
            .write_request_to_send(true)
            .map_err(|e| SnifferError::DeviceUnavailable(e.into()))?;
        tokio::time::sleep(Duration::from_millis(750)).await;
        Ok(())
    }

    /// Splits the full-duplex port into an owned read half (for the rx-loop,
    /// which is the exclusive reader) and a write half shared behind a
    /// mutex (written by the rx-loop during bringup and by the bridge loop
    /// continuously during steady state; see the concurrency model).
    pub fn split(self) -> (SerialReader, SerialWriter) {
        let (read_half, write_half) = io::split(self.port);
        (SerialReader { inner: read_half }, SerialWriter {
            inner: Arc::new(Mutex::new(write_half)),
        })
    }
}

#[derive(Debug)]
pub struct SerialReader {
    inner: ReadHalf<tokio_serial::SerialStream>,
}

impl SerialReader {
    pub async fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.inner
            .read_exact(buf)
            .await
            .map_err(SnifferError::DeviceUnavailable)?;
        Ok(())
    }

    pub async fn read_u8(&mut self) -> Result<u8> {
        let mut b = [0u8; 1];
        self.read_exact(&mut b).await?;
        Ok(b[0])
    }

    pub async fn read_line(&mut self) -> Result<String> {
        let mut line = Vec::new();
        loop {
            let b = self.read_u8().await?;
            if b == b'\n' {
                break;
            }
            line.push(b);
        }
        String::from_utf8(line).map_err(|_| SnifferError::MalformedField)
    }
}

/// A cloneable handle to the UART write half, serialized by an internal
/// mutex so the bringup-time command writer and the steady-state bridge
/// loop can never interleave a partial write.
#[derive(Debug, Clone)]
pub struct SerialWriter {
    inner: Arc<Mutex<WriteHalf<tokio_serial::SerialStream>>>,
}

impl SerialWriter {
    pub async fn write_all(&self, buf: &[u8]) -> Result<()> {
        let mut guard = self.inner.lock().await;
        guard
            .write_all(buf)
            .await
            .map_err(SnifferError::DeviceUnavailable)
    }
}

#[cfg(unix)]
fn apply_low_latency_hint(path: &Path) {
    use std::process::Command;
    let status = Command::new("setserial")
        .arg(path)
        .arg("low_latency")
        .status();
    match status {
        Ok(s) if s.success() => debug!(?path, "applied low_latency hint"),
        Ok(s) => warn!(?path, code = ?s.code(), "setserial low_latency exited non-zero"),
        Err(e) => warn!(?path, error = %e, "setserial not available, skipping low_latency hint"),
    }
}

#[cfg(not(unix))]
fn apply_low_latency_hint(_path: &Path) {}
