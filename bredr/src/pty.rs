//! Pseudo-TTY Endpoint: the virtual HCI UART a host Bluetooth stack opens.

use std::os::fd::{AsRawFd, OwnedFd};
use std::path::PathBuf;

use nix::fcntl::{FcntlArg, OFlag, fcntl};
use nix::pty::openpty;
use nix::sys::termios::{self, SetArg};
use tokio::io::unix::AsyncFd;
use tracing::info;

use crate::error::{Result, SnifferError};

/// An allocated PTY pair. `slave_path` is what a host stack opens as its
/// UART device; `master` is what the HCI bridge reads/writes.
#[derive(Debug)]
pub struct PtyPair {
    master: OwnedFd,
    slave_path: PathBuf,
    // Keeping the slave fd open for the process lifetime prevents the
    // kernel from reclaiming the slave side before a consumer opens it.
    _slave: OwnedFd,
}

impl PtyPair {
    /// Allocates a PTY pair and puts both ends in raw mode (no line
    /// discipline, no echo).
    pub fn open() -> Result<Self> {
        let pty = openpty(None, None).map_err(SnifferError::PtyUnavailable)?;
        let master = pty.master;
        let slave = pty.slave;

        set_raw_mode(&master)?;
        set_raw_mode(&slave)?;
        set_nonblocking(&master)?;

        let slave_path = nix::unistd::ttyname(&slave).map_err(SnifferError::PtyUnavailable)?;

        info!(path = %slave_path.display(), "HCI bridge PTY allocated");

        Ok(Self {
            master,
            slave_path,
            _slave: slave,
        })
    }

    pub fn slave_path(&self) -> &std::path::Path {
        &self.slave_path
    }

    /// A duplicated, non-blocking handle over the master side, wrapped for
    /// async readiness polling. The HCI bridge loops each hold one of
    /// these.
    pub fn master_handle(&self) -> Result<PtyMaster> {
        let dup = nix::unistd::dup(&self.master).map_err(SnifferError::PtyUnavailable)?;
        set_nonblocking(&dup)?;
        let async_fd = AsyncFd::new(dup).map_err(|e| SnifferError::DeviceUnavailable(e))?;
        Ok(PtyMaster { inner: async_fd })
    }
}

fn set_raw_mode(fd: &OwnedFd) -> Result<()> {
    let mut attrs = termios::tcgetattr(fd).map_err(SnifferError::PtyUnavailable)?;
    termios::cfmakeraw(&mut attrs);
    termios::tcsetattr(fd, SetArg::TCSANOW, &attrs).map_err(SnifferError::PtyUnavailable)?;
    Ok(())
}

fn set_nonblocking(fd: &OwnedFd) -> Result<()> {
    let flags = fcntl(fd, FcntlArg::F_GETFL).map_err(SnifferError::PtyUnavailable)?;
    let mut flags = OFlag::from_bits_truncate(flags);
    flags.insert(OFlag::O_NONBLOCK);
    fcntl(fd, FcntlArg::F_SETFL(flags)).map_err(SnifferError::PtyUnavailable)?;
    Ok(())
}

impl AsRawFd for PtyPair {
    fn as_raw_fd(&self) -> std::os::fd::RawFd {
        self.master.as_raw_fd()
    }
}

/// One non-blocking, async-readiness-polled handle to the PTY master fd.
#[derive(Debug)]
pub struct PtyMaster {
    inner: AsyncFd<OwnedFd>,
}

impl PtyMaster {
    /// Reads up to `buf.len()` bytes, returning the number read.
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        loop {
            let mut guard = self
                .inner
                .readable()
                .await
                .map_err(SnifferError::DeviceUnavailable)?;
            match guard.try_io(|inner| {
                nix::unistd::read(inner.get_ref(), buf)
                    .map_err(|e| std::io::Error::from_raw_os_error(e as i32))
            }) {
                Ok(result) => return result.map_err(SnifferError::DeviceUnavailable),
                Err(_would_block) => continue,
            }
        }
    }

    pub async fn write_all(&mut self, mut buf: &[u8]) -> Result<()> {
        while !buf.is_empty() {
            let mut guard = self
                .inner
                .writable()
                .await
                .map_err(SnifferError::DeviceUnavailable)?;
            match guard.try_io(|inner| {
                nix::unistd::write(inner.get_ref(), buf)
                    .map_err(|e| std::io::Error::from_raw_os_error(e as i32))
            }) {
                Ok(Ok(n)) => buf = &buf[n..],
                Ok(Err(e)) => return Err(SnifferError::DeviceUnavailable(e)),
                Err(_would_block) => continue,
            }
        }
        Ok(())
    }
}
