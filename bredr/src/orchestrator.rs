//! Sniffer Orchestrator: wires serial bringup, the HCI bridge, the RX loop
//! and the capture pipeline into one running sniffer, and tears all of it
//! down on Ctrl-C.
//!
//! Maps onto §5's thread model as tokio tasks rather than OS threads:
//! **R** (this function's own loop), **B** (`bridge::pty_to_uart_loop`,
//! spawned and aborted on shutdown rather than polled for a cooperative
//! exit — there is no portable way to interrupt a blocking PTY read other
//! than closing its fd or cancelling the task, and `JoinHandle::abort` is
//! the idiomatic tokio answer to the latter), **H** (the optional helper
//! supervisor, same treatment), and **M** (the `tokio::signal::ctrl_c`
//! await below).

use std::path::PathBuf;
use std::time::Duration;

use tokio::process::Command;
use tracing::{error, info, warn};

use crate::bridge;
use crate::capture::{CapturePipeline, FifoSink, PcapFileSink};
use crate::commands;
use crate::config::{ResetMode, Role, SnifferConfig};
use crate::dissect::{self, Direction};
use crate::error::{Result, SnifferError};
use crate::framer::{self, WireFrame};
use crate::pty::PtyPair;
use crate::serial::SerialLine;

const VERSION_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Runs the sniffer to completion: bringup, then the RX loop, until a
/// Ctrl-C is observed. Every acquired resource (serial handle, PTY pair,
/// capture sinks, helper process) is released before returning, on every
/// exit path, per §5's resource discipline note.
pub async fn run(config: SnifferConfig) -> Result<()> {
    let mut serial = SerialLine::open(&config.port, config.baud)?;

    match config.reset_mode {
        ResetMode::Hard => {
            info!("hard-resetting board via DTR/RTS");
            serial.hard_reset().await?;
        }
        ResetMode::Soft | ResetMode::None => {}
    }

    let (mut reader, writer) = serial.split();

    if config.reset_mode == ResetMode::Soft {
        info!("soft-resetting board over serial link");
        commands::soft_reset(&writer).await?;
    }

    let version = tokio::time::timeout(
        VERSION_PROBE_TIMEOUT,
        commands::get_version(&writer, &mut reader),
    )
    .await
    .map_err(|_| SnifferError::FirmwareUnresponsive)??;
    info!(%version, "board firmware responded");

    let pty = PtyPair::open()?;
    println!("{}", pty.slave_path().display());

    let pty_write_for_bridge = pty.master_handle()?;
    let mut pty_write_for_rx = pty.master_handle()?;
    let bridge_writer = writer.clone();
    let bridge_task = tokio::spawn(async move {
        if let Err(e) = bridge::pty_to_uart_loop(pty_write_for_bridge, bridge_writer).await {
            warn!(error = %e, "pty->uart bridge loop exited");
        }
    });

    commands::enable_sniffing(&writer, true).await?;
    commands::disable_poll_null(&writer, &mut reader, true).await?;
    commands::set_bdaddr(&writer, config.host_addr).await?;

    let mut pipeline = CapturePipeline::new();
    match PcapFileSink::create(&config.pcap_path) {
        Ok(sink) => pipeline.add_sink(Box::new(sink)),
        Err(e) => error!(error = %e, path = ?config.pcap_path, "failed to open pcap file sink"),
    }

    // `FifoSink::create` opens the pipe for writing, which blocks until a
    // reader attaches; the viewer must be spawned first or this deadlocks.
    let mut viewer_task = None;
    if config.live_wireshark {
        viewer_task = spawn_viewer(&config);
        match FifoSink::create(&PathBuf::from(crate::capture::DEFAULT_FIFO_PATH)) {
            Ok(sink) => pipeline.add_sink(Box::new(sink)),
            Err(e) => error!(error = %e, "failed to open FIFO sink"),
        }
    }

    let mut helper_task = None;
    if !config.bridge_only {
        if let Some(path) = &config.helper_path {
            helper_task = spawn_helper(path, pty.slave_path(), &config);
        }
    }

    let result = rx_loop(
        &mut reader,
        &mut pty_write_for_rx,
        &mut pipeline,
        &config,
        &mut helper_task,
    )
    .await;

    bridge_task.abort();
    for child in [&mut viewer_task, &mut helper_task] {
        if let Some(child) = child {
            let _ = child.start_kill();
        }
    }

    result
}

/// Thread **R**: reads frames until Ctrl-C or a non-recoverable error.
/// Recoverable errors (checksum, short/malformed dissector fields, sink
/// failures) are logged and the loop continues, per §7 — nothing here is
/// permitted to stop the RX loop except an unrecoverable framer error or
/// shutdown.
///
/// Also folds in thread **H**: if a helper process was spawned, its exit is
/// awaited alongside the frame read and Ctrl-C signal rather than polled in
/// a separate sleep loop. A helper exiting before Ctrl-C is `HelperCrashed`
/// — logged, not fatal, per §7: the capture stays valid without it.
async fn rx_loop(
    reader: &mut crate::serial::SerialReader,
    pty_write: &mut crate::pty::PtyMaster,
    pipeline: &mut CapturePipeline,
    config: &SnifferConfig,
    helper_task: &mut Option<tokio::process::Child>,
) -> Result<()> {
    loop {
        tokio::select! {
            biased;
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, shutting down");
                if !pipeline.is_empty() {
                    info!("capture saved");
                }
                return Ok(());
            }
            status = wait_helper(helper_task) => {
                warn!(?status, error = %SnifferError::HelperCrashed, "continuing sniffing");
                *helper_task = None;
            }
            frame = framer::read_frame(reader) => {
                match frame {
                    Ok(Some(frame)) => handle_frame(frame, pty_write, pipeline, config).await,
                    Ok(None) => {}
                    Err(e) if e.is_recoverable() => {
                        warn!(error = %e, "recoverable framer error, continuing");
                    }
                    Err(e) => return Err(e),
                }
            }
        }
    }
}

/// Awaits the helper child's exit, or never resolves if no helper was
/// spawned (so the `select!` arm above simply never fires for that case).
async fn wait_helper(
    helper_task: &mut Option<tokio::process::Child>,
) -> std::io::Result<std::process::ExitStatus> {
    match helper_task {
        Some(child) => child.wait().await,
        None => std::future::pending().await,
    }
}

async fn handle_frame(
    frame: WireFrame,
    pty_write: &mut crate::pty::PtyMaster,
    pipeline: &mut CapturePipeline,
    config: &SnifferConfig,
) {
    match frame {
        WireFrame::HciEvt { .. } | WireFrame::HciAcl { .. } | WireFrame::HciCmd { .. } => {
            if let Err(e) = bridge::steer_to_pty(pty_write, &frame).await {
                warn!(error = %e, "failed to steer HCI frame to PTY");
            }
        }
        WireFrame::BtRx { data } => dispatch_over_the_air(Direction::Rx, &data, pipeline, config),
        WireFrame::BtTx { data } => dispatch_over_the_air(Direction::Tx, &data, pipeline, config),
        WireFrame::Log(line) => {
            tracing::trace!(%line, "board log");
        }
    }
}

fn dispatch_over_the_air(
    direction: Direction,
    data: &[u8],
    pipeline: &mut CapturePipeline,
    config: &SnifferConfig,
) {
    pipeline.dispatch(direction, data);
    if config.live_terminal {
        let dissected = dissect::dissect(direction, data);
        match direction {
            Direction::Rx => info!(summary = %dissected.summary, "RX <--"),
            Direction::Tx => info!(summary = %dissected.summary, "TX -->"),
        }
    }
}

fn spawn_viewer(config: &SnifferConfig) -> Option<tokio::process::Child> {
    let mut cmd = Command::new("wireshark");
    cmd.arg("-k").arg("-i").arg(crate::capture::DEFAULT_FIFO_PATH);
    let _ = config;
    match cmd.spawn() {
        Ok(child) => Some(child),
        Err(e) => {
            warn!(error = %e, "failed to spawn Wireshark viewer, continuing without it");
            None
        }
    }
}

fn spawn_helper(
    helper_path: &std::path::Path,
    pty_slave_path: &std::path::Path,
    config: &SnifferConfig,
) -> Option<tokio::process::Child> {
    let target = match (config.role(), &config.target_addr) {
        (Role::Master, Some(addr)) => addr.to_string(),
        _ => String::new(),
    };
    match Command::new(helper_path)
        .arg("-u")
        .arg(pty_slave_path)
        .arg("-a")
        .arg(target)
        .spawn()
    {
        Ok(child) => Some(child),
        Err(e) => {
            warn!(error = %e, ?helper_path, "failed to spawn host-stack helper, continuing bridge-only");
            None
        }
    }
}
