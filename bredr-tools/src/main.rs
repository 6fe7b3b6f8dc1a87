// CLI surface for the ESP32-BREDR sniffer core: parses operator-facing
// options and hands a `SnifferConfig` to the orchestrator. Everything in
// this file is the "external collaborator" layer spec.md places out of
// scope for the core (§1) — argument parsing and process exit codes only.

use std::path::PathBuf;

use bredr::{BdAddr, ResetMode, SnifferConfig};
use clap::{Arg, ArgAction, Command};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let matches = Command::new("esp32-bredr-sniff")
        .about("Host-side core for an ESP32 BR/EDR (Classic) Bluetooth sniffer")
        .arg(
            Arg::new("port")
                .long("port")
                .value_name("PATH")
                .help("Serial device path, e.g. /dev/ttyUSB0")
                .required(true),
        )
        .arg(
            Arg::new("baud")
                .long("baud")
                .value_name("RATE")
                .help("UART baud rate")
                .default_value("921600"),
        )
        .arg(
            Arg::new("host")
                .long("host")
                .value_name("BD_ADDR")
                .help("Local BD_ADDR, colon-hex (AA:BB:CC:DD:EE:FF)")
                .required(true),
        )
        .arg(
            Arg::new("target")
                .long("target")
                .value_name("BD_ADDR")
                .help("Remote BD_ADDR; presence implies the Master role"),
        )
        .arg(
            Arg::new("live_wireshark")
                .long("live-wireshark")
                .help("Open the FIFO sink and spawn a live Wireshark viewer")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("live_terminal")
                .long("live-terminal")
                .help("Print a per-frame summary line (TX --> / RX <--)")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("bridge_only")
                .long("bridge-only")
                .help("Do not spawn any external host-stack helper process")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("pcap_out")
                .long("pcap-out")
                .value_name("PATH")
                .help("pcap file output path")
                .default_value("logs/capture.pcap"),
        )
        .arg(
            Arg::new("helper")
                .long("helper")
                .value_name("PATH")
                .help("Path to the host-stack helper program to spawn"),
        )
        .arg(
            Arg::new("reset")
                .long("reset")
                .value_name("MODE")
                .help("Board reset path before bringup: hard, soft, or none")
                .default_value("hard"),
        )
        .get_matches();

    let config = match build_config(&matches) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(e.code());
        }
    };

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to start tokio runtime");

    if let Err(e) = rt.block_on(bredr::orchestrator::run(config)) {
        eprintln!("{e}");
        std::process::exit(e.code());
    }
}

fn build_config(matches: &clap::ArgMatches) -> bredr::Result<SnifferConfig> {
    let port = PathBuf::from(matches.get_one::<String>("port").expect("required"));
    let baud: u32 = matches
        .get_one::<String>("baud")
        .expect("has default")
        .parse()
        .map_err(|_| bredr::SnifferError::InvalidBdAddr)?;
    let host_addr: BdAddr = matches
        .get_one::<String>("host")
        .expect("required")
        .parse()?;
    let target_addr = matches
        .get_one::<String>("target")
        .map(|s| s.parse())
        .transpose()?;
    let reset_mode = match matches.get_one::<String>("reset").map(String::as_str) {
        Some("soft") => ResetMode::Soft,
        Some("none") => ResetMode::None,
        _ => ResetMode::Hard,
    };

    Ok(SnifferConfig {
        port,
        baud,
        host_addr,
        target_addr,
        reset_mode,
        live_wireshark: matches.get_flag("live_wireshark"),
        live_terminal: matches.get_flag("live_terminal"),
        bridge_only: matches.get_flag("bridge_only"),
        pcap_path: PathBuf::from(matches.get_one::<String>("pcap_out").expect("has default")),
        helper_path: matches.get_one::<String>("helper").map(PathBuf::from),
    })
}
