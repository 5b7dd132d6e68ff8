use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tokio::{signal, task};

use clap_verbosity_flag::{InfoLevel, Verbosity};
use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use xplane_udp_lib::constants::DEFAULT_MULTICAST_GROUP;
use xplane_udp_lib::{
    BindMode, DatagramSession, DecodedPacket, ReceiverConfig, SessionOutcome, UdpChannel, XpError,
};

/// Receive and decode X-Plane UDP data output.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Bind to this local address instead of joining a multicast group.
    #[arg(long, env = "XPLANE_HOST", conflicts_with = "group")]
    host: Option<IpAddr>,
    /// Multicast group to join [default: 239.255.1.1]
    #[arg(short, long, env = "XPLANE_GROUP")]
    group: Option<Ipv4Addr>,
    /// Local interface used for the multicast membership [default: 0.0.0.0]
    #[arg(short, long, env = "XPLANE_INTERFACE")]
    interface: Option<Ipv4Addr>,
    /// UDP port [default: 49707]
    #[arg(short, long, env = "XPLANE_PORT")]
    port: Option<u16>,
    /// Receive buffer size in bytes [default: 149]
    #[arg(long, env = "XPLANE_PACKET_SIZE")]
    packet_size: Option<usize>,
    /// Consecutive timeouts before reporting that no data arrives [default: 11]
    #[arg(long, env = "XPLANE_MAX_TIMEOUTS")]
    max_timeouts: Option<u32>,
    /// Socket read timeout in milliseconds [default: 1000]
    #[arg(long, env = "XPLANE_TIMEOUT_MS")]
    timeout_ms: Option<u64>,
    /// Stop after the first request, whatever its outcome.
    #[arg(long)]
    once: bool,
    /// Print each packet as one JSON object per line.
    #[arg(long)]
    json: bool,
    /// JSON file with receiver settings. Flags override it.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Optional path to a file to write logs to, in addition to the console.
    #[arg(short, long)]
    log_file: Option<PathBuf>,
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
}

impl Cli {
    fn receiver_config(&self) -> Result<ReceiverConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let file =
                    File::open(path).with_context(|| format!("Failed to open config file at: {:?}", path))?;
                serde_json::from_reader(file).with_context(|| format!("Invalid config file: {:?}", path))?
            }
            None => ReceiverConfig::default(),
        };

        if let Some(host) = self.host {
            config.channel.bind = BindMode::Host(host);
        } else if self.group.is_some() || self.interface.is_some() {
            let (default_group, default_interface) = match config.channel.bind {
                BindMode::Multicast { group, interface } => (group, interface),
                BindMode::Host(_) => (Ipv4Addr::from(DEFAULT_MULTICAST_GROUP), Ipv4Addr::UNSPECIFIED),
            };
            config.channel.bind = BindMode::Multicast {
                group: self.group.unwrap_or(default_group),
                interface: self.interface.unwrap_or(default_interface),
            };
        }
        if let Some(port) = self.port {
            config.channel.port = port;
        }
        if let Some(ms) = self.timeout_ms {
            config.channel.read_timeout = Duration::from_millis(ms);
        }
        if let Some(size) = self.packet_size {
            config.session.packet_size = size;
        }
        if let Some(max) = self.max_timeouts {
            config.session.max_timeouts = max;
        }

        config.validate().context("Invalid receiver configuration")?;
        Ok(config)
    }
}

fn setup_logging(log_file_path: Option<PathBuf>, verbosity: &Verbosity<InfoLevel>) -> Result<Option<WorkerGuard>> {
    // Packets go to stdout, logs to stderr
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .without_time();

    let (file_layer, guard) = if let Some(ref path) = log_file_path {
        let log_file = File::create(path).with_context(|| format!("Failed to create log file at: {:?}", path))?;
        let (non_blocking_writer, guard) = tracing_appender::non_blocking(log_file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking_writer)
            .with_ansi(false)
            .with_target(false);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    // INFO by default, DEBUG with -v, TRACE with -vv; RUST_LOG wins
    let filter = EnvFilter::builder()
        .with_default_directive(verbosity.tracing_level_filter().into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    if let Some(path) = log_file_path {
        info!("Logging to file: {:?}", path);
    }

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let guard = setup_logging(cli.log_file.clone(), &cli.verbose)?;

    let config = match cli.receiver_config() {
        Ok(config) => config,
        Err(e) => {
            error!("{:?}", e);
            drop(guard);
            process::exit(2);
        }
    };
    debug!(?config, "Receiver configuration");

    let (once, json) = (cli.once, cli.json);
    let receiver = task::spawn_blocking(move || receive_loop(&config, once, json));

    tokio::select! {
        res = receiver => {
            let res = res.context("Receiver task panicked").and_then(|r| r);
            if let Err(e) = res {
                error!("Receiver failed: {:?}", e);
                drop(guard);
                process::exit(1);
            }
        }
        _ = signal::ctrl_c() => {
            info!("Ctrl+C received, shutting down.");
            // The worker may sit in a blocking receive; do not wait for it
            drop(guard);
            process::exit(0);
        }
    }
    Ok(())
}

fn receive_loop(config: &ReceiverConfig, once: bool, json: bool) -> Result<()> {
    let channel = UdpChannel::open(&config.channel).context("Failed to open UDP channel")?;
    let mut session = DatagramSession::new(channel, &config.session)?;

    loop {
        match session.request_next() {
            Ok(SessionOutcome::Packet(packet)) => print_packet(&packet, json)?,
            Ok(SessionOutcome::NoData { timeouts }) => {
                warn!(timeouts, "No data from X-Plane. Is data output enabled?");
            }
            Err(XpError::Io(e)) => return Err(e).context("Receive failed"),
            Err(e) => {
                error!("Failed to decode packet: {}", e);
                if once {
                    return Err(e.into());
                }
            }
        }
        if once {
            break;
        }
    }

    let stats = session.stats();
    info!(
        datagrams = stats.datagrams,
        decoded = stats.decoded,
        beacons = stats.beacons,
        unknown = stats.unknown,
        decode_errors = stats.decode_errors,
        "Receiver stopped"
    );
    session.close();
    Ok(())
}

fn print_packet(packet: &DecodedPacket, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(packet)?);
    } else {
        println!("{} {}", packet.received_at.format("%H:%M:%S%.3f"), packet);
    }
    Ok(())
}
