use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::{signal, time};
use tracing::{debug, error, info};

use xplane_udp_lib::records::{Dme, FlatPosition, Orientation, Position, Speeds};
use xplane_udp_lib::{PacketBuilder, PacketKind, SubBlockKind};

/// Send synthetic X-Plane data output datagrams, for testing a receiver
/// without a running simulator.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Where to send the datagrams.
    #[arg(short, long, env = "XPLANE_TARGET", default_value = "239.255.1.1:49707")]
    target: SocketAddr,
    /// Packet kinds to send, cycled in order.
    #[arg(short, long, value_enum, value_delimiter = ',', default_values_t = [EmitKind::Beacon, EmitKind::Data, EmitKind::Gps])]
    kinds: Vec<EmitKind>,
    /// Number of packets to send. 0 sends until Ctrl+C.
    #[arg(short = 'n', long, default_value_t = 10)]
    count: u32,
    /// Delay between packets in milliseconds.
    #[arg(short, long, default_value_t = 250)]
    interval_ms: u64,
    /// Send this hex-encoded datagram instead of generated packets.
    #[arg(long)]
    raw: Option<String>,
    /// Multicast TTL.
    #[arg(long, default_value_t = 1)]
    ttl: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum EmitKind {
    Beacon,
    Data,
    Att,
    Gps,
    Extra,
}

/// Simple straight-and-level flight with a slow right turn and climb.
#[derive(Debug, Default)]
struct Flight {
    step: u32,
}

impl Flight {
    const ORIGIN_LAT: f64 = 47.449;
    const ORIGIN_LON: f64 = -122.309;

    fn advance(&mut self) {
        self.step += 1;
    }

    fn heading(&self) -> f32 {
        (270.0 + self.step as f32 * 2.0) % 360.0
    }

    fn altitude_ft(&self) -> f32 {
        1500.0 + self.step as f32 * 10.0
    }

    fn lat(&self) -> f64 {
        Self::ORIGIN_LAT + self.step as f64 * 0.0005
    }

    fn lon(&self) -> f64 {
        Self::ORIGIN_LON - self.step as f64 * 0.0005
    }

    fn data_packet(&self) -> bytes::Bytes {
        let speeds = Speeds {
            id: SubBlockKind::Speeds.into(),
            vind_kias: 150.0,
            vind_keas: 149.0,
            vtrue_ktas: 155.0,
            vtrue_ktgs: 152.0,
            nothing: -999,
            vind_mph: 172.6,
            vtrue_mphas: 178.4,
            vtrue_mphgs: 174.9,
        };
        let orientation = Orientation {
            id: SubBlockKind::Orientation.into(),
            pitch_deg: 2.5,
            roll_deg: 15.0,
            hding_true: (self.heading() + 15.5) % 360.0,
            nothing1: -999,
            hding_mag: self.heading(),
            mavar_deg: 15.5,
            nothing2: -999,
            mag_comp: self.heading(),
        };
        let position = Position {
            id: SubBlockKind::Position.into(),
            lat_deg: self.lat() as f32,
            lon_deg: self.lon() as f32,
            cg_ftmsl: self.altitude_ft(),
            gear_ftagl: self.altitude_ft() - 430.0,
            terrn_ftmsl: 430.0,
            p_alt_ftmsl: self.altitude_ft() + 20.0,
            lat_origin: Self::ORIGIN_LAT as f32,
            lon_origin: Self::ORIGIN_LON as f32,
        };
        let dme = Dme {
            id: SubBlockKind::Dme.into(),
            dme_nav01: 1.0,
            dme_mode: 1.0,
            dme_found: 1.0,
            dme_dist: 12.0 - self.step as f32 * 0.05,
            dme_speed: 152.0,
            dme_time: 4.7,
            dme_ntyp: 3,
            dme3_freq: 11320,
        };
        PacketBuilder::data(&speeds, &orientation, &position, &dme)
    }

    fn flat_record(&self) -> FlatPosition {
        FlatPosition {
            id: 1,
            dat_lon: self.lon(),
            dat_lat: self.lat(),
            dat_ele: self.altitude_ft() as f64 * 0.3048,
            y_agl_mtr: (self.altitude_ft() - 430.0) * 0.3048,
            veh_the_loc: 2.5,
            veh_psi_loc: (self.heading() + 15.5) % 360.0,
            veh_phi_loc: 15.0,
            vx_wrl: -78.0,
            vy_wrl: 0.5,
            vz_wrl: 0.0,
            prad: 0.0,
            qrad: 0.0,
            rrad: 0.035,
        }
    }

    fn packet(&self, kind: EmitKind) -> Result<bytes::Bytes> {
        let bytes = match kind {
            EmitKind::Beacon => PacketBuilder::new(PacketKind::Beacon)?
                .push_bytes(&[1, 1, 0, 0, 0, 11, 0, 0, 0])
                .build(),
            EmitKind::Data => self.data_packet(),
            EmitKind::Att => PacketBuilder::flat(PacketKind::Attitude, &self.flat_record())?,
            EmitKind::Gps => PacketBuilder::flat(PacketKind::Gps, &self.flat_record())?,
            EmitKind::Extra => PacketBuilder::flat(PacketKind::Extra, &self.flat_record())?,
        };
        Ok(bytes)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt().with_target(false).init();

    tokio::select! {
        res = run(cli) => {
            if let Err(e) = res {
                error!("Emitter failed: {:?}", e);
                std::process::exit(1);
            }
        }
        _ = signal::ctrl_c() => {
            info!("Ctrl+C received, shutting down gracefully.");
        }
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    if cli.kinds.is_empty() {
        bail!("At least one packet kind is required");
    }
    let raw = cli
        .raw
        .as_deref()
        .map(hex::decode)
        .transpose()
        .context("--raw must be a hex string")?;

    let socket = UdpSocket::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)))
        .await
        .context("Failed to bind sending socket")?;
    if cli.target.ip().is_multicast() {
        socket.set_multicast_ttl_v4(cli.ttl).context("Failed to set multicast TTL")?;
    }
    info!(target = %cli.target, "Sending datagrams");

    let mut flight = Flight::default();
    let mut ticker = time::interval(Duration::from_millis(cli.interval_ms.max(1)));
    let mut sent = 0u32;

    while cli.count == 0 || sent < cli.count {
        ticker.tick().await;
        let kind = cli.kinds[sent as usize % cli.kinds.len()];
        let bytes = match &raw {
            Some(raw) => bytes::Bytes::copy_from_slice(raw),
            None => flight.packet(kind)?,
        };
        socket
            .send_to(&bytes, cli.target)
            .await
            .with_context(|| format!("Failed to send to {}", cli.target))?;
        debug!(?kind, len = bytes.len(), "Sent datagram");
        if kind == EmitKind::Data {
            flight.advance();
        }
        sent += 1;
    }

    info!(sent, "Done");
    Ok(())
}
