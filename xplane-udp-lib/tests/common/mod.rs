//! Common test utilities and shared fixtures

// Not every test file uses every item
#[allow(unused_imports)]
pub use bytes::Bytes;
#[allow(unused_imports)]
pub use hex;
#[allow(unused_imports)]
pub use xplane_udp_lib::channel::{DatagramSource, ReceiveOutcome};
#[allow(unused_imports)]
pub use xplane_udp_lib::config::SessionConfig;
#[allow(unused_imports)]
pub use xplane_udp_lib::error::XpError;
#[allow(unused_imports)]
pub use xplane_udp_lib::packet::PacketKind;
#[allow(unused_imports)]
pub use xplane_udp_lib::session::{DatagramSession, SessionOutcome, SessionPhase};

use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;

/// DATA packet captured with IAS 150 kts, HDG 268.5 mag, CG 5280 ft MSL
#[allow(dead_code)]
pub const DATA_HEX: &str = "44415441000300000000001643008014430040204300001b4319fcffff00802c43008038430040324311000000000020400000a0bf0080874319fcffff004086430000204019fcffff000086431400000000003e420080f4c20000a5450000964400007f4500a0a54500003c420000f4c2660000000000803f0000803f0000803f0000484100000c430000a84003000000382c0000";

/// XGPS packet: lon -122.309, lat 47.449, ele 131.5 m
#[allow(dead_code)]
pub const XGPS_HEX: &str = "584750530001000000b29defa7c6935ec0b6f3fdd478b9474000000000007060400000003f0000c03f00008743000000bf000020410000803e000040c00ad7233c0ad7a33c8fc2f5bc";

/// Start of an X-Plane beacon announcement
#[allow(dead_code)]
pub const BEACON_HEX: &str = "4245434e00010100000b000000b30000000100000068be";

/// Decode hex string to bytes for testing
#[allow(dead_code)]
pub fn hex_to_bytes(hex_data: &str) -> Bytes {
    Bytes::from(hex::decode(hex_data).expect("Failed to decode hex"))
}

/// Route library logs to the test output. RUST_LOG=trace shows phase changes.
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[allow(dead_code)]
pub fn sim_addr() -> SocketAddr {
    SocketAddr::from(([192, 168, 1, 20], 49707))
}

/// One scripted receive result.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub enum Step {
    Datagram(Bytes),
    Timeout,
    Fatal(io::ErrorKind),
}

/// In-memory datagram source that replays a script.
///
/// Once the script runs out every receive times out.
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct ScriptedSource {
    steps: VecDeque<Step>,
    pub receives: usize,
    pub closes: usize,
}

#[allow(dead_code)]
impl ScriptedSource {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn remaining(&self) -> usize {
        self.steps.len()
    }
}

impl DatagramSource for ScriptedSource {
    fn receive(&mut self, buf: &mut [u8]) -> ReceiveOutcome {
        self.receives += 1;
        match self.steps.pop_front() {
            Some(Step::Datagram(data)) => {
                // Same truncation a real socket applies
                let len = data.len().min(buf.len());
                buf[..len].copy_from_slice(&data[..len]);
                ReceiveOutcome::Received { len, sender: sim_addr() }
            }
            Some(Step::Fatal(kind)) => ReceiveOutcome::Fatal(io::Error::new(kind, "scripted failure")),
            Some(Step::Timeout) | None => ReceiveOutcome::TimedOut,
        }
    }

    fn close(&mut self) {
        self.closes += 1;
    }
}

#[allow(dead_code)]
pub fn datagram(hex_data: &str) -> Step {
    Step::Datagram(hex_to_bytes(hex_data))
}

#[allow(dead_code)]
pub fn session(steps: impl IntoIterator<Item = Step>) -> DatagramSession<ScriptedSource> {
    DatagramSession::new(ScriptedSource::new(steps), &SessionConfig::default()).expect("Failed to create session")
}
