use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::constants::*;
use crate::error::{Result, XpError};

/// Where the receiving socket listens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindMode {
    /// Bind directly to one of this host's addresses (unicast output).
    Host(IpAddr),
    /// Bind to a multicast group and join it on `interface`.
    Multicast { group: Ipv4Addr, interface: Ipv4Addr },
}

impl Default for BindMode {
    fn default() -> Self {
        BindMode::Multicast {
            group: Ipv4Addr::from(DEFAULT_MULTICAST_GROUP),
            interface: Ipv4Addr::UNSPECIFIED,
        }
    }
}

/// Socket channel settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub bind: BindMode,
    /// UDP port; 0 lets the OS pick one.
    pub port: u16,
    /// Blocking receive timeout. Callers see periodic timeouts instead of
    /// blocking forever.
    #[serde(with = "duration_ms")]
    pub read_timeout: Duration,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            bind: BindMode::default(),
            port: DEFAULT_PORT,
            read_timeout: Duration::from_millis(DEFAULT_READ_TIMEOUT_MS),
        }
    }
}

impl ChannelConfig {
    /// Address handed to `bind(2)`.
    pub fn bind_addr(&self) -> SocketAddr {
        match self.bind {
            BindMode::Host(ip) => SocketAddr::new(ip, self.port),
            // Windows refuses to bind to a group address
            BindMode::Multicast { group, .. } if cfg!(unix) => SocketAddr::new(IpAddr::V4(group), self.port),
            BindMode::Multicast { .. } => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), self.port),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.read_timeout.is_zero() {
            return Err(XpError::InvalidConfig("read timeout must be positive".to_string()));
        }
        if let BindMode::Multicast { group, .. } = self.bind {
            if !group.is_multicast() {
                return Err(XpError::InvalidConfig(format!("{} is not a multicast group address", group)));
            }
        }
        Ok(())
    }
}

/// Datagram session settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Receive buffer size. Longer datagrams are truncated by the OS.
    pub packet_size: usize,
    /// Consecutive timeouts after which a request reports no data.
    pub max_timeouts: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            packet_size: DEFAULT_PACKET_SIZE,
            max_timeouts: DEFAULT_MAX_TIMEOUTS,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.packet_size == 0 {
            return Err(XpError::InvalidConfig("packet size must not be 0".to_string()));
        }
        if self.max_timeouts == 0 {
            return Err(XpError::InvalidConfig("max timeouts must not be 0".to_string()));
        }
        if self.packet_size < DATA_PACKET_SIZE {
            tracing::warn!(
                packet_size = self.packet_size,
                "Packet size is smaller than a full DATA packet ({} bytes); DATA packets will fail to decode",
                DATA_PACKET_SIZE
            );
        }
        Ok(())
    }
}

/// Everything the receiver needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiverConfig {
    pub channel: ChannelConfig,
    pub session: SessionConfig,
}

impl ReceiverConfig {
    pub fn validate(&self) -> Result<()> {
        self.channel.validate()?;
        self.session.validate()
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}
