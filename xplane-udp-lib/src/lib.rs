pub mod channel;
pub mod config;
pub mod constants;
pub mod decode;
pub mod error;
pub mod layout;
pub mod message;
pub mod packet;
pub mod records;
pub mod session;


// Re-export the pieces a receiver needs
pub use channel::{DatagramSource, ReceiveOutcome, UdpChannel};
pub use config::{BindMode, ChannelConfig, ReceiverConfig, SessionConfig};
pub use decode::{DecodedRecord, Value};
pub use error::{Result, XpError};
pub use layout::{Registry, SubBlockKind};
pub use message::{DataFrame, DecodedPacket, PacketBody, PacketBuilder};
pub use packet::{PacketKind, RawPacket, classify};
pub use session::{DatagramSession, SessionOutcome, SessionPhase, SessionStats};
