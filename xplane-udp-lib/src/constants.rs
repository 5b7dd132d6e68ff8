// Protocol constants for X-Plane "Data Output" datagrams

/// Size of the ASCII packet tag (`DATA`, `XGPS`, ...)
pub const TAG_SIZE: usize = 4;

/// The tag is followed by one pad byte before the payload starts
pub const PAYLOAD_OFFSET: usize = TAG_SIZE + 1;

/// Size of one DATA sub-block (ID + 8 four-byte values)
pub const SUB_BLOCK_SIZE: usize = 36;

/// Number of sub-blocks carried in a DATA packet
pub const SUB_BLOCK_COUNT: usize = 4;

/// Size of the flat position record (ID + 3 doubles + 10 floats)
pub const FLAT_RECORD_SIZE: usize = 68;

/// Full size of a DATA packet with four sub-blocks
pub const DATA_PACKET_SIZE: usize = PAYLOAD_OFFSET + SUB_BLOCK_COUNT * SUB_BLOCK_SIZE;

/// Full size of a packet carrying one flat record
pub const FLAT_PACKET_SIZE: usize = PAYLOAD_OFFSET + FLAT_RECORD_SIZE;

/// Receive buffer size observed from X-Plane 11/12 multicast output
pub const DEFAULT_PACKET_SIZE: usize = 149;

/// Consecutive receive timeouts before a request gives up
pub const DEFAULT_MAX_TIMEOUTS: u32 = 11;

/// X-Plane multicast group for data output
pub const DEFAULT_MULTICAST_GROUP: [u8; 4] = [239, 255, 1, 1];

/// X-Plane multicast port for data output
pub const DEFAULT_PORT: u16 = 49707;

/// Default blocking receive timeout in milliseconds
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 1000;

pub const TAG_BEACON: &[u8; TAG_SIZE] = b"BECN";
pub const TAG_DATA: &[u8; TAG_SIZE] = b"DATA";
pub const TAG_ATTITUDE: &[u8; TAG_SIZE] = b"XATT";
pub const TAG_GPS: &[u8; TAG_SIZE] = b"XGPS";
pub const TAG_EXTRA: &[u8; TAG_SIZE] = b"XTRA";
