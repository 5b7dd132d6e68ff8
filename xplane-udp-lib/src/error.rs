use std::io;
use std::net::SocketAddr;
use thiserror::Error;

use crate::layout::LayoutId;

/// The primary error type for the `xplane-udp` library.
#[derive(Error, Debug)]
pub enum XpError {
    #[error("Failed to bind UDP socket on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Truncated buffer for {layout} at offset {offset}: need {required} bytes, got {available}")]
    TruncatedBuffer {
        layout: LayoutId,
        offset: usize,
        required: usize,
        available: usize,
    },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Unknown layout: {0}")]
    UnknownLayout(String),

    #[error("Layout {layout} declares {declared} bytes but its fields add up to {computed}")]
    LayoutMismatch {
        layout: LayoutId,
        declared: usize,
        computed: usize,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, XpError>;
