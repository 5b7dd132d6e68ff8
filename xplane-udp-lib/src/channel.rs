use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{SocketAddr, UdpSocket};
use tracing::{debug, info};

use crate::config::{BindMode, ChannelConfig};
use crate::error::{Result, XpError};

/// Result of one blocking receive.
#[derive(Debug)]
pub enum ReceiveOutcome {
    /// `len` bytes were written to the front of the caller's buffer.
    Received { len: usize, sender: SocketAddr },
    /// No datagram arrived within the read timeout.
    TimedOut,
    /// The socket failed or was closed.
    Fatal(io::Error),
}

/// A source of datagrams the session can drive.
pub trait DatagramSource {
    /// Block until a datagram arrives or the timeout elapses, writing it into
    /// `buf`.
    fn receive(&mut self, buf: &mut [u8]) -> ReceiveOutcome;

    /// Release the underlying resource. Calling it again is a no-op.
    fn close(&mut self);
}

/// UDP endpoint bound to a host address or a multicast group.
pub struct UdpChannel {
    socket: Option<UdpSocket>,
    local_addr: SocketAddr,
}

impl UdpChannel {
    /// Bind the endpoint described by `config`.
    pub fn open(config: &ChannelConfig) -> Result<Self> {
        config.validate()?;
        let addr = config.bind_addr();
        let bind_error = |source: io::Error| XpError::Bind { addr, source };

        let socket = Socket::new(Domain::for_address(addr), Type::DGRAM, Some(Protocol::UDP)).map_err(bind_error)?;
        socket.set_reuse_address(true).map_err(bind_error)?;
        socket.bind(&addr.into()).map_err(bind_error)?;

        if let BindMode::Multicast { group, interface } = config.bind {
            socket.join_multicast_v4(&group, &interface).map_err(bind_error)?;
            info!(%group, %interface, "Joined multicast group");
        }

        let socket: UdpSocket = socket.into();
        socket.set_read_timeout(Some(config.read_timeout)).map_err(bind_error)?;
        let local_addr = socket.local_addr().map_err(bind_error)?;

        info!(%local_addr, "Waiting for packets");
        Ok(Self {
            socket: Some(socket),
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_open(&self) -> bool {
        self.socket.is_some()
    }
}

impl DatagramSource for UdpChannel {
    fn receive(&mut self, buf: &mut [u8]) -> ReceiveOutcome {
        let Some(socket) = self.socket.as_ref() else {
            return ReceiveOutcome::Fatal(io::Error::new(io::ErrorKind::NotConnected, "channel is closed"));
        };
        match socket.recv_from(buf) {
            Ok((len, sender)) => ReceiveOutcome::Received { len, sender },
            // Unix reports an expired read timeout as WouldBlock, Windows as TimedOut
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                ReceiveOutcome::TimedOut
            }
            Err(e) => ReceiveOutcome::Fatal(e),
        }
    }

    fn close(&mut self) {
        if self.socket.take().is_some() {
            debug!(local_addr = %self.local_addr, "UDP channel closed");
        }
    }
}

impl Drop for UdpChannel {
    fn drop(&mut self) {
        self.close();
    }
}
