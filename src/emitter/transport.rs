//! Outbound datagram transport.
//!
//! Two sockets for the life of the emitter: a plain one for data and a
//! broadcast-enabled one for discovery. Sends are fire-and-forget; the caller
//! decides what a failed send means.

use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::{
    io,
    net::{Ipv4Addr, SocketAddr, UdpSocket},
};

use crate::config::Endpoints;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Data,
    Discovery,
}

impl Channel {
    pub fn name(&self) -> &'static str {
        match self {
            Channel::Data => "data",
            Channel::Discovery => "discovery",
        }
    }
}

/// Sink for emitter packets
pub trait Transport {
    /// Send one datagram on `channel`, returns number of bytes sent
    fn send(&mut self, channel: Channel, payload: &[u8]) -> io::Result<usize>;
}

/// UDP transport to the resolved endpoints
pub struct UdpTransport {
    data_socket: UdpSocket,
    discovery_socket: UdpSocket,
    endpoints: Endpoints,
}

impl UdpTransport {
    /// Open both sockets. Failure here is fatal: there is nothing to retry against.
    pub fn open(endpoints: Endpoints) -> Result<Self> {
        let data_socket = open_socket(Channel::Data, false)?;
        let discovery_socket = open_socket(Channel::Discovery, true)?;

        log::debug!(
            "Sockets open: data {:?} -> {}, discovery {:?} -> {}",
            data_socket.local_addr().ok(),
            endpoints.data,
            discovery_socket.local_addr().ok(),
            endpoints.discovery
        );

        Ok(Self {
            data_socket,
            discovery_socket,
            endpoints,
        })
    }

    pub fn endpoints(&self) -> Endpoints {
        self.endpoints
    }
}

impl Transport for UdpTransport {
    fn send(&mut self, channel: Channel, payload: &[u8]) -> io::Result<usize> {
        match channel {
            Channel::Data => self.data_socket.send_to(payload, self.endpoints.data),
            Channel::Discovery => self
                .discovery_socket
                .send_to(payload, self.endpoints.discovery),
        }
    }
}

/// Build an IPv4 UDP socket bound to an ephemeral port (we only send).
fn open_socket(channel: Channel, broadcast: bool) -> Result<UdpSocket> {
    let what = channel.name();
    let setup = move |source: io::Error| Error::SocketSetup { what, source };

    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP)).map_err(setup)?;
    if broadcast {
        socket.set_broadcast(true).map_err(setup)?;
    }

    let any = SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0));
    socket.bind(&SockAddr::from(any)).map_err(setup)?;

    Ok(socket.into())
}
