//! Listening port selection and host address discovery

use std::net::{IpAddr, Ipv4Addr, SocketAddr, TcpListener, UdpSocket};

use tracing::debug;

use crate::error::PhaseError;

/// First port at or above `base` that `ip` can bind.
///
/// Ports are probed one by one by binding and immediately releasing a
/// listener. The search only ends at the top of the port range.
pub fn allocate_port_on(ip: IpAddr, base: u16) -> Result<u16, PhaseError> {
    let mut port = base;
    loop {
        match TcpListener::bind(SocketAddr::new(ip, port)) {
            Ok(listener) => {
                drop(listener);
                return Ok(port);
            }
            Err(e) => debug!("Port {} unavailable: {}", port, e),
        }
        port = port.checked_add(1).ok_or(PhaseError::PortExhausted { base })?;
    }
}

/// The machine's outward-facing address, or loopback when there is none.
///
/// Connecting a UDP socket only consults the routing table; nothing is sent.
pub fn host_address() -> IpAddr {
    UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
        .and_then(|socket| {
            socket.connect((Ipv4Addr::new(192, 0, 2, 1), 9))?;
            socket.local_addr()
        })
        .map(|addr| addr.ip())
        .ok()
        .filter(|ip| !ip.is_unspecified())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}
