//! LAN address discovery for the remote status line

use std::net::{IpAddr, Ipv4Addr, UdpSocket};

/// First usable LAN IPv4 address, 127.0.0.1 when none is found
///
/// Connecting a UDP socket sends nothing; it only makes the OS pick the
/// outbound interface, whose address is then read back.
pub fn local_ipv4() -> Ipv4Addr {
    outbound_ipv4()
        .filter(|ip| is_lan_candidate(*ip))
        .unwrap_or(Ipv4Addr::LOCALHOST)
}

fn outbound_ipv4() -> Option<Ipv4Addr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).ok()?;
    socket.connect((Ipv4Addr::new(8, 8, 8, 8), 80)).ok()?;
    match socket.local_addr().ok()?.ip() {
        IpAddr::V4(ip) => Some(ip),
        IpAddr::V6(_) => None,
    }
}

/// Not loopback, unspecified or link-local (169.254.x.x)
pub fn is_lan_candidate(ip: Ipv4Addr) -> bool {
    !ip.is_loopback() && !ip.is_unspecified() && !ip.is_link_local()
}
