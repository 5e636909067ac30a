//! Host network introspection helpers
//!
//! Thin wrappers over `getifaddrs(3)` and address resolution shared by the
//! interface probe and the virtual-interface query check.

use nix::ifaddrs::getifaddrs;
use nix::net::if_::InterfaceFlags;
use std::io;
use std::net::{IpAddr, SocketAddr};

/// Flags and addresses of one network interface
#[derive(Debug, Clone)]
pub struct InterfaceInfo {
    /// Combined interface flags as reported by the kernel
    pub flags: InterfaceFlags,
    /// IPv4 and IPv6 addresses assigned to the interface
    pub addrs: Vec<IpAddr>,
}

impl InterfaceInfo {
    /// Whether the interface is administratively up
    pub fn is_up(&self) -> bool {
        self.flags.contains(InterfaceFlags::IFF_UP)
    }

    /// Whether the interface is operationally running
    pub fn is_running(&self) -> bool {
        self.flags.contains(InterfaceFlags::IFF_RUNNING)
    }
}

/// Look up one interface by name; `None` when it does not exist
///
/// `getifaddrs` yields one entry per address family, so flags are OR-ed
/// over all entries and link-level entries count toward existence but not
/// toward the address list.
pub fn interface_info(name: &str) -> io::Result<Option<InterfaceInfo>> {
    let addrs = getifaddrs().map_err(|e| io::Error::from_raw_os_error(e as i32))?;

    let mut found = false;
    let mut info = InterfaceInfo {
        flags: InterfaceFlags::empty(),
        addrs: Vec::new(),
    };
    for entry in addrs {
        if entry.interface_name != name {
            continue;
        }
        found = true;
        info.flags |= entry.flags;
        if let Some(address) = entry.address {
            if let Some(sin) = address.as_sockaddr_in() {
                info.addrs.push(IpAddr::V4(sin.ip()));
            } else if let Some(sin6) = address.as_sockaddr_in6() {
                info.addrs.push(IpAddr::V6(sin6.ip()));
            }
        }
    }
    Ok(found.then_some(info))
}

/// Resolve `host:port` to a socket address
///
/// IP literals take the fast path; anything else goes through the system
/// resolver and the first result wins.
pub async fn resolve_addr(host: &str, port: u16) -> io::Result<SocketAddr> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, port));
    }
    tokio::net::lookup_host((host, port))
        .await?
        .next()
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no address found for {}", host),
            )
        })
}
