//! Resolution of the node name and node IP this agent advertises for.

use std::io;
use std::net::IpAddr;
use std::net::Ipv4Addr;
use std::net::SocketAddr;

use error_stack::Report;
use error_stack::ResultExt;
use tokio::net::lookup_host;
use tokio::net::UdpSocket;

use crate::infrastructure::k8s::AdvertiseError;

/// Public address used only to select the default-route interface, no packet is sent.
const DEFAULT_ROUTE_TARGET: SocketAddr =
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)), 53);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeAddress {
    pub ip: IpAddr,
    pub hostname: String,
}

/// Resolve the node hostname and IP.
///
/// The hostname is the override when given, the OS hostname otherwise. The IP is
/// picked in this order:
/// 1. `node_ip` when set
/// 2. the hostname itself when it is an IP literal
/// 3. the first non-loopback IPv4 address the hostname resolves to
/// 4. the address of the interface holding the default route
///
/// Name lookups go through the runtime resolver and never block a worker thread.
///
/// # Errors
///
/// - [`AdvertiseError::Resolution`] if no hostname or address can be determined
pub async fn resolve_node_address(
    hostname_override: Option<&str>,
    node_ip: Option<&str>,
) -> Result<NodeAddress, Report<AdvertiseError>> {
    let hostname = get_hostname(hostname_override)?;

    let ip = match node_ip.map(str::trim).filter(|ip| !ip.is_empty()) {
        Some(node_ip) => node_ip
            .parse::<IpAddr>()
            .change_context(AdvertiseError::Resolution {
                message: format!("Invalid node IP: {node_ip}"),
            })?,
        None => match hostname.parse::<IpAddr>() {
            Ok(ip) => ip,
            Err(_) => match lookup_ipv4(&hostname).await {
                Some(ip) => ip,
                None => default_route_ip().await?,
            },
        },
    };

    Ok(NodeAddress { ip, hostname })
}

/// Returns the lower-cased hostname override, or the OS hostname if none is given.
///
/// # Errors
///
/// - [`AdvertiseError::Resolution`] if the resulting hostname is empty
pub fn get_hostname(hostname_override: Option<&str>) -> Result<String, Report<AdvertiseError>> {
    let hostname = match hostname_override.map(str::trim).filter(|h| !h.is_empty()) {
        Some(hostname) => hostname.to_string(),
        None => os_hostname().change_context(AdvertiseError::Resolution {
            message: "Failed to read OS hostname".to_string(),
        })?,
    };

    let hostname = hostname.trim().to_lowercase();
    if hostname.is_empty() {
        return Err(Report::new(AdvertiseError::Resolution {
            message: "Empty hostname is invalid".to_string(),
        }));
    }
    Ok(hostname)
}

fn os_hostname() -> io::Result<String> {
    let mut buf = [0u8; 256];
    let rc = unsafe { libc::gethostname(buf.as_mut_ptr().cast(), buf.len()) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    let len = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    Ok(String::from_utf8_lossy(&buf[..len]).into_owned())
}

async fn lookup_ipv4(hostname: &str) -> Option<IpAddr> {
    let addrs = match lookup_host((hostname, 0)).await {
        Ok(addrs) => addrs,
        Err(e) => {
            tracing::debug!(hostname, "Hostname lookup failed: {e}");
            return None;
        }
    };

    addrs
        .map(|addr| addr.ip())
        .find(|ip| ip.is_ipv4() && !ip.is_loopback() && !ip.is_unspecified())
}

async fn default_route_ip() -> Result<IpAddr, Report<AdvertiseError>> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
        .await
        .change_context(AdvertiseError::Resolution {
            message: "Failed to bind route lookup socket".to_string(),
        })?;
    socket
        .connect(DEFAULT_ROUTE_TARGET)
        .await
        .change_context(AdvertiseError::Resolution {
            message: "No default route found".to_string(),
        })?;
    let ip = socket
        .local_addr()
        .change_context(AdvertiseError::Resolution {
            message: "Failed to read default route address".to_string(),
        })?
        .ip();

    if ip.is_unspecified() || ip.is_loopback() {
        return Err(Report::new(AdvertiseError::Resolution {
            message: format!("Default route address {ip} is not usable"),
        }));
    }
    Ok(ip)
}
