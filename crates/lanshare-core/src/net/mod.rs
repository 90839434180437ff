//! 局域网地址探测
//!
//! 仅用于启动信息展示，失败时回退到 `localhost`。

use log::{debug, warn};
use std::io;
use std::net::Ipv4Addr;

/// 获取首选的局域网 IPv4 地址
pub fn local_ip() -> String {
    match interface_ipv4_addrs() {
        Ok(addrs) => {
            debug!("Interface addresses: {addrs:?}");
            pick_lan_address(&addrs)
                .map_or_else(|| "localhost".to_string(), |ip| ip.to_string())
        }
        Err(e) => {
            warn!("Error getting network interfaces: {e}");
            "localhost".to_string()
        }
    }
}

/// 从接口地址中选择最可能被局域网其它设备访问到的地址
///
/// 优先级:
/// 1. 任意 192.168.x.x（家用网络）
/// 2. 其它非虚拟网卡地址
/// 3. 任意非回环地址
pub fn pick_lan_address(addrs: &[Ipv4Addr]) -> Option<Ipv4Addr> {
    let candidates = || addrs.iter().copied().filter(|ip| !ip.is_loopback());

    candidates()
        .find(|ip| is_home_network(*ip))
        .or_else(|| candidates().find(|ip| !is_virtual(*ip)))
        .or_else(|| candidates().next())
}

fn is_home_network(ip: Ipv4Addr) -> bool {
    matches!(ip.octets(), [192, 168, _, _])
}

/// Docker 默认网桥 (172.17.x.x) 和 VirtualBox host-only (192.168.56.x)
fn is_virtual(ip: Ipv4Addr) -> bool {
    matches!(ip.octets(), [172, 17, _, _] | [192, 168, 56, _])
}

#[cfg(unix)]
fn interface_ipv4_addrs() -> io::Result<Vec<Ipv4Addr>> {
    use nix::net::if_::InterfaceFlags;

    let addrs = nix::ifaddrs::getifaddrs().map_err(io::Error::from)?;
    Ok(addrs
        .filter(|ifa| ifa.flags.contains(InterfaceFlags::IFF_UP))
        .filter_map(|ifa| {
            ifa.address
                .as_ref()
                .and_then(|addr| addr.as_sockaddr_in())
                .map(|sin| sin.ip())
        })
        .collect())
}

/// 非 Unix 平台: 通过 UDP "连接" 让系统选出出口地址（不发送数据）
#[cfg(not(unix))]
fn interface_ipv4_addrs() -> io::Result<Vec<Ipv4Addr>> {
    use std::net::{IpAddr, UdpSocket};

    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
    socket.connect((Ipv4Addr::new(8, 8, 8, 8), 80))?;
    match socket.local_addr()?.ip() {
        IpAddr::V4(ip) => Ok(vec![ip]),
        IpAddr::V6(_) => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> Ipv4Addr {
        s.parse().unwrap()
    }

    #[test]
    fn test_prefers_home_network() {
        let addrs = [ip("127.0.0.1"), ip("10.0.0.5"), ip("192.168.1.20")];
        assert_eq!(pick_lan_address(&addrs), Some(ip("192.168.1.20")));
    }

    #[test]
    fn test_skips_docker_bridge() {
        let addrs = [ip("172.17.0.1"), ip("10.1.2.3")];
        assert_eq!(pick_lan_address(&addrs), Some(ip("10.1.2.3")));
    }

    #[test]
    fn test_any_home_network_wins_first() {
        // 192.168.56.x 也属于 192.168 段，优先于其它地址
        let addrs = [ip("10.0.0.5"), ip("192.168.56.1")];
        assert_eq!(pick_lan_address(&addrs), Some(ip("192.168.56.1")));

        let addrs = [ip("192.168.56.1"), ip("192.168.1.20")];
        assert_eq!(pick_lan_address(&addrs), Some(ip("192.168.56.1")));
    }

    #[test]
    fn test_falls_back_to_virtual() {
        let addrs = [ip("127.0.0.1"), ip("172.17.0.1")];
        assert_eq!(pick_lan_address(&addrs), Some(ip("172.17.0.1")));
    }

    #[test]
    fn test_loopback_only() {
        assert_eq!(pick_lan_address(&[ip("127.0.0.1")]), None);
        assert_eq!(pick_lan_address(&[]), None);
    }

    #[test]
    fn test_local_ip_never_empty() {
        assert!(!local_ip().is_empty());
    }
}
