//! Sockets held by a process, read from procfs.
//!
//! A process's sockets are the `socket:[inode]` links under
//! `/proc/<pid>/fd`; their addresses and states come from the
//! `/proc/<pid>/net/{tcp,tcp6,udp,udp6}` tables.

use serde::Serialize;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

/// Transport of a socket table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Tcp6,
    Udp,
    Udp6,
}

impl Protocol {
    pub const ALL: [Protocol; 4] = [Protocol::Tcp, Protocol::Tcp6, Protocol::Udp, Protocol::Udp6];

    /// File name of the table under `/proc/<pid>/net`.
    pub fn table_name(self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Tcp6 => "tcp6",
            Protocol::Udp => "udp",
            Protocol::Udp6 => "udp6",
        }
    }

    fn is_tcp(self) -> bool {
        matches!(self, Protocol::Tcp | Protocol::Tcp6)
    }
}

/// One socket of a process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Connection {
    pub protocol: Protocol,
    pub local: SocketAddr,
    /// `None` for unconnected sockets
    pub remote: Option<SocketAddr>,
    pub state: &'static str,
    pub inode: u64,
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.protocol.table_name(), self.local)?;
        if let Some(remote) = self.remote {
            write!(f, " -> {remote}")?;
        }
        write!(f, " {}", self.state)
    }
}

fn tcp_state(code: &str) -> &'static str {
    match code {
        "01" => "ESTABLISHED",
        "02" => "SYN_SENT",
        "03" => "SYN_RECV",
        "04" => "FIN_WAIT1",
        "05" => "FIN_WAIT2",
        "06" => "TIME_WAIT",
        "07" => "CLOSE",
        "08" => "CLOSE_WAIT",
        "09" => "LAST_ACK",
        "0A" => "LISTEN",
        "0B" => "CLOSING",
        _ => "UNKNOWN",
    }
}

/// Parse `ADDR:PORT` as printed by the kernel: the address is the raw
/// network-order words in host-order hex, the port plain hex.
fn parse_endpoint(field: &str) -> Option<SocketAddr> {
    let (addr, port) = field.split_once(':')?;
    let port = u16::from_str_radix(port, 16).ok()?;
    let ip = match addr.len() {
        8 => IpAddr::V4(Ipv4Addr::from(
            u32::from_str_radix(addr, 16).ok()?.to_ne_bytes(),
        )),
        32 => {
            let mut octets = [0u8; 16];
            for (i, chunk) in octets.chunks_mut(4).enumerate() {
                let word = u32::from_str_radix(addr.get(i * 8..i * 8 + 8)?, 16).ok()?;
                chunk.copy_from_slice(&word.to_ne_bytes());
            }
            IpAddr::V6(Ipv6Addr::from(octets))
        }
        _ => return None,
    };
    Some(SocketAddr::new(ip, port))
}

/// Parse one `/proc/net/{tcp,udp}[6]` table. The header line and
/// malformed rows are skipped.
pub fn parse_net_table(protocol: Protocol, content: &str) -> Vec<Connection> {
    content
        .lines()
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            let local = parse_endpoint(fields.get(1)?)?;
            let remote = parse_endpoint(fields.get(2)?)?;
            let state = fields.get(3)?;
            let inode = fields.get(9)?.parse::<u64>().ok()?;
            Some(Connection {
                protocol,
                local,
                remote: (!remote.ip().is_unspecified() || remote.port() != 0).then_some(remote),
                state: if protocol.is_tcp() {
                    tcp_state(state)
                } else {
                    "NONE"
                },
                inode,
            })
        })
        .collect()
}

/// Inode of a `socket:[inode]` fd link target.
pub fn parse_socket_inode(link: &str) -> Option<u64> {
    link.strip_prefix("socket:[")?
        .strip_suffix(']')?
        .parse()
        .ok()
}

/// Sockets held by process `pid`, ordered by protocol then inode.
/// Unreadable fd directories (other users' processes) yield no sockets.
#[cfg(target_os = "linux")]
pub fn process_connections(pid: u32) -> Vec<Connection> {
    use std::collections::BTreeSet;
    use std::fs;
    use tracing::debug;

    let inodes: BTreeSet<u64> = match fs::read_dir(format!("/proc/{pid}/fd")) {
        Ok(entries) => entries
            .filter_map(|entry| fs::read_link(entry.ok()?.path()).ok())
            .filter_map(|target| parse_socket_inode(target.to_str()?))
            .collect(),
        Err(e) => {
            debug!("Cannot list descriptors of pid {}: {}", pid, e);
            return Vec::new();
        }
    };
    if inodes.is_empty() {
        return Vec::new();
    }

    let mut connections = Vec::new();
    for protocol in Protocol::ALL {
        let path = format!("/proc/{pid}/net/{}", protocol.table_name());
        match fs::read_to_string(&path) {
            Ok(content) => {
                let mut table: Vec<Connection> = parse_net_table(protocol, &content)
                    .into_iter()
                    .filter(|c| inodes.contains(&c.inode))
                    .collect();
                table.sort_by_key(|c| c.inode);
                connections.extend(table);
            }
            Err(e) => debug!("Cannot read {}: {}", path, e),
        }
    }
    connections
}

#[cfg(not(target_os = "linux"))]
pub fn process_connections(_pid: u32) -> Vec<Connection> {
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TCP: &str = "  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode
   0: 0100007F:1F90 00000000:0000 0A 00000000:00000000 00:00000000 00000000  1000        0 48213 1 0000000000000000 100 0 0 10 0
   1: 0100007F:D2F0 0100007F:1F90 01 00000000:00000000 00:00000000 00000000  1000        0 48377 1 0000000000000000 20 4 30 10 -1
   2: garbage
";

    #[cfg(target_endian = "little")]
    #[test]
    fn test_parse_tcp_table() {
        let connections = parse_net_table(Protocol::Tcp, TCP);
        assert_eq!(connections.len(), 2);

        assert_eq!(connections[0].local, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(connections[0].remote, None);
        assert_eq!(connections[0].state, "LISTEN");
        assert_eq!(connections[0].inode, 48213);

        assert_eq!(connections[1].remote, Some("127.0.0.1:8080".parse().unwrap()));
        assert_eq!(connections[1].state, "ESTABLISHED");
        assert_eq!(
            connections[1].to_string(),
            "tcp 127.0.0.1:54000 -> 127.0.0.1:8080 ESTABLISHED"
        );
    }

    #[cfg(target_endian = "little")]
    #[test]
    fn test_parse_udp6_table() {
        let table = "  sl  local_address                         remote_address                        st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode ref pointer drops
  12: 00000000000000000000000001000000:14E9 00000000000000000000000000000000:0000 07 00000000:00000000 00:00000000 00000000   104        0 17722 2 0000000000000000 0
";
        let connections = parse_net_table(Protocol::Udp6, table);
        assert_eq!(connections.len(), 1);
        assert_eq!(connections[0].local, "[::1]:5353".parse().unwrap());
        assert_eq!(connections[0].remote, None);
        assert_eq!(connections[0].state, "NONE");
    }

    #[test]
    fn test_parse_socket_inode() {
        assert_eq!(parse_socket_inode("socket:[48213]"), Some(48213));
        assert_eq!(parse_socket_inode("pipe:[48213]"), None);
        assert_eq!(parse_socket_inode("/dev/null"), None);
        assert_eq!(parse_socket_inode("socket:[]"), None);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_own_listening_socket_is_reported() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let connections = process_connections(std::process::id());
        assert!(connections.iter().any(|c| c.protocol == Protocol::Tcp
            && c.local.port() == port
            && c.state == "LISTEN"));
    }
}
