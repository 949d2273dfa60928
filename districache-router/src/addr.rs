//! Node-identity helpers. The ring stores opaque `scheme://host:port`
//! strings (spec §3 "Ring node"); the router is the only component that
//! needs to pick those apart, to reach the bare `host:port` the TCP worker
//! client dials and the port identifier the partition map and chaos log
//! lines use.

/// Builds the ring's node identity for a worker at `host:port`.
pub fn node_url(host: &str, port: u16) -> String {
    format!("districache://{host}:{port}")
}

/// Strips the scheme, leaving the `host:port` a `TcpStream` can dial.
pub fn bare_addr(node: &str) -> &str {
    node.split("://").nth(1).unwrap_or(node)
}

/// Extracts the port identifier used by the partition map and chaos logs.
pub fn port_of(node: &str) -> String {
    bare_addr(node).rsplit(':').next().unwrap_or(node).to_string()
}

/// Extracts the host portion of a node identity.
pub fn host_of(node: &str) -> &str {
    bare_addr(node).split(':').next().unwrap_or(node)
}

/// `true` for hosts the router considers "local" for the purposes of the
/// `AddNode` reachability contract (spec §4.3.3).
pub fn is_local_host(host: &str) -> bool {
    host == "127.0.0.1" || host == "localhost" || host == "::1"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_addr_strips_scheme() {
        assert_eq!(bare_addr("districache://127.0.0.1:8001"), "127.0.0.1:8001");
    }

    #[test]
    fn port_of_extracts_trailing_port() {
        assert_eq!(port_of("districache://127.0.0.1:8001"), "8001");
    }

    #[test]
    fn is_local_host_recognizes_loopback_forms() {
        assert!(is_local_host("127.0.0.1"));
        assert!(is_local_host("localhost"));
        assert!(!is_local_host("10.0.0.5"));
    }
}
