use url::Url;

use crate::error::BridgeError;

/// `ws(s)://host:port/api/websocket` for a Home Assistant instance.
pub fn websocket_url(host: &str, port: u16, ssl: bool) -> Result<Url, BridgeError> {
    let host = host.trim();
    if host.is_empty() {
        return Err(BridgeError::InvalidEndpoint("empty host".into()));
    }
    let scheme = if ssl { "wss" } else { "ws" };
    let host = if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]")
    } else {
        host.to_string()
    };
    let raw = format!("{scheme}://{host}:{port}/api/websocket");
    Url::parse(&raw).map_err(|err| BridgeError::InvalidEndpoint(format!("{raw}: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_plain_and_tls_urls() {
        assert_eq!(
            websocket_url("192.168.1.10", 8123, false).unwrap().as_str(),
            "ws://192.168.1.10:8123/api/websocket"
        );
        assert_eq!(
            websocket_url("ha.example.org", 443, true).unwrap().as_str(),
            "wss://ha.example.org/api/websocket"
        );
    }

    #[test]
    fn brackets_ipv6_hosts() {
        assert_eq!(
            websocket_url("::1", 8123, false).unwrap().as_str(),
            "ws://[::1]:8123/api/websocket"
        );
    }

    #[test]
    fn rejects_empty_host() {
        assert!(matches!(
            websocket_url(" ", 8123, false),
            Err(BridgeError::InvalidEndpoint(_))
        ));
    }
}
