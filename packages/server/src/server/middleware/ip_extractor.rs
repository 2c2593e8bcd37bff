use axum::{
    extract::{ConnectInfo, Request},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::net::{IpAddr, SocketAddr};

/// Client address as seen through the proxy chain
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClientIp(pub IpAddr);

/// Resolve the client IP.
///
/// Priority:
/// 1. X-Forwarded-For header (first hop)
/// 2. X-Real-IP header
/// 3. Socket address
pub fn resolve_client_ip(headers: &HeaderMap, socket: IpAddr) -> IpAddr {
    let header_ip = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
    };

    header_ip("x-forwarded-for")
        .or_else(|| header_ip("x-real-ip"))
        .unwrap_or(socket)
}

/// Middleware storing [`ClientIp`] in request extensions
pub async fn extract_client_ip(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    mut request: Request,
    next: Next,
) -> Response {
    let ip = resolve_client_ip(request.headers(), addr.ip());
    request.extensions_mut().insert(ClientIp(ip));

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const SOCKET: IpAddr = IpAddr::V4(std::net::Ipv4Addr::new(10, 0, 0, 1));

    #[test]
    fn test_forwarded_for_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.2"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.1"));

        assert_eq!(
            resolve_client_ip(&headers, SOCKET),
            "203.0.113.7".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_real_ip_then_socket() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.1"));
        assert_eq!(
            resolve_client_ip(&headers, SOCKET),
            "198.51.100.1".parse::<IpAddr>().unwrap()
        );

        assert_eq!(resolve_client_ip(&HeaderMap::new(), SOCKET), SOCKET);
    }

    #[test]
    fn test_garbage_header_falls_through() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("not-an-ip"));
        assert_eq!(resolve_client_ip(&headers, SOCKET), SOCKET);
    }
}
