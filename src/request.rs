use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::debug;

pub const USER_AGENT_SENTINEL: &str = "User-Agent Not Found";
pub const AUTHORIZATION_SENTINEL: &str = "No Authorization Header";

/// Upper bound on the bytes read per connection. The emulated device's httpd
/// answers tiny management requests; anything larger is truncated.
const MAX_REQUEST_BYTES: usize = 1024;

/// One request as observed on the wire: the request-line tokens plus the
/// ordered header lines, kept opaque except for the two headers the decoy
/// extracts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<String>,
}

impl RawRequest {
    /// Value of the first `User-Agent:` header, or the sentinel.
    pub fn user_agent(&self) -> String {
        self.header_value("User-Agent:")
            .unwrap_or_else(|| USER_AGENT_SENTINEL.to_string())
    }

    /// Value of the first `Authorization:` header, or the sentinel.
    pub fn authorization(&self) -> String {
        self.header_value("Authorization:")
            .unwrap_or_else(|| AUTHORIZATION_SENTINEL.to_string())
    }

    /// Exact case-sensitive prefix match; first occurrence wins.
    fn header_value(&self, prefix: &str) -> Option<String> {
        self.headers
            .iter()
            .find_map(|line| line.strip_prefix(prefix))
            .map(|value| value.trim().to_string())
    }
}

/// Read one request off the connection with a single bounded read.
///
/// `None` means the bytes never became a recognizable request (empty read,
/// non-text payload, short request line); the caller drops the connection
/// without a response or an audit entry.
pub async fn read_request<S>(stream: &mut S, peer: SocketAddr) -> Option<RawRequest>
where
    S: AsyncRead + Unpin,
{
    let mut buf = [0u8; MAX_REQUEST_BYTES];
    let n = match stream.read(&mut buf).await {
        Ok(0) => {
            debug!(%peer, "empty request");
            return None;
        }
        Ok(n) => n,
        Err(e) => {
            debug!(%peer, error = %e, "error receiving data");
            return None;
        }
    };

    let text = match std::str::from_utf8(&buf[..n]) {
        Ok(text) => text.trim(),
        Err(_) => {
            debug!(%peer, "non-UTF-8 request");
            return None;
        }
    };

    debug!(%peer, request = text, "request received");
    let parsed = parse(text);
    if parsed.is_none() {
        debug!(%peer, "malformed request line");
    }
    parsed
}

/// Single-pass parse of the decoded request text. The request line must
/// split into at least two whitespace-separated tokens (method, path);
/// anything less is malformed and yields `None`.
pub fn parse(text: &str) -> Option<RawRequest> {
    let mut lines = text.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?;
    let path = request_line.next()?;

    Some(RawRequest {
        method: method.to_string(),
        path: path.to_string(),
        headers: lines.map(str::to_string).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    fn peer() -> SocketAddr {
        "203.0.113.9:49152".parse().unwrap()
    }

    #[test]
    fn test_parse_request_with_headers() {
        let req = parse(
            "GET /index.html HTTP/1.0\r\nHost: 192.168.88.1\r\nUser-Agent: curl/8.0.1\r\nAuthorization: Digest username=\"admin\"",
        )
        .unwrap();
        assert_eq!(req.method, "GET");
        assert_eq!(req.path, "/index.html");
        assert_eq!(req.headers.len(), 3);
        assert_eq!(req.user_agent(), "curl/8.0.1");
        assert_eq!(req.authorization(), "Digest username=\"admin\"");
    }

    #[test]
    fn test_missing_headers_yield_sentinels() {
        let req = parse("POST /sys.b HTTP/1.0").unwrap();
        assert!(req.headers.is_empty());
        assert_eq!(req.user_agent(), USER_AGENT_SENTINEL);
        assert_eq!(req.authorization(), AUTHORIZATION_SENTINEL);
    }

    #[test]
    fn test_first_header_occurrence_wins() {
        let req = parse("GET / HTTP/1.0\r\nUser-Agent: first\r\nUser-Agent: second").unwrap();
        assert_eq!(req.user_agent(), "first");
    }

    #[test]
    fn test_header_match_is_case_sensitive() {
        let req = parse("GET / HTTP/1.0\r\nuser-agent: curl/8.0.1").unwrap();
        assert_eq!(req.user_agent(), USER_AGENT_SENTINEL);
    }

    #[test]
    fn test_parse_rejects_single_token_request_line() {
        assert!(parse("GARBAGE").is_none());
        assert!(parse("").is_none());
    }

    #[test]
    fn test_parse_accepts_two_token_request_line() {
        let req = parse("GET /foo").unwrap();
        assert_eq!(req.method, "GET");
        assert_eq!(req.path, "/foo");
    }

    #[tokio::test]
    async fn test_read_request_roundtrip() {
        let (mut client, mut server) = tokio::io::duplex(4096);
        client
            .write_all(b"GET /sys.b HTTP/1.0\r\nUser-Agent: test\r\n\r\n")
            .await
            .unwrap();
        drop(client);

        let req = read_request(&mut server, peer()).await.unwrap();
        assert_eq!(req.path, "/sys.b");
        assert_eq!(req.user_agent(), "test");
    }

    #[tokio::test]
    async fn test_read_request_empty_stream() {
        let (client, mut server) = tokio::io::duplex(64);
        drop(client);
        assert!(read_request(&mut server, peer()).await.is_none());
    }

    #[tokio::test]
    async fn test_read_request_non_utf8() {
        let (mut client, mut server) = tokio::io::duplex(64);
        client.write_all(&[0xff, 0xfe, 0x00, 0x80]).await.unwrap();
        drop(client);
        assert!(read_request(&mut server, peer()).await.is_none());
    }

    #[tokio::test]
    async fn test_read_request_whitespace_only() {
        let (mut client, mut server) = tokio::io::duplex(64);
        client.write_all(b"\r\n\r\n").await.unwrap();
        drop(client);
        assert!(read_request(&mut server, peer()).await.is_none());
    }
}
