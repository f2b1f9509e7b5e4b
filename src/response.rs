use std::io;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// `Server` header value presented on the decoy login page.
pub const SERVER_BANNER: &str = "MikroTik RouterBoard 250GS httpd";

/// Digest challenge issued for `/sys.b`. The nonce is fixed; no digest sent
/// back is ever validated, the challenge only exists to make clients reveal
/// credentials on their follow-up request.
pub const DIGEST_CHALLENGE: &str =
    "Digest realm=\"CSS326-24G-2S+\", qop=\"auth\", nonce=\"b367c9dc\", stale=FALSE";

/// Status lines the emulated httpd can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Found,
    Unauthorized,
    Forbidden,
    MethodNotAllowed,
    InternalServerError,
}

impl Status {
    pub fn reason(self) -> &'static str {
        match self {
            Status::Ok => "200 OK",
            Status::Found => "302 Found",
            Status::Unauthorized => "401 Unauthorized",
            Status::Forbidden => "403 Forbidden",
            Status::MethodNotAllowed => "405 Method Not Allowed",
            Status::InternalServerError => "500 Internal Server Error",
        }
    }
}

/// One HTTP/1.0 response: status line, a fixed small header set, body.
/// Responses carry no persistent-connection semantics; the connection closes
/// after the body is written.
#[derive(Debug, Clone)]
pub struct Response {
    status: Status,
    headers: Vec<(&'static str, String)>,
    body: String,
}

impl Response {
    fn new(status: Status) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// 200 with the decoy page and the device-identifying `Server` header.
    pub fn login_page(html: String) -> Self {
        Self::new(Status::Ok)
            .header("Content-Type", "text/html")
            .header("Server", SERVER_BANNER)
            .body(html)
    }

    /// 401 digest challenge for `/sys.b`.
    pub fn auth_challenge() -> Self {
        Self::new(Status::Unauthorized)
            .header("WWW-Authenticate", DIGEST_CHALLENGE)
            .header("Content-Type", "text/html")
            .body("<h1>401 Unauthorized</h1>")
    }

    /// 302 pointing every unknown path back at the login page.
    pub fn redirect_to_login() -> Self {
        Self::new(Status::Found)
            .header("Location", "/index.html")
            .header("Content-Type", "text/html")
            .body("<html><body><h1>302 Found</h1></body></html>")
    }

    pub fn forbidden() -> Self {
        Self::new(Status::Forbidden)
            .header("Content-Type", "text/html")
            .body("<html><body><h1>403 Forbidden</h1></body></html>")
    }

    /// 405 for any verb outside GET/POST.
    pub fn method_not_allowed() -> Self {
        Self::new(Status::MethodNotAllowed)
            .header("Allow", "GET, POST")
            .header("Content-Type", "text/html")
            .body("<html><body><h1>405 Method Not Allowed</h1></body></html>")
    }

    /// 500 when the decoy page cannot be decoded.
    pub fn internal_error() -> Self {
        Self::new(Status::InternalServerError)
            .header("Content-Type", "text/html")
            .body("<html><body><h1>500 Internal Server Error</h1></body></html>")
    }

    /// Serialize to the HTTP/1.0 wire form with `\r\n` line termination.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut wire = format!("HTTP/1.0 {}\r\n", self.status.reason());
        for (name, value) in &self.headers {
            wire.push_str(name);
            wire.push_str(": ");
            wire.push_str(value);
            wire.push_str("\r\n");
        }
        wire.push_str("\r\n");
        wire.push_str(&self.body);
        wire.into_bytes()
    }

    pub async fn write_to<S>(&self, stream: &mut S) -> io::Result<()>
    where
        S: AsyncWrite + Unpin,
    {
        stream.write_all(&self.to_bytes()).await?;
        stream.shutdown().await
    }
}
