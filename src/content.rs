use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use flate2::read::GzDecoder;
use std::io::Read;

/// Login page captured from a real CSS326-24G-2S+, stored gzipped and
/// base64-encoded so the binary carries no recognizable HTML.
const LOGIN_PAGE_B64: &str = include_str!("../assets/login_page.b64");

/// Decoy content decoding error
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("base64 decode failed: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("gzip decompression failed: {0}")]
    Decompress(#[from] std::io::Error),

    #[error("decoy page is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Decode the embedded decoy page. The page is small, so decoding runs per
/// request rather than once at startup.
pub fn decoy_page() -> Result<String, ContentError> {
    decode(LOGIN_PAGE_B64)
}

fn decode(blob: &str) -> Result<String, ContentError> {
    let compressed = STANDARD.decode(blob.trim())?;
    let mut html = Vec::new();
    GzDecoder::new(compressed.as_slice()).read_to_end(&mut html)?;
    Ok(String::from_utf8(html)?)
}
