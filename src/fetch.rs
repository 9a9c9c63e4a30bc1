use std::sync::LazyLock;
use std::time::{Duration, Instant};

use encoding_rs::{Encoding, GB18030, UTF_8};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::settings::Settings;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
/// How far into the body to look for a `<meta charset>` declaration.
const SNIFF_BYTES: usize = 4096;

static CHARSET_RE: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r#"(?i)charset\s*=\s*"?([A-Za-z0-9_\-:.]+)"#).unwrap());
static META_CHARSET_RE: LazyLock<regex::bytes::Regex> = LazyLock::new(|| {
    regex::bytes::Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?([A-Za-z0-9_\-:.]+)"#).unwrap()
});

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to build HTTP client")]
    Client(#[source] reqwest::Error),
    #[error("Request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Fetch a page and decode it to text. Network and timeout failures are
/// returned as-is; there is no retry.
pub fn get_html(settings: &Settings) -> Result<String, FetchError> {
    let client = Client::builder()
        .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
        .timeout(Duration::from_secs(settings.timeout_secs))
        .build()
        .map_err(FetchError::Client)?;

    let url = settings.url.as_str();
    let request_err = |source: reqwest::Error| FetchError::Request {
        url: url.to_string(),
        source,
    };

    info!("Fetching {}", url);
    let start = Instant::now();
    let response = client
        .get(url)
        .header(USER_AGENT, settings.user_agent.as_str())
        .header(ACCEPT, ACCEPT_HTML)
        .send()
        .map_err(request_err)?;

    let status = response.status();
    if !status.is_success() {
        warn!("{} returned HTTP {}", url, status);
    }

    let declared = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(declared_charset);
    let body = response.bytes().map_err(request_err)?;

    info!(
        bytes = body.len(),
        status = status.as_u16(),
        "Fetched in {:.1}s",
        start.elapsed().as_secs_f64()
    );
    Ok(decode_body(&body, declared.as_deref()))
}

/// Charset named by a Content-Type header. A `text/*` type without one is
/// ISO-8859-1 under HTTP/1.1 defaults.
pub fn declared_charset(content_type: &str) -> Option<String> {
    if let Some(caps) = CHARSET_RE.captures(content_type) {
        return Some(caps[1].to_ascii_lowercase());
    }
    content_type
        .trim()
        .to_ascii_lowercase()
        .starts_with("text/")
        .then(|| "iso-8859-1".to_string())
}

/// Decode a response body. The generic ISO-8859-1 default is never trusted
/// and the body is read as UTF-8; any other case is decided from the content.
pub fn decode_body(body: &[u8], declared: Option<&str>) -> String {
    let encoding = match declared {
        Some(label) if is_latin1_default(label) => UTF_8,
        _ => sniff_encoding(body, declared),
    };
    debug!(encoding = encoding.name(), declared = ?declared, "decoding body");
    let (text, _, had_errors) = encoding.decode(body);
    if had_errors {
        warn!("Body had invalid {} sequences", encoding.name());
    }
    text.into_owned()
}

fn is_latin1_default(label: &str) -> bool {
    label.trim().eq_ignore_ascii_case("iso-8859-1")
}

/// Content-based detection: BOM, then `<meta charset>`, then UTF-8 validity,
/// then the declared label, and finally GB18030.
fn sniff_encoding(body: &[u8], declared: Option<&str>) -> &'static Encoding {
    if let Some((enc, _)) = Encoding::for_bom(body) {
        return enc;
    }

    let head = &body[..body.len().min(SNIFF_BYTES)];
    if let Some(enc) = META_CHARSET_RE
        .captures(head)
        .and_then(|c| Encoding::for_label(&c[1]))
    {
        return enc;
    }

    if std::str::from_utf8(body).is_ok() {
        return UTF_8;
    }

    declared
        .and_then(|l| Encoding::for_label(l.as_bytes()))
        .unwrap_or(GB18030)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charset_from_content_type() {
        assert_eq!(declared_charset("text/html; charset=GBK").as_deref(), Some("gbk"));
        assert_eq!(declared_charset("text/html; charset=\"utf-8\"").as_deref(), Some("utf-8"));
        assert_eq!(declared_charset("text/html").as_deref(), Some("iso-8859-1"));
        assert_eq!(declared_charset("application/json"), None);
    }

    #[test]
    fn latin1_default_is_read_as_utf8() {
        let body = "2024年1月 广东省".as_bytes();
        assert_eq!(decode_body(body, Some("iso-8859-1")), "2024年1月 广东省");
    }

    #[test]
    fn explicit_windows_1252_is_honored() {
        assert_eq!(decode_body(&[0x63, 0x61, 0x66, 0xE9], Some("windows-1252")), "café");
        assert_eq!(decode_body(&[0xE9], Some("latin1")), "é");
    }

    #[test]
    fn meta_charset_wins_over_header() {
        let html = "<html><head><meta charset=\"gbk\"></head><body>广东省</body></html>";
        let (bytes, _, _) = GB18030.encode(html);
        let text = decode_body(&bytes, Some("utf-8"));
        assert!(text.contains("广东省"));
    }

    #[test]
    fn undeclared_gbk_falls_back_to_gb18030() {
        let (bytes, _, _) = GB18030.encode("总发电量500.0亿千瓦时");
        assert_eq!(decode_body(&bytes, None), "总发电量500.0亿千瓦时");
    }

    #[test]
    fn valid_utf8_without_hints() {
        assert_eq!(decode_body("四川省".as_bytes(), None), "四川省");
    }

    #[test]
    fn bom_is_honored() {
        let mut body = vec![0xEF, 0xBB, 0xBF];
        body.extend_from_slice("水电".as_bytes());
        assert_eq!(decode_body(&body, Some("gbk")), "水电");
    }
}
