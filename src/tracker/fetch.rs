//! Page retrieval with charset-aware decoding.
//!
//! Tracker pages are frequently served as `windows-1251`. The body is decoded
//! with the first charset found in:
//!
//! 1. the `Content-Type` response header
//! 2. a `<meta ... charset=...>` declaration within the first 1024 bytes
//! 3. UTF-8
//!
//! Every request is bounded by a connect timeout and a total timeout so a
//! hanging tracker cannot stall a sweep.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use encoding_rs::{Encoding, UTF_8};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, ClientBuilder, Proxy};
use tracing::{debug, instrument, warn};

use super::FetchError;

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default total request timeout.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// How far into the body a `<meta charset>` declaration is searched for.
const META_SNIFF_LIMIT: usize = 1024;

const PROJECT_URL: &str = "https://github.com/fierce/magnet-sync";

fn user_agent() -> String {
    format!("magnet-sync/{} (+{PROJECT_URL})", env!("CARGO_PKG_VERSION"))
}

/// HTTP GET client returning decoded page text.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    /// Builds a fetcher with the default timeouts.
    ///
    /// # Errors
    ///
    /// Returns the client builder error if TLS or proxy setup fails.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_timeouts(DEFAULT_CONNECT_TIMEOUT, DEFAULT_FETCH_TIMEOUT)
    }

    /// Builds a fetcher with explicit timeouts.
    ///
    /// # Errors
    ///
    /// Returns the client builder error if TLS or proxy setup fails.
    pub fn with_timeouts(
        connect_timeout: Duration,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = build_client(connect_timeout, timeout)?;
        Ok(Self { client })
    }

    /// Fetches `url` and returns the body decoded to UTF-8.
    ///
    /// # Errors
    ///
    /// - [`FetchError::HttpStatus`] on any non-2xx response
    /// - [`FetchError::Timeout`] / [`FetchError::Network`] on transport failure
    /// - [`FetchError::Body`] if the body cannot be read
    #[instrument(skip(self))]
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_transport(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: status.to_string(),
            });
        }

        let header_charset = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(charset_from_content_type)
            .map(str::to_string);

        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Body {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let text = decode_body(&bytes, header_charset.as_deref());
        debug!(bytes = bytes.len(), "page fetched");
        Ok(text)
    }
}

/// Decodes `bytes` using the header charset, a sniffed meta charset, or UTF-8.
#[must_use]
pub fn decode_body(bytes: &[u8], header_charset: Option<&str>) -> String {
    let encoding = header_charset
        .and_then(|label| lookup_encoding(label, "header"))
        .or_else(|| sniff_meta_charset(bytes).and_then(|label| lookup_encoding(&label, "meta")))
        .unwrap_or(UTF_8);

    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        debug!(encoding = used.name(), "body contained malformed sequences");
    }
    text.into_owned()
}

fn lookup_encoding(label: &str, origin: &str) -> Option<&'static Encoding> {
    let encoding = Encoding::for_label(label.trim().as_bytes());
    if encoding.is_none() {
        warn!(label, origin, "unknown charset label, ignoring");
    }
    encoding
}

/// Extracts the `charset` parameter from a `Content-Type` value.
#[must_use]
pub fn charset_from_content_type(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if name.trim().eq_ignore_ascii_case("charset") {
            let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
            (!value.is_empty()).then_some(value)
        } else {
            None
        }
    })
}

/// Looks for `charset=` inside the first [`META_SNIFF_LIMIT`] bytes.
///
/// Covers both `<meta charset="...">` and the `http-equiv` form.
#[must_use]
pub fn sniff_meta_charset(bytes: &[u8]) -> Option<String> {
    let head = &bytes[..bytes.len().min(META_SNIFF_LIMIT)];
    let head = String::from_utf8_lossy(head).to_ascii_lowercase();

    let mut search_from = 0;
    while let Some(meta_pos) = head[search_from..].find("<meta") {
        let start = search_from + meta_pos;
        let end = head[start..].find('>').map_or(head.len(), |i| start + i);
        let tag = &head[start..end];

        if let Some(pos) = tag.find("charset=") {
            let label: String = tag[pos + "charset=".len()..]
                .trim_start_matches(['"', '\''])
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
                .collect();
            if !label.is_empty() {
                return Some(label);
            }
        }
        search_from = end;
    }
    None
}

enum BuildFailure {
    Panic,
    Build(reqwest::Error),
}

fn build_client(connect_timeout: Duration, timeout: Duration) -> Result<Client, reqwest::Error> {
    match try_build(connect_timeout, timeout, false) {
        Ok(client) => Ok(client),
        Err(BuildFailure::Build(error)) => Err(error),
        Err(BuildFailure::Panic) => {
            // Some sandboxes panic while reading system proxy settings.
            warn!("HTTP client builder panicked loading system proxy settings; using env proxies");
            match try_build(connect_timeout, timeout, true) {
                Ok(client) => Ok(client),
                Err(BuildFailure::Build(error)) => Err(error),
                Err(BuildFailure::Panic) => Client::builder().no_proxy().build(),
            }
        }
    }
}

fn try_build(
    connect_timeout: Duration,
    timeout: Duration,
    env_proxies_only: bool,
) -> Result<Client, BuildFailure> {
    catch_unwind(AssertUnwindSafe(move || {
        let mut builder = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(timeout)
            .user_agent(user_agent())
            .gzip(true);
        if env_proxies_only {
            builder = apply_env_proxies(builder.no_proxy());
        }
        builder.build().map_err(BuildFailure::Build)
    }))
    .map_err(|_| BuildFailure::Panic)?
}

fn apply_env_proxies(mut builder: ClientBuilder) -> ClientBuilder {
    for (scheme, names) in [
        ("https", ["HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"]),
        ("http", ["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"]),
    ] {
        let Some(value) = names.iter().find_map(|name| {
            std::env::var(name)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }) else {
            continue;
        };
        let proxy = if scheme == "https" {
            Proxy::https(&value)
        } else {
            Proxy::http(&value)
        };
        if let Ok(proxy) = proxy {
            builder = builder.proxy(proxy);
        }
    }
    builder
}
