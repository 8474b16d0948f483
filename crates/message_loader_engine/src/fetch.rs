use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;

use futures_util::StreamExt;
use loader_logging::{loader_debug, loader_trace};
use reqwest::header::CONTENT_TYPE;
use url::Url;

use crate::{FailureKind, FetchError, FetchMetadata, FetchOutput};

#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Base against which relative source URLs are resolved.
    pub base_url: Option<Url>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    /// Accepted media types; empty accepts anything.
    pub allowed_content_types: Vec<String>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
            max_bytes: 5 * 1024 * 1024,
            allowed_content_types: Vec::new(),
        }
    }
}

/// Retrieves the raw body behind a source URL.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchOutput, FetchError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    settings: FetchSettings,
}

impl ReqwestFetcher {
    pub fn new(settings: FetchSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    fn build_client(
        &self,
        url: &str,
        redirect_counter: Arc<AtomicUsize>,
    ) -> Result<reqwest::Client, FetchError> {
        let redirect_limit = self.settings.redirect_limit;
        let policy = reqwest::redirect::Policy::custom(move |attempt| {
            let count = attempt.previous().len();
            redirect_counter.store(count, Ordering::Relaxed);
            if count >= redirect_limit {
                attempt.error("redirect limit exceeded")
            } else {
                attempt.follow()
            }
        });

        reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .timeout(self.settings.request_timeout)
            .redirect(policy)
            .build()
            .map_err(|err| FetchError::new(url, FailureKind::Network, err.to_string()))
    }

    fn resolve(&self, url: &str) -> Result<Url, FetchError> {
        match Url::parse(url) {
            Ok(absolute) => Ok(absolute),
            Err(url::ParseError::RelativeUrlWithoutBase) => match &self.settings.base_url {
                Some(base) => base
                    .join(url)
                    .map_err(|err| FetchError::new(url, FailureKind::InvalidUrl, err.to_string())),
                None => Err(FetchError::new(
                    url,
                    FailureKind::InvalidUrl,
                    "relative url without a base url",
                )),
            },
            Err(err) => Err(FetchError::new(url, FailureKind::InvalidUrl, err.to_string())),
        }
    }

    fn is_content_type_allowed(&self, content_type: &str) -> bool {
        if self.settings.allowed_content_types.is_empty() {
            return true;
        }
        let ct = content_type.split(';').next().unwrap_or(content_type).trim();
        self.settings
            .allowed_content_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ct))
    }
}

#[async_trait::async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchOutput, FetchError> {
        let resolved = self.resolve(url)?;
        let redirect_counter = Arc::new(AtomicUsize::new(0));
        let client = self.build_client(url, redirect_counter.clone())?;

        loader_debug!("GET {} (source {})", resolved, url);
        let response = client
            .get(resolved.as_str())
            .send()
            .await
            .map_err(|err| map_reqwest_error(url, err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                url,
                FailureKind::HttpStatus(status.as_u16()),
                status.canonical_reason().unwrap_or_default(),
            ));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_bytes {
                return Err(FetchError::new(
                    url,
                    FailureKind::TooLarge {
                        max_bytes: self.settings.max_bytes,
                        actual: Some(content_len),
                    },
                    "response too large",
                ));
            }
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        if let Some(ct) = content_type.as_deref() {
            if !self.is_content_type_allowed(ct) {
                return Err(FetchError::new(
                    url,
                    FailureKind::UnsupportedContentType {
                        content_type: ct.to_string(),
                    },
                    "unsupported content type",
                ));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|err| map_reqwest_error(url, err))?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.settings.max_bytes {
                return Err(FetchError::new(
                    url,
                    FailureKind::TooLarge {
                        max_bytes: self.settings.max_bytes,
                        actual: Some(next_len),
                    },
                    "response too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
            loader_trace!("{}: {} bytes received", url, bytes.len());
        }

        let metadata = FetchMetadata {
            original_url: url.to_string(),
            final_url,
            redirect_count: redirect_counter.load(Ordering::Relaxed),
            content_type,
            byte_len: bytes.len() as u64,
        };

        Ok(FetchOutput { bytes, metadata })
    }
}

fn map_reqwest_error(url: &str, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(url, FailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return FetchError::new(url, FailureKind::RedirectLimitExceeded, err.to_string());
    }
    FetchError::new(url, FailureKind::Network, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_urls_need_a_base() {
        let fetcher = ReqwestFetcher::new(FetchSettings::default());
        let err = fetcher.resolve("messages.txt").unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidUrl);
        assert_eq!(err.url, "messages.txt");
    }

    #[test]
    fn relative_urls_resolve_against_base() {
        let settings = FetchSettings {
            base_url: Some(Url::parse("https://example.com/pages/index.html").unwrap()),
            ..FetchSettings::default()
        };
        let fetcher = ReqwestFetcher::new(settings);
        assert_eq!(
            fetcher.resolve("lib/data.txt").unwrap().as_str(),
            "https://example.com/pages/lib/data.txt"
        );
        assert_eq!(
            fetcher.resolve("https://other.example/m").unwrap().as_str(),
            "https://other.example/m"
        );
    }

    #[test]
    fn empty_allow_list_accepts_any_type() {
        let fetcher = ReqwestFetcher::new(FetchSettings::default());
        assert!(fetcher.is_content_type_allowed("application/octet-stream"));

        let strict = ReqwestFetcher::new(FetchSettings {
            allowed_content_types: vec!["text/plain".to_string()],
            ..FetchSettings::default()
        });
        assert!(strict.is_content_type_allowed("text/plain; charset=utf-8"));
        assert!(!strict.is_content_type_allowed("text/html"));
    }
}
