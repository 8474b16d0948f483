use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use message_loader_core::{Markers, GROUP_ATTRIBUTE, SOURCE_ATTRIBUTE};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{marker_selector, FetchSettings};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("invalid base_url {value:?}: {source}")]
    BaseUrl {
        value: String,
        source: url::ParseError,
    },
    #[error("invalid {field} {value:?}: {message}")]
    Attribute {
        field: &'static str,
        value: String,
        message: String,
    },
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// On-disk loader configuration (RON). Every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub source_attribute: String,
    pub group_attribute: String,
    pub base_url: Option<String>,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub allowed_content_types: Vec<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        let fetch = FetchSettings::default();
        Self {
            source_attribute: SOURCE_ATTRIBUTE.to_string(),
            group_attribute: GROUP_ATTRIBUTE.to_string(),
            base_url: None,
            connect_timeout_ms: fetch.connect_timeout.as_millis() as u64,
            request_timeout_ms: fetch.request_timeout.as_millis() as u64,
            redirect_limit: fetch.redirect_limit,
            max_bytes: fetch.max_bytes,
            allowed_content_types: fetch.allowed_content_types,
        }
    }
}

/// Validated settings ready to build a loader from.
#[derive(Debug, Clone)]
pub struct LoaderSettings {
    pub markers: Markers,
    pub fetch: FetchSettings,
}

impl LoaderConfig {
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron_str(&text)
    }

    /// Checks every field and builds the engine settings.
    ///
    /// Marker attribute names are lowercased, matching how HTML parsing
    /// stores attribute names.
    pub fn validate(&self) -> Result<LoaderSettings, ConfigError> {
        let source = check_attribute("source_attribute", &self.source_attribute)?;
        let group = check_attribute("group_attribute", &self.group_attribute)?;

        let base_url = self
            .base_url
            .as_deref()
            .map(|value| {
                Url::parse(value).map_err(|source| ConfigError::BaseUrl {
                    value: value.to_string(),
                    source,
                })
            })
            .transpose()?;

        if self.connect_timeout_ms == 0 {
            return Err(ConfigError::Zero("connect_timeout_ms"));
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::Zero("request_timeout_ms"));
        }
        if self.max_bytes == 0 {
            return Err(ConfigError::Zero("max_bytes"));
        }

        Ok(LoaderSettings {
            markers: Markers { source, group },
            fetch: FetchSettings {
                base_url,
                connect_timeout: Duration::from_millis(self.connect_timeout_ms),
                request_timeout: Duration::from_millis(self.request_timeout_ms),
                redirect_limit: self.redirect_limit,
                max_bytes: self.max_bytes,
                allowed_content_types: self.allowed_content_types.clone(),
            },
        })
    }
}

fn check_attribute(field: &'static str, value: &str) -> Result<String, ConfigError> {
    let name = value.to_ascii_lowercase();
    marker_selector(&name)
        .map(|_| name)
        .map_err(|err| ConfigError::Attribute {
            field,
            value: value.to_string(),
            message: err.to_string(),
        })
}
