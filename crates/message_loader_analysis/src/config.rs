use std::collections::HashMap;

use loader_logging::loader_warn;
use message_loader_engine::Page;
use scraper::Selector;

/// Message file holding the numeric sample values.
pub const DATA_SRC: &str = "lib/data.txt";
pub const VALUE_MIN: i64 = 0;
pub const VALUE_MAX: i64 = 99;
pub const SAMPLES_PER_VALUE: usize = 100;

const META_PREFIX: &str = "srml.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OptionKind {
    Text,
    Selector,
    Boolean,
}

/// Every recognised option: `(key, type, default)`. `None` means required.
const OPTIONS: &[(&str, OptionKind, Option<&str>)] = &[
    ("name", OptionKind::Text, None),
    ("main-container-selector", OptionKind::Selector, Some("main")),
    ("data-container-selector", OptionKind::Selector, Some("#data")),
    ("show-stats", OptionKind::Boolean, Some("true")),
    ("show-histogram", OptionKind::Boolean, Some("true")),
    ("show-plot", OptionKind::Boolean, Some("true")),
    ("show-explanation", OptionKind::Boolean, Some("true")),
    ("explanation-container-selector", OptionKind::Selector, Some("#explanation")),
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DemoConfigError {
    #[error("required meta element 'srml.{0}' is missing")]
    Missing(&'static str),
    #[error("malformed boolean value for '{name}': {value}")]
    MalformedBoolean { name: &'static str, value: String },
    #[error("invalid selector for '{name}': {value}: {message}")]
    InvalidSelector {
        name: &'static str,
        value: String,
        message: String,
    },
}

/// Configuration of a randomness demonstration page.
#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub name: String,
    pub main_container: Selector,
    pub data_container: Selector,
    pub show_stats: bool,
    pub show_histogram: bool,
    pub show_plot: bool,
    pub show_explanation: bool,
    pub explanation_container: Selector,
}

impl DemoConfig {
    /// Reads `<meta name="srml.KEY" content="VALUE">` elements from `page`.
    pub fn from_page(page: &Page) -> Result<Self, DemoConfigError> {
        let mut values = HashMap::new();
        if let Ok(selector) = Selector::parse("meta[name]") {
            for meta in page.select(&selector) {
                let Some(key) = meta
                    .value()
                    .attr("name")
                    .and_then(|name| name.strip_prefix(META_PREFIX))
                else {
                    continue;
                };
                let content = meta.value().attr("content").unwrap_or_default();
                values.insert(key.to_string(), content.to_string());
            }
        }
        Self::from_values(&values)
    }

    /// Builds the configuration from raw `key -> value` pairs, validating eagerly.
    pub fn from_values(values: &HashMap<String, String>) -> Result<Self, DemoConfigError> {
        for key in values.keys() {
            if !OPTIONS.iter().any(|(name, _, _)| name == key) {
                loader_warn!("ignoring unknown demo option 'srml.{}'", key);
            }
        }

        let raw = |name: &'static str| lookup(values, name);

        Ok(Self {
            name: raw("name")?.to_string(),
            main_container: parse_selector("main-container-selector", raw("main-container-selector")?)?,
            data_container: parse_selector("data-container-selector", raw("data-container-selector")?)?,
            show_stats: parse_bool("show-stats", raw("show-stats")?)?,
            show_histogram: parse_bool("show-histogram", raw("show-histogram")?)?,
            show_plot: parse_bool("show-plot", raw("show-plot")?)?,
            show_explanation: parse_bool("show-explanation", raw("show-explanation")?)?,
            explanation_container: parse_selector(
                "explanation-container-selector",
                raw("explanation-container-selector")?,
            )?,
        })
    }

    pub fn data_src(&self) -> &'static str {
        DATA_SRC
    }

    pub fn value_min(&self) -> i64 {
        VALUE_MIN
    }

    pub fn value_max(&self) -> i64 {
        VALUE_MAX
    }

    /// Number of distinct sample values.
    pub fn value_count(&self) -> usize {
        (VALUE_MAX - VALUE_MIN + 1) as usize
    }

    pub fn samples_per_value(&self) -> usize {
        SAMPLES_PER_VALUE
    }

    pub fn sample_count(&self) -> usize {
        self.value_count() * SAMPLES_PER_VALUE
    }
}

fn lookup<'a>(values: &'a HashMap<String, String>, name: &'static str) -> Result<&'a str, DemoConfigError> {
    let default = OPTIONS
        .iter()
        .find(|(key, _, _)| *key == name)
        .and_then(|(_, _, default)| *default);
    values
        .get(name)
        .map(String::as_str)
        .or(default)
        .ok_or(DemoConfigError::Missing(name))
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, DemoConfigError> {
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(DemoConfigError::MalformedBoolean {
            name,
            value: value.to_string(),
        })
    }
}

fn parse_selector(name: &'static str, value: &str) -> Result<Selector, DemoConfigError> {
    Selector::parse(value).map_err(|err| DemoConfigError::InvalidSelector {
        name,
        value: value.to_string(),
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn every_option_kind_is_covered() {
        for &(name, kind, default) in OPTIONS {
            match (kind, default) {
                (OptionKind::Boolean, Some(value)) => assert!(parse_bool(name, value).is_ok()),
                (OptionKind::Selector, Some(value)) => assert!(parse_selector(name, value).is_ok()),
                (OptionKind::Text, None) => assert_eq!(name, "name"),
                other => panic!("unexpected option {name}: {other:?}"),
            }
        }
    }

    #[test]
    fn name_is_required() {
        let err = DemoConfig::from_values(&values(&[("show-plot", "false")])).unwrap_err();
        assert_eq!(err, DemoConfigError::Missing("name"));
    }

    #[test]
    fn defaults_apply_and_booleans_ignore_case() {
        let config =
            DemoConfig::from_values(&values(&[("name", "basic"), ("show-plot", "FALSE")])).unwrap();
        assert_eq!(config.name, "basic");
        assert!(config.show_stats);
        assert!(config.show_histogram);
        assert!(!config.show_plot);
        assert!(config.show_explanation);
        assert_eq!(config.sample_count(), 10_000);
        assert_eq!(config.value_count(), 100);
    }

    #[test]
    fn malformed_values_are_reported() {
        let err = DemoConfig::from_values(&values(&[("name", "x"), ("show-stats", "yes")])).unwrap_err();
        assert_eq!(
            err,
            DemoConfigError::MalformedBoolean {
                name: "show-stats",
                value: "yes".to_string()
            }
        );

        let err = DemoConfig::from_values(&values(&[("name", "x"), ("data-container-selector", "##")]))
            .unwrap_err();
        assert!(matches!(
            err,
            DemoConfigError::InvalidSelector {
                name: "data-container-selector",
                ..
            }
        ));
    }
}
