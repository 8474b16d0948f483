use std::collections::BTreeMap;
use std::fmt;

const MAX_MODES: usize = 5;

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Most frequent values, or none when there are too many to be meaningful.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modes {
    Values(Vec<i64>),
    NoMode,
}

impl fmt::Display for Modes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modes::Values(values) if !values.is_empty() => {
                let joined: Vec<String> = values.iter().map(i64::to_string).collect();
                f.write_str(&joined.join(", "))
            }
            _ => f.write_str("no mode"),
        }
    }
}

/// Summary statistics over a set of samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Stats {
    pub count: usize,
    pub mean: f64,
    /// Population standard deviation.
    pub stddev: f64,
    pub modes: Modes,
    pub min: i64,
    pub max: i64,
}

impl Stats {
    /// Returns `None` for an empty sample set.
    pub fn calculate(samples: &[i64]) -> Option<Self> {
        let min = *samples.iter().min()?;
        let max = *samples.iter().max()?;
        let n = samples.len() as f64;

        let mean = samples.iter().map(|&s| s as f64).sum::<f64>() / n;
        let variance = samples
            .iter()
            .map(|&s| (s as f64 - mean).powi(2))
            .sum::<f64>()
            / n;

        Some(Self {
            count: samples.len(),
            mean: round3(mean),
            stddev: round3(variance.sqrt()),
            modes: modes(samples),
            min,
            max,
        })
    }
}

/// Most frequent sample values in ascending order; more than five is no mode.
fn modes(samples: &[i64]) -> Modes {
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for &sample in samples {
        *counts.entry(sample).or_default() += 1;
    }
    let highest = counts.values().copied().max().unwrap_or(0);
    let values: Vec<i64> = counts
        .into_iter()
        .filter(|&(_, count)| count == highest)
        .map(|(value, _)| value)
        .collect();
    if values.is_empty() || values.len() > MAX_MODES {
        Modes::NoMode
    } else {
        Modes::Values(values)
    }
}

/// Statistics of a perfectly uniform run over `[min, max]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Expected {
    pub mean: f64,
    pub stddev: f64,
    pub min: i64,
    pub max: i64,
}

impl Expected {
    pub fn for_range(min: i64, max: i64) -> Self {
        let span = (max - min) as f64;
        let n = span + 1.0;
        Self {
            mean: round3(span / 2.0 + min as f64),
            stddev: round3(((n * n - 1.0) / 12.0).sqrt()),
            min,
            max,
        }
    }

    pub fn modes(&self) -> Modes {
        Modes::NoMode
    }
}
