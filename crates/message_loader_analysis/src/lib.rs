//! Randomness analysis for demonstration pages.
//!
//! Reads the numbers the loader wrote into a page and renders a report of them.
mod config;
mod histogram;
mod report;
mod samples;
mod stats;

pub use config::{DemoConfig, DemoConfigError, DATA_SRC, SAMPLES_PER_VALUE, VALUE_MAX, VALUE_MIN};
pub use histogram::{Bucket, Histogram, Plot};
pub use report::{analyze, populate_data_container, render_explanation, render_report, AnalysisError};
pub use samples::{collect_samples, parse_leading_int};
pub use stats::{Expected, Modes, Stats};
