use std::fmt::Write as _;

use loader_logging::{loader_debug, loader_info};
use message_loader_core::Markers;
use message_loader_engine::{NodeId, Page};

use crate::{collect_samples, DemoConfig, Expected, Histogram, Plot, Stats};

const NO_DATA: &str = r#"<span class="no-data">[no data]</span>"#;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    #[error("document has no body element")]
    NoBody,
    #[error("data container not found")]
    NoDataContainer,
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Fills the data container with one marked element per sample, creating a
/// hidden `<div id="data">` in the body when the page has none.
pub fn populate_data_container(
    page: &mut Page,
    config: &DemoConfig,
    markers: &Markers,
) -> Result<NodeId, AnalysisError> {
    let container = match page.select_first(&config.data_container) {
        Some(id) => id,
        None => {
            let body = page.body().ok_or(AnalysisError::NoBody)?;
            loader_debug!("creating hidden data container");
            page.append_html(body, r#"<div id="data" hidden=""></div>"#)
                .into_iter()
                .next()
                .ok_or(AnalysisError::NoDataContainer)?
        }
    };

    let element = format!(
        r#"<p {}="{}"></p>"#,
        markers.source,
        escape(config.data_src())
    );
    let markup = element.repeat(config.sample_count());
    page.set_inner_html(container, &markup);
    loader_info!("prepared {} sample elements", config.sample_count());
    Ok(container)
}

fn stats_table(stats: Option<&Stats>) -> String {
    let cell = |value: Option<String>| value.unwrap_or_else(|| NO_DATA.to_string());
    let rows = [
        ("Mean", cell(stats.map(|s| s.mean.to_string()))),
        ("Standard deviation", cell(stats.map(|s| s.stddev.to_string()))),
        ("Mode", cell(stats.map(|s| s.modes.to_string()))),
        ("Minimum value", cell(stats.map(|s| s.min.to_string()))),
        ("Maximum value", cell(stats.map(|s| s.max.to_string()))),
    ];
    let mut table = String::from("<table><tbody>");
    for (name, value) in rows {
        let _ = write!(table, "<tr><th>{name}</th><td>{value}</td></tr>");
    }
    table.push_str("</tbody></table>");
    table
}

fn section(id: &str, title: &str, body: &str) -> String {
    format!(r#"<section id="{id}"><h2>{title}</h2>{body}</section>"#)
}

/// The enabled report sections for `samples`.
pub fn render_report(config: &DemoConfig, samples: &[i64]) -> String {
    let stats = Stats::calculate(samples);
    let mut report = format!(r#"<h1>{}</h1>"#, escape(&config.name));
    if config.show_stats {
        report.push_str(&section("statistics", "Statistics", &stats_table(stats.as_ref())));
    }
    if config.show_histogram {
        let body = if samples.is_empty() {
            NO_DATA.to_string()
        } else {
            Histogram::new(
                samples,
                config.value_min(),
                config.value_max(),
                config.samples_per_value(),
            )
            .to_svg()
        };
        report.push_str(&section("histogram", "Histogram", &body));
    }
    if config.show_plot {
        let body = if samples.is_empty() {
            NO_DATA.to_string()
        } else {
            Plot::new(samples).to_svg()
        };
        report.push_str(&section("plot", "Plot", &body));
    }
    report
}

/// What a perfectly uniform run would look like, for comparison.
pub fn render_explanation(config: &DemoConfig) -> String {
    let expected = Expected::for_range(config.value_min(), config.value_max());
    let mut explanation = String::from(
        "<p>Messages should be selected randomly but uniformly. \
         The expected values below are for a perfect run where every value \
         is drawn exactly the same number of times.</p>",
    );
    let _ = write!(
        explanation,
        "<table><tbody>\
         <tr><th>Mean</th><td>{}</td></tr>\
         <tr><th>Standard deviation</th><td>{}</td></tr>\
         <tr><th>Mode</th><td>{}</td></tr>\
         <tr><th>Minimum value</th><td>{}</td></tr>\
         <tr><th>Maximum value</th><td>{}</td></tr>\
         </tbody></table>",
        expected.mean,
        expected.stddev,
        expected.modes(),
        expected.min,
        expected.max
    );
    let _ = write!(
        explanation,
        "<p>Each of the {} values should appear {} times in {} samples.</p>",
        config.value_count(),
        config.samples_per_value(),
        config.sample_count()
    );
    explanation
}

/// Reads the samples out of `container` (as returned by
/// [`populate_data_container`]), removes it, and renders the report into the
/// main container (or the body when there is none).
///
/// Returns the computed statistics, `None` when no numeric samples were found.
pub fn analyze(
    page: &mut Page,
    config: &DemoConfig,
    container: NodeId,
) -> Result<Option<Stats>, AnalysisError> {
    if page.inner_html(container).is_none() {
        return Err(AnalysisError::NoDataContainer);
    }
    let samples = collect_samples(page, container);
    page.remove(container);
    loader_info!("analyzing {} samples", samples.len());

    let main = match page.select_first(&config.main_container) {
        Some(id) => id,
        None => page.body().ok_or(AnalysisError::NoBody)?,
    };
    page.append_html(main, &render_report(config, &samples));

    if config.show_explanation {
        let explanation = render_explanation(config);
        match page.select_first(&config.explanation_container) {
            Some(target) => {
                page.append_html(target, &explanation);
            }
            None => {
                page.append_html(main, &section("explanation", "Explanation", &explanation));
            }
        }
    }

    Ok(Stats::calculate(&samples))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(pairs: &[(&str, &str)]) -> DemoConfig {
        let mut values: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        values.entry("name".to_string()).or_insert_with(|| "demo".to_string());
        DemoConfig::from_values(&values).unwrap()
    }

    #[test]
    fn stats_table_shows_no_data_markers() {
        let table = stats_table(None);
        assert_eq!(table.matches(NO_DATA).count(), 5);
    }

    #[test]
    fn disabled_sections_are_left_out() {
        let report = render_report(&config(&[("show-histogram", "false"), ("show-plot", "false")]), &[1, 2]);
        assert!(report.contains(r#"<section id="statistics">"#));
        assert!(!report.contains("<svg"));
    }

    #[test]
    fn names_are_escaped() {
        let report = render_report(&config(&[("name", "<b>&</b>")]), &[]);
        assert!(report.starts_with("<h1>&lt;b&gt;&amp;&lt;/b&gt;</h1>"));
    }

    #[test]
    fn explanation_lists_expected_values() {
        let explanation = render_explanation(&config(&[]));
        assert!(explanation.contains("<td>49.5</td>"));
        assert!(explanation.contains("<td>28.866</td>"));
        assert!(explanation.contains("<td>no mode</td>"));
    }
}
