use std::collections::HashMap;

use message_loader_core::Markers;
use message_loader_engine::{
    FailureKind, FetchError, FetchMetadata, FetchOutput, Fetcher, Loader, NullSink, Page,
};
use message_loader_analysis::{analyze, populate_data_container, DemoConfig, DemoConfigError, Modes};
use rand::rngs::StdRng;
use rand::SeedableRng;
use pretty_assertions::assert_eq;
use scraper::Selector;

/// Serves the demo value file from memory.
struct DataFetcher {
    files: HashMap<String, String>,
}

#[async_trait::async_trait]
impl Fetcher for DataFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchOutput, FetchError> {
        let body = self
            .files
            .get(url)
            .ok_or_else(|| FetchError::new(url, FailureKind::HttpStatus(404), "Not Found"))?;
        Ok(FetchOutput {
            bytes: body.clone().into_bytes(),
            metadata: FetchMetadata {
                original_url: url.to_string(),
                final_url: url.to_string(),
                redirect_count: 0,
                content_type: Some("text/plain".to_string()),
                byte_len: body.len() as u64,
            },
        })
    }
}

const PAGE: &str = r#"<html><head>
<meta name="srml.name" content="basic">
<meta name="srml.show-plot" content="false">
</head><body><main></main></body></html>"#;

fn count(page: &Page, selector: &str) -> usize {
    let selector = Selector::parse(selector).unwrap();
    page.select(&selector).count()
}

#[tokio::test]
async fn demo_page_is_populated_loaded_and_analyzed() {
    let mut page = Page::parse(PAGE);
    let config = DemoConfig::from_page(&page).unwrap();
    assert!(!config.show_plot);

    let markers = Markers::default();
    let container = populate_data_container(&mut page, &config, &markers).unwrap();
    assert_eq!(count(&page, "#data > p"), config.sample_count());

    let values: Vec<String> = (0..=99).map(|v| v.to_string()).collect();
    let fetcher = DataFetcher {
        files: HashMap::from([(config.data_src().to_string(), values.join("\n"))]),
    };
    let loader = Loader::new(fetcher, markers);
    let report = loader
        .run(page.into(), &mut StdRng::seed_from_u64(7), &NullSink)
        .await
        .unwrap();
    assert_eq!(report.succeeded(), 1);

    let mut page = report.page;
    let stats = analyze(&mut page, &config, container).unwrap().unwrap();

    assert_eq!(stats.count, 10_000);
    assert!(stats.min >= 0 && stats.max <= 99);
    assert!((stats.mean - 49.5).abs() < 2.0, "mean {}", stats.mean);
    assert!(matches!(stats.modes, Modes::Values(_) | Modes::NoMode));
    assert_eq!(count(&page, "#data"), 0);
    assert_eq!(count(&page, "main #statistics"), 1);
    assert_eq!(count(&page, "main #histogram"), 1);
    assert_eq!(count(&page, "#plot"), 0);
    assert_eq!(count(&page, "#explanation"), 1);
}

#[tokio::test]
async fn failed_data_fetch_reports_no_data() {
    let mut page = Page::parse(PAGE);
    let config = DemoConfig::from_page(&page).unwrap();
    let markers = Markers::default();
    let container = populate_data_container(&mut page, &config, &markers).unwrap();

    let loader = Loader::new(DataFetcher { files: HashMap::new() }, markers);
    let report = loader
        .run(page.into(), &mut StdRng::seed_from_u64(7), &NullSink)
        .await
        .unwrap();
    assert_eq!(report.failed(), 1);

    let mut page = report.page;
    assert_eq!(analyze(&mut page, &config, container).unwrap(), None);
    assert!(page.html().contains("[no data]"));
}

#[test]
fn existing_containers_are_reused() {
    let mut page = Page::parse(
        r#"<head><meta name="srml.name" content="x"><meta name="srml.data-container-selector" content=".samples"></head>
        <body><section class="samples"><p>stale</p></section><div id="explanation"></div></body>"#,
    );
    let config = DemoConfig::from_page(&page).unwrap();

    let container = populate_data_container(&mut page, &config, &Markers::default()).unwrap();
    assert_eq!(page.attribute(container, "class"), Some("samples"));
    assert_eq!(count(&page, ".samples > p[data-saria-random-message-src]"), 10_000);

    analyze(&mut page, &config, container).unwrap();
    assert_eq!(count(&page, ".samples"), 0);
    assert_eq!(count(&page, "div#explanation > p"), 2);
    assert_eq!(count(&page, "body > #statistics"), 1);
}

#[tokio::test]
async fn created_container_is_analyzed_when_custom_selector_matches_nothing() {
    let mut page = Page::parse(
        r#"<head><meta name="srml.name" content="x"><meta name="srml.data-container-selector" content=".samples"></head>
        <body><main></main></body>"#,
    );
    let config = DemoConfig::from_page(&page).unwrap();
    let markers = Markers::default();

    let container = populate_data_container(&mut page, &config, &markers).unwrap();
    assert_eq!(page.attribute(container, "id"), Some("data"));
    assert_eq!(count(&page, ".samples"), 0);

    let fetcher = DataFetcher {
        files: HashMap::from([(config.data_src().to_string(), "5".to_string())]),
    };
    let report = Loader::new(fetcher, markers)
        .run(page.into(), &mut StdRng::seed_from_u64(1), &NullSink)
        .await
        .unwrap();

    let mut page = report.page;
    let stats = analyze(&mut page, &config, container).unwrap().unwrap();
    assert_eq!(stats.count, 10_000);
    assert_eq!((stats.min, stats.max), (5, 5));
    assert_eq!(stats.modes, Modes::Values(vec![5]));
    assert_eq!(count(&page, "#data"), 0);
    assert_eq!(count(&page, "main #statistics"), 1);
}

#[test]
fn missing_name_is_rejected() {
    let page = Page::parse(r#"<meta name="srml.show-stats" content="true">"#);
    assert_eq!(
        DemoConfig::from_page(&page).unwrap_err(),
        DemoConfigError::Missing("name")
    );
}
