use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use loader_logging::{loader_info, loader_warn};
use message_loader_analysis::{analyze, populate_data_container, DemoConfig};
use message_loader_engine::{Loader, LoaderConfig, LoaderSettings, NullSink, Page, ReqwestFetcher, RunReport};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::RunArgs;

/// Reads the config file (if any) and applies command-line overrides.
fn settings(args: &RunArgs) -> Result<LoaderSettings> {
    let mut config = match &args.config {
        Some(path) => LoaderConfig::load(path)?,
        None => LoaderConfig::default(),
    };
    if let Some(base_url) = &args.base_url {
        config.base_url = Some(base_url.clone());
    }
    Ok(config.validate()?)
}

fn rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

fn read_page(path: &Path) -> Result<Page> {
    let source = fs::read_to_string(path).with_context(|| format!("failed to read {path:?}"))?;
    Ok(Page::parse(&source))
}

fn write_output(path: Option<&Path>, html: &str) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, html).with_context(|| format!("failed to write {path:?}"))?;
            loader_info!("wrote {} bytes to {:?}", html.len(), path);
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(html.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

async fn run_loader(page: Page, settings: LoaderSettings, seed: Option<u64>) -> Result<RunReport> {
    let loader = Loader::new(ReqwestFetcher::new(settings.fetch), settings.markers);
    let report = loader.run(page.into(), &mut rng(seed), &NullSink).await?;
    if report.failed() > 0 {
        loader_warn!(
            "{} of {} message sources failed",
            report.failed(),
            report.outcomes.len()
        );
    }
    Ok(report)
}

pub(crate) async fn load(input: &Path, args: &RunArgs) -> Result<()> {
    let settings = settings(args)?;
    let page = read_page(input)?;
    let report = run_loader(page, settings, args.seed).await?;
    write_output(args.output.as_deref(), &report.page.html())
}

pub(crate) async fn demo(page_path: &Path, args: &RunArgs) -> Result<()> {
    let settings = settings(args)?;
    if settings.fetch.base_url.is_none() {
        bail!("the demo needs a base URL to fetch its data file from (--base-url)");
    }

    let mut page = read_page(page_path)?;
    let demo = DemoConfig::from_page(&page)?;
    loader_info!("running randomness demo '{}'", demo.name);
    let container = populate_data_container(&mut page, &demo, &settings.markers)?;

    let report = run_loader(page, settings, args.seed).await?;
    let mut page = report.page;
    match analyze(&mut page, &demo, container)? {
        Some(stats) => loader_info!(
            "{} samples: mean {}, standard deviation {}, mode {}",
            stats.count,
            stats.mean,
            stats.stddev,
            stats.modes
        ),
        None => loader_warn!("no samples were loaded"),
    }
    write_output(args.output.as_deref(), &page.html())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn args() -> RunArgs {
        RunArgs {
            base_url: None,
            config: None,
            output: None,
            seed: Some(1),
        }
    }

    #[test]
    fn command_line_base_url_overrides_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("loader.ron");
        fs::write(&config, r#"(base_url: Some("https://a.example/"), redirect_limit: 2)"#).unwrap();

        let mut args = args();
        args.config = Some(config);
        assert_eq!(
            settings(&args).unwrap().fetch.base_url.unwrap().as_str(),
            "https://a.example/"
        );

        args.base_url = Some("https://b.example/lib/".to_string());
        let settings = settings(&args).unwrap();
        assert_eq!(settings.fetch.base_url.unwrap().as_str(), "https://b.example/lib/");
        assert_eq!(settings.fetch.redirect_limit, 2);
    }

    #[test]
    fn invalid_base_url_is_an_error() {
        let mut args = args();
        args.base_url = Some("not a url".to_string());
        assert!(settings(&args).is_err());
    }

    #[tokio::test]
    async fn load_without_targets_writes_the_page_back() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.html");
        let output = dir.path().join("out.html");
        fs::write(&input, "<p>static</p>").unwrap();

        let mut args = args();
        args.output = Some(output.clone());
        load(&input, &args).await.unwrap();

        let written = fs::read_to_string(&output).unwrap();
        assert!(written.contains("<p>static</p>"));
    }

    #[tokio::test]
    async fn demo_requires_a_base_url() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("demo.html");
        fs::write(&input, r#"<meta name="srml.name" content="basic">"#).unwrap();

        let err = demo(&input, &args()).await.unwrap_err();
        assert!(err.to_string().contains("--base-url"));
    }
}
