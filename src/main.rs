use autoconfig::{
    generate, AutoconfigError, AutoconfigOptions, Config, Fetcher, FileFetcher, HttpFetcher,
    LabelerKind, DEFAULT_MIN_OCCURRENCE,
};
use clap::{Parser, ValueEnum};
use futures::future::join_all;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};
use tracing_error::ErrorLayer;
use tracing_subscriber::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LabelerArg {
    Enumerate,
    Knn,
    Remote,
}

#[derive(Debug, Parser)]
#[command(name = "autoconfig")]
#[command(about = "Generates scraper configs from example pages")]
struct Cli {
    /// Pages to generate a scraper for
    #[arg(required = true)]
    urls: Vec<String>,

    /// Minimum number of repetitions for a field
    #[arg(long = "min-occ", default_value_t = DEFAULT_MIN_OCCURRENCE)]
    min_occurrence: usize,

    /// Drop fields whose examples never change
    #[arg(long)]
    only_varying: bool,

    /// Pick the fields to keep from a table
    #[arg(long)]
    interactive: bool,

    #[arg(long, value_enum, default_value_t = LabelerArg::Enumerate)]
    labeler: LabelerArg,

    /// Training set of the knn labeler, JSON
    #[arg(long)]
    training: Option<PathBuf>,

    /// Word list of the knn labeler, one word per line
    #[arg(long)]
    words: Option<PathBuf>,

    /// Neighbours of the knn labeler
    #[arg(short, default_value_t = 3)]
    k: usize,

    /// Endpoint of the remote labeler
    #[arg(long)]
    endpoint: Option<String>,

    /// Read pages from this directory instead of the network
    #[arg(long)]
    fixtures: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Output file, stdout when missing
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Scraper name, only used with a single url
    #[arg(long)]
    name: Option<String>,
}

impl Cli {
    fn labeler_kind(&self) -> Result<LabelerKind, AutoconfigError> {
        match self.labeler {
            LabelerArg::Enumerate => Ok(LabelerKind::Enumerate),
            LabelerArg::Knn => {
                let training = self.training.clone().ok_or_else(|| {
                    AutoconfigError::Labeler("--training is required for knn".to_string())
                })?;
                Ok(LabelerKind::Knn {
                    training,
                    words: self.words.clone(),
                    k: self.k,
                })
            }
            LabelerArg::Remote => {
                let endpoint = self.endpoint.clone().ok_or_else(|| {
                    AutoconfigError::Labeler("--endpoint is required for remote".to_string())
                })?;
                Ok(LabelerKind::Remote { endpoint })
            }
        }
    }

    fn options(&self) -> Result<AutoconfigOptions, AutoconfigError> {
        Ok(AutoconfigOptions {
            min_occurrence: self.min_occurrence,
            only_varying: self.only_varying,
            interactive: self.interactive,
            labeler: self.labeler_kind()?,
            name: self.name.clone().filter(|_| self.urls.len() == 1),
        })
    }

    fn fetcher(&self) -> Result<Box<dyn Fetcher>, AutoconfigError> {
        Ok(match &self.fixtures {
            Some(root) => Box::new(FileFetcher::new(root)),
            None => Box::new(HttpFetcher::new(Duration::from_secs(self.timeout))?),
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| {
                "info,html5ever=error,selectors=error,hyper=warn,reqwest=info".into()
            }),
        )
        .with(ErrorLayer::default())
        .init();

    let cli = Cli::parse();
    let options = cli.options()?;
    let fetcher = cli.fetcher()?;

    // Prompts can't interleave, interactive runs go one url at a time.
    let results = if options.interactive {
        let mut results = vec![];
        for url in &cli.urls {
            results.push(generate(url, fetcher.as_ref(), &options).await);
        }
        results
    } else {
        join_all(
            cli.urls
                .iter()
                .map(|url| generate(url, fetcher.as_ref(), &options)),
        )
        .await
    };

    let mut scrapers = vec![];
    for (url, result) in cli.urls.iter().zip(results) {
        match result {
            Ok(scraper) => scrapers.push(scraper),
            Err(e) => error!("{}: {}", url, e),
        }
    }
    if scrapers.is_empty() {
        return Err("No config generated".into());
    }

    let yaml = Config { scrapers }.to_yaml()?;
    match &cli.out {
        Some(path) => {
            tokio::fs::write(path, yaml).await?;
            info!("Config written to {}", path.display());
        }
        None => print!("{}", yaml),
    }
    Ok(())
}
