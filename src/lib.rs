use tracing::info;

pub mod autoconfig;
pub mod config;
pub mod date;
pub mod fetch;
pub mod labeler;
pub mod select;

mod error;
mod utils;

pub use autoconfig::{FieldCandidate, FieldManager, Node, Path};
pub use config::{Config, ScraperConfig};
pub use error::AutoconfigError;
pub use fetch::{FileFetcher, Fetcher, HttpFetcher};
pub use labeler::{Labeler, LabelerKind};

pub const DEFAULT_MIN_OCCURRENCE: usize = 2;

#[derive(Debug, Clone)]
pub struct AutoconfigOptions {
    /// A group has to repeat at least this often to become a field.
    pub min_occurrence: usize,
    /// Drop groups whose examples are all the same.
    pub only_varying: bool,
    pub interactive: bool,
    pub labeler: LabelerKind,
    /// Scraper name, derived from the url when missing.
    pub name: Option<String>,
}

impl Default for AutoconfigOptions {
    fn default() -> Self {
        AutoconfigOptions {
            min_occurrence: DEFAULT_MIN_OCCURRENCE,
            only_varying: false,
            interactive: false,
            labeler: LabelerKind::default(),
            name: None,
        }
    }
}

/// Indexes, squashes, filters and colors the fields of one page.
pub fn analyze(html: &str, options: &AutoconfigOptions) -> Result<FieldManager, AutoconfigError> {
    let fields = autoconfig::indexer::index(html);
    let fields = autoconfig::squash::squash(fields, options.min_occurrence);
    let mut fields =
        autoconfig::filter::filter(fields, options.min_occurrence, options.only_varying);
    if fields.is_empty() {
        return Err(AutoconfigError::NoFields);
    }

    autoconfig::filter::colorize(&mut fields);
    Ok(fields)
}

fn scraper_name(url: &str) -> String {
    if let Some(host) = reqwest::Url::parse(url)
        .ok()
        .filter(|u| matches!(u.scheme(), "http" | "https"))
        .and_then(|u| u.host_str().map(ToString::to_string))
    {
        return host;
    }

    let file = url.trim_end_matches('/').rsplit('/').next().unwrap_or(url);
    file.split('.').next().unwrap_or(file).to_string()
}

/// Fetches `url` and generates the scraper config for it.
pub async fn generate(
    url: &str,
    fetcher: &dyn Fetcher,
    options: &AutoconfigOptions,
) -> Result<ScraperConfig, AutoconfigError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(AutoconfigError::EmptyUrl);
    }

    let html = fetcher.fetch(url).await?;
    let mut fields = analyze(&html, options)?;

    labeler::labeler_for(&options.labeler)
        .label_fields(&mut fields)
        .await?;
    let fields = select::select_fields(fields, options.interactive)?;

    let name = options.name.clone().unwrap_or_else(|| scraper_name(url));
    let scraper = autoconfig::synth::synthesize(&fields, &name, url)?;
    info!(
        "Generated {} with {} fields, item {}",
        scraper.name,
        scraper.fields.len(),
        scraper.item
    );
    Ok(scraper)
}
