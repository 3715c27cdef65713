#[derive(Debug, thiserror::Error)]
pub enum AutoconfigError {
    #[error("Url must not be empty")]
    EmptyUrl,
    #[error("Request error")]
    Request(#[from] reqwest::Error),
    #[error("Unexpected status {status} for {url}")]
    Status { url: String, status: u16 },
    #[error("IO error")]
    Io(#[from] std::io::Error),
    #[error("JSON error")]
    Json(#[from] serde_json::Error),
    #[error("YAML error")]
    Yaml(#[from] serde_yaml::Error),
    #[error("No repeating fields found")]
    NoFields,
    #[error("Nothing to generate, no fields were selected")]
    NothingSelected,
    #[error("Labeler error: {0}")]
    Labeler(String),
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),
}
