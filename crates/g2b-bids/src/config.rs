//! Run configuration.
//!
//! Built once at process entry and passed by reference to every component.

use std::path::PathBuf;
use std::time::Duration;

use crate::types::BidDate;

pub const DEFAULT_KEYWORDS_FILE: &str = "search_terms.csv";
pub const DEFAULT_KEYWORD_COLUMN: &str = "keyword";
pub const DEFAULT_MAX_ROWS: u32 = 100;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Service key is not set. Set G2B_SERVICE_KEY in the environment or .env file")]
    MissingServiceKey,
    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    #[error("Failed to read keyword file {path:?}: {source}")]
    KeywordFile {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("Keyword file {path:?} has no '{column}' column")]
    MissingColumn { path: PathBuf, column: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub service_key: Option<String>,
    pub base_url: String,
    pub keywords_file: PathBuf,
    pub keyword_column: String,
    pub output_dir: PathBuf,
    pub max_rows: u32,
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_key: None,
            base_url: crate::BASE_URL.to_string(),
            keywords_file: PathBuf::from(DEFAULT_KEYWORDS_FILE),
            keyword_column: DEFAULT_KEYWORD_COLUMN.to_string(),
            output_dir: PathBuf::from("."),
            max_rows: DEFAULT_MAX_ROWS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// The API service key. Blank values count as missing.
    pub fn service_key(&self) -> Result<&str, ConfigError> {
        self.service_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingServiceKey)
    }

    pub fn results_path(&self, date: BidDate) -> PathBuf {
        self.output_dir.join(results_file_name(date))
    }

    pub fn combined_path(&self, date: BidDate) -> PathBuf {
        self.output_dir.join(combined_file_name(date))
    }
}

pub fn results_file_name(date: BidDate) -> String {
    format!("{date}_search_results.csv")
}

pub fn combined_file_name(date: BidDate) -> String {
    format!("{date}_combined_search_results.csv")
}
