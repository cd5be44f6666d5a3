use crate::config::{Config, ConfigError};
use crate::response::{ParseError, parse_bid_response};
use crate::types::{BidDate, BidRecord};

use reqwest::{Client, Url};

/// `inqryDiv=1` selects announcements by registration date.
const INQUIRY_DIV_REGISTERED: &str = "1";
const RESPONSE_TYPE_JSON: &str = "json";
const FIRST_PAGE: &str = "1";

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] ParseError),
}

/// Result of one keyword query. A failure contributes no records.
#[derive(Debug)]
pub enum QueryOutcome {
    Found(Vec<BidRecord>),
    Failed(QueryError),
}

impl QueryOutcome {
    pub fn records(&self) -> &[BidRecord] {
        match self {
            QueryOutcome::Found(records) => records,
            QueryOutcome::Failed(_) => &[],
        }
    }

    pub fn into_records(self) -> Vec<BidRecord> {
        match self {
            QueryOutcome::Found(records) => records,
            QueryOutcome::Failed(_) => Vec::new(),
        }
    }

    pub fn error(&self) -> Option<&QueryError> {
        match self {
            QueryOutcome::Found(_) => None,
            QueryOutcome::Failed(e) => Some(e),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BidClient {
    client: Client,
    endpoint: Url,
    service_key: String,
    max_rows: u32,
}

impl BidClient {
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let service_key = config.service_key()?.to_string();

        let endpoint = Url::parse(&config.base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(Self {
            client,
            endpoint,
            service_key,
            max_rows: config.max_rows,
        })
    }

    /// Queries announcements registered on `date` whose title matches `keyword`.
    ///
    /// Only the first page (`max_rows` items) is requested.
    pub async fn search(&self, keyword: &str, date: BidDate) -> Result<Vec<BidRecord>, QueryError> {
        let url = self.build_url(keyword, date);

        let body = self
            .client
            .get(url)
            .send()
            .await
            .inspect_err(|e| log::debug!("HTTP error: {e:?}"))?
            .error_for_status()?
            .text()
            .await
            .inspect_err(|e| log::debug!("Decode error: {e:?}"))?;

        let page = parse_bid_response(&body, keyword, date)?;
        if page.is_truncated() {
            log::warn!(
                "[{date}] '{keyword}': server reports {} hit(s), only the first {} were returned",
                page.total_count.unwrap_or_default(),
                page.records.len()
            );
        }

        Ok(page.records)
    }

    /// Runs [`BidClient::search`] and logs the outcome instead of propagating it.
    pub async fn query(&self, keyword: &str, date: BidDate) -> QueryOutcome {
        log::info!("[{date}] '{keyword}' search started");

        match self.search(keyword, date).await {
            Ok(records) => {
                log::info!("[{date}] '{keyword}' -> {} hit(s)", records.len());
                for record in &records {
                    log::debug!("  {record}");
                }
                QueryOutcome::Found(records)
            }
            Err(e) => {
                log::error!("Error searching '{keyword}' on {date}: {e}");
                QueryOutcome::Failed(e)
            }
        }
    }

    fn build_url(&self, keyword: &str, date: BidDate) -> Url {
        let (start, end) = date.inquiry_range();
        let max_rows = self.max_rows.to_string();

        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("ServiceKey", &self.service_key)
            .append_pair("type", RESPONSE_TYPE_JSON)
            .append_pair("numOfRows", &max_rows)
            .append_pair("pageNo", FIRST_PAGE)
            .append_pair("inqryDiv", INQUIRY_DIV_REGISTERED)
            .append_pair("inqryBgnDt", &start)
            .append_pair("inqryEndDt", &end)
            .append_pair("bidNtceNm", keyword);
        url
    }
}
