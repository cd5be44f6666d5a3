pub mod client;
pub mod collector;
pub mod config;
pub mod keywords;
pub mod merge;
pub mod response;
pub mod store;
pub mod types;

pub use client::{BidClient, QueryError, QueryOutcome};
pub use collector::{CollectError, RunSummary, merge_files, run};
pub use config::{Config, ConfigError};
pub use types::{BidDate, BidRecord};

/// Bid announcement list service (services and consulting) of the G2B open API.
pub const BASE_URL: &str =
    "http://apis.data.go.kr/1230000/BidPublicInfoService/getBidPblancListInfoServc";
