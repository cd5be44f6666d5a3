//! The daily run: query every keyword, write today's file, merge with yesterday's.

use std::fmt::Display;
use std::path::{Path, PathBuf};

use crate::client::BidClient;
use crate::config::{Config, ConfigError};
use crate::keywords::load_keywords;
use crate::merge::merge;
use crate::store::{StoreError, read_records, results_exist, write_records};
use crate::types::{BidDate, BidRecord};

#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),
}

#[derive(Debug)]
pub struct KeywordReport {
    pub keyword: String,
    pub hits: usize,
    /// Set when the query failed and contributed no records.
    pub error: Option<String>,
}

#[derive(Debug)]
pub enum MergeSummary {
    Skipped {
        yesterday_path: PathBuf,
    },
    Merged {
        yesterday_path: PathBuf,
        yesterday_count: usize,
        appended: usize,
        combined_path: PathBuf,
        total: usize,
    },
}

#[derive(Debug)]
pub struct RunSummary {
    pub date: BidDate,
    pub keywords: Vec<KeywordReport>,
    pub today_path: PathBuf,
    pub today_count: usize,
    pub merge: MergeSummary,
}

impl RunSummary {
    pub fn failed_keywords(&self) -> usize {
        self.keywords.iter().filter(|k| k.error.is_some()).count()
    }
}

impl Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\nRun {}:", self.date)?;
        for report in &self.keywords {
            match &report.error {
                Some(e) => writeln!(f, "  {:<20} failed: {}", report.keyword, e)?,
                None => writeln!(f, "  {:<20} {} hit(s)", report.keyword, report.hits)?,
            }
        }
        writeln!(
            f,
            "  Today's results:   {} record(s) -> {}",
            self.today_count,
            self.today_path.display()
        )?;
        match &self.merge {
            MergeSummary::Skipped { yesterday_path } => writeln!(
                f,
                "  Merge skipped:     {} not found",
                yesterday_path.display()
            ),
            MergeSummary::Merged {
                yesterday_path,
                yesterday_count,
                appended,
                combined_path,
                total,
            } => {
                writeln!(
                    f,
                    "  Yesterday's file:  {} record(s) <- {}",
                    yesterday_count,
                    yesterday_path.display()
                )?;
                writeln!(
                    f,
                    "  Combined results:  {} record(s), {} carried over -> {}",
                    total,
                    appended,
                    combined_path.display()
                )
            }
        }
    }
}

/// Runs the daily collection for `today`.
///
/// Configuration errors are returned before any request or file write. A
/// failure to write today's file ends the run before the merge step.
pub async fn run(config: &Config, today: BidDate) -> Result<RunSummary, CollectError> {
    let client = BidClient::new(config)?;

    let keywords = load_keywords(&config.keywords_file, &config.keyword_column)?;
    log::info!("Loaded {} keyword(s): {:?}", keywords.len(), keywords);

    let yesterday = today.pred();

    let mut results_today: Vec<BidRecord> = Vec::new();
    let mut reports = Vec::with_capacity(keywords.len());
    for keyword in keywords {
        let outcome = client.query(&keyword, today).await;
        reports.push(KeywordReport {
            hits: outcome.records().len(),
            error: outcome.error().map(ToString::to_string),
            keyword,
        });
        results_today.extend(outcome.into_records());
    }

    let today_path = config.results_path(today);
    write_records(&today_path, &results_today)?;
    log::info!(
        "Saved today's results ({} record(s)): {}",
        results_today.len(),
        today_path.display()
    );

    let yesterday_path = config.results_path(yesterday);
    let merge_summary = if results_exist(&yesterday_path)? {
        let results_yesterday = read_records(&yesterday_path)?;
        let combined = merge(&results_today, &results_yesterday);
        let appended = combined.len() - results_today.len();
        log::info!("Added {appended} record(s) from yesterday's results to today's");

        let combined_path = config.combined_path(today);
        write_records(&combined_path, &combined)?;
        log::info!("Saved combined results: {}", combined_path.display());

        MergeSummary::Merged {
            yesterday_path,
            yesterday_count: results_yesterday.len(),
            appended,
            combined_path,
            total: combined.len(),
        }
    } else {
        log::info!(
            "No results file for yesterday ({}); skipping merge, only today's file was written",
            yesterday_path.display()
        );
        MergeSummary::Skipped { yesterday_path }
    };

    Ok(RunSummary {
        date: today,
        keywords: reports,
        today_path,
        today_count: results_today.len(),
        merge: merge_summary,
    })
}

/// Merges two existing result files into `output`, returning the record count written.
pub fn merge_files(today: &Path, yesterday: &Path, output: &Path) -> Result<usize, CollectError> {
    let results_today = read_records(today)?;
    let results_yesterday = read_records(yesterday)?;

    let combined = merge(&results_today, &results_yesterday);
    log::info!(
        "Added {} record(s) from {} to {}",
        combined.len() - results_today.len(),
        yesterday.display(),
        today.display()
    );

    write_records(output, &combined)?;
    log::info!("Saved combined results: {}", output.display());
    Ok(combined.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn record(bid_number: &str, date: &str) -> BidRecord {
        BidRecord {
            keyword: "교육".into(),
            title: format!("공고 {bid_number}"),
            bid_number: Some(bid_number.into()),
            url: None,
            date: date.parse().unwrap(),
        }
    }

    #[tokio::test]
    async fn test_run_without_service_key_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            service_key: None,
            keywords_file: dir.path().join("search_terms.csv"),
            output_dir: dir.path().to_path_buf(),
            ..Config::default()
        };
        fs::write(&config.keywords_file, "keyword\n교육\n").unwrap();

        let err = run(&config, "20250709".parse().unwrap()).await.unwrap_err();
        assert!(matches!(
            err,
            CollectError::Configuration(ConfigError::MissingServiceKey)
        ));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_run_with_unreadable_keyword_file_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            service_key: Some("key".into()),
            keywords_file: dir.path().join("missing.csv"),
            output_dir: dir.path().to_path_buf(),
            ..Config::default()
        };

        let err = run(&config, "20250709".parse().unwrap()).await.unwrap_err();
        assert!(matches!(
            err,
            CollectError::Configuration(ConfigError::KeywordFile { .. })
        ));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_summary_display_names_both_files() {
        let summary = RunSummary {
            date: "20250709".parse().unwrap(),
            keywords: vec![
                KeywordReport {
                    keyword: "교육".into(),
                    hits: 2,
                    error: None,
                },
                KeywordReport {
                    keyword: "고장".into(),
                    hits: 0,
                    error: Some("HTTP request failed".into()),
                },
            ],
            today_path: PathBuf::from("20250709_search_results.csv"),
            today_count: 2,
            merge: MergeSummary::Merged {
                yesterday_path: PathBuf::from("20250708_search_results.csv"),
                yesterday_count: 3,
                appended: 1,
                combined_path: PathBuf::from("20250709_combined_search_results.csv"),
                total: 3,
            },
        };

        let text = summary.to_string();
        assert_eq!(summary.failed_keywords(), 1);
        assert!(text.contains("failed: HTTP request failed"));
        assert!(text.contains("3 record(s) <- 20250708_search_results.csv"));
        assert!(text.contains("1 carried over -> 20250709_combined_search_results.csv"));
    }

    #[test]
    fn test_merge_files() {
        let dir = tempfile::tempdir().unwrap();
        let today = dir.path().join("today.csv");
        let yesterday = dir.path().join("yesterday.csv");
        let output = dir.path().join("combined.csv");

        write_records(&today, &[record("A1", "20250709")]).unwrap();
        write_records(
            &yesterday,
            &[record("A1", "20250708"), record("B2", "20250708")],
        )
        .unwrap();

        assert_eq!(merge_files(&today, &yesterday, &output).unwrap(), 2);

        let combined = read_records(&output).unwrap();
        assert_eq!(combined[0], record("A1", "20250709"));
        assert_eq!(combined[1], record("B2", "20250708"));
    }

    #[test]
    fn test_merge_files_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = merge_files(
            &dir.path().join("a.csv"),
            &dir.path().join("b.csv"),
            &dir.path().join("c.csv"),
        )
        .unwrap_err();
        assert!(matches!(err, CollectError::Persistence(_)));
        assert!(!dir.path().join("c.csv").exists());
    }
}
