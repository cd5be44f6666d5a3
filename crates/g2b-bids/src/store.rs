//! CSV persistence for daily result sets.
//!
//! Files are UTF-8 with a byte-order mark so spreadsheet applications pick the
//! right encoding for Korean titles. The header row is always written, even
//! for an empty result set.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::types::BidRecord;

pub const COLUMNS: [&str; 5] = ["keyword", "title", "bid_number", "url", "date"];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error in {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

pub fn write_records(path: &Path, records: &[BidRecord]) -> Result<(), StoreError> {
    let io_error = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };
    let csv_error = |source| StoreError::Csv {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(io_error)?;
    }

    let mut file = File::create(path).map_err(io_error)?;
    file.write_all(UTF8_BOM).map_err(io_error)?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    writer.write_record(COLUMNS).map_err(csv_error)?;
    for record in records {
        writer.serialize(record).map_err(csv_error)?;
    }
    writer.flush().map_err(io_error)?;

    log::debug!("Wrote {} record(s) to {:?}", records.len(), path);
    Ok(())
}

/// Whether a result file exists. Errors other than "not found" are reported.
pub fn results_exist(path: &Path) -> Result<bool, StoreError> {
    path.try_exists().map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn read_records(path: &Path) -> Result<Vec<BidRecord>, StoreError> {
    let bytes = fs::read(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let data = bytes.strip_prefix(UTF8_BOM).unwrap_or(&bytes[..]);

    csv::Reader::from_reader(data)
        .deserialize()
        .collect::<Result<Vec<BidRecord>, _>>()
        .map_err(|source| StoreError::Csv {
            path: path.to_path_buf(),
            source,
        })
}
