use std::path::Path;

use crate::config::ConfigError;

/// Reads the search keywords from one column of a CSV file with a header row.
///
/// Empty cells are skipped; order and duplicates are kept.
pub fn load_keywords(path: &Path, column: &str) -> Result<Vec<String>, ConfigError> {
    let csv_error = |source| ConfigError::KeywordFile {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(csv_error)?;

    let index = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .position(|header| header.trim_start_matches('\u{feff}').trim() == column)
        .ok_or_else(|| ConfigError::MissingColumn {
            path: path.to_path_buf(),
            column: column.to_string(),
        })?;

    let mut keywords = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        if let Some(keyword) = record.get(index).map(str::trim)
            && !keyword.is_empty()
        {
            keywords.push(keyword.to_string());
        }
    }

    log::debug!("Read {} keyword(s) from {:?}", keywords.len(), path);
    Ok(keywords)
}
