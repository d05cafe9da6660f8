// datadag/ingest/src/datasets.rs

//! The datasets this service ingests.

use crate::errors::{AppError, Result};
use datadag::DatasetDescriptor;
use std::path::Path;

/// The public drug datasets ingested out of the box.
pub fn builtin() -> Vec<DatasetDescriptor> {
  vec![
    // 04:30 every day
    DatasetDescriptor::new(
      "fda_excluded",
      "30 4 * * *",
      "https://www.accessdata.fda.gov/cder/ndc_excluded.zip",
    ),
    // 04:15 every day
    DatasetDescriptor::new(
      "fda_unfinished",
      "15 4 * * *",
      "https://www.accessdata.fda.gov/cder/ndc_unfinished.zip",
    ),
    // Yearly on January 24th at 00:15; the file is named after the previous month.
    DatasetDescriptor::new(
      "purple_book",
      "15 0 24 1 *",
      r#"https://purplebooksearch.fda.gov/files/{{ run_date | months_ago(1) | format("%Y") }}/purplebook-search-{{ run_date | months_ago(1) | format("%B") | lower }}-data-download.csv"#,
    ),
    DatasetDescriptor::new("orange_book", "15 0 24 1 *", "https://www.fda.gov/media/76860/download"),
    // 05:00 every day
    DatasetDescriptor::new(
      "dailymed_rxnorm",
      "0 5 * * *",
      "https://dailymed-data.nlm.nih.gov/public-release-files/rxnorm_mappings.zip",
    ),
    DatasetDescriptor::new(
      "dailymed_pharm_class",
      "0 5 * * *",
      "https://dailymed-data.nlm.nih.gov/public-release-files/pharmacologic_class_mappings.zip",
    ),
    DatasetDescriptor::new(
      "dailymed_zip_file_metadata",
      "0 5 * * *",
      "https://dailymed-data.nlm.nih.gov/public-release-files/dm_spl_zip_files_meta_data.zip",
    ),
    // Yearly on January 15th at 00:45
    DatasetDescriptor::new(
      "rxterms",
      "45 0 15 1 *",
      r#"https://data.lhncbc.nlm.nih.gov/public/rxterms/release/RxTerms{{ run_date | format("%Y%m") }}.zip"#,
    ),
  ]
}

/// Reads a JSON array of descriptors from `path`.
pub async fn load(path: &Path) -> Result<Vec<DatasetDescriptor>> {
  let raw = tokio::fs::read_to_string(path).await?;
  serde_json::from_str(&raw).map_err(|e| AppError::Datasets {
    path: path.display().to_string(),
    message: e.to_string(),
  })
}
