// datadag/ingest/src/services/downloader.rs

use crate::errors::Result as AppResult;
use anyhow::Context;
use async_trait::async_trait;
use datadag::Downloader;
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use std::time::Duration;
use tracing::{event, instrument, Level};

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Fetches sources over HTTP(S). Zip archives are unpacked into the
/// destination folder; anything else is saved under the URL's file name.
#[derive(Debug, Clone)]
pub struct HttpDownloader {
  client: reqwest::Client,
}

impl HttpDownloader {
  pub fn new(timeout: Duration) -> AppResult<Self> {
    let client = reqwest::Client::builder()
      .timeout(timeout)
      .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
      .build()?;
    Ok(Self { client })
  }
}

#[async_trait]
impl Downloader for HttpDownloader {
  #[instrument(name = "HttpDownloader::retrieve", skip_all, fields(url = %url, dir = %destination_dir.display()))]
  async fn retrieve(&self, url: &str, destination_dir: &Path) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(destination_dir)
      .await
      .with_context(|| format!("creating '{}'", destination_dir.display()))?;

    let response = self.client.get(url).send().await?.error_for_status()?;
    let body = response.bytes().await?;
    event!(Level::DEBUG, bytes = body.len(), "Source fetched.");

    if body.starts_with(ZIP_MAGIC) {
      let dir = destination_dir.to_path_buf();
      let extracted = tokio::task::spawn_blocking(move || extract_zip(Cursor::new(body), &dir)).await??;
      event!(Level::INFO, files = extracted, "Archive extracted.");
    } else {
      let path = destination_dir.join(file_name_for(url));
      tokio::fs::write(&path, &body)
        .await
        .with_context(|| format!("writing '{}'", path.display()))?;
      event!(Level::INFO, file = %path.display(), "Source saved.");
    }
    Ok(())
  }
}

/// Last path segment of `url`, ignoring query and fragment.
fn file_name_for(url: &str) -> String {
  let path = url.split(['?', '#']).next().unwrap_or(url);
  match path.trim_end_matches('/').rsplit('/').next() {
    Some(name) if !name.is_empty() && !name.contains(':') => name.to_string(),
    _ => "download".to_string(),
  }
}

/// Unpacks every entry of `archive` under `dir`; entries whose path would
/// escape `dir` are skipped. Returns the number of files written.
fn extract_zip<R: Read + Seek>(archive: R, dir: &Path) -> anyhow::Result<usize> {
  let mut archive = zip::ZipArchive::new(archive).context("invalid zip archive")?;
  let mut written = 0;
  for i in 0..archive.len() {
    let mut entry = archive.by_index(i)?;
    let Some(relative) = entry.enclosed_name() else {
      event!(Level::WARN, entry = entry.name(), "Skipping archive entry with an unsafe path.");
      continue;
    };
    let out_path = dir.join(relative);
    if entry.is_dir() {
      std::fs::create_dir_all(&out_path)?;
      continue;
    }
    if let Some(parent) = out_path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::File::create(&out_path).with_context(|| format!("creating '{}'", out_path.display()))?;
    std::io::copy(&mut entry, &mut file)?;
    written += 1;
  }
  Ok(written)
}
