/// Archive Acquirer
///
/// Turns the operator's `--gdrive` / `--zip` argument into a local zip file,
/// unpacks it into the run's working directory, and fingerprints it.
///
/// Remote downloads go through an ordered chain of strategies; the first one
/// that leaves a non-empty file behind wins.

use crate::config::ArchiveSource;
use crate::error::HarnessError;
use anyhow::{bail, Context};
use reqwest::header::CONTENT_TYPE;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::future::Future;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use url::Url;
use zipjudge_common::types::SourceKind;

/// File name of a downloaded archive inside the working directory
pub const ARCHIVE_FILE_NAME: &str = "testcases.zip";

const DRIVE_HOST: &str = "drive.google.com";
/// Bare Drive ids are long opaque tokens; shorter strings are not treated as ids
const MIN_BARE_ID_LEN: usize = 20;
const HASH_CHUNK_BYTES: usize = 1 << 20;

/// A local archive ready for extraction
#[derive(Debug, Clone)]
pub struct AcquiredArchive {
    pub path: PathBuf,
    pub kind: SourceKind,
    pub sha256: String,
}

/// Extract a Drive file id from a share link, a `uc?id=` link, or a bare id
pub fn extract_drive_id(raw: &str) -> Option<String> {
    let s = raw.trim();
    if !s.contains('/') && !s.contains(' ') && s.len() >= MIN_BARE_ID_LEN {
        return Some(s.to_string());
    }

    let url = Url::parse(s).ok()?;
    if !url.host_str()?.contains(DRIVE_HOST) {
        return None;
    }

    // /file/d/<id>/view
    let segments: Vec<&str> = url
        .path_segments()
        .map(|segments| segments.filter(|p| !p.is_empty()).collect())
        .unwrap_or_default();
    if segments.contains(&"file") {
        if let Some(i) = segments.iter().position(|p| *p == "d") {
            if let Some(id) = segments.get(i + 1) {
                return Some(id.to_string());
            }
        }
    }

    // uc?id=<id>
    url.query_pairs()
        .find(|(key, _)| key == "id")
        .map(|(_, value)| value.into_owned())
}

/// Ways of pulling a file out of Drive, in preference order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStrategy {
    /// Follows Drive's confirmation interstitial for large files
    DriveClient,
    /// Plain export URL, accepts whatever comes back
    DirectFetch,
}

impl DownloadStrategy {
    pub const CHAIN: [DownloadStrategy; 2] = [DownloadStrategy::DriveClient, DownloadStrategy::DirectFetch];

    pub fn name(&self) -> &'static str {
        match self {
            DownloadStrategy::DriveClient => "drive-client",
            DownloadStrategy::DirectFetch => "direct-fetch",
        }
    }

    async fn fetch(&self, client: &reqwest::Client, file_id: &str) -> anyhow::Result<Vec<u8>> {
        match self {
            DownloadStrategy::DriveClient => {
                let url = format!("https://drive.google.com/uc?id={}", file_id);
                let response = client.get(&url).send().await?.error_for_status()?;
                if !is_html(&response) {
                    return Ok(response.bytes().await?.to_vec());
                }

                debug!(file_id = %file_id, "Drive returned a confirmation page, retrying with confirm=t");
                let url = format!(
                    "https://drive.usercontent.google.com/download?id={}&export=download&confirm=t",
                    file_id
                );
                let response = client.get(&url).send().await?.error_for_status()?;
                if is_html(&response) {
                    bail!("Drive answered with an HTML page instead of the archive");
                }
                Ok(response.bytes().await?.to_vec())
            }
            DownloadStrategy::DirectFetch => {
                let url = format!("https://drive.google.com/uc?export=download&id={}", file_id);
                let response = client.get(&url).send().await?.error_for_status()?;
                Ok(response.bytes().await?.to_vec())
            }
        }
    }
}

fn is_html(response: &reqwest::Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|content_type| content_type.contains("text/html"))
}

/// Try each strategy in order, returning the first success or every failure
pub async fn first_success<S, T, F, Fut>(
    strategies: &[S],
    mut attempt: F,
) -> Result<(S, T), Vec<(S, anyhow::Error)>>
where
    S: Copy,
    F: FnMut(S) -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let mut failures = Vec::new();
    for &strategy in strategies {
        match attempt(strategy).await {
            Ok(value) => return Ok((strategy, value)),
            Err(e) => failures.push((strategy, e)),
        }
    }
    Err(failures)
}

/// Write downloaded bytes, rejecting an empty result
async fn write_archive(dest: &Path, bytes: &[u8]) -> anyhow::Result<u64> {
    tokio::fs::write(dest, bytes)
        .await
        .with_context(|| format!("Failed to write {}", dest.display()))?;
    let size = tokio::fs::metadata(dest).await?.len();
    if size == 0 {
        bail!("downloaded archive is empty");
    }
    Ok(size)
}

/// Download a Drive file into `dest` through the strategy chain
pub async fn download_from_drive(file_id: &str, dest: &Path) -> Result<DownloadStrategy, HarnessError> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("zipjudge/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| HarnessError::Acquisition(format!("Failed to build HTTP client: {}", e)))?;

    let outcome = first_success(&DownloadStrategy::CHAIN, |strategy| {
        let client = &client;
        async move {
            info!(strategy = strategy.name(), file_id = %file_id, "Downloading archive");
            let bytes = strategy.fetch(client, file_id).await?;
            write_archive(dest, &bytes).await
        }
    })
    .await;

    match outcome {
        Ok((strategy, size)) => {
            println!(
                "[+] Downloaded ZIP via {} -> {} ({} bytes)",
                strategy.name(),
                dest.file_name().unwrap_or_default().to_string_lossy(),
                size
            );
            Ok(strategy)
        }
        Err(failures) => {
            for (strategy, e) in &failures {
                warn!(strategy = strategy.name(), error = %e, "Download strategy failed");
            }
            let detail = failures
                .iter()
                .map(|(strategy, e)| format!("{}: {}", strategy.name(), e))
                .collect::<Vec<_>>()
                .join("; ");
            Err(HarnessError::Acquisition(format!(
                "Failed to download ZIP from Drive ({})",
                detail
            )))
        }
    }
}

/// Resolve the archive source into a local zip file and hash it
pub async fn acquire(source: &ArchiveSource, workdir: &Path) -> Result<AcquiredArchive, HarnessError> {
    let path = match source {
        ArchiveSource::Remote(link) => {
            let file_id = extract_drive_id(link).ok_or_else(|| {
                HarnessError::Acquisition(
                    "Could not extract file ID from provided --gdrive value.".to_string(),
                )
            })?;
            let dest = workdir.join(ARCHIVE_FILE_NAME);
            download_from_drive(&file_id, &dest).await?;
            dest
        }
        ArchiveSource::Local(path) => std::fs::canonicalize(path).map_err(|_| {
            HarnessError::Acquisition(format!("ZIP not found: {}", path.display()))
        })?,
    };

    let sha256 = sha256_file(&path).map_err(|e| {
        HarnessError::Acquisition(format!("Failed to read {}: {}", path.display(), e))
    })?;

    info!(archive = %path.display(), sha256 = %sha256, "Archive acquired");

    Ok(AcquiredArchive {
        path,
        kind: source.kind(),
        sha256,
    })
}

/// Streamed SHA-256 of a file, lowercase hex
pub fn sha256_file(path: &Path) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; HASH_CHUNK_BYTES];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Unpack every entry of the archive below `dest`, returning the entry count
pub fn extract_zip(archive_path: &Path, dest: &Path) -> Result<usize, HarnessError> {
    let file = File::open(archive_path).map_err(|e| {
        HarnessError::Acquisition(format!("Failed to open {}: {}", archive_path.display(), e))
    })?;
    let mut archive = zip::ZipArchive::new(file).map_err(|_| {
        HarnessError::Acquisition(format!("Not a valid ZIP: {}", archive_path.display()))
    })?;

    let entries = archive.len();
    archive.extract(dest).map_err(|e| {
        HarnessError::Acquisition(format!(
            "Failed to extract {}: {}",
            archive_path.display(),
            e
        ))
    })?;

    debug!(entries = entries, dest = %dest.display(), "Archive extracted");
    Ok(entries)
}
