//! Video downloads.
//!
//! Streams videos from their source URL into the downloads directory as
//! `Artist - Title.ext`, optionally tagging them afterwards.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use futures_util::{stream, StreamExt};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::cleanup::{is_video_extension, CleanedName};
use crate::error::{FailureCategory, OrganizerError, Result};
use crate::organizer::unique_destination;
use crate::tagging::{self, VideoMetadata};

/// Extension used when neither the URL nor the response says otherwise.
const DEFAULT_EXTENSION: &str = "mp4";

/// Everything needed to fetch one video.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DownloadRequest {
    /// Artist name(s).
    pub artist: String,
    /// Song title.
    pub title: String,
    /// Direct media URL.
    pub url: Option<String>,
    /// Release year, embedded as a tag.
    pub year: Option<i32>,
    /// Thumbnail embedded as cover art.
    pub thumbnail_url: Option<String>,
    /// IMVDb ID, embedded as a comment.
    pub imvdb_id: Option<String>,
}

impl DownloadRequest {
    /// Create a request for a URL.
    pub fn new<S1: Into<String>, S2: Into<String>, S3: Into<String>>(
        artist: S1,
        title: S2,
        url: S3,
    ) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
            url: Some(url.into()),
            ..Default::default()
        }
    }

    /// Label used in logs and failure reports.
    pub fn label(&self) -> String {
        format!("{} - {}", self.artist, self.title)
    }
}

/// Result of a single video download.
#[derive(Debug, Clone, Serialize)]
pub struct DownloadResult {
    /// Path to the downloaded file.
    pub path: PathBuf,
    /// File size in bytes.
    pub size: u64,
    /// Artist name.
    pub artist: String,
    /// Song title.
    pub title: String,
}

/// A failed download in a batch.
#[derive(Debug, Clone, Serialize)]
pub struct DownloadFailure {
    /// `Artist - Title` of the request.
    pub label: String,
    /// Why it failed, for grouping in reports.
    #[serde(serialize_with = "serialize_category")]
    pub category: FailureCategory,
    /// Error message.
    pub message: String,
}

fn serialize_category<S: serde::Serializer>(
    category: &FailureCategory,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(category.label())
}

/// Result of a batch download.
#[derive(Debug, Serialize)]
pub struct BatchDownloadResult {
    /// Output directory.
    pub directory: PathBuf,
    /// Successfully downloaded videos.
    pub successful: Vec<DownloadResult>,
    /// Failed downloads.
    pub failed: Vec<DownloadFailure>,
}

impl BatchDownloadResult {
    /// Total number of videos attempted.
    pub fn total(&self) -> usize {
        self.successful.len() + self.failed.len()
    }

    /// Check if all videos were downloaded successfully.
    pub fn all_successful(&self) -> bool {
        self.failed.is_empty()
    }

    /// Number of failures in a category.
    pub fn failed_in(&self, category: FailureCategory) -> usize {
        self.failed.iter().filter(|f| f.category == category).count()
    }
}

/// Downloads videos with bounded concurrency.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
    downloads_dir: PathBuf,
    max_concurrent: usize,
    embed_tags: bool,
    /// Numbers partial files so concurrent downloads never share one.
    next_partial: Arc<AtomicU64>,
    /// Held while a finished download picks and takes its final name.
    finalize: Arc<Mutex<()>>,
}

impl Downloader {
    /// Create a new downloader.
    ///
    /// `max_concurrent` is clamped to at least one.
    pub fn new<P: Into<PathBuf>>(
        downloads_dir: P,
        max_concurrent: usize,
        embed_tags: bool,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("mvorg/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            downloads_dir: downloads_dir.into(),
            max_concurrent: max_concurrent.max(1),
            embed_tags,
            next_partial: Arc::new(AtomicU64::new(0)),
            finalize: Arc::new(Mutex::new(())),
        })
    }

    /// Directory downloads are written to.
    pub fn downloads_dir(&self) -> &Path {
        &self.downloads_dir
    }

    /// Maximum number of downloads in flight.
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Enable or disable tag embedding.
    pub fn set_embed_tags(&mut self, embed: bool) {
        self.embed_tags = embed;
    }

    /// Download a single video.
    ///
    /// # Errors
    ///
    /// - [`OrganizerError::MissingUrl`] when the request has no URL
    /// - [`OrganizerError::MalformedTitle`] when artist or title is empty
    /// - [`OrganizerError::AgeRestricted`] on HTTP 403/451
    /// - [`OrganizerError::VideoNotFound`] on HTTP 404
    pub async fn download(&self, request: &DownloadRequest) -> Result<DownloadResult> {
        let label = request.label();
        let url = request
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| OrganizerError::MissingUrl(label.clone()))?;

        let name = CleanedName::from_parts(&request.artist, &request.title)?;

        debug!("Downloading {} from {}", label, url);
        let response = self.client.get(url).send().await?;
        match response.status() {
            StatusCode::FORBIDDEN | StatusCode::UNAVAILABLE_FOR_LEGAL_REASONS => {
                return Err(OrganizerError::AgeRestricted(label));
            }
            StatusCode::NOT_FOUND => return Err(OrganizerError::VideoNotFound(label)),
            status if !status.is_success() => {
                return Err(OrganizerError::ApiError(format!(
                    "{} returned {}",
                    url, status
                )));
            }
            _ => {}
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let extension = extension_for(url, content_type.as_deref());
        let name = name.with_extension(extension);

        fs::create_dir_all(&self.downloads_dir)?;
        let partial = self.downloads_dir.join(format!(
            "{}.{}.part",
            name.file_name(),
            self.next_partial.fetch_add(1, Ordering::Relaxed)
        ));

        let written = match write_stream(response.bytes_stream(), &partial).await {
            Ok(written) => written,
            Err(e) => {
                let _ = fs::remove_file(&partial);
                return Err(e);
            }
        };

        let output_path = {
            let _guard = self.finalize.lock().await;
            let output_path = unique_destination(&self.downloads_dir, &name.file_name());
            if let Err(e) = fs::rename(&partial, &output_path) {
                let _ = fs::remove_file(&partial);
                return Err(e.into());
            }
            output_path
        };
        debug!("Wrote {} bytes to {}", written, output_path.display());

        if self.embed_tags {
            self.tag(&output_path, request, &name).await?;
        }

        let size = fs::metadata(&output_path)?.len();
        info!("Downloaded {} ({} bytes)", output_path.display(), size);

        Ok(DownloadResult {
            path: output_path,
            size,
            artist: name.artist,
            title: name.title,
        })
    }

    /// Download many videos, at most `max_concurrent` at a time.
    ///
    /// Failures are collected per video; the batch never aborts.
    pub async fn download_all(&self, requests: &[DownloadRequest]) -> BatchDownloadResult {
        info!(
            "Downloading {} videos ({} at a time)",
            requests.len(),
            self.max_concurrent
        );

        let outcomes: Vec<(String, Result<DownloadResult>)> = stream::iter(requests)
            .map(|request| async move { (request.label(), self.download(request).await) })
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        let mut result = BatchDownloadResult {
            directory: self.downloads_dir.clone(),
            successful: Vec::new(),
            failed: Vec::new(),
        };

        for (label, outcome) in outcomes {
            match outcome {
                Ok(download) => result.successful.push(download),
                Err(e) => {
                    let category = e.category();
                    error!("Failed to download {} [{}]: {}", label, category, e);
                    result.failed.push(DownloadFailure {
                        label,
                        category,
                        message: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Batch finished: {} downloaded, {} failed",
            result.successful.len(),
            result.failed.len()
        );
        result
    }

    async fn tag(&self, path: &Path, request: &DownloadRequest, name: &CleanedName) -> Result<()> {
        let cover_art = match &request.thumbnail_url {
            Some(url) => tagging::fetch_thumbnail(&self.client, url).await,
            None => None,
        };

        let mut metadata = VideoMetadata::new()
            .with_title(&name.title)
            .with_artist(&name.artist)
            .with_album_artist(&name.artist);

        if let Some(year) = request.year.or(name.year) {
            metadata = metadata.with_year(year);
        }
        if let Some(id) = &request.imvdb_id {
            metadata = metadata.with_comment(format!("imvdb:{}", id));
        }
        if let Some(cover) = cover_art {
            metadata = metadata.with_cover_art(cover);
        }

        tagging::write_metadata(path, &metadata)
    }
}

/// Write a byte stream to `path`, returning the number of bytes written.
async fn write_stream<S>(body: S, path: &Path) -> Result<u64>
where
    S: futures_util::Stream<Item = reqwest::Result<Bytes>>,
{
    let mut body = std::pin::pin!(body);
    let mut file = tokio::fs::File::create(path).await?;
    let mut written = 0u64;
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

/// Pick the file extension: URL path, then `Content-Type`, then mp4.
fn extension_for(url: &str, content_type: Option<&str>) -> String {
    let from_url = reqwest::Url::parse(url).ok().and_then(|u| {
        u.path_segments()
            .and_then(|segments| segments.last().map(str::to_string))
            .and_then(|last| last.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()))
            .filter(|ext| is_video_extension(ext))
    });
    if let Some(ext) = from_url {
        return ext;
    }

    content_type
        .and_then(extension_for_mime)
        .unwrap_or(DEFAULT_EXTENSION)
        .to_string()
}

fn extension_for_mime(content_type: &str) -> Option<&'static str> {
    let mime = content_type.split(';').next()?.trim().to_ascii_lowercase();
    let ext = match mime.as_str() {
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        "video/x-matroska" => "mkv",
        "video/quicktime" => "mov",
        "video/x-msvideo" => "avi",
        "video/x-flv" => "flv",
        "video/x-m4v" => "m4v",
        "video/mpeg" => "mpg",
        "video/mp2t" => "ts",
        _ => {
            warn!("Unknown content type {}", content_type);
            return None;
        }
    };
    Some(ext)
}
