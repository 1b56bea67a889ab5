//! Video metadata tagging utilities.
//!
//! This module embeds metadata (artist, title, year, thumbnail) into
//! downloaded video containers that carry tags (MP4/M4V). Other containers
//! are left as they are.

use lofty::config::WriteOptions;
use lofty::file::TaggedFileExt;
use lofty::picture::{MimeType, Picture, PictureType};
use lofty::tag::{Accessor, ItemKey, Tag, TagExt};
use reqwest::Client;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::Result;

/// Metadata to embed in video files.
#[derive(Debug, Clone, Default)]
pub struct VideoMetadata {
    /// Song title.
    pub title: Option<String>,
    /// Artist(s).
    pub artist: Option<String>,
    /// Album artist, used by players to group the library.
    pub album_artist: Option<String>,
    /// Release year.
    pub year: Option<i32>,
    /// Genre(s).
    pub genre: Option<String>,
    /// Free-form comment, e.g. the IMVDb ID.
    pub comment: Option<String>,
    /// Cover art as JPEG/PNG bytes.
    pub cover_art: Option<Vec<u8>>,
}

impl VideoMetadata {
    /// Create new empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set title.
    pub fn with_title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set artist.
    pub fn with_artist<S: Into<String>>(mut self, artist: S) -> Self {
        self.artist = Some(artist.into());
        self
    }

    /// Set album artist.
    pub fn with_album_artist<S: Into<String>>(mut self, album_artist: S) -> Self {
        self.album_artist = Some(album_artist.into());
        self
    }

    /// Set year.
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    /// Set genre.
    pub fn with_genre<S: Into<String>>(mut self, genre: S) -> Self {
        self.genre = Some(genre.into());
        self
    }

    /// Set comment.
    pub fn with_comment<S: Into<String>>(mut self, comment: S) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Set cover art from image bytes.
    pub fn with_cover_art(mut self, cover: Vec<u8>) -> Self {
        self.cover_art = Some(cover);
        self
    }
}

/// Detect the MIME type of cover art from its magic bytes.
fn cover_mime_type(data: &[u8]) -> MimeType {
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        MimeType::Png
    } else {
        MimeType::Jpeg
    }
}

/// Write metadata to a video file.
///
/// Files the tag reader does not understand are left untouched and save
/// failures are logged, so tagging never fails a download.
pub fn write_metadata<P: AsRef<Path>>(path: P, metadata: &VideoMetadata) -> Result<()> {
    let path = path.as_ref();
    debug!("Writing metadata to: {}", path.display());

    let mut tagged_file = match lofty::read_from_path(path) {
        Ok(f) => f,
        Err(e) => {
            warn!("Could not read {} for tagging: {}", path.display(), e);
            return Ok(());
        }
    };

    if tagged_file.primary_tag().is_none() {
        let tag_type = tagged_file.primary_tag_type();
        tagged_file.insert_tag(Tag::new(tag_type));
    }
    let Some(tag) = tagged_file.primary_tag_mut() else {
        warn!("No writable tag for {}", path.display());
        return Ok(());
    };

    if let Some(title) = &metadata.title {
        tag.set_title(title.clone());
    }

    if let Some(artist) = &metadata.artist {
        tag.set_artist(artist.clone());
    }

    if let Some(album_artist) = &metadata.album_artist {
        tag.insert_text(ItemKey::AlbumArtist, album_artist.clone());
    }

    if let Some(year) = metadata.year {
        if year > 0 {
            tag.set_year(year as u32);
        }
    }

    if let Some(genre) = &metadata.genre {
        tag.set_genre(genre.clone());
    }

    if let Some(comment) = &metadata.comment {
        tag.set_comment(comment.clone());
    }

    if let Some(cover_data) = &metadata.cover_art {
        let picture = Picture::new_unchecked(
            PictureType::CoverFront,
            Some(cover_mime_type(cover_data)),
            None,
            cover_data.clone(),
        );
        tag.push_picture(picture);
    }

    if let Err(e) = tag.save_to_path(path, WriteOptions::default()) {
        warn!("Failed to save tags to {}: {}", path.display(), e);
    } else {
        debug!("Successfully wrote metadata to {}", path.display());
    }

    Ok(())
}

/// Fetch a thumbnail to use as cover art.
pub async fn fetch_thumbnail(client: &Client, url: &str) -> Option<Vec<u8>> {
    if url.is_empty() {
        return None;
    }

    match client.get(url).send().await {
        Ok(response) if response.status().is_success() => match response.bytes().await {
            // Placeholder images are tiny.
            Ok(bytes) if bytes.len() > 1000 => Some(bytes.to_vec()),
            Ok(_) => None,
            Err(e) => {
                warn!("Failed to read thumbnail {}: {}", url, e);
                None
            }
        },
        Ok(response) => {
            debug!("Thumbnail {} returned {}", url, response.status());
            None
        }
        Err(e) => {
            warn!("Failed to fetch thumbnail {}: {}", url, e);
            None
        }
    }
}
