//! Video-related models.
//!
//! This module contains models for representing music videos, their
//! credited artists and their playable sources.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::common::{largest_image, IDs, Image};
use crate::downloader::DownloadRequest;

/// Library status of a video.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoStatus {
    /// Known but not yet on disk.
    #[default]
    Wanted,
    /// Downloaded into the library.
    Downloaded,
    /// Deliberately skipped.
    Ignored,
}

impl VideoStatus {
    /// Lowercase label, as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Wanted => "wanted",
            VideoStatus::Downloaded => "downloaded",
            VideoStatus::Ignored => "ignored",
        }
    }
}

impl fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VideoStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wanted" => Ok(VideoStatus::Wanted),
            "downloaded" => Ok(VideoStatus::Downloaded),
            "ignored" => Ok(VideoStatus::Ignored),
            other => Err(format!("unknown video status: {}", other)),
        }
    }
}

/// Artist when nested inside a video context.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VideoArtist {
    /// Artist name.
    pub name: String,

    /// URL slug on IMVDb.
    #[serde(default)]
    pub slug: String,

    /// Artist identifiers.
    pub ids: IDs,
}

impl VideoArtist {
    /// Create a new artist with a name and slug.
    pub fn new<S1: Into<String>, S2: Into<String>>(name: S1, slug: S2) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
            ids: IDs::default(),
        }
    }
}

/// A place the video can be played from.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VideoSource {
    /// Source platform slug, e.g. "youtube" or "vimeo".
    pub source: String,

    /// Platform-specific identifier.
    pub data: String,

    /// Whether IMVDb marks this as the primary source.
    #[serde(default)]
    pub is_primary: bool,
}

impl VideoSource {
    /// Playable URL for known platforms.
    pub fn url(&self) -> Option<String> {
        if self.data.is_empty() {
            return None;
        }
        match self.source.as_str() {
            "youtube" => Some(format!("https://www.youtube.com/watch?v={}", self.data)),
            "vimeo" => Some(format!("https://vimeo.com/{}", self.data)),
            _ if self.data.starts_with("http") => Some(self.data.clone()),
            _ => None,
        }
    }
}

/// A full video record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Video {
    /// Song title.
    pub title: String,

    /// URL slug on IMVDb.
    #[serde(default)]
    pub slug: String,

    /// IMVDb page URL.
    #[serde(default)]
    pub url: String,

    /// Release year, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,

    /// Version label when a song has several videos.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_name: Option<String>,

    /// Primary artists.
    #[serde(default)]
    pub artists: Vec<VideoArtist>,

    /// Featured artists.
    #[serde(default)]
    pub featured_artists: Vec<VideoArtist>,

    /// Credited directors.
    #[serde(default)]
    pub directors: Vec<String>,

    /// Playable sources.
    #[serde(default)]
    pub sources: Vec<VideoSource>,

    /// Thumbnails in various sizes.
    #[serde(default)]
    pub images: Vec<Image>,

    /// Video identifiers.
    pub ids: IDs,

    /// Library status.
    #[serde(default)]
    pub status: VideoStatus,
}

impl Video {
    /// Get the primary artist name.
    pub fn primary_artist(&self) -> Option<&str> {
        self.artists.first().map(|a| a.name.as_str())
    }

    /// Get all artist names joined by a separator.
    pub fn artists_string(&self, separator: &str) -> String {
        self.artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(separator)
    }

    /// Get the IMVDb video ID.
    pub fn imvdb_id(&self) -> Option<&str> {
        self.ids.imvdb.as_deref()
    }

    /// Best playable URL: the primary source, then YouTube, then any.
    pub fn source_url(&self) -> Option<String> {
        self.sources
            .iter()
            .filter(|s| s.is_primary)
            .chain(self.sources.iter().filter(|s| s.source == "youtube"))
            .chain(self.sources.iter())
            .find_map(VideoSource::url)
    }

    /// YouTube watch URL, if the video has a YouTube source.
    pub fn youtube_url(&self) -> Option<String> {
        self.ids
            .youtube
            .as_ref()
            .map(|id| format!("https://www.youtube.com/watch?v={}", id))
    }

    /// URL of the largest thumbnail.
    pub fn thumbnail_url(&self) -> Option<&str> {
        largest_image(&self.images).map(|img| img.url.as_str())
    }

    /// Build a download request for this video.
    pub fn to_download_request(&self) -> DownloadRequest {
        DownloadRequest {
            artist: self.artists_string(", "),
            title: self.title.clone(),
            url: self.source_url().or_else(|| self.youtube_url()),
            year: self.year,
            thumbnail_url: self.thumbnail_url().map(str::to_string),
            imvdb_id: self.ids.imvdb.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::common::ImageSize;

    #[test]
    fn test_status_parse_and_display() {
        assert_eq!("Wanted".parse::<VideoStatus>(), Ok(VideoStatus::Wanted));
        assert_eq!(" downloaded ".parse::<VideoStatus>(), Ok(VideoStatus::Downloaded));
        assert!("deleted".parse::<VideoStatus>().is_err());
        assert_eq!(VideoStatus::Ignored.to_string(), "ignored");
        assert_eq!(VideoStatus::default(), VideoStatus::Wanted);
    }

    #[test]
    fn test_source_url_prefers_primary() {
        let video = Video {
            sources: vec![
                VideoSource {
                    source: "vimeo".into(),
                    data: "111".into(),
                    is_primary: false,
                },
                VideoSource {
                    source: "youtube".into(),
                    data: "abc".into(),
                    is_primary: true,
                },
            ],
            ..Default::default()
        };
        assert_eq!(
            video.source_url().as_deref(),
            Some("https://www.youtube.com/watch?v=abc")
        );
    }

    #[test]
    fn test_to_download_request() {
        let video = Video {
            title: "Anti-Hero".into(),
            year: Some(2022),
            artists: vec![VideoArtist::new("Taylor Swift", "taylor-swift")],
            images: vec![
                Image::new("small.jpg", ImageSize::Small),
                Image::new("orig.jpg", ImageSize::Original),
            ],
            ids: IDs {
                imvdb: Some("42".into()),
                youtube: Some("b1kbLwvqugk".into()),
                discogs: None,
            },
            ..Default::default()
        };

        let request = video.to_download_request();
        assert_eq!(request.artist, "Taylor Swift");
        assert_eq!(request.title, "Anti-Hero");
        assert_eq!(
            request.url.as_deref(),
            Some("https://www.youtube.com/watch?v=b1kbLwvqugk")
        );
        assert_eq!(request.thumbnail_url.as_deref(), Some("orig.jpg"));
        assert_eq!(request.imvdb_id.as_deref(), Some("42"));
    }

    #[test]
    fn test_video_without_sources_has_no_url() {
        let video = Video::default();
        assert!(video.to_download_request().url.is_none());
    }
}
