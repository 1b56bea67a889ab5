//! Artist-related models.
//!
//! This module contains models for representing artists and their
//! videography.

use serde::{Deserialize, Serialize};

use super::common::{largest_image, IDs, Image};

/// Video when nested inside an artist context.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ArtistVideo {
    /// Song title.
    pub title: String,

    /// Release year, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,

    /// Video identifiers.
    pub ids: IDs,
}

impl ArtistVideo {
    /// Create a new video with basic info.
    pub fn new<S1: Into<String>, S2: Into<String>>(title: S1, imvdb_id: S2) -> Self {
        Self {
            title: title.into(),
            year: None,
            ids: IDs::with_imvdb(imvdb_id),
        }
    }
}

/// A full artist record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Artist {
    /// Artist name.
    pub name: String,

    /// URL slug on IMVDb.
    #[serde(default)]
    pub slug: String,

    /// IMVDb page URL.
    #[serde(default)]
    pub url: String,

    /// Short description line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub byline: Option<String>,

    /// Number of videos credited to the artist.
    #[serde(default)]
    pub video_count: u32,

    /// Artist images in various sizes.
    #[serde(default)]
    pub images: Vec<Image>,

    /// Artist identifiers.
    pub ids: IDs,

    /// Videos by this artist.
    #[serde(default)]
    pub videos: Vec<ArtistVideo>,
}

impl Artist {
    /// Create a new artist with name and IMVDb ID.
    pub fn new<S1: Into<String>, S2: Into<String>>(name: S1, imvdb_id: S2) -> Self {
        Self {
            name: name.into(),
            ids: IDs::with_imvdb(imvdb_id),
            ..Default::default()
        }
    }

    /// Get the IMVDb artist ID.
    pub fn imvdb_id(&self) -> Option<&str> {
        self.ids.imvdb.as_deref()
    }

    /// Get the largest image available.
    pub fn largest_image(&self) -> Option<&Image> {
        largest_image(&self.images)
    }

    /// Get all videos sorted by year (newest first, undated last).
    pub fn videos_by_year(&self) -> Vec<&ArtistVideo> {
        let mut videos: Vec<_> = self.videos.iter().collect();
        videos.sort_by(|a, b| b.year.cmp(&a.year));
        videos
    }
}
