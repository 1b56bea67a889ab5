//! Common types shared across all models.

use serde::{Deserialize, Serialize};

/// Identifiers for catalog content.
///
/// Different fields are populated depending on the type of content.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IDs {
    /// IMVDb ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imvdb: Option<String>,

    /// YouTube video ID (for videos).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube: Option<String>,

    /// Discogs ID (for artists).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discogs: Option<String>,
}

impl IDs {
    /// Create new IDs with just an IMVDb ID.
    pub fn with_imvdb<S: Into<String>>(imvdb_id: S) -> Self {
        Self {
            imvdb: Some(imvdb_id.into()),
            ..Default::default()
        }
    }
}

/// Image sizes served by IMVDb, smallest first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSize {
    Small,
    #[default]
    Thumb,
    Big,
    Large,
    Original,
}

impl ImageSize {
    /// Map an IMVDb image key (`s`, `t`, `b`, `l`, `o`).
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "s" => Some(ImageSize::Small),
            "t" => Some(ImageSize::Thumb),
            "b" => Some(ImageSize::Big),
            "l" => Some(ImageSize::Large),
            "o" => Some(ImageSize::Original),
            _ => None,
        }
    }
}

/// Image with URL and size class.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Image {
    /// URL to the image.
    pub url: String,

    /// Size class.
    pub size: ImageSize,
}

impl Image {
    /// Create a new image.
    pub fn new<S: Into<String>>(url: S, size: ImageSize) -> Self {
        Self {
            url: url.into(),
            size,
        }
    }
}

/// Pick the largest image of a set.
pub fn largest_image(images: &[Image]) -> Option<&Image> {
    images.iter().max_by_key(|img| img.size)
}
