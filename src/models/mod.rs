//! Data models for IMVDb responses and the local library.
//!
//! This module contains the data structures used to represent
//! videos, artists, and related metadata.

pub mod artist;
pub mod common;
pub mod video;

// Re-exports for convenience
pub use artist::{Artist, ArtistVideo};
pub use common::{IDs, Image, ImageSize};
pub use video::{Video, VideoArtist, VideoSource, VideoStatus};
