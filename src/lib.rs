//! # mvorg
//!
//! A Rust library for building a music-video library: discover videos on
//! IMVDb, download them, and file them as `<Artist>/<Artist - Title.ext>`.
//!
//! ## Quick Start
//!
//! The easiest way to use this library is through the [`Library`] struct:
//!
//! ```rust,no_run
//! use mvorg::{Config, Library};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let library = Library::new(Config::default())?;
//!
//!     // Fetch, download and organize a catalog video
//!     let import = library.import_video("121779770452").await?;
//!     println!("Imported: {:?}", import.outcome);
//!
//!     // Sort everything waiting in the downloads directory
//!     let report = library.organize_all()?;
//!     println!("Organized {} videos", report.organized.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Filename cleanup**: strips tags like `[Official Video]` or `(4K)`
//! - **Organization** into per-artist folders with duplicate detection
//! - **Concurrent downloads** with tagging and per-video failure reports
//! - **Schema migrations** with status, run and rollback
//!
//! ## Lower-level pieces
//!
//! - [`cleanup`] - Filename parsing
//! - [`Organizer`] - Library placement
//! - [`Downloader`] - Streaming downloads
//! - [`ImvdbApi`] - Catalog client
//! - [`MigrationRunner`] - Schema changes

pub mod api;
pub mod cleanup;
pub mod config;
pub mod converters;
pub mod downloader;
pub mod error;
mod library;
pub mod migrations;
pub mod models;
pub mod organizer;
pub mod tagging;

#[cfg(test)]
mod test_support;

// Main interface (recommended)
pub use library::{ImportResult, Library};

// Building blocks
pub use api::ImvdbApi;
pub use cleanup::{clean_filename, CleanedName, CleanupError};
pub use config::Config;
pub use downloader::{BatchDownloadResult, DownloadFailure, DownloadRequest, DownloadResult, Downloader};
pub use error::{FailureCategory, OrganizerError};
pub use migrations::{MigrationRunner, MigrationStatus};
pub use models::{Artist, Video, VideoStatus};
pub use organizer::{OrganizationStatus, OrganizeOutcome, OrganizeReport, Organizer, OrganizerOptions};
