//! Unified library interface.
//!
//! This module ties catalog lookup, downloading and organization together
//! behind one configured entry point.

use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::api::ImvdbApi;
use crate::cleanup::CleanedName;
use crate::config::Config;
use crate::downloader::{BatchDownloadResult, DownloadRequest, DownloadResult, Downloader};
use crate::error::{OrganizerError, Result};
use crate::migrations::{self, MigrationRunner};
use crate::models::{Artist, Video};
use crate::organizer::{
    OrganizationStatus, OrganizeOutcome, OrganizeReport, Organizer, OrganizerOptions,
};

/// Result of importing a catalog video.
#[derive(Debug, Serialize)]
pub struct ImportResult {
    /// Catalog entry that was imported.
    pub video: Video,
    /// Where the download landed.
    pub download: DownloadResult,
    /// What the organizer did with it.
    pub outcome: OrganizeOutcome,
}

/// Main library interface.
///
/// # Example
///
/// ```rust,no_run
/// use mvorg::{Config, Library};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let library = Library::new(Config::default())?;
///
///     let report = library.organize_all()?;
///     println!("Organized {} videos", report.organized.len());
///
///     let status = library.organization_status()?;
///     println!("{} videos pending", status.pending_videos);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Library {
    config: Config,
    api: ImvdbApi,
    downloader: Downloader,
    organizer: Organizer,
}

impl Library {
    /// Create a library from configuration.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the configuration is invalid.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let api = ImvdbApi::new(config.imvdb_app_key.as_deref())?;
        let downloader = Downloader::new(
            &config.downloads_dir,
            config.max_concurrent_downloads,
            config.embed_tags,
        )?;
        let organizer = Organizer::new(OrganizerOptions::from_config(&config));

        Ok(Self {
            config,
            api,
            downloader,
            organizer,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Catalog client.
    pub fn api(&self) -> &ImvdbApi {
        &self.api
    }

    /// Enable or disable dry-run organization.
    pub fn set_dry_run(&mut self, dry_run: bool) {
        self.organizer.set_dry_run(dry_run);
    }

    // ==================
    // METADATA FETCHING
    // ==================

    /// Search the catalog for videos.
    pub async fn search_videos(&self, query: &str, limit: u32) -> Result<Vec<Video>> {
        self.api.search_videos(query, limit).await
    }

    /// Search the catalog for artists.
    pub async fn search_artists(&self, query: &str, limit: u32) -> Result<Vec<Artist>> {
        self.api.search_artists(query, limit).await
    }

    /// Get a video by IMVDb ID.
    pub async fn get_video(&self, video_id: &str) -> Result<Video> {
        self.api.get_video(video_id).await
    }

    /// Get an artist by IMVDb ID.
    pub async fn get_artist(&self, artist_id: &str) -> Result<Artist> {
        self.api.get_artist(artist_id).await
    }

    /// Find the catalog entry for an artist and title.
    pub async fn find_video(&self, artist: &str, title: &str) -> Result<Option<Video>> {
        self.api.find_video(artist, title).await
    }

    // ==================
    // DOWNLOADING
    // ==================

    /// Fetch a catalog video, download it and file it into the library.
    pub async fn import_video(&self, video_id: &str) -> Result<ImportResult> {
        let video = self.api.get_video(video_id).await?;
        let request = video.to_download_request();
        if request.url.is_none() {
            warn!("Video {} has no playable source", video_id);
            return Err(OrganizerError::MissingUrl(request.label()));
        }

        let download = self.downloader.download(&request).await?;
        // File under the catalog artist/title; titles may contain delimiters.
        let name = CleanedName::from_parts(&download.artist, &download.title)?;
        let outcome = self.organizer.organize_as(&download.path, &name)?;
        info!("Imported {} ({})", request.label(), video_id);

        Ok(ImportResult {
            video,
            download,
            outcome,
        })
    }

    /// Download a video from a URL into the downloads directory.
    pub async fn download_url(&self, url: &str, artist: &str, title: &str) -> Result<DownloadResult> {
        self.downloader
            .download(&DownloadRequest::new(artist, title, url))
            .await
    }

    /// Download many videos with bounded concurrency.
    pub async fn download_all(&self, requests: &[DownloadRequest]) -> BatchDownloadResult {
        self.downloader.download_all(requests).await
    }

    // ==================
    // ORGANIZATION
    // ==================

    /// Organize every pending download.
    pub fn organize_all(&self) -> Result<OrganizeReport> {
        self.organizer.organize_all()
    }

    /// Organize one file.
    pub fn organize_file<P: AsRef<Path>>(&self, path: P) -> Result<OrganizeOutcome> {
        self.organizer.organize_file(path.as_ref())
    }

    /// Library and backlog counts.
    pub fn organization_status(&self) -> Result<OrganizationStatus> {
        self.organizer.status()
    }

    // ==================
    // SCHEMA
    // ==================

    /// Migration runner for the configured database.
    pub async fn migrations(&self) -> Result<MigrationRunner> {
        let pool = migrations::connect(&self.config.database_url).await?;
        Ok(MigrationRunner::new(pool, self.config.applied_by.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{serve, Route};
    use std::fs;

    fn config_in(root: &Path) -> Config {
        Config {
            library_dir: root.join("library"),
            downloads_dir: root.join("downloads"),
            database_url: format!("sqlite://{}", root.join("mvorg.db").display()),
            ..Default::default()
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = Config {
            max_concurrent_downloads: 0,
            ..Default::default()
        };
        assert!(matches!(
            Library::new(config),
            Err(OrganizerError::Config(_))
        ));
    }

    #[test]
    fn test_organize_through_facade() {
        let root = tempfile::tempdir().unwrap();
        let config = config_in(root.path());
        fs::create_dir_all(&config.downloads_dir).unwrap();
        fs::write(
            config.downloads_dir.join("Daft Punk - Around the World [HQ].mkv"),
            b"video",
        )
        .unwrap();

        let library = Library::new(config.clone()).unwrap();
        assert_eq!(library.organization_status().unwrap().pending_videos, 1);

        let report = library.organize_all().unwrap();
        assert_eq!(report.organized.len(), 1);
        assert!(config
            .library_dir
            .join("Daft Punk")
            .join("Daft Punk - Around the World.mkv")
            .exists());
    }

    #[tokio::test]
    async fn test_migrations_on_file_database() {
        let root = tempfile::tempdir().unwrap();
        let library = Library::new(config_in(root.path())).unwrap();

        let runner = library.migrations().await.unwrap();
        let applied = runner.run_pending().await.unwrap();
        assert_eq!(applied.len(), migrations::MIGRATIONS.len());
        assert!(root.path().join("mvorg.db").exists());

        let status = library.migrations().await.unwrap().status().await.unwrap();
        assert!(status.is_up_to_date());
        assert!(status.applied.iter().all(|m| m.applied_by == "mvorg"));
    }

    #[tokio::test]
    async fn test_download_url_requires_url() {
        let root = tempfile::tempdir().unwrap();
        let library = Library::new(config_in(root.path())).unwrap();
        let err = library.download_url("", "Muse", "Uprising").await.unwrap_err();
        assert!(matches!(err, OrganizerError::MissingUrl(_)));
    }

    #[tokio::test]
    async fn test_import_keeps_catalog_title() {
        let media = serve(vec![(
            "/media/uprising.mp4",
            Route::new(200, "video/mp4", vec![1u8; 2048]),
        )])
        .await;
        let video_json = format!(
            r#"{{
                "id": 5,
                "song_title": "Uprising - Live at Wembley",
                "year": 2010,
                "artists": [{{"name": "Muse", "slug": "muse"}}],
                "sources": [{{"source": "direct", "source_data": "{}/media/uprising.mp4", "is_primary": true}}]
            }}"#,
            media
        );
        let catalog = serve(vec![("/api/v1/video/5", Route::json(200, &video_json))]).await;

        let root = tempfile::tempdir().unwrap();
        let mut config = config_in(root.path());
        config.embed_tags = false;
        let mut library = Library::new(config.clone()).unwrap();
        library.api = ImvdbApi::new(None)
            .unwrap()
            .with_base_url(format!("{}/api/v1", catalog));

        let import = library.import_video("5").await.unwrap();
        let expected = config
            .library_dir
            .join("Muse")
            .join("Muse - Uprising - Live at Wembley.mp4");
        assert!(matches!(import.outcome, OrganizeOutcome::Moved { ref to, .. } if *to == expected));
        assert_eq!(fs::read(&expected).unwrap().len(), 2048);
    }
}
