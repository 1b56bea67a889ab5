//! IMVDb API client.
//!
//! This module provides a client for the IMVDb API (imvdb.com/api/v1),
//! used to discover metadata and playable sources for music videos.

use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::cleanup::strip_noise;
use crate::converters;
use crate::error::{OrganizerError, Result};
use crate::models::{Artist, Video};

/// Base URL for the IMVDb API.
const API_BASE_URL: &str = "https://imvdb.com/api/v1/";

/// Header carrying the application key.
const APP_KEY_HEADER: &str = "IMVDB-APP-KEY";

/// Minimum score for [`ImvdbApi::find_video`] to accept a hit.
pub const MATCH_THRESHOLD: f64 = 0.75;

/// IMVDb API client.
///
/// # Example
///
/// ```rust,no_run
/// use mvorg::ImvdbApi;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let api = ImvdbApi::new(Some("your_app_key"))?;
///     if let Some(video) = api.find_video("Taylor Swift", "Anti-Hero").await? {
///         println!("{} ({:?})", video.title, video.year);
///     }
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ImvdbApi {
    client: Client,
    app_key: Option<String>,
    base_url: String,
}

impl ImvdbApi {
    /// Create a new IMVDb API client.
    ///
    /// Searches work without a key at a low rate limit; pass an application
    /// key to lift it.
    pub fn new(app_key: Option<&str>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("mvorg/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            app_key: app_key.filter(|k| !k.is_empty()).map(str::to_string),
            base_url: API_BASE_URL.to_string(),
        })
    }

    /// Point the client at a different API root.
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        self.base_url = base_url;
        self
    }

    /// Check whether an application key is configured.
    pub fn has_app_key(&self) -> bool {
        self.app_key.is_some()
    }

    /// Make a GET request with query parameters.
    async fn get_api(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Value> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("GET {} with params: {:?}", url, params);

        let mut request = self.client.get(&url).query(params);
        if let Some(key) = &self.app_key {
            request = request.header(APP_KEY_HEADER, key);
        }

        let response = request.send().await?;
        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(OrganizerError::BadCredentials(
                    "IMVDb rejected the application key".to_string(),
                ));
            }
            StatusCode::NOT_FOUND => {
                return Err(OrganizerError::NoDataApi(endpoint.to_string()));
            }
            StatusCode::TOO_MANY_REQUESTS => return Err(OrganizerError::QuotaExceeded),
            _ => {}
        }

        let data: Value = response.json().await?;

        if let Some(error) = data.get("error") {
            let error_msg = error
                .get("message")
                .and_then(|m| m.as_str())
                .or_else(|| error.as_str())
                .unwrap_or("Unknown error");
            error!("IMVDb API error: {}", error_msg);
            return Err(OrganizerError::ApiError(error_msg.to_string()));
        }

        Ok(data)
    }

    /// Run a search endpoint and return its `results` array.
    async fn search_raw(&self, kind: &str, query: &str, limit: u32) -> Result<Vec<Value>> {
        let per_page = limit.clamp(1, 100).to_string();
        let response = self
            .get_api(
                &format!("search/{}", kind),
                &[("q", query), ("per_page", &per_page)],
            )
            .await?;

        let total = response
            .get("total_results")
            .and_then(|t| t.as_u64())
            .unwrap_or(0);
        if total == 0 {
            return Err(OrganizerError::NoDataApi(query.to_string()));
        }

        Ok(response
            .get("results")
            .and_then(|r| r.as_array())
            .cloned()
            .unwrap_or_default())
    }

    /// Search for videos.
    pub async fn search_videos(&self, query: &str, limit: u32) -> Result<Vec<Video>> {
        let results = self.search_raw("videos", query, limit).await?;
        Ok(results
            .iter()
            .filter_map(|v| converters::parse_video(v).ok())
            .take(limit as usize)
            .collect())
    }

    /// Search for artists.
    pub async fn search_artists(&self, query: &str, limit: u32) -> Result<Vec<Artist>> {
        let results = self.search_raw("entities", query, limit).await?;
        Ok(results
            .iter()
            .filter_map(|a| converters::parse_artist(a).ok())
            .take(limit as usize)
            .collect())
    }

    /// Get a video by ID, including its sources and credits.
    pub async fn get_video(&self, video_id: &str) -> Result<Video> {
        let json = self
            .get_api(
                &format!("video/{}", video_id),
                &[("include", "sources,credits,featured")],
            )
            .await
            .map_err(|e| match e {
                OrganizerError::NoDataApi(_) => OrganizerError::VideoNotFound(video_id.to_string()),
                other => other,
            })?;
        converters::parse_video(&json)
    }

    /// Get an artist by ID, including their videos.
    pub async fn get_artist(&self, artist_id: &str) -> Result<Artist> {
        let json = self
            .get_api(
                &format!("entity/{}", artist_id),
                &[("include", "artist_videos")],
            )
            .await
            .map_err(|e| match e {
                OrganizerError::NoDataApi(_) => {
                    OrganizerError::ArtistNotFound(artist_id.to_string())
                }
                other => other,
            })?;
        converters::parse_artist(&json)
    }

    /// Find the catalog entry best matching an artist and title.
    ///
    /// Returns `None` when nothing scores at least [`MATCH_THRESHOLD`].
    pub async fn find_video(&self, artist: &str, title: &str) -> Result<Option<Video>> {
        let query = format!("{} {}", strip_noise(artist), strip_noise(title));
        let candidates = match self.search_videos(&query, 10).await {
            Ok(videos) => videos,
            Err(OrganizerError::NoDataApi(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        let best = candidates
            .into_iter()
            .map(|video| (match_score(&video, artist, title), video))
            .max_by(|a, b| a.0.total_cmp(&b.0));

        match best {
            Some((score, video)) if score >= MATCH_THRESHOLD => {
                debug!("Matched '{} - {}' with score {:.2}", artist, title, score);
                Ok(Some(video))
            }
            Some((score, video)) => {
                warn!(
                    "Best match for '{} - {}' was '{} - {}' (score {:.2}), rejecting",
                    artist,
                    title,
                    video.artists_string(", "),
                    video.title,
                    score
                );
                Ok(None)
            }
            None => Ok(None),
        }
    }
}

/// Lowercased, noise-free form used for comparisons.
fn normalize(text: &str) -> String {
    strip_noise(text)
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Similarity of a catalog video to an artist/title pair, in `[0, 1]`.
///
/// The title weighs more than the artist; the best of all credited artists
/// counts.
pub fn match_score(video: &Video, artist: &str, title: &str) -> f64 {
    let wanted_artist = normalize(artist);
    let wanted_title = normalize(title);

    let title_score = strsim::normalized_levenshtein(&normalize(&video.title), &wanted_title);
    let artist_score = video
        .artists
        .iter()
        .chain(video.featured_artists.iter())
        .map(|a| strsim::normalized_levenshtein(&normalize(&a.name), &wanted_artist))
        .chain(std::iter::once(strsim::normalized_levenshtein(
            &normalize(&video.artists_string(" ")),
            &wanted_artist,
        )))
        .fold(0.0_f64, f64::max);

    0.6 * title_score + 0.4 * artist_score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VideoArtist;
    use crate::test_support::{serve, Route};
    use tokio_test::{assert_err, assert_ok};

    async fn api_for(routes: Vec<(&'static str, Route)>) -> ImvdbApi {
        let base = serve(routes).await;
        ImvdbApi::new(Some("key"))
            .unwrap()
            .with_base_url(format!("{}/api/v1", base))
    }

    fn video(artist: &str, title: &str) -> Video {
        Video {
            title: title.to_string(),
            artists: vec![VideoArtist::new(artist, "")],
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("Anti-Hero [Official Video]"), "antihero");
        assert_eq!(normalize("  Taylor   Swift "), "taylor swift");
    }

    #[test]
    fn test_match_score_exact() {
        let v = video("Taylor Swift", "Anti-Hero");
        let score = match_score(&v, "taylor swift", "Anti-Hero (Official Music Video)");
        assert!((score - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_match_score_rejects_other_song() {
        let v = video("Taylor Swift", "Shake It Off");
        assert!(match_score(&v, "Taylor Swift", "Anti-Hero") < MATCH_THRESHOLD);
    }

    #[test]
    fn test_match_score_uses_any_artist() {
        let mut v = video("Calvin Harris", "This Is What You Came For");
        v.artists.push(VideoArtist::new("Rihanna", ""));
        assert!(match_score(&v, "Rihanna", "This Is What You Came For") >= MATCH_THRESHOLD);
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let api = ImvdbApi::new(None)
            .unwrap()
            .with_base_url("http://localhost:9999/api");
        assert_eq!(api.base_url, "http://localhost:9999/api/");
        assert!(!api.has_app_key());
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let api = api_for(vec![
            ("/api/v1/search/videos", Route::json(401, "{}")),
            ("/api/v1/video/7", Route::json(403, "{}")),
            ("/api/v1/search/entities", Route::json(429, "{}")),
        ])
        .await;

        let err = assert_err!(api.search_videos("muse", 5).await);
        assert!(matches!(err, OrganizerError::BadCredentials(_)));

        let err = assert_err!(api.get_video("7").await);
        assert!(matches!(err, OrganizerError::BadCredentials(_)));

        let err = assert_err!(api.search_artists("muse", 5).await);
        assert!(matches!(err, OrganizerError::QuotaExceeded));

        let err = assert_err!(api.get_video("404").await);
        assert!(matches!(err, OrganizerError::VideoNotFound(ref id) if id == "404"));

        let err = assert_err!(api.get_artist("404").await);
        assert!(matches!(err, OrganizerError::ArtistNotFound(_)));
    }

    #[tokio::test]
    async fn test_error_field_in_body() {
        let api = api_for(vec![(
            "/api/v1/video/9",
            Route::json(200, r#"{"error": {"message": "Invalid app key"}}"#),
        )])
        .await;

        let err = assert_err!(api.get_video("9").await);
        assert!(matches!(err, OrganizerError::ApiError(ref m) if m == "Invalid app key"));
    }

    #[tokio::test]
    async fn test_find_video_threshold() {
        let body = r#"{
            "total_results": 2,
            "results": [
                {"id": 1, "song_title": "Shake It Off", "artists": [{"name": "Taylor Swift"}]},
                {"id": 2, "song_title": "Anti-Hero", "artists": [{"name": "Taylor Swift"}]}
            ]
        }"#;
        let api = api_for(vec![("/api/v1/search/videos", Route::json(200, body))]).await;

        let found = assert_ok!(api.find_video("Taylor Swift", "Anti-Hero [Official Video]").await);
        assert_eq!(found.map(|v| v.title), Some("Anti-Hero".to_string()));

        let missing = assert_ok!(api.find_video("Muse", "Uprising").await);
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_empty_search_is_no_match() {
        let api = api_for(vec![(
            "/api/v1/search/videos",
            Route::json(200, r#"{"total_results": 0, "results": []}"#),
        )])
        .await;

        assert!(assert_ok!(api.find_video("Nobody", "Nothing").await).is_none());
    }
}
