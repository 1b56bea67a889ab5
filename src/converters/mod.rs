//! JSON to model converters.
//!
//! This module provides functions to convert raw IMVDb API JSON responses
//! into typed model structures.

use serde_json::Value;

use crate::error::{OrganizerError, Result};
use crate::models::{
    artist::{Artist, ArtistVideo},
    common::{IDs, Image, ImageSize},
    video::{Video, VideoArtist, VideoSource},
};

/// Extract images from an IMVDb `image` field.
///
/// The field is either an object keyed by size (`o`, `l`, `b`, `t`, `s`)
/// or a single URL string.
pub fn extract_images(json: &Value) -> Vec<Image> {
    match json.get("image") {
        Some(Value::Object(map)) => {
            let mut images: Vec<Image> = map
                .iter()
                .filter_map(|(key, url)| {
                    let size = ImageSize::from_key(key)?;
                    let url = url.as_str().filter(|u| !u.is_empty())?;
                    Some(Image::new(url, size))
                })
                .collect();
            images.sort_by_key(|img| img.size);
            images
        }
        Some(Value::String(url)) if !url.is_empty() => {
            vec![Image::new(url.as_str(), ImageSize::Original)]
        }
        _ => Vec::new(),
    }
}

/// Get string from JSON, returning empty string if not found.
fn get_str(json: &Value, key: &str) -> String {
    json.get(key)
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}

/// Get optional non-empty string from JSON.
fn get_opt_str(json: &Value, key: &str) -> Option<String> {
    json.get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Get string ID from JSON (handles both string and numeric IDs).
fn get_id(json: &Value, key: &str) -> Option<String> {
    match json.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Get u32 from JSON.
fn get_u32(json: &Value, key: &str) -> u32 {
    json.get(key).and_then(|v| v.as_u64()).unwrap_or(0) as u32
}

/// Get a plausible year from JSON (numeric or string).
fn get_year(json: &Value, key: &str) -> Option<i32> {
    let year = match json.get(key)? {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    (year > 0).then_some(year as i32)
}

/// Parse an artist credited on a video.
fn parse_video_artist(json: &Value) -> VideoArtist {
    VideoArtist {
        name: get_str(json, "name"),
        slug: get_str(json, "slug"),
        ids: IDs {
            imvdb: get_id(json, "id"),
            ..Default::default()
        },
    }
}

fn parse_artist_list(json: &Value, key: &str) -> Vec<VideoArtist> {
    json.get(key)
        .and_then(|a| a.as_array())
        .map(|arr| arr.iter().map(parse_video_artist).collect())
        .unwrap_or_default()
}

fn parse_sources(json: &Value) -> Vec<VideoSource> {
    json.get("sources")
        .and_then(|s| s.as_array())
        .map(|arr| {
            arr.iter()
                .map(|s| VideoSource {
                    source: get_opt_str(s, "source_slug")
                        .or_else(|| get_opt_str(s, "source"))
                        .unwrap_or_default()
                        .to_lowercase(),
                    data: get_id(s, "source_data").unwrap_or_default(),
                    is_primary: s.get("is_primary").and_then(|p| p.as_bool()).unwrap_or(false),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn parse_directors(json: &Value) -> Vec<String> {
    json.get("directors")
        .and_then(|d| d.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|d| get_opt_str(d, "entity_name").or_else(|| get_opt_str(d, "name")))
                .collect()
        })
        .unwrap_or_default()
}

/// Parse a video from IMVDb JSON.
///
/// Works for both search hits and full video records.
pub fn parse_video(json: &Value) -> Result<Video> {
    let title = get_opt_str(json, "song_title")
        .ok_or_else(|| OrganizerError::NoDataApi("Video has no song_title".to_string()))?;

    let sources = parse_sources(json);
    let youtube = sources
        .iter()
        .find(|s| s.source == "youtube" && !s.data.is_empty())
        .map(|s| s.data.clone());

    Ok(Video {
        title,
        slug: get_str(json, "song_slug"),
        url: get_str(json, "url"),
        year: get_year(json, "year"),
        version_name: get_opt_str(json, "version_name"),
        artists: parse_artist_list(json, "artists"),
        featured_artists: parse_artist_list(json, "featured_artists"),
        directors: parse_directors(json),
        sources,
        images: extract_images(json),
        ids: IDs {
            imvdb: get_id(json, "id"),
            youtube,
            discogs: None,
        },
        status: Default::default(),
    })
}

/// Parse an artist (IMVDb "entity") from JSON.
pub fn parse_artist(json: &Value) -> Result<Artist> {
    let name = get_opt_str(json, "name")
        .ok_or_else(|| OrganizerError::NoDataApi("Entity has no name".to_string()))?;

    let videos = json
        .get("artist_videos")
        .and_then(|v| v.get("videos"))
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| {
                    Some(ArtistVideo {
                        title: get_opt_str(v, "song_title")?,
                        year: get_year(v, "year"),
                        ids: IDs {
                            imvdb: get_id(v, "id"),
                            ..Default::default()
                        },
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(Artist {
        name,
        slug: get_str(json, "slug"),
        url: get_str(json, "url"),
        byline: get_opt_str(json, "byline"),
        video_count: get_u32(json, "artist_video_count"),
        images: extract_images(json),
        ids: IDs {
            imvdb: get_id(json, "id"),
            youtube: None,
            discogs: get_id(json, "discogs_id"),
        },
        videos,
    })
}
