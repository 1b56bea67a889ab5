//! Filename cleanup.
//!
//! Turns noisy download names such as
//! `Taylor Swift - Anti-Hero [Official Music Video] [4K] (2022).mp4`
//! into `Taylor Swift - Anti-Hero.mp4`, or reports why it could not.

use std::sync::OnceLock;

use regex::{Captures, Regex};
use thiserror::Error;

/// Container extensions recognised as videos.
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "webm", "avi", "mov", "m4v", "flv", "wmv", "mpg", "mpeg", "ts",
];

/// Artist/title delimiters in priority order.
///
/// A hyphen only counts with spaces around it so that titles such as
/// `Anti-Hero` survive intact.
const DELIMITERS: &[&str] = &[" - ", " – ", " — ", "–", "—", "|", ": "];

/// Characters trimmed from either end once noise is gone.
const DANGLING: &[char] = &['-', '–', '—', '|', ':', ',', ';', '~'];

/// Why a name could not be split into artist and title.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CleanupError {
    /// Nothing left after removing noise.
    #[error("name is empty after cleanup")]
    Empty,

    /// No artist/title delimiter present.
    #[error("no artist/title delimiter found")]
    NoDelimiter,

    /// The delimiter occurs more than once.
    #[error("delimiter '{0}' occurs more than once")]
    AmbiguousDelimiter(String),

    /// Artist side is empty.
    #[error("artist is empty")]
    EmptyArtist,

    /// Title side is empty.
    #[error("title is empty")]
    EmptyTitle,
}

/// A cleaned `Artist - Title.ext` name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedName {
    /// Artist name.
    pub artist: String,
    /// Song title.
    pub title: String,
    /// Lowercased extension without the dot.
    pub extension: Option<String>,
    /// Year found in a removed tag such as `(2022)`.
    pub year: Option<i32>,
}

impl CleanedName {
    /// Build a name from separately known artist and title.
    ///
    /// Both parts are stripped of noise; an empty part is rejected.
    pub fn from_parts(artist: &str, title: &str) -> Result<Self, CleanupError> {
        let (artist, artist_year) = strip_noise_with_year(artist);
        let (title, title_year) = strip_noise_with_year(title);
        let (artist, title) = checked_parts(unquote(&artist), unquote(&title))?;

        Ok(Self {
            artist,
            title,
            extension: None,
            year: title_year.or(artist_year),
        })
    }

    /// Set the extension (leading dot optional).
    pub fn with_extension<S: AsRef<str>>(mut self, ext: S) -> Self {
        let ext = ext.as_ref().trim_start_matches('.').to_ascii_lowercase();
        self.extension = if ext.is_empty() { None } else { Some(ext) };
        self
    }

    /// File stem: `Artist - Title`, safe for use on disk.
    pub fn stem(&self) -> String {
        format!(
            "{} - {}",
            sanitize_component(&self.artist),
            sanitize_component(&self.title)
        )
    }

    /// Full file name: `Artist - Title.ext`.
    pub fn file_name(&self) -> String {
        match &self.extension {
            Some(ext) => format!("{}.{}", self.stem(), ext),
            None => self.stem(),
        }
    }
}

struct Patterns {
    bracket: Regex,
    noise_phrase: Regex,
    bare_tag: Regex,
    year: Regex,
    empty_bracket: Regex,
    spaces: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        bracket: Regex::new(r"\[([^\[\]]*)\]|\(([^()]*)\)|\{([^{}]*)\}").expect("valid regex"),
        noise_phrase: Regex::new(
            r"(?ix)\b(?:
                official(?:\s+(?:music|lyrics?|hd|4k))?(?:\s+(?:video|audio|visuali[sz]er|clip|mv))?
              | music\s+video
              | lyrics?\s+video
              | with\s+lyrics
              | lyrics?
              | video(?:\s+clip)?
              | audio
              | visuali[sz]er
              | m/?v
              | uhd | hdr | hd | hq | 4k | 8k
              | \d{3,4}p(?:\d{2})?
              | \d{2,3}\s?fps
              | remaster(?:ed)?
              | explicit | clean | version
              | (?:19|20)\d{2}
              | \d{1,2}:\d{2}(?::\d{2})?
            )\b",
        )
        .expect("valid regex"),
        bare_tag: Regex::new(
            r"(?i)\b(?:official\s+(?:music\s+|lyric\s+)?video|4k|8k|uhd|hdr|hd|hq|\d{3,4}p(?:\d{2})?|\d{2,3}fps|\d{1,2}:\d{2}(?::\d{2})?)\b",
        )
        .expect("valid regex"),
        year: Regex::new(r"\b((?:19|20)\d{2})\b").expect("valid regex"),
        empty_bracket: Regex::new(r"\(\s*\)|\[\s*\]|\{\s*\}").expect("valid regex"),
        spaces: Regex::new(r"\s+").expect("valid regex"),
    })
}

/// Check whether an extension (without dot) is a known video container.
pub fn is_video_extension(ext: &str) -> bool {
    let ext = ext.trim_start_matches('.');
    VIDEO_EXTENSIONS
        .iter()
        .any(|known| known.eq_ignore_ascii_case(ext))
}

/// Clean a file name and split it into artist and title.
///
/// # Errors
///
/// Returns a [`CleanupError`] when no single unambiguous delimiter
/// separates a non-empty artist from a non-empty title. Callers leave such
/// files where they are.
pub fn clean_filename(name: &str) -> Result<CleanedName, CleanupError> {
    let (stem, extension) = split_extension(name.trim());

    let stem = if stem.contains(' ') {
        stem.to_string()
    } else {
        stem.replace('_', " ")
    };

    let (cleaned, year) = strip_noise_with_year(&stem);
    if cleaned.is_empty() {
        return Err(CleanupError::Empty);
    }

    let (artist, title) = split_artist_title(&cleaned)?;

    Ok(CleanedName {
        artist,
        title,
        extension,
        year,
    })
}

/// Remove platform tags, quality tags, timestamps and Unicode noise.
pub fn strip_noise(text: &str) -> String {
    strip_noise_with_year(text).0
}

/// Replace characters that are not allowed in file names.
pub fn sanitize_component(name: &str) -> String {
    name.replace(['/', '\\', ':', '*', '?', '"', '<', '>', '|'], "_")
        .trim()
        .trim_end_matches('.')
        .trim()
        .to_string()
}

fn strip_noise_with_year(text: &str) -> (String, Option<i32>) {
    let p = patterns();
    let mut year = None;

    let text = strip_unicode_noise(text);

    let text = p.bracket.replace_all(&text, |caps: &Captures| {
        let inner = caps
            .get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))
            .map(|m| m.as_str())
            .unwrap_or("");
        if is_noise(inner) {
            if year.is_none() {
                year = p
                    .year
                    .captures(inner)
                    .and_then(|c| c.get(1))
                    .and_then(|m| m.as_str().parse().ok());
            }
            " ".to_string()
        } else {
            caps[0].to_string()
        }
    });

    let text = text
        .split('|')
        .filter(|segment| !is_noise(segment))
        .collect::<Vec<_>>()
        .join(" | ");

    let text = p.bare_tag.replace_all(&text, " ");
    let text = p.empty_bracket.replace_all(&text, " ");
    let text = p.spaces.replace_all(&text, " ");

    let cleaned = text
        .trim_matches(|c: char| c.is_whitespace() || DANGLING.contains(&c))
        .to_string();

    (cleaned, year)
}

/// True if the text is made of noise phrases and separators only.
fn is_noise(text: &str) -> bool {
    if text.trim().is_empty() {
        return false;
    }
    let rest = patterns().noise_phrase.replace_all(text, "");
    rest.chars()
        .all(|c| c.is_whitespace() || ",/;&+-.|".contains(c))
}

fn strip_unicode_noise(text: &str) -> String {
    text.chars()
        .filter_map(|c| match c {
            '\u{00A0}' | '\u{2007}' | '\u{202F}' => Some(' '),
            '\u{2018}' | '\u{2019}' | '\u{201B}' | '\u{2032}' => Some('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => Some('"'),
            '\u{FF5C}' => Some('|'),
            '\u{200B}'..='\u{200F}'
            | '\u{202A}'..='\u{202E}'
            | '\u{2060}'..='\u{2064}'
            | '\u{FEFF}'
            | '\u{FFFD}'
            | '\u{FE00}'..='\u{FE0F}' => None,
            '\u{1F000}'..='\u{1FAFF}' | '\u{2600}'..='\u{27BF}' | '\u{2B00}'..='\u{2BFF}' => None,
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect()
}

fn split_extension(name: &str) -> (&str, Option<String>) {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && is_video_extension(ext) => {
            (stem, Some(ext.to_ascii_lowercase()))
        }
        _ => (name, None),
    }
}

fn split_artist_title(text: &str) -> Result<(String, String), CleanupError> {
    for delim in DELIMITERS {
        match text.matches(delim).count() {
            0 => continue,
            1 => {}
            _ => return Err(CleanupError::AmbiguousDelimiter(delim.trim().to_string())),
        }

        let Some((artist, title)) = text.split_once(delim) else {
            continue;
        };
        return checked_parts(unquote(artist), unquote(title));
    }

    Err(CleanupError::NoDelimiter)
}

/// Both parts must survive sanitizing, or the file would land outside an
/// artist folder or with an empty title.
fn checked_parts(artist: String, title: String) -> Result<(String, String), CleanupError> {
    if sanitize_component(&artist).is_empty() {
        return Err(CleanupError::EmptyArtist);
    }
    if sanitize_component(&title).is_empty() {
        return Err(CleanupError::EmptyTitle);
    }
    Ok((artist, title))
}

fn unquote(text: &str) -> String {
    let text = text.trim();
    for quote in ['"', '\''] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            return text[1..text.len() - 1].trim().to_string();
        }
    }
    text.to_string()
}
