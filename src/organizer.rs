//! Video organization.
//!
//! Moves downloaded videos into `<library>/<Artist>/<Artist - Title.ext>`,
//! skipping byte-identical duplicates and never overwriting existing files.
//! Names that cannot be cleaned are reported and left in place.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use md5::{Digest, Md5};
use serde::Serialize;
use tracing::{debug, error, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::cleanup::{clean_filename, is_video_extension, sanitize_component, CleanedName};
use crate::config::Config;
use crate::error::Result;

/// Read buffer size for content digests.
const DIGEST_CHUNK: usize = 64 * 1024;

/// Where the organizer reads from and writes to.
#[derive(Debug, Clone, PartialEq)]
pub struct OrganizerOptions {
    /// Root of the organized library.
    pub library_dir: PathBuf,
    /// Directory scanned for new videos.
    pub downloads_dir: PathBuf,
    /// Compute outcomes without touching the filesystem.
    pub dry_run: bool,
    /// Delete duplicates from the downloads directory.
    pub remove_duplicates: bool,
}

impl OrganizerOptions {
    /// Options with duplicate removal on and dry run off.
    pub fn new<P1: Into<PathBuf>, P2: Into<PathBuf>>(library_dir: P1, downloads_dir: P2) -> Self {
        Self {
            library_dir: library_dir.into(),
            downloads_dir: downloads_dir.into(),
            dry_run: false,
            remove_duplicates: true,
        }
    }

    /// Options taken from the library configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            library_dir: config.library_dir.clone(),
            downloads_dir: config.downloads_dir.clone(),
            dry_run: false,
            remove_duplicates: config.remove_duplicates,
        }
    }
}

/// What happened to a single file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum OrganizeOutcome {
    /// Moved (or, in a dry run, would be moved) into the library.
    Moved {
        from: PathBuf,
        to: PathBuf,
        artist: String,
    },
    /// Same content already exists in the artist folder.
    Duplicate {
        path: PathBuf,
        existing: PathBuf,
        removed: bool,
    },
    /// The file already sits at its organized location.
    AlreadyOrganized { path: PathBuf },
    /// The name could not be cleaned; the file was left alone.
    Unprocessed { path: PathBuf, reason: String },
}

/// Result of organizing a batch of files.
#[derive(Debug, Default, Serialize)]
pub struct OrganizeReport {
    /// `(from, to)` pairs of moved files.
    pub organized: Vec<(PathBuf, PathBuf)>,
    /// `(duplicate, existing)` pairs.
    pub duplicates: Vec<(PathBuf, PathBuf)>,
    /// Files left in place with the reason.
    pub unprocessed: Vec<(PathBuf, String)>,
    /// Files whose move failed with the error message.
    pub failed: Vec<(PathBuf, String)>,
}

impl OrganizeReport {
    fn record(&mut self, outcome: OrganizeOutcome) {
        match outcome {
            OrganizeOutcome::Moved { from, to, .. } => self.organized.push((from, to)),
            OrganizeOutcome::Duplicate { path, existing, .. } => {
                self.duplicates.push((path, existing))
            }
            OrganizeOutcome::AlreadyOrganized { .. } => {}
            OrganizeOutcome::Unprocessed { path, reason } => self.unprocessed.push((path, reason)),
        }
    }

    /// Total number of files looked at.
    pub fn total(&self) -> usize {
        self.organized.len() + self.duplicates.len() + self.unprocessed.len() + self.failed.len()
    }

    /// Check if every file was organized or recognised as a duplicate.
    pub fn all_successful(&self) -> bool {
        self.unprocessed.is_empty() && self.failed.is_empty()
    }
}

/// Snapshot of the library and the downloads backlog.
#[derive(Debug, Clone, Serialize)]
pub struct OrganizationStatus {
    pub library_dir: PathBuf,
    pub downloads_dir: PathBuf,
    /// Artist folders in the library.
    pub artist_folders: usize,
    /// Videos inside artist folders.
    pub organized_videos: usize,
    /// Videos waiting in the downloads directory.
    pub pending_videos: usize,
    pub pending: Vec<PathBuf>,
}

/// Sorts downloaded videos into per-artist folders.
#[derive(Debug, Clone)]
pub struct Organizer {
    options: OrganizerOptions,
}

impl Organizer {
    /// Create a new organizer.
    pub fn new(options: OrganizerOptions) -> Self {
        Self { options }
    }

    /// Current options.
    pub fn options(&self) -> &OrganizerOptions {
        &self.options
    }

    /// Enable or disable dry-run mode.
    pub fn set_dry_run(&mut self, dry_run: bool) {
        self.options.dry_run = dry_run;
    }

    /// List videos in the downloads directory that await organization.
    ///
    /// Hidden files and partial downloads are skipped. When the downloads
    /// directory is the library itself, only top-level files count.
    pub fn pending_files(&self) -> Result<Vec<PathBuf>> {
        let downloads = canonical(&self.options.downloads_dir);
        if !downloads.is_dir() {
            debug!("Downloads directory {} does not exist", downloads.display());
            return Ok(Vec::new());
        }
        let library = canonical(&self.options.library_dir);
        let same_dir = downloads == library;

        let walker = WalkDir::new(&downloads)
            .follow_links(false)
            .max_depth(if same_dir { 1 } else { usize::MAX })
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0 || (!is_hidden(e) && (same_dir || !e.path().starts_with(&library)))
            });

        let mut files = Vec::new();
        for entry in walker {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() && has_video_extension(entry.path()) {
                        files.push(entry.into_path());
                    }
                }
                Err(e) => warn!("Error accessing entry: {}", e),
            }
        }

        debug!("{} pending videos in {}", files.len(), downloads.display());
        Ok(files)
    }

    /// Count artist folders, organized videos and pending downloads.
    pub fn status(&self) -> Result<OrganizationStatus> {
        let pending = self.pending_files()?;
        let library = canonical(&self.options.library_dir);
        let downloads = canonical(&self.options.downloads_dir);

        let mut artist_folders = 0;
        let mut organized_videos = 0;
        if library.is_dir() {
            for entry in fs::read_dir(&library)? {
                let entry = entry?;
                let path = entry.path();
                if !path.is_dir() || path == downloads || is_hidden_name(&entry.file_name()) {
                    continue;
                }
                artist_folders += 1;
                for file in fs::read_dir(&path)? {
                    let file = file?.path();
                    if file.is_file() && has_video_extension(&file) {
                        organized_videos += 1;
                    }
                }
            }
        }

        Ok(OrganizationStatus {
            library_dir: self.options.library_dir.clone(),
            downloads_dir: self.options.downloads_dir.clone(),
            artist_folders,
            organized_videos,
            pending_videos: pending.len(),
            pending,
        })
    }

    /// Organize a single file.
    ///
    /// # Errors
    ///
    /// Only I/O failures are errors; an uncleanable name yields
    /// [`OrganizeOutcome::Unprocessed`].
    pub fn organize_file(&self, path: &Path) -> Result<OrganizeOutcome> {
        self.organize_claimed(path, &mut Claims::default())
    }

    /// Organize a file under an already known artist and title.
    ///
    /// The file name is not parsed again. Without an extension on `name`,
    /// the extension of `path` is kept.
    pub fn organize_as(&self, path: &Path, name: &CleanedName) -> Result<OrganizeOutcome> {
        self.place(path, name, &mut Claims::default())
    }

    /// Organize every pending file.
    ///
    /// A failure on one file is recorded and the batch continues. Destinations
    /// picked earlier in the batch are honored even in a dry run.
    pub fn organize_all(&self) -> Result<OrganizeReport> {
        let files = self.pending_files()?;
        info!("Organizing {} pending videos", files.len());

        let mut claims = Claims::default();
        let mut report = OrganizeReport::default();
        for path in files {
            match self.organize_claimed(&path, &mut claims) {
                Ok(outcome) => report.record(outcome),
                Err(e) => {
                    error!("Failed to organize {}: {}", path.display(), e);
                    report.failed.push((path, e.to_string()));
                }
            }
        }

        info!(
            "Organized {}, duplicates {}, unprocessed {}, failed {}",
            report.organized.len(),
            report.duplicates.len(),
            report.unprocessed.len(),
            report.failed.len()
        );
        Ok(report)
    }

    fn organize_claimed(&self, path: &Path, claims: &mut Claims) -> Result<OrganizeOutcome> {
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            warn!("Leaving {} unprocessed: name is not valid UTF-8", path.display());
            return Ok(OrganizeOutcome::Unprocessed {
                path: path.to_path_buf(),
                reason: "name is not valid UTF-8".to_string(),
            });
        };

        match clean_filename(file_name) {
            Ok(cleaned) => self.place(path, &cleaned, claims),
            Err(e) => {
                warn!("Leaving {} unprocessed: {}", path.display(), e);
                Ok(OrganizeOutcome::Unprocessed {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })
            }
        }
    }

    fn place(&self, path: &Path, name: &CleanedName, claims: &mut Claims) -> Result<OrganizeOutcome> {
        let name = match (&name.extension, path.extension().and_then(|e| e.to_str())) {
            (None, Some(ext)) => name.clone().with_extension(ext),
            _ => name.clone(),
        };
        let artist_dir = self.artist_folder(&name.artist);
        let target_name = name.file_name();

        if canonical(&artist_dir.join(&target_name)) == canonical(path) {
            return Ok(OrganizeOutcome::AlreadyOrganized {
                path: path.to_path_buf(),
            });
        }

        let duplicate = match find_duplicate(path, &artist_dir, &target_name)? {
            Some(existing) => Some(existing),
            None => claims.duplicate_of(path, &artist_dir, &target_name)?,
        };
        if let Some(existing) = duplicate {
            let removed = self.options.remove_duplicates && !self.options.dry_run;
            if removed {
                fs::remove_file(path)?;
            }
            info!(
                "{} duplicates {}{}",
                path.display(),
                existing.display(),
                if removed { ", removed" } else { "" }
            );
            return Ok(OrganizeOutcome::Duplicate {
                path: path.to_path_buf(),
                existing,
                removed,
            });
        }

        let destination = free_destination(&artist_dir, &target_name, |p| claims.contains(p));
        if self.options.dry_run {
            info!("[dry run] {} -> {}", path.display(), destination.display());
            claims.claim(destination.clone(), path.to_path_buf());
        } else {
            fs::create_dir_all(&artist_dir)?;
            move_file(path, &destination)?;
            info!("Organized {} -> {}", path.display(), destination.display());
            claims.claim(destination.clone(), destination.clone());
        }

        Ok(OrganizeOutcome::Moved {
            from: path.to_path_buf(),
            to: destination,
            artist: name.artist,
        })
    }

    /// Folder for an artist, reusing an existing folder whose name differs
    /// only in case.
    fn artist_folder(&self, artist: &str) -> PathBuf {
        let folder_name = sanitize_component(artist);
        let wanted = folder_name.to_lowercase();

        if let Ok(entries) = fs::read_dir(&self.options.library_dir) {
            for entry in entries.flatten() {
                let matches = entry
                    .file_name()
                    .to_str()
                    .map(|name| name.to_lowercase() == wanted)
                    .unwrap_or(false);
                if matches && entry.path().is_dir() {
                    return entry.path();
                }
            }
        }

        self.options.library_dir.join(folder_name)
    }
}

/// First free path for `file_name` in `dir`: `name.ext`, `name (2).ext`, ...
pub fn unique_destination(dir: &Path, file_name: &str) -> PathBuf {
    free_destination(dir, file_name, |_| false)
}

/// Like [`unique_destination`], also skipping paths `taken` reports as used.
fn free_destination<F: Fn(&Path) -> bool>(dir: &Path, file_name: &str, taken: F) -> PathBuf {
    let is_free = |p: &Path| !p.exists() && !taken(p);
    let candidate = dir.join(file_name);
    if is_free(&candidate) {
        return candidate;
    }

    let (stem, ext) = split_name(file_name);
    (2u32..)
        .map(|n| dir.join(numbered_name(stem, ext, n)))
        .find(|p| is_free(p))
        .unwrap_or(candidate)
}

/// Destinations handed out during one batch, with the file holding the
/// content that will end up there.
#[derive(Debug, Default)]
struct Claims {
    claimed: HashMap<PathBuf, PathBuf>,
}

impl Claims {
    fn claim(&mut self, destination: PathBuf, content: PathBuf) {
        self.claimed.insert(destination, content);
    }

    fn contains(&self, path: &Path) -> bool {
        self.claimed.contains_key(path)
    }

    /// A claimed destination among `target_name` and its variants in `dir`
    /// whose content matches `source`.
    fn duplicate_of(&self, source: &Path, dir: &Path, target_name: &str) -> Result<Option<PathBuf>> {
        let source_len = fs::metadata(source)?.len();
        let mut source_digest: Option<String> = None;

        for (destination, content) in &self.claimed {
            let is_variant = destination.parent() == Some(dir)
                && destination
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| is_variant_of(n, target_name))
                    .unwrap_or(false);
            if !is_variant || content == source {
                continue;
            }
            match fs::metadata(content) {
                Ok(meta) if meta.len() == source_len => {}
                _ => continue,
            }

            let digest = match &source_digest {
                Some(d) => d.clone(),
                None => {
                    let d = file_digest(source)?;
                    source_digest = Some(d.clone());
                    d
                }
            };
            if file_digest(content)? == digest {
                return Ok(Some(destination.clone()));
            }
        }

        Ok(None)
    }
}

/// Compute the MD5 digest of a file's contents as hex.
pub fn file_digest(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Md5::new();
    let mut buffer = vec![0u8; DIGEST_CHUNK];
    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Look for a file with the same content among `target_name` and its
/// numbered variants in `dir`.
fn find_duplicate(source: &Path, dir: &Path, target_name: &str) -> Result<Option<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let source_len = fs::metadata(source)?.len();
    let mut source_digest: Option<String> = None;

    for entry in entries {
        let candidate = entry?.path();
        let is_variant = candidate
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| is_variant_of(n, target_name))
            .unwrap_or(false);
        if !is_variant || !candidate.is_file() {
            continue;
        }
        if fs::metadata(&candidate)?.len() != source_len {
            continue;
        }

        let digest = match &source_digest {
            Some(d) => d.clone(),
            None => {
                let d = file_digest(source)?;
                source_digest = Some(d.clone());
                d
            }
        };
        if file_digest(&candidate)? == digest {
            return Ok(Some(candidate));
        }
    }

    Ok(None)
}

/// `Song.mp4`, `Song (2).mp4`, `Song (10).mp4` are variants of `Song.mp4`.
fn is_variant_of(candidate: &str, target_name: &str) -> bool {
    let (stem, ext) = split_name(target_name);
    let (cand_stem, cand_ext) = split_name(candidate);

    let same_ext = match (ext, cand_ext) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        (None, None) => true,
        _ => false,
    };
    if !same_ext {
        return false;
    }
    if cand_stem == stem {
        return true;
    }

    cand_stem
        .strip_prefix(stem)
        .and_then(|rest| rest.strip_prefix(" ("))
        .and_then(|rest| rest.strip_suffix(')'))
        .map(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}

fn split_name(file_name: &str) -> (&str, Option<&str>) {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (file_name, None),
    }
}

fn numbered_name(stem: &str, ext: Option<&str>, n: u32) -> String {
    match ext {
        Some(ext) => format!("{} ({}).{}", stem, n, ext),
        None => format!("{} ({})", stem, n),
    }
}

/// Rename, falling back to copy + remove across filesystems.
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) => {
            debug!("rename {} failed ({}), copying instead", from.display(), e);
            fs::copy(from, to)?;
            fs::remove_file(from)
        }
    }
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn has_video_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(is_video_extension)
        .unwrap_or(false)
}

fn is_hidden(entry: &DirEntry) -> bool {
    is_hidden_name(entry.file_name())
}

fn is_hidden_name(name: &std::ffi::OsStr) -> bool {
    name.to_str().map(|s| s.starts_with('.')).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Fixture {
        _root: TempDir,
        library: PathBuf,
        downloads: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let root = tempfile::tempdir().unwrap();
            let library = root.path().join("library");
            let downloads = root.path().join("downloads");
            fs::create_dir_all(&library).unwrap();
            fs::create_dir_all(&downloads).unwrap();
            Self {
                _root: root,
                library,
                downloads,
            }
        }

        fn organizer(&self) -> Organizer {
            Organizer::new(OrganizerOptions::new(&self.library, &self.downloads))
        }

        fn download(&self, name: &str, content: &[u8]) -> PathBuf {
            let path = self.downloads.join(name);
            fs::write(&path, content).unwrap();
            path
        }
    }

    #[test]
    fn test_organize_documented_example() {
        let fx = Fixture::new();
        let src = fx.download(
            "Taylor Swift - Anti-Hero [Official Music Video] [4K] (2022).mp4",
            b"video",
        );

        let outcome = fx.organizer().organize_file(&src).unwrap();
        let expected = fx.library.join("Taylor Swift").join("Taylor Swift - Anti-Hero.mp4");
        match outcome {
            OrganizeOutcome::Moved { to, artist, .. } => {
                assert_eq!(to, expected);
                assert_eq!(artist, "Taylor Swift");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(expected.exists());
        assert!(!src.exists());
    }

    #[test]
    fn test_unprocessed_file_stays() {
        let fx = Fixture::new();
        let src = fx.download("A - B - C.mp4", b"video");

        let outcome = fx.organizer().organize_file(&src).unwrap();
        assert!(matches!(outcome, OrganizeOutcome::Unprocessed { .. }));
        assert!(src.exists());
    }

    #[test]
    fn test_conflict_gets_numeric_suffix() {
        let fx = Fixture::new();
        let artist_dir = fx.library.join("Artist");
        fs::create_dir_all(&artist_dir).unwrap();
        fs::write(artist_dir.join("Artist - Song.mp4"), b"first").unwrap();
        let src = fx.download("Artist - Song [HD].mp4", b"second cut");

        fx.organizer().organize_file(&src).unwrap();
        assert!(artist_dir.join("Artist - Song (2).mp4").exists());
        assert_eq!(fs::read(artist_dir.join("Artist - Song.mp4")).unwrap(), b"first");
    }

    #[test]
    fn test_duplicate_detection() {
        let fx = Fixture::new();
        let artist_dir = fx.library.join("Artist");
        fs::create_dir_all(&artist_dir).unwrap();
        fs::write(artist_dir.join("Artist - Song.mp4"), b"other").unwrap();
        fs::write(artist_dir.join("Artist - Song (2).mp4"), b"same bytes").unwrap();
        let src = fx.download("Artist - Song (Official Video).mp4", b"same bytes");

        let outcome = fx.organizer().organize_file(&src).unwrap();
        assert_eq!(
            outcome,
            OrganizeOutcome::Duplicate {
                path: src.clone(),
                existing: artist_dir.join("Artist - Song (2).mp4"),
                removed: true,
            }
        );
        assert!(!src.exists());
        assert!(!artist_dir.join("Artist - Song (3).mp4").exists());
    }

    #[test]
    fn test_duplicate_kept_when_removal_disabled() {
        let fx = Fixture::new();
        let artist_dir = fx.library.join("Artist");
        fs::create_dir_all(&artist_dir).unwrap();
        fs::write(artist_dir.join("Artist - Song.mp4"), b"same").unwrap();
        let src = fx.download("Artist - Song.mp4", b"same");

        let mut options = OrganizerOptions::new(&fx.library, &fx.downloads);
        options.remove_duplicates = false;
        let outcome = Organizer::new(options).organize_file(&src).unwrap();
        assert!(matches!(outcome, OrganizeOutcome::Duplicate { removed: false, .. }));
        assert!(src.exists());
    }

    #[test]
    fn test_reuses_folder_with_different_case() {
        let fx = Fixture::new();
        fs::create_dir_all(fx.library.join("taylor swift")).unwrap();
        let src = fx.download("Taylor Swift - Shake It Off.mp4", b"video");

        fx.organizer().organize_file(&src).unwrap();
        assert!(fx
            .library
            .join("taylor swift")
            .join("Taylor Swift - Shake It Off.mp4")
            .exists());
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let fx = Fixture::new();
        let src = fx.download("Muse - Uprising.mkv", b"video");
        let mut organizer = fx.organizer();
        organizer.set_dry_run(true);

        let outcome = organizer.organize_file(&src).unwrap();
        assert!(matches!(outcome, OrganizeOutcome::Moved { .. }));
        assert!(src.exists());
        assert!(!fx.library.join("Muse").exists());
    }

    #[test]
    fn test_pending_files_filters() {
        let fx = Fixture::new();
        fx.download("Artist - One.mp4", b"1");
        fx.download("Artist - Two.mp4.part", b"2");
        fx.download(".hidden - Three.mp4", b"3");
        fx.download("notes.txt", b"4");
        fs::create_dir_all(fx.downloads.join("nested")).unwrap();
        fs::write(fx.downloads.join("nested").join("Artist - Four.webm"), b"5").unwrap();

        let names: Vec<String> = fx
            .organizer()
            .pending_files()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["Artist - One.mp4", "Artist - Four.webm"]);
    }

    #[test]
    fn test_pending_skips_nested_library() {
        let root = tempfile::tempdir().unwrap();
        let downloads = root.path().to_path_buf();
        let library = downloads.join("library");
        fs::create_dir_all(library.join("Artist")).unwrap();
        fs::write(library.join("Artist").join("Artist - Song.mp4"), b"x").unwrap();
        fs::write(downloads.join("Other - Song.mp4"), b"y").unwrap();

        let organizer = Organizer::new(OrganizerOptions::new(&library, &downloads));
        let pending = organizer.pending_files().unwrap();
        assert_eq!(pending.len(), 1);
        assert!(pending[0].ends_with("Other - Song.mp4"));
    }

    #[test]
    fn test_same_directory_only_top_level_pending() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().to_path_buf();
        fs::create_dir_all(dir.join("Artist")).unwrap();
        fs::write(dir.join("Artist").join("Artist - Song.mp4"), b"x").unwrap();
        fs::write(dir.join("Other - Song.mp4"), b"y").unwrap();

        let organizer = Organizer::new(OrganizerOptions::new(&dir, &dir));
        assert_eq!(organizer.pending_files().unwrap().len(), 1);

        let report = organizer.organize_all().unwrap();
        assert_eq!(report.organized.len(), 1);
        assert!(dir.join("Other").join("Other - Song.mp4").exists());
    }

    #[test]
    fn test_organize_all_and_status() {
        let fx = Fixture::new();
        fx.download("Adele - Hello (Official Video).mp4", b"hello");
        fx.download("Adele - Skyfall [1080p].mp4", b"skyfall");
        fx.download("Nirvana | Lithium.webm", b"lithium");
        fx.download("untitled.mp4", b"nope");

        let organizer = fx.organizer();
        let before = organizer.status().unwrap();
        assert_eq!(before.pending_videos, 4);
        assert_eq!(before.organized_videos, 0);

        let report = organizer.organize_all().unwrap();
        assert_eq!(report.organized.len(), 3);
        assert_eq!(report.unprocessed.len(), 1);
        assert_eq!(report.total(), 4);
        assert!(!report.all_successful());

        let after = organizer.status().unwrap();
        assert_eq!(after.artist_folders, 2);
        assert_eq!(after.organized_videos, 3);
        assert_eq!(after.pending_videos, 1);
    }

    #[test]
    fn test_already_organized() {
        let fx = Fixture::new();
        let artist_dir = fx.library.join("Artist");
        fs::create_dir_all(&artist_dir).unwrap();
        let path = artist_dir.join("Artist - Song.mp4");
        fs::write(&path, b"x").unwrap();

        let outcome = fx.organizer().organize_file(&path).unwrap();
        assert_eq!(outcome, OrganizeOutcome::AlreadyOrganized { path: path.clone() });
        assert!(path.exists());
    }

    #[test]
    fn test_unique_destination() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            unique_destination(dir.path(), "Song.mp4"),
            dir.path().join("Song.mp4")
        );
        fs::write(dir.path().join("Song.mp4"), b"1").unwrap();
        fs::write(dir.path().join("Song (2).mp4"), b"2").unwrap();
        assert_eq!(
            unique_destination(dir.path(), "Song.mp4"),
            dir.path().join("Song (3).mp4")
        );
    }

    #[test]
    fn test_is_variant_of() {
        assert!(is_variant_of("Song.mp4", "Song.mp4"));
        assert!(is_variant_of("Song (12).MP4", "Song.mp4"));
        assert!(!is_variant_of("Song (Live).mp4", "Song.mp4"));
        assert!(!is_variant_of("Song.mkv", "Song.mp4"));
    }

    #[test]
    fn test_dry_run_batch_matches_real_run() {
        let fx = Fixture::new();
        fx.download("A - Song [HD].mp4", b"one");
        fx.download("A - Song (Official Video).mp4", b"two-different");
        fx.download("A - Song (Lyric Video).mp4", b"one");

        let mut organizer = fx.organizer();
        organizer.set_dry_run(true);
        let preview = organizer.organize_all().unwrap();

        organizer.set_dry_run(false);
        let real = organizer.organize_all().unwrap();

        let targets = |report: &OrganizeReport| -> Vec<PathBuf> {
            let mut to: Vec<PathBuf> = report.organized.iter().map(|(_, to)| to.clone()).collect();
            to.sort();
            to
        };
        assert_eq!(targets(&preview), targets(&real));
        assert_eq!(
            targets(&real),
            vec![
                fx.library.join("A").join("A - Song (2).mp4"),
                fx.library.join("A").join("A - Song.mp4"),
            ]
        );
        assert_eq!(preview.duplicates.len(), 1);
        assert_eq!(real.duplicates.len(), 1);
    }

    #[test]
    fn test_empty_artist_after_sanitizing_stays() {
        let fx = Fixture::new();
        let src = fx.download("... - Song.mp4", b"video");

        let outcome = fx.organizer().organize_file(&src).unwrap();
        assert!(matches!(outcome, OrganizeOutcome::Unprocessed { .. }));
        assert!(src.exists());
        assert!(!fx.library.join(" - Song.mp4").exists());
    }

    #[test]
    fn test_organize_as_keeps_known_title() {
        let fx = Fixture::new();
        let src = fx.download("Muse - Uprising - Live at Wembley.mp4", b"live");
        let name = CleanedName::from_parts("Muse", "Uprising - Live at Wembley").unwrap();

        let outcome = fx.organizer().organize_as(&src, &name).unwrap();
        let expected = fx
            .library
            .join("Muse")
            .join("Muse - Uprising - Live at Wembley.mp4");
        assert_eq!(
            outcome,
            OrganizeOutcome::Moved {
                from: src.clone(),
                to: expected.clone(),
                artist: "Muse".to_string(),
            }
        );
        assert!(expected.exists());
    }

    #[test]
    fn test_file_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.bin");
        fs::write(&path, b"hello").unwrap();
        assert_eq!(
            file_digest(&path).unwrap(),
            "5d41402abc4b2a76b9719d911017c592"
        );
    }
}
