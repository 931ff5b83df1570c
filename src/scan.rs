//! Filesystem scanning: the chapter and page listers.
//!
//! The root media directory holds one subdirectory per chapter, and each
//! chapter holds its page images:
//!
//! ```text
//! manga/                           # Root media directory
//! ├── ch1/                         # Chapter (any directory name works)
//! │   ├── 1.png
//! │   ├── 2.jpg
//! │   └── cover.psd                # Ignored — extension not allowed
//! ├── ch2/
//! │   ├── page1.jpg
//! │   ├── page2.jpg
//! │   └── page10.jpg               # Sorts after page2 (natural order)
//! └── notes.txt                    # Ignored — not a directory
//! ```
//!
//! Both listers are single-shot, read-only queries: enumerate direct entries,
//! classify each with one metadata lookup, filter, sort naturally. Nothing is
//! cached — every call reads the filesystem fresh, so two calls with no
//! intervening change return identical output.
//!
//! ## Error opacity
//!
//! Callers only ever see two failure kinds, "Unable to scan chapters" and
//! "Unable to scan pages". The underlying `io::Error` (permission, missing
//! directory, I/O) stays attached as a `source` for logging but is never part
//! of the client-visible message.
//!
//! ## Chapter names are untrusted
//!
//! The chapter name arrives from the URL. [`list_pages`] rejects anything
//! that is not a single normal path component, then canonicalizes the joined
//! path and requires it to stay strictly inside the root, so neither `../`
//! games nor symlinks pointing outside the root can escape it.

use crate::config::ServerConfig;
use crate::natural::natural_cmp;
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    /// Enumerating or stat-ing the root directory failed.
    #[error("Unable to scan chapters")]
    Chapters(#[source] io::Error),
    /// Enumerating or stat-ing a chapter directory failed.
    #[error("Unable to scan pages")]
    Pages(#[source] io::Error),
    /// The chapter name tried to escape the root (validation, not a scan failure).
    #[error("Invalid chapter name")]
    InvalidChapter(String),
}

/// What one metadata lookup says a directory entry is.
///
/// Symlinks are followed (the lookup uses `fs::metadata`), so a symlink to a
/// directory counts as a directory. One lookup per entry; the result is
/// filtered, never re-checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    RegularFile,
    /// Sockets, FIFOs, device nodes.
    Other,
}

fn classify(path: &Path) -> io::Result<EntryKind> {
    let metadata = fs::metadata(path)?;
    if metadata.is_dir() {
        Ok(EntryKind::Directory)
    } else if metadata.is_file() {
        Ok(EntryKind::RegularFile)
    } else {
        Ok(EntryKind::Other)
    }
}

/// List the chapters: names of immediate subdirectories of the root,
/// naturally sorted ascending.
pub fn list_chapters(config: &ServerConfig) -> Result<Vec<String>, ScanError> {
    let entries = read_entries(&config.root).map_err(ScanError::Chapters)?;

    // Stat entries in parallel; order is irrelevant since we re-sort below.
    let mut chapters: Vec<String> = entries
        .par_iter()
        .filter_map(|(name, path)| match classify(path) {
            Ok(EntryKind::Directory) => Some(Ok(name.clone())),
            Ok(_) => None,
            Err(e) => Some(Err(e)),
        })
        .collect::<Result<_, io::Error>>()
        .map_err(ScanError::Chapters)?;

    chapters.sort_by(|a, b| natural_cmp(a, b));
    Ok(chapters)
}

/// List the pages of one chapter: filenames of regular files with an allowed
/// extension, naturally sorted ascending.
///
/// The chapter name is validated before any filesystem access; see
/// [`ScanError::InvalidChapter`].
pub fn list_pages(config: &ServerConfig, chapter: &str) -> Result<Vec<String>, ScanError> {
    let chapter_dir = resolve_chapter_dir(config, chapter)?;
    let entries = read_entries(&chapter_dir).map_err(ScanError::Pages)?;

    let mut pages: Vec<String> = entries
        .par_iter()
        .filter_map(|(name, path)| match classify(path) {
            Ok(EntryKind::RegularFile) if config.allows_extension(path) => Some(Ok(name.clone())),
            Ok(_) => None,
            Err(e) => Some(Err(e)),
        })
        .collect::<Result<_, io::Error>>()
        .map_err(ScanError::Pages)?;

    pages.sort_by(|a, b| natural_cmp(a, b));
    Ok(pages)
}

/// Validate the chapter name and resolve it to a directory strictly inside
/// the root.
///
/// Two layers:
/// 1. Lexical: the name must be exactly one `Normal` path component. This
///    rejects `..`, `.`, empty names, absolute paths, and anything with a
///    separator — before touching the filesystem, so traversal attempts get
///    a validation error rather than a scan error.
/// 2. Canonical: the joined path must canonicalize to a strict descendant of
///    the canonicalized root, which also catches symlinks that point outside.
///
/// A chapter that simply does not exist fails canonicalization with a plain
/// `io::Error` and maps to [`ScanError::Pages`], keeping the observable
/// contract for missing chapters unchanged.
fn resolve_chapter_dir(config: &ServerConfig, chapter: &str) -> Result<PathBuf, ScanError> {
    let mut components = Path::new(chapter).components();
    let single_normal = matches!(components.next(), Some(Component::Normal(_)))
        && components.next().is_none();
    if !single_normal {
        return Err(ScanError::InvalidChapter(chapter.to_string()));
    }

    let root = config.root.canonicalize().map_err(ScanError::Pages)?;
    let dir = config
        .root
        .join(chapter)
        .canonicalize()
        .map_err(ScanError::Pages)?;

    if dir == root || !dir.starts_with(&root) {
        return Err(ScanError::InvalidChapter(chapter.to_string()));
    }
    Ok(dir)
}

/// Enumerate direct entries of a directory as (name, full path) pairs.
///
/// Entries whose names are not valid UTF-8 are skipped: a lossy rendering
/// would list a name that can never be fetched back through a URL.
fn read_entries(dir: &Path) -> io::Result<Vec<(String, PathBuf)>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        entries.push((name, entry.path()));
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};
    use tempfile::TempDir;

    fn test_config(root: &Path) -> ServerConfig {
        let extensions: Vec<String> = crate::config::DEFAULT_EXTENSIONS
            .iter()
            .map(|e| e.to_string())
            .collect();
        ServerConfig::new(
            root.to_path_buf(),
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            0,
            &extensions,
        )
        .unwrap()
    }

    /// Build the library layout from the module docs: two chapters plus a
    /// stray file in the root.
    fn setup_library() -> TempDir {
        let tmp = TempDir::new().unwrap();

        let ch1 = tmp.path().join("ch1");
        fs::create_dir_all(&ch1).unwrap();
        fs::write(ch1.join("1.png"), "fake image").unwrap();
        fs::write(ch1.join("2.jpg"), "fake image").unwrap();
        fs::write(ch1.join("cover.psd"), "fake psd").unwrap();

        let ch2 = tmp.path().join("ch2");
        fs::create_dir_all(&ch2).unwrap();
        fs::write(ch2.join("page1.jpg"), "fake image").unwrap();
        fs::write(ch2.join("page10.jpg"), "fake image").unwrap();
        fs::write(ch2.join("page2.jpg"), "fake image").unwrap();

        fs::write(tmp.path().join("notes.txt"), "stray file").unwrap();
        tmp
    }

    #[test]
    fn chapters_are_immediate_subdirectories_only() {
        let tmp = setup_library();
        let config = test_config(tmp.path());

        let chapters = list_chapters(&config).unwrap();
        assert_eq!(chapters, vec!["ch1", "ch2"]);
    }

    #[test]
    fn grandchildren_are_not_chapters() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("ch1").join("nested")).unwrap();
        let config = test_config(tmp.path());

        assert_eq!(list_chapters(&config).unwrap(), vec!["ch1"]);
    }

    #[test]
    fn chapters_sorted_naturally() {
        let tmp = TempDir::new().unwrap();
        for name in ["ch10", "ch2", "ch1"] {
            fs::create_dir_all(tmp.path().join(name)).unwrap();
        }
        let config = test_config(tmp.path());

        assert_eq!(list_chapters(&config).unwrap(), vec!["ch1", "ch2", "ch10"]);
    }

    #[test]
    fn missing_root_is_chapter_scan_error() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp.path().join("does-not-exist"));

        let result = list_chapters(&config);
        assert!(matches!(result, Err(ScanError::Chapters(_))));
    }

    #[test]
    fn pages_filtered_by_extension_and_kind() {
        let tmp = setup_library();
        // A subdirectory inside a chapter is not a page.
        fs::create_dir_all(tmp.path().join("ch1").join("extras")).unwrap();
        let config = test_config(tmp.path());

        let pages = list_pages(&config, "ch1").unwrap();
        assert_eq!(pages, vec!["1.png", "2.jpg"]);
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        let tmp = TempDir::new().unwrap();
        let ch = tmp.path().join("ch1");
        fs::create_dir_all(&ch).unwrap();
        fs::write(ch.join("a.JPG"), "fake image").unwrap();
        fs::write(ch.join("b.Png"), "fake image").unwrap();
        fs::write(ch.join("c.TXT"), "not an image").unwrap();
        let config = test_config(tmp.path());

        assert_eq!(list_pages(&config, "ch1").unwrap(), vec!["a.JPG", "b.Png"]);
    }

    #[test]
    fn pages_sorted_naturally() {
        let tmp = setup_library();
        let config = test_config(tmp.path());

        let pages = list_pages(&config, "ch2").unwrap();
        assert_eq!(pages, vec!["page1.jpg", "page2.jpg", "page10.jpg"]);
    }

    #[test]
    fn missing_chapter_is_page_scan_error() {
        let tmp = setup_library();
        let config = test_config(tmp.path());

        let result = list_pages(&config, "ch99");
        assert!(matches!(result, Err(ScanError::Pages(_))));
    }

    #[test]
    fn chapter_that_is_a_file_is_page_scan_error() {
        let tmp = setup_library();
        let config = test_config(tmp.path());

        let result = list_pages(&config, "notes.txt");
        assert!(matches!(result, Err(ScanError::Pages(_))));
    }

    #[test]
    fn traversal_chapter_names_rejected_before_io() {
        let tmp = setup_library();
        let config = test_config(tmp.path());

        for name in ["..", ".", "", "../ch1", "a/b", "/etc"] {
            let result = list_pages(&config, name);
            assert!(
                matches!(result, Err(ScanError::InvalidChapter(_))),
                "expected InvalidChapter for {name:?}"
            );
        }
    }

    #[cfg(unix)]
    #[test]
    fn symlink_escaping_root_rejected() {
        let tmp = setup_library();
        let outside = TempDir::new().unwrap();
        fs::write(outside.path().join("secret.jpg"), "outside").unwrap();
        std::os::unix::fs::symlink(outside.path(), tmp.path().join("escape")).unwrap();
        let config = test_config(tmp.path());

        let result = list_pages(&config, "escape");
        assert!(matches!(result, Err(ScanError::InvalidChapter(_))));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_inside_root_is_a_valid_chapter() {
        let tmp = setup_library();
        std::os::unix::fs::symlink(tmp.path().join("ch1"), tmp.path().join("alias")).unwrap();
        let config = test_config(tmp.path());

        assert_eq!(list_pages(&config, "alias").unwrap(), vec!["1.png", "2.jpg"]);
    }

    #[test]
    fn dot_prefixed_names_are_ordinary_entries() {
        let tmp = setup_library();
        let hidden = tmp.path().join(".specials");
        fs::create_dir_all(&hidden).unwrap();
        fs::write(hidden.join("1.jpg"), "fake image").unwrap();
        let config = test_config(tmp.path());

        let chapters = list_chapters(&config).unwrap();
        assert!(chapters.contains(&".specials".to_string()));
        assert_eq!(list_pages(&config, ".specials").unwrap(), vec!["1.jpg"]);
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_names_are_skipped() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let tmp = setup_library();
        fs::write(
            tmp.path().join("ch1").join(OsStr::from_bytes(b"bad\xFF.jpg")),
            "fake image",
        )
        .unwrap();
        fs::create_dir_all(tmp.path().join(OsStr::from_bytes(b"ch\xFF"))).unwrap();
        let config = test_config(tmp.path());

        assert_eq!(list_chapters(&config).unwrap(), vec!["ch1", "ch2"]);
        assert_eq!(list_pages(&config, "ch1").unwrap(), vec!["1.png", "2.jpg"]);
    }

    #[test]
    fn listing_is_idempotent() {
        let tmp = setup_library();
        let config = test_config(tmp.path());

        assert_eq!(
            list_chapters(&config).unwrap(),
            list_chapters(&config).unwrap()
        );
        assert_eq!(
            list_pages(&config, "ch2").unwrap(),
            list_pages(&config, "ch2").unwrap()
        );
    }
}
