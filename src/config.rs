//! Server configuration.
//!
//! All four knobs the server has — bind address, port, root media directory,
//! and the allowed image extension set — live in one immutable [`ServerConfig`]
//! built exactly once at startup and passed into the listers and the router
//! by `Arc`. There is no ambient/global configuration lookup anywhere in the
//! crate.
//!
//! Values come from CLI flags with environment variable fallbacks (see
//! `main.rs`); the defaults reproduce the classic setup:
//!
//! ```text
//! mangashelf --root manga --bind 0.0.0.0 --port 3001 \
//!     --extensions jpg,jpeg,png,webp,gif
//! ```

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Extension list is empty")]
    NoExtensions,
    #[error("Blank extension in list: {0:?}")]
    BlankExtension(String),
}

/// Default allowed page extensions, matched case-insensitively.
pub const DEFAULT_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];

/// Process-wide immutable configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Root media directory containing one subdirectory per chapter.
    pub root: PathBuf,
    /// Address the HTTP listener binds to.
    pub bind: IpAddr,
    /// Port the HTTP listener binds to.
    pub port: u16,
    /// Allowed page extensions, normalized to lowercase without a leading dot.
    extensions: Vec<String>,
}

impl ServerConfig {
    /// Build a config, normalizing the extension list.
    ///
    /// Each extension is trimmed, stripped of a leading dot, and lowercased,
    /// so `".JPG"`, `"jpg "` and `"jpg"` all mean the same thing. An empty
    /// list or a blank entry is rejected — a server that can never match a
    /// page is a misconfiguration, not a valid setup.
    pub fn new(
        root: PathBuf,
        bind: IpAddr,
        port: u16,
        extensions: &[String],
    ) -> Result<Self, ConfigError> {
        if extensions.is_empty() {
            return Err(ConfigError::NoExtensions);
        }

        let mut normalized = Vec::with_capacity(extensions.len());
        for raw in extensions {
            let ext = raw.trim().trim_start_matches('.').to_lowercase();
            if ext.is_empty() {
                return Err(ConfigError::BlankExtension(raw.clone()));
            }
            normalized.push(ext);
        }

        Ok(Self {
            root,
            bind,
            port,
            extensions: normalized,
        })
    }

    /// Whether a path's extension is in the allowed set (case-insensitive).
    ///
    /// Paths without an extension never match.
    pub fn allows_extension(&self, path: &Path) -> bool {
        path.extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .is_some_and(|ext| self.extensions.iter().any(|allowed| *allowed == ext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn config_with(extensions: &[&str]) -> Result<ServerConfig, ConfigError> {
        let extensions: Vec<String> = extensions.iter().map(|e| e.to_string()).collect();
        ServerConfig::new(
            PathBuf::from("manga"),
            IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            3001,
            &extensions,
        )
    }

    #[test]
    fn default_extensions_match_case_insensitively() {
        let config = config_with(DEFAULT_EXTENSIONS).unwrap();

        assert!(config.allows_extension(Path::new("1.png")));
        assert!(config.allows_extension(Path::new("cover.JPG")));
        assert!(config.allows_extension(Path::new("strip.WebP")));
        assert!(!config.allows_extension(Path::new("cover.psd")));
        assert!(!config.allows_extension(Path::new("notes.txt")));
        assert!(!config.allows_extension(Path::new("no-extension")));
    }

    #[test]
    fn extensions_normalized_from_dotted_and_mixed_case() {
        let config = config_with(&[".JPG", " png "]).unwrap();

        assert!(config.allows_extension(Path::new("a.jpg")));
        assert!(config.allows_extension(Path::new("b.PNG")));
        assert!(!config.allows_extension(Path::new("c.gif")));
    }

    #[test]
    fn empty_extension_list_is_error() {
        assert!(matches!(config_with(&[]), Err(ConfigError::NoExtensions)));
    }

    #[test]
    fn blank_extension_is_error() {
        assert!(matches!(
            config_with(&["jpg", " . "]),
            Err(ConfigError::BlankExtension(_))
        ));
    }
}
