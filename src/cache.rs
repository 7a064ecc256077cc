use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{CacheError, ScanError};
use crate::scan::find_repos;
use crate::types::ScanSettings;

/// Persisted result of a directory walk: `{ "base_dir": ..., "git_dirs": [...] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirCache {
    pub base_dir: PathBuf,
    pub git_dirs: Vec<PathBuf>,
}

impl DirCache {
    /// # Errors
    /// Returns an error when the file cannot be read or is not a cache document.
    pub fn load(path: &Path) -> Result<Self, CacheError> {
        let text = fs::read_to_string(path).map_err(|source| CacheError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| CacheError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// # Errors
    /// Returns an error when the file or its parent directory cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), CacheError> {
        let write_err = |source: std::io::Error| CacheError::Write {
            path: path.to_path_buf(),
            source,
        };
        let body = serde_json::to_string_pretty(self).map_err(|source| CacheError::Serialize {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(path, body).map_err(write_err)
    }
}

/// Read the cached directory list for `base`, or walk `base` and rewrite the cache.
///
/// A cache recorded for a different base directory is treated as stale.
///
/// # Errors
/// Fails when the walk cannot start or the cache cannot be read or written.
pub fn load_or_scan(
    cache_path: &Path,
    base: &Path,
    settings: &ScanSettings,
    refresh: bool,
) -> Result<DirCache, ScanError> {
    if !refresh && cache_path.exists() {
        let cached = DirCache::load(cache_path)?;
        if cached.base_dir == base {
            debug!(
                event = "census.cache.hit",
                path = %cache_path.display(),
                dirs = cached.git_dirs.len()
            );
            return Ok(cached);
        }
        debug!(
            event = "census.cache.stale",
            path = %cache_path.display(),
            cached_base = %cached.base_dir.display()
        );
    }

    let cache = DirCache {
        base_dir: base.to_path_buf(),
        git_dirs: find_repos(base, settings)?.collect(),
    };
    cache.save(cache_path)?;
    info!(
        event = "census.cache.written",
        path = %cache_path.display(),
        dirs = cache.git_dirs.len()
    );
    Ok(cache)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn scans_then_reuses_cache() {
        let temp = tempdir().expect("tempdir");
        let base = temp.path().join("src");
        fs::create_dir_all(base.join("a/.git")).expect("mkdir");
        let cache_path = temp.path().join("state/dirs.json");

        let first = load_or_scan(&cache_path, &base, &ScanSettings::default(), false).expect("scan");
        assert_eq!(first.git_dirs, vec![base.join("a")]);
        assert!(cache_path.exists());

        // A repository added after the cache was written is not seen without a refresh.
        fs::create_dir_all(base.join("b/.git")).expect("mkdir");
        let cached = load_or_scan(&cache_path, &base, &ScanSettings::default(), false).expect("load");
        assert_eq!(cached, first);

        let refreshed = load_or_scan(&cache_path, &base, &ScanSettings::default(), true).expect("refresh");
        assert_eq!(refreshed.git_dirs.len(), 2);
    }

    #[test]
    fn cache_for_other_base_is_rescanned() {
        let temp = tempdir().expect("tempdir");
        let base = temp.path().join("src");
        fs::create_dir_all(base.join("a/.git")).expect("mkdir");
        let cache_path = temp.path().join("dirs.json");
        DirCache {
            base_dir: PathBuf::from("/elsewhere"),
            git_dirs: vec![PathBuf::from("/elsewhere/x")],
        }
        .save(&cache_path)
        .expect("save");

        let cache = load_or_scan(&cache_path, &base, &ScanSettings::default(), false).expect("scan");
        assert_eq!(cache.base_dir, base);
        assert_eq!(cache.git_dirs, vec![base.join("a")]);
    }

    #[test]
    fn reads_documented_document_shape() {
        let json = r#"{ "base_dir": "/src", "git_dirs": ["/src/a", "/src/b"] }"#;
        let cache: DirCache = serde_json::from_str(json).expect("parse");
        assert_eq!(cache.git_dirs.len(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn unserializable_path_is_a_serialize_error() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp = tempdir().expect("tempdir");
        let cache_path = temp.path().join("state/dirs.json");
        let cache = DirCache {
            base_dir: PathBuf::from(OsStr::from_bytes(b"/src/\xff")),
            git_dirs: Vec::new(),
        };

        let err = cache.save(&cache_path).expect_err("non-UTF-8 path");
        assert!(matches!(err, CacheError::Serialize { .. }), "unexpected error: {err}");
        assert!(!cache_path.exists());
    }

    #[test]
    fn corrupt_cache_is_an_error() {
        let temp = tempdir().expect("tempdir");
        let cache_path = temp.path().join("dirs.json");
        fs::write(&cache_path, "not json").expect("write");
        let err = load_or_scan(&cache_path, temp.path(), &ScanSettings::default(), false)
            .expect_err("corrupt");
        assert!(matches!(err, ScanError::Cache(CacheError::Parse { .. })));
    }
}
