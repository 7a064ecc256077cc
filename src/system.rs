use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub trait FsOps: Sync {
    fn expand_tilde(&self, p: &Path) -> PathBuf;
    /// Modification time of `path`, `None` when it does not exist or cannot be read.
    fn modified(&self, path: &Path) -> Option<SystemTime>;
    fn read_to_string(&self, path: &Path) -> Option<String>;
    /// Absolute path with symlinks resolved, `None` when it does not exist.
    fn canonicalize(&self, path: &Path) -> Option<PathBuf>;
}

pub struct DefaultFsOps;
impl FsOps for DefaultFsOps {
    fn expand_tilde(&self, p: &Path) -> PathBuf {
        if let Some(home) = std::env::var_os("HOME") {
            let home = PathBuf::from(home);
            if p.starts_with("~")
                && let Ok(rest) = p.strip_prefix("~")
            {
                return home.join(rest);
            }
        }
        p.to_path_buf()
    }

    fn modified(&self, path: &Path) -> Option<SystemTime> {
        std::fs::metadata(path).and_then(|m| m.modified()).ok()
    }

    fn read_to_string(&self, path: &Path) -> Option<String> {
        std::fs::read_to_string(path).ok()
    }

    fn canonicalize(&self, path: &Path) -> Option<PathBuf> {
        std::fs::canonicalize(path).ok()
    }
}

pub trait Clock: Sync {
    fn now(&self) -> SystemTime;
}

pub struct DefaultClock;
impl Clock for DefaultClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}
