use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::ScanError;
use crate::types::ScanSettings;

const METADATA_DIR: &str = ".git";

/// Lazy walk yielding directories that hold a `.git` entry.
///
/// Metadata folders are never entered. Directories containing a foreign VCS marker are
/// pruned with their subtree, and working files below a repository are still walked so
/// nested repositories are found. Unreadable directories are logged and skipped.
pub struct RepoCandidates {
    inner: walkdir::IntoIter,
    settings: ScanSettings,
}

/// Start a walk rooted at `base`.
///
/// # Errors
/// Fails fast when `base` does not exist or is not a directory.
pub fn find_repos(base: &Path, settings: &ScanSettings) -> Result<RepoCandidates, ScanError> {
    if !base.exists() {
        return Err(ScanError::MissingBasePath {
            path: base.to_path_buf(),
        });
    }
    if !base.is_dir() {
        return Err(ScanError::NotADirectory {
            path: base.to_path_buf(),
        });
    }

    let mut walk = WalkDir::new(base).follow_links(false);
    if let Some(depth) = settings.max_depth {
        walk = walk.max_depth(depth);
    }
    Ok(RepoCandidates {
        inner: walk.into_iter(),
        settings: settings.clone(),
    })
}

impl RepoCandidates {
    fn is_skipped_name(&self, name: &str) -> bool {
        name == METADATA_DIR || self.settings.skip_dirs.iter().any(|s| s == name)
    }

    fn foreign_marker(&self, dir: &Path) -> Option<&str> {
        self.settings
            .foreign_markers
            .iter()
            .find(|marker| dir.join(marker).is_dir())
            .map(String::as_str)
    }
}

impl Iterator for RepoCandidates {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(
                        event = "census.scan.unreadable",
                        path = ?err.path(),
                        error = %err
                    );
                    continue;
                }
            };
            if !entry.file_type().is_dir() {
                continue;
            }

            // The root is always inspected, even if its own name matches a skip rule.
            if entry.depth() > 0
                && self.is_skipped_name(&entry.file_name().to_string_lossy())
            {
                self.inner.skip_current_dir();
                continue;
            }

            let path = entry.path();
            if let Some(marker) = self.foreign_marker(path) {
                debug!(
                    event = "census.scan.pruned",
                    path = %path.display(),
                    marker = %marker
                );
                self.inner.skip_current_dir();
                continue;
            }

            if path.join(METADATA_DIR).exists() {
                debug!(event = "census.scan.candidate", path = %path.display());
                return Some(path.to_path_buf());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    fn mkdirs(root: &Path, dirs: &[&str]) {
        for d in dirs {
            fs::create_dir_all(root.join(d)).expect("mkdir");
        }
    }

    fn scan(root: &Path) -> Vec<PathBuf> {
        find_repos(root, &ScanSettings::default())
            .expect("scan")
            .collect()
    }

    #[test]
    fn finds_repositories_and_ignores_plain_dirs() {
        let temp = tempdir().expect("tempdir");
        mkdirs(temp.path(), &["r1/.git", "r2/.git", "not-a-repo/src"]);

        let found: HashSet<_> = scan(temp.path()).into_iter().collect();
        let expected: HashSet<_> = [temp.path().join("r1"), temp.path().join("r2")]
            .into_iter()
            .collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn base_that_is_a_repository_is_yielded() {
        let temp = tempdir().expect("tempdir");
        mkdirs(temp.path(), &[".git"]);
        assert_eq!(scan(temp.path()), vec![temp.path().to_path_buf()]);
    }

    #[test]
    fn nested_repositories_below_working_files_are_found() {
        let temp = tempdir().expect("tempdir");
        mkdirs(temp.path(), &["outer/.git/modules/x", "outer/vendor/inner/.git"]);

        let found: HashSet<_> = scan(temp.path()).into_iter().collect();
        assert!(found.contains(&temp.path().join("outer")));
        assert!(found.contains(&temp.path().join("outer/vendor/inner")));
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn foreign_marker_prunes_whole_subtree() {
        let temp = tempdir().expect("tempdir");
        mkdirs(temp.path(), &["svn-checkout/.svn", "svn-checkout/sub/.git", "kept/.git"]);

        let found = scan(temp.path());
        assert_eq!(found, vec![temp.path().join("kept")]);
        assert!(found.iter().all(|p| !p.starts_with(temp.path().join("svn-checkout"))));
    }

    #[test]
    fn directory_with_only_marker_is_not_yielded() {
        let temp = tempdir().expect("tempdir");
        mkdirs(temp.path(), &["only/.svn"]);
        assert!(scan(temp.path()).is_empty());
    }

    #[test]
    fn skip_dirs_are_not_entered() {
        let temp = tempdir().expect("tempdir");
        mkdirs(temp.path(), &["svn/checkout/.git", "code/.git"]);
        assert_eq!(scan(temp.path()), vec![temp.path().join("code")]);
    }

    #[test]
    fn git_file_marks_a_worktree() {
        let temp = tempdir().expect("tempdir");
        mkdirs(temp.path(), &["wt"]);
        fs::write(temp.path().join("wt/.git"), "gitdir: /elsewhere\n").expect("write");
        assert_eq!(scan(temp.path()), vec![temp.path().join("wt")]);
    }

    #[test]
    fn no_duplicates() {
        let temp = tempdir().expect("tempdir");
        mkdirs(temp.path(), &["a/.git", "a/b/.git", "c/d/.git"]);
        let found = scan(temp.path());
        let unique: HashSet<_> = found.iter().collect();
        assert_eq!(unique.len(), found.len());
        assert_eq!(found.len(), 3);
    }

    #[test]
    fn max_depth_limits_walk() {
        let temp = tempdir().expect("tempdir");
        mkdirs(temp.path(), &["shallow/.git", "deep/er/.git"]);
        let settings = ScanSettings {
            max_depth: Some(1),
            ..ScanSettings::default()
        };
        let found: Vec<_> = find_repos(temp.path(), &settings).expect("scan").collect();
        assert_eq!(found, vec![temp.path().join("shallow")]);
    }

    #[test]
    fn bad_base_path_fails_fast() {
        let temp = tempdir().expect("tempdir");
        let missing = temp.path().join("missing");
        assert!(matches!(
            find_repos(&missing, &ScanSettings::default()),
            Err(ScanError::MissingBasePath { .. })
        ));

        let file = temp.path().join("file");
        fs::write(&file, "x").expect("write");
        assert!(matches!(
            find_repos(&file, &ScanSettings::default()),
            Err(ScanError::NotADirectory { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_loops_do_not_break_the_walk() {
        let temp = tempdir().expect("tempdir");
        mkdirs(temp.path(), &["r/.git"]);
        std::os::unix::fs::symlink(temp.path(), temp.path().join("r/loop")).expect("symlink");
        assert_eq!(scan(temp.path()), vec![temp.path().join("r")]);
    }
}
