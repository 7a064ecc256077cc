use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::types::{AuthorFilter, Options};

/// On-disk settings, all optional. Anything left out keeps its built-in default.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CensusConfig {
    pub scan: ScanSection,
    pub probe: ProbeSection,
    pub report: ReportSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanSection {
    pub foreign_markers: Option<Vec<String>>,
    pub skip_dirs: Option<Vec<String>>,
    pub max_depth: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProbeSection {
    pub git: Option<String>,
    pub command_timeout_secs: Option<u64>,
    pub status_timeout_secs: Option<u64>,
    pub fetch_timeout_secs: Option<u64>,
    pub scan_deadline_secs: Option<u64>,
    /// An empty string disables the time window.
    pub log_since: Option<String>,
    pub log_max_count: Option<usize>,
    pub queued_author: Option<AuthorFilter>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportSection {
    pub flag_markers: Option<Vec<String>>,
    pub workers: Option<usize>,
}

/// Read and parse a config file.
///
/// # Errors
/// Returns an error when the file cannot be read or is not valid TOML for [`CensusConfig`].
pub fn load_config(path: &Path) -> Result<CensusConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Like [`load_config`], but a missing file yields the defaults.
///
/// # Errors
/// Returns an error when the file exists but cannot be read or parsed.
pub fn load_optional_config(path: &Path) -> Result<CensusConfig, ConfigError> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(CensusConfig::default())
    }
}

impl CensusConfig {
    /// Fold file settings over `opts`.
    pub fn apply(&self, opts: &mut Options) {
        if let Some(markers) = &self.scan.foreign_markers {
            opts.scan.foreign_markers.clone_from(markers);
        }
        if let Some(skip) = &self.scan.skip_dirs {
            opts.scan.skip_dirs.clone_from(skip);
        }
        if self.scan.max_depth.is_some() {
            opts.scan.max_depth = self.scan.max_depth;
        }

        if let Some(secs) = self.probe.command_timeout_secs {
            opts.timeouts.command = Duration::from_secs(secs);
        }
        if let Some(secs) = self.probe.status_timeout_secs {
            opts.timeouts.status = Duration::from_secs(secs);
        }
        if let Some(secs) = self.probe.fetch_timeout_secs {
            opts.timeouts.fetch = Duration::from_secs(secs);
        }
        if let Some(since) = &self.probe.log_since {
            opts.log.since = if since.trim().is_empty() {
                None
            } else {
                Some(since.clone())
            };
        }
        if let Some(count) = self.probe.log_max_count {
            opts.log.max_count = count;
        }
        if let Some(author) = self.probe.queued_author {
            opts.author = author;
        }

        if let Some(markers) = &self.report.flag_markers {
            opts.flag_markers.clone_from(markers);
        }
        if let Some(workers) = self.report.workers {
            opts.workers = workers.max(1);
        }
    }

    #[must_use]
    pub fn git_program(&self) -> &str {
        self.probe.git.as_deref().unwrap_or("git")
    }

    #[must_use]
    pub fn scan_deadline(&self) -> Option<Duration> {
        self.probe.scan_deadline_secs.map(Duration::from_secs)
    }
}
