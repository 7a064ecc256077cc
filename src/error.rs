use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

/// Failure of a single external `git` invocation.
#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error("failed to launch `git {command}`: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("`git {command}` timed out after {}s", after.as_secs_f64())]
    Timeout { command: String, after: Duration },

    #[error("`git {command}` was cancelled")]
    Cancelled { command: String },

    #[error("`git {command}` exited with {status}{}", stderr_suffix(stderr))]
    Failed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },
}

impl GitError {
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// True when the tool itself could not be started (missing binary, permission denied).
    #[must_use]
    pub fn is_spawn_failure(&self) -> bool {
        matches!(self, Self::Spawn { .. })
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("failed to read directory cache {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse directory cache {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to serialize directory cache {}: {source}", path.display())]
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to write directory cache {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Conditions that end a scan run.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("base path {} does not exist", path.display())]
    MissingBasePath { path: PathBuf },

    #[error("base path {} is not a directory", path.display())]
    NotADirectory { path: PathBuf },

    #[error("version-control tool `{program}` is unavailable: {source}")]
    ToolUnavailable { program: String, source: GitError },

    #[error("failed to build worker pool: {source}")]
    WorkerPool {
        #[from]
        source: rayon::ThreadPoolBuildError,
    },

    #[error("scan cancelled")]
    Cancelled,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}
