#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use repo_census::{
    AuthorFilter, CancelFlag, DefaultClock, DefaultFsOps, DefaultGitRunner, FsOps, Options,
    ScanError, ScanReport, StatusForm,
    cache::load_or_scan,
    collect_report, collect_report_for_dirs,
    config::{CensusConfig, load_config, load_optional_config},
    output::{TabStyle, TextOptions, format_tab, format_text, to_json},
};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "~/.config/repo-census/config.toml";

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Tab,
    Json,
}

#[derive(Parser, Debug)]
#[command(version, about = "Find git repositories under a directory and report their state.")]
struct Args {
    /// Directory to scan
    #[arg(default_value = ".")]
    base: PathBuf,

    /// Compact status: only the branch line per repository
    #[arg(short, long, conflicts_with = "more")]
    short: bool,

    /// Long status form and each repository's recent commit log
    #[arg(short, long)]
    more: bool,

    /// Fetch all remotes of each repository before probing it
    #[arg(short, long)]
    fetch: bool,

    /// Colored text report
    #[arg(short, long)]
    color: bool,

    /// Debug logging on stderr
    #[arg(short, long)]
    verbose: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Table style to use with --output tab
    #[arg(long, value_enum, default_value_t = TabStyle::Rounded)]
    tab_style: TabStyle,

    /// Config file (default: ~/.config/repo-census/config.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum directory depth to walk (0 = only the base itself)
    #[arg(long)]
    depth: Option<usize>,

    /// Number of repositories probed in parallel
    #[arg(long)]
    workers: Option<usize>,

    /// Only count queued commits authored by the configured user.email
    #[arg(long)]
    mine: bool,

    /// Read the directory list from this cache file, writing it when missing
    #[arg(long)]
    cache: Option<PathBuf>,

    /// Rescan and rewrite the --cache file
    #[arg(long, requires = "cache")]
    refresh_cache: bool,

    /// Hide the progress spinner
    #[arg(long)]
    no_progress: bool,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("failed to render report: {0}")]
    Render(#[from] serde_json::Error),
}

impl CliError {
    fn exit_code(&self) -> ExitCode {
        match self {
            Self::Scan(ScanError::Cancelled) => ExitCode::from(130),
            _ => ExitCode::from(2),
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("repo-census: {err}");
            err.exit_code()
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(args: &Args) -> Result<(), CliError> {
    let fs = DefaultFsOps;
    let config = read_config(args, &fs)?;
    let opts = build_options(args, &config);

    let cancel = config
        .scan_deadline()
        .map_or_else(CancelFlag::new, CancelFlag::with_deadline);
    let on_interrupt = cancel.clone();
    if let Err(err) = ctrlc::set_handler(move || on_interrupt.cancel()) {
        warn!(event = "census.cli.ctrlc_unavailable", error = %err);
    }

    let git = DefaultGitRunner::new(config.git_program(), cancel.clone());
    let clock = DefaultClock;

    let report = match &args.cache {
        Some(cache_path) => {
            let base = absolute(&fs.expand_tilde(&opts.base));
            let cache = load_or_scan(
                &fs.expand_tilde(cache_path),
                &base,
                &opts.scan,
                args.refresh_cache,
            )?;
            collect_report_for_dirs(
                &cache.base_dir,
                &cache.git_dirs,
                &opts,
                &fs,
                &git,
                &clock,
                &cancel,
            )?
        }
        None => collect_report(&opts, &fs, &git, &clock, &cancel)?,
    };

    println!("{}", render(&report, args)?);
    Ok(())
}

fn read_config(args: &Args, fs: &dyn FsOps) -> Result<CensusConfig, ScanError> {
    let config = match &args.config {
        Some(path) => load_config(&fs.expand_tilde(path))?,
        None => load_optional_config(&fs.expand_tilde(Path::new(DEFAULT_CONFIG)))?,
    };
    debug!(event = "census.cli.config", config = ?config);
    Ok(config)
}

fn build_options(args: &Args, config: &CensusConfig) -> Options {
    let mut opts = Options::default();
    config.apply(&mut opts);

    opts.base.clone_from(&args.base);
    opts.status_form = if args.more {
        StatusForm::Long
    } else {
        StatusForm::Short
    };
    opts.fetch = args.fetch;
    if args.mine {
        opts.author = AuthorFilter::LocalIdentity;
    }
    if let Some(depth) = args.depth {
        opts.scan.max_depth = Some(depth);
    }
    if let Some(workers) = args.workers {
        opts.workers = workers.max(1);
    }
    opts.progress = !args.no_progress && !args.verbose && std::io::stderr().is_terminal();
    opts
}

fn render(report: &ScanReport, args: &Args) -> Result<String, CliError> {
    Ok(match args.output {
        OutputFormat::Text => format_text(
            report,
            TextOptions {
                color: args.color,
                short: args.short,
                more: args.more,
            },
        ),
        OutputFormat::Tab => format_tab(report, args.tab_style),
        OutputFormat::Json => to_json(report)?,
    })
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
