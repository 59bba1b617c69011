//! Directory auto-iterator.
//!
//! Each `next` hands out one not-yet-processed image from a directory and
//! records it under the state directory, so repeated invocations walk the
//! directory in path order across restarts.

use std::path::{self, Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use dir_iterator::core::types::Toggle;
use dir_iterator::exit_codes;
use dir_iterator::io::config::{DEFAULT_CONFIG_FILE, IteratorConfig, init_config, load_config};
use dir_iterator::io::image_loader::ImageLoader;
use dir_iterator::io::scan::ExtensionScanner;
use dir_iterator::io::state_store::{JsonFileRepository, StateStore};
use dir_iterator::iterate::{DirectoryIterator, IterationRequest};
use dir_iterator::logging;
use dir_iterator::looping::{LoopStop, run_drain};

#[derive(Parser)]
#[command(
    name = "dir-iterator",
    version,
    about = "Hand out one new image per invocation from a directory"
)]
struct Cli {
    /// Config file; defaults apply when it does not exist.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write the default config file (the `--config` path).
    Init {
        /// Overwrite an existing config file.
        #[arg(long)]
        force: bool,
    },
    /// Load the next unprocessed image and print the result as JSON.
    Next(IterateArgs),
    /// Discard stored progress for a directory.
    Reset {
        /// Directory whose progress record is reset.
        directory: String,
    },
    /// Invoke repeatedly until every image is processed or loading stops.
    Drain {
        #[command(flatten)]
        args: IterateArgs,
        /// Stop after this many invocations.
        #[arg(long)]
        max_iterations: Option<u32>,
    },
}

#[derive(Args)]
struct IterateArgs {
    /// Directory containing the images.
    directory: String,
    /// Include subdirectories in the scan (config default when omitted).
    #[arg(long, value_enum)]
    process_subdirectories: Option<Toggle>,
    /// Start over when the stored record belongs to another directory.
    #[arg(long, value_enum)]
    reset_on_directory_change: Option<Toggle>,
    /// Reset progress before selecting.
    #[arg(long)]
    reset_progress: bool,
}

impl IterateArgs {
    fn request(&self, cfg: &IteratorConfig) -> IterationRequest {
        let recursive = self
            .process_subdirectories
            .unwrap_or(Toggle::from(cfg.process_subdirectories));
        let reset_on_change = self
            .reset_on_directory_change
            .unwrap_or(Toggle::from(cfg.reset_on_directory_change));
        IterationRequest {
            directory: resolve_directory(&self.directory),
            recursive: recursive.is_enabled(),
            reset_on_directory_change: reset_on_change.is_enabled(),
            reset: self.reset_progress,
        }
    }
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Init { force } => cmd_init(&cli.config, force),
        Command::Next(args) => cmd_next(&load(&cli.config)?, &args),
        Command::Reset { directory } => cmd_reset(&load(&cli.config)?, &directory),
        Command::Drain {
            args,
            max_iterations,
        } => cmd_drain(&load(&cli.config)?, &args, max_iterations),
    }
}

fn load(path: &Path) -> Result<IteratorConfig> {
    load_config(path).context("load config")
}

fn cmd_init(path: &Path, force: bool) -> Result<i32> {
    let cfg = init_config(path, force)?;
    println!(
        "wrote {} (state_dir={})",
        path.display(),
        cfg.state_dir.display()
    );
    Ok(exit_codes::OK)
}

fn cmd_next(cfg: &IteratorConfig, args: &IterateArgs) -> Result<i32> {
    let engine = build_engine(cfg);
    let result = engine.advance(&args.request(cfg));
    let payload = serde_json::to_string_pretty(&result).context("serialize result")?;
    println!("{payload}");
    Ok(exit_codes::for_state(result.state))
}

fn cmd_reset(cfg: &IteratorConfig, directory: &str) -> Result<i32> {
    let store = StateStore::new(JsonFileRepository::new(&cfg.state_dir));
    let state = store.reset(&resolve_directory(directory));
    let payload = serde_json::to_string_pretty(&state).context("serialize progress")?;
    println!("{payload}");
    Ok(exit_codes::OK)
}

fn cmd_drain(cfg: &IteratorConfig, args: &IterateArgs, max_iterations: Option<u32>) -> Result<i32> {
    let engine = build_engine(cfg);
    let outcome = run_drain(&engine, &args.request(cfg), max_iterations, |step| {
        println!("{}", step.status);
    });
    println!(
        "drain: invocations={} loaded={} processed={}/{} stop={:?}",
        outcome.invocations, outcome.loaded, outcome.processed, outcome.total, outcome.stop
    );
    let code = match outcome.stop {
        LoopStop::AllProcessed => exit_codes::COMPLETE,
        LoopStop::Exhausted => exit_codes::EXHAUSTED,
        LoopStop::Empty => exit_codes::EMPTY,
        LoopStop::Invalid => exit_codes::INVALID,
        LoopStop::MaxIterations { .. } => exit_codes::OK,
    };
    Ok(code)
}

fn build_engine(cfg: &IteratorConfig) -> DirectoryIterator<JsonFileRepository, ImageLoader> {
    DirectoryIterator::with_scanner(
        JsonFileRepository::new(&cfg.state_dir),
        ImageLoader,
        ExtensionScanner::new(&cfg.extensions),
    )
}

/// Make the directory absolute so relative and absolute spellings share a record.
///
/// An empty path is passed through untouched and reported as invalid later.
fn resolve_directory(directory: &str) -> String {
    if directory.is_empty() {
        return String::new();
    }
    match path::absolute(directory) {
        Ok(resolved) => resolved.to_string_lossy().into_owned(),
        Err(_) => directory.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_next_defaults() {
        let cli = Cli::parse_from(["dir-iterator", "next", "/imgs"]);
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_FILE));
        let Command::Next(args) = cli.command else {
            panic!("expected next");
        };
        assert_eq!(args.directory, "/imgs");
        assert_eq!(args.process_subdirectories, None);
        assert!(!args.reset_progress);
    }

    #[test]
    fn parse_next_with_toggles() {
        let cli = Cli::parse_from([
            "dir-iterator",
            "next",
            "/imgs",
            "--process-subdirectories",
            "enable",
            "--reset-on-directory-change",
            "disable",
            "--reset-progress",
        ]);
        let Command::Next(args) = cli.command else {
            panic!("expected next");
        };
        let request = args.request(&IteratorConfig::default());
        assert!(request.recursive);
        assert!(!request.reset_on_directory_change);
        assert!(request.reset);
    }

    #[test]
    fn config_supplies_omitted_toggles() {
        let cli = Cli::parse_from(["dir-iterator", "drain", "/imgs", "--max-iterations", "5"]);
        let Command::Drain {
            args,
            max_iterations,
        } = cli.command
        else {
            panic!("expected drain");
        };
        assert_eq!(max_iterations, Some(5));
        let cfg = IteratorConfig {
            process_subdirectories: true,
            reset_on_directory_change: false,
            ..IteratorConfig::default()
        };
        let request = args.request(&cfg);
        assert!(request.recursive);
        assert!(!request.reset_on_directory_change);
    }

    #[test]
    fn parse_init() {
        let cli = Cli::parse_from(["dir-iterator", "init"]);
        assert!(matches!(cli.command, Command::Init { force: false }));
        let cli = Cli::parse_from(["dir-iterator", "--config", "x.toml", "init", "--force"]);
        assert!(matches!(cli.command, Command::Init { force: true }));
        assert_eq!(cli.config, PathBuf::from("x.toml"));
    }

    #[test]
    fn empty_directory_stays_empty() {
        assert_eq!(resolve_directory(""), "");
    }
}
