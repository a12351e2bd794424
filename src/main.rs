//! Command line front end: load an ELF file and search it for gadgets.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{debug, info};

use iago::format::{FindResult, OutputFormat};
use iago::image::LoadOptions;
use iago::session::Session;
use iago::trie::DEFAULT_MAX_DEPTH;

/// Locate ROP gadgets in ELF executables
#[derive(Parser)]
#[command(name = "iago")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct LoadArgs {
    /// ELF file to load
    file: PathBuf,

    /// Target Thumb mode on ARM binaries
    #[arg(long)]
    thumb: bool,

    /// Instructions indexed per position; longer gadgets are still found
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Describe the loaded binary
    Info {
        #[command(flatten)]
        load: LoadArgs,
    },

    /// Search the binary for gadgets and print their virtual addresses
    Find {
        #[command(flatten)]
        load: LoadArgs,

        /// Hex representation of the gadget's machine code, in file byte order
        #[arg(required = true)]
        gadgets: Vec<String>,

        /// Report every address instead of the first
        #[arg(long)]
        all: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_secs()
        .init();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Execute the command; `Ok(false)` means some gadget was not found.
fn run(cli: Cli) -> Result<bool> {
    let formatter = cli.format.get_formatter();
    let mut session = Session::new();

    match cli.command {
        Commands::Info { load } => {
            load_file(&mut session, &load)?;
            print!("{}", formatter.format_info(&session.info()?)?);
            Ok(true)
        }
        Commands::Find { load, gadgets, all } => {
            load_file(&mut session, &load)?;
            let results = gadgets
                .iter()
                .map(|g| session.search(&normalize_gadget(g), all))
                .collect::<Result<Vec<FindResult>, _>>()?;
            print!("{}", formatter.format_results(&results)?);
            Ok(results.iter().all(|r| r.found))
        }
    }
}

fn load_file(session: &mut Session, args: &LoadArgs) -> Result<()> {
    let contents = read_binary(&args.file)?;
    let options = LoadOptions {
        compact_mode: args.thumb,
        max_depth: args.max_depth,
    };
    session
        .load(contents, &options)
        .with_context(|| format!("Failed to load {}", args.file.display()))?;
    info!("Loaded {}", args.file.display());
    Ok(())
}

fn read_binary(path: &Path) -> Result<Vec<u8>> {
    debug!("Reading {}", path.display());
    fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Accept `0x` prefixes and spaced byte groups such as `5f c3`.
fn normalize_gadget(gadget: &str) -> String {
    let compact: String = gadget.split_whitespace().collect();
    compact
        .strip_prefix("0x")
        .or_else(|| compact.strip_prefix("0X"))
        .unwrap_or(compact.as_str())
        .to_string()
}
