//! # Grove CLI
//!
//! Plumbing commands over the Grove object store.
//!
//! ## Usage
//! ```bash
//! # Create .grove/ in the current directory
//! grove init
//!
//! # Hash a file, and store it with -w
//! grove hash-object -w README.md
//!
//! # Inspect a stored object
//! grove cat-file -t <hash>
//! grove cat-file -p <hash>
//! ```

use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use colored::*;
use grove::{Blob, CompressionLevel, GroveConfig, Object, Repository, RepositoryBuilder, Result};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Grove - a content-addressed object store
#[derive(Parser)]
#[command(name = "grove")]
#[command(version)]
#[command(about = "Store and inspect content-addressed blobs, trees and commits")]
#[command(long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty repository
    Init {
        /// Directory to initialise (defaults to current)
        directory: Option<PathBuf>,

        /// Compression level for stored objects
        #[arg(long, value_enum, default_value = "default")]
        compression: CompressionMode,

        /// Branch HEAD points at
        #[arg(short = 'b', long)]
        initial_branch: Option<String>,
    },

    /// Compute the blob hash of a file
    HashObject {
        /// Also write the blob into the repository
        #[arg(short, long)]
        write: bool,

        /// File to hash
        file: PathBuf,
    },

    /// Show the type, size or content of a stored object
    #[command(group(ArgGroup::new("mode").required(true)))]
    CatFile {
        /// Print the object type
        #[arg(short = 't', group = "mode")]
        show_type: bool,

        /// Print the content size in bytes
        #[arg(short = 's', group = "mode")]
        show_size: bool,

        /// Pretty-print the content
        #[arg(short = 'p', group = "mode")]
        pretty: bool,

        /// Object hash
        hash: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CompressionMode {
    Fast,
    Default,
    Best,
}

impl From<CompressionMode> for CompressionLevel {
    fn from(mode: CompressionMode) -> Self {
        match mode {
            CompressionMode::Fast => CompressionLevel::Fast,
            CompressionMode::Default => CompressionLevel::Default,
            CompressionMode::Best => CompressionLevel::Best,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Set up logging; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Disable colors if needed
    if std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    }

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// Main command runner
fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init {
            directory,
            compression,
            initial_branch,
        } => cmd_init(directory, compression, initial_branch),
        Commands::HashObject { write, file } => cmd_hash_object(file, write),
        Commands::CatFile {
            show_type,
            show_size,
            pretty: _,
            hash,
        } => {
            let mode = if show_type {
                CatMode::Type
            } else if show_size {
                CatMode::Size
            } else {
                CatMode::Pretty
            };
            cmd_cat_file(&hash, mode)
        }
    }
}

fn cmd_init(
    directory: Option<PathBuf>,
    compression: CompressionMode,
    initial_branch: Option<String>,
) -> Result<()> {
    let root = directory.unwrap_or_else(|| PathBuf::from("."));

    let mut builder = RepositoryBuilder::new().compression(compression.into());
    if let Some(branch) = initial_branch {
        builder = builder.default_branch(branch);
    }
    let repo = builder.init(&root)?;

    let shown = std::fs::canonicalize(repo.metadata_dir())
        .unwrap_or_else(|_| repo.metadata_dir().to_path_buf());
    println!(
        "Initialized empty Grove repository in {}/",
        shown.display().to_string().cyan()
    );
    Ok(())
}

fn cmd_hash_object(file: PathBuf, write: bool) -> Result<()> {
    let blob = Blob::from_file(&file)?;

    if write {
        let repo = Repository::discover(".", GroveConfig::default())?;
        repo.objects().store(&blob.clone().into())?;
    }

    println!("{}", blob.hash());
    Ok(())
}

enum CatMode {
    Type,
    Size,
    Pretty,
}

fn cmd_cat_file(hash: &str, mode: CatMode) -> Result<()> {
    let repo = Repository::discover(".", GroveConfig::default())?;
    let object = repo.objects().read_object(hash)?;

    match mode {
        CatMode::Type => println!("{}", object.object_type()),
        CatMode::Size => println!("{}", object.size()),
        CatMode::Pretty => match &object {
            Object::Blob(blob) => {
                let mut stdout = std::io::stdout().lock();
                stdout
                    .write_all(blob.content())
                    .and_then(|_| stdout.flush())
                    .map_err(|e| grove::GroveError::io("writing to stdout", e))?;
            }
            other => print!("{}", other),
        },
    }
    Ok(())
}
