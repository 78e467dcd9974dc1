// SPDX-License-Identifier: MIT

mod commands;
mod config;
mod utils;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::DiskSection;
use crate::utils::{LogLevel, init_logging};

#[derive(Parser)]
#[command(name = "bfsctl", version, about = "Format, inspect and edit BFS disk images", long_about = None)]
struct Cli {
    /// Disk image path
    #[arg(short, long, global = true, default_value = "BFSDISK")]
    disk: PathBuf,

    /// Print extra progress and library debug logs
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create (or overwrite) the disk image with an empty filesystem
    Format {
        /// TOML file with a [disk] section
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Block size in bytes (power of two, 64..=65536)
        #[arg(long)]
        block_size: Option<u32>,
        /// Total number of blocks
        #[arg(long)]
        blocks: Option<u32>,
        /// Number of inodes (maximum file count)
        #[arg(long)]
        inodes: Option<u32>,
    },
    /// Show geometry and usage
    Info,
    /// List files
    Ls,
    /// Write bytes into a file, creating it if missing
    Write {
        name: String,
        /// Byte offset to write at
        #[arg(long, default_value_t = 0)]
        offset: u64,
        /// Host file to copy from
        #[arg(short, long, conflicts_with = "data", required_unless_present = "data")]
        input: Option<PathBuf>,
        /// Literal text to write
        #[arg(long)]
        data: Option<String>,
    },
    /// Read bytes from a file
    Read {
        name: String,
        /// Byte offset to read from
        #[arg(long, default_value_t = 0)]
        offset: u64,
        /// Bytes to read (default: up to end of file)
        #[arg(long)]
        len: Option<u64>,
        /// Host file to write to (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(match (cli.quiet, cli.verbose) {
        (true, _) => LogLevel::Quiet,
        (_, true) => LogLevel::Verbose,
        _ => LogLevel::Normal,
    });

    match cli.command {
        Commands::Format {
            config,
            block_size,
            blocks,
            inodes,
        } => {
            let overrides = DiskSection {
                block_size,
                blocks,
                inodes,
            };
            commands::format(&cli.disk, config.as_deref(), &overrides)?;
        }
        Commands::Info => commands::info(&cli.disk)?,
        Commands::Ls => commands::ls(&cli.disk)?,
        Commands::Write {
            name,
            offset,
            input,
            data,
        } => {
            let bytes = match (input, data) {
                (Some(path), _) => std::fs::read(&path)?,
                (None, Some(text)) => text.into_bytes(),
                (None, None) => anyhow::bail!("either --input or --data is required"),
            };
            commands::write(&cli.disk, &name, offset, &bytes)?;
        }
        Commands::Read {
            name,
            offset,
            len,
            output,
        } => commands::read(&cli.disk, &name, offset, len, output.as_deref())?,
    }

    Ok(())
}
