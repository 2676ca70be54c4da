mod commands;

use std::{io, num::ParseIntError, path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn parse_seed(value: &str) -> Result<u32, ParseIntError> {
    match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => value.parse(),
    }
}

#[derive(Subcommand)]
enum Command {
    /// Print the checksum of each file
    Sum {
        /// Initial value, decimal or 0x-prefixed hex
        #[arg(long, default_value = "0", value_parser = parse_seed)]
        seed: u32,
        /// Checksum the file in blocks of this size, chaining each result into the next block
        #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
        block_size: Option<u16>,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Store a file as a sequence of uncompressed CFDATA blocks
    Pack {
        /// Size of the per-block reserved area
        #[arg(long, default_value_t = 0)]
        reserved: u8,
        input: PathBuf,
        output: PathBuf,
    },
    /// Check the checksums of a sequence of CFDATA blocks
    Verify {
        /// Size of the per-block reserved area
        #[arg(long, default_value_t = 0)]
        reserved: u8,
        file: PathBuf,
    },
}

#[derive(Parser)]
#[command(name = "cabsum", about = "Cabinet CFDATA checksums")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

fn main() -> ExitCode {
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut output = io::stdout().lock();

    let result = match &cli.command {
        Command::Sum {
            seed,
            block_size,
            files,
        } => commands::sum(&mut output, files, *seed, *block_size),
        Command::Pack {
            reserved,
            input,
            output: destination,
        } => commands::pack(&mut output, input, destination, *reserved),
        Command::Verify { reserved, file } => commands::verify(&mut output, file, *reserved),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");

            ExitCode::FAILURE
        }
    }
}
