use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use cabsum::{
    Checksum,
    block::{BlockError, BlockReader, FOLDER_BLOCK_SIZE, ReadOptions, write_block_with_reserve},
};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("{}: block {index}: {source}", path.display())]
    Block {
        path: PathBuf,
        index: usize,
        source: BlockError,
    },
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> CommandError {
    move |source| CommandError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn file_checksum(bytes: &[u8], seed: u32, block_size: Option<u16>) -> Checksum {
    let seed = Checksum::seeded(seed);

    match block_size {
        Some(size) => bytes
            .chunks(usize::from(size))
            .fold(seed, |checksum, block| checksum.update(block)),
        None => seed.update(bytes),
    }
}

pub fn sum(
    output: &mut impl Write,
    files: &[PathBuf],
    seed: u32,
    block_size: Option<u16>,
) -> Result<(), CommandError> {
    for path in files {
        let bytes = fs::read(path).map_err(io_error(path))?;
        let checksum = file_checksum(&bytes, seed, block_size);

        debug!(path = %path.display(), len = bytes.len(), %checksum, "checksummed");
        writeln!(output, "{checksum}  {}", path.display())?;
    }

    Ok(())
}

pub fn pack(
    output: &mut impl Write,
    input: &Path,
    destination: &Path,
    reserved: u8,
) -> Result<(), CommandError> {
    let bytes = fs::read(input).map_err(io_error(input))?;
    if bytes.is_empty() {
        warn!(path = %input.display(), "input is empty, no blocks written");
    }

    let mut writer = BufWriter::new(File::create(destination).map_err(io_error(destination))?);

    let mut count = 0;
    for (index, chunk) in bytes.chunks(FOLDER_BLOCK_SIZE).enumerate() {
        let block_error = |source| CommandError::Block {
            path: destination.to_path_buf(),
            index,
            source,
        };
        let uncompressed_len = u16::try_from(chunk.len())
            .map_err(|_| block_error(BlockError::TooLarge(chunk.len())))?;

        write_block_with_reserve(&mut writer, chunk, uncompressed_len, reserved)
            .map_err(block_error)?;
        count += 1;
    }

    writer.flush().map_err(io_error(destination))?;

    info!(blocks = count, "packed");
    writeln!(
        output,
        "{count} block(s), {} byte(s) written to {}",
        bytes.len(),
        destination.display()
    )?;

    Ok(())
}

pub fn verify(output: &mut impl Write, path: &Path, reserved: u8) -> Result<(), CommandError> {
    let file = File::open(path).map_err(io_error(path))?;
    let options = ReadOptions {
        reserved,
        verify: true,
    };

    let mut count = 0;
    for (index, block) in BlockReader::new(BufReader::new(file), options).enumerate() {
        let block = block.map_err(|source| CommandError::Block {
            path: path.to_path_buf(),
            index,
            source,
        })?;
        let header = block.header();

        let status = if header.checksum().is_omitted() {
            "no checksum"
        } else {
            "ok"
        };
        writeln!(
            output,
            "block {index}: {} byte(s), {} uncompressed, {} {status}",
            header.data_len(),
            header.uncompressed_len(),
            header.checksum()
        )?;
        count += 1;
    }

    writeln!(output, "{count} block(s) verified")?;

    Ok(())
}
