//! CFDATA records: an 8 byte header (`csum`, `cbData`, `cbUncomp`), an optional reserved area
//! and the payload.

use std::fmt::Debug;
use std::io::{self, ErrorKind, Read, Write};

use bytemuck::{Pod, Zeroable, bytes_of, must_cast};
use thiserror::Error;
use tracing::{debug, instrument, trace, warn};

use crate::checksum::Checksum;

pub const HEADER_SIZE: usize = size_of::<DataBlockHeader>();
pub const MAX_DATA_LEN: usize = u16::MAX as usize;
/// Uncompressed size of every block in a folder stream except the last one.
pub const FOLDER_BLOCK_SIZE: usize = 32768;

const _: () = assert!(FOLDER_BLOCK_SIZE <= MAX_DATA_LEN);

#[derive(Debug, Error)]
pub enum BlockError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Block truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },
    #[error("Payload of {0} bytes does not fit in a data block")]
    TooLarge(usize),
    #[error("Incorrect checksum: stored {stored}, computed {computed}")]
    Checksum { stored: Checksum, computed: Checksum },
    #[error("Header declares {declared} payload bytes, got {actual}")]
    LengthMismatch { declared: usize, actual: usize },
}

// All fields are little-endian on disk, kept as byte arrays so the struct has no padding and no
// alignment requirement.
#[derive(Debug, Pod, Clone, Copy, Zeroable, PartialEq, Eq)]
#[repr(C)]
pub struct DataBlockHeader {
    checksum: [u8; 4],
    data_len: [u8; 2],
    uncompressed_len: [u8; 2],
}

const _: () = assert!(size_of::<DataBlockHeader>() == 8);

impl DataBlockHeader {
    /// A header with an omitted (zero) checksum. `uncompressed_len` is 0 when the block continues
    /// in the next cabinet.
    pub const fn new(data_len: u16, uncompressed_len: u16) -> Self {
        Self {
            checksum: [0; 4],
            data_len: data_len.to_le_bytes(),
            uncompressed_len: uncompressed_len.to_le_bytes(),
        }
    }

    pub fn from_bytes(bytes: [u8; HEADER_SIZE]) -> Self {
        must_cast(bytes)
    }

    pub fn to_bytes(self) -> [u8; HEADER_SIZE] {
        must_cast(self)
    }

    pub const fn checksum(&self) -> Checksum {
        Checksum::from_bytes(self.checksum)
    }

    pub const fn data_len(&self) -> usize {
        u16::from_le_bytes(self.data_len) as usize
    }

    pub const fn uncompressed_len(&self) -> usize {
        u16::from_le_bytes(self.uncompressed_len) as usize
    }

    pub const fn is_empty(&self) -> bool {
        self.data_len() == 0
    }

    /// Size on disk, not counting the reserved area.
    pub const fn size(&self) -> usize {
        HEADER_SIZE + self.data_len()
    }

    /// The payload is checksummed first, then the length fields are folded in. The `csum` field
    /// and the reserved area are not covered.
    pub fn compute_checksum(&self, data: &[u8]) -> Checksum {
        Checksum::of(data).update(&bytes_of(self)[size_of::<Checksum>()..])
    }

    pub fn seal(&mut self, data: &[u8]) {
        self.checksum = self.compute_checksum(data).to_bytes();
    }

    pub fn verify(&self, data: &[u8]) -> Result<(), BlockError> {
        if self.data_len() != data.len() {
            return Err(BlockError::LengthMismatch {
                declared: self.data_len(),
                actual: data.len(),
            });
        }

        let stored = self.checksum();
        if stored.is_omitted() {
            trace!("checksum omitted, not verifying");

            return Ok(());
        }

        let computed = self.compute_checksum(data);
        if computed == stored {
            Ok(())
        } else {
            warn!(%stored, %computed, "incorrect block checksum");

            Err(BlockError::Checksum { stored, computed })
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReadOptions {
    /// Size of the per-block reserved area, as declared by the cabinet header.
    pub reserved: u8,
    pub verify: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            reserved: 0,
            verify: true,
        }
    }
}

pub struct DataBlock {
    header: DataBlockHeader,
    reserve: Vec<u8>,
    data: Vec<u8>,
}

impl Debug for DataBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataBlock")
            .field("header", &self.header)
            .field("reserve", &self.reserve.len())
            .finish_non_exhaustive()
    }
}

impl DataBlock {
    pub const fn header(&self) -> &DataBlockHeader {
        &self.header
    }

    pub fn reserve(&self) -> &[u8] {
        &self.reserve
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn verify(&self) -> Result<(), BlockError> {
        self.header.verify(&self.data)
    }
}

pub fn write_block<W: Write>(
    writer: &mut W,
    data: &[u8],
    uncompressed_len: u16,
) -> Result<DataBlockHeader, BlockError> {
    write_block_with_reserve(writer, data, uncompressed_len, 0)
}

/// Writes a sealed header, `reserved` zero bytes and the payload. Empty payloads are not written
/// at all, the returned header is then empty.
#[instrument(skip(writer, data), fields(data_len = data.len()))]
pub fn write_block_with_reserve<W: Write>(
    writer: &mut W,
    data: &[u8],
    uncompressed_len: u16,
    reserved: u8,
) -> Result<DataBlockHeader, BlockError> {
    let data_len = u16::try_from(data.len()).map_err(|_| BlockError::TooLarge(data.len()))?;
    let mut header = DataBlockHeader::new(data_len, uncompressed_len);

    if header.is_empty() {
        debug!("discarded empty block");

        return Ok(header);
    }

    header.seal(data);

    writer.write_all(&header.to_bytes())?;
    io::copy(&mut io::repeat(0).take(u64::from(reserved)), writer)?;
    writer.write_all(data)?;

    debug!(checksum = %header.checksum(), "wrote block");

    Ok(header)
}

/// Reads the next record. Returns `Ok(None)` when the stream ends cleanly between records.
#[instrument(skip_all)]
pub fn read_block<R: Read>(
    reader: &mut R,
    options: &ReadOptions,
) -> Result<Option<DataBlock>, BlockError> {
    let mut bytes = [0; HEADER_SIZE];
    match read_full(reader, &mut bytes)? {
        0 => return Ok(None),
        HEADER_SIZE => {}
        actual => {
            return Err(BlockError::Truncated {
                expected: HEADER_SIZE,
                actual,
            });
        }
    }

    let header = DataBlockHeader::from_bytes(bytes);

    let mut reserve = vec![0; usize::from(options.reserved)];
    read_exact(reader, &mut reserve)?;

    let mut data = vec![0; header.data_len()];
    read_exact(reader, &mut data)?;

    debug!(
        data_len = header.data_len(),
        uncompressed_len = header.uncompressed_len(),
        checksum = %header.checksum(),
        "read block"
    );

    let block = DataBlock {
        header,
        reserve,
        data,
    };

    if options.verify {
        block.verify()?;
    }

    Ok(Some(block))
}

fn read_full<R: Read>(reader: &mut R, buffer: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;

    while filled < buffer.len() {
        match reader.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(read) => filled += read,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }

    Ok(filled)
}

fn read_exact<R: Read>(reader: &mut R, buffer: &mut [u8]) -> Result<(), BlockError> {
    let actual = read_full(reader, buffer)?;

    if actual == buffer.len() {
        Ok(())
    } else {
        Err(BlockError::Truncated {
            expected: buffer.len(),
            actual,
        })
    }
}

/// Iterates over consecutive records, stopping after the first error.
pub struct BlockReader<R> {
    reader: R,
    options: ReadOptions,
    done: bool,
}

impl<R: Read> BlockReader<R> {
    pub const fn new(reader: R, options: ReadOptions) -> Self {
        Self {
            reader,
            options,
            done: false,
        }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> Iterator for BlockReader<R> {
    type Item = Result<DataBlock, BlockError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = read_block(&mut self.reader, &self.options).transpose();
        if !matches!(result, Some(Ok(_))) {
            self.done = true;
        }

        result
    }
}
