use std::fmt::{self, Display};

use bytemuck::{Pod, Zeroable};

/// Folds `buffer` into `seed` using the cabinet CFDATA checksum.
///
/// Every complete group of four bytes is read as a little-endian word and XORed into the
/// accumulator. The 1-3 trailing bytes form one partial word with the same byte order, the
/// unused high bytes left at zero. An empty buffer returns `seed` unchanged.
///
/// Passing the result of one call as the `seed` of the next chains blocks together. This is only
/// equivalent to checksumming the concatenation when the earlier block's length is a multiple of
/// four.
#[must_use]
pub fn checksum(buffer: &[u8], seed: u32) -> u32 {
    let (words, tail) = buffer.as_chunks::<4>();

    let accumulator = words
        .iter()
        .fold(seed, |accumulator, word| accumulator ^ u32::from_le_bytes(*word));

    // as_chunks leaves at most 3 bytes behind, the last arm only ever sees exactly 3
    let partial = match *tail {
        [] => 0,
        [b0] => u32::from(b0),
        [b0, b1] => u32::from(b0) | (u32::from(b1) << 8),
        [b0, b1, b2, ..] => u32::from(b0) | (u32::from(b1) << 8) | (u32::from(b2) << 16),
    };

    accumulator ^ partial
}

#[repr(transparent)]
#[derive(Pod, Clone, Copy, Zeroable, Debug, Default, PartialEq, Eq, Hash)]
pub struct Checksum(u32);

impl Checksum {
    pub const fn seeded(seed: u32) -> Self {
        Self(seed)
    }

    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Self(u32::from_le_bytes(bytes))
    }

    pub const fn to_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    #[must_use]
    pub fn of(bytes: &[u8]) -> Self {
        Self(checksum(bytes, 0))
    }

    /// Folds `bytes` in, using the current value as the seed.
    #[must_use]
    pub fn update(self, bytes: &[u8]) -> Self {
        Self(checksum(bytes, self.0))
    }

    pub const fn value(self) -> u32 {
        self.0
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }

    /// A zero `csum` field means the writer did not compute a checksum.
    pub const fn is_omitted(self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for Checksum {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<Checksum> for u32 {
    fn from(value: Checksum) -> Self {
        value.0
    }
}

impl Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010X}", self.0)
    }
}
