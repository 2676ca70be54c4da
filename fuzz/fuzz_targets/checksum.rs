#![no_main]

use arbitrary::Arbitrary;
use cabsum::{Checksum, checksum};
use libfuzzer_sys::fuzz_target;
use pretty_assertions::assert_eq;

#[derive(Debug, Arbitrary)]
struct Input {
    data: Vec<u8>,
    seed: u32,
    split: usize,
}

fn bytewise(buffer: &[u8], seed: u32) -> u32 {
    let mut accumulator = seed;

    for (i, byte) in buffer.iter().enumerate() {
        accumulator ^= u32::from(*byte) << (8 * (i % 4));
    }

    accumulator
}

fuzz_target!(|input: Input| {
    let Input { data, seed, split } = input;

    assert_eq!(checksum(&data, seed), bytewise(&data, seed));

    let split = if data.is_empty() { 0 } else { split % data.len() };
    let split = split - split % 4;
    let (first, second) = data.split_at(split);

    assert_eq!(
        Checksum::seeded(seed).update(first).update(second),
        Checksum::seeded(checksum(&data, seed))
    );
});
