use std::io::Cursor;

use cabsum::{
    Checksum,
    block::{
        BlockError, BlockReader, DataBlockHeader, FOLDER_BLOCK_SIZE, ReadOptions, write_block,
    },
    checksum,
};
use pretty_assertions::assert_eq;

fn folder_stream(len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| u8::try_from((i.wrapping_mul(2_654_435_761) >> 7) & 0xff).unwrap())
        .collect()
}

fn pack(stream: &[u8]) -> Vec<u8> {
    let mut packed = vec![];

    for chunk in stream.chunks(FOLDER_BLOCK_SIZE) {
        write_block(&mut packed, chunk, chunk.len().try_into().unwrap()).unwrap();
    }

    packed
}

#[test_log::test]
fn folder_stream_round_trips_through_blocks() {
    let stream = folder_stream(3 * FOLDER_BLOCK_SIZE + 1234);
    let packed = pack(&stream);

    let blocks: Vec<_> = BlockReader::new(Cursor::new(packed), ReadOptions::default())
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(blocks.len(), 4);
    assert_eq!(blocks[3].header().data_len(), 1234);

    let unpacked: Vec<u8> = blocks.into_iter().flat_map(|block| block.into_data()).collect();
    assert_eq!(unpacked, stream);
}

#[test]
fn stored_checksums_match_manual_computation() {
    let stream = folder_stream(FOLDER_BLOCK_SIZE + 3);
    let packed = pack(&stream);

    let mut offset = 0;
    for chunk in stream.chunks(FOLDER_BLOCK_SIZE) {
        let header =
            DataBlockHeader::from_bytes(packed[offset..offset + 8].try_into().unwrap());
        let len = u16::try_from(chunk.len()).unwrap();

        let mut lengths = len.to_le_bytes().to_vec();
        lengths.extend_from_slice(&len.to_le_bytes());
        let expected = checksum(&lengths, checksum(chunk, 0));

        assert_eq!(header.checksum().value(), expected);

        offset += header.size();
    }
}

#[test]
fn full_blocks_chain_like_one_buffer() {
    let stream = folder_stream(5 * FOLDER_BLOCK_SIZE + 17);

    let chained = stream
        .chunks(FOLDER_BLOCK_SIZE)
        .fold(Checksum::default(), Checksum::update);

    assert_eq!(chained, Checksum::of(&stream));
}

#[test_log::test]
fn flipped_bit_in_any_block_is_detected() {
    let stream = folder_stream(2 * FOLDER_BLOCK_SIZE);
    let mut packed = pack(&stream);
    let second_payload = 2 * 8 + FOLDER_BLOCK_SIZE + 100;
    packed[second_payload] ^= 0x10;

    let results: Vec<_> =
        BlockReader::new(Cursor::new(packed), ReadOptions::default()).collect();

    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(BlockError::Checksum { .. })));
}
