#![no_main]

use std::io::Cursor;

use arbitrary::Arbitrary;
use cabsum::block::{BlockReader, ReadOptions, write_block_with_reserve};
use libfuzzer_sys::fuzz_target;
use pretty_assertions::assert_eq;

#[derive(Debug)]
struct Payload(Vec<u8>);

impl<'a> Arbitrary<'a> for Payload {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        let mut buffer = vec![0u8; u.int_in_range(1..=512)?];

        u.fill_buffer(&mut buffer)?;

        Ok(Self(buffer))
    }
}

#[derive(Debug, Arbitrary)]
struct Input {
    payloads: Vec<Payload>,
    reserved: u8,
    garbage: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let mut stream = vec![];
    for payload in &input.payloads {
        let len = u16::try_from(payload.0.len()).unwrap();
        write_block_with_reserve(&mut stream, &payload.0, len, input.reserved).unwrap();
    }

    let options = ReadOptions {
        reserved: input.reserved,
        verify: true,
    };
    let blocks: Vec<_> = BlockReader::new(Cursor::new(&stream), options)
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(blocks.len(), input.payloads.len());
    for (block, payload) in blocks.iter().zip(&input.payloads) {
        assert_eq!(block.data(), payload.0.as_slice());
        assert_eq!(block.header().uncompressed_len(), payload.0.len());
    }

    // arbitrary bytes may fail to parse, but must never panic
    for block in BlockReader::new(Cursor::new(&input.garbage), ReadOptions::default()) {
        if block.is_err() {
            break;
        }
    }
});
