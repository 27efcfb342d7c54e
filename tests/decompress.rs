// SPDX-License-Identifier: LGPL-2.1
// Copyright 2025 Daniel Vogelbacher <daniel@chaospixel.com>

use panav5::decompressors::v5::{CodecParams, SECTION_SPLIT_OFFSET, SERIALIZATION_BLOCK_SIZE, V5Error};
use panav5::{CompressedRange, PixU16, RawSource, decompress_v5_image};

fn init_test_logger() {
  let _ = env_logger::builder().is_test(true).try_init();
}

/// Pack samples back to back into a byte stream, MSB first.
fn pack_samples(samples: &[u16], bps: u32) -> Vec<u8> {
  let mut out = Vec::with_capacity((samples.len() * bps as usize).div_ceil(8));
  let mut acc: u64 = 0;
  let mut nbits: u32 = 0;
  for &sample in samples {
    assert_eq!(u64::from(sample) >> bps, 0);
    acc = (acc << bps) | u64::from(sample);
    nbits += bps;
    while nbits >= 8 {
      nbits -= 8;
      out.push((acc >> nbits) as u8);
    }
  }
  if nbits > 0 {
    out.push((acc << (8 - nbits)) as u8);
  }
  out
}

/// Apply the inverse section swap per storage block, producing the
/// physical layout the decoder expects: section A first, section B
/// second, while `logical` is the pixel-scan order B ++ A.
fn swap_encode(logical: &[u8]) -> Vec<u8> {
  let mut out = Vec::with_capacity(logical.len());
  for chunk in logical.chunks(SERIALIZATION_BLOCK_SIZE) {
    if chunk.len() > SECTION_SPLIT_OFFSET {
      let b_len = chunk.len() - SECTION_SPLIT_OFFSET;
      out.extend_from_slice(&chunk[b_len..]);
      out.extend_from_slice(&chunk[..b_len]);
    } else {
      out.extend_from_slice(chunk);
    }
  }
  out
}

/// Deterministic pseudo-random sample values.
fn synth_samples(count: usize, bps: u32) -> Vec<u16> {
  let mut state = 0x2F6E2B1u32;
  (0..count)
    .map(|_| {
      state = state.wrapping_mul(1664525).wrapping_add(1013904223);
      ((state >> 16) & ((1u32 << bps) - 1)) as u16
    })
    .collect()
}

fn encode_image(samples: &[u16], bps: u32) -> Vec<u8> {
  swap_encode(&pack_samples(samples, bps))
}

fn decode(encoded: &[u8], width: usize, height: usize, bps: u32, encoded_data_size: usize) -> Result<PixU16, V5Error> {
  let src = RawSource::new_from_slice(encoded);
  let range = CompressedRange {
    offset: 0,
    len: encoded.len() as u64,
    bps,
    encoded_data_size,
  };
  decompress_v5_image(&src, &range, width, height)
}

#[test]
fn round_trip_12bit_full_blocks() -> anyhow::Result<()> {
  init_test_logger();
  // Three full blocks hold exactly 32768 12-bit samples.
  let (width, height) = (256, 128);
  let samples = synth_samples(width * height, 12);
  let encoded = encode_image(&samples, 12);
  assert_eq!(encoded.len(), 3 * SERIALIZATION_BLOCK_SIZE);

  let out = decode(&encoded, width, height, 12, encoded.len())?;
  for (row, line) in out.pixel_rows().enumerate() {
    assert_eq!(line, &samples[row * width..(row + 1) * width]);
  }
  Ok(())
}

#[test]
fn round_trip_14bit_short_last_block() -> anyhow::Result<()> {
  init_test_logger();
  // 28086 samples end one byte short of three full blocks, so the
  // last physical block is short but still larger than the split
  // offset and gets swapped.
  let (width, height) = (151, 186);
  let samples = synth_samples(width * height, 14);
  let encoded = encode_image(&samples, 14);
  assert_eq!(encoded.len(), 3 * SERIALIZATION_BLOCK_SIZE - 1);

  let out = decode(&encoded, width, height, 14, encoded.len())?;
  assert_eq!(out.pixels(), samples.as_slice());
  Ok(())
}

#[test]
fn sample_straddles_block_boundary() -> anyhow::Result<()> {
  init_test_logger();
  // 10923 samples at 12 bps: the last one covers the final 8 bits of
  // block 0 and the first 4 bits of block 1.
  let (width, height) = (3641, 3);
  let mut logical = vec![0u8; 16385];
  logical[16382] = 0x3F;
  logical[16383] = 0xAB;
  logical[16384] = 0xC0;
  let encoded = swap_encode(&logical);

  let out = decode(&encoded, width, height, 12, encoded.len())?;
  assert_eq!(out.pixels()[10920], 0x000);
  assert_eq!(out.pixels()[10921], 0x03F);
  assert_eq!(*out.at(2, 3640), 0xABC);
  Ok(())
}

#[test]
fn section_swap_restores_scan_order() -> anyhow::Result<()> {
  init_test_logger();
  // One physical block with section A all ones and section B all
  // zeros. In scan order the zeros come first: section B spans
  // 8184 bytes, exactly 5456 12-bit samples, the rest is all ones.
  let mut encoded = vec![0u8; SERIALIZATION_BLOCK_SIZE];
  encoded[..SECTION_SPLIT_OFFSET].fill(0xFF);
  let (width, height) = (254, 43);

  let out = decode(&encoded, width, height, 12, encoded.len())?;
  assert!(out.pixels()[..5456].iter().all(|&p| p == 0x000));
  assert!(out.pixels()[5456..].iter().all(|&p| p == 0xFFF));
  Ok(())
}

#[test]
fn exact_size_decodes_one_byte_short_fails() -> anyhow::Result<()> {
  init_test_logger();
  // 1024 samples at 12 bps fit exactly into 1536 bytes.
  let (width, height) = (16, 64);
  let samples = synth_samples(width * height, 12);
  let encoded = encode_image(&samples, 12);
  assert_eq!(encoded.len(), 1536);

  let out = decode(&encoded, width, height, 12, encoded.len())?;
  assert_eq!(out.pixels(), samples.as_slice());

  assert!(matches!(
    decode(&encoded[..1535], width, height, 12, 1535),
    Err(V5Error::TruncatedInput { .. })
  ));
  Ok(())
}

#[test]
fn strip_heights_agree() -> anyhow::Result<()> {
  init_test_logger();
  let (width, height) = (200, 64);
  let samples = synth_samples(width * height, 14);
  let encoded = encode_image(&samples, 14);

  let params = CodecParams::new(width, height, 14, encoded.len())?;
  let single = params.decode_strips(&encoded, height)?;
  assert_eq!(single.pixels(), samples.as_slice());

  for strips in [2, 8] {
    let out = params.decode_strips(&encoded, height / strips)?;
    assert_eq!(out.pixels(), single.pixels());
  }
  let default = params.decode(&encoded)?;
  assert_eq!(default.pixels(), single.pixels());
  Ok(())
}

#[test]
fn decoding_is_idempotent() -> anyhow::Result<()> {
  init_test_logger();
  let (width, height) = (97, 41);
  let samples = synth_samples(width * height, 12);
  let encoded = encode_image(&samples, 12);

  let first = decode(&encoded, width, height, 12, encoded.len())?;
  let second = decode(&encoded, width, height, 12, encoded.len())?;
  assert_eq!(first.pixels(), second.pixels());
  Ok(())
}

#[test]
fn trailing_padding_is_ignored() -> anyhow::Result<()> {
  init_test_logger();
  let (width, height) = (16, 64);
  let samples = synth_samples(width * height, 12);
  let encoded = encode_image(&samples, 12);

  // Payload embedded mid-file with padding after the encoded data.
  let mut file = vec![0x11u8; 100];
  file.extend_from_slice(&encoded);
  file.extend(std::iter::repeat_n(0xEEu8, 64));

  let src = RawSource::new_from_slice(&file);
  let range = CompressedRange {
    offset: 100,
    len: (encoded.len() + 64) as u64,
    bps: 12,
    encoded_data_size: encoded.len(),
  };
  let out = decompress_v5_image(&src, &range, width, height)?;
  assert_eq!(out.pixels(), samples.as_slice());
  Ok(())
}
