// SPDX-License-Identifier: LGPL-2.1
// Copyright 2025 Daniel Vogelbacher <daniel@chaospixel.com>

use log::debug;
use rayon::prelude::*;

use super::pump::BlockPump;
use super::{BLOCK_BITS, CodecParams, Result, SERIALIZATION_BLOCK_SIZE, V5Error};
use crate::pixarray::PixU16;

impl CodecParams {
  /// Decode the payload into a full image.
  ///
  /// The output is split into contiguous row strips which are decoded
  /// in parallel, each strip with its own pump state.
  pub fn decode(&self, data: &[u8]) -> Result<PixU16> {
    let strip_height = std::cmp::max(1, self.height.div_ceil(rayon::current_num_threads()));
    self.decode_strips(data, strip_height)
  }

  /// Decode with an explicit strip height.
  ///
  /// Every strip seeks to its own bit offset, so the output is
  /// identical for any strip height.
  pub fn decode_strips(&self, data: &[u8], strip_height: usize) -> Result<PixU16> {
    assert!(strip_height > 0);
    if self.sample_count() == 0 {
      return Ok(PixU16::new(self.width, self.height));
    }
    if data.len() < self.encoded_data_size {
      return Err(V5Error::TruncatedInput {
        block: data.len() / SERIALIZATION_BLOCK_SIZE,
        row: 0,
      });
    }
    // Trailing padding beyond the encoded size must never be read.
    let data = &data[..self.encoded_data_size];
    if self.encoded_data_size < self.required_bytes() {
      return Err(V5Error::TruncatedInput {
        block: self.encoded_data_size / SERIALIZATION_BLOCK_SIZE,
        row: 0,
      });
    }
    debug!(
      "V5 decoder: {} bps, {} samples per full block, strip height: {}",
      self.bps,
      BLOCK_BITS / self.bps as usize,
      strip_height
    );

    let mut out = PixU16::new(self.width, self.height);
    out
      .pixels_mut()
      .par_chunks_mut(self.width * strip_height)
      .enumerate()
      .try_for_each(|(i, strip)| self.decompress_rows(data, i * strip_height, strip))?;
    Ok(out)
  }

  /// Decode one contiguous row strip. Entered once per work unit, so
  /// all state lives in the local pump.
  fn decompress_rows(&self, data: &[u8], row_start: usize, strip: &mut [u16]) -> Result<()> {
    debug_assert_eq!(strip.len() % self.width, 0);
    let mut pump = BlockPump::for_sample(data, row_start * self.width, self.bps).map_err(|err| err.at_row(row_start))?;
    for (i, line) in strip.chunks_exact_mut(self.width).enumerate() {
      for pix in line.iter_mut() {
        *pix = pump.next_sample(self.bps).map_err(|err| err.at_row(row_start + i))?;
      }
    }
    Ok(())
  }
}
