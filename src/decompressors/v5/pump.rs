// SPDX-License-Identifier: LGPL-2.1
// Copyright 2025 Daniel Vogelbacher <daniel@chaospixel.com>

//! Data pump joining the per-block section swap with a bit cursor.
//!
//! Callers see one continuous, MSB-first bitstream. Whenever the
//! accumulator runs low the pump refills from the unswapped bytes of
//! the current block and pulls the next block in once the current one
//! is drained. Leftover bits at a block edge stay in the accumulator,
//! the next block is shifted in beneath them.

use crate::bits::BEu32;

use super::{BLOCK_BITS, Result, SECTION_SPLIT_OFFSET, SERIALIZATION_BLOCK_SIZE, V5Error};

pub(super) struct BlockPump<'a> {
  /// Encoded payload, already truncated to the usable byte count
  data: &'a [u8],
  /// Index of the next block to load
  block: usize,
  /// Unswapped bytes of the current block
  buf: Vec<u8>,
  /// Byte position inside `buf`
  pos: usize,
  /// Bit accumulator, samples leave at the most significant end
  bits: u64,
  nbits: u32,
}

impl<'a> BlockPump<'a> {
  /// Create a pump positioned on the given sample index.
  ///
  /// Samples are packed back to back, so sample `n` starts at bit
  /// `n * bps` of the unswapped stream, independent of block
  /// boundaries. This is what allows each row strip to start decoding
  /// without knowledge of the other strips.
  pub(super) fn for_sample(data: &'a [u8], sample: usize, bps: u32) -> Result<Self> {
    let bit = sample * bps as usize;
    let mut pump = Self {
      data,
      block: bit / BLOCK_BITS,
      buf: Vec::with_capacity(SERIALIZATION_BLOCK_SIZE),
      pos: 0,
      bits: 0,
      nbits: 0,
    };
    pump.load_next_block()?;
    let offset = bit % BLOCK_BITS;
    pump.pos = offset / 8;
    let used = (offset % 8) as u32;
    if used != 0 {
      // Start mid-byte: keep the unconsumed low bits of that byte.
      if pump.pos >= pump.buf.len() {
        return Err(V5Error::CorruptBitstream {
          block: pump.cur_block(),
          row: 0,
        });
      }
      pump.bits = (pump.buf[pump.pos] & (0xFFu8 >> used)) as u64;
      pump.nbits = 8 - used;
      pump.pos += 1;
    }
    Ok(pump)
  }

  /// Index of the currently loaded block.
  fn cur_block(&self) -> usize {
    self.block.saturating_sub(1)
  }

  /// Extract the next `bps` bit wide sample.
  #[inline(always)]
  pub(super) fn next_sample(&mut self, bps: u32) -> Result<u16> {
    debug_assert!(bps > 0 && bps <= 16);
    while self.nbits < bps {
      if self.pos == self.buf.len() {
        self.load_next_block().map_err(|err| {
          if self.nbits > 0 {
            // A partially read sample means the stream ends mid-field.
            V5Error::CorruptBitstream {
              block: self.cur_block(),
              row: 0,
            }
          } else {
            err
          }
        })?;
      }
      if self.nbits <= 32 && self.pos + 4 <= self.buf.len() {
        self.bits = (self.bits << 32) | BEu32(&self.buf, self.pos) as u64;
        self.pos += 4;
        self.nbits += 32;
      } else {
        // Byte-wise near the block edge
        self.bits = (self.bits << 8) | self.buf[self.pos] as u64;
        self.pos += 1;
        self.nbits += 8;
      }
    }
    self.nbits -= bps;
    Ok(((self.bits >> self.nbits) & ((1u64 << bps) - 1)) as u16)
  }

  /// Load the next storage block and swap its two sections back into
  /// pixel-scan order: section B precedes section A.
  fn load_next_block(&mut self) -> Result<()> {
    let start = self.block * SERIALIZATION_BLOCK_SIZE;
    if start >= self.data.len() {
      return Err(V5Error::TruncatedInput { block: self.block, row: 0 });
    }
    let end = self.data.len().min(start + SERIALIZATION_BLOCK_SIZE);
    let src = &self.data[start..end];
    self.buf.clear();
    if src.len() > SECTION_SPLIT_OFFSET {
      self.buf.extend_from_slice(&src[SECTION_SPLIT_OFFSET..]);
      self.buf.extend_from_slice(&src[..SECTION_SPLIT_OFFSET]);
    } else {
      // Short final block, section B is empty.
      self.buf.extend_from_slice(src);
    }
    self.pos = 0;
    self.block += 1;
    Ok(())
  }
}
