// SPDX-License-Identifier: LGPL-2.1
// Copyright 2025 Daniel Vogelbacher <daniel@chaospixel.com>

//! Panasonic V5 decompressor.
//!
//! The raw image buffer is built from individual blocks of
//! [SERIALIZATION_BLOCK_SIZE] bytes. Each block comprises two
//! sections which are stored in swapped order:
//!
//! ```text
//! bytes:  [0 .. SECTION_SPLIT_OFFSET-1][SECTION_SPLIT_OFFSET .. ]
//! pixels: [a .. b                     ][0 .. a-1               ]
//! ```
//!
//! When reading, the two sections need to be swapped back to enable
//! linear processing. After the swap the payload is one continuous
//! bitstream of `bps` bit wide samples. A block holds no whole number
//! of samples for the known bit depths, so the leftover bits of each
//! block carry over into the next one.

use log::debug;
use thiserror::Error;

use crate::pixarray::PixU16;
use crate::rawsource::RawSource;

mod decoder;
mod pump;

/// Size of a single storage block.
pub const SERIALIZATION_BLOCK_SIZE: usize = 0x4000;

/// Offset at which the two sections of a block are split.
pub const SECTION_SPLIT_OFFSET: usize = 0x2008;

/// Bit count of a full storage block.
pub(crate) const BLOCK_BITS: usize = SERIALIZATION_BLOCK_SIZE * 8;

/// Widest sample that fits the u16 output buffer.
pub const MAX_BPS: u32 = 16;

/// Error variants for the V5 decompressor
#[derive(Debug, Error)]
pub enum V5Error {
  /// A block read needs bytes beyond the encoded data size
  #[error("Truncated input: storage block {block} is incomplete (row {row})")]
  TruncatedInput { block: usize, row: usize },

  /// Input exhausted in the middle of a sample
  #[error("Corrupt bitstream: sample cut off in storage block {block} (row {row})")]
  CorruptBitstream { block: usize, row: usize },

  /// Bit depth is zero or wider than the output sample type
  #[error("Unsupported bit depth: {} bps", _0)]
  UnsupportedBitDepth(u32),

  /// Error on the byte source
  #[error("I/O error")]
  Io(#[from] std::io::Error),
}

impl V5Error {
  /// Tag a pump error with the image row it occurred in.
  pub(crate) fn at_row(self, row: usize) -> Self {
    match self {
      Self::TruncatedInput { block, .. } => Self::TruncatedInput { block, row },
      Self::CorruptBitstream { block, .. } => Self::CorruptBitstream { block, row },
      other => other,
    }
  }
}

/// Result type for decompressor results
pub type Result<T> = std::result::Result<T, V5Error>;

/// Location and shape of the V5 payload inside the raw file, as
/// reported by the container metadata.
#[derive(Debug, Clone)]
pub struct CompressedRange {
  /// Byte offset of the payload range
  pub offset: u64,
  /// Byte length of the payload range
  pub len: u64,
  /// Bits per sample, usually 12 or 14
  pub bps: u32,
  /// Usable byte count inside the range, excluding trailing padding
  pub encoded_data_size: usize,
}

/// Codec parameters for decoding
#[derive(Debug, Clone)]
pub struct CodecParams {
  pub(super) width: usize,
  pub(super) height: usize,
  pub(super) bps: u32,
  pub(super) encoded_data_size: usize,
}

impl CodecParams {
  pub fn new(width: usize, height: usize, bps: u32, encoded_data_size: usize) -> Result<Self> {
    if bps == 0 || bps > MAX_BPS {
      return Err(V5Error::UnsupportedBitDepth(bps));
    }
    Ok(Self {
      width,
      height,
      bps,
      encoded_data_size,
    })
  }

  /// Total sample count of the image.
  pub(super) fn sample_count(&self) -> usize {
    self.width * self.height
  }

  /// Bytes needed to hold all samples of the image.
  pub(super) fn required_bytes(&self) -> usize {
    (self.sample_count() * self.bps as usize).div_ceil(8)
  }
}

/// Decompress a V5 encoded image into a pixel buffer of the given
/// dimensions.
pub fn decompress_v5_image(src: &RawSource, range: &CompressedRange, width: usize, height: usize) -> Result<PixU16> {
  let params = CodecParams::new(width, height, range.bps, range.encoded_data_size)?;
  debug!("V5 decoder: {} bps, payload {} bytes at offset {:#x}", range.bps, range.len, range.offset);
  let data = src.subview(range.offset, range.len)?;
  params.decode(data)
}
