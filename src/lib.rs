// SPDX-License-Identifier: LGPL-2.1
// Copyright 2025 Daniel Vogelbacher <daniel@chaospixel.com>

//! Library to decompress the Panasonic V5 packed raw format found in
//! RW2 camera files.
//!
//! V5 raw data is a plain packed bitstream, but it is stored in blocks
//! of 0x4000 bytes whose two internal sections are written in swapped
//! order. Decoding unswaps each block, then unpacks `bps` bit wide
//! samples from the continuous bitstream, carrying leftover bits over
//! block boundaries. Decoding runs in parallel over disjoint row
//! strips of the output image.
//!
//! The container parsing (TIFF/RW2 metadata) is not part of this
//! crate; the caller supplies the payload location and bit depth as a
//! [CompressedRange].
//!
//! # Example
//! ```rust,no_run
//! use panav5::{CompressedRange, RawSource, decompress_v5_image};
//!
//! let src = RawSource::new(std::path::Path::new("image.rw2")).unwrap();
//! // Offsets and bit depth come from the RW2 metadata.
//! let range = CompressedRange {
//!   offset: 0x1000,
//!   len: 0x1000000,
//!   bps: 12,
//!   encoded_data_size: 0xFFF000,
//! };
//! let pixels = decompress_v5_image(&src, &range, 5184, 3888).unwrap();
//! assert_eq!(pixels.pixels().len(), 5184 * 3888);
//! ```

pub mod bits;
pub mod decompressors;
pub mod pixarray;
pub mod rawsource;

pub use decompressors::v5::{CompressedRange, V5Error, decompress_v5_image};
pub use pixarray::PixU16;
pub use rawsource::RawSource;

#[cfg(test)]
pub(crate) fn init_test_logger() {
  let _ = env_logger::builder().is_test(true).try_init();
}
