//! # SPIHT Codec Library
//!
//! A SPIHT (Set Partitioning In Hierarchical Trees) bit-plane encoder and
//! decoder for quantized integer wavelet coefficients, producing a compact,
//! progressively-decodable bitstream.
//!
//! The codec operates on a `(channels, height, width)` array of signed
//! integer coefficients laid out in the standard flat dyadic-pyramid
//! convention (lowest-frequency subband at the top-left corner). Computing
//! the wavelet transform, quantizing, and any color-space handling are the
//! caller's job; this crate only turns a coefficient array into bits and
//! back.
//!
//! This library is organized into several modules:
//! - `utils`: Error handling shared across the crate
//! - `codec`: The SPIHT core: bit I/O, tree addressing, the sorting-pass
//!   engine, and the encode/decode drivers
//! - `container`: A small framed stream format carrying the out-of-band
//!   metadata (geometry, `max_n`, exact bit length) next to the raw stream

// Re-export commonly used types at the crate root
pub use utils::error::{Result, SpihtError};

// Core modules
pub mod utils {
    pub mod error;
}

pub mod codec {
    pub mod bitstream;
    pub mod coeff_array;
    pub mod spiht;
    pub mod tree;

    // Re-export the codec surface
    pub use self::coeff_array::CoeffArray;
    pub use self::spiht::{decode, encode, CodecError, UNLIMITED_BITS};
    pub use self::tree::Geometry;
}

pub mod container {
    pub mod stream;

    pub use self::stream::{decode_stream, encode_to_stream, EncodedStream};
}

// Public API exports
pub use codec::{decode, encode, CodecError, CoeffArray, Geometry, UNLIMITED_BITS};
pub use container::EncodedStream;
