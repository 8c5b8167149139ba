// src/container/stream.rs

//! A small framed container for persisted SPIHT streams.
//!
//! The raw bitstream carries no header: geometry, `max_n`, and the exact
//! bit length all travel out-of-band, and a caller that loses any of them
//! cannot decode. This module bundles that metadata with the payload in a
//! fixed big-endian layout:
//!
//! ```text
//! "SPHT" | version u8 | channels u32 | height u32 | width u32
//!        | ll_h u32 | ll_w u32 | max_n u8 | bit_len u64 | payload bytes
//! ```
//!
//! Storing `bit_len` (not just whole bytes) means a reader can hand the
//! decoder an exact budget and never consume stray byte padding.

use crate::codec::coeff_array::CoeffArray;
use crate::codec::spiht;
use crate::utils::error::{Result, SpihtError};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use log::debug;
use std::io::{Read, Write};

/// The 4-byte magic number at the start of every container stream.
pub const MAGIC: [u8; 4] = *b"SPHT";
const VERSION: u8 = 1;

/// An encoded SPIHT stream together with everything needed to decode it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedStream {
    pub channels: usize,
    pub height: usize,
    pub width: usize,
    pub ll_h: usize,
    pub ll_w: usize,
    pub max_n: u8,
    /// Exact number of bits the encoder emitted.
    pub bit_len: u64,
    pub data: Vec<u8>,
}

impl EncodedStream {
    /// Serializes the header and payload to `writer`.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&MAGIC)?;
        writer.write_u8(VERSION)?;
        writer.write_u32::<BigEndian>(dim_field(self.channels)?)?;
        writer.write_u32::<BigEndian>(dim_field(self.height)?)?;
        writer.write_u32::<BigEndian>(dim_field(self.width)?)?;
        writer.write_u32::<BigEndian>(dim_field(self.ll_h)?)?;
        writer.write_u32::<BigEndian>(dim_field(self.ll_w)?)?;
        writer.write_u8(self.max_n)?;
        writer.write_u64::<BigEndian>(self.bit_len)?;
        writer.write_all(&self.data)?;
        debug!(
            "container: wrote {} header+payload bytes ({} payload bits)",
            34 + self.data.len(),
            self.bit_len
        );
        Ok(())
    }

    /// Parses a container stream previously written by [`write_to`].
    ///
    /// [`write_to`]: EncodedStream::write_to
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Err(SpihtError::Stream(format!(
                "bad magic {:02x?}, expected {:02x?}",
                magic, MAGIC
            )));
        }
        let version = reader.read_u8()?;
        if version != VERSION {
            return Err(SpihtError::Stream(format!(
                "unsupported container version {}",
                version
            )));
        }

        let channels = reader.read_u32::<BigEndian>()? as usize;
        let height = reader.read_u32::<BigEndian>()? as usize;
        let width = reader.read_u32::<BigEndian>()? as usize;
        let ll_h = reader.read_u32::<BigEndian>()? as usize;
        let ll_w = reader.read_u32::<BigEndian>()? as usize;
        let max_n = reader.read_u8()?;
        let bit_len = reader.read_u64::<BigEndian>()?;

        // Header fields come from untrusted bytes: bound them before they
        // reach the decoder or an allocation. Coefficient magnitudes stay
        // below 2^31, so no valid stream has a plane index past 30, and no
        // full encode emits more than a few hundred bits per coefficient.
        if max_n > 30 {
            return Err(SpihtError::Stream(format!(
                "bit-plane index {} out of range",
                max_n
            )));
        }
        let coeff_count = (channels as u64) * (height as u64) * (width as u64);
        let bit_cap = coeff_count.saturating_mul(32 * 8);
        if bit_len > bit_cap {
            return Err(SpihtError::Stream(format!(
                "payload of {} bits exceeds {}-bit cap for {}x{}x{} geometry",
                bit_len, bit_cap, channels, height, width
            )));
        }

        let byte_len = bit_len.div_ceil(8) as usize;
        let mut data = vec![0u8; byte_len];
        reader.read_exact(&mut data)?;

        Ok(Self {
            channels,
            height,
            width,
            ll_h,
            ll_w,
            max_n,
            bit_len,
            data,
        })
    }
}

fn dim_field(value: usize) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| SpihtError::InvalidArg(format!("dimension {} exceeds u32 range", value)))
}

/// Encodes an array and wraps the result with its decode metadata.
pub fn encode_to_stream(
    arr: &CoeffArray,
    ll_h: usize,
    ll_w: usize,
    max_bits: u64,
) -> Result<EncodedStream> {
    let (data, max_n, bit_len) = spiht::encode_with_bit_len(arr, ll_h, ll_w, max_bits)?;
    Ok(EncodedStream {
        channels: arr.channels(),
        height: arr.height(),
        width: arr.width(),
        ll_h,
        ll_w,
        max_n,
        bit_len,
        data,
    })
}

/// Decodes a container stream, using the stored exact bit length as the
/// decoder's budget.
pub fn decode_stream(stream: &EncodedStream) -> Result<CoeffArray> {
    let arr = spiht::decode_with_bit_budget(
        &stream.data,
        stream.bit_len,
        stream.max_n,
        stream.channels,
        stream.height,
        stream.width,
        stream.ll_h,
        stream.ll_w,
    )?;
    Ok(arr)
}
