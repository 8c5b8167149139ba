// src/codec/bitstream.rs

//! MSB-first bit-level I/O over a growable byte buffer.
//!
//! The SPIHT protocol is a raw sequence of single-bit decisions with no
//! framing, so the writer is nothing more than a bit accumulator and the
//! reader a bit cursor. Reading past the end of the buffer yields zero
//! bits, never an error: the decoder is trusted to count consumed bits
//! against its budget, and enforcing that budget is the driver's job, not
//! this primitive's.

use bitvec::prelude::*;

/// Accumulates single bits and fixed-width integers MSB-first.
///
/// The final byte is padded with zero bits when the buffer is extracted.
#[derive(Debug, Default)]
pub struct BitWriter {
    bits: BitVec<u8, Msb0>,
}

impl BitWriter {
    pub fn new() -> Self {
        Self {
            bits: BitVec::new(),
        }
    }

    pub fn with_capacity(nbits: usize) -> Self {
        Self {
            bits: BitVec::with_capacity(nbits),
        }
    }

    #[inline]
    pub fn put_bit(&mut self, bit: bool) {
        self.bits.push(bit);
    }

    /// Writes the low `width` bits of `value`, most significant first.
    pub fn put_bits(&mut self, value: u32, width: u32) {
        debug_assert!(width <= 32);
        for k in (0..width).rev() {
            self.bits.push((value >> k) & 1 == 1);
        }
    }

    /// Number of bits written so far.
    #[inline]
    pub fn bit_len(&self) -> usize {
        self.bits.len()
    }

    /// Consumes the writer, returning the packed bytes. Unused bits of the
    /// last byte are zero.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bits.into_vec()
    }
}

/// Reads bits MSB-first from a byte slice.
pub struct BitReader<'a> {
    bits: &'a BitSlice<u8, Msb0>,
    pos: usize,
}

impl<'a> BitReader<'a> {
    #[inline]
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            bits: data.view_bits::<Msb0>(),
            pos: 0,
        }
    }

    /// Reads one bit; past the end of the buffer this returns `false`.
    #[inline]
    pub fn read_bit(&mut self) -> bool {
        let bit = self.bits.get(self.pos).map(|b| *b).unwrap_or(false);
        self.pos += 1;
        bit
    }

    /// Reads `width` bits into the low bits of a `u32`, MSB-first.
    pub fn read_bits(&mut self, width: u32) -> u32 {
        debug_assert!(width <= 32);
        let mut value = 0u32;
        for _ in 0..width {
            value = (value << 1) | self.read_bit() as u32;
        }
        value
    }

    /// Current cursor position in bits (may run past the buffer).
    #[inline]
    pub fn bit_pos(&self) -> usize {
        self.pos
    }
}
