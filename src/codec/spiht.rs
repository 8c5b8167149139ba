// src/codec/spiht.rs

//! The SPIHT sorting/refinement pass engine and the encode/decode drivers.
//!
//! Encoder and decoder must walk the LIP/LSP/LIS lists in exactly the same
//! order, or reconstruction diverges irrecoverably. To make drift
//! impossible, the pass state machine is implemented once and parameterized
//! by a [`SpihtPort`]: the encode port computes each decision from the true
//! coefficients and writes it, the decode port reads the identical bit and
//! applies the reconstruction side effects. Both sides stop the instant the
//! bit budget is reached, mid-pass truncation included.

use super::bitstream::{BitReader, BitWriter};
use super::coeff_array::CoeffArray;
use super::tree::{significant, Geometry};
use log::debug;
use thiserror::Error;

/// Budget sentinel for "encode everything".
pub const UNLIMITED_BITS: u64 = u64::MAX;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),
    #[error("Input array is empty")]
    EmptyInput,
}

/// A single coefficient position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Pixel {
    ch: usize,
    row: usize,
    col: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SetKind {
    /// All descendants of the node.
    A,
    /// All descendants excluding the direct children.
    B,
}

/// One LIS entry: a tree node standing for a not-yet-significant set.
#[derive(Debug, Clone, Copy)]
struct SetEntry {
    ch: usize,
    row: usize,
    col: usize,
    kind: SetKind,
}

/// The three ordered work lists. Entry order is part of the protocol.
struct Lists {
    lip: Vec<Pixel>,
    lsp: Vec<Pixel>,
    lis: Vec<SetEntry>,
}

impl Lists {
    /// LIP starts with every root-subband position; LIS with a type-A
    /// entry for every root position that has descendants.
    fn initialize(geo: &Geometry) -> Self {
        let mut lip = Vec::with_capacity(geo.channels * geo.ll_h * geo.ll_w);
        let mut lis = Vec::new();
        for ch in 0..geo.channels {
            for row in 0..geo.ll_h {
                for col in 0..geo.ll_w {
                    lip.push(Pixel { ch, row, col });
                    if geo.has_children(row, col) {
                        lis.push(SetEntry {
                            ch,
                            row,
                            col,
                            kind: SetKind::A,
                        });
                    }
                }
            }
        }
        Self {
            lip,
            lsp: Vec::new(),
            lis,
        }
    }
}

/// The bit source/sink the pass engine is driven through. Every method
/// returns `None` once the bit budget is exhausted, which aborts the
/// whole run.
trait SpihtPort {
    /// Significance of one coefficient at plane `n`.
    fn pixel_bit(&mut self, px: Pixel, n: u8) -> Option<bool>;
    /// Significance of a descendant set at plane `n`.
    fn set_bit(&mut self, geo: &Geometry, entry: &SetEntry, n: u8) -> Option<bool>;
    /// Sign of a coefficient that just became significant. On the decode
    /// side this also seeds the reconstruction value `±2^n`.
    fn sign_bit(&mut self, px: Pixel, n: u8) -> Option<bool>;
    /// One refinement bit (bit `n` of the magnitude). On the decode side a
    /// set bit adds `2^n` to the reconstructed magnitude.
    fn refine_bit(&mut self, px: Pixel, n: u8) -> Option<()>;
    fn bits_used(&self) -> u64;
}

struct EncodePort<'a> {
    arr: &'a CoeffArray,
    writer: BitWriter,
    budget: u64,
    used: u64,
}

impl EncodePort<'_> {
    #[inline]
    fn emit(&mut self, bit: bool) -> Option<bool> {
        if self.used >= self.budget {
            return None;
        }
        self.writer.put_bit(bit);
        self.used += 1;
        Some(bit)
    }
}

impl SpihtPort for EncodePort<'_> {
    fn pixel_bit(&mut self, px: Pixel, n: u8) -> Option<bool> {
        self.emit(significant(self.arr.get(px.ch, px.row, px.col), n))
    }

    fn set_bit(&mut self, geo: &Geometry, entry: &SetEntry, n: u8) -> Option<bool> {
        let exclude_children = entry.kind == SetKind::B;
        let max =
            geo.max_descendant_magnitude(self.arr, entry.ch, entry.row, entry.col, exclude_children);
        self.emit(max >= (1u32 << n))
    }

    fn sign_bit(&mut self, px: Pixel, _n: u8) -> Option<bool> {
        self.emit(self.arr.get(px.ch, px.row, px.col) < 0)
    }

    fn refine_bit(&mut self, px: Pixel, n: u8) -> Option<()> {
        let abs = self.arr.get(px.ch, px.row, px.col).unsigned_abs();
        self.emit((abs >> n) & 1 == 1).map(|_| ())
    }

    fn bits_used(&self) -> u64 {
        self.used
    }
}

struct DecodePort<'a> {
    arr: &'a mut CoeffArray,
    reader: BitReader<'a>,
    budget: u64,
    used: u64,
}

impl DecodePort<'_> {
    #[inline]
    fn take(&mut self) -> Option<bool> {
        if self.used >= self.budget {
            return None;
        }
        self.used += 1;
        Some(self.reader.read_bit())
    }
}

impl SpihtPort for DecodePort<'_> {
    fn pixel_bit(&mut self, _px: Pixel, _n: u8) -> Option<bool> {
        self.take()
    }

    fn set_bit(&mut self, _geo: &Geometry, _entry: &SetEntry, _n: u8) -> Option<bool> {
        self.take()
    }

    fn sign_bit(&mut self, px: Pixel, n: u8) -> Option<bool> {
        let negative = self.take()?;
        let magnitude = 1i32 << n;
        self.arr.set(
            px.ch,
            px.row,
            px.col,
            if negative { -magnitude } else { magnitude },
        );
        Some(negative)
    }

    fn refine_bit(&mut self, px: Pixel, n: u8) -> Option<()> {
        if self.take()? {
            let v = self.arr.get(px.ch, px.row, px.col);
            let step = 1i32 << n;
            self.arr
                .set(px.ch, px.row, px.col, if v < 0 { v - step } else { v + step });
        }
        Some(())
    }

    fn bits_used(&self) -> u64 {
        self.used
    }
}

/// One sorting pass at plane `n`: LIP first, then LIS. Entries appended to
/// a list during the pass are processed before the pass ends; removals
/// preserve list order. Returns `None` on budget exhaustion.
fn sorting_pass<P: SpihtPort>(geo: &Geometry, lists: &mut Lists, port: &mut P, n: u8) -> Option<()> {
    let mut idx = 0;
    while idx < lists.lip.len() {
        let px = lists.lip[idx];
        if port.pixel_bit(px, n)? {
            port.sign_bit(px, n)?;
            lists.lsp.push(px);
            lists.lip.remove(idx);
        } else {
            idx += 1;
        }
    }

    let mut idx = 0;
    while idx < lists.lis.len() {
        let entry = lists.lis[idx];
        if !port.set_bit(geo, &entry, n)? {
            idx += 1;
            continue;
        }
        match entry.kind {
            SetKind::A => {
                if let Some(kids) = geo.children(entry.row, entry.col) {
                    for (row, col) in kids {
                        let px = Pixel {
                            ch: entry.ch,
                            row,
                            col,
                        };
                        if port.pixel_bit(px, n)? {
                            port.sign_bit(px, n)?;
                            lists.lsp.push(px);
                        } else {
                            lists.lip.push(px);
                        }
                    }
                }
                if geo.has_grandchildren(entry.row, entry.col) {
                    lists.lis.push(SetEntry {
                        kind: SetKind::B,
                        ..entry
                    });
                }
                lists.lis.remove(idx);
            }
            SetKind::B => {
                // A type-B entry only exists when grandchildren do, so
                // every direct child roots a non-empty type-A set.
                if let Some(kids) = geo.children(entry.row, entry.col) {
                    for (row, col) in kids {
                        lists.lis.push(SetEntry {
                            ch: entry.ch,
                            row,
                            col,
                            kind: SetKind::A,
                        });
                    }
                }
                lists.lis.remove(idx);
            }
        }
    }
    Some(())
}

/// One refinement pass at plane `n`, restricted to the LSP prefix that was
/// present before this plane's sorting pass: a position starts refining
/// the plane after it became significant.
fn refinement_pass<P: SpihtPort>(
    lists: &mut Lists,
    port: &mut P,
    n: u8,
    lsp_len_before: usize,
) -> Option<()> {
    for k in 0..lsp_len_before {
        port.refine_bit(lists.lsp[k], n)?;
    }
    Some(())
}

/// Runs bit-planes `max_n` down to 0, stopping early on budget exhaustion.
fn run_passes<P: SpihtPort>(geo: &Geometry, port: &mut P, max_n: u8) {
    debug_assert!(max_n <= 30, "coefficient magnitude out of supported range");
    let mut lists = Lists::initialize(geo);
    let mut n = max_n as i32;
    while n >= 0 {
        let lsp_len_before = lists.lsp.len();
        if sorting_pass(geo, &mut lists, port, n as u8).is_none() {
            break;
        }
        if refinement_pass(&mut lists, port, n as u8, lsp_len_before).is_none() {
            break;
        }
        #[cfg(feature = "spiht-trace")]
        log::trace!(
            "plane {}: lip={} lis={} lsp={} bits={}",
            n,
            lists.lip.len(),
            lists.lis.len(),
            lists.lsp.len(),
            port.bits_used()
        );
        n -= 1;
    }
}

/// Encodes a quantized coefficient array into a SPIHT bitstream.
///
/// Returns the packed bytes (final byte zero-padded) and `max_n`, the most
/// significant bit-plane index. `max_n` and the array geometry are NOT
/// recoverable from the stream; the caller must carry them out-of-band
/// (see [`crate::container::stream`]).
pub fn encode(
    arr: &CoeffArray,
    ll_h: usize,
    ll_w: usize,
    max_bits: u64,
) -> Result<(Vec<u8>, u8), CodecError> {
    let (bytes, max_n, _) = encode_with_bit_len(arr, ll_h, ll_w, max_bits)?;
    Ok((bytes, max_n))
}

/// Like [`encode`] but also reports the exact number of bits written,
/// which the container layer persists so readers never feed byte padding
/// back into the decoder.
pub(crate) fn encode_with_bit_len(
    arr: &CoeffArray,
    ll_h: usize,
    ll_w: usize,
    max_bits: u64,
) -> Result<(Vec<u8>, u8, u64), CodecError> {
    let geo = Geometry::new(arr.channels(), arr.height(), arr.width(), ll_h, ll_w)?;
    let max_abs = arr.max_abs();
    let max_n = if max_abs == 0 {
        0
    } else {
        (31 - max_abs.leading_zeros()) as u8
    };
    debug!(
        "encode: {}x{}x{} ll={}x{} max_n={} budget={}",
        geo.channels, geo.height, geo.width, geo.ll_h, geo.ll_w, max_n, max_bits
    );

    // Pre-size the bit buffer: full streams run a few bits per
    // coefficient, so 8 is a comfortable over-estimate.
    let cap_bits = max_bits.min((arr.as_slice().len() as u64) * 8) as usize;
    let mut port = EncodePort {
        arr,
        writer: BitWriter::with_capacity(cap_bits),
        budget: max_bits,
        used: 0,
    };
    run_passes(&geo, &mut port, max_n);

    let bit_len = port.bits_used();
    debug!("encode: emitted {} bits", bit_len);
    Ok((port.writer.into_bytes(), max_n, bit_len))
}

/// Decodes a SPIHT bitstream back into a coefficient array.
///
/// The bit budget is `8 * data.len()`; the caller must not supply bytes
/// beyond what the encoder wrote, or the trailing padding is consumed as
/// zero-valued decisions. A truncated stream is not an error: untouched
/// positions simply stay at their last known reconstruction value (zero).
pub fn decode(
    data: &[u8],
    max_n: u8,
    channels: usize,
    height: usize,
    width: usize,
    ll_h: usize,
    ll_w: usize,
) -> Result<CoeffArray, CodecError> {
    decode_with_bit_budget(data, (data.len() as u64) * 8, max_n, channels, height, width, ll_h, ll_w)
}

/// Like [`decode`] but with an explicit bit budget, for callers (the
/// container layer) that know the exact encoded bit count.
#[allow(clippy::too_many_arguments)]
pub(crate) fn decode_with_bit_budget(
    data: &[u8],
    bit_budget: u64,
    max_n: u8,
    channels: usize,
    height: usize,
    width: usize,
    ll_h: usize,
    ll_w: usize,
) -> Result<CoeffArray, CodecError> {
    let geo = Geometry::new(channels, height, width, ll_h, ll_w)?;
    let mut arr = CoeffArray::zeroed(channels, height, width);
    debug!(
        "decode: {}x{}x{} ll={}x{} max_n={} budget={} bits",
        channels, height, width, ll_h, ll_w, max_n, bit_budget
    );

    let mut port = DecodePort {
        arr: &mut arr,
        reader: BitReader::new(data),
        budget: bit_budget,
        used: 0,
    };
    run_passes(&geo, &mut port, max_n);
    debug!("decode: consumed {} bits", port.bits_used());

    Ok(arr)
}
