// src/codec/tree.rs

//! Spatial orientation tree addressing.
//!
//! The tree is never materialized: parent/child relationships are pure
//! index arithmetic over the flat pyramid layout, derived entirely from
//! `(h, w, ll_h, ll_w)`. Encoder and decoder must agree on this function
//! exactly: it, not the coefficient array, defines the tree.
//!
//! Layout convention (matching `pywt.coeffs_to_array`): the LL subband sits
//! at the top-left corner; detail subbands of successively finer levels
//! occupy the remaining dyadic blocks. Outside LL, the children of `(i, j)`
//! are the 2x2 block at `(2i, 2j)`, one pyramid level finer, same
//! orientation. Inside LL, coefficients group into 2x2 quads: the (0,0)
//! member of each quad has no children, and the other three members root
//! the trees of the three first-level detail subbands.

use super::coeff_array::CoeffArray;
use super::spiht::CodecError;

/// Validated pyramid geometry for one encode or decode call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub channels: usize,
    pub height: usize,
    pub width: usize,
    pub ll_h: usize,
    pub ll_w: usize,
}

impl Geometry {
    /// Validates that `(ll_h, ll_w)` reach `(height, width)` by repeated
    /// doubling, i.e. that the array really is a dyadic pyramid rooted at
    /// an LL subband of that size.
    pub fn new(
        channels: usize,
        height: usize,
        width: usize,
        ll_h: usize,
        ll_w: usize,
    ) -> Result<Self, CodecError> {
        if channels == 0 || height == 0 || width == 0 {
            return Err(CodecError::EmptyInput);
        }
        if ll_h == 0 || ll_w == 0 {
            return Err(CodecError::InvalidGeometry(
                "LL subband dimensions must be nonzero".to_string(),
            ));
        }

        let (mut dh, mut dw) = (ll_h, ll_w);
        while dh < height && dw < width {
            dh *= 2;
            dw *= 2;
        }
        if dh != height || dw != width {
            return Err(CodecError::InvalidGeometry(format!(
                "LL subband {}x{} does not evenly partition plane {}x{}",
                ll_h, ll_w, height, width
            )));
        }

        // The 2x2 root grouping needs even LL dimensions whenever detail
        // subbands exist at all.
        if (height > ll_h || width > ll_w) && (ll_h % 2 != 0 || ll_w % 2 != 0) {
            return Err(CodecError::InvalidGeometry(format!(
                "LL subband {}x{} must have even dimensions",
                ll_h, ll_w
            )));
        }

        Ok(Self {
            channels,
            height,
            width,
            ll_h,
            ll_w,
        })
    }

    /// True if `(row, col)` lies in the lowest-frequency subband.
    #[inline]
    pub fn is_root(&self, row: usize, col: usize) -> bool {
        row < self.ll_h && col < self.ll_w
    }

    /// Direct children of `(row, col)`, or `None` for leaves and for the
    /// childless (even, even) member of each LL quad.
    pub fn children(&self, row: usize, col: usize) -> Option<[(usize, usize); 4]> {
        let (ci, cj) = if self.is_root(row, col) {
            if row % 2 == 0 && col % 2 == 0 {
                return None;
            }
            // Quad base inside LL; the three non-corner members point at
            // the matching 2x2 blocks of the first-level detail subbands.
            let (base_i, base_j) = (row & !1, col & !1);
            match (row % 2, col % 2) {
                (0, 1) => (base_i, base_j + self.ll_w),
                (1, 0) => (base_i + self.ll_h, base_j),
                (1, 1) => (base_i + self.ll_h, base_j + self.ll_w),
                _ => unreachable!(),
            }
        } else {
            (2 * row, 2 * col)
        };

        if ci >= self.height || cj >= self.width {
            return None;
        }
        Some([(ci, cj), (ci, cj + 1), (ci + 1, cj), (ci + 1, cj + 1)])
    }

    #[inline]
    pub fn has_children(&self, row: usize, col: usize) -> bool {
        self.children(row, col).is_some()
    }

    /// True if any direct child of `(row, col)` has children of its own.
    pub fn has_grandchildren(&self, row: usize, col: usize) -> bool {
        match self.children(row, col) {
            Some(kids) => kids.iter().any(|&(i, j)| self.has_children(i, j)),
            None => false,
        }
    }

    /// Maximum coefficient magnitude over the descendants of `(row, col)`
    /// in channel `ch`: all descendants, or all except the direct children
    /// when `exclude_children` is set (the type-B set). Returns 0 for an
    /// empty set.
    pub fn max_descendant_magnitude(
        &self,
        arr: &CoeffArray,
        ch: usize,
        row: usize,
        col: usize,
        exclude_children: bool,
    ) -> u32 {
        let mut best = 0u32;
        let mut stack: Vec<(usize, usize, bool)> = Vec::new();
        if let Some(kids) = self.children(row, col) {
            for (i, j) in kids {
                stack.push((i, j, exclude_children));
            }
        }
        while let Some((i, j, skip_value)) = stack.pop() {
            if !skip_value {
                best = best.max(arr.get(ch, i, j).unsigned_abs());
            }
            if let Some(kids) = self.children(i, j) {
                for (ci, cj) in kids {
                    stack.push((ci, cj, false));
                }
            }
        }
        best
    }
}

/// Bit-plane significance test: `|value| >= 2^n`.
#[inline]
pub fn significant(value: i32, n: u8) -> bool {
    value.unsigned_abs() >= (1u32 << n)
}
