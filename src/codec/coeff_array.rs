// src/codec/coeff_array.rs

use super::spiht::CodecError;

/// Owns the quantized wavelet coefficients for all channels of one image.
///
/// Layout is `(channels, height, width)`, row-major within each channel,
/// matching the flat dyadic-pyramid convention (lowest-frequency subband at
/// the top-left corner of every channel plane).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoeffArray {
    data: Vec<i32>,
    channels: usize,
    height: usize,
    width: usize,
}

impl CoeffArray {
    /// Creates an all-zero array. This is the decoder's starting point.
    pub fn zeroed(channels: usize, height: usize, width: usize) -> Self {
        Self {
            data: vec![0; channels * height * width],
            channels,
            height,
            width,
        }
    }

    /// Wraps an existing flat buffer of `channels * height * width`
    /// coefficients.
    pub fn from_vec(
        data: Vec<i32>,
        channels: usize,
        height: usize,
        width: usize,
    ) -> Result<Self, CodecError> {
        if data.len() != channels * height * width {
            return Err(CodecError::InvalidGeometry(format!(
                "buffer of {} coefficients does not match shape ({}, {}, {})",
                data.len(),
                channels,
                height,
                width
            )));
        }
        Ok(Self {
            data,
            channels,
            height,
            width,
        })
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    fn index(&self, ch: usize, row: usize, col: usize) -> usize {
        (ch * self.height + row) * self.width + col
    }

    #[inline]
    pub fn get(&self, ch: usize, row: usize, col: usize) -> i32 {
        self.data[self.index(ch, row, col)]
    }

    #[inline]
    pub fn set(&mut self, ch: usize, row: usize, col: usize, value: i32) {
        let idx = self.index(ch, row, col);
        self.data[idx] = value;
    }

    /// Largest coefficient magnitude across all channels; 0 for an empty or
    /// all-zero array.
    pub fn max_abs(&self) -> u32 {
        self.data.iter().map(|v| v.unsigned_abs()).max().unwrap_or(0)
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<i32> {
        self.data
    }
}
