//! Multi-frame pixel buffers.
//!
//! A [`PixelBuffer`] stores samples in C order as `(frame, row, column, channel)`,
//! which is the layout reference and decoded `.npy` arrays use on disk.
//! Samples are kept in double precision so `<f8` arrays compare at full
//! resolution.
//!
//! A rank-3 array `(rows, columns, channels)` is addressed as a single frame
//! but keeps its rank: it never compares equal to a rank-4 shape.
//!
//! # Example
//!
//! ```rust
//! use conform_core::{PixelBuffer, Shape};
//!
//! let shape = Shape::new(2, 4, 4, 3);
//! let buf = PixelBuffer::zeros(shape);
//! assert_eq!(buf.frame(1).unwrap().len(), 4 * 4 * 3);
//! ```

use crate::{Error, Result};
use std::fmt;

/// Dimensions of a [`PixelBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    /// Number of frames (animation frames or layers).
    pub frames: usize,
    /// Image height.
    pub rows: usize,
    /// Image width.
    pub columns: usize,
    /// Samples per pixel.
    pub channels: usize,
    /// Whether the on-disk array had no frame axis.
    frameless: bool,
}

impl Shape {
    /// Creates a rank-4 shape from its four extents.
    pub const fn new(frames: usize, rows: usize, columns: usize, channels: usize) -> Self {
        Self {
            frames,
            rows,
            columns,
            channels,
            frameless: false,
        }
    }

    /// Creates a rank-3 shape `(rows, columns, channels)` holding one frame.
    pub const fn single_frame(rows: usize, columns: usize, channels: usize) -> Self {
        Self {
            frames: 1,
            rows,
            columns,
            channels,
            frameless: true,
        }
    }

    /// Builds a shape from array dimensions.
    ///
    /// Accepts rank 4 `(frames, rows, columns, channels)` and rank 3
    /// `(rows, columns, channels)`. Anything else is rejected.
    pub fn from_dims(dims: &[usize]) -> Result<Self> {
        match *dims {
            [f, r, c, ch] => Ok(Self::new(f, r, c, ch)),
            [r, c, ch] => Ok(Self::single_frame(r, c, ch)),
            _ => Err(Error::invalid_shape(dims, "expected (frames, rows, columns, channels)")),
        }
    }

    /// Number of array dimensions, 3 or 4.
    pub const fn rank(&self) -> usize {
        if self.frameless { 3 } else { 4 }
    }

    /// Samples in one frame.
    #[inline]
    pub const fn frame_len(&self) -> usize {
        self.rows * self.columns * self.channels
    }

    /// Samples in the whole buffer.
    #[inline]
    pub const fn len(&self) -> usize {
        self.frames * self.frame_len()
    }

    /// True if the buffer holds no samples.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dimensions as stored on disk, outermost first.
    pub fn dims(&self) -> Vec<usize> {
        let all = [self.frames, self.rows, self.columns, self.channels];
        all[4 - self.rank()..].to_vec()
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.frameless {
            write!(f, "({}, {}, {})", self.rows, self.columns, self.channels)
        } else {
            write!(
                f,
                "({}, {}, {}, {})",
                self.frames, self.rows, self.columns, self.channels
            )
        }
    }
}

/// Floating-point samples laid out as `(frame, row, column, channel)`.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    shape: Shape,
    data: Vec<f64>,
}

impl PixelBuffer {
    /// Wraps existing samples.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SampleCountMismatch`] when `data` does not hold exactly
    /// `shape.len()` samples.
    pub fn new(shape: Shape, data: Vec<f64>) -> Result<Self> {
        if data.len() != shape.len() {
            return Err(Error::SampleCountMismatch {
                shape: shape.to_string(),
                expected: shape.len(),
                got: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// Creates a buffer filled with zeros.
    pub fn zeros(shape: Shape) -> Self {
        Self {
            shape,
            data: vec![0.0; shape.len()],
        }
    }

    /// Creates a buffer by evaluating `f(frame, row, column, channel)` for every sample.
    pub fn from_fn(shape: Shape, mut f: impl FnMut(usize, usize, usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(shape.len());
        for frame in 0..shape.frames {
            for row in 0..shape.rows {
                for col in 0..shape.columns {
                    for ch in 0..shape.channels {
                        data.push(f(frame, row, col, ch));
                    }
                }
            }
        }
        Self { shape, data }
    }

    /// Buffer dimensions.
    #[inline]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// All samples in C order.
    #[inline]
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Mutable access to all samples.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Consumes the buffer, returning its samples.
    pub fn into_data(self) -> Vec<f64> {
        self.data
    }

    /// Samples of one frame, interleaved per pixel.
    pub fn frame(&self, index: usize) -> Result<&[f64]> {
        let range = self.frame_range(index)?;
        Ok(&self.data[range])
    }

    /// Mutable samples of one frame.
    pub fn frame_mut(&mut self, index: usize) -> Result<&mut [f64]> {
        let range = self.frame_range(index)?;
        Ok(&mut self.data[range])
    }

    fn frame_range(&self, index: usize) -> Result<std::ops::Range<usize>> {
        if index >= self.shape.frames {
            return Err(Error::FrameOutOfRange {
                index,
                frames: self.shape.frames,
            });
        }
        let len = self.shape.frame_len();
        Ok(index * len..(index + 1) * len)
    }
}
