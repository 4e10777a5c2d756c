//! # conform-icc
//!
//! Color reconciliation between a decoder's reported profile and the
//! reference profile, on top of Little CMS 2.
//!
//! A decoder may return pixels in a different color space than the one the
//! reference was rendered in. Before numeric comparison the decoded samples
//! are moved into the reference space. Profiles arrive as raw ICC bytes from
//! the case directory and the decoder's `--icc_out` file.
//!
//! ```rust
//! use conform_icc::{convert_pixels, Profile};
//!
//! let srgb = Profile::srgb().to_icc().unwrap();
//! let linear = Profile::linear_srgb().to_icc().unwrap();
//!
//! let mut pixels = vec![[0.5f32, 0.3, 0.2]; 16];
//! convert_pixels(&srgb, &linear, &mut pixels).unwrap();
//! assert!(pixels[0][0] < 0.5);
//! ```

#![warn(missing_docs)]

mod error;
mod profile;
mod transform;

pub use error::{IccError, IccResult};
pub use profile::Profile;
pub use transform::RgbTransform;

/// Converts RGB triplets from the space of `source_icc` into that of `dest_icc`.
pub fn convert_pixels(source_icc: &[u8], dest_icc: &[u8], pixels: &mut [[f32; 3]]) -> IccResult<()> {
    RgbTransform::between(source_icc, dest_icc)?.apply(pixels);
    Ok(())
}

/// Converts the color channels of interleaved samples, `channels` per pixel.
///
/// The first three channels of each pixel are treated as RGB; any further
/// channels (alpha, extra channels) pass through unchanged.
pub fn convert_interleaved(
    source_icc: &[u8],
    dest_icc: &[u8],
    samples: &mut [f64],
    channels: usize,
) -> IccResult<()> {
    if channels < 3 {
        return Err(IccError::NotRgb { channels });
    }
    RgbTransform::between(source_icc, dest_icc)?.apply_interleaved(samples, channels);
    Ok(())
}
