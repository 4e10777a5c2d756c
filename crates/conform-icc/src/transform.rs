//! Float RGB transforms.

use crate::{IccError, IccResult, Profile};
use lcms2::{Intent, PixelFormat, Transform};

/// Pixels converted per Little CMS call when unpacking interleaved samples.
const BLOCK: usize = 4096;

/// A perceptual float RGB transform from one profile into another.
pub struct RgbTransform {
    inner: Transform<[f32; 3], [f32; 3]>,
}

impl RgbTransform {
    /// Builds the transform from two serialized profiles.
    ///
    /// Both must describe RGB data.
    pub fn between(source_icc: &[u8], dest_icc: &[u8]) -> IccResult<Self> {
        let source = Profile::from_icc(source_icc)?;
        let dest = Profile::from_icc(dest_icc)?;
        Self::new(&source, &dest)
    }

    /// Builds the transform from parsed profiles.
    pub fn new(source: &Profile, dest: &Profile) -> IccResult<Self> {
        source.require_rgb("source")?;
        dest.require_rgb("destination")?;
        let inner = Transform::new(
            &source.inner,
            PixelFormat::RGB_FLT,
            &dest.inner,
            PixelFormat::RGB_FLT,
            Intent::Perceptual,
        )
        .map_err(|e| IccError::Transform(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Converts RGB triplets in place.
    pub fn apply(&self, pixels: &mut [[f32; 3]]) {
        self.inner.transform_in_place(pixels);
    }

    /// Converts the first three of every `channels` samples in place.
    ///
    /// Converted channels pass through single precision. Callers guarantee
    /// `channels >= 3`.
    pub(crate) fn apply_interleaved(&self, samples: &mut [f64], channels: usize) {
        let mut rgb = Vec::with_capacity(BLOCK);
        for block in samples.chunks_mut(BLOCK * channels) {
            rgb.clear();
            rgb.extend(
                block
                    .chunks_exact(channels)
                    .map(|px| [px[0] as f32, px[1] as f32, px[2] as f32]),
            );
            self.apply(&mut rgb);
            for (px, converted) in block.chunks_exact_mut(channels).zip(&rgb) {
                for (dst, &src) in px[..3].iter_mut().zip(converted) {
                    *dst = f64::from(src);
                }
            }
        }
    }
}

impl std::fmt::Debug for RgbTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RgbTransform")
    }
}
