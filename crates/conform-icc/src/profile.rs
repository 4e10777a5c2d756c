//! Parsed ICC profiles.

use crate::{IccError, IccResult};
use lcms2::{CIExyY, CIExyYTRIPLE, ColorSpaceSignature, ToneCurve};

/// An ICC profile parsed by Little CMS.
pub struct Profile {
    pub(crate) inner: lcms2::Profile,
}

impl Profile {
    /// Parses raw ICC bytes.
    pub fn from_icc(data: &[u8]) -> IccResult<Self> {
        lcms2::Profile::new_icc(data)
            .map(|inner| Self { inner })
            .map_err(|e| IccError::Parse(e.to_string()))
    }

    /// IEC 61966-2-1 sRGB.
    pub fn srgb() -> Self {
        Self {
            inner: lcms2::Profile::new_srgb(),
        }
    }

    /// sRGB primaries and D65 white with a linear transfer curve.
    pub fn linear_srgb() -> Self {
        let white = CIExyY { x: 0.3127, y: 0.3290, Y: 1.0 };
        let primaries = CIExyYTRIPLE {
            Red: CIExyY { x: 0.64, y: 0.33, Y: 1.0 },
            Green: CIExyY { x: 0.30, y: 0.60, Y: 1.0 },
            Blue: CIExyY { x: 0.15, y: 0.06, Y: 1.0 },
        };
        let linear = ToneCurve::new(1.0);
        match lcms2::Profile::new_rgb(&white, &primaries, &[&linear, &linear, &linear]) {
            Ok(inner) => Self { inner },
            // Only fails on invalid primaries, which these are not.
            Err(_) => Self::srgb(),
        }
    }

    /// Header color space signature.
    pub fn color_space(&self) -> ColorSpaceSignature {
        self.inner.color_space()
    }

    /// Fails unless the profile describes RGB data.
    pub(crate) fn require_rgb(&self, role: &'static str) -> IccResult<()> {
        match self.color_space() {
            ColorSpaceSignature::RgbData => Ok(()),
            other => Err(IccError::NotRgbProfile {
                role,
                space: format!("{other:?}"),
            }),
        }
    }

    /// Human-readable profile name, empty if the profile has none.
    pub fn description(&self) -> String {
        self.inner
            .info(lcms2::InfoType::Description, lcms2::Locale::none())
            .unwrap_or_default()
    }

    /// Serialized ICC bytes.
    pub fn to_icc(&self) -> IccResult<Vec<u8>> {
        self.inner.icc().map_err(|e| IccError::Serialize(e.to_string()))
    }
}

impl std::fmt::Debug for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Profile").field(&self.description()).finish()
    }
}
