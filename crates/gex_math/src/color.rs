//! Color-space conversion driven by CIE chromaticity coordinates.

use glam::{Mat3, Vec2, Vec3};

/// CIE XYZ to linear sRGB (D65).
pub const XYZ_TO_LINEAR_SRGB: Mat3 = Mat3::from_cols(
    Vec3::new(3.24097, -0.969244, 0.05563),
    Vec3::new(-1.537383, 1.875968, -0.203977),
    Vec3::new(-0.498611, 0.041555, 1.056972),
);

/// Primaries and white point of an RGB color space, as xy chromaticities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Chromaticities {
    pub red: Vec2,
    pub green: Vec2,
    pub blue: Vec2,
    pub white: Vec2,
}

impl Default for Chromaticities {
    /// sRGB primaries with a D65 white point.
    fn default() -> Self {
        Self {
            red: Vec2::new(0.64, 0.33),
            green: Vec2::new(0.3, 0.6),
            blue: Vec2::new(0.15, 0.06),
            white: Vec2::new(0.3127, 0.329),
        }
    }
}

impl Chromaticities {
    /// Matrix taking RGB in this space to CIE XYZ.
    ///
    /// Returns `None` for degenerate primaries (a zero y coordinate or
    /// collinear primaries).
    pub fn rgb_to_xyz(&self) -> Option<Mat3> {
        let column = |c: Vec2| -> Option<Vec3> {
            if c.y == 0.0 {
                return None;
            }
            let inv_y = 1.0 / c.y;
            Some(Vec3::new(c.x * inv_y, 1.0, (1.0 - c.x - c.y) * inv_y))
        };

        let m = Mat3::from_cols(column(self.red)?, column(self.green)?, column(self.blue)?);
        if m.determinant().abs() < f32::EPSILON {
            return None;
        }

        let white = column(self.white)?;
        let lum = m.inverse() * white;
        Some(Mat3::from_cols(m.x_axis * lum.x, m.y_axis * lum.y, m.z_axis * lum.z))
    }

    /// Matrix taking RGB in this space to linear sRGB.
    pub fn to_linear_srgb(&self) -> Option<Mat3> {
        self.rgb_to_xyz().map(|m| XYZ_TO_LINEAR_SRGB * m)
    }
}
