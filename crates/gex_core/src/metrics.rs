//! Document units, axes and color space.

use gex_math::{Chromaticities, Mat3, Mat4, Mat4Ext, Vec3, Y_UP_TO_Z_UP, Z_UP_TO_Y_UP};

use crate::options::{LoadOptions, UpAxis};

/// Direction a document considers "forward".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForwardAxis {
    #[default]
    X,
    Y,
    Z,
    NegX,
    NegY,
    NegZ,
}

impl ForwardAxis {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "x" => Some(ForwardAxis::X),
            "y" => Some(ForwardAxis::Y),
            "z" => Some(ForwardAxis::Z),
            "-x" => Some(ForwardAxis::NegX),
            "-y" => Some(ForwardAxis::NegY),
            "-z" => Some(ForwardAxis::NegZ),
            _ => None,
        }
    }

    pub fn vector(self) -> Vec3 {
        match self {
            ForwardAxis::X => Vec3::X,
            ForwardAxis::Y => Vec3::Y,
            ForwardAxis::Z => Vec3::Z,
            ForwardAxis::NegX => Vec3::NEG_X,
            ForwardAxis::NegY => Vec3::NEG_Y,
            ForwardAxis::NegZ => Vec3::NEG_Z,
        }
    }
}

/// Values declared by `Metric` structures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    pub distance_scale: f32,
    pub angle_scale: f32,
    pub time_scale: f32,
    pub up: UpAxis,
    pub forward: ForwardAxis,
    pub chromaticities: Chromaticities,
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            distance_scale: 1.0,
            angle_scale: 1.0,
            time_scale: 1.0,
            up: UpAxis::Z,
            forward: ForwardAxis::X,
            chromaticities: Chromaticities::default(),
        }
    }
}

impl Metrics {
    /// Basis change from the document's up axis to `target`, if they differ.
    pub fn up_conversion(&self, target: UpAxis) -> Option<Mat4> {
        match (self.up, target) {
            (UpAxis::Y, UpAxis::Z) => Some(Y_UP_TO_Z_UP),
            (UpAxis::Z, UpAxis::Y) => Some(Z_UP_TO_Y_UP),
            _ => None,
        }
    }

    /// Scale applied to lengths under `options`.
    pub fn length_scale(&self, options: &LoadOptions) -> f32 {
        if options.apply_distance_scale {
            self.distance_scale
        } else {
            1.0
        }
    }

    /// Normalize a transform: scale its translation, then change its up axis.
    pub fn adjust_transform(&self, transform: Mat4, options: &LoadOptions) -> Mat4 {
        let m = transform.with_scaled_translation(self.length_scale(options));
        match self.up_conversion(options.target_up) {
            Some(basis) => m.change_basis(&basis),
            None => m,
        }
    }

    /// Convert a direction to the target up axis.
    pub fn adjust_direction(&self, v: Vec3, options: &LoadOptions) -> Vec3 {
        match self.up_conversion(options.target_up) {
            Some(basis) => basis.transform_vector3(v),
            None => v,
        }
    }

    /// Scale and convert a position.
    pub fn adjust_position(&self, p: Vec3, options: &LoadOptions) -> Vec3 {
        self.adjust_direction(p * self.length_scale(options), options)
    }

    /// RGB in the document's color space to linear sRGB.
    pub fn color_matrix(&self) -> Option<Mat3> {
        self.chromaticities.to_linear_srgb()
    }
}
