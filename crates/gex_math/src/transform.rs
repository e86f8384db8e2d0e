// Transform utilities for Mat4
//
// Extends glam::Mat4 with the conversions a scene file needs: decoding
// column-major float arrays, rescaling translations, and switching the
// up axis of a whole matrix.

use glam::{Mat4, Vec3, Vec4};

/// Change of basis from a Y-up frame into a Z-up frame.
///
/// Maps `(x, y, z)` to `(x, -z, y)`. Every entry is 0 or ±1 so applying it
/// never introduces rounding.
pub const Y_UP_TO_Z_UP: Mat4 = Mat4::from_cols(Vec4::X, Vec4::Z, Vec4::NEG_Y, Vec4::W);

/// Inverse of [`Y_UP_TO_Z_UP`].
pub const Z_UP_TO_Y_UP: Mat4 = Mat4::from_cols(Vec4::X, Vec4::NEG_Z, Vec4::Y, Vec4::W);

/// Extension trait for Mat4 to provide additional transform utilities
pub trait Mat4Ext {
    /// Decode a column-major float array.
    ///
    /// Accepted lengths are 16 (full 4x4), 12 (3x3 plus translation),
    /// 9 (3x3), 6 (2x2 plus translation) and 4 (2x2). Any other length
    /// returns `None`.
    fn from_column_array(data: &[f32]) -> Option<Mat4>;

    /// Copy of the matrix with its translation column multiplied by `scale`.
    fn with_scaled_translation(&self, scale: f32) -> Mat4;

    /// Re-express the matrix in another frame: `basis * self * basis^-1`.
    ///
    /// `basis` must be orthonormal; its transpose is used as the inverse.
    fn change_basis(&self, basis: &Mat4) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn from_column_array(data: &[f32]) -> Option<Mat4> {
        let m = match data.len() {
            16 => Mat4::from_cols_slice(data),
            12 => Mat4::from_cols(
                Vec4::new(data[0], data[1], data[2], 0.0),
                Vec4::new(data[3], data[4], data[5], 0.0),
                Vec4::new(data[6], data[7], data[8], 0.0),
                Vec4::new(data[9], data[10], data[11], 1.0),
            ),
            9 => Mat4::from_cols(
                Vec4::new(data[0], data[1], data[2], 0.0),
                Vec4::new(data[3], data[4], data[5], 0.0),
                Vec4::new(data[6], data[7], data[8], 0.0),
                Vec4::W,
            ),
            6 => Mat4::from_cols(
                Vec4::new(data[0], data[1], 0.0, 0.0),
                Vec4::new(data[2], data[3], 0.0, 0.0),
                Vec4::Z,
                Vec4::new(data[4], data[5], 0.0, 1.0),
            ),
            4 => Mat4::from_cols(
                Vec4::new(data[0], data[1], 0.0, 0.0),
                Vec4::new(data[2], data[3], 0.0, 0.0),
                Vec4::Z,
                Vec4::W,
            ),
            _ => return None,
        };
        Some(m)
    }

    fn with_scaled_translation(&self, scale: f32) -> Mat4 {
        let mut m = *self;
        m.w_axis.x *= scale;
        m.w_axis.y *= scale;
        m.w_axis.z *= scale;
        m
    }

    fn change_basis(&self, basis: &Mat4) -> Mat4 {
        *basis * *self * basis.transpose()
    }
}

/// Rotation of `angle` radians about an arbitrary axis.
///
/// A zero-length axis yields the identity.
pub fn rotation_about_axis(angle: f32, axis: Vec3) -> Mat4 {
    match axis.try_normalize() {
        Some(axis) => Mat4::from_axis_angle(axis, angle),
        None => Mat4::IDENTITY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_column_array_full() {
        let data: Vec<f32> = (0..16).map(|i| i as f32).collect();
        let m = Mat4::from_column_array(&data).unwrap();

        assert_eq!(m.x_axis, Vec4::new(0.0, 1.0, 2.0, 3.0));
        assert_eq!(m.w_axis, Vec4::new(12.0, 13.0, 14.0, 15.0));
    }

    #[test]
    fn test_from_column_array_affine() {
        let data = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 5.0, 6.0, 7.0];
        let m = Mat4::from_column_array(&data).unwrap();

        assert_eq!(m.transform_point3(Vec3::ZERO), Vec3::new(5.0, 6.0, 7.0));
        assert_eq!(m.w_axis.w, 1.0);
    }

    #[test]
    fn test_from_column_array_2d() {
        let m = Mat4::from_column_array(&[2.0, 0.0, 0.0, 3.0, 4.0, 5.0]).unwrap();
        let p = m.transform_point3(Vec3::new(1.0, 1.0, 0.0));

        assert_eq!(p, Vec3::new(6.0, 8.0, 0.0));
    }

    #[test]
    fn test_from_column_array_bad_length() {
        assert!(Mat4::from_column_array(&[1.0; 15]).is_none());
        assert!(Mat4::from_column_array(&[]).is_none());
    }

    #[test]
    fn test_scaled_translation_leaves_rotation() {
        let m = Mat4::from_rotation_z(0.5) * Mat4::from_translation(Vec3::new(100.0, 0.0, 0.0));
        let scaled = m.with_scaled_translation(0.01);

        assert_eq!(scaled.x_axis, m.x_axis);
        assert!((scaled.w_axis.truncate() - m.w_axis.truncate() * 0.01).length() < 1e-6);
    }

    #[test]
    fn test_y_up_basis_maps_vectors() {
        let v = Y_UP_TO_Z_UP.transform_vector3(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(v, Vec3::new(1.0, -3.0, 2.0));

        let back = Z_UP_TO_Y_UP.transform_vector3(v);
        assert_eq!(back, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_change_basis_translation() {
        let m = Mat4::from_translation(Vec3::new(0.0, 10.0, 0.0));
        let converted = m.change_basis(&Y_UP_TO_Z_UP);

        assert_eq!(converted.w_axis, Vec4::new(0.0, 0.0, 10.0, 1.0));
    }

    #[test]
    fn test_change_basis_round_trip() {
        let m = Mat4::from_rotation_x(0.3) * Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let back = m.change_basis(&Y_UP_TO_Z_UP).change_basis(&Z_UP_TO_Y_UP);

        assert!(back.abs_diff_eq(m, 1e-6));
    }

    #[test]
    fn test_rotation_about_zero_axis() {
        assert_eq!(rotation_about_axis(1.0, Vec3::ZERO), Mat4::IDENTITY);
    }
}
