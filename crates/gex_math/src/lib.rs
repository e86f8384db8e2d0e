// Re-export glam for convenience
pub use glam::*;

// Scene math helpers
mod color;
mod transform;

pub use color::{Chromaticities, XYZ_TO_LINEAR_SRGB};
pub use transform::{rotation_about_axis, Mat4Ext, Y_UP_TO_Z_UP, Z_UP_TO_Y_UP};
