//! Transform-producing structures and morph weights.

use gex_ddl::{DataType, NodeId, StructureError, Value};
use gex_math::{rotation_about_axis, Mat4, Mat4Ext, Quat, Vec3};

use super::{float_data, is_float_primitive, payload_mut, string_property, GexDescription, GexKind, GexStructure, StructureRules};
use crate::error::{GexError, GexResult};

/// Component layout of a Translation or Scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VectorKind {
    X,
    Y,
    Z,
    #[default]
    Xyz,
}

impl VectorKind {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "x" => Some(VectorKind::X),
            "y" => Some(VectorKind::Y),
            "z" => Some(VectorKind::Z),
            "xyz" => Some(VectorKind::Xyz),
            _ => None,
        }
    }

    pub fn array_size(self) -> u32 {
        match self {
            VectorKind::Xyz => 3,
            _ => 0,
        }
    }

    /// Expand animated or parsed values, filling unnamed components.
    fn expand(self, values: &[f32], fill: f32) -> Vec3 {
        let mut v = Vec3::splat(fill);
        match (self, values) {
            (VectorKind::X, [x, ..]) => v.x = *x,
            (VectorKind::Y, [y, ..]) => v.y = *y,
            (VectorKind::Z, [z, ..]) => v.z = *z,
            (VectorKind::Xyz, [x, y, z, ..]) => v = Vec3::new(*x, *y, *z),
            _ => {}
        }
        v
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotationKind {
    X,
    Y,
    Z,
    #[default]
    Axis,
    Quaternion,
}

impl RotationKind {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "x" => Some(RotationKind::X),
            "y" => Some(RotationKind::Y),
            "z" => Some(RotationKind::Z),
            "axis" => Some(RotationKind::Axis),
            "quaternion" => Some(RotationKind::Quaternion),
            _ => None,
        }
    }

    pub fn array_size(self) -> u32 {
        match self {
            RotationKind::Axis | RotationKind::Quaternion => 4,
            _ => 0,
        }
    }
}

/// Raw matrices, one per subarray. The first one is the current transform.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transform {
    pub object: bool,
    pub array_size: u32,
    pub transforms: Vec<Mat4>,
}

impl Transform {
    pub fn matrix(&self) -> Mat4 {
        self.transforms.first().copied().unwrap_or(Mat4::IDENTITY)
    }

    pub(crate) fn animate(&mut self, values: &[f32]) {
        if let Some(m) = Mat4::from_column_array(values) {
            match self.transforms.first_mut() {
                Some(first) => *first = m,
                None => self.transforms.push(m),
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Translation {
    pub object: bool,
    pub kind: VectorKind,
    pub translation: Vec3,
}

impl Translation {
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(self.translation)
    }

    pub(crate) fn animate(&mut self, values: &[f32]) {
        self.translation = self.kind.expand(values, 0.0);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rotation {
    pub object: bool,
    pub kind: RotationKind,
    pub rotation: Mat4,
}

impl Default for Rotation {
    fn default() -> Self {
        Self {
            object: false,
            kind: RotationKind::Axis,
            rotation: Mat4::IDENTITY,
        }
    }
}

impl Rotation {
    pub fn matrix(&self) -> Mat4 {
        self.rotation
    }

    /// Angles are multiplied by `angle_scale`; quaternions are stored x, y, z, w.
    pub(crate) fn animate(&mut self, values: &[f32], angle_scale: f32) {
        self.rotation = match (self.kind, values) {
            (RotationKind::X, [angle, ..]) => Mat4::from_rotation_x(angle * angle_scale),
            (RotationKind::Y, [angle, ..]) => Mat4::from_rotation_y(angle * angle_scale),
            (RotationKind::Z, [angle, ..]) => Mat4::from_rotation_z(angle * angle_scale),
            (RotationKind::Axis, [angle, x, y, z, ..]) => {
                rotation_about_axis(angle * angle_scale, Vec3::new(*x, *y, *z))
            }
            (RotationKind::Quaternion, [x, y, z, w, ..]) => {
                let q = Quat::from_xyzw(*x, *y, *z, *w);
                if q.length_squared() > 0.0 {
                    Mat4::from_quat(q.normalize())
                } else {
                    Mat4::IDENTITY
                }
            }
            _ => return,
        };
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scale {
    pub object: bool,
    pub kind: VectorKind,
    pub scale: Vec3,
}

impl Default for Scale {
    fn default() -> Self {
        Self {
            object: false,
            kind: VectorKind::Xyz,
            scale: Vec3::ONE,
        }
    }
}

impl Scale {
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale(self.scale)
    }

    pub(crate) fn animate(&mut self, values: &[f32]) {
        self.scale = self.kind.expand(values, 1.0);
    }
}

/// Weight of one morph target on a geometry node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MorphWeight {
    pub index: u32,
    pub weight: f32,
}

impl MorphWeight {
    pub(crate) fn animate(&mut self, values: &[f32]) {
        if let Some(&w) = values.first() {
            self.weight = w;
        }
    }
}

fn object_flag(name: &str, value: &Value, object: &mut bool) -> bool {
    if name == "object" {
        match value.as_bool() {
            Some(b) => *object = b,
            None => return false,
        }
    }
    true
}

fn transform_property(name: &str, with_kind: bool) -> Option<DataType> {
    match name {
        "object" => Some(DataType::Bool),
        "kind" if with_kind => Some(DataType::String),
        _ => None,
    }
}

impl StructureRules for Transform {
    fn property_type(&self, name: &str) -> Option<DataType> {
        transform_property(name, false)
    }

    fn set_property(&mut self, name: &str, value: &Value) -> bool {
        object_flag(name, value, &mut self.object)
    }

    fn allows(&self, child: &GexStructure) -> bool {
        is_float_primitive(child)
    }
}

impl StructureRules for Translation {
    fn property_type(&self, name: &str) -> Option<DataType> {
        transform_property(name, true)
    }

    fn set_property(&mut self, name: &str, value: &Value) -> bool {
        object_flag(name, value, &mut self.object)
    }

    fn allows(&self, child: &GexStructure) -> bool {
        is_float_primitive(child)
    }
}

impl StructureRules for Rotation {
    fn property_type(&self, name: &str) -> Option<DataType> {
        transform_property(name, true)
    }

    fn set_property(&mut self, name: &str, value: &Value) -> bool {
        object_flag(name, value, &mut self.object)
    }

    fn allows(&self, child: &GexStructure) -> bool {
        is_float_primitive(child)
    }
}

impl StructureRules for Scale {
    fn property_type(&self, name: &str) -> Option<DataType> {
        transform_property(name, true)
    }

    fn set_property(&mut self, name: &str, value: &Value) -> bool {
        object_flag(name, value, &mut self.object)
    }

    fn allows(&self, child: &GexStructure) -> bool {
        is_float_primitive(child)
    }
}

impl StructureRules for MorphWeight {
    fn property_type(&self, name: &str) -> Option<DataType> {
        (name == "index").then_some(DataType::UInt32)
    }

    fn set_property(&mut self, name: &str, value: &Value) -> bool {
        if name == "index" {
            match value.as_u32() {
                Some(index) => self.index = index,
                None => return false,
            }
        }
        true
    }

    fn allows(&self, child: &GexStructure) -> bool {
        is_float_primitive(child)
    }
}

/// Float data whose layout matches `array_size` with exactly one element.
fn single_element(description: &GexDescription, id: NodeId, array_size: u32) -> GexResult<Vec<f32>> {
    let (data, size) = float_data(description, id)?;
    if size != array_size || data.len() != array_size.max(1) as usize {
        return Err(StructureError::InvalidDataFormat.into());
    }
    Ok(data)
}

pub(crate) fn process_transform(description: &mut GexDescription, id: NodeId) -> GexResult<()> {
    let (data, array_size) = float_data(description, id)?;
    if !matches!(array_size, 16 | 12 | 9 | 6 | 4) || data.is_empty() {
        return Err(StructureError::InvalidDataFormat.into());
    }
    let transforms: Vec<Mat4> = data
        .chunks_exact(array_size as usize)
        .filter_map(Mat4::from_column_array)
        .collect();

    let transform = payload_mut(description, id, |k| match k {
        GexKind::Transform(t) => Some(t),
        _ => None,
    })?;
    transform.array_size = array_size;
    transform.transforms = transforms;
    Ok(())
}

pub(crate) fn process_translation(description: &mut GexDescription, id: NodeId) -> GexResult<()> {
    let kind = VectorKind::from_name(string_property(description, id, "kind").unwrap_or("xyz"))
        .ok_or(GexError::InvalidTranslationKind)?;
    let data = single_element(description, id, kind.array_size())?;

    let translation = payload_mut(description, id, |k| match k {
        GexKind::Translation(t) => Some(t),
        _ => None,
    })?;
    translation.kind = kind;
    translation.animate(&data);
    Ok(())
}

pub(crate) fn process_rotation(description: &mut GexDescription, id: NodeId) -> GexResult<()> {
    let kind = RotationKind::from_name(string_property(description, id, "kind").unwrap_or("axis"))
        .ok_or(GexError::InvalidRotationKind)?;
    let data = single_element(description, id, kind.array_size())?;
    let angle_scale = description.grammar().metrics.angle_scale;

    let rotation = payload_mut(description, id, |k| match k {
        GexKind::Rotation(r) => Some(r),
        _ => None,
    })?;
    rotation.kind = kind;
    rotation.animate(&data, angle_scale);
    Ok(())
}

pub(crate) fn process_scale(description: &mut GexDescription, id: NodeId) -> GexResult<()> {
    let kind = VectorKind::from_name(string_property(description, id, "kind").unwrap_or("xyz"))
        .ok_or(GexError::InvalidScaleKind)?;
    let data = single_element(description, id, kind.array_size())?;

    let scale = payload_mut(description, id, |k| match k {
        GexKind::Scale(s) => Some(s),
        _ => None,
    })?;
    scale.kind = kind;
    scale.animate(&data);
    Ok(())
}

pub(crate) fn process_morph_weight(description: &mut GexDescription, id: NodeId) -> GexResult<()> {
    let data = single_element(description, id, 0)?;
    let weight = payload_mut(description, id, |k| match k {
        GexKind::MorphWeight(w) => Some(w),
        _ => None,
    })?;
    weight.animate(&data);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_kind_fills_unnamed_components() {
        assert_eq!(VectorKind::Y.expand(&[2.0], 1.0), Vec3::new(1.0, 2.0, 1.0));
        assert_eq!(VectorKind::Xyz.expand(&[1.0, 2.0, 3.0], 0.0), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_rotation_scales_angles() {
        let mut rotation = Rotation {
            kind: RotationKind::Z,
            ..Default::default()
        };
        rotation.animate(&[90.0], std::f32::consts::PI / 180.0);
        let v = rotation.matrix().transform_vector3(Vec3::X);
        assert!(v.abs_diff_eq(Vec3::Y, 1e-6));
    }

    #[test]
    fn test_quaternion_order_is_xyzw() {
        let mut rotation = Rotation {
            kind: RotationKind::Quaternion,
            ..Default::default()
        };
        let half = std::f32::consts::FRAC_1_SQRT_2;
        rotation.animate(&[0.0, 0.0, half, half], 1.0);
        let v = rotation.matrix().transform_vector3(Vec3::X);
        assert!(v.abs_diff_eq(Vec3::Y, 1e-6));

        rotation.animate(&[0.0; 4], 1.0);
        assert_eq!(rotation.matrix(), Mat4::IDENTITY);
    }
}
