//! Materials and the attribute structures shared with lights and cameras.

use gex_ddl::{DataType, NodeId, StructureError, Value};
use gex_math::{Mat4, Vec4};
use indexmap::IndexMap;

use super::{
    child_name, float_data, float_scalar, is_float_primitive, is_kind, is_primitive_of, payload_mut,
    string_scalar, GexDescription, GexKind, GexStructure, StructureRules,
};
use crate::error::GexResult;

/// Scalar parameter keyed by `attrib`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Param {
    pub attrib: String,
    pub value: f32,
}

/// RGBA color keyed by `attrib`. Three-component data gets alpha 1.
#[derive(Debug, Clone, PartialEq)]
pub struct Color {
    pub attrib: String,
    pub color: Vec4,
}

impl Default for Color {
    fn default() -> Self {
        Self {
            attrib: String::new(),
            color: Vec4::ONE,
        }
    }
}

/// Sampled spectrum between `min` and `max` nanometers.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    pub attrib: String,
    pub min: u32,
    pub max: u32,
    pub samples: Vec<f32>,
}

impl Default for Spectrum {
    fn default() -> Self {
        Self {
            attrib: String::new(),
            min: 380,
            max: 750,
            samples: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    pub attrib: String,
    pub texcoord: u32,
    pub swizzle: String,
    pub x_address: String,
    pub y_address: String,
    pub z_address: String,
    pub border: String,
    pub file_name: String,
    /// Product of the texture's transform children.
    pub texcoord_transform: Mat4,
}

impl Default for Texture {
    fn default() -> Self {
        Self {
            attrib: String::new(),
            texcoord: 0,
            swizzle: "rgba".to_string(),
            x_address: "repeat".to_string(),
            y_address: "repeat".to_string(),
            z_address: "repeat".to_string(),
            border: "zero".to_string(),
            file_name: String::new(),
            texcoord_transform: Mat4::IDENTITY,
        }
    }
}

/// Colors, params, spectra and textures of one structure, keyed by attrib
/// in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    pub colors: IndexMap<String, Vec4>,
    pub params: IndexMap<String, f32>,
    pub spectra: IndexMap<String, NodeId>,
    pub textures: IndexMap<String, NodeId>,
}

impl Attributes {
    pub(crate) fn collect(description: &GexDescription, id: NodeId) -> Self {
        let mut attributes = Self::default();
        for (child, kind) in description.custom_children(id) {
            match kind {
                GexKind::Color(c) => {
                    attributes.colors.insert(c.attrib.clone(), c.color);
                }
                GexKind::Param(p) => {
                    attributes.params.insert(p.attrib.clone(), p.value);
                }
                GexKind::Spectrum(s) => {
                    attributes.spectra.insert(s.attrib.clone(), child);
                }
                GexKind::Texture(t) => {
                    attributes.textures.insert(t.attrib.clone(), child);
                }
                _ => {}
            }
        }
        attributes
    }

    pub fn color(&self, attrib: &str) -> Option<Vec4> {
        self.colors.get(attrib).copied()
    }

    pub fn param(&self, attrib: &str) -> Option<f32> {
        self.params.get(attrib).copied()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Material {
    pub two_sided: bool,
    pub name: Option<String>,
    pub attributes: Attributes,
}

fn attrib_property(name: &str, value: &Value, attrib: &mut String) -> bool {
    if name == "attrib" {
        match value.as_str() {
            Some(s) => *attrib = s.to_string(),
            None => return false,
        }
    }
    true
}

impl StructureRules for Param {
    fn property_type(&self, name: &str) -> Option<DataType> {
        (name == "attrib").then_some(DataType::String)
    }

    fn set_property(&mut self, name: &str, value: &Value) -> bool {
        attrib_property(name, value, &mut self.attrib)
    }

    fn allows(&self, child: &GexStructure) -> bool {
        is_float_primitive(child)
    }
}

impl StructureRules for Color {
    fn property_type(&self, name: &str) -> Option<DataType> {
        (name == "attrib").then_some(DataType::String)
    }

    fn set_property(&mut self, name: &str, value: &Value) -> bool {
        attrib_property(name, value, &mut self.attrib)
    }

    fn allows(&self, child: &GexStructure) -> bool {
        is_float_primitive(child)
    }
}

impl StructureRules for Spectrum {
    fn property_type(&self, name: &str) -> Option<DataType> {
        match name {
            "attrib" => Some(DataType::String),
            "min" | "max" => Some(DataType::UInt32),
            _ => None,
        }
    }

    fn set_property(&mut self, name: &str, value: &Value) -> bool {
        let slot = match name {
            "min" => &mut self.min,
            "max" => &mut self.max,
            _ => return attrib_property(name, value, &mut self.attrib),
        };
        match value.as_u32() {
            Some(v) => {
                *slot = v;
                true
            }
            None => false,
        }
    }

    fn allows(&self, child: &GexStructure) -> bool {
        is_float_primitive(child)
    }
}

impl StructureRules for Texture {
    fn property_type(&self, name: &str) -> Option<DataType> {
        match name {
            "texcoord" => Some(DataType::UInt32),
            "attrib" | "swizzle" | "x_address" | "y_address" | "z_address" | "border" => Some(DataType::String),
            _ => None,
        }
    }

    fn set_property(&mut self, name: &str, value: &Value) -> bool {
        if name == "texcoord" {
            return match value.as_u32() {
                Some(v) => {
                    self.texcoord = v;
                    true
                }
                None => false,
            };
        }
        let slot = match name {
            "attrib" => &mut self.attrib,
            "swizzle" => &mut self.swizzle,
            "x_address" => &mut self.x_address,
            "y_address" => &mut self.y_address,
            "z_address" => &mut self.z_address,
            "border" => &mut self.border,
            _ => return true,
        };
        match value.as_str() {
            Some(s) => {
                *slot = s.to_string();
                true
            }
            None => false,
        }
    }

    fn allows(&self, child: &GexStructure) -> bool {
        is_primitive_of(child, |ty| ty == DataType::String)
            || is_kind(child, |k| k.is_matrix() || matches!(k, GexKind::Animation(_)))
    }
}

impl StructureRules for Material {
    fn property_type(&self, name: &str) -> Option<DataType> {
        (name == "two_sided").then_some(DataType::Bool)
    }

    fn set_property(&mut self, name: &str, value: &Value) -> bool {
        if name == "two_sided" {
            match value.as_bool() {
                Some(b) => self.two_sided = b,
                None => return false,
            }
        }
        true
    }

    fn allows(&self, child: &GexStructure) -> bool {
        is_kind(child, |k| {
            matches!(
                k,
                GexKind::Name(_) | GexKind::Color(_) | GexKind::Param(_) | GexKind::Spectrum(_) | GexKind::Texture(_)
            )
        })
    }
}

pub(crate) fn process_param(description: &mut GexDescription, id: NodeId) -> GexResult<()> {
    let value = float_scalar(description, id)?;
    payload_mut(description, id, |k| match k {
        GexKind::Param(p) => Some(p),
        _ => None,
    })?
    .value = value;
    Ok(())
}

pub(crate) fn process_color(description: &mut GexDescription, id: NodeId) -> GexResult<()> {
    let color = match float_data(description, id)? {
        (data, 3) if data.len() == 3 => Vec4::new(data[0], data[1], data[2], 1.0),
        (data, 4) if data.len() == 4 => Vec4::from_slice(&data),
        _ => return Err(StructureError::InvalidDataFormat.into()),
    };
    payload_mut(description, id, |k| match k {
        GexKind::Color(c) => Some(c),
        _ => None,
    })?
    .color = color;
    Ok(())
}

pub(crate) fn process_spectrum(description: &mut GexDescription, id: NodeId) -> GexResult<()> {
    let (samples, array_size) = float_data(description, id)?;
    let spectrum = payload_mut(description, id, |k| match k {
        GexKind::Spectrum(s) => Some(s),
        _ => None,
    })?;
    if array_size != 0 || samples.is_empty() || spectrum.min >= spectrum.max {
        return Err(StructureError::InvalidDataFormat.into());
    }
    spectrum.samples = samples;
    Ok(())
}

/// Product of the transform children of `id`, left to right.
pub(crate) fn texcoord_transform(description: &GexDescription, id: NodeId) -> Mat4 {
    description
        .custom_children(id)
        .filter_map(|(_, kind)| kind.matrix())
        .fold(Mat4::IDENTITY, |acc, (_, m)| acc * m)
}

pub(crate) fn process_texture(description: &mut GexDescription, id: NodeId) -> GexResult<()> {
    let file_name = string_scalar(description, id)?;
    let transform = texcoord_transform(description, id);
    let texture = payload_mut(description, id, |k| match k {
        GexKind::Texture(t) => Some(t),
        _ => None,
    })?;
    texture.file_name = file_name;
    texture.texcoord_transform = transform;
    Ok(())
}

pub(crate) fn process_material(description: &mut GexDescription, id: NodeId) -> GexResult<()> {
    let name = child_name(description, id)?;
    let attributes = Attributes::collect(description, id);
    let material = payload_mut(description, id, |k| match k {
        GexKind::Material(m) => Some(m),
        _ => None,
    })?;
    material.name = name;
    material.attributes = attributes;
    Ok(())
}
