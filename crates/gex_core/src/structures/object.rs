//! Light and camera objects.

use gex_ddl::{DataType, NodeId, Value};

use super::material::Attributes;
use super::{
    children_where, is_kind, payload_mut, string_property, GexDescription, GexKind, GexStructure, StructureRules,
};
use crate::error::{GexError, GexResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LightType {
    Infinite,
    #[default]
    Point,
    Spot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LightObject {
    pub light_type: LightType,
    pub shadow: bool,
    pub attributes: Attributes,
    pub attenuations: Vec<NodeId>,
}

impl Default for LightObject {
    fn default() -> Self {
        Self {
            light_type: LightType::Point,
            shadow: true,
            attributes: Attributes::default(),
            attenuations: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CameraObject {
    pub attributes: Attributes,
    /// Vertical field of view in radians, when declared.
    pub fov: Option<f32>,
    /// Distance to a projection plane of height 2.
    pub projection_distance: f32,
    pub near_depth: f32,
    pub far_depth: f32,
}

impl Default for CameraObject {
    fn default() -> Self {
        Self {
            attributes: Attributes::default(),
            fov: None,
            projection_distance: 1.0,
            near_depth: 0.1,
            far_depth: 1000.0,
        }
    }
}

/// What an attenuation function takes as input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttenKind {
    #[default]
    Distance,
    Angle,
    CosAngle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttenCurve {
    #[default]
    Linear,
    Smooth,
    Inverse,
    InverseSquare,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Atten {
    pub kind: AttenKind,
    pub curve: AttenCurve,
    pub begin: f32,
    pub end: f32,
    pub scale: f32,
    pub offset: f32,
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
    pub power: f32,
}

impl Default for Atten {
    fn default() -> Self {
        Self {
            kind: AttenKind::Distance,
            curve: AttenCurve::Linear,
            begin: 0.0,
            end: 1.0,
            scale: 1.0,
            offset: 0.0,
            constant: 0.0,
            linear: 0.0,
            quadratic: 1.0,
            power: 1.0,
        }
    }
}

fn attribute_child(child: &GexStructure) -> bool {
    is_kind(child, |k| matches!(k, GexKind::Color(_) | GexKind::Param(_) | GexKind::Texture(_)))
}

impl StructureRules for LightObject {
    fn property_type(&self, name: &str) -> Option<DataType> {
        match name {
            "type" => Some(DataType::String),
            "shadow" => Some(DataType::Bool),
            _ => None,
        }
    }

    fn set_property(&mut self, name: &str, value: &Value) -> bool {
        if name == "shadow" {
            match value.as_bool() {
                Some(b) => self.shadow = b,
                None => return false,
            }
        }
        true
    }

    fn allows(&self, child: &GexStructure) -> bool {
        attribute_child(child) || is_kind(child, |k| matches!(k, GexKind::Atten(_)))
    }
}

impl StructureRules for CameraObject {
    fn allows(&self, child: &GexStructure) -> bool {
        attribute_child(child)
    }
}

impl StructureRules for Atten {
    fn property_type(&self, name: &str) -> Option<DataType> {
        matches!(name, "kind" | "curve").then_some(DataType::String)
    }

    fn allows(&self, child: &GexStructure) -> bool {
        is_kind(child, |k| matches!(k, GexKind::Param(_)))
    }
}

pub(crate) fn process_light_object(description: &mut GexDescription, id: NodeId) -> GexResult<()> {
    let light_type = match string_property(description, id, "type") {
        Some("infinite") => LightType::Infinite,
        Some("point") => LightType::Point,
        Some("spot") => LightType::Spot,
        _ => return Err(GexError::UndefinedLightType),
    };
    let attributes = Attributes::collect(description, id);
    let attenuations = children_where(description, id, |k| matches!(k, GexKind::Atten(_)));

    let light = payload_mut(description, id, |k| match k {
        GexKind::LightObject(l) => Some(l),
        _ => None,
    })?;
    light.light_type = light_type;
    light.attributes = attributes;
    light.attenuations = attenuations;
    Ok(())
}

pub(crate) fn process_camera_object(description: &mut GexDescription, id: NodeId) -> GexResult<()> {
    let attributes = Attributes::collect(description, id);
    let grammar = description.grammar();
    let (metrics, options) = (grammar.metrics, grammar.options);

    let mut camera = CameraObject::default();
    if let Some(fovy) = attributes.param("fovy") {
        let fov = fovy * metrics.angle_scale;
        let t = (fov * 0.5).tan();
        if t > f32::MIN_POSITIVE {
            camera.fov = Some(fov);
            camera.projection_distance = 1.0 / t;
        }
    }
    let length = metrics.length_scale(&options);
    if let Some(near) = attributes.param("near").filter(|&n| n > f32::MIN_POSITIVE) {
        camera.near_depth = near * length;
    }
    if let Some(far) = attributes.param("far").filter(|&f| f > f32::MIN_POSITIVE) {
        camera.far_depth = far * length;
    }
    camera.attributes = attributes;

    *payload_mut(description, id, |k| match k {
        GexKind::CameraObject(c) => Some(c),
        _ => None,
    })? = camera;
    Ok(())
}

pub(crate) fn process_atten(description: &mut GexDescription, id: NodeId) -> GexResult<()> {
    let kind = match string_property(description, id, "kind").unwrap_or("distance") {
        "distance" => AttenKind::Distance,
        "angle" => AttenKind::Angle,
        "cos_angle" => AttenKind::CosAngle,
        _ => return Err(GexError::UndefinedAtten),
    };
    let curve = match string_property(description, id, "curve").unwrap_or("linear") {
        "linear" => AttenCurve::Linear,
        "smooth" => AttenCurve::Smooth,
        "inverse" => AttenCurve::Inverse,
        "inverse_square" => AttenCurve::InverseSquare,
        _ => return Err(GexError::UndefinedCurve),
    };

    let grammar = description.grammar();
    let scale = match kind {
        AttenKind::Distance => grammar.metrics.length_scale(&grammar.options),
        AttenKind::Angle => grammar.metrics.angle_scale,
        AttenKind::CosAngle => 1.0,
    };

    let mut atten = Atten {
        kind,
        curve,
        ..Default::default()
    };
    if curve == AttenCurve::Inverse {
        atten.linear = 1.0;
    }

    let params = Attributes::collect(description, id).params;
    for (attrib, &value) in &params {
        match attrib.as_str() {
            "begin" => atten.begin = value * scale,
            "end" => atten.end = value * scale,
            "scale" => atten.scale = value * scale,
            "offset" => atten.offset = value,
            "constant" => atten.constant = value,
            "linear" => atten.linear = value,
            "quadratic" => atten.quadratic = value,
            "power" => atten.power = value,
            _ => log::debug!("Ignoring Atten param \"{}\"", attrib),
        }
    }

    *payload_mut(description, id, |k| match k {
        GexKind::Atten(a) => Some(a),
        _ => None,
    })? = atten;
    Ok(())
}
