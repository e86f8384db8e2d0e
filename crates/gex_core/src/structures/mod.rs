//! Scene structure kinds.
//!
//! Every identifier the scene grammar knows maps to one [`GexKind`] arm.
//! Each arm's payload implements [`StructureRules`] for the build pass and
//! has a `process` function for the second pass; both are dispatched by
//! matching on the arm.

mod geometry;
mod material;
mod metric;
mod node;
mod object;
mod skin;
mod track;
mod transform;

use gex_ddl::{DataType, Description, NodeId, Primitive, Structure, StructureError, StructureRef, Value};

use crate::error::GexResult;
use crate::grammar::OpenGex;

pub use geometry::{FrontFace, GeometryObject, IndexArray, Mesh, Morph, VertexArray};
pub use material::{Attributes, Color, Material, Param, Spectrum, Texture};
pub use metric::Metric;
pub use node::{CameraNode, GeometryNode, LightNode, MaterialRef, Name, Node, NodeTransforms, ObjectRef};
pub use object::{Atten, AttenCurve, AttenKind, CameraObject, LightObject, LightType};
pub use skin::{BoneCountArray, BoneIndexArray, BoneRefArray, BoneWeightArray, Skeleton, Skin};
pub use track::{Animation, Clip, Curve, CurveType, Key, KeyKind, Track};
pub use transform::{MorphWeight, Rotation, RotationKind, Scale, Transform, Translation, VectorKind};

pub(crate) use node::update_node_transforms;
pub(crate) use material::texcoord_transform;
pub(crate) use track::animation_time_range;

/// Parsed scene document.
pub type GexDescription = Description<OpenGex>;

/// One structure of a scene document.
pub type GexStructure = Structure<GexKind>;

/// Build-pass rules of one structure kind.
pub trait StructureRules {
    /// Declared type of property `name`, or `None` if the kind has none.
    fn property_type(&self, _name: &str) -> Option<DataType> {
        None
    }

    /// Store a declared property. Enumerated string properties are left in
    /// the property map and checked while processing.
    fn set_property(&mut self, _name: &str, _value: &Value) -> bool {
        true
    }

    /// Whether `child` may appear inside this structure.
    fn allows(&self, child: &GexStructure) -> bool;
}

/// Every recognized scene structure, with its typed payload.
#[derive(Debug, Clone, PartialEq)]
pub enum GexKind {
    Metric(Metric),
    Name(Name),
    ObjectRef(ObjectRef),
    MaterialRef(MaterialRef),
    Transform(Transform),
    Translation(Translation),
    Rotation(Rotation),
    Scale(Scale),
    MorphWeight(MorphWeight),
    Node(Node),
    BoneNode(Node),
    GeometryNode(GeometryNode),
    LightNode(LightNode),
    CameraNode(CameraNode),
    VertexArray(VertexArray),
    IndexArray(IndexArray),
    BoneRefArray(BoneRefArray),
    BoneCountArray(BoneCountArray),
    BoneIndexArray(BoneIndexArray),
    BoneWeightArray(BoneWeightArray),
    Skeleton(Skeleton),
    Skin(Skin),
    Morph(Morph),
    Mesh(Mesh),
    GeometryObject(GeometryObject),
    LightObject(LightObject),
    CameraObject(CameraObject),
    Param(Param),
    Color(Color),
    Spectrum(Spectrum),
    Texture(Texture),
    Atten(Atten),
    Material(Material),
    Key(Key),
    Time(Curve),
    Value(Curve),
    Track(Track),
    Animation(Animation),
    Clip(Clip),
}

macro_rules! dispatch {
    ($self:expr, $v:ident => $body:expr) => {
        match $self {
            GexKind::Metric($v) => $body,
            GexKind::Name($v) => $body,
            GexKind::ObjectRef($v) => $body,
            GexKind::MaterialRef($v) => $body,
            GexKind::Transform($v) => $body,
            GexKind::Translation($v) => $body,
            GexKind::Rotation($v) => $body,
            GexKind::Scale($v) => $body,
            GexKind::MorphWeight($v) => $body,
            GexKind::Node($v) => $body,
            GexKind::BoneNode($v) => $body,
            GexKind::GeometryNode($v) => $body,
            GexKind::LightNode($v) => $body,
            GexKind::CameraNode($v) => $body,
            GexKind::VertexArray($v) => $body,
            GexKind::IndexArray($v) => $body,
            GexKind::BoneRefArray($v) => $body,
            GexKind::BoneCountArray($v) => $body,
            GexKind::BoneIndexArray($v) => $body,
            GexKind::BoneWeightArray($v) => $body,
            GexKind::Skeleton($v) => $body,
            GexKind::Skin($v) => $body,
            GexKind::Morph($v) => $body,
            GexKind::Mesh($v) => $body,
            GexKind::GeometryObject($v) => $body,
            GexKind::LightObject($v) => $body,
            GexKind::CameraObject($v) => $body,
            GexKind::Param($v) => $body,
            GexKind::Color($v) => $body,
            GexKind::Spectrum($v) => $body,
            GexKind::Texture($v) => $body,
            GexKind::Atten($v) => $body,
            GexKind::Material($v) => $body,
            GexKind::Key($v) => $body,
            GexKind::Time($v) => $body,
            GexKind::Value($v) => $body,
            GexKind::Track($v) => $body,
            GexKind::Animation($v) => $body,
            GexKind::Clip($v) => $body,
        }
    };
}

impl GexKind {
    /// Empty payload for a structure identifier.
    pub fn from_identifier(identifier: &str) -> Option<Self> {
        let kind = match identifier {
            "Metric" => GexKind::Metric(Metric::default()),
            "Name" => GexKind::Name(Name::default()),
            "ObjectRef" => GexKind::ObjectRef(ObjectRef::default()),
            "MaterialRef" => GexKind::MaterialRef(MaterialRef::default()),
            "Transform" => GexKind::Transform(Transform::default()),
            "Translation" => GexKind::Translation(Translation::default()),
            "Rotation" => GexKind::Rotation(Rotation::default()),
            "Scale" => GexKind::Scale(Scale::default()),
            "MorphWeight" => GexKind::MorphWeight(MorphWeight::default()),
            "Node" => GexKind::Node(Node::default()),
            "BoneNode" => GexKind::BoneNode(Node::default()),
            "GeometryNode" => GexKind::GeometryNode(GeometryNode::default()),
            "LightNode" => GexKind::LightNode(LightNode::default()),
            "CameraNode" => GexKind::CameraNode(CameraNode::default()),
            "VertexArray" => GexKind::VertexArray(VertexArray::default()),
            "IndexArray" => GexKind::IndexArray(IndexArray::default()),
            "BoneRefArray" => GexKind::BoneRefArray(BoneRefArray::default()),
            "BoneCountArray" => GexKind::BoneCountArray(BoneCountArray::default()),
            "BoneIndexArray" => GexKind::BoneIndexArray(BoneIndexArray::default()),
            "BoneWeightArray" => GexKind::BoneWeightArray(BoneWeightArray::default()),
            "Skeleton" => GexKind::Skeleton(Skeleton::default()),
            "Skin" => GexKind::Skin(Skin::default()),
            "Morph" => GexKind::Morph(Morph::default()),
            "Mesh" => GexKind::Mesh(Mesh::default()),
            "GeometryObject" => GexKind::GeometryObject(GeometryObject::default()),
            "LightObject" => GexKind::LightObject(LightObject::default()),
            "CameraObject" => GexKind::CameraObject(CameraObject::default()),
            "Param" => GexKind::Param(Param::default()),
            "Color" => GexKind::Color(Color::default()),
            "Spectrum" => GexKind::Spectrum(Spectrum::default()),
            "Texture" => GexKind::Texture(Texture::default()),
            "Atten" => GexKind::Atten(Atten::default()),
            "Material" => GexKind::Material(Material::default()),
            "Key" => GexKind::Key(Key::default()),
            "Time" => GexKind::Time(Curve::default()),
            "Value" => GexKind::Value(Curve::default()),
            "Track" => GexKind::Track(Track::default()),
            "Animation" => GexKind::Animation(Animation::default()),
            "Clip" => GexKind::Clip(Clip::default()),
            _ => return None,
        };
        Some(kind)
    }

    /// Whether this kind may appear at the top level of a document.
    pub fn is_top_level(&self) -> bool {
        self.is_node()
            || self.is_object()
            || matches!(self, GexKind::Metric(_) | GexKind::Material(_) | GexKind::Clip(_))
    }

    pub fn is_node(&self) -> bool {
        self.node().is_some()
    }

    pub fn is_object(&self) -> bool {
        matches!(
            self,
            GexKind::GeometryObject(_) | GexKind::LightObject(_) | GexKind::CameraObject(_)
        )
    }

    /// Transform, Translation, Rotation or Scale.
    pub fn is_matrix(&self) -> bool {
        self.matrix().is_some()
    }

    /// Whether a Track may target this structure.
    pub fn is_animatable(&self) -> bool {
        self.is_matrix() || matches!(self, GexKind::MorphWeight(_))
    }

    /// Object flag and current matrix of a transform-producing structure.
    pub fn matrix(&self) -> Option<(bool, gex_math::Mat4)> {
        match self {
            GexKind::Transform(t) => Some((t.object, t.matrix())),
            GexKind::Translation(t) => Some((t.object, t.matrix())),
            GexKind::Rotation(r) => Some((r.object, r.matrix())),
            GexKind::Scale(s) => Some((s.object, s.matrix())),
            _ => None,
        }
    }

    /// Shared node payload of any node kind.
    pub fn node(&self) -> Option<&Node> {
        match self {
            GexKind::Node(n) | GexKind::BoneNode(n) => Some(n),
            GexKind::GeometryNode(g) => Some(&g.node),
            GexKind::LightNode(l) => Some(&l.node),
            GexKind::CameraNode(c) => Some(&c.node),
            _ => None,
        }
    }

    pub fn node_mut(&mut self) -> Option<&mut Node> {
        match self {
            GexKind::Node(n) | GexKind::BoneNode(n) => Some(n),
            GexKind::GeometryNode(g) => Some(&mut g.node),
            GexKind::LightNode(l) => Some(&mut l.node),
            GexKind::CameraNode(c) => Some(&mut c.node),
            _ => None,
        }
    }

    /// Write animated values into an animatable structure.
    pub fn animate(&mut self, values: &[f32], angle_scale: f32) {
        match self {
            GexKind::Transform(t) => t.animate(values),
            GexKind::Translation(t) => t.animate(values),
            GexKind::Rotation(r) => r.animate(values, angle_scale),
            GexKind::Scale(s) => s.animate(values),
            GexKind::MorphWeight(w) => w.animate(values),
            _ => {}
        }
    }
}

impl StructureRules for GexKind {
    fn property_type(&self, name: &str) -> Option<DataType> {
        dispatch!(self, s => s.property_type(name))
    }

    fn set_property(&mut self, name: &str, value: &Value) -> bool {
        dispatch!(self, s => s.set_property(name, value))
    }

    fn allows(&self, child: &GexStructure) -> bool {
        dispatch!(self, s => s.allows(child))
    }
}

/// Run the second-pass rules of structure `id`.
pub(crate) fn process(description: &mut GexDescription, id: NodeId) -> GexResult<()> {
    let process: fn(&mut GexDescription, NodeId) -> GexResult<()> = match description.kind(id) {
        Some(GexKind::Metric(_)) => metric::process_metric,
        Some(GexKind::Name(_)) => node::process_name,
        Some(GexKind::ObjectRef(_)) => node::process_object_ref,
        Some(GexKind::MaterialRef(_)) => node::process_material_ref,
        Some(GexKind::Transform(_)) => transform::process_transform,
        Some(GexKind::Translation(_)) => transform::process_translation,
        Some(GexKind::Rotation(_)) => transform::process_rotation,
        Some(GexKind::Scale(_)) => transform::process_scale,
        Some(GexKind::MorphWeight(_)) => transform::process_morph_weight,
        Some(GexKind::Node(_)) | Some(GexKind::BoneNode(_)) => node::process_node,
        Some(GexKind::GeometryNode(_)) => node::process_geometry_node,
        Some(GexKind::LightNode(_)) => node::process_light_node,
        Some(GexKind::CameraNode(_)) => node::process_camera_node,
        Some(GexKind::VertexArray(_)) => geometry::process_vertex_array,
        Some(GexKind::IndexArray(_)) => geometry::process_index_array,
        Some(GexKind::BoneRefArray(_)) => skin::process_bone_ref_array,
        Some(GexKind::BoneCountArray(_)) => skin::process_bone_count_array,
        Some(GexKind::BoneIndexArray(_)) => skin::process_bone_index_array,
        Some(GexKind::BoneWeightArray(_)) => skin::process_bone_weight_array,
        Some(GexKind::Skeleton(_)) => skin::process_skeleton,
        Some(GexKind::Skin(_)) => skin::process_skin,
        Some(GexKind::Morph(_)) => geometry::process_morph,
        Some(GexKind::Mesh(_)) => geometry::process_mesh,
        Some(GexKind::GeometryObject(_)) => geometry::process_geometry_object,
        Some(GexKind::LightObject(_)) => object::process_light_object,
        Some(GexKind::CameraObject(_)) => object::process_camera_object,
        Some(GexKind::Param(_)) => material::process_param,
        Some(GexKind::Color(_)) => material::process_color,
        Some(GexKind::Spectrum(_)) => material::process_spectrum,
        Some(GexKind::Texture(_)) => material::process_texture,
        Some(GexKind::Atten(_)) => object::process_atten,
        Some(GexKind::Material(_)) => material::process_material,
        Some(GexKind::Key(_)) => track::process_key,
        Some(GexKind::Time(_)) => track::process_time,
        Some(GexKind::Value(_)) => track::process_value,
        Some(GexKind::Track(_)) => track::process_track,
        Some(GexKind::Animation(_)) => track::process_animation,
        Some(GexKind::Clip(_)) => track::process_clip,
        None => return Ok(()),
    };
    process(description, id)
}

// Child classification used by `allows`.

pub(crate) fn is_primitive_of(child: &GexStructure, accept: impl Fn(DataType) -> bool) -> bool {
    child.primitive().is_some_and(|p| accept(p.data_type()))
}

pub(crate) fn is_float_primitive(child: &GexStructure) -> bool {
    is_primitive_of(child, DataType::is_float)
}

pub(crate) fn is_kind(child: &GexStructure, accept: impl Fn(&GexKind) -> bool) -> bool {
    child.custom().is_some_and(accept)
}

// Second-pass helpers.

/// The only primitive child of `id`.
pub(crate) fn single_primitive(description: &GexDescription, id: NodeId) -> GexResult<&Primitive> {
    let mut primitives = description.primitives(id);
    let (_, first) = primitives.next().ok_or(StructureError::MissingSubstructure)?;
    if primitives.next().is_some() {
        return Err(StructureError::ExtraneousSubstructure.into());
    }
    Ok(first)
}

/// Flat float data of the only primitive child, converted to f32.
pub(crate) fn float_data(description: &GexDescription, id: NodeId) -> GexResult<(Vec<f32>, u32)> {
    let primitive = single_primitive(description, id)?;
    let data = primitive
        .data
        .to_f32_vec()
        .ok_or(StructureError::InvalidDataFormat)?;
    Ok((data, primitive.array_size))
}

/// A single float held by the only primitive child.
pub(crate) fn float_scalar(description: &GexDescription, id: NodeId) -> GexResult<f32> {
    match float_data(description, id)? {
        (data, 0) if data.len() == 1 => Ok(data[0]),
        _ => Err(StructureError::InvalidDataFormat.into()),
    }
}

/// A single string held by the only primitive child.
pub(crate) fn string_scalar(description: &GexDescription, id: NodeId) -> GexResult<String> {
    let primitive = single_primitive(description, id)?;
    match primitive.data.as_strings() {
        Some([s]) if primitive.array_size == 0 => Ok(s.clone()),
        _ => Err(StructureError::InvalidDataFormat.into()),
    }
}

/// A single reference held by the only primitive child.
pub(crate) fn reference_scalar(description: &GexDescription, id: NodeId) -> GexResult<StructureRef> {
    let primitive = single_primitive(description, id)?;
    match primitive.data.as_refs() {
        Some([r]) if primitive.array_size == 0 => Ok(r.clone()),
        _ => Err(StructureError::InvalidDataFormat.into()),
    }
}

/// Children of `id` whose kind passes `accept`, in document order.
pub(crate) fn children_where(
    description: &GexDescription,
    id: NodeId,
    accept: impl Fn(&GexKind) -> bool,
) -> Vec<NodeId> {
    description
        .custom_children(id)
        .filter(|(_, kind)| accept(kind))
        .map(|(child, _)| child)
        .collect()
}

/// At most one child passing `accept`.
pub(crate) fn optional_child(
    description: &GexDescription,
    id: NodeId,
    accept: impl Fn(&GexKind) -> bool,
) -> GexResult<Option<NodeId>> {
    match children_where(description, id, accept).as_slice() {
        [] => Ok(None),
        [child] => Ok(Some(*child)),
        _ => Err(StructureError::ExtraneousSubstructure.into()),
    }
}

/// Exactly one child passing `accept`.
pub(crate) fn required_child(
    description: &GexDescription,
    id: NodeId,
    accept: impl Fn(&GexKind) -> bool,
) -> GexResult<NodeId> {
    optional_child(description, id, accept)?.ok_or_else(|| StructureError::MissingSubstructure.into())
}

/// Name carried by the optional Name child.
pub(crate) fn child_name(description: &GexDescription, id: NodeId) -> GexResult<Option<String>> {
    let name = optional_child(description, id, |k| matches!(k, GexKind::Name(_)))?;
    Ok(name.and_then(|child| match description.kind(child) {
        Some(GexKind::Name(n)) => Some(n.name.clone()),
        _ => None,
    }))
}

/// String property left in the property map by the build pass.
pub(crate) fn string_property<'a>(description: &'a GexDescription, id: NodeId, name: &str) -> Option<&'a str> {
    description.structure(id).property(name).and_then(Value::as_str)
}

/// Payload of `id` when it has the kind `extract` expects.
pub(crate) fn payload_mut<T>(
    description: &mut GexDescription,
    id: NodeId,
    extract: impl FnOnce(&mut GexKind) -> Option<&mut T>,
) -> GexResult<&mut T> {
    description
        .kind_mut(id)
        .and_then(extract)
        .ok_or_else(|| StructureError::InvalidDataFormat.into())
}
