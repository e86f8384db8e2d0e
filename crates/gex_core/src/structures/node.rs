//! Nodes, names and object/material references.

use std::collections::BTreeMap;

use gex_ddl::{DataType, NodeId, StructureError, Value};
use gex_math::Mat4;

use super::{
    children_where, child_name, is_kind, is_primitive_of, optional_child, payload_mut, reference_scalar,
    string_scalar, GexDescription, GexKind, GexStructure, StructureRules,
};
use crate::error::{GexError, GexResult};

/// Text of a `Name` structure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Name {
    pub name: String,
}

/// Target of an `ObjectRef`, `None` for `null`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectRef {
    pub target: Option<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialRef {
    pub index: u32,
    pub target: Option<NodeId>,
}

/// Cached transforms of a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeTransforms {
    /// Product of the node's own transform children.
    pub node: Mat4,
    /// Product of the children flagged `object`, baked into the attached object.
    pub object: Mat4,
    pub inverse_object: Mat4,
    /// Node transform composed with every ancestor's.
    pub world: Mat4,
}

impl Default for NodeTransforms {
    fn default() -> Self {
        Self {
            node: Mat4::IDENTITY,
            object: Mat4::IDENTITY,
            inverse_object: Mat4::IDENTITY,
            world: Mat4::IDENTITY,
        }
    }
}

/// Payload shared by every node kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node {
    pub name: Option<String>,
    pub transforms: NodeTransforms,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryNode {
    pub node: Node,
    pub visible: Option<bool>,
    pub shadow: Option<bool>,
    pub motion_blur: Option<bool>,
    /// The referenced GeometryObject.
    pub object: Option<NodeId>,
    /// Materials by index; index `i` is the material for index arrays
    /// declaring `material = i`.
    pub materials: Vec<NodeId>,
    pub morph_weights: Vec<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LightNode {
    pub node: Node,
    pub shadow: Option<bool>,
    pub object: Option<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CameraNode {
    pub node: Node,
    pub object: Option<NodeId>,
}

impl StructureRules for Name {
    fn allows(&self, child: &GexStructure) -> bool {
        is_primitive_of(child, |ty| ty == DataType::String)
    }
}

impl StructureRules for ObjectRef {
    fn allows(&self, child: &GexStructure) -> bool {
        is_primitive_of(child, |ty| ty == DataType::Ref)
    }
}

impl StructureRules for MaterialRef {
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
        is_primitive_of(child, |ty| ty == DataType::Ref)
    }
}

/// Children every node kind accepts.
fn node_child(child: &GexStructure) -> bool {
    is_kind(child, |k| {
        k.is_node() || k.is_matrix() || matches!(k, GexKind::Name(_) | GexKind::Animation(_))
    })
}

impl StructureRules for Node {
    fn allows(&self, child: &GexStructure) -> bool {
        node_child(child)
    }
}

impl StructureRules for GeometryNode {
    fn property_type(&self, name: &str) -> Option<DataType> {
        matches!(name, "visible" | "shadow" | "motion_blur").then_some(DataType::Bool)
    }

    fn set_property(&mut self, name: &str, value: &Value) -> bool {
        let slot = match name {
            "visible" => &mut self.visible,
            "shadow" => &mut self.shadow,
            "motion_blur" => &mut self.motion_blur,
            _ => return true,
        };
        *slot = value.as_bool();
        slot.is_some()
    }

    fn allows(&self, child: &GexStructure) -> bool {
        node_child(child)
            || is_kind(child, |k| {
                matches!(k, GexKind::ObjectRef(_) | GexKind::MaterialRef(_) | GexKind::MorphWeight(_))
            })
    }
}

impl StructureRules for LightNode {
    fn property_type(&self, name: &str) -> Option<DataType> {
        (name == "shadow").then_some(DataType::Bool)
    }

    fn set_property(&mut self, name: &str, value: &Value) -> bool {
        if name == "shadow" {
            self.shadow = value.as_bool();
            return self.shadow.is_some();
        }
        true
    }

    fn allows(&self, child: &GexStructure) -> bool {
        node_child(child) || is_kind(child, |k| matches!(k, GexKind::ObjectRef(_)))
    }
}

impl StructureRules for CameraNode {
    fn allows(&self, child: &GexStructure) -> bool {
        node_child(child) || is_kind(child, |k| matches!(k, GexKind::ObjectRef(_)))
    }
}

pub(crate) fn process_name(description: &mut GexDescription, id: NodeId) -> GexResult<()> {
    let text = string_scalar(description, id)?;
    payload_mut(description, id, |k| match k {
        GexKind::Name(n) => Some(n),
        _ => None,
    })?
    .name = text;
    Ok(())
}

pub(crate) fn process_object_ref(description: &mut GexDescription, id: NodeId) -> GexResult<()> {
    let reference = reference_scalar(description, id)?;
    let target = description.resolve(&reference, id)?;
    payload_mut(description, id, |k| match k {
        GexKind::ObjectRef(r) => Some(r),
        _ => None,
    })?
    .target = target;
    Ok(())
}

pub(crate) fn process_material_ref(description: &mut GexDescription, id: NodeId) -> GexResult<()> {
    let reference = reference_scalar(description, id)?;
    let target = description
        .resolve(&reference, id)?
        .filter(|&t| matches!(description.kind(t), Some(GexKind::Material(_))))
        .ok_or(GexError::InvalidMaterialRef)?;
    payload_mut(description, id, |k| match k {
        GexKind::MaterialRef(r) => Some(r),
        _ => None,
    })?
    .target = Some(target);
    Ok(())
}

pub(crate) fn process_node(description: &mut GexDescription, id: NodeId) -> GexResult<()> {
    let name = child_name(description, id)?;
    if let Some(node) = description.kind_mut(id).and_then(GexKind::node_mut) {
        node.name = name;
    }
    Ok(())
}

/// The single ObjectRef of a node, which must point at an object accepted
/// by `expected`.
fn node_object(
    description: &GexDescription,
    id: NodeId,
    expected: impl Fn(&GexKind) -> bool,
) -> GexResult<NodeId> {
    let object_ref = optional_child(description, id, |k| matches!(k, GexKind::ObjectRef(_)))?
        .ok_or(StructureError::MissingSubstructure)?;
    let target = match description.kind(object_ref) {
        Some(GexKind::ObjectRef(r)) => r.target,
        _ => None,
    };
    target
        .filter(|&t| description.kind(t).is_some_and(&expected))
        .ok_or(GexError::InvalidObjectRef)
}

pub(crate) fn process_geometry_node(description: &mut GexDescription, id: NodeId) -> GexResult<()> {
    process_node(description, id)?;
    let object = node_object(description, id, |k| matches!(k, GexKind::GeometryObject(_)))?;

    let mut by_index = BTreeMap::new();
    for (_, kind) in description.custom_children(id) {
        if let GexKind::MaterialRef(r) = kind {
            if r.index > 255 {
                return Err(GexError::MaterialIndexUnsupported);
            }
            let Some(target) = r.target else {
                return Err(GexError::InvalidMaterialRef);
            };
            if by_index.insert(r.index, target).is_some() {
                return Err(GexError::DuplicateMaterialRef);
            }
        }
    }
    if by_index.keys().enumerate().any(|(i, &index)| index as usize != i) {
        return Err(GexError::MissingMaterialRef);
    }
    let materials: Vec<NodeId> = by_index.into_values().collect();
    let morph_weights = children_where(description, id, |k| matches!(k, GexKind::MorphWeight(_)));

    let node = payload_mut(description, id, |k| match k {
        GexKind::GeometryNode(g) => Some(g),
        _ => None,
    })?;
    node.object = Some(object);
    node.materials = materials;
    node.morph_weights = morph_weights;
    Ok(())
}

pub(crate) fn process_light_node(description: &mut GexDescription, id: NodeId) -> GexResult<()> {
    process_node(description, id)?;
    let object = node_object(description, id, |k| matches!(k, GexKind::LightObject(_)))?;
    payload_mut(description, id, |k| match k {
        GexKind::LightNode(l) => Some(l),
        _ => None,
    })?
    .object = Some(object);
    Ok(())
}

pub(crate) fn process_camera_node(description: &mut GexDescription, id: NodeId) -> GexResult<()> {
    process_node(description, id)?;
    let object = node_object(description, id, |k| matches!(k, GexKind::CameraObject(_)))?;
    payload_mut(description, id, |k| match k {
        GexKind::CameraNode(c) => Some(c),
        _ => None,
    })?
    .object = Some(object);
    Ok(())
}

/// Recompute the transforms of `id` and its descendant nodes.
///
/// Each node multiplies its transform children left to right, split by
/// their `object` flag, normalizes both products for units and up axis,
/// then composes with `parent_world`.
pub(crate) fn update_node_transforms(description: &mut GexDescription, id: NodeId, parent_world: Mat4) {
    let grammar = description.grammar();
    let (metrics, options) = (grammar.metrics, grammar.options);

    let mut node = Mat4::IDENTITY;
    let mut object = Mat4::IDENTITY;
    for (_, kind) in description.custom_children(id) {
        match kind.matrix() {
            Some((true, m)) => object *= m,
            Some((false, m)) => node *= m,
            None => {}
        }
    }

    let node = metrics.adjust_transform(node, &options);
    let object = metrics.adjust_transform(object, &options);
    let world = parent_world * node;

    if let Some(n) = description.kind_mut(id).and_then(GexKind::node_mut) {
        n.transforms = NodeTransforms {
            node,
            object,
            inverse_object: object.inverse(),
            world,
        };
    }

    let children = children_where(description, id, GexKind::is_node);
    for child in children {
        update_node_transforms(description, child, world);
    }
}
