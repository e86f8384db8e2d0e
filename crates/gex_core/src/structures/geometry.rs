//! Geometry objects, meshes, vertex and index arrays, morph targets.

use std::collections::{BTreeMap, HashSet};

use gex_ddl::{DataType, NodeId, StructureError, Value};
use gex_math::{Chromaticities, Vec3};

use super::{
    child_name, children_where, float_data, is_float_primitive, is_kind, is_primitive_of, optional_child,
    payload_mut, single_primitive, string_property, GexDescription, GexKind, GexStructure, StructureRules,
};
use crate::error::{GexError, GexResult};

/// Per-vertex attribute data.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexArray {
    pub attrib: String,
    pub index: u32,
    /// Morph target the data belongs to, 0 for the base shape.
    pub morph: u32,
    /// Components per vertex.
    pub array_size: u32,
    pub data: Vec<f32>,
}

impl Default for VertexArray {
    fn default() -> Self {
        Self {
            attrib: "position".to_string(),
            index: 0,
            morph: 0,
            array_size: 0,
            data: Vec::new(),
        }
    }
}

impl VertexArray {
    pub fn vertex_count(&self) -> usize {
        self.data.len() / self.array_size.max(1) as usize
    }

    /// Data of vertex `i`.
    pub fn vertex(&self, i: usize) -> Option<&[f32]> {
        let size = self.array_size.max(1) as usize;
        self.data.get(i * size..(i + 1) * size)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrontFace {
    #[default]
    CounterClockwise,
    Clockwise,
}

/// Primitive indices, grouped by the declared subarray size.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexArray {
    pub material: u32,
    pub restart: Option<u64>,
    pub front: FrontFace,
    pub array_size: u32,
    pub indices: Vec<u32>,
}

/// Morph target description.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Morph {
    pub index: u32,
    pub base: Option<u32>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub lod: u32,
    pub primitive: String,
    pub vertex_arrays: Vec<NodeId>,
    pub index_arrays: Vec<NodeId>,
    pub skin: Option<NodeId>,
    pub vertex_count: usize,
}

impl Default for Mesh {
    fn default() -> Self {
        Self {
            lod: 0,
            primitive: "triangles".to_string(),
            vertex_arrays: Vec::new(),
            index_arrays: Vec::new(),
            skin: None,
            vertex_count: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeometryObject {
    pub visible: bool,
    pub shadow: bool,
    pub motion_blur: bool,
    /// Meshes keyed by level of detail.
    pub meshes: BTreeMap<u32, NodeId>,
    /// Morph targets keyed by index.
    pub morphs: BTreeMap<u32, NodeId>,
}

impl Default for GeometryObject {
    fn default() -> Self {
        Self {
            visible: true,
            shadow: true,
            motion_blur: true,
            meshes: BTreeMap::new(),
            morphs: BTreeMap::new(),
        }
    }
}

fn set_u32(value: &Value, slot: &mut u32) -> bool {
    match value.as_u32() {
        Some(v) => {
            *slot = v;
            true
        }
        None => false,
    }
}

impl StructureRules for VertexArray {
    fn property_type(&self, name: &str) -> Option<DataType> {
        match name {
            "attrib" => Some(DataType::String),
            "index" | "morph" => Some(DataType::UInt32),
            _ => None,
        }
    }

    fn set_property(&mut self, name: &str, value: &Value) -> bool {
        match name {
            "attrib" => match value.as_str() {
                Some(attrib) => self.attrib = attrib.to_string(),
                None => return false,
            },
            "index" => return set_u32(value, &mut self.index),
            "morph" => return set_u32(value, &mut self.morph),
            _ => {}
        }
        true
    }

    fn allows(&self, child: &GexStructure) -> bool {
        is_float_primitive(child)
    }
}

impl StructureRules for IndexArray {
    fn property_type(&self, name: &str) -> Option<DataType> {
        match name {
            "material" => Some(DataType::UInt32),
            "restart" => Some(DataType::UInt64),
            "front" => Some(DataType::String),
            _ => None,
        }
    }

    fn set_property(&mut self, name: &str, value: &Value) -> bool {
        match name {
            "material" => set_u32(value, &mut self.material),
            "restart" => {
                self.restart = value.as_u64();
                self.restart.is_some()
            }
            _ => true,
        }
    }

    fn allows(&self, child: &GexStructure) -> bool {
        is_primitive_of(child, DataType::is_unsigned)
    }
}

impl StructureRules for Morph {
    fn property_type(&self, name: &str) -> Option<DataType> {
        matches!(name, "index" | "base").then_some(DataType::UInt32)
    }

    fn set_property(&mut self, name: &str, value: &Value) -> bool {
        match name {
            "index" => set_u32(value, &mut self.index),
            "base" => {
                self.base = value.as_u32();
                self.base.is_some()
            }
            _ => true,
        }
    }

    fn allows(&self, child: &GexStructure) -> bool {
        is_kind(child, |k| matches!(k, GexKind::Name(_)))
    }
}

impl StructureRules for Mesh {
    fn property_type(&self, name: &str) -> Option<DataType> {
        match name {
            "lod" => Some(DataType::UInt32),
            "primitive" => Some(DataType::String),
            _ => None,
        }
    }

    fn set_property(&mut self, name: &str, value: &Value) -> bool {
        match name {
            "lod" => set_u32(value, &mut self.lod),
            "primitive" => match value.as_str() {
                Some(primitive) => {
                    self.primitive = primitive.to_string();
                    true
                }
                None => false,
            },
            _ => true,
        }
    }

    fn allows(&self, child: &GexStructure) -> bool {
        is_kind(child, |k| {
            matches!(k, GexKind::VertexArray(_) | GexKind::IndexArray(_) | GexKind::Skin(_))
        })
    }
}

impl StructureRules for GeometryObject {
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
        match value.as_bool() {
            Some(b) => {
                *slot = b;
                true
            }
            None => false,
        }
    }

    fn allows(&self, child: &GexStructure) -> bool {
        is_kind(child, |k| matches!(k, GexKind::Mesh(_) | GexKind::Morph(_)))
    }
}

/// Components per vertex an attribute requires, `None` when any size works.
fn attrib_sizes(attrib: &str) -> Option<&'static [u32]> {
    match attrib {
        "position" | "normal" | "tangent" | "bitangent" => Some(&[3]),
        "color" => Some(&[3, 4]),
        "texcoord" => Some(&[2]),
        _ => None,
    }
}

pub(crate) fn process_vertex_array(description: &mut GexDescription, id: NodeId) -> GexResult<()> {
    let (mut data, array_size) = float_data(description, id)?;
    let attrib = match description.kind(id) {
        Some(GexKind::VertexArray(va)) => va.attrib.clone(),
        _ => return Ok(()),
    };

    let size_ok = match attrib_sizes(&attrib) {
        Some(sizes) => sizes.contains(&array_size),
        None => array_size > 0,
    };
    if !size_ok {
        return Err(StructureError::InvalidDataFormat.into());
    }

    let grammar = description.grammar();
    let (metrics, options) = (grammar.metrics, grammar.options);
    let stride = array_size as usize;
    match attrib.as_str() {
        "position" => {
            for v in data.chunks_exact_mut(stride) {
                let p = metrics.adjust_position(Vec3::from_slice(v), &options);
                v.copy_from_slice(&p.to_array());
            }
        }
        "normal" | "tangent" | "bitangent" => {
            for v in data.chunks_exact_mut(stride) {
                let d = metrics.adjust_direction(Vec3::from_slice(v), &options);
                v.copy_from_slice(&d.to_array());
            }
        }
        "color" if options.convert_vertex_colors && metrics.chromaticities != Chromaticities::default() => {
            match metrics.color_matrix() {
                Some(m) => {
                    for v in data.chunks_exact_mut(stride) {
                        let rgb = m * Vec3::from_slice(v);
                        v[..3].copy_from_slice(&rgb.to_array());
                    }
                }
                None => log::warn!("Degenerate chromaticities, vertex colors left unconverted"),
            }
        }
        _ => {}
    }

    let vertex_array = payload_mut(description, id, |k| match k {
        GexKind::VertexArray(va) => Some(va),
        _ => None,
    })?;
    vertex_array.array_size = array_size;
    vertex_array.data = data;
    Ok(())
}

pub(crate) fn process_index_array(description: &mut GexDescription, id: NodeId) -> GexResult<()> {
    let front = match string_property(description, id, "front").unwrap_or("ccw") {
        "ccw" => FrontFace::CounterClockwise,
        "cw" => FrontFace::Clockwise,
        _ => return Err(StructureError::InvalidDataFormat.into()),
    };

    let primitive = single_primitive(description, id)?;
    let array_size = primitive.array_size;
    let values = primitive
        .data
        .to_u64_vec()
        .ok_or(StructureError::InvalidDataFormat)?;
    let indices = values
        .into_iter()
        .map(|v| u32::try_from(v).map_err(|_| GexError::IndexValueUnsupported))
        .collect::<GexResult<Vec<u32>>>()?;

    let index_array = payload_mut(description, id, |k| match k {
        GexKind::IndexArray(ia) => Some(ia),
        _ => None,
    })?;
    index_array.front = front;
    index_array.array_size = array_size;
    index_array.indices = indices;
    Ok(())
}

pub(crate) fn process_morph(description: &mut GexDescription, id: NodeId) -> GexResult<()> {
    let name = child_name(description, id)?;
    payload_mut(description, id, |k| match k {
        GexKind::Morph(m) => Some(m),
        _ => None,
    })?
    .name = name;
    Ok(())
}

/// Index subarray size a primitive type requires, if it fixes one.
fn primitive_array_size(primitive: &str) -> Option<u32> {
    match primitive {
        "points" => Some(0),
        "lines" => Some(2),
        "triangles" => Some(3),
        "quads" => Some(4),
        _ => None,
    }
}

pub(crate) fn process_mesh(description: &mut GexDescription, id: NodeId) -> GexResult<()> {
    let vertex_arrays = children_where(description, id, |k| matches!(k, GexKind::VertexArray(_)));
    let index_arrays = children_where(description, id, |k| matches!(k, GexKind::IndexArray(_)));
    let skin = optional_child(description, id, |k| matches!(k, GexKind::Skin(_)))?;

    let mut seen = HashSet::new();
    let mut has_position = false;
    let mut vertex_count = None;
    for &array in &vertex_arrays {
        let Some(GexKind::VertexArray(va)) = description.kind(array) else {
            continue;
        };
        if !seen.insert((va.attrib.as_str(), va.index, va.morph)) {
            return Err(GexError::DuplicateVertexArray);
        }
        has_position |= va.attrib == "position";
        match vertex_count {
            None => vertex_count = Some(va.vertex_count()),
            Some(count) if count != va.vertex_count() => return Err(GexError::VertexCountMismatch),
            Some(_) => {}
        }
    }
    if !has_position {
        return Err(GexError::PositionArrayRequired);
    }
    let vertex_count = vertex_count.unwrap_or(0);

    let primitive = match description.kind(id) {
        Some(GexKind::Mesh(m)) => m.primitive.clone(),
        _ => return Ok(()),
    };
    if let Some(required) = primitive_array_size(&primitive) {
        let mismatched = index_arrays.iter().any(|&array| {
            matches!(description.kind(array), Some(GexKind::IndexArray(ia)) if ia.array_size != required)
        });
        if mismatched {
            return Err(StructureError::InvalidDataFormat.into());
        }
    }

    if let Some(skin) = skin {
        if let Some(GexKind::Skin(s)) = description.kind(skin) {
            if s.bone_counts.len() != vertex_count {
                return Err(GexError::VertexCountMismatch);
            }
        }
    }

    let mesh = payload_mut(description, id, |k| match k {
        GexKind::Mesh(m) => Some(m),
        _ => None,
    })?;
    mesh.vertex_arrays = vertex_arrays;
    mesh.index_arrays = index_arrays;
    mesh.skin = skin;
    mesh.vertex_count = vertex_count;
    Ok(())
}

pub(crate) fn process_geometry_object(description: &mut GexDescription, id: NodeId) -> GexResult<()> {
    let mut meshes = BTreeMap::new();
    let mut morphs = BTreeMap::new();
    let mut skinned = 0;
    for (child, kind) in description.custom_children(id) {
        match kind {
            GexKind::Mesh(mesh) => {
                if meshes.insert(mesh.lod, child).is_some() {
                    return Err(GexError::DuplicateLod);
                }
                if mesh.skin.is_some() {
                    skinned += 1;
                }
            }
            GexKind::Morph(morph) => {
                if morphs.insert(morph.index, child).is_some() {
                    return Err(GexError::DuplicateMorph);
                }
            }
            _ => {}
        }
    }
    if meshes.is_empty() {
        return Err(StructureError::MissingSubstructure.into());
    }
    if skinned != 0 && skinned != meshes.len() {
        return Err(GexError::MissingLodSkin);
    }

    let object = payload_mut(description, id, |k| match k {
        GexKind::GeometryObject(g) => Some(g),
        _ => None,
    })?;
    object.meshes = meshes;
    object.morphs = morphs;
    Ok(())
}
