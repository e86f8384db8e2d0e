//! Skeletons and skin weights.

use gex_ddl::{DataType, NodeId, StructureError};
use gex_math::{Mat4, Mat4Ext};

use super::{
    float_data, is_float_primitive, is_kind, is_primitive_of, optional_child, payload_mut, required_child,
    single_primitive, GexDescription, GexKind, GexStructure, StructureRules,
};
use crate::error::{GexError, GexResult};

/// Bone nodes of a skeleton, in bind order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoneRefArray {
    pub bones: Vec<NodeId>,
}

/// Number of bones influencing each vertex.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoneCountArray {
    pub counts: Vec<u16>,
}

/// Bone indexes for every influence, vertex by vertex.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoneIndexArray {
    pub indices: Vec<u16>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoneWeightArray {
    pub weights: Vec<f32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Skeleton {
    pub bones: Vec<NodeId>,
    /// Bind-pose transform of each bone.
    pub bind_transforms: Vec<Mat4>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Skin {
    /// Bind-pose transform of the skinned mesh.
    pub transform: Mat4,
    pub skeleton: Option<NodeId>,
    pub bone_counts: Vec<u16>,
    pub bone_indices: Vec<u16>,
    pub bone_weights: Vec<f32>,
}

impl Default for Skin {
    fn default() -> Self {
        Self {
            transform: Mat4::IDENTITY,
            skeleton: None,
            bone_counts: Vec::new(),
            bone_indices: Vec::new(),
            bone_weights: Vec::new(),
        }
    }
}

impl StructureRules for BoneRefArray {
    fn allows(&self, child: &GexStructure) -> bool {
        is_primitive_of(child, |ty| ty == DataType::Ref)
    }
}

impl StructureRules for BoneCountArray {
    fn allows(&self, child: &GexStructure) -> bool {
        is_primitive_of(child, DataType::is_unsigned)
    }
}

impl StructureRules for BoneIndexArray {
    fn allows(&self, child: &GexStructure) -> bool {
        is_primitive_of(child, DataType::is_unsigned)
    }
}

impl StructureRules for BoneWeightArray {
    fn allows(&self, child: &GexStructure) -> bool {
        is_float_primitive(child)
    }
}

impl StructureRules for Skeleton {
    fn allows(&self, child: &GexStructure) -> bool {
        is_kind(child, |k| matches!(k, GexKind::BoneRefArray(_) | GexKind::Transform(_)))
    }
}

impl StructureRules for Skin {
    fn allows(&self, child: &GexStructure) -> bool {
        is_kind(child, |k| {
            matches!(
                k,
                GexKind::Transform(_)
                    | GexKind::Skeleton(_)
                    | GexKind::BoneCountArray(_)
                    | GexKind::BoneIndexArray(_)
                    | GexKind::BoneWeightArray(_)
            )
        })
    }
}

pub(crate) fn process_bone_ref_array(description: &mut GexDescription, id: NodeId) -> GexResult<()> {
    let primitive = single_primitive(description, id)?;
    let refs = match primitive.data.as_refs() {
        Some(refs) if primitive.array_size == 0 => refs.to_vec(),
        _ => return Err(StructureError::InvalidDataFormat.into()),
    };

    let mut bones = Vec::with_capacity(refs.len());
    for reference in &refs {
        let bone = description
            .resolve(reference, id)?
            .filter(|&b| matches!(description.kind(b), Some(GexKind::BoneNode(_))))
            .ok_or(GexError::InvalidBoneRef)?;
        bones.push(bone);
    }

    payload_mut(description, id, |k| match k {
        GexKind::BoneRefArray(b) => Some(b),
        _ => None,
    })?
    .bones = bones;
    Ok(())
}

/// Unsigned data of the only primitive child, each value at most 65535.
fn bone_indices(description: &GexDescription, id: NodeId) -> GexResult<Vec<u16>> {
    let primitive = single_primitive(description, id)?;
    if primitive.array_size != 0 {
        return Err(StructureError::InvalidDataFormat.into());
    }
    primitive
        .data
        .to_u64_vec()
        .ok_or(StructureError::InvalidDataFormat)?
        .into_iter()
        .map(|v| u16::try_from(v).map_err(|_| GexError::IndexValueUnsupported))
        .collect()
}

pub(crate) fn process_bone_count_array(description: &mut GexDescription, id: NodeId) -> GexResult<()> {
    let counts = bone_indices(description, id)?;
    payload_mut(description, id, |k| match k {
        GexKind::BoneCountArray(b) => Some(b),
        _ => None,
    })?
    .counts = counts;
    Ok(())
}

pub(crate) fn process_bone_index_array(description: &mut GexDescription, id: NodeId) -> GexResult<()> {
    let indices = bone_indices(description, id)?;
    payload_mut(description, id, |k| match k {
        GexKind::BoneIndexArray(b) => Some(b),
        _ => None,
    })?
    .indices = indices;
    Ok(())
}

pub(crate) fn process_bone_weight_array(description: &mut GexDescription, id: NodeId) -> GexResult<()> {
    let (weights, array_size) = float_data(description, id)?;
    if array_size != 0 {
        return Err(StructureError::InvalidDataFormat.into());
    }
    payload_mut(description, id, |k| match k {
        GexKind::BoneWeightArray(b) => Some(b),
        _ => None,
    })?
    .weights = weights;
    Ok(())
}

/// Every matrix of a Transform child, normalized for units and up axis.
fn adjusted_transforms(description: &GexDescription, transform: NodeId) -> Vec<Mat4> {
    let grammar = description.grammar();
    match description.kind(transform) {
        Some(GexKind::Transform(t)) => t
            .transforms
            .iter()
            .map(|&m| grammar.metrics.adjust_transform(m, &grammar.options))
            .collect(),
        _ => Vec::new(),
    }
}

pub(crate) fn process_skeleton(description: &mut GexDescription, id: NodeId) -> GexResult<()> {
    let bone_refs = required_child(description, id, |k| matches!(k, GexKind::BoneRefArray(_)))?;
    let transform = required_child(description, id, |k| matches!(k, GexKind::Transform(_)))?;

    let bones = match description.kind(bone_refs) {
        Some(GexKind::BoneRefArray(b)) => b.bones.clone(),
        _ => Vec::new(),
    };
    let bind_transforms = adjusted_transforms(description, transform);
    if bones.len() != bind_transforms.len() {
        return Err(GexError::BoneCountMismatch);
    }

    let skeleton = payload_mut(description, id, |k| match k {
        GexKind::Skeleton(s) => Some(s),
        _ => None,
    })?;
    skeleton.bones = bones;
    skeleton.bind_transforms = bind_transforms;
    Ok(())
}

pub(crate) fn process_skin(description: &mut GexDescription, id: NodeId) -> GexResult<()> {
    let transform = optional_child(description, id, |k| matches!(k, GexKind::Transform(_)))?;
    let skeleton = required_child(description, id, |k| matches!(k, GexKind::Skeleton(_)))?;
    let counts = required_child(description, id, |k| matches!(k, GexKind::BoneCountArray(_)))?;
    let indices = required_child(description, id, |k| matches!(k, GexKind::BoneIndexArray(_)))?;
    let weights = required_child(description, id, |k| matches!(k, GexKind::BoneWeightArray(_)))?;

    let transform = transform
        .and_then(|t| adjusted_transforms(description, t).first().copied())
        .unwrap_or(Mat4::IDENTITY);
    let bone_counts = match description.kind(counts) {
        Some(GexKind::BoneCountArray(b)) => b.counts.clone(),
        _ => Vec::new(),
    };
    let bone_indices = match description.kind(indices) {
        Some(GexKind::BoneIndexArray(b)) => b.indices.clone(),
        _ => Vec::new(),
    };
    let bone_weights = match description.kind(weights) {
        Some(GexKind::BoneWeightArray(b)) => b.weights.clone(),
        _ => Vec::new(),
    };

    let influences: usize = bone_counts.iter().map(|&c| c as usize).sum();
    if bone_weights.len() != bone_indices.len() || influences != bone_indices.len() {
        return Err(GexError::BoneWeightCountMismatch);
    }

    let bone_total = match description.kind(skeleton) {
        Some(GexKind::Skeleton(s)) => s.bones.len(),
        _ => 0,
    };
    if bone_indices.iter().any(|&i| i as usize >= bone_total) {
        return Err(GexError::InvalidBoneRef);
    }

    let skin = payload_mut(description, id, |k| match k {
        GexKind::Skin(s) => Some(s),
        _ => None,
    })?;
    skin.transform = transform;
    skin.skeleton = Some(skeleton);
    skin.bone_counts = bone_counts;
    skin.bone_indices = bone_indices;
    skin.bone_weights = bone_weights;
    Ok(())
}

