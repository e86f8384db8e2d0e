//! Keys, curves, tracks, animations and clips.

use gex_ddl::{DataType, NodeId, StructureError, StructureRef, Value};

use super::{
    child_name, children_where, is_float_primitive, is_kind, payload_mut, required_child, single_primitive,
    string_property, GexDescription, GexKind, GexStructure, StructureRules,
};
use crate::error::{GexError, GexResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyKind {
    #[default]
    Value,
    MinusControl,
    PlusControl,
    Tension,
    Continuity,
    Bias,
}

impl KeyKind {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "value" => Some(KeyKind::Value),
            "-control" => Some(KeyKind::MinusControl),
            "+control" => Some(KeyKind::PlusControl),
            "tension" => Some(KeyKind::Tension),
            "continuity" => Some(KeyKind::Continuity),
            "bias" => Some(KeyKind::Bias),
            _ => None,
        }
    }

    /// Tension, continuity and bias hold one scalar per key.
    pub fn is_scalar(self) -> bool {
        matches!(self, KeyKind::Tension | KeyKind::Continuity | KeyKind::Bias)
    }
}

/// One key array of a curve.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Key {
    pub kind: KeyKind,
    pub array_size: u32,
    pub data: Vec<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CurveType {
    Constant,
    #[default]
    Linear,
    Bezier,
    Tcb,
}

impl CurveType {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "constant" => Some(CurveType::Constant),
            "linear" => Some(CurveType::Linear),
            "bezier" => Some(CurveType::Bezier),
            "tcb" => Some(CurveType::Tcb),
            _ => None,
        }
    }
}

/// Payload of `Time` and `Value`: key arrays gathered by kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Curve {
    pub curve: CurveType,
    /// Subarray size of the value and control keys.
    pub array_size: u32,
    /// Number of keys.
    pub element_count: usize,
    pub value: Vec<f32>,
    pub minus_control: Vec<f32>,
    pub plus_control: Vec<f32>,
    pub tension: Vec<f32>,
    pub continuity: Vec<f32>,
    pub bias: Vec<f32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Track {
    pub target_ref: Option<StructureRef>,
    pub target: Option<NodeId>,
    pub time: Option<NodeId>,
    pub value: Option<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Animation {
    pub clip: u32,
    pub begin: Option<f32>,
    pub end: Option<f32>,
    pub tracks: Vec<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Clip {
    pub index: u32,
    pub name: Option<String>,
    pub frame_rate: f32,
}

impl StructureRules for Key {
    fn property_type(&self, name: &str) -> Option<DataType> {
        (name == "kind").then_some(DataType::String)
    }

    fn allows(&self, child: &GexStructure) -> bool {
        is_float_primitive(child)
    }
}

impl StructureRules for Curve {
    fn property_type(&self, name: &str) -> Option<DataType> {
        (name == "curve").then_some(DataType::String)
    }

    fn allows(&self, child: &GexStructure) -> bool {
        is_kind(child, |k| matches!(k, GexKind::Key(_)))
    }
}

impl StructureRules for Track {
    fn property_type(&self, name: &str) -> Option<DataType> {
        (name == "target").then_some(DataType::Ref)
    }

    fn set_property(&mut self, name: &str, value: &Value) -> bool {
        if name == "target" {
            match value.as_reference() {
                Some(r) => self.target_ref = Some(r.clone()),
                None => return false,
            }
        }
        true
    }

    fn allows(&self, child: &GexStructure) -> bool {
        is_kind(child, |k| matches!(k, GexKind::Time(_) | GexKind::Value(_)))
    }
}

impl StructureRules for Animation {
    fn property_type(&self, name: &str) -> Option<DataType> {
        match name {
            "clip" => Some(DataType::UInt32),
            "begin" | "end" => Some(DataType::Float),
            _ => None,
        }
    }

    fn set_property(&mut self, name: &str, value: &Value) -> bool {
        match name {
            "clip" => match value.as_u32() {
                Some(clip) => self.clip = clip,
                None => return false,
            },
            "begin" => {
                self.begin = value.as_f32();
                return self.begin.is_some();
            }
            "end" => {
                self.end = value.as_f32();
                return self.end.is_some();
            }
            _ => {}
        }
        true
    }

    fn allows(&self, child: &GexStructure) -> bool {
        is_kind(child, |k| matches!(k, GexKind::Track(_)))
    }
}

impl StructureRules for Clip {
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
        is_kind(child, |k| matches!(k, GexKind::Name(_) | GexKind::Param(_)))
    }
}

pub(crate) fn process_key(description: &mut GexDescription, id: NodeId) -> GexResult<()> {
    let primitive = single_primitive(description, id)?;
    let array_size = primitive.array_size;
    let data = primitive
        .data
        .to_f32_vec()
        .ok_or(StructureError::InvalidDataFormat)?;
    if data.is_empty() {
        return Err(GexError::EmptyKeyStructure);
    }

    let kind = KeyKind::from_name(string_property(description, id, "kind").unwrap_or("value"))
        .ok_or(GexError::InvalidKeyKind)?;
    if kind.is_scalar() && array_size != 0 {
        return Err(StructureError::InvalidDataFormat.into());
    }

    let key = payload_mut(description, id, |k| match k {
        GexKind::Key(key) => Some(key),
        _ => None,
    })?;
    key.kind = kind;
    key.array_size = array_size;
    key.data = data;
    Ok(())
}

/// Gather the keys of a curve and check them against its type.
fn gather_curve(description: &GexDescription, id: NodeId) -> GexResult<(Curve, Vec<&Key>)> {
    let curve_type = string_property(description, id, "curve").unwrap_or("linear");
    let curve_type = CurveType::from_name(curve_type);

    let mut keys: Vec<&Key> = Vec::new();
    for (_, kind) in description.custom_children(id) {
        let GexKind::Key(key) = kind else {
            continue;
        };
        let allowed = match key.kind {
            KeyKind::Value => true,
            KeyKind::MinusControl | KeyKind::PlusControl => curve_type == Some(CurveType::Bezier),
            KeyKind::Tension | KeyKind::Continuity | KeyKind::Bias => curve_type == Some(CurveType::Tcb),
        };
        if !allowed {
            return Err(GexError::InvalidKeyKind);
        }
        if keys.iter().any(|k| k.kind == key.kind) {
            return Err(StructureError::ExtraneousSubstructure.into());
        }
        keys.push(key);
    }

    let find = |kind: KeyKind| keys.iter().find(|k| k.kind == kind).map(|k| k.data.clone());
    let value = find(KeyKind::Value).ok_or(StructureError::MissingSubstructure)?;
    let curve_type = curve_type.ok_or(GexError::InvalidCurveType)?;

    let mut curve = Curve {
        curve: curve_type,
        value,
        ..Default::default()
    };
    match curve_type {
        CurveType::Bezier => {
            curve.minus_control = find(KeyKind::MinusControl).ok_or(StructureError::MissingSubstructure)?;
            curve.plus_control = find(KeyKind::PlusControl).ok_or(StructureError::MissingSubstructure)?;
        }
        CurveType::Tcb => {
            curve.tension = find(KeyKind::Tension).ok_or(StructureError::MissingSubstructure)?;
            curve.continuity = find(KeyKind::Continuity).ok_or(StructureError::MissingSubstructure)?;
            curve.bias = find(KeyKind::Bias).ok_or(StructureError::MissingSubstructure)?;
        }
        _ => {}
    }
    Ok((curve, keys))
}

pub(crate) fn process_time(description: &mut GexDescription, id: NodeId) -> GexResult<()> {
    let (mut curve, keys) = gather_curve(description, id)?;
    if !matches!(curve.curve, CurveType::Linear | CurveType::Bezier) {
        return Err(GexError::InvalidCurveType);
    }

    let mut count = None;
    for key in &keys {
        if key.array_size != 0 {
            return Err(StructureError::InvalidDataFormat.into());
        }
        match count {
            None => count = Some(key.data.len()),
            Some(c) if c != key.data.len() => return Err(GexError::KeyCountMismatch),
            Some(_) => {}
        }
    }
    curve.element_count = count.unwrap_or(0);

    *payload_mut(description, id, |k| match k {
        GexKind::Time(c) => Some(c),
        _ => None,
    })? = curve;
    Ok(())
}

pub(crate) fn process_value(description: &mut GexDescription, id: NodeId) -> GexResult<()> {
    let (mut curve, keys) = gather_curve(description, id)?;

    let mut array_size = None;
    let mut count = None;
    for key in &keys {
        if !key.kind.is_scalar() {
            match array_size {
                None => array_size = Some(key.array_size),
                Some(size) if size != key.array_size => return Err(StructureError::InvalidDataFormat.into()),
                Some(_) => {}
            }
        }
        let elements = key.data.len() / key.array_size.max(1) as usize;
        match count {
            None => count = Some(elements),
            Some(c) if c != elements => return Err(GexError::KeyCountMismatch),
            Some(_) => {}
        }
    }
    curve.array_size = array_size.unwrap_or(0);
    curve.element_count = count.unwrap_or(0);

    *payload_mut(description, id, |k| match k {
        GexKind::Value(c) => Some(c),
        _ => None,
    })? = curve;
    Ok(())
}

pub(crate) fn process_track(description: &mut GexDescription, id: NodeId) -> GexResult<()> {
    let reference = match description.kind(id) {
        Some(GexKind::Track(t)) => t.target_ref.clone(),
        _ => None,
    };
    let reference = reference.ok_or(StructureError::BrokenRef)?;
    if reference.global {
        return Err(GexError::TargetRefNotLocal);
    }
    let target = description
        .resolve(&reference, id)?
        .ok_or(StructureError::BrokenRef)?;
    if !description.kind(target).is_some_and(GexKind::is_animatable) {
        return Err(GexError::InvalidTargetStruct);
    }
    // The target may not be processed yet; use its raw layout.
    let target_size = description
        .primitives(target)
        .next()
        .map(|(_, p)| p.array_size)
        .unwrap_or(0);

    let time = required_child(description, id, |k| matches!(k, GexKind::Time(_)))?;
    let value = required_child(description, id, |k| matches!(k, GexKind::Value(_)))?;
    let time_count = match description.kind(time) {
        Some(GexKind::Time(c)) => c.element_count,
        _ => 0,
    };
    let (value_count, value_size) = match description.kind(value) {
        Some(GexKind::Value(c)) => (c.element_count, c.array_size),
        _ => (0, 0),
    };
    if time_count != value_count {
        return Err(GexError::KeyCountMismatch);
    }
    if value_size != target_size {
        return Err(StructureError::InvalidDataFormat.into());
    }

    let track = payload_mut(description, id, |k| match k {
        GexKind::Track(t) => Some(t),
        _ => None,
    })?;
    track.target = Some(target);
    track.time = Some(time);
    track.value = Some(value);
    Ok(())
}

pub(crate) fn process_animation(description: &mut GexDescription, id: NodeId) -> GexResult<()> {
    let tracks = children_where(description, id, |k| matches!(k, GexKind::Track(_)));
    if tracks.is_empty() {
        return Err(StructureError::MissingSubstructure.into());
    }
    payload_mut(description, id, |k| match k {
        GexKind::Animation(a) => Some(a),
        _ => None,
    })?
    .tracks = tracks;
    description.grammar_mut().animations.push(id);
    Ok(())
}

pub(crate) fn process_clip(description: &mut GexDescription, id: NodeId) -> GexResult<()> {
    let name = child_name(description, id)?;
    let frame_rate = description
        .custom_children(id)
        .filter_map(|(_, kind)| match kind {
            GexKind::Param(p) if p.attrib == "rate" => Some(p.value),
            _ => None,
        })
        .last()
        .unwrap_or(0.0);

    let clip = payload_mut(description, id, |k| match k {
        GexKind::Clip(c) => Some(c),
        _ => None,
    })?;
    clip.name = name;
    clip.frame_rate = frame_rate;
    description.grammar_mut().clips.push(id);
    Ok(())
}

/// Time window of one animation, in document time units.
///
/// The window spans the first to last time key across all tracks unless
/// `begin` or `end` override it.
pub(crate) fn animation_time_range(description: &GexDescription, id: NodeId) -> Option<(f32, f32)> {
    let Some(GexKind::Animation(animation)) = description.kind(id) else {
        return None;
    };

    let mut min = f32::MAX;
    let mut max = 0.0f32;
    for &track in &animation.tracks {
        let time = match description.kind(track) {
            Some(GexKind::Track(t)) => t.time,
            _ => None,
        };
        if let Some(GexKind::Time(curve)) = time.and_then(|t| description.kind(t)) {
            if let (Some(&first), Some(&last)) = (curve.value.first(), curve.value.last()) {
                min = min.min(first);
                max = max.max(last);
            }
        }
    }

    if let Some(begin) = animation.begin {
        min = begin;
    }
    if let Some(end) = animation.end {
        max = end;
    }
    Some((min, max.max(min)))
}
