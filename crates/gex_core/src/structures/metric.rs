//! `Metric` structures: units, axes and chromaticities.

use gex_ddl::{DataType, NodeId, StructureError, Value};
use gex_math::Vec2;

use super::{
    float_data, is_primitive_of, single_primitive, string_scalar, GexDescription, GexKind, GexStructure,
    StructureRules,
};
use crate::error::{GexError, GexResult};
use crate::metrics::ForwardAxis;
use crate::options::UpAxis;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metric {
    pub key: String,
}

impl StructureRules for Metric {
    fn property_type(&self, name: &str) -> Option<DataType> {
        (name == "key").then_some(DataType::String)
    }

    fn set_property(&mut self, name: &str, value: &Value) -> bool {
        if name == "key" {
            if let Some(key) = value.as_str() {
                self.key = key.to_string();
            }
        }
        true
    }

    fn allows(&self, child: &GexStructure) -> bool {
        is_primitive_of(child, |ty| ty.is_float() || ty == DataType::String)
    }
}

pub(crate) fn process_metric(description: &mut GexDescription, id: NodeId) -> GexResult<()> {
    let key = match description.kind(id) {
        Some(GexKind::Metric(m)) => m.key.clone(),
        _ => return Ok(()),
    };

    match key.as_str() {
        "distance" | "angle" | "time" => {
            let value = metric_float(description, id, 0)?[0];
            let metrics = &mut description.grammar_mut().metrics;
            match key.as_str() {
                "distance" => metrics.distance_scale = value,
                "angle" => metrics.angle_scale = value,
                _ => metrics.time_scale = value,
            }
        }
        "up" => {
            let up = match string_scalar(description, id)?.as_str() {
                "z" => UpAxis::Z,
                "y" => UpAxis::Y,
                _ => return Err(GexError::InvalidUpDirection),
            };
            description.grammar_mut().metrics.up = up;
        }
        "forward" => {
            let forward = ForwardAxis::from_name(&string_scalar(description, id)?)
                .ok_or(GexError::InvalidForwardDirection)?;
            description.grammar_mut().metrics.forward = forward;
        }
        "red" | "green" | "blue" | "white" => {
            let xy = metric_float(description, id, 2)?;
            let xy = Vec2::new(xy[0], xy[1]);
            let chromaticities = &mut description.grammar_mut().metrics.chromaticities;
            match key.as_str() {
                "red" => chromaticities.red = xy,
                "green" => chromaticities.green = xy,
                "blue" => chromaticities.blue = xy,
                _ => chromaticities.white = xy,
            }
        }
        _ => {
            single_primitive(description, id)?;
            log::warn!("Ignoring Metric with unknown key \"{}\"", key);
        }
    }
    Ok(())
}

/// Float data of a Metric with the given subarray size and one element.
fn metric_float(description: &GexDescription, id: NodeId, array_size: u32) -> GexResult<Vec<f32>> {
    let (data, size) = float_data(description, id)?;
    if size != array_size || data.len() != array_size.max(1) as usize {
        return Err(StructureError::InvalidDataFormat.into());
    }
    Ok(data)
}
