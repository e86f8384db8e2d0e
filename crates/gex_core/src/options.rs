//! Load-time options.

use serde::{Deserialize, Serialize};

/// Vertical axis of a coordinate system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpAxis {
    Y,
    #[default]
    Z,
}

/// How a document is normalized while it loads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Up axis transforms and vertex data are converted to.
    pub target_up: UpAxis,
    /// Multiply translations and positions by the document distance scale.
    pub apply_distance_scale: bool,
    /// Convert vertex colors from the document chromaticities to linear sRGB.
    pub convert_vertex_colors: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            target_up: UpAxis::Z,
            apply_distance_scale: true,
            convert_vertex_colors: true,
        }
    }
}

impl LoadOptions {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let options = LoadOptions::from_json_str(r#"{ "target_up": "y" }"#).unwrap();
        assert_eq!(options.target_up, UpAxis::Y);
        assert!(options.apply_distance_scale);
        assert!(options.convert_vertex_colors);
    }

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(LoadOptions::from_json_str("{}").unwrap(), LoadOptions::default());
        assert!(LoadOptions::from_json_str(r#"{ "target_up": "x" }"#).is_err());
    }
}
