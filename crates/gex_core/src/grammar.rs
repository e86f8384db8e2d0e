//! The scene grammar plugged into the description engine.

use gex_ddl::{DataType, Grammar, NodeId, Value};

use crate::animation::update_all_node_transforms;
use crate::error::GexError;
use crate::metrics::Metrics;
use crate::options::LoadOptions;
use crate::structures::{self, GexDescription, GexKind, GexStructure, StructureRules};

/// Grammar state: load options plus everything gathered while processing.
#[derive(Debug, Clone, Default)]
pub struct OpenGex {
    pub(crate) options: LoadOptions,
    pub(crate) metrics: Metrics,
    pub(crate) animations: Vec<NodeId>,
    pub(crate) clips: Vec<NodeId>,
}

impl OpenGex {
    pub fn new(options: LoadOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Every Animation structure, in document order.
    pub fn animations(&self) -> &[NodeId] {
        &self.animations
    }

    /// Every Clip structure, in document order.
    pub fn clips(&self) -> &[NodeId] {
        &self.clips
    }
}

impl Grammar for OpenGex {
    type Kind = GexKind;
    type Error = GexError;

    fn create_structure(&self, identifier: &str) -> Option<GexKind> {
        GexKind::from_identifier(identifier)
    }

    fn validate_top_level(&self, child: &GexStructure) -> bool {
        child.custom().is_some_and(GexKind::is_top_level)
    }

    fn validate_property(&self, kind: &GexKind, identifier: &str) -> Option<DataType> {
        kind.property_type(identifier)
    }

    fn accept_property(&self, kind: &mut GexKind, identifier: &str, value: &Value) -> bool {
        kind.set_property(identifier, value)
    }

    fn validate_substructure(&self, parent: &GexKind, child: &GexStructure) -> bool {
        parent.allows(child)
    }

    fn process(description: &mut GexDescription, id: NodeId) -> Result<(), GexError> {
        structures::process(description, id)
    }

    fn finish(description: &mut GexDescription) {
        update_all_node_transforms(description);
        let grammar = description.grammar();
        log::debug!(
            "Scene processed: {} animations, {} clips",
            grammar.animations.len(),
            grammar.clips.len()
        );
    }
}
