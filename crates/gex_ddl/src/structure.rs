//! Generic structure nodes.

use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;

use crate::data::{DataType, PrimitiveArray, Value};
use crate::tree::NodeId;

/// Largest `[N]` subarray size a primitive structure may declare.
pub const MAX_PRIMITIVE_ARRAY_SIZE: u32 = 256;

/// Payload of a primitive structure.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    /// Flat values; subarrays are stored back to back.
    pub data: PrimitiveArray,
    /// Declared subarray size, 0 when there is none.
    pub array_size: u32,
    /// Set when the header ends in `[N]*`.
    pub state_flag: bool,
    /// One state per subarray when `state_flag` is set.
    pub states: Vec<u32>,
}

impl Primitive {
    pub fn new(data_type: DataType) -> Self {
        Self {
            data: PrimitiveArray::new(data_type),
            array_size: 0,
            state_flag: false,
            states: Vec::new(),
        }
    }

    pub fn data_type(&self) -> DataType {
        self.data.data_type()
    }

    /// Number of elements, counting each subarray once.
    pub fn element_count(&self) -> usize {
        self.data.len() / (self.array_size.max(1) as usize)
    }
}

/// What a structure is, as far as the tree engine knows.
#[derive(Debug, Clone, PartialEq)]
pub enum StructureKind<K> {
    Root,
    Primitive(Primitive),
    /// Identifier the grammar did not recognize. Kept in the tree but never
    /// validated or processed.
    Unknown,
    Custom(K),
}

#[derive(Debug, Clone)]
pub struct Structure<K> {
    identifier: String,
    kind: StructureKind<K>,
    name: Option<String>,
    global_name: bool,
    properties: IndexMap<String, Value>,
    pub(crate) locals: HashMap<String, NodeId>,
    offset: usize,
}

impl<K> Structure<K> {
    pub(crate) fn new(identifier: impl Into<String>, kind: StructureKind<K>, offset: usize) -> Self {
        Self {
            identifier: identifier.into(),
            kind,
            name: None,
            global_name: false,
            properties: IndexMap::new(),
            locals: HashMap::new(),
            offset,
        }
    }

    pub(crate) fn root() -> Self {
        Self::new("", StructureKind::Root, 0)
    }

    /// Identifier as written in the source, e.g. `GeometryNode` or `float`.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn kind(&self) -> &StructureKind<K> {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut StructureKind<K> {
        &mut self.kind
    }

    pub fn custom(&self) -> Option<&K> {
        match &self.kind {
            StructureKind::Custom(k) => Some(k),
            _ => None,
        }
    }

    pub fn custom_mut(&mut self) -> Option<&mut K> {
        match &mut self.kind {
            StructureKind::Custom(k) => Some(k),
            _ => None,
        }
    }

    pub fn primitive(&self) -> Option<&Primitive> {
        match &self.kind {
            StructureKind::Primitive(p) => Some(p),
            _ => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self.kind, StructureKind::Unknown)
    }

    /// Structure name without its `$`/`%` sigil.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// `true` for `$name`, `false` for `%name` or no name.
    pub fn has_global_name(&self) -> bool {
        self.global_name
    }

    pub(crate) fn set_name(&mut self, name: String, global: bool) {
        self.name = Some(name);
        self.global_name = global;
    }

    /// Accepted property values in source order.
    pub fn properties(&self) -> &IndexMap<String, Value> {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// A repeated key keeps its original position and takes the last value.
    pub(crate) fn insert_property(&mut self, name: String, value: Value) {
        if let Some(previous) = self.properties.insert(name, value) {
            log::debug!("Property on {} set more than once, replacing {:?}", self.identifier, previous);
        }
    }

    /// Local name table: `%name` children of this structure.
    pub fn local(&self, name: &str) -> Option<NodeId> {
        self.locals.get(name).copied()
    }

    /// Byte offset of the identifier in the source.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl<K> fmt::Display for Structure<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let StructureKind::Root = self.kind {
            return f.write_str("<root>");
        }
        f.write_str(&self.identifier)?;
        if let Some(name) = &self.name {
            let sigil = if self.global_name { '$' } else { '%' };
            write!(f, " {}{}", sigil, name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_name() {
        let mut s: Structure<()> = Structure::new("GeometryNode", StructureKind::Custom(()), 0);
        assert_eq!(s.to_string(), "GeometryNode");

        s.set_name("node1".to_string(), true);
        assert_eq!(s.to_string(), "GeometryNode $node1");
        assert_eq!(Structure::<()>::root().to_string(), "<root>");
    }

    #[test]
    fn test_element_count() {
        let mut p = Primitive::new(DataType::Float);
        p.array_size = 3;
        p.data = PrimitiveArray::Float(vec![0.0; 9]);
        assert_eq!(p.element_count(), 3);

        p.array_size = 0;
        assert_eq!(p.element_count(), 9);
    }
}
