//! Tree builder and the parsed description it produces.
//!
//! Parsing is two passes. The first drives the lexer over the text and
//! builds the structure tree, consulting the [`Grammar`] for kinds,
//! properties and nesting rules. The second walks the tree depth-first and
//! lets the grammar extract typed data and resolve references. The first
//! failure in either pass discards the whole tree.

use std::collections::HashMap;

use crate::data::{DataType, StructureRef, Value};
use crate::error::{line_of_offset, DataError, DataResult, DescriptionError, StructureError};
use crate::grammar::Grammar;
use crate::lexer::{
    read_identifier, read_unsigned_literal, read_value, skip_whitespace,
};
use crate::structure::{Primitive, Structure, StructureKind, MAX_PRIMITIVE_ARRAY_SIZE};
use crate::tree::{Children, NodeId, Tree};

/// Type order tried for properties the owning structure does not declare.
const UNKNOWN_PROPERTY_TYPES: [DataType; 7] = [
    DataType::Bool,
    DataType::String,
    DataType::Ref,
    DataType::Type,
    DataType::UInt64,
    DataType::Double,
    DataType::Base64,
];

/// A parsed and processed description.
#[derive(Debug)]
pub struct Description<G: Grammar> {
    grammar: G,
    tree: Tree<Structure<G::Kind>>,
    root: NodeId,
    names: HashMap<String, NodeId>,
}

impl<G: Grammar> Description<G> {
    /// Parse and process `text` with `grammar`.
    pub fn parse(grammar: G, text: &str) -> Result<Self, DescriptionError<G::Error>> {
        Self::parse_bytes(grammar, text.as_bytes())
    }

    pub fn parse_bytes(grammar: G, text: &[u8]) -> Result<Self, DescriptionError<G::Error>> {
        let mut tree = Tree::new();
        let root = tree.add(Structure::root());
        let mut description = Self {
            grammar,
            tree,
            root,
            names: HashMap::new(),
        };

        let mut parser = Parser {
            text,
            pos: 0,
            description: &mut description,
        };
        if let Err(kind) = parser.parse_document() {
            let line = line_of_offset(text, parser.pos);
            log::debug!("Build pass failed at line {}: {}", line, kind);
            return Err(DescriptionError::Syntax { kind, line });
        }

        if let Err((source, id)) = description.process_subtree(root) {
            let structure = &description.tree[id];
            return Err(DescriptionError::Process {
                source,
                structure: structure.to_string(),
                line: line_of_offset(text, structure.offset()),
            });
        }

        G::finish(&mut description);
        log::debug!("Parsed description with {} structures", description.tree.len() - 1);
        Ok(description)
    }

    fn process_subtree(&mut self, id: NodeId) -> Result<(), (G::Error, NodeId)> {
        let children: Vec<NodeId> = self.tree.children(id).collect();
        for child in children {
            if let StructureKind::Custom(_) = self.tree[child].kind() {
                self.process_subtree(child)?;
                G::process(self, child).map_err(|e| (e, child))?;
            }
        }
        Ok(())
    }

    pub fn grammar(&self) -> &G {
        &self.grammar
    }

    pub fn grammar_mut(&mut self) -> &mut G {
        &mut self.grammar
    }

    pub fn tree(&self) -> &Tree<Structure<G::Kind>> {
        &self.tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn structure(&self, id: NodeId) -> &Structure<G::Kind> {
        &self.tree[id]
    }

    pub fn structure_mut(&mut self, id: NodeId) -> &mut Structure<G::Kind> {
        &mut self.tree[id]
    }

    /// Grammar payload of a recognized structure.
    pub fn kind(&self, id: NodeId) -> Option<&G::Kind> {
        self.tree[id].custom()
    }

    pub fn kind_mut(&mut self, id: NodeId) -> Option<&mut G::Kind> {
        self.tree[id].custom_mut()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.tree.parent(id)
    }

    pub fn children(&self, id: NodeId) -> Children<'_, Structure<G::Kind>> {
        self.tree.children(id)
    }

    /// Primitive children of `id` in document order.
    pub fn primitives(&self, id: NodeId) -> impl Iterator<Item = (NodeId, &Primitive)> + '_ {
        self.tree
            .children(id)
            .filter_map(move |child| self.tree[child].primitive().map(|p| (child, p)))
    }

    /// Recognized children of `id` in document order.
    pub fn custom_children(&self, id: NodeId) -> impl Iterator<Item = (NodeId, &G::Kind)> + '_ {
        self.tree
            .children(id)
            .filter_map(move |child| self.tree[child].custom().map(|k| (child, k)))
    }

    /// Structure registered under a `$name`.
    pub fn global(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    /// Resolve a reference.
    ///
    /// A global reference starts in the global table. A local reference
    /// looks in the local table of `from`, then of each enclosing structure.
    /// Further names walk nested local tables. `null` never resolves.
    pub fn find_structure(&self, reference: &StructureRef, from: NodeId) -> Option<NodeId> {
        let (first, rest) = reference.names.split_first()?;

        let start = if reference.global {
            self.global(first)?
        } else {
            let mut scope = Some(from);
            loop {
                let id = scope?;
                if let Some(found) = self.tree[id].local(first) {
                    break found;
                }
                scope = self.tree.parent(id);
            }
        };

        rest.iter()
            .try_fold(start, |id, name| self.tree[id].local(name))
    }

    /// Like [`Description::find_structure`] but reports a broken non-null
    /// reference as an error. `Ok(None)` means the reference was `null`.
    pub fn resolve(
        &self,
        reference: &StructureRef,
        from: NodeId,
    ) -> Result<Option<NodeId>, StructureError> {
        if reference.is_null() {
            return Ok(None);
        }
        self.find_structure(reference, from)
            .map(Some)
            .ok_or(StructureError::BrokenRef)
    }
}

struct Parser<'a, G: Grammar> {
    text: &'a [u8],
    pos: usize,
    description: &'a mut Description<G>,
}

impl<G: Grammar> Parser<'_, G> {
    fn peek(&self) -> u8 {
        self.text.get(self.pos).copied().unwrap_or(0)
    }

    fn skip(&mut self) {
        self.pos = skip_whitespace(self.text, self.pos);
    }

    fn parse_document(&mut self) -> DataResult<()> {
        let root = self.description.root;
        self.parse_structures(root)?;
        self.skip();
        if self.pos < self.text.len() {
            return Err(DataError::SyntaxError);
        }
        Ok(())
    }

    fn parse_structures(&mut self, parent: NodeId) -> DataResult<()> {
        loop {
            self.skip();
            if self.pos >= self.text.len() || self.peek() == b'}' {
                return Ok(());
            }
            self.parse_structure(parent)?;
        }
    }

    fn parse_structure(&mut self, parent: NodeId) -> DataResult<()> {
        let offset = self.pos;
        let (end, identifier) = read_identifier(self.text, self.pos)?;
        self.pos = end;

        let grammar = &self.description.grammar;
        let kind = if let Some(ty) = grammar.create_primitive(identifier) {
            StructureKind::Primitive(Primitive::new(ty))
        } else if let Some(kind) = grammar.create_structure(identifier) {
            StructureKind::Custom(kind)
        } else {
            log::debug!("Unknown structure '{}' at byte {}", identifier, offset);
            StructureKind::Unknown
        };
        let is_primitive = matches!(kind, StructureKind::Primitive(_));

        let id = self.description.tree.add(Structure::new(identifier, kind, offset));
        self.description.tree.append_child(parent, id);

        self.skip();
        if is_primitive && self.peek() == b'[' {
            self.parse_array_header(id)?;
            self.skip();
        }

        if matches!(self.peek(), b'$' | b'%') {
            self.parse_name(parent, id)?;
            self.skip();
        }

        if !is_primitive && self.peek() == b'(' {
            self.pos += 1;
            self.parse_properties(id)?;
            self.skip();
        }

        if self.peek() != b'{' {
            return Err(DataError::SyntaxError);
        }
        self.pos += 1;

        if is_primitive {
            self.parse_primitive_data(parent, id)?;
        } else {
            self.parse_structures(id)?;
        }

        self.skip();
        if self.peek() != b'}' {
            return Err(DataError::SyntaxError);
        }
        self.pos += 1;

        if !self.substructure_allowed(parent, id) {
            self.pos = offset;
            return Err(DataError::InvalidStructure);
        }
        Ok(())
    }

    fn substructure_allowed(&self, parent: NodeId, child: NodeId) -> bool {
        let tree = &self.description.tree;
        let child = &tree[child];
        if child.is_unknown() {
            return true;
        }
        match tree[parent].kind() {
            StructureKind::Root => self.description.grammar.validate_top_level(child),
            StructureKind::Custom(kind) => self.description.grammar.validate_substructure(kind, child),
            StructureKind::Unknown => true,
            StructureKind::Primitive(_) => false,
        }
    }

    fn parse_name(&mut self, parent: NodeId, id: NodeId) -> DataResult<()> {
        let global = self.peek() == b'$';
        let start = self.pos;
        let (end, name) = read_identifier(self.text, self.pos + 1)?;
        let name = name.to_string();

        let table = if global {
            &mut self.description.names
        } else {
            &mut self.description.tree[parent].locals
        };
        if table.contains_key(&name) {
            self.pos = start;
            return Err(DataError::StructNameExists);
        }
        table.insert(name.clone(), id);

        self.description.tree[id].set_name(name, global);
        self.pos = end;
        Ok(())
    }

    fn parse_array_header(&mut self, id: NodeId) -> DataResult<()> {
        self.pos += 1;
        self.skip();
        let (end, size) = read_unsigned_literal(self.text, self.pos)?;
        if size < 1 || size > MAX_PRIMITIVE_ARRAY_SIZE as u64 {
            return Err(DataError::PrimitiveIllegalArraySize);
        }
        self.pos = end;
        self.skip();

        if self.peek() != b']' {
            return Err(DataError::PrimitiveSyntaxError);
        }
        self.pos += 1;
        self.skip();

        let state_flag = self.peek() == b'*';
        if state_flag {
            self.pos += 1;
        }

        if let StructureKind::Primitive(primitive) = self.description.tree[id].kind_mut() {
            primitive.array_size = size as u32;
            primitive.state_flag = state_flag;
        }
        Ok(())
    }

    fn parse_properties(&mut self, id: NodeId) -> DataResult<()> {
        self.skip();
        if self.peek() == b')' {
            self.pos += 1;
            return Ok(());
        }

        loop {
            self.skip();
            let (end, name) = read_identifier(self.text, self.pos)?;
            let name = name.to_string();
            self.pos = end;
            self.skip();

            let expected = self.description.tree[id]
                .custom()
                .and_then(|kind| self.description.grammar.validate_property(kind, &name));

            match expected {
                Some(ty) => {
                    let value = if self.peek() == b'=' {
                        self.pos += 1;
                        self.skip();
                        let (end, value) = read_value(self.text, self.pos, ty)?;
                        self.pos = end;
                        value
                    } else if ty == DataType::Bool {
                        Value::Bool(true)
                    } else {
                        return Err(DataError::PropertySyntaxError);
                    };

                    let Description { grammar, tree, .. } = &mut *self.description;
                    let structure = &mut tree[id];
                    if let Some(kind) = structure.custom_mut() {
                        if !grammar.accept_property(kind, &name, &value) {
                            return Err(DataError::PropertyInvalidType);
                        }
                    }
                    structure.insert_property(name, value);
                }
                None => {
                    if self.peek() != b'=' {
                        return Err(DataError::PropertySyntaxError);
                    }
                    self.pos += 1;
                    self.skip();
                    let value = self.read_unknown_property_value()?;
                    log::debug!(
                        "Ignoring property '{}' = {:?} on {}",
                        name,
                        value,
                        self.description.tree[id]
                    );
                }
            }

            self.skip();
            match self.peek() {
                b',' => self.pos += 1,
                b')' => {
                    self.pos += 1;
                    return Ok(());
                }
                _ => return Err(DataError::PropertySyntaxError),
            }
        }
    }

    fn read_unknown_property_value(&mut self) -> DataResult<Value> {
        let (end, value) = read_unknown_property(self.text, self.pos)?;
        self.pos = end;
        Ok(value)
    }

    fn parse_primitive_data(&mut self, parent: NodeId, id: NodeId) -> DataResult<()> {
        let (data_type, array_size, state_flag) = match self.description.tree[id].primitive() {
            Some(p) => (p.data_type(), p.array_size, p.state_flag),
            None => return Err(DataError::PrimitiveSyntaxError),
        };

        let mut values = Vec::new();
        let mut states = Vec::new();

        self.skip();
        if self.peek() != b'}' {
            if array_size == 0 {
                loop {
                    let (end, value) = read_value(self.text, self.pos, data_type)?;
                    values.push(value);
                    self.pos = end;
                    self.skip();
                    if self.peek() != b',' {
                        break;
                    }
                    self.pos += 1;
                    self.skip();
                }
            } else {
                loop {
                    if state_flag {
                        let (end, token) = read_identifier(self.text, self.pos)?;
                        let state = self
                            .description
                            .grammar
                            .state_value(&self.description.tree[parent], token)
                            .ok_or(DataError::PrimitiveInvalidState)?;
                        states.push(state);
                        self.pos = end;
                        self.skip();
                    }

                    self.parse_subarray(data_type, array_size, &mut values)?;

                    self.skip();
                    if self.peek() != b',' {
                        break;
                    }
                    self.pos += 1;
                    self.skip();
                }
            }
        }

        if let StructureKind::Primitive(primitive) = self.description.tree[id].kind_mut() {
            for value in values {
                primitive.data.push(value);
            }
            primitive.states = states;
        }
        Ok(())
    }

    fn parse_subarray(
        &mut self,
        data_type: DataType,
        array_size: u32,
        values: &mut Vec<Value>,
    ) -> DataResult<()> {
        if self.peek() != b'{' {
            return Err(DataError::PrimitiveInvalidFormat);
        }
        self.pos += 1;
        self.skip();

        for i in 0..array_size {
            if i > 0 {
                match self.peek() {
                    b',' => {
                        self.pos += 1;
                        self.skip();
                    }
                    b'}' => return Err(DataError::PrimitiveArrayUnderSize),
                    _ => return Err(DataError::PrimitiveInvalidFormat),
                }
            } else if self.peek() == b'}' {
                return Err(DataError::PrimitiveArrayUnderSize);
            }

            let (end, value) = read_value(self.text, self.pos, data_type)?;
            values.push(value);
            self.pos = end;
            self.skip();
        }

        match self.peek() {
            b'}' => {
                self.pos += 1;
                Ok(())
            }
            b',' => Err(DataError::PrimitiveArrayOverSize),
            _ => Err(DataError::PrimitiveInvalidFormat),
        }
    }
}

/// Try each literal kind in a fixed order; the first one that reads a
/// complete value ending at `,` or `)` wins.
fn read_unknown_property(text: &[u8], pos: usize) -> DataResult<(usize, Value)> {
    for ty in UNKNOWN_PROPERTY_TYPES {
        if let Ok((end, value)) = read_value(text, pos, ty) {
            let next = skip_whitespace(text, end);
            if matches!(text.get(next), Some(b',') | Some(b')')) {
                return Ok((end, value));
            }
        }
    }
    Err(DataError::PropertySyntaxError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::PrimitiveArray;
    use thiserror::Error;

    /// Small grammar: `Group` holds anything, `Item (weight = float)` holds
    /// floats, `Link` holds one ref that must resolve.
    #[derive(Debug, Default)]
    struct TestGrammar {
        processed: Vec<String>,
    }

    #[derive(Debug, PartialEq)]
    enum TestKind {
        Group,
        Item { weight: f32 },
        Link { target: Option<NodeId> },
    }

    #[derive(Error, Debug, PartialEq)]
    enum TestError {
        #[error(transparent)]
        Structure(#[from] StructureError),
    }

    impl Grammar for TestGrammar {
        type Kind = TestKind;
        type Error = TestError;

        fn create_structure(&self, identifier: &str) -> Option<TestKind> {
            match identifier {
                "Group" => Some(TestKind::Group),
                "Item" => Some(TestKind::Item { weight: 1.0 }),
                "Link" => Some(TestKind::Link { target: None }),
                _ => None,
            }
        }

        fn validate_top_level(&self, child: &Structure<TestKind>) -> bool {
            child.primitive().is_none()
        }

        fn validate_property(&self, kind: &TestKind, identifier: &str) -> Option<DataType> {
            match (kind, identifier) {
                (TestKind::Item { .. }, "weight") => Some(DataType::Float),
                (TestKind::Group, "open") => Some(DataType::Bool),
                _ => None,
            }
        }

        fn accept_property(&self, kind: &mut TestKind, identifier: &str, value: &Value) -> bool {
            if let (TestKind::Item { weight }, "weight") = (kind, identifier) {
                match value.as_f32() {
                    Some(w) if w >= 0.0 => *weight = w,
                    _ => return false,
                }
            }
            true
        }

        fn validate_substructure(&self, parent: &TestKind, child: &Structure<TestKind>) -> bool {
            match parent {
                TestKind::Group => true,
                TestKind::Item { .. } => child
                    .primitive()
                    .is_some_and(|p| p.data_type() == DataType::Float),
                TestKind::Link { .. } => child
                    .primitive()
                    .is_some_and(|p| p.data_type() == DataType::Ref),
            }
        }

        fn state_value(&self, _parent: &Structure<TestKind>, identifier: &str) -> Option<u32> {
            match identifier {
                "on" => Some(1),
                "off" => Some(0),
                _ => None,
            }
        }

        fn process(description: &mut Description<Self>, id: NodeId) -> Result<(), TestError> {
            let label = description.structure(id).to_string();
            description.grammar_mut().processed.push(label);

            if let Some(TestKind::Link { .. }) = description.kind(id) {
                let (_, primitive) = description
                    .primitives(id)
                    .next()
                    .ok_or(StructureError::MissingSubstructure)?;
                let reference = primitive
                    .data
                    .as_refs()
                    .and_then(|r| r.first())
                    .cloned()
                    .ok_or(StructureError::InvalidDataFormat)?;
                let target = description.resolve(&reference, id)?;
                if let Some(TestKind::Link { target: slot }) = description.kind_mut(id) {
                    *slot = target;
                }
            }
            Ok(())
        }
    }

    fn parse(text: &str) -> Result<Description<TestGrammar>, DescriptionError<TestError>> {
        let _ = env_logger::builder().is_test(true).try_init();
        Description::parse(TestGrammar::default(), text)
    }

    fn syntax_error(text: &str) -> DataError {
        match parse(text) {
            Err(DescriptionError::Syntax { kind, .. }) => kind,
            other => panic!("expected syntax error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_parse_empty() {
        let d = parse("  // nothing\n").unwrap();
        assert_eq!(d.children(d.root()).count(), 0);
    }

    #[test]
    fn test_parse_nested() {
        let d = parse(
            r#"
            Group $top (open) {
                Item (weight = 2.5) { float { 1, 2, 3 } }
                Group %inner {}
            }
            "#,
        )
        .unwrap();

        let top = d.global("top").unwrap();
        assert_eq!(d.structure(top).property("open"), Some(&Value::Bool(true)));

        let item = d.children(top).next().unwrap();
        assert_eq!(d.kind(item), Some(&TestKind::Item { weight: 2.5 }));

        let (_, floats) = d.primitives(item).next().unwrap();
        assert_eq!(floats.data, PrimitiveArray::Float(vec![1.0, 2.0, 3.0]));
        assert!(d.structure(top).local("inner").is_some());
    }

    #[test]
    fn test_process_order_children_first() {
        let d = parse("Group $a { Group $b {} Item {} } Group $c {}").unwrap();
        assert_eq!(d.grammar().processed, ["Group $b", "Item", "Group $a", "Group $c"]);
    }

    #[test]
    fn test_unknown_structures_are_skipped() {
        let d = parse("Group { Mystery (x = 1) { Item { float {1} } } }").unwrap();
        // The Item inside the unknown structure is neither validated nor processed.
        assert_eq!(d.grammar().processed, ["Group"]);
    }

    #[test]
    fn test_global_name_collision() {
        assert_eq!(
            syntax_error("Group $a {} Group { Group $a {} }"),
            DataError::StructNameExists
        );
    }

    #[test]
    fn test_local_name_collision() {
        assert_eq!(
            syntax_error("Group { Item %x {} Item %x {} }"),
            DataError::StructNameExists
        );
    }

    #[test]
    fn test_same_local_name_at_different_depths() {
        assert!(parse("Group { Group %x { Group %x {} } }").is_ok());
    }

    #[test]
    fn test_illegal_nesting() {
        assert_eq!(syntax_error("Item { int32 {1} }"), DataError::InvalidStructure);
        assert_eq!(syntax_error("float {1}"), DataError::InvalidStructure);
    }

    #[test]
    fn test_property_errors() {
        assert_eq!(syntax_error("Item (weight) {}"), DataError::PropertySyntaxError);
        assert_eq!(
            syntax_error("Item (weight = -1.0) {}"),
            DataError::PropertyInvalidType
        );
        assert_eq!(syntax_error("Item (weight = 1.0 {}"), DataError::PropertySyntaxError);
    }

    #[test]
    fn test_unknown_property_fallback() {
        let d = parse(
            r#"Group (a = true, b = "s", c = $x, d = float, e = 12, f = 1.5, g = QUI=) {}"#,
        )
        .unwrap();
        let group = d.children(d.root()).next().unwrap();
        assert!(d.structure(group).properties().is_empty());

        assert_eq!(syntax_error("Group (a = @) {}"), DataError::PropertySyntaxError);
    }

    #[test]
    fn test_unknown_property_type_order() {
        let read = |text: &str| read_unknown_property(text.as_bytes(), 0).unwrap().1;

        assert_eq!(read("true)"), Value::Bool(true));
        // `0` and `1` are bool literals before they are integers.
        assert_eq!(read("0)"), Value::Bool(false));
        assert_eq!(read("\"s\")"), Value::String("s".to_string()));
        assert_eq!(
            read("$x)"),
            Value::Ref(StructureRef {
                names: vec!["x".to_string()],
                global: true,
            })
        );
        assert_eq!(read("float)"), Value::Type(DataType::Float));
        assert_eq!(read("12)"), Value::UInt64(12));
        assert_eq!(read("1.5 ,"), Value::Double(1.5));
        assert_eq!(read("QUI=)"), Value::Base64(b"AB".to_vec()));

        assert_eq!(
            read_unknown_property(b"12 @)", 0),
            Err(DataError::PropertySyntaxError)
        );
    }

    #[test]
    fn test_repeated_property_keeps_last_value() {
        let d = parse("Item (weight = 1.0, weight = 2.5) {}").unwrap();
        let item = d.children(d.root()).next().unwrap();
        assert_eq!(d.kind(item), Some(&TestKind::Item { weight: 2.5 }));
        assert_eq!(d.structure(item).properties().len(), 1);
        assert_eq!(d.structure(item).property("weight"), Some(&Value::Float(2.5)));
    }

    #[test]
    fn test_subarrays() {
        let d = parse("Item { float[2] { {1, 2}, {3, 4} } }").unwrap();
        let item = d.children(d.root()).next().unwrap();
        let (_, p) = d.primitives(item).next().unwrap();

        assert_eq!(p.array_size, 2);
        assert_eq!(p.element_count(), 2);
        assert_eq!(p.data.len(), 4);
    }

    #[test]
    fn test_subarray_size_errors() {
        let under = "Item { float[3] { {1, 2} } }";
        let over = "Item { float[3] { {1, 2, 3, 4} } }";
        assert_eq!(syntax_error(under), DataError::PrimitiveArrayUnderSize);
        assert_eq!(syntax_error(over), DataError::PrimitiveArrayOverSize);
        assert_eq!(
            syntax_error("Item { float[3] { 1, 2, 3 } }"),
            DataError::PrimitiveInvalidFormat
        );
        assert_eq!(
            syntax_error("Item { float[0] { } }"),
            DataError::PrimitiveIllegalArraySize
        );
        assert_eq!(
            syntax_error("Item { float[257] { } }"),
            DataError::PrimitiveIllegalArraySize
        );
    }

    #[test]
    fn test_state_tokens() {
        let d = parse("Group { float[1]* { on {1}, off {2} } }").unwrap();
        let group = d.children(d.root()).next().unwrap();
        let (_, p) = d.primitives(group).next().unwrap();
        assert_eq!(p.states, [1, 0]);

        assert_eq!(
            syntax_error("Group { float[1]* { maybe {1} } }"),
            DataError::PrimitiveInvalidState
        );
    }

    #[test]
    fn test_trailing_garbage() {
        assert_eq!(syntax_error("Group {} }"), DataError::SyntaxError);
        assert_eq!(syntax_error("Group {"), DataError::SyntaxError);
    }

    #[test]
    fn test_error_line_number() {
        let err = parse("Group $a {}\n\nGroup $a {}").unwrap_err();
        assert_eq!(err.line(), 3);
    }

    #[test]
    fn test_local_reference_searches_outward() {
        let d = parse(
            r#"
            Group {
                Item %target {}
                Group { Link { ref { %target } } }
            }
            "#,
        )
        .unwrap();

        let outer = d.children(d.root()).next().unwrap();
        let target = d.structure(outer).local("target");
        let link = d
            .tree()
            .descendants(outer)
            .find(|&id| matches!(d.kind(id), Some(TestKind::Link { .. })))
            .unwrap();
        assert_eq!(d.kind(link), Some(&TestKind::Link { target }));
    }

    #[test]
    fn test_global_path_reference() {
        let d = parse("Group $a { Group %b { Item %c {} } } Link { ref { $a%b%c } }").unwrap();
        let a = d.global("a").unwrap();
        let c = d.find_structure(&StructureRef::global(["a", "b", "c"]), d.root());
        assert!(c.is_some());
        assert_eq!(d.tree().depth(c.unwrap()), 3);
        assert!(d.tree().is_ancestor(a, c.unwrap()));
    }

    #[test]
    fn test_broken_reference() {
        let err = parse("Group {\n  Link { ref { %missing } }\n}").unwrap_err();
        match err {
            DescriptionError::Process {
                source, structure, line,
            } => {
                assert_eq!(source, TestError::Structure(StructureError::BrokenRef));
                assert_eq!(structure, "Link");
                assert_eq!(line, 2);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_null_reference() {
        let d = parse("Link { ref { null } }").unwrap();
        let link = d.children(d.root()).next().unwrap();
        assert_eq!(d.kind(link), Some(&TestKind::Link { target: None }));
    }
}
