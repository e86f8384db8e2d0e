//! Extension point that gives the tree engine a concrete grammar.

use std::fmt::Debug;

use crate::data::{DataType, Value};
use crate::description::Description;
use crate::error::StructureError;
use crate::structure::Structure;
use crate::tree::NodeId;

/// A grammar layered on the description language.
///
/// The engine asks the grammar what each identifier means while building
/// the tree, then calls [`Grammar::process`] on every recognized structure
/// in a depth-first walk where children finish before their parent.
pub trait Grammar: Sized {
    /// Kind tag plus typed payload of one recognized structure.
    type Kind: Debug;

    /// Error raised by [`Grammar::process`].
    type Error: std::error::Error + From<StructureError> + 'static;

    /// Map a structure identifier to a kind, or `None` for unknown.
    fn create_structure(&self, identifier: &str) -> Option<Self::Kind>;

    /// Map a primitive type identifier to a data type.
    fn create_primitive(&self, identifier: &str) -> Option<DataType> {
        DataType::from_identifier(identifier)
    }

    /// Whether `child` may appear at the top level.
    fn validate_top_level(&self, _child: &Structure<Self::Kind>) -> bool {
        true
    }

    /// Expected type of a property, or `None` if `kind` has no such property.
    fn validate_property(&self, _kind: &Self::Kind, _identifier: &str) -> Option<DataType> {
        None
    }

    /// Store a property value. Returning `false` rejects the value.
    fn accept_property(&self, _kind: &mut Self::Kind, _identifier: &str, _value: &Value) -> bool {
        true
    }

    /// Whether a fully parsed `child` is legal inside `parent`.
    fn validate_substructure(&self, _parent: &Self::Kind, _child: &Structure<Self::Kind>) -> bool {
        true
    }

    /// Value of a `[N]*` subarray state token used inside `parent`.
    fn state_value(&self, _parent: &Structure<Self::Kind>, _identifier: &str) -> Option<u32> {
        None
    }

    /// Typed extraction and cross-reference checks for one structure.
    fn process(_description: &mut Description<Self>, _id: NodeId) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called once after every structure processed successfully.
    fn finish(_description: &mut Description<Self>) {}
}
