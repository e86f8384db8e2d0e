//! GEX DDL - the structured data language underneath the scene format.
//!
//! This crate provides:
//!
//! - **Literal lexer**: pure readers for every primitive literal
//! - **Arena tree**: ordered parent/child/sibling links by index
//! - **Tree engine**: builds a tree of structures and runs a second
//!   processing pass, delegating kind-specific rules to a [`Grammar`]
//!
//! # Example
//!
//! ```ignore
//! use gex_ddl::{Description, Grammar};
//!
//! let description = Description::parse(MyGrammar::default(), text)?;
//! for child in description.children(description.root()) {
//!     println!("{}", description.structure(child));
//! }
//! ```

pub mod data;
pub mod description;
pub mod error;
pub mod grammar;
pub mod lexer;
mod pow10;
pub mod structure;
pub mod tree;

// Re-export commonly used types
pub use data::{DataType, PrimitiveArray, StructureRef, Value};
pub use description::Description;
pub use error::{DataError, DataResult, DescriptionError, StructureError};
pub use grammar::Grammar;
pub use structure::{Primitive, Structure, StructureKind, MAX_PRIMITIVE_ARRAY_SIZE};
pub use tree::{NodeId, Tree};
