//! GEX Core - Scene grammar, transforms and animation for OpenGEX files.
//!
//! This crate provides:
//!
//! - **Scene structures**: every OpenGEX structure kind as a typed payload
//! - **Normalization**: distance, angle and time units plus up-axis conversion
//! - **Node transforms**: per-node and world transforms cached on load
//! - **Animation**: keyframe curves sampled per clip
//!
//! # Example
//!
//! ```ignore
//! use gex_core::GexDocument;
//!
//! let mut document = GexDocument::load("scene.ogex")?;
//! let (begin, end) = document.time_range(0);
//! document.evaluate(0, (begin + end) * 0.5);
//! for node in document.nodes() {
//!     println!("{:?} {:?}", document.name_of(node), document.world_transform(node));
//! }
//! ```

mod animation;
pub mod document;
pub mod error;
pub mod grammar;
pub mod metrics;
pub mod options;
pub mod structures;

// Re-export commonly used types
pub use document::GexDocument;
pub use error::{GexError, GexResult, LoadError, LoadResult};
pub use grammar::OpenGex;
pub use metrics::{ForwardAxis, Metrics};
pub use options::{LoadOptions, UpAxis};
pub use structures::{GexDescription, GexKind, GexStructure, StructureRules};
