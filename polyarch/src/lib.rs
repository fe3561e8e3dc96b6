//! Save and load in place collections of polymorphic values.
//!
//! Three layers are stacked on top of any serde data format:
//! * [`PtrSlot`]: an owning pointer to a trait object, stored with its registered type tag,
//! * [`TaggedUnion`]: one of a fixed list of alternatives, stored with its discriminant,
//! * sequences of either, stored with their length followed by `item{i}` entries.
//!
//! ```
//! use polyarch::{polymorphic, Format, Pointee, PtrSlot, TaggedUnion, TypeTag};
//! use serde::{Deserialize, Serialize};
//!
//! pub trait Shape: Pointee {}
//!
//! #[derive(Serialize, Deserialize, TypeTag)]
//! #[type_tag = "circle"]
//! struct Circle {
//!     r: f32,
//! }
//! impl Shape for Circle {}
//!
//! polymorphic!(dyn Shape { Circle });
//!
//! #[derive(TaggedUnion)]
//! enum Item {
//!     Shape(PtrSlot<dyn Shape>),
//!     Label(String),
//! }
//!
//! let items = vec![
//!     Item::Shape(PtrSlot::new(Box::new(Circle { r: 1.0 }))),
//!     Item::Label("origin".into()),
//! ];
//! let bytes = Format::Json.save(&items).unwrap();
//!
//! let mut loaded: Vec<Item> = Vec::new();
//! Format::Json.load(&mut loaded, &bytes).unwrap();
//! assert_eq!(loaded.len(), 2);
//! ```

extern crate self as polyarch;

pub mod archive;
pub mod consts;
pub mod error;
mod fault;
mod fields;
pub mod pointer;
pub mod sequence;
pub mod slot;
pub mod variant;

#[cfg(test)]
mod test_types;

pub use archive::{load_file, save_file, Format};
pub use error::Error;
pub use fault::Faults;
pub use pointer::{PointerLoader, PointerSaver};
pub use polyarch_base::{polymorphic, Factory, Pointee, Polymorphic, Registry, RegistryError, TypeTag};
pub use polyarch_derive::{TaggedUnion, TypeTag};
pub use sequence::{load_sequence, save_sequence, Element, SequenceLoader, SequenceSaver};
pub use slot::PtrSlot;
pub use variant::{Alternative, TaggedUnion, VariantLoader, VariantSaver};

#[doc(hidden)]
pub use serde;
