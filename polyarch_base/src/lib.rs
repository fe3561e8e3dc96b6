pub mod error;
pub mod registry;
pub mod type_tag;

pub use error::RegistryError;
pub use registry::{Factory, Polymorphic, Registry};
pub use type_tag::{Pointee, TypeTag};
