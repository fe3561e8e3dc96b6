use std::any::Any;

/// Stable identifier of a concrete type, written next to its data so that the
/// same type can be constructed again when loading.
pub trait TypeTag {
    const TAG: &'static str;
}

/// Object safe face of a tagged concrete type.
///
/// Make it a supertrait of the trait that is stored behind an owning pointer slot:
/// ```
/// use polyarch_base::{Pointee, TypeTag};
///
/// trait Shape: Pointee {
///     fn area(&self) -> f64;
/// }
///
/// #[derive(serde::Serialize)]
/// struct Square(f64);
///
/// impl TypeTag for Square {
///     const TAG: &'static str = "square";
/// }
///
/// impl Shape for Square {
///     fn area(&self) -> f64 {
///         self.0 * self.0
///     }
/// }
///
/// let shape: Box<dyn Shape> = Box::new(Square(2.0));
/// assert_eq!(shape.type_tag(), "square");
/// ```
pub trait Pointee: erased_serde::Serialize + Any {
    /// Tag of the concrete runtime type.
    fn type_tag(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;
}

impl<T> Pointee for T
where
    T: TypeTag + serde::Serialize + Any,
{
    fn type_tag(&self) -> &'static str {
        T::TAG
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
