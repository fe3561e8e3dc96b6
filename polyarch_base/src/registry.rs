use crate::{Pointee, RegistryError, TypeTag};
use log::trace;
use serde::de::{DeserializeOwned, Deserializer, Error as _};
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};

type ConstructFn<O> = dyn Fn(&mut dyn erased_serde::Deserializer<'_>) -> Result<Box<O>, erased_serde::Error>
    + Send
    + Sync;

fn boxed<O: ?Sized, F>(f: F) -> Box<ConstructFn<O>>
where
    F: Fn(&mut dyn erased_serde::Deserializer<'_>) -> Result<Box<O>, erased_serde::Error>
        + Send
        + Sync
        + 'static,
{
    Box::new(f)
}

/// Trait object types that can be stored behind an owning pointer slot and loaded back.
///
/// Every registry is built once, ahead of any load, and then only read.
/// Use [`crate::polymorphic!`] to implement it.
pub trait Polymorphic: Pointee + 'static {
    fn registry() -> &'static Registry<Self>;
}

/// Constructs one concrete type and hands it out as `Box<O>`.
pub struct Factory<O: ?Sized> {
    tag: &'static str,
    construct: Box<ConstructFn<O>>,
}

impl<O: ?Sized> Factory<O> {
    pub fn tag(&self) -> &'static str {
        self.tag
    }

    /// Deserialize the concrete type from `deserializer` and box it.
    pub fn construct<'de, D: Deserializer<'de>>(&self, deserializer: D) -> Result<Box<O>, D::Error> {
        let mut erased = <dyn erased_serde::Deserializer>::erase(deserializer);
        (self.construct)(&mut erased).map_err(D::Error::custom)
    }
}

impl<O: ?Sized> Debug for Factory<O> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Factory").field("tag", &self.tag).finish()
    }
}

/// Type tag -> factory map for one trait object type `O`.
pub struct Registry<O: ?Sized> {
    name: &'static str,
    factories: HashMap<&'static str, Factory<O>>,
}

impl<O: ?Sized + 'static> Registry<O> {
    pub fn new(name: &'static str) -> Self {
        Registry {
            name,
            factories: HashMap::new(),
        }
    }

    /// Register concrete type `T` under [`TypeTag::TAG`].
    ///
    /// `upcast` turns the loaded `Box<T>` into `Box<O>`, usually `|b| b`.
    pub fn register<T>(&mut self, upcast: fn(Box<T>) -> Box<O>) -> Result<&mut Self, RegistryError>
    where
        T: TypeTag + DeserializeOwned + 'static,
    {
        if self.factories.contains_key(T::TAG) {
            return Err(RegistryError::DuplicateTag {
                registry: self.name,
                tag: T::TAG,
            });
        }
        trace!("{}: register `{}`", self.name, T::TAG);
        let construct = boxed(move |deserializer| {
            let value: T = erased_serde::deserialize(deserializer)?;
            Ok(upcast(Box::new(value)))
        });
        self.factories.insert(
            T::TAG,
            Factory {
                tag: T::TAG,
                construct,
            },
        );
        Ok(self)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn get(&self, tag: &str) -> Option<&Factory<O>> {
        self.factories.get(tag)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.factories.contains_key(tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl<O: ?Sized> Debug for Registry<O> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut tags: Vec<&str> = self.factories.keys().copied().collect();
        tags.sort_unstable();
        f.debug_struct("Registry")
            .field("name", &self.name)
            .field("tags", &tags)
            .finish()
    }
}

/// Last segment of a stringified trait path, `shapes::Shape` -> `Shape`.
#[doc(hidden)]
pub fn trait_name(path: &'static str) -> &'static str {
    path.rsplit("::").next().unwrap_or(path).trim()
}

/// Implement [`Polymorphic`] for `dyn Trait` with a lazily built registry of the listed types.
///
/// The registry is named after the last segment of the trait path.
/// ```
/// use polyarch_base::{polymorphic, Polymorphic, TypeTag};
///
/// mod shapes {
///     pub trait Shape: polyarch_base::Pointee {}
/// }
///
/// #[derive(serde::Serialize, serde::Deserialize)]
/// struct Circle {
///     r: f32,
/// }
/// impl TypeTag for Circle {
///     const TAG: &'static str = "circle";
/// }
/// impl shapes::Shape for Circle {}
///
/// #[derive(serde::Serialize, serde::Deserialize)]
/// struct Square {
///     side: f32,
/// }
/// impl TypeTag for Square {
///     const TAG: &'static str = "square";
/// }
/// impl shapes::Shape for Square {}
///
/// polymorphic!(dyn shapes::Shape { Circle, Square });
///
/// let registry = <dyn shapes::Shape>::registry();
/// assert_eq!(registry.name(), "Shape");
/// assert!(registry.contains("circle") && registry.contains("square"));
/// ```
/// Registering the same tag twice is a programming error and panics on first use.
#[macro_export]
macro_rules! polymorphic {
    (dyn $tr:path { $($ty:ty),* $(,)? }) => {
        impl $crate::Polymorphic for dyn $tr {
            fn registry() -> &'static $crate::Registry<Self> {
                static REGISTRY: ::std::sync::LazyLock<$crate::Registry<dyn $tr>> =
                    ::std::sync::LazyLock::new(|| {
                        let mut registry: $crate::Registry<dyn $tr> =
                            $crate::Registry::new($crate::registry::trait_name(stringify!($tr)));
                        $(
                            if let Err(e) = registry.register::<$ty>(|b| b) {
                                panic!("{e}");
                            }
                        )*
                        registry
                    });
                &REGISTRY
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::Registry;
    use crate::{Pointee, Polymorphic, RegistryError, TypeTag};
    use serde::{Deserialize, Serialize};

    trait Layer: Pointee {
        fn width(&self) -> usize;
    }

    #[derive(Serialize, Deserialize)]
    struct Linear {
        width: usize,
    }

    impl TypeTag for Linear {
        const TAG: &'static str = "linear";
    }

    impl Layer for Linear {
        fn width(&self) -> usize {
            self.width
        }
    }

    #[derive(Serialize, Deserialize)]
    struct Identity;

    impl TypeTag for Identity {
        const TAG: &'static str = "identity";
    }

    impl Layer for Identity {
        fn width(&self) -> usize {
            0
        }
    }

    crate::polymorphic!(dyn Layer { Linear, Identity });

    #[test]
    fn duplicate_tag() {
        let mut registry: Registry<dyn Layer> = Registry::new("Layer");
        registry.register::<Linear>(|b| b).unwrap();
        let err = registry.register::<Linear>(|b| b).unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateTag {
                registry: "Layer",
                tag: "linear"
            }
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn construct_from_json() {
        let registry = <dyn Layer>::registry();
        assert_eq!(registry.name(), "Layer");
        assert!(registry.contains("linear"));
        assert!(!registry.contains("conv"));

        let factory = registry.get("linear").unwrap();
        let mut de = serde_json::Deserializer::from_str(r#"{"width": 12}"#);
        let layer = factory.construct(&mut de).unwrap();
        assert_eq!(layer.width(), 12);
        assert_eq!(layer.type_tag(), "linear");
    }

    #[test]
    fn construct_propagates_data_errors() {
        let factory = <dyn Layer>::registry().get("linear").unwrap();
        let mut de = serde_json::Deserializer::from_str(r#"{"width": "wide"}"#);
        assert!(factory.construct(&mut de).is_err());
    }

    #[test]
    fn registry_named_after_last_path_segment() {
        assert_eq!(super::trait_name("Layer"), "Layer");
        assert_eq!(super::trait_name("nn::layers::Layer"), "Layer");
        assert_eq!(super::trait_name("nn :: Layer"), "Layer");
    }

    #[test]
    fn tags_listing() {
        let mut tags: Vec<&str> = <dyn Layer>::registry().tags().collect();
        tags.sort_unstable();
        assert_eq!(tags, ["identity", "linear"]);
    }
}
