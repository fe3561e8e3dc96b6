//! Tagged union values: `{"which": <index>, "data" | "ptr_wrapper": <payload>}`.

use crate::consts::{DATA, PTR_WRAPPER, WHICH};
use crate::fields::{expect_end, expect_key};
use crate::pointer::{PointerLoader, PointerSaver};
use crate::{Error, Faults, PtrSlot};
use polyarch_base::Polymorphic;
use serde::de::{self, DeserializeOwned, DeserializeSeed, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt::Formatter;

/// A value holding exactly one of a fixed list of alternatives.
///
/// Usually derived with `#[derive(TaggedUnion)]` on an enum whose variants hold one
/// [`Alternative`] each; the default value is the first alternative.
pub trait TaggedUnion: Default {
    /// Names of the declared alternatives, in discriminant order.
    const ALTERNATIVES: &'static [&'static str];

    /// Index of the active alternative.
    fn which(&self) -> usize;

    /// Write the active payload as one map entry.
    fn save_active<M: SerializeMap>(&self, map: &mut M) -> Result<(), M::Error>;

    /// Make alternative `which` active and read its payload from the next map entry.
    ///
    /// An already active alternative is loaded in place. Otherwise a default payload is
    /// loaded first and only activated on success, so a failed load keeps the previous one.
    fn load_active<'de, A: MapAccess<'de>>(
        &mut self,
        which: usize,
        map: &mut A,
        faults: &Faults,
    ) -> Result<(), A::Error>;

    fn alternative_name(&self) -> &'static str {
        Self::ALTERNATIVES[self.which()]
    }
}

/// Payload of one tagged union alternative.
///
/// Every serde value is an alternative stored under `data`; owning pointer
/// slots are stored under `ptr_wrapper`.
pub trait Alternative: Default {
    const FIELD: &'static str;

    fn save<M: SerializeMap>(&self, map: &mut M) -> Result<(), M::Error>;

    fn load<'de, A: MapAccess<'de>>(&mut self, map: &mut A, faults: &Faults) -> Result<(), A::Error>;
}

impl<T> Alternative for T
where
    T: Serialize + DeserializeOwned + Default,
{
    const FIELD: &'static str = DATA;

    fn save<M: SerializeMap>(&self, map: &mut M) -> Result<(), M::Error> {
        map.serialize_entry(DATA, self)
    }

    fn load<'de, A: MapAccess<'de>>(&mut self, map: &mut A, _faults: &Faults) -> Result<(), A::Error> {
        expect_key(map, DATA)?;
        *self = map.next_value()?;
        Ok(())
    }
}

impl<O: ?Sized + Polymorphic> Alternative for PtrSlot<O> {
    const FIELD: &'static str = PTR_WRAPPER;

    fn save<M: SerializeMap>(&self, map: &mut M) -> Result<(), M::Error> {
        map.serialize_entry(PTR_WRAPPER, &PointerSaver::new(self))
    }

    fn load<'de, A: MapAccess<'de>>(&mut self, map: &mut A, faults: &Faults) -> Result<(), A::Error> {
        expect_key(map, PTR_WRAPPER)?;
        map.next_value_seed(PointerLoader::new(self, faults))
    }
}

#[doc(hidden)]
pub fn unknown_variant<E: de::Error>(which: usize, alternatives: usize, faults: &Faults) -> E {
    faults.raise(Error::UnknownVariant {
        which: which as u64,
        alternatives,
    })
}

pub struct VariantSaver<'a, U>(&'a U);

impl<'a, U> VariantSaver<'a, U> {
    pub fn new(value: &'a U) -> Self {
        VariantSaver(value)
    }
}

impl<U: TaggedUnion> Serialize for VariantSaver<'_, U> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(WHICH, &(self.0.which() as u64))?;
        self.0.save_active(&mut map)?;
        map.end()
    }
}

/// Loads a tagged union in place.
///
/// The discriminant is range checked before any alternative is touched;
/// an out of range value fails with [`Error::UnknownVariant`].
pub struct VariantLoader<'a, U> {
    target: &'a mut U,
    faults: &'a Faults,
}

impl<'a, U> VariantLoader<'a, U> {
    pub fn new(target: &'a mut U, faults: &'a Faults) -> Self {
        VariantLoader { target, faults }
    }
}

impl<'de, U: TaggedUnion> DeserializeSeed<'de> for VariantLoader<'_, U> {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de, U: TaggedUnion> Visitor<'de> for VariantLoader<'_, U> {
    type Value = ();

    fn expecting(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "one of {:?}", U::ALTERNATIVES)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<(), A::Error> {
        expect_key(&mut map, WHICH)?;
        let which: u64 = map.next_value()?;
        let alternatives = U::ALTERNATIVES.len();
        let index = match usize::try_from(which) {
            Ok(index) if index < alternatives => index,
            _ => {
                return Err(self.faults.raise(Error::UnknownVariant {
                    which,
                    alternatives,
                }))
            }
        };
        self.target.load_active(index, &mut map, self.faults)?;
        expect_end(&mut map)
    }
}

#[cfg(test)]
mod tests {
    use super::{TaggedUnion, VariantLoader, VariantSaver};
    use crate::test_types::{relu, sigmoid, Node, Relu, Sigmoid};
    use crate::{Error, Faults};
    use serde::de::DeserializeSeed;
    use serde_json::json;

    fn load(node: &mut Node, json: &str) -> Result<(), Error> {
        let faults = Faults::new();
        let mut de = serde_json::Deserializer::from_str(json);
        VariantLoader::new(node, &faults)
            .deserialize(&mut de)
            .map_err(|e| faults.resolve(e))
    }

    #[test]
    fn derived_alternatives() {
        assert_eq!(Node::ALTERNATIVES, &["Activation", "Bias", "Name"]);
        assert_eq!(Node::Bias(1.0).which(), 1);
        assert_eq!(Node::Name("fc1".into()).alternative_name(), "Name");
        assert!(matches!(Node::default(), Node::Activation(slot) if slot.is_empty()));
    }

    #[test]
    fn save_layout() {
        let value = serde_json::to_value(VariantSaver::new(&relu(0.25))).unwrap();
        assert_eq!(
            value,
            json!({"which": 0, "ptr_wrapper": {"id": "relu", "data": {"leak": 0.25}}})
        );

        let value = serde_json::to_value(VariantSaver::new(&Node::Bias(1.5))).unwrap();
        assert_eq!(value, json!({"which": 1, "data": 1.5}));
    }

    #[test]
    fn switch_alternative() {
        let mut node = Node::Bias(3.0);
        load(
            &mut node,
            r#"{"which": 0, "ptr_wrapper": {"id": "sigmoid", "data": {"steepness": 4.0}}}"#,
        )
        .unwrap();
        let Node::Activation(slot) = &node else {
            panic!("expected activation, got {node:?}");
        };
        assert_eq!(
            slot.downcast_ref::<Sigmoid>(),
            Some(&Sigmoid { steepness: 4.0 })
        );

        load(&mut node, r#"{"which": 2, "data": "output"}"#).unwrap();
        assert!(matches!(&node, Node::Name(name) if name == "output"));
    }

    #[test]
    fn active_pointer_is_replaced() {
        let mut node = sigmoid(1.0);
        load(
            &mut node,
            r#"{"which": 0, "ptr_wrapper": {"id": "relu", "data": {"leak": 0.0}}}"#,
        )
        .unwrap();
        let Node::Activation(slot) = &node else {
            panic!("expected activation, got {node:?}");
        };
        assert_eq!(slot.downcast_ref::<Relu>(), Some(&Relu { leak: 0.0 }));
    }

    #[test]
    fn unknown_variant_keeps_previous_value() {
        let mut node = Node::Bias(2.0);
        let err = load(&mut node, r#"{"which": 3, "data": 1.0}"#).unwrap_err();
        assert!(matches!(
            err,
            Error::UnknownVariant {
                which: 3,
                alternatives: 3
            }
        ));
        assert!(matches!(node, Node::Bias(b) if b == 2.0));
    }

    #[test]
    fn failed_payload_keeps_previous_alternative() {
        let mut node = Node::Bias(2.0);
        let err = load(
            &mut node,
            r#"{"which": 0, "ptr_wrapper": {"id": "gelu", "data": {}}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnknownType { .. }));
        assert!(matches!(node, Node::Bias(b) if b == 2.0));
    }

    #[test]
    fn payload_field_must_match_alternative() {
        let mut node = Node::default();
        let err = load(&mut node, r#"{"which": 1, "ptr_wrapper": {"id": null}}"#).unwrap_err();
        assert!(err.is_archive_format());
        assert!(matches!(&node, Node::Activation(slot) if slot.is_empty()));
    }
}
