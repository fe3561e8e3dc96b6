//! Owning pointer slots: `{"id": <type tag>, "data": <object>}`.

use crate::consts::{DATA, ID};
use crate::fields::{expect_end, expect_key};
use crate::{Error, Faults, PtrSlot};
use log::trace;
use polyarch_base::{Factory, Pointee, Polymorphic};
use serde::de::{DeserializeSeed, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt::Formatter;

/// Saves the slot's type tag followed by the object's own fields.
/// An empty slot is saved as `{"id": null}`.
pub struct PointerSaver<'a, O: ?Sized>(&'a PtrSlot<O>);

impl<'a, O: ?Sized> PointerSaver<'a, O> {
    pub fn new(slot: &'a PtrSlot<O>) -> Self {
        PointerSaver(slot)
    }
}

impl<O: ?Sized + Pointee> Serialize for PointerSaver<'_, O> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0.get() {
            Some(object) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry(ID, &Some(object.type_tag()))?;
                map.serialize_entry(DATA, &Data(object))?;
                map.end()
            }
            None => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(ID, &None::<&str>)?;
                map.end()
            }
        }
    }
}

#[repr(transparent)]
struct Data<'a, O: ?Sized>(&'a O);

impl<O: ?Sized + Pointee> Serialize for Data<'_, O> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        erased_serde::serialize(self.0, serializer)
    }
}

/// Loads a slot in place.
///
/// The type tag is resolved through [`Polymorphic::registry`] before anything is constructed;
/// an unregistered tag fails with [`Error::UnknownType`] and leaves the slot untouched.
/// A held object is replaced by the newly constructed one, never reused.
pub struct PointerLoader<'a, O: ?Sized> {
    slot: &'a mut PtrSlot<O>,
    faults: &'a Faults,
}

impl<'a, O: ?Sized> PointerLoader<'a, O> {
    pub fn new(slot: &'a mut PtrSlot<O>, faults: &'a Faults) -> Self {
        PointerLoader { slot, faults }
    }
}

impl<'de, O: ?Sized + Polymorphic> DeserializeSeed<'de> for PointerLoader<'_, O> {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de, O: ?Sized + Polymorphic> Visitor<'de> for PointerLoader<'_, O> {
    type Value = ();

    fn expecting(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "a pointer to {}", O::registry().name())
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<(), A::Error> {
        let registry = O::registry();
        expect_key(&mut map, ID)?;
        let Some(id) = map.next_value::<Option<String>>()? else {
            expect_end(&mut map)?;
            if let Some(released) = self.slot.take() {
                trace!("{}: released `{}`", registry.name(), released.type_tag());
            }
            return Ok(());
        };
        let Some(factory) = registry.get(&id) else {
            return Err(self.faults.raise(Error::UnknownType {
                registry: registry.name(),
                id,
            }));
        };
        expect_key(&mut map, DATA)?;
        let object = map.next_value_seed(Construct(factory))?;
        expect_end(&mut map)?;
        if let Some(released) = self.slot.replace(object) {
            trace!(
                "{}: replaced `{}` with `{}`",
                registry.name(),
                released.type_tag(),
                factory.tag()
            );
        }
        Ok(())
    }
}

struct Construct<'a, O: ?Sized>(&'a Factory<O>);

impl<'de, O: ?Sized> DeserializeSeed<'de> for Construct<'_, O> {
    type Value = Box<O>;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Box<O>, D::Error> {
        self.0.construct(deserializer)
    }
}

#[cfg(test)]
mod tests {
    use super::{PointerLoader, PointerSaver};
    use crate::test_types::{Activation, Relu, Sigmoid};
    use crate::{Error, Faults, PtrSlot};
    use serde::de::DeserializeSeed;
    use serde_json::json;

    fn load(slot: &mut PtrSlot<dyn Activation>, json: &str) -> Result<(), Error> {
        let faults = Faults::new();
        let mut de = serde_json::Deserializer::from_str(json);
        PointerLoader::new(slot, &faults)
            .deserialize(&mut de)
            .map_err(|e| faults.resolve(e))
    }

    #[test]
    fn save_layout() {
        let slot: PtrSlot<dyn Activation> = PtrSlot::new(Box::new(Relu { leak: 0.5 }));
        let value = serde_json::to_value(PointerSaver::new(&slot)).unwrap();
        assert_eq!(value, json!({"id": "relu", "data": {"leak": 0.5}}));

        let empty: PtrSlot<dyn Activation> = PtrSlot::empty();
        let value = serde_json::to_value(PointerSaver::new(&empty)).unwrap();
        assert_eq!(value, json!({"id": null}));
    }

    #[test]
    fn load_into_empty_slot() {
        let mut slot: PtrSlot<dyn Activation> = PtrSlot::empty();
        load(&mut slot, r#"{"id": "sigmoid", "data": {"steepness": 2.0}}"#).unwrap();
        assert_eq!(
            slot.downcast_ref::<Sigmoid>(),
            Some(&Sigmoid { steepness: 2.0 })
        );
        assert_eq!(slot.get().unwrap().apply(0.0), 0.5);
    }

    #[test]
    fn load_replaces_held_object() {
        let mut slot: PtrSlot<dyn Activation> = PtrSlot::new(Box::new(Relu { leak: 0.1 }));
        load(&mut slot, r#"{"id": "sigmoid", "data": {"steepness": 1.0}}"#).unwrap();
        assert_eq!(slot.type_tag(), Some("sigmoid"));
        assert!(slot.downcast_ref::<Relu>().is_none());
    }

    #[test]
    fn unknown_type_leaves_slot_untouched() {
        let mut slot: PtrSlot<dyn Activation> = PtrSlot::new(Box::new(Relu { leak: 0.1 }));
        let err = load(&mut slot, r#"{"id": "softmax", "data": {}}"#).unwrap_err();
        match err {
            Error::UnknownType { registry, id } => {
                assert_eq!(registry, "Activation");
                assert_eq!(id, "softmax");
            }
            e => panic!("unexpected error: {e}"),
        }
        assert_eq!(slot.downcast_ref::<Relu>(), Some(&Relu { leak: 0.1 }));
    }

    #[test]
    fn null_releases_object() {
        let mut slot: PtrSlot<dyn Activation> = PtrSlot::new(Box::new(Relu { leak: 0.1 }));
        load(&mut slot, r#"{"id": null}"#).unwrap();
        assert!(slot.is_empty());
    }

    #[test]
    fn field_order_is_enforced() {
        let mut slot: PtrSlot<dyn Activation> = PtrSlot::empty();
        let err = load(&mut slot, r#"{"data": {"leak": 0.0}, "id": "relu"}"#).unwrap_err();
        assert!(err.is_archive_format());
        assert!(slot.is_empty());
    }

    #[test]
    fn bad_object_data_is_a_format_error() {
        let mut slot: PtrSlot<dyn Activation> = PtrSlot::empty();
        let err = load(&mut slot, r#"{"id": "relu", "data": {"leak": "none"}}"#).unwrap_err();
        assert!(err.is_archive_format());
        assert!(slot.is_empty());
    }
}
