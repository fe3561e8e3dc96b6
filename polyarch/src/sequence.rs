//! Ordered sequences: `{"vecSize": n, "item0": .., "item1": .., ..}`.

use crate::consts::{item_key, VEC_SIZE};
use crate::fields::{expect_end, expect_key};
use crate::pointer::{PointerLoader, PointerSaver};
use crate::variant::{TaggedUnion, VariantLoader, VariantSaver};
use crate::{Error, Faults, PtrSlot};
use log::debug;
use polyarch_base::Polymorphic;
use serde::de::{DeserializeSeed, Deserializer, Error as _, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt::Formatter;

/// Something a sequence can hold: tagged union values or bare pointer slots.
pub trait Element: Default {
    fn save_element<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error>;

    fn load_element<'de, D: Deserializer<'de>>(
        &mut self,
        deserializer: D,
        faults: &Faults,
    ) -> Result<(), D::Error>;
}

impl<U: TaggedUnion> Element for U {
    fn save_element<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        VariantSaver::new(self).serialize(serializer)
    }

    fn load_element<'de, D: Deserializer<'de>>(
        &mut self,
        deserializer: D,
        faults: &Faults,
    ) -> Result<(), D::Error> {
        VariantLoader::new(self, faults).deserialize(deserializer)
    }
}

impl<O: ?Sized + Polymorphic> Element for PtrSlot<O> {
    fn save_element<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        PointerSaver::new(self).serialize(serializer)
    }

    fn load_element<'de, D: Deserializer<'de>>(
        &mut self,
        deserializer: D,
        faults: &Faults,
    ) -> Result<(), D::Error> {
        PointerLoader::new(self, faults).deserialize(deserializer)
    }
}

/// Writes the element count, then every element in order.
pub struct SequenceSaver<'a, E>(&'a [E]);

impl<'a, E> SequenceSaver<'a, E> {
    pub fn new(sequence: &'a [E]) -> Self {
        SequenceSaver(sequence)
    }
}

impl<E: Element> Serialize for SequenceSaver<'_, E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len() + 1))?;
        map.serialize_entry(VEC_SIZE, &(self.0.len() as u64))?;
        for (index, element) in self.0.iter().enumerate() {
            map.serialize_entry(&item_key(index), &ElementSaver(element))?;
        }
        map.end()
    }
}

struct ElementSaver<'a, E>(&'a E);

impl<E: Element> Serialize for ElementSaver<'_, E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.save_element(serializer)
    }
}

/// Loads a sequence in place.
///
/// The target is resized to the stored count first: new elements are default
/// constructed, extra trailing elements are dropped. A count the target cannot
/// grow to is a format error. Elements are then loaded
/// in order. When one fails the error is returned as is and the elements before
/// it stay loaded; there is no rollback.
pub struct SequenceLoader<'a, E> {
    target: &'a mut Vec<E>,
    faults: &'a Faults,
}

impl<'a, E> SequenceLoader<'a, E> {
    pub fn new(target: &'a mut Vec<E>, faults: &'a Faults) -> Self {
        SequenceLoader { target, faults }
    }
}

impl<'de, E: Element> DeserializeSeed<'de> for SequenceLoader<'_, E> {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de, E: Element> Visitor<'de> for SequenceLoader<'_, E> {
    type Value = ();

    fn expecting(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "a sequence starting with `{VEC_SIZE}`")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<(), A::Error> {
        expect_key(&mut map, VEC_SIZE)?;
        let len: u64 = map.next_value()?;
        let len = usize::try_from(len).map_err(A::Error::custom)?;
        if len != self.target.len() {
            debug!("resize sequence {} -> {len}", self.target.len());
        }
        if let Some(additional) = len.checked_sub(self.target.len()) {
            self.target
                .try_reserve_exact(additional)
                .map_err(|e| A::Error::custom(format_args!("`{VEC_SIZE}` {len}: {e}")))?;
        }
        self.target.resize_with(len, E::default);
        for (index, element) in self.target.iter_mut().enumerate() {
            expect_key(&mut map, &item_key(index))?;
            map.next_value_seed(ElementLoader {
                element,
                faults: self.faults,
            })?;
        }
        expect_end(&mut map)
    }
}

struct ElementLoader<'a, E> {
    element: &'a mut E,
    faults: &'a Faults,
}

impl<'de, E: Element> DeserializeSeed<'de> for ElementLoader<'_, E> {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        self.element.load_element(deserializer, self.faults)
    }
}

/// Save `sequence` with any serde data format.
pub fn save_sequence<E: Element, S: Serializer>(
    sequence: &[E],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    SequenceSaver::new(sequence).serialize(serializer)
}

/// Load `sequence` in place from any serde data format.
///
/// Backend errors are reported as [`Error::ArchiveFormat`], use [`crate::Format`]
/// to keep the backend's own error type.
pub fn load_sequence<'de, E: Element, D: Deserializer<'de>>(
    sequence: &mut Vec<E>,
    deserializer: D,
) -> Result<(), Error> {
    let faults = Faults::new();
    SequenceLoader::new(sequence, &faults)
        .deserialize(deserializer)
        .map_err(|e| faults.take().unwrap_or_else(|| Error::ArchiveFormat(e.to_string())))
}
