use crate::pointer::{PointerLoader, PointerSaver};
use crate::sequence::{Element, SequenceLoader, SequenceSaver};
use crate::variant::{TaggedUnion, VariantLoader, VariantSaver};
use crate::{Error, Faults, PtrSlot};
use bincode::Options;
use log::trace;
use polyarch_base::{Pointee, Polymorphic};
use ron::ser::PrettyConfig;
use serde::de::DeserializeSeed;
use serde::Serialize;
use std::path::Path;

/// Archive backend.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Format {
    Json,
    JsonPretty,
    Ron,
    /// bincode with its default options (varint integers, trailing bytes rejected).
    Bincode,
}

impl Format {
    /// Pick a format from the file extension: `json`, `ron`, `bin` or `bincode`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Format, Error> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match extension.as_deref() {
            Some("json") => Ok(Format::Json),
            Some("ron") => Ok(Format::Ron),
            Some("bin") | Some("bincode") => Ok(Format::Bincode),
            _ => Err(Error::UnknownFormat(path.display().to_string())),
        }
    }

    pub fn serialize<T: Serialize + ?Sized>(self, value: &T) -> Result<Vec<u8>, Error> {
        let bytes = match self {
            Format::Json => serde_json::to_vec(value)?,
            Format::JsonPretty => serde_json::to_vec_pretty(value)?,
            Format::Ron => ron::ser::to_string_pretty(value, PrettyConfig::default())?.into_bytes(),
            Format::Bincode => bincode::DefaultOptions::new().serialize(value)?,
        };
        Ok(bytes)
    }

    /// Drive `seed` over the whole of `bytes`.
    ///
    /// A cause recorded in `faults` takes precedence over the backend error it was
    /// reported through.
    pub fn deserialize_seed<'de, S: DeserializeSeed<'de>>(
        self,
        bytes: &'de [u8],
        seed: S,
        faults: &Faults,
    ) -> Result<S::Value, Error> {
        match self {
            Format::Json | Format::JsonPretty => {
                let mut de = serde_json::Deserializer::from_slice(bytes);
                let value = seed.deserialize(&mut de).map_err(|e| faults.resolve(e))?;
                de.end()?;
                Ok(value)
            }
            Format::Ron => {
                let mut de = ron::Deserializer::from_bytes(bytes)?;
                let value = seed.deserialize(&mut de).map_err(|e| faults.resolve(e))?;
                de.end()?;
                Ok(value)
            }
            Format::Bincode => bincode::DefaultOptions::new()
                .deserialize_seed(seed, bytes)
                .map_err(|e| faults.resolve(e)),
        }
    }

    pub fn save<E: Element>(self, sequence: &[E]) -> Result<Vec<u8>, Error> {
        trace!("save {} elements as {self:?}", sequence.len());
        self.serialize(&SequenceSaver::new(sequence))
    }

    /// Load into `sequence`, see [`SequenceLoader`] for the in place semantics.
    pub fn load<E: Element>(self, sequence: &mut Vec<E>, bytes: &[u8]) -> Result<(), Error> {
        let faults = Faults::new();
        self.deserialize_seed(bytes, SequenceLoader::new(sequence, &faults), &faults)
    }

    pub fn save_union<U: TaggedUnion>(self, value: &U) -> Result<Vec<u8>, Error> {
        self.serialize(&VariantSaver::new(value))
    }

    pub fn load_union<U: TaggedUnion>(self, value: &mut U, bytes: &[u8]) -> Result<(), Error> {
        let faults = Faults::new();
        self.deserialize_seed(bytes, VariantLoader::new(value, &faults), &faults)
    }

    pub fn save_pointer<O: ?Sized + Pointee>(self, slot: &PtrSlot<O>) -> Result<Vec<u8>, Error> {
        self.serialize(&PointerSaver::new(slot))
    }

    pub fn load_pointer<O: ?Sized + Polymorphic>(
        self,
        slot: &mut PtrSlot<O>,
        bytes: &[u8],
    ) -> Result<(), Error> {
        let faults = Faults::new();
        self.deserialize_seed(bytes, PointerLoader::new(slot, &faults), &faults)
    }
}

/// Save `sequence` to `path`, the format is chosen by [`Format::from_path`].
pub fn save_file<E: Element>(path: impl AsRef<Path>, sequence: &[E]) -> Result<(), Error> {
    let path = path.as_ref();
    let bytes = Format::from_path(path)?.save(sequence)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Load `sequence` from `path`, the format is chosen by [`Format::from_path`].
pub fn load_file<E: Element>(path: impl AsRef<Path>, sequence: &mut Vec<E>) -> Result<(), Error> {
    let path = path.as_ref();
    let format = Format::from_path(path)?;
    let bytes = std::fs::read(path)?;
    format.load(sequence, &bytes)
}
