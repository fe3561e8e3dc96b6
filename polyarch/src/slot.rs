use polyarch_base::Pointee;
use std::fmt::{Debug, Formatter};

/// Nullable, exclusively owned, heap allocated polymorphic object.
///
/// Loading into a slot never reuses the object it already holds: the new object is
/// constructed first and then replaces the old one, which is dropped.
pub struct PtrSlot<O: ?Sized>(Option<Box<O>>);

impl<O: ?Sized> PtrSlot<O> {
    pub const fn empty() -> Self {
        PtrSlot(None)
    }

    pub fn new(object: Box<O>) -> Self {
        PtrSlot(Some(object))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    pub fn get(&self) -> Option<&O> {
        self.0.as_deref()
    }

    pub fn get_mut(&mut self) -> Option<&mut O> {
        self.0.as_deref_mut()
    }

    /// Put `object` into the slot, returning the previous one.
    pub fn replace(&mut self, object: Box<O>) -> Option<Box<O>> {
        self.0.replace(object)
    }

    pub fn take(&mut self) -> Option<Box<O>> {
        self.0.take()
    }

    pub fn into_inner(self) -> Option<Box<O>> {
        self.0
    }
}

impl<O: ?Sized + Pointee> PtrSlot<O> {
    /// Tag of the held object's concrete type.
    pub fn type_tag(&self) -> Option<&'static str> {
        self.get().map(|object| object.type_tag())
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.get()?.as_any().downcast_ref()
    }
}

impl<O: ?Sized> Default for PtrSlot<O> {
    fn default() -> Self {
        PtrSlot::empty()
    }
}

impl<O: ?Sized> From<Box<O>> for PtrSlot<O> {
    fn from(object: Box<O>) -> Self {
        PtrSlot::new(object)
    }
}

impl<O: ?Sized> From<Option<Box<O>>> for PtrSlot<O> {
    fn from(object: Option<Box<O>>) -> Self {
        PtrSlot(object)
    }
}

impl<O: ?Sized + Debug> Debug for PtrSlot<O> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Some(object) => f.debug_tuple("PtrSlot").field(object).finish(),
            None => f.write_str("PtrSlot(null)"),
        }
    }
}
