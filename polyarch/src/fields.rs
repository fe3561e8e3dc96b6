//! Order dependent field access on top of serde's map interface.

use serde::de::{Error, MapAccess};

/// Next key must be `name`.
pub(crate) fn expect_key<'de, A: MapAccess<'de>>(map: &mut A, name: &str) -> Result<(), A::Error> {
    match map.next_key::<String>()? {
        Some(key) if key == name => Ok(()),
        Some(key) => Err(A::Error::custom(format_args!(
            "expected field `{name}`, found `{key}`"
        ))),
        None => Err(A::Error::custom(format_args!("missing field `{name}`"))),
    }
}

/// No keys may follow.
pub(crate) fn expect_end<'de, A: MapAccess<'de>>(map: &mut A) -> Result<(), A::Error> {
    match map.next_key::<String>()? {
        Some(key) => Err(A::Error::custom(format_args!("unexpected field `{key}`"))),
        None => Ok(()),
    }
}
