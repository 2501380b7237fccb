//! Patch-payload helper.
//!
//! Distinguishes "field absent" (leave unchanged) from "field: null"
//! (clear it): combine `#[serde(default)]` with this deserializer on an
//! `Option<Option<T>>` field. Absent stays `None`; an explicit null
//! becomes `Some(None)`.

use serde::{Deserialize, Deserializer};

pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
