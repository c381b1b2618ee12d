//! Serde helpers for records exchanged with the flight API

use serde::{Deserialize, Deserializer};

/// Decode a list that may be sent as `null`; missing and `null` both give `[]`.
///
/// Use together with `#[serde(default)]` so an absent key is accepted too.
pub fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
