//! Typed partial-update records.
//!
//! Update payloads distinguish three states per field: absent (keep the
//! stored value), JSON `null` (write NULL where the column allows it),
//! and a concrete value. [`Patch`] makes that tri-state explicit instead
//! of merging loose payload objects into the row.

use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Patch<T> {
    /// Field absent from the payload; stored value is kept.
    Missing,
    /// Field explicitly `null`; column is set to NULL.
    Null,
    /// Field present; column is set to this value.
    Value(T),
}

// Manual impl: the derive would demand `T: Default` for no reason.
impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Missing
    }
}

impl<T> Patch<T> {
    pub fn is_missing(&self) -> bool {
        matches!(self, Patch::Missing)
    }
}

// A present field deserializes through Option: `null` -> Null, value ->
// Value. Absent fields never reach this impl; `#[serde(default)]` on the
// field yields Missing.
impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(v) => Patch::Value(v),
            None => Patch::Null,
        })
    }
}

/// Accepts a JSON number or a numeric string. Clients of the original
/// API send prices and years both ways; coercion happens here, before
/// anything touches the store.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Int(i64),
    Float(f64),
    Text(String),
}

fn to_f64<E: serde::de::Error>(raw: RawNumber) -> Result<f64, E> {
    match raw {
        RawNumber::Int(n) => Ok(n as f64),
        RawNumber::Float(n) => Ok(n),
        RawNumber::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| E::custom(format!("invalid decimal: {s:?}"))),
    }
}

fn to_i32<E: serde::de::Error>(raw: RawNumber) -> Result<i32, E> {
    let n = match raw {
        RawNumber::Int(n) => n,
        RawNumber::Float(n) if n.fract() == 0.0 => n as i64,
        RawNumber::Float(n) => return Err(E::custom(format!("invalid year: {n}"))),
        RawNumber::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| E::custom(format!("invalid year: {s:?}")))?,
    };
    i32::try_from(n).map_err(|_| E::custom(format!("year out of range: {n}")))
}

pub fn patch_decimal<'de, D>(deserializer: D) -> Result<Patch<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<RawNumber>::deserialize(deserializer)? {
        Some(raw) => Patch::Value(to_f64(raw)?),
        None => Patch::Null,
    })
}

pub fn patch_year<'de, D>(deserializer: D) -> Result<Patch<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<RawNumber>::deserialize(deserializer)? {
        Some(raw) => Patch::Value(to_i32(raw)?),
        None => Patch::Null,
    })
}

pub fn opt_decimal<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<RawNumber>::deserialize(deserializer)?
        .map(to_f64)
        .transpose()
}

pub fn opt_year<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<RawNumber>::deserialize(deserializer)?
        .map(to_i32)
        .transpose()
}
