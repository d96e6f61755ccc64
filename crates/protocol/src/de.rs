//! Shared deserialization helpers.

use serde::{Deserialize, Deserializer};

/// Treats an explicit JSON `null` the same as a missing field.
///
/// Older panel builds serialize empty collections as `null`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: Default + Deserialize<'de>,
{
	Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub(crate) fn default_true() -> bool {
	true
}

pub(crate) fn is_zero(value: &i64) -> bool {
	*value == 0
}
