//! Response envelope shared by every panel endpoint.

use serde::{Deserialize, Serialize};

/// `{ success, msg, obj }` wrapper returned by all panel API calls.
///
/// A `200 OK` response can still carry `success: false`; callers must check
/// the flag rather than the HTTP status alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
	#[serde(default)]
	pub success: bool,
	#[serde(default)]
	pub msg: String,
	pub obj: Option<T>,
}

impl<T> Envelope<T> {
	/// Returns the server message, or `fallback` when the panel sent none.
	pub fn message_or<'a>(&'a self, fallback: &'a str) -> &'a str {
		if self.msg.trim().is_empty() { fallback } else { &self.msg }
	}
}
