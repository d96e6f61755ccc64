//! Decoded form of an inbound's `streamSettings` string.
//!
//! Panel versions disagree on where some fields live (the REALITY public key
//! has moved between `realitySettings.settings` and `realitySettings`), so
//! every field here is optional and lookups go through accessors that search
//! the known locations in order.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Transport and security configuration of an inbound.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StreamSettings {
	pub network: Option<String>,
	pub security: Option<String>,
	pub reality_settings: Option<RealitySettings>,
	pub tls_settings: Option<TlsSettings>,
	pub ws_settings: Option<WsSettings>,
	pub grpc_settings: Option<GrpcSettings>,
}

impl StreamSettings {
	/// Transport network, `"tcp"` when absent.
	pub fn network(&self) -> &str {
		non_empty(self.network.as_deref()).unwrap_or("tcp")
	}

	/// Security layer, `"none"` when absent.
	pub fn security(&self) -> &str {
		non_empty(self.security.as_deref()).unwrap_or("none")
	}
}

/// `realitySettings` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RealitySettings {
	/// Client-facing parameters (newer panels).
	pub settings: Option<RealityClientSettings>,
	/// Flat public key (older panels).
	pub public_key: Option<String>,
	pub fingerprint: Option<String>,
	pub server_names: Option<Vec<String>>,
	pub short_ids: Option<Vec<String>>,
}

impl RealitySettings {
	/// Public key, searched under `settings` first and then flat.
	pub fn public_key(&self) -> Option<&str> {
		let nested = self.settings.as_ref().and_then(|s| non_empty(s.public_key.as_deref()));
		nested.or_else(|| non_empty(self.public_key.as_deref()))
	}

	/// Client fingerprint, searched under `settings` first and then flat.
	pub fn fingerprint(&self) -> Option<&str> {
		let nested = self.settings.as_ref().and_then(|s| non_empty(s.fingerprint.as_deref()));
		nested.or_else(|| non_empty(self.fingerprint.as_deref()))
	}

	pub fn first_server_name(&self) -> Option<&str> {
		self.server_names.as_ref().and_then(|names| names.first()).map(String::as_str)
	}

	pub fn first_short_id(&self) -> Option<&str> {
		self.short_ids.as_ref().and_then(|ids| ids.first()).map(String::as_str)
	}
}

/// `realitySettings.settings` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RealityClientSettings {
	pub public_key: Option<String>,
	pub fingerprint: Option<String>,
	pub server_name: Option<String>,
	pub spider_x: Option<String>,
}

/// `tlsSettings` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TlsSettings {
	pub server_name: Option<String>,
	pub settings: Option<TlsClientSettings>,
}

impl TlsSettings {
	pub fn server_name(&self) -> Option<&str> {
		non_empty(self.server_name.as_deref())
	}

	pub fn fingerprint(&self) -> Option<&str> {
		self.settings.as_ref().and_then(|s| non_empty(s.fingerprint.as_deref()))
	}
}

/// `tlsSettings.settings` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TlsClientSettings {
	pub fingerprint: Option<String>,
}

/// `wsSettings` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WsSettings {
	pub path: Option<String>,
	pub host: Option<String>,
	pub headers: Option<Map<String, Value>>,
}

impl WsSettings {
	pub fn path(&self) -> Option<&str> {
		non_empty(self.path.as_deref())
	}

	/// Host header, from the dedicated field or the legacy `headers.Host`.
	pub fn host(&self) -> Option<&str> {
		non_empty(self.host.as_deref()).or_else(|| {
			self.headers
				.as_ref()
				.and_then(|headers| headers.get("Host"))
				.and_then(Value::as_str)
				.filter(|host| !host.is_empty())
		})
	}
}

/// `grpcSettings` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GrpcSettings {
	pub service_name: Option<String>,
}

impl GrpcSettings {
	pub fn service_name(&self) -> Option<&str> {
		non_empty(self.service_name.as_deref())
	}
}

fn non_empty(value: Option<&str>) -> Option<&str> {
	value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn absent_fields_fall_back_to_safe_defaults() {
		let stream: StreamSettings = serde_json::from_str("{}").unwrap();
		assert_eq!(stream.network(), "tcp");
		assert_eq!(stream.security(), "none");
		assert!(stream.reality_settings.is_none());
	}

	#[test]
	fn nested_public_key_wins_over_flat() {
		let stream: StreamSettings = serde_json::from_str(
			r#"{"security":"reality","realitySettings":{"publicKey":"FLAT","settings":{"publicKey":"NESTED"}}}"#,
		)
		.unwrap();
		let reality = stream.reality_settings.unwrap();
		assert_eq!(reality.public_key(), Some("NESTED"));
	}

	#[test]
	fn empty_nested_public_key_falls_through_to_flat() {
		let stream: StreamSettings =
			serde_json::from_str(r#"{"realitySettings":{"publicKey":"FLAT","settings":{"publicKey":""}}}"#).unwrap();
		assert_eq!(stream.reality_settings.unwrap().public_key(), Some("FLAT"));
	}

	#[test]
	fn reality_lists_yield_first_entry() {
		let stream: StreamSettings =
			serde_json::from_str(r#"{"realitySettings":{"serverNames":["a.example","b.example"],"shortIds":["01",""]}}"#).unwrap();
		let reality = stream.reality_settings.unwrap();
		assert_eq!(reality.first_server_name(), Some("a.example"));
		assert_eq!(reality.first_short_id(), Some("01"));
		assert_eq!(reality.fingerprint(), None);
	}

	#[test]
	fn ws_host_reads_legacy_header() {
		let stream: StreamSettings = serde_json::from_str(r#"{"network":"ws","wsSettings":{"path":"/ws","headers":{"Host":"cdn.example"}}}"#).unwrap();
		let ws = stream.ws_settings.unwrap();
		assert_eq!(ws.path(), Some("/ws"));
		assert_eq!(ws.host(), Some("cdn.example"));
	}

	#[test]
	fn null_blocks_are_treated_as_absent() {
		let stream: StreamSettings = serde_json::from_str(r#"{"network":null,"security":"","realitySettings":null}"#).unwrap();
		assert_eq!(stream.network(), "tcp");
		assert_eq!(stream.security(), "none");
	}
}
