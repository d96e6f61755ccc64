//! Inbound records and the client list embedded in their `settings`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::de::{default_true, is_zero, null_as_default};
use crate::stream::StreamSettings;

/// Proxy protocol served by an inbound.
///
/// Names other than the canonical lowercase ones (unknown protocols, or a
/// panel spelling `"VLESS"`) are kept verbatim in [`Protocol::Other`] so an
/// inbound is written back exactly as it was read. Compare with
/// [`Protocol::is`] to ignore case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Protocol {
	Vless,
	Vmess,
	Trojan,
	Shadowsocks,
	Other(String),
}

impl Protocol {
	pub fn as_str(&self) -> &str {
		match self {
			Protocol::Vless => "vless",
			Protocol::Vmess => "vmess",
			Protocol::Trojan => "trojan",
			Protocol::Shadowsocks => "shadowsocks",
			Protocol::Other(name) => name,
		}
	}

	/// Case-insensitive comparison of protocol names.
	pub fn is(&self, other: &Protocol) -> bool {
		self.as_str().eq_ignore_ascii_case(other.as_str())
	}
}

impl From<String> for Protocol {
	fn from(value: String) -> Self {
		match value.as_str() {
			"vless" => Protocol::Vless,
			"vmess" => Protocol::Vmess,
			"trojan" => Protocol::Trojan,
			"shadowsocks" => Protocol::Shadowsocks,
			_ => Protocol::Other(value),
		}
	}
}

impl From<Protocol> for String {
	fn from(value: Protocol) -> Self {
		match value {
			Protocol::Other(name) => name,
			known => known.as_str().to_string(),
		}
	}
}

impl fmt::Display for Protocol {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Traffic counter maintained by the panel per client email.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
	#[serde(default)]
	pub email: String,
	#[serde(default)]
	pub up: i64,
	#[serde(default)]
	pub down: i64,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

/// One inbound as returned by `/panel/api/inbounds/list`.
///
/// `settings` and `stream_settings` hold JSON documents encoded as strings.
/// Use [`Inbound::decode_settings`] and [`Inbound::decode_stream_settings`]
/// to read them; both can fail independently of the outer record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inbound {
	pub id: i64,
	#[serde(default)]
	pub up: i64,
	#[serde(default)]
	pub down: i64,
	#[serde(default)]
	pub total: i64,
	#[serde(default)]
	pub remark: String,
	#[serde(default = "default_true")]
	pub enable: bool,
	#[serde(default)]
	pub expiry_time: i64,
	#[serde(default)]
	pub listen: String,
	pub port: u16,
	pub protocol: Protocol,
	#[serde(default)]
	pub settings: String,
	#[serde(default)]
	pub stream_settings: String,
	#[serde(default)]
	pub tag: String,
	#[serde(default)]
	pub sniffing: String,
	#[serde(default, deserialize_with = "null_as_default")]
	pub client_stats: Vec<UsageRecord>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl Inbound {
	/// Decodes the `settings` document. An empty string decodes to defaults.
	pub fn decode_settings(&self) -> Result<InboundSettings, serde_json::Error> {
		decode_nested(&self.settings)
	}

	/// Decodes the `streamSettings` document. An empty string decodes to defaults.
	pub fn decode_stream_settings(&self) -> Result<StreamSettings, serde_json::Error> {
		decode_nested(&self.stream_settings)
	}

	/// Re-encodes `settings` from its decoded form.
	pub fn encode_settings(&mut self, settings: &InboundSettings) -> Result<(), serde_json::Error> {
		self.settings = serde_json::to_string(settings)?;
		Ok(())
	}

	/// Returns the `clientStats` entry whose email matches.
	pub fn usage_for(&self, email: &str) -> Option<&UsageRecord> {
		self.client_stats.iter().find(|record| record.email == email)
	}
}

fn decode_nested<T>(raw: &str) -> Result<T, serde_json::Error>
where
	T: Default + for<'de> Deserialize<'de>,
{
	if raw.trim().is_empty() {
		return Ok(T::default());
	}
	serde_json::from_str(raw)
}

/// Decoded form of an inbound's `settings` string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InboundSettings {
	#[serde(default, deserialize_with = "null_as_default")]
	pub clients: Vec<Client>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub decryption: Option<String>,
	#[serde(default, deserialize_with = "null_as_default")]
	pub fallbacks: Vec<Value>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl InboundSettings {
	/// Finds the client whose `id` equals `uuid`.
	pub fn client(&self, uuid: &str) -> Option<&Client> {
		if uuid.is_empty() {
			return None;
		}
		self.clients.iter().find(|client| client.id == uuid)
	}
}

/// One entry of `settings.clients`.
///
/// `id` is the client UUID for VLESS and VMess. Protocols that identify
/// clients by password keep that field in `extra` and leave `id` empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub id: String,
	#[serde(default)]
	pub email: String,
	#[serde(default = "default_true")]
	pub enable: bool,
	#[serde(default, skip_serializing_if = "is_zero")]
	pub up: i64,
	#[serde(default, skip_serializing_if = "is_zero")]
	pub down: i64,
	/// Quota in bytes; `0` means unlimited.
	#[serde(default, rename = "totalGB")]
	pub total_gb: i64,
	#[serde(default)]
	pub flow: String,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl Client {
	/// Creates an enabled, unlimited client.
	pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			email: email.into(),
			enable: true,
			up: 0,
			down: 0,
			total_gb: 0,
			flow: String::new(),
			extra: Map::new(),
		}
	}
}
