//! Inbound retrieval and defensive decoding.

use serde_json::Value;
use tracing::{debug, warn};
use xui_protocol::Inbound;

use crate::client::{PanelClient, Relogin};
use crate::error::{PanelError, Result};

impl PanelClient {
	/// Fetches every inbound on the panel.
	///
	/// A non-200 status or `success: false` triggers one forced re-login and
	/// one retry; a second failure is returned as an error, so an empty `Vec`
	/// always means the panel has no inbounds. Inbounds whose record or
	/// `settings` cannot be decoded, or whose `streamSettings` is not JSON,
	/// are logged and left out; the rest are still returned.
	pub async fn list_inbounds(&self) -> Result<Vec<Inbound>> {
		let url = self.endpoints.list()?;
		let envelope = self
			.call::<Vec<Value>, _>(Relogin::OnFailure, &url, |http, url| http.get(url))
			.await?
			.into_envelope(&url)?;

		if !envelope.success {
			return Err(PanelError::PanelRejected {
				message: envelope.message_or("inbound list unavailable").to_string(),
			});
		}

		let inbounds = decode_inbounds(envelope.obj.unwrap_or_default());
		debug!(target = "xui", count = inbounds.len(), "fetched inbounds");
		Ok(inbounds)
	}

	/// Fetches one inbound through the direct `/get/{id}` endpoint.
	///
	/// Returns `None` when the panel reports no such inbound
	/// (`success: false`). A record that exists but cannot be decoded is a
	/// [`PanelError::MalformedResource`].
	pub async fn get_inbound(&self, id: i64) -> Result<Option<Inbound>> {
		let url = self.endpoints.get(id)?;
		let envelope = self
			.call::<Value, _>(Relogin::OnSessionLoss, &url, |http, url| http.get(url))
			.await?
			.into_envelope(&url)?;

		if !envelope.success {
			debug!(target = "xui", inbound_id = id, msg = %envelope.msg, "inbound not found");
			return Ok(None);
		}

		match envelope.obj {
			Some(Value::Null) | None => Ok(None),
			Some(record) => decode_inbound(record).map(Some),
		}
	}
}

/// Decodes list entries, skipping (and logging) the ones that fail.
pub(crate) fn decode_inbounds(records: Vec<Value>) -> Vec<Inbound> {
	records
		.into_iter()
		.filter_map(|record| match decode_inbound(record) {
			Ok(inbound) => Some(inbound),
			Err(err) => {
				warn!(target = "xui", error = %err, "skipping malformed inbound");
				None
			}
		})
		.collect()
}

/// Decodes the outer record and checks both nested documents parse.
///
/// `streamSettings` is only checked for JSON syntax. Its field types drift
/// between panel versions, and only link generation reads it.
pub(crate) fn decode_inbound(record: Value) -> Result<Inbound> {
	let inbound_id = record.get("id").and_then(Value::as_i64).unwrap_or_default();
	let inbound: Inbound = serde_json::from_value(record).map_err(|source| PanelError::MalformedResource {
		inbound_id,
		field: "record",
		source,
	})?;

	inbound.decode_settings().map_err(|source| PanelError::MalformedResource {
		inbound_id,
		field: "settings",
		source,
	})?;
	if !inbound.stream_settings.trim().is_empty() {
		serde_json::from_str::<Value>(&inbound.stream_settings).map_err(|source| PanelError::MalformedResource {
			inbound_id,
			field: "streamSettings",
			source,
		})?;
	}

	Ok(inbound)
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn record(id: i64, settings: &str, stream: &str) -> Value {
		json!({
			"id": id,
			"remark": format!("in-{id}"),
			"enable": true,
			"port": 10000 + id,
			"protocol": "vless",
			"settings": settings,
			"streamSettings": stream,
			"clientStats": null
		})
	}

	#[test]
	fn malformed_entries_are_skipped() {
		let records = vec![
			record(1, "{\"clients\":[", "{}"),
			record(2, "{\"clients\":[]}", "{}"),
			record(3, "{}", "not json"),
			json!({"id": 4, "remark": "no port or protocol"}),
		];
		let inbounds = decode_inbounds(records);
		assert_eq!(inbounds.iter().map(|i| i.id).collect::<Vec<_>>(), vec![2]);
	}

	#[test]
	fn decode_errors_name_the_field() {
		let err = decode_inbound(record(5, "{}", "[")).unwrap_err();
		match err {
			PanelError::MalformedResource { inbound_id, field, .. } => {
				assert_eq!(inbound_id, 5);
				assert_eq!(field, "streamSettings");
			}
			other => panic!("unexpected error: {other}"),
		}
	}

	#[test]
	fn drifted_stream_field_types_keep_the_inbound() {
		let stream = r#"{"security":"reality","realitySettings":{"serverNames":"example.com","shortIds":7}}"#;
		let inbound = decode_inbound(record(6, "{\"clients\":[{\"id\":\"u-1\"}]}", stream)).unwrap();
		assert_eq!(inbound.decode_settings().unwrap().clients[0].id, "u-1");
		assert_eq!(inbound.stream_settings, stream);
	}

	#[test]
	fn server_order_is_preserved() {
		let records = vec![record(9, "{}", "{}"), record(2, "{}", "{}"), record(5, "{}", "{}")];
		let ids: Vec<i64> = decode_inbounds(records).iter().map(|i| i.id).collect();
		assert_eq!(ids, vec![9, 2, 5]);
	}
}
