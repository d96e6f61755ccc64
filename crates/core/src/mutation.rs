//! Client and inbound mutations.
//!
//! Client deletion runs an ordered list of strategies. The direct endpoint
//! is tried first; panels that lack it (or answer it unreliably) fall through
//! to a read-modify-write of the owning inbound. The rewrite re-fetches the
//! inbound immediately before writing, which narrows but does not close the
//! window in which another actor can change the same inbound.

use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};
use xui_protocol::{Client, Inbound, InboundSettings, Protocol};

use crate::client::{PanelClient, Relogin, Reply};
use crate::error::{PanelError, Result};
use crate::locator::LocatedClient;
use crate::repository::decode_inbound;

/// Result of a mutation whose rejection is reported rather than raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MutationOutcome {
	pub success: bool,
	pub message: String,
}

impl MutationOutcome {
	/// Turns `success: false` into [`PanelError::PanelRejected`].
	pub fn into_result(self) -> Result<Self> {
		if self.success {
			Ok(self)
		} else {
			Err(PanelError::PanelRejected { message: self.message })
		}
	}
}

/// Ways a client can be removed, in the order they are attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteStrategy {
	/// `POST delClient/{inboundId}/{uuid}`.
	Direct,
	/// Re-fetch the inbound, drop the client from `settings`, post the inbound back.
	ReadModifyWrite,
}

const DELETE_STRATEGIES: [DeleteStrategy; 2] = [DeleteStrategy::Direct, DeleteStrategy::ReadModifyWrite];

/// What one strategy concluded.
#[derive(Debug)]
enum StrategyOutcome {
	Deleted,
	/// Not supported or not effective here; the next strategy may still work.
	TryNext(String),
}

/// Confirmation of a removed client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedClient {
	pub inbound_id: i64,
	pub uuid: String,
	pub email: String,
	pub strategy: DeleteStrategy,
}

/// Inbound creation request, serialized as the body of `/inbounds/add`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInbound {
	pub up: i64,
	pub down: i64,
	pub total: i64,
	pub remark: String,
	pub enable: bool,
	pub expiry_time: i64,
	pub listen: String,
	pub port: u16,
	pub protocol: Protocol,
	pub settings: String,
	pub stream_settings: String,
	pub sniffing: String,
}

impl NewInbound {
	/// VLESS over plain TCP carrying `client` as its only client.
	pub fn vless(remark: impl Into<String>, port: u16, client: &Client) -> Result<Self> {
		let settings = json!({
			"clients": [client],
			"decryption": "none",
			"fallbacks": []
		});
		let stream_settings = json!({
			"network": "tcp",
			"security": "none",
			"tcpSettings": { "acceptProxyProtocol": false, "header": { "type": "none" } }
		});
		let sniffing = json!({ "enabled": true, "destOverride": ["http", "tls"] });

		Ok(Self {
			up: 0,
			down: 0,
			total: 0,
			remark: remark.into(),
			enable: true,
			expiry_time: 0,
			listen: String::new(),
			port,
			protocol: Protocol::Vless,
			settings: serde_json::to_string(&settings).map_err(PanelError::Encode)?,
			stream_settings: serde_json::to_string(&stream_settings).map_err(PanelError::Encode)?,
			sniffing: serde_json::to_string(&sniffing).map_err(PanelError::Encode)?,
		})
	}
}

/// Client record with the bookkeeping fields the panel expects on creation.
pub fn panel_client(uuid: &str, email: &str) -> Client {
	let mut extra = Map::new();
	extra.insert("limitIp".to_string(), json!(0));
	extra.insert("expiryTime".to_string(), json!(0));
	extra.insert("tgId".to_string(), json!(""));
	extra.insert("subId".to_string(), json!(subscription_id()));
	extra.insert("reset".to_string(), json!(0));

	Client {
		extra,
		..Client::new(uuid, email)
	}
}

fn subscription_id() -> String {
	uuid::Uuid::new_v4().simple().to_string()[..16].to_string()
}

/// Removes the client whose id equals `uuid`. Returns whether one was removed.
pub(crate) fn remove_client(settings: &mut InboundSettings, uuid: &str) -> bool {
	let before = settings.clients.len();
	settings.clients.retain(|client| client.id != uuid);
	settings.clients.len() != before
}

impl PanelClient {
	/// Adds one client with an empty flow to an inbound.
	///
	/// Success is the envelope's `success` flag; a `200 OK` can still be a
	/// rejection, reported with the panel's message.
	pub async fn add_client(&self, inbound_id: i64, email: &str, uuid: &str) -> Result<MutationOutcome> {
		self.add_client_record(inbound_id, &panel_client(uuid, email)).await
	}

	/// Adds a fully specified client to an inbound.
	pub async fn add_client_record(&self, inbound_id: i64, client: &Client) -> Result<MutationOutcome> {
		let url = self.endpoints.add_client()?;
		let settings = serde_json::to_string(&json!({ "clients": [client] })).map_err(PanelError::Encode)?;
		let id = inbound_id.to_string();

		let envelope = self
			.call::<Value, _>(Relogin::OnSessionLoss, &url, |http, url| {
				http.post(url).form(&[("id", id.as_str()), ("settings", settings.as_str())])
			})
			.await?
			.into_envelope(&url)?;

		if envelope.success {
			info!(target = "xui", inbound_id, email = %client.email, "client added");
		} else {
			warn!(target = "xui", inbound_id, email = %client.email, msg = %envelope.msg, "panel rejected new client");
		}

		Ok(MutationOutcome {
			success: envelope.success,
			message: envelope
				.message_or(if envelope.success { "client added" } else { "panel rejected the client" })
				.to_string(),
		})
	}

	/// Creates an inbound. Returns the record the panel echoes back, if any.
	pub async fn add_inbound(&self, inbound: &NewInbound) -> Result<Option<Inbound>> {
		let url = self.endpoints.add()?;
		let envelope = self
			.call::<Value, _>(Relogin::OnSessionLoss, &url, |http, url| http.post(url).json(inbound))
			.await?
			.into_envelope(&url)?;

		if !envelope.success {
			warn!(target = "xui", remark = %inbound.remark, port = inbound.port, msg = %envelope.msg, "panel rejected new inbound");
			return Err(PanelError::PanelRejected {
				message: envelope.message_or("panel rejected the inbound").to_string(),
			});
		}

		info!(target = "xui", remark = %inbound.remark, port = inbound.port, "inbound created");
		match envelope.obj {
			Some(Value::Null) | None => Ok(None),
			Some(record) => decode_inbound(record).map(Some),
		}
	}

	/// Deletes an inbound with all its clients.
	pub async fn delete_inbound(&self, id: i64) -> Result<bool> {
		let url = self.endpoints.del(id)?;
		let envelope = self
			.call::<Value, _>(Relogin::OnSessionLoss, &url, |http, url| http.post(url))
			.await?
			.into_envelope(&url)?;

		if envelope.success {
			info!(target = "xui", inbound_id = id, "inbound deleted");
		} else {
			warn!(target = "xui", inbound_id = id, msg = %envelope.msg, "panel refused to delete inbound");
		}
		Ok(envelope.success)
	}

	/// Removes the client with `uuid` from whichever inbound holds it.
	///
	/// Fails with [`PanelError::ClientNotFound`] when no inbound holds the
	/// client, including when it disappears between lookup and rewrite, so a
	/// repeated call never reports a second success.
	pub async fn delete_client_by_uuid(&self, uuid: &str) -> Result<DeletedClient> {
		let Some(located) = self.find_client_by_uuid(uuid).await? else {
			return Err(PanelError::ClientNotFound { uuid: uuid.to_string() });
		};

		let mut last_reason = String::new();
		for strategy in DELETE_STRATEGIES {
			let outcome = match strategy {
				DeleteStrategy::Direct => self.delete_direct(&located).await?,
				DeleteStrategy::ReadModifyWrite => self.delete_by_rewrite(&located).await?,
			};

			match outcome {
				StrategyOutcome::Deleted => {
					info!(target = "xui", inbound_id = located.inbound.id, %uuid, ?strategy, "client deleted");
					return Ok(DeletedClient {
						inbound_id: located.inbound.id,
						uuid: uuid.to_string(),
						email: located.client.email.clone(),
						strategy,
					});
				}
				StrategyOutcome::TryNext(reason) => {
					debug!(target = "xui", ?strategy, %reason, "delete strategy did not apply");
					last_reason = reason;
				}
			}
		}

		Err(PanelError::PanelRejected { message: last_reason })
	}

	async fn delete_direct(&self, located: &LocatedClient) -> Result<StrategyOutcome> {
		let url = self.endpoints.del_client(located.inbound.id, &located.client.id)?;
		let reply = self
			.call::<Value, _>(Relogin::OnSessionLoss, &url, |http, url| http.post(url))
			.await?;

		Ok(match reply {
			Reply::Envelope(envelope) if envelope.success => StrategyOutcome::Deleted,
			Reply::Envelope(envelope) => StrategyOutcome::TryNext(envelope.message_or("direct delete rejected").to_string()),
			Reply::Status(status) => StrategyOutcome::TryNext(format!("direct delete returned HTTP {status}")),
			Reply::NotJson(err) => StrategyOutcome::TryNext(format!("direct delete response unreadable: {err}")),
		})
	}

	async fn delete_by_rewrite(&self, located: &LocatedClient) -> Result<StrategyOutcome> {
		let uuid = located.client.id.as_str();
		let Some(mut inbound) = self.get_inbound(located.inbound.id).await? else {
			return Err(PanelError::ClientNotFound { uuid: uuid.to_string() });
		};

		let mut settings = inbound.decode_settings().map_err(|source| PanelError::MalformedResource {
			inbound_id: inbound.id,
			field: "settings",
			source,
		})?;
		if !remove_client(&mut settings, uuid) {
			return Err(PanelError::ClientNotFound { uuid: uuid.to_string() });
		}
		inbound.encode_settings(&settings).map_err(PanelError::Encode)?;

		info!(target = "xui", inbound_id = inbound.id, %uuid, remaining = settings.clients.len(), "rewriting inbound without client");
		let url = self.endpoints.update(inbound.id)?;
		let envelope = self
			.call::<Value, _>(Relogin::OnSessionLoss, &url, |http, url| http.post(url).json(&inbound))
			.await?
			.into_envelope(&url)?;

		if envelope.success {
			Ok(StrategyOutcome::Deleted)
		} else {
			Err(PanelError::PanelRejected {
				message: envelope.message_or("inbound update rejected").to_string(),
			})
		}
	}
}
