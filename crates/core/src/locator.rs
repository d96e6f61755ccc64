//! Resolving client identifiers to their owning inbound.

use serde::Serialize;
use tracing::warn;
use xui_protocol::{Client, Inbound, Protocol};

use crate::client::PanelClient;
use crate::error::Result;

/// A client together with the inbound that owns it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocatedClient {
	pub inbound: Inbound,
	pub client: Client,
}

/// Upload and download byte counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Traffic {
	pub up: i64,
	pub down: i64,
}

impl Traffic {
	pub fn total(&self) -> i64 {
		self.up.saturating_add(self.down)
	}
}

/// Flattened view of one client for listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientEntry {
	pub inbound_id: i64,
	pub inbound_remark: String,
	pub port: u16,
	pub protocol: Protocol,
	pub client: Client,
	pub traffic: Traffic,
}

impl PanelClient {
	/// Finds the first client whose id equals `uuid`, scanning inbounds in
	/// server order.
	///
	/// The panel does not enforce UUID uniqueness across inbounds; when two
	/// inbounds share one, the first listed wins.
	pub async fn find_client_by_uuid(&self, uuid: &str) -> Result<Option<LocatedClient>> {
		if uuid.is_empty() {
			return Ok(None);
		}
		let inbounds = self.list_inbounds().await?;
		Ok(locate(inbounds, uuid))
	}

	/// Every client of every inbound, in server order.
	pub async fn list_clients(&self) -> Result<Vec<ClientEntry>> {
		let inbounds = self.list_inbounds().await?;
		Ok(client_entries(&inbounds))
	}
}

/// Scans `inbounds` for `uuid`, stopping at the first match.
pub fn locate(inbounds: Vec<Inbound>, uuid: &str) -> Option<LocatedClient> {
	inbounds.into_iter().find_map(|inbound| {
		let settings = match inbound.decode_settings() {
			Ok(settings) => settings,
			Err(err) => {
				warn!(target = "xui", inbound_id = inbound.id, error = %err, "skipping inbound with malformed settings");
				return None;
			}
		};
		let client = settings.client(uuid)?.clone();
		Some(LocatedClient { inbound, client })
	})
}

/// Flattens inbounds into per-client entries.
pub fn client_entries(inbounds: &[Inbound]) -> Vec<ClientEntry> {
	let mut entries = Vec::new();
	for inbound in inbounds {
		let settings = match inbound.decode_settings() {
			Ok(settings) => settings,
			Err(err) => {
				warn!(target = "xui", inbound_id = inbound.id, error = %err, "skipping inbound with malformed settings");
				continue;
			}
		};

		for client in settings.clients {
			entries.push(ClientEntry {
				inbound_id: inbound.id,
				inbound_remark: inbound.remark.clone(),
				port: inbound.port,
				protocol: inbound.protocol.clone(),
				traffic: traffic_for(inbound, &client),
				client,
			});
		}
	}
	entries
}

/// Client's own counters, or the `clientStats` record for its email when
/// both of its own counters are zero.
pub fn traffic_for(inbound: &Inbound, client: &Client) -> Traffic {
	if client.up != 0 || client.down != 0 {
		return Traffic {
			up: client.up,
			down: client.down,
		};
	}

	inbound
		.usage_for(&client.email)
		.map(|record| Traffic {
			up: record.up,
			down: record.down,
		})
		.unwrap_or_default()
}
