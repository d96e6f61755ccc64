//! `vless://` share links.

use xui_protocol::{Inbound, Protocol, StreamSettings};

use crate::client::PanelClient;
use crate::error::{PanelError, Result};
use crate::locator::LocatedClient;

/// Flow forced on every REALITY link.
pub const REALITY_FLOW: &str = "xtls-rprx-vision";

/// Fingerprint used when the inbound does not name one.
pub const DEFAULT_FINGERPRINT: &str = "chrome";

/// Builds the share link for one client of `inbound`.
///
/// Query parameters appear in a fixed order: `type`, `security`, then the
/// security-specific parameters, then transport extras. REALITY always
/// carries `pbk`, `fp`, `sni` and `sid` (empty when the inbound lacks them)
/// plus `flow`. The email becomes the fragment without escaping.
pub fn generate_link(inbound: &Inbound, uuid: &str, email: &str, host: &str) -> Result<String> {
	if !inbound.protocol.is(&Protocol::Vless) {
		return Err(PanelError::Link(format!(
			"inbound {} uses {}, only vless links are supported",
			inbound.id, inbound.protocol
		)));
	}
	if uuid.is_empty() {
		return Err(PanelError::Link("client uuid is empty".to_string()));
	}
	let host = host.trim();
	if host.is_empty() {
		return Err(PanelError::Link("no host to put in the link".to_string()));
	}
	if inbound.port == 0 {
		return Err(PanelError::Link(format!("inbound {} has no port", inbound.id)));
	}

	let stream = inbound
		.decode_stream_settings()
		.map_err(|e| PanelError::Link(format!("inbound {} streamSettings: {e}", inbound.id)))?;

	let mut query = vec![("type", stream.network().to_string()), ("security", stream.security().to_string())];
	security_params(&stream, &mut query);
	transport_params(&stream, &mut query);

	let query = query
		.iter()
		.map(|(key, value)| format!("{key}={value}"))
		.collect::<Vec<_>>()
		.join("&");

	Ok(format!("vless://{uuid}@{}:{}?{query}#{email}", bracket_ipv6(host), inbound.port))
}

fn security_params(stream: &StreamSettings, query: &mut Vec<(&'static str, String)>) {
	match stream.security() {
		"reality" => {
			let reality = stream.reality_settings.clone().unwrap_or_default();
			query.push(("pbk", reality.public_key().unwrap_or_default().to_string()));
			query.push(("fp", reality.fingerprint().unwrap_or(DEFAULT_FINGERPRINT).to_string()));
			query.push(("sni", reality.first_server_name().unwrap_or_default().to_string()));
			query.push(("sid", reality.first_short_id().unwrap_or_default().to_string()));
			query.push(("flow", REALITY_FLOW.to_string()));
		}
		"tls" => {
			if let Some(tls) = &stream.tls_settings {
				if let Some(sni) = tls.server_name() {
					query.push(("sni", sni.to_string()));
				}
				if let Some(fp) = tls.fingerprint() {
					query.push(("fp", fp.to_string()));
				}
			}
		}
		_ => {}
	}
}

fn transport_params(stream: &StreamSettings, query: &mut Vec<(&'static str, String)>) {
	match stream.network() {
		"ws" => {
			if let Some(ws) = &stream.ws_settings {
				if let Some(path) = ws.path() {
					query.push(("path", urlencoding::encode(path).into_owned()));
				}
				if let Some(host) = ws.host() {
					query.push(("host", urlencoding::encode(host).into_owned()));
				}
			}
		}
		"grpc" => {
			if let Some(name) = stream.grpc_settings.as_ref().and_then(|g| g.service_name()) {
				query.push(("serviceName", urlencoding::encode(name).into_owned()));
			}
		}
		_ => {}
	}
}

fn bracket_ipv6(host: &str) -> String {
	if host.contains(':') && !host.starts_with('[') {
		format!("[{host}]")
	} else {
		host.to_string()
	}
}

impl PanelClient {
	/// Link for an already located client. `host` overrides the configured
	/// home IP and the panel host.
	pub fn link_for(&self, located: &LocatedClient, host: Option<&str>) -> Result<String> {
		let host = self
			.link_host(host)
			.ok_or_else(|| PanelError::Link("no link host configured".to_string()))?;
		generate_link(&located.inbound, &located.client.id, &located.client.email, &host)
	}

	/// Looks the client up and builds its link.
	pub async fn client_link(&self, uuid: &str, host: Option<&str>) -> Result<String> {
		let located = self
			.find_client_by_uuid(uuid)
			.await?
			.ok_or_else(|| PanelError::ClientNotFound { uuid: uuid.to_string() })?;
		self.link_for(&located, host)
	}
}
