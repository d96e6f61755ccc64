use serde::Serialize;
use xui::protocol::Protocol;
use xui::{ClientEntry, REALITY_FLOW, generate_link, panel_client};

use super::format_bytes;
use crate::context::CommandContext;
use crate::error::{CliError, Result};
use crate::output::Report;

fn entry_line(entry: &ClientEntry) -> String {
	let state = if entry.client.enable { "" } else { "  (disabled)" };
	format!(
		"{:>4}  {:<24} {:<36}  up {}  down {}{state}",
		entry.inbound_id,
		entry.client.email,
		entry.client.id,
		format_bytes(entry.traffic.up),
		format_bytes(entry.traffic.down),
	)
}

pub(super) async fn list(ctx: &CommandContext) -> Result<Report> {
	let entries = ctx.client.list_clients().await?;
	let header = format!("{} client(s)", entries.len());
	Ok(Report::new(&entries)?.line(header).lines(entries.iter().map(entry_line)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FoundClient<'a> {
	inbound_id: i64,
	inbound_remark: &'a str,
	port: u16,
	protocol: &'a Protocol,
	client: &'a xui::Client,
}

pub(super) async fn find(ctx: &CommandContext, uuid: &str) -> Result<Report> {
	let located = ctx
		.client
		.find_client_by_uuid(uuid)
		.await?
		.ok_or_else(|| CliError::NotFound(format!("client {uuid} not found")))?;

	let found = FoundClient {
		inbound_id: located.inbound.id,
		inbound_remark: &located.inbound.remark,
		port: located.inbound.port,
		protocol: &located.inbound.protocol,
		client: &located.client,
	};
	Ok(Report::new(&found)?.line(format!(
		"{} ({}) is in inbound {} \"{}\" on port {}",
		located.client.id, located.client.email, located.inbound.id, located.inbound.remark, located.inbound.port
	)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AddedClient {
	inbound_id: i64,
	uuid: String,
	email: String,
	flow: String,
	message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	link: Option<String>,
}

pub(super) async fn add(ctx: &CommandContext, inbound_id: i64, email: &str, uuid: Option<String>) -> Result<Report> {
	if email.trim().is_empty() {
		return Err(CliError::InvalidInput("email must not be empty".to_string()));
	}
	let uuid = uuid
		.map(|u| u.trim().to_string())
		.filter(|u| !u.is_empty())
		.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

	let inbound = ctx
		.client
		.get_inbound(inbound_id)
		.await?
		.ok_or_else(|| CliError::NotFound(format!("inbound {inbound_id} not found")))?;

	let mut client = panel_client(&uuid, email);
	// Only `security` matters here; other stream fields may have drifted.
	let uses_reality = serde_json::from_str::<serde_json::Value>(&inbound.stream_settings)
		.ok()
		.and_then(|stream| stream.get("security")?.as_str().map(|security| security == "reality"))
		.unwrap_or_default();
	if uses_reality {
		client.flow = REALITY_FLOW.to_string();
	}

	let outcome = ctx.client.add_client_record(inbound_id, &client).await?.into_result()?;

	let link = match ctx.client.link_host(None) {
		Some(host) if inbound.protocol.is(&Protocol::Vless) => generate_link(&inbound, &uuid, email, &host).ok(),
		_ => None,
	};

	let added = AddedClient {
		inbound_id,
		uuid,
		email: email.to_string(),
		flow: client.flow,
		message: outcome.message,
		link,
	};
	let mut report = Report::new(&added)?.line(format!("Added {} ({}) to inbound {inbound_id}", added.uuid, added.email));
	if let Some(link) = &added.link {
		report = report.line(link.clone());
	}
	Ok(report)
}

pub(super) async fn delete(ctx: &CommandContext, uuid: &str) -> Result<Report> {
	let deleted = ctx.client.delete_client_by_uuid(uuid).await?;
	let line = format!("Deleted {} ({}) from inbound {}", deleted.uuid, deleted.email, deleted.inbound_id);
	Ok(Report::new(&deleted)?.line(line))
}

pub(super) async fn link(ctx: &CommandContext, uuid: &str, host: Option<&str>) -> Result<Report> {
	let link = ctx.client.client_link(uuid, host).await?;
	Ok(Report::new(&serde_json::json!({ "uuid": uuid, "link": link }))?.line(link))
}
