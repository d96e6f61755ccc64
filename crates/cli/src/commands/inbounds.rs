use rand::Rng;
use serde::Serialize;
use tracing::info;
use xui::protocol::{Inbound, Protocol};
use xui::{NewInbound, panel_client};

use crate::cli::InboundProtocol;
use crate::context::CommandContext;
use crate::error::{CliError, Result};
use crate::output::Report;

const RANDOM_PORTS: std::ops::RangeInclusive<u16> = 10000..=60000;

/// Listing row for one inbound.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InboundSummary {
	id: i64,
	remark: String,
	protocol: Protocol,
	port: u16,
	enable: bool,
	network: String,
	security: String,
	clients: usize,
}

impl From<&Inbound> for InboundSummary {
	fn from(inbound: &Inbound) -> Self {
		let stream = inbound.decode_stream_settings().unwrap_or_default();
		Self {
			id: inbound.id,
			remark: inbound.remark.clone(),
			protocol: inbound.protocol.clone(),
			port: inbound.port,
			enable: inbound.enable,
			network: stream.network().to_string(),
			security: stream.security().to_string(),
			clients: inbound.decode_settings().map(|s| s.clients.len()).unwrap_or_default(),
		}
	}
}

impl InboundSummary {
	fn line(&self) -> String {
		let state = if self.enable { "" } else { "  (disabled)" };
		format!(
			"{:>4}  {:<8} {:>5}  {}/{}  {} clients  {}{state}",
			self.id,
			self.protocol.as_str(),
			self.port,
			self.network,
			self.security,
			self.clients,
			self.remark
		)
	}
}

pub(super) async fn list(ctx: &CommandContext) -> Result<Report> {
	let inbounds = ctx.client.list_inbounds().await?;
	let summaries: Vec<InboundSummary> = inbounds.iter().map(InboundSummary::from).collect();

	let header = format!("{} inbound(s)", summaries.len());
	Ok(Report::new(&summaries)?.line(header).lines(summaries.iter().map(InboundSummary::line)))
}

pub(super) async fn get(ctx: &CommandContext, id: i64) -> Result<Report> {
	let inbound = ctx
		.client
		.get_inbound(id)
		.await?
		.ok_or_else(|| CliError::NotFound(format!("inbound {id} not found")))?;

	let summary = InboundSummary::from(&inbound);
	Ok(Report::new(&inbound)?.line(summary.line()))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatedInbound {
	remark: String,
	port: u16,
	protocol: Protocol,
	client_uuid: String,
	client_email: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	inbound: Option<Inbound>,
}

pub(super) async fn add(ctx: &CommandContext, remark: &str, port: Option<u16>, protocol: InboundProtocol) -> Result<Report> {
	if remark.trim().is_empty() {
		return Err(CliError::InvalidInput("remark must not be empty".to_string()));
	}
	let port = match port {
		Some(0) => return Err(CliError::InvalidInput("port must be between 1 and 65535".to_string())),
		Some(port) => port,
		None => rand::rng().random_range(RANDOM_PORTS),
	};

	let uuid = uuid::Uuid::new_v4().to_string();
	let client = panel_client(&uuid, &format!("{remark}@bot"));
	let mut template = NewInbound::vless(remark, port, &client)?;
	template.protocol = protocol.into();

	let inbound = ctx.client.add_inbound(&template).await?;
	info!(target = "xui", %remark, port, "inbound added");

	let created = CreatedInbound {
		remark: remark.to_string(),
		port,
		protocol: template.protocol.clone(),
		client_uuid: uuid,
		client_email: client.email.clone(),
		inbound,
	};
	let id = created.inbound.as_ref().map(|i| i.id.to_string()).unwrap_or_else(|| "?".to_string());
	Ok(Report::new(&created)?
		.line(format!("Created inbound {id} \"{remark}\" on port {port}"))
		.line(format!("Client {} ({})", created.client_uuid, created.client_email)))
}

pub(super) async fn delete(ctx: &CommandContext, id: i64) -> Result<Report> {
	if !ctx.client.delete_inbound(id).await? {
		return Err(CliError::Rejected(format!("panel refused to delete inbound {id}")));
	}
	Ok(Report::new(&serde_json::json!({ "id": id, "deleted": true }))?.line(format!("Deleted inbound {id}")))
}
