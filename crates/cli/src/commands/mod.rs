mod clients;
mod doctor;
mod inbounds;

use crate::cli::{ClientAction, Commands, InboundAction};
use crate::context::CommandContext;
use crate::error::Result;
use crate::output::Report;

pub async fn dispatch(command: Commands, ctx: &CommandContext) -> Result<Report> {
	match command {
		Commands::Inbounds { action } => match action {
			InboundAction::List => inbounds::list(ctx).await,
			InboundAction::Get { id } => inbounds::get(ctx, id).await,
			InboundAction::Add { remark, port, protocol } => inbounds::add(ctx, &remark, port, protocol).await,
			InboundAction::Del { id } => inbounds::delete(ctx, id).await,
		},
		Commands::Clients { action } => match action {
			ClientAction::List => clients::list(ctx).await,
			ClientAction::Find { uuid } => clients::find(ctx, &uuid).await,
			ClientAction::Add { inbound_id, email, uuid } => clients::add(ctx, inbound_id, &email, uuid).await,
			ClientAction::Del { uuid } => clients::delete(ctx, &uuid).await,
			ClientAction::Link { uuid, host } => clients::link(ctx, &uuid, host.as_deref()).await,
		},
		Commands::Doctor => doctor::run(ctx).await,
	}
}

/// Renders a byte count with a binary unit, e.g. `1.5 GiB`.
pub(crate) fn format_bytes(bytes: i64) -> String {
	const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
	let mut value = bytes.max(0) as f64;
	let mut unit = 0;
	while value >= 1024.0 && unit < UNITS.len() - 1 {
		value /= 1024.0;
		unit += 1;
	}
	if unit == 0 { format!("{bytes} B") } else { format!("{value:.1} {}", UNITS[unit]) }
}
