//! Connectivity diagnostics: base URL, login, inbound listing.

use serde::Serialize;

use crate::context::CommandContext;
use crate::error::{CliError, Result};
use crate::output::Report;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Step {
	name: &'static str,
	ok: bool,
	detail: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DoctorReport {
	base_url: String,
	steps: Vec<Step>,
}

impl DoctorReport {
	fn lines(&self) -> Vec<String> {
		let mut lines = vec![format!("Panel: {}", self.base_url)];
		lines.extend(
			self.steps
				.iter()
				.map(|step| format!("[{}] {}: {}", if step.ok { "ok" } else { "FAIL" }, step.name, step.detail)),
		);
		lines
	}
}

pub(super) async fn run(ctx: &CommandContext) -> Result<Report> {
	let mut report = DoctorReport {
		base_url: ctx.client.base_url().to_string(),
		steps: Vec::new(),
	};

	if let Err(err) = ctx.client.login().await {
		return Err(fail(report, "login", err));
	}
	report.steps.push(Step {
		name: "login",
		ok: true,
		detail: "session established".to_string(),
	});

	match ctx.client.list_inbounds().await {
		Ok(inbounds) => {
			let clients: usize = inbounds
				.iter()
				.filter_map(|inbound| inbound.decode_settings().ok())
				.map(|settings| settings.clients.len())
				.sum();
			report.steps.push(Step {
				name: "list inbounds",
				ok: true,
				detail: format!("{} inbound(s), {clients} client(s)", inbounds.len()),
			});
		}
		Err(err) => return Err(fail(report, "list inbounds", err)),
	}

	let lines = report.lines();
	Ok(Report::new(&report)?.lines(lines))
}

fn fail(mut report: DoctorReport, step: &'static str, source: xui::PanelError) -> CliError {
	report.steps.push(Step {
		name: step,
		ok: false,
		detail: source.to_string(),
	});
	CliError::Diagnosis {
		step,
		source,
		report: serde_json::to_value(&report).unwrap_or_default(),
	}
}
