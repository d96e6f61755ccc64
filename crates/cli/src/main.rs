use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use tracing::error;
use xui_cli::cli::Cli;
use xui_cli::context::CommandContext;
use xui_cli::output::{ResultBuilder, print_result};
use xui_cli::{commands, logging};

#[tokio::main]
async fn main() -> ExitCode {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	let start = Instant::now();
	let name = cli.command.name();
	let outcome = match CommandContext::new(&cli.panel) {
		Ok(ctx) => commands::dispatch(cli.command, &ctx).await,
		Err(err) => Err(err),
	};

	match outcome {
		Ok(report) => {
			let result = ResultBuilder::new(name).started_at(start).data(report.data).build();
			print_result(&result, &report.lines, cli.format);
			ExitCode::SUCCESS
		}
		Err(err) => {
			error!(target = "xui", command = name, error = %err, "command failed");
			let result = ResultBuilder::<()>::new(name)
				.started_at(start)
				.error_with_details(err.code(), err.user_message(), err.details())
				.build();
			print_result(&result, &[], cli.format);
			ExitCode::FAILURE
		}
	}
}
