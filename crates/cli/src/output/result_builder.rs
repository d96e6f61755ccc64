use std::fmt::Write as _;
use std::time::Instant;

use colored::Colorize;
use serde::Serialize;

use crate::output::format::OutputFormat;
use crate::output::model::{CommandError, CommandResult, ErrorCode};

/// Builder for constructing command results.
pub struct ResultBuilder<T: Serialize> {
	command: String,
	data: Option<T>,
	error: Option<CommandError>,
	start_time: Instant,
}

impl<T: Serialize> ResultBuilder<T> {
	pub fn new(command: impl Into<String>) -> Self {
		Self {
			command: command.into(),
			data: None,
			error: None,
			start_time: Instant::now(),
		}
	}

	/// Measures duration from `start` instead of from construction.
	pub fn started_at(mut self, start: Instant) -> Self {
		self.start_time = start;
		self
	}

	pub fn data(mut self, data: T) -> Self {
		self.data = Some(data);
		self
	}

	pub fn error(mut self, code: ErrorCode, message: impl Into<String>) -> Self {
		self.error = Some(CommandError {
			code,
			message: message.into(),
			details: None,
		});
		self
	}

	pub fn error_with_details(mut self, code: ErrorCode, message: impl Into<String>, details: Option<serde_json::Value>) -> Self {
		self.error = Some(CommandError {
			code,
			message: message.into(),
			details,
		});
		self
	}

	pub fn build(self) -> CommandResult<T> {
		let ok = self.error.is_none() && self.data.is_some();
		CommandResult {
			ok,
			command: self.command,
			data: self.data,
			error: self.error,
			duration_ms: Some(self.start_time.elapsed().as_millis() as u64),
		}
	}
}

/// Print a command result to stdout in the specified format.
///
/// `lines` is the human rendering of `data`, used by the text format; when
/// empty the data is printed as pretty JSON instead.
pub fn print_result<T: Serialize>(result: &CommandResult<T>, lines: &[String], format: OutputFormat) {
	match format {
		OutputFormat::Json => {
			if let Ok(json) = serde_json::to_string_pretty(result) {
				println!("{json}");
			}
		}
		OutputFormat::Text => print!("{}", render_text(result, lines)),
	}
}

pub fn render_text<T: Serialize>(result: &CommandResult<T>, lines: &[String]) -> String {
	let mut out = String::new();

	if result.ok {
		if !lines.is_empty() {
			for line in lines {
				let _ = writeln!(out, "{line}");
			}
		} else if let Some(data) = &result.data {
			if let Ok(json) = serde_json::to_string_pretty(data) {
				let _ = writeln!(out, "{json}");
			}
		}
	} else if let Some(error) = &result.error {
		let _ = writeln!(out, "{} [{}]: {}", "Error".red().bold(), error.code, error.message);
		if let Some(details) = &error.details {
			if let Ok(json) = serde_json::to_string_pretty(details) {
				let _ = writeln!(out, "Details: {json}");
			}
		}
	}

	out
}
