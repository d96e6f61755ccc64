use thiserror::Error;
use xui::PanelError;

use crate::output::ErrorCode;

#[derive(Debug, Error)]
pub enum CliError {
	#[error(transparent)]
	Panel(#[from] PanelError),

	/// An inbound or client the command names does not exist.
	#[error("{0}")]
	NotFound(String),

	#[error("{0}")]
	InvalidInput(String),

	/// The panel answered but refused the change.
	#[error("{0}")]
	Rejected(String),

	/// A diagnostic step failed; `report` holds every step run so far.
	#[error("{step} failed: {source}")]
	Diagnosis {
		step: &'static str,
		source: PanelError,
		report: serde_json::Value,
	},

	#[error("failed to encode output: {0}")]
	Encode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CliError>;

impl CliError {
	pub fn code(&self) -> ErrorCode {
		match self {
			CliError::Panel(err) => err.kind().into(),
			CliError::Diagnosis { source, .. } => source.kind().into(),
			CliError::NotFound(_) => ErrorCode::NotFound,
			CliError::InvalidInput(_) => ErrorCode::InvalidInput,
			CliError::Rejected(_) => ErrorCode::PanelRejected,
			CliError::Encode(_) => ErrorCode::InternalError,
		}
	}

	/// Message shown to the operator; panel errors use their short form.
	pub fn user_message(&self) -> String {
		match self {
			CliError::Panel(err) => err.user_message(),
			CliError::Diagnosis { step, source, .. } => format!("{step}: {}", source.user_message()),
			other => other.to_string(),
		}
	}

	pub fn details(&self) -> Option<serde_json::Value> {
		match self {
			CliError::Diagnosis { report, .. } => Some(report.clone()),
			_ => None,
		}
	}
}
