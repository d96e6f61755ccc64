use serde::Serialize;
use xui::ErrorKind;

/// The result envelope printed by every command.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult<T: Serialize> {
	pub ok: bool,
	pub command: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<T>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<CommandError>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub duration_ms: Option<u64>,
}

/// Error information for failed commands.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
	pub code: ErrorCode,
	pub message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<serde_json::Value>,
}

/// Standardized error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
	AuthenticationFailed,
	NotFound,
	MalformedResource,
	TransportError,
	PanelRejected,
	InvalidConfig,
	InvalidInput,
	InternalError,
}

impl From<ErrorKind> for ErrorCode {
	fn from(kind: ErrorKind) -> Self {
		match kind {
			ErrorKind::AuthenticationFailed => ErrorCode::AuthenticationFailed,
			ErrorKind::NotFound => ErrorCode::NotFound,
			ErrorKind::MalformedResource => ErrorCode::MalformedResource,
			ErrorKind::Transport => ErrorCode::TransportError,
			ErrorKind::PanelRejected => ErrorCode::PanelRejected,
			ErrorKind::InvalidConfig => ErrorCode::InvalidConfig,
		}
	}
}

impl std::fmt::Display for ErrorCode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ErrorCode::AuthenticationFailed => write!(f, "AUTHENTICATION_FAILED"),
			ErrorCode::NotFound => write!(f, "NOT_FOUND"),
			ErrorCode::MalformedResource => write!(f, "MALFORMED_RESOURCE"),
			ErrorCode::TransportError => write!(f, "TRANSPORT_ERROR"),
			ErrorCode::PanelRejected => write!(f, "PANEL_REJECTED"),
			ErrorCode::InvalidConfig => write!(f, "INVALID_CONFIG"),
			ErrorCode::InvalidInput => write!(f, "INVALID_INPUT"),
			ErrorCode::InternalError => write!(f, "INTERNAL_ERROR"),
		}
	}
}

/// Payload of a successful command together with its text rendering.
#[derive(Debug, Default)]
pub struct Report {
	pub data: serde_json::Value,
	pub lines: Vec<String>,
}

impl Report {
	pub fn new<T: Serialize>(data: &T) -> serde_json::Result<Self> {
		Ok(Self {
			data: serde_json::to_value(data)?,
			lines: Vec::new(),
		})
	}

	pub fn line(mut self, line: impl Into<String>) -> Self {
		self.lines.push(line.into());
		self
	}

	pub fn lines(mut self, lines: impl IntoIterator<Item = String>) -> Self {
		self.lines.extend(lines);
		self
	}
}
