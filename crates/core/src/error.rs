//! Error types for panel operations.

use std::fmt;

use thiserror::Error;

/// Result alias used by every public panel operation.
pub type Result<T> = std::result::Result<T, PanelError>;

/// Failures surfaced by [`PanelClient`](crate::PanelClient).
///
/// Transport and parse failures are converted into one of these variants at
/// the client boundary; raw `reqwest` errors never escape untagged.
#[derive(Debug, Error)]
pub enum PanelError {
	/// Bad credentials or an unreachable panel during login.
	#[error("authentication failed: {reason}")]
	AuthenticationFailed {
		reason: String,
		#[source]
		source: Option<reqwest::Error>,
	},

	/// No inbound holds a client with this UUID.
	#[error("client {uuid} not found")]
	ClientNotFound { uuid: String },

	/// A nested JSON document of an inbound could not be decoded.
	#[error("inbound {inbound_id}: malformed {field}: {source}")]
	MalformedResource {
		inbound_id: i64,
		field: &'static str,
		#[source]
		source: serde_json::Error,
	},

	/// The response body was not the expected JSON envelope.
	#[error("unexpected response from {endpoint}: {source}")]
	MalformedResponse {
		endpoint: String,
		#[source]
		source: serde_json::Error,
	},

	/// Network failure or timeout.
	#[error("transport error: {0}")]
	Transport(#[from] reqwest::Error),

	/// Well-formed response carrying `success: false`.
	#[error("panel rejected request: {message}")]
	PanelRejected { message: String },

	/// Non-200 response on a call that has no fallback.
	#[error("unexpected HTTP status {status} from {endpoint}")]
	UnexpectedStatus { endpoint: String, status: u16 },

	#[error("invalid panel configuration: {0}")]
	InvalidConfig(String),

	/// Link generation could not extract the fields it needs.
	#[error("link generation failed: {0}")]
	Link(String),

	#[error("failed to encode request: {0}")]
	Encode(#[source] serde_json::Error),
}

/// Coarse classification of [`PanelError`] for callers that branch on kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	AuthenticationFailed,
	NotFound,
	MalformedResource,
	Transport,
	PanelRejected,
	InvalidConfig,
}

impl ErrorKind {
	/// Stable SCREAMING_SNAKE_CASE code.
	pub fn code(self) -> &'static str {
		match self {
			ErrorKind::AuthenticationFailed => "AUTHENTICATION_FAILED",
			ErrorKind::NotFound => "NOT_FOUND",
			ErrorKind::MalformedResource => "MALFORMED_RESOURCE",
			ErrorKind::Transport => "TRANSPORT_ERROR",
			ErrorKind::PanelRejected => "PANEL_REJECTED",
			ErrorKind::InvalidConfig => "INVALID_CONFIG",
		}
	}
}

impl fmt::Display for ErrorKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.code())
	}
}

impl PanelError {
	pub(crate) fn auth(reason: impl Into<String>) -> Self {
		PanelError::AuthenticationFailed {
			reason: reason.into(),
			source: None,
		}
	}

	pub fn kind(&self) -> ErrorKind {
		match self {
			PanelError::AuthenticationFailed { .. } => ErrorKind::AuthenticationFailed,
			PanelError::ClientNotFound { .. } => ErrorKind::NotFound,
			PanelError::MalformedResource { .. } | PanelError::MalformedResponse { .. } | PanelError::Link(_) => ErrorKind::MalformedResource,
			PanelError::Transport(_) => ErrorKind::Transport,
			PanelError::PanelRejected { .. } | PanelError::UnexpectedStatus { .. } => ErrorKind::PanelRejected,
			PanelError::InvalidConfig(_) | PanelError::Encode(_) => ErrorKind::InvalidConfig,
		}
	}

	/// Short message suitable for showing to an operator.
	pub fn user_message(&self) -> String {
		match self {
			PanelError::AuthenticationFailed { .. } => "Could not log in to the panel. Check the address and credentials.".to_string(),
			PanelError::ClientNotFound { uuid } => format!("No client with UUID {uuid} exists on the panel."),
			PanelError::MalformedResource { inbound_id, .. } => format!("Inbound {inbound_id} has a configuration this client cannot read."),
			PanelError::MalformedResponse { .. } => "The panel returned a response this client cannot read.".to_string(),
			PanelError::Transport(err) if err.is_timeout() => "The panel did not answer in time.".to_string(),
			PanelError::Transport(_) => "Could not reach the panel.".to_string(),
			PanelError::PanelRejected { message } => format!("The panel refused the request: {message}"),
			PanelError::UnexpectedStatus { status, .. } => format!("The panel answered with HTTP {status}."),
			PanelError::InvalidConfig(reason) => format!("Invalid panel configuration: {reason}"),
			PanelError::Link(reason) => format!("Could not build a connection link: {reason}"),
			PanelError::Encode(_) => "Could not encode the request.".to_string(),
		}
	}
}
