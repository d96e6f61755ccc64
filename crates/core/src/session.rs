//! Cookie-backed panel session and its login routine.
//!
//! The authenticated flag is an optimistic cache: it never expires on its
//! own. Expiry is detected by callers when a request comes back rejected, and
//! they ask for a renewal through [`Session::renew`].

use reqwest::StatusCode;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;
use xui_protocol::Envelope;

use crate::config::PanelConfig;
use crate::error::{PanelError, Result};

#[derive(Debug, Default)]
struct SessionState {
	authenticated: bool,
	/// Incremented on every successful login.
	generation: u64,
}

/// Identifies the login a request was sent under.
///
/// Passing it back to [`Session::renew`] lets concurrent callers that saw the
/// same stale session share a single re-login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SessionTicket(u64);

/// HTTP client with a cookie jar plus the authenticated flag guarding it.
pub(crate) struct Session {
	http: reqwest::Client,
	login_url: Url,
	username: String,
	password: String,
	state: Mutex<SessionState>,
}

impl Session {
	pub(crate) fn new(config: &PanelConfig, login_url: Url) -> Result<Self> {
		let http = reqwest::Client::builder()
			.cookie_store(true)
			.timeout(config.timeout)
			.build()
			.map_err(|e| PanelError::InvalidConfig(format!("failed to create HTTP client: {e}")))?;

		Ok(Self {
			http,
			login_url,
			username: config.username.clone(),
			password: config.password.clone(),
			state: Mutex::new(SessionState::default()),
		})
	}

	pub(crate) fn http(&self) -> &reqwest::Client {
		&self.http
	}

	pub(crate) async fn is_authenticated(&self) -> bool {
		self.state.lock().await.authenticated
	}

	/// Logs in unless the session is already marked authenticated.
	pub(crate) async fn ensure_authenticated(&self) -> Result<SessionTicket> {
		let mut state = self.state.lock().await;
		if state.authenticated {
			return Ok(SessionTicket(state.generation));
		}
		self.login_locked(&mut state).await
	}

	/// Logs in unconditionally.
	pub(crate) async fn login(&self) -> Result<SessionTicket> {
		let mut state = self.state.lock().await;
		state.authenticated = false;
		self.login_locked(&mut state).await
	}

	/// Replaces the session `stale` was issued for.
	///
	/// When another caller already logged in again after `stale` was issued,
	/// the fresh session is reused instead of logging in a second time.
	pub(crate) async fn renew(&self, stale: SessionTicket) -> Result<SessionTicket> {
		let mut state = self.state.lock().await;
		if state.authenticated && state.generation != stale.0 {
			debug!(target = "xui", generation = state.generation, "session already renewed by another caller");
			return Ok(SessionTicket(state.generation));
		}

		warn!(target = "xui", url = %self.login_url, "panel rejected session; logging in again");
		state.authenticated = false;
		self.login_locked(&mut state).await
	}

	pub(crate) async fn invalidate(&self) {
		self.state.lock().await.authenticated = false;
	}

	async fn login_locked(&self, state: &mut SessionState) -> Result<SessionTicket> {
		let form = [("username", self.username.as_str()), ("password", self.password.as_str())];
		let response = self.http.post(self.login_url.clone()).form(&form).send().await.map_err(|e| {
			warn!(target = "xui", url = %self.login_url, error = %e, "panel login request failed");
			PanelError::AuthenticationFailed {
				reason: format!("cannot reach {}", self.login_url),
				source: Some(e),
			}
		})?;

		let status = response.status();
		let body = response.text().await.map_err(|e| PanelError::AuthenticationFailed {
			reason: "login response could not be read".to_string(),
			source: Some(e),
		})?;

		if status != StatusCode::OK {
			warn!(target = "xui", url = %self.login_url, %status, "panel login failed");
			return Err(PanelError::auth(format!("login returned HTTP {status}")));
		}

		let envelope: Envelope<Value> = match serde_json::from_str(&body) {
			Ok(envelope) => envelope,
			Err(e) => {
				warn!(target = "xui", url = %self.login_url, error = %e, "panel login response is not JSON");
				return Err(PanelError::auth("login response is not a JSON envelope; check the root path"));
			}
		};

		if !envelope.success {
			let reason = envelope.message_or("panel reported login failure").to_string();
			warn!(target = "xui", user = %self.username, %reason, "panel login rejected");
			return Err(PanelError::auth(reason));
		}

		state.authenticated = true;
		state.generation += 1;
		info!(target = "xui", user = %self.username, generation = state.generation, "logged in to panel");
		Ok(SessionTicket(state.generation))
	}
}
