//! The panel client and its single re-login wrapper.

use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;
use xui_protocol::Envelope;

use crate::config::PanelConfig;
use crate::endpoints::Endpoints;
use crate::error::{PanelError, Result};
use crate::session::Session;

/// When a response should be answered with one forced re-login and replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Relogin {
	/// Reads: any non-200 status or `success: false`.
	OnFailure,
	/// Mutations: only signs of a lost session (401/403, or a 200 whose body
	/// is not an envelope because the panel served its login page).
	/// `success: false` is a real rejection and is never replayed.
	OnSessionLoss,
}

/// Raw outcome of one panel call.
#[derive(Debug)]
pub(crate) enum Reply<T> {
	Envelope(Envelope<T>),
	NotJson(serde_json::Error),
	Status(StatusCode),
}

impl<T> Reply<T> {
	fn wants_relogin(&self, policy: Relogin) -> bool {
		match self {
			Reply::NotJson(_) => true,
			Reply::Status(status) if *status == StatusCode::UNAUTHORIZED || *status == StatusCode::FORBIDDEN => true,
			Reply::Status(_) => policy == Relogin::OnFailure,
			Reply::Envelope(envelope) => policy == Relogin::OnFailure && !envelope.success,
		}
	}

	/// Converts transport-level anomalies into errors, leaving `success` to the caller.
	pub(crate) fn into_envelope(self, endpoint: &Url) -> Result<Envelope<T>> {
		match self {
			Reply::Envelope(envelope) => Ok(envelope),
			Reply::NotJson(source) => Err(PanelError::MalformedResponse {
				endpoint: endpoint.path().to_string(),
				source,
			}),
			Reply::Status(status) => Err(PanelError::UnexpectedStatus {
				endpoint: endpoint.path().to_string(),
				status: status.as_u16(),
			}),
		}
	}
}

/// Session-managed client for one panel.
///
/// Construct it once at the composition root and share it by reference; the
/// session state inside is guarded, so concurrent callers serialize on login
/// and a fresh client performs exactly one login no matter how many
/// operations start at once.
pub struct PanelClient {
	pub(crate) session: Session,
	pub(crate) endpoints: Endpoints,
	home_ip: Option<String>,
	panel_host: Option<String>,
}

impl PanelClient {
	pub fn new(config: PanelConfig) -> Result<Self> {
		let endpoints = Endpoints::new(config.base_url()?);
		let session = Session::new(&config, endpoints.login()?)?;
		let home_ip = config.home_ip.as_deref().map(str::trim).filter(|ip| !ip.is_empty()).map(str::to_string);

		Ok(Self {
			panel_host: endpoints.base().host_str().map(str::to_string),
			session,
			endpoints,
			home_ip,
		})
	}

	/// Base URL every endpoint is resolved against.
	pub fn base_url(&self) -> &Url {
		self.endpoints.base()
	}

	/// Whether the cached session flag is set. The panel may still have
	/// expired the session; that is only discovered by the next call.
	pub async fn is_authenticated(&self) -> bool {
		self.session.is_authenticated().await
	}

	/// Logs in if no session is cached. Idempotent.
	pub async fn ensure_authenticated(&self) -> Result<()> {
		self.session.ensure_authenticated().await.map(|_| ())
	}

	/// Logs in unconditionally, replacing any cached session.
	pub async fn login(&self) -> Result<()> {
		self.session.login().await.map(|_| ())
	}

	/// Drops the cached session flag so the next call logs in again.
	pub async fn invalidate_session(&self) {
		self.session.invalidate().await;
	}

	/// Host placed in generated links: `preferred`, else the configured home
	/// IP, else the panel's own host name.
	pub fn link_host(&self, preferred: Option<&str>) -> Option<String> {
		preferred
			.map(str::trim)
			.filter(|host| !host.is_empty())
			.map(str::to_string)
			.or_else(|| self.home_ip.clone())
			.or_else(|| self.panel_host.clone())
	}

	/// Sends a request under an authenticated session, replaying it once
	/// after a forced re-login when `policy` says the reply calls for it.
	pub(crate) async fn call<T, F>(&self, policy: Relogin, url: &Url, request: F) -> Result<Reply<T>>
	where
		T: DeserializeOwned,
		F: Fn(&reqwest::Client, Url) -> RequestBuilder,
	{
		let ticket = self.session.ensure_authenticated().await?;
		let reply = send(request(self.session.http(), url.clone())).await?;
		if !reply.wants_relogin(policy) {
			return Ok(reply);
		}

		debug!(target = "xui", endpoint = url.path(), "call rejected; renewing session before one replay");
		self.session.renew(ticket).await?;
		send(request(self.session.http(), url.clone())).await
	}
}

async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<Reply<T>> {
	let response = request.send().await?;
	let status = response.status();
	if status != StatusCode::OK {
		return Ok(Reply::Status(status));
	}

	let body = response.text().await?;
	Ok(match serde_json::from_str::<Envelope<T>>(&body) {
		Ok(envelope) => Reply::Envelope(envelope),
		Err(e) => Reply::NotJson(e),
	})
}
