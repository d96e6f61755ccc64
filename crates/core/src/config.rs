//! Connection settings for a panel instance.

use std::fmt;
use std::time::Duration;

use url::Url;

use crate::error::{PanelError, Result};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Address, credentials, and link defaults for one panel.
#[derive(Clone)]
pub struct PanelConfig {
	/// Panel host, with or without scheme (`http://` is assumed when absent).
	pub host: String,
	pub port: u16,
	pub username: String,
	pub password: String,
	/// Secret web base path configured on the panel, e.g. `/x7Kq`.
	pub root_path: Option<String>,
	pub timeout: Duration,
	/// Public address used as the link host when the panel host is not routable.
	pub home_ip: Option<String>,
}

impl PanelConfig {
	pub fn new(host: impl Into<String>, port: u16, username: impl Into<String>, password: impl Into<String>) -> Self {
		Self {
			host: host.into(),
			port,
			username: username.into(),
			password: password.into(),
			root_path: None,
			timeout: DEFAULT_TIMEOUT,
			home_ip: None,
		}
	}

	pub fn with_root_path(mut self, root_path: impl Into<String>) -> Self {
		self.root_path = Some(root_path.into());
		self
	}

	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}

	pub fn with_home_ip(mut self, home_ip: impl Into<String>) -> Self {
		self.home_ip = Some(home_ip.into());
		self
	}

	/// Root path with a leading slash and no trailing slash; empty when unset.
	pub fn normalized_root(&self) -> String {
		let trimmed = self.root_path.as_deref().unwrap_or_default().trim().trim_end_matches('/');
		if trimmed.is_empty() {
			String::new()
		} else if trimmed.starts_with('/') {
			trimmed.to_string()
		} else {
			format!("/{trimmed}")
		}
	}

	/// Resolves `{host}:{port}{root}` into a validated base URL.
	pub fn base_url(&self) -> Result<Url> {
		let host = self.host.trim().trim_end_matches('/');
		if host.is_empty() {
			return Err(PanelError::InvalidConfig("panel host is empty".to_string()));
		}

		let host = if host.contains("://") { host.to_string() } else { format!("http://{host}") };
		let raw = format!("{host}:{}{}/", self.port, self.normalized_root());
		let url = Url::parse(&raw).map_err(|e| PanelError::InvalidConfig(format!("{raw}: {e}")))?;

		if url.cannot_be_a_base() || url.host_str().is_none() {
			return Err(PanelError::InvalidConfig(format!("{raw} is not a usable base URL")));
		}
		Ok(url)
	}

	/// Host name of the panel without scheme or port.
	pub fn panel_hostname(&self) -> Option<String> {
		self.base_url().ok().and_then(|url| url.host_str().map(str::to_string))
	}
}

impl fmt::Debug for PanelConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PanelConfig")
			.field("host", &self.host)
			.field("port", &self.port)
			.field("username", &self.username)
			.field("password", &"<redacted>")
			.field("root_path", &self.root_path)
			.field("timeout", &self.timeout)
			.field("home_ip", &self.home_ip)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn root_path_is_normalized() {
		let base = PanelConfig::new("http://127.0.0.1", 2053, "admin", "admin");
		assert_eq!(base.normalized_root(), "");
		assert_eq!(base.clone().with_root_path("  ").normalized_root(), "");
		assert_eq!(base.clone().with_root_path("secret").normalized_root(), "/secret");
		assert_eq!(base.clone().with_root_path("/secret/").normalized_root(), "/secret");
		assert_eq!(base.with_root_path("/a/b").normalized_root(), "/a/b");
	}

	#[test]
	fn base_url_joins_host_port_and_root() {
		let config = PanelConfig::new("https://panel.example/", 8443, "admin", "admin").with_root_path("xk");
		assert_eq!(config.base_url().unwrap().as_str(), "https://panel.example:8443/xk/");
	}

	#[test]
	fn scheme_defaults_to_http() {
		let config = PanelConfig::new("10.0.0.5", 2053, "admin", "admin");
		assert_eq!(config.base_url().unwrap().as_str(), "http://10.0.0.5:2053/");
		assert_eq!(config.panel_hostname().as_deref(), Some("10.0.0.5"));
	}

	#[test]
	fn empty_host_is_rejected() {
		let err = PanelConfig::new(" ", 2053, "admin", "admin").base_url().unwrap_err();
		assert!(matches!(err, PanelError::InvalidConfig(_)));
	}

	#[test]
	fn debug_output_redacts_password() {
		let config = PanelConfig::new("127.0.0.1", 2053, "admin", "hunter2");
		let rendered = format!("{config:?}");
		assert!(!rendered.contains("hunter2"));
		assert!(rendered.contains("<redacted>"));
	}
}
