//! URL construction for panel endpoints.

use url::Url;

use crate::error::{PanelError, Result};

const INBOUNDS: &str = "panel/api/inbounds";

/// Resolves panel endpoints against a base URL that may carry a root prefix.
#[derive(Debug, Clone)]
pub(crate) struct Endpoints {
	base: Url,
}

impl Endpoints {
	/// `base` must end with `/` so relative joins keep the root prefix.
	pub(crate) fn new(base: Url) -> Self {
		Self { base }
	}

	pub(crate) fn base(&self) -> &Url {
		&self.base
	}

	fn join(&self, path: &str) -> Result<Url> {
		self.base
			.join(path)
			.map_err(|e| PanelError::InvalidConfig(format!("cannot join {path} onto {}: {e}", self.base)))
	}

	pub(crate) fn login(&self) -> Result<Url> {
		self.join("login")
	}

	pub(crate) fn list(&self) -> Result<Url> {
		self.join(&format!("{INBOUNDS}/list"))
	}

	pub(crate) fn get(&self, id: i64) -> Result<Url> {
		self.join(&format!("{INBOUNDS}/get/{id}"))
	}

	pub(crate) fn add(&self) -> Result<Url> {
		self.join(&format!("{INBOUNDS}/add"))
	}

	pub(crate) fn add_client(&self) -> Result<Url> {
		self.join(&format!("{INBOUNDS}/addClient"))
	}

	pub(crate) fn del_client(&self, inbound_id: i64, uuid: &str) -> Result<Url> {
		self.join(&format!("{INBOUNDS}/delClient/{inbound_id}/{}", urlencoding::encode(uuid)))
	}

	pub(crate) fn update(&self, id: i64) -> Result<Url> {
		self.join(&format!("{INBOUNDS}/update/{id}"))
	}

	pub(crate) fn del(&self, id: i64) -> Result<Url> {
		self.join(&format!("{INBOUNDS}/del/{id}"))
	}
}
