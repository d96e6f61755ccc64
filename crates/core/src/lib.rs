//! Session-managed client for the 3x-ui proxy panel.
//!
//! [`PanelClient`] wraps the panel's cookie session and exposes typed
//! operations over its inbound API:
//!
//! * inbound retrieval with defensive two-layer decoding
//!   ([`PanelClient::list_inbounds`], [`PanelClient::get_inbound`])
//! * client lookup by UUID ([`PanelClient::find_client_by_uuid`])
//! * mutations, including a client delete that falls back to rewriting the
//!   owning inbound ([`PanelClient::delete_client_by_uuid`])
//! * `vless://` share links ([`generate_link`])
//!
//! Every operation logs in on first use and, when the panel rejects a call
//! because the session expired, logs in once more and replays it. No retries
//! happen beyond that single re-login.
//!
//! ```ignore
//! use xui::{PanelClient, PanelConfig};
//!
//! let client = PanelClient::new(PanelConfig::new("127.0.0.1", 2053, "admin", "admin"))?;
//! for inbound in client.list_inbounds().await? {
//!     println!("{} {}:{}", inbound.id, inbound.protocol, inbound.port);
//! }
//! ```

mod client;
mod config;
mod endpoints;
mod error;
mod link;
mod locator;
mod mutation;
mod repository;
mod session;

pub use client::PanelClient;
pub use config::{DEFAULT_TIMEOUT, PanelConfig};
pub use error::{ErrorKind, PanelError, Result};
pub use link::{DEFAULT_FINGERPRINT, REALITY_FLOW, generate_link};
pub use locator::{ClientEntry, LocatedClient, Traffic, client_entries, locate, traffic_for};
pub use mutation::{DeleteStrategy, DeletedClient, MutationOutcome, NewInbound, panel_client};
pub use xui_protocol as protocol;
pub use xui_protocol::{Client, Inbound, InboundSettings, Protocol, StreamSettings};
