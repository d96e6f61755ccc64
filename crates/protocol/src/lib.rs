//! Wire types for the 3x-ui panel REST API.
//!
//! This crate contains the serde-serializable shapes exchanged with the panel.
//! The panel stores inbound configuration as JSON documents encoded into
//! string fields of the outer JSON record, so decoding happens in two layers:
//!
//! * the outer record ([`Inbound`]) carries `settings` and `streamSettings`
//!   as opaque strings
//! * the inner documents ([`InboundSettings`], [`StreamSettings`]) are decoded
//!   on demand, with every nested field optional
//!
//! Types in this crate are pure data. Fields the panel sends but these types
//! do not model are kept in flattened `extra` maps so records survive a
//! read-modify-write round trip unchanged.

mod de;
pub mod envelope;
pub mod inbound;
pub mod stream;

pub use envelope::*;
pub use inbound::*;
pub use stream::*;
