//! Export client and HTTP transport
//!
//! This module turns a validated [`ParameterSet`](crate::domain::ParameterSet)
//! into one HTTP request/response cycle:
//!
//! - [`transport`] - the injected HTTP capability ([`HttpTransport`]) and its
//!   reqwest-backed production implementation
//! - [`export`] - the [`ExportClient`] that serializes the wire form,
//!   submits the POST, and classifies the outcome
//!
//! The client is stateless between calls and safe to share across
//! concurrent exports.

pub mod export;
pub mod transport;

// Re-export commonly used items
pub use export::{encode_wire_form, ExportClient, ExportResult};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport, FORM_CONTENT_TYPE};
