//! # Protocol Model
//!
//! What travels over the wire: the request/response capability traits, the
//! concrete endpoints, and the negotiated session headers.

pub mod endpoints;
pub mod headers;
pub mod message;

pub use endpoints::*;
pub use headers::NegotiatedHeaders;
pub use message::{ApiRequest, ApiResponse, DataHeaders, Envelope};
