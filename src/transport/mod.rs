//! # Transport Layer
//!
//! Everything between a typed request and the network.
//!
//! ## Components
//! - **HTTP**: the [`HttpTransport`] seam and its `reqwest` implementation
//! - **Pipeline**: prepare / dispatch / validate / finalize for one call
//! - **Version**: lookup of the published client version after a 204

pub mod http;
pub mod pipeline;
pub mod version;

pub use http::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
pub use pipeline::TransportPipeline;
pub use version::{HttpVersionProbe, VersionProbe};
