//! # PCR Protocol
//!
//! Session and protocol engine for a mobile game's HTTP API.
//!
//! Calls are serialized as MessagePack, padded, encrypted with AES-256-CBC
//! under a per-message key that travels appended to the ciphertext, and sent
//! over plain HTTPS with a set of session headers the server keeps
//! renegotiating. On top of that sits a login state machine with bounded
//! retries and a self-healing path for a stale client version.
//!
//! ## Layers
//! - [`core`]: padding, cipher, MessagePack/JSON codecs and their composition
//! - [`protocol`]: request/response traits, endpoints and session headers
//! - [`transport`]: the HTTP seam, the per-call pipeline and the version probe
//! - [`service`]: session state, login and the [`SessionEngine`]
//! - [`config`], [`error`], [`utils`]: configuration, errors, logging, metrics
//!
//! ## Example
//! ```no_run
//! use pcr_protocol::config::ClientConfig;
//! use pcr_protocol::service::{GameClient, SdkAccount};
//!
//! # async fn run() -> pcr_protocol::error::Result<()> {
//! let config = ClientConfig::from_env()?;
//! let account = SdkAccount::new("uid", "access-key", "2", "1");
//! let mut client = GameClient::connect(account, &config).await?;
//! let home = client.home_index().await?;
//! println!("daily reset at {}", home.data.daily_reset_time);
//! client.close();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod service;
pub mod transport;
pub mod utils;

pub use error::{ProtocolError, Result};
pub use service::{GameClient, SdkAccount, SessionEngine};
