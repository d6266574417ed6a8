//! # Session Service
//!
//! Session state, the login handshake and the engine that runs calls
//! against one game account.

pub mod client;
pub mod engine;
pub mod login;
pub mod session;

pub use client::GameClient;
pub use engine::{CloseHandle, SessionEngine};
pub use session::{SdkAccount, Session};
