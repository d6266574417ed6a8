//! Per-account session state.
//!
//! A session is either unauthenticated (viewer id 0) or authenticated with a
//! server-assigned viewer id. Only the engine mutates it.

use crate::core::crypto::calc_session_token;
use crate::protocol::headers::{self, NegotiatedHeaders};
use crate::protocol::message::ApiResponse;

/// SDK credentials of the account the engine logs in as
#[derive(Debug, Clone, Default)]
pub struct SdkAccount {
    pub uid: String,
    pub access_key: String,
    pub platform: String,
    pub channel: String,
}

impl SdkAccount {
    pub fn new(
        uid: impl Into<String>,
        access_key: impl Into<String>,
        platform: impl Into<String>,
        channel: impl Into<String>,
    ) -> Self {
        Self {
            uid: uid.into(),
            access_key: access_key.into(),
            platform: platform.into(),
            channel: channel.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    authenticated: bool,
    viewer_id: u64,
    session_id: String,
    daily_reset_deadline: u64,
    headers: NegotiatedHeaders,
}

impl Session {
    pub fn new(headers: NegotiatedHeaders) -> Self {
        Self {
            authenticated: false,
            viewer_id: 0,
            session_id: String::new(),
            daily_reset_deadline: 0,
            headers,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn viewer_id(&self) -> u64 {
        self.viewer_id
    }

    /// Last raw session token handed out by the server
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn daily_reset_deadline(&self) -> u64 {
        self.daily_reset_deadline
    }

    pub fn headers(&self) -> &NegotiatedHeaders {
        &self.headers
    }

    pub(crate) fn headers_mut(&mut self) -> &mut NegotiatedHeaders {
        &mut self.headers
    }

    pub(crate) fn authenticate(&mut self, viewer_id: u64, daily_reset_deadline: u64) {
        self.viewer_id = viewer_id;
        self.daily_reset_deadline = daily_reset_deadline;
        self.authenticated = true;
    }

    pub(crate) fn invalidate(&mut self) {
        self.authenticated = false;
        self.viewer_id = 0;
    }

    /// Carry the rolling request id and session token of a successful reply
    pub(crate) fn absorb<R: ApiResponse>(&mut self, response: &R) {
        let request_id = response.request_id();
        if !request_id.is_empty() {
            self.headers.insert(headers::REQUEST_ID, request_id);
        }

        let token = response.session_token();
        if !token.is_empty() {
            self.headers.insert(headers::SID, calc_session_token(token));
            self.session_id = token.to_string();
        }
    }
}
