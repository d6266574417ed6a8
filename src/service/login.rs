//! Four-step login handshake with bounded retries.

use crate::config::LOGIN_ATTEMPTS;
use crate::error::{ProtocolError, Result, ResultExt};
use crate::protocol::endpoints::{
    GameStartRequest, GameStartResponse, HomeIndexRequest, HomeIndexResponse, LoadIndexRequest,
    LoadIndexResponse, SdkLoginRequest, SdkLoginResponse,
};
use crate::protocol::message::{ApiResponse, Envelope};
use crate::service::engine::SessionEngine;
use crate::utils::metrics::{global_metrics, Timer};
use tracing::{debug, info, instrument, warn};

/// What a successful attempt hands back for the session to commit
struct LoginOutcome {
    viewer_id: u64,
    daily_reset_deadline: u64,
}

impl SessionEngine {
    /// Log in, trying the whole handshake up to three times.
    ///
    /// The session is only marked authenticated after all four steps of one
    /// attempt succeed. A cancelled engine stops retrying at once.
    ///
    /// # Errors
    /// `AlreadyAuthenticated` if the session is live, otherwise
    /// `LoginFailed` wrapping the last attempt's error.
    #[instrument(skip(self), fields(uid = %self.account.uid))]
    pub async fn login(&mut self) -> Result<()> {
        if self.session.is_authenticated() {
            return Err(ProtocolError::AlreadyAuthenticated);
        }

        let _timer = Timer::start("login");
        let mut last_error = None;
        let mut attempts = 0;

        while attempts < LOGIN_ATTEMPTS {
            attempts += 1;
            global_metrics().login_attempt();
            match self.login_attempt().await {
                Ok(outcome) => {
                    self.session
                        .authenticate(outcome.viewer_id, outcome.daily_reset_deadline);
                    global_metrics().login_success();
                    info!(
                        attempt = attempts,
                        viewer_id = outcome.viewer_id,
                        "Login succeeded"
                    );
                    return Ok(());
                }
                Err(e) => {
                    warn!(attempt = attempts, error = %e, "Login attempt failed");
                    let cancelled = matches!(e.root(), ProtocolError::Cancelled);
                    last_error = Some(e);
                    if cancelled {
                        break;
                    }
                }
            }
        }

        global_metrics().login_failed();
        let source = last_error.unwrap_or(ProtocolError::Cancelled);
        Err(ProtocolError::LoginFailed {
            attempts,
            source: Box::new(source),
        })
    }

    async fn login_attempt(&mut self) -> Result<LoginOutcome> {
        let current = self.session.viewer_id();
        let mut sdk_login = SdkLoginRequest::new(
            &self.account.uid,
            &self.account.access_key,
            &self.account.platform,
            &self.account.channel,
        );
        let reply: Envelope<SdkLoginResponse> = self
            .execute_as(current, &mut sdk_login)
            .await
            .context("login:sdk_login", "SDK login failed")?;

        let viewer_id = reply.viewer_id();
        if viewer_id == 0 {
            return Err(ProtocolError::Decode("sdk_login returned no viewer id".into())
                .context("login:sdk_login", "SDK login failed"));
        }
        if reply.data.is_risk == Some(true) {
            debug!(viewer_id, "Account flagged as risky");
        }

        let game_start: Envelope<GameStartResponse> = self
            .execute_as(viewer_id, &mut GameStartRequest::new())
            .await
            .context("login:game_start", "Game start failed")?;
        if !game_start.data.now_tutorial {
            return Err(ProtocolError::TutorialIncomplete
                .context("login:game_start", "Tutorial not finished"));
        }

        let load_index: Envelope<LoadIndexResponse> = self
            .execute_as(viewer_id, &mut LoadIndexRequest::default())
            .await
            .context("login:load_index", "Load index failed")?;

        let _home: Envelope<HomeIndexResponse> = self
            .execute_as(viewer_id, &mut HomeIndexRequest::first_visit())
            .await
            .context("login:home_index", "Home index failed")?;

        Ok(LoginOutcome {
            viewer_id,
            daily_reset_deadline: load_index.data.daily_reset_time,
        })
    }
}
