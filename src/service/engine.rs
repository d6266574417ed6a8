//! Session engine for one game account.
//!
//! The engine owns the [`Session`], logs in lazily, maps result codes to
//! errors, and heals a stale client version when the game-start endpoint
//! answers 204.
//!
//! ```text
//! Unauthenticated --login ok--> Authenticated --result code 3--> Unauthenticated
//! ```
//!
//! Every mutating entry point takes `&mut self`, so calls against one session
//! are serialized by construction. Share an engine between tasks by wrapping
//! it in a `tokio::sync::Mutex`, and take a [`CloseHandle`] before doing so:
//! it cancels a call that is holding the lock.
//!
//! Calls are never retried here: a `SessionInvalid` or `VersionUpdated`
//! error is surfaced after its side effect has been applied and the caller
//! resubmits.

use crate::config::{ClientConfig, OptionKey, RuntimeConfig};
use crate::error::{constants, ProtocolError, Result, ResultExt};
use crate::protocol::endpoints::{
    MaintenanceStatusRequest, MaintenanceStatusResponse, SourceIniIndexRequest,
    SourceIniIndexResponse, GAME_START_PATH,
};
use crate::protocol::headers::{self, NegotiatedHeaders};
use crate::protocol::message::{
    ApiRequest, ApiResponse, Envelope, RESULT_OK, RESULT_SESSION_INVALID,
    RESULT_VERSION_OUTDATED,
};
use crate::service::session::{SdkAccount, Session};
use crate::transport::http::{HttpTransport, ReqwestTransport};
use crate::transport::pipeline::TransportPipeline;
use crate::transport::version::{HttpVersionProbe, VersionProbe};
use crate::utils::metrics::global_metrics;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

pub struct SessionEngine {
    pub(crate) account: SdkAccount,
    pub(crate) session: Session,
    pipeline: TransportPipeline,
    version_probe: Arc<dyn VersionProbe>,
    runtime: Arc<RuntimeConfig>,
    cancel: CancellationToken,
}

impl SessionEngine {
    /// Build an engine over HTTPS and run the startup probes
    pub async fn connect(
        account: SdkAccount,
        config: &ClientConfig,
        runtime: Arc<RuntimeConfig>,
    ) -> Result<Self> {
        config.validate_strict()?;
        let transport = Arc::new(ReqwestTransport::new(config.server.request_timeout)?);
        let probe = Arc::new(HttpVersionProbe::new(
            config.server.version_probe_url.clone(),
            config.server.version_probe_timeout,
        )?);
        Self::with_transport(account, config, runtime, transport, probe).await
    }

    /// Build an engine over caller-supplied collaborators and run the startup probes
    ///
    /// # Errors
    /// Fails if either startup probe fails.
    #[instrument(skip_all, fields(uid = %account.uid, server = ?config.server.kind))]
    pub async fn with_transport(
        account: SdkAccount,
        config: &ClientConfig,
        runtime: Arc<RuntimeConfig>,
        transport: Arc<dyn HttpTransport>,
        version_probe: Arc<dyn VersionProbe>,
    ) -> Result<Self> {
        let cancel = CancellationToken::new();
        let headers = NegotiatedHeaders::initial(
            &config.device,
            config.server.kind,
            &runtime.get(OptionKey::AppVer),
            &account.platform,
            &account.channel,
        );
        let pipeline = TransportPipeline::new(
            transport,
            config.server.clone(),
            Arc::clone(&runtime),
            cancel.clone(),
        );

        let mut engine = Self {
            account,
            session: Session::new(headers),
            pipeline,
            version_probe,
            runtime,
            cancel,
        };

        engine
            .probe_server()
            .await
            .context("connect:probe", constants::ERR_STARTUP_PROBE)?;
        Ok(engine)
    }

    /// Server list and maintenance probes issued before any login
    async fn probe_server(&mut self) -> Result<()> {
        let index: Envelope<SourceIniIndexResponse> =
            self.execute(&mut SourceIniIndexRequest::default()).await?;
        debug!(servers = index.data.server.len(), "Server list probed");

        let maintenance: Envelope<MaintenanceStatusResponse> =
            self.execute(&mut MaintenanceStatusRequest::default()).await?;
        let manifest_ver = maintenance.data.manifest_ver;
        if !manifest_ver.is_empty() {
            debug!(manifest_ver = %manifest_ver, "Manifest version negotiated");
            self.session
                .headers_mut()
                .insert(headers::MANIFEST_VER, manifest_ver);
        }
        Ok(())
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn account(&self) -> &SdkAccount {
        &self.account
    }

    /// Run a business call, logging in first if needed
    ///
    /// A `SessionInvalid` reply flips the session back to unauthenticated; the
    /// next call logs in again.
    #[instrument(skip_all, fields(endpoint = request.endpoint()))]
    pub async fn call_api<Req, Resp>(&mut self, request: &mut Req) -> Result<Resp>
    where
        Req: ApiRequest,
        Resp: ApiResponse,
    {
        if !self.session.is_authenticated() {
            self.login().await?;
        }

        match self.execute(request).await {
            Err(e) if e.is_session_invalid() => {
                warn!(uid = %self.account.uid, "Session invalidated by server");
                global_metrics().session_invalidated();
                self.session.invalidate();
                Err(e)
            }
            other => other,
        }
    }

    /// Run one call as the current viewer and apply its result code
    pub async fn execute<Req, Resp>(&mut self, request: &mut Req) -> Result<Resp>
    where
        Req: ApiRequest,
        Resp: ApiResponse,
    {
        let viewer_id = self.session.viewer_id();
        self.execute_as(viewer_id, request).await
    }

    pub(crate) async fn execute_as<Req, Resp>(
        &mut self,
        viewer_id: u64,
        request: &mut Req,
    ) -> Result<Resp>
    where
        Req: ApiRequest,
        Resp: ApiResponse,
    {
        let response: Resp = self
            .pipeline
            .execute(request, viewer_id, self.session.headers())
            .await?;

        let code = response.result_code();
        if code == RESULT_VERSION_OUTDATED && request.endpoint().starts_with(GAME_START_PATH) {
            let version = self.refresh_app_version().await?;
            return Err(ProtocolError::VersionUpdated(version)
                .context("execute:update_app_ver", "APP-VER refreshed"));
        }

        if code != RESULT_OK {
            global_metrics().business_failure();
            error!(endpoint = request.endpoint(), code, "API failed");
            let err = if code == RESULT_SESSION_INVALID {
                ProtocolError::SessionInvalid
            } else {
                ProtocolError::Business { code }
            };
            return Err(err.context("execute:result_code", "API failed"));
        }

        self.session.absorb(&response);
        Ok(response)
    }

    /// Fetch the published version and push it into config and headers
    async fn refresh_app_version(&mut self) -> Result<String> {
        let fetched = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ProtocolError::Cancelled),
            fetched = self.version_probe.fetch() => fetched,
        };
        let version = fetched.context("execute:get_new_app_ver", constants::ERR_VERSION_FETCH)?;

        self.runtime
            .set(OptionKey::AppVer, version.clone())
            .context("execute:set_app_ver", constants::ERR_VERSION_STORE)?;
        self.session
            .headers_mut()
            .insert(headers::APP_VER, version.clone());

        global_metrics().version_refreshed();
        info!(app_ver = %version, "Updated APP-VER");
        Ok(version)
    }

    /// Cancel all in-flight and future calls of this session
    pub fn close(&self) {
        self.close_handle().close();
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Handle that closes this session from another task, even while a call
    /// holds the engine
    pub fn close_handle(&self) -> CloseHandle {
        CloseHandle {
            uid: self.account.uid.clone(),
            cancel: self.cancel.clone(),
        }
    }
}

/// Detached closer for one [`SessionEngine`]
#[derive(Debug, Clone)]
pub struct CloseHandle {
    uid: String,
    cancel: CancellationToken,
}

impl CloseHandle {
    /// Cancel the session; in-flight calls fail with `Cancelled`
    pub fn close(&self) {
        if !self.cancel.is_cancelled() {
            info!(uid = %self.uid, "Closing session");
            self.cancel.cancel();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for SessionEngine {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
