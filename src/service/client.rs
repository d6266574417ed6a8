//! Thin facade over [`SessionEngine`] for the calls a bot makes first.

use crate::config::{ClientConfig, RuntimeConfig};
use crate::error::Result;
use crate::protocol::endpoints::{HomeIndexRequest, HomeIndexResponse};
use crate::protocol::message::Envelope;
use crate::service::engine::{CloseHandle, SessionEngine};
use crate::service::session::SdkAccount;
use std::sync::Arc;

pub struct GameClient {
    engine: SessionEngine,
}

impl GameClient {
    /// Connect over HTTPS with a runtime store seeded from `config`
    pub async fn connect(account: SdkAccount, config: &ClientConfig) -> Result<Self> {
        let runtime = Arc::new(config.runtime());
        Self::connect_with_runtime(account, config, runtime).await
    }

    /// Connect sharing an existing runtime store with other clients
    pub async fn connect_with_runtime(
        account: SdkAccount,
        config: &ClientConfig,
        runtime: Arc<RuntimeConfig>,
    ) -> Result<Self> {
        let engine = SessionEngine::connect(account, config, runtime).await?;
        Ok(Self::from_engine(engine))
    }

    pub fn from_engine(engine: SessionEngine) -> Self {
        Self { engine }
    }

    /// Open the home screen, logging in first if needed
    pub async fn home_index(&mut self) -> Result<Envelope<HomeIndexResponse>> {
        self.engine
            .call_api(&mut HomeIndexRequest::first_visit())
            .await
    }

    pub fn engine(&self) -> &SessionEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut SessionEngine {
        &mut self.engine
    }

    pub fn close(&self) {
        self.engine.close();
    }

    pub fn close_handle(&self) -> CloseHandle {
        self.engine.close_handle()
    }
}
