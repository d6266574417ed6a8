//! Per-call request/response pipeline.
//!
//! Every call runs through four stages and keeps no state between calls:
//!
//! 1. **Prepare**: fill in the viewer id and serialize the body, encrypted
//!    MessagePack or plain JSON depending on the request.
//! 2. **Dispatch**: send it through the [`HttpTransport`], racing the
//!    engine's cancellation token.
//! 3. **Validate**: anything but HTTP 200 is a transport failure.
//! 4. **Finalize**: decrypt (or JSON-decode) the body into the response type.
//!
//! Result codes are left to the session engine; the pipeline never touches
//! session state and never retries.

use crate::config::{RuntimeConfig, ServerConfig};
use crate::core::crypto::ProtocolCrypto;
use crate::core::serialization::WireFormat;
use crate::error::{constants, ProtocolError, Result, ResultExt};
use crate::protocol::headers::{NegotiatedHeaders, CONTENT_TYPE};
use crate::protocol::message::{ApiRequest, ApiResponse};
use crate::transport::http::{HttpRequest, HttpTransport};
use crate::utils::metrics::global_metrics;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

pub struct TransportPipeline {
    transport: Arc<dyn HttpTransport>,
    crypto: ProtocolCrypto,
    server: ServerConfig,
    runtime: Arc<RuntimeConfig>,
    cancel: CancellationToken,
}

impl TransportPipeline {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        server: ServerConfig,
        runtime: Arc<RuntimeConfig>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            transport,
            crypto: ProtocolCrypto::new(),
            server,
            runtime,
            cancel,
        }
    }

    /// Absolute URL of `endpoint` on the currently selected host
    pub fn url_for(&self, endpoint: &str) -> String {
        let host = self.server.resolve_host(&self.runtime);
        format!("https://{}/{}", host.trim_end_matches('/'), endpoint)
    }

    /// Run one call as `viewer_id` with the given session headers
    pub async fn execute<Req, Resp>(
        &self,
        request: &mut Req,
        viewer_id: u64,
        headers: &NegotiatedHeaders,
    ) -> Result<Resp>
    where
        Req: ApiRequest,
        Resp: ApiResponse,
    {
        if self.cancel.is_cancelled() {
            return Err(ProtocolError::Cancelled.context("execute:cancelled", "session closed"));
        }

        let encrypted = request.needs_encryption();
        let endpoint = request.endpoint();

        let http_request = self
            .prepare(request, viewer_id, headers)
            .inspect_err(|e| error!(endpoint, error = %e, "Failed to prepare request"))
            .context("execute:prepare", constants::ERR_PREPARE_REQUEST)?;

        let format = if encrypted {
            WireFormat::MessagePack
        } else {
            WireFormat::Json
        };
        debug!(
            endpoint,
            format = format.name(),
            url = %http_request.url,
            "Sending request"
        );
        global_metrics().call_sent(http_request.body.len() as u64);

        let response = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                return Err(ProtocolError::Cancelled.context("execute:send", "session closed"));
            }
            result = self.transport.send(http_request) => result,
        };

        let response = response
            .inspect_err(|e| {
                global_metrics().call_failed();
                error!(endpoint, error = %e, "Request failed");
            })
            .context("execute:send", constants::ERR_SEND_REQUEST)?;

        debug!(
            endpoint,
            status = response.status,
            len = response.body.len(),
            "Received response"
        );
        global_metrics().response_received(response.body.len() as u64);

        if response.status != 200 {
            global_metrics().call_failed();
            error!(endpoint, status = response.status, "HTTP failure");
            return Err(ProtocolError::HttpStatus(response.status)
                .context("execute:http_status", "HTTP failed"));
        }

        if encrypted {
            self.crypto.decrypt_payload(&response.body).map_err(|e| {
                global_metrics().decrypt_failure();
                error!(endpoint, error = %e, "Failed to decrypt response");
                e.context("execute:decrypt", constants::ERR_DECRYPT_PAYLOAD)
            })
        } else {
            format
                .decode(&response.body)
                .context("execute:decode", constants::ERR_DECODE_RESPONSE)
        }
    }

    fn prepare<Req: ApiRequest>(
        &self,
        request: &mut Req,
        viewer_id: u64,
        headers: &NegotiatedHeaders,
    ) -> Result<HttpRequest> {
        let format = if request.needs_encryption() {
            let sealed_id = self
                .crypto
                .encrypt_viewer_id(viewer_id)
                .context("prepare:viewer_id", constants::ERR_ENCRYPT_VIEWER_ID)?;
            request.set_viewer_id(sealed_id);
            WireFormat::MessagePack
        } else {
            request.set_viewer_id(viewer_id.to_string());
            WireFormat::Json
        };

        let body = match format {
            WireFormat::MessagePack => {
                let sealed = self
                    .crypto
                    .encrypt_payload(&*request)
                    .context("prepare:encrypt", constants::ERR_ENCODE_PAYLOAD)?;
                global_metrics().payload_encrypted();
                sealed
            }
            WireFormat::Json => format
                .encode(&*request)
                .context("prepare:encode", constants::ERR_ENCODE_PAYLOAD)?,
        };

        let mut outgoing: Vec<(String, String)> = headers
            .iter()
            .filter(|(name, _)| !name.eq_ignore_ascii_case(CONTENT_TYPE))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        outgoing.push((CONTENT_TYPE.to_string(), format.content_type().to_string()));

        Ok(HttpRequest {
            method: request.method(),
            endpoint: request.endpoint().to_string(),
            url: self.url_for(request.endpoint()),
            headers: outgoing,
            body,
        })
    }
}
