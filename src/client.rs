use thiserror::Error;
use tokio::runtime::Runtime;
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};
use tonic::{Code, Status};
use tracing::{debug, error, warn};

use crate::credentials::Credentials;
use crate::proto::{ReportRequest, ReportResponse, REPORT_PATH};
use crate::ClientError;

/// Well-known address of the remote service controller.
pub const SERVICE_CONTROL_ENDPOINT: &str = "https://servicecontrol.googleapis.com:443";

/// A report call that did not succeed.
///
/// Transport failures, remote rejections and credential failures all surface
/// as this one type.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Report failed; code={code:?}; message={message}")]
pub struct ReportError {
    pub code: Code,
    pub message: String,
}

impl From<Status> for ReportError {
    fn from(status: Status) -> Self {
        ReportError { code: status.code(), message: status.message().to_string() }
    }
}

/// Blocking client for the service controller's `Report` method.
///
/// Owns one lazily connected channel and the runtime that drives it. `report`
/// may be called concurrently from any number of non-async threads.
pub struct ReportingClient {
    channel: Channel,
    credentials: Credentials,
    runtime: Runtime,
}

impl ReportingClient {
    /// Creates the channel to `endpoint`.
    ///
    /// No connection is made until the first report. `https` endpoints are
    /// secured with TLS against the platform's native roots.
    ///
    /// # Errors
    ///
    /// Errors if the runtime cannot be built or the endpoint is invalid.
    pub fn connect(endpoint: &str, credentials: Credentials) -> Result<Self, ClientError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let channel = {
            let _guard = runtime.enter();

            let mut endpoint = Endpoint::from_shared(endpoint.to_string())?;
            if endpoint.uri().scheme_str() == Some("https") {
                endpoint = endpoint.tls_config(ClientTlsConfig::new().with_native_roots())?;
            }
            debug!(uri = %endpoint.uri(), "Creating ServiceController channel");

            endpoint.connect_lazy()
        };

        Ok(ReportingClient { channel, credentials, runtime })
    }

    /// Submits `request` and waits for the acknowledgement.
    ///
    /// The response payload is discarded, though any per-operation errors it
    /// carries are logged.
    ///
    /// # Errors
    ///
    /// Errors if the call fails for any reason; the failure is logged before
    /// returning.
    pub fn report(&self, request: ReportRequest) -> Result<(), ReportError> {
        match self.runtime.block_on(self.send(request)) {
            Ok(response) => {
                for rejected in response.report_errors {
                    let status = rejected.status.unwrap_or_default();
                    warn!(
                        operation_id = %rejected.operation_id,
                        code = status.code,
                        message = %status.message,
                        "ServiceController rejected operation"
                    );
                }

                Ok(())
            }
            Err(err) => {
                error!(code = ?err.code, message = %err.message, "ServiceController report failed");

                Err(err)
            }
        }
    }

    async fn send(&self, request: ReportRequest) -> Result<ReportResponse, ReportError> {
        let authorization = self.credentials.authorization().await?;
        let mut request = tonic::Request::new(request);
        request
            .metadata_mut()
            .insert("authorization", authorization);

        let mut grpc = tonic::client::Grpc::new(self.channel.clone());
        grpc.ready()
            .await
            .map_err(|err| Status::unknown(format!("Service was not ready; err={err}")))?;
        let response: tonic::Response<ReportResponse> = grpc
            .unary(request, PathAndQuery::from_static(REPORT_PATH), ProstCodec::default())
            .await?;

        Ok(response.into_inner())
    }
}
