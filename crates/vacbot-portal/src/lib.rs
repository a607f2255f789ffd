//! HTTPS dispatcher for the vacuum cloud portal.
//!
//! [`PortalClient`] builds the vendor JSON envelope for a command, POSTs it
//! to the portal, and classifies the outcome. Failed exchanges never raise
//! out of [`PortalClient::send_command`]; they collapse to an empty object
//! and a log line.

mod sanitize;

pub use sanitize::sanitize_data;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};
use vacbot_protocol::{build_request, Command, PortalRequest, RequestAuth, Vacuum};

pub const REQUEST_USER_AGENT: &str =
    "Dalvik/2.1.0 (Linux; U; Android 5.1.1; A5010 Build/LMY48Z)";

pub const RESPONSE_TIMEOUT: Duration = Duration::from_secs(60);

/// Server certificate verification for portal connections.
#[derive(Clone, Debug)]
pub enum TlsPolicy {
    /// Verify against the system trust roots.
    System,
    /// Verify against a PEM bundle on disk, for portals behind a private CA.
    CaBundle(PathBuf),
    /// Skip verification.
    Insecure,
}

impl TlsPolicy {
    fn connector(&self) -> Result<native_tls::TlsConnector, PortalError> {
        let mut builder = native_tls::TlsConnector::builder();
        match self {
            Self::System => {}
            Self::CaBundle(path) => {
                let pem = std::fs::read(path)
                    .map_err(|err| PortalError::Tls(format!("reading {}: {}", path.display(), err)))?;
                let certificate = native_tls::Certificate::from_pem(&pem)
                    .map_err(|err| PortalError::Tls(err.to_string()))?;
                builder.add_root_certificate(certificate);
            }
            Self::Insecure => {
                builder.danger_accept_invalid_certs(true);
                builder.danger_accept_invalid_hostnames(true);
            }
        }
        builder
            .build()
            .map_err(|err| PortalError::Tls(err.to_string()))
    }
}

/// Classified failure of one portal exchange.
#[derive(Debug, Error)]
pub enum PortalError {
    /// The portal answered with an HTTP error status.
    #[error("portal returned HTTP {0}")]
    Status(u16),
    /// The portal answered without an error, but not with 200.
    #[error("portal answered with unexpected HTTP {0}")]
    UnexpectedStatus(u16),
    /// The exchange failed below HTTP: connect, DNS, timeout.
    #[error("portal transport failure")]
    Transport(#[source] ureq::Transport),
    /// The portal answered 200 with a body that is not JSON.
    #[error("portal response was not valid JSON")]
    Parse(#[source] std::io::Error),
    #[error("tls configuration: {0}")]
    Tls(String),
}

/// Client for one authenticated portal session. Cheap to share across
/// threads; every call builds its own envelope and request.
#[derive(Debug)]
pub struct PortalClient {
    agent: ureq::Agent,
    auth: RequestAuth,
    portal_url: String,
}

impl PortalClient {
    pub fn new(
        auth: RequestAuth,
        portal_url: impl Into<String>,
        tls: TlsPolicy,
    ) -> Result<Self, PortalError> {
        let connector = tls.connector()?;
        let agent = ureq::AgentBuilder::new()
            .timeout(RESPONSE_TIMEOUT)
            .tls_connector(Arc::new(connector))
            .build();
        Ok(Self::with_agent(agent, auth, portal_url))
    }

    /// Wraps an agent the caller already configured. Timeout and TLS policy
    /// are the agent's responsibility on this path.
    pub fn with_agent(agent: ureq::Agent, auth: RequestAuth, portal_url: impl Into<String>) -> Self {
        Self {
            agent,
            auth,
            portal_url: portal_url.into(),
        }
    }

    /// Sends one command, collapsing every failure to an empty object.
    /// Callers detect failure by checking the result for emptiness;
    /// diagnostics go to the logs. [`dispatch`](Self::dispatch) is the
    /// tagged form.
    pub fn send_command(&self, command: &Command, vacuum: &Vacuum) -> Value {
        match self.dispatch(command, vacuum) {
            Ok(body) => body,
            Err(_) => Value::Object(Map::new()),
        }
    }

    /// Sends one command and reports the classified outcome.
    pub fn dispatch(&self, command: &Command, vacuum: &Vacuum) -> Result<Value, PortalError> {
        let now = chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0;
        let request = build_request(&self.portal_url, command, vacuum, &self.auth, now);
        self.exchange(&request)
    }

    fn exchange(&self, request: &PortalRequest) -> Result<Value, PortalError> {
        debug!(
            endpoint = %request.base_url,
            body = %sanitize_data(&request.body),
            "calling portal"
        );

        let sent = self
            .agent
            .post(&request.url)
            .set("User-Agent", REQUEST_USER_AGENT)
            .send_json(&request.body);

        match sent {
            Ok(response) if response.status() == 200 => {
                let body: Value = response.into_json().map_err(|err| {
                    warn!(endpoint = %request.base_url, error = %err, "portal response was not valid JSON");
                    PortalError::Parse(err)
                })?;
                debug!(body = %body, "portal response");
                Ok(body)
            }
            Ok(response) => {
                let status = response.status();
                warn!(endpoint = %request.base_url, status, "error calling portal");
                Err(PortalError::UnexpectedStatus(status))
            }
            Err(ureq::Error::Status(502, _)) => {
                info!(
                    endpoint = %request.base_url,
                    "portal returned 502, the upstream api is known to be unreliable"
                );
                Err(PortalError::Status(502))
            }
            Err(ureq::Error::Status(status, _)) => {
                warn!(endpoint = %request.base_url, status, "error calling portal");
                Err(PortalError::Status(status))
            }
            Err(ureq::Error::Transport(transport)) => {
                warn!(endpoint = %request.base_url, error = %transport, "portal transport failure");
                Err(PortalError::Transport(transport))
            }
        }
    }
}
