//! SOAP test processor implementation.
//!
//! Runs one test step: builds the envelope, resolves the trust-all policy,
//! makes one blocking call and maps the outcome to a [`Response`].

use crate::config::ProcessorConfig;
use crate::envelope::Envelope;
use crate::error::{ExecutionError, ExecutionFailure, InstallError};
use crate::transport::SoapConnection;
use crate::trust::TrustPolicy;
use tracing::{debug, error};

/// Source tag attached to every diagnostic this processor emits.
pub const PROCESSOR_TAG: &str = "SoapTestProcessor";

/// One test step to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Target URL
    pub endpoint: String,
    /// Raw XML payload, well-formed or not
    pub test_block: String,
}

impl Request {
    /// Create a new request.
    pub fn new(endpoint: impl Into<String>, test_block: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            test_block: test_block.into(),
        }
    }
}

/// Result of one test step. An absent body means the step failed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Response {
    body: Option<String>,
}

impl Response {
    /// Create a response with the given body.
    pub fn new(body: Option<String>) -> Self {
        Self { body }
    }

    /// Create a response with no body.
    pub fn absent() -> Self {
        Self { body: None }
    }

    /// The response body, if the step produced one.
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Consume the response, returning the body.
    pub fn into_body(self) -> Option<String> {
        self.body
    }
}

/// A pluggable unit that executes one kind of test step.
pub trait TestProcessor: Send + Sync {
    /// Execute the step. Every failure yields an absent body.
    fn execute_test(&self, request: &Request) -> Response;
}

/// Processor that sends the test block as a SOAP message.
#[derive(Debug)]
pub struct SoapTestProcessor {
    config: ProcessorConfig,
    trust: TrustPolicy,
}

impl SoapTestProcessor {
    /// Create a processor whose trust policy follows `config.trust.mode`.
    pub fn new(config: ProcessorConfig) -> Result<Self, InstallError> {
        let trust = TrustPolicy::from_mode(config.trust.mode)?;
        Ok(Self { config, trust })
    }

    /// Create a processor with an explicit trust policy.
    pub fn with_trust_policy(config: ProcessorConfig, trust: TrustPolicy) -> Self {
        Self { config, trust }
    }

    /// The processor configuration.
    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Execute one test step, keeping track of which step failed.
    ///
    /// The connection and the envelope are both constructed before either
    /// failure ends the invocation, so both diagnostics are reported. A trust
    /// policy failure ends the invocation regardless. No network call is
    /// made unless the connection, the envelope and the trust policy are
    /// all ready.
    pub fn execute(&self, request: &Request) -> Result<String, ExecutionFailure> {
        debug!(
            source = PROCESSOR_TAG,
            endpoint = %request.endpoint,
            "Running SOAP test processor"
        );

        let mut failure = ExecutionFailure::default();

        let connection = match SoapConnection::new(&self.config.connection) {
            Ok(connection) => Some(connection),
            Err(e) => {
                error!(source = PROCESSOR_TAG, error = %e, "Could not create SOAP connection");
                failure.push(e);
                None
            }
        };

        let envelope = match Envelope::build(&request.test_block, &self.config.envelope) {
            Ok(envelope) => Some(envelope),
            Err(e) => {
                error!(source = PROCESSOR_TAG, error = %e, "Could not create SOAP message");
                failure.push(e);
                None
            }
        };

        let transport = match self.trust.resolve() {
            Ok(transport) => transport,
            Err(e) => {
                error!(source = PROCESSOR_TAG, error = %e, "Could not install trust-all TLS policy");
                failure.push(e);
                return Err(failure);
            }
        };

        let (Some(connection), Some(envelope)) = (connection, envelope) else {
            error!(source = PROCESSOR_TAG, "No SOAP connection or message");
            return Err(failure);
        };
        debug_assert!(failure.is_empty());

        let connection = connection.secure(&transport).map_err(|e| {
            error!(source = PROCESSOR_TAG, error = %e, "Could not create SOAP connection");
            ExecutionFailure::from(ExecutionError::from(e))
        })?;

        match connection.call(&envelope, &request.endpoint) {
            Ok(body) => {
                debug!(
                    source = PROCESSOR_TAG,
                    endpoint = %request.endpoint,
                    bytes = body.len(),
                    "SOAP test step completed"
                );
                Ok(body)
            }
            Err(e) => {
                let e = ExecutionError::from(e);
                error!(
                    source = PROCESSOR_TAG,
                    code = %e.kind().as_str(),
                    error = %e,
                    "SOAP call failed"
                );
                Err(e.into())
            }
        }
    }
}

impl TestProcessor for SoapTestProcessor {
    fn execute_test(&self, request: &Request) -> Response {
        match self.execute(request) {
            Ok(body) => Response::new(Some(body)),
            Err(_) => Response::absent(),
        }
    }
}
