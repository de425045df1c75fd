//! Error types for the SOAP test processor.
//!
//! Each step of an invocation reports its own error type. The processor
//! folds them into [`ExecutionError`] so logs and tests can tell the failure
//! points apart, while callers of `execute_test` only see an absent body.

use thiserror::Error;

/// The payload could not be turned into a sendable SOAP message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("XML parsing error: {0}")]
    XmlParse(String),

    #[error("empty payload: no root element")]
    Empty,

    #[error("content after root element: {0}")]
    TrailingContent(String),

    #[error("DOCTYPE declarations are not allowed in SOAP messages")]
    Doctype,

    #[error("payload root <{0}> is not a SOAP Envelope")]
    NotAnEnvelope(String),
}

/// The trust-all TLS context could not be initialised.
#[derive(Error, Debug)]
pub enum InstallError {
    #[error("secure random source unavailable")]
    Randomness,

    #[error("TLS context initialisation failed: {0}")]
    Context(#[from] rustls::Error),
}

/// The HTTP connection object could not be constructed.
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("invalid connection setting {name}: {reason}")]
    InvalidSetting { name: String, reason: String },

    #[error("HTTP client construction failed: {0}")]
    Client(#[source] reqwest::Error),
}

/// The call itself failed after the connection and envelope were ready.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("could not send SOAP message: {0}")]
    Send(String),

    #[error("could not write SOAP response to string: {0}")]
    Serialize(String),
}

/// Stable codes for the failure points of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed input payload
    Build,
    /// Trust context initialisation failure
    Install,
    /// Connection construction failure
    Connection,
    /// Network or protocol failure while calling the endpoint
    Send,
    /// Failure turning the response into text
    Serialize,
}

impl ErrorKind {
    /// Get the string code for this failure point.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Build => "BUILD_ERROR",
            Self::Install => "INSTALL_ERROR",
            Self::Connection => "CONNECTION_ERROR",
            Self::Send => "SEND_ERROR",
            Self::Serialize => "SERIALIZE_ERROR",
        }
    }
}

/// Any failure observed while executing one test step.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("could not create SOAP message: {0}")]
    Build(#[from] BuildError),

    #[error("could not install trust-all policy: {0}")]
    Install(#[from] InstallError),

    #[error("could not create SOAP connection: {0}")]
    Connection(#[from] ConnectionError),

    #[error("{0}")]
    Transport(#[from] TransportError),
}

impl ExecutionError {
    /// The failure point this error originated from.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Build(_) => ErrorKind::Build,
            Self::Install(_) => ErrorKind::Install,
            Self::Connection(_) => ErrorKind::Connection,
            Self::Transport(TransportError::Send(_)) => ErrorKind::Send,
            Self::Transport(TransportError::Serialize(_)) => ErrorKind::Serialize,
        }
    }
}

/// All errors collected during a failed invocation, in the order they occurred.
///
/// Connection and envelope construction are both attempted before either
/// failure stops the invocation, so a failure can carry more than one error.
#[derive(Debug, Default)]
pub struct ExecutionFailure {
    errors: Vec<ExecutionError>,
}

impl ExecutionFailure {
    pub(crate) fn push(&mut self, error: impl Into<ExecutionError>) {
        self.errors.push(error.into());
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Errors in the order they were observed.
    pub fn errors(&self) -> &[ExecutionError] {
        &self.errors
    }

    /// Check whether any collected error came from the given failure point.
    pub fn has(&self, kind: ErrorKind) -> bool {
        self.errors.iter().any(|e| e.kind() == kind)
    }
}

impl From<ExecutionError> for ExecutionFailure {
    fn from(error: ExecutionError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl std::fmt::Display for ExecutionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined = self
            .errors
            .iter()
            .map(|e| format!("[{}] {}", e.kind().as_str(), e))
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

impl std::error::Error for ExecutionFailure {}
