//! Blocking SOAP-over-HTTP transport.
//!
//! A connection is prepared in two steps: [`SoapConnection::new`] checks
//! the connection settings, then [`SoapConnection::secure`] attaches the
//! injected TLS configuration and builds the client. Each connection makes
//! exactly one call and is then dropped; nothing is pooled.

use crate::config::{ConnectionConfig, SoapVersion};
use crate::envelope::Envelope;
use crate::error::{ConnectionError, TransportError};
use crate::trust::TransportConfig;
use reqwest::blocking::{Client, ClientBuilder};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::redirect::Policy;
use reqwest::{StatusCode, Url};
use std::time::Duration;
use tracing::debug;

/// SOAPAction value sent with SOAP 1.1 requests when none is configured.
const EMPTY_SOAP_ACTION: &str = "\"\"";

/// Connection settings that have been checked but not yet secured.
pub struct SoapConnection {
    builder: ClientBuilder,
    headers: HeaderMap,
}

impl SoapConnection {
    /// Prepare a connection from settings.
    pub fn new(config: &ConnectionConfig) -> Result<Self, ConnectionError> {
        let user_agent =
            HeaderValue::from_str(&config.user_agent).map_err(|e| ConnectionError::InvalidSetting {
                name: "user_agent".to_string(),
                reason: e.to_string(),
            })?;

        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                ConnectionError::InvalidSetting {
                    name: format!("headers.{}", name),
                    reason: e.to_string(),
                }
            })?;
            let header_value =
                HeaderValue::from_str(value).map_err(|e| ConnectionError::InvalidSetting {
                    name: format!("headers.{}", name),
                    reason: e.to_string(),
                })?;
            headers.insert(header_name, header_value);
        }

        let builder = Client::builder()
            .user_agent(user_agent)
            .redirect(Policy::none())
            .pool_max_idle_per_host(0)
            .connect_timeout(config.connect_timeout_ms.map(Duration::from_millis))
            .timeout(config.timeout_ms.map(Duration::from_millis));

        Ok(Self { builder, headers })
    }

    /// Build the HTTP client on top of the given TLS configuration.
    pub fn secure(self, transport: &TransportConfig) -> Result<SecureConnection, ConnectionError> {
        let client = self
            .builder
            .default_headers(self.headers)
            .use_preconfigured_tls(transport.tls_config().clone())
            .build()
            .map_err(ConnectionError::Client)?;
        Ok(SecureConnection { client })
    }
}

impl std::fmt::Debug for SoapConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoapConnection")
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// A connection ready to make a call.
#[derive(Debug)]
pub struct SecureConnection {
    client: Client,
}

impl SecureConnection {
    /// Send the envelope to `endpoint` and wait for the whole response.
    ///
    /// A 500 response carries a SOAP Fault and is returned like any other
    /// response message. The body is returned exactly as received.
    pub fn call(&self, envelope: &Envelope, endpoint: &str) -> Result<String, TransportError> {
        let url = Url::parse(endpoint)
            .map_err(|e| TransportError::Send(format!("invalid endpoint {:?}: {}", endpoint, e)))?;
        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(TransportError::Send(format!(
                    "unsupported endpoint scheme {:?}",
                    other
                )))
            }
        }

        let mut request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, envelope.version().content_type());
        if envelope.version() == SoapVersion::Soap11 {
            request = request.header("SOAPAction", EMPTY_SOAP_ACTION);
        }

        debug!(
            endpoint = %endpoint,
            bytes = envelope.as_str().len(),
            "Sending SOAP message"
        );

        let response = request
            .body(envelope.as_str().to_owned())
            .send()
            .map_err(|e| TransportError::Send(describe_send_error(&e)))?;

        let status = response.status();
        if !status.is_success() && status != StatusCode::INTERNAL_SERVER_ERROR {
            return Err(TransportError::Send(format!(
                "unexpected HTTP status {}",
                status
            )));
        }

        let body = response
            .bytes()
            .map_err(|e| TransportError::Serialize(error_chain(&e)))?;
        if body.is_empty() {
            return Err(TransportError::Serialize(format!(
                "HTTP {} response contained no SOAP message",
                status
            )));
        }

        debug!(
            endpoint = %endpoint,
            status = status.as_u16(),
            bytes = body.len(),
            "Received SOAP response"
        );

        String::from_utf8(body.to_vec())
            .map_err(|e| TransportError::Serialize(format!("response is not UTF-8: {}", e)))
    }
}

fn describe_send_error(error: &reqwest::Error) -> String {
    let chain = error_chain(error);
    if error.is_timeout() {
        format!("request timed out: {}", chain)
    } else if error.is_connect() {
        format!("connection failed: {}", chain)
    } else {
        chain
    }
}

/// Render an error with all of its sources, outermost first.
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut parts = vec![error.to_string()];
    let mut source = error.source();
    while let Some(inner) = source {
        parts.push(inner.to_string());
        source = inner.source();
    }
    parts.join(": ")
}
