//! Configuration types for the SOAP test processor.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Main configuration for the SOAP test processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Config version
    pub version: String,

    /// HTTP connection settings
    pub connection: ConnectionConfig,

    /// Envelope construction settings
    pub envelope: EnvelopeConfig,

    /// Trust policy settings
    pub trust: TrustConfig,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            version: "1".to_string(),
            connection: ConnectionConfig::default(),
            envelope: EnvelopeConfig::default(),
            trust: TrustConfig::default(),
        }
    }
}

/// HTTP connection settings.
///
/// No timeout is applied unless one is configured here; the caller blocks
/// for the full round trip otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// TCP/TLS connect timeout in milliseconds
    pub connect_timeout_ms: Option<u64>,

    /// Whole-request timeout in milliseconds
    pub timeout_ms: Option<u64>,

    /// User-Agent header sent with every call
    pub user_agent: String,

    /// Extra request headers
    pub headers: BTreeMap<String, String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: None,
            timeout_ms: None,
            user_agent: format!("soap-test-processor/{}", env!("CARGO_PKG_VERSION")),
            headers: BTreeMap::new(),
        }
    }
}

/// Envelope construction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeConfig {
    /// SOAP version used to wrap bare body fragments, and to pick the
    /// Content-Type when an envelope's namespace is not recognised
    pub default_version: SoapVersion,

    /// Wrap payloads whose root is not an Envelope into Envelope/Body
    pub wrap_fragments: bool,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            default_version: SoapVersion::Soap11,
            wrap_fragments: true,
        }
    }
}

/// SOAP versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SoapVersion {
    /// SOAP 1.1 (namespace: http://schemas.xmlsoap.org/soap/envelope/)
    #[default]
    #[serde(rename = "1.1")]
    Soap11,
    /// SOAP 1.2 (namespace: http://www.w3.org/2003/05/soap-envelope)
    #[serde(rename = "1.2")]
    Soap12,
}

impl SoapVersion {
    /// Envelope namespace URI for this version.
    pub fn namespace(&self) -> &'static str {
        match self {
            Self::Soap11 => crate::envelope::SOAP_11_NS,
            Self::Soap12 => crate::envelope::SOAP_12_NS,
        }
    }

    /// Content-Type for requests carrying this version.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Soap11 => "text/xml; charset=utf-8",
            Self::Soap12 => "application/soap+xml; charset=utf-8",
        }
    }
}

/// Trust policy settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TrustConfig {
    /// Where the trust-all TLS configuration comes from
    pub mode: TrustMode,
}

/// Trust policy source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TrustMode {
    /// Install the process-wide default on every invocation
    #[default]
    Ambient,
    /// Build one configuration up front and inject it into the transport
    Injected,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProcessorConfig::default();
        assert_eq!(config.version, "1");
        assert!(config.connection.timeout_ms.is_none());
        assert!(config.connection.connect_timeout_ms.is_none());
        assert!(config.envelope.wrap_fragments);
        assert_eq!(config.envelope.default_version, SoapVersion::Soap11);
        assert_eq!(config.trust.mode, TrustMode::Ambient);
    }

    #[test]
    fn test_config_serialization() {
        let config = ProcessorConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: ProcessorConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.connection.user_agent, config.connection.user_agent);
        assert_eq!(parsed.trust.mode, config.trust.mode);
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
version: "1"
connection:
  timeout_ms: 5000
  headers:
    X-Test-Run: "42"
envelope:
  default_version: "1.2"
  wrap_fragments: false
trust:
  mode: injected
"#;
        let config: ProcessorConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.connection.timeout_ms, Some(5000));
        assert!(config.connection.connect_timeout_ms.is_none());
        assert_eq!(config.connection.headers.get("X-Test-Run").map(String::as_str), Some("42"));
        assert_eq!(config.envelope.default_version, SoapVersion::Soap12);
        assert!(!config.envelope.wrap_fragments);
        assert_eq!(config.trust.mode, TrustMode::Injected);
    }

    #[test]
    fn test_version_content_types() {
        assert!(SoapVersion::Soap11.content_type().starts_with("text/xml"));
        assert!(SoapVersion::Soap12.content_type().starts_with("application/soap+xml"));
    }
}
