//! Trust-all TLS policy.
//!
//! The processor talks to test endpoints that present self-signed,
//! expired or hostname-mismatched certificates. The verifier here accepts
//! all of them. It must never back a production client.
//!
//! The policy is normally carried as a [`TransportConfig`] value and handed
//! to the transport. [`install_trust_all`] additionally keeps a process-wide
//! default for hosts that expect a single ambient configuration.

use crate::config::TrustMode;
use crate::error::InstallError;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

static AMBIENT: RwLock<Option<TransportConfig>> = RwLock::new(None);

/// TLS client configuration that accepts any certificate and any hostname.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    tls: Arc<ClientConfig>,
}

impl TransportConfig {
    /// Build a fresh trust-all configuration.
    ///
    /// Every call creates a new crypto provider and draws from its random
    /// source, so an unusable platform RNG is reported here rather than at
    /// handshake time.
    pub fn trust_all() -> Result<Self, InstallError> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());

        let mut seed = [0u8; 32];
        provider
            .secure_random
            .fill(&mut seed)
            .map_err(|_| InstallError::Randomness)?;

        let tls = ClientConfig::builder_with_provider(provider.clone())
            .with_safe_default_protocol_versions()?
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(TrustAllVerifier::new(provider)))
            .with_no_client_auth();

        Ok(Self { tls: Arc::new(tls) })
    }

    /// The rustls client configuration.
    pub fn tls_config(&self) -> &ClientConfig {
        &self.tls
    }
}

/// Build a trust-all configuration and make it the process-wide default.
///
/// Reinstalling replaces the previous default with an equivalent one. There
/// is no teardown.
pub fn install_trust_all() -> Result<TransportConfig, InstallError> {
    let config = TransportConfig::trust_all()?;
    let mut ambient = AMBIENT.write().unwrap_or_else(PoisonError::into_inner);
    let reinstall = ambient.is_some();
    *ambient = Some(config.clone());
    debug!(reinstall, "Installed trust-all TLS policy as process default");
    Ok(config)
}

/// The process-wide trust-all configuration, if one has been installed.
pub fn ambient_trust() -> Option<TransportConfig> {
    AMBIENT
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Where an invocation gets its trust-all configuration from.
#[derive(Debug, Clone)]
pub enum TrustPolicy {
    /// Install the process-wide default on every invocation.
    Ambient,
    /// Use a configuration built ahead of time.
    Injected(TransportConfig),
    /// Fails to resolve, as a platform without a usable RNG would.
    #[cfg(test)]
    Unavailable,
}

impl TrustPolicy {
    /// Build the policy for the configured mode.
    ///
    /// `Injected` builds its configuration immediately.
    pub fn from_mode(mode: TrustMode) -> Result<Self, InstallError> {
        match mode {
            TrustMode::Ambient => Ok(Self::Ambient),
            TrustMode::Injected => TransportConfig::trust_all().map(Self::Injected),
        }
    }

    /// Produce the configuration for one invocation.
    pub fn resolve(&self) -> Result<TransportConfig, InstallError> {
        match self {
            Self::Ambient => install_trust_all(),
            Self::Injected(config) => Ok(config.clone()),
            #[cfg(test)]
            Self::Unavailable => Err(InstallError::Randomness),
        }
    }
}

/// Certificate verifier that accepts every chain, hostname and signature.
#[derive(Debug)]
struct TrustAllVerifier {
    provider: Arc<CryptoProvider>,
}

impl TrustAllVerifier {
    fn new(provider: Arc<CryptoProvider>) -> Self {
        Self { provider }
    }
}

impl ServerCertVerifier for TrustAllVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}
