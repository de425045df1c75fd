//! SOAP test processor
//!
//! Executes a single SOAP test step: wraps a raw XML payload in a SOAP
//! envelope, sends it over HTTP(S) with certificate and hostname checks
//! disabled, and returns the raw response body.
//!
//! # Features
//!
//! - Envelope construction from untyped payload text, rejected at build time
//!   when malformed
//! - Trust-all TLS policy, injected or installed as a process default
//! - One blocking call per test step, no pooling, no retries
//! - Every failure collapsed into an absent response body, with the failing
//!   step logged
//!
//! The trust-all policy exists for test endpoints with self-signed or
//! mismatched certificates. Do not reuse it for anything production-facing.
//!
//! # Example
//!
//! ```ignore
//! use soap_test_processor::{ProcessorConfig, Request, SoapTestProcessor, TestProcessor};
//!
//! let processor = SoapTestProcessor::new(ProcessorConfig::default())?;
//! let response = processor.execute_test(&Request::new(
//!     "https://test.local/svc",
//!     "<ping xmlns=\"urn:example\"/>",
//! ));
//! match response.body() {
//!     Some(body) => println!("{body}"),
//!     None => eprintln!("test step failed"),
//! }
//! ```

pub mod config;
pub mod envelope;
pub mod error;
pub mod lifecycle;
pub mod processor;
pub mod transport;
pub mod trust;

pub use config::ProcessorConfig;
pub use envelope::Envelope;
pub use error::{ErrorKind, ExecutionError, ExecutionFailure};
pub use lifecycle::{ProcessorHost, ProcessorRegistry, TEST_PROCESSOR_CAPABILITY};
pub use processor::{Request, Response, SoapTestProcessor, TestProcessor};
pub use trust::{install_trust_all, TransportConfig, TrustPolicy};
