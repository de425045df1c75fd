//! Registration glue between the processor and its host framework.
//!
//! The host owns the processor table. This module only knows how to put a
//! [`SoapTestProcessor`] into it under the test-processor capability and
//! how to take it out again.

use crate::config::ProcessorConfig;
use crate::error::InstallError;
use crate::processor::{SoapTestProcessor, TestProcessor};
use std::collections::HashMap;
use tracing::info;

/// Capability name the processor is registered under.
pub const TEST_PROCESSOR_CAPABILITY: &str = "TestProcessor";

/// A host that processors can register with.
pub trait ProcessorHost {
    /// Make `processor` available under `capability`.
    fn register(&mut self, capability: &str, processor: Box<dyn TestProcessor>);

    /// Remove whatever is registered under `capability`.
    fn unregister(&mut self, capability: &str) -> Option<Box<dyn TestProcessor>>;
}

/// Register a new SOAP test processor with the host.
pub fn start<H: ProcessorHost + ?Sized>(
    host: &mut H,
    config: ProcessorConfig,
) -> Result<(), InstallError> {
    let processor = SoapTestProcessor::new(config)?;
    host.register(TEST_PROCESSOR_CAPABILITY, Box::new(processor));
    info!(capability = TEST_PROCESSOR_CAPABILITY, "SOAP test processor registered");
    Ok(())
}

/// Teardown hook. Holds no resources, so there is nothing to release.
pub fn stop<H: ProcessorHost + ?Sized>(_host: &mut H) {}

/// In-memory processor table.
#[derive(Default)]
pub struct ProcessorRegistry {
    processors: HashMap<String, Box<dyn TestProcessor>>,
}

impl ProcessorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the processor registered under `capability`.
    pub fn get(&self, capability: &str) -> Option<&dyn TestProcessor> {
        self.processors.get(capability).map(|p| p.as_ref())
    }

    /// Number of registered processors.
    pub fn len(&self) -> usize {
        self.processors.len()
    }

    /// Check if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}

impl ProcessorHost for ProcessorRegistry {
    fn register(&mut self, capability: &str, processor: Box<dyn TestProcessor>) {
        self.processors.insert(capability.to_string(), processor);
    }

    fn unregister(&mut self, capability: &str) -> Option<Box<dyn TestProcessor>> {
        self.processors.remove(capability)
    }
}

impl std::fmt::Debug for ProcessorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut capabilities: Vec<_> = self.processors.keys().collect();
        capabilities.sort();
        f.debug_struct("ProcessorRegistry")
            .field("capabilities", &capabilities)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::{Request, Response};

    struct Canned;

    impl TestProcessor for Canned {
        fn execute_test(&self, _request: &Request) -> Response {
            Response::new(Some("canned".to_string()))
        }
    }

    #[test]
    fn test_start_registers_under_capability() {
        let mut registry = ProcessorRegistry::new();
        assert!(registry.is_empty());

        start(&mut registry, ProcessorConfig::default()).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.get(TEST_PROCESSOR_CAPABILITY).is_some());

        stop(&mut registry);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_replaces_and_unregister_removes() {
        let mut registry = ProcessorRegistry::new();
        start(&mut registry, ProcessorConfig::default()).unwrap();
        registry.register(TEST_PROCESSOR_CAPABILITY, Box::new(Canned));

        let processor = registry.get(TEST_PROCESSOR_CAPABILITY).unwrap();
        let response = processor.execute_test(&Request::new("http://unused", "<a/>"));
        assert_eq!(response.body(), Some("canned"));

        assert!(registry.unregister(TEST_PROCESSOR_CAPABILITY).is_some());
        assert!(registry.unregister(TEST_PROCESSOR_CAPABILITY).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_registry_debug_lists_capabilities() {
        let mut registry = ProcessorRegistry::new();
        registry.register("b", Box::new(Canned));
        registry.register("a", Box::new(Canned));
        assert_eq!(
            format!("{:?}", registry),
            r#"ProcessorRegistry { capabilities: ["a", "b"] }"#
        );
    }
}
