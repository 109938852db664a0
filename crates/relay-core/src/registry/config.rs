//! Registry configuration.

/// Registry configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Emit a diagnostic record for every fired event
    pub debug: bool,
}

impl RegistryConfig {
    /// Configuration with debug records enabled
    #[must_use]
    pub fn debug() -> Self {
        Self { debug: true }
    }

    /// Set the debug flag
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}
