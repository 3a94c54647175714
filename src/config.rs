//! # Router configuration.
//!
//! [`RouterConfig`] controls subscription-independent behavior of the
//! [`ParameterRouter`](crate::ParameterRouter).
//!
//! # Example
//! ```
//! use paramflow::RouterConfig;
//!
//! let mut cfg = RouterConfig::default();
//! cfg.cache_all = true;
//!
//! assert!(cfg.cache_all);
//! ```

/// Configuration for a [`ParameterRouter`](crate::ParameterRouter) instance.
#[derive(Clone, Copy, Debug)]
pub struct RouterConfig {
    /// When true, every provider is switched to broadcast mode up front (via
    /// [`ParameterRouter::start_all`](crate::ParameterRouter::start_all)) and
    /// per-parameter `start_providing`/`stop_providing` calls are suppressed:
    /// everything flows regardless of subscriptions, so the cache can record
    /// all parameters.
    pub cache_all: bool,
}

impl Default for RouterConfig {
    /// Provides the default configuration:
    /// - `cache_all = false` (providers are activated per subscribed parameter)
    fn default() -> Self {
        Self { cache_all: false }
    }
}
