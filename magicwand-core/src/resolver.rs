use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info};

use crate::registry::{DiscoveryConfig, StrategyRegistry};
use crate::request::{DriverRequest, HostProbe, RequestError, SystemProbe};
use crate::strategy::{DriverStrategy, Resolution};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid driver request: {0}")]
    InvalidRequest(#[from] RequestError),
    #[error("no strategy produced a driver (tried {tried})")]
    NoMatch {
        tried: usize,
        failures: Vec<FailedAttempt>,
    },
}

/// One strategy's failure during a resolution pass. Failures never abort the
/// pass; they are collected so an exhausted pass can say what went wrong.
#[derive(Debug, Error)]
#[error("strategy '{strategy}' failed: {error}")]
pub struct FailedAttempt {
    pub strategy: String,
    pub error: anyhow::Error,
}

/// Tries strategies in sequence until one produces a driver. With no
/// explicit strategies the order comes from registry discovery; a single
/// explicit strategy disables discovery entirely.
pub struct DriverResolver {
    order: Vec<Box<dyn DriverStrategy>>,
    request: DriverRequest,
    probe: Box<dyn HostProbe>,
    registry: Arc<StrategyRegistry>,
    discovery: DiscoveryConfig,
}

impl DriverResolver {
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            request: DriverRequest::new(),
            probe: Box::new(SystemProbe),
            registry: StrategyRegistry::global(),
            discovery: DiscoveryConfig::default(),
        }
    }

    /// Appends an explicit strategy to the resolution order.
    pub fn with_strategy<S: DriverStrategy + 'static>(self, strategy: S) -> Self {
        self.with_boxed_strategy(Box::new(strategy))
    }

    pub fn with_boxed_strategy(mut self, strategy: Box<dyn DriverStrategy>) -> Self {
        self.order.push(strategy);
        self
    }

    pub fn with_request(mut self, request: DriverRequest) -> Self {
        self.request = request;
        self
    }

    pub fn with_probe(mut self, probe: impl HostProbe + 'static) -> Self {
        self.probe = Box::new(probe);
        self
    }

    pub fn with_registry(mut self, registry: Arc<StrategyRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_discovery(mut self, discovery: DiscoveryConfig) -> Self {
        self.discovery = discovery;
        self
    }

    /// Runs one resolution pass: validate the request, fix the strategy
    /// order, then attempt each strategy until the first success. Strategy
    /// failures are recorded and the pass moves on; only an invalid request
    /// stops it up front.
    pub fn resolve(&self) -> Result<Resolution, ResolveError> {
        let effective = self.request.resolve(self.probe.as_ref())?;

        let discovered;
        let order: &[Box<dyn DriverStrategy>] = if self.order.is_empty() {
            discovered = self.registry.discover(&self.discovery);
            info!(
                strategies = discovered.len(),
                "strategy order taken from discovery"
            );
            &discovered
        } else {
            &self.order
        };

        let mut tried = 0usize;
        let mut failures = Vec::new();
        for strategy in order {
            tried += 1;
            debug!(
                strategy = strategy.name(),
                browser = effective.browser(),
                "attempting driver construction"
            );
            match strategy.attempt(&effective) {
                Ok(Some(mut resolution)) => {
                    resolution.set_strategy(strategy.name());
                    info!(
                        strategy = strategy.name(),
                        derived_settings = resolution.settings().len(),
                        "driver resolved"
                    );
                    return Ok(resolution);
                }
                Ok(None) => {
                    debug!(strategy = strategy.name(), "strategy declined request");
                }
                Err(error) => {
                    error!(
                        strategy = strategy.name(),
                        error = %error,
                        "strategy failed, trying next"
                    );
                    failures.push(FailedAttempt {
                        strategy: strategy.name().to_string(),
                        error,
                    });
                }
            }
        }

        Err(ResolveError::NoMatch { tried, failures })
    }
}

impl Default for DriverResolver {
    fn default() -> Self {
        Self::new()
    }
}
