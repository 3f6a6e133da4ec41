use std::any::Any;
use std::fmt;

use serde_json::Value;

use crate::request::{EffectiveRequest, Settings};

/// Outcome of one strategy attempt. `Ok(Some(_))` claims the request,
/// `Ok(None)` declines it so the engine moves to the next strategy, and
/// `Err(_)` records a failure for this strategy without aborting the pass.
pub type AttemptResult = anyhow::Result<Option<Resolution>>;

/// A way of constructing a driver for an effective request. Implementations
/// decide applicability themselves; the engine only sequences them.
pub trait DriverStrategy: Send + Sync {
    /// Stable diagnostic name. Discovery also uses it to deduplicate
    /// strategies registered under more than one root.
    fn name(&self) -> &str;

    fn attempt(&self, request: &EffectiveRequest) -> AttemptResult;
}

/// Opaque driver produced by a strategy. The engine never inspects it; the
/// caller that knows the concrete type gets it back out with `downcast_ref`.
pub struct DriverHandle {
    inner: Box<dyn Any + Send>,
}

impl DriverHandle {
    pub fn new<T: Any + Send>(driver: T) -> Self {
        Self {
            inner: Box::new(driver),
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref()
    }

    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.inner.downcast_mut()
    }
}

impl fmt::Debug for DriverHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverHandle").finish_non_exhaustive()
    }
}

/// A successfully constructed driver plus whatever settings the strategy
/// derived while building it (session ids, tunnel endpoints). The engine
/// stamps the winning strategy's name before handing it back.
#[derive(Debug)]
pub struct Resolution {
    handle: DriverHandle,
    settings: Settings,
    strategy: String,
}

impl Resolution {
    pub fn new(handle: DriverHandle) -> Self {
        Self {
            handle,
            settings: Settings::new(),
            strategy: String::new(),
        }
    }

    pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.settings.set(key, value);
        self
    }

    pub fn handle(&self) -> &DriverHandle {
        &self.handle
    }

    pub fn handle_mut(&mut self) -> &mut DriverHandle {
        &mut self.handle
    }

    pub fn into_handle(self) -> DriverHandle {
        self.handle
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Name of the strategy that produced this resolution.
    pub fn strategy(&self) -> &str {
        &self.strategy
    }

    pub(crate) fn set_strategy(&mut self, name: &str) {
        self.strategy = name.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeDriver {
        session: &'static str,
    }

    #[test]
    fn handle_round_trips_through_any() {
        let handle = DriverHandle::new(FakeDriver { session: "abc123" });

        let driver = handle.downcast_ref::<FakeDriver>().unwrap();
        assert_eq!(driver.session, "abc123");
        assert!(handle.downcast_ref::<String>().is_none());
    }

    #[test]
    fn resolution_accumulates_derived_settings() {
        let resolution = Resolution::new(DriverHandle::new(FakeDriver { session: "s" }))
            .with_setting("sessionId", "s")
            .with_setting("tunnel", true);

        assert_eq!(resolution.settings().get_str("sessionId"), Some("s"));
        assert_eq!(resolution.settings().len(), 2);
        assert_eq!(resolution.strategy(), "");
    }
}
