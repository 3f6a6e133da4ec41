pub mod config;
pub mod cookie;
pub mod registry;
pub mod request;
pub mod resolver;
pub mod strategy;
pub mod version;

pub use config::{load_wand_config, ConfigError, RequestSection, WandConfig};
pub use cookie::CookieHandler;
pub use registry::{DiscoveryConfig, FactoryFn, StrategyRegistry, DEFAULT_ROOT, PACKAGES_VAR};
pub use request::{
    browser, Capabilities, DesktopOs, DriverRequest, EffectiveRequest, HostProbe, MobileOs,
    MobilePlatform, OsFamily, RequestError, Settings, SystemProbe,
};
pub use resolver::{DriverResolver, FailedAttempt, ResolveError};
pub use strategy::{AttemptResult, DriverHandle, DriverStrategy, Resolution};
