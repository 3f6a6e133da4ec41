use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::cookie::CookieHandler;

pub mod capabilities;
pub mod os;
pub mod probe;

pub use capabilities::{Capabilities, Settings};
pub use os::{DesktopOs, MobileOs, MobilePlatform, OsFamily};
pub use probe::{HostProbe, SystemProbe};

/// Well-known browser identifiers. The browser field is a free string, these
/// just cover the set strategies usually match on.
pub mod browser {
    pub const CHROME: &str = "chrome";
    pub const FIREFOX: &str = "firefox";
    pub const SAFARI: &str = "safari";
    pub const INTERNET_EXPLORER: &str = "internet explorer";
    pub const PHANTOMJS: &str = "phantomjs";
}

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("browser is set but blank")]
    BlankBrowser,
}

/// Partially-specified driver request. Setters never validate; everything is
/// deferred to `resolve`, which applies defaults and freezes the result.
#[derive(Clone, Default)]
pub struct DriverRequest {
    desktop_os: Option<DesktopOs>,
    mobile_os: Option<MobileOs>,
    browser: Option<String>,
    capabilities: Capabilities,
    settings: Settings,
    cookie_handler: Option<Arc<dyn CookieHandler>>,
}

impl fmt::Debug for DriverRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverRequest")
            .field("desktop_os", &self.desktop_os)
            .field("mobile_os", &self.mobile_os)
            .field("browser", &self.browser)
            .field("capabilities", &self.capabilities)
            .field("settings", &self.settings)
            .finish()
    }
}

impl DriverRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_desktop_os(mut self, os: DesktopOs) -> Self {
        self.desktop_os = Some(os);
        self
    }

    pub fn with_mobile_os(mut self, os: MobileOs) -> Self {
        self.mobile_os = Some(os);
        self
    }

    pub fn with_browser(mut self, browser: impl Into<String>) -> Self {
        self.browser = Some(browser.into());
        self
    }

    pub fn with_capability(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.capabilities.set(key, value);
        self
    }

    pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.settings.set(key, value);
        self
    }

    pub fn with_cookie_handler(mut self, handler: Arc<dyn CookieHandler>) -> Self {
        self.cookie_handler = Some(handler);
        self
    }

    pub fn desktop_os(&self) -> Option<&DesktopOs> {
        self.desktop_os.as_ref()
    }

    pub fn mobile_os(&self) -> Option<&MobileOs> {
        self.mobile_os.as_ref()
    }

    pub fn browser(&self) -> Option<&str> {
        self.browser.as_deref()
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn capabilities_mut(&mut self) -> &mut Capabilities {
        &mut self.capabilities
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn cookie_handler(&self) -> Option<Arc<dyn CookieHandler>> {
        self.cookie_handler.clone()
    }

    /// Validates the request and applies defaults, probing the host at most
    /// once and only when no desktop OS was given. The one validation rule:
    /// a browser that was explicitly set must not be blank.
    pub fn resolve(&self, probe: &dyn HostProbe) -> Result<EffectiveRequest, RequestError> {
        if let Some(browser) = &self.browser {
            if browser.trim().is_empty() {
                return Err(RequestError::BlankBrowser);
            }
        }

        let desktop_os = match &self.desktop_os {
            Some(os) => os.clone(),
            None => {
                let os_name = probe.os_name();
                let family = OsFamily::classify(&os_name);
                debug!(host_os = %os_name, family = %family, "classified host os");
                DesktopOs::new(family)
            }
        };

        let browser = match &self.browser {
            Some(browser) => browser.clone(),
            None => default_browser(desktop_os.family).to_string(),
        };

        Ok(EffectiveRequest {
            desktop_os,
            mobile_os: self.mobile_os.clone(),
            browser,
            capabilities: self.capabilities.clone(),
            settings: self.settings.clone(),
            cookie_handler: self.cookie_handler.clone(),
        })
    }
}

fn default_browser(family: OsFamily) -> &'static str {
    match family {
        OsFamily::Mac => browser::SAFARI,
        OsFamily::Windows => browser::INTERNET_EXPLORER,
        _ => browser::CHROME,
    }
}

/// Frozen request produced by `DriverRequest::resolve`. Every field is fully
/// determined; strategies read it without ever touching the host again.
#[derive(Clone)]
pub struct EffectiveRequest {
    desktop_os: DesktopOs,
    mobile_os: Option<MobileOs>,
    browser: String,
    capabilities: Capabilities,
    settings: Settings,
    cookie_handler: Option<Arc<dyn CookieHandler>>,
}

impl fmt::Debug for EffectiveRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectiveRequest")
            .field("desktop_os", &self.desktop_os)
            .field("mobile_os", &self.mobile_os)
            .field("browser", &self.browser)
            .field("capabilities", &self.capabilities)
            .field("settings", &self.settings)
            .finish()
    }
}

impl EffectiveRequest {
    pub fn desktop_os(&self) -> &DesktopOs {
        &self.desktop_os
    }

    pub fn mobile_os(&self) -> Option<&MobileOs> {
        self.mobile_os.as_ref()
    }

    pub fn is_mobile(&self) -> bool {
        self.mobile_os.is_some()
    }

    pub fn browser(&self) -> &str {
        &self.browser
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn cookie_handler(&self) -> Option<Arc<dyn CookieHandler>> {
        self.cookie_handler.clone()
    }

    /// Base capability entries derived from the request: platform name,
    /// browser name and platform version for mobile, browser name alone for
    /// desktop.
    pub fn default_capabilities(&self) -> Capabilities {
        let mut caps = Capabilities::new();
        match &self.mobile_os {
            Some(mobile) => {
                caps.set("platformName", mobile.platform.platform_name());
                caps.set("browserName", self.browser.as_str());
                if let Some(version) = &mobile.version {
                    caps.set("platformVersion", version.as_str());
                }
            }
            None => {
                caps.set("browserName", self.browser.as_str());
            }
        }
        caps
    }

    /// Caller capabilities with the derived defaults filled in underneath.
    /// Entries the caller set are never overwritten.
    pub fn effective_capabilities(&self) -> Capabilities {
        let mut caps = self.capabilities.clone();
        caps.merge_missing(&self.default_capabilities());
        caps
    }

    /// Re-opens the frozen request, usually to enrich it for a nested
    /// resolution. Resolved values carry over, so re-resolving the returned
    /// request never probes the host.
    pub fn to_request(&self) -> DriverRequest {
        DriverRequest {
            desktop_os: Some(self.desktop_os.clone()),
            mobile_os: self.mobile_os.clone(),
            browser: Some(self.browser.clone()),
            capabilities: self.capabilities.clone(),
            settings: self.settings.clone(),
            cookie_handler: self.cookie_handler.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;

    struct ScriptedProbe {
        name: &'static str,
        calls: AtomicUsize,
    }

    impl ScriptedProbe {
        fn new(name: &'static str) -> Self {
            Self {
                name,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl HostProbe for ScriptedProbe {
        fn os_name(&self) -> String {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.name.to_string()
        }
    }

    #[test]
    fn explicit_browser_survives_resolution() {
        let probe = ScriptedProbe::new("linux");
        let effective = DriverRequest::new()
            .with_browser(browser::FIREFOX)
            .resolve(&probe)
            .unwrap();

        assert_eq!(effective.browser(), "firefox");
    }

    #[test]
    fn blank_browser_is_rejected() {
        let probe = ScriptedProbe::new("linux");
        let result = DriverRequest::new().with_browser("   ").resolve(&probe);

        assert!(matches!(result, Err(RequestError::BlankBrowser)));
        assert_eq!(probe.calls(), 0);
    }

    #[test]
    fn unset_browser_defaults_by_family() {
        let probe = ScriptedProbe::new("unused");
        let cases = [
            (OsFamily::Mac, "safari"),
            (OsFamily::Windows, "internet explorer"),
            (OsFamily::Linux, "chrome"),
            (OsFamily::Unix, "chrome"),
            (OsFamily::Unknown, "chrome"),
        ];
        for (family, expected) in cases {
            let effective = DriverRequest::new()
                .with_desktop_os(DesktopOs::new(family))
                .resolve(&probe)
                .unwrap();
            assert_eq!(effective.browser(), expected);
        }
        assert_eq!(probe.calls(), 0);
    }

    #[test]
    fn host_is_probed_once_and_only_when_needed() {
        let probe = ScriptedProbe::new("Mac OS X");
        let effective = DriverRequest::new().resolve(&probe).unwrap();

        assert_eq!(probe.calls(), 1);
        assert_eq!(effective.desktop_os().family, OsFamily::Mac);
        assert_eq!(effective.browser(), "safari");
    }

    #[test]
    fn reopened_request_resolves_without_probing() {
        let probe = ScriptedProbe::new("windows");
        let effective = DriverRequest::new().resolve(&probe).unwrap();
        assert_eq!(probe.calls(), 1);

        let again = effective.to_request().resolve(&probe).unwrap();
        assert_eq!(probe.calls(), 1);
        assert_eq!(again.browser(), "internet explorer");
        assert_eq!(again.desktop_os().family, OsFamily::Windows);
    }

    #[test]
    fn mobile_request_keeps_host_desktop_os() {
        let probe = ScriptedProbe::new("linux");
        let effective = DriverRequest::new()
            .with_mobile_os(MobileOs::with_version(MobilePlatform::Iphone, "17.2"))
            .with_browser(browser::SAFARI)
            .resolve(&probe)
            .unwrap();

        assert!(effective.is_mobile());
        assert_eq!(effective.desktop_os().family, OsFamily::Linux);
    }

    #[test]
    fn mobile_defaults_cover_platform_entries() {
        let probe = ScriptedProbe::new("linux");
        let effective = DriverRequest::new()
            .with_mobile_os(MobileOs::with_version(MobilePlatform::Android, "14"))
            .with_browser(browser::CHROME)
            .resolve(&probe)
            .unwrap();

        let defaults = effective.default_capabilities();
        assert_eq!(defaults.get("platformName"), Some(&json!("android")));
        assert_eq!(defaults.get("browserName"), Some(&json!("chrome")));
        assert_eq!(defaults.get("platformVersion"), Some(&json!("14")));
    }

    #[test]
    fn effective_capabilities_keep_caller_entries() {
        let probe = ScriptedProbe::new("linux");
        let effective = DriverRequest::new()
            .with_browser(browser::CHROME)
            .with_capability("browserName", "chromium")
            .resolve(&probe)
            .unwrap();

        let caps = effective.effective_capabilities();
        assert_eq!(caps.get("browserName"), Some(&json!("chromium")));
    }
}
