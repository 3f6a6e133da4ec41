use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OsFamily {
    Mac,
    Windows,
    Linux,
    Unix,
    Unknown,
}

impl OsFamily {
    /// Classifies a raw host OS name by substring. The mac check must run
    /// before the windows check: "darwin" contains "win".
    pub fn classify(os_name: &str) -> OsFamily {
        let name = os_name.to_lowercase();
        if name.contains("nux") {
            OsFamily::Linux
        } else if name.contains("nix") || name.contains("aix") {
            OsFamily::Unix
        } else if name.contains("mac") || name.contains("darwin") {
            OsFamily::Mac
        } else if name.contains("win") {
            OsFamily::Windows
        } else {
            OsFamily::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OsFamily::Mac => "mac",
            OsFamily::Windows => "windows",
            OsFamily::Linux => "linux",
            OsFamily::Unix => "unix",
            OsFamily::Unknown => "unknown",
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MobilePlatform {
    Android,
    Iphone,
    Ipad,
}

impl MobilePlatform {
    /// Automation platform name as it appears in capability sets, so both
    /// Apple device kinds map to "ios".
    pub fn platform_name(&self) -> &'static str {
        match self {
            MobilePlatform::Android => "android",
            MobilePlatform::Iphone | MobilePlatform::Ipad => "ios",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MobilePlatform::Android => "android",
            MobilePlatform::Iphone => "iphone",
            MobilePlatform::Ipad => "ipad",
        }
    }
}

impl fmt::Display for MobilePlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesktopOs {
    pub family: OsFamily,
    #[serde(default)]
    pub version: Option<String>,
}

impl DesktopOs {
    pub fn new(family: OsFamily) -> Self {
        Self {
            family,
            version: None,
        }
    }

    pub fn with_version(family: OsFamily, version: impl Into<String>) -> Self {
        Self {
            family,
            version: Some(version.into()),
        }
    }
}

impl fmt::Display for DesktopOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{} {}", self.family, version),
            None => self.family.fmt(f),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MobileOs {
    pub platform: MobilePlatform,
    #[serde(default)]
    pub version: Option<String>,
}

impl MobileOs {
    pub fn new(platform: MobilePlatform) -> Self {
        Self {
            platform,
            version: None,
        }
    }

    pub fn with_version(platform: MobilePlatform, version: impl Into<String>) -> Self {
        Self {
            platform,
            version: Some(version.into()),
        }
    }
}

impl fmt::Display for MobileOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{} {}", self.platform, version),
            None => self.platform.fmt(f),
        }
    }
}
