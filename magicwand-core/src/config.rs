use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::registry::DiscoveryConfig;
use crate::request::{Capabilities, DesktopOs, DriverRequest, MobileOs, Settings};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Io { source: io::Error, path: PathBuf },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        source: toml::de::Error,
        path: PathBuf,
    },
}

/// Deployment-level configuration: which discovery roots to scan and an
/// optional request preset. Every section and field may be omitted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WandConfig {
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub request: RequestSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestSection {
    #[serde(default)]
    pub desktop_os: Option<DesktopOs>,
    #[serde(default)]
    pub mobile_os: Option<MobileOs>,
    #[serde(default)]
    pub browser: Option<String>,
    #[serde(default)]
    pub capabilities: Capabilities,
    #[serde(default)]
    pub settings: Settings,
}

impl RequestSection {
    pub fn to_request(&self) -> DriverRequest {
        let mut request = DriverRequest::new();
        if let Some(os) = &self.desktop_os {
            request = request.with_desktop_os(os.clone());
        }
        if let Some(os) = &self.mobile_os {
            request = request.with_mobile_os(os.clone());
        }
        if let Some(browser) = &self.browser {
            request = request.with_browser(browser.clone());
        }
        for (key, value) in self.capabilities.iter() {
            request = request.with_capability(key.clone(), value.clone());
        }
        for (key, value) in self.settings.iter() {
            request = request.with_setting(key.clone(), value.clone());
        }
        request
    }
}

pub fn load_wand_config<P: AsRef<Path>>(path: P) -> Result<WandConfig, ConfigError> {
    load_toml(path)
}

fn load_toml<T, P>(path: P) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        source,
        path: path.to_path_buf(),
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        source,
        path: path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{MobilePlatform, OsFamily};

    fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("magicwand.toml");
        std::fs::write(&path, contents).expect("write config");
        (dir, path)
    }

    #[test]
    fn full_config_parses() {
        let (_dir, path) = write_config(
            r#"
[discovery]
extra_roots = ["vendor.lab"]

[request]
browser = "firefox"

[request.desktop_os]
family = "mac"
version = "14.3"

[request.mobile_os]
platform = "iphone"
version = "17.2"

[request.capabilities]
acceptInsecureCerts = true

[request.settings]
sauceUser = "wand"
"#,
        );

        let config = load_wand_config(&path).expect("config should parse");
        assert_eq!(
            config.discovery.extra_roots,
            vec!["vendor.lab".to_string()]
        );

        let request = config.request.to_request();
        assert_eq!(request.browser(), Some("firefox"));

        let desktop = request.desktop_os().expect("desktop os preset");
        assert_eq!(desktop.family, OsFamily::Mac);
        assert_eq!(desktop.version.as_deref(), Some("14.3"));

        let mobile = request.mobile_os().expect("mobile os preset");
        assert_eq!(mobile.platform, MobilePlatform::Iphone);

        assert_eq!(
            request.capabilities().get("acceptInsecureCerts"),
            Some(&serde_json::json!(true))
        );
        assert_eq!(request.settings().get_str("sauceUser"), Some("wand"));
    }

    #[test]
    fn empty_config_is_all_defaults() {
        let (_dir, path) = write_config("");

        let config = load_wand_config(&path).expect("empty config should parse");
        assert!(config.discovery.extra_roots.is_empty());

        let request = config.request.to_request();
        assert_eq!(request.browser(), None);
        assert!(request.capabilities().is_empty());
        assert!(request.settings().is_empty());
    }

    #[test]
    fn unreadable_config_reports_io_error_with_path() {
        let missing = Path::new("/definitely/not/here/magicwand.toml");
        let err = load_wand_config(missing).expect_err("missing file should fail");
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("magicwand.toml"));
    }

    #[test]
    fn invalid_toml_reports_parse_error() {
        let (_dir, path) = write_config("[discovery\nextra_roots = ???");
        let err = load_wand_config(&path).expect_err("invalid toml should fail");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
