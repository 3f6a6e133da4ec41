use std::collections::HashSet;
use std::env;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;
use serde::Deserialize;
use tracing::{debug, error, warn};

use crate::strategy::DriverStrategy;

/// Root every built-in strategy registers under. Always scanned first.
pub const DEFAULT_ROOT: &str = "magicwand";

/// Environment variable naming extra discovery roots, `;`-delimited.
pub const PACKAGES_VAR: &str = "MAGICWAND_PACKAGES";

static GLOBAL: Lazy<Arc<StrategyRegistry>> = Lazy::new(|| Arc::new(StrategyRegistry::new()));

pub type FactoryFn = dyn Fn() -> anyhow::Result<Box<dyn DriverStrategy>> + Send + Sync;

struct Registration {
    root: String,
    name: String,
    factory: Arc<FactoryFn>,
}

/// Explicit strategy registrations, grouped by discovery root. Strategy
/// crates register themselves at startup; `discover` turns the registrations
/// visible to a [`DiscoveryConfig`] into a fresh strategy snapshot.
pub struct StrategyRegistry {
    entries: RwLock<Vec<Registration>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Process-wide registry used when a resolver is not handed its own.
    pub fn global() -> Arc<StrategyRegistry> {
        Arc::clone(&GLOBAL)
    }

    /// Registers a strategy factory under a discovery root. The first
    /// registration of a (root, name) pair wins; later ones are dropped with
    /// a warning.
    pub fn register<F>(&self, root: &str, name: &str, factory: F)
    where
        F: Fn() -> anyhow::Result<Box<dyn DriverStrategy>> + Send + Sync + 'static,
    {
        let mut entries = self.entries.write().unwrap();
        if entries.iter().any(|e| e.root == root && e.name == name) {
            warn!(root, strategy = name, "duplicate strategy registration ignored");
            return;
        }
        entries.push(Registration {
            root: root.to_string(),
            name: name.to_string(),
            factory: Arc::new(factory),
        });
        debug!(root, strategy = name, "strategy registered");
    }

    /// Instantiates every distinct strategy visible to `config`: the default
    /// root first, then each extra root in configured order, registration
    /// order within a root. A name already instantiated under an earlier
    /// root is skipped; a factory error drops that strategy from the
    /// snapshot without claiming its name.
    pub fn discover(&self, config: &DiscoveryConfig) -> Vec<Box<dyn DriverStrategy>> {
        // Factories run outside the lock so they may register in turn.
        let snapshot: Vec<(String, String, Arc<FactoryFn>)> = {
            let entries = self.entries.read().unwrap();
            entries
                .iter()
                .map(|e| (e.root.clone(), e.name.clone(), Arc::clone(&e.factory)))
                .collect()
        };

        let mut roots: Vec<&str> = vec![DEFAULT_ROOT];
        for root in &config.extra_roots {
            let root = root.as_str();
            if roots.iter().any(|known| *known == root) {
                continue;
            }
            roots.push(root);
        }

        let mut seen: HashSet<String> = HashSet::new();
        let mut strategies: Vec<Box<dyn DriverStrategy>> = Vec::new();
        for root in roots {
            let mut matched = false;
            for (_, name, factory) in snapshot.iter().filter(|(r, _, _)| r == root) {
                matched = true;
                if !seen.insert(name.clone()) {
                    debug!(root, strategy = %name, "strategy already discovered under an earlier root");
                    continue;
                }
                let factory: &FactoryFn = factory.as_ref();
                match factory() {
                    Ok(strategy) => {
                        debug!(root, strategy = %name, "strategy discovered");
                        strategies.push(strategy);
                    }
                    Err(err) => {
                        // A failed factory does not claim the name; a later
                        // root may still supply it.
                        seen.remove(name);
                        error!(root, strategy = %name, error = %err, "strategy factory failed");
                    }
                }
            }
            if !matched && root != DEFAULT_ROOT {
                warn!(root, "no strategies registered under discovery root");
            }
        }
        strategies
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Which extra roots discovery scans beyond [`DEFAULT_ROOT`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiscoveryConfig {
    #[serde(default)]
    pub extra_roots: Vec<String>,
}

impl DiscoveryConfig {
    /// Reads extra roots from [`PACKAGES_VAR`]. Call this at the composition
    /// root; nothing else in the crate consults the environment.
    pub fn from_env() -> Self {
        match env::var(PACKAGES_VAR) {
            Ok(line) => Self {
                extra_roots: parse_roots(&line),
            },
            Err(_) => Self::default(),
        }
    }
}

fn parse_roots(line: &str) -> Vec<String> {
    let mut roots = Vec::new();
    for chunk in line.split(';') {
        let chunk = chunk.trim();
        if chunk.is_empty() {
            continue;
        }
        if !is_valid_root(chunk) {
            warn!(root = chunk, "skipping malformed discovery root");
            continue;
        }
        if !roots.iter().any(|known| known == chunk) {
            roots.push(chunk.to_string());
        }
    }
    roots
}

fn is_valid_root(root: &str) -> bool {
    root.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}
