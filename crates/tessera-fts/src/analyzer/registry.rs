//! Named analyzer pools and the factories that build them.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use tessera_core::{Error, Result};

use super::builtin::{DelimiterAnalyzer, IdentityAnalyzer};
use super::{Analyzer, AnalyzerFactory, AnalyzerPool, Features};

/// Name and type of the analyzer that indexes a string as one term.
pub const IDENTITY_ANALYZER: &str = "identity";

/// Type name of [`DelimiterAnalyzer`].
pub const DELIMITER_ANALYZER: &str = "delimiter";

/// Maps analyzer names to shared pools.
///
/// Analyzer types are registered as factories; named analyzers are then
/// created with [`emplace`](Self::emplace). The `identity` analyzer is always
/// present.
pub struct AnalyzerRegistry {
    factories: RwLock<HashMap<String, AnalyzerFactory>>,
    pools: RwLock<HashMap<String, Arc<AnalyzerPool>>>,
    identity: Arc<AnalyzerPool>,
}

impl AnalyzerRegistry {
    /// Creates a registry with the built-in analyzer types.
    pub fn new() -> Self {
        let identity_factory: AnalyzerFactory =
            Arc::new(|_: &str| Some(Box::new(IdentityAnalyzer::new()) as Box<dyn Analyzer>));
        let identity = Arc::new(AnalyzerPool::new(
            IDENTITY_ANALYZER,
            IDENTITY_ANALYZER,
            "",
            Features::FREQUENCY | Features::NORM,
            Arc::clone(&identity_factory),
        ));

        let mut factories: HashMap<String, AnalyzerFactory> = HashMap::new();
        factories.insert(IDENTITY_ANALYZER.to_string(), identity_factory);
        factories.insert(
            DELIMITER_ANALYZER.to_string(),
            Arc::new(|properties: &str| {
                DelimiterAnalyzer::from_properties(properties)
                    .map(|a| Box::new(a) as Box<dyn Analyzer>)
            }),
        );
        #[cfg(feature = "fts-tantivy")]
        factories.insert(
            super::text::TEXT_ANALYZER_TYPE.to_string(),
            Arc::new(|properties: &str| {
                super::text::TextAnalyzerAdapter::from_properties(properties)
                    .map(|a| Box::new(a) as Box<dyn Analyzer>)
            }),
        );

        let mut pools = HashMap::new();
        pools.insert(IDENTITY_ANALYZER.to_string(), Arc::clone(&identity));

        Self {
            factories: RwLock::new(factories),
            pools: RwLock::new(pools),
            identity,
        }
    }

    /// Process-wide registry used when no explicit registry is supplied.
    pub fn global() -> &'static AnalyzerRegistry {
        static GLOBAL: OnceLock<AnalyzerRegistry> = OnceLock::new();
        GLOBAL.get_or_init(AnalyzerRegistry::new)
    }

    /// Registers (or replaces) the factory for an analyzer type.
    ///
    /// Existing pools keep the factory they were created with.
    pub fn register_type<F>(&self, kind: impl Into<String>, factory: F)
    where
        F: Fn(&str) -> Option<Box<dyn Analyzer>> + Send + Sync + 'static,
    {
        let kind = kind.into();
        log::debug!("Registered analyzer type '{kind}'");
        self.factories.write().insert(kind, Arc::new(factory));
    }

    /// Returns the pool for `name`, creating it on first use.
    ///
    /// A new pool is validated by building one instance, which is kept idle.
    /// Emplacing an existing name with the same definition returns the
    /// existing pool.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the type is unknown, the name is already
    /// bound to a different definition, or the factory rejects the
    /// properties.
    pub fn emplace(
        &self,
        name: &str,
        kind: &str,
        properties: &str,
        features: Features,
    ) -> Result<Arc<AnalyzerPool>> {
        if let Some(existing) = self.get(name) {
            return if existing.same_definition(kind, properties, features) {
                Ok(existing)
            } else {
                Err(Error::config(format!(
                    "analyzer '{name}' is already defined with type '{}' and properties '{}'",
                    existing.kind(),
                    existing.properties()
                )))
            };
        }

        let factory = self
            .factories
            .read()
            .get(kind)
            .cloned()
            .ok_or_else(|| Error::config(format!("unknown analyzer type '{kind}'")))?;
        let pool = Arc::new(AnalyzerPool::new(name, kind, properties, features, factory));
        pool.prime().map_err(|err| {
            Error::config(format!(
                "analyzer '{name}' of type '{kind}' rejected properties '{properties}': {err}"
            ))
        })?;

        // Another thread may have won the race; keep whichever pool landed first.
        let mut pools = self.pools.write();
        let pool = pools.entry(name.to_string()).or_insert(pool);
        if !pool.same_definition(kind, properties, features) {
            return Err(Error::config(format!(
                "analyzer '{name}' is already defined with type '{}'",
                pool.kind()
            )));
        }
        log::debug!("Registered analyzer '{name}' of type '{kind}'");
        Ok(Arc::clone(pool))
    }

    /// Looks up a pool by analyzer name.
    pub fn get(&self, name: &str) -> Option<Arc<AnalyzerPool>> {
        self.pools.read().get(name).cloned()
    }

    /// Unbinds `name`. Pools already handed out stay usable.
    ///
    /// The identity analyzer cannot be removed.
    pub fn remove(&self, name: &str) -> bool {
        if name == IDENTITY_ANALYZER {
            return false;
        }
        self.pools.write().remove(name).is_some()
    }

    /// The identity analyzer pool.
    pub fn identity(&self) -> Arc<AnalyzerPool> {
        Arc::clone(&self.identity)
    }

    /// Names of all registered analyzers, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.pools.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for AnalyzerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AnalyzerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyzerRegistry")
            .field("analyzers", &self.names())
            .finish()
    }
}
