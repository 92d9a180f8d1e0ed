//! Pools of reusable analyzer instances.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tessera_core::{Error, Result};

use super::{Analyzer, Features, TokenStream};

/// Builds a new analyzer instance from its properties string.
///
/// Returns `None` when the properties are not acceptable or the instance
/// cannot be created.
pub type AnalyzerFactory = Arc<dyn Fn(&str) -> Option<Box<dyn Analyzer>> + Send + Sync>;

/// A named analyzer configuration together with its idle instances.
///
/// Pools are shared through `Arc`: the registry, field metadata and every
/// outstanding [`PooledAnalyzer`] hold a reference.
pub struct AnalyzerPool {
    name: String,
    kind: String,
    properties: String,
    features: Features,
    factory: AnalyzerFactory,
    idle: Mutex<Vec<Box<dyn Analyzer>>>,
    created: AtomicUsize,
}

impl AnalyzerPool {
    /// Creates an empty pool.
    pub fn new(
        name: impl Into<String>,
        kind: impl Into<String>,
        properties: impl Into<String>,
        features: Features,
        factory: AnalyzerFactory,
    ) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            properties: properties.into(),
            features,
            factory,
            idle: Mutex::new(Vec::new()),
            created: AtomicUsize::new(0),
        }
    }

    /// Analyzer name, used in mangled field names.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Analyzer type the factory was registered under.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Properties passed to the factory.
    pub fn properties(&self) -> &str {
        &self.properties
    }

    /// Index features of fields produced by this analyzer.
    pub fn features(&self) -> Features {
        self.features
    }

    /// Number of instances waiting to be reused.
    pub fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }

    /// Number of instances built by the factory so far.
    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }

    /// Returns whether `kind`, `properties` and `features` match this pool.
    pub fn same_definition(&self, kind: &str, properties: &str, features: Features) -> bool {
        self.kind == kind && self.properties == properties && self.features == features
    }

    /// Takes an idle instance, or builds a new one when none is idle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AnalyzerUnavailable`] when the factory yields no
    /// instance.
    pub fn acquire(self: &Arc<Self>) -> Result<PooledAnalyzer> {
        let idle = self.idle.lock().pop();
        let analyzer = match idle {
            Some(analyzer) => analyzer,
            None => self.build()?,
        };
        Ok(PooledAnalyzer {
            analyzer: Some(analyzer),
            pool: Arc::clone(self),
        })
    }

    /// Builds one instance and parks it in the idle set.
    pub(crate) fn prime(&self) -> Result<()> {
        let analyzer = self.build()?;
        self.idle.lock().push(analyzer);
        Ok(())
    }

    fn build(&self) -> Result<Box<dyn Analyzer>> {
        let analyzer = (self.factory)(&self.properties).ok_or_else(|| {
            Error::analyzer_unavailable(
                &self.name,
                format!("factory for type '{}' returned no instance", self.kind),
            )
        })?;
        let created = self.created.fetch_add(1, Ordering::Relaxed) + 1;
        log::debug!("Built analyzer '{}' instance #{created}", self.name);
        Ok(analyzer)
    }

    fn release(&self, mut analyzer: Box<dyn Analyzer>) {
        analyzer.reset("");
        self.idle.lock().push(analyzer);
    }
}

impl fmt::Debug for AnalyzerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyzerPool")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("properties", &self.properties)
            .field("features", &self.features)
            .field("idle", &self.idle_count())
            .finish()
    }
}

/// An analyzer instance on loan from its pool.
///
/// Dropping the handle resets the instance and returns it to the pool.
pub struct PooledAnalyzer {
    analyzer: Option<Box<dyn Analyzer>>,
    pool: Arc<AnalyzerPool>,
}

impl PooledAnalyzer {
    /// Pool the instance belongs to.
    pub fn pool(&self) -> &Arc<AnalyzerPool> {
        &self.pool
    }
}

impl Deref for PooledAnalyzer {
    type Target = dyn Analyzer;

    fn deref(&self) -> &Self::Target {
        match &self.analyzer {
            Some(analyzer) => analyzer.as_ref(),
            None => unreachable!("analyzer is only taken on drop"),
        }
    }
}

impl DerefMut for PooledAnalyzer {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match &mut self.analyzer {
            Some(analyzer) => analyzer.as_mut(),
            None => unreachable!("analyzer is only taken on drop"),
        }
    }
}

impl TokenStream for PooledAnalyzer {
    fn advance(&mut self) -> bool {
        (**self).advance()
    }

    fn term(&self) -> &[u8] {
        (**self).term()
    }
}

impl Drop for PooledAnalyzer {
    fn drop(&mut self) {
        if let Some(analyzer) = self.analyzer.take() {
            self.pool.release(analyzer);
        }
    }
}

impl fmt::Debug for PooledAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledAnalyzer")
            .field("pool", &self.pool.name)
            .finish()
    }
}
