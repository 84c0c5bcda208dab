//! SQL plugins
//!
//! A plugin answers the two questions callers ask of the SQL layer: the
//! rows of a query, and the typed columns it would return. The registry
//! routes both to whichever plugin is active.

use crate::executor::execute;
use crate::introspect::describe_columns;
use crate::manager::ConnectionManager;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;
use vtquery_core::{Error, QueryData, Result, TableColumns};

/// A SQL backend.
pub trait SqlPlugin: Send + Sync {
    /// Rows produced by `query`.
    fn query(&self, query: &str) -> Result<QueryData>;

    /// Typed result columns of `query`, without running it.
    fn get_query_columns(&self, query: &str) -> Result<TableColumns>;
}

/// The SQLite-backed plugin. Each call takes its own lease.
#[derive(Debug, Clone)]
pub struct SqlitePlugin {
    manager: Arc<ConnectionManager>,
}

impl SqlitePlugin {
    pub fn new(manager: Arc<ConnectionManager>) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }
}

impl SqlPlugin for SqlitePlugin {
    fn query(&self, query: &str) -> Result<QueryData> {
        let instance = self.manager.get()?;
        execute(query, &instance)
    }

    fn get_query_columns(&self, query: &str) -> Result<TableColumns> {
        let instance = self.manager.get()?;
        describe_columns(query, &instance)
    }
}

/// Named SQL plugins with one active at a time.
///
/// The first plugin registered becomes active.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use vtquery::{ConnectionManager, ManagerConfig, PluginRegistry, SchemaRegistry, SqlitePlugin};
///
/// let manager = ConnectionManager::new(ManagerConfig::default(), Arc::new(SchemaRegistry::new()))?;
/// let registry = PluginRegistry::new();
/// registry.register("sqlite", Arc::new(SqlitePlugin::new(Arc::new(manager))))?;
///
/// let rows = registry.query("SELECT 'hello' AS greeting")?;
/// assert_eq!(rows[0]["greeting"], "hello");
/// # Ok::<(), vtquery::Error>(())
/// ```
#[derive(Default)]
pub struct PluginRegistry {
    plugins: RwLock<HashMap<String, Arc<dyn SqlPlugin>>>,
    active: RwLock<Option<String>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the plugin named `name`.
    pub fn register(&self, name: impl Into<String>, plugin: Arc<dyn SqlPlugin>) -> Result<()> {
        let name = name.into();
        let mut plugins = self.plugins.write().map_err(|_| Error::LockPoisoned)?;
        plugins.insert(name.clone(), plugin);

        let mut active = self.active.write().map_err(|_| Error::LockPoisoned)?;
        if active.is_none() {
            debug!(plugin = %name, "activated sql plugin");
            *active = Some(name);
        }
        Ok(())
    }

    /// Makes `name` the plugin queries are routed to.
    pub fn set_active(&self, name: &str) -> Result<()> {
        let plugins = self.plugins.read().map_err(|_| Error::LockPoisoned)?;
        if !plugins.contains_key(name) {
            return Err(Error::PluginNotFound(name.to_string()));
        }

        let mut active = self.active.write().map_err(|_| Error::LockPoisoned)?;
        *active = Some(name.to_string());
        debug!(plugin = %name, "activated sql plugin");
        Ok(())
    }

    /// Name of the active plugin, if any plugin is registered.
    pub fn active_name(&self) -> Result<Option<String>> {
        let active = self.active.read().map_err(|_| Error::LockPoisoned)?;
        Ok(active.clone())
    }

    pub fn names(&self) -> Result<Vec<String>> {
        let plugins = self.plugins.read().map_err(|_| Error::LockPoisoned)?;
        let mut names: Vec<String> = plugins.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    pub fn query(&self, query: &str) -> Result<QueryData> {
        self.active()?.query(query)
    }

    pub fn get_query_columns(&self, query: &str) -> Result<TableColumns> {
        self.active()?.get_query_columns(query)
    }

    fn active(&self) -> Result<Arc<dyn SqlPlugin>> {
        let name = self
            .active_name()?
            .ok_or_else(|| Error::PluginNotFound("<none>".to_string()))?;
        let plugins = self.plugins.read().map_err(|_| Error::LockPoisoned)?;
        plugins
            .get(&name)
            .cloned()
            .ok_or(Error::PluginNotFound(name))
    }
}
