//! Connection leasing
//!
//! One primary connection is shared by whoever holds its lock. Callers that
//! find it busy get a private transient connection instead of waiting.

use crate::connection::Connection;
use crate::registry::VirtualTableRegistry;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Once, OnceLock, TryLockError};
use tracing::{debug, info, warn};
use vtquery_core::{DisabledTables, ManagerConfig, Result};

static SOFT_HEAP_LIMIT_INIT: Once = Once::new();

/// Lease counters since the manager was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManagerStats {
    /// Leases served by the primary connection
    pub primary_leases: u64,
    /// Leases served by a transient connection
    pub transient_leases: u64,
    /// Times the primary connection was opened
    pub primary_created: u64,
}

/// Arbitrates access to the primary connection.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use vtquery::{ConnectionManager, ManagerConfig, SchemaRegistry};
///
/// let registry = SchemaRegistry::new().with_table("t", "name TEXT");
/// let manager = ConnectionManager::new(ManagerConfig::default(), Arc::new(registry))?;
///
/// let first = manager.get()?;
/// let second = manager.get()?;
/// assert!(first.is_primary());
/// assert!(!second.is_primary());
/// # Ok::<(), vtquery::Error>(())
/// ```
pub struct ConnectionManager {
    config: ManagerConfig,
    disabled: DisabledTables,
    registry: Arc<dyn VirtualTableRegistry>,
    primary: OnceLock<Mutex<Connection>>,
    /// Serializes opening the primary connection
    init: Mutex<()>,
    primary_leases: AtomicU64,
    transient_leases: AtomicU64,
    primary_created: AtomicU64,
}

impl ConnectionManager {
    /// Creates a manager. The primary connection is opened on first use.
    ///
    /// The configured soft heap limit is applied to the engine the first
    /// time any manager is created in the process.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` when the config fails
    /// [`ManagerConfig::validate`].
    pub fn new(config: ManagerConfig, registry: Arc<dyn VirtualTableRegistry>) -> Result<Self> {
        config.validate()?;

        let limit = config.soft_heap_limit;
        SOFT_HEAP_LIMIT_INIT.call_once(|| {
            // SAFETY: sqlite3_soft_heap_limit64 only records the limit and is
            // safe to call from any thread.
            let previous = unsafe { rusqlite::ffi::sqlite3_soft_heap_limit64(limit) };
            debug!(limit, previous, "applied soft heap limit");
        });

        let disabled = DisabledTables::parse(&config.disabled_tables);
        debug!(disabled = disabled.len(), "created connection manager");

        Ok(Self {
            config,
            disabled,
            registry,
            primary: OnceLock::new(),
            init: Mutex::new(()),
            primary_leases: AtomicU64::new(0),
            transient_leases: AtomicU64::new(0),
            primary_created: AtomicU64::new(0),
        })
    }

    /// Leases a connection without blocking.
    ///
    /// Returns the primary connection when its lock is free and a new
    /// transient connection otherwise. The primary is opened by the first
    /// caller to find it missing; callers racing with that caller get
    /// transient connections.
    pub fn get(&self) -> Result<Instance<'_>> {
        let primary = match self.primary.get() {
            Some(primary) => primary,
            None => match self.open_primary()? {
                Some(primary) => primary,
                None => {
                    debug!("primary connection opening, opening transient connection");
                    return self.transient();
                }
            },
        };

        let guard = match primary.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => {
                debug!("primary connection busy, opening transient connection");
                return self.transient();
            }
            Err(TryLockError::Poisoned(poisoned)) => {
                warn!("primary connection lock poisoned, recovering");
                primary.clear_poison();
                poisoned.into_inner()
            }
        };

        self.primary_leases.fetch_add(1, Ordering::Relaxed);
        debug!(lease = "primary", "leased connection");
        Ok(Instance {
            lease: Lease::Primary(guard),
        })
    }

    /// Leases a new transient connection, ignoring the primary.
    pub fn get_unique(&self) -> Result<Instance<'static>> {
        self.transient()
    }

    /// True if `name` is excluded from attachment.
    pub fn is_disabled(&self, name: &str) -> bool {
        self.disabled.contains(name)
    }

    pub fn disabled_tables(&self) -> &DisabledTables {
        &self.disabled
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn stats(&self) -> ManagerStats {
        ManagerStats {
            primary_leases: self.primary_leases.load(Ordering::Relaxed),
            transient_leases: self.transient_leases.load(Ordering::Relaxed),
            primary_created: self.primary_created.load(Ordering::Relaxed),
        }
    }

    /// Opens the primary connection unless another caller is doing so.
    ///
    /// A failed open leaves the slot empty so a later call retries.
    fn open_primary(&self) -> Result<Option<&Mutex<Connection>>> {
        let _init = match self.init.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => return Ok(None),
            Err(TryLockError::Poisoned(poisoned)) => {
                self.init.clear_poison();
                poisoned.into_inner()
            }
        };
        if let Some(primary) = self.primary.get() {
            return Ok(Some(primary));
        }

        let conn = Connection::open(Arc::clone(&self.registry), &self.disabled)?;
        info!(
            attached = conn.attached_tables().len(),
            failures = conn.attach_failures().len(),
            "opened primary connection"
        );
        self.primary_created.fetch_add(1, Ordering::Relaxed);
        Ok(Some(self.primary.get_or_init(|| Mutex::new(conn))))
    }

    fn transient(&self) -> Result<Instance<'static>> {
        let conn = Connection::open(Arc::clone(&self.registry), &self.disabled)?;
        self.transient_leases.fetch_add(1, Ordering::Relaxed);
        debug!(lease = "transient", "leased connection");
        Ok(Instance {
            lease: Lease::Transient(conn),
        })
    }
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("config", &self.config)
            .field("disabled", &self.disabled)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

enum Lease<'m> {
    /// Holds the primary lock until dropped
    Primary(MutexGuard<'m, Connection>),
    Transient(Connection),
}

/// A leased connection.
///
/// Dropping a primary lease releases the primary lock. Dropping a transient
/// lease closes its connection.
pub struct Instance<'m> {
    lease: Lease<'m>,
}

impl Instance<'_> {
    pub fn connection(&self) -> &Connection {
        match &self.lease {
            Lease::Primary(guard) => guard,
            Lease::Transient(conn) => conn,
        }
    }

    pub fn is_primary(&self) -> bool {
        matches!(self.lease, Lease::Primary(_))
    }

    /// Releases the lease now rather than at the end of scope.
    pub fn unlock(self) {
        drop(self);
    }
}

impl fmt::Debug for Instance<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("primary", &self.is_primary())
            .field("connection", self.connection())
            .finish()
    }
}

impl Drop for Instance<'_> {
    fn drop(&mut self) {
        match self.lease {
            Lease::Primary(_) => debug!("released primary connection"),
            Lease::Transient(_) => debug!("closing transient connection"),
        }
    }
}
