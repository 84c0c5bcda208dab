//! Error types for vtquery.

use std::fmt;

/// The main error type for vtquery operations.
#[derive(Debug)]
pub enum Error {
    /// A lock was poisoned (internal error)
    LockPoisoned,

    /// The SQLite engine failed to open, prepare, step or analyze
    Engine(rusqlite::Error),

    /// A virtual table could not be attached to a connection
    Attach {
        /// Table that failed
        table: String,
        /// Engine or registry diagnostic
        message: String,
    },

    /// The planner could not infer a type for these columns
    UnresolvedTypes(Vec<String>),

    /// Invalid input (rejected before reaching the engine)
    InvalidInput(String),

    /// No SQL plugin is registered under this name
    PluginNotFound(String),
}

impl Error {
    /// Returns the SQLite extended result code for engine failures.
    pub fn engine_code(&self) -> Option<i32> {
        match self {
            Error::Engine(rusqlite::Error::SqliteFailure(err, _)) => Some(err.extended_code),
            _ => None,
        }
    }

    /// Returns true for the non-fatal partial resolution outcome.
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Error::UnresolvedTypes(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::LockPoisoned => write!(f, "Lock poisoned"),
            Error::Engine(e) => write!(f, "Engine error: {}", e),
            Error::Attach { table, message } => {
                write!(f, "Failed to attach table {}: {}", table, message)
            }
            Error::UnresolvedTypes(columns) => {
                write!(f, "Unresolved column types: {}", columns.join(", "))
            }
            Error::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            Error::PluginNotFound(name) => write!(f, "SQL plugin not found: {}", name),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Engine(e) => Some(e),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Engine(err)
    }
}

/// A specialized `Result` type for vtquery operations.
pub type Result<T> = std::result::Result<T, Error>;
