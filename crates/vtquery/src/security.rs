/// Input validation
///
/// Query text and table names are checked here before they reach the
/// engine, so oversized or malformed input fails fast with
/// `Error::InvalidInput`.
use vtquery_core::error::{Error, Result};

/// Maximum accepted query length in bytes (1 MiB).
pub const MAX_QUERY_LENGTH: usize = 1024 * 1024;

/// Maximum accepted table name length in bytes.
pub const MAX_TABLE_NAME_LENGTH: usize = 256;

/// Validates SQL query text
///
/// # Security
///
/// - Prevents empty or whitespace-only queries
/// - Prevents oversized queries (>1MB)
/// - Prevents embedded null bytes, which the engine would silently truncate at
///
/// # Errors
///
/// Returns Error::InvalidInput if validation fails
#[inline]
pub fn validate_query(query: &str) -> Result<()> {
    if query.trim().is_empty() {
        return Err(Error::InvalidInput("Query cannot be empty".to_string()));
    }

    if query.len() > MAX_QUERY_LENGTH {
        return Err(Error::InvalidInput(format!(
            "Query length {} exceeds maximum {}",
            query.len(),
            MAX_QUERY_LENGTH
        )));
    }

    if query.contains('\0') {
        return Err(Error::InvalidInput(
            "Query cannot contain null bytes".to_string(),
        ));
    }

    Ok(())
}

/// Validates a table name before it is spliced into DDL
///
/// # Errors
///
/// Returns Error::InvalidInput if validation fails
#[inline]
pub fn validate_table_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidInput(
            "Table name cannot be empty".to_string(),
        ));
    }

    if name.len() > MAX_TABLE_NAME_LENGTH {
        return Err(Error::InvalidInput(format!(
            "Table name length {} exceeds maximum {}",
            name.len(),
            MAX_TABLE_NAME_LENGTH
        )));
    }

    if name.contains('\0') {
        return Err(Error::InvalidInput(
            "Table name cannot contain null bytes".to_string(),
        ));
    }

    Ok(())
}
