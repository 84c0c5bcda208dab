//! Result column and row types.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Deref, DerefMut};

/// Logical type of a result column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    Text,
    Integer,
    BigInt,
    Double,
    Blob,
    Unknown,
}

impl ColumnType {
    /// Maps an engine declared type onto a column type.
    ///
    /// Exact names win; anything else follows SQLite's column affinity
    /// rules, with numeric affinity reported as `Double`. An empty
    /// declaration has no affinity to go on and stays `Unknown`.
    pub fn from_declared(declared: &str) -> Self {
        let upper = declared.trim().to_ascii_uppercase();
        match upper.as_str() {
            "" => return ColumnType::Unknown,
            "TEXT" => return ColumnType::Text,
            "INTEGER" | "INT" => return ColumnType::Integer,
            "BIGINT" | "UNSIGNED BIGINT" | "UNSIGNED_BIGINT" => return ColumnType::BigInt,
            "DOUBLE" | "REAL" | "FLOAT" => return ColumnType::Double,
            "BLOB" => return ColumnType::Blob,
            _ => {}
        }

        if upper.contains("INT") {
            if upper.contains("BIG") {
                ColumnType::BigInt
            } else {
                ColumnType::Integer
            }
        } else if upper.contains("CHAR") || upper.contains("CLOB") || upper.contains("TEXT") {
            ColumnType::Text
        } else if upper.contains("BLOB") {
            ColumnType::Blob
        } else {
            // REAL/FLOA/DOUB and the numeric affinity fallback
            ColumnType::Double
        }
    }

    /// Upper-case type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Text => "TEXT",
            ColumnType::Integer => "INTEGER",
            ColumnType::BigInt => "BIGINT",
            ColumnType::Double => "DOUBLE",
            ColumnType::Blob => "BLOB",
            ColumnType::Unknown => "UNKNOWN",
        }
    }

    pub fn is_known(&self) -> bool {
        *self != ColumnType::Unknown
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ColumnType::Integer | ColumnType::BigInt | ColumnType::Double
        )
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name and type of one result column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnTypeInfo {
    pub name: String,
    pub column_type: ColumnType,
    /// Raw declared type when the column comes straight from a table.
    pub declared_type: Option<String>,
}

impl ColumnTypeInfo {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            declared_type: None,
        }
    }

    /// A column whose type the engine declared from table schema.
    pub fn declared(name: impl Into<String>, declared: impl Into<String>) -> Self {
        let declared = declared.into();
        Self {
            name: name.into(),
            column_type: ColumnType::from_declared(&declared),
            declared_type: Some(declared),
        }
    }
}

/// Result columns in result-set order.
///
/// The position of a column is its output slot in the compiled program.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableColumns(Vec<ColumnTypeInfo>);

impl TableColumns {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    /// True when no column is left `Unknown`.
    pub fn is_resolved(&self) -> bool {
        self.0.iter().all(|c| c.column_type.is_known())
    }

    /// Positions of the columns still typed `Unknown`.
    pub fn unknown_positions(&self) -> Vec<usize> {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.column_type.is_known())
            .map(|(i, _)| i)
            .collect()
    }

    /// Looks a column up by name.
    pub fn get_by_name(&self, name: &str) -> Option<&ColumnTypeInfo> {
        self.0.iter().find(|c| c.name == name)
    }

    pub fn into_inner(self) -> Vec<ColumnTypeInfo> {
        self.0
    }
}

impl Deref for TableColumns {
    type Target = Vec<ColumnTypeInfo>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for TableColumns {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Vec<ColumnTypeInfo>> for TableColumns {
    fn from(columns: Vec<ColumnTypeInfo>) -> Self {
        Self(columns)
    }
}

impl FromIterator<ColumnTypeInfo> for TableColumns {
    fn from_iter<I: IntoIterator<Item = ColumnTypeInfo>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One result row: column name to string-serialized value, in result order.
pub type Row = IndexMap<String, String>;

/// Rows of a query result.
pub type QueryData = Vec<Row>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_declared_names() {
        assert_eq!(ColumnType::from_declared("TEXT"), ColumnType::Text);
        assert_eq!(ColumnType::from_declared("integer"), ColumnType::Integer);
        assert_eq!(ColumnType::from_declared("BIGINT"), ColumnType::BigInt);
        assert_eq!(ColumnType::from_declared("UNSIGNED BIGINT"), ColumnType::BigInt);
        assert_eq!(ColumnType::from_declared("DOUBLE"), ColumnType::Double);
        assert_eq!(ColumnType::from_declared("BLOB"), ColumnType::Blob);
    }

    #[test]
    fn test_affinity_fallbacks() {
        assert_eq!(ColumnType::from_declared("VARCHAR(255)"), ColumnType::Text);
        assert_eq!(ColumnType::from_declared("TINYINT"), ColumnType::Integer);
        assert_eq!(ColumnType::from_declared("FLOAT8"), ColumnType::Double);
        assert_eq!(ColumnType::from_declared("NUMERIC"), ColumnType::Double);
        assert_eq!(ColumnType::from_declared(""), ColumnType::Unknown);
    }

    #[test]
    fn test_table_columns_resolution() {
        let mut columns: TableColumns = vec![
            ColumnTypeInfo::declared("name", "TEXT"),
            ColumnTypeInfo::new("x", ColumnType::Unknown),
        ]
        .into();
        assert!(!columns.is_resolved());
        assert_eq!(columns.unknown_positions(), vec![1]);

        columns[1].column_type = ColumnType::Integer;
        assert!(columns.is_resolved());
        assert_eq!(columns.get_by_name("name").unwrap().declared_type.as_deref(), Some("TEXT"));
    }
}
