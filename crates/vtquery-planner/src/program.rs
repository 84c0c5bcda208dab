/// Captured analysis output
///
/// The engine's bytecode program, its logical scan order, and the declared
/// column types of the tables it touches.
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use std::collections::{HashMap, HashSet};
use vtquery_core::{ColumnType, Result};

/// One bytecode step from `EXPLAIN`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub opcode: String,
    pub p1: i64,
    pub p2: i64,
    pub p3: i64,
    /// Auxiliary operand (function names, key info, literal text)
    pub p4: Option<String>,
}

impl Step {
    pub fn new(opcode: impl Into<String>, p1: i64, p2: i64, p3: i64) -> Self {
        Self {
            opcode: opcode.into(),
            p1,
            p2,
            p3,
            p4: None,
        }
    }

    pub fn with_p4(mut self, p4: impl Into<String>) -> Self {
        self.p4 = Some(p4.into());
        self
    }

    /// True for a cursor opened over an index rather than a table.
    pub fn opens_index(&self) -> bool {
        self.p4.as_deref().is_some_and(|p4| p4.starts_with("k("))
    }
}

/// The engine's compiled program for one query. Step index is its address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryProgram {
    steps: Vec<Step>,
}

impl QueryProgram {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// Captures the program of `query` with `EXPLAIN`.
    pub fn explain(conn: &Connection, query: &str) -> Result<Self> {
        let mut stmt = conn.prepare(&format!("EXPLAIN {}", query))?;
        let steps = stmt
            .query_map([], |row| {
                Ok(Step {
                    opcode: row.get(1)?,
                    p1: row.get(2)?,
                    p2: row.get(3)?,
                    p3: row.get(4)?,
                    p4: value_text(row.get_ref(5)?),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Addresses in walk order, each exactly once.
    ///
    /// Starts at address 0, follows the unconditional jumps of `Init` and
    /// `Goto`, falls through everything else and stops at `Halt` or at the
    /// first revisited address. Constant literals hoisted behind the main
    /// body are therefore seen before the code that reads them. Steps never
    /// reached that way (subroutines entered through `Gosub`) follow in
    /// address order.
    pub fn trace(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.steps.len());
        let mut visited = HashSet::new();
        let mut pc = 0usize;

        while pc < self.steps.len() && visited.insert(pc) {
            order.push(pc);
            let step = &self.steps[pc];
            pc = match step.opcode.as_str() {
                "Halt" => break,
                "Init" | "Goto" => match usize::try_from(step.p2) {
                    Ok(target) => target,
                    Err(_) => break,
                },
                _ => pc + 1,
            };
        }

        order.extend((0..self.steps.len()).filter(|pc| !visited.contains(pc)));
        order
    }

    /// Root pages of the table cursors the program opens.
    pub fn table_root_pages(&self) -> Vec<i64> {
        self.steps
            .iter()
            .filter(|s| matches!(s.opcode.as_str(), "OpenRead" | "OpenWrite"))
            .filter(|s| !s.opens_index() && s.p2 > 0)
            .map(|s| s.p2)
            .collect()
    }
}

/// Tables in the order the logical plan scans them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableScanOrder {
    tables: Vec<String>,
}

impl TableScanOrder {
    pub fn new(tables: Vec<String>) -> Self {
        Self { tables }
    }

    /// Captures the scan order of `query` with `EXPLAIN QUERY PLAN`.
    pub fn explain(conn: &Connection, query: &str) -> Result<Self> {
        let mut stmt = conn.prepare(&format!("EXPLAIN QUERY PLAN {}", query))?;
        let details = stmt
            .query_map([], |row| row.get::<_, String>(3))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Self::from_details(details.iter().map(String::as_str)))
    }

    /// Builds the scan order from plan detail lines such as `SCAN t` or
    /// `SEARCH u USING INDEX i (id=?)`.
    pub fn from_details<'a>(details: impl IntoIterator<Item = &'a str>) -> Self {
        let tables = details
            .into_iter()
            .filter_map(|detail| {
                let mut words = detail.split_whitespace();
                match words.next() {
                    Some("SCAN") | Some("SEARCH") => {}
                    _ => return None,
                }
                let mut name = words.next()?;
                if name == "TABLE" {
                    name = words.next()?;
                }
                if name == "CONSTANT" || name.starts_with('(') {
                    return None;
                }
                Some(name.to_string())
            })
            .collect();
        Self { tables }
    }

    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.tables.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Declared column types of the tables a program reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaTypes {
    tables: HashMap<String, Vec<ColumnType>>,
    root_pages: HashMap<i64, String>,
}

impl SchemaTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the declared types of every scanned table and of every table
    /// whose root page the program opens.
    pub fn load(conn: &Connection, scan: &TableScanOrder, program: &QueryProgram) -> Result<Self> {
        let mut schema = Self::new();
        for name in scan.tables() {
            if schema.has_table(name) {
                continue;
            }
            let types = table_types(conn, name)?;
            if !types.is_empty() {
                schema.insert_table(name.clone(), types);
            }
        }

        let pages = program.table_root_pages();
        if pages.is_empty() {
            return Ok(schema);
        }

        let mut stmt =
            conn.prepare("SELECT name FROM sqlite_schema WHERE type = 'table' AND rootpage = ?1")?;
        for page in pages {
            let names = stmt
                .query_map([page], |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            if let Some(name) = names.into_iter().next() {
                if !schema.has_table(&name) {
                    let types = table_types(conn, &name)?;
                    schema.insert_table(name.clone(), types);
                }
                schema.insert_root_page(page, name);
            }
        }
        Ok(schema)
    }

    pub fn insert_table(&mut self, name: impl Into<String>, types: Vec<ColumnType>) {
        self.tables.insert(name.into(), types);
    }

    pub fn insert_root_page(&mut self, page: i64, name: impl Into<String>) {
        self.root_pages.insert(page, name.into());
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn table_for_root_page(&self, page: i64) -> Option<&str> {
        self.root_pages.get(&page).map(String::as_str)
    }

    /// Whether some opened root page belongs to `table`.
    pub fn has_root_page(&self, table: &str) -> bool {
        self.root_pages.values().any(|name| name == table)
    }

    /// Declared type of column `index` of `table`.
    pub fn column_type(&self, table: &str, index: i64) -> Option<ColumnType> {
        let index = usize::try_from(index).ok()?;
        self.tables.get(table)?.get(index).copied()
    }
}

fn table_types(conn: &Connection, table: &str) -> Result<Vec<ColumnType>> {
    let mut stmt = conn.prepare("SELECT type FROM pragma_table_xinfo(?1) ORDER BY cid")?;
    let types = stmt
        .query_map([table], |row| row.get::<_, String>(0))?
        .map(|declared| declared.map(|d| ColumnType::from_declared(&d)))
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(types)
}

fn value_text(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(t) | ValueRef::Blob(t) => Some(String::from_utf8_lossy(t).into_owned()),
    }
}
