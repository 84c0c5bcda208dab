/// Query planner
///
/// Infers the types of expression columns by walking the compiled program
/// and tracking the type held by each register.
use crate::opcodes::{
    cast_result, function_name, function_result, integer_promotion, numeric_promotion, Effect,
    OPCODE_RULES,
};
use crate::program::{QueryProgram, SchemaTypes, Step, TableScanOrder};
use rusqlite::Connection;
use std::collections::HashMap;
use tracing::debug;
use vtquery_core::{ColumnType, Error, Result, TableColumns};

/// A barebones planner built on the engine's `EXPLAIN` output.
///
/// Constructing one issues two analysis queries, so only build a planner
/// when a query actually has columns the schema could not type.
#[derive(Debug, Clone)]
pub struct QueryPlanner {
    program: QueryProgram,
    tables: TableScanOrder,
    schema: SchemaTypes,
}

/// Register types inferred by a program walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterTypes {
    types: HashMap<i64, ColumnType>,
    output: Option<Output>,
}

/// Register state when the first result row was emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Output {
    base: i64,
    types: HashMap<i64, ColumnType>,
}

impl RegisterTypes {
    /// Final type held by `register`, `Unknown` if none was inferred.
    pub fn get(&self, register: i64) -> ColumnType {
        self.types
            .get(&register)
            .copied()
            .unwrap_or(ColumnType::Unknown)
    }

    /// First register of the first emitted result row.
    pub fn output_base(&self) -> Option<i64> {
        self.output.as_ref().map(|o| o.base)
    }

    /// Type of result column `position`.
    ///
    /// The register as it stood when the row was emitted wins; a register
    /// only typed later falls back to its final type.
    pub fn output(&self, position: usize) -> ColumnType {
        let Some(output) = &self.output else {
            return ColumnType::Unknown;
        };
        let Ok(offset) = i64::try_from(position) else {
            return ColumnType::Unknown;
        };
        let register = output.base + offset;
        match output.types.get(&register) {
            Some(ty) => *ty,
            None => self.get(register),
        }
    }

    fn set(&mut self, register: i64, ty: ColumnType) {
        if ty.is_known() {
            self.types.insert(register, ty);
        } else {
            self.types.remove(&register);
        }
    }
}

impl QueryPlanner {
    /// Captures the scan order and program of `query` on `conn`.
    pub fn new(query: &str, conn: &Connection) -> Result<Self> {
        let tables = TableScanOrder::explain(conn, query)?;
        let program = QueryProgram::explain(conn, query)?;
        let schema = SchemaTypes::load(conn, &tables, &program)?;
        Ok(Self::from_parts(program, tables, schema))
    }

    /// Builds a planner over already captured analysis output.
    pub fn from_parts(program: QueryProgram, tables: TableScanOrder, schema: SchemaTypes) -> Self {
        Self {
            program,
            tables,
            schema,
        }
    }

    pub fn program(&self) -> &QueryProgram {
        &self.program
    }

    pub fn tables(&self) -> &TableScanOrder {
        &self.tables
    }

    /// Walks the program and returns the inferred register types.
    ///
    /// The walk runs twice: sorter and ephemeral-table record layouts
    /// learned in the first pass are known in the second, where output
    /// loops read them back before the code filling them is reached.
    pub fn infer_registers(&self) -> RegisterTypes {
        let order = self.program.trace();
        let mut layouts = HashMap::new();
        let mut registers = RegisterTypes::default();
        for _ in 0..2 {
            let mut walk = Walk::new(&self.tables, &self.schema, layouts);
            for &pc in &order {
                walk.step(&self.program.steps()[pc]);
            }
            layouts = walk.cursor_records;
            registers = walk.registers;
        }
        registers
    }

    /// Fills in the types of `Unknown` columns.
    ///
    /// Resolved columns are updated in place even when others stay unknown;
    /// in that case the names still unknown come back as
    /// [`Error::UnresolvedTypes`].
    pub fn apply_types(&self, columns: &mut TableColumns) -> Result<()> {
        let unknown = columns.unknown_positions();
        if unknown.is_empty() {
            return Ok(());
        }

        let registers = self.infer_registers();
        let mut unresolved = Vec::new();
        for position in unknown {
            let ty = registers.output(position);
            let column = &mut columns[position];
            if ty.is_known() {
                column.column_type = ty;
            } else {
                unresolved.push(column.name.clone());
            }
        }

        debug!(
            columns = columns.len(),
            unresolved = unresolved.len(),
            "applied planner types"
        );

        if unresolved.is_empty() {
            Ok(())
        } else {
            Err(Error::UnresolvedTypes(unresolved))
        }
    }
}

type Layout = Vec<ColumnType>;

struct Walk<'a> {
    tables: &'a TableScanOrder,
    schema: &'a SchemaTypes,
    registers: RegisterTypes,
    /// Table bound to each table cursor
    cursors: HashMap<i64, String>,
    /// Content register of each pseudo cursor
    pseudo: HashMap<i64, i64>,
    /// Record layouts held in registers
    records: HashMap<i64, Layout>,
    /// Record layouts inserted into sorter and ephemeral cursors
    cursor_records: HashMap<i64, Layout>,
    accumulators: HashMap<i64, ColumnType>,
    next_table: usize,
}

impl<'a> Walk<'a> {
    fn new(
        tables: &'a TableScanOrder,
        schema: &'a SchemaTypes,
        cursor_records: HashMap<i64, Layout>,
    ) -> Self {
        Self {
            tables,
            schema,
            registers: RegisterTypes::default(),
            cursors: HashMap::new(),
            pseudo: HashMap::new(),
            records: HashMap::new(),
            cursor_records,
            accumulators: HashMap::new(),
            next_table: 0,
        }
    }

    fn step(&mut self, step: &Step) {
        let Some(rule) = OPCODE_RULES.get(step.opcode.as_str()) else {
            return;
        };
        let target = rule.target.of(step);
        let regs = &mut self.registers;

        match rule.effect {
            Effect::Fixed(ty) => regs.set(target, ty),
            Effect::Arithmetic => {
                let ty = numeric_promotion(regs.get(step.p1), regs.get(step.p2));
                regs.set(target, ty);
            }
            Effect::Bitwise => {
                let ty = integer_promotion(regs.get(step.p1), regs.get(step.p2));
                regs.set(target, ty);
            }
            Effect::Complement => {
                let ty = integer_promotion(regs.get(step.p1), ColumnType::Integer);
                regs.set(target, ty);
            }
            Effect::Function => {
                let name = function_name(step.p4.as_deref().unwrap_or_default());
                let ty = function_result(&name, regs.get(step.p2));
                regs.set(target, ty);
            }
            Effect::AggStep => {
                self.accumulators.insert(target, regs.get(step.p2));
            }
            Effect::AggFinal => {
                let name = function_name(step.p4.as_deref().unwrap_or_default());
                let argument = self
                    .accumulators
                    .get(&target)
                    .copied()
                    .unwrap_or(ColumnType::Unknown);
                regs.set(target, function_result(&name, argument));
            }
            Effect::ShallowCopy => regs.set(target, regs.get(step.p1)),
            Effect::CopyRange => {
                for offset in 0..=step.p3.max(0) {
                    regs.set(target + offset, regs.get(step.p1 + offset));
                }
            }
            Effect::MoveRange => {
                let count = step.p3.max(0);
                let moved: Vec<ColumnType> = (0..count).map(|i| regs.get(step.p1 + i)).collect();
                for i in 0..count {
                    regs.set(step.p1 + i, ColumnType::Unknown);
                }
                for (offset, ty) in (0i64..).zip(moved) {
                    regs.set(target + offset, ty);
                }
            }
            Effect::Cast => regs.set(target, cast_result(step.p2, regs.get(target))),
            Effect::RealAffinity => {
                if matches!(regs.get(target), ColumnType::Integer | ColumnType::BigInt) {
                    regs.set(target, ColumnType::Double);
                }
            }
            Effect::Clear => {
                for register in target..=step.p3.max(target) {
                    regs.set(register, ColumnType::Unknown);
                }
            }
            Effect::OpenTable => self.open_cursor(step, target),
            Effect::ReadColumn => {
                let ty = self.column_type(step.p1, step.p2);
                self.registers.set(target, ty);
            }
            Effect::MakeRecord => {
                let layout = (0..step.p2.max(0)).map(|i| regs.get(step.p1 + i)).collect();
                self.records.insert(target, layout);
            }
            Effect::RecordInsert => match self.records.get(&step.p2) {
                Some(layout) => {
                    self.cursor_records.insert(target, layout.clone());
                }
                None => {
                    self.cursor_records.remove(&target);
                }
            },
            Effect::RecordData => match self.cursor_records.get(&step.p1) {
                Some(layout) => {
                    self.records.insert(target, layout.clone());
                }
                None => {
                    self.records.remove(&target);
                }
            },
            Effect::OpenPseudo => {
                self.cursors.remove(&target);
                self.pseudo.insert(target, step.p2);
            }
            Effect::ResultRow => {
                if regs.output.is_none() {
                    regs.output = Some(Output {
                        base: target,
                        types: regs.types.clone(),
                    });
                }
            }
        }
    }

    /// Binds a table cursor to its table.
    ///
    /// A root page names the table exactly. Cursors without one, such as
    /// virtual table cursors, take the next scanned table that no root page
    /// has already claimed.
    fn open_cursor(&mut self, step: &Step, cursor: i64) {
        self.pseudo.remove(&cursor);
        if step.opens_index() {
            self.cursors.remove(&cursor);
            return;
        }

        let (tables, schema) = (self.tables, self.schema);
        let table = match schema.table_for_root_page(step.p2) {
            Some(name) if step.p2 > 0 => Some(name),
            _ => {
                while tables
                    .get(self.next_table)
                    .is_some_and(|name| schema.has_root_page(name))
                {
                    self.next_table += 1;
                }
                let scanned = tables.get(self.next_table);
                self.next_table += 1;
                scanned
            }
        };
        match table {
            Some(name) => {
                self.cursors.insert(cursor, name.to_string());
            }
            None => {
                self.cursors.remove(&cursor);
            }
        }
    }

    /// Declared or recorded type of column `index` read through `cursor`.
    fn column_type(&self, cursor: i64, index: i64) -> ColumnType {
        if let Some(table) = self.cursors.get(&cursor) {
            return self
                .schema
                .column_type(table, index)
                .unwrap_or(ColumnType::Unknown);
        }

        let layout = match self.pseudo.get(&cursor) {
            Some(content) => self.records.get(content),
            None => self.cursor_records.get(&cursor),
        };
        usize::try_from(index)
            .ok()
            .and_then(|i| layout?.get(i).copied())
            .unwrap_or(ColumnType::Unknown)
    }
}
