/// Opcode and function type rules
///
/// Static, read-only lookup tables describing how each interesting engine
/// opcode changes the type held in a register.
use std::collections::HashMap;
use std::sync::LazyLock;
use vtquery_core::ColumnType;

use crate::program::Step;

/// Operand position of a program step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    P1,
    P2,
    P3,
}

impl Operand {
    /// Reads this operand from a step.
    pub fn of(&self, step: &Step) -> i64 {
        match self {
            Operand::P1 => step.p1,
            Operand::P2 => step.p2,
            Operand::P3 => step.p3,
        }
    }

    /// Column name of the operand in `EXPLAIN` output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operand::P1 => "p1",
            Operand::P2 => "p2",
            Operand::P3 => "p3",
        }
    }
}

/// What an opcode does to the register named by its rule's target operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Writes a value of a fixed type (literals, concatenation, counters)
    Fixed(ColumnType),
    /// Binary arithmetic over registers p1 and p2
    Arithmetic,
    /// Binary bit operation over registers p1 and p2
    Bitwise,
    /// Unary bit complement of register p1
    Complement,
    /// Scalar function call; name in p4, first argument in p2
    Function,
    /// Aggregate step; argument in p2, accumulator in p3
    AggStep,
    /// Aggregate finalizer; name in p4, accumulator in p1
    AggFinal,
    /// Copies p1 into p2
    ShallowCopy,
    /// Copies p3 + 1 registers starting at p1 into p2
    CopyRange,
    /// Moves p3 registers starting at p1 into p2
    MoveRange,
    /// Casts register p1 to the affinity in p2
    Cast,
    /// Converts an integer in p1 into a real
    RealAffinity,
    /// Sets registers p2..=p3 to NULL
    Clear,
    /// Opens a cursor p1 over the table at root page p2
    OpenTable,
    /// Reads column p2 of cursor p1 into p3
    ReadColumn,
    /// Packs p2 registers starting at p1 into a record in p3
    MakeRecord,
    /// Inserts the record in p2 into sorter or ephemeral cursor p1
    RecordInsert,
    /// Loads the current record of cursor p1 into p2
    RecordData,
    /// Opens cursor p1 reading the record held in p2
    OpenPseudo,
    /// Emits registers p1..p1+p2 as a result row
    ResultRow,
}

/// Register effect of one opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeRule {
    /// Operand holding the register (or cursor) the opcode determines
    pub target: Operand,
    pub effect: Effect,
}

impl OpcodeRule {
    const fn new(target: Operand, effect: Effect) -> Self {
        Self { target, effect }
    }
}

/// Opcodes that change column or expression types.
pub static OPCODE_RULES: LazyLock<HashMap<&'static str, OpcodeRule>> = LazyLock::new(|| {
    use Effect::*;
    use Operand::*;

    HashMap::from([
        // Literals
        ("Integer", OpcodeRule::new(P2, Fixed(ColumnType::Integer))),
        ("Int64", OpcodeRule::new(P2, Fixed(ColumnType::BigInt))),
        ("Real", OpcodeRule::new(P2, Fixed(ColumnType::Double))),
        ("String8", OpcodeRule::new(P2, Fixed(ColumnType::Text))),
        ("String", OpcodeRule::new(P2, Fixed(ColumnType::Text))),
        ("Blob", OpcodeRule::new(P2, Fixed(ColumnType::Blob))),
        ("Variable", OpcodeRule::new(P2, Fixed(ColumnType::Text))),
        // Fixed results
        ("Concat", OpcodeRule::new(P3, Fixed(ColumnType::Text))),
        ("Count", OpcodeRule::new(P2, Fixed(ColumnType::BigInt))),
        ("Rowid", OpcodeRule::new(P2, Fixed(ColumnType::BigInt))),
        ("Not", OpcodeRule::new(P2, Fixed(ColumnType::Integer))),
        ("IntCopy", OpcodeRule::new(P2, Fixed(ColumnType::Integer))),
        // Derived results
        ("Add", OpcodeRule::new(P3, Arithmetic)),
        ("Subtract", OpcodeRule::new(P3, Arithmetic)),
        ("Multiply", OpcodeRule::new(P3, Arithmetic)),
        ("Divide", OpcodeRule::new(P3, Arithmetic)),
        ("Remainder", OpcodeRule::new(P3, Arithmetic)),
        ("BitAnd", OpcodeRule::new(P3, Bitwise)),
        ("BitOr", OpcodeRule::new(P3, Bitwise)),
        ("ShiftLeft", OpcodeRule::new(P3, Bitwise)),
        ("ShiftRight", OpcodeRule::new(P3, Bitwise)),
        ("BitNot", OpcodeRule::new(P2, Complement)),
        ("Function", OpcodeRule::new(P3, Function)),
        ("PureFunc", OpcodeRule::new(P3, Function)),
        ("AggStep", OpcodeRule::new(P3, AggStep)),
        ("AggFinal", OpcodeRule::new(P1, AggFinal)),
        // Propagation and overrides
        ("SCopy", OpcodeRule::new(P2, ShallowCopy)),
        ("Copy", OpcodeRule::new(P2, CopyRange)),
        ("Move", OpcodeRule::new(P2, MoveRange)),
        ("Cast", OpcodeRule::new(P1, Cast)),
        ("RealAffinity", OpcodeRule::new(P1, RealAffinity)),
        ("Null", OpcodeRule::new(P2, Clear)),
        // Table references
        ("OpenRead", OpcodeRule::new(P1, OpenTable)),
        ("OpenWrite", OpcodeRule::new(P1, OpenTable)),
        ("VOpen", OpcodeRule::new(P1, OpenTable)),
        ("Column", OpcodeRule::new(P3, ReadColumn)),
        ("VColumn", OpcodeRule::new(P3, ReadColumn)),
        // Sorters and ephemeral tables
        ("MakeRecord", OpcodeRule::new(P3, MakeRecord)),
        ("SorterInsert", OpcodeRule::new(P1, RecordInsert)),
        ("IdxInsert", OpcodeRule::new(P1, RecordInsert)),
        ("SorterData", OpcodeRule::new(P2, RecordData)),
        ("RowData", OpcodeRule::new(P2, RecordData)),
        ("OpenPseudo", OpcodeRule::new(P1, OpenPseudo)),
        ("ResultRow", OpcodeRule::new(P1, ResultRow)),
    ])
});

/// Result type of a SQL function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionResult {
    Fixed(ColumnType),
    /// Same type as the first argument
    Argument,
    /// Double for real arguments, otherwise BigInt
    Summation,
}

/// Known function result types, keyed by lower-case function name.
pub static FUNCTION_RESULTS: LazyLock<HashMap<&'static str, FunctionResult>> =
    LazyLock::new(|| {
        let mut table = HashMap::new();
        for name in [
            "upper", "lower", "trim", "ltrim", "rtrim", "substr", "substring", "replace",
            "printf", "format", "hex", "quote", "typeof", "char", "group_concat", "string_agg",
            "date", "time", "datetime", "strftime", "sqlite_version", "json",
        ] {
            table.insert(name, FunctionResult::Fixed(ColumnType::Text));
        }
        for name in [
            "length", "instr", "unicode", "count", "changes", "total_changes",
            "last_insert_rowid", "random", "row_number", "rank", "dense_rank",
        ] {
            table.insert(name, FunctionResult::Fixed(ColumnType::BigInt));
        }
        for name in ["avg", "total", "round", "julianday", "percent_rank", "cume_dist"] {
            table.insert(name, FunctionResult::Fixed(ColumnType::Double));
        }
        for name in ["randomblob", "zeroblob", "unhex"] {
            table.insert(name, FunctionResult::Fixed(ColumnType::Blob));
        }
        for name in [
            "abs", "max", "min", "coalesce", "ifnull", "nullif", "iif", "likely", "unlikely",
        ] {
            table.insert(name, FunctionResult::Argument);
        }
        table.insert("sum", FunctionResult::Summation);
        table
    });

/// Extracts the function name from a p4 operand such as `upper(1)`.
pub fn function_name(p4: &str) -> String {
    p4.split('(').next().unwrap_or(p4).trim().to_ascii_lowercase()
}

/// Result type of calling `name` with a first argument of type `argument`.
pub fn function_result(name: &str, argument: ColumnType) -> ColumnType {
    match FUNCTION_RESULTS.get(name) {
        Some(FunctionResult::Fixed(ty)) => *ty,
        Some(FunctionResult::Argument) => argument,
        Some(FunctionResult::Summation) => {
            if argument == ColumnType::Double {
                ColumnType::Double
            } else {
                ColumnType::BigInt
            }
        }
        None => ColumnType::Unknown,
    }
}

/// Type of an arithmetic result over two operand types.
pub fn numeric_promotion(lhs: ColumnType, rhs: ColumnType) -> ColumnType {
    if lhs == ColumnType::Double || rhs == ColumnType::Double {
        ColumnType::Double
    } else if lhs == ColumnType::Integer && rhs == ColumnType::Integer {
        ColumnType::Integer
    } else {
        ColumnType::BigInt
    }
}

/// Type of a bit operation over two operand types.
pub fn integer_promotion(lhs: ColumnType, rhs: ColumnType) -> ColumnType {
    if lhs == ColumnType::Integer && rhs == ColumnType::Integer {
        ColumnType::Integer
    } else {
        ColumnType::BigInt
    }
}

/// Type produced by `CAST` to the affinity code held in a `Cast` p2.
pub fn cast_result(affinity: i64, source: ColumnType) -> ColumnType {
    match u8::try_from(affinity).map(char::from) {
        Ok('A') => ColumnType::Blob,
        Ok('B') => ColumnType::Text,
        Ok('C') if source.is_numeric() => source,
        Ok('C') => ColumnType::Double,
        Ok('D') => ColumnType::Integer,
        Ok('E') => ColumnType::Double,
        _ => ColumnType::Unknown,
    }
}
