#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use vtquery_core::{ColumnType, ColumnTypeInfo, TableColumns};
use vtquery_planner::{QueryPlanner, QueryProgram, SchemaTypes, Step, TableScanOrder};

const OPCODES: &[&str] = &[
    "Init", "Goto", "Halt", "Integer", "Int64", "Real", "String8", "Blob", "Null", "Add",
    "Multiply", "BitAnd", "BitNot", "Concat", "Function", "AggStep", "AggFinal", "SCopy", "Copy",
    "Move", "Cast", "RealAffinity", "OpenRead", "OpenPseudo", "Column", "MakeRecord",
    "SorterInsert", "SorterData", "ResultRow",
];

#[derive(Arbitrary, Debug)]
struct FuzzStep {
    opcode: u8,
    p1: i8,
    p2: i8,
    p3: i8,
    function: Option<u8>,
}

fuzz_target!(|input: (Vec<FuzzStep>, u8)| {
    let (steps, width) = input;
    // Limit program size to prevent timeout
    let steps: Vec<Step> = steps
        .iter()
        .take(256)
        .map(|s| {
            let opcode = OPCODES[usize::from(s.opcode) % OPCODES.len()];
            let step = Step::new(opcode, i64::from(s.p1), i64::from(s.p2), i64::from(s.p3));
            match s.function {
                Some(f) if f % 2 == 0 => step.with_p4("sum(1)"),
                Some(_) => step.with_p4("k(2,B,B)"),
                None => step,
            }
        })
        .collect();

    let mut schema = SchemaTypes::new();
    schema.insert_table("t", vec![ColumnType::Text, ColumnType::Integer]);
    let planner = QueryPlanner::from_parts(
        QueryProgram::new(steps),
        TableScanOrder::new(vec!["t".to_string()]),
        schema,
    );

    let mut columns: TableColumns = (0..width % 8)
        .map(|i| ColumnTypeInfo::new(format!("c{}", i), ColumnType::Unknown))
        .collect();
    let _ = planner.apply_types(&mut columns);
});
