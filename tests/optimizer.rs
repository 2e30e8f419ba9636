//! Loads a straight-line quadruple block and its live-set from a JSON
//! fixture and checks that only the live destination survives emission,
//! the same folded-constant-chain scenario as the colocated unit tests but
//! driven from a fixture rather than a literal `Vec<Quadruple>`.
use std::collections::BTreeSet;

use serde_json::Value;

use grammake::optimizer::{LocalOptimizer, Operand, OptimizerOptions, Quadruple, QuadrupleOp, Value as QuadValue};

fn load_fixture() -> Value {
    let raw = std::fs::read_to_string("tests/fixtures/optimizer_block.json").unwrap();
    serde_json::from_str(&raw).unwrap()
}

fn op_from_name(name: &str) -> QuadrupleOp {
    match name {
        "Assign" => QuadrupleOp::Assign,
        "Add" => QuadrupleOp::Add,
        "Sub" => QuadrupleOp::Sub,
        "Mul" => QuadrupleOp::Mul,
        "Div" => QuadrupleOp::Div,
        other => panic!("unknown op '{}' in fixture", other),
    }
}

fn operand_from(value: &Value) -> Operand {
    if let Some(obj) = value.as_object() {
        if let Some(v) = obj.get("const") {
            return Operand::Constant(QuadValue::Integer(v.as_i64().unwrap()));
        }
        if let Some(v) = obj.get("var") {
            return Operand::Variable(v.as_str().unwrap().to_string());
        }
    }
    panic!("malformed operand in fixture: {}", value);
}

#[test]
fn fixture_block_keeps_only_the_live_destination() {
    let fixture = load_fixture();

    let quadruples: Vec<Quadruple> = fixture["quadruples"]
        .as_array()
        .unwrap()
        .iter()
        .map(|q| {
            Quadruple::new(
                op_from_name(q["op"].as_str().unwrap()),
                q.get("v1").map(operand_from),
                q.get("v2").map(operand_from),
                Operand::Variable(q["v3"].as_str().unwrap().to_string()),
            )
        })
        .collect();

    let live: BTreeSet<String> = fixture["live"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n.as_str().unwrap().to_string())
        .collect();

    let mut optimizer = LocalOptimizer::new();
    let result = optimizer.optimize(&quadruples, &OptimizerOptions { live: Some(live) });

    assert_eq!(result.len(), 1);
    assert_eq!(
        result[0].v3,
        Operand::Variable(fixture["expected_destination"].as_str().unwrap().to_string())
    );
    assert!(matches!(
        result[0].v1,
        Some(Operand::Constant(QuadValue::Integer(n))) if n == fixture["expected_constant"].as_i64().unwrap()
    ));
}
