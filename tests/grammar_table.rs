//! Builds a small expression grammar from a JSON fixture and drives both
//! the LR(1) and LALR(1) tables over it, the way
//! `src/examples/__tests__/benchmark` exercises the teacher's generated
//! parsers against real input rather than hand-built ASTs.
use std::collections::HashSet;

use serde_json::Value;

use grammake::grammar::{Grammar, Symbol};
use grammake::lr::{build_table, Driver, InputToken, LrVariant, TableOptions};

fn load_fixture() -> Value {
    let raw = std::fs::read_to_string("tests/fixtures/expr_grammar.json").unwrap();
    serde_json::from_str(&raw).unwrap()
}

fn build_grammar(fixture: &Value, terminals: &HashSet<String>) -> Grammar {
    let productions = fixture["productions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| {
            let name = p["name"].as_str().unwrap().to_string();
            let alternatives = p["alternatives"]
                .as_array()
                .unwrap()
                .iter()
                .map(|alt| {
                    alt.as_array()
                        .unwrap()
                        .iter()
                        .map(|sym| {
                            let sym = sym.as_str().unwrap().to_string();
                            if terminals.contains(&sym) {
                                Symbol::Terminal(sym)
                            } else {
                                Symbol::NonTerminal(sym)
                            }
                        })
                        .collect()
                })
                .collect();
            (name, alternatives, Vec::new())
        })
        .collect();

    Grammar::build(
        productions,
        terminals.clone(),
        fixture["start"].as_str().unwrap(),
    )
    .unwrap()
}

fn tokens_for(case: &Value) -> Vec<InputToken> {
    case.as_array()
        .unwrap()
        .iter()
        .enumerate()
        .map(|(i, t)| InputToken {
            terminal: t.as_str().unwrap().to_string(),
            position: i,
        })
        .collect()
}

#[test]
fn lr1_table_accepts_fixture_inputs() {
    let fixture = load_fixture();
    let terminals: HashSet<String> = fixture["terminals"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t.as_str().unwrap().to_string())
        .collect();
    let grammar = build_grammar(&fixture, &terminals);

    let (table, errors) = build_table(
        &grammar,
        TableOptions {
            variant: LrVariant::Lr1,
        },
    );
    assert!(errors.is_empty());

    let driver = Driver::new(&table);
    for case in fixture["accepted"].as_array().unwrap() {
        let tokens = tokens_for(case);
        driver.parse(&tokens).unwrap();
    }
}

#[test]
fn lalr1_table_accepts_fixture_inputs() {
    let fixture = load_fixture();
    let terminals: HashSet<String> = fixture["terminals"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t.as_str().unwrap().to_string())
        .collect();
    let grammar = build_grammar(&fixture, &terminals);

    let (table, errors) = build_table(
        &grammar,
        TableOptions {
            variant: LrVariant::Lalr1,
        },
    );
    assert!(errors.is_empty());

    let driver = Driver::new(&table);
    for case in fixture["accepted"].as_array().unwrap() {
        let tokens = tokens_for(case);
        driver.parse(&tokens).unwrap();
    }
}
