//! Builds a scanner from a JSON fixture of named patterns and checks the
//! resulting label sequence against fixture cases, rather than
//! hand-writing every `Scanner::build` call inline.
use serde_json::Value;

use grammake::scanner::Scanner;

fn load_fixture() -> Value {
    let raw = std::fs::read_to_string("tests/fixtures/scanner_patterns.json").unwrap();
    serde_json::from_str(&raw).unwrap()
}

#[test]
fn fixture_cases_tokenize_to_expected_labels() {
    let fixture = load_fixture();
    let patterns: Vec<(String, String)> = fixture["patterns"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| {
            (
                p["name"].as_str().unwrap().to_string(),
                p["pattern"].as_str().unwrap().to_string(),
            )
        })
        .collect();

    let scanner = Scanner::build(patterns).unwrap();

    for case in fixture["cases"].as_array().unwrap() {
        let input = case["input"].as_str().unwrap();
        let expected: Vec<String> = case["labels"]
            .as_array()
            .unwrap()
            .iter()
            .map(|l| l.as_str().unwrap().to_string())
            .collect();

        let tokens = scanner.tokenize(input.as_bytes()).unwrap();
        let labels: Vec<String> = tokens.into_iter().map(|t| t.label).collect();
        assert_eq!(labels, expected, "mismatch tokenizing {:?}", input);
    }
}
