//! FIRST/FOLLOW/NULLABLE fixed-point computation. Two FIRST variants are
//! kept: a union-by-name set per non-terminal (canonical, used for FOLLOW)
//! and a per-alternation function over any symbol sequence (used for
//! LL(1)/LR(1) lookahead computation, where which specific alternative is
//! in play matters).
use std::collections::{HashMap, HashSet};

use crate::grammar::symbol::{Grammar, Symbol, END_OF_INPUT};

/// The epsilon marker used inside a FIRST set to mean "this sequence can
/// derive the empty string."
pub const EPSILON: &str = "";

#[derive(Debug, Clone, Default)]
pub struct SymbolSets {
    pub nullable: HashSet<String>,
    /// Union-by-name FIRST set per non-terminal (canonical for FOLLOW).
    pub first: HashMap<String, HashSet<String>>,
    pub follow: HashMap<String, HashSet<String>>,
}

/// The per-alternation FIRST variant: FIRST of an arbitrary symbol
/// sequence `X1 X2 ... Xn`, given the already-fixed-point `first`/
/// `nullable` tables. Needed for LL(1)/LR(1) table building, where the
/// lookahead for one specific alternative (not the union over all of a
/// non-terminal's alternatives) is what matters.
pub fn first_of_sequence(
    seq: &[Symbol],
    first: &HashMap<String, HashSet<String>>,
    nullable: &HashSet<String>,
) -> HashSet<String> {
    let mut result = HashSet::new();
    let mut all_nullable = true;
    for symbol in seq {
        match symbol {
            Symbol::Terminal(name) => {
                result.insert(name.clone());
                all_nullable = false;
                break;
            }
            Symbol::NonTerminal(name) => {
                if let Some(f) = first.get(name) {
                    for t in f {
                        if t != EPSILON {
                            result.insert(t.clone());
                        }
                    }
                }
                if !nullable.contains(name) {
                    all_nullable = false;
                    break;
                }
            }
        }
    }
    if all_nullable {
        result.insert(EPSILON.to_string());
    }
    result
}

/// Run the fixed-point computation of NULLABLE, FIRST (union-by-name), and
/// FOLLOW over an entire grammar. Reaches a fixed point regardless of
/// production declaration order.
pub fn compute(grammar: &Grammar) -> SymbolSets {
    let mut nullable: HashSet<String> = HashSet::new();
    let mut first: HashMap<String, HashSet<String>> = grammar
        .order
        .iter()
        .map(|name| (name.clone(), HashSet::new()))
        .collect();

    loop {
        let mut changed = false;
        for name in &grammar.order {
            let production = &grammar.productions[name];
            for alt in &production.alternatives {
                if alt.is_empty() && nullable.insert(name.clone()) {
                    changed = true;
                }
                let alt_nullable = alt
                    .iter()
                    .all(|s| matches!(s, Symbol::NonTerminal(n) if nullable.contains(n)));
                if !alt.is_empty() && alt_nullable && nullable.insert(name.clone()) {
                    changed = true;
                }

                let alt_first = first_of_sequence(alt, &first, &nullable);
                let entry = first.get_mut(name).unwrap();
                for t in alt_first {
                    if entry.insert(t) {
                        changed = true;
                    }
                }
            }
        }
        if !changed {
            break;
        }
    }

    for production in grammar.productions.values() {
        if let Some(set) = first.get(&production.name) {
            production.set_first_set(set.clone());
        }
    }

    let mut follow: HashMap<String, HashSet<String>> = grammar
        .order
        .iter()
        .map(|name| (name.clone(), HashSet::new()))
        .collect();
    follow
        .get_mut(&grammar.start)
        .unwrap()
        .insert(END_OF_INPUT.to_string());

    loop {
        let mut changed = false;
        for name in &grammar.order {
            let production = &grammar.productions[name];
            for alt in &production.alternatives {
                for (i, symbol) in alt.iter().enumerate() {
                    let Symbol::NonTerminal(target) = symbol else {
                        continue;
                    };
                    let beta = &alt[i + 1..];
                    let beta_first = first_of_sequence(beta, &first, &nullable);
                    let beta_nullable = beta.is_empty() || beta_first.contains(EPSILON);

                    let mut additions: HashSet<String> =
                        beta_first.iter().filter(|t| *t != EPSILON).cloned().collect();
                    if beta_nullable {
                        additions.extend(follow[name].iter().cloned());
                    }

                    let entry = follow.get_mut(target).unwrap();
                    for t in additions {
                        if entry.insert(t) {
                            changed = true;
                        }
                    }
                }
            }
        }
        if !changed {
            break;
        }
    }

    SymbolSets {
        nullable,
        first,
        follow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::symbol::Symbol::*;
    use std::collections::HashSet as HS;

    fn build_expr_grammar() -> Grammar {
        // E -> E + T | T
        // T -> T * F | F
        // F -> ( E ) | i
        Grammar::build(
            vec![
                (
                    "E".into(),
                    vec![
                        vec![NonTerminal("E".into()), Terminal("+".into()), NonTerminal("T".into())],
                        vec![NonTerminal("T".into())],
                    ],
                    vec![],
                ),
                (
                    "T".into(),
                    vec![
                        vec![NonTerminal("T".into()), Terminal("*".into()), NonTerminal("F".into())],
                        vec![NonTerminal("F".into())],
                    ],
                    vec![],
                ),
                (
                    "F".into(),
                    vec![
                        vec![
                            Terminal("(".into()),
                            NonTerminal("E".into()),
                            Terminal(")".into()),
                        ],
                        vec![Terminal("i".into())],
                    ],
                    vec![],
                ),
            ],
            HS::from(["+".to_string(), "*".to_string(), "(".to_string(), ")".to_string(), "i".to_string()]),
            "E",
        )
        .unwrap()
    }

    #[test]
    fn first_of_expression_grammar() {
        let grammar = build_expr_grammar();
        let sets = compute(&grammar);
        for name in ["E", "T", "F"] {
            assert!(sets.first[name].contains("("));
            assert!(sets.first[name].contains("i"));
        }
    }

    #[test]
    fn follow_of_e_contains_close_paren_and_eof() {
        let grammar = build_expr_grammar();
        let sets = compute(&grammar);
        assert!(sets.follow["E"].contains(")"));
        assert!(sets.follow["E"].contains(END_OF_INPUT));
    }

    #[test]
    fn first_is_idempotent() {
        let grammar = build_expr_grammar();
        let once = compute(&grammar);
        let twice = compute(&grammar);
        assert_eq!(once.first, twice.first);
    }
}
