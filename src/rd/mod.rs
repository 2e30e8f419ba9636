//! A small recursive-descent debugging oracle: given the same [Production]
//! list the LR generator consumes, [Oracle] attempts a greedy top-down
//! derivation over a terminal stream, one alternative at a time.
//!
//! This module is explicitly non-authoritative. It exists only to let a
//! grammar author sanity-check a hand-written input against a grammar
//! before trusting the LR/LALR tables; on ambiguity it returns the first
//! derivation found (first-success-wins, no backtracking across a
//! committed alternative).
mod tree;

pub use tree::ParseTree;

use std::collections::HashMap;

use crate::grammar::symbol::{Grammar, Symbol};

/// One input terminal occurrence: its name and position in the input
/// stream, mirroring [crate::lr::InputToken].
#[derive(Debug, Clone)]
pub struct OracleToken {
    pub terminal: String,
    pub position: usize,
}

/// A recursive-descent derivation attempt over `grammar`, used only as a
/// debugging companion to the canonical LR/LALR tables.
pub struct Oracle<'g> {
    grammar: &'g Grammar,
}

impl<'g> Oracle<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self { grammar }
    }

    /// Attempt a derivation of `grammar.start` over the whole of `tokens`.
    /// Returns `None` if no alternative of any visited non-terminal
    /// derives a prefix that a later sibling can extend to consume every
    /// token; this is a greedy, non-backtracking approximation and can
    /// reject inputs a full LR parse would accept.
    pub fn derive(&self, tokens: &[OracleToken]) -> Option<ParseTree> {
        let mut memo: HashMap<(String, usize), Option<(ParseTree, usize)>> = HashMap::new();
        let (tree, consumed) = self.derive_non_terminal(&self.grammar.start, tokens, 0, &mut memo)?;
        if consumed == tokens.len() {
            Some(tree)
        } else {
            None
        }
    }

    fn derive_non_terminal(
        &self,
        name: &str,
        tokens: &[OracleToken],
        pos: usize,
        memo: &mut HashMap<(String, usize), Option<(ParseTree, usize)>>,
    ) -> Option<(ParseTree, usize)> {
        let key = (name.to_string(), pos);
        if let Some(cached) = memo.get(&key) {
            return cached.clone();
        }
        // Break left-recursive cycles: mark "in progress" as a failure
        // before recursing. This oracle makes no claim to handle left
        // recursion beyond not looping forever on it.
        memo.insert(key.clone(), None);

        let production = self.grammar.productions.get(name)?;
        let mut result = None;
        for (alt_index, alt) in production.alternatives.iter().enumerate() {
            if let Some((children, consumed)) = self.derive_sequence(alt, tokens, pos, memo) {
                result = Some((
                    ParseTree::Internal {
                        production: name.to_string(),
                        alt_index,
                        children,
                    },
                    consumed,
                ));
                break;
            }
        }
        memo.insert(key, result.clone());
        result
    }

    fn derive_sequence(
        &self,
        symbols: &[Symbol],
        tokens: &[OracleToken],
        pos: usize,
        memo: &mut HashMap<(String, usize), Option<(ParseTree, usize)>>,
    ) -> Option<(Vec<ParseTree>, usize)> {
        let mut children = Vec::with_capacity(symbols.len());
        let mut cursor = pos;
        for symbol in symbols {
            match symbol {
                Symbol::Terminal(name) => {
                    let token = tokens.get(cursor)?;
                    if &token.terminal != name {
                        return None;
                    }
                    children.push(ParseTree::Leaf {
                        terminal: name.clone(),
                        position: token.position,
                    });
                    cursor += 1;
                }
                Symbol::NonTerminal(name) => {
                    let (tree, consumed) = self.derive_non_terminal(name, tokens, cursor, memo)?;
                    children.push(tree);
                    cursor = consumed;
                }
            }
        }
        Some((children, cursor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::symbol::Symbol::*;
    use std::collections::HashSet;

    fn expr_grammar() -> Grammar {
        // E -> T ; T -> i + T | i
        Grammar::build(
            vec![
                (
                    "E".into(),
                    vec![vec![NonTerminal("T".into())]],
                    vec![],
                ),
                (
                    "T".into(),
                    vec![
                        vec![Terminal("i".into()), Terminal("+".into()), NonTerminal("T".into())],
                        vec![Terminal("i".into())],
                    ],
                    vec![],
                ),
            ],
            HashSet::from(["i".to_string(), "+".to_string()]),
            "E",
        )
        .unwrap()
    }

    fn tokens(terminals: &[&str]) -> Vec<OracleToken> {
        terminals
            .iter()
            .enumerate()
            .map(|(i, t)| OracleToken {
                terminal: t.to_string(),
                position: i,
            })
            .collect()
    }

    #[test]
    fn derives_simple_chain() {
        let grammar = expr_grammar();
        let oracle = Oracle::new(&grammar);
        assert!(oracle.derive(&tokens(&["i", "+", "i"])).is_some());
    }

    #[test]
    fn rejects_incomplete_input() {
        let grammar = expr_grammar();
        let oracle = Oracle::new(&grammar);
        assert!(oracle.derive(&tokens(&["i", "+"])).is_none());
    }

    #[test]
    fn rejects_trailing_input() {
        let grammar = expr_grammar();
        let oracle = Oracle::new(&grammar);
        assert!(oracle.derive(&tokens(&["i", "i"])).is_none());
    }
}
