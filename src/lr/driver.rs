//! The table-driven shift/reduce/goto parser runtime: read
//! lookahead; on `shift(s)` push state and advance; on `reduce(p)` pop
//! `|RHS(p)|` states, push `GOTO[top, LHS(p)]`; on `accept` return the
//! root; on an empty cell, fail with `UnexpectedToken`.
use crate::error::RuntimeError;
use crate::grammar::symbol::END_OF_INPUT;
use crate::lr::table::{Cell, Table};

/// A parse-tree node built by [Driver::parse]: a leaf is a shifted
/// terminal occurrence, an internal node a completed reduction.
#[derive(Debug, Clone)]
pub enum ParseNode {
    Leaf {
        terminal: String,
        position: usize,
    },
    Internal {
        production: String,
        alt_index: usize,
        children: Vec<ParseNode>,
    },
}

/// One input token: a terminal name plus its position, as produced by
/// [crate::scanner::Scanner::tokenize].
#[derive(Debug, Clone)]
pub struct InputToken {
    pub terminal: String,
    pub position: usize,
}

pub struct Driver<'t> {
    table: &'t Table,
}

impl<'t> Driver<'t> {
    pub fn new(table: &'t Table) -> Self {
        Self { table }
    }

    pub fn parse(&self, tokens: &[InputToken]) -> Result<ParseNode, RuntimeError> {
        let mut state_stack: Vec<usize> = vec![0];
        let mut node_stack: Vec<ParseNode> = Vec::new();
        let mut pos = 0usize;

        loop {
            let state = *state_stack.last().unwrap();
            let (lookahead, lookahead_position) = match tokens.get(pos) {
                Some(tok) => (tok.terminal.clone(), tok.position),
                None => (
                    END_OF_INPUT.to_string(),
                    tokens.last().map_or(0, |t| t.position + 1),
                ),
            };

            match self.table.action.get(&(state, lookahead.clone())) {
                Some(Cell::Shift(next)) => {
                    node_stack.push(ParseNode::Leaf {
                        terminal: lookahead,
                        position: lookahead_position,
                    });
                    state_stack.push(*next);
                    pos += 1;
                }
                Some(Cell::Reduce(id)) => {
                    let (name, alt_index, arity) = self.table.production_list[*id].clone();
                    let mut children = Vec::with_capacity(arity);
                    for _ in 0..arity {
                        state_stack.pop();
                        children.push(node_stack.pop().unwrap());
                    }
                    children.reverse();
                    let top = *state_stack.last().unwrap();
                    let next = *self
                        .table
                        .goto
                        .get(&(top, name.clone()))
                        .expect("a reduce action always has a matching goto entry");
                    state_stack.push(next);
                    node_stack.push(ParseNode::Internal {
                        production: name,
                        alt_index,
                        children,
                    });
                }
                Some(Cell::Accept) => {
                    return Ok(node_stack
                        .pop()
                        .expect("accept only fires once the start symbol has reduced"))
                }
                None => {
                    let expected: Vec<String> = self
                        .table
                        .action
                        .keys()
                        .filter(|(s, _)| *s == state)
                        .map(|(_, t)| t.clone())
                        .collect();
                    return Err(RuntimeError::UnexpectedToken {
                        position: lookahead_position,
                        expected,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::symbol::Symbol::*;
    use crate::grammar::Grammar;
    use crate::lr::table::{build_table, LrVariant, TableOptions};
    use std::collections::HashSet;

    fn s_aa_grammar() -> Grammar {
        Grammar::build(
            vec![
                (
                    "S".into(),
                    vec![vec![NonTerminal("A".into()), NonTerminal("A".into())]],
                    vec![],
                ),
                (
                    "A".into(),
                    vec![
                        vec![Terminal("a".into()), NonTerminal("A".into())],
                        vec![Terminal("b".into())],
                    ],
                    vec![],
                ),
            ],
            HashSet::from(["a".to_string(), "b".to_string()]),
            "S",
        )
        .unwrap()
    }

    fn tokens(terminals: &[&str]) -> Vec<InputToken> {
        terminals
            .iter()
            .enumerate()
            .map(|(i, t)| InputToken {
                terminal: t.to_string(),
                position: i,
            })
            .collect()
    }

    #[test]
    fn accepts_aab() {
        let grammar = s_aa_grammar();
        let (table, errors) = build_table(&grammar, TableOptions { variant: LrVariant::Lr1 });
        assert!(errors.is_empty());
        let driver = Driver::new(&table);
        assert!(driver.parse(&tokens(&["a", "a", "b", "b"])).is_ok());
    }

    #[test]
    fn rejects_ba() {
        let grammar = s_aa_grammar();
        let (table, _) = build_table(&grammar, TableOptions { variant: LrVariant::Lr1 });
        let driver = Driver::new(&table);
        assert!(driver.parse(&tokens(&["b", "a"])).is_err());
    }
}
