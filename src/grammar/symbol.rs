//! Grammar symbols and productions: a `Symbol` is either a
//! terminal or non-terminal name; a `Production` is a named left-hand side
//! plus an alternation of right-hand sides, each an ordered sequence of
//! symbols. An empty sequence denotes ε.
use std::collections::{HashMap, HashSet};

use once_cell::unsync::OnceCell;

use crate::error::GrammarError;

#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Symbol {
    Terminal(String),
    NonTerminal(String),
}

impl Symbol {
    pub fn name(&self) -> &str {
        match self {
            Symbol::Terminal(name) | Symbol::NonTerminal(name) => name,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Symbol::Terminal(_))
    }
}

/// The end-of-input sentinel `$` used as a lookahead and in FOLLOW sets.
pub const END_OF_INPUT: &str = "$";

/// A named non-terminal with its alternation of right-hand sides, plus an
/// attribute-grammar tuple of the same arity (opaque to the core, stored
/// verbatim). The FIRST set is memoized lazily with an
/// `once_cell::unsync::OnceCell`.
#[derive(Debug, Clone)]
pub struct Production {
    pub name: String,
    pub alternatives: Vec<Vec<Symbol>>,
    pub attributes: Vec<String>,
    first_set: OnceCell<HashSet<String>>,
}

impl PartialEq for Production {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.alternatives == other.alternatives
    }
}
impl Eq for Production {}
impl std::hash::Hash for Production {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.alternatives.hash(state);
    }
}

impl Production {
    pub fn new(name: impl Into<String>, alternatives: Vec<Vec<Symbol>>, attributes: Vec<String>) -> Self {
        Self {
            name: name.into(),
            alternatives,
            attributes,
            first_set: OnceCell::new(),
        }
    }

    pub fn set_first_set(&self, set: HashSet<String>) {
        let _ = self.first_set.set(set);
    }

    pub fn first_set(&self) -> Option<&HashSet<String>> {
        self.first_set.get()
    }
}

/// A whole context-free grammar: its productions keyed by non-terminal
/// name, the declared terminal set, and the designated start symbol.
pub struct Grammar {
    pub productions: HashMap<String, Production>,
    pub terminals: HashSet<String>,
    pub start: String,
    /// Non-terminal names in declaration order, for deterministic
    /// iteration when order affects output ids.
    pub order: Vec<String>,
}

impl Grammar {
    /// Validate and assemble a grammar from an `(LHS, alternation,
    /// attributes)` list, the declared terminal set, and the start
    /// non-terminal.
    pub fn build(
        productions: Vec<(String, Vec<Vec<Symbol>>, Vec<String>)>,
        terminals: HashSet<String>,
        start: impl Into<String>,
    ) -> Result<Grammar, GrammarError> {
        let start = start.into();
        let mut map = HashMap::new();
        let mut order = Vec::new();
        for (name, alternatives, attributes) in productions {
            if map.contains_key(&name) {
                return Err(GrammarError::DuplicateNonTerminal(name));
            }
            order.push(name.clone());
            map.insert(name.clone(), Production::new(name, alternatives, attributes));
        }

        if !map.contains_key(&start) {
            return Err(GrammarError::UndefinedStartSymbol);
        }

        if let Some(name) = terminals.intersection(&map.keys().cloned().collect()).next() {
            return Err(GrammarError::NameCollision(name.clone()));
        }

        for production in map.values() {
            for alt in &production.alternatives {
                for symbol in alt {
                    if let Symbol::NonTerminal(name) = symbol {
                        if !map.contains_key(name) {
                            return Err(GrammarError::UndefinedNonTerminal(name.clone()));
                        }
                    }
                }
            }
        }

        Ok(Grammar {
            productions: map,
            terminals,
            start,
            order,
        })
    }
}
