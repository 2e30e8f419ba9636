//! LR(1) items and item sets. An item is `(production,
//! dot-position, lookahead-set)`; item sets are order-insensitive but use a
//! sorted immutable representation (`BTreeMap`) so they can serve as hash
//! keys for the canonical collection, where two states are the same state
//! exactly when their item sets are equal as sets.
use std::collections::{BTreeMap, BTreeSet};

use crate::grammar::symbol::{Grammar, Symbol};
use crate::grammar::{first_of_sequence, SymbolSets, EPSILON};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemCore {
    pub production: String,
    pub alt_index: usize,
    pub dot: usize,
}

/// An LR(1) item set: core `(production, dot)` pairs mapped to their
/// merged lookahead sets. Implements `Hash`/`Eq` (via `BTreeMap`'s
/// deterministic iteration order) so it can key the canonical collection's
/// dedup table directly.
pub type Items = BTreeMap<ItemCore, BTreeSet<String>>;

/// The projection discarding lookaheads — two item sets share a core iff
/// they are merge candidates under LALR (spec GLOSSARY).
pub fn core_of(items: &Items) -> BTreeSet<ItemCore> {
    items.keys().cloned().collect()
}

fn symbol_after_dot<'g>(core: &ItemCore, grammar: &'g Grammar) -> Option<&'g Symbol> {
    let production = grammar.productions.get(&core.production)?;
    let alt = production.alternatives.get(core.alt_index)?;
    alt.get(core.dot)
}

/// CLOSURE(I): repeatedly, for every item `[A -> a.Bb, L]` and
/// every production `B -> g`, add `[B -> .g, FIRST(bL) \ {e}]`, merging
/// lookaheads for identical `(production, dot)` pairs by union.
pub fn closure(mut items: Items, grammar: &Grammar, sets: &SymbolSets) -> Items {
    loop {
        let mut additions: Vec<(ItemCore, BTreeSet<String>)> = Vec::new();
        for (core, lookaheads) in &items {
            let Some(Symbol::NonTerminal(b_name)) = symbol_after_dot(core, grammar) else {
                continue;
            };
            let production = &grammar.productions[&core.production];
            let alt = &production.alternatives[core.alt_index];
            let beta = &alt[core.dot + 1..];

            let mut propagated: BTreeSet<String> = BTreeSet::new();
            let beta_first = first_of_sequence(beta, &sets.first, &sets.nullable);
            let beta_nullable = beta.is_empty() || beta_first.contains(EPSILON);
            for t in &beta_first {
                if t != EPSILON {
                    propagated.insert(t.clone());
                }
            }
            if beta_nullable {
                propagated.extend(lookaheads.iter().cloned());
            }

            let Some(b_production) = grammar.productions.get(b_name) else {
                continue;
            };
            for alt_index in 0..b_production.alternatives.len() {
                additions.push((
                    ItemCore {
                        production: b_name.clone(),
                        alt_index,
                        dot: 0,
                    },
                    propagated.clone(),
                ));
            }
        }

        let mut changed = false;
        for (core, las) in additions {
            let entry = items.entry(core).or_default();
            for la in las {
                if entry.insert(la) {
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }
    items
}

/// GOTO(I, X): advance the dot past `X` on every applicable
/// item, then take CLOSURE of the result.
pub fn goto(items: &Items, symbol: &Symbol, grammar: &Grammar, sets: &SymbolSets) -> Items {
    let mut moved: Items = BTreeMap::new();
    for (core, lookaheads) in items {
        if symbol_after_dot(core, grammar) == Some(symbol) {
            let new_core = ItemCore {
                production: core.production.clone(),
                alt_index: core.alt_index,
                dot: core.dot + 1,
            };
            moved
                .entry(new_core)
                .or_default()
                .extend(lookaheads.iter().cloned());
        }
    }
    closure(moved, grammar, sets)
}

/// Every grammar symbol with an item in `items` whose dot sits immediately
/// before it, in a stable (name, terminal-first) order for deterministic
/// transition exploration.
pub fn symbols_after_dot(items: &Items, grammar: &Grammar) -> Vec<Symbol> {
    let mut symbols: Vec<Symbol> = Vec::new();
    for core in items.keys() {
        if let Some(symbol) = symbol_after_dot(core, grammar) {
            if !symbols.contains(symbol) {
                symbols.push(symbol.clone());
            }
        }
    }
    symbols.sort_by(|a, b| a.name().cmp(b.name()).then(b.is_terminal().cmp(&a.is_terminal())));
    symbols
}

pub fn is_complete(core: &ItemCore, grammar: &Grammar) -> bool {
    let production = &grammar.productions[&core.production];
    core.dot >= production.alternatives[core.alt_index].len()
}
