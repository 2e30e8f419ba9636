//! Action/goto table construction from a canonical collection, with
//! conflict detection: the table is always returned complete, with one
//! choice kept (shift over reduce, lowest production id over a later one)
//! and every conflict recorded alongside it.
use std::collections::HashMap;

use crate::error::TableError;
use crate::grammar::symbol::{Grammar, Symbol, END_OF_INPUT};
use crate::grammar::{compute_sets, SymbolSets};
use crate::lr::canonical::{self, Collection, AUGMENTED_START};
use crate::lr::item::is_complete;

#[derive(Debug, Clone, Copy)]
pub enum LrVariant {
    Lr1,
    Lalr1,
}

#[derive(Debug, Clone, Copy)]
pub struct TableOptions {
    pub variant: LrVariant,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            variant: LrVariant::Lr1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Shift(usize),
    Reduce(usize),
    Accept,
}

/// A complete action/goto table: `action` keyed by `(state, terminal)`,
/// `goto` keyed by `(state, non-terminal)`. `production_list[id]` names
/// the `(LHS, alternative index)` a `Cell::Reduce(id)` refers to.
pub struct Table {
    pub action: HashMap<(usize, String), Cell>,
    pub goto: HashMap<(usize, String), usize>,
    pub states: usize,
    /// `(LHS name, alternative index, arity)` indexed by production id —
    /// arity is the popped-state count a `Cell::Reduce(id)` needs off the
    /// driver's stack.
    pub production_list: Vec<(String, usize, usize)>,
}

fn describe_cell(cell: &Cell, production_list: &[(String, usize, usize)]) -> String {
    match cell {
        Cell::Shift(s) => format!("shift({})", s),
        Cell::Accept => "accept".to_string(),
        Cell::Reduce(id) => {
            let (name, alt, _) = &production_list[*id];
            format!("reduce({} -> alt {})", name, alt)
        }
    }
}

/// Default conflict resolution: shift wins over reduce; between two
/// reduces, the lower production id (declared earlier) wins. Returns the
/// chosen cell.
fn resolve(existing: Cell, incoming: Cell) -> Cell {
    match (&existing, &incoming) {
        (Cell::Shift(_), _) => existing,
        (_, Cell::Shift(_)) => incoming,
        (Cell::Accept, _) => existing,
        (_, Cell::Accept) => incoming,
        (Cell::Reduce(a), Cell::Reduce(b)) => {
            if a <= b {
                existing
            } else {
                incoming
            }
        }
    }
}

fn insert_action(
    action: &mut HashMap<(usize, String), Cell>,
    errors: &mut Vec<TableError>,
    production_list: &[(String, usize, usize)],
    state: usize,
    terminal: String,
    cell: Cell,
) {
    match action.get(&(state, terminal.clone())) {
        None => {
            action.insert((state, terminal), cell);
        }
        Some(existing) if *existing == cell => {}
        Some(existing) => {
            let choices = vec![
                describe_cell(existing, production_list),
                describe_cell(&cell, production_list),
            ];
            let chosen = resolve(existing.clone(), cell);
            errors.push(TableError::Conflict(crate::error::GrammarConflict {
                state,
                lookahead: terminal.clone(),
                choices,
            }));
            action.insert((state, terminal), chosen);
        }
    }
}

/// Build the action/goto table for `grammar` under `options.variant` (spec
/// §4.7/§4.8). Always returns a usable [Table]; every conflict encountered
/// is collected into the returned [TableError] list rather than aborting.
pub fn build_table(grammar: &Grammar, options: TableOptions) -> (Table, Vec<TableError>) {
    let sets: SymbolSets = compute_sets(grammar);
    let canonical = canonical::build(grammar, &sets);

    let (collection, mut errors): (Collection, Vec<TableError>) = match options.variant {
        LrVariant::Lr1 => (canonical, Vec::new()),
        LrVariant::Lalr1 => {
            let (merged, inadequacies) = canonical::merge_lalr(canonical, grammar, &sets);
            (
                merged,
                inadequacies.into_iter().map(TableError::LalrInadequate).collect(),
            )
        }
    };

    let mut production_list: Vec<(String, usize, usize)> = Vec::new();
    for name in &grammar.order {
        let production = &grammar.productions[name];
        for (alt_index, alt) in production.alternatives.iter().enumerate() {
            production_list.push((name.clone(), alt_index, alt.len()));
        }
    }
    let production_ids: HashMap<(String, usize), usize> = production_list
        .iter()
        .enumerate()
        .map(|(id, (name, alt_index, _))| ((name.clone(), *alt_index), id))
        .collect();

    let mut action: HashMap<(usize, String), Cell> = HashMap::new();
    let mut goto_table: HashMap<(usize, String), usize> = HashMap::new();

    for (state_idx, items) in collection.item_sets.iter().enumerate() {
        for (core, lookaheads) in items {
            if core.production == AUGMENTED_START && core.dot == 1 {
                insert_action(
                    &mut action,
                    &mut errors,
                    &production_list,
                    state_idx,
                    END_OF_INPUT.to_string(),
                    Cell::Accept,
                );
                continue;
            }

            if is_complete(core, grammar) {
                let id = production_ids[&(core.production.clone(), core.alt_index)];
                for la in lookaheads {
                    insert_action(
                        &mut action,
                        &mut errors,
                        &production_list,
                        state_idx,
                        la.clone(),
                        Cell::Reduce(id),
                    );
                }
            } else {
                let production = &grammar.productions[&core.production];
                let alt = &production.alternatives[core.alt_index];
                let symbol = &alt[core.dot];
                if let Symbol::Terminal(name) = symbol {
                    if let Some(&target) = collection.transitions.get(&(state_idx, symbol.clone())) {
                        insert_action(
                            &mut action,
                            &mut errors,
                            &production_list,
                            state_idx,
                            name.clone(),
                            Cell::Shift(target),
                        );
                    }
                }
            }
        }
    }

    for ((from, symbol), to) in &collection.transitions {
        if let Symbol::NonTerminal(name) = symbol {
            goto_table.insert((*from, name.clone()), *to);
        }
    }

    (
        Table {
            action,
            goto: goto_table,
            states: collection.item_sets.len(),
            production_list,
        },
        errors,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::symbol::Symbol::*;
    use crate::grammar::Grammar;
    use std::collections::HashSet;

    fn s_aa_grammar() -> Grammar {
        // S -> A A ; A -> a A | b
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

    #[test]
    fn lr1_has_ten_states_lalr_has_seven() {
        let grammar = s_aa_grammar();
        let (lr1_table, lr1_errors) = build_table(&grammar, TableOptions { variant: LrVariant::Lr1 });
        assert!(lr1_errors.is_empty());
        assert_eq!(lr1_table.states, 10);

        let (lalr_table, lalr_errors) =
            build_table(&grammar, TableOptions { variant: LrVariant::Lalr1 });
        assert!(lalr_errors.is_empty());
        assert_eq!(lalr_table.states, 7);
    }

    fn dangling_else_grammar() -> Grammar {
        // S -> i S e S | i S | a
        Grammar::build(
            vec![(
                "S".into(),
                vec![
                    vec![
                        Terminal("i".into()),
                        NonTerminal("S".into()),
                        Terminal("e".into()),
                        NonTerminal("S".into()),
                    ],
                    vec![Terminal("i".into()), NonTerminal("S".into())],
                    vec![Terminal("a".into())],
                ],
                vec![],
            )],
            HashSet::from(["i".to_string(), "e".to_string(), "a".to_string()]),
            "S",
        )
        .unwrap()
    }

    #[test]
    fn dangling_else_reports_shift_reduce_conflict() {
        let grammar = dangling_else_grammar();
        let (_, errors) = build_table(&grammar, TableOptions { variant: LrVariant::Lr1 });
        assert!(errors.iter().any(|e| matches!(e, TableError::Conflict(c) if c.lookahead == "e")));
    }

    fn expr_grammar() -> Grammar {
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
                        vec![Terminal("(".into()), NonTerminal("E".into()), Terminal(")".into())],
                        vec![Terminal("i".into())],
                    ],
                    vec![],
                ),
            ],
            HashSet::from(["+".to_string(), "*".to_string(), "(".to_string(), ")".to_string(), "i".to_string()]),
            "E",
        )
        .unwrap()
    }

    #[test]
    fn lalr_merge_introduces_no_new_conflicts_for_expr_grammar() {
        let grammar = expr_grammar();
        let (_, errors) = build_table(&grammar, TableOptions { variant: LrVariant::Lalr1 });
        assert!(errors.is_empty());
    }
}
