//! Canonical LR(1) collection construction and LALR(1) core-merging: build
//! the canonical collection by repeated GOTO/CLOSURE from the augmented
//! start item, then — for LALR — partition by LR(0) core, union
//! lookaheads, and **re-close** the merged sets rather than reuse any
//! pre-merge closure cache, since a merge can enable a closure step that
//! none of the pre-merge states needed on their own.
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::LalrInadequate;
use crate::grammar::symbol::{Grammar, Production, Symbol, END_OF_INPUT};
use crate::grammar::SymbolSets;
use crate::lr::item::{closure, core_of, goto, is_complete, symbols_after_dot, ItemCore, Items};

pub const AUGMENTED_START: &str = "$start";

/// The canonical collection of LR(1) item sets reachable from the
/// augmented start item under CLOSURE and GOTO, plus the transition
/// function between them (spec GLOSSARY: "Canonical collection").
pub struct Collection {
    pub item_sets: Vec<Items>,
    pub transitions: HashMap<(usize, Symbol), usize>,
    pub start: usize,
}

/// Wrap `grammar` with a synthetic `$start -> S` production, without
/// mutating the caller's grammar. The wrapper needs no new FIRST/FOLLOW
/// entries: `$start` never appears on the right-hand side of any
/// production, so the `sets` computed over the original grammar remain
/// valid for closures over the augmented one.
fn augment(grammar: &Grammar) -> Grammar {
    let mut productions = grammar.productions.clone();
    productions.insert(
        AUGMENTED_START.to_string(),
        Production::new(
            AUGMENTED_START,
            vec![vec![Symbol::NonTerminal(grammar.start.clone())]],
            vec![],
        ),
    );
    let mut order = vec![AUGMENTED_START.to_string()];
    order.extend(grammar.order.clone());
    Grammar {
        productions,
        terminals: grammar.terminals.clone(),
        start: AUGMENTED_START.to_string(),
        order,
    }
}

/// Build the canonical LR(1) collection.
pub fn build(grammar: &Grammar, sets: &SymbolSets) -> Collection {
    let augmented = augment(grammar);

    let mut initial_core = BTreeMap::new();
    initial_core.insert(
        ItemCore {
            production: AUGMENTED_START.to_string(),
            alt_index: 0,
            dot: 0,
        },
        BTreeSet::from([END_OF_INPUT.to_string()]),
    );
    let initial = closure(initial_core, &augmented, sets);

    let mut item_sets: Vec<Items> = vec![initial.clone()];
    let mut index_of: HashMap<Items, usize> = HashMap::new();
    index_of.insert(initial, 0);
    let mut transitions: HashMap<(usize, Symbol), usize> = HashMap::new();

    let mut i = 0;
    while i < item_sets.len() {
        let items = item_sets[i].clone();
        for symbol in symbols_after_dot(&items, &augmented) {
            let target_items = goto(&items, &symbol, &augmented, sets);
            if target_items.is_empty() {
                continue;
            }
            let target = match index_of.get(&target_items) {
                Some(&idx) => idx,
                None => {
                    let idx = item_sets.len();
                    index_of.insert(target_items.clone(), idx);
                    item_sets.push(target_items);
                    idx
                }
            };
            transitions.insert((i, symbol), target);
        }
        i += 1;
    }

    Collection {
        item_sets,
        transitions,
        start: 0,
    }
}

/// Every pair of distinct complete items in `items` that share a
/// lookahead terminal — a reduce/reduce conflict, used both to detect
/// table conflicts and to tell a pre-existing LR(1) conflict apart from
/// one newly introduced by LALR merging.
fn reduce_reduce_pairs(
    items: &Items,
    grammar: &Grammar,
) -> BTreeSet<(ItemCore, ItemCore, String)> {
    let mut pairs = BTreeSet::new();
    let complete: Vec<&ItemCore> = items
        .keys()
        .filter(|core| is_complete(core, grammar))
        .collect();
    for i in 0..complete.len() {
        for j in (i + 1)..complete.len() {
            let (a, b) = (complete[i], complete[j]);
            let shared = items[a].intersection(&items[b]);
            for la in shared {
                pairs.insert((a.clone(), b.clone(), la.clone()));
            }
        }
    }
    pairs
}

/// Merge LR(1) item sets with identical LR(0) cores into single LALR(1)
/// states. Reports a [LalrInadequate] for every reduce/reduce
/// conflict introduced by a merge that was not present in any of the
/// pre-merge members.
pub fn merge_lalr(
    collection: Collection,
    grammar: &Grammar,
    sets: &SymbolSets,
) -> (Collection, Vec<LalrInadequate>) {
    let augmented = augment(grammar);

    let mut core_groups: HashMap<BTreeSet<ItemCore>, Vec<usize>> = HashMap::new();
    for (idx, items) in collection.item_sets.iter().enumerate() {
        core_groups.entry(core_of(items)).or_default().push(idx);
    }

    // Deterministic group ordering: by the smallest original state index.
    let mut groups: Vec<Vec<usize>> = core_groups.into_values().collect();
    groups.sort_by_key(|g| *g.iter().min().unwrap());

    let mut old_to_new: HashMap<usize, usize> = HashMap::new();
    let mut merged_sets: Vec<Items> = Vec::with_capacity(groups.len());
    let mut inadequacies = Vec::new();

    for (new_id, group) in groups.iter().enumerate() {
        let mut merged: Items = BTreeMap::new();
        for &old_idx in group {
            for (core, lookaheads) in &collection.item_sets[old_idx] {
                merged
                    .entry(core.clone())
                    .or_default()
                    .extend(lookaheads.iter().cloned());
            }
        }
        // Re-close on the merged lookaheads: any closure computed before
        // the merge is stale once lookaheads have been unioned in.
        let merged = closure(merged, &augmented, sets);

        let pre_merge_pairs: BTreeSet<(ItemCore, ItemCore, String)> = group
            .iter()
            .flat_map(|&idx| reduce_reduce_pairs(&collection.item_sets[idx], &augmented))
            .collect();
        let post_merge_pairs = reduce_reduce_pairs(&merged, &augmented);
        for (a, b, la) in post_merge_pairs.difference(&pre_merge_pairs) {
            inadequacies.push(LalrInadequate {
                state: new_id,
                items: vec![
                    format!("{}.{} on '{}'", a.production, a.alt_index, la),
                    format!("{}.{} on '{}'", b.production, b.alt_index, la),
                ],
            });
        }

        for &old_idx in group {
            old_to_new.insert(old_idx, new_id);
        }
        merged_sets.push(merged);
    }

    let mut transitions: HashMap<(usize, Symbol), usize> = HashMap::new();
    for ((old_from, symbol), old_to) in collection.transitions {
        let new_from = old_to_new[&old_from];
        let new_to = old_to_new[&old_to];
        transitions.insert((new_from, symbol), new_to);
    }

    let merged_collection = Collection {
        item_sets: merged_sets,
        transitions,
        start: old_to_new[&collection.start],
    };
    (merged_collection, inadequacies)
}
