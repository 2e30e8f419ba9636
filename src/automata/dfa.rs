//! Subset construction: NFA → DFA. DFA states are the
//! ε-closures of reachable NFA-state subsets, explored with a worklist and
//! deduplicated by their sorted content so construction is deterministic in
//! input order.
use std::collections::HashMap;

use crate::range_map::RangeMap;
use crate::regex::nfa::Nfa;
use crate::util::{BuildLogger, Log};

/// What an accepting [DfaState] carries. In single-label mode only the
/// highest-priority (lowest index) source label survives subset
/// construction; in multi-label mode every source label is kept, deferring
/// priority resolution to minimization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accept {
    None,
    Single {
        label: u32,
        priority: u32,
    },
    Multi(Vec<(u32, u32)>),
}

impl Accept {
    pub fn is_accepting(&self) -> bool {
        !matches!(self, Accept::None)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DfaState {
    /// `(class_id, target)`, sorted by class id; at most one entry per
    /// class id (deterministic, unlike the source NFA).
    pub transitions: Vec<(u32, u32)>,
    pub accept: Accept,
}

/// A deterministic finite automaton sharing its source NFA's class-id
/// alphabet and range map. Modeled as an arena (`Vec<DfaState>`)
/// indexed by `u32` state id.
pub struct Dfa {
    pub states: Vec<DfaState>,
    pub start: u32,
    pub range_map: RangeMap,
    pub labels: Vec<String>,
    pub multi_label: bool,
}

fn epsilon_closure(nfa: &Nfa, seeds: &[u32]) -> Vec<u32> {
    let mut stack: Vec<u32> = seeds.to_vec();
    let mut closure: Vec<u32> = Vec::new();
    while let Some(state) = stack.pop() {
        if closure.contains(&state) {
            continue;
        }
        closure.push(state);
        for &next in &nfa.states[state as usize].epsilon {
            if !closure.contains(&next) {
                stack.push(next);
            }
        }
    }
    closure.sort_unstable();
    closure
}

fn accept_for(nfa: &Nfa, subset: &[u32], multi_label: bool) -> Accept {
    let mut hits: Vec<(u32, u32)> = subset
        .iter()
        .filter_map(|&s| nfa.states[s as usize].accept)
        .collect();
    if hits.is_empty() {
        return Accept::None;
    }
    if multi_label {
        hits.sort_unstable_by_key(|&(_, priority)| priority);
        Accept::Multi(hits)
    } else {
        let (label, priority) = *hits.iter().min_by_key(|&&(_, priority)| priority).unwrap();
        Accept::Single { label, priority }
    }
}

/// Build a DFA from an NFA by subset construction. `multi_label` selects
/// whether accepting states keep every source label (deferred priority
/// resolution at minimization time) or only the single highest-priority
/// one.
pub fn build(nfa: &Nfa, multi_label: bool) -> Dfa {
    build_logged(nfa, multi_label, None)
}

pub fn build_logged(nfa: &Nfa, multi_label: bool, debug: Option<Log<&'static str>>) -> Dfa {
    struct Logger(Option<Log<&'static str>>);
    impl BuildLogger for Logger {
        fn debug_label(&self) -> Option<&Log<&'static str>> {
            self.0.as_ref()
        }
    }
    let logger = Logger(debug);
    logger.log_enter("subset_construction");

    let class_count = nfa.range_map.class_count();
    let mut subset_to_state: HashMap<Vec<u32>, u32> = HashMap::new();
    let mut states: Vec<DfaState> = Vec::new();
    let mut worklist: Vec<(u32, Vec<u32>)> = Vec::new();

    let start_subset = epsilon_closure(nfa, &[nfa.start]);
    let start_id = 0u32;
    subset_to_state.insert(start_subset.clone(), start_id);
    states.push(DfaState::default());
    worklist.push((start_id, start_subset));

    while let Some((state_id, subset)) = worklist.pop() {
        let mut transitions: Vec<(u32, u32)> = Vec::new();
        for class_id in 0..class_count {
            let mut move_image: Vec<u32> = Vec::new();
            for &s in &subset {
                for &(edge_class, target) in &nfa.states[s as usize].transitions {
                    if edge_class == class_id && !move_image.contains(&target) {
                        move_image.push(target);
                    }
                }
            }
            if move_image.is_empty() {
                continue;
            }
            let closure = epsilon_closure(nfa, &move_image);
            let target_id = *subset_to_state.entry(closure.clone()).or_insert_with(|| {
                let id = states.len() as u32;
                states.push(DfaState::default());
                worklist.push((id, closure.clone()));
                id
            });
            transitions.push((class_id, target_id));
        }
        transitions.sort_unstable_by_key(|&(class_id, _)| class_id);
        states[state_id as usize].transitions = transitions;
        states[state_id as usize].accept = accept_for(nfa, &subset, multi_label);
    }

    logger.log_result("subset_construction", states.len());

    Dfa {
        states,
        start: start_id,
        range_map: clone_range_map(&nfa.range_map),
        labels: nfa.labels.clone(),
        multi_label,
    }
}

/// [RangeMap] has no `Clone` derive (an AVL tree of `Box`es); round-trip
/// through the persisted interval form instead, which is exactly the
/// public contract a DFA needs once built.
fn clone_range_map(range_map: &RangeMap) -> RangeMap {
    RangeMap::from_intervals(&range_map.intervals())
}

impl Dfa {
    pub fn start_state(&self) -> u32 {
        self.start
    }

    pub fn step(&self, state: u32, code_point: u32) -> Option<u32> {
        let class_id = self.range_map.search(code_point)?;
        let transitions = &self.states[state as usize].transitions;
        transitions
            .binary_search_by_key(&class_id, |&(c, _)| c)
            .ok()
            .map(|i| transitions[i].1)
    }

    pub fn is_accepting(&self, state: u32) -> bool {
        self.states[state as usize].accept.is_accepting()
    }

    /// The label of the (highest-priority, in multi-label mode) winning
    /// pattern at an accepting state, if any.
    pub fn accepting_label(&self, state: u32) -> Option<&str> {
        match &self.states[state as usize].accept {
            Accept::None => None,
            Accept::Single { label, .. } => self.labels.get(*label as usize).map(|s| s.as_str()),
            Accept::Multi(hits) => hits
                .iter()
                .min_by_key(|&&(_, priority)| priority)
                .and_then(|&(label, _)| self.labels.get(label as usize))
                .map(|s| s.as_str()),
        }
    }

    /// Serialize to a sparse transition-table form suitable for external
    /// storage: one entry per reachable state, listing only its non-dead
    /// transitions.
    pub fn to_sparse_table(&self) -> Vec<(u32, Vec<(u32, u32)>, Accept)> {
        self.states
            .iter()
            .enumerate()
            .map(|(id, s)| (id as u32, s.transitions.clone(), s.accept.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range_map::RangeMap;
    use crate::regex::ast::parse;
    use crate::regex::nfa::build_single;

    fn build_dfa(pattern: &str) -> Dfa {
        let ast = parse(pattern).unwrap();
        let mut range_map = RangeMap::new();
        let mut intervals = Vec::new();
        ast.collect_intervals(&mut intervals);
        for (lo, hi) in intervals {
            range_map.insert(lo, hi);
        }
        range_map.finalize();
        let nfa = build_single(&ast, range_map, "pat");
        build(&nfa, false)
    }

    #[test]
    fn accepts_every_alternative() {
        let dfa = build_dfa("a|b|c");
        for ch in ['a', 'b', 'c'] {
            let mut state = dfa.start_state();
            state = dfa.step(state, ch as u32).unwrap();
            assert!(dfa.is_accepting(state));
        }
        assert!(dfa.step(dfa.start_state(), 'd' as u32).is_none());
    }
}
