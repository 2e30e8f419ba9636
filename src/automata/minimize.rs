//! Hopcroft partition refinement: start from the coarse
//! partition grouping states by `(accepting?, label-or-label-set)`, then
//! repeatedly split blocks against a worklist of candidate splitters,
//! queuing the smaller half when a block wasn't already queued.
use std::collections::{HashSet, VecDeque};

use crate::automata::dfa::{Accept, Dfa, DfaState};
use crate::error::InternalError;
use crate::range_map::RangeMap;
use crate::util::{BuildLogger, Log};

#[derive(PartialEq, Eq, Hash, Clone)]
enum PartitionKey {
    NonAccepting,
    SingleLabel(u32),
    MultiLabel(Vec<u32>),
}

fn partition_key(accept: &Accept) -> PartitionKey {
    match accept {
        Accept::None => PartitionKey::NonAccepting,
        Accept::Single { label, .. } => PartitionKey::SingleLabel(*label),
        Accept::Multi(hits) => {
            let mut labels: Vec<u32> = hits.iter().map(|&(l, _)| l).collect();
            labels.sort_unstable();
            labels.dedup();
            PartitionKey::MultiLabel(labels)
        }
    }
}

fn lookup_transition(state: &DfaState, class_id: u32) -> Option<u32> {
    state
        .transitions
        .binary_search_by_key(&class_id, |&(c, _)| c)
        .ok()
        .map(|i| state.transitions[i].1)
}

/// Union the accepting hits of every state in a block into the block's
/// final `Accept`. In multi-label mode the winning (lowest-priority) label
/// across the whole block is kept, collapsing the set in a post-pass;
/// single-label mode blocks are homogeneous by construction of the initial
/// partition, so this is a no-op besides the representative pick.
fn accept_for_block(dfa: &Dfa, block: &[u32]) -> Accept {
    let mut hits: Vec<(u32, u32)> = Vec::new();
    for &s in block {
        match &dfa.states[s as usize].accept {
            Accept::None => {}
            Accept::Single { label, priority } => hits.push((*label, *priority)),
            Accept::Multi(h) => hits.extend_from_slice(h),
        }
    }
    if hits.is_empty() {
        return Accept::None;
    }
    let (label, priority) = *hits.iter().min_by_key(|&&(_, priority)| priority).unwrap();
    Accept::Single { label, priority }
}

pub fn minimize(dfa: &Dfa) -> Result<Dfa, InternalError> {
    minimize_logged(dfa, None)
}

pub fn minimize_logged(dfa: &Dfa, debug: Option<Log<&'static str>>) -> Result<Dfa, InternalError> {
    struct Logger(Option<Log<&'static str>>);
    impl BuildLogger for Logger {
        fn debug_label(&self) -> Option<&Log<&'static str>> {
            self.0.as_ref()
        }
    }
    let logger = Logger(debug);
    logger.log_enter("hopcroft_minimize");

    let n = dfa.states.len();
    let class_count = dfa.range_map.class_count();

    let mut grouped: std::collections::HashMap<PartitionKey, Vec<u32>> =
        std::collections::HashMap::new();
    for (id, state) in dfa.states.iter().enumerate() {
        grouped
            .entry(partition_key(&state.accept))
            .or_default()
            .push(id as u32);
    }
    let mut blocks: Vec<Vec<u32>> = grouped.into_values().collect();
    for block in &mut blocks {
        block.sort_unstable();
    }
    blocks.sort_by_key(|b| b[0]);

    let mut state_block: Vec<usize> = vec![0; n];
    for (block_id, block) in blocks.iter().enumerate() {
        for &s in block {
            state_block[s as usize] = block_id;
        }
    }

    let mut in_worklist: Vec<bool> = vec![false; blocks.len()];
    let mut worklist: VecDeque<usize> = VecDeque::new();
    let mut accepting_blocks: Vec<usize> = blocks
        .iter()
        .enumerate()
        .filter(|(_, b)| dfa.states[b[0] as usize].accept.is_accepting())
        .map(|(i, _)| i)
        .collect();
    accepting_blocks.sort_by_key(|&i| blocks[i].len());
    for i in accepting_blocks {
        worklist.push_back(i);
        in_worklist[i] = true;
    }

    while let Some(splitter_idx) = worklist.pop_front() {
        in_worklist[splitter_idx] = false;
        let splitter_set: HashSet<u32> = blocks[splitter_idx].iter().copied().collect();

        for class_id in 0..class_count {
            let preimage: HashSet<u32> = (0..n as u32)
                .filter(|&q| match lookup_transition(&dfa.states[q as usize], class_id) {
                    Some(t) => splitter_set.contains(&t),
                    None => false,
                })
                .collect();
            if preimage.is_empty() {
                continue;
            }

            let block_count_snapshot = blocks.len();
            for b in 0..block_count_snapshot {
                let (in_x, not_x): (Vec<u32>, Vec<u32>) =
                    blocks[b].iter().copied().partition(|s| preimage.contains(s));
                if in_x.is_empty() || not_x.is_empty() {
                    continue;
                }
                blocks[b] = not_x;
                for &s in &blocks[b] {
                    state_block[s as usize] = b;
                }
                let new_block_id = blocks.len();
                blocks.push(in_x);
                for &s in &blocks[new_block_id] {
                    state_block[s as usize] = new_block_id;
                }
                in_worklist.push(false);

                if in_worklist[b] {
                    if !in_worklist[new_block_id] {
                        worklist.push_back(new_block_id);
                        in_worklist[new_block_id] = true;
                    }
                } else if blocks[new_block_id].len() <= blocks[b].len() {
                    worklist.push_back(new_block_id);
                    in_worklist[new_block_id] = true;
                } else {
                    worklist.push_back(b);
                    in_worklist[b] = true;
                }
            }
        }
    }

    blocks.sort_by_key(|b| *b.iter().min().unwrap());
    // blocks were discovered in arbitrary split order; recompute
    // state_block against the now-sorted order for deterministic output ids.
    for (new_id, block) in blocks.iter().enumerate() {
        for &s in block {
            state_block[s as usize] = new_id;
        }
    }

    let mut new_states: Vec<DfaState> = Vec::with_capacity(blocks.len());
    for block in &blocks {
        let mut transitions: Vec<(u32, u32)> = Vec::new();
        for class_id in 0..class_count {
            let mut target_block: Option<usize> = None;
            for &s in block {
                let this_target = lookup_transition(&dfa.states[s as usize], class_id)
                    .map(|t| state_block[t as usize]);
                match (&target_block, this_target) {
                    (None, t) => target_block = t,
                    (Some(existing), Some(t)) if *existing != t => {
                        return Err(InternalError::new(format!(
                            "InconsistentPartition: block disagrees on target for class {}",
                            class_id
                        )));
                    }
                    _ => {}
                }
            }
            if let Some(target) = target_block {
                transitions.push((class_id, target as u32));
            }
        }
        new_states.push(DfaState {
            transitions,
            accept: accept_for_block(dfa, block),
        });
    }

    let new_start = state_block[dfa.start as usize] as u32;
    logger.log_result("hopcroft_minimize", new_states.len());

    Ok(Dfa {
        states: new_states,
        start: new_start,
        range_map: RangeMap::from_intervals(&dfa.range_map.intervals()),
        labels: dfa.labels.clone(),
        multi_label: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automata::dfa::build;
    use crate::range_map::RangeMap as RM;
    use crate::regex::ast::parse;
    use crate::regex::nfa::build_single;

    #[test]
    fn minimizes_a_b_c_to_two_states() {
        let ast = parse("a|b|c").unwrap();
        let mut range_map = RM::new();
        let mut intervals = Vec::new();
        ast.collect_intervals(&mut intervals);
        for (lo, hi) in intervals {
            range_map.insert(lo, hi);
        }
        range_map.finalize();
        let nfa = build_single(&ast, range_map, "abc");
        let dfa = build(&nfa, false);
        let minimal = minimize(&dfa).unwrap();
        assert_eq!(minimal.states.len(), 2);
        let mut transition_count = 0;
        for state in &minimal.states {
            transition_count += state.transitions.len();
        }
        assert_eq!(transition_count, 3);
    }

    #[test]
    fn minimizing_a_minimal_dfa_is_idempotent_up_to_renumbering() {
        let ast = parse("a|b|c").unwrap();
        let mut range_map = RM::new();
        let mut intervals = Vec::new();
        ast.collect_intervals(&mut intervals);
        for (lo, hi) in intervals {
            range_map.insert(lo, hi);
        }
        range_map.finalize();
        let nfa = build_single(&ast, range_map, "abc");
        let dfa = build(&nfa, false);
        let once = minimize(&dfa).unwrap();
        let twice = minimize(&once).unwrap();
        assert_eq!(once.states.len(), twice.states.len());
    }
}
