//! Thompson-style ε-NFA construction over a shared, already-finalized
//! [RangeMap] alphabet. Fragments are combined with ε-edges per
//! Thompson's classic construction; `+` is built as `x x*` and `?` adds only
//! the bypass ε-edge.
use crate::range_map::RangeMap;
use crate::regex::ast::RegexAst;

/// An NFA state: nodes carry `(accept?, label, priority)`; edges are keyed
/// by `(state, symbol)` where symbol is either a class id or ε, mapping to
/// a *set* of destinations (Thompson fragments are nondeterministic by
/// construction). Modeled as an arena (`Vec<NfaState>`) indexed by `u32`
/// state id rather than by-reference cycles, per the crate's design note on
/// cyclic graphs.
#[derive(Debug, Clone, Default)]
pub struct NfaState {
    /// `(label index into Nfa::labels, priority = declaration order)` if
    /// this state accepts.
    pub accept: Option<(u32, u32)>,
    pub epsilon: Vec<u32>,
    /// `(class_id, target)` pairs; Thompson fragments never need more than
    /// one entry per class id, but the shape stays a multimap.
    pub transitions: Vec<(u32, u32)>,
}

/// An ε-NFA over a shared class-id alphabet, built from one or more named
/// patterns joined under a common start state.
pub struct Nfa {
    pub states: Vec<NfaState>,
    pub start: u32,
    pub range_map: RangeMap,
    /// Pattern names in declaration order; `accept.0` indexes into this.
    pub labels: Vec<String>,
}

struct Fragment {
    start: u32,
    accept: u32,
}

struct Builder<'m> {
    states: Vec<NfaState>,
    range_map: &'m RangeMap,
}

impl<'m> Builder<'m> {
    fn new(range_map: &'m RangeMap) -> Self {
        Self {
            states: Vec::new(),
            range_map,
        }
    }

    fn new_state(&mut self) -> u32 {
        self.states.push(NfaState::default());
        (self.states.len() - 1) as u32
    }

    fn add_epsilon(&mut self, from: u32, to: u32) {
        self.states[from as usize].epsilon.push(to);
    }

    fn add_transition(&mut self, from: u32, class_id: u32, to: u32) {
        self.states[from as usize].transitions.push((class_id, to));
    }

    /// Resolve a class spec (a possibly-negated set of raw intervals) to
    /// the concrete, disjoint class ids of the shared range map it covers.
    /// Since every raw boundary was inserted into the range map before
    /// finalization, each requested `[lo, hi)` is a union of whole,
    /// finalized class intervals — so this walks the sorted interval list
    /// rather than probing code point by code point.
    fn class_ids(&self, ranges: &[(u32, u32)], negated: bool) -> Vec<u32> {
        let finalized = self.range_map.intervals();
        let mut covered = Vec::new();
        for &(lo, hi) in ranges {
            for &(interval_lo, interval_hi, class_id) in &finalized {
                if interval_lo >= hi {
                    break;
                }
                if interval_hi > lo && interval_lo < hi && !covered.contains(&class_id) {
                    covered.push(class_id);
                }
            }
        }
        if negated {
            let all: Vec<u32> = self
                .range_map
                .intervals()
                .iter()
                .map(|(_, _, id)| *id)
                .collect();
            all.into_iter().filter(|id| !covered.contains(id)).collect()
        } else {
            covered
        }
    }

    fn build(&mut self, ast: &RegexAst) -> Fragment {
        match ast {
            RegexAst::Class(spec) => {
                let start = self.new_state();
                let accept = self.new_state();
                for class_id in self.class_ids(&spec.ranges, spec.negated) {
                    self.add_transition(start, class_id, accept);
                }
                Fragment { start, accept }
            }
            RegexAst::Concat(a, b) => {
                let fa = self.build(a);
                let fb = self.build(b);
                self.add_epsilon(fa.accept, fb.start);
                Fragment {
                    start: fa.start,
                    accept: fb.accept,
                }
            }
            RegexAst::Union(a, b) => {
                let fa = self.build(a);
                let fb = self.build(b);
                let start = self.new_state();
                let accept = self.new_state();
                self.add_epsilon(start, fa.start);
                self.add_epsilon(start, fb.start);
                self.add_epsilon(fa.accept, accept);
                self.add_epsilon(fb.accept, accept);
                Fragment { start, accept }
            }
            RegexAst::Star(a) => {
                let fa = self.build(a);
                let start = self.new_state();
                let accept = self.new_state();
                self.add_epsilon(start, fa.start);
                self.add_epsilon(start, accept);
                self.add_epsilon(fa.accept, fa.start);
                self.add_epsilon(fa.accept, accept);
                Fragment { start, accept }
            }
            RegexAst::Plus(a) => {
                // x+ = x x*
                let fa = self.build(a);
                let loop_start = self.new_state();
                let accept = self.new_state();
                self.add_epsilon(fa.accept, loop_start);
                self.add_epsilon(loop_start, fa.start);
                self.add_epsilon(loop_start, accept);
                // re-entry: looping back through fa again needs a second
                // epsilon from fa's accept, already wired above via
                // loop_start -> fa.start; fa.accept -> loop_start closes it.
                Fragment {
                    start: fa.start,
                    accept,
                }
            }
            RegexAst::Question(a) => {
                let fa = self.build(a);
                let start = self.new_state();
                let accept = self.new_state();
                self.add_epsilon(start, fa.start);
                self.add_epsilon(start, accept);
                self.add_epsilon(fa.accept, accept);
                Fragment { start, accept }
            }
        }
    }
}

/// Build an NFA for a single pattern (no named-group joining).
pub fn build_single(ast: &RegexAst, range_map: RangeMap, label: &str) -> Nfa {
    build_group(&[(label.to_string(), ast)], range_map)
}

/// Build an NFA joining several named patterns under one shared start
/// state, each accepting state tagged `(label, priority = declaration
/// order)`, used by [crate::scanner].
pub fn build_group(patterns: &[(String, &RegexAst)], range_map: RangeMap) -> Nfa {
    let mut builder = Builder::new(&range_map);
    let join_start = builder.new_state();
    let mut labels = Vec::with_capacity(patterns.len());

    for (priority, (name, ast)) in patterns.iter().enumerate() {
        let fragment = builder.build(ast);
        builder.add_epsilon(join_start, fragment.start);
        let label_index = labels.len() as u32;
        labels.push(name.clone());
        builder.states[fragment.accept as usize].accept = Some((label_index, priority as u32));
    }

    Nfa {
        states: builder.states,
        start: join_start,
        range_map,
        labels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regex::ast::parse;

    fn range_map_for(patterns: &[&str]) -> (RangeMap, Vec<RegexAst>) {
        let mut range_map = RangeMap::new();
        let asts: Vec<RegexAst> = patterns.iter().map(|p| parse(p).unwrap()).collect();
        for ast in &asts {
            let mut intervals = Vec::new();
            ast.collect_intervals(&mut intervals);
            for (lo, hi) in intervals {
                range_map.insert(lo, hi);
            }
        }
        range_map.finalize();
        (range_map, asts)
    }

    #[test]
    fn single_pattern_has_one_label() {
        let (range_map, asts) = range_map_for(&["a|b|c"]);
        let nfa = build_single(&asts[0], range_map, "letters");
        assert_eq!(nfa.labels, vec!["letters".to_string()]);
        assert!(nfa
            .states
            .iter()
            .any(|s| matches!(s.accept, Some((0, 0)))));
    }

    #[test]
    fn group_preserves_declaration_priority() {
        let (range_map, asts) = range_map_for(&["if|else", "[a-z]+"]);
        let refs: Vec<(String, &RegexAst)> = vec![
            ("KEYWORD".to_string(), &asts[0]),
            ("ID".to_string(), &asts[1]),
        ];
        let nfa = build_group(&refs, range_map);
        let priorities: Vec<u32> = nfa
            .states
            .iter()
            .filter_map(|s| s.accept.map(|(_, p)| p))
            .collect();
        assert!(priorities.contains(&0));
        assert!(priorities.contains(&1));
    }
}
