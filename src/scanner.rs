//! External scanner interface: compiles an ordered list of named
//! patterns into a minimized DFA and runs maximal-munch tokenization over
//! it.
use crate::automata::{dfa, minimize};
use crate::error::{MalformedRegex, RuntimeError, ScannerError};
use crate::range_map::RangeMap;
use crate::regex::ast::{parse, RegexAst};

/// Selects subset construction's accepting-state mode. `multi_label = true`
/// keeps every source pattern
/// at each accepting DFA state until minimization collapses it to the
/// winning one; single-label mode (the default) resolves priority eagerly
/// during subset construction.
#[derive(Debug, Clone, Copy)]
pub struct ScannerOptions {
    pub multi_label: bool,
}

impl Default for ScannerOptions {
    fn default() -> Self {
        Self { multi_label: false }
    }
}

/// One token produced by [Scanner::tokenize]: `label` names the winning
/// pattern, `[start, end)` the matched byte range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub label: String,
    pub start: usize,
    pub end: usize,
}

/// A compiled scanner: a minimized DFA over a prioritized set of named
/// patterns, ready for maximal-munch tokenization.
pub struct Scanner {
    dfa: dfa::Dfa,
}

impl Scanner {
    /// Build a [Scanner] from an ordered `(name, pattern)` list — order is
    /// priority, earliest wins ties. Duplicate names are rejected.
    pub fn build<S: Into<String>>(
        patterns: Vec<(S, S)>,
    ) -> Result<Scanner, ScannerError> {
        Self::build_with_options(patterns, ScannerOptions::default())
    }

    pub fn build_with_options<S: Into<String>>(
        patterns: Vec<(S, S)>,
        options: ScannerOptions,
    ) -> Result<Scanner, ScannerError> {
        let patterns: Vec<(String, String)> = patterns
            .into_iter()
            .map(|(name, pattern)| (name.into(), pattern.into()))
            .collect();

        let mut seen = std::collections::HashSet::new();
        for (name, _) in &patterns {
            if !seen.insert(name.clone()) {
                return Err(ScannerError::DuplicateName(name.clone()));
            }
        }

        let asts: Vec<(String, RegexAst)> = patterns
            .iter()
            .map(|(name, pattern)| -> Result<(String, RegexAst), MalformedRegex> {
                Ok((name.clone(), parse(pattern)?))
            })
            .collect::<Result<_, _>>()?;

        let mut range_map = RangeMap::new();
        for (_, ast) in &asts {
            let mut intervals = Vec::new();
            ast.collect_intervals(&mut intervals);
            for (lo, hi) in intervals {
                range_map.insert(lo, hi);
            }
        }
        range_map.finalize();

        let refs: Vec<(String, &RegexAst)> =
            asts.iter().map(|(name, ast)| (name.clone(), ast)).collect();
        let nfa = crate::regex::nfa::build_group(&refs, range_map);
        let built = dfa::build(&nfa, options.multi_label);
        let minimal = minimize::minimize(&built)
            .expect("minimization of a well-formed scanner NFA never hits InconsistentPartition");

        Ok(Scanner { dfa: minimal })
    }

    pub fn start_state(&self) -> u32 {
        self.dfa.start_state()
    }

    pub fn step(&self, state: u32, code_point: u32) -> Option<u32> {
        self.dfa.step(state, code_point)
    }

    pub fn is_accepting(&self, state: u32) -> bool {
        self.dfa.is_accepting(state)
    }

    /// Maximal-munch tokenization: repeatedly advance while a transition
    /// exists, remembering the last accepting position; on rejection, emit
    /// a token for that position, reset, and continue. An input position
    /// that starts no valid pattern raises `UnrecognizedInput`.
    pub fn tokenize(&self, input: &[u8]) -> Result<Vec<Token>, RuntimeError> {
        let text = std::str::from_utf8(input)
            .map_err(|e| RuntimeError::UnrecognizedInput(e.valid_up_to()))?;
        let chars: Vec<(usize, char)> = text.char_indices().collect();

        let mut tokens = Vec::new();
        let mut i = 0usize;
        while i < chars.len() {
            let mut state = self.start_state();
            let mut j = i;
            let mut last_accept: Option<(usize, u32)> = None;
            if self.is_accepting(state) {
                last_accept = Some((chars[i].0, state));
            }
            while j < chars.len() {
                let (_, ch) = chars[j];
                match self.step(state, ch as u32) {
                    Some(next) => {
                        state = next;
                        j += 1;
                        if self.is_accepting(state) {
                            let end_byte = chars.get(j).map_or(text.len(), |&(b, _)| b);
                            last_accept = Some((end_byte, state));
                        }
                    }
                    None => break,
                }
            }

            match last_accept {
                Some((end_byte, accept_state)) => {
                    let label = self
                        .dfa
                        .accepting_label(accept_state)
                        .expect("last_accept only set at an accepting state")
                        .to_string();
                    let start_byte = chars[i].0;
                    tokens.push(Token {
                        label,
                        start: start_byte,
                        end: end_byte,
                    });
                    i = chars.partition_point(|&(b, _)| b < end_byte);
                }
                None => return Err(RuntimeError::UnrecognizedInput(chars[i].0)),
            }
        }
        Ok(tokens)
    }
}
