//! Structured error types for every phase of the generator, each a plain
//! struct or enum with a hand-rolled `Display` impl (no `thiserror`).
use std::fmt::{Display, Formatter};

/// Failure to parse a regex pattern string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedRegex {
    pub position: usize,
    pub reason: String,
}

impl MalformedRegex {
    pub fn new(position: usize, reason: impl Into<String>) -> Self {
        Self {
            position,
            reason: reason.into(),
        }
    }
}

impl Display for MalformedRegex {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MalformedRegex: {} at byte {}",
            self.reason, self.position
        )
    }
}
impl std::error::Error for MalformedRegex {}

/// Errors rejecting the scanner generator's input list of `(name, pattern)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScannerError {
    DuplicateName(String),
    Pattern(MalformedRegex),
}

impl Display for ScannerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ScannerError::DuplicateName(name) => {
                write!(f, "ScannerError: duplicate pattern name '{}'", name)
            }
            ScannerError::Pattern(err) => write!(f, "ScannerError: {}", err),
        }
    }
}
impl std::error::Error for ScannerError {}
impl From<MalformedRegex> for ScannerError {
    fn from(err: MalformedRegex) -> Self {
        ScannerError::Pattern(err)
    }
}

/// Grammar-input validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    DuplicateNonTerminal(String),
    UndefinedNonTerminal(String),
    UndefinedStartSymbol,
    NameCollision(String),
}

impl Display for GrammarError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GrammarError::DuplicateNonTerminal(name) => {
                write!(f, "GrammarError: duplicate non-terminal '{}'", name)
            }
            GrammarError::UndefinedNonTerminal(name) => {
                write!(f, "GrammarError: undefined non-terminal '{}'", name)
            }
            GrammarError::UndefinedStartSymbol => write!(
                f,
                "GrammarError: start symbol is not a declared non-terminal"
            ),
            GrammarError::NameCollision(name) => write!(
                f,
                "GrammarError: '{}' is declared as both a terminal and a non-terminal",
                name
            ),
        }
    }
}
impl std::error::Error for GrammarError {}

/// A single shift/reduce or reduce/reduce conflict recorded while building
/// the action/goto table. The table is still returned with a
/// default resolution (shift over reduce, earliest rule over later) chosen;
/// this record lets the caller decide whether to treat it as fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarConflict {
    pub state: usize,
    pub lookahead: String,
    pub choices: Vec<String>,
}

impl Display for GrammarConflict {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "GrammarConflict: state {} on lookahead '{}' between {:?}",
            self.state, self.lookahead, self.choices
        )
    }
}
impl std::error::Error for GrammarConflict {}

/// A reduce/reduce conflict introduced by LALR core-merging that was not
/// present in the LR(1) canonical collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LalrInadequate {
    pub state: usize,
    pub items: Vec<String>,
}

impl Display for LalrInadequate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "LalrInadequate: merged state {} introduced a new reduce/reduce conflict among {:?}",
            self.state, self.items
        )
    }
}
impl std::error::Error for LalrInadequate {}

/// Errors surfaced while building action/goto tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    Conflict(GrammarConflict),
    LalrInadequate(LalrInadequate),
}

impl Display for TableError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TableError::Conflict(c) => Display::fmt(c, f),
            TableError::LalrInadequate(l) => Display::fmt(l, f),
        }
    }
}
impl std::error::Error for TableError {}

/// Errors raised by a *generated* recognizer at run time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    UnrecognizedInput(usize),
    UnexpectedToken {
        position: usize,
        expected: Vec<String>,
    },
}

impl Display for RuntimeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeError::UnrecognizedInput(pos) => {
                write!(f, "UnrecognizedInput at byte {}", pos)
            }
            RuntimeError::UnexpectedToken { position, expected } => write!(
                f,
                "UnexpectedToken at byte {}, expected one of {:?}",
                position, expected
            ),
        }
    }
}
impl std::error::Error for RuntimeError {}

/// An internal invariant violation. Reserved for implementation bugs; never
/// raised in response to user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternalError {
    pub message: String,
}

impl InternalError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for InternalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "InternalError: {}", self.message)
    }
}
impl std::error::Error for InternalError {}
