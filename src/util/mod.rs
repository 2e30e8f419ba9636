//! Small ambient utilities shared by every builder in the crate: source
//! position tracking and the leveled debug logger used by the regex, DFA,
//! and LR builders.
mod code;
mod logger;
mod position;

pub use logger::BuildLogger;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
/// A 1-indexed line/column position within a source buffer.
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// A wrapper around a source buffer with lazily-computed line break offsets,
/// used to translate byte offsets into [Position]s for error reporting.
pub struct Code<'c> {
    pub value: &'c [u8],
    line_breaks: once_cell::unsync::OnceCell<Vec<usize>>,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
/// An ordered debug-verbosity label attached to a builder (range map, NFA,
/// DFA, canonical collection, ...). Only consulted under `debug_assertions`.
pub enum Log<T> {
    None,
    Default(T),
    Success(T),
    Result(T),
    Verbose(T),
}
