//! `grammake` is a toolkit for building lexical scanners and LR parsers by
//! compiling declarative specifications — regular expressions and
//! context-free grammars — into tables and automata, rather than by writing
//! recursive-descent code by hand.
//!
//! # Overview
//!
//! Three compilers share a common pipeline:
//!
//! - [regex] parses a regular expression surface syntax into Thompson NFA
//!   fragments over a shared [range_map] alphabet, which [automata] then
//!   determinizes (subset construction) and minimizes (Hopcroft's
//!   algorithm) into a [automata::dfa::Dfa]. [scanner] wraps one or more
//!   named patterns into a [scanner::Scanner] that performs maximal-munch
//!   tokenization.
//! - [grammar] and [lr] take a context-free grammar and build a canonical
//!   LR(1) or core-merged LALR(1) [lr::table::Table] of shift/reduce/goto
//!   actions.
//! - [optimizer] takes a basic block of three-address-code quadruples and
//!   applies local common-subexpression elimination, constant folding, and
//!   dead-store removal over a per-block DAG.
//!
//! [rd] is a secondary, non-authoritative recursive-descent oracle used to
//! sanity-check small grammars against a second implementation strategy; it
//! shares no tables with [lr].
//!
//! # Example
//!
//! Building a scanner and taking a single step:
//! ```
//! use grammake::scanner::Scanner;
//!
//! let scanner = Scanner::build(vec![
//!     ("ident", r"[a-zA-Z_][a-zA-Z0-9_]*"),
//!     ("number", r"[0-9]+"),
//!     ("space", r"[ \t]+"),
//! ])
//! .unwrap();
//!
//! let tokens = scanner.tokenize(b"x1 42").unwrap();
//! assert_eq!(tokens.len(), 3);
//! ```
//!
//! # License
//! [grammake](crate) is provided under the MIT license. See
//! [LICENSE](https://github.com/creative-forest/grammake/blob/main/LICENSE).

pub mod automata;
pub mod error;
pub mod grammar;
pub mod lr;
pub mod optimizer;
pub mod range_map;
pub mod rd;
pub mod regex;
pub mod scanner;
mod util;

pub use util::{Code, Log, Position};
