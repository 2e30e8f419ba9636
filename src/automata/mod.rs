//! DFA construction and minimization: subset construction over an
//! [crate::regex::Nfa], then Hopcroft partition refinement into the minimal
//! DFA.
pub mod dfa;
pub mod minimize;

pub use dfa::{Accept, Dfa, DfaState};
pub use minimize::minimize;
