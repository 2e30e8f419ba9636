use std::fmt::{Debug, Display, Formatter};

use super::Log;

impl<T: Display> Display for Log<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Log::None => Ok(()),
            Log::Default(s) | Log::Success(s) | Log::Result(s) | Log::Verbose(s) => {
                write!(f, "{}", s)
            }
        }
    }
}

impl<T> Log<T> {
    /// Return the verbosity order of this log label, used to compare
    /// against a threshold (e.g. `self.order() >= Log::Success(()).order()`).
    pub fn order(&self) -> u8 {
        match self {
            Log::None => 0,
            Log::Default(_) => 1,
            Log::Success(_) => 2,
            Log::Result(_) => 3,
            Log::Verbose(_) => 4,
        }
    }
}

/// Implemented by every builder (range map, NFA, DFA, minimizer, canonical
/// collection) that wants phase-entry/result logging gated by a [Log] label.
pub trait BuildLogger {
    fn debug_label(&self) -> Option<&Log<&'static str>>;

    fn log_enter(&self, phase: &str) {
        #[cfg(debug_assertions)]
        if let Some(label) = self.debug_label() {
            if label.order() >= Log::Verbose(()).order() {
                println!("[{}] entering '{}'", label, phase);
            }
        }
    }

    fn log_success(&self, phase: &str, detail: impl Debug) {
        #[cfg(debug_assertions)]
        if let Some(label) = self.debug_label() {
            if label.order() >= Log::Success(()).order() {
                println!("[{}] '{}' succeeded: {:?}", label, phase, detail);
            }
        }
        #[cfg(not(debug_assertions))]
        let _ = (phase, detail);
    }

    fn log_result(&self, phase: &str, detail: impl Debug) {
        #[cfg(debug_assertions)]
        if let Some(label) = self.debug_label() {
            if label.order() >= Log::Result(()).order() {
                println!("[{}] '{}' result: {:?}", label, phase, detail);
            }
        }
        #[cfg(not(debug_assertions))]
        let _ = (phase, detail);
    }
}
