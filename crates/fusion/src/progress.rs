//! Progress reporting for the fusion pipeline
//!
//! The pipeline never prints. Callers pass a [`Progress`] implementation and
//! decide where checkpoint messages go.

/// Receives one message per pipeline checkpoint
pub trait Progress {
    fn emit(&self, message: &str);
}

/// Discards every message
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl Progress for Silent {
    fn emit(&self, _message: &str) {}
}

/// Forwards messages as `tracing` info events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl Progress for TracingProgress {
    fn emit(&self, message: &str) {
        tracing::info!(target: "rasterfuse::fusion", "{}", message);
    }
}

impl<F: Fn(&str)> Progress for F {
    fn emit(&self, message: &str) {
        self(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_closure_progress_collects() {
        let seen = RefCell::new(Vec::new());
        let sink = |m: &str| seen.borrow_mut().push(m.to_string());
        sink.emit("one");
        Progress::emit(&sink, "two");
        assert_eq!(*seen.borrow(), vec!["one", "two"]);
    }

    #[test]
    fn test_silent_and_tracing_do_not_panic() {
        Silent.emit("ignored");
        TracingProgress.emit("no subscriber installed");
    }
}
