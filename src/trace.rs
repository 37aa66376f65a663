//! Explicit trace context for the recursive tree walks.
//!
//! Each walk carries a `Trace` by value and calls `enter` when it descends a
//! level, so indentation follows the recursion without any shared state.

use std::fmt;

/// Trace records the depth of the current walk for indented trace logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Trace {
    depth: usize,
}

impl Trace {
    /// Creates a context at depth zero.
    pub fn new() -> Self {
        Trace { depth: 0 }
    }

    /// Returns a context one level deeper.
    pub fn enter(self) -> Trace {
        Trace {
            depth: self.depth + 1,
        }
    }

    /// Returns the current depth.
    pub fn depth(self) -> usize {
        self.depth
    }

    /// Emits a trace-level record indented by two spaces per level.
    pub fn log(self, args: fmt::Arguments<'_>) {
        if log::log_enabled!(log::Level::Trace) {
            log::trace!("{:width$}{}", "", args, width = self.depth * 2);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enter_is_scoped() {
        let root = Trace::new();
        let child = root.enter();
        assert_eq!(root.depth(), 0);
        assert_eq!(child.depth(), 1);
        assert_eq!(child.enter().depth(), 2);
        child.log(format_args!("visiting {}", "interfaces"));
    }
}
