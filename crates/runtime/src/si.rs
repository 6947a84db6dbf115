//! One state-indicator frame: enough to answer `)SI` and to know whether a
//! propagating error should reach the host or be captured for
//! `⎕EA`/`⎕EC`-style guarded execution.
//!
//! Actual suspend/resume of a caller's reducer position is handled by plain
//! Rust call-stack recursion (`invoke_user` in [`crate::prefix`]) rather than
//! by manually saving and restoring a `Prefix` here — a frame only needs to
//! remember who it is and where it last reported being, not the means to
//! reconstruct itself from scratch.

use apl_core::ApError;

/// One level of function/operator activation (or the top-level immediate
/// frame).
#[derive(Debug, Clone)]
pub struct StateIndicator {
    pub name: String,
    pub line: usize,
    /// Set while evaluating inside `⎕EA`/`⎕EC`-style guarded execution:
    /// errors are captured here instead of propagating to the host display.
    pub safe_execution: bool,
    pub error: Option<ApError>,
}

impl StateIndicator {
    pub fn new(name: impl Into<String>) -> Self {
        StateIndicator {
            name: name.into(),
            line: 0,
            safe_execution: false,
            error: None,
        }
    }

    pub fn safe(mut self) -> Self {
        self.safe_execution = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_frame_has_no_error() {
        let frame = StateIndicator::new("FOO");
        assert!(frame.error.is_none());
        assert!(!frame.safe_execution);
    }
}
