//! `Workspace`: the evaluation context shared across every SI frame — the
//! symbol table, the `⎕`-configuration, and the attention source the reducer
//! consults but never owns directly.

use crate::attention::{default_attention, AttentionSource};
use crate::quad::Quad;
use crate::si::StateIndicator;
use apl_core::{ApError, ErrorKind, SymbolTable};
use std::sync::Arc;
use tracing::trace;

pub struct Workspace {
    pub symtab: SymbolTable,
    pub quad: Quad,
    si_stack: Vec<StateIndicator>,
    pub attention: Arc<dyn AttentionSource>,
}

impl Workspace {
    pub fn new() -> Self {
        Workspace {
            symtab: SymbolTable::new(),
            quad: Quad::default(),
            si_stack: Vec::new(),
            attention: default_attention(),
        }
    }

    pub fn with_quad(mut self, quad: Quad) -> Self {
        self.quad = quad;
        self
    }

    pub fn si_depth(&self) -> usize {
        self.si_stack.len()
    }

    pub fn push_si(&mut self, frame: StateIndicator) -> Result<(), ApError> {
        if self.si_stack.len() >= self.quad.si_depth_limit {
            return Err(ApError::new(ErrorKind::SystemLimitSiDepth));
        }
        trace!(name = %frame.name, depth = self.si_stack.len() + 1, "push_si");
        self.si_stack.push(frame);
        Ok(())
    }

    pub fn pop_si(&mut self) -> Option<StateIndicator> {
        let frame = self.si_stack.pop();
        if let Some(f) = &frame {
            trace!(name = %f.name, depth = self.si_stack.len(), "pop_si");
        }
        frame
    }

    pub fn si_stack(&self) -> &[StateIndicator] {
        &self.si_stack
    }

    pub fn top_si_mut(&mut self) -> Option<&mut StateIndicator> {
        self.si_stack.last_mut()
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Workspace::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_workspace_has_no_si_frames() {
        let ws = Workspace::new();
        assert_eq!(ws.si_depth(), 0);
    }
}
