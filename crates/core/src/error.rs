//! Error taxonomy and diagnostics for the APL core.
//!
//! Primitives and structural checks return an [`ApError`] rather than
//! panicking; the reducer annotates it with a body PC range for caret
//! rendering (see `apl-runtime::diagnostics`).

use std::fmt;
use tracing::debug;

/// Error kinds (kinds only, not GNU APL's bit-exact diagnostic strings —
/// this interpreter does not aim to reproduce those).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Value,
    Valence,
    Rank,
    Length,
    Domain,
    Index,
    Axis,
    Syntax,
    LeftSyntax,
    Defn,
    SystemLimitRank,
    SystemLimitSiDepth,
    SystemLimitNameCount,
    SystemLimitRavelCount,
    Interrupt,
    UnbalancedParen,
    UnbalancedBracket,
    UnbalancedCurly,
    NotYetImplemented,
    ThisIsABug,
}

impl ErrorKind {
    /// Whether a paused SI frame can be resumed after this error
    ///.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            ErrorKind::Defn
                | ErrorKind::UnbalancedParen
                | ErrorKind::UnbalancedBracket
                | ErrorKind::UnbalancedCurly
                | ErrorKind::ThisIsABug
        )
    }

    /// The display name used on error line 1.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Value => "VALUE ERROR",
            ErrorKind::Valence => "VALENCE ERROR",
            ErrorKind::Rank => "RANK ERROR",
            ErrorKind::Length => "LENGTH ERROR",
            ErrorKind::Domain => "DOMAIN ERROR",
            ErrorKind::Index => "INDEX ERROR",
            ErrorKind::Axis => "AXIS ERROR",
            ErrorKind::Syntax => "SYNTAX ERROR",
            ErrorKind::LeftSyntax => "LEFT SYNTAX ERROR",
            ErrorKind::Defn => "DEFN ERROR",
            ErrorKind::SystemLimitRank => "SYSTEM LIMIT ERROR (rank)",
            ErrorKind::SystemLimitSiDepth => "SYSTEM LIMIT ERROR (SI depth)",
            ErrorKind::SystemLimitNameCount => "SYSTEM LIMIT ERROR (name count)",
            ErrorKind::SystemLimitRavelCount => "SYSTEM LIMIT ERROR (ravel count)",
            ErrorKind::Interrupt => "INTERRUPT",
            ErrorKind::UnbalancedParen => "UNBALANCED PAREN ERROR",
            ErrorKind::UnbalancedBracket => "UNBALANCED BRACKET ERROR",
            ErrorKind::UnbalancedCurly => "UNBALANCED CURLY ERROR",
            ErrorKind::NotYetImplemented => "NOT YET IMPLEMENTED",
            ErrorKind::ThisIsABug => "THIS IS A BUG",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A body program-counter range, inclusive, used for caret computation.
pub type PcRange = (usize, usize);

/// The error type threaded through the whole interpreter core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApError {
    pub kind: ErrorKind,
    /// PC range on the reversed body that was on the reducer stack when the
    /// error occurred; filled in by the reducer, not by the raising site.
    pub range: Option<PcRange>,
}

impl ApError {
    pub fn new(kind: ErrorKind) -> Self {
        debug!(%kind, "raising error");
        ApError { kind, range: None }
    }

    pub fn with_range(kind: ErrorKind, range: PcRange) -> Self {
        debug!(%kind, ?range, "raising error");
        ApError {
            kind,
            range: Some(range),
        }
    }

    pub fn with_range_into(mut self, range: PcRange) -> Self {
        self.range = Some(range);
        self
    }
}

impl fmt::Display for ApError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for ApError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defn_is_not_recoverable() {
        assert!(!ErrorKind::Defn.is_recoverable());
        assert!(ErrorKind::Value.is_recoverable());
    }

    #[test]
    fn display_matches_name() {
        let e = ApError::new(ErrorKind::Domain);
        assert_eq!(format!("{e}"), "DOMAIN ERROR");
    }
}
