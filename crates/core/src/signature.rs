//! Function/operator call signatures: which of {Z, A, LO, FUN, RO, X, B} a
//! user function or lambda declares. `FUN` (the function itself) is
//! implicit; this struct tracks the rest.

use crate::token::Valence;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Signature {
    pub z: bool,
    pub a: bool,
    pub lo: bool,
    pub ro: bool,
    pub x: bool,
    pub b: bool,
}

impl Signature {
    pub fn is_operator(&self) -> bool {
        self.lo || self.ro
    }

    pub fn valence(&self) -> Valence {
        if self.a {
            Valence::Dyadic
        } else if self.b {
            Valence::Monadic
        } else {
            Valence::Ambivalent
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dyadic_when_left_arg_declared() {
        let sig = Signature {
            a: true,
            b: true,
            ..Default::default()
        };
        assert_eq!(sig.valence(), Valence::Dyadic);
    }

    #[test]
    fn operator_iff_lo_or_ro() {
        let sig = Signature {
            lo: true,
            ..Default::default()
        };
        assert!(sig.is_operator());
        assert!(!Signature::default().is_operator());
    }
}
