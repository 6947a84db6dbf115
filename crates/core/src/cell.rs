//! Ravel cells: the tagged union of one array element.

use crate::value::Value;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::{Rc, Weak};

/// Default comparison tolerance used when a caller has none in scope
/// (tests, and any call site before `⎕CT` is read from the workspace).
pub const DEFAULT_CT: f64 = 1e-13;

/// A pointer cell: owns a strong reference to a nested [`Value`].
///
/// The weak `owner` back-link exists only so the outer value's aggregate
/// nested-element counters can be recomputed; it must never participate
/// in ownership (hence `Weak`, not `Rc`).
#[derive(Debug, Clone)]
pub struct PointerCell {
    pub value: Rc<RefCell<Value>>,
    pub owner: Weak<RefCell<Value>>,
}

/// A left-value cell: used transiently during selective assignment
/// (`(A[I])←B`). References one cell slot inside another value by index.
#[derive(Debug, Clone)]
pub struct LeftValueCell {
    pub owner: Weak<RefCell<Value>>,
    pub ravel_index: usize,
}

/// One ravel element.
#[derive(Debug, Clone)]
pub enum Cell {
    Char(char),
    Int(i64),
    Float(f64),
    Complex(f64, f64),
    Pointer(PointerCell),
    LeftValue(LeftValueCell),
    /// Placeholder state used only mid-construction; never observed by a
    /// completed [`Value`].
    None,
}

/// Ordering produced by tolerant comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellOrdering {
    Less,
    Equal,
    Greater,
}

impl Cell {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Cell::Int(_) | Cell::Float(_) | Cell::Complex(_, _))
    }

    pub fn is_char(&self) -> bool {
        matches!(self, Cell::Char(_))
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Cell::Pointer(_))
    }

    /// `init(other)`: deep-initialize from `other`.
    /// In Rust this is simply a clone — reference counting on nested
    /// `Value`s is handled by `Rc`'s own counter, not a manual one.
    pub fn init(other: &Cell) -> Cell {
        other.clone()
    }

    /// `release()`: drop nested references, returning the cell to `None`.
    pub fn release(&mut self) {
        *self = Cell::None;
    }

    /// Numeric magnitude as `f64`, for cells where that is meaningful.
    fn as_f64_pair(&self) -> Option<(f64, f64)> {
        match self {
            Cell::Int(i) => Some((*i as f64, 0.0)),
            Cell::Float(f) => Some((*f, 0.0)),
            Cell::Complex(re, im) => Some((*re, *im)),
            _ => None,
        }
    }

    /// Near-integer predicate: `|v - round(v)| ≤ ct*|v|`,
    /// and for Complex, imaginary part near-zero under the same tolerance.
    pub fn is_near_integer(&self, ct: f64) -> bool {
        match self {
            Cell::Int(_) => true,
            Cell::Float(f) => near_integer_scalar(*f, ct),
            Cell::Complex(re, im) => near_integer_scalar(*re, ct) && near_zero(*im, ct, re.abs()),
            _ => false,
        }
    }

    /// Numeric demotion after an arithmetic primitive:
    /// Complex with near-zero imag → Float; Float near-integer → Int;
    /// only when doing so preserves tolerant equality at the given `⎕CT`.
    pub fn demote(self, ct: f64) -> Cell {
        match self {
            Cell::Complex(re, im) if near_zero(im, ct, re.abs()) => Cell::Float(re).demote(ct),
            Cell::Float(f) if near_integer_scalar(f, ct) => Cell::Int(f.round() as i64),
            other => other,
        }
    }

    /// Tolerant comparison order: numeric tolerantly under
    /// `ct`; char lexicographically; mixing kinds uses class order
    /// Pointer > Numeric > Char. Nested (Pointer) cells compare recursively
    /// by rank, then shape, then ravel (delegated to `Value::compare`).
    pub fn compare(&self, other: &Cell, ct: f64) -> CellOrdering {
        let class = |c: &Cell| -> u8 {
            match c {
                Cell::Pointer(_) => 2,
                Cell::Int(_) | Cell::Float(_) | Cell::Complex(_, _) => 1,
                Cell::Char(_) => 0,
                Cell::LeftValue(_) | Cell::None => 0,
            }
        };
        let (ca, cb) = (class(self), class(other));
        if ca != cb {
            return if ca < cb {
                CellOrdering::Less
            } else {
                CellOrdering::Greater
            };
        }
        match (self, other) {
            (Cell::Char(a), Cell::Char(b)) => match a.cmp(b) {
                Ordering::Less => CellOrdering::Less,
                Ordering::Equal => CellOrdering::Equal,
                Ordering::Greater => CellOrdering::Greater,
            },
            (Cell::Pointer(a), Cell::Pointer(b)) => a.value.borrow().compare(&b.value.borrow(), ct),
            _ => {
                let (are, aim) = self.as_f64_pair().unwrap_or((0.0, 0.0));
                let (bre, bim) = other.as_f64_pair().unwrap_or((0.0, 0.0));
                if tolerant_eq(are, bre, ct) && tolerant_eq(aim, bim, ct) {
                    CellOrdering::Equal
                } else if (are, aim) < (bre, bim) {
                    CellOrdering::Less
                } else {
                    CellOrdering::Greater
                }
            }
        }
    }

    pub fn tolerant_eq(&self, other: &Cell, ct: f64) -> bool {
        self.compare(other, ct) == CellOrdering::Equal
    }
}

/// Tolerant scalar equality: `|a-b| <= ct * max(|a|,|b|)`.
pub fn tolerant_eq(a: f64, b: f64, ct: f64) -> bool {
    if a == b {
        return true;
    }
    let scale = a.abs().max(b.abs());
    (a - b).abs() <= ct * scale
}

fn near_zero(v: f64, ct: f64, scale: f64) -> bool {
    v.abs() <= ct * scale.max(v.abs())
}

pub(crate) fn near_integer_scalar(v: f64, ct: f64) -> bool {
    let r = v.round();
    (v - r).abs() <= ct * v.abs().max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn near_integer_respects_ct() {
        assert!(Cell::Float(3.0000000000001).is_near_integer(1e-9));
        assert!(!Cell::Float(3.1).is_near_integer(1e-13));
    }

    #[test]
    fn demote_complex_to_int() {
        let c = Cell::Complex(4.0, 1e-15);
        match c.demote(1e-13) {
            Cell::Int(4) => {}
            other => panic!("expected Int(4), got {other:?}"),
        }
    }

    #[test]
    fn char_never_equals_number() {
        let a = Cell::Char('A');
        let b = Cell::Int(65);
        assert_ne!(a.compare(&b, DEFAULT_CT), CellOrdering::Equal);
    }

    #[test]
    fn class_order_pointer_above_numeric_above_char() {
        let ptr = Cell::Pointer(PointerCell {
            value: Rc::new(RefCell::new(Value::scalar_of(Cell::Int(1)))),
            owner: Weak::new(),
        });
        assert_eq!(ptr.compare(&Cell::Int(1), DEFAULT_CT), CellOrdering::Greater);
        assert_eq!(Cell::Int(1).compare(&Cell::Char('a'), DEFAULT_CT), CellOrdering::Greater);
    }

    #[test]
    fn tolerant_equality_is_reflexive_symmetric() {
        let ct = 1e-9;
        assert!(tolerant_eq(1.0, 1.0 + 1e-12, ct));
        assert!(tolerant_eq(1.0 + 1e-12, 1.0, ct));
    }
}
