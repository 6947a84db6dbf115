//! Rectangular arrays of cells.

use crate::cell::{Cell, CellOrdering, LeftValueCell, PointerCell};
use crate::error::{ApError, ErrorKind};
use crate::shape::Shape;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Shared, interior-mutable handle to a [`Value`]. Symbols, pointer cells,
/// and reducer intermediates all hold this instead of an owned `Value`
/// directly, so that sharing is explicit and copy-on-write is possible.
pub type ValueRef = Rc<RefCell<Value>>;

/// Per-value flags: assigned, marked-during-GC,
/// shared/constant, temp, complete. Plain bits rather than the `bitflags`
/// crate — four booleans do not warrant the dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValueFlags {
    pub bits: u8,
}

impl ValueFlags {
    pub const ASSIGNED: ValueFlags = ValueFlags { bits: 0b0000_0001 };
    pub const MARKED: ValueFlags = ValueFlags { bits: 0b0000_0010 };
    pub const SHARED: ValueFlags = ValueFlags { bits: 0b0000_0100 };
    pub const TEMP: ValueFlags = ValueFlags { bits: 0b0000_1000 };
    pub const COMPLETE: ValueFlags = ValueFlags { bits: 0b0001_0000 };

    pub const fn empty() -> Self {
        ValueFlags { bits: 0 }
    }
}

impl std::ops::BitOr for ValueFlags {
    type Output = ValueFlags;
    fn bitor(self, rhs: ValueFlags) -> ValueFlags {
        ValueFlags {
            bits: self.bits | rhs.bits,
        }
    }
}

/// A rectangular array: shape plus a ravel of exactly `max(1, Π shape)` cells.
#[derive(Debug, Clone)]
pub struct Value {
    shape: Shape,
    ravel: Vec<Cell>,
    flags: ValueFlags,
}

impl Value {
    /// Build and validate a value, per `check_value`'s post-construction
    /// contract: shape×ravel size consistency.
    pub fn new(shape: Shape, ravel: Vec<Cell>) -> Result<Value, ApError> {
        let v = Value {
            shape,
            ravel,
            flags: ValueFlags::COMPLETE,
        };
        v.check_value()?;
        Ok(v)
    }

    pub fn scalar_of(cell: Cell) -> Value {
        Value {
            shape: Shape::scalar(),
            ravel: vec![cell],
            flags: ValueFlags::COMPLETE,
        }
    }

    pub fn vector_of(cells: Vec<Cell>) -> Value {
        let len = cells.len();
        Value {
            shape: Shape::vector(len),
            ravel: cells,
            flags: ValueFlags::COMPLETE,
        }
    }

    /// `⍴` reshape: take cells from `source`'s ravel cyclically to fill the
    /// requested shape (scalar `source` is repeated; empty `source` with a
    /// non-empty target shape is a `DOMAIN` error — there is nothing to
    /// cycle from).
    pub fn reshape(shape: Shape, source: &Value) -> Result<Value, ApError> {
        let vol = shape.volume();
        if vol > 0 && source.ravel.is_empty() {
            return Err(ApError::new(ErrorKind::Domain));
        }
        let mut ravel = Vec::with_capacity(vol);
        if vol > 0 {
            for i in 0..vol {
                ravel.push(source.ravel[i % source.ravel.len()].clone());
            }
        }
        Value::new(shape, ravel)
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn ravel(&self) -> &[Cell] {
        &self.ravel
    }

    pub fn ravel_mut(&mut self) -> &mut [Cell] {
        &mut self.ravel
    }

    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    pub fn is_scalar(&self) -> bool {
        self.shape.is_scalar()
    }

    pub fn flags(&self) -> ValueFlags {
        self.flags
    }

    pub fn set_flag(&mut self, flag: ValueFlags, on: bool) {
        if on {
            self.flags.bits |= flag.bits;
        } else {
            self.flags.bits &= !flag.bits;
        }
    }

    pub fn has_flag(&self, flag: ValueFlags) -> bool {
        self.flags.bits & flag.bits != 0
    }

    /// `check_value()`: verifies shape×ravel size consistency, called after every value-producing operation.
    pub fn check_value(&self) -> Result<(), ApError> {
        // A scalar always has exactly one cell; otherwise ravel length is
        // the shape's volume (which may legitimately be zero).
        let want = if self.shape.is_scalar() { 1 } else { self.shape.volume() };
        if self.ravel.len() != want {
            return Err(ApError::new(ErrorKind::ThisIsABug));
        }
        Ok(())
    }

    /// `clone_if_shared()`: copy-on-write helper for a shared value handle.
    /// Returns a fresh, uniquely-owned `ValueRef` if `this` has other
    /// strong owners, otherwise returns `this` unchanged.
    pub fn clone_if_shared(this: &ValueRef) -> ValueRef {
        if Rc::strong_count(this) > 1 {
            Rc::new(RefCell::new(this.borrow().clone()))
        } else {
            Rc::clone(this)
        }
    }

    /// Produce a companion value of [`Cell::LeftValue`] cells pointing into
    /// `this`, one per ravel slot, used by
    /// selective assignment.
    pub fn get_cellrefs(this: &ValueRef) -> Value {
        let owner: Weak<RefCell<Value>> = Rc::downgrade(this);
        let len = this.borrow().ravel.len();
        let cells = (0..len)
            .map(|i| {
                Cell::LeftValue(LeftValueCell {
                    owner: owner.clone(),
                    ravel_index: i,
                })
            })
            .collect();
        Value {
            shape: this.borrow().shape.clone(),
            ravel: cells,
            flags: ValueFlags::COMPLETE,
        }
    }

    /// Wrap `this` in a pointer cell, recording the weak owner back-link.
    pub fn pointer_cell(inner: ValueRef, owner: Option<&ValueRef>) -> Cell {
        Cell::Pointer(PointerCell {
            value: inner,
            owner: owner.map(Rc::downgrade).unwrap_or_default(),
        })
    }

    /// Recursive containment test: does `self` equal, or
    /// (if nested) contain at any depth, `other`?
    pub fn is_or_contains(&self, other: &Value, ct: f64) -> bool {
        if self.compare(other, ct) == CellOrdering::Equal {
            return true;
        }
        self.ravel.iter().any(|c| {
            if let Cell::Pointer(p) = c {
                p.value.borrow().is_or_contains(other, ct)
            } else {
                false
            }
        })
    }

    /// `prototype()`: recursively zero out (numeric) / space out (char)
    /// every cell while preserving shape; used for
    /// empty-value printing and fill semantics.
    pub fn prototype(&self) -> Value {
        let ravel = self
            .ravel
            .iter()
            .map(|c| match c {
                Cell::Char(_) => Cell::Char(' '),
                Cell::Int(_) => Cell::Int(0),
                Cell::Float(_) => Cell::Float(0.0),
                Cell::Complex(_, _) => Cell::Complex(0.0, 0.0),
                Cell::Pointer(p) => {
                    let proto = p.value.borrow().prototype();
                    Cell::Pointer(PointerCell {
                        value: Rc::new(RefCell::new(proto)),
                        owner: Weak::new(),
                    })
                }
                other => other.clone(),
            })
            .collect();
        Value {
            shape: self.shape.clone(),
            ravel,
            flags: ValueFlags::COMPLETE,
        }
    }

    /// Whole-value tolerant comparison: nested by rank,
    /// then shape, then ravel (element-wise, short-circuiting on the first
    /// unequal element).
    pub fn compare(&self, other: &Value, ct: f64) -> CellOrdering {
        if self.rank() != other.rank() {
            return if self.rank() < other.rank() {
                CellOrdering::Less
            } else {
                CellOrdering::Greater
            };
        }
        if self.shape != other.shape {
            return if self.shape.volume() < other.shape.volume() {
                CellOrdering::Less
            } else {
                CellOrdering::Greater
            };
        }
        for (a, b) in self.ravel.iter().zip(other.ravel.iter()) {
            let c = a.compare(b, ct);
            if c != CellOrdering::Equal {
                return c;
            }
        }
        CellOrdering::Equal
    }

    pub fn tolerant_eq(&self, other: &Value, ct: f64) -> bool {
        self.compare(other, ct) == CellOrdering::Equal
    }

    /// True iff at least one ravel cell is a pointer cell (nested value,
    /// per the Glossary).
    pub fn is_nested(&self) -> bool {
        self.ravel.iter().any(Cell::is_pointer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::DEFAULT_CT;

    #[test]
    fn shape_ravel_invariant_holds() {
        let v = Value::vector_of(vec![Cell::Int(1), Cell::Int(2), Cell::Int(3)]);
        assert!(v.check_value().is_ok());
        assert_eq!(v.ravel().len(), 3);
    }

    #[test]
    fn reshape_cycles_source() {
        let src = Value::vector_of(vec![Cell::Int(1), Cell::Int(2)]);
        let out = Value::reshape(Shape::vector(5), &src).unwrap();
        let got: Vec<i64> = out
            .ravel()
            .iter()
            .map(|c| match c {
                Cell::Int(i) => *i,
                _ => panic!(),
            })
            .collect();
        assert_eq!(got, vec![1, 2, 1, 2, 1]);
    }

    #[test]
    fn reshape_empty_source_nonempty_target_is_domain_error() {
        let src = Value::vector_of(vec![]);
        assert!(Value::reshape(Shape::vector(3), &src).is_err());
    }

    #[test]
    fn clone_if_shared_copies_only_when_shared() {
        let v = Rc::new(RefCell::new(Value::scalar_of(Cell::Int(1))));
        let unique = Value::clone_if_shared(&v);
        assert!(Rc::ptr_eq(&v, &unique));

        let _second_owner = Rc::clone(&v);
        let copy = Value::clone_if_shared(&v);
        assert!(!Rc::ptr_eq(&v, &copy));
    }

    #[test]
    fn prototype_zeroes_preserving_shape() {
        let v = Value::vector_of(vec![Cell::Int(7), Cell::Char('x')]);
        let p = v.prototype();
        assert_eq!(p.shape(), v.shape());
        match &p.ravel()[0] {
            Cell::Int(0) => {}
            other => panic!("{other:?}"),
        }
        match &p.ravel()[1] {
            Cell::Char(' ') => {}
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn compare_ranks_before_shapes() {
        let scalar = Value::scalar_of(Cell::Int(1));
        let vector = Value::vector_of(vec![Cell::Int(1)]);
        assert_ne!(scalar.compare(&vector, DEFAULT_CT), CellOrdering::Equal);
    }
}
