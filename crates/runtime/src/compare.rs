//! Relational and identity functions: `< ≤ = ≥ > ≠ ≡ ∊`.

use apl_core::{Cell, CellOrdering, Value};

fn rel(a: &Cell, b: &Cell, ct: f64, f: impl Fn(CellOrdering) -> bool) -> Cell {
    Cell::Int(f(a.compare(b, ct)) as i64)
}

pub fn less_than(a: &Cell, b: &Cell, ct: f64) -> Cell {
    rel(a, b, ct, |o| o == CellOrdering::Less)
}

pub fn less_equal(a: &Cell, b: &Cell, ct: f64) -> Cell {
    rel(a, b, ct, |o| o != CellOrdering::Greater)
}

pub fn equal(a: &Cell, b: &Cell, ct: f64) -> Cell {
    rel(a, b, ct, |o| o == CellOrdering::Equal)
}

pub fn greater_equal(a: &Cell, b: &Cell, ct: f64) -> Cell {
    rel(a, b, ct, |o| o != CellOrdering::Less)
}

pub fn greater_than(a: &Cell, b: &Cell, ct: f64) -> Cell {
    rel(a, b, ct, |o| o == CellOrdering::Greater)
}

pub fn not_equal(a: &Cell, b: &Cell, ct: f64) -> Cell {
    rel(a, b, ct, |o| o != CellOrdering::Equal)
}

/// Dyadic `≡`: structural match, shape and every cell recursively, ignoring
/// how the two sides happen to be stored.
pub fn match_value(a: &Value, b: &Value, ct: f64) -> Value {
    Value::scalar_of(Cell::Int((a.compare(b, ct) == CellOrdering::Equal) as i64))
}

/// Monadic `≡`: nesting depth. A simple array is depth 1 (0 for an empty
/// array); a nested array is `1 + max(depth of its pointer elements)`.
pub fn depth(v: &Value) -> Value {
    fn go(v: &Value) -> i64 {
        if v.ravel().is_empty() {
            return 0;
        }
        let max_inner = v
            .ravel()
            .iter()
            .filter_map(|c| match c {
                Cell::Pointer(p) => Some(go(&p.value.borrow())),
                _ => None,
            })
            .max();
        match max_inner {
            Some(d) => 1 + d,
            None => 1,
        }
    }
    Value::scalar_of(Cell::Int(go(v)))
}

/// Dyadic `∊`: for each cell of `a`, 1 if it occurs (recursively, through
/// any depth of nesting) among `b`'s elements, else 0. Shape of `a`.
pub fn membership(a: &Value, b: &Value, ct: f64) -> Value {
    let found: Vec<Cell> = a
        .ravel()
        .iter()
        .map(|ca| {
            let wrapped = Value::scalar_of(ca.clone());
            let hit = b.ravel().iter().any(|cb| match cb {
                Cell::Pointer(p) => p.value.borrow().is_or_contains(&wrapped, ct),
                _ => Value::scalar_of(cb.clone()).compare(&wrapped, ct) == CellOrdering::Equal,
            });
            Cell::Int(hit as i64)
        })
        .collect();
    Value::new(a.shape().clone(), found).expect("shape preserved by construction")
}

/// Monadic `∊`: enlist — flatten every level of nesting into a simple
/// vector, left to right.
pub fn enlist(v: &Value) -> Value {
    fn go(v: &Value, out: &mut Vec<Cell>) {
        for c in v.ravel() {
            match c {
                Cell::Pointer(p) => go(&p.value.borrow(), out),
                other => out.push(other.clone()),
            }
        }
    }
    let mut out = Vec::new();
    go(v, &mut out);
    Value::vector_of(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use apl_core::cell::DEFAULT_CT;

    #[test]
    fn relational_ops_basic() {
        assert!(matches!(less_than(&Cell::Int(1), &Cell::Int(2), DEFAULT_CT), Cell::Int(1)));
        assert!(matches!(equal(&Cell::Int(2), &Cell::Int(2), DEFAULT_CT), Cell::Int(1)));
    }

    #[test]
    fn match_requires_same_shape_and_values() {
        let a = Value::vector_of(vec![Cell::Int(1), Cell::Int(2)]);
        let b = Value::vector_of(vec![Cell::Int(1), Cell::Int(2)]);
        let c = Value::scalar_of(Cell::Int(1));
        assert!(matches!(match_value(&a, &b, DEFAULT_CT).ravel()[0], Cell::Int(1)));
        assert!(matches!(match_value(&a, &c, DEFAULT_CT).ravel()[0], Cell::Int(0)));
    }

    #[test]
    fn enlist_flattens_nested_pointers() {
        use apl_core::Value as V;
        use std::cell::RefCell;
        use std::rc::Rc;
        let inner = Rc::new(RefCell::new(V::vector_of(vec![Cell::Int(9)])));
        let outer = V::new(
            apl_core::Shape::vector(2),
            vec![Cell::Int(1), V::pointer_cell(inner, None)],
        )
        .unwrap();
        let flat = enlist(&outer);
        assert_eq!(flat.ravel().len(), 2);
    }
}
