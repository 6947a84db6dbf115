//! Derived functions for the operator set `/ ⌿ \ ⍀ ¨`: reduce, scan, and
//! each, along the last (`/ \`) or first (`⌿ ⍀`) axis.
//!
//! Every operand call goes through an injected closure rather than a direct
//! call into [`crate::prefix`], so this module does not need to know how a
//! `User`/`Derived` operand is invoked (pushing an SI frame, running the
//! reducer to completion) — `prefix.rs` supplies that closure when it
//! applies a derived function.

use apl_core::{ApError, Cell, ErrorKind, Shape, Value};

pub type Apply<'a> = dyn FnMut(&Value, Option<&Value>) -> Result<Value, ApError> + 'a;

fn major_cells(v: &Value, axis: usize) -> Result<(Vec<Value>, Shape), ApError> {
    match v.rank() {
        0 => Ok((vec![v.clone()], Shape::scalar())),
        1 => {
            let cells: Vec<Value> = v.ravel().iter().map(|c| Value::scalar_of(c.clone())).collect();
            Ok((cells, Shape::scalar()))
        }
        2 => {
            let rows = v.shape().dim(0).unwrap();
            let cols = v.shape().dim(1).unwrap();
            let src = v.ravel();
            if axis == 1 {
                let mut out = Vec::with_capacity(rows);
                for r in 0..rows {
                    let slice = src[r * cols..(r + 1) * cols].to_vec();
                    out.push(Value::vector_of(slice));
                }
                Ok((out, Shape::vector(rows)))
            } else {
                let mut out = Vec::with_capacity(cols);
                for c in 0..cols {
                    let slice: Vec<Cell> = (0..rows).map(|r| src[r * cols + c].clone()).collect();
                    out.push(Value::vector_of(slice));
                }
                Ok((out, Shape::vector(cols)))
            }
        }
        _ => Err(ApError::new(ErrorKind::NotYetImplemented)),
    }
}

/// `F/B` or `F⌿B`: fold the operand dyadically, right to left, over the
/// major cells along the given axis (`last_axis: true` for `/`, `false` for
/// `⌿`). An empty axis yields the operand's identity is not modeled here —
/// callers on an empty axis get a `LENGTH` error, matching the absence of
/// an implemented identity-element table.
pub fn reduce(apply: &mut Apply, v: &Value, last_axis: bool) -> Result<Value, ApError> {
    let axis = if last_axis { v.rank().saturating_sub(1) } else { 0 };
    let (cells, _) = major_cells(v, axis)?;
    let mut iter = cells.into_iter().rev();
    let mut acc = match iter.next() {
        Some(c) => c,
        None => return Err(ApError::new(ErrorKind::Length)),
    };
    for next in iter {
        acc = apply(&next, Some(&acc))?;
    }
    Ok(acc)
}

/// `F\B` or `F⍀B`: scan — the vector of every prefix reduction, in source
/// order.
pub fn scan(apply: &mut Apply, v: &Value, last_axis: bool) -> Result<Value, ApError> {
    let axis = if last_axis { v.rank().saturating_sub(1) } else { 0 };
    let (cells, _) = major_cells(v, axis)?;
    let mut partials = Vec::with_capacity(cells.len());
    let mut acc: Option<Value> = None;
    for cell in cells {
        acc = Some(match acc {
            None => cell,
            Some(prev) => apply(&cell, Some(&prev))?,
        });
        partials.push(acc.clone().unwrap());
    }
    let ravel: Vec<Cell> = partials
        .into_iter()
        .map(|v| {
            if v.is_scalar() {
                v.ravel()[0].clone()
            } else {
                Value::pointer_cell(std::rc::Rc::new(std::cell::RefCell::new(v)), None)
            }
        })
        .collect();
    Ok(Value::vector_of(ravel))
}

/// `F¨B` (monadic) or `A F¨B` (dyadic): apply the operand to each element,
/// scalar extension kicking in on the dyadic side exactly as it would for a
/// primitive.
pub fn each_monadic(apply: &mut Apply, v: &Value) -> Result<Value, ApError> {
    let mut out = Vec::with_capacity(v.ravel().len());
    for c in v.ravel() {
        let r = apply(&Value::scalar_of(c.clone()), None)?;
        out.push(wrap_result(r));
    }
    Value::new(v.shape().clone(), out)
}

pub fn each_dyadic(apply: &mut Apply, a: &Value, b: &Value) -> Result<Value, ApError> {
    match (a.is_scalar(), b.is_scalar()) {
        (false, false) => {
            if a.shape() != b.shape() {
                return Err(ApError::new(ErrorKind::Length));
            }
            let mut out = Vec::with_capacity(a.ravel().len());
            for (ca, cb) in a.ravel().iter().zip(b.ravel().iter()) {
                let r = apply(&Value::scalar_of(cb.clone()), Some(&Value::scalar_of(ca.clone())))?;
                out.push(wrap_result(r));
            }
            Value::new(a.shape().clone(), out)
        }
        (true, false) => {
            let mut out = Vec::with_capacity(b.ravel().len());
            for cb in b.ravel() {
                let r = apply(&Value::scalar_of(cb.clone()), Some(a))?;
                out.push(wrap_result(r));
            }
            Value::new(b.shape().clone(), out)
        }
        (false, true) => {
            let mut out = Vec::with_capacity(a.ravel().len());
            for ca in a.ravel() {
                let r = apply(b, Some(&Value::scalar_of(ca.clone())))?;
                out.push(wrap_result(r));
            }
            Value::new(a.shape().clone(), out)
        }
        (true, true) => {
            let r = apply(b, Some(a))?;
            Ok(Value::scalar_of(wrap_result(r)))
        }
    }
}

fn wrap_result(v: Value) -> Cell {
    if v.is_scalar() {
        v.ravel()[0].clone()
    } else {
        Value::pointer_cell(std::rc::Rc::new(std::cell::RefCell::new(v)), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduce_sums_right_to_left() {
        let v = Value::vector_of(vec![Cell::Int(1), Cell::Int(2), Cell::Int(3)]);
        let mut add = |b: &Value, a: Option<&Value>| -> Result<Value, ApError> {
            let a = a.unwrap();
            let (Cell::Int(x), Cell::Int(y)) = (&a.ravel()[0], &b.ravel()[0]) else { panic!() };
            Ok(Value::scalar_of(Cell::Int(x + y)))
        };
        let r = reduce(&mut add, &v, true).unwrap();
        match r.ravel()[0] {
            Cell::Int(6) => {}
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn each_monadic_preserves_shape() {
        let v = Value::vector_of(vec![Cell::Int(1), Cell::Int(2)]);
        let mut neg = |b: &Value, _a: Option<&Value>| -> Result<Value, ApError> {
            let Cell::Int(x) = &b.ravel()[0] else { panic!() };
            Ok(Value::scalar_of(Cell::Int(-x)))
        };
        let r = each_monadic(&mut neg, &v).unwrap();
        assert_eq!(r.shape(), v.shape());
    }
}
