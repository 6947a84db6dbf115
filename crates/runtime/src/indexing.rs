//! Applying an `IndexExpr` to a `Value`: indexed read, indexed assignment,
//! and selective assignment through `Value::get_cellrefs`'s `LeftValue`
//! cells.
//!
//! A single-axis index list (`A[I]`) indexes the flattened ravel directly,
//! regardless of `A`'s rank — the common vector case, and the fallback
//! "linear indexing" mode for everything else. A full per-axis list
//! (`A[I;J;…]`, one slot per dimension) indexes axis by axis; an elided
//! slot keeps that whole axis, and a scalar slot on an axis drops it from
//! the result shape, same as GNU APL.

use apl_core::{ApError, Cell, ErrorKind, IndexExpr, Shape, Value, ValueRef};

fn to_idx(c: &Cell, io: i64, ct: f64) -> Result<usize, ApError> {
    if !c.is_near_integer(ct) {
        return Err(ApError::new(ErrorKind::Domain));
    }
    let n = match c {
        Cell::Int(i) => *i,
        Cell::Float(f) => f.round() as i64,
        _ => return Err(ApError::new(ErrorKind::Domain)),
    };
    Ok((n - io) as usize)
}

fn strides_of(dims: &[usize]) -> Vec<usize> {
    let mut strides = vec![1usize; dims.len()];
    for i in (0..dims.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * dims[i + 1];
    }
    strides
}

fn cartesian(axis_indices: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let mut result = vec![Vec::new()];
    for idxs in axis_indices {
        let mut next = Vec::with_capacity(result.len() * idxs.len().max(1));
        for combo in &result {
            for &i in idxs {
                let mut c = combo.clone();
                c.push(i);
                next.push(c);
            }
        }
        result = next;
    }
    result
}

/// Resolve `idx` against `shape` to the flat ravel positions it selects, in
/// the same order `read`/`assign` consume them, plus the result shape a
/// read would produce (scalar collapse included).
fn resolve(shape: &Shape, idx: &IndexExpr, io: i64, ct: f64) -> Result<(Vec<usize>, Shape), ApError> {
    idx.check_range(shape, io, ct)?;

    if idx.rank() == 1 {
        return match &idx.axes[0] {
            None => {
                let all: Vec<usize> = (0..shape.volume().max(1)).collect();
                Ok((all, shape.clone()))
            }
            Some(list) => {
                let indices: Vec<usize> = list
                    .ravel()
                    .iter()
                    .map(|c| to_idx(c, io, ct))
                    .collect::<Result<_, _>>()?;
                let out_shape = if list.is_scalar() {
                    Shape::scalar()
                } else {
                    Shape::vector(indices.len())
                };
                Ok((indices, out_shape))
            }
        };
    }

    let dims = shape.dims();
    let strides = strides_of(dims);
    let mut axis_indices: Vec<Vec<usize>> = Vec::with_capacity(dims.len());
    let mut out_dims: Vec<usize> = Vec::new();
    for (axis, slot) in idx.axes.iter().enumerate() {
        match slot {
            None => {
                let len = dims[axis];
                axis_indices.push((0..len).collect());
                out_dims.push(len);
            }
            Some(v) => {
                let ids: Vec<usize> = v
                    .ravel()
                    .iter()
                    .map(|c| to_idx(c, io, ct))
                    .collect::<Result<_, _>>()?;
                if !v.is_scalar() {
                    out_dims.push(ids.len());
                }
                axis_indices.push(ids);
            }
        }
    }

    let combos = cartesian(&axis_indices);
    let linear: Vec<usize> = combos
        .into_iter()
        .map(|combo| combo.iter().zip(&strides).map(|(i, s)| i * s).sum())
        .collect();
    let out_shape = Shape::new(out_dims)?;
    Ok((linear, out_shape))
}

/// Indexed read: `B[I;J;…]`.
pub fn read(v: &Value, idx: &IndexExpr, io: i64, ct: f64) -> Result<Value, ApError> {
    let (linear, out_shape) = resolve(v.shape(), idx, io, ct)?;
    let cells: Vec<Cell> = linear.into_iter().map(|i| v.ravel()[i].clone()).collect();
    Value::new(out_shape, cells)
}

/// Indexed assignment: `B[I;J;…] ← new_value`, with scalar extension if
/// `new_value` is a scalar.
pub fn assign(target: &ValueRef, idx: &IndexExpr, new_value: &Value, io: i64, ct: f64) -> Result<(), ApError> {
    let shape = target.borrow().shape().clone();
    let (linear, _) = resolve(&shape, idx, io, ct)?;
    if !new_value.is_scalar() && new_value.ravel().len() != linear.len() {
        return Err(ApError::new(ErrorKind::Length));
    }
    let mut v = target.borrow_mut();
    for (k, li) in linear.into_iter().enumerate() {
        let cell = if new_value.is_scalar() {
            new_value.ravel()[0].clone()
        } else {
            new_value.ravel()[k].clone()
        };
        v.ravel_mut()[li] = cell;
    }
    Ok(())
}

/// Selective assignment through a value of `Cell::LeftValue` refs produced
/// by `Value::get_cellrefs`: the `(A[I])←B` family, plus the bare-variable
/// case `(A)←B`. A fully general re-evaluated selector expression such as
/// `(⍴A)←B` is not supported — `eval_selector` only ever produces a selector
/// for a plain or indexed symbol, anything else fails as `LeftSyntax`.
pub fn assign_through_left_values(selector: &Value, new_value: &Value) -> Result<(), ApError> {
    let n = selector.ravel().len();
    if !new_value.is_scalar() && new_value.ravel().len() != n {
        return Err(ApError::new(ErrorKind::Length));
    }
    for (k, cell) in selector.ravel().iter().enumerate() {
        let Cell::LeftValue(lv) = cell else {
            return Err(ApError::new(ErrorKind::Domain));
        };
        let owner = lv
            .owner
            .upgrade()
            .ok_or_else(|| ApError::new(ErrorKind::ThisIsABug))?;
        let value_cell = if new_value.is_scalar() {
            new_value.ravel()[0].clone()
        } else {
            new_value.ravel()[k].clone()
        };
        owner.borrow_mut().ravel_mut()[lv.ravel_index] = value_cell;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use apl_core::cell::DEFAULT_CT;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn vector_index_read_and_assign() {
        let target: ValueRef = Rc::new(RefCell::new(Value::vector_of(vec![
            Cell::Int(1),
            Cell::Int(2),
            Cell::Int(3),
        ])));
        let idx = IndexExpr::single(Value::scalar_of(Cell::Int(2)));
        assign(&target, &idx, &Value::scalar_of(Cell::Int(99)), 1, DEFAULT_CT).unwrap();
        let got: Vec<i64> = target
            .borrow()
            .ravel()
            .iter()
            .map(|c| match c {
                Cell::Int(i) => *i,
                _ => panic!(),
            })
            .collect();
        assert_eq!(got, vec![1, 99, 3]);
    }

    #[test]
    fn matrix_row_select_drops_row_axis() {
        let v = Value::new(
            Shape::new(vec![2, 2]).unwrap(),
            vec![Cell::Int(1), Cell::Int(2), Cell::Int(3), Cell::Int(4)],
        )
        .unwrap();
        let idx = IndexExpr::new(vec![Some(Value::scalar_of(Cell::Int(2))), None]);
        let row = read(&v, &idx, 1, DEFAULT_CT).unwrap();
        assert_eq!(row.shape(), &Shape::vector(2));
    }

    #[test]
    fn selective_assignment_through_cellrefs() {
        let target: ValueRef = Rc::new(RefCell::new(Value::vector_of(vec![
            Cell::Int(1),
            Cell::Int(2),
        ])));
        let selector = Value::get_cellrefs(&target);
        assign_through_left_values(&selector, &Value::vector_of(vec![Cell::Int(7), Cell::Int(8)]))
            .unwrap();
        let got: Vec<i64> = target
            .borrow()
            .ravel()
            .iter()
            .map(|c| match c {
                Cell::Int(i) => *i,
                _ => panic!(),
            })
            .collect();
        assert_eq!(got, vec![7, 8]);
    }
}
