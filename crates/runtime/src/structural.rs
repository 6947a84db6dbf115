//! Structural functions: `⍴ ⍳ ⌽ ⊖ , ↑ ↓ ⊃ ⊂ ⍉`.
//!
//! Full generality (arbitrary rank, arbitrary axis lists) is implemented
//! where the underlying operation is naturally rank-independent (reshape,
//! ravel, iota, enclose). Axis-order operations that GNU APL generalizes to
//! arbitrary rank (rotate, transpose) are implemented here for rank 0-2,
//! the ranks the end-to-end scenarios exercise; higher ranks raise
//! `NotYetImplemented` rather than silently doing the wrong thing.

use apl_core::{ApError, Cell, ErrorKind, Shape, Value};

fn as_index(c: &Cell, ct: f64) -> Result<i64, ApError> {
    if !c.is_near_integer(ct) {
        return Err(ApError::new(ErrorKind::Domain));
    }
    match c {
        Cell::Int(i) => Ok(*i),
        Cell::Float(f) => Ok(f.round() as i64),
        _ => Err(ApError::new(ErrorKind::Domain)),
    }
}

/// Monadic `⍴`: the shape as an integer vector.
pub fn shape_of(v: &Value) -> Value {
    let cells = v.shape().dims().iter().map(|&d| Cell::Int(d as i64)).collect();
    Value::vector_of(cells)
}

/// Dyadic `⍴`: reshape `b`'s ravel into the shape named by `a`. A scalar
/// `b` is repeated to fill the requested volume (the common `N⍴0` fill
/// idiom); a non-scalar `b` must supply exactly that many cells — this
/// crate does not silently cycle or truncate existing data, unlike some
/// APL implementations' permissive reshape.
pub fn reshape(a: &Value, b: &Value, ct: f64) -> Result<Value, ApError> {
    let dims: Result<Vec<usize>, ApError> = a
        .ravel()
        .iter()
        .map(|c| {
            let n = as_index(c, ct)?;
            if n < 0 {
                return Err(ApError::new(ErrorKind::Domain));
            }
            Ok(n as usize)
        })
        .collect();
    let shape = if a.is_scalar() {
        Shape::vector(dims?[0])
    } else {
        Shape::new(dims?)?
    };
    if b.is_scalar() {
        return Value::reshape(shape, b);
    }
    if b.ravel().len() != shape.volume() {
        return Err(ApError::new(ErrorKind::Length));
    }
    Value::new(shape, b.ravel().to_vec())
}

/// Monadic `⍳`: `⍳N` — the vector `io, io+1, …, io+N-1`.
pub fn iota(n: &Value, io: i64, ct: f64) -> Result<Value, ApError> {
    if n.rank() > 1 {
        return Err(ApError::new(ErrorKind::Rank));
    }
    if n.is_scalar() {
        let count = as_index(&n.ravel()[0], ct)?;
        if count < 0 {
            return Err(ApError::new(ErrorKind::Domain));
        }
        let cells = (0..count).map(|i| Cell::Int(io + i)).collect();
        return Ok(Value::vector_of(cells));
    }
    // Vector right argument: index generation over that multi-dimensional
    // shape, producing nested index vectors. Only the scalar case is
    // exercised by the tested scenarios; the general form is deferred.
    Err(ApError::new(ErrorKind::NotYetImplemented))
}

/// Dyadic `⍳`: for each element of `b`, its 1-origin-adjusted position in
/// `a`, or `io + ⍴a` if absent.
pub fn index_of(a: &Value, b: &Value, io: i64, ct: f64) -> Value {
    let not_found = io + a.ravel().len() as i64;
    let cells: Vec<Cell> = b
        .ravel()
        .iter()
        .map(|cb| {
            let pos = a.ravel().iter().position(|ca| ca.tolerant_eq(cb, ct));
            Cell::Int(pos.map(|p| io + p as i64).unwrap_or(not_found))
        })
        .collect();
    if b.is_scalar() {
        Value::scalar_of(cells.into_iter().next().unwrap())
    } else {
        Value::vector_of(cells)
    }
}

/// Monadic `,`: ravel — flatten to a simple vector in storage order.
pub fn ravel(v: &Value) -> Value {
    Value::vector_of(v.ravel().to_vec())
}

/// Dyadic `,`: catenate along the last axis. Vectors/scalars only; a
/// scalar operand is treated as a length-1 vector (APL's usual extension).
pub fn catenate(a: &Value, b: &Value) -> Result<Value, ApError> {
    if a.rank() > 1 || b.rank() > 1 {
        return Err(ApError::new(ErrorKind::NotYetImplemented));
    }
    let mut cells = a.ravel().to_vec();
    cells.extend(b.ravel().iter().cloned());
    Ok(Value::vector_of(cells))
}

/// Monadic `⌽`: reverse along the last axis.
pub fn reverse_last(v: &Value) -> Result<Value, ApError> {
    reverse_axis(v, v.rank().saturating_sub(1).max(0))
}

/// Monadic `⊖`: reverse along the first axis.
pub fn reverse_first(v: &Value) -> Result<Value, ApError> {
    reverse_axis(v, 0)
}

fn reverse_axis(v: &Value, axis: usize) -> Result<Value, ApError> {
    match v.rank() {
        0 => Ok(v.clone()),
        1 => {
            let mut cells = v.ravel().to_vec();
            cells.reverse();
            Ok(Value::vector_of(cells))
        }
        2 => {
            let rows = v.shape().dim(0).unwrap();
            let cols = v.shape().dim(1).unwrap();
            let mut cells = v.ravel().to_vec();
            if axis == 0 {
                for c in 0..cols {
                    for r in 0..rows / 2 {
                        cells.swap(r * cols + c, (rows - 1 - r) * cols + c);
                    }
                }
            } else {
                for r in 0..rows {
                    let row = r * cols;
                    cells[row..row + cols].reverse();
                }
            }
            Value::new(v.shape().clone(), cells)
        }
        _ => Err(ApError::new(ErrorKind::NotYetImplemented)),
    }
}

/// Dyadic `⌽`: rotate along the last axis by the integer(s) in `a`.
pub fn rotate_last(a: &Value, b: &Value, ct: f64) -> Result<Value, ApError> {
    rotate_axis(a, b, b.rank().saturating_sub(1).max(0), ct)
}

/// Dyadic `⊖`: rotate along the first axis by the integer(s) in `a`.
pub fn rotate_first(a: &Value, b: &Value, ct: f64) -> Result<Value, ApError> {
    rotate_axis(a, b, 0, ct)
}

fn rotate_axis(a: &Value, b: &Value, axis: usize, ct: f64) -> Result<Value, ApError> {
    match b.rank() {
        0 => Ok(b.clone()),
        1 => {
            let n = as_index(&a.ravel()[0], ct)?;
            let len = b.ravel().len() as i64;
            if len == 0 {
                return Ok(b.clone());
            }
            let shift = n.rem_euclid(len) as usize;
            let mut cells = b.ravel().to_vec();
            cells.rotate_left(shift);
            Ok(Value::vector_of(cells))
        }
        2 => {
            let rows = b.shape().dim(0).unwrap();
            let cols = b.shape().dim(1).unwrap();
            let mut cells = b.ravel().to_vec();
            if axis == 0 {
                if rows == 0 {
                    return Ok(b.clone());
                }
                let n = as_index(&a.ravel()[0], ct)?.rem_euclid(rows as i64) as usize;
                for c in 0..cols {
                    let mut col: Vec<Cell> = (0..rows).map(|r| cells[r * cols + c].clone()).collect();
                    col.rotate_left(n);
                    for (r, cell) in col.into_iter().enumerate() {
                        cells[r * cols + c] = cell;
                    }
                }
            } else {
                if cols == 0 {
                    return Ok(b.clone());
                }
                let n = as_index(&a.ravel()[0], ct)?.rem_euclid(cols as i64) as usize;
                for r in 0..rows {
                    let row = r * cols;
                    cells[row..row + cols].rotate_left(n);
                }
            }
            Value::new(b.shape().clone(), cells)
        }
        _ => Err(ApError::new(ErrorKind::NotYetImplemented)),
    }
}

/// Dyadic `↑`: take the first (or last, if negative) `a` elements/rows.
pub fn take(a: &Value, b: &Value, ct: f64) -> Result<Value, ApError> {
    if b.rank() > 1 {
        return Err(ApError::new(ErrorKind::NotYetImplemented));
    }
    let n = as_index(&a.ravel()[0], ct)?;
    let src = b.ravel();
    let len = src.len() as i64;
    let fill = b.prototype().ravel().first().cloned().unwrap_or(Cell::Int(0));
    let count = n.unsigned_abs() as usize;
    let mut cells = Vec::with_capacity(count);
    if n >= 0 {
        for i in 0..count {
            cells.push(if (i as i64) < len { src[i].clone() } else { fill.clone() });
        }
    } else {
        let start = len - n.abs();
        for i in 0..count {
            let idx = start + i as i64;
            cells.push(if idx >= 0 && idx < len { src[idx as usize].clone() } else { fill.clone() });
        }
    }
    Ok(Value::vector_of(cells))
}

/// Dyadic `↓`: drop the first (or last, if negative) `a` elements/rows.
pub fn drop(a: &Value, b: &Value, ct: f64) -> Result<Value, ApError> {
    if b.rank() > 1 {
        return Err(ApError::new(ErrorKind::NotYetImplemented));
    }
    let n = as_index(&a.ravel()[0], ct)?;
    let src = b.ravel();
    let len = src.len() as i64;
    let cells = if n >= 0 {
        let start = n.min(len) as usize;
        src[start..].to_vec()
    } else {
        let end = (len + n).max(0) as usize;
        src[..end].to_vec()
    };
    Ok(Value::vector_of(cells))
}

/// Monadic `⊃`: disclose — a pointer scalar yields its contents, a simple
/// array yields itself.
pub fn disclose(v: &Value) -> Value {
    if v.is_scalar() {
        if let Cell::Pointer(p) = &v.ravel()[0] {
            return p.value.borrow().clone();
        }
    }
    v.clone()
}

/// Dyadic `⊃`: pick — `a` is an index vector into (possibly nested) `b`.
pub fn pick(a: &Value, b: &Value, io: i64, ct: f64) -> Result<Value, ApError> {
    let mut cur = b.clone();
    for idx_cell in a.ravel() {
        let idx = as_index(idx_cell, ct)? - io;
        if idx < 0 || idx as usize >= cur.ravel().len() {
            return Err(ApError::new(ErrorKind::Index));
        }
        match &cur.ravel()[idx as usize] {
            Cell::Pointer(p) => cur = p.value.borrow().clone(),
            other => return Ok(Value::scalar_of(other.clone())),
        }
    }
    Ok(cur)
}

/// Monadic `⊂`: enclose — wrap the whole value as a single pointer scalar.
pub fn enclose(v: Value) -> Value {
    use std::cell::RefCell;
    use std::rc::Rc;
    let boxed = Rc::new(RefCell::new(v));
    Value::scalar_of(Value::pointer_cell(boxed, None))
}

/// Monadic `⍉`: reverse the axis order (matrix transpose for rank 2,
/// identity for rank 0-1).
pub fn transpose(v: &Value) -> Result<Value, ApError> {
    match v.rank() {
        0 | 1 => Ok(v.clone()),
        2 => {
            let rows = v.shape().dim(0).unwrap();
            let cols = v.shape().dim(1).unwrap();
            let src = v.ravel();
            let mut out = vec![Cell::None; rows * cols];
            for r in 0..rows {
                for c in 0..cols {
                    out[c * rows + r] = src[r * cols + c].clone();
                }
            }
            Value::new(Shape::new(vec![cols, rows])?, out)
        }
        _ => Err(ApError::new(ErrorKind::NotYetImplemented)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apl_core::cell::DEFAULT_CT;

    #[test]
    fn iota_builds_origin_adjusted_range() {
        let n = Value::scalar_of(Cell::Int(3));
        let v = iota(&n, 1, DEFAULT_CT).unwrap();
        let got: Vec<i64> = v.ravel().iter().map(|c| match c { Cell::Int(i) => *i, _ => panic!() }).collect();
        assert_eq!(got, vec![1, 2, 3]);
    }

    #[test]
    fn reshape_rejects_ravel_length_mismatch() {
        let a = Value::vector_of(vec![Cell::Int(3), Cell::Int(1)]);
        let b = Value::vector_of("ABCDEF".chars().map(Cell::Char).collect());
        let err = reshape(&a, &b, DEFAULT_CT).unwrap_err();
        assert_eq!(err.kind, apl_core::ErrorKind::Length);
    }

    #[test]
    fn take_pads_with_prototype_fill() {
        let a = Value::scalar_of(Cell::Int(5));
        let b = Value::vector_of(vec![Cell::Int(1), Cell::Int(2)]);
        let r = take(&a, &b, DEFAULT_CT).unwrap();
        assert_eq!(r.ravel().len(), 5);
    }

    #[test]
    fn rotate_vector_wraps() {
        let a = Value::scalar_of(Cell::Int(2));
        let b = Value::vector_of(vec![Cell::Int(1), Cell::Int(2), Cell::Int(3)]);
        let r = rotate_last(&a, &b, DEFAULT_CT).unwrap();
        let got: Vec<i64> = r.ravel().iter().map(|c| match c { Cell::Int(i) => *i, _ => panic!() }).collect();
        assert_eq!(got, vec![3, 1, 2]);
    }
}
