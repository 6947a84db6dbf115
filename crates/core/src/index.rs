//! `[…;…;…]` index lists.

use crate::cell::{near_integer_scalar, Cell};
use crate::error::{ApError, ErrorKind};
use crate::shape::Shape;
use crate::value::Value;

/// One `[…;…;…]` index expression: one slot per axis, `None` meaning
/// elided (all of that axis).
#[derive(Debug, Clone, Default)]
pub struct IndexExpr {
    pub axes: Vec<Option<Value>>,
}

impl IndexExpr {
    pub fn new(axes: Vec<Option<Value>>) -> Self {
        IndexExpr { axes }
    }

    pub fn single(v: Value) -> Self {
        IndexExpr { axes: vec![Some(v)] }
    }

    pub fn rank(&self) -> usize {
        self.axes.len()
    }

    /// Interpret a single-axis list as a shape (used by `⍴` and take/drop
    /// axis arguments). Every component must be a non-negative near-integer.
    pub fn to_shape(&self, ct: f64) -> Result<Shape, ApError> {
        if self.axes.len() != 1 {
            return Err(ApError::new(ErrorKind::Rank));
        }
        let Some(v) = &self.axes[0] else {
            return Err(ApError::new(ErrorKind::Domain));
        };
        let mut dims = Vec::with_capacity(v.ravel().len());
        for cell in v.ravel() {
            dims.push(cell_to_nonneg_dim(cell, ct)?);
        }
        Shape::new(dims)
    }

    /// Single item of rank ≤ 1, a near-integer in `[quad_io, quad_io + max_axis)`.
    pub fn to_axis(&self, max_axis: usize, quad_io: i64, ct: f64) -> Result<usize, ApError> {
        if self.axes.len() != 1 {
            return Err(ApError::new(ErrorKind::Rank));
        }
        let Some(v) = &self.axes[0] else {
            return Err(ApError::new(ErrorKind::Domain));
        };
        if v.rank() > 1 || v.ravel().len() != 1 {
            return Err(ApError::new(ErrorKind::Rank));
        }
        let n = cell_to_i64(&v.ravel()[0], ct)?;
        let axis = n - quad_io;
        if axis < 0 || axis as usize >= max_axis {
            return Err(ApError::new(ErrorKind::Axis));
        }
        Ok(axis as usize)
    }

    /// Each sub-index must fall within `[quad_io, quad_io + shape[axis])`.
    pub fn check_range(&self, shape: &Shape, quad_io: i64, ct: f64) -> Result<(), ApError> {
        if self.axes.len() != shape.rank() && self.axes.len() != 1 {
            return Err(ApError::new(ErrorKind::Rank));
        }
        for (axis, slot) in self.axes.iter().enumerate() {
            let Some(v) = slot else { continue };
            let len = shape.dim(axis).ok_or_else(|| ApError::new(ErrorKind::Rank))?;
            for cell in v.ravel() {
                let n = cell_to_i64(cell, ct)?;
                let idx = n - quad_io;
                if idx < 0 || idx as usize >= len {
                    return Err(ApError::new(ErrorKind::Index));
                }
            }
        }
        Ok(())
    }
}

fn cell_to_i64(cell: &Cell, ct: f64) -> Result<i64, ApError> {
    match cell {
        Cell::Int(i) => Ok(*i),
        Cell::Float(f) if near_integer_scalar(*f, ct) => Ok(f.round() as i64),
        _ => Err(ApError::new(ErrorKind::Domain)),
    }
}

fn cell_to_nonneg_dim(cell: &Cell, ct: f64) -> Result<usize, ApError> {
    let n = cell_to_i64(cell, ct)?;
    if n < 0 {
        return Err(ApError::new(ErrorKind::Domain));
    }
    Ok(n as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::DEFAULT_CT;

    #[test]
    fn to_shape_reads_nonneg_dims() {
        let idx = IndexExpr::single(Value::vector_of(vec![Cell::Int(2), Cell::Int(3)]));
        let shape = idx.to_shape(DEFAULT_CT).unwrap();
        assert_eq!(shape.dims(), &[2, 3]);
    }

    #[test]
    fn to_shape_rejects_negative() {
        let idx = IndexExpr::single(Value::vector_of(vec![Cell::Int(-1)]));
        assert!(idx.to_shape(DEFAULT_CT).is_err());
    }

    #[test]
    fn to_axis_checks_bounds() {
        let idx = IndexExpr::single(Value::scalar_of(Cell::Int(1)));
        assert_eq!(idx.to_axis(2, 1, DEFAULT_CT).unwrap(), 0);
        let idx2 = IndexExpr::single(Value::scalar_of(Cell::Int(5)));
        assert!(idx2.to_axis(2, 1, DEFAULT_CT).is_err());
    }

    #[test]
    fn check_range_flags_out_of_bounds() {
        let shape = Shape::vector(3);
        let idx = IndexExpr::single(Value::vector_of(vec![Cell::Int(1), Cell::Int(4)]));
        assert!(idx.check_range(&shape, 1, DEFAULT_CT).is_err());
        let idx_ok = IndexExpr::single(Value::vector_of(vec![Cell::Int(1), Cell::Int(3)]));
        assert!(idx_ok.check_range(&shape, 1, DEFAULT_CT).is_ok());
    }
}
