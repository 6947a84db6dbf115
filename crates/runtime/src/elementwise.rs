//! Shared scalar-extension/conformance machinery used by every primitive
//! module that maps a `Cell`-level function across a `Value`'s ravel.

use apl_core::{ApError, Cell, ErrorKind, Shape, Value};

/// Map a monadic cell function across every ravel element, preserving shape.
pub fn map_monadic(v: &Value, f: impl Fn(&Cell) -> Result<Cell, ApError>) -> Result<Value, ApError> {
    let ravel: Result<Vec<Cell>, ApError> = v.ravel().iter().map(f).collect();
    Value::new(v.shape().clone(), ravel?)
}

/// Map a dyadic cell function across two values with APL scalar extension:
/// if either operand is a scalar, it is repeated against every cell of the
/// other; otherwise shapes must match exactly (`LENGTH` error otherwise).
pub fn map_dyadic(
    a: &Value,
    b: &Value,
    f: impl Fn(&Cell, &Cell) -> Result<Cell, ApError>,
) -> Result<Value, ApError> {
    match (a.is_scalar(), b.is_scalar()) {
        (true, true) => {
            let cell = f(&a.ravel()[0], &b.ravel()[0])?;
            Ok(Value::scalar_of(cell))
        }
        (true, false) => {
            let left = &a.ravel()[0];
            let ravel: Result<Vec<Cell>, ApError> = b.ravel().iter().map(|r| f(left, r)).collect();
            Value::new(b.shape().clone(), ravel?)
        }
        (false, true) => {
            let right = &b.ravel()[0];
            let ravel: Result<Vec<Cell>, ApError> = a.ravel().iter().map(|l| f(l, right)).collect();
            Value::new(a.shape().clone(), ravel?)
        }
        (false, false) => {
            if a.shape() != b.shape() {
                return Err(ApError::new(ErrorKind::Length));
            }
            let ravel: Result<Vec<Cell>, ApError> = a
                .ravel()
                .iter()
                .zip(b.ravel().iter())
                .map(|(l, r)| f(l, r))
                .collect();
            Value::new(a.shape().clone(), ravel?)
        }
    }
}

pub fn broadcast_shape(a: &Value, b: &Value) -> Result<Shape, ApError> {
    if a.is_scalar() {
        Ok(b.shape().clone())
    } else if b.is_scalar() {
        Ok(a.shape().clone())
    } else if a.shape() == b.shape() {
        Ok(a.shape().clone())
    } else {
        Err(ApError::new(ErrorKind::Length))
    }
}
