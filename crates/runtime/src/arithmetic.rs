//! Monadic and dyadic scalar arithmetic functions: `+ - × ÷ | ⌈ ⌊ * ⍟ ○ ! ~`.
//!
//! Each cell-level function below returns a raw (non-demoted) `Cell`; the
//! caller in [`crate::primitives`] demotes the whole result value once under
//! the active `⎕CT` so intermediate complex/float noise never leaks out.

use apl_core::{ApError, Cell, ErrorKind};

fn as_complex(c: &Cell) -> Result<(f64, f64), ApError> {
    match c {
        Cell::Int(i) => Ok((*i as f64, 0.0)),
        Cell::Float(f) => Ok((*f, 0.0)),
        Cell::Complex(re, im) => Ok((*re, *im)),
        _ => Err(ApError::new(ErrorKind::Domain)),
    }
}

fn as_real(c: &Cell) -> Result<f64, ApError> {
    let (re, im) = as_complex(c)?;
    if im != 0.0 {
        return Err(ApError::new(ErrorKind::Domain));
    }
    Ok(re)
}

fn cell_of(re: f64, im: f64) -> Cell {
    if im == 0.0 {
        Cell::Float(re)
    } else {
        Cell::Complex(re, im)
    }
}

pub fn conjugate(c: &Cell) -> Result<Cell, ApError> {
    let (re, im) = as_complex(c)?;
    Ok(cell_of(re, -im))
}

pub fn negate(c: &Cell) -> Result<Cell, ApError> {
    let (re, im) = as_complex(c)?;
    Ok(cell_of(-re, -im))
}

pub fn signum(c: &Cell) -> Result<Cell, ApError> {
    let (re, im) = as_complex(c)?;
    if re == 0.0 && im == 0.0 {
        return Ok(Cell::Int(0));
    }
    let mag = (re * re + im * im).sqrt();
    Ok(cell_of(re / mag, im / mag))
}

pub fn reciprocal(c: &Cell) -> Result<Cell, ApError> {
    let (re, im) = as_complex(c)?;
    let denom = re * re + im * im;
    if denom == 0.0 {
        return Err(ApError::new(ErrorKind::Domain));
    }
    Ok(cell_of(re / denom, -im / denom))
}

pub fn magnitude(c: &Cell) -> Result<Cell, ApError> {
    let (re, im) = as_complex(c)?;
    Ok(Cell::Float((re * re + im * im).sqrt()))
}

pub fn ceiling(c: &Cell) -> Result<Cell, ApError> {
    Ok(Cell::Float(as_real(c)?.ceil()))
}

pub fn floor(c: &Cell) -> Result<Cell, ApError> {
    Ok(Cell::Float(as_real(c)?.floor()))
}

pub fn exponential(c: &Cell) -> Result<Cell, ApError> {
    let (re, im) = as_complex(c)?;
    let mag = re.exp();
    Ok(cell_of(mag * im.cos(), mag * im.sin()))
}

pub fn natural_log(c: &Cell) -> Result<Cell, ApError> {
    let (re, im) = as_complex(c)?;
    if re == 0.0 && im == 0.0 {
        return Err(ApError::new(ErrorKind::Domain));
    }
    let mag = (re * re + im * im).sqrt();
    Ok(cell_of(mag.ln(), im.atan2(re)))
}

pub fn pi_times(c: &Cell) -> Result<Cell, ApError> {
    let (re, im) = as_complex(c)?;
    Ok(cell_of(re * std::f64::consts::PI, im * std::f64::consts::PI))
}

pub fn logical_not(c: &Cell) -> Result<Cell, ApError> {
    match as_real(c)? {
        0.0 => Ok(Cell::Int(1)),
        1.0 => Ok(Cell::Int(0)),
        _ => Err(ApError::new(ErrorKind::Domain)),
    }
}

pub fn factorial(c: &Cell) -> Result<Cell, ApError> {
    let n = as_real(c)?;
    if n < 0.0 || n.fract() != 0.0 {
        return Err(ApError::new(ErrorKind::NotYetImplemented));
    }
    let n = n as u64;
    let mut acc: f64 = 1.0;
    for k in 2..=n {
        acc *= k as f64;
    }
    Ok(Cell::Float(acc))
}

pub fn add(a: &Cell, b: &Cell) -> Result<Cell, ApError> {
    let (ar, ai) = as_complex(a)?;
    let (br, bi) = as_complex(b)?;
    Ok(cell_of(ar + br, ai + bi))
}

pub fn subtract(a: &Cell, b: &Cell) -> Result<Cell, ApError> {
    let (ar, ai) = as_complex(a)?;
    let (br, bi) = as_complex(b)?;
    Ok(cell_of(ar - br, ai - bi))
}

pub fn multiply(a: &Cell, b: &Cell) -> Result<Cell, ApError> {
    let (ar, ai) = as_complex(a)?;
    let (br, bi) = as_complex(b)?;
    Ok(cell_of(ar * br - ai * bi, ar * bi + ai * br))
}

pub fn divide(a: &Cell, b: &Cell) -> Result<Cell, ApError> {
    let (ar, ai) = as_complex(a)?;
    let (br, bi) = as_complex(b)?;
    let denom = br * br + bi * bi;
    if denom == 0.0 {
        if ar == 0.0 && ai == 0.0 {
            return Ok(Cell::Int(1));
        }
        return Err(ApError::new(ErrorKind::Domain));
    }
    Ok(cell_of(
        (ar * br + ai * bi) / denom,
        (ai * br - ar * bi) / denom,
    ))
}

pub fn residue(a: &Cell, b: &Cell) -> Result<Cell, ApError> {
    let a = as_real(a)?;
    let b = as_real(b)?;
    if a == 0.0 {
        return Ok(Cell::Float(b));
    }
    Ok(Cell::Float(b - a * (b / a).floor()))
}

pub fn max(a: &Cell, b: &Cell) -> Result<Cell, ApError> {
    let (a, b) = (as_real(a)?, as_real(b)?);
    Ok(Cell::Float(a.max(b)))
}

pub fn min(a: &Cell, b: &Cell) -> Result<Cell, ApError> {
    let (a, b) = (as_real(a)?, as_real(b)?);
    Ok(Cell::Float(a.min(b)))
}

pub fn power(a: &Cell, b: &Cell) -> Result<Cell, ApError> {
    let (ar, ai) = as_complex(a)?;
    let (br, bi) = as_complex(b)?;
    if ai == 0.0 && bi == 0.0 && ar >= 0.0 {
        return Ok(Cell::Float(ar.powf(br)));
    }
    if ai == 0.0 && bi == 0.0 && br.fract() == 0.0 {
        return Ok(Cell::Float(ar.powf(br)));
    }
    // general complex power via polar form: a^b = exp(b * ln(a))
    let log_a = natural_log(&Cell::Complex(ar, ai))?;
    let (lr, li) = as_complex(&log_a)?;
    exponential(&Cell::Complex(lr * br - li * bi, lr * bi + li * br))
}

pub fn logarithm(a: &Cell, b: &Cell) -> Result<Cell, ApError> {
    let num = natural_log(b)?;
    let den = natural_log(a)?;
    divide(&num, &den)
}

pub fn binomial(a: &Cell, b: &Cell) -> Result<Cell, ApError> {
    let k = as_real(a)?;
    let n = as_real(b)?;
    if k < 0.0 || n < 0.0 || k.fract() != 0.0 || n.fract() != 0.0 || k > n {
        return Err(ApError::new(ErrorKind::NotYetImplemented));
    }
    let (k, n) = (k as u64, n as u64);
    let mut acc: f64 = 1.0;
    for i in 0..k {
        acc *= (n - i) as f64 / (i + 1) as f64;
    }
    Ok(Cell::Float(acc))
}

pub fn logical_and(a: &Cell, b: &Cell) -> Result<Cell, ApError> {
    match (as_real(a)?, as_real(b)?) {
        (0.0, 0.0) | (0.0, 1.0) | (1.0, 0.0) => Ok(Cell::Int(0)),
        (1.0, 1.0) => Ok(Cell::Int(1)),
        _ => Err(ApError::new(ErrorKind::Domain)),
    }
}

pub fn logical_or(a: &Cell, b: &Cell) -> Result<Cell, ApError> {
    match (as_real(a)?, as_real(b)?) {
        (0.0, 0.0) => Ok(Cell::Int(0)),
        (0.0, 1.0) | (1.0, 0.0) | (1.0, 1.0) => Ok(Cell::Int(1)),
        _ => Err(ApError::new(ErrorKind::Domain)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_promotes_to_complex_only_when_needed() {
        assert!(matches!(add(&Cell::Int(1), &Cell::Int(2)).unwrap(), Cell::Float(f) if f == 3.0));
    }

    #[test]
    fn divide_by_zero_is_domain_error_unless_zero_over_zero() {
        assert!(divide(&Cell::Int(1), &Cell::Int(0)).is_err());
        assert!(matches!(divide(&Cell::Int(0), &Cell::Int(0)), Ok(Cell::Int(1))));
    }

    #[test]
    fn factorial_of_negative_is_not_yet_implemented() {
        assert!(factorial(&Cell::Int(-1)).is_err());
    }

    #[test]
    fn residue_wraps_like_modulo() {
        match residue(&Cell::Int(3), &Cell::Int(7)).unwrap() {
            Cell::Float(f) => assert_eq!(f, 1.0),
            other => panic!("{other:?}"),
        }
    }
}
