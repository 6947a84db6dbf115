//! Shapes: ordered dimension-size sequences with bounded rank.

use std::fmt;

/// Maximum supported rank. Mirrors GNU APL's `MAX_RANK`.
pub const R_MAX: usize = 8;

/// An ordered sequence of non-negative dimension sizes.
///
/// A scalar has rank 0 and volume 1 (the empty product).
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    /// The scalar shape (rank 0).
    pub fn scalar() -> Self {
        Shape { dims: Vec::new() }
    }

    /// A rank-1 shape of the given length.
    pub fn vector(len: usize) -> Self {
        Shape { dims: vec![len] }
    }

    /// Build a shape from dimensions, rejecting rank above [`R_MAX`].
    pub fn new(dims: Vec<usize>) -> Result<Self, crate::error::ApError> {
        if dims.len() > R_MAX {
            return Err(crate::error::ApError::new(
                crate::error::ErrorKind::SystemLimitRank,
            ));
        }
        Ok(Shape { dims })
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Π sᵢ, empty product = 1.
    pub fn volume(&self) -> usize {
        self.dims.iter().product()
    }

    pub fn is_scalar(&self) -> bool {
        self.dims.is_empty()
    }

    /// Length of the last axis, or 1 for a scalar.
    pub fn last_axis_len(&self) -> usize {
        *self.dims.last().unwrap_or(&1)
    }

    pub fn dim(&self, axis: usize) -> Option<usize> {
        self.dims.get(axis).copied()
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.dims.iter().map(|d| d.to_string()).collect();
        write!(f, "{}", parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_has_volume_one() {
        let s = Shape::scalar();
        assert_eq!(s.rank(), 0);
        assert_eq!(s.volume(), 1);
    }

    #[test]
    fn vector_volume_is_length() {
        let s = Shape::vector(5);
        assert_eq!(s.volume(), 5);
        assert_eq!(s.last_axis_len(), 5);
    }

    #[test]
    fn rank_over_limit_rejected() {
        let dims = vec![1; R_MAX + 1];
        assert!(Shape::new(dims).is_err());
    }

    #[test]
    fn empty_axis_gives_zero_volume() {
        let s = Shape::new(vec![3, 0, 2]).unwrap();
        assert_eq!(s.volume(), 0);
    }
}
