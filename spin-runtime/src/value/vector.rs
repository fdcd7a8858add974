//! Complex vectors in bra/ket notation (spec §3, Glossary).
//!
//! A bra is row-shaped (`<name|`), a ket is column-shaped (`|name>`).
//! Dimensionality is fixed at construction; the only mutation a Vector
//! ever undergoes after that is a direction flip (dagger, or the
//! direction-preserving coercion used by Vector assignment).

use spin_base::{ErrorCode, Result, Span, SpannedError};

use super::complex::Complex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Bra,
    Ket,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Vector {
    pub components: Vec<Complex>,
    pub direction: Direction,
}

impl Vector {
    pub fn new(components: Vec<Complex>, direction: Direction) -> Self {
        Vector { components, direction }
    }

    /// The fixed two-dimensional computational basis `<0|`/`<1|`/`|0>`/`|1>`.
    pub fn basis(which: u8, direction: Direction) -> Self {
        let components = if which == 0 {
            vec![Complex::new(1.0, 0.0), Complex::new(0.0, 0.0)]
        } else {
            vec![Complex::new(0.0, 0.0), Complex::new(1.0, 0.0)]
        };
        Vector::new(components, direction)
    }

    pub fn dim(&self) -> usize {
        self.components.len()
    }

    pub fn is_bra(&self) -> bool {
        self.direction == Direction::Bra
    }

    pub fn is_ket(&self) -> bool {
        self.direction == Direction::Ket
    }

    /// Conjugate-transpose: swaps direction and conjugates every component.
    pub fn dagger(&self) -> Vector {
        Vector {
            components: self.components.iter().map(|c| c.conjugate()).collect(),
            direction: match self.direction {
                Direction::Bra => Direction::Ket,
                Direction::Ket => Direction::Bra,
            },
        }
    }

    /// Additive inverse, direction preserved.
    pub fn negate(&self) -> Vector {
        Vector {
            components: self.components.iter().map(|c| c.neg()).collect(),
            direction: self.direction,
        }
    }

    /// Conjugate every component, direction preserved (postfix `°`).
    pub fn conjugate(&self) -> Vector {
        Vector {
            components: self.components.iter().map(|c| c.conjugate()).collect(),
            direction: self.direction,
        }
    }

    /// Transpose: flips direction only, components unchanged (postfix `^`).
    pub fn transpose(&self) -> Vector {
        Vector {
            components: self.components.clone(),
            direction: match self.direction {
                Direction::Bra => Direction::Ket,
                Direction::Ket => Direction::Bra,
            },
        }
    }

    /// Returns a copy coerced to the requested direction, flipping in place
    /// (conjugating) when the stored direction differs — the mechanism
    /// behind `|v> = <v|`-style Vector assignment (spec §4.4).
    pub fn coerced_to(&self, direction: Direction) -> Vector {
        if self.direction == direction {
            self.clone()
        } else {
            self.dagger()
        }
    }

    pub fn scale(&self, factor: Complex) -> Vector {
        Vector {
            components: self.components.iter().map(|c| c.mul(factor)).collect(),
            direction: self.direction,
        }
    }

    /// ⟨a|b⟩ — sum of componentwise products of a bra and a ket of equal
    /// dimension (spec Glossary). Requires `self` to be a bra and `other`
    /// a ket of equal size.
    pub fn inner(&self, other: &Vector, span: Span) -> Result<Complex> {
        if self.direction != Direction::Bra || other.direction != Direction::Ket {
            return Err(SpannedError::new(
                ErrorCode::Evaluation,
                "inner product requires a bra on the left and a ket on the right",
                span,
            ));
        }
        if self.dim() != other.dim() {
            return Err(SpannedError::new(
                ErrorCode::Evaluation,
                format!(
                    "inner product dimension mismatch: {} vs {}",
                    self.dim(),
                    other.dim()
                ),
                span,
            ));
        }
        let mut sum = Complex::new(0.0, 0.0);
        for (a, b) in self.components.iter().zip(other.components.iter()) {
            sum = sum.add(a.mul(*b));
        }
        Ok(sum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dagger_of_dagger_is_identity() {
        let v = Vector::new(vec![Complex::new(1.0, 2.0), Complex::new(3.0, -4.0)], Direction::Ket);
        let back = v.dagger().dagger();
        assert_eq!(back, v);
    }

    #[test]
    fn basis_inner_product_is_orthonormal() {
        let bra0 = Vector::basis(0, Direction::Bra);
        let ket0 = Vector::basis(0, Direction::Ket);
        let ket1 = Vector::basis(1, Direction::Ket);
        let span = Span::at(0);
        assert_eq!(bra0.inner(&ket0, span).unwrap(), Complex::new(1.0, 0.0));
        assert_eq!(bra0.inner(&ket1, span).unwrap(), Complex::new(0.0, 0.0));
    }

    #[test]
    fn inner_product_self_is_real_nonnegative() {
        let v = Vector::new(vec![Complex::new(1.0, 1.0), Complex::new(2.0, -1.0)], Direction::Ket);
        let bra = v.dagger();
        let result = bra.inner(&v, Span::at(0)).unwrap();
        assert!(result.im.abs() < 1e-9);
        assert!(result.re >= 0.0);
    }

    #[test]
    fn inner_product_shape_mismatch_is_rejected() {
        let bra = Vector::new(vec![Complex::new(1.0, 0.0)], Direction::Bra);
        let ket = Vector::new(
            vec![Complex::new(1.0, 0.0), Complex::new(0.0, 0.0)],
            Direction::Ket,
        );
        assert!(bra.inner(&ket, Span::at(0)).is_err());
    }

    #[test]
    fn coerced_to_matching_direction_is_unchanged() {
        let v = Vector::basis(1, Direction::Ket);
        let coerced = v.coerced_to(Direction::Ket);
        assert_eq!(coerced, v);
    }
}
