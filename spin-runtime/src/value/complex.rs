//! Complex scalar arithmetic.
//!
//! A pair of `Real` components (spec §3: `a + bi`). Equality is strict on
//! both parts — no epsilon fuzzing, matching the spec's "strict on both
//! parts" wording.

use std::fmt;

/// `a + bi`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub fn new(re: f64, im: f64) -> Self {
        Complex { re, im }
    }

    pub fn conjugate(self) -> Complex {
        Complex::new(self.re, -self.im)
    }

    pub fn magnitude(self) -> f64 {
        self.re.hypot(self.im)
    }

    pub fn phase(self) -> f64 {
        self.im.atan2(self.re)
    }

    pub fn add(self, other: Complex) -> Complex {
        Complex::new(self.re + other.re, self.im + other.im)
    }

    pub fn sub(self, other: Complex) -> Complex {
        Complex::new(self.re - other.re, self.im - other.im)
    }

    pub fn mul(self, other: Complex) -> Complex {
        Complex::new(
            self.re * other.re - self.im * other.im,
            self.re * other.im + self.im * other.re,
        )
    }

    /// `None` when `other` has zero magnitude — callers turn this into the
    /// dedicated divide-by-zero diagnostic (spec §4.4).
    pub fn div(self, other: Complex) -> Option<Complex> {
        let denom = other.re * other.re + other.im * other.im;
        if denom == 0.0 {
            return None;
        }
        Some(Complex::new(
            (self.re * other.re + self.im * other.im) / denom,
            (self.im * other.re - self.re * other.im) / denom,
        ))
    }

    pub fn neg(self) -> Complex {
        Complex::new(-self.re, -self.im)
    }

    pub fn from_real(re: f64) -> Complex {
        Complex::new(re, 0.0)
    }

    pub fn from_imaginary(im: f64) -> Complex {
        Complex::new(0.0, im)
    }
}

/// `a + bi` — imaginary-only values stringify as `"<real>i"` per §4.4.
impl fmt::Display for Complex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.im < 0.0 {
            write!(f, "{} - {}i", self.re, -self.im)
        } else {
            write!(f, "{} + {}i", self.re, self.im)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiplication_matches_foil_expansion() {
        let z = Complex::new(1.0, 2.0);
        let result = z.mul(z);
        assert_eq!(result, Complex::new(-3.0, 4.0));
    }

    #[test]
    fn conjugate_negates_imaginary_part() {
        let z = Complex::new(3.0, -4.0);
        assert_eq!(z.conjugate(), Complex::new(3.0, 4.0));
    }

    #[test]
    fn magnitude_is_pythagorean() {
        let z = Complex::new(3.0, 4.0);
        assert_eq!(z.magnitude(), 5.0);
    }

    #[test]
    fn division_by_zero_magnitude_fails() {
        let z = Complex::new(1.0, 1.0);
        assert_eq!(z.div(Complex::new(0.0, 0.0)), None);
    }

    #[test]
    fn division_is_multiplication_inverse() {
        let z = Complex::new(3.0, 4.0);
        let w = Complex::new(1.0, 2.0);
        let q = z.div(w).unwrap();
        let back = q.mul(w);
        assert!((back.re - z.re).abs() < 1e-9);
        assert!((back.im - z.im).abs() < 1e-9);
    }

    #[test]
    fn display_formats_imaginary_with_sign() {
        assert_eq!(Complex::new(-3.0, 4.0).to_string(), "-3 + 4i");
        assert_eq!(Complex::new(1.0, -2.0).to_string(), "1 - 2i");
    }
}
