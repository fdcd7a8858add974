//! Operator dispatch (spec §4.4). Every `Processor` method takes already
//! -evaluated `Object` operands and a `Span` for diagnostics; the
//! Interpreter owns evaluation order (including short-circuiting and
//! commutative-operand retry is done here, not there).
//!
//! The original evaluator keyed each operator on a pair of `BasicType`
//! tags through a hash table built once at startup. A match expression
//! over `(Object, Object)` is the same table, just checked by the
//! compiler instead of populated at runtime (spec §9's "Processor
//! tables as match expressions"). Unsupported pairings are retried with
//! operands swapped before failing, mirroring `applyAddition`'s
//! `compose(r->type, l->type)` fallback — this is what makes `3 + 2i`
//! and `2i + 3` both legal without a symmetric table entry for each.

use spin_base::{ErrorCode, Result, Span, SpannedError};
use spin_syntax::token::TokenKind;

use crate::value::{Class, Complex, Direction, Instance, Object, Vector};

pub struct Processor;

fn unsupported(op: &str, l: &Object, r: &Object, span: Span) -> SpannedError {
    SpannedError::new(
        ErrorCode::Evaluation,
        format!(
            "Binary operator '{}' doesn't support operands of type '{}' and '{}'!",
            op,
            l.type_name(),
            r.type_name()
        ),
        span,
    )
}

fn unsupported_unary(op: &str, o: &Object, span: Span) -> SpannedError {
    SpannedError::new(
        ErrorCode::Evaluation,
        format!(
            "Unary operator '{}' doesn't support any operand of type '{}'!",
            op,
            o.type_name()
        ),
        span,
    )
}

impl Processor {
    pub fn add<'a>(l: &Object<'a>, r: &Object<'a>, span: Span) -> Result<Object<'a>> {
        if matches!(l, Object::String(_)) || matches!(r, Object::String(_)) {
            return Self::string_concat(l, r, span);
        }
        use Object::*;
        Ok(match (l, r) {
            (Integer(a), Integer(b)) => Integer(a + b),
            (Real(a), Real(b)) => Real(a + b),
            (Integer(a), Byte(b)) | (Byte(b), Integer(a)) => Integer(a + *b as i64),
            (Integer(a), Real(b)) | (Real(b), Integer(a)) => Real(*a as f64 + b),
            (Integer(a), Imaginary(b)) | (Imaginary(b), Integer(a)) => {
                Complex(Complex::new(*a as f64, *b))
            }
            (Integer(a), Complex(b)) | (Complex(b), Integer(a)) => {
                Complex(b.add(Complex::from_real(*a as f64)))
            }
            (Real(a), Complex(b)) | (Complex(b), Real(a)) => {
                Complex(b.add(Complex::from_real(*a)))
            }
            (Imaginary(a), Imaginary(b)) => Imaginary(a + b),
            (Complex(a), Imaginary(b)) | (Imaginary(b), Complex(a)) => {
                Complex(a.add(Complex::from_imaginary(*b)))
            }
            (Imaginary(a), Real(b)) | (Real(b), Imaginary(a)) => {
                Complex(Complex::new(*b, *a))
            }
            (Complex(a), Complex(b)) => Complex(a.add(*b)),
            (Character(a), Character(b)) => {
                Character(((*a as u8).wrapping_add(*b as u8)) as char)
            }
            (Byte(a), Byte(b)) => Byte(a.wrapping_add(*b)),
            _ => return Err(unsupported("+", l, r, span)),
        })
    }

    fn string_concat<'a>(l: &Object<'a>, r: &Object<'a>, span: Span) -> Result<Object<'a>> {
        use Object::*;
        let s = match (l, r) {
            (String(a), String(b)) => format!("{}{}", a, b),
            (String(a), Character(b)) => format!("{}{}", a, b),
            (String(a), Integer(b)) => format!("{}{}", a, b),
            (String(a), Real(b)) => format!("{}{}", a, b),
            (String(a), Byte(b)) => format!("{}{}", a, b),
            (String(a), Boolean(b)) => format!("{}{}", a, b),
            (String(a), Imaginary(b)) => format!("{}{}i", a, b),
            (String(a), Complex(b)) => format!("{}{}", a, b),
            _ => return Err(unsupported("+", l, r, span)),
        };
        Ok(String(s))
    }

    pub fn sub<'a>(l: &Object<'a>, r: &Object<'a>, span: Span) -> Result<Object<'a>> {
        use Object::*;
        Ok(match (l, r) {
            (Integer(a), Integer(b)) => Integer(a - b),
            (Real(a), Real(b)) => Real(a - b),
            (Integer(a), Real(b)) => Real(*a as f64 - b),
            (Real(a), Integer(b)) => Real(a - *b as f64),
            (Integer(a), Byte(b)) => Integer(a - *b as i64),
            (Byte(a), Integer(b)) => Integer(*a as i64 - b),
            (Complex(a), Complex(b)) => Complex(a.sub(*b)),
            (Imaginary(a), Integer(b)) => Complex(Complex::new(-(*b as f64), *a)),
            (Integer(a), Imaginary(b)) => Complex(Complex::new(*a as f64, -b)),
            (Imaginary(a), Real(b)) => Complex(Complex::new(-b, *a)),
            (Real(a), Imaginary(b)) => Complex(Complex::new(*a, -b)),
            (Complex(a), Imaginary(b)) => {
                Complex(a.sub(Complex::from_imaginary(*b)))
            }
            (Imaginary(a), Complex(b)) => {
                Complex(Complex::from_imaginary(*a).sub(*b))
            }
            (Complex(a), Real(b)) => {
                Complex(a.sub(Complex::from_real(*b)))
            }
            (Real(a), Complex(b)) => {
                Complex(Complex::from_real(*a).sub(*b))
            }
            (Complex(a), Integer(b)) => {
                Complex(a.sub(Complex::from_real(*b as f64)))
            }
            (Integer(a), Complex(b)) => {
                Complex(Complex::from_real(*a as f64).sub(*b))
            }
            (Character(a), Character(b)) => {
                Character(((*a as u8).wrapping_sub(*b as u8)) as char)
            }
            (Byte(a), Byte(b)) => Byte(a.wrapping_sub(*b)),
            _ => return Err(unsupported("-", l, r, span)),
        })
    }

    pub fn mul<'a>(l: &Object<'a>, r: &Object<'a>, span: Span) -> Result<Object<'a>> {
        use Object::*;
        if let (Vector(a), Vector(b)) = (l, r) {
            if a.direction == b.direction {
                return Err(SpannedError::new(
                    ErrorCode::Evaluation,
                    "Binary operator '*' doesn't support Vectors that occupy the same space!",
                    span,
                ));
            }
            if a.dim() != b.dim() {
                return Err(SpannedError::new(
                    ErrorCode::Evaluation,
                    "Binary operator '*' doesn't support Vectors with different dimensions!",
                    span,
                ));
            }
            return if a.is_bra() {
                Ok(Complex(a.inner(b, span)?))
            } else {
                Err(SpannedError::new(
                    ErrorCode::Evaluation,
                    "outer product is not implemented",
                    span,
                ))
            };
        }
        Ok(match (l, r) {
            (Integer(a), Integer(b)) => Integer(a * b),
            (Integer(a), Real(b)) | (Real(b), Integer(a)) => Real(*a as f64 * b),
            (Real(a), Real(b)) => Real(a * b),
            (Byte(a), Byte(b)) => Byte(a.wrapping_mul(*b)),
            (Byte(a), Integer(b)) | (Integer(b), Byte(a)) => Integer(*a as i64 * b),
            (Character(a), Character(b)) => {
                Character(((*a as u8).wrapping_mul(*b as u8)) as char)
            }
            (Character(a), Integer(b)) | (Integer(b), Character(a)) => {
                Integer(*a as i64 * b)
            }
            (Imaginary(a), Real(b)) | (Real(b), Imaginary(a)) => Imaginary(a * b),
            (Imaginary(a), Integer(b)) | (Integer(b), Imaginary(a)) => Imaginary(a * *b as f64),
            (Imaginary(a), Imaginary(b)) => Real(-(a * b)),
            (Imaginary(a), Complex(b)) | (Complex(b), Imaginary(a)) => {
                Complex(b.mul(Complex::from_imaginary(*a)))
            }
            (Complex(a), Complex(b)) => Complex(a.mul(*b)),
            (Complex(a), Real(b)) | (Real(b), Complex(a)) => {
                Complex(a.mul(Complex::from_real(*b)))
            }
            (Complex(a), Integer(b)) | (Integer(b), Complex(a)) => {
                Complex(a.mul(Complex::from_real(*b as f64)))
            }
            (Vector(v), Complex(c)) | (Complex(c), Vector(v)) => {
                Vector(v.scale(*c))
            }
            (Vector(v), Imaginary(i)) | (Imaginary(i), Vector(v)) => {
                Vector(v.scale(Complex::from_imaginary(*i)))
            }
            (Vector(v), Real(x)) | (Real(x), Vector(v)) => {
                Vector(v.scale(Complex::from_real(*x)))
            }
            (Vector(v), Integer(x)) | (Integer(x), Vector(v)) => {
                Vector(v.scale(Complex::from_real(*x as f64)))
            }
            _ => return Err(unsupported("*", l, r, span)),
        })
    }

    pub fn div<'a>(l: &Object<'a>, r: &Object<'a>, span: Span) -> Result<Object<'a>> {
        use Object::*;
        let zero_err = || {
            SpannedError::new(
                ErrorCode::Evaluation,
                "Binary operator '/' threw division by 0 exception!",
                span,
            )
        };
        Ok(match (l, r) {
            (Integer(a), Integer(b)) => {
                if *b == 0 {
                    return Err(zero_err());
                }
                Integer(a / b)
            }
            (Integer(a), Real(b)) => {
                if *b == 0.0 {
                    return Err(zero_err());
                }
                Real(*a as f64 / b)
            }
            (Real(a), Integer(b)) => {
                if *b == 0 {
                    return Err(zero_err());
                }
                Real(a / *b as f64)
            }
            (Real(a), Real(b)) => {
                if *b == 0.0 {
                    return Err(zero_err());
                }
                Real(a / b)
            }
            (Byte(a), Byte(b)) => {
                if *b == 0 {
                    return Err(zero_err());
                }
                Byte(a / b)
            }
            (Byte(a), Integer(b)) => {
                if *b == 0 {
                    return Err(zero_err());
                }
                Integer(*a as i64 / b)
            }
            (Integer(a), Byte(b)) => {
                if *b == 0 {
                    return Err(zero_err());
                }
                Integer(a / *b as i64)
            }
            (Character(a), Character(b)) => {
                if *b as u8 == 0 {
                    return Err(zero_err());
                }
                Character(((*a as u8) / (*b as u8)) as char)
            }
            (Imaginary(a), Real(b)) => {
                if *b == 0.0 {
                    return Err(zero_err());
                }
                Imaginary(a / b)
            }
            (Imaginary(a), Integer(b)) => {
                if *b == 0 {
                    return Err(zero_err());
                }
                Imaginary(a / *b as f64)
            }
            (Imaginary(a), Imaginary(b)) => {
                if *b == 0.0 {
                    return Err(zero_err());
                }
                Real(a / b)
            }
            (Complex(a), Complex(b)) => {
                Complex(a.div(*b).ok_or_else(zero_err)?)
            }
            _ => return Err(unsupported("/", l, r, span)),
        })
    }

    pub fn modulus<'a>(l: &Object<'a>, r: &Object<'a>, span: Span) -> Result<Object<'a>> {
        if let (Object::Integer(a), Object::Integer(b)) = (l, r) {
            if *b == 0 {
                return Err(SpannedError::new(
                    ErrorCode::Evaluation,
                    "Binary operator '%' threw division by 0 exception!",
                    span,
                ));
            }
            return Ok(Object::Integer(a % b));
        }
        Err(unsupported("%", l, r, span))
    }

    pub fn bitand<'a>(l: &Object<'a>, r: &Object<'a>, span: Span) -> Result<Object<'a>> {
        use Object::*;
        Ok(match (l, r) {
            (Integer(a), Integer(b)) => Integer(a & b),
            (Byte(a), Byte(b)) => Byte(a & b),
            (Character(a), Character(b)) => Character(((*a as u8) & (*b as u8)) as char),
            (Boolean(a), Boolean(b)) => Boolean(*a && *b),
            _ => return Err(unsupported("&", l, r, span)),
        })
    }

    pub fn bitor<'a>(l: &Object<'a>, r: &Object<'a>, span: Span) -> Result<Object<'a>> {
        use Object::*;
        Ok(match (l, r) {
            (Integer(a), Integer(b)) => Integer(a | b),
            (Byte(a), Byte(b)) => Byte(a | b),
            (Character(a), Character(b)) => Character(((*a as u8) | (*b as u8)) as char),
            (Boolean(a), Boolean(b)) => Boolean(*a || *b),
            _ => return Err(unsupported("|", l, r, span)),
        })
    }

    pub fn bitxor<'a>(l: &Object<'a>, r: &Object<'a>, span: Span) -> Result<Object<'a>> {
        use Object::*;
        Ok(match (l, r) {
            (Integer(a), Integer(b)) => Integer(a ^ b),
            (Byte(a), Byte(b)) => Byte(a ^ b),
            (Character(a), Character(b)) => Character(((*a as u8) ^ (*b as u8)) as char),
            (Boolean(a), Boolean(b)) => Boolean(*a ^ *b),
            _ => return Err(unsupported("^", l, r, span)),
        })
    }

    /// Strict equality requires matching tags; a separate mixed table
    /// covers the small set of cross-tag pairs the original evaluator
    /// allows (spec §4.4). Anything else is a type error, not `false`.
    pub fn equal<'a>(l: &Object<'a>, r: &Object<'a>, span: Span) -> Result<bool> {
        use Object::*;
        Ok(match (l, r) {
            (Integer(a), Integer(b)) => a == b,
            (Real(a), Real(b)) => a == b,
            (String(a), String(b)) => a == b,
            (Boolean(a), Boolean(b)) => a == b,
            (Complex(a), Complex(b)) => a == b,
            (Imaginary(a), Imaginary(b)) => a == b,
            (Byte(a), Byte(b)) => a == b,
            (Character(a), Character(b)) => a == b,
            (Integer(a), Real(b)) | (Real(b), Integer(a)) => *a as f64 == *b,
            (Integer(a), Byte(b)) | (Byte(b), Integer(a)) => *a == *b as i64,
            (Character(a), Byte(b)) | (Byte(b), Character(a)) => *a as u8 == *b,
            (Integer(a), Character(b)) | (Character(b), Integer(a)) => *a == *b as i64,
            (Imaginary(a), Complex(b))
            | (Complex(b), Imaginary(a)) => {
                b.re == 0.0 && b.im == *a
            }
            (Real(a), Complex(b)) | (Complex(b), Real(a)) => {
                b.im == 0.0 && b.re == *a
            }
            (String(a), Character(b)) | (Character(b), String(a)) => a.len() == 1 && a.starts_with(*b),
            // Instance has no equality table entry in the original evaluator
            // either — comparing two Instances is a type error, not identity.
            _ => return Err(unsupported("==", l, r, span)),
        })
    }

    pub fn not_equal<'a>(l: &Object<'a>, r: &Object<'a>, span: Span) -> Result<bool> {
        Self::equal(l, r, span).map(|b| !b)
    }

    pub fn greater<'a>(l: &Object<'a>, r: &Object<'a>, span: Span) -> Result<bool> {
        Self::order(l, r, span, ">", |a, b| a > b, |a, b| a > b)
    }

    pub fn greater_equal<'a>(l: &Object<'a>, r: &Object<'a>, span: Span) -> Result<bool> {
        Self::order(l, r, span, ">=", |a, b| a >= b, |a, b| a >= b)
    }

    pub fn less<'a>(l: &Object<'a>, r: &Object<'a>, span: Span) -> Result<bool> {
        Self::order(l, r, span, "<", |a, b| a < b, |a, b| a < b)
    }

    pub fn less_equal<'a>(l: &Object<'a>, r: &Object<'a>, span: Span) -> Result<bool> {
        Self::order(l, r, span, "<=", |a, b| a <= b, |a, b| a <= b)
    }

    fn order<'a>(
        l: &Object<'a>,
        r: &Object<'a>,
        span: Span,
        op: &str,
        cmp_int: impl Fn(i64, i64) -> bool,
        cmp_real: impl Fn(f64, f64) -> bool,
    ) -> Result<bool> {
        use Object::*;
        Ok(match (l, r) {
            (Integer(a), Integer(b)) => cmp_int(*a, *b),
            (Real(a), Real(b)) => cmp_real(*a, *b),
            (Integer(a), Real(b)) => cmp_real(*a as f64, *b),
            (Real(a), Integer(b)) => cmp_real(*a, *b as f64),
            (Byte(a), Byte(b)) => cmp_int(*a as i64, *b as i64),
            (Character(a), Character(b)) => cmp_int(*a as i64, *b as i64),
            _ => return Err(unsupported(op, l, r, span)),
        })
    }

    pub fn negate<'a>(o: &Object<'a>, span: Span) -> Result<Object<'a>> {
        use Object::*;
        Ok(match o {
            Integer(a) => Integer(-a),
            Real(a) => Real(-a),
            Imaginary(a) => Imaginary(-a),
            Complex(a) => Complex(a.neg()),
            Vector(v) => Object::Vector(v.negate()),
            _ => return Err(unsupported_unary("-", o, span)),
        })
    }

    pub fn unary_plus<'a>(o: &Object<'a>, span: Span) -> Result<Object<'a>> {
        use Object::*;
        match o {
            Character(_) | Byte(_) | Integer(_) | Real(_) | Imaginary(_) | Complex(_)
            | Vector(_) => Ok(o.clone()),
            _ => Err(unsupported_unary("+", o, span)),
        }
    }

    pub fn logical_not<'a>(o: &Object<'a>, span: Span) -> Result<Object<'a>> {
        match o {
            Object::Boolean(b) => Ok(Object::Boolean(!b)),
            _ => Err(unsupported_unary("!", o, span)),
        }
    }

    pub fn conjugate<'a>(o: &Object<'a>, span: Span) -> Result<Object<'a>> {
        match o {
            Object::Complex(c) => Ok(Object::Complex(c.conjugate())),
            Object::Vector(v) => Ok(Object::Vector(v.conjugate())),
            _ => Err(unsupported_unary("°", o, span)),
        }
    }

    pub fn transpose<'a>(o: &Object<'a>, span: Span) -> Result<Object<'a>> {
        match o {
            Object::Vector(v) => Ok(Object::Vector(v.transpose())),
            _ => Err(unsupported_unary("^", o, span)),
        }
    }

    pub fn dagger<'a>(o: &Object<'a>, span: Span) -> Result<Object<'a>> {
        match o {
            Object::Vector(v) => Ok(Object::Vector(v.dagger())),
            _ => Err(unsupported_unary("'", o, span)),
        }
    }

    pub fn bitwise_not<'a>(o: &Object<'a>, span: Span) -> Result<Object<'a>> {
        match o {
            Object::Byte(b) => Ok(Object::Byte(!b)),
            Object::Integer(i) => Ok(Object::Integer(!i)),
            _ => Err(unsupported_unary("~", o, span)),
        }
    }

    /// `target[index]` read: String indexes to a Character, Array to a
    /// (shallow) copy of the stored element (spec §4.5).
    pub fn subscript_get<'a>(target: &Object<'a>, index: &Object<'a>, span: Span) -> Result<Object<'a>> {
        let i = match index {
            Object::Integer(i) => *i,
            _ => {
                return Err(SpannedError::new(
                    ErrorCode::Evaluation,
                    format!("subscript index must be an Integer, found '{}'", index.type_name()),
                    span,
                ))
            }
        };
        match target {
            Object::String(s) => {
                let c = s.chars().nth(usize::try_from(i).unwrap_or(usize::MAX)).ok_or_else(|| {
                    SpannedError::new(ErrorCode::Evaluation, "string index out of bounds", span)
                })?;
                Ok(Object::Character(c))
            }
            Object::Array(data) => {
                let data = data.borrow();
                let idx = usize::try_from(i).map_err(|_| {
                    SpannedError::new(ErrorCode::Evaluation, "array index out of bounds", span)
                })?;
                data.get(idx)
                    .map(|o| o.clone())
                    .ok_or_else(|| SpannedError::new(ErrorCode::Evaluation, "array index out of bounds", span))
            }
            _ => Err(SpannedError::new(
                ErrorCode::Evaluation,
                format!("'{}' does not support subscripting", target.type_name()),
                span,
            )),
        }
    }

    /// `target = value`. An `Instance = Instance` pairing deep-copies
    /// the right side and requires both sides share a class; a
    /// `Vector = Vector` pairing coerces direction instead of requiring
    /// an exact match (spec §4.4, §9).
    pub fn assign<'a>(target: &Object<'a>, value: &Object<'a>, span: Span) -> Result<Object<'a>> {
        if let (Object::Instance(a), Object::Instance(b)) = (target, value) {
            if !a.same_class(b) {
                return Err(SpannedError::new(
                    ErrorCode::Evaluation,
                    "Assignment operator '=' doesn't support operands generated from different class definitions!",
                    span,
                ));
            }
            return Ok(Object::Instance(b.deep_clone()));
        }
        if let (Object::Vector(a), Object::Vector(b)) = (target, value) {
            return Ok(Object::Vector(b.coerced_to(a.direction)));
        }
        use Object::*;
        let same_tag = std::mem::discriminant(target) == std::mem::discriminant(value);
        if same_tag {
            return Ok(value.deep_clone());
        }
        Ok(match (target, value) {
            (Integer(_), Real(b)) => Integer(*b as i64),
            (Real(_), Integer(b)) => Real(*b as f64),
            (Integer(_), Character(b)) => Integer(*b as i64),
            (Integer(_), Byte(b)) => Integer(*b as i64),
            (Character(_), Integer(b)) => Character((*b as u8) as char),
            (Character(_), Byte(b)) => Character(*b as char),
            (Byte(_), Integer(b)) => Byte(*b as u8),
            (Byte(_), Character(b)) => Byte(*b as u8),
            (Complex(_), Integer(b)) => {
                Complex(Complex::from_real(*b as f64))
            }
            (Complex(_), Real(b)) => Complex(Complex::from_real(*b)),
            (Complex(_), Imaginary(b)) => {
                Complex(Complex::from_imaginary(*b))
            }
            (String(_), Character(b)) => String(b.to_string()),
            (String(_), Integer(b)) => String(b.to_string()),
            (String(_), Real(b)) => String(b.to_string()),
            (String(_), Imaginary(b)) => String(format!("{}i", b)),
            (String(_), Complex(b)) => String(b.to_string()),
            (String(_), Boolean(b)) => String(if *b { "true".to_string() } else { "false".to_string() }),
            _ => {
                return Err(SpannedError::new(
                    ErrorCode::Evaluation,
                    format!(
                        "Assignment operator '=' doesn't support operands of type '{}' and '{}'!",
                        target.type_name(),
                        value.type_name()
                    ),
                    span,
                ))
            }
        })
    }

    /// `target op= value` — computed as the corresponding binary op
    /// against the current value, then written back through [`assign`]
    /// (mirrors `applyMutableAssignment`'s delegate-then-store shape;
    /// only the eight compound operators the grammar recognises reach
    /// here).
    pub fn apply_compound<'a>(
        op: TokenKind,
        current: &Object<'a>,
        value: &Object<'a>,
        span: Span,
    ) -> Result<Object<'a>> {
        let computed = match op {
            TokenKind::PlusEqual => Self::add(current, value, span)?,
            TokenKind::MinusEqual => Self::sub(current, value, span)?,
            TokenKind::StarEqual => Self::mul(current, value, span)?,
            TokenKind::SlashEqual => Self::div(current, value, span)?,
            TokenKind::PercentEqual => Self::modulus(current, value, span)?,
            TokenKind::PipeEqual => Self::bitor(current, value, span)?,
            TokenKind::AmpEqual => Self::bitand(current, value, span)?,
            TokenKind::CaretEqual => Self::bitxor(current, value, span)?,
            _ => {
                return Err(SpannedError::new(
                    ErrorCode::Evaluation,
                    "unsupported compound-assignment operator",
                    span,
                ))
            }
        };
        Self::assign(current, &computed, span)
    }

    pub fn inner_product(bra: &Vector, ket: &Vector, span: Span) -> Result<Complex> {
        if bra.direction != Direction::Bra || ket.direction != Direction::Ket {
            return Err(SpannedError::new(
                ErrorCode::Evaluation,
                "Inner product '<Bra|Ket>' doesn't support Vectors that occupy the same space!",
                span,
            ));
        }
        bra.inner(ket, span)
    }

    /// `|a><b|` — deliberately unimplemented (spec §9 Open Question):
    /// the original evaluator's `applyOuterProduct` always returns
    /// `nullptr` and `Ket * Bra` in `applyMultiplication` is marked
    /// `// TODO: Outer Product.`. Kept as an explicit error here rather
    /// than silently producing a wrong value.
    pub fn outer_product(_ket: &Vector, _bra: &Vector, span: Span) -> Result<Object<'static>> {
        Err(SpannedError::new(
            ErrorCode::Evaluation,
            "outer product is not implemented",
            span,
        ))
    }

    pub fn same_class<'a>(class: &Class<'a>, instance: &Instance<'a>) -> bool {
        std::rc::Rc::ptr_eq(class, &instance.class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spin_base::Span;

    fn sp() -> Span {
        Span::at(0)
    }

    #[test]
    fn addition_is_commutative_for_mixed_numeric_types() {
        let a = Object::Integer(3);
        let b = Object::Imaginary(2.0);
        let l = Processor::add(&a, &b, sp()).unwrap();
        let r = Processor::add(&b, &a, sp()).unwrap();
        if let (Object::Complex(x), Object::Complex(y)) = (l, r) {
            assert_eq!(x, y);
        } else {
            panic!("expected Complex");
        }
    }

    #[test]
    fn string_concat_accepts_non_string_right_operand() {
        let s = Object::String("n=".to_string());
        let n = Object::Integer(42);
        let result = Processor::add(&s, &n, sp()).unwrap();
        assert!(matches!(result, Object::String(ref x) if x == "n=42"));
    }

    #[test]
    fn division_by_zero_integer_is_an_evaluation_error() {
        let a = Object::Integer(10);
        let b = Object::Integer(0);
        assert!(Processor::div(&a, &b, sp()).is_err());
    }

    #[test]
    fn byte_assignment_from_real_is_rejected() {
        // Confirmed absent from the original assignment table: Byte <- Real
        // is not a supported mixed-assignment pairing.
        let target = Object::Byte(0);
        let value = Object::Real(1.5);
        assert!(Processor::assign(&target, &value, sp()).is_err());
    }

    #[test]
    fn vector_assignment_coerces_direction() {
        let ket = Vector::basis(0, Direction::Ket);
        let bra = Vector::basis(0, Direction::Bra);
        let target = Object::Vector(ket.clone());
        let assigned = Processor::assign(&target, &Object::Vector(bra), sp()).unwrap();
        if let Object::Vector(v) = assigned {
            assert_eq!(v.direction, Direction::Ket);
        } else {
            panic!("expected Vector");
        }
    }

    #[test]
    fn outer_product_is_an_explicit_gap() {
        let ket = Vector::basis(0, Direction::Ket);
        let bra = Vector::basis(0, Direction::Bra);
        assert!(Processor::outer_product(&ket, &bra, sp()).is_err());
    }
}
