//! Exact numbers: machine integers and rationals in lowest terms.
//!
//! Every rational carries a denominator greater than one and a numerator
//! coprime to it; any result whose denominator reduces to one collapses to
//! an integer, so each numeric value has exactly one representation.
//! Intermediate products are computed in `i128` and checked back into the
//! `i64` range, raising [`RuntimeError::Overflow`] instead of wrapping.

use std::cmp::Ordering;
use std::fmt;

use num::integer::gcd;

use crate::RuntimeError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Number {
    Int(i64),
    Rational(i64, i64),
}

// Plain scalar data: nothing for the collector to trace.
impl gc::Finalize for Number {}
unsafe impl gc::Trace for Number {
    gc::unsafe_empty_trace!();
}

/// Reduce `num/den` to lowest terms with a positive denominator and
/// collapse to `Int` when the denominator becomes one.
fn normalized(mut num: i128, mut den: i128, op: &'static str) -> Result<Number, RuntimeError> {
    if den == 0 {
        return Err(RuntimeError::DivisionByZero);
    }
    if den < 0 {
        num = -num;
        den = -den;
    }
    let g = gcd(num, den);
    num /= g;
    den /= g;
    let num = i64::try_from(num).map_err(|_| RuntimeError::Overflow(op))?;
    let den = i64::try_from(den).map_err(|_| RuntimeError::Overflow(op))?;
    if den == 1 {
        Ok(Number::Int(num))
    } else {
        Ok(Number::Rational(num, den))
    }
}

impl Number {
    /// Construct a normalized number from an arbitrary numerator and
    /// denominator. Fails with `DivisionByZero` when `den` is zero.
    pub fn ratio(num: i64, den: i64) -> Result<Number, RuntimeError> {
        normalized(i128::from(num), i128::from(den), "rational normalization")
    }

    fn parts(self) -> (i128, i128) {
        match self {
            Number::Int(n) => (i128::from(n), 1),
            Number::Rational(n, d) => (i128::from(n), i128::from(d)),
        }
    }

    pub fn is_zero(self) -> bool {
        matches!(self, Number::Int(0))
    }

    pub fn add(self, other: Number) -> Result<Number, RuntimeError> {
        let (a, b) = self.parts();
        let (c, d) = other.parts();
        normalized(a * d + c * b, b * d, "addition")
    }

    pub fn sub(self, other: Number) -> Result<Number, RuntimeError> {
        let (a, b) = self.parts();
        let (c, d) = other.parts();
        normalized(a * d - c * b, b * d, "subtraction")
    }

    pub fn mul(self, other: Number) -> Result<Number, RuntimeError> {
        let (a, b) = self.parts();
        let (c, d) = other.parts();
        normalized(a * c, b * d, "multiplication")
    }

    pub fn div(self, other: Number) -> Result<Number, RuntimeError> {
        if other.is_zero() {
            return Err(RuntimeError::DivisionByZero);
        }
        let (a, b) = self.parts();
        let (c, d) = other.parts();
        normalized(a * d, b * c, "division")
    }

    pub fn neg(self) -> Result<Number, RuntimeError> {
        let (a, b) = self.parts();
        normalized(-a, b, "negation")
    }

    /// Three-way numeric comparison by cross-multiplication. Denominators
    /// are always positive, so the product comparison preserves order.
    pub fn compare(self, other: Number) -> Ordering {
        let (a, b) = self.parts();
        let (c, d) = other.parts();
        (a * d).cmp(&(c * b))
    }

    /// Integer remainder; the sign follows the first operand. Defined only
    /// on two integers.
    pub fn modulo(self, other: Number) -> Result<Number, RuntimeError> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => {
                if b == 0 {
                    return Err(RuntimeError::DivisionByZero);
                }
                a.checked_rem(b)
                    .map(Number::Int)
                    .ok_or(RuntimeError::Overflow("modulo"))
            }
            (Number::Int(_), other) | (other, _) => {
                Err(RuntimeError::wrong_type("integer", other))
            }
        }
    }

    /// Fast integer exponentiation. The exponent must be non-negative,
    /// `0^0` is rejected, and every intermediate result must stay inside
    /// the signed 32-bit range.
    pub fn expt(self, exponent: Number) -> Result<Number, RuntimeError> {
        let (Number::Int(base), Number::Int(exp)) = (self, exponent) else {
            let found = match self {
                Number::Int(_) => exponent,
                other => other,
            };
            return Err(RuntimeError::wrong_type("integer", found));
        };
        if exp < 0 {
            return Err(RuntimeError::Domain("negative exponent in expt"));
        }
        if base == 0 && exp == 0 {
            return Err(RuntimeError::Domain("0^0 is undefined"));
        }

        let fits = |n: i64| n >= i64::from(i32::MIN) && n <= i64::from(i32::MAX);
        let mut result: i64 = 1;
        let mut square = base;
        let mut exp = exp;
        while exp > 0 {
            if exp & 1 == 1 {
                result = result
                    .checked_mul(square)
                    .ok_or(RuntimeError::Overflow("expt"))?;
                if !fits(result) {
                    return Err(RuntimeError::Overflow("expt"));
                }
            }
            exp >>= 1;
            if exp > 0 {
                square = square
                    .checked_mul(square)
                    .ok_or(RuntimeError::Overflow("expt"))?;
            }
        }
        Ok(Number::Int(result))
    }
}

/// Try to reinterpret an identifier as a number, per the grammar: optional
/// sign, optional integer digits, optional `.` with fraction digits,
/// optional `e`/`E` with a signed integer exponent; the identifier must be
/// consumed entirely and contain at least one digit before the exponent.
/// Out-of-range literals are not numbers.
pub fn parse_numeric_identifier(ident: &str) -> Option<Number> {
    let bytes = ident.as_bytes();
    let n = bytes.len();
    let mut i = 0;

    let mut negative = false;
    if i < n && (bytes[i] == b'+' || bytes[i] == b'-') {
        negative = bytes[i] == b'-';
        i += 1;
    }
    if i >= n {
        return None;
    }

    let mut int_part: i128 = 0;
    let mut has_int = false;
    while i < n && bytes[i].is_ascii_digit() {
        has_int = true;
        int_part = int_part
            .checked_mul(10)?
            .checked_add(i128::from(bytes[i] - b'0'))?;
        i += 1;
    }

    let mut frac_part: i128 = 0;
    let mut frac_den: i128 = 1;
    let mut has_frac = false;
    if i < n && bytes[i] == b'.' {
        i += 1;
        while i < n && bytes[i].is_ascii_digit() {
            has_frac = true;
            frac_part = frac_part
                .checked_mul(10)?
                .checked_add(i128::from(bytes[i] - b'0'))?;
            frac_den = frac_den.checked_mul(10)?;
            i += 1;
        }
    }

    let mut exp_val: u32 = 0;
    let mut exp_negative = false;
    if i < n && (bytes[i] == b'e' || bytes[i] == b'E') {
        i += 1;
        if i < n && (bytes[i] == b'+' || bytes[i] == b'-') {
            exp_negative = bytes[i] == b'-';
            i += 1;
        }
        if i >= n || !bytes[i].is_ascii_digit() {
            return None;
        }
        while i < n && bytes[i].is_ascii_digit() {
            exp_val = exp_val
                .checked_mul(10)?
                .checked_add(u32::from(bytes[i] - b'0'))?;
            i += 1;
        }
    }

    if i != n || (!has_int && !has_frac) {
        return None;
    }

    let mut num = int_part.checked_mul(frac_den)?.checked_add(frac_part)?;
    let mut den = frac_den;
    let scale = 10i128.checked_pow(exp_val)?;
    if exp_negative {
        den = den.checked_mul(scale)?;
    } else {
        num = num.checked_mul(scale)?;
    }
    if negative {
        num = -num;
    }
    normalized(num, den, "numeric literal").ok()
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(n) => write!(f, "{n}"),
            Number::Rational(n, d) => write!(f, "{n}/{d}"),
        }
    }
}
