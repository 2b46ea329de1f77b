//! # Machine words
//! Every value the machines manipulate is a [`Word`]: either a signed 64 bit integer
//! or the `NaN` sentinel.
//!
//! Programs are never rejected. Instead, anything that cannot produce a number
//! (a malformed literal, popping an empty stack, dividing by zero) produces `NaN`,
//! which then silently propagates through arithmetic.

use core::{
    fmt::{Display, Formatter},
    ops::{Add, BitXor, Mul, Sub},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Word {
    Int(i64),
    NaN,
}
impl Default for Word {
    fn default() -> Self {
        Self::ZERO
    }
}
impl Word {
    pub const ZERO: Self = Self::Int(0);

    /// Returns the integer held by this word, if any.
    pub fn as_int(self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(value),
            Self::NaN => None,
        }
    }

    pub fn is_nan(self) -> bool {
        self == Self::NaN
    }

    pub fn is_zero(self) -> bool {
        self == Self::ZERO
    }

    /// Numeric equality as the machines see it: `NaN` is never equal to anything,
    /// itself included.
    /// # Example
    /// ```rust
    /// # use opasm::Word;
    /// assert!(Word::Int(3).equals(Word::Int(3)));
    /// assert!(!Word::NaN.equals(Word::NaN));
    /// ```
    pub fn equals(self, other: Self) -> bool {
        matches!((self, other), (Self::Int(a), Self::Int(b)) if a == b)
    }

    fn combine(self, rhs: Self, operation: impl FnOnce(i64, i64) -> Option<i64>) -> Self {
        match (self, rhs) {
            (Self::Int(a), Self::Int(b)) => operation(a, b).map_or(Self::NaN, Self::Int),
            _ => Self::NaN,
        }
    }

    /// Division rounding towards negative infinity.
    /// # Example
    /// ```rust
    /// # use opasm::Word;
    /// assert_eq!(Word::Int(9).floor_div(Word::Int(2)), Word::Int(4));
    /// assert_eq!(Word::Int(-9).floor_div(Word::Int(2)), Word::Int(-5));
    /// assert_eq!(Word::Int(9).floor_div(Word::ZERO), Word::NaN);
    /// ```
    pub fn floor_div(self, rhs: Self) -> Self {
        self.combine(rhs, |a, b| {
            let quotient = a.checked_div(b)?;
            Some(if a % b != 0 && (a < 0) != (b < 0) {
                quotient - 1
            } else {
                quotient
            })
        })
    }

    /// Remainder whose sign follows the dividend.
    /// # Example
    /// ```rust
    /// # use opasm::Word;
    /// assert_eq!(Word::Int(-7).truncating_rem(Word::Int(3)), Word::Int(-1));
    /// assert_eq!(Word::Int(7).truncating_rem(Word::ZERO), Word::NaN);
    /// ```
    pub fn truncating_rem(self, rhs: Self) -> Self {
        self.combine(rhs, i64::checked_rem)
    }
}
impl From<i64> for Word {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}
impl Add for Word {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        self.combine(rhs, |a, b| Some(a.wrapping_add(b)))
    }
}
impl Sub for Word {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        self.combine(rhs, |a, b| Some(a.wrapping_sub(b)))
    }
}
impl Mul for Word {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self::Output {
        self.combine(rhs, |a, b| Some(a.wrapping_mul(b)))
    }
}
impl BitXor for Word {
    type Output = Self;
    fn bitxor(self, rhs: Self) -> Self::Output {
        self.combine(rhs, |a, b| Some(a ^ b))
    }
}
impl Display for Word {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::NaN => f.write_str("NaN"),
        }
    }
}
