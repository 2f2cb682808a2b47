//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use num_bigint::BigInt;
use num_traits::{Signed, Zero};
use std::cmp::Ordering;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::ops::{Add, Mul, Neg, Sub};

#[cfg(feature = "enable-serde")]
use serde::{Deserialize, Serialize};

/// An arbitrary-precision integer extended with `-∞` and `+∞`.
///
/// The derived ordering is the natural one, `-∞` is below every finite
/// value and `+∞` is above.
///
/// Arithmetic follows the usual extended-real rules with `0 · ±∞ = 0`. The
/// indeterminate forms (`∞ - ∞` and friends) have no value, the `checked_*`
/// methods return `None` for them and the operators panic. Bounds of
/// non-empty intervals never produce one.
///
/// ```
/// # use garnet::vrp::Z;
/// let five = Z::from(5);
///
/// assert_eq!(five.clone() + Z::PosInf, Z::PosInf);
/// assert_eq!(Z::from(0) * Z::NegInf, Z::from(0));
/// assert!(Z::NegInf < five && five < Z::PosInf);
/// assert_eq!(Z::PosInf.checked_sub(&Z::PosInf), None);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum Z {
    /// `-∞`
    NegInf,
    /// A plain integer.
    Finite(BigInt),
    /// `+∞`
    PosInf,
}

impl Z {
    /// Checks if this isn't one of the infinities.
    #[inline]
    pub fn is_finite(&self) -> bool {
        matches!(self, Z::Finite(_))
    }

    /// Gets the integer, if this is finite.
    #[inline]
    pub fn as_finite(&self) -> Option<&BigInt> {
        match self {
            Z::Finite(n) => Some(n),
            _ => None,
        }
    }

    /// `-1`, `0` or `1` depending on the sign.
    pub fn signum(&self) -> i8 {
        match self {
            Z::NegInf => -1,
            Z::PosInf => 1,
            Z::Finite(n) if n.is_zero() => 0,
            Z::Finite(n) if n.is_negative() => -1,
            Z::Finite(_) => 1,
        }
    }

    /// `self + other`, or `None` for `∞ + -∞`.
    pub fn checked_add(&self, other: &Z) -> Option<Z> {
        match (self, other) {
            (Z::Finite(a), Z::Finite(b)) => Some(Z::Finite(a + b)),
            (Z::NegInf, Z::PosInf) | (Z::PosInf, Z::NegInf) => None,
            (Z::NegInf, _) | (_, Z::NegInf) => Some(Z::NegInf),
            (Z::PosInf, _) | (_, Z::PosInf) => Some(Z::PosInf),
        }
    }

    /// `self - other`, or `None` for `∞ - ∞`.
    pub fn checked_sub(&self, other: &Z) -> Option<Z> {
        self.checked_add(&-other.clone())
    }

    /// `self · other`. Always defined, `0 · ±∞ = 0`.
    pub fn product(&self, other: &Z) -> Z {
        match (self, other) {
            (Z::Finite(a), Z::Finite(b)) => Z::Finite(a * b),
            _ => match self.signum() * other.signum() {
                0 => Z::Finite(BigInt::zero()),
                s if s > 0 => Z::PosInf,
                _ => Z::NegInf,
            },
        }
    }
}

impl From<BigInt> for Z {
    fn from(n: BigInt) -> Self {
        Z::Finite(n)
    }
}

impl From<&BigInt> for Z {
    fn from(n: &BigInt) -> Self {
        Z::Finite(n.clone())
    }
}

impl From<i64> for Z {
    fn from(n: i64) -> Self {
        Z::Finite(BigInt::from(n))
    }
}

impl PartialEq<i64> for Z {
    fn eq(&self, other: &i64) -> bool {
        matches!(self, Z::Finite(n) if *n == BigInt::from(*other))
    }
}

impl PartialOrd<BigInt> for Z {
    fn partial_cmp(&self, other: &BigInt) -> Option<Ordering> {
        Some(match self {
            Z::NegInf => Ordering::Less,
            Z::Finite(n) => n.cmp(other),
            Z::PosInf => Ordering::Greater,
        })
    }
}

impl PartialEq<BigInt> for Z {
    fn eq(&self, other: &BigInt) -> bool {
        matches!(self, Z::Finite(n) if n == other)
    }
}

impl Neg for Z {
    type Output = Z;

    fn neg(self) -> Z {
        match self {
            Z::NegInf => Z::PosInf,
            Z::Finite(n) => Z::Finite(-n),
            Z::PosInf => Z::NegInf,
        }
    }
}

impl Add for Z {
    type Output = Z;

    fn add(self, other: Z) -> Z {
        self.checked_add(&other)
            .unwrap_or_else(|| panic!("indeterminate form: {self} + {other}"))
    }
}

impl Sub for Z {
    type Output = Z;

    fn sub(self, other: Z) -> Z {
        self.checked_sub(&other)
            .unwrap_or_else(|| panic!("indeterminate form: {self} - {other}"))
    }
}

impl Mul for Z {
    type Output = Z;

    fn mul(self, other: Z) -> Z {
        self.product(&other)
    }
}

impl Display for Z {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Z::NegInf => write!(f, "-∞"),
            Z::Finite(n) => write!(f, "{n}"),
            Z::PosInf => write!(f, "∞"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_puts_infinities_at_the_ends() {
        let mut values = vec![Z::PosInf, Z::from(3), Z::NegInf, Z::from(-7)];

        values.sort();

        assert_eq!(values, [Z::NegInf, Z::from(-7), Z::from(3), Z::PosInf]);
        assert!(Z::NegInf < BigInt::from(i64::MIN));
        assert!(Z::from(4) > BigInt::from(3));
    }

    #[test]
    fn infinite_arithmetic() {
        assert_eq!(Z::from(1) - Z::PosInf, Z::NegInf);
        assert_eq!(Z::NegInf + Z::NegInf, Z::NegInf);
        assert_eq!(Z::from(-2) * Z::PosInf, Z::NegInf);
        assert_eq!(Z::NegInf * Z::NegInf, Z::PosInf);
        assert_eq!(Z::from(0) * Z::PosInf, 0);
        assert_eq!(Z::NegInf.checked_add(&Z::PosInf), None);
        assert_eq!(Z::NegInf.checked_sub(&Z::NegInf), None);
    }

    #[test]
    #[should_panic(expected = "indeterminate form")]
    fn indeterminate_sum_panics() {
        let _ = Z::PosInf + Z::NegInf;
    }

    #[test]
    fn display() {
        assert_eq!(Z::NegInf.to_string(), "-∞");
        assert_eq!(Z::from(42).to_string(), "42");
        assert_eq!(Z::PosInf.to_string(), "∞");
    }
}
