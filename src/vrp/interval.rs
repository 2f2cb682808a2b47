//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::ir::{IntType, Type};
use crate::vrp::Z;
use num_bigint::BigInt;
use std::fmt;
use std::fmt::{Display, Formatter};

#[cfg(feature = "enable-serde")]
use serde::{Deserialize, Serialize};

/// A closed interval `[lower, upper]` over [`Z`].
///
/// There are two special states besides a normal interval:
///
///   1. *Unknown*: nothing has been computed yet. This is different from
///      `[-∞, ∞]`, which is a computed result that happens to say nothing.
///   2. *Empty*: a known interval with no members, i.e. an infeasible path.
///      Every way of writing an empty interval (`lower > upper`, a lower
///      bound of `∞`, an upper bound of `-∞`) is normalized to the same value.
///
/// ```
/// # use garnet::vrp::*;
/// let a = IntInterval::new(Z::from(0), Z::from(9));
/// let b = IntInterval::new(Z::from(5), Z::PosInf);
///
/// assert_eq!(a.intersection(&b), IntInterval::new(Z::from(5), Z::from(9)));
/// assert_eq!(a.union(&b), IntInterval::new(Z::from(0), Z::PosInf));
/// assert!(IntInterval::new(Z::from(3), Z::from(2)).is_empty());
/// assert!(!IntInterval::unknown().is_known());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct IntInterval {
    known: bool,
    lower: Z,
    upper: Z,
}

impl IntInterval {
    /// The interval that hasn't been computed yet.
    pub fn unknown() -> Self {
        Self {
            known: false,
            lower: Z::NegInf,
            upper: Z::PosInf,
        }
    }

    /// Creates `[lower, upper]`, normalizing it if it's empty.
    pub fn new(lower: Z, upper: Z) -> Self {
        if lower > upper || lower == Z::PosInf || upper == Z::NegInf {
            return Self::empty();
        }

        Self {
            known: true,
            lower,
            upper,
        }
    }

    /// The canonical empty interval.
    pub fn empty() -> Self {
        Self {
            known: true,
            lower: Z::PosInf,
            upper: Z::NegInf,
        }
    }

    /// `[-∞, ∞]`.
    pub fn unbounded() -> Self {
        Self::new(Z::NegInf, Z::PosInf)
    }

    /// `[c, c]`.
    pub fn constant(c: impl Into<BigInt>) -> Self {
        let c = Z::Finite(c.into());

        Self::new(c.clone(), c)
    }

    /// `[min, max]` of an integer type.
    pub fn of_type(ty: IntType) -> Self {
        Self::new(Z::from(ty.min_value()), Z::from(ty.max_value()))
    }

    /// Checks if the interval has been computed.
    #[inline]
    pub fn is_known(&self) -> bool {
        self.known
    }

    /// Checks if the interval is known and has no members.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.known && self.lower > self.upper
    }

    /// Checks if the interval is known to be `[-∞, ∞]`.
    pub fn is_unbounded(&self) -> bool {
        self.known && self.lower == Z::NegInf && self.upper == Z::PosInf
    }

    /// The lower bound. Meaningless for unknown or empty intervals.
    #[inline]
    pub fn lower(&self) -> &Z {
        &self.lower
    }

    /// The upper bound. Meaningless for unknown or empty intervals.
    #[inline]
    pub fn upper(&self) -> &Z {
        &self.upper
    }

    /// Checks if `n` is a member of the interval.
    pub fn contains(&self, n: &BigInt) -> bool {
        self.known && !self.is_empty() && self.lower <= *n && self.upper >= *n
    }

    /// The smallest interval containing both. Unknown and empty intervals are
    /// the identity.
    pub fn union(&self, other: &Self) -> Self {
        if !self.known || other.is_empty() {
            return other.clone().or_else(self);
        }

        if !other.known || self.is_empty() {
            return self.clone().or_else(other);
        }

        Self::new(
            self.lower.clone().min(other.lower.clone()),
            self.upper.clone().max(other.upper.clone()),
        )
    }

    /// The largest interval contained in both. An unknown interval is the
    /// identity, an empty one absorbs everything.
    pub fn intersection(&self, other: &Self) -> Self {
        if !self.known {
            return other.clone();
        }

        if !other.known {
            return self.clone();
        }

        if self.is_empty() || other.is_empty() {
            return Self::empty();
        }

        Self::new(
            self.lower.clone().max(other.lower.clone()),
            self.upper.clone().min(other.upper.clone()),
        )
    }

    /// `self + other`.
    pub fn add(&self, other: &Self) -> Self {
        self.combine(other, |a, b| {
            Self::new(
                a.lower.clone() + b.lower.clone(),
                a.upper.clone() + b.upper.clone(),
            )
        })
    }

    /// `self - other`.
    pub fn sub(&self, other: &Self) -> Self {
        self.combine(other, |a, b| {
            Self::new(
                a.lower.clone() - b.upper.clone(),
                a.upper.clone() - b.lower.clone(),
            )
        })
    }

    /// `self · other`.
    pub fn mul(&self, other: &Self) -> Self {
        self.combine(other, |a, b| {
            let products = [
                a.lower.product(&b.lower),
                a.lower.product(&b.upper),
                a.upper.product(&b.lower),
                a.upper.product(&b.upper),
            ];

            let lower = products.iter().min().cloned().unwrap_or(Z::NegInf);
            let upper = products.iter().max().cloned().unwrap_or(Z::PosInf);

            Self::new(lower, upper)
        })
    }

    // unknown in, unknown out. empty in, empty out
    fn combine(&self, other: &Self, f: impl FnOnce(&Self, &Self) -> Self) -> Self {
        if !self.known || !other.known {
            Self::unknown()
        } else if self.is_empty() || other.is_empty() {
            Self::empty()
        } else {
            f(self, other)
        }
    }

    // `self` if it carries information, `fallback` otherwise
    fn or_else(self, fallback: &Self) -> Self {
        if self.known && !self.is_empty() {
            self
        } else if fallback.known {
            fallback.clone()
        } else {
            self
        }
    }
}

impl Display for IntInterval {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if !self.known {
            write!(f, "[unknown]")
        } else if self.is_empty() {
            write!(f, "[empty]")
        } else {
            write!(f, "[{}, {}]", self.lower, self.upper)
        }
    }
}

/// The possible byte lengths of a string.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct StringInterval {
    /// The length interval.
    pub length: IntInterval,
}

/// The possible buffer capacities of a channel.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct ChannelInterval {
    /// The capacity interval.
    pub size: IntInterval,
}

/// The range of one value, the variant depends on the value's type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum Range {
    /// An integer's value.
    Int(IntInterval),
    /// A string's length.
    String(StringInterval),
    /// A channel's capacity.
    Channel(ChannelInterval),
}

impl Range {
    /// Checks if `ty` is tracked at all.
    pub fn is_tracked(ty: Type) -> bool {
        matches!(ty, Type::Int(_) | Type::String | Type::Chan)
    }

    /// An unknown range of the right kind for `ty`, `None` for untracked types.
    pub fn unknown(ty: Type) -> Option<Self> {
        Self::for_type(ty, IntInterval::unknown())
    }

    /// The least precise range for `ty`: the type's bounds for integers,
    /// `[0, ∞]` for string lengths and channel capacities.
    pub fn maximal(ty: Type) -> Option<Self> {
        match ty {
            Type::Int(int) => Some(Range::Int(IntInterval::of_type(int))),
            _ => Self::for_type(ty, IntInterval::new(Z::from(0), Z::PosInf)),
        }
    }

    /// Wraps `interval` in the kind of range `ty` has.
    pub fn for_type(ty: Type, interval: IntInterval) -> Option<Self> {
        match ty {
            Type::Int(_) => Some(Range::Int(interval)),
            Type::String => Some(Range::String(StringInterval { length: interval })),
            Type::Chan => Some(Range::Channel(ChannelInterval { size: interval })),
            _ => None,
        }
    }

    /// The underlying interval, whichever kind of range this is.
    pub fn interval(&self) -> &IntInterval {
        match self {
            Range::Int(i) => i,
            Range::String(s) => &s.length,
            Range::Channel(c) => &c.size,
        }
    }

    /// Replaces the underlying interval, keeping the kind.
    pub fn with_interval(&self, interval: IntInterval) -> Self {
        match self {
            Range::Int(_) => Range::Int(interval),
            Range::String(_) => Range::String(StringInterval { length: interval }),
            Range::Channel(_) => Range::Channel(ChannelInterval { size: interval }),
        }
    }

    /// Gets the integer interval, if this is one.
    pub fn as_int(&self) -> Option<&IntInterval> {
        match self {
            Range::Int(i) => Some(i),
            _ => None,
        }
    }

    /// Shorthand for `self.interval().is_known()`.
    pub fn is_known(&self) -> bool {
        self.interval().is_known()
    }
}

impl Display for Range {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Range::Int(i) => write!(f, "{i}"),
            Range::String(s) => write!(f, "len {}", s.length),
            Range::Channel(c) => write!(f, "cap {}", c.size),
        }
    }
}
