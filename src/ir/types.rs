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
use static_assertions::assert_eq_size;
use std::fmt;
use std::fmt::{Display, Formatter};

#[cfg(feature = "enable-serde")]
use serde::{Deserialize, Serialize};

/// Whether an integer type is interpreted as two's complement or not.
#[repr(u8)]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum Signedness {
    /// Two's complement, `[-2^(N-1), 2^(N-1) - 1]`.
    Signed,
    /// Plain binary, `[0, 2^N - 1]`.
    Unsigned,
}

/// Models the fixed-width integer types, as an explicit `(width, signedness)` pair.
///
/// Widths are restricted to 8, 16, 32 and 64 bits.
///
/// ```
/// # use garnet::ir::*;
/// let t1 = IntType::u8();
/// assert_eq!(t1.width(), 8);
/// assert!(!t1.is_signed());
///
/// let t2 = IntType::new(8, Signedness::Unsigned).unwrap();
/// assert_eq!(t1, t2);
///
/// assert_ne!(t1, IntType::i8());
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct IntType {
    width: u8,
    signedness: Signedness,
}

assert_eq_size!(IntType, u16);

macro_rules! int_type_shorthand {
    ($n:tt, $name:ident, $sign:ident) => {
        #[doc = concat!("Shorthand for the `", stringify!($name), "` type.")]
        #[doc = ""]
        #[doc = "```"]
        #[doc = "# use garnet::ir::*;"]
        #[doc = concat!("let ty = IntType::", stringify!($name), "();")]
        #[doc = concat!("assert_eq!(ty.width(), ", stringify!($n), ");")]
        #[doc = "```"]
        pub const fn $name() -> Self {
            Self {
                width: $n,
                signedness: Signedness::$sign,
            }
        }
    };
}

impl IntType {
    /// Creates an integer type, if `width` is one of the supported widths.
    pub fn new(width: u32, signedness: Signedness) -> Option<Self> {
        match width {
            8 | 16 | 32 | 64 => Some(Self {
                width: width as u8,
                signedness,
            }),
            _ => None,
        }
    }

    int_type_shorthand!(8, i8, Signed);
    int_type_shorthand!(16, i16, Signed);
    int_type_shorthand!(32, i32, Signed);
    int_type_shorthand!(64, i64, Signed);
    int_type_shorthand!(8, u8, Unsigned);
    int_type_shorthand!(16, u16, Unsigned);
    int_type_shorthand!(32, u32, Unsigned);
    int_type_shorthand!(64, u64, Unsigned);

    /// Gets the width of the type in bits.
    #[inline]
    pub fn width(self) -> u32 {
        self.width as u32
    }

    /// Gets the signedness of the type.
    #[inline]
    pub fn signedness(self) -> Signedness {
        self.signedness
    }

    /// Shorthand for `self.signedness() == Signedness::Signed`.
    #[inline]
    pub fn is_signed(self) -> bool {
        self.signedness == Signedness::Signed
    }

    /// The smallest value representable by the type.
    ///
    /// ```
    /// # use garnet::ir::*;
    /// # use num_bigint::BigInt;
    /// assert_eq!(IntType::i8().min_value(), BigInt::from(-128));
    /// assert_eq!(IntType::u64().min_value(), BigInt::from(0));
    /// ```
    pub fn min_value(self) -> BigInt {
        match self.signedness {
            Signedness::Signed => -(BigInt::from(1) << (self.width() - 1)),
            Signedness::Unsigned => BigInt::from(0),
        }
    }

    /// The largest value representable by the type.
    ///
    /// ```
    /// # use garnet::ir::*;
    /// # use num_bigint::BigInt;
    /// assert_eq!(IntType::i8().max_value(), BigInt::from(127));
    /// assert_eq!(IntType::u16().max_value(), BigInt::from(65535));
    /// ```
    pub fn max_value(self) -> BigInt {
        match self.signedness {
            Signedness::Signed => (BigInt::from(1) << (self.width() - 1)) - 1,
            Signedness::Unsigned => (BigInt::from(1) << self.width()) - 1,
        }
    }

    /// Checks if `value` fits in the type without wrapping.
    pub fn contains(self, value: &BigInt) -> bool {
        *value >= self.min_value() && *value <= self.max_value()
    }
}

impl Display for IntType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let prefix = if self.is_signed() { 'i' } else { 'u' };

        write!(f, "{prefix}{}", self.width)
    }
}

/// The semantic type of a value.
///
/// Only what the analyses care about is modeled precisely: integers (tracked
/// by VRP), strings (tracked by length) and channels (tracked by capacity).
/// Everything else collapses into [`Type::Opaque`].
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum Type {
    /// `bool`, the result of comparisons and the input to `if`.
    Bool,
    /// A fixed-width integer.
    Int(IntType),
    /// A floating-point number of the given bit width. Never range-tracked.
    Float(u8),
    /// An immutable byte string.
    String,
    /// A (possibly buffered) channel.
    Chan,
    /// Anything else: pointers, aggregates, functions, interfaces.
    Opaque,
}

impl Type {
    /// Gets the integer type, if this is one.
    #[inline]
    pub fn as_int(self) -> Option<IntType> {
        match self {
            Type::Int(ty) => Some(ty),
            _ => None,
        }
    }

    /// Gets the integer type, panicking if this isn't one.
    #[inline]
    pub fn unwrap_int(self) -> IntType {
        self.as_int()
            .expect("expected an integer type, got something else")
    }

    /// Checks if this is [`Type::Int`].
    #[inline]
    pub fn is_int(self) -> bool {
        matches!(self, Type::Int(_))
    }

    /// Checks if this is [`Type::String`].
    #[inline]
    pub fn is_string(self) -> bool {
        matches!(self, Type::String)
    }

    /// Checks if this is [`Type::Chan`].
    #[inline]
    pub fn is_chan(self) -> bool {
        matches!(self, Type::Chan)
    }
}

impl From<IntType> for Type {
    fn from(ty: IntType) -> Self {
        Type::Int(ty)
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Type::Bool => write!(f, "bool"),
            Type::Int(ty) => write!(f, "{ty}"),
            Type::Float(width) => write!(f, "f{width}"),
            Type::String => write!(f, "string"),
            Type::Chan => write!(f, "chan"),
            Type::Opaque => write!(f, "opaque"),
        }
    }
}
