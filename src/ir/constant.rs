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
use std::fmt;
use std::fmt::{Display, Formatter};

#[cfg(feature = "enable-serde")]
use serde::{Deserialize, Serialize};

/// A compile-time constant operand.
///
/// Integer constants are arbitrary precision, the type of the value that
/// holds the constant decides what width it really has.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum Constant {
    /// An integer literal.
    Int(BigInt),
    /// `true` or `false`.
    Bool(bool),
    /// A string literal, the contents are kept for printing only.
    Str(String),
    /// The zero value of a channel or an opaque type.
    Nil,
}

impl Constant {
    /// Gets the integer value, if this is an integer.
    pub fn as_int(&self) -> Option<&BigInt> {
        match self {
            Constant::Int(i) => Some(i),
            _ => None,
        }
    }

    /// Gets the string value, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Constant::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl Display for Constant {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Int(i) => write!(f, "{i}"),
            Constant::Bool(b) => write!(f, "{b}"),
            Constant::Str(s) => write!(f, "{s:?}"),
            Constant::Nil => write!(f, "nil"),
        }
    }
}
