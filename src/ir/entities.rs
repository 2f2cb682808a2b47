//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::dense_arena_key;
use crate::ir::{Constant, Type};

#[cfg(feature = "enable-serde")]
use serde::{Deserialize, Serialize};

dense_arena_key! {
    /// A reference to anything that can be used as an operand: a constant, a
    /// parameter, a global, a free variable, or the result of an instruction.
    ///
    /// These are keys into the owning [`Function`](crate::ir::Function), and are
    /// meaningless without it. They are also what every analysis attaches facts to.
    pub struct Value;

    /// A reference to an instruction. Unlike [`Value`]s, these exist for every
    /// instruction including the ones that don't produce a result (`if`, `jump`,
    /// `return`).
    ///
    /// Instructions that do produce a result have both an `Inst` and a `Value`,
    /// see [`Function::inst_result`](crate::ir::Function::inst_result).
    pub struct Inst;

    /// A reference to a basic block in a function.
    pub struct Block;
}

/// Where a [`Value`] comes from.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum ValueDef {
    /// A literal.
    Const(Constant),
    /// The `n`th parameter of the function.
    Param(u32),
    /// A package-level variable. Its contents are unknown to the function.
    Global,
    /// The `n`th captured variable of a closure.
    FreeVar(u32),
    /// The result of an instruction.
    Inst(Inst),
}

/// The data stored for every [`Value`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct ValueData {
    pub(in crate::ir) def: ValueDef,
    pub(in crate::ir) ty: Type,
    pub(in crate::ir) name: Option<String>,
}

impl ValueData {
    /// Where the value comes from.
    #[inline]
    pub fn def(&self) -> &ValueDef {
        &self.def
    }

    /// The semantic type of the value.
    #[inline]
    pub fn ty(&self) -> Type {
        self.ty
    }

    /// The source-level name of the value, if the front-end gave it one.
    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Gets the constant, if this value is one.
    #[inline]
    pub fn as_const(&self) -> Option<&Constant> {
        match &self.def {
            ValueDef::Const(c) => Some(c),
            _ => None,
        }
    }
}
