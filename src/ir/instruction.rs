//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::ir::{Block, Value};
use smallvec::{smallvec, SmallVec};
use std::fmt;
use std::fmt::{Display, Formatter};

#[cfg(feature = "enable-serde")]
use serde::{Deserialize, Serialize};

/// The binary operators, arithmetic and comparisons share one opcode.
///
/// Comparisons always yield [`Type::Bool`](crate::ir::Type::Bool), everything
/// else yields the type of its operands.
#[repr(u8)]
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum BinaryOp {
    /// `add`, wrapping addition
    Add,
    /// `sub`, wrapping subtraction
    Sub,
    /// `mul`, wrapping multiplication
    Mul,
    /// `quo`, truncating division
    Quo,
    /// `rem`, remainder with the sign of the dividend
    Rem,
    /// `and`, bitwise and
    And,
    /// `or`, bitwise or
    Or,
    /// `xor`, bitwise exclusive or
    Xor,
    /// `andnot`, bit clear (`a & ^b`)
    AndNot,
    /// `shl`, left shift
    Shl,
    /// `shr`, right shift (arithmetic if the operand is signed)
    Shr,
    /// `eq`, `a == b`
    Eq,
    /// `ne`, `a != b`
    Ne,
    /// `lt`, `a < b`
    Lt,
    /// `le`, `a <= b`
    Le,
    /// `gt`, `a > b`
    Gt,
    /// `ge`, `a >= b`
    Ge,
}

impl BinaryOp {
    /// Checks if the operator produces a `bool`.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    /// The comparison that holds if the operands are swapped, i.e. `a < b`
    /// becomes `b > a`. Non-comparisons are returned unchanged.
    ///
    /// ```
    /// # use garnet::ir::BinaryOp;
    /// assert_eq!(BinaryOp::Lt.swapped(), BinaryOp::Gt);
    /// assert_eq!(BinaryOp::Eq.swapped(), BinaryOp::Eq);
    /// ```
    pub fn swapped(self) -> Self {
        match self {
            BinaryOp::Lt => BinaryOp::Gt,
            BinaryOp::Le => BinaryOp::Ge,
            BinaryOp::Gt => BinaryOp::Lt,
            BinaryOp::Ge => BinaryOp::Le,
            other => other,
        }
    }

    /// The comparison that holds exactly when `self` does not, i.e. `a < b`
    /// becomes `a >= b`. Non-comparisons are returned unchanged.
    ///
    /// ```
    /// # use garnet::ir::BinaryOp;
    /// assert_eq!(BinaryOp::Lt.negated(), BinaryOp::Ge);
    /// assert_eq!(BinaryOp::Ne.negated(), BinaryOp::Eq);
    /// ```
    pub fn negated(self) -> Self {
        match self {
            BinaryOp::Eq => BinaryOp::Ne,
            BinaryOp::Ne => BinaryOp::Eq,
            BinaryOp::Lt => BinaryOp::Ge,
            BinaryOp::Le => BinaryOp::Gt,
            BinaryOp::Gt => BinaryOp::Le,
            BinaryOp::Ge => BinaryOp::Lt,
            other => other,
        }
    }

    /// The textual mnemonic of the operator.
    pub fn mnemonic(self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::Quo => "quo",
            BinaryOp::Rem => "rem",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Xor => "xor",
            BinaryOp::AndNot => "andnot",
            BinaryOp::Shl => "shl",
            BinaryOp::Shr => "shr",
            BinaryOp::Eq => "eq",
            BinaryOp::Ne => "ne",
            BinaryOp::Lt => "lt",
            BinaryOp::Le => "le",
            BinaryOp::Gt => "gt",
            BinaryOp::Ge => "ge",
        }
    }
}

impl Display for BinaryOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

/// The unary operators.
#[repr(u8)]
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum UnaryOp {
    /// `neg`, two's complement negation
    Neg,
    /// `not`, logical not of a `bool`
    Not,
    /// `compl`, bitwise complement
    Complement,
}

impl UnaryOp {
    /// The textual mnemonic of the operator.
    pub fn mnemonic(self) -> &'static str {
        match self {
            UnaryOp::Neg => "neg",
            UnaryOp::Not => "not",
            UnaryOp::Complement => "compl",
        }
    }
}

impl Display for UnaryOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

/// Every kind of instruction, along with its operands.
///
/// This is a closed set, analyses are expected to `match` on it exhaustively.
/// Terminators are the last instruction of their block and never yield a value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum InstKind {
    /// `lhs <op> rhs`.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// The left operand.
        lhs: Value,
        /// The right operand.
        rhs: Value,
    },
    /// `<op> x`.
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        x: Value,
    },
    /// A numeric conversion between integer types (or to/from floats).
    Convert {
        /// The value being converted.
        x: Value,
    },
    /// A conversion that doesn't change the representation, e.g. between two
    /// named types with the same underlying type.
    ChangeType {
        /// The value being converted.
        x: Value,
    },
    /// An SSA merge. `edges[i]` is the value flowing in from `preds[i]` of the
    /// block the phi lives in.
    Phi {
        /// The incoming values, in predecessor order.
        edges: SmallVec<[Value; 2]>,
    },
    /// An SSI branch split. Re-defines `x` on one outgoing edge of `from`'s
    /// terminator so that facts implied by the branch condition can be
    /// attached to the new value.
    Sigma {
        /// The predecessor whose terminator produced the edge.
        from: Block,
        /// The value being split.
        x: Value,
    },
    /// `x[low:high]` of a string. Missing bounds default to `0` and `len(x)`.
    Slice {
        /// The string being sliced.
        x: Value,
        /// The inclusive lower index.
        low: Option<Value>,
        /// The exclusive upper index.
        high: Option<Value>,
    },
    /// `len(x)`.
    Len {
        /// The string or channel.
        x: Value,
    },
    /// `cap(x)`.
    Cap {
        /// The channel.
        x: Value,
    },
    /// `make(chan T, size)`, `size` is `None` for an unbuffered channel.
    MakeChan {
        /// The buffer capacity.
        size: Option<Value>,
    },
    /// A call of some function, the result is completely opaque.
    Call {
        /// The function being called.
        callee: Value,
        /// The arguments.
        args: SmallVec<[Value; 4]>,
    },
    /// A two-way branch. The successors of the block are `[then, else]`.
    If {
        /// The `bool` being branched on.
        cond: Value,
    },
    /// A switch over constant cases. The successors of the block are one per
    /// entry of `conds` followed by the default.
    ConstantSwitch {
        /// The value being compared.
        tag: Value,
        /// The constants of each case.
        conds: SmallVec<[Value; 4]>,
    },
    /// An unconditional branch to the only successor.
    Jump,
    /// Exits the function.
    Return {
        /// The values being returned.
        results: SmallVec<[Value; 2]>,
    },
}

impl InstKind {
    /// Checks if this kind ends a block.
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            InstKind::If { .. }
                | InstKind::ConstantSwitch { .. }
                | InstKind::Jump
                | InstKind::Return { .. }
        )
    }

    /// Checks if this kind can ever yield a value.
    pub fn has_result(&self) -> bool {
        !self.is_terminator()
    }

    /// Gets the operands, in order.
    ///
    /// Note that this may be empty, it is not safe to assume that there is at
    /// least one operand.
    pub fn operands(&self) -> SmallVec<[Value; 4]> {
        match self {
            InstKind::Binary { lhs, rhs, .. } => smallvec![*lhs, *rhs],
            InstKind::Unary { x, .. }
            | InstKind::Convert { x }
            | InstKind::ChangeType { x }
            | InstKind::Sigma { x, .. }
            | InstKind::Len { x }
            | InstKind::Cap { x } => smallvec![*x],
            InstKind::Phi { edges } => edges.iter().copied().collect(),
            InstKind::Slice { x, low, high } => std::iter::once(*x)
                .chain(low.iter().copied())
                .chain(high.iter().copied())
                .collect(),
            InstKind::MakeChan { size } => size.iter().copied().collect(),
            InstKind::Call { callee, args } => {
                std::iter::once(*callee).chain(args.iter().copied()).collect()
            }
            InstKind::If { cond } => smallvec![*cond],
            InstKind::ConstantSwitch { tag, conds } => {
                std::iter::once(*tag).chain(conds.iter().copied()).collect()
            }
            InstKind::Jump => SmallVec::new(),
            InstKind::Return { results } => results.iter().copied().collect(),
        }
    }

    /// Gets mutable references to the operands, in the same order as
    /// [`Self::operands`]. This is what lets a pass rewrite uses in place.
    pub fn operands_mut(&mut self) -> SmallVec<[&mut Value; 4]> {
        match self {
            InstKind::Binary { lhs, rhs, .. } => smallvec![lhs, rhs],
            InstKind::Unary { x, .. }
            | InstKind::Convert { x }
            | InstKind::ChangeType { x }
            | InstKind::Sigma { x, .. }
            | InstKind::Len { x }
            | InstKind::Cap { x } => smallvec![x],
            InstKind::Phi { edges } => edges.iter_mut().collect(),
            InstKind::Slice { x, low, high } => std::iter::once(x)
                .chain(low.as_mut())
                .chain(high.as_mut())
                .collect(),
            InstKind::MakeChan { size } => size.as_mut().into_iter().collect(),
            InstKind::Call { callee, args } => {
                std::iter::once(callee).chain(args.iter_mut()).collect()
            }
            InstKind::If { cond } => smallvec![cond],
            InstKind::ConstantSwitch { tag, conds } => {
                std::iter::once(tag).chain(conds.iter_mut()).collect()
            }
            InstKind::Jump => SmallVec::new(),
            InstKind::Return { results } => results.iter_mut().collect(),
        }
    }

    /// The textual mnemonic of the instruction.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            InstKind::Binary { op, .. } => op.mnemonic(),
            InstKind::Unary { op, .. } => op.mnemonic(),
            InstKind::Convert { .. } => "convert",
            InstKind::ChangeType { .. } => "changetype",
            InstKind::Phi { .. } => "phi",
            InstKind::Sigma { .. } => "sigma",
            InstKind::Slice { .. } => "slice",
            InstKind::Len { .. } => "len",
            InstKind::Cap { .. } => "cap",
            InstKind::MakeChan { .. } => "makechan",
            InstKind::Call { .. } => "call",
            InstKind::If { .. } => "if",
            InstKind::ConstantSwitch { .. } => "switch",
            InstKind::Jump => "jump",
            InstKind::Return { .. } => "ret",
        }
    }
}

/// The data stored for every [`Inst`](crate::ir::Inst).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct InstData {
    pub(in crate::ir) kind: InstKind,
    pub(in crate::ir) block: Block,
    pub(in crate::ir) result: Option<Value>,
}

impl InstData {
    /// What the instruction does.
    #[inline]
    pub fn kind(&self) -> &InstKind {
        &self.kind
    }

    /// The block the instruction lives in.
    #[inline]
    pub fn block(&self) -> Block {
        self.block
    }

    /// The value the instruction yields, if it yields one.
    #[inline]
    pub fn result(&self) -> Option<Value> {
        self.result
    }

    /// Shorthand for `self.kind().operands()`.
    #[inline]
    pub fn operands(&self) -> SmallVec<[Value; 4]> {
        self.kind.operands()
    }

    /// Shorthand for `self.kind().is_terminator()`.
    #[inline]
    pub fn is_terminator(&self) -> bool {
        self.kind.is_terminator()
    }

    /// Checks if this is a [`InstKind::Phi`].
    #[inline]
    pub fn is_phi(&self) -> bool {
        matches!(self.kind, InstKind::Phi { .. })
    }

    /// Checks if this is a [`InstKind::Sigma`].
    #[inline]
    pub fn is_sigma(&self) -> bool {
        matches!(self.kind, InstKind::Sigma { .. })
    }
}
