//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::ir::{Block, Inst};
use smallvec::SmallVec;

#[cfg(feature = "enable-serde")]
use serde::{Deserialize, Serialize};

/// Models a single basic block in a function.
///
/// These are made up of a few key things:
///
///   1. A linear sequence of instructions: phis first, then sigmas, then the
///      body, ending in exactly one terminator.
///   2. Ordered predecessor and successor lists. The order is significant,
///      phi edges line up with `preds` and terminators line up with `succs`.
///   3. Dominance information, filled in once the function is finished.
///
/// ```other
/// loop:
///   %3 = phi i64 [%0, %5]
///   %4 = lt bool %3, %1
///   if %4 then body else exit
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct BasicBlock {
    pub(in crate::ir) name: String,
    pub(in crate::ir) insts: Vec<Inst>,
    pub(in crate::ir) preds: SmallVec<[Block; 2]>,
    pub(in crate::ir) succs: SmallVec<[Block; 2]>,
    pub(in crate::ir) idom: Option<Block>,
    pub(in crate::ir) dominees: SmallVec<[Block; 2]>,
    pub(in crate::ir) phis: usize,
    pub(in crate::ir) sigmas: usize,
}

impl BasicBlock {
    pub(in crate::ir) fn new(name: String) -> Self {
        Self {
            name,
            insts: Vec::new(),
            preds: SmallVec::new(),
            succs: SmallVec::new(),
            idom: None,
            dominees: SmallVec::new(),
            phis: 0,
            sigmas: 0,
        }
    }

    /// Gets the name of the block.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Every instruction in the block, in order.
    pub fn insts(&self) -> &[Inst] {
        &self.insts
    }

    /// The phis at the head of the block.
    pub fn phis(&self) -> &[Inst] {
        &self.insts[..self.phis]
    }

    /// The sigmas directly after the phis.
    pub fn sigmas(&self) -> &[Inst] {
        &self.insts[self.phis..self.phis + self.sigmas]
    }

    /// The predecessors, in phi-edge order.
    pub fn preds(&self) -> &[Block] {
        &self.preds
    }

    /// The successors, in terminator order.
    pub fn succs(&self) -> &[Block] {
        &self.succs
    }

    /// The immediate dominator. `None` for the entry block and for
    /// unreachable blocks.
    pub fn idom(&self) -> Option<Block> {
        self.idom
    }

    /// The blocks that this block immediately dominates.
    pub fn dominees(&self) -> &[Block] {
        &self.dominees
    }

    /// Gets the terminator, if the block has one yet.
    pub fn terminator(&self) -> Option<Inst> {
        self.insts.last().copied()
    }
}
