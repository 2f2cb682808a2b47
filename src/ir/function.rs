//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::arena::{ArenaKey, ArenaMap, SecondaryMap};
use crate::ir::{BasicBlock, Block, Inst, InstData, InstKind, Type, ValueData, ValueDef};
use crate::ir::{Constant, Value};
use smallvec::SmallVec;

#[cfg(feature = "enable-serde")]
use serde::{Deserialize, Serialize};

/// A single function in SSI form.
///
/// Every entity is owned by the function and addressed with a dense key:
/// blocks by [`Block`], instructions by [`Inst`], operands by [`Value`].
/// Def-use information is kept in a side table, see [`Self::referrers`].
///
/// Functions are produced by a [`FunctionBuilder`](crate::ir::FunctionBuilder)
/// (or a front-end built on top of one), and are read-only to the analyses.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct Function {
    pub(in crate::ir) name: String,
    pub(in crate::ir) blocks: ArenaMap<Block, BasicBlock>,
    pub(in crate::ir) insts: ArenaMap<Inst, InstData>,
    pub(in crate::ir) values: ArenaMap<Value, ValueData>,
    pub(in crate::ir) referrers: SecondaryMap<Value, SmallVec<[Inst; 4]>>,
    pub(in crate::ir) params: Vec<Value>,
}

impl Function {
    pub(in crate::ir) fn new(name: String) -> Self {
        Self {
            name,
            blocks: ArenaMap::new(),
            insts: ArenaMap::new(),
            values: ArenaMap::new(),
            referrers: SecondaryMap::new(),
            params: Vec::new(),
        }
    }

    /// Gets the name of the function.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the entry block. This is always the first block that was created.
    ///
    /// Panics if the function has no blocks at all.
    pub fn entry(&self) -> Block {
        assert!(!self.blocks.is_empty(), "function `{}` has no blocks", self.name);

        Block::new(0)
    }

    /// Every block, in layout order (entry first).
    pub fn blocks(&self) -> impl DoubleEndedIterator<Item = Block> + ExactSizeIterator {
        self.blocks.keys()
    }

    /// Resolves a block reference.
    #[inline]
    pub fn block(&self, block: Block) -> &BasicBlock {
        &self.blocks[block]
    }

    /// The number of blocks in the function.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Every instruction, block by block in layout order.
    pub fn insts(&self) -> impl Iterator<Item = Inst> + '_ {
        self.blocks
            .values()
            .flat_map(|block| block.insts.iter().copied())
    }

    /// Resolves an instruction reference.
    #[inline]
    pub fn inst(&self, inst: Inst) -> &InstData {
        &self.insts[inst]
    }

    /// The number of instructions in the function.
    pub fn inst_count(&self) -> usize {
        self.insts.len()
    }

    /// The value an instruction yields, if any.
    #[inline]
    pub fn inst_result(&self, inst: Inst) -> Option<Value> {
        self.insts[inst].result
    }

    /// Every value, in creation order.
    pub fn values(&self) -> impl DoubleEndedIterator<Item = Value> + ExactSizeIterator {
        self.values.keys()
    }

    /// Resolves a value reference.
    #[inline]
    pub fn value(&self, value: Value) -> &ValueData {
        &self.values[value]
    }

    /// The number of values in the function.
    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    /// Shorthand for `self.value(value).ty()`.
    #[inline]
    pub fn ty(&self, value: Value) -> Type {
        self.values[value].ty
    }

    /// Gets the constant `value` is, if it is one.
    #[inline]
    pub fn as_const(&self, value: Value) -> Option<&Constant> {
        self.values[value].as_const()
    }

    /// Gets the instruction defining `value`, if it's an instruction result.
    pub fn def_inst(&self, value: Value) -> Option<Inst> {
        match self.values[value].def {
            ValueDef::Inst(inst) => Some(inst),
            _ => None,
        }
    }

    /// Gets the kind of the instruction defining `value`, if it's an
    /// instruction result.
    pub fn def_kind(&self, value: Value) -> Option<&InstKind> {
        self.def_inst(value).map(|inst| &self.insts[inst].kind)
    }

    /// The parameters of the function, in order.
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Every instruction that uses `value` as an operand. Each instruction
    /// appears once, even if it uses `value` more than once.
    pub fn referrers(&self, value: Value) -> &[Inst] {
        self.referrers
            .get(value)
            .map(|users| users.as_slice())
            .unwrap_or(&[])
    }

    /// Gets the terminator of `block`, i.e. the instruction that decides which
    /// successor is taken. This is how branch conditions are recovered from a
    /// sigma's `from` block.
    pub fn control(&self, block: Block) -> Option<Inst> {
        self.blocks[block]
            .terminator()
            .filter(|&inst| self.insts[inst].is_terminator())
    }

    /// Checks if `a` dominates `b`, by walking up the dominator tree from `b`.
    ///
    /// Every block dominates itself. Unreachable blocks are dominated by nothing
    /// but themselves.
    pub fn dominates(&self, a: Block, b: Block) -> bool {
        let mut current = Some(b);

        while let Some(block) = current {
            if block == a {
                return true;
            }

            current = self.blocks[block].idom;
        }

        false
    }

    /// Replaces every use of `old` with `new`, keeping the referrer table in sync.
    ///
    /// This is the one mutation allowed after a function is built, it exists
    /// for transforms that fold a value into another one.
    pub fn replace_all_uses(&mut self, old: Value, new: Value) {
        let users = match self.referrers.remove(old) {
            Some(users) => users,
            None => return,
        };

        for &inst in users.iter() {
            for operand in self.insts[inst].kind.operands_mut() {
                if *operand == old {
                    *operand = new;
                }
            }

            self.add_referrer(new, inst);
        }
    }

    pub(in crate::ir) fn add_referrer(&mut self, value: Value, inst: Inst) {
        let users = self.referrers.get_or_insert_with(value, SmallVec::new);

        if !users.contains(&inst) {
            users.push(inst);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ir::*;

    #[test]
    fn referrers_are_deduplicated() {
        let mut b = FunctionBuilder::new("square");
        let entry = b.create_block("entry");
        b.switch_to(entry);

        let x = b.param(Type::Int(IntType::i64()), "x");
        let sq = b.binary(BinaryOp::Mul, x, x);
        b.ret(&[sq]);

        let func = b.finish();
        let mul = func.def_inst(sq).unwrap();

        assert_eq!(func.referrers(x), &[mul]);
        assert_eq!(func.referrers(sq).len(), 1);
    }

    #[test]
    fn replace_all_uses_updates_referrers() {
        let mut b = FunctionBuilder::new("f");
        let entry = b.create_block("entry");
        b.switch_to(entry);

        let x = b.param(Type::Int(IntType::i64()), "x");
        let y = b.param(Type::Int(IntType::i64()), "y");
        let sum = b.binary(BinaryOp::Add, x, x);
        b.ret(&[sum]);

        let mut func = b.finish();
        let add = func.def_inst(sum).unwrap();

        func.replace_all_uses(x, y);

        assert!(func.referrers(x).is_empty());
        assert_eq!(func.referrers(y), &[add]);
        assert_eq!(func.inst(add).operands().as_slice(), &[y, y]);
    }

    #[test]
    fn control_is_the_terminator() {
        let mut b = FunctionBuilder::new("f");
        let entry = b.create_block("entry");
        let exit = b.create_block("exit");
        b.switch_to(entry);

        let c = b.bconst(true);
        b.if_(c, exit, exit);
        b.switch_to(exit);
        b.ret(&[]);

        let func = b.finish();
        let control = func.control(entry).unwrap();

        assert_eq!(func.inst(control).kind(), &InstKind::If { cond: c });
        assert!(func.dominates(entry, exit));
        assert!(!func.dominates(exit, entry));
    }
}
