//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::arena::SecondaryMap;
use crate::ir::{Block, Function};
use crate::utility::SaHashSet;
use smallvec::SmallVec;

/// Models the dominator tree for a given control-flow graph. This analysis
/// also gives a reverse postorder for the blocks in the CFG (as this is
/// required for calculating dominators, and is useful information for
/// other analyses to have as well).
///
/// [`FunctionBuilder::finish`](crate::ir::FunctionBuilder::finish) runs this
/// and stores the result on each block, most code never needs one directly.
///
/// # Implementation
/// The algorithm used is described in "A Simple, Fast Dominance Algorithm"
/// by Cooper et. al.
///
/// This implementation stores a tree inside of an arena instead of
/// a direct tree with separately allocated nodes, but the rough
/// "dominator tree" structure still exists.
#[derive(Debug, Clone)]
pub struct DominatorTree {
    // maps B -> idom(B) for given block B. the root maps to itself, and
    // unreachable blocks have no entry at all.
    tree: SecondaryMap<Block, Block>,
    // A valid postorder of the reachable blocks in the control-flow graph.
    postorder: Vec<Block>,
}

impl DominatorTree {
    /// Computes dominance information for a function.
    pub fn compute(func: &Function) -> Self {
        let po = compute_postorder(func);
        let idoms = if po.is_empty() {
            SecondaryMap::default()
        } else {
            compute_idoms(func, &po)
        };

        Self {
            tree: idoms,
            postorder: po,
        }
    }

    /// Gets the immediate dominator of `block`, if one exists. The only
    /// reachable block that does not have an immediate dominator is the entry block.
    pub fn idom(&self, block: Block) -> Option<Block> {
        self.tree.get(block).copied().filter(|&idom| idom != block)
    }

    /// Checks if `possible_dominator` dominates `block`.
    ///
    /// This follows the dominance property directly, it returns true if `block` and
    /// `possible_dominator` are the same block. [`Self::strictly_dominates`] does not.
    pub fn dominates(&self, block: Block, possible_dominator: Block) -> bool {
        (block == possible_dominator) || self.strictly_dominates(block, possible_dominator)
    }

    /// Checks if `possible_dominator` strictly dominates `block`, i.e. it
    /// dominates `block` and is not `block`.
    pub fn strictly_dominates(&self, block: Block, possible_dominator: Block) -> bool {
        let mut curr = block;

        while let Some(block) = self.idom(curr) {
            if block == possible_dominator {
                return true;
            }

            curr = block;
        }

        false
    }

    /// Returns the list of reachable blocks in a valid postorder.
    pub fn postorder(&self) -> &[Block] {
        &self.postorder
    }

    /// Returns an iterator over the reachable blocks in reverse postorder.
    pub fn reverse_postorder(&self) -> impl Iterator<Item = Block> + '_ {
        self.postorder().iter().copied().rev()
    }

    /// Checks if a block is reachable from the entry node
    pub fn is_reachable(&self, block: Block) -> bool {
        self.tree.contains(block)
    }
}

/// Directly computes a valid post-ordering of the blocks in `func`'s
/// control-flow graph. Unreachable blocks are not included.
///
/// This should not be used directly in most cases, you probably want to
/// get this information through [`DominatorTree`].
pub fn compute_postorder(func: &Function) -> Vec<Block> {
    let mut po = Vec::new();
    let mut seen = SaHashSet::default();

    // if there are no blocks, the postorder is empty anyway
    if func.block_count() != 0 {
        compute_po_recursive(func, func.entry(), &mut po, &mut seen);
    }

    po
}

fn compute_po_recursive(
    func: &Function,
    curr: Block,
    order: &mut Vec<Block>,
    seen: &mut SaHashSet<Block>,
) {
    // we need to mark it as seen **before** going to any targets, just in case
    // there's any recursive blocks or recursive chains of blocks
    seen.insert(curr);

    for &target in func.block(curr).succs() {
        if !seen.contains(&target) {
            compute_po_recursive(func, target, order, seen);
        }
    }

    order.push(curr);
}

fn intersect(
    po_numbers: &SecondaryMap<Block, usize>,
    idoms: &SecondaryMap<Block, Block>,
    bb1: Block,
    bb2: Block,
) -> Block {
    let mut f1 = bb1;
    let mut f2 = bb2;

    while f1 != f2 {
        let f2v = po_numbers[f2];

        while po_numbers[f1] < f2v {
            f1 = idoms[f1];
        }

        let f1v = po_numbers[f1];

        while po_numbers[f2] < f1v {
            f2 = idoms[f2];
        }
    }

    f1
}

//
// this implements the dominator algorithm described in "A Simple, Fast Dominance Algorithm"
// by Cooper et. al. See the paper: http://www.hipersoft.rice.edu/grads/publications/dom14.pdf.
//
fn compute_idoms(func: &Function, po: &[Block]) -> SecondaryMap<Block, Block> {
    // map block -> postorder number.
    // this is just mapping block -> index of block in `po`
    let po_numbers = {
        let mut map = SecondaryMap::default();

        for (i, bb) in po.iter().copied().enumerate() {
            map.insert(bb, i);
        }

        map
    };

    let root = po[po.len() - 1];
    let mut idoms = SecondaryMap::default();
    let mut changed = true;

    // for the purposes of the algorithm, the entry node is its own idom.
    // this is also the sentinel `DominatorTree::idom` looks for
    idoms.insert(root, root);

    while changed {
        changed = false;

        // root has no predecessors we care about, so we need to make sure we skip it.
        for block in po.iter().rev().copied().skip(1) {
            // every processed predecessor. there will always be at least one
            // when we're iterating in reverse postorder, since the root node
            // was processed at the beginning of the algorithm
            let preds: SmallVec<[Block; 16]> = func
                .block(block)
                .preds()
                .iter()
                .copied()
                .filter(|p| idoms.contains(*p))
                .collect();

            let mut iter = preds.into_iter();
            let mut idom = match iter.next() {
                Some(first) => first,
                None => continue,
            };

            for pred in iter {
                idom = intersect(&po_numbers, &idoms, pred, idom);
            }

            if idoms.insert(block, idom) != Some(idom) {
                changed = true;
            }
        }
    }

    idoms
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::*;

    fn cond(b: &mut FunctionBuilder) -> Value {
        let callee = b.global(Type::Opaque, "rand");

        b.call(callee, &[], Type::Bool)
    }

    #[test]
    fn postorder_diamond() {
        //
        // entry:
        //   if %c then bb1 else bb2
        // bb1:
        //   jump merge
        // bb2:
        //   jump merge
        // merge:
        //   ret
        //
        let mut b = FunctionBuilder::new("diamond");
        let entry = b.create_block("entry");
        let bb1 = b.create_block("bb1");
        let bb2 = b.create_block("bb2");
        let merge = b.create_block("merge");

        b.switch_to(entry);
        let c = cond(&mut b);
        b.if_(c, bb1, bb2);

        b.switch_to(bb1);
        b.jump(merge);

        b.switch_to(bb2);
        b.jump(merge);

        b.switch_to(merge);
        b.ret(&[]);

        let func = b.finish();
        let tree = DominatorTree::compute(&func);

        assert_eq!(tree.postorder(), [merge, bb1, bb2, entry]);
        assert_eq!(tree.idom(entry), None);
        assert_eq!(tree.idom(bb1), Some(entry));
        assert_eq!(tree.idom(bb2), Some(entry));
        assert_eq!(tree.idom(merge), Some(entry));
        assert!(tree.dominates(merge, merge));
        assert!(!tree.strictly_dominates(merge, merge));
        assert!(!tree.dominates(merge, bb1));
    }

    #[test]
    fn idoms_with_loop() {
        //
        // entry:
        //   jump header
        // header:
        //   if %c then body else exit
        // body:
        //   jump header
        // exit:
        //   ret
        //
        let mut b = FunctionBuilder::new("loop");
        let entry = b.create_block("entry");
        let header = b.create_block("header");
        let body = b.create_block("body");
        let exit = b.create_block("exit");

        b.switch_to(entry);
        b.jump(header);

        b.switch_to(header);
        let c = cond(&mut b);
        b.if_(c, body, exit);

        b.switch_to(body);
        b.jump(header);

        b.switch_to(exit);
        b.ret(&[]);

        let func = b.finish();
        let tree = DominatorTree::compute(&func);

        assert_eq!(tree.idom(header), Some(entry));
        assert_eq!(tree.idom(body), Some(header));
        assert_eq!(tree.idom(exit), Some(header));
        assert!(tree.dominates(body, entry));
        assert_eq!(func.block(header).dominees(), &[body, exit]);
        assert_eq!(
            tree.reverse_postorder().next(),
            Some(entry),
            "entry is always first in reverse postorder"
        );
    }

    #[test]
    fn idoms_more_complex() {
        //
        // one:
        //   if %0 then two else three
        // two:
        //   if %1 then five else nine
        // three:
        //   jump four
        // four:
        //   jump two
        // five:
        //   jump nine
        // nine:
        //   ret
        //
        let mut b = FunctionBuilder::new("complex");
        let one = b.create_block("one");
        let two = b.create_block("two");
        let three = b.create_block("three");
        let four = b.create_block("four");
        let five = b.create_block("five");
        let nine = b.create_block("nine");

        b.switch_to(one);
        let c0 = cond(&mut b);
        b.if_(c0, two, three);

        b.switch_to(two);
        let c1 = cond(&mut b);
        b.if_(c1, five, nine);

        b.switch_to(three);
        b.jump(four);

        b.switch_to(four);
        b.jump(two);

        b.switch_to(five);
        b.jump(nine);

        b.switch_to(nine);
        b.ret(&[]);

        let func = b.finish();
        let tree = DominatorTree::compute(&func);

        assert_eq!(tree.idom(two), Some(one));
        assert_eq!(tree.idom(three), Some(one));
        assert_eq!(tree.idom(four), Some(three));
        assert_eq!(tree.idom(five), Some(two));
        assert_eq!(tree.idom(nine), Some(two));
    }

    #[test]
    fn unreachable_blocks_have_no_idom() {
        let mut b = FunctionBuilder::new("dead");
        let entry = b.create_block("entry");
        let dead = b.create_block("dead");
        let exit = b.create_block("exit");

        b.switch_to(entry);
        b.jump(exit);

        b.switch_to(dead);
        b.jump(exit);

        b.switch_to(exit);
        b.ret(&[]);

        let func = b.finish();
        let tree = DominatorTree::compute(&func);

        assert!(!tree.is_reachable(dead));
        assert_eq!(tree.idom(dead), None);
        assert_eq!(tree.idom(exit), Some(entry));
        assert_eq!(tree.postorder(), [exit, entry]);
    }
}
