//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::analysis::DominatorTree;
use crate::ir::*;
use num_bigint::BigInt;
use smallvec::SmallVec;

/// Builds a [`Function`] one instruction at a time.
///
/// This plays the part a front-end normally would: it is a construction API,
/// there's no parsing or type-checking. Malformed IR (a phi with the wrong
/// number of edges, a block without a terminator) is caught by debug
/// assertions in [`Self::finish`] and nowhere else.
///
/// ```
/// # use garnet::ir::*;
/// let mut b = FunctionBuilder::new("inc");
/// let entry = b.create_block("entry");
/// b.switch_to(entry);
///
/// let x = b.param(Type::Int(IntType::i64()), "x");
/// let one = b.iconst(IntType::i64(), 1);
/// let sum = b.binary(BinaryOp::Add, x, one);
/// b.ret(&[sum]);
///
/// let func = b.finish();
/// assert_eq!(func.ty(sum), Type::Int(IntType::i64()));
/// ```
pub struct FunctionBuilder {
    func: Function,
    current: Option<Block>,
}

impl FunctionBuilder {
    /// Starts building an empty function named `name`.
    pub fn new(name: &str) -> Self {
        Self {
            func: Function::new(name.to_owned()),
            current: None,
        }
    }

    /// Creates a new block. The first block created is the entry block.
    pub fn create_block(&mut self, name: &str) -> Block {
        self.func.blocks.insert(BasicBlock::new(name.to_owned()))
    }

    /// Makes `block` the block that instructions get appended to.
    pub fn switch_to(&mut self, block: Block) {
        self.current = Some(block);
    }

    /// Gets the block instructions are being appended to.
    pub fn current_block(&self) -> Option<Block> {
        self.current
    }

    /// Gets the type of a value created so far.
    pub fn ty(&self, value: Value) -> Type {
        self.func.ty(value)
    }

    /// Gives a value a source-level name, used when printing.
    pub fn set_name(&mut self, value: Value, name: &str) {
        self.func.values[value].name = Some(name.to_owned());
    }

    /// Appends a parameter to the function.
    pub fn param(&mut self, ty: Type, name: &str) -> Value {
        let index = self.func.params.len() as u32;
        let value = self.create_value(ValueDef::Param(index), ty, Some(name));

        self.func.params.push(value);

        value
    }

    /// Declares a reference to a package-level variable.
    pub fn global(&mut self, ty: Type, name: &str) -> Value {
        self.create_value(ValueDef::Global, ty, Some(name))
    }

    /// Declares the next captured variable of a closure.
    pub fn free_var(&mut self, ty: Type, name: &str) -> Value {
        let index = self
            .func
            .values
            .values()
            .filter(|data| matches!(data.def, ValueDef::FreeVar(_)))
            .count() as u32;

        self.create_value(ValueDef::FreeVar(index), ty, Some(name))
    }

    /// Creates an integer constant of type `ty`.
    pub fn iconst(&mut self, ty: IntType, value: impl Into<BigInt>) -> Value {
        let value = value.into();

        debug_assert!(ty.contains(&value), "constant {value} does not fit in `{ty}`");

        self.create_value(ValueDef::Const(Constant::Int(value)), Type::Int(ty), None)
    }

    /// Creates a string constant.
    pub fn sconst(&mut self, value: &str) -> Value {
        self.create_value(ValueDef::Const(Constant::Str(value.to_owned())), Type::String, None)
    }

    /// Creates a `bool` constant.
    pub fn bconst(&mut self, value: bool) -> Value {
        self.create_value(ValueDef::Const(Constant::Bool(value)), Type::Bool, None)
    }

    /// Creates the zero value of a channel or opaque type.
    pub fn nil(&mut self, ty: Type) -> Value {
        self.create_value(ValueDef::Const(Constant::Nil), ty, None)
    }

    /// Appends `lhs <op> rhs`. Comparisons yield `bool`, everything else yields
    /// the type of `lhs`.
    pub fn binary(&mut self, op: BinaryOp, lhs: Value, rhs: Value) -> Value {
        let ty = if op.is_comparison() {
            Type::Bool
        } else {
            self.ty(lhs)
        };

        self.append_value(InstKind::Binary { op, lhs, rhs }, ty)
    }

    /// Appends `<op> x`.
    pub fn unary(&mut self, op: UnaryOp, x: Value) -> Value {
        let ty = match op {
            UnaryOp::Not => Type::Bool,
            _ => self.ty(x),
        };

        self.append_value(InstKind::Unary { op, x }, ty)
    }

    /// Appends a numeric conversion of `x` to `ty`.
    pub fn convert(&mut self, x: Value, ty: Type) -> Value {
        self.append_value(InstKind::Convert { x }, ty)
    }

    /// Appends a representation-preserving conversion of `x` to `ty`.
    pub fn change_type(&mut self, x: Value, ty: Type) -> Value {
        self.append_value(InstKind::ChangeType { x }, ty)
    }

    /// Appends `x[low:high]`.
    pub fn slice(&mut self, x: Value, low: Option<Value>, high: Option<Value>) -> Value {
        let ty = self.ty(x);

        self.append_value(InstKind::Slice { x, low, high }, ty)
    }

    /// Appends `len(x)`, which is an `i64`.
    pub fn len(&mut self, x: Value) -> Value {
        self.append_value(InstKind::Len { x }, Type::Int(IntType::i64()))
    }

    /// Appends `cap(x)`, which is an `i64`.
    pub fn cap(&mut self, x: Value) -> Value {
        self.append_value(InstKind::Cap { x }, Type::Int(IntType::i64()))
    }

    /// Appends `make(chan T, size)`.
    pub fn make_chan(&mut self, size: Option<Value>) -> Value {
        self.append_value(InstKind::MakeChan { size }, Type::Chan)
    }

    /// Appends a call yielding a value of type `ret`.
    pub fn call(&mut self, callee: Value, args: &[Value], ret: Type) -> Value {
        let kind = InstKind::Call {
            callee,
            args: SmallVec::from_slice(args),
        };

        self.append_value(kind, ret)
    }

    /// Creates a phi with no edges at the head of the current block. Edges are
    /// added later with [`Self::add_phi_edge`], once the values flowing in from
    /// each predecessor exist.
    pub fn phi(&mut self, ty: Type) -> Value {
        let block = self.current_or_panic();
        let position = self.func.blocks[block].phis;

        self.func.blocks[block].phis += 1;

        self.insert_value(block, position, InstKind::Phi { edges: SmallVec::new() }, ty)
    }

    /// Appends an incoming edge to `phi`. Edges must be added in the same
    /// order as the predecessors of the phi's block.
    pub fn add_phi_edge(&mut self, phi: Value, edge: Value) {
        let inst = self
            .func
            .def_inst(phi)
            .expect("tried to add a phi edge to a value that isn't a phi");

        match &mut self.func.insts[inst].kind {
            InstKind::Phi { edges } => edges.push(edge),
            _ => panic!("tried to add a phi edge to a value that isn't a phi"),
        }

        self.func.add_referrer(edge, inst);
    }

    /// Creates a sigma of `x` for the edge `from -> current`. It's placed after
    /// the phis and sigmas already in the block.
    pub fn sigma(&mut self, from: Block, x: Value) -> Value {
        let block = self.current_or_panic();
        let position = self.func.blocks[block].phis + self.func.blocks[block].sigmas;
        let ty = self.ty(x);

        debug_assert!(
            self.func.blocks[block].preds.contains(&from),
            "sigma's `from` block must already be a predecessor"
        );

        self.func.blocks[block].sigmas += 1;

        self.insert_value(block, position, InstKind::Sigma { from, x }, ty)
    }

    /// Ends the current block with `if cond then then_block else else_block`.
    pub fn if_(&mut self, cond: Value, then_block: Block, else_block: Block) -> Inst {
        self.terminate(InstKind::If { cond }, &[then_block, else_block])
    }

    /// Ends the current block with an unconditional branch.
    pub fn jump(&mut self, target: Block) -> Inst {
        self.terminate(InstKind::Jump, &[target])
    }

    /// Ends the current block with a switch over constant cases.
    pub fn constant_switch(
        &mut self,
        tag: Value,
        cases: &[(Value, Block)],
        default: Block,
    ) -> Inst {
        let conds = cases.iter().map(|(cond, _)| *cond).collect();
        let succs: SmallVec<[Block; 4]> = cases
            .iter()
            .map(|(_, block)| *block)
            .chain(std::iter::once(default))
            .collect();

        self.terminate(InstKind::ConstantSwitch { tag, conds }, &succs)
    }

    /// Ends the current block by returning `results`.
    pub fn ret(&mut self, results: &[Value]) -> Inst {
        let results = SmallVec::from_slice(results);

        self.terminate(InstKind::Return { results }, &[])
    }

    /// Finishes the function: computes dominance and stores it on each block.
    pub fn finish(mut self) -> Function {
        #[cfg(debug_assertions)]
        self.verify();

        let tree = DominatorTree::compute(&self.func);
        let blocks: Vec<Block> = self.func.blocks().collect();

        for block in blocks {
            let idom = tree.idom(block);

            self.func.blocks[block].idom = idom;

            if let Some(parent) = idom {
                self.func.blocks[parent].dominees.push(block);
            }
        }

        self.func
    }

    #[cfg(debug_assertions)]
    fn verify(&self) {
        for (block, data) in self.func.blocks.iter() {
            debug_assert!(
                data.terminator()
                    .map(|inst| self.func.insts[inst].is_terminator())
                    .unwrap_or(false),
                "block `{}` ({block:?}) has no terminator",
                data.name
            );

            for &phi in data.phis() {
                if let InstKind::Phi { edges } = &self.func.insts[phi].kind {
                    debug_assert_eq!(
                        edges.len(),
                        data.preds.len(),
                        "phi in `{}` must have one edge per predecessor",
                        data.name
                    );
                }
            }
        }
    }

    fn current_or_panic(&self) -> Block {
        self.current
            .expect("no block selected, call `switch_to` before appending")
    }

    fn create_value(&mut self, def: ValueDef, ty: Type, name: Option<&str>) -> Value {
        self.func.values.insert(ValueData {
            def,
            ty,
            name: name.map(str::to_owned),
        })
    }

    fn append_value(&mut self, kind: InstKind, ty: Type) -> Value {
        let block = self.current_or_panic();
        let position = self.func.blocks[block].insts.len();

        debug_assert!(
            self.func.control(block).is_none(),
            "tried to append to a block that already has a terminator"
        );

        self.insert_value(block, position, kind, ty)
    }

    fn insert_value(&mut self, block: Block, position: usize, kind: InstKind, ty: Type) -> Value {
        let inst = self.insert_inst(block, position, kind);
        let value = self.create_value(ValueDef::Inst(inst), ty, None);

        self.func.insts[inst].result = Some(value);

        value
    }

    fn insert_inst(&mut self, block: Block, position: usize, kind: InstKind) -> Inst {
        let operands = kind.operands();
        let inst = self.func.insts.insert(InstData {
            kind,
            block,
            result: None,
        });

        for operand in operands {
            self.func.add_referrer(operand, inst);
        }

        self.func.blocks[block].insts.insert(position, inst);

        inst
    }

    fn terminate(&mut self, kind: InstKind, succs: &[Block]) -> Inst {
        let block = self.current_or_panic();
        let position = self.func.blocks[block].insts.len();

        debug_assert!(self.func.control(block).is_none(), "block already has a terminator");

        let inst = self.insert_inst(block, position, kind);

        for &succ in succs {
            self.func.blocks[block].succs.push(succ);
            self.func.blocks[succ].preds.push(block);
        }

        inst
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phis_precede_sigmas_precede_body() {
        let mut b = FunctionBuilder::new("f");
        let entry = b.create_block("entry");
        let next = b.create_block("next");

        b.switch_to(entry);
        let x = b.param(Type::Int(IntType::i64()), "x");
        b.jump(next);

        b.switch_to(next);
        let len = b.sconst("abc");
        let l = b.len(len);
        let s = b.sigma(entry, x);
        let p = b.phi(Type::Int(IntType::i64()));
        b.add_phi_edge(p, l);
        b.ret(&[s]);

        let func = b.finish();
        let block = func.block(next);

        assert_eq!(block.phis(), &[func.def_inst(p).unwrap()]);
        assert_eq!(block.sigmas(), &[func.def_inst(s).unwrap()]);
        assert_eq!(block.insts()[2], func.def_inst(l).unwrap());
        assert!(func.inst(block.insts()[3]).is_terminator());
    }

    #[test]
    fn switch_successors_end_with_default() {
        let mut b = FunctionBuilder::new("f");
        let entry = b.create_block("entry");
        let one = b.create_block("one");
        let two = b.create_block("two");
        let other = b.create_block("other");

        b.switch_to(entry);
        let x = b.param(Type::Int(IntType::i64()), "x");
        let c1 = b.iconst(IntType::i64(), 1);
        let c2 = b.iconst(IntType::i64(), 2);
        b.constant_switch(x, &[(c1, one), (c2, two)], other);

        for block in [one, two, other] {
            b.switch_to(block);
            b.ret(&[]);
        }

        let func = b.finish();

        assert_eq!(func.block(entry).succs(), &[one, two, other]);
        assert_eq!(func.block(other).preds(), &[entry]);
        assert_eq!(func.block(entry).dominees(), &[one, two, other]);
    }

    #[test]
    fn comparisons_are_bool() {
        let mut b = FunctionBuilder::new("f");
        let entry = b.create_block("entry");
        b.switch_to(entry);

        let x = b.param(Type::Int(IntType::u8()), "x");
        let y = b.iconst(IntType::u8(), 3);
        let lt = b.binary(BinaryOp::Lt, x, y);
        let sum = b.binary(BinaryOp::Add, x, y);
        b.ret(&[lt, sum]);

        let func = b.finish();

        assert_eq!(func.ty(lt), Type::Bool);
        assert_eq!(func.ty(sum), Type::Int(IntType::u8()));
    }

    #[test]
    #[should_panic(expected = "isn't a phi")]
    fn phi_edge_on_non_phi_panics() {
        let mut b = FunctionBuilder::new("f");
        let entry = b.create_block("entry");
        b.switch_to(entry);

        let x = b.param(Type::Bool, "x");
        let y = b.unary(UnaryOp::Not, x);

        b.add_phi_edge(y, x);
    }
}
