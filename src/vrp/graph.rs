//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::arena::{ArenaMap, SecondaryMap};
use crate::ir::{BinaryOp, Block, Constant, Function, InstKind, Type, Value, ValueDef};
use crate::vrp::{Constraint, ConstraintKind, ConstraintRef, IntInterval, Range, RangeOptions, Z};
use num_bigint::BigInt;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::{debug, debug_span, trace};

/// A vertex of the constraint graph.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Vertex {
    /// A value with a tracked type.
    Value(Value),
    /// A constraint defining one of those values.
    Constraint(ConstraintRef),
}

/// An edge of the constraint graph.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// value → constraint, the constraint reads the value's range.
    Use,
    /// constraint → value, the constraint computes the value's range.
    Define,
    /// value → future constraint, the value's range becomes one of the
    /// future's bounds once it's been solved.
    Control,
}

/// The constraint graph of one function, and once solved, the range of
/// every integer, string and channel value in it.
///
/// ```
/// # use garnet::ir::*;
/// # use garnet::vrp::*;
/// let mut b = FunctionBuilder::new("f");
/// let entry = b.create_block("entry");
/// b.switch_to(entry);
/// let x = b.param(Type::Int(IntType::u8()), "x");
/// let one = b.iconst(IntType::u8(), 1);
/// let y = b.binary(BinaryOp::Add, x, one);
/// b.ret(&[y]);
/// let func = b.finish();
///
/// let mut graph = Graph::build(&func);
/// graph.solve();
///
/// let expected = IntInterval::new(Z::from(0), Z::from(255));
/// assert_eq!(graph.range(x), Some(&Range::Int(expected)));
/// ```
#[derive(Debug)]
pub struct Graph<'f> {
    pub(in crate::vrp) func: &'f Function,
    pub(in crate::vrp) options: RangeOptions,
    pub(in crate::vrp) graph: DiGraph<Vertex, EdgeKind>,
    pub(in crate::vrp) values: SecondaryMap<Value, NodeIndex>,
    pub(in crate::vrp) constraints: ArenaMap<ConstraintRef, Constraint>,
    pub(in crate::vrp) ranges: SecondaryMap<Value, Range>,
    pub(in crate::vrp) jump_set: Vec<BigInt>,
    pub(in crate::vrp) sccs: Vec<Vec<NodeIndex>>,
}

impl<'f> Graph<'f> {
    /// Builds the constraint graph of `func` with the default options.
    pub fn build(func: &'f Function) -> Self {
        Self::build_with(func, RangeOptions::default())
    }

    /// Builds the constraint graph of `func`. Nothing is solved yet, see
    /// [`Self::solve`].
    pub fn build_with(func: &'f Function, options: RangeOptions) -> Self {
        let _span = debug_span!("build", func = func.name()).entered();
        let mut graph = Self {
            func,
            options,
            graph: DiGraph::new(),
            values: SecondaryMap::default(),
            constraints: ArenaMap::new(),
            ranges: SecondaryMap::default(),
            jump_set: Vec::new(),
            sccs: Vec::new(),
        };

        for value in func.values() {
            if Range::is_tracked(func.ty(value)) {
                let node = graph.graph.add_node(Vertex::Value(value));

                graph.values.insert(value, node);
            }
        }

        for value in func.values() {
            if let Some(kind) = graph.constraint_for(value) {
                graph.add_constraint(Constraint::new(kind, value));
            }
        }

        graph.jump_set = func
            .values()
            .filter_map(|v| func.as_const(v).and_then(Constant::as_int).cloned())
            .collect();

        graph.jump_set.sort();
        graph.jump_set.dedup();

        if graph.jump_set.len() > options.jump_set_limit {
            debug!(
                literals = graph.jump_set.len(),
                limit = options.jump_set_limit,
                "jump set too large, widening straight to infinity"
            );

            graph.jump_set.clear();
        }

        debug!(
            values = graph.values.len(),
            constraints = graph.constraints.len(),
            jump_set = graph.jump_set.len(),
            "built constraint graph"
        );

        graph
    }

    /// The function the graph was built from.
    pub fn function(&self) -> &'f Function {
        self.func
    }

    /// The options the graph was built with.
    pub fn options(&self) -> &RangeOptions {
        &self.options
    }

    /// The range of `value`. `None` before solving, and for values whose
    /// type isn't tracked (bools, floats, opaque values).
    pub fn range(&self, value: Value) -> Option<&Range> {
        self.ranges.get(value)
    }

    /// Shorthand for the integer interval of `value`, if it has one.
    pub fn int_range(&self, value: Value) -> Option<&IntInterval> {
        self.range(value).and_then(Range::as_int)
    }

    /// Every computed range.
    pub fn ranges(&self) -> &SecondaryMap<Value, Range> {
        &self.ranges
    }

    /// Resolves a constraint reference.
    pub fn constraint(&self, constraint: ConstraintRef) -> &Constraint {
        &self.constraints[constraint]
    }

    /// Every constraint, in the order they were emitted.
    pub fn constraints(&self) -> impl Iterator<Item = (ConstraintRef, &Constraint)> {
        self.constraints.iter()
    }

    /// The sorted integer literals that widening snaps bounds to.
    pub fn jump_set(&self) -> &[BigInt] {
        &self.jump_set
    }

    fn add_constraint(&mut self, constraint: Constraint) {
        let inputs = constraint.inputs();
        let control = constraint.control_inputs();
        let output = constraint.output;
        let c = self.constraints.insert(constraint);
        let node = self.graph.add_node(Vertex::Constraint(c));

        for input in inputs {
            if let Some(&from) = self.values.get(input) {
                self.graph.add_edge(from, node, EdgeKind::Use);
            }
        }

        for input in control {
            if let Some(&from) = self.values.get(input) {
                self.graph.add_edge(from, node, EdgeKind::Control);
            }
        }

        self.graph.add_edge(node, self.values[output], EdgeKind::Define);
    }

    fn constraint_for(&self, value: Value) -> Option<ConstraintKind> {
        let func = self.func;
        let ty = func.ty(value);

        if !Range::is_tracked(ty) {
            return None;
        }

        let kind = match func.value(value).def() {
            ValueDef::Const(Constant::Int(c)) => {
                ConstraintKind::IntInterval(IntInterval::constant(c.clone()))
            }
            ValueDef::Const(Constant::Str(s)) => {
                ConstraintKind::StringInterval(IntInterval::constant(s.len()))
            }
            ValueDef::Const(Constant::Nil) if ty.is_chan() => {
                ConstraintKind::ChannelInterval(IntInterval::constant(0))
            }
            ValueDef::Inst(inst) => {
                let block = func.inst(*inst).block();

                self.inst_constraint(value, block, func.inst(*inst).kind())
            }
            _ => maximal(ty),
        };

        trace!(?value, ?kind, "emitted constraint");

        Some(kind)
    }

    fn inst_constraint(&self, value: Value, block: Block, kind: &InstKind) -> ConstraintKind {
        let func = self.func;
        let ty = func.ty(value);

        match kind {
            InstKind::Binary { op, lhs, rhs } => match (op, ty) {
                (BinaryOp::Add, Type::Int(_)) => ConstraintKind::IntAdd(*lhs, *rhs),
                (BinaryOp::Sub, Type::Int(_)) => ConstraintKind::IntSub(*lhs, *rhs),
                (BinaryOp::Mul, Type::Int(_)) => ConstraintKind::IntMul(*lhs, *rhs),
                (BinaryOp::Add, Type::String) => ConstraintKind::StringConcat(*lhs, *rhs),
                _ => maximal(ty),
            },
            InstKind::Convert { x } | InstKind::ChangeType { x } => match (ty, func.ty(*x)) {
                (Type::Int(target), Type::Int(_)) => {
                    ConstraintKind::IntConversion { x: *x, target }
                }
                (Type::Chan, Type::Chan) => ConstraintKind::ChannelChangeType(*x),
                _ => maximal(ty),
            },
            InstKind::Phi { edges } if !edges.is_empty() => ConstraintKind::Phi(edges.clone()),
            InstKind::Sigma { from, x } => self.sigma_constraint(block, *from, *x, ty),
            InstKind::Slice { x, low, high } if ty.is_string() => ConstraintKind::StringSlice {
                x: *x,
                low: *low,
                high: *high,
            },
            InstKind::Len { x } if func.ty(*x).is_string() => ConstraintKind::StringLength(*x),
            InstKind::Len { .. } | InstKind::Cap { .. } => {
                ConstraintKind::IntInterval(IntInterval::new(Z::from(0), Z::PosInf))
            }
            InstKind::MakeChan { size } => ConstraintKind::MakeChannel(*size),
            _ => maximal(ty),
        }
    }

    // what a branch from `from` into `block` says about `x`
    fn sigma_constraint(&self, block: Block, from: Block, x: Value, ty: Type) -> ConstraintKind {
        let func = self.func;
        let identity = match ty {
            Type::Int(_) => ConstraintKind::IntIntersection {
                x,
                interval: IntInterval::unbounded(),
            },
            Type::String => ConstraintKind::StringIntersection {
                x,
                length: IntInterval::new(Z::from(0), Z::PosInf),
            },
            _ => return ConstraintKind::ChannelChangeType(x),
        };

        let control = match func.control(from) {
            Some(control) => control,
            None => return identity,
        };

        let succs = func.block(from).succs();

        match func.inst(control).kind() {
            InstKind::If { cond } => {
                let taken = match (succs[0] == block, succs[1] == block) {
                    (true, false) => true,
                    (false, true) => false,
                    _ => return identity,
                };

                let (op, other) = match func.def_kind(*cond) {
                    Some(InstKind::Binary { op, lhs, rhs }) if op.is_comparison() && *lhs == x => {
                        (*op, *rhs)
                    }
                    Some(InstKind::Binary { op, lhs, rhs }) if op.is_comparison() && *rhs == x => {
                        (op.swapped(), *lhs)
                    }
                    _ => return identity,
                };

                let op = if taken { op } else { op.negated() };

                match ty {
                    Type::Int(_) => self.int_comparison(x, op, other).unwrap_or(identity),
                    _ => self.string_comparison(x, op, other).unwrap_or(identity),
                }
            }
            InstKind::ConstantSwitch { tag, conds } if *tag == x => {
                // the default edge says nothing, it's only "none of the above"
                if succs.last() == Some(&block) {
                    return identity;
                }

                let mut interval = IntInterval::unknown();

                for (cond, succ) in conds.iter().zip(succs.iter()) {
                    if *succ != block {
                        continue;
                    }

                    let case = match (ty, func.as_const(*cond)) {
                        (Type::Int(_), Some(Constant::Int(c))) => IntInterval::constant(c.clone()),
                        (Type::String, Some(Constant::Str(s))) => IntInterval::constant(s.len()),
                        _ => return identity,
                    };

                    interval = interval.union(&case);
                }

                match ty {
                    Type::Int(_) => ConstraintKind::IntIntersection { x, interval },
                    _ => ConstraintKind::StringIntersection { x, length: interval },
                }
            }
            _ => identity,
        }
    }

    // `x <op> other` holds on this edge
    fn int_comparison(&self, x: Value, op: BinaryOp, other: Value) -> Option<ConstraintKind> {
        if let Some(Constant::Int(c)) = self.func.as_const(other) {
            let c = Z::from(c);
            let one = Z::from(1);

            let interval = match op {
                BinaryOp::Lt => IntInterval::new(Z::NegInf, c - one),
                BinaryOp::Le => IntInterval::new(Z::NegInf, c),
                BinaryOp::Gt => IntInterval::new(c + one, Z::PosInf),
                BinaryOp::Ge => IntInterval::new(c, Z::PosInf),
                BinaryOp::Eq => IntInterval::new(c.clone(), c),
                _ => return None,
            };

            return Some(ConstraintKind::IntIntersection { x, interval });
        }

        if !self.func.ty(other).is_int() {
            return None;
        }

        let (lower, upper, lower_offset, upper_offset): (_, _, i64, i64) = match op {
            BinaryOp::Lt => (None, Some(other), 0, -1),
            BinaryOp::Le => (None, Some(other), 0, 0),
            BinaryOp::Gt => (Some(other), None, 1, 0),
            BinaryOp::Ge => (Some(other), None, 0, 0),
            BinaryOp::Eq => (Some(other), Some(other), 0, 0),
            _ => return None,
        };

        Some(ConstraintKind::FutureIntIntersection {
            x,
            lower,
            upper,
            lower_offset: Z::from(lower_offset),
            upper_offset: Z::from(upper_offset),
            resolved: IntInterval::unbounded(),
        })
    }

    // only `s == "literal"` says anything about a string's length
    fn string_comparison(&self, x: Value, op: BinaryOp, other: Value) -> Option<ConstraintKind> {
        match (op, self.func.as_const(other)) {
            (BinaryOp::Eq, Some(Constant::Str(s))) => Some(ConstraintKind::StringIntersection {
                x,
                length: IntInterval::constant(s.len()),
            }),
            _ => None,
        }
    }
}

/// The constraint for a value nothing is known about.
fn maximal(ty: Type) -> ConstraintKind {
    match Range::maximal(ty) {
        Some(Range::String(s)) => ConstraintKind::StringInterval(s.length),
        Some(Range::Channel(c)) => ConstraintKind::ChannelInterval(c.size),
        Some(Range::Int(i)) => ConstraintKind::IntInterval(i),
        None => ConstraintKind::IntInterval(IntInterval::unbounded()),
    }
}
