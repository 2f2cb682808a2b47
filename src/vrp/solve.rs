//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::arena::{SecondaryMap, SecondarySet};
use crate::ir::{Type, Value};
use crate::utility::SaHashSet;
use crate::vrp::graph::{EdgeKind, Vertex};
use crate::vrp::{ConstraintKind, ConstraintRef, Graph, IntInterval, Range, Z};
use petgraph::algo::tarjan_scc;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::VecDeque;
use tracing::{debug, debug_span, trace};

// the pieces of one SCC the worklists need
struct Component {
    constraints: Vec<ConstraintRef>,
    nodes: SaHashSet<NodeIndex>,
    values: SaHashSet<Value>,
}

impl<'f> Graph<'f> {
    /// Solves the graph, computing a range for every tracked value.
    ///
    /// SCCs are solved one at a time with producers before consumers. An
    /// acyclic SCC is a single constraint, evaluated once. A cyclic SCC is
    /// widened to a fixpoint (with bounds snapping to the jump set), then
    /// its futures are resolved, then it's narrowed for a bounded number of
    /// rounds. Solving again starts from scratch.
    pub fn solve(&mut self) {
        let _span = debug_span!("solve", func = self.func.name()).entered();

        self.ranges = SecondaryMap::default();

        for (_, constraint) in self.constraints.iter_mut() {
            if let ConstraintKind::FutureIntIntersection { resolved, .. } = &mut constraint.kind {
                *resolved = IntInterval::unbounded();
            }
        }

        // tarjan yields SCCs in reverse topological order
        let mut sccs = tarjan_scc(&self.graph);
        sccs.reverse();

        for (index, scc) in sccs.iter().enumerate() {
            let component = self.component(scc);

            if component.constraints.is_empty() {
                continue;
            }

            if scc.len() > 1 {
                self.solve_cyclic(index, &component);
            } else {
                for &c in component.constraints.iter() {
                    self.resolve_future(c);

                    let range = self.constraints[c].eval(|v| self.current(v));
                    let output = self.constraints[c].output;

                    trace!(?output, %range, "evaluated");

                    self.ranges.insert(output, range);
                }
            }
        }

        self.clamp();
        self.sccs = sccs;

        debug!(sccs = self.sccs.len(), ranges = self.ranges.len(), "solved");
    }

    /// The SCCs of the graph in the order they were solved. Empty until
    /// [`Self::solve`] is called.
    pub fn sccs(&self) -> &[Vec<NodeIndex>] {
        &self.sccs
    }

    fn component(&self, scc: &[NodeIndex]) -> Component {
        let mut component = Component {
            constraints: Vec::new(),
            nodes: scc.iter().copied().collect(),
            values: SaHashSet::default(),
        };

        for &node in scc {
            match self.graph[node] {
                Vertex::Value(v) => {
                    component.values.insert(v);
                }
                Vertex::Constraint(c) => component.constraints.push(c),
            }
        }

        component.constraints.sort();
        component
    }

    fn solve_cyclic(&mut self, index: usize, component: &Component) {
        let _span = debug_span!("scc", index, constraints = component.constraints.len()).entered();

        let mut worklist: VecDeque<ConstraintRef> = component.constraints.iter().copied().collect();
        let mut queued: SecondarySet<ConstraintRef> =
            component.constraints.iter().copied().collect();
        let mut widening_steps = 0usize;

        while let Some(c) = worklist.pop_front() {
            queued.remove(c);
            widening_steps += 1;

            let output = self.constraints[c].output;
            let new = self.constraints[c].eval(|v| self.widening_input(v, component));

            if !new.is_known() {
                continue;
            }

            let widened = match self.ranges.get(output) {
                Some(old) if old.is_known() => {
                    old.with_interval(self.widen(old.interval(), new.interval()))
                }
                _ => new,
            };

            if self.ranges.get(output) == Some(&widened) {
                continue;
            }

            trace!(?output, range = %widened, "widened");

            self.ranges.insert(output, widened);
            self.enqueue_users(output, component, &mut worklist, &mut queued);
        }

        for &c in component.constraints.iter() {
            self.resolve_future(c);
        }

        let mut worklist: VecDeque<ConstraintRef> = component.constraints.iter().copied().collect();
        let mut queued: SecondarySet<ConstraintRef> =
            component.constraints.iter().copied().collect();
        let mut budget = self.options.narrowing_rounds * component.constraints.len();
        let mut narrowing_steps = 0usize;

        while budget > 0 {
            let c = match worklist.pop_front() {
                Some(c) => c,
                None => break,
            };

            queued.remove(c);
            budget -= 1;
            narrowing_steps += 1;

            let output = self.constraints[c].output;
            let new = self.constraints[c].eval(|v| self.current(v));

            let narrowed = match self.ranges.get(output) {
                Some(old) if old.is_known() => {
                    old.with_interval(old.interval().intersection(new.interval()))
                }
                _ => new,
            };

            if self.ranges.get(output) == Some(&narrowed) {
                continue;
            }

            trace!(?output, range = %narrowed, "narrowed");

            self.ranges.insert(output, narrowed);
            self.enqueue_users(output, component, &mut worklist, &mut queued);
        }

        debug!(widening_steps, narrowing_steps, "solved cyclic scc");
    }

    // pushes every constraint of the SCC that reads `value`
    fn enqueue_users(
        &self,
        value: Value,
        component: &Component,
        worklist: &mut VecDeque<ConstraintRef>,
        queued: &mut SecondarySet<ConstraintRef>,
    ) {
        let node = match self.values.get(value) {
            Some(&node) => node,
            None => return,
        };

        for edge in self.graph.edges_directed(node, Direction::Outgoing) {
            if *edge.weight() != EdgeKind::Use || !component.nodes.contains(&edge.target()) {
                continue;
            }

            if let Vertex::Constraint(c) = self.graph[edge.target()] {
                if queued.insert(c) {
                    worklist.push_back(c);
                }
            }
        }
    }

    // during widening, values of the SCC that haven't been reached yet stay
    // unknown instead of defaulting to their type's bounds
    fn widening_input(&self, value: Value, component: &Component) -> Range {
        match self.ranges.get(value) {
            Some(range) if range.is_known() => range.clone(),
            _ if component.values.contains(&value) => {
                Range::unknown(self.func.ty(value))
                    .unwrap_or_else(|| Range::Int(IntInterval::unknown()))
            }
            _ => self.fallback(value),
        }
    }

    fn current(&self, value: Value) -> Range {
        match self.ranges.get(value) {
            Some(range) if range.is_known() => range.clone(),
            _ => self.fallback(value),
        }
    }

    fn fallback(&self, value: Value) -> Range {
        Range::maximal(self.func.ty(value)).unwrap_or_else(|| Range::Int(IntInterval::unbounded()))
    }

    // a bound that grows jumps to the next literal out, or to infinity
    fn widen(&self, old: &IntInterval, new: &IntInterval) -> IntInterval {
        if old.is_empty() {
            return new.clone();
        }

        if new.is_empty() {
            return old.clone();
        }

        let lower = if new.lower() < old.lower() {
            self.jump_down(new.lower())
        } else {
            old.lower().clone()
        };

        let upper = if new.upper() > old.upper() {
            self.jump_up(new.upper())
        } else {
            old.upper().clone()
        };

        IntInterval::new(lower, upper)
    }

    fn jump_down(&self, bound: &Z) -> Z {
        self.jump_set
            .iter()
            .rev()
            .find(|&c| *bound >= *c)
            .map(Z::from)
            .unwrap_or(Z::NegInf)
    }

    fn jump_up(&self, bound: &Z) -> Z {
        self.jump_set
            .iter()
            .find(|&c| *bound <= *c)
            .map(Z::from)
            .unwrap_or(Z::PosInf)
    }

    // turns a future's symbolic bounds into a concrete interval using the
    // current ranges of the bounding values
    fn resolve_future(&mut self, c: ConstraintRef) {
        let (lower, upper, lower_offset, upper_offset) = match &self.constraints[c].kind {
            ConstraintKind::FutureIntIntersection {
                lower,
                upper,
                lower_offset,
                upper_offset,
                ..
            } => (*lower, *upper, lower_offset.clone(), upper_offset.clone()),
            _ => return,
        };

        let lower = match lower {
            Some(v) => self.current(v).interval().lower().clone() + lower_offset,
            None => Z::NegInf,
        };

        let upper = match upper {
            Some(v) => self.current(v).interval().upper().clone() + upper_offset,
            None => Z::PosInf,
        };

        let interval = IntInterval::new(lower, upper);

        trace!(constraint = ?c, %interval, "resolved future");

        let kind = &mut self.constraints[c].kind;

        if let ConstraintKind::FutureIntIntersection { resolved, .. } = kind {
            *resolved = interval;
        }
    }

    // arithmetic is done over unbounded integers, wrap-around isn't modeled.
    // anything that escapes its type's bounds is given up on.
    fn clamp(&mut self) {
        for (value, range) in self.ranges.iter_mut() {
            let ty = match self.func.ty(value) {
                Type::Int(ty) => ty,
                _ => continue,
            };

            let interval = range.interval();

            if !interval.is_known() || interval.is_empty() {
                continue;
            }

            let min = ty.min_value();
            let max = ty.max_value();
            let below = interval.lower().is_finite() && *interval.lower() < min;
            let above = interval.upper().is_finite() && *interval.upper() > max;

            let clamped = if !ty.is_signed() && (*interval.lower() < min || above) {
                IntInterval::of_type(ty)
            } else if ty.is_signed() && (below || above) {
                IntInterval::unbounded()
            } else {
                continue;
            };

            trace!(?value, from = %interval, to = %clamped, "clamped");

            *range = Range::Int(clamped);
        }
    }
}
