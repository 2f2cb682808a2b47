//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::dataflow::{Analysis, Instance};
use crate::error::DataflowError;
use crate::ir::Function;
use crate::utility::DotWriter;
use tracing::debug;

/// Wraps an [`Analysis`] and runs it.
///
/// The framework caches ⊥ and ⊤, and owns the join that every part of a run
/// actually uses (see [`Self::join`]). An [`Instance`] borrows the framework
/// it was started from.
///
/// ```
/// # use garnet::dataflow::*;
/// # use garnet::ir::*;
/// #[derive(Clone, Debug, PartialEq, Eq, Hash)]
/// enum Reach {
///     Never,
///     Maybe,
/// }
///
/// struct Reachability;
///
/// impl Analysis for Reachability {
///     type State = Reach;
///
///     fn bottom(&self) -> Reach { Reach::Never }
///     fn top(&self) -> Reach { Reach::Maybe }
///     fn join(&self, _: &Reach, _: &Reach) -> Reach { Reach::Maybe }
///
///     fn transfer(&self, _: &Instance<'_, Self>, func: &Function, inst: Inst) -> Updates<Reach> {
///         match func.inst_result(inst) {
///             Some(v) => single(v, Reach::Maybe, Decision::source("computed")),
///             None => Updates::new(),
///         }
///     }
/// }
///
/// let mut b = FunctionBuilder::new("f");
/// let entry = b.create_block("entry");
/// b.switch_to(entry);
/// let x = b.param(Type::Bool, "x");
/// let y = b.unary(UnaryOp::Not, x);
/// b.ret(&[y]);
/// let func = b.finish();
///
/// let framework = Framework::new(Reachability);
/// let instance = framework.forward(&func).unwrap();
///
/// assert_eq!(instance.value(y), Reach::Maybe);
/// assert_eq!(instance.value(x), Reach::Never);
/// ```
#[derive(Debug)]
pub struct Framework<A: Analysis> {
    analysis: A,
    bottom: A::State,
    top: A::State,
}

impl<A: Analysis> Framework<A> {
    /// Wraps `analysis`.
    pub fn new(analysis: A) -> Self {
        let bottom = analysis.bottom();
        let top = analysis.top();

        Self {
            analysis,
            bottom,
            top,
        }
    }

    /// Gets the wrapped analysis.
    pub fn analysis(&self) -> &A {
        &self.analysis
    }

    /// ⊥ of the lattice.
    pub fn bottom(&self) -> &A::State {
        &self.bottom
    }

    /// ⊤ of the lattice.
    pub fn top(&self) -> &A::State {
        &self.top
    }

    /// Creates an empty instance, failing if the lattice is degenerate.
    pub fn start(&self) -> Result<Instance<'_, A>, DataflowError> {
        if self.bottom == self.top {
            return Err(DataflowError::BottomIsTop);
        }

        Ok(Instance::new(self))
    }

    /// Creates an instance and runs it to a fixed point over `func`.
    pub fn forward(&self, func: &Function) -> Result<Instance<'_, A>, DataflowError> {
        let mut instance = self.start()?;

        instance.forward(func)?;

        Ok(instance)
    }

    /// The join used by every run. The lattice laws involving ⊥, ⊤ and
    /// idempotence hold here regardless of what the analysis' own join does:
    ///
    /// - `a ∨ ⊥ = ⊥ ∨ a = a`
    /// - `a ∨ ⊤ = ⊤ ∨ a = ⊤`
    /// - `a ∨ a = a`
    ///
    /// Everything else is delegated to [`Analysis::join`].
    pub fn join(&self, a: &A::State, b: &A::State) -> A::State {
        if *a == self.bottom {
            b.clone()
        } else if *b == self.bottom {
            a.clone()
        } else if *a == self.top || *b == self.top {
            self.top.clone()
        } else if a == b {
            a.clone()
        } else {
            self.analysis.join(a, b)
        }
    }

    /// Checks `a ≤ b`, which holds exactly when `a ∨ b = b`.
    pub fn leq(&self, a: &A::State, b: &A::State) -> bool {
        self.join(a, b) == *b
    }

    /// Renders the Hasse diagram of `elements` as a Graphviz `digraph`.
    ///
    /// Edges are the cover relation of `≤` restricted to `elements`, drawn
    /// from the lower element to the upper one with ⊥ at the bottom. This is
    /// a documentation aid, it says nothing about elements that aren't given.
    pub fn dot(&self, elements: &[A::State]) -> String {
        let mut unique: Vec<&A::State> = Vec::with_capacity(elements.len());

        for element in elements {
            if !unique.contains(&element) {
                unique.push(element);
            }
        }

        let lt = |a: usize, b: usize| a != b && self.leq(unique[a], unique[b]);
        let mut dot = DotWriter::new("lattice");

        dot.attr("rankdir", "BT");

        for (i, element) in unique.iter().enumerate() {
            dot.node(&format!("n{i}"), &format!("{element:?}"), &[]);
        }

        let mut covers = 0;

        for a in 0..unique.len() {
            for b in 0..unique.len() {
                if !lt(a, b) {
                    continue;
                }

                // `b` covers `a` if nothing sits strictly between them
                if (0..unique.len()).any(|c| lt(a, c) && lt(c, b)) {
                    continue;
                }

                covers += 1;
                dot.edge(&format!("n{a}"), &format!("n{b}"), &[]);
            }
        }

        debug!(elements = unique.len(), covers, "rendered hasse diagram");

        dot.finish()
    }
}
