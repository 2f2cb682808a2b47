//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::arena::SecondarySet;
use crate::dataflow::{single, Analysis, Decision, Framework, Mapping, Updates};
use crate::error::DataflowError;
use crate::ir::{Function, Inst, InstKind, Value};
use crate::utility::SaHashMap;
use std::collections::VecDeque;
use tracing::{debug, debug_span, error, trace};

/// One run of an [`Analysis`] over one function: the live mapping from
/// values to states.
///
/// Values without a mapping are at ⊥. Instances are created with
/// [`Framework::start`] or [`Framework::forward`].
#[derive(Debug)]
pub struct Instance<'f, A: Analysis> {
    framework: &'f Framework<A>,
    mapping: SaHashMap<Value, Mapping<A::State>>,
}

impl<'f, A: Analysis> Instance<'f, A> {
    pub(in crate::dataflow) fn new(framework: &'f Framework<A>) -> Self {
        Self {
            framework,
            mapping: SaHashMap::default(),
        }
    }

    /// The framework this instance was started from.
    pub fn framework(&self) -> &'f Framework<A> {
        self.framework
    }

    /// The current state of `value`, ⊥ if nothing has been computed for it.
    pub fn value(&self, value: Value) -> A::State {
        match self.mapping.get(&value) {
            Some(mapping) => mapping.state.clone(),
            None => self.framework.bottom().clone(),
        }
    }

    /// Why `value` has its current state, if it has been computed.
    pub fn decision(&self, value: Value) -> Option<&Decision> {
        self.mapping.get(&value).map(|mapping| &mapping.decision)
    }

    /// The full mapping for `value`, if it has been computed.
    pub fn mapping(&self, value: Value) -> Option<&Mapping<A::State>> {
        self.mapping.get(&value)
    }

    /// Every mapping computed so far, in no particular order.
    pub fn mappings(&self) -> impl Iterator<Item = &Mapping<A::State>> {
        self.mapping.values()
    }

    /// Runs the analysis over `func` until nothing changes anymore.
    ///
    /// Every instruction is visited at least once, after that an instruction
    /// is only revisited when one of its operands changes state. Running this
    /// again on an instance that already reached its fixed point changes nothing.
    ///
    /// If a transfer function ever moves a value down the lattice, the run is
    /// aborted, the mapping is cleared and [`DataflowError::NonMonotonic`]
    /// is returned.
    pub fn forward(&mut self, func: &Function) -> Result<(), DataflowError> {
        let _span = debug_span!("forward", func = func.name()).entered();
        let mut worklist = VecDeque::with_capacity(func.inst_count());
        let mut queued = SecondarySet::new();
        let mut visits = 0usize;

        for inst in func.insts() {
            worklist.push_back(inst);
            queued.insert(inst);
        }

        while let Some(inst) = worklist.pop_front() {
            queued.remove(inst);
            visits += 1;

            for update in self.evaluate(func, inst) {
                let old = self.value(update.target);

                if old == update.state {
                    continue;
                }

                if !self.framework.leq(&old, &update.state) {
                    error!(
                        value = ?update.target,
                        ?old,
                        new = ?update.state,
                        "transfer function is not monotonic"
                    );

                    self.mapping.clear();

                    return Err(DataflowError::NonMonotonic {
                        value: update.target,
                        old: format!("{old:?}"),
                        new: format!("{:?}", update.state),
                    });
                }

                trace!(value = ?update.target, ?old, new = ?update.state, "state changed");

                for &user in func.referrers(update.target) {
                    if queued.insert(user) {
                        worklist.push_back(user);
                    }
                }

                self.mapping.insert(
                    update.target,
                    Mapping {
                        value: update.target,
                        state: update.state,
                        decision: update.decision,
                    },
                );
            }
        }

        debug!(visits, mappings = self.mapping.len(), "reached fixed point");

        Ok(())
    }

    fn evaluate(&self, func: &Function, inst: Inst) -> Updates<A::State> {
        match func.inst(inst).kind() {
            InstKind::Phi { edges } => {
                let result = func
                    .inst_result(inst)
                    .expect("phi instructions always yield a value");

                let state = edges.iter().fold(self.framework.bottom().clone(), |acc, &edge| {
                    self.framework.join(&acc, &self.value(edge))
                });

                single(result, state, Decision::derived(edges, "φ"))
            }
            _ => self.framework.analysis().transfer(self, func, inst),
        }
    }
}
