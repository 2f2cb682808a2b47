//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::dataflow::Instance;
use crate::ir::{Function, Inst, Value};
use smallvec::{smallvec, SmallVec};
use std::fmt::Debug;
use std::hash::Hash;

/// Defines a monotone dataflow analysis: a join-semilattice of abstract
/// states plus a transfer function over instructions.
///
/// The lattice is given by [`Self::bottom`], [`Self::top`] and [`Self::join`].
/// `join` only needs to handle the "interesting" cases, the
/// [`Framework`](crate::dataflow::Framework) intercepts joins involving ⊥, ⊤
/// or two equal states before they ever reach it. The lattice must have finite
/// height for a run to terminate.
///
/// Transfer functions are never called for phis, those are resolved by
/// joining the states of their edges.
pub trait Analysis: Sized {
    /// The abstract state attached to each value.
    type State: Clone + Eq + Hash + Debug;

    /// ⊥, the state every value starts at.
    fn bottom(&self) -> Self::State;

    /// ⊤, the state that absorbs everything.
    fn top(&self) -> Self::State;

    /// The least upper bound of two states.
    fn join(&self, a: &Self::State, b: &Self::State) -> Self::State;

    /// Computes new states from the current ones for a single instruction.
    ///
    /// Updates may target any value, not only the instruction's own result.
    /// Reading state goes through `instance` (see [`Instance::value`]).
    fn transfer(
        &self,
        instance: &Instance<'_, Self>,
        func: &Function,
        inst: Inst,
    ) -> Updates<Self::State>;
}

/// Why a value has the state it has. This is purely observational, it's
/// there for debugging and for explaining results to users.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Decision {
    /// The values whose states were used to compute this one.
    pub inputs: SmallVec<[Value; 2]>,
    /// A human-readable description of the derivation.
    pub description: String,
    /// Whether the state came from nowhere (a constant, a parameter) rather
    /// than being derived from other values.
    pub source: bool,
}

impl Decision {
    /// A decision with no inputs.
    pub fn source(description: impl Into<String>) -> Self {
        Self {
            inputs: SmallVec::new(),
            description: description.into(),
            source: true,
        }
    }

    /// A decision derived from `inputs`.
    pub fn derived(inputs: &[Value], description: impl Into<String>) -> Self {
        Self {
            inputs: SmallVec::from_slice(inputs),
            description: description.into(),
            source: false,
        }
    }
}

/// A new state for one value, produced by a transfer function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update<S> {
    /// The value being updated.
    pub target: Value,
    /// The new state.
    pub state: S,
    /// How the new state was derived.
    pub decision: Decision,
}

impl<S> Update<S> {
    /// Creates an update.
    pub fn new(target: Value, state: S, decision: Decision) -> Self {
        Self {
            target,
            state,
            decision,
        }
    }
}

/// What a transfer function returns. Nearly always zero or one update.
pub type Updates<S> = SmallVec<[Update<S>; 1]>;

/// Shorthand for a single-update [`Updates`].
pub fn single<S>(target: Value, state: S, decision: Decision) -> Updates<S> {
    smallvec![Update::new(target, state, decision)]
}

/// The committed state of one value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping<S> {
    /// The value the state belongs to.
    pub value: Value,
    /// The current state.
    pub state: S,
    /// How `state` was derived.
    pub decision: Decision,
}
