//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::utility::SaHashMap;
use std::hash::Hash;

// shared storage for both tables, lookups try `(a, b)` and then `(b, a)`
#[derive(Debug, Clone)]
struct PairTable<S, R> {
    entries: SaHashMap<(S, S), R>,
    default: R,
}

impl<S: Clone + Eq + Hash, R: Clone> PairTable<S, R> {
    fn new(default: R) -> Self {
        Self {
            entries: SaHashMap::default(),
            default,
        }
    }

    fn insert(&mut self, a: S, b: S, result: R) {
        self.entries.insert((a, b), result);
    }

    fn get(&self, a: &S, b: &S) -> R {
        // the key is owned, so the lookup needs owned copies
        let forward = (a.clone(), b.clone());

        if let Some(result) = self.entries.get(&forward) {
            return result.clone();
        }

        let (a, b) = forward;

        self.entries
            .get(&(b, a))
            .cloned()
            .unwrap_or_else(|| self.default.clone())
    }
}

/// A join defined by listing its results for pairs of states.
///
/// Meant for small finite lattices where writing out the table is clearer
/// than writing the logic. Lookups are symmetric, so each unordered pair only
/// needs to be listed once, and pairs involving ⊥, ⊤ or equal states never
/// need to be listed since [`Framework::join`](crate::dataflow::Framework::join)
/// handles them. Anything unlisted joins to the default.
///
/// ```
/// # use garnet::dataflow::JoinTable;
/// let mut table = JoinTable::new("top");
/// table.insert("neg", "zero", "non-pos");
///
/// assert_eq!(table.join(&"zero", &"neg"), "non-pos");
/// assert_eq!(table.join(&"neg", &"pos"), "top");
/// ```
#[derive(Debug, Clone)]
pub struct JoinTable<S> {
    table: PairTable<S, S>,
}

impl<S: Clone + Eq + Hash> JoinTable<S> {
    /// Creates an empty table, every pair joins to `default`.
    pub fn new(default: S) -> Self {
        Self {
            table: PairTable::new(default),
        }
    }

    /// Creates a table from `(a, b, a ∨ b)` triples.
    pub fn from_entries(default: S, entries: impl IntoIterator<Item = (S, S, S)>) -> Self {
        let mut table = Self::new(default);

        for (a, b, result) in entries {
            table.insert(a, b, result);
        }

        table
    }

    /// Records `a ∨ b = result` (and therefore `b ∨ a = result`).
    pub fn insert(&mut self, a: S, b: S, result: S) {
        self.table.insert(a, b, result);
    }

    /// Looks up `a ∨ b`.
    pub fn join(&self, a: &S, b: &S) -> S {
        self.table.get(a, b)
    }
}

/// A binary operator on abstract states defined by a table, e.g. the
/// abstract version of `+` over signs.
///
/// Lookups are symmetric, so this is only suitable for commutative operators.
/// Anything unlisted yields the default.
///
/// ```
/// # use garnet::dataflow::BinaryTable;
/// let add = BinaryTable::from_entries(
///     "unknown",
///     [("pos", "pos", "pos"), ("pos", "zero", "pos"), ("neg", "neg", "neg")],
/// );
///
/// assert_eq!(add.apply(&"zero", &"pos"), "pos");
/// assert_eq!(add.apply(&"pos", &"neg"), "unknown");
/// ```
#[derive(Debug, Clone)]
pub struct BinaryTable<S, R = S> {
    table: PairTable<S, R>,
}

impl<S: Clone + Eq + Hash, R: Clone> BinaryTable<S, R> {
    /// Creates an empty table, every pair yields `default`.
    pub fn new(default: R) -> Self {
        Self {
            table: PairTable::new(default),
        }
    }

    /// Creates a table from `(a, b, a ⊕ b)` triples.
    pub fn from_entries(default: R, entries: impl IntoIterator<Item = (S, S, R)>) -> Self {
        let mut table = Self::new(default);

        for (a, b, result) in entries {
            table.insert(a, b, result);
        }

        table
    }

    /// Records `a ⊕ b = result` (and therefore `b ⊕ a = result`).
    pub fn insert(&mut self, a: S, b: S, result: R) {
        self.table.insert(a, b, result);
    }

    /// Looks up `a ⊕ b`.
    pub fn apply(&self, a: &S, b: &S) -> R {
        self.table.get(a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    enum Sign {
        Neg,
        Zero,
        Pos,
        NonNeg,
        Top,
    }

    #[test]
    fn join_lookup_is_symmetric() {
        let table = JoinTable::from_entries(Sign::Top, [(Sign::Zero, Sign::Pos, Sign::NonNeg)]);

        assert_eq!(table.join(&Sign::Zero, &Sign::Pos), Sign::NonNeg);
        assert_eq!(table.join(&Sign::Pos, &Sign::Zero), Sign::NonNeg);
        assert_eq!(table.join(&Sign::Neg, &Sign::Pos), Sign::Top);
    }

    #[test]
    fn later_entries_replace_earlier_ones() {
        let mut table = JoinTable::new(Sign::Top);

        table.insert(Sign::Zero, Sign::Pos, Sign::Top);
        table.insert(Sign::Zero, Sign::Pos, Sign::NonNeg);

        assert_eq!(table.join(&Sign::Pos, &Sign::Zero), Sign::NonNeg);
    }

    #[test]
    fn binary_table_with_different_result_type() {
        let may_be_equal = BinaryTable::from_entries(
            true,
            [(Sign::Neg, Sign::Pos, false), (Sign::Neg, Sign::Zero, false)],
        );

        assert!(!may_be_equal.apply(&Sign::Pos, &Sign::Neg));
        assert!(may_be_equal.apply(&Sign::NonNeg, &Sign::Zero));
    }
}
