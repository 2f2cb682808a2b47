//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::arena::{ArenaKey, ArenaMap};
use smallbitvec::{sbvec, SmallBitVec};
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;

/// A set of keys from some primary [`ArenaMap`], stored as a bitvector.
///
/// Equivalent to a `SecondaryMap<K, ()>` but a lot leaner. The dataflow worklist
/// uses one of these to know which instructions are already queued.
///
/// ```
/// # use garnet::dense_arena_key;
/// # use garnet::arena::*;
/// dense_arena_key! { struct Key; }
///
/// let mut set = SecondarySet::new();
///
/// assert!(set.insert(Key::new(3)));
/// assert!(!set.insert(Key::new(3)));
/// assert!(set.contains(Key::new(3)));
/// assert!(!set.contains(Key::new(2)));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct SecondarySet<K: ArenaKey> {
    bits: SmallBitVec,
    len: usize,
    _unused: PhantomData<fn() -> K>,
}

impl<K: ArenaKey> SecondarySet<K> {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self {
            bits: SmallBitVec::new(),
            len: 0,
            _unused: PhantomData,
        }
    }

    /// Creates an empty set sized for every key in `primary`.
    pub fn with_primary<T>(primary: &ArenaMap<K, T>) -> Self {
        Self {
            bits: sbvec![false; primary.len()],
            len: 0,
            _unused: PhantomData,
        }
    }

    /// Adds `key` to the set. Returns `true` if it was not already present.
    pub fn insert(&mut self, key: K) -> bool {
        let index = key.index();

        if index >= self.bits.len() {
            self.bits.resize(index + 1, false);
        }

        if self.bits[index] {
            return false;
        }

        self.bits.set(index, true);
        self.len += 1;

        true
    }

    /// Removes `key` from the set. Returns `true` if it was present.
    pub fn remove(&mut self, key: K) -> bool {
        if !self.contains(key) {
            return false;
        }

        self.bits.set(key.index(), false);
        self.len -= 1;

        true
    }

    /// Checks if `key` is in the set.
    #[inline]
    pub fn contains(&self, key: K) -> bool {
        self.bits.get(key.index()).unwrap_or(false)
    }

    /// Number of keys in the set.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Checks if the set is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates over the keys in the set, in key order.
    pub fn iter(&self) -> impl Iterator<Item = K> + '_ {
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, present)| *present)
            .map(|(i, _)| K::new(i))
    }
}

impl<K: ArenaKey> Default for SecondarySet<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ArenaKey> Debug for SecondarySet<K> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "SecondarySet ")?;

        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K: ArenaKey> FromIterator<K> for SecondarySet<K> {
    fn from_iter<T: IntoIterator<Item = K>>(iter: T) -> Self {
        let mut set = Self::new();

        for key in iter {
            set.insert(key);
        }

        set
    }
}
