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
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

#[cfg(feature = "enable-serde")]
use serde::{Deserialize, Serialize};

/// A side table for keys that came from some primary [`ArenaMap`].
///
/// Not every key needs an entry, the table grows on demand as keys are inserted.
/// This is what the IR uses for data that only some entities have (e.g. the
/// referrers of a value, the dominator of a reachable block).
///
/// ```
/// # use garnet::dense_arena_key;
/// # use garnet::arena::*;
/// dense_arena_key! { struct Key; }
///
/// let mut names = ArenaMap::new();
/// let a: Key = names.insert("a");
/// let b = names.insert("b");
///
/// let mut uses = SecondaryMap::new();
/// uses.insert(b, 3);
///
/// assert_eq!(uses.get(a), None);
/// assert_eq!(uses[b], 3);
/// ```
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct SecondaryMap<K: ArenaKey, V> {
    slots: Vec<Option<V>>,
    len: usize,
    #[cfg_attr(feature = "enable-serde", serde(skip))]
    _unused: PhantomData<fn() -> K>,
}

impl<K: ArenaKey, V> SecondaryMap<K, V> {
    /// Creates an empty table.
    #[inline]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            len: 0,
            _unused: PhantomData,
        }
    }

    /// Creates an empty table with room for every key in `primary`.
    pub fn with_primary<T>(primary: &ArenaMap<K, T>) -> Self {
        let mut slots = Vec::with_capacity(primary.len());

        slots.resize_with(primary.len(), || None);

        Self {
            slots,
            len: 0,
            _unused: PhantomData,
        }
    }

    /// Checks if `key` has an entry.
    #[inline]
    pub fn contains(&self, key: K) -> bool {
        matches!(self.slots.get(key.index()), Some(Some(_)))
    }

    /// Sets the entry for `key`, returning the previous entry if there was one.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let index = key.index();

        if index >= self.slots.len() {
            self.slots.resize_with(index + 1, || None);
        }

        let old = self.slots[index].replace(value);

        if old.is_none() {
            self.len += 1;
        }

        old
    }

    /// Removes the entry for `key` if it exists.
    pub fn remove(&mut self, key: K) -> Option<V> {
        let old = self.slots.get_mut(key.index()).and_then(Option::take);

        if old.is_some() {
            self.len -= 1;
        }

        old
    }

    /// Gets the entry for `key`.
    #[inline]
    pub fn get(&self, key: K) -> Option<&V> {
        self.slots.get(key.index()).and_then(Option::as_ref)
    }

    /// Gets the entry for `key` mutably.
    #[inline]
    pub fn get_mut(&mut self, key: K) -> Option<&mut V> {
        self.slots.get_mut(key.index()).and_then(Option::as_mut)
    }

    /// Gets the entry for `key`, creating it with `f` first if it doesn't exist.
    pub fn get_or_insert_with<F: FnOnce() -> V>(&mut self, key: K, f: F) -> &mut V {
        if !self.contains(key) {
            self.insert(key, f());
        }

        self.slots[key.index()]
            .as_mut()
            .expect("entry was just inserted")
    }

    /// Number of keys with entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Checks if no key has an entry.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates over the keys that have entries, in key order.
    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    /// Iterates over the `(key, entry)` pairs, in key order.
    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|v| (K::new(i), v)))
    }

    /// Mutable version of [`Self::iter`].
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (K, &mut V)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_mut().map(|v| (K::new(i), v)))
    }
}

impl<K: ArenaKey, V> Default for SecondaryMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ArenaKey, V> Index<K> for SecondaryMap<K, V> {
    type Output = V;

    fn index(&self, key: K) -> &V {
        self.get(key)
            .expect("tried to index a secondary map with a key that has no entry")
    }
}

impl<K: ArenaKey, V> IndexMut<K> for SecondaryMap<K, V> {
    fn index_mut(&mut self, key: K) -> &mut V {
        self.get_mut(key)
            .expect("tried to index a secondary map with a key that has no entry")
    }
}

impl<K: ArenaKey, V: Debug> Debug for SecondaryMap<K, V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        super::debug_write_map(f, "SecondaryMap", self.iter())
    }
}
