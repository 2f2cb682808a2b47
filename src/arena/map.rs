//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::arena::ArenaKey;
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

#[cfg(feature = "enable-serde")]
use serde::{Deserialize, Serialize};

/// The primary storage for some kind of entity, mapping `K -> V`.
///
/// This is a typed `Vec<V>`: keys are handed out in insertion order and are never
/// invalidated, because nothing can be removed. Side tables keyed by the same
/// entity should be [`SecondaryMap`](super::SecondaryMap)s.
///
/// ```
/// # use garnet::dense_arena_key;
/// # use garnet::arena::ArenaMap;
/// dense_arena_key! { struct Key; }
///
/// let mut map = ArenaMap::new();
/// let k1: Key = map.insert(5);
/// let k2 = map.insert(6);
///
/// assert_eq!(map[k1] + map[k2], 11);
/// assert_eq!(map.keys().collect::<Vec<_>>(), [k1, k2]);
/// ```
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct ArenaMap<K: ArenaKey, V> {
    slots: Vec<V>,
    #[cfg_attr(feature = "enable-serde", serde(skip))]
    _unused: PhantomData<fn() -> K>,
}

impl<K: ArenaKey, V> ArenaMap<K, V> {
    /// Creates an empty arena.
    #[inline]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            _unused: PhantomData,
        }
    }

    /// Checks whether `key` has been handed out by [`Self::insert`].
    #[inline]
    pub fn contains(&self, key: K) -> bool {
        key.index() < self.slots.len()
    }

    /// Gets the value for `key`, or `None` if the key is not from this arena.
    #[inline]
    pub fn get(&self, key: K) -> Option<&V> {
        self.slots.get(key.index())
    }

    /// Mutable version of [`Self::get`].
    #[inline]
    pub fn get_mut(&mut self, key: K) -> Option<&mut V> {
        self.slots.get_mut(key.index())
    }

    /// Moves `value` into the arena and returns the key that now refers to it.
    #[inline]
    pub fn insert(&mut self, value: V) -> K {
        self.slots.push(value);

        K::new(self.slots.len() - 1)
    }

    /// Gets the key that the next call to [`Self::insert`] will return.
    #[inline]
    pub fn next_key(&self) -> K {
        K::new(self.slots.len())
    }

    /// Number of entities in the arena.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Checks if the arena has nothing in it.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Iterates over every key, in insertion order.
    pub fn keys(&self) -> impl DoubleEndedIterator<Item = K> + ExactSizeIterator {
        (0..self.slots.len()).map(K::new)
    }

    /// Iterates over every value, in insertion order.
    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + ExactSizeIterator {
        self.slots.iter()
    }

    /// Iterates over every `(key, value)` pair, in insertion order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (K, &V)> + ExactSizeIterator {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, v)| (K::new(i), v))
    }

    /// Mutable version of [`Self::iter`].
    pub fn iter_mut(&mut self) -> impl DoubleEndedIterator<Item = (K, &mut V)> + ExactSizeIterator {
        self.slots
            .iter_mut()
            .enumerate()
            .map(|(i, v)| (K::new(i), v))
    }
}

impl<K: ArenaKey, V> Default for ArenaMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ArenaKey, V> Index<K> for ArenaMap<K, V> {
    type Output = V;

    #[inline]
    fn index(&self, key: K) -> &V {
        &self.slots[key.index()]
    }
}

impl<K: ArenaKey, V> IndexMut<K> for ArenaMap<K, V> {
    #[inline]
    fn index_mut(&mut self, key: K) -> &mut V {
        &mut self.slots[key.index()]
    }
}

impl<K: ArenaKey, V: Debug> Debug for ArenaMap<K, V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        super::debug_write_map(f, "ArenaMap", self.iter())
    }
}

#[cfg(test)]
mod tests {
    use crate::arena::*;
    use crate::dense_arena_key;

    dense_arena_key! { struct Key; }

    #[test]
    fn next_key_matches_insert() {
        let mut map = ArenaMap::<Key, &str>::new();
        let predicted = map.next_key();

        assert!(!map.contains(predicted));

        let k = map.insert("hello");

        assert_eq!(k, predicted);
        assert!(map.contains(k));
    }

    #[test]
    fn iteration_follows_insertion_order() {
        let mut map = ArenaMap::<Key, i32>::new();
        let keys: Vec<Key> = (0..5).map(|i| map.insert(i * 10)).collect();

        assert_eq!(map.keys().collect::<Vec<_>>(), keys);
        assert_eq!(map.values().copied().collect::<Vec<_>>(), [0, 10, 20, 30, 40]);

        for (_, v) in map.iter_mut() {
            *v += 1;
        }

        assert_eq!(map[keys[2]], 21);
    }

    #[test]
    fn get_outside_arena_is_none() {
        let mut map = ArenaMap::<Key, i32>::new();
        let _ = map.insert(1);

        assert_eq!(map.get(Key::new(3)), None);
    }
}
