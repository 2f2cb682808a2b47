//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use std::fmt::Debug;
use std::hash::Hash;

/// Models a dense integer id that can index the arena types.
///
/// Every IR entity (values, instructions, blocks) and every VRP constraint is
/// one of these. Keys are only meaningful together with the arena that
/// produced them.
///
/// Prefer the [`arena_key`](crate::arena_key) and
/// [`dense_arena_key`](crate::dense_arena_key) macros over implementing this by hand.
pub trait ArenaKey: Copy + Eq + Hash + Ord + Debug {
    /// Creates a key from a raw slot index.
    ///
    /// Panics if `index` cannot be represented by the key's storage type.
    fn new(index: usize) -> Self;

    /// Gets the raw slot index back out of the key.
    fn index(self) -> usize;
}

/// Declares one or more type-safe arena keys.
///
/// The storage type defaults to `usize` and can be overridden per key.
///
/// ```
/// # use garnet::arena_key;
/// # use garnet::arena::ArenaMap;
/// arena_key! {
///     /// A node in some expression tree.
///     pub struct Node;
///
///     struct TinyNode(u8);
/// }
///
/// let mut nodes = ArenaMap::new();
/// let n: Node = nodes.insert("x + 1");
///
/// assert_eq!(nodes[n], "x + 1");
/// ```
#[macro_export(local_inner_macros)]
macro_rules! arena_key {
    ( $(#[$outer:meta])* $vis:vis struct $name:ident($ty:ty); $($rest:tt)* ) => {
        $(#[$outer])*
        #[repr(transparent)]
        #[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
        #[cfg_attr(feature = "enable-serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name($ty);

        impl $crate::arena::ArenaKey for $name {
            #[inline]
            fn new(index: usize) -> Self {
                use std::convert::TryInto;

                Self(index.try_into().expect("index is not representable with key type"))
            }

            #[inline]
            fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::write!(f, "{}({})", ::std::stringify!($name), self.0)
            }
        }

        arena_key!($($rest)*);
    };

    ( $(#[$outer:meta])* $vis:vis struct $name:ident; $($rest:tt)* ) => {
        arena_key! { $(#[$outer])* $vis struct $name(usize); $($rest)* }
    };

    () => {}
}

/// Same as [`arena_key`], but every key declared is backed by a [`u32`].
///
/// IR entities use these, a function with more than four billion values
/// is not something we care about.
///
/// ```
/// # use garnet::dense_arena_key;
/// # use garnet::arena::ArenaMap;
/// dense_arena_key! {
///     pub struct Reg;
/// }
///
/// let mut regs = ArenaMap::<Reg, &str>::new();
/// let r = regs.insert("rax");
/// assert_eq!(std::mem::size_of_val(&r), 4);
/// ```
#[macro_export(local_inner_macros)]
macro_rules! dense_arena_key {
    ( $(#[$outer:meta])* $vis:vis struct $name:ident; $($rest:tt)* ) => {
        arena_key! { $(#[$outer])* $vis struct $name(u32); }

        dense_arena_key!($($rest)*);
    };

    () => {}
}
