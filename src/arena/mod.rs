//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! Typed, dense-id arenas.
//!
//! The IR is a graph with back-edges everywhere (values know their users,
//! blocks know their predecessors, phis know their blocks). Instead of
//! reference-counted nodes pointing at each other, every entity lives in an
//! [`ArenaMap`] and is referred to by a small `Copy` key. Relationships are side
//! tables ([`SecondaryMap`], [`SecondarySet`]) keyed by those ids.
//!
//! Nothing can be deleted from a primary arena, IR is built once and is
//! immutable to the analyses that read it.
//!
//! ```
//! # use garnet::dense_arena_key;
//! # use garnet::arena::*;
//! dense_arena_key! {
//!     pub struct Node;
//! }
//!
//! enum Expr {
//!     Int(i64),
//!     Add(Node, Node),
//! }
//!
//! let mut arena = ArenaMap::new();
//! let lhs: Node = arena.insert(Expr::Int(2));
//! let rhs = arena.insert(Expr::Int(3));
//! let sum = arena.insert(Expr::Add(lhs, rhs));
//!
//! let mut users = SecondaryMap::new();
//! users.insert(lhs, vec![sum]);
//! users.insert(rhs, vec![sum]);
//! ```

mod key;
mod map;
mod secondary;
mod secondary_set;

pub use key::ArenaKey;
pub use map::ArenaMap;
pub use secondary::SecondaryMap;
pub use secondary_set::SecondarySet;

use std::fmt;
use std::fmt::{Debug, Formatter};

pub(in crate::arena) fn debug_write_map<'a, K, V>(
    f: &mut Formatter<'_>,
    name: &'static str,
    it: impl Iterator<Item = (K, &'a V)>,
) -> fmt::Result
where
    K: ArenaKey,
    V: Debug + 'a,
{
    write!(f, "{name} ")?;

    f.debug_map().entries(it).finish()
}
