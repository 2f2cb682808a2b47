//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! Small pieces shared by the IR, the dataflow framework and VRP.

mod dot;

pub use dot::*;

use std::collections::{HashMap, HashSet};

/// `HashMap` with `ahash` as the hasher. Almost every key we hash is a dense
/// `u32` id, SipHash is wasted effort on those.
pub type SaHashMap<K, V> = HashMap<K, V, ahash::RandomState>;

/// `HashSet` counterpart of [`SaHashMap`].
pub type SaHashSet<V> = HashSet<V, ahash::RandomState>;
