//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! Analyses over the shape of a function, as opposed to the values in it.
//!
//! The value-level analyses live in [`crate::dataflow`] and [`crate::vrp`].

mod dominators;
mod writer;

pub use dominators::*;
pub use writer::*;
