//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! Provides the interfaces and the types required to build and read the
//! SSI-form IR that every analysis runs on.
//!
//! SSI is SSA plus explicit branch splits: every conditional edge that tells
//! us something about a value gets a [`InstKind::Sigma`] re-defining that value,
//! so branch facts become facts about distinct values.
//!
//! Nothing in here analyzes anything, see [`crate::dataflow`] and [`crate::vrp`].

mod block;
mod builders;
mod constant;
mod entities;
mod function;
mod instruction;
mod types;

pub use block::*;
pub use builders::*;
pub use constant::*;
pub use entities::*;
pub use function::*;
pub use instruction::*;
pub use types::*;
