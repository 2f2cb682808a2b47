//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

/// Knobs for a VRP run.
///
/// Neither affects soundness, they trade precision for time.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RangeOptions {
    /// The most integer literals the jump set may have. Widening snaps bounds
    /// to literals of the function, past this many literals it snaps straight
    /// to `±∞` instead.
    pub jump_set_limit: usize,
    /// How many times narrowing may re-evaluate each constraint of an SCC.
    ///
    /// Every intermediate narrowing state is sound, so stopping early only
    /// costs precision.
    pub narrowing_rounds: usize,
}

impl Default for RangeOptions {
    fn default() -> Self {
        Self {
            jump_set_limit: 1000,
            narrowing_rounds: 10,
        }
    }
}
