//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! Error types for the analyses that can fail.
//!
//! VRP never fails, missing information only ever widens a range.

use crate::ir::Value;
use thiserror::Error;

/// The ways a dataflow run can go wrong. Both are bugs in the analysis
/// definition, not in the function being analyzed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataflowError {
    /// The lattice has `bottom == top`, so there is nothing to compute.
    #[error("lattice bottom and top are the same element")]
    BottomIsTop,

    /// A transfer function produced a state that is not above the previous one.
    /// `old` and `new` are the `Debug` forms of the two states.
    #[error("non-monotonic update for {value:?}: {old} -> {new}")]
    NonMonotonic {
        /// The value whose state was being updated.
        value: Value,
        /// The state before the update.
        old: String,
        /// The state the transfer function tried to install.
        new: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::ArenaKey;

    #[test]
    fn messages() {
        assert_eq!(
            DataflowError::BottomIsTop.to_string(),
            "lattice bottom and top are the same element"
        );

        let err = DataflowError::NonMonotonic {
            value: Value::new(3),
            old: "High".into(),
            new: "Low".into(),
        };

        assert_eq!(err.to_string(), "non-monotonic update for Value(3): High -> Low");
    }
}
