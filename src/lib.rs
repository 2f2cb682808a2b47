//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

#![deny(
    unreachable_pub,
    missing_docs,
    missing_abi,
    rust_2018_idioms,
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links
)]

//! # Garnet
//!
//! Static analysis over SSI-form functions: the IR itself, a generic sparse
//! dataflow framework that any join-semilattice can be plugged into, and a
//! value-range propagation for integers, string lengths and channel
//! capacities.
//!
//! Functions are built with [`ir::FunctionBuilder`], which places phis and
//! sigmas and computes dominators. Custom analyses implement
//! [`dataflow::Analysis`] and are run through [`dataflow::Framework`], while
//! ranges come from [`vrp::Graph`].

pub mod analysis;
pub mod arena;
pub mod dataflow;
pub mod error;
pub mod ir;
pub mod utility;
pub mod vrp;
