//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::analysis::FunctionWriter;
use crate::utility::{DotWriter, SaHashMap};
use crate::vrp::graph::{EdgeKind, Vertex};
use crate::vrp::Graph;
use petgraph::algo::tarjan_scc;
use petgraph::visit::EdgeRef;

const PALETTE: [&str; 8] = [
    "#fbb4ae", "#b3cde3", "#ccebc5", "#decbe4", "#fed9a6", "#ffffcc", "#e5d8bd", "#fddaec",
];

impl<'f> Graph<'f> {
    /// Renders the constraint graph as Graphviz DOT.
    ///
    /// Values are ellipses labeled with their range (or `?` before solving),
    /// constraints are boxes. Every SCC gets its own fill color, and edges
    /// from a future's bounds are dashed.
    pub fn dot(&self) -> String {
        let writer = FunctionWriter::new(self.func);
        let sccs = if self.sccs.is_empty() {
            tarjan_scc(&self.graph)
        } else {
            self.sccs.clone()
        };

        let scc_of: SaHashMap<_, usize> = sccs
            .iter()
            .enumerate()
            .flat_map(|(i, scc)| scc.iter().map(move |&node| (node, i)))
            .collect();

        let mut dot = DotWriter::new("vrp");

        for node in self.graph.node_indices() {
            let color = PALETTE[scc_of.get(&node).copied().unwrap_or(0) % PALETTE.len()];
            let id = format!("n{}", node.index());

            let (label, shape) = match self.graph[node] {
                Vertex::Value(v) => {
                    let range = match self.ranges.get(v) {
                        Some(range) => range.to_string(),
                        None => "?".to_owned(),
                    };

                    (format!("{}: {range}", writer.val(v)), "ellipse")
                }
                Vertex::Constraint(c) => (self.constraints[c].describe(&writer), "box"),
            };

            dot.node(&id, &label, &[("shape", shape), ("style", "filled"), ("fillcolor", color)]);
        }

        for edge in self.graph.edge_references() {
            let from = format!("n{}", edge.source().index());
            let to = format!("n{}", edge.target().index());

            match edge.weight() {
                EdgeKind::Control => dot.edge(&from, &to, &[("style", "dashed")]),
                EdgeKind::Use | EdgeKind::Define => dot.edge(&from, &to, &[]),
            }
        }

        dot.finish()
    }
}
