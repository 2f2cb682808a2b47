//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use std::fmt::Write;

/// A tiny builder for Graphviz `digraph`s.
///
/// Both the Hasse diagrams of dataflow domains and the VRP constraint graph
/// are dumped through this, they're debugging aids and are never parsed back.
///
/// ```
/// # use garnet::utility::DotWriter;
/// let mut dot = DotWriter::new("g");
/// dot.node("a", "x = \"1\"", &[]);
/// dot.node("b", "y", &[("shape", "box")]);
/// dot.edge("a", "b", &[]);
///
/// let out = dot.finish();
/// assert!(out.starts_with("digraph g {"));
/// assert!(out.contains(r#"a [label="x = \"1\""];"#));
/// assert!(out.contains("a -> b;"));
/// ```
#[derive(Debug, Clone)]
pub struct DotWriter {
    out: String,
}

impl DotWriter {
    /// Starts a new graph named `name`.
    pub fn new(name: &str) -> Self {
        Self {
            out: format!("digraph {name} {{\n"),
        }
    }

    /// Emits a graph-wide attribute, e.g. `rankdir=BT`.
    pub fn attr(&mut self, key: &str, value: &str) {
        let _ = writeln!(self.out, "  {key}={value};");
    }

    /// Emits a node with a label and any extra attributes.
    pub fn node(&mut self, id: &str, label: &str, attrs: &[(&str, &str)]) {
        let _ = write!(self.out, "  {id} [label=\"{}\"", escape(label));

        for (key, value) in attrs {
            let _ = write!(self.out, ", {key}=\"{}\"", escape(value));
        }

        self.out.push_str("];\n");
    }

    /// Emits a directed edge.
    pub fn edge(&mut self, from: &str, to: &str, attrs: &[(&str, &str)]) {
        let _ = write!(self.out, "  {from} -> {to}");

        if !attrs.is_empty() {
            let list: Vec<String> = attrs
                .iter()
                .map(|(key, value)| format!("{key}=\"{}\"", escape(value)))
                .collect();

            let _ = write!(self.out, " [{}]", list.join(", "));
        }

        self.out.push_str(";\n");
    }

    /// Closes the graph and yields the DOT source.
    pub fn finish(mut self) -> String {
        self.out.push_str("}\n");

        self.out
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());

    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }

    out
}
