//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::arena::SecondaryMap;
use crate::ir::*;
use std::fmt;
use std::fmt::{Display, Formatter, Write};
use std::ops::Range;

/// Turns a function into textual IR, and then maps each IR entity to a
/// range of text referring to it.
///
/// This is what the `Display` implementation for [`Function`] uses, and is
/// also how the VRP constraint graph labels its value nodes.
///
/// ```other
/// fn @count(i64 %n) {
/// entry:
///   jump loop
/// loop:                                   ; preds = entry, body
///   %0 = phi i64 [0, %2]
///   %1 = lt bool %0, %n
///   if %1 then body else exit
/// ...
/// ```
#[derive(Debug, Clone)]
pub struct FunctionWriter {
    whole: String,
    names: SecondaryMap<Value, String>,
    inst_ranges: SecondaryMap<Inst, Range<usize>>,
    block_ranges: SecondaryMap<Block, Range<usize>>,
}

impl FunctionWriter {
    /// Stringifies `func`.
    pub fn new(func: &Function) -> Self {
        let mut state = Self {
            whole: String::default(),
            names: SecondaryMap::default(),
            inst_ranges: SecondaryMap::default(),
            block_ranges: SecondaryMap::default(),
        };

        state.name_values(func);
        state.walk(func);

        state
    }

    /// Provides the name of a value. Constants are their literal, globals are
    /// `@name`, everything else is `%name` or `%N`.
    pub fn val(&self, value: Value) -> &str {
        &self.names[value]
    }

    /// Stringifies an entire instruction. This includes the result if the
    /// instruction actually has one.
    pub fn inst(&self, inst: Inst) -> &str {
        &self.whole[self.inst_ranges[inst].clone()]
    }

    /// Stringifies a whole block. This includes the block label and every
    /// instruction in the block.
    pub fn block(&self, bb: Block) -> &str {
        &self.whole[self.block_ranges[bb].clone()]
    }

    /// Returns the entire function as a string.
    pub fn function(&self) -> &str {
        &self.whole
    }

    fn name_values(&mut self, func: &Function) {
        let mut next = 0;

        for value in func.values() {
            let data = func.value(value);
            let name = match (data.def(), data.name()) {
                (ValueDef::Const(c), _) => c.to_string(),
                (ValueDef::Global, Some(name)) => format!("@{name}"),
                (_, Some(name)) => format!("%{name}"),
                (_, None) => {
                    next += 1;

                    format!("%{}", next - 1)
                }
            };

            self.names.insert(value, name);
        }
    }

    fn walk(&mut self, func: &Function) {
        let params: Vec<String> = func
            .params()
            .iter()
            .map(|&p| format!("{} {}", func.ty(p), self.val(p)))
            .collect();

        let _ = writeln!(self.whole, "fn @{}({}) {{", func.name(), params.join(", "));

        for block in func.blocks() {
            let start = self.whole.len();

            self.write_block(func, block);
            self.block_ranges.insert(block, start..self.whole.len());
        }

        self.whole.push('}');
    }

    fn write_block(&mut self, func: &Function, block: Block) {
        let data = func.block(block);
        let label = format!("{}:", data.name());

        if data.preds().is_empty() {
            let _ = writeln!(self.whole, "{label}");
        } else {
            let preds: Vec<&str> = data.preds().iter().map(|&p| func.block(p).name()).collect();

            let _ = writeln!(self.whole, "{label:<40}; preds = {}", preds.join(", "));
        }

        for &inst in data.insts() {
            self.whole.push_str("  ");

            let start = self.whole.len();
            let text = self.stringify_inst(func, inst);

            self.whole.push_str(&text);
            self.inst_ranges.insert(inst, start..self.whole.len());
            self.whole.push('\n');
        }
    }

    fn stringify_inst(&self, func: &Function, inst: Inst) -> String {
        let data = func.inst(inst);
        let kind = data.kind();
        let succs = func.block(data.block()).succs();
        let mut out = String::new();

        if let Some(result) = data.result() {
            let _ = write!(out, "{} = {} {}", self.val(result), kind.mnemonic(), func.ty(result));
        } else {
            out.push_str(kind.mnemonic());
        }

        let list = |values: &[Value]| -> String {
            values
                .iter()
                .map(|&v| self.val(v))
                .collect::<Vec<_>>()
                .join(", ")
        };

        let _ = match kind {
            InstKind::Phi { edges } => write!(out, " [{}]", list(edges)),
            InstKind::Sigma { from, x } => {
                write!(out, " {} from {}", self.val(*x), func.block(*from).name())
            }
            InstKind::Slice { x, low, high } => {
                let bound =
                    |b: &Option<Value>| b.map(|b| self.val(b).to_owned()).unwrap_or_default();

                write!(out, " {}[{}:{}]", self.val(*x), bound(low), bound(high))
            }
            InstKind::Call { callee, args } => {
                write!(out, " {}({})", self.val(*callee), list(args))
            }
            InstKind::If { cond } => write!(
                out,
                " {} then {} else {}",
                self.val(*cond),
                func.block(succs[0]).name(),
                func.block(succs[1]).name()
            ),
            InstKind::ConstantSwitch { tag, conds } => {
                let _ = write!(out, " {}", self.val(*tag));

                for (cond, succ) in conds.iter().zip(succs.iter()) {
                    let _ = write!(out, ", {} => {}", self.val(*cond), func.block(*succ).name());
                }

                write!(out, ", default => {}", func.block(succs[conds.len()]).name())
            }
            InstKind::Jump => write!(out, " {}", func.block(succs[0]).name()),
            _ => {
                let operands = kind.operands();

                if operands.is_empty() {
                    Ok(())
                } else {
                    write!(out, " {}", list(&operands))
                }
            }
        };

        out
    }
}

impl Display for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", FunctionWriter::new(self).function())
    }
}
