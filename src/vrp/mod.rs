//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! Sparse value-range propagation.
//!
//! Every integer, string and channel value of a function gets an interval:
//! the value itself for integers, the byte length for strings and the
//! capacity for channels. Ranges are computed by building a graph of
//! [`Constraint`]s (one per definition, sigmas included), splitting it into
//! strongly connected components and solving those in dependency order.
//! Loops are forced to terminate by widening to literals of the function and
//! then to infinity, and precision lost that way is partly recovered by
//! narrowing.
//!
//! ```
//! # use garnet::ir::*;
//! # use garnet::vrp::*;
//! // for i := 0; i < 10; i++ {}
//! let i64t = Type::Int(IntType::i64());
//! let mut b = FunctionBuilder::new("count");
//! let entry = b.create_block("entry");
//! let header = b.create_block("header");
//! let body = b.create_block("body");
//! let exit = b.create_block("exit");
//!
//! b.switch_to(entry);
//! let zero = b.iconst(IntType::i64(), 0);
//! let one = b.iconst(IntType::i64(), 1);
//! let ten = b.iconst(IntType::i64(), 10);
//! b.jump(header);
//!
//! b.switch_to(header);
//! let i = b.phi(i64t);
//! let cond = b.binary(BinaryOp::Lt, i, ten);
//! b.if_(cond, body, exit);
//!
//! b.switch_to(body);
//! let x = b.sigma(header, i);
//! let next = b.binary(BinaryOp::Add, x, one);
//! b.jump(header);
//!
//! b.switch_to(exit);
//! b.ret(&[]);
//!
//! b.add_phi_edge(i, zero);
//! b.add_phi_edge(i, next);
//! let func = b.finish();
//!
//! let mut graph = Graph::build(&func);
//! graph.solve();
//!
//! assert_eq!(graph.range(i).unwrap().to_string(), "[0, 10]");
//! assert_eq!(graph.range(x).unwrap().to_string(), "[0, 9]");
//! ```

mod constraint;
mod dot;
mod graph;
mod interval;
mod options;
mod solve;
mod z;

pub use constraint::*;
pub use graph::{EdgeKind, Graph, Vertex};
pub use interval::*;
pub use options::*;
pub use z::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::*;

    fn i64t() -> Type {
        Type::Int(IntType::i64())
    }

    fn interval(lower: Z, upper: Z) -> IntInterval {
        IntInterval::new(lower, upper)
    }

    fn fin(n: i64) -> Z {
        Z::from(n)
    }

    fn int(graph: &Graph<'_>, v: Value) -> IntInterval {
        graph
            .int_range(v)
            .cloned()
            .unwrap_or_else(|| panic!("{v:?} has no integer range"))
    }

    fn len(graph: &Graph<'_>, v: Value) -> IntInterval {
        match graph.range(v) {
            Some(Range::String(s)) => s.length.clone(),
            other => panic!("{v:?} has no string range, got {other:?}"),
        }
    }

    fn cap(graph: &Graph<'_>, v: Value) -> IntInterval {
        match graph.range(v) {
            Some(Range::Channel(c)) => c.size.clone(),
            other => panic!("{v:?} has no channel range, got {other:?}"),
        }
    }

    struct Loop {
        func: Function,
        i: Value,
        body: Value,
        next: Value,
        exit: Value,
    }

    // for i := 0; i < bound; i++ {}, with sigmas for `i` on both edges.
    // `bound` is either the literal 10 or the length of "hello".
    fn counting_loop(literal_bound: bool) -> Loop {
        let mut b = FunctionBuilder::new("count");
        let entry = b.create_block("entry");
        let header = b.create_block("header");
        let body = b.create_block("body");
        let exit = b.create_block("exit");

        b.switch_to(entry);
        let zero = b.iconst(IntType::i64(), 0);
        let one = b.iconst(IntType::i64(), 1);
        let bound = if literal_bound {
            b.iconst(IntType::i64(), 10)
        } else {
            let s = b.sconst("hello");
            b.len(s)
        };
        b.jump(header);

        b.switch_to(header);
        let i = b.phi(i64t());
        b.set_name(i, "i");
        let cond = b.binary(BinaryOp::Lt, i, bound);
        b.if_(cond, body, exit);

        b.switch_to(body);
        let x = b.sigma(header, i);
        let next = b.binary(BinaryOp::Add, x, one);
        b.jump(header);

        b.switch_to(exit);
        let e = b.sigma(header, i);
        b.ret(&[e]);

        b.add_phi_edge(i, zero);
        b.add_phi_edge(i, next);

        Loop {
            func: b.finish(),
            i,
            body: x,
            next,
            exit: e,
        }
    }

    #[test]
    fn constant_is_exact() {
        let mut b = FunctionBuilder::new("f");
        let entry = b.create_block("entry");
        b.switch_to(entry);
        let x = b.iconst(IntType::i32(), 5);
        b.ret(&[x]);
        let func = b.finish();

        let mut graph = Graph::build(&func);
        assert_eq!(graph.range(x), None);

        graph.solve();
        assert_eq!(int(&graph, x), IntInterval::constant(5));
    }

    #[test]
    fn branch_on_constant() {
        let mut b = FunctionBuilder::new("f");
        let entry = b.create_block("entry");
        let then = b.create_block("then");
        let otherwise = b.create_block("otherwise");

        b.switch_to(entry);
        let x = b.param(i64t(), "x");
        let ten = b.iconst(IntType::i64(), 10);
        let cond = b.binary(BinaryOp::Lt, x, ten);
        b.if_(cond, then, otherwise);

        b.switch_to(then);
        let t = b.sigma(entry, x);
        b.ret(&[t]);

        b.switch_to(otherwise);
        let f = b.sigma(entry, x);
        b.ret(&[f]);

        let func = b.finish();
        let mut graph = Graph::build(&func);
        graph.solve();

        let min = Z::from(IntType::i64().min_value());
        let max = Z::from(IntType::i64().max_value());

        assert_eq!(int(&graph, t), interval(min, fin(9)));
        assert_eq!(int(&graph, f), interval(fin(10), max));
        assert_eq!(graph.range(cond), None);
    }

    #[test]
    fn constant_on_the_left_is_swapped() {
        let mut b = FunctionBuilder::new("f");
        let entry = b.create_block("entry");
        let then = b.create_block("then");
        let otherwise = b.create_block("otherwise");

        b.switch_to(entry);
        let x = b.param(Type::Int(IntType::u8()), "x");
        let ten = b.iconst(IntType::u8(), 10);
        let cond = b.binary(BinaryOp::Lt, ten, x);
        b.if_(cond, then, otherwise);

        b.switch_to(then);
        let t = b.sigma(entry, x);
        b.ret(&[t]);

        b.switch_to(otherwise);
        let f = b.sigma(entry, x);
        b.ret(&[f]);

        let func = b.finish();
        let mut graph = Graph::build(&func);
        graph.solve();

        assert_eq!(int(&graph, t), interval(fin(11), fin(255)));
        assert_eq!(int(&graph, f), interval(fin(0), fin(10)));
    }

    #[test]
    fn bounded_loop() {
        let l = counting_loop(true);
        let mut graph = Graph::build(&l.func);
        graph.solve();

        assert_eq!(int(&graph, l.i), interval(fin(0), fin(10)));
        assert_eq!(int(&graph, l.body), interval(fin(0), fin(9)));
        assert_eq!(int(&graph, l.next), interval(fin(1), fin(10)));
        assert_eq!(int(&graph, l.exit), IntInterval::constant(10));
    }

    #[test]
    fn narrowing_recovers_without_jump_set() {
        let l = counting_loop(true);
        let options = RangeOptions {
            jump_set_limit: 0,
            ..RangeOptions::default()
        };

        let mut graph = Graph::build_with(&l.func, options);
        assert!(graph.jump_set().is_empty());

        graph.solve();

        assert_eq!(int(&graph, l.i), interval(fin(0), fin(10)));
        assert_eq!(int(&graph, l.body), interval(fin(0), fin(9)));
    }

    #[test]
    fn loop_bounded_by_a_value() {
        let l = counting_loop(false);
        let mut graph = Graph::build(&l.func);

        assert!(graph.constraints().any(|(_, c)| c.is_future()));

        graph.solve();

        assert_eq!(int(&graph, l.i), interval(fin(0), fin(5)));
        assert_eq!(int(&graph, l.body), interval(fin(0), fin(4)));
        assert_eq!(int(&graph, l.exit), IntInterval::constant(5));
    }

    #[test]
    fn unbounded_loop_terminates() {
        let mut b = FunctionBuilder::new("forever");
        let entry = b.create_block("entry");
        let body = b.create_block("loop");

        b.switch_to(entry);
        let zero = b.iconst(IntType::i64(), 0);
        let one = b.iconst(IntType::i64(), 1);
        b.jump(body);

        b.switch_to(body);
        let i = b.phi(i64t());
        let next = b.binary(BinaryOp::Add, i, one);
        b.jump(body);

        b.add_phi_edge(i, zero);
        b.add_phi_edge(i, next);

        let func = b.finish();
        let mut graph = Graph::build(&func);
        graph.solve();

        assert_eq!(int(&graph, i), interval(fin(0), Z::PosInf));
        assert_eq!(int(&graph, next), interval(fin(1), Z::PosInf));
    }

    #[test]
    fn mutually_recursive_phis_keep_their_lower_bound() {
        let mut b = FunctionBuilder::new("f");
        let entry = b.create_block("entry");
        let outer = b.create_block("outer");
        let inner = b.create_block("inner");
        let exit = b.create_block("exit");

        b.switch_to(entry);
        let c1 = b.param(Type::Bool, "c1");
        let c2 = b.param(Type::Bool, "c2");
        let five = b.iconst(IntType::i64(), 5);
        let one = b.iconst(IntType::i64(), 1);
        b.jump(outer);

        b.switch_to(outer);
        let p = b.phi(i64t());
        b.if_(c1, inner, exit);

        b.switch_to(inner);
        let q = b.phi(i64t());
        let n = b.binary(BinaryOp::Add, q, one);
        b.if_(c2, inner, outer);

        b.switch_to(exit);
        b.ret(&[p]);

        b.add_phi_edge(p, five);
        b.add_phi_edge(p, q);
        b.add_phi_edge(q, p);
        b.add_phi_edge(q, n);

        let func = b.finish();
        let mut graph = Graph::build(&func);
        graph.solve();

        assert!(graph.sccs().iter().any(|scc| scc.len() > 1));
        assert_eq!(int(&graph, p).lower(), &fin(5));
        assert_eq!(int(&graph, q).lower(), &fin(5));
        assert_eq!(int(&graph, n).lower(), &fin(6));
        assert!(int(&graph, p).contains(&5.into()));
    }

    #[test]
    fn out_of_range_results_are_clamped() {
        let mut b = FunctionBuilder::new("f");
        let entry = b.create_block("entry");
        b.switch_to(entry);

        let x = b.param(Type::Int(IntType::u8()), "x");
        let big = b.iconst(IntType::u8(), 200);
        let ten = b.iconst(IntType::u8(), 10);
        let over = b.binary(BinaryOp::Add, x, big);
        let under = b.binary(BinaryOp::Sub, x, ten);

        let y = b.param(Type::Int(IntType::i8()), "y");
        let hundred = b.iconst(IntType::i8(), 100);
        let ten_i8 = b.iconst(IntType::i8(), 10);
        let signed = b.binary(BinaryOp::Add, y, hundred);
        let fits = b.binary(BinaryOp::Sub, hundred, ten_i8);

        b.ret(&[over, under, signed, fits]);

        let func = b.finish();
        let mut graph = Graph::build(&func);
        graph.solve();

        let u8_range = IntInterval::of_type(IntType::u8());

        assert_eq!(int(&graph, over), u8_range);
        assert_eq!(int(&graph, under), u8_range);
        assert_eq!(int(&graph, signed), IntInterval::unbounded());
        assert_eq!(int(&graph, fits), IntInterval::constant(90));
    }

    #[test]
    fn unsupported_operations_are_maximal() {
        let mut b = FunctionBuilder::new("f");
        let entry = b.create_block("entry");
        b.switch_to(entry);

        let x = b.iconst(IntType::u16(), 100);
        let two = b.iconst(IntType::u16(), 2);
        let div = b.binary(BinaryOp::Quo, x, two);
        let neg = b.unary(UnaryOp::Neg, x);
        b.ret(&[div, neg]);

        let func = b.finish();
        let mut graph = Graph::build(&func);
        graph.solve();

        assert_eq!(int(&graph, div), IntInterval::of_type(IntType::u16()));
        assert_eq!(int(&graph, neg), IntInterval::of_type(IntType::u16()));
    }

    #[test]
    fn conversions() {
        let mut b = FunctionBuilder::new("f");
        let entry = b.create_block("entry");
        b.switch_to(entry);

        let small = b.iconst(IntType::i64(), 42);
        let big = b.iconst(IntType::i64(), 1000);
        let narrowed = b.convert(small, Type::Int(IntType::u8()));
        let wrapped = b.convert(big, Type::Int(IntType::u8()));
        b.ret(&[narrowed, wrapped]);

        let func = b.finish();
        let mut graph = Graph::build(&func);
        graph.solve();

        assert_eq!(int(&graph, narrowed), IntInterval::constant(42));
        assert_eq!(int(&graph, wrapped), IntInterval::of_type(IntType::u8()));
    }

    #[test]
    fn switch_cases() {
        let mut b = FunctionBuilder::new("f");
        let entry = b.create_block("entry");
        let low = b.create_block("low");
        let high = b.create_block("high");
        let other = b.create_block("other");

        b.switch_to(entry);
        let x = b.param(Type::Int(IntType::u32()), "x");
        let c1 = b.iconst(IntType::u32(), 1);
        let c2 = b.iconst(IntType::u32(), 2);
        let c9 = b.iconst(IntType::u32(), 9);
        b.constant_switch(x, &[(c1, low), (c2, low), (c9, high)], other);

        b.switch_to(low);
        let l = b.sigma(entry, x);
        b.ret(&[l]);

        b.switch_to(high);
        let h = b.sigma(entry, x);
        b.ret(&[h]);

        b.switch_to(other);
        let o = b.sigma(entry, x);
        b.ret(&[o]);

        let func = b.finish();
        let mut graph = Graph::build(&func);
        graph.solve();

        assert_eq!(int(&graph, l), interval(fin(1), fin(2)));
        assert_eq!(int(&graph, h), IntInterval::constant(9));
        assert_eq!(int(&graph, o), IntInterval::of_type(IntType::u32()));
    }

    #[test]
    fn strings_are_tracked_by_length() {
        let mut b = FunctionBuilder::new("f");
        let entry = b.create_block("entry");
        let then = b.create_block("then");
        let otherwise = b.create_block("otherwise");

        b.switch_to(entry);
        let s = b.param(Type::String, "s");
        let hello = b.sconst("hello");
        let world = b.sconst(", world");
        let both = b.binary(BinaryOp::Add, hello, world);
        let one = b.iconst(IntType::i64(), 1);
        let tail = b.slice(hello, Some(one), None);
        let n = b.len(both);
        let eq = b.binary(BinaryOp::Eq, s, hello);
        b.if_(eq, then, otherwise);

        b.switch_to(then);
        let t = b.sigma(entry, s);
        b.ret(&[t]);

        b.switch_to(otherwise);
        let f = b.sigma(entry, s);
        b.ret(&[f]);

        let func = b.finish();
        let mut graph = Graph::build(&func);
        graph.solve();

        let any_length = interval(fin(0), Z::PosInf);

        assert_eq!(len(&graph, s), any_length);
        assert_eq!(len(&graph, both), IntInterval::constant(12));
        assert_eq!(len(&graph, tail), IntInterval::constant(4));
        assert_eq!(int(&graph, n), IntInterval::constant(12));
        assert_eq!(len(&graph, t), IntInterval::constant(5));
        assert_eq!(len(&graph, f), any_length);
    }

    #[test]
    fn channels_are_tracked_by_capacity() {
        let mut b = FunctionBuilder::new("f");
        let entry = b.create_block("entry");
        let left = b.create_block("left");
        let right = b.create_block("right");
        let join = b.create_block("join");

        b.switch_to(entry);
        let cond = b.param(Type::Bool, "cond");
        let four = b.iconst(IntType::i64(), 4);
        b.if_(cond, left, right);

        b.switch_to(left);
        let buffered = b.make_chan(Some(four));
        b.jump(join);

        b.switch_to(right);
        let unbuffered = b.make_chan(None);
        b.jump(join);

        b.switch_to(join);
        let ch = b.phi(Type::Chan);
        let c = b.cap(ch);
        b.ret(&[c]);

        b.add_phi_edge(ch, buffered);
        b.add_phi_edge(ch, unbuffered);

        let func = b.finish();
        let mut graph = Graph::build(&func);
        graph.solve();

        assert_eq!(cap(&graph, buffered), IntInterval::constant(4));
        assert_eq!(cap(&graph, unbuffered), IntInterval::constant(0));
        assert_eq!(cap(&graph, ch), interval(fin(0), fin(4)));
        assert_eq!(int(&graph, c), interval(fin(0), Z::PosInf));
    }

    #[test]
    fn ranges_cover_every_tracked_value() {
        let l = counting_loop(true);
        let mut graph = Graph::build(&l.func);
        graph.solve();

        for value in l.func.values() {
            let tracked = Range::is_tracked(l.func.ty(value));

            assert_eq!(graph.ranges().contains(value), tracked, "{value:?}");
        }
    }

    #[test]
    fn solving_twice_is_stable() {
        let l = counting_loop(false);
        let mut graph = Graph::build(&l.func);
        graph.solve();

        let first: Vec<_> = graph.ranges().iter().map(|(v, r)| (v, r.clone())).collect();

        graph.solve();

        let second: Vec<_> = graph.ranges().iter().map(|(v, r)| (v, r.clone())).collect();

        assert_eq!(first, second);
    }

    #[test]
    fn dot_output() {
        let l = counting_loop(false);
        let mut graph = Graph::build(&l.func);
        graph.solve();

        let dot = graph.dot();

        assert!(dot.starts_with("digraph vrp {"));
        assert!(dot.contains("%i: [0, 5]"));
        assert!(dot.contains("style=\"dashed\""));
        assert!(dot.contains("shape=\"box\""));
        assert!(dot.contains("fillcolor="));
    }
}
