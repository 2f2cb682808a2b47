//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! A generic monotone dataflow framework over SSI-form functions.
//!
//! An analysis is a join-semilattice of abstract states plus a transfer
//! function (see [`Analysis`]). [`Framework`] wraps one and makes the lattice
//! laws for ⊥, ⊤ and idempotence hold unconditionally, and an [`Instance`]
//! holds the per-value states of a single run.
//!
//! Runs are sparse: states hang off values, not program points, and an
//! instruction is only revisited when one of its operands changes. Every
//! update is checked for monotonicity, so a buggy transfer function is caught
//! instead of silently looping or producing unsound results.

mod framework;
mod instance;
mod lattice;
mod tables;

pub use framework::*;
pub use instance::*;
pub use lattice::*;
pub use tables::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DataflowError;
    use crate::ir::*;
    use proptest::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    enum Constness {
        Undef,
        Const(i64),
        NotConst,
    }

    // the join here is deliberately sloppy (it isn't idempotent), the
    // framework is supposed to paper over that
    struct ConstProp;

    impl ConstProp {
        fn state_of(instance: &Instance<'_, Self>, func: &Function, value: Value) -> Constness {
            match func.as_const(value).and_then(Constant::as_int) {
                Some(c) => Constness::Const(i64::try_from(c).unwrap_or(i64::MAX)),
                None => instance.value(value),
            }
        }
    }

    impl Analysis for ConstProp {
        type State = Constness;

        fn bottom(&self) -> Constness {
            Constness::Undef
        }

        fn top(&self) -> Constness {
            Constness::NotConst
        }

        fn join(&self, _: &Constness, _: &Constness) -> Constness {
            Constness::NotConst
        }

        fn transfer(
            &self,
            instance: &Instance<'_, Self>,
            func: &Function,
            inst: Inst,
        ) -> Updates<Constness> {
            let result = match func.inst_result(inst) {
                Some(result) => result,
                None => return Updates::new(),
            };

            let state = match func.inst(inst).kind() {
                InstKind::ChangeType { x } => Self::state_of(instance, func, *x),
                InstKind::Binary {
                    op: BinaryOp::Add,
                    lhs,
                    rhs,
                } => match (
                    Self::state_of(instance, func, *lhs),
                    Self::state_of(instance, func, *rhs),
                ) {
                    (Constness::Const(a), Constness::Const(b)) => Constness::Const(a + b),
                    (Constness::Undef, _) | (_, Constness::Undef) => Constness::Undef,
                    _ => Constness::NotConst,
                },
                _ => Constness::NotConst,
            };

            single(result, state, Decision::derived(&func.inst(inst).operands(), "fold"))
        }
    }

    fn branchy(lhs: i64, rhs: i64) -> (Function, Value, Value) {
        let mut b = FunctionBuilder::new("branchy");
        let entry = b.create_block("entry");
        let left = b.create_block("left");
        let right = b.create_block("right");
        let merge = b.create_block("merge");

        b.switch_to(entry);
        let c = b.param(Type::Bool, "c");
        let one = b.iconst(IntType::i64(), 1);
        b.if_(c, left, right);

        b.switch_to(left);
        let l = b.iconst(IntType::i64(), lhs);
        let a = b.change_type(l, Type::Int(IntType::i64()));
        b.jump(merge);

        b.switch_to(right);
        let r = b.iconst(IntType::i64(), rhs);
        let bb = b.change_type(r, Type::Int(IntType::i64()));
        b.jump(merge);

        b.switch_to(merge);
        let phi = b.phi(Type::Int(IntType::i64()));
        b.add_phi_edge(phi, a);
        b.add_phi_edge(phi, bb);
        let sum = b.binary(BinaryOp::Add, phi, one);
        b.ret(&[sum]);

        (b.finish(), phi, sum)
    }

    #[test]
    fn wrapper_enforces_lattice_laws() {
        let framework = Framework::new(ConstProp);
        let elements = [
            Constness::Undef,
            Constness::Const(-3),
            Constness::Const(7),
            Constness::NotConst,
        ];

        for x in elements.iter() {
            assert_eq!(framework.join(x, &Constness::Undef), *x);
            assert_eq!(framework.join(&Constness::Undef, x), *x);
            assert_eq!(framework.join(x, &Constness::NotConst), Constness::NotConst);
            assert_eq!(framework.join(&Constness::NotConst, x), Constness::NotConst);
            assert_eq!(framework.join(x, x), *x);
        }

        assert_eq!(
            framework.join(&Constness::Const(1), &Constness::Const(2)),
            Constness::NotConst
        );
    }

    proptest! {
        #[test]
        fn wrapper_laws_hold_for_any_constant(n in any::<i64>()) {
            let framework = Framework::new(ConstProp);
            let x = Constness::Const(n);

            prop_assert_eq!(framework.join(&x, &x), x.clone());
            prop_assert_eq!(framework.join(&Constness::Undef, &x), x.clone());
            prop_assert!(framework.leq(&x, &Constness::NotConst));
            prop_assert!(!framework.leq(&Constness::NotConst, &x));
        }
    }

    #[test]
    fn phi_is_join_of_edges() {
        let (func, phi, sum) = branchy(4, 4);
        let framework = Framework::new(ConstProp);
        let instance = framework.forward(&func).unwrap();

        assert_eq!(instance.value(phi), Constness::Const(4));
        assert_eq!(instance.value(sum), Constness::Const(5));
        assert_eq!(instance.decision(phi).unwrap().inputs.len(), 2);

        let (func, phi, sum) = branchy(4, 5);
        let instance = framework.forward(&func).unwrap();

        assert_eq!(instance.value(phi), Constness::NotConst);
        assert_eq!(instance.value(sum), Constness::NotConst);
    }

    #[test]
    fn rerunning_changes_nothing() {
        let (func, _, _) = branchy(1, 2);
        let framework = Framework::new(ConstProp);
        let mut instance = framework.forward(&func).unwrap();

        let collect = |instance: &Instance<'_, ConstProp>| {
            let mut all: Vec<Mapping<Constness>> = instance.mappings().cloned().collect();

            all.sort_by_key(|m| m.value);
            all
        };

        let before = collect(&instance);

        instance.forward(&func).unwrap();

        assert_eq!(before, collect(&instance));
        assert!(!before.is_empty());
    }

    #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
    enum Level {
        Bottom,
        Low,
        High,
        Top,
    }

    // sets the first parameter to `High` on the first call and `Low` on the second
    struct Decreasing;

    impl Analysis for Decreasing {
        type State = Level;

        fn bottom(&self) -> Level {
            Level::Bottom
        }

        fn top(&self) -> Level {
            Level::Top
        }

        fn join(&self, a: &Level, b: &Level) -> Level {
            a.max(b).clone()
        }

        fn transfer(&self, _: &Instance<'_, Self>, func: &Function, inst: Inst) -> Updates<Level> {
            let x = func.params()[0];

            match func.inst(inst).kind() {
                InstKind::Len { .. } => single(x, Level::High, Decision::source("first")),
                InstKind::Cap { .. } => single(x, Level::Low, Decision::source("second")),
                _ => Updates::new(),
            }
        }
    }

    #[test]
    fn non_monotonic_update_aborts() {
        let mut b = FunctionBuilder::new("f");
        let entry = b.create_block("entry");
        b.switch_to(entry);

        let x = b.param(Type::Chan, "x");
        let len = b.len(x);
        let cap = b.cap(x);
        b.ret(&[len, cap]);

        let func = b.finish();
        let framework = Framework::new(Decreasing);
        let mut instance = framework.start().unwrap();
        let err = instance.forward(&func).unwrap_err();

        assert_eq!(
            err,
            DataflowError::NonMonotonic {
                value: x,
                old: "High".into(),
                new: "Low".into(),
            }
        );
        assert_eq!(instance.mappings().count(), 0);
        assert_eq!(instance.value(x), Level::Bottom);
    }

    struct Degenerate;

    impl Analysis for Degenerate {
        type State = ();

        fn bottom(&self) {}

        fn top(&self) {}

        fn join(&self, _: &(), _: &()) {}

        fn transfer(&self, _: &Instance<'_, Self>, _: &Function, _: Inst) -> Updates<()> {
            Updates::new()
        }
    }

    #[test]
    fn bottom_equal_to_top_is_rejected() {
        let framework = Framework::new(Degenerate);

        assert!(matches!(framework.start(), Err(DataflowError::BottomIsTop)));
    }

    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    enum Taint {
        Unknown,
        Clean,
        Tainted,
    }

    // `call @taint(x)` taints `x` itself, `len x` inherits taint from `x`
    struct TaintTracking;

    impl Analysis for TaintTracking {
        type State = Taint;

        fn bottom(&self) -> Taint {
            Taint::Unknown
        }

        fn top(&self) -> Taint {
            Taint::Tainted
        }

        fn join(&self, _: &Taint, _: &Taint) -> Taint {
            Taint::Tainted
        }

        fn transfer(
            &self,
            instance: &Instance<'_, Self>,
            func: &Function,
            inst: Inst,
        ) -> Updates<Taint> {
            match func.inst(inst).kind() {
                InstKind::Call { callee, args } if func.value(*callee).name() == Some("taint") => {
                    let decision = || Decision::source("sink argument");

                    args.iter()
                        .map(|&arg| Update::new(arg, Taint::Tainted, decision()))
                        .collect()
                }
                InstKind::Len { x } => {
                    let state = match instance.value(*x) {
                        Taint::Tainted => Taint::Tainted,
                        _ => Taint::Clean,
                    };

                    single(
                        func.inst_result(inst).unwrap(),
                        state,
                        Decision::derived(&[*x], "len"),
                    )
                }
                _ => Updates::new(),
            }
        }
    }

    #[test]
    fn updates_to_other_values_revisit_their_users() {
        let mut b = FunctionBuilder::new("f");
        let entry = b.create_block("entry");
        b.switch_to(entry);

        let s = b.param(Type::String, "s");
        let taint = b.global(Type::Opaque, "taint");
        let len = b.len(s);
        b.call(taint, &[s], Type::Opaque);
        b.ret(&[len]);

        let func = b.finish();
        let framework = Framework::new(TaintTracking);
        let instance = framework.forward(&func).unwrap();

        assert_eq!(instance.value(s), Taint::Tainted);
        assert_eq!(instance.value(len), Taint::Tainted);
        assert!(instance.decision(s).unwrap().source);
        assert_eq!(instance.mapping(len).unwrap().decision.inputs.as_slice(), &[s]);
    }

    #[test]
    fn hasse_diagram_of_flat_lattice() {
        let framework = Framework::new(ConstProp);
        let dot = framework.dot(&[
            Constness::Undef,
            Constness::Const(1),
            Constness::Const(2),
            Constness::NotConst,
            Constness::Const(1),
        ]);

        assert!(dot.starts_with("digraph lattice {"));
        assert!(dot.contains("rankdir=BT;"));
        assert!(dot.contains("n1 [label=\"Const(1)\"];"));
        assert!(dot.contains("n0 -> n1;"));
        assert!(dot.contains("n0 -> n2;"));
        assert!(dot.contains("n1 -> n3;"));
        assert!(dot.contains("n2 -> n3;"));
        assert!(!dot.contains("n0 -> n3;"));
        assert!(!dot.contains("n4"));
    }
}
