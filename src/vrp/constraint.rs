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
use crate::dense_arena_key;
use crate::ir::{IntType, Value};
use crate::vrp::{ChannelInterval, IntInterval, Range, StringInterval, Z};
use smallvec::{smallvec, SmallVec};

dense_arena_key! {
    /// A reference to a [`Constraint`] inside a [`Graph`](crate::vrp::Graph).
    pub struct ConstraintRef;
}

/// Every rule for deriving a range.
///
/// Inputs are the values whose ranges the rule reads, see
/// [`Constraint::inputs`]. The bounds of a [`Self::FutureIntIntersection`]
/// are deliberately not inputs, they are control dependencies that are only
/// read once their own SCC has been solved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConstraintKind {
    /// A fixed integer interval.
    IntInterval(IntInterval),
    /// `a + b`.
    IntAdd(Value, Value),
    /// `a - b`.
    IntSub(Value, Value),
    /// `a · b`.
    IntMul(Value, Value),
    /// A conversion to another integer type. The interval is carried over if
    /// it fits in the target type, otherwise the value could have wrapped to
    /// anything the target type can hold.
    IntConversion {
        /// The value being converted.
        x: Value,
        /// The type being converted to.
        target: IntType,
    },
    /// `x ∩ interval`, from a branch on a comparison with a constant.
    IntIntersection {
        /// The value being restricted.
        x: Value,
        /// The interval implied by the branch.
        interval: IntInterval,
    },
    /// `x ∩ [lower + lower_offset, upper + upper_offset]`, from a branch on a
    /// comparison with another value. The interval is only computed once
    /// `lower`/`upper` have ranges, until then it's `[-∞, ∞]`.
    FutureIntIntersection {
        /// The value being restricted.
        x: Value,
        /// The value whose lower bound becomes the lower bound, if any.
        lower: Option<Value>,
        /// The value whose upper bound becomes the upper bound, if any.
        upper: Option<Value>,
        /// Added to the lower bound, `1` for a strict `>`.
        lower_offset: Z,
        /// Added to the upper bound, `-1` for a strict `<`.
        upper_offset: Z,
        /// The interval once resolved.
        resolved: IntInterval,
    },
    /// A fixed string length.
    StringInterval(IntInterval),
    /// `a + b` on strings.
    StringConcat(Value, Value),
    /// `len(x)` of a string.
    StringLength(Value),
    /// `x[low:high]`.
    StringSlice {
        /// The string being sliced.
        x: Value,
        /// The lower index, `0` if missing.
        low: Option<Value>,
        /// The upper index, `len(x)` if missing.
        high: Option<Value>,
    },
    /// `x` restricted to a length, from a branch on equality with a literal.
    StringIntersection {
        /// The string being restricted.
        x: Value,
        /// The length implied by the branch.
        length: IntInterval,
    },
    /// A fixed channel capacity.
    ChannelInterval(IntInterval),
    /// `make(chan T, size)`.
    MakeChannel(Option<Value>),
    /// A channel conversion or a sigma of a channel, the capacity is unchanged.
    ChannelChangeType(Value),
    /// An SSA merge of any tracked type.
    Phi(SmallVec<[Value; 2]>),
}

/// One derivation rule: a [`ConstraintKind`] and the value it defines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Constraint {
    /// The rule.
    pub kind: ConstraintKind,
    /// The value whose range the rule computes.
    pub output: Value,
}

impl Constraint {
    /// Creates a constraint.
    pub fn new(kind: ConstraintKind, output: Value) -> Self {
        Self { kind, output }
    }

    /// The values whose ranges are read by [`Self::eval`].
    pub fn inputs(&self) -> SmallVec<[Value; 2]> {
        match &self.kind {
            ConstraintKind::IntInterval(_)
            | ConstraintKind::StringInterval(_)
            | ConstraintKind::ChannelInterval(_) => SmallVec::new(),
            ConstraintKind::IntAdd(a, b)
            | ConstraintKind::IntSub(a, b)
            | ConstraintKind::IntMul(a, b)
            | ConstraintKind::StringConcat(a, b) => smallvec![*a, *b],
            ConstraintKind::IntConversion { x, .. }
            | ConstraintKind::IntIntersection { x, .. }
            | ConstraintKind::FutureIntIntersection { x, .. }
            | ConstraintKind::StringIntersection { x, .. }
            | ConstraintKind::StringLength(x)
            | ConstraintKind::ChannelChangeType(x) => smallvec![*x],
            ConstraintKind::StringSlice { x, low, high } => std::iter::once(*x)
                .chain(low.iter().copied())
                .chain(high.iter().copied())
                .collect(),
            ConstraintKind::MakeChannel(size) => size.iter().copied().collect(),
            ConstraintKind::Phi(edges) => edges.clone(),
        }
    }

    /// The values a future's bounds come from. Empty for everything else.
    pub fn control_inputs(&self) -> SmallVec<[Value; 2]> {
        match &self.kind {
            ConstraintKind::FutureIntIntersection { lower, upper, .. } => {
                lower.iter().chain(upper.iter()).copied().collect()
            }
            _ => SmallVec::new(),
        }
    }

    /// Checks if this is an unresolved or resolved future.
    pub fn is_future(&self) -> bool {
        matches!(self.kind, ConstraintKind::FutureIntIntersection { .. })
    }

    /// Computes the range of the output from the ranges of the inputs.
    ///
    /// `range` gives the current range of any input. If an input that matters
    /// is unknown, so is the result (with the exception of phis, which merge
    /// whatever is known).
    pub fn eval(&self, range: impl Fn(Value) -> Range) -> Range {
        let int = |v: Value| range(v).interval().clone();

        match &self.kind {
            ConstraintKind::IntInterval(i) => Range::Int(i.clone()),
            ConstraintKind::IntAdd(a, b) => Range::Int(int(*a).add(&int(*b))),
            ConstraintKind::IntSub(a, b) => Range::Int(int(*a).sub(&int(*b))),
            ConstraintKind::IntMul(a, b) => Range::Int(int(*a).mul(&int(*b))),
            ConstraintKind::IntConversion { x, target } => Range::Int(convert(int(*x), *target)),
            ConstraintKind::IntIntersection { x, interval } => {
                Range::Int(known_intersection(&int(*x), interval))
            }
            ConstraintKind::FutureIntIntersection { x, resolved, .. } => {
                Range::Int(known_intersection(&int(*x), resolved))
            }
            ConstraintKind::StringInterval(length) => string(length.clone()),
            ConstraintKind::StringConcat(a, b) => string(int(*a).add(&int(*b))),
            ConstraintKind::StringLength(x) => Range::Int(int(*x)),
            ConstraintKind::StringSlice { x, low, high } => {
                let low = match low {
                    Some(low) => int(*low),
                    None => IntInterval::constant(0),
                };

                let high = match high {
                    Some(high) => int(*high),
                    None => int(*x),
                };

                string(slice_length(&low, &high))
            }
            ConstraintKind::StringIntersection { x, length } => {
                string(known_intersection(&int(*x), length))
            }
            ConstraintKind::ChannelInterval(size) => channel(size.clone()),
            ConstraintKind::MakeChannel(size) => channel(match size {
                Some(size) => {
                    known_intersection(&int(*size), &IntInterval::new(Z::from(0), Z::PosInf))
                }
                None => IntInterval::constant(0),
            }),
            ConstraintKind::ChannelChangeType(x) => channel(int(*x)),
            ConstraintKind::Phi(edges) => {
                let mut ranges = edges.iter().map(|&edge| range(edge));
                let first = ranges
                    .next()
                    .expect("phi constraints always have at least one edge");

                let merged = ranges.fold(first.interval().clone(), |acc, next| {
                    acc.union(next.interval())
                });

                first.with_interval(merged)
            }
        }
    }

    /// Describes the constraint with the names `writer` gives values, e.g.
    /// `%3 = %1 + 5`.
    pub fn describe(&self, writer: &FunctionWriter) -> String {
        let v = |value: &Value| writer.val(*value).to_owned();
        let opt = |value: &Option<Value>| value.as_ref().map(v).unwrap_or_default();

        let rhs = match &self.kind {
            ConstraintKind::IntInterval(i) => i.to_string(),
            ConstraintKind::IntAdd(a, b) => format!("{} + {}", v(a), v(b)),
            ConstraintKind::IntSub(a, b) => format!("{} - {}", v(a), v(b)),
            ConstraintKind::IntMul(a, b) => format!("{} * {}", v(a), v(b)),
            ConstraintKind::IntConversion { x, target } => format!("{target}({})", v(x)),
            ConstraintKind::IntIntersection { x, interval } => format!("{} ∩ {interval}", v(x)),
            ConstraintKind::FutureIntIntersection {
                x,
                lower,
                upper,
                lower_offset,
                upper_offset,
                ..
            } => format!(
                "{} ∩ [{}{}, {}{}]",
                v(x),
                lower.as_ref().map(v).unwrap_or_else(|| "-∞".to_owned()),
                offset(lower_offset),
                upper.as_ref().map(v).unwrap_or_else(|| "∞".to_owned()),
                offset(upper_offset)
            ),
            ConstraintKind::StringInterval(length) => format!("len {length}"),
            ConstraintKind::StringConcat(a, b) => format!("{} + {}", v(a), v(b)),
            ConstraintKind::StringLength(x) => format!("len({})", v(x)),
            ConstraintKind::StringSlice { x, low, high } => {
                format!("{}[{}:{}]", v(x), opt(low), opt(high))
            }
            ConstraintKind::StringIntersection { x, length } => {
                format!("{} ∩ len {length}", v(x))
            }
            ConstraintKind::ChannelInterval(size) => format!("cap {size}"),
            ConstraintKind::MakeChannel(size) => format!("make(chan, {})", opt(size)),
            ConstraintKind::ChannelChangeType(x) => format!("chan({})", v(x)),
            ConstraintKind::Phi(edges) => {
                let edges: Vec<String> = edges.iter().map(v).collect();

                format!("φ({})", edges.join(", "))
            }
        };

        format!("{} = {rhs}", v(&self.output))
    }
}

fn string(length: IntInterval) -> Range {
    Range::String(StringInterval { length })
}

fn channel(size: IntInterval) -> Range {
    Range::Channel(ChannelInterval { size })
}

fn convert(x: IntInterval, target: IntType) -> IntInterval {
    if !x.is_known() || x.is_empty() {
        return x;
    }

    let bounds = IntInterval::of_type(target);

    if x.intersection(&bounds) == x {
        x
    } else {
        bounds
    }
}

fn offset(z: &Z) -> String {
    match z.signum() {
        0 => String::new(),
        s if s > 0 => format!(" + {z}"),
        _ => format!(" - {}", -z.clone()),
    }
}

// intersecting with an unknown `x` must stay unknown, `IntInterval::intersection`
// would treat it as the identity instead
fn known_intersection(x: &IntInterval, with: &IntInterval) -> IntInterval {
    if x.is_known() {
        x.intersection(with)
    } else {
        IntInterval::unknown()
    }
}

// every combination of bounds, the length can't go below zero
fn slice_length(low: &IntInterval, high: &IntInterval) -> IntInterval {
    if !low.is_known() || !high.is_known() {
        return IntInterval::unknown();
    }

    if low.is_empty() || high.is_empty() {
        return IntInterval::empty();
    }

    let differences = [
        high.lower().checked_sub(low.lower()),
        high.upper().checked_sub(low.lower()),
        high.lower().checked_sub(low.upper()),
        high.upper().checked_sub(low.upper()),
    ];

    let lower = differences
        .iter()
        .map(|d| d.clone().unwrap_or(Z::NegInf))
        .min()
        .unwrap_or(Z::NegInf);

    let upper = differences
        .iter()
        .map(|d| d.clone().unwrap_or(Z::PosInf))
        .max()
        .unwrap_or(Z::PosInf);

    IntInterval::new(lower.max(Z::from(0)), upper)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::ArenaKey;
    use crate::utility::SaHashMap;

    fn iv(lower: i64, upper: i64) -> IntInterval {
        IntInterval::new(Z::from(lower), Z::from(upper))
    }

    fn eval(kind: ConstraintKind, ranges: &[(Value, Range)]) -> Range {
        let table: SaHashMap<Value, Range> = ranges.iter().cloned().collect();
        let constraint = Constraint::new(kind, Value::new(99));

        constraint.eval(|v| table[&v].clone())
    }

    #[test]
    fn slice_length_uses_every_bound_combination() {
        let s = Value::new(0);
        let low = Value::new(1);
        let high = Value::new(2);

        let result = eval(
            ConstraintKind::StringSlice {
                x: s,
                low: Some(low),
                high: Some(high),
            },
            &[
                (s, string(iv(10, 10))),
                (low, Range::Int(iv(1, 3))),
                (high, Range::Int(iv(5, 8))),
            ],
        );

        assert_eq!(result, string(iv(2, 7)));

        let to_end = eval(
            ConstraintKind::StringSlice {
                x: s,
                low: Some(low),
                high: None,
            },
            &[(s, string(iv(0, 4))), (low, Range::Int(iv(2, 6)))],
        );

        assert_eq!(to_end, string(iv(0, 2)));
    }

    #[test]
    fn slice_of_unbounded_string() {
        let s = Value::new(0);
        let result = eval(
            ConstraintKind::StringSlice {
                x: s,
                low: None,
                high: None,
            },
            &[(s, string(IntInterval::new(Z::from(0), Z::PosInf)))],
        );

        assert_eq!(result, string(IntInterval::new(Z::from(0), Z::PosInf)));
    }

    #[test]
    fn phi_merges_what_is_known() {
        let (a, b) = (Value::new(0), Value::new(1));
        let result = eval(
            ConstraintKind::Phi(smallvec![a, b]),
            &[(a, Range::Int(IntInterval::unknown())), (b, Range::Int(iv(3, 4)))],
        );

        assert_eq!(result, Range::Int(iv(3, 4)));
    }

    #[test]
    fn intersection_with_unknown_stays_unknown() {
        let x = Value::new(0);
        let result = eval(
            ConstraintKind::IntIntersection {
                x,
                interval: iv(0, 9),
            },
            &[(x, Range::Int(IntInterval::unknown()))],
        );

        assert!(!result.is_known());
    }

    #[test]
    fn conversions_that_may_wrap_give_the_whole_type() {
        let x = Value::new(0);
        let to_u8 = |interval: IntInterval| {
            eval(
                ConstraintKind::IntConversion {
                    x,
                    target: IntType::u8(),
                },
                &[(x, Range::Int(interval))],
            )
        };

        assert_eq!(to_u8(iv(3, 200)), Range::Int(iv(3, 200)));
        assert_eq!(to_u8(iv(-1, 200)), Range::Int(iv(0, 255)));
        assert_eq!(to_u8(iv(0, 256)), Range::Int(iv(0, 255)));
    }

    #[test]
    fn unbuffered_channel_has_no_capacity() {
        assert_eq!(eval(ConstraintKind::MakeChannel(None), &[]), channel(iv(0, 0)));
    }

    #[test]
    fn future_inputs_are_control_only() {
        let (x, n) = (Value::new(0), Value::new(1));
        let future = Constraint::new(
            ConstraintKind::FutureIntIntersection {
                x,
                lower: None,
                upper: Some(n),
                lower_offset: Z::from(0),
                upper_offset: Z::from(-1),
                resolved: IntInterval::unbounded(),
            },
            Value::new(2),
        );

        assert_eq!(future.inputs().as_slice(), &[x]);
        assert_eq!(future.control_inputs().as_slice(), &[n]);
        assert!(future.is_future());
    }
}
