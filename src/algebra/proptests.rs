//! Property-based tests for parsing and rendering expressions.

use proptest::prelude::*;
use std::collections::HashMap;

use crate::algebra::{
    parse, BinaryOperation, EvaluationError, Expression,
};

fn operation() -> impl Strategy<Value = BinaryOperation> {
    prop_oneof![
        Just(BinaryOperation::Plus),
        Just(BinaryOperation::Minus),
        Just(BinaryOperation::Times),
        Just(BinaryOperation::Divide),
        Just(BinaryOperation::Power),
    ]
}

// Small trees over integers, one-decimal numbers (both signs), and x/y/z
fn expression() -> impl Strategy<Value = Expression> {
    let leaf = prop_oneof![
        (-20i32..20).prop_map(|n| Expression::constant(f64::from(n))),
        (-200i32..200)
            .prop_map(|n| Expression::constant(f64::from(n) / 10.0)),
        prop::sample::select(vec!["x", "y", "z"])
            .prop_map(Expression::parameter),
    ];

    leaf.prop_recursive(4, 32, 2, |inner| {
        (inner.clone(), operation(), inner).prop_map(|(left, op, right)| {
            Expression::binary(left, op, right)
        })
    })
}

fn bindings(x: f64, y: f64, z: f64) -> HashMap<String, f64> {
    vec![("x", x), ("y", y), ("z", z)]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

fn same_outcome(
    left: &Result<f64, EvaluationError>,
    right: &Result<f64, EvaluationError>,
) -> bool {
    match (left, right) {
        (Ok(l), Ok(r)) => l == r || (l.is_nan() && r.is_nan()),
        (Err(l), Err(r)) => l == r,
        _ => false,
    }
}

proptest! {
    #[test]
    fn rendering_then_reparsing_preserves_the_value(
        expr in expression(),
        x in -10.0f64..10.0,
        y in -10.0f64..10.0,
        z in -10.0f64..10.0,
    ) {
        let vars = bindings(x, y, z);
        let rendered = expr.to_string();
        let reparsed = parse(&rendered).unwrap();

        let original = expr.evaluate(&vars);
        let round_tripped = reparsed.evaluate(&vars);

        prop_assert!(
            same_outcome(&original, &round_tripped),
            "{} gave {:?} but {:?} after reparsing",
            rendered,
            original,
            round_tripped,
        );
    }

    #[test]
    fn rendering_is_idempotent(expr in expression()) {
        let once = expr.to_string();
        let twice = parse(&once).unwrap().to_string();

        prop_assert_eq!(once, twice);
    }

    #[test]
    fn implicit_multiplication_matches_explicit(x in -1000.0f64..1000.0) {
        let vars = bindings(x, 0.0, 0.0);
        let implicit = parse("2(x+1)").unwrap().evaluate(&vars).unwrap();
        let explicit = parse("2*(x+1)").unwrap().evaluate(&vars).unwrap();

        prop_assert_eq!(implicit, explicit);
    }
}
