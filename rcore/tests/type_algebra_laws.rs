use proptest::prelude::*;
use proptest::test_runner::Config as ProptestConfig;
use rcore::type_checking::{sample_values_for_type, Coverage, TypeExpr, TypeTag, ALL_TAGS};
use rcore::RValue;

fn arb_tag() -> impl Strategy<Value = TypeTag> {
    prop::sample::select(ALL_TAGS.to_vec())
}

fn arb_coverage() -> impl Strategy<Value = Coverage> {
    prop_oneof![
        Just(Coverage::None),
        Just(Coverage::Potential),
        Just(Coverage::Partial),
        Just(Coverage::Full),
    ]
}

fn arb_type_expr() -> impl Strategy<Value = TypeExpr> {
    let leaf = prop_oneof![
        4 => arb_tag().prop_map(TypeExpr::atom),
        1 => Just(TypeExpr::anything()),
        1 => Just(TypeExpr::nothing()),
    ];
    leaf.prop_recursive(
        3,  // depth
        12, // max size
        2,  // items per collection
        |inner| {
            prop_oneof![
                (inner.clone(), inner.clone()).prop_map(|(a, b)| a.or(&b)),
                (inner.clone(), inner.clone()).prop_map(|(a, b)| a.and(&b)),
                inner.prop_map(|a| a.not()),
            ]
        },
    )
}

/// One representative of every class, vectors and non-vectors alike.
fn value_pool() -> Vec<RValue> {
    sample_values_for_type(TypeTag::Any)
}

fn members(expr: &TypeExpr, pool: &[RValue]) -> Vec<bool> {
    pool.iter().map(|v| expr.is_instance(v)).collect()
}

proptest! {
    #![proptest_config(ProptestConfig {
        // Do not write `.proptest-regressions` files into the repo.
        failure_persistence: None,
        cases: 128,
        .. ProptestConfig::default()
    })]

    #[test]
    fn or_is_commutative(a in arb_type_expr(), b in arb_type_expr()) {
        prop_assert_eq!(a.or(&b), b.or(&a));
    }

    #[test]
    fn or_and_are_union_and_intersection(a in arb_type_expr(), b in arb_type_expr()) {
        let pool = value_pool();
        for v in &pool {
            prop_assert_eq!(a.or(&b).is_instance(v), a.is_instance(v) || b.is_instance(v));
            prop_assert_eq!(a.and(&b).is_instance(v), a.is_instance(v) && b.is_instance(v));
        }
    }

    #[test]
    fn and_is_idempotent(a in arb_type_expr()) {
        let pool = value_pool();
        prop_assert_eq!(members(&a.and(&a), &pool), members(&a, &pool));
    }

    #[test]
    fn not_is_complement(a in arb_type_expr()) {
        let pool = value_pool();
        for v in &pool {
            prop_assert_eq!(a.not().is_instance(v), !a.is_instance(v));
        }
        prop_assert_eq!(members(&a.not().not(), &pool), members(&a, &pool));
    }

    #[test]
    fn contradiction_is_nothing(a in arb_type_expr()) {
        prop_assert!(a.and(&a.not()).is_nothing());
    }

    #[test]
    fn coverage_identities(x in arb_coverage()) {
        prop_assert_eq!(Coverage::Full.and(x), x);
        prop_assert_eq!(Coverage::None.or(x), x);
        prop_assert_eq!(Coverage::None.and(x), Coverage::None);
        prop_assert_eq!(Coverage::Full.or(x), Coverage::Full);
    }

    #[test]
    fn coverage_operators_commute(x in arb_coverage(), y in arb_coverage()) {
        prop_assert_eq!(x.and(y), y.and(x));
        prop_assert_eq!(x.or(y), y.or(x));
    }
}

#[test]
fn test_integer_or_double_membership() {
    let numbers = TypeExpr::atom(TypeTag::Integer).or(&TypeExpr::atom(TypeTag::Double));
    assert!(numbers.is_instance(&RValue::Int(5)));
    assert!(numbers.is_instance(&RValue::Double(5.0)));
    assert!(!numbers.is_instance(&RValue::str("s")));
}

#[test]
fn test_double_negation_keeps_sample_membership() {
    let numbers = TypeExpr::atom(TypeTag::Integer)
        .or(&TypeExpr::atom(TypeTag::Double))
        .with_positive_samples([RValue::Int(5), RValue::Double(0.5)])
        .with_negative_samples([RValue::str("s")]);
    let twice = numbers.not().not();
    for v in numbers.samples().values() {
        assert_eq!(twice.is_instance(v), numbers.is_instance(v));
    }
    assert!(twice.samples().positive().iter().any(|v| v.identical(&RValue::Int(5))));
    assert!(twice.samples().negative().iter().any(|v| v.identical(&RValue::str("s"))));
}
