// Transition table of the update engine, case by case
use rcore::runtime::{RComplex, REnvironment, VectorData, INT_NA};
use rcore::update::{select, Transition, UpdateContext};
use rcore::{Positions, RError, RValue, RVector};

struct Case {
    name: &'static str,
    is_subset: bool,
    vector: RValue,
    value: RValue,
    positions: Positions,
    expected: Transition,
}

fn case(name: &'static str, is_subset: bool, vector: RValue, value: RValue, position: RValue, expected: Transition) -> Case {
    Case {
        name,
        is_subset,
        vector,
        value,
        positions: Positions::Single(position),
        expected,
    }
}

fn fail(e: RError) -> Transition {
    Transition::Fail(e)
}

fn ints() -> RValue {
    RValue::ints(vec![1, 2, 3])
}

fn list2() -> RValue {
    RValue::list(vec![RValue::Int(1), RValue::Int(2)])
}

fn matrix() -> RValue {
    RValue::Vector(RVector::with_dims(VectorData::Int(vec![1, 2, 3, 4]), vec![2, 2]).unwrap())
}

fn empty() -> RValue {
    RValue::ints(vec![])
}

fn complex() -> RValue {
    RValue::Complex(RComplex::new(1.0, 0.0))
}

fn run(cases: Vec<Case>) {
    for c in cases {
        let ctx = UpdateContext::new(c.is_subset, &c.vector, &c.value, &c.positions, 0);
        assert_eq!(select(&ctx), c.expected, "case '{}'", c.name);
    }
}

#[test]
fn test_subset_atomic_transitions() {
    use Transition::*;
    run(vec![
        case("positive", true, ints(), RValue::Int(1), RValue::Int(2), WriteElements),
        case("zero", true, ints(), RValue::Int(1), RValue::Int(0), Unchanged),
        case("null position", true, ints(), RValue::Int(1), RValue::Null, Unchanged),
        case("empty position", true, ints(), RValue::Int(1), empty(), Unchanged),
        case("name", true, ints(), RValue::Int(1), RValue::str("a"), WriteElements),
        case("na with single", true, ints(), RValue::Int(1), RValue::Int(INT_NA), Unchanged),
        case("minus infinity", true, ints(), RValue::Int(1), RValue::Double(f64::NEG_INFINITY), Unchanged),
        case("past integer range", true, ints(), RValue::Int(1), RValue::Double(1e15), Unchanged),
        case("na with multi", true, ints(), RValue::ints(vec![1, 2]), RValue::Int(INT_NA), fail(RError::NaSubscripted)),
        case("null value", true, ints(), RValue::Null, RValue::Int(1), fail(RError::Replacement0)),
        case("null value at zero", true, ints(), RValue::Null, RValue::Int(0), Unchanged),
        case(
            "closure position",
            true,
            ints(),
            RValue::Int(1),
            RValue::function("f"),
            fail(RError::invalid_subscript_type("closure")),
        ),
    ]);
}

#[test]
fn test_subscript_atomic_transitions() {
    use Transition::*;
    run(vec![
        case("null value", false, ints(), RValue::Null, RValue::Int(1), fail(RError::MoreSuppliedReplace)),
        case("null value vector", false, ints(), RValue::Null, RValue::ints(vec![1, 2]), fail(RError::SelectMore1)),
        case("null value zero path", false, ints(), RValue::Null, RValue::ints(vec![0, 1]), fail(RError::SelectLess1)),
        case("zero path", false, ints(), RValue::Int(9), RValue::ints(vec![0, 1]), fail(RError::SelectLess1)),
        case("path", false, ints(), RValue::Int(9), RValue::ints(vec![1, 2]), fail(RError::SelectMore1)),
        case("path multi", false, ints(), RValue::ints(vec![7, 8]), RValue::ints(vec![1, 2]), fail(RError::SelectMore1)),
        case("long zero path", false, ints(), RValue::Int(9), RValue::ints(vec![0, 1, 2]), fail(RError::SelectMore1)),
        case("missing", false, ints(), RValue::Int(1), RValue::Missing, fail(RError::SelectLess1)),
        case("missing multi", false, ints(), RValue::ints(vec![1, 2]), RValue::Missing, fail(RError::MoreSuppliedReplace)),
        case("negative", false, ints(), RValue::Int(1), RValue::Int(-1), fail(RError::SelectMore1)),
        case(
            "negative past single",
            false,
            RValue::ints(vec![5]),
            RValue::Int(1),
            RValue::Int(-2),
            fail(RError::SelectLess1),
        ),
        case("out of range", false, ints(), RValue::Int(1), RValue::Int(7), WriteElements),
        case("na", false, ints(), RValue::Int(1), RValue::Int(INT_NA), fail(RError::SelectMore1)),
        case("minus infinity", false, ints(), RValue::Int(1), RValue::Double(f64::NEG_INFINITY), fail(RError::SelectMore1)),
    ]);
}

#[test]
fn test_list_transitions() {
    use Transition::*;
    run(vec![
        case("delete na", false, list2(), RValue::Null, RValue::Int(INT_NA), Unchanged),
        case("delete zero", false, list2(), RValue::Null, RValue::Int(0), fail(RError::SelectLess1)),
        case("delete missing", false, list2(), RValue::Null, RValue::Missing, fail(RError::SelectLess1)),
        case("delete null", false, list2(), RValue::Null, RValue::Null, fail(RError::SelectMore1)),
        case("delete one", false, list2(), RValue::Null, RValue::Int(1), DeleteElement),
        case("delete path", false, list2(), RValue::Null, RValue::ints(vec![1, 1]), Recurse),
        case("subset delete all", true, list2(), RValue::Null, RValue::Missing, DeleteElements),
        case("subset delete na", true, list2(), RValue::Null, RValue::Int(INT_NA), Unchanged),
        case("store na", false, list2(), RValue::Int(1), RValue::Int(INT_NA), fail(RError::SelectMore1)),
        case("store null position", false, list2(), RValue::Int(1), RValue::Null, fail(RError::SelectMore1)),
        case("store", false, list2(), RValue::ints(vec![1, 2]), RValue::Int(5), StoreElement),
        case("store closure", false, list2(), RValue::function("f"), RValue::Int(1), StoreElement),
        case("subset write", true, list2(), RValue::Int(1), RValue::Int(1), WriteElements),
    ]);
}

#[test]
fn test_null_receiver_transitions() {
    use Transition::*;
    run(vec![
        case("subscript vector", false, RValue::Null, RValue::Int(1), RValue::ints(vec![1, 2]), fail(RError::SelectMore1)),
        case("subset zero", true, RValue::Null, RValue::Int(1), RValue::Int(0), Unchanged),
        case("subscript zero", false, RValue::Null, RValue::Int(1), RValue::Int(0), fail(RError::SelectLess1)),
        case("subscript na", false, RValue::Null, RValue::Int(1), RValue::Int(INT_NA), fail(RError::SubscriptBoundsSub)),
        case(
            "subset closure",
            true,
            RValue::Null,
            RValue::function("f"),
            RValue::Int(1),
            fail(RError::subassign_type_fix("closure", "NULL")),
        ),
        case("subscript closure", false, RValue::Null, RValue::function("f"), RValue::Int(1), CreateFromNull),
        case("subset create", true, RValue::Null, RValue::ints(vec![1, 2]), RValue::ints(vec![2, 3]), CreateFromNull),
        case("null into null", true, RValue::Null, RValue::Null, RValue::Int(1), Unchanged),
    ]);
}

#[test]
fn test_subscript_type_transitions() {
    run(vec![
        case(
            "environment receiver",
            true,
            RValue::Env(REnvironment { name: "e".into() }),
            RValue::Int(1),
            RValue::Int(1),
            fail(RError::ObjectNotSubsettable("environment".into())),
        ),
        case("complex subset", true, ints(), RValue::Int(1), complex(), fail(RError::invalid_subscript_type("complex"))),
        case("complex subscript multi", false, ints(), RValue::ints(vec![1, 2]), complex(), fail(RError::MoreSuppliedReplace)),
        case("raw subscript empty", false, ints(), empty(), RValue::Raw(1), fail(RError::Replacement0)),
        case("empty list into list", false, list2(), RValue::Int(1), RValue::list(vec![]), fail(RError::SelectLess1)),
        case(
            "list position empty value",
            false,
            ints(),
            empty(),
            RValue::list(vec![RValue::Int(1)]),
            fail(RError::Replacement0),
        ),
        case(
            "list position subset",
            true,
            ints(),
            RValue::Int(1),
            RValue::list(vec![RValue::Int(1)]),
            fail(RError::invalid_subscript_type("list")),
        ),
    ]);
}

#[test]
fn test_multi_dimensional_transitions() {
    let dims = |ps: Vec<RValue>| Positions::dims(ps);
    let cases = vec![
        (true, matrix(), empty(), dims(vec![empty(), RValue::Int(1)]), Transition::Unchanged),
        (true, matrix(), RValue::Int(1), dims(vec![RValue::Int(1), RValue::Int(2)]), Transition::WriteMultiDim),
        (
            true,
            RValue::Null,
            RValue::Int(1),
            dims(vec![RValue::Int(1), RValue::Int(1)]),
            fail(RError::IncorrectSubscriptsMatrix),
        ),
        (true, RValue::Null, RValue::Null, dims(vec![RValue::Int(1), RValue::Int(1)]), Transition::Unchanged),
        (
            false,
            matrix(),
            RValue::Null,
            dims(vec![RValue::Int(1), RValue::Int(1)]),
            fail(RError::MoreSuppliedReplace),
        ),
        (
            true,
            matrix(),
            RValue::Null,
            dims(vec![RValue::Int(1), RValue::Int(1)]),
            fail(RError::NotMultipleReplacement),
        ),
        (
            false,
            matrix(),
            RValue::Int(1),
            dims(vec![RValue::Int(1), RValue::Int(1), RValue::Int(1)]),
            fail(RError::ImproperSubscript),
        ),
        (
            true,
            matrix(),
            RValue::function("f"),
            dims(vec![RValue::Int(1), RValue::Int(1)]),
            fail(RError::subassign_type_fix("closure", "integer")),
        ),
    ];
    for (i, (is_subset, vector, value, positions, expected)) in cases.into_iter().enumerate() {
        let ctx = UpdateContext::new(is_subset, &vector, &value, &positions, 0);
        assert_eq!(select(&ctx), expected, "multi-dimensional case {}", i);
    }
}

#[test]
fn test_recursion_level_matters() {
    let position = Positions::Single(RValue::ints(vec![1, 2]));
    let top = UpdateContext::new(false, &ints(), &RValue::Int(1), &position, 0);
    assert_eq!(select(&top), fail(RError::SelectMore1));
    let nested = UpdateContext::new(false, &ints(), &RValue::Int(1), &position, 1);
    assert_eq!(select(&nested), fail(RError::RecursiveIndexingFailed(2)));

    let na = Positions::Single(RValue::Int(INT_NA));
    let nested = UpdateContext::new(false, &list2(), &RValue::Int(1), &na, 1);
    assert_eq!(select(&nested), fail(RError::SelectLess1));
}
