// Static result types of cast pipelines checked against their execution
use pretty_assertions::assert_eq;
use rcore::casts::{Filter, Pipeline, PipelineBuilder, PipelineExecutor, ResultTypesAnalyser, SamplesCollector};
use rcore::runtime::{RLogical, REnvironment, Warnings};
use rcore::type_checking::{AtomType, MarkLookup, SiteId, TypeExpr, TypeTag, WildcardRegistry};
use rcore::{AnalysisConfig, RValue, WarnLevel};

fn analyse(pipeline: &Pipeline) -> TypeExpr {
    ResultTypesAnalyser::new(AnalysisConfig::default()).analyse(pipeline)
}

fn wildcard_sites(expr: &TypeExpr) -> Vec<SiteId> {
    expr.conjunctions()
        .iter()
        .flat_map(|c| c.atoms().iter())
        .filter_map(|a| match &a.ty {
            AtomType::Wild(w) => WildcardRegistry::site(w.id),
            AtomType::Tag(_) => None,
        })
        .collect()
}

fn extra_values() -> Vec<RValue> {
    vec![
        RValue::Int(3),
        RValue::Int(-4),
        RValue::Double(2.5),
        RValue::str("7"),
        RValue::str("seven"),
        RValue::Logical(RLogical::True),
        RValue::ints(vec![5, 6]),
        RValue::doubles(vec![]),
        RValue::strings(&["x", "y"]),
        RValue::list(vec![RValue::Int(1)]),
        RValue::Null,
        RValue::Missing,
    ]
}

/// Every value a pipeline accepts lands in its analysed type.
fn assert_execution_within_analysis(pipeline: Pipeline) {
    let analysed = analyse(&pipeline);
    let mut inputs = SamplesCollector::collect(&pipeline);
    inputs.extend(extra_values());
    let executor = PipelineExecutor::new(pipeline);
    let mut accepted = 0;
    for input in inputs {
        let mut warnings = Warnings::new(WarnLevel::Deferred);
        if let Ok(result) = executor.execute(input.clone(), &mut warnings) {
            accepted += 1;
            assert!(
                analysed.is_instance(&result),
                "{} produced {} outside of {}",
                input,
                result,
                analysed
            );
        }
    }
    assert!(accepted > 0, "no input was accepted");
}

#[test]
fn test_integer_vector_coercion_type() {
    let t = analyse(&PipelineBuilder::new().as_integer_vector().build());
    assert_eq!(
        t,
        TypeExpr::union([TypeTag::Null, TypeTag::Missing, TypeTag::Integer, TypeTag::IntVector])
    );
    assert!(!t.is_instance(&RValue::Double(1.0)));
}

#[test]
fn test_as_vector_types() {
    let plain = analyse(&PipelineBuilder::new().as_vector(false).build());
    assert!(plain.is_instance(&RValue::function("f")));
    assert!(plain.is_instance(&RValue::ints(vec![1, 2])));
    assert!(plain.is_instance(&RValue::list(vec![])));
    assert!(!plain.is_instance(&RValue::Int(1)));
    assert!(!plain.is_instance(&RValue::Null));
    assert!(!plain.is_instance(&RValue::Missing));

    let preserving = analyse(&PipelineBuilder::new().as_vector(true).build());
    assert!(preserving.is_instance(&RValue::Null));
    assert!(preserving.is_instance(&RValue::Missing));
    assert!(preserving.is_instance(&RValue::function("f")));
}

#[test]
fn test_as_attributable_type() {
    let t = analyse(&PipelineBuilder::new().as_attributable(true, true, true).build());
    assert!(t.is_instance(&RValue::Env(REnvironment { name: "e".into() })));
    assert!(t.is_instance(&RValue::function("f")));
    assert!(t.is_instance(&RValue::strings(&["a"])));
    assert!(t.is_instance(&RValue::Null));
    assert!(!t.is_instance(&RValue::str("a")));
}

#[test]
fn test_first_element_types() {
    let first = analyse(&PipelineBuilder::new().as_string_vector().find_first().build());
    assert_eq!(first, TypeExpr::atom(TypeTag::Character));
    let or_null = analyse(&PipelineBuilder::new().as_string_vector().find_first_or_null().build());
    assert_eq!(or_null, TypeExpr::union([TypeTag::Null, TypeTag::Character]));
    assert!(or_null.samples().positive().contains(&RValue::Null));
}

#[test]
fn test_marked_filter_produces_its_wildcard() {
    let p = PipelineBuilder::new()
        .as_integer_vector()
        .find_first()
        .must_be(Filter::gt(0).mark("positive-count"))
        .build();
    let t = analyse(&p);
    let site = MarkLookup::lookup("positive-count");
    assert!(site.is_some());
    assert!(wildcard_sites(&t).iter().any(|s| Some(*s) == site));
    assert!(t.is_instance(&RValue::Int(3)));
    assert!(!t.is_instance(&RValue::Int(0)));
    assert!(!t.is_instance(&RValue::Int(-1)));
    assert!(!t.is_instance(&RValue::Double(3.0)));
}

#[test]
fn test_wildcard_identity_follows_the_site() {
    let build = |filter: Filter| {
        PipelineBuilder::new()
            .as_integer_vector()
            .find_first()
            .must_be(filter)
            .build()
    };
    let a = analyse(&build(Filter::gt(0).mark("shared-site")));
    let b = analyse(&build(Filter::gt(0).mark("shared-site")));
    assert_eq!(a, b);

    let c = analyse(&build(Filter::gt(0)));
    let d = analyse(&build(Filter::gt(0)));
    assert!(c != d);
}

#[test]
fn test_integer_argument_stays_within_analysis() {
    assert_execution_within_analysis(PipelineBuilder::new().as_integer_vector().find_first_or(0).build());
}

#[test]
fn test_string_argument_stays_within_analysis() {
    assert_execution_within_analysis(PipelineBuilder::new().as_string_vector().find_first().build());
}

#[test]
fn test_positive_argument_stays_within_analysis() {
    assert_execution_within_analysis(
        PipelineBuilder::new()
            .as_integer_vector()
            .find_first_or(0)
            .must_be(Filter::gt(0))
            .build(),
    );
}

#[test]
fn test_attributable_argument_stays_within_analysis() {
    assert_execution_within_analysis(PipelineBuilder::new().as_attributable(false, false, false).build());
}
