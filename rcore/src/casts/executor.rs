//! Runs a pipeline over an actual argument value.

use tracing::{debug, trace};

use super::pipeline::{CoercionStep, Pipeline, PipelineStep};
use crate::runtime::coerce::{cast_scalar, cast_vector, Preserve};
use crate::runtime::{RError, RResult, RType, RValue, VectorData, Warnings};

/// Result of running a (sub-)pipeline: keep going, or stop because a returning branch
/// produced the final value.
enum Flow {
    Continue(RValue),
    Return(RValue),
}

/// Messages installed by `DefaultError`/`DefaultWarning` steps for the steps that follow.
#[derive(Debug, Clone, Default)]
struct Defaults {
    error: Option<RError>,
    warning: Option<RError>,
}

impl Defaults {
    fn error(&self, declared: &Option<RError>, fallback: &str) -> RError {
        declared
            .clone()
            .or_else(|| self.error.clone())
            .unwrap_or_else(|| RError::Custom(fallback.to_string()))
    }

    fn warning(&self, declared: &Option<RError>, fallback: &str) -> RError {
        declared
            .clone()
            .or_else(|| self.warning.clone())
            .unwrap_or_else(|| RError::Custom(fallback.to_string()))
    }
}

pub struct PipelineExecutor {
    pipeline: Pipeline,
}

impl PipelineExecutor {
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Validates and converts `value`. Warnings raised on the way go to `warnings`.
    pub fn execute(&self, value: RValue, warnings: &mut Warnings) -> RResult<RValue> {
        let mut defaults = Defaults::default();
        match run(&self.pipeline, value, &mut defaults, warnings)? {
            Flow::Continue(v) | Flow::Return(v) => Ok(v),
        }
    }
}

fn run(
    pipeline: &Pipeline,
    mut value: RValue,
    defaults: &mut Defaults,
    warnings: &mut Warnings,
) -> RResult<Flow> {
    for step in pipeline.steps() {
        trace!(step = ?step.kind(), value = %value, "executing step");
        value = match step {
            PipelineStep::DefaultError(e) => {
                defaults.error = Some(e.clone());
                value
            }
            PipelineStep::DefaultWarning(w) => {
                defaults.warning = Some(w.clone());
                value
            }
            PipelineStep::Filter {
                filter,
                message,
                is_warning,
            } => {
                if !filter.test(&value) {
                    if *is_warning {
                        warnings.warn(defaults.warning(message, "invalid argument"))?;
                    } else {
                        debug!(value = %value, "argument rejected by filter");
                        return Err(defaults.error(message, "invalid argument"));
                    }
                }
                value
            }
            PipelineStep::FindFirst {
                default, message, ..
            } => find_first(value, default, || defaults.error(message, "argument of length 0"))?,
            PipelineStep::Coercion(c) => coerce(c, value, warnings)?,
            PipelineStep::AttributableCoercion { .. } => match value.to_vector() {
                Some(v) if !matches!(value, RValue::Vector(_)) => RValue::Vector(v),
                _ => value,
            },
            PipelineStep::Map(mapper) => mapper.map(&value),
            PipelineStep::MapIf(map_if) => {
                let (taken, branch) = if map_if.filter.test(&value) {
                    (true, &map_if.true_branch)
                } else {
                    (false, &map_if.false_branch)
                };
                let mapped = match branch {
                    Some(b) => match run(b, value, &mut defaults.clone(), warnings)? {
                        Flow::Return(v) => return Ok(Flow::Return(v)),
                        Flow::Continue(v) => v,
                    },
                    None => value,
                };
                if taken && map_if.returns {
                    return Ok(Flow::Return(mapped));
                }
                mapped
            }
            PipelineStep::NotNA {
                replacement,
                message,
                ..
            } => {
                if value.is_na() {
                    match replacement {
                        Some(r) => r.clone(),
                        None => return Err(defaults.error(message, "NA not allowed")),
                    }
                } else {
                    value
                }
            }
            PipelineStep::BoxPrimitive => match value {
                RValue::Int(_) | RValue::Double(_) | RValue::Logical(_) | RValue::Str(_) => {
                    value.to_vector().map(RValue::Vector).unwrap_or(value)
                }
                other => other,
            },
        };
    }
    Ok(Flow::Continue(value))
}

fn find_first(
    value: RValue,
    default: &Option<RValue>,
    error: impl FnOnce() -> RError,
) -> RResult<RValue> {
    let first = match &value {
        RValue::Null | RValue::Missing => None,
        RValue::Vector(v) => v.get(0),
        _ => Some(value.clone()),
    };
    match (first, default) {
        (Some(v), _) => Ok(v),
        (None, Some(d)) => Ok(d.clone()),
        (None, None) => Err(error()),
    }
}

fn na_count(data: &VectorData) -> usize {
    (0..data.len()).filter(|i| data.is_na_at(*i)).count()
}

fn coerce(step: &CoercionStep, value: RValue, warnings: &mut Warnings) -> RResult<RValue> {
    let target = step.target;
    match &value {
        RValue::Null if target == RType::Any && !step.preserve_non_vector => {
            return Ok(RValue::list(Vec::new()));
        }
        RValue::Missing if target == RType::Any && !step.preserve_non_vector => {
            return Err(RError::Custom(
                "argument is missing, with no default".to_string(),
            ));
        }
        RValue::Null | RValue::Missing => return Ok(value),
        RValue::Function(_) if target == RType::Any => return Ok(value),
        RValue::Function(_) | RValue::Env(_) => {
            return Err(RError::Custom(format!(
                "cannot coerce type '{}' to vector of type '{}'",
                value.type_name(),
                target.name()
            )));
        }
        _ => {}
    }

    if target == RType::Any {
        return Ok(match value.to_vector() {
            Some(v) => RValue::Vector(v),
            None => value,
        });
    }

    let numeric_target = matches!(target, RType::Integer | RType::Double | RType::Complex);
    match &value {
        RValue::Vector(v) => {
            let keeps_vectors =
                !step.vector_coercion && !matches!(target, RType::Complex | RType::Raw);
            if keeps_vectors {
                return Ok(value);
            }
            let preserve = Preserve {
                names: step.preserve_names,
                dims: step.preserve_dimensions,
                attributes: step.preserve_attributes,
            };
            let result = cast_vector(v, target, preserve);
            if numeric_target && v.element_type() == RType::Character {
                let before = na_count(&v.data());
                let after = na_count(&result.data());
                if after > before {
                    warnings.warn(RError::NaIntroducedCoercion)?;
                }
            }
            Ok(RValue::Vector(result))
        }
        scalar => {
            let result = cast_scalar(scalar, target);
            if numeric_target && matches!(scalar, RValue::Str(Some(_))) && result.is_na() {
                warnings.warn(RError::NaIntroducedCoercion)?;
            }
            Ok(result)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::casts::pipeline::{Filter, Mapper, PipelineBuilder};
    use crate::config::WarnLevel;
    use crate::runtime::{RLogical, RVector, INT_NA};
    use pretty_assertions::assert_eq;

    fn run_pipeline(p: Pipeline, value: RValue) -> (RResult<RValue>, Warnings) {
        let mut warnings = Warnings::new(WarnLevel::Deferred);
        let result = PipelineExecutor::new(p).execute(value, &mut warnings);
        (result, warnings)
    }

    #[test]
    fn test_integer_argument() {
        let p = PipelineBuilder::new()
            .as_integer_vector()
            .find_first_or(0)
            .must_be_with(Filter::gte(0), RError::Custom("negative".into()))
            .build();
        assert_eq!(run_pipeline(p.clone(), RValue::doubles(vec![3.7, 1.0])).0, Ok(RValue::Int(3)));
        assert_eq!(run_pipeline(p.clone(), RValue::Null).0, Ok(RValue::Int(0)));
        assert_eq!(
            run_pipeline(p, RValue::Int(-1)).0,
            Err(RError::Custom("negative".into()))
        );
    }

    #[test]
    fn test_default_error_applies_to_later_steps() {
        let p = PipelineBuilder::new()
            .default_error(RError::Custom("bad x".into()))
            .as_string_vector()
            .find_first()
            .build();
        assert_eq!(run_pipeline(p, RValue::Null).0, Err(RError::Custom("bad x".into())));
    }

    #[test]
    fn test_warning_filter_does_not_stop() {
        let p = PipelineBuilder::new()
            .as_logical_vector()
            .should_be_with(
                Filter::size(crate::casts::pipeline::CompareOp::Le, 1),
                RError::Custom("only the first element is used".into()),
            )
            .find_first()
            .build();
        let (result, warnings) = run_pipeline(
            p,
            RValue::logicals(vec![RLogical::True, RLogical::False]),
        );
        assert_eq!(result, Ok(RValue::Logical(RLogical::True)));
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_na_introduced_by_coercion() {
        let p = PipelineBuilder::new().as_integer_vector().build();
        let (result, warnings) = run_pipeline(p, RValue::strings(&["1", "x"]));
        assert_eq!(result, Ok(RValue::ints(vec![1, INT_NA])));
        assert_eq!(warnings.entries(), &[RError::NaIntroducedCoercion]);
    }

    #[test]
    fn test_not_na_and_replacement() {
        let p = PipelineBuilder::new()
            .as_integer_vector()
            .find_first()
            .must_not_be_na(RError::Custom("NA".into()))
            .build();
        assert_eq!(run_pipeline(p, RValue::Int(INT_NA)).0, Err(RError::Custom("NA".into())));
        let p = PipelineBuilder::new().as_double_vector().find_first().replace_na(1.5).build();
        assert_eq!(run_pipeline(p, RValue::Logical(RLogical::Na)).0, Ok(RValue::Double(1.5)));
    }

    #[test]
    fn test_map_if_and_return() {
        let p = PipelineBuilder::new()
            .return_if(Filter::null_value(), None)
            .as_string_vector()
            .find_first()
            .map(Mapper::char_at(0, '?'))
            .build();
        assert_eq!(run_pipeline(p.clone(), RValue::Null).0, Ok(RValue::Null));
        assert_eq!(run_pipeline(p, RValue::str("x")).0, Ok(RValue::Int('x' as i32)));

        let p = PipelineBuilder::new()
            .map_if(Filter::missing_value(), Mapper::constant(10))
            .as_integer_vector()
            .build();
        assert_eq!(run_pipeline(p, RValue::Missing).0, Ok(RValue::Int(10)));
    }

    #[test]
    fn test_any_coercion_boxes_and_rejects() {
        let p = PipelineBuilder::new().as_vector(false).build();
        let boxed = run_pipeline(p.clone(), RValue::Int(2)).0.unwrap();
        assert!(matches!(boxed, RValue::Vector(_)));
        assert_eq!(run_pipeline(p.clone(), RValue::Null).0, Ok(RValue::list(vec![])));
        assert!(run_pipeline(p, RValue::Missing).0.is_err());
        let p = PipelineBuilder::new().as_vector(true).build();
        assert_eq!(run_pipeline(p, RValue::Missing).0, Ok(RValue::Missing));
    }

    #[test]
    fn test_functions_cannot_be_coerced() {
        let p = PipelineBuilder::new().as_double_vector().build();
        assert_eq!(
            run_pipeline(p, RValue::function("f")).0,
            Err(RError::Custom(
                "cannot coerce type 'closure' to vector of type 'double'".into()
            ))
        );
    }

    #[test]
    fn test_preserving_coercion_keeps_names() {
        let v = RVector::from_data(VectorData::Int(vec![1, 2]));
        v.set_names(Some(vec![Some("a".into()), Some("b".into())]));
        let p = PipelineBuilder::new().as_vector_preserving(RType::Double).build();
        let result = run_pipeline(p, RValue::Vector(v)).0.unwrap();
        let names = result.as_vector().and_then(|r| r.names());
        assert_eq!(names, Some(vec![Some("a".to_string()), Some("b".to_string())]));
    }

    #[test]
    fn test_box_primitive_and_attributable() {
        let p = PipelineBuilder::new().box_primitive().build();
        let result = run_pipeline(p, RValue::str("s")).0.unwrap();
        assert_eq!(result.as_vector().map(|v| v.len()), Some(1));
        let p = PipelineBuilder::new().as_attributable(false, false, false).build();
        assert_eq!(run_pipeline(p, RValue::Null).0, Ok(RValue::Null));
    }
}
