// Coercions between R base types
// Element-wise conversions behind as.integer(), as.double(), as.character() and friends

use super::values::{double_na, RComplex, RLogical, RType, RValue, INT_NA};
use super::vector::{RVector, VectorData};

// ============================================================================
// ELEMENT CONVERSIONS
// ============================================================================

fn int_from_double(d: f64) -> i32 {
    if d.is_nan() || d >= 2147483648.0 || d <= -2147483649.0 {
        INT_NA
    } else {
        d.trunc() as i32
    }
}

fn int_from_logical(l: RLogical) -> i32 {
    match l {
        RLogical::True => 1,
        RLogical::False => 0,
        RLogical::Na => INT_NA,
    }
}

fn double_from_int(i: i32) -> f64 {
    if i == INT_NA {
        double_na()
    } else {
        i as f64
    }
}

fn double_from_logical(l: RLogical) -> f64 {
    double_from_int(int_from_logical(l))
}

fn double_from_str(s: &Option<String>) -> f64 {
    let Some(s) = s else { return double_na() };
    match s.trim() {
        "NA" => double_na(),
        "Inf" | "inf" => f64::INFINITY,
        "-Inf" | "-inf" => f64::NEG_INFINITY,
        "NaN" => f64::NAN,
        t => t.parse::<f64>().unwrap_or_else(|_| double_na()),
    }
}

fn logical_from_int(i: i32) -> RLogical {
    if i == INT_NA {
        RLogical::Na
    } else {
        RLogical::from_bool(i != 0)
    }
}

fn logical_from_double(d: f64) -> RLogical {
    if d.is_nan() {
        RLogical::Na
    } else {
        RLogical::from_bool(d != 0.0)
    }
}

fn logical_from_str(s: &Option<String>) -> RLogical {
    match s.as_deref() {
        Some("TRUE") | Some("true") | Some("T") | Some("True") => RLogical::True,
        Some("FALSE") | Some("false") | Some("F") | Some("False") => RLogical::False,
        _ => RLogical::Na,
    }
}

/// Formats a double the way `as.character` does: 15 significant digits, integral
/// values without a decimal point.
pub fn format_double(d: f64) -> Option<String> {
    if super::values::is_double_na(d) {
        return None;
    }
    Some(if d.is_nan() {
        "NaN".to_string()
    } else if d.is_infinite() {
        if d > 0.0 { "Inf" } else { "-Inf" }.to_string()
    } else if d == d.trunc() && d.abs() < 1e15 {
        format!("{}", d as i64)
    } else if d.abs() >= 1e-4 && d.abs() < 1e15 {
        let exponent = d.abs().log10().floor() as i32;
        let decimals = (14 - exponent).max(0) as usize;
        let s = format!("{:.*}", decimals, d);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        format!("{:e}", d)
    })
}

fn str_from_int(i: i32) -> Option<String> {
    (i != INT_NA).then(|| i.to_string())
}

fn str_from_logical(l: RLogical) -> Option<String> {
    l.to_bool()
        .map(|b| if b { "TRUE" } else { "FALSE" }.to_string())
}

fn str_from_complex(c: &RComplex) -> Option<String> {
    if c.is_na() {
        return None;
    }
    let re = format_double(c.re)?;
    let im = format_double(c.im.abs())?;
    let sign = if c.im < 0.0 { "-" } else { "+" };
    Some(format!("{}{}{}i", re, sign, im))
}

fn complex_from_double(d: f64) -> RComplex {
    if d.is_nan() {
        RComplex::na()
    } else {
        RComplex::new(d, 0.0)
    }
}

fn raw_from_int(i: i32) -> u8 {
    if (0..=255).contains(&i) {
        i as u8
    } else {
        0
    }
}

fn list_element_to_scalar(value: &RValue, target: RType) -> RValue {
    match value {
        RValue::Vector(v) if v.len() == 1 && !v.is_list() => match v.get(0) {
            Some(scalar) => cast_scalar(&scalar, target),
            None => cast_scalar(&RValue::Null, target),
        },
        v if v.is_scalar() => cast_scalar(v, target),
        _ => cast_scalar(&RValue::Null, target),
    }
}

/// Converts one scalar (or NULL, which yields the target NA) to `target`.
pub fn cast_scalar(value: &RValue, target: RType) -> RValue {
    match target {
        RType::Integer | RType::Factor => RValue::Int(match value {
            RValue::Int(i) => *i,
            RValue::Double(d) => int_from_double(*d),
            RValue::Logical(l) => int_from_logical(*l),
            RValue::Bool(b) => *b as i32,
            RValue::Str(s) => int_from_double(double_from_str(s)),
            RValue::Complex(c) => int_from_double(c.re),
            RValue::Raw(r) => *r as i32,
            _ => INT_NA,
        }),
        RType::Double => RValue::Double(match value {
            RValue::Int(i) => double_from_int(*i),
            RValue::Double(d) => *d,
            RValue::Logical(l) => double_from_logical(*l),
            RValue::Bool(b) => *b as i32 as f64,
            RValue::Str(s) => double_from_str(s),
            RValue::Complex(c) => c.re,
            RValue::Raw(r) => *r as f64,
            _ => double_na(),
        }),
        RType::Logical => RValue::Logical(match value {
            RValue::Int(i) => logical_from_int(*i),
            RValue::Double(d) => logical_from_double(*d),
            RValue::Logical(l) => *l,
            RValue::Bool(b) => RLogical::from_bool(*b),
            RValue::Str(s) => logical_from_str(s),
            RValue::Complex(c) => logical_from_double(c.re),
            RValue::Raw(r) => RLogical::from_bool(*r != 0),
            _ => RLogical::Na,
        }),
        RType::Character => RValue::Str(match value {
            RValue::Int(i) => str_from_int(*i),
            RValue::Double(d) => format_double(*d),
            RValue::Logical(l) => str_from_logical(*l),
            RValue::Bool(b) => str_from_logical(RLogical::from_bool(*b)),
            RValue::Str(s) => s.clone(),
            RValue::Complex(c) => str_from_complex(c),
            RValue::Raw(r) => Some(format!("{:02x}", r)),
            _ => None,
        }),
        RType::Complex => RValue::Complex(match value {
            RValue::Int(i) => complex_from_double(double_from_int(*i)),
            RValue::Double(d) => complex_from_double(*d),
            RValue::Logical(l) => complex_from_double(double_from_logical(*l)),
            RValue::Bool(b) => RComplex::new(*b as i32 as f64, 0.0),
            RValue::Str(s) => complex_from_double(double_from_str(s)),
            RValue::Complex(c) => *c,
            RValue::Raw(r) => RComplex::new(*r as f64, 0.0),
            _ => RComplex::na(),
        }),
        RType::Raw => RValue::Raw(match value {
            RValue::Int(i) => raw_from_int(*i),
            RValue::Double(d) => raw_from_int(int_from_double(*d)),
            RValue::Logical(l) => raw_from_int(int_from_logical(*l)),
            RValue::Bool(b) => *b as u8,
            RValue::Str(s) => raw_from_int(int_from_double(double_from_str(s))),
            RValue::Complex(c) => raw_from_int(int_from_double(c.re)),
            RValue::Raw(r) => *r,
            _ => 0,
        }),
        _ => value.clone(),
    }
}

/// Converts storage to the element type `target`. Lists become atomic element-wise;
/// atomic data becomes a list of scalars.
pub fn cast_data(data: &VectorData, target: RType) -> VectorData {
    if data.element_type() == target
        || (target == RType::Factor && data.element_type() == RType::Integer)
    {
        return data.clone();
    }
    let items: Vec<RValue> = (0..data.len()).filter_map(|i| data.get(i)).collect();
    let convert = |v: &RValue| match data {
        VectorData::List(_) => list_element_to_scalar(v, target),
        _ => cast_scalar(v, target),
    };
    match target {
        RType::Integer | RType::Factor => VectorData::Int(
            items
                .iter()
                .map(|v| match convert(v) {
                    RValue::Int(i) => i,
                    _ => INT_NA,
                })
                .collect(),
        ),
        RType::Double => VectorData::Double(
            items
                .iter()
                .map(|v| match convert(v) {
                    RValue::Double(d) => d,
                    _ => double_na(),
                })
                .collect(),
        ),
        RType::Logical => VectorData::Logical(
            items
                .iter()
                .map(|v| match convert(v) {
                    RValue::Logical(l) => l,
                    _ => RLogical::Na,
                })
                .collect(),
        ),
        RType::Character => VectorData::Str(
            items
                .iter()
                .map(|v| match convert(v) {
                    RValue::Str(s) => s,
                    _ => None,
                })
                .collect(),
        ),
        RType::Complex => VectorData::Complex(
            items
                .iter()
                .map(|v| match convert(v) {
                    RValue::Complex(c) => c,
                    _ => RComplex::na(),
                })
                .collect(),
        ),
        RType::Raw => VectorData::Raw(
            items
                .iter()
                .map(|v| match convert(v) {
                    RValue::Raw(r) => r,
                    _ => 0,
                })
                .collect(),
        ),
        _ => VectorData::List(items),
    }
}

/// Which attributes survive a vector coercion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Preserve {
    pub names: bool,
    pub dims: bool,
    pub attributes: bool,
}

impl Preserve {
    pub fn all() -> Self {
        Self {
            names: true,
            dims: true,
            attributes: true,
        }
    }
}

/// Fresh temporary vector holding `vector`'s elements converted to `target`.
pub fn cast_vector(vector: &RVector, target: RType, preserve: Preserve) -> RVector {
    let body = vector.body();
    let result = RVector::from_data(cast_data(&body.data, target));
    {
        let mut out = result.body_mut();
        if preserve.names {
            out.names = body.names.clone();
        }
        if preserve.dims {
            out.dims = body.dims.clone();
        }
        if preserve.attributes {
            out.attributes = body.attributes.clone();
        }
    }
    result
}

/// Coerces a scalar or vector value to `target`, keeping scalars scalar.
/// `Null` and `Missing` are returned unchanged.
pub fn coerce_value(value: &RValue, target: RType, preserve: Preserve) -> RValue {
    match value {
        RValue::Vector(v) => RValue::Vector(cast_vector(v, target, preserve)),
        v if v.is_scalar() || matches!(v, RValue::Bool(_)) => {
            if target == RType::List {
                RValue::list(vec![v.clone()])
            } else {
                cast_scalar(v, target)
            }
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_double_to_int_truncates_and_maps_nan_to_na() {
        assert_eq!(cast_scalar(&RValue::Double(2.9), RType::Integer), RValue::Int(2));
        assert_eq!(
            cast_scalar(&RValue::Double(f64::NAN), RType::Integer),
            RValue::Int(INT_NA)
        );
        assert_eq!(
            cast_scalar(&RValue::Double(3e10), RType::Integer),
            RValue::Int(INT_NA)
        );
    }

    #[test]
    fn test_as_character_formatting() {
        assert_eq!(format_double(1.0).as_deref(), Some("1"));
        assert_eq!(format_double(0.1 + 0.2).as_deref(), Some("0.3"));
        assert_eq!(format_double(-2.5).as_deref(), Some("-2.5"));
        assert_eq!(format_double(double_na()), None);
        assert_eq!(
            cast_scalar(&RValue::Logical(RLogical::True), RType::Character),
            RValue::str("TRUE")
        );
        assert_eq!(cast_scalar(&RValue::Raw(10), RType::Character), RValue::str("0a"));
    }

    #[test]
    fn test_int_na_widens_to_double_na() {
        let data = cast_data(&VectorData::Int(vec![1, INT_NA]), RType::Double);
        assert!(data.is_na_at(1));
        assert_eq!(data.get(0), Some(RValue::Double(1.0)));
    }

    #[test]
    fn test_atomic_to_list_and_back() {
        let list = cast_data(&VectorData::Int(vec![1, 2]), RType::List);
        assert_eq!(list.element_type(), RType::List);
        assert_eq!(list.get(1), Some(RValue::Int(2)));
        let back = cast_data(&list, RType::Double);
        assert_eq!(back.get(1), Some(RValue::Double(2.0)));
    }

    #[test]
    fn test_cast_vector_preserves_requested_attributes() {
        let v = RVector::from_data(VectorData::Int(vec![1, 2, 3, 4]));
        v.set_dims(Some(vec![2, 2])).unwrap();
        v.set_names(Some(vec![Some("a".into()), None, None, None]));
        let kept = cast_vector(&v, RType::Double, Preserve { dims: true, ..Preserve::default() });
        assert_eq!(kept.dims(), Some(vec![2, 2]));
        assert_eq!(kept.names(), None);
    }
}
