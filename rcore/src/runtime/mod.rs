// Runtime value system for RCore
// Values, typed vectors with copy-on-write sharing, coercions and diagnostics

pub mod coerce;
pub mod error;
pub mod values;
pub mod vector;

pub use error::{internal_error, RError, RResult, Warnings};
pub use values::{
    double_na, is_double_na, RComplex, REnvironment, RFunction, RLogical, RType, RValue, INT_NA,
};
pub use vector::{RElement, RVector, SharingState, VectorData};
