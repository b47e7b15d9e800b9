// Type algebra for the RCore runtime
// Sets of runtime types in normal form, coverage between them, casts and sample values

pub mod coverage;
pub mod samples;
pub mod type_expr;
pub mod types;
pub mod wildcard;

pub use coverage::{implicit_casts, implicitly_convertible, is_convertible, Cast, Casts, Coverage};
pub use samples::{na_value, na_values, sample_values_for_type, Samples};
pub use type_expr::{element_type, AtomType, Conjunction, Predicate, TypeAtom, TypeExpr};
pub use types::{TypeTag, ALL_TAGS};
pub use wildcard::{MarkLookup, SiteId, WildcardId, WildcardRegistry};
