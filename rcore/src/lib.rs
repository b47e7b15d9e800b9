// RCore Library
// Type algebra, cast pipeline analysis and the vector update engine of an R dialect runtime
pub mod casts;
pub mod config;
pub mod logging;
pub mod runtime;
pub mod type_checking;
pub mod update;

// Re-export the pieces an evaluator talks to.
pub use casts::{Pipeline, PipelineBuilder, PipelineExecutor, ResultTypesAnalyser, SamplesCollector};
pub use config::{AnalysisConfig, EngineConfig, WarnLevel};
pub use runtime::{RError, RResult, RType, RValue, RVector, SharingState, Warnings};
pub use type_checking::{Coverage, TypeExpr, TypeTag};
pub use update::{Positions, UpdateArrayHelper};
