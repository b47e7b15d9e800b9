// Cast pipelines for builtin arguments
// Declaration, static result types, sample generation and execution

pub mod cast_node_sampler;
pub mod executor;
pub mod filter_sampler;
pub mod mapper_sampler;
pub mod pipeline;
pub mod result_types;
pub mod samples_collector;
pub mod specializations;
pub mod visitor;

pub use cast_node_sampler::{create_sampler, CastNodeSampler};
pub use executor::PipelineExecutor;
pub use filter_sampler::{ArgumentFilterSampler, FilterSamplerFactory};
pub use mapper_sampler::{ArgumentMapperSampler, MapperSamplerFactory};
pub use pipeline::{
    CoercionStep, CompareOp, CompareSubject, DoubleOp, Filter, FilterKind, MapIfStep, Mapper,
    MapperKind, MatrixOp, Pipeline, PipelineBuilder, PipelineStep, StepKind,
};
pub use result_types::{filter_type, mapper_type, ResultTypesAnalyser};
pub use samples_collector::{SampleValue, SamplesCollector};
pub use visitor::ExecutionPathVisitor;
