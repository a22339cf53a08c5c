//! Turns a static computation graph into a standalone C++ inference routine
//! with per-operator timing woven around every operator body.

pub mod codegen;
mod env;
pub mod error;
pub mod model;
pub mod options;
pub mod profiling;

pub use codegen::{generate_profiled_module, ProfiledModel};
pub use error::{CodegenError, CodegenResult};
pub use model::{DType, GraphModel, InMemoryModel, OperatorCodegen};
pub use options::{AggregationPolicy, GenerateOptions};
pub use profiling::{CallHistory, ProfilerResult};
