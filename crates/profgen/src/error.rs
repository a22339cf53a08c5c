use thiserror::Error;

use crate::model::DType;

/// Errors raised while assembling a profiled translation unit.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodegenError {
    #[error("exactly one output tensor is supported, graph declares {0}")]
    UnsupportedOutputCount(usize),
    #[error("output tensor '{0}' not found among intermediate tensors")]
    OutputNotFound(String),
    #[error("output tensor '{name}' has unsupported element type {dtype}")]
    UnsupportedOutputType { name: String, dtype: DType },
    #[error("output tensor '{0}' has no elements")]
    EmptyOutput(String),
    #[error("constant tensor '{name}' holds {actual} values but its shape requires {expected}")]
    ConstantSizeMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
    #[error("tensor '{0}' shape overflows the addressable element count")]
    ShapeOverflow(String),
    #[error("invalid graph description: {0}")]
    Description(String),
}

impl From<serde_json::Error> for CodegenError {
    fn from(err: serde_json::Error) -> Self {
        CodegenError::Description(err.to_string())
    }
}

pub type CodegenResult<T> = Result<T, CodegenError>;
