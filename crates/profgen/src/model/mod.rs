//! The graph-model collaborator: everything the generator reads from an
//! already-built computation graph.

mod memory;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use memory::{
    ConstantDescription, GraphDescription, InMemoryModel, OperatorDescription, TemplateOperator,
};

/// Element type of a tensor as reported by the graph model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    Float,
    Double,
    Int32,
    Int64,
    Int8,
    Uint8,
    Bool,
    Float16,
}

impl DType {
    pub fn name(self) -> &'static str {
        match self {
            DType::Float => "float",
            DType::Double => "double",
            DType::Int32 => "int32",
            DType::Int64 => "int64",
            DType::Int8 => "int8",
            DType::Uint8 => "uint8",
            DType::Bool => "bool",
            DType::Float16 => "float16",
        }
    }

    pub fn size_in_bytes(self) -> usize {
        match self {
            DType::Double | DType::Int64 => 8,
            DType::Float | DType::Int32 => 4,
            DType::Float16 => 2,
            DType::Int8 | DType::Uint8 | DType::Bool => 1,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Flattened, row-major contents of a constant tensor.
#[derive(Debug, Clone, PartialEq)]
pub enum TensorData {
    F32(Vec<f32>),
    F64(Vec<f64>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    /// Element types the generator does not declare; kept as raw bytes.
    Raw { dtype: DType, bytes: Vec<u8> },
}

impl TensorData {
    pub fn dtype(&self) -> DType {
        match self {
            TensorData::F32(_) => DType::Float,
            TensorData::F64(_) => DType::Double,
            TensorData::I32(_) => DType::Int32,
            TensorData::I64(_) => DType::Int64,
            TensorData::Raw { dtype, .. } => *dtype,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            TensorData::F32(values) => values.len(),
            TensorData::F64(values) => values.len(),
            TensorData::I32(values) => values.len(),
            TensorData::I64(values) => values.len(),
            TensorData::Raw { dtype, bytes } => bytes.len() / dtype.size_in_bytes(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A constant (weight) tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct InitializedTensor {
    pub name: String,
    pub shape: Vec<usize>,
    pub data: TensorData,
}

impl InitializedTensor {
    pub fn new(name: impl Into<String>, shape: Vec<usize>, data: TensorData) -> Self {
        Self {
            name: name.into(),
            shape,
            data,
        }
    }

    pub fn dtype(&self) -> DType {
        self.data.dtype()
    }
}

/// Name, element type and shape of an input or intermediate tensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorInfo {
    pub name: String,
    pub dtype: DType,
    pub shape: Vec<usize>,
}

impl TensorInfo {
    pub fn new(name: impl Into<String>, dtype: DType, shape: Vec<usize>) -> Self {
        Self {
            name: name.into(),
            dtype,
            shape,
        }
    }
}

/// Product of the dimensions; a rank-0 shape holds one element.
pub fn element_count(shape: &[usize]) -> Option<usize> {
    shape
        .iter()
        .try_fold(1usize, |count, dim| count.checked_mul(*dim))
}

/// External BLAS routines an operator may call into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BlasRoutine {
    Gemm,
    Gemv,
    Axpy,
}

impl BlasRoutine {
    /// Maps a routine identifier reported by the model. Unknown identifiers
    /// yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Gemm" => Some(BlasRoutine::Gemm),
            "Gemv" => Some(BlasRoutine::Gemv),
            "Axpy" => Some(BlasRoutine::Axpy),
            _ => None,
        }
    }
}

/// One operator of the graph. Produces its own un-instrumented body.
pub trait OperatorCodegen {
    /// Stable operator name; used as the timing key.
    fn name(&self) -> &str;

    /// Body text for this operator. `op_id` is the operator's position in
    /// the graph rendered as decimal text.
    fn generate(&self, op_id: &str) -> String;
}

/// Read-only view over a fully loaded computation graph.
pub trait GraphModel {
    fn name(&self) -> &str;
    fn source_file(&self) -> &str;
    fn parse_time(&self) -> &str;
    fn operators(&self) -> Vec<&dyn OperatorCodegen>;
    fn initialized_tensors(&self) -> &[InitializedTensor];
    fn intermediate_tensors(&self) -> &[TensorInfo];
    fn input_tensors(&self) -> &[TensorInfo];
    fn output_tensor_names(&self) -> &[String];
    /// Identifiers of the external routines the operators call.
    fn blas_routines(&self) -> &[String];

    fn intermediate_tensor(&self, name: &str) -> Option<&TensorInfo> {
        self.intermediate_tensors()
            .iter()
            .find(|info| info.name == name)
    }
}
