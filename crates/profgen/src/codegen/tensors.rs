use tracing::trace;

use crate::error::{CodegenError, CodegenResult};
use crate::model::{element_count, DType, InitializedTensor, TensorData, TensorInfo};

use super::ir::Item;
use super::utils::{c_type, format_f32, format_f64, format_i32, format_i64, tensor_var};

/// Buffer declarations plus the headers their literals depend on.
#[derive(Debug, Default)]
pub(super) struct TensorDecls {
    pub(super) items: Vec<Item>,
    pub(super) needs_cmath: bool,
    pub(super) needs_cstdint: bool,
}

impl TensorDecls {
    fn note_dtype(&mut self, dtype: DType) {
        if matches!(dtype, DType::Int32 | DType::Int64) {
            self.needs_cstdint = true;
        }
    }
}

pub(super) fn emit_tensor_declarations(
    constants: &[InitializedTensor],
    intermediates: &[TensorInfo],
) -> CodegenResult<TensorDecls> {
    let mut decls = TensorDecls::default();
    for tensor in constants {
        emit_constant(&mut decls, tensor)?;
    }
    for info in intermediates {
        emit_intermediate(&mut decls, info)?;
    }
    Ok(decls)
}

fn emit_constant(decls: &mut TensorDecls, tensor: &InitializedTensor) -> CodegenResult<()> {
    let dtype = tensor.dtype();
    let Some(ctype) = c_type(dtype) else {
        trace!(tensor = %tensor.name, %dtype, "skipping constant of unsupported type");
        return Ok(());
    };
    let length = sized(&tensor.name, &tensor.shape)?;
    if tensor.data.len() != length {
        return Err(CodegenError::ConstantSizeMismatch {
            name: tensor.name.clone(),
            expected: length,
            actual: tensor.data.len(),
        });
    }
    if length == 0 {
        trace!(tensor = %tensor.name, "skipping empty constant");
        return Ok(());
    }
    let (values, non_finite) = literal_values(&tensor.data);
    decls.needs_cmath |= non_finite;
    decls.note_dtype(dtype);
    decls.items.push(Item::Global {
        ty: ctype.to_string(),
        name: tensor_var(&tensor.name),
        length: Some(length),
        init: Some(format!("{{{}}}", values.join(", "))),
    });
    Ok(())
}

fn emit_intermediate(decls: &mut TensorDecls, info: &TensorInfo) -> CodegenResult<()> {
    let Some(ctype) = c_type(info.dtype) else {
        trace!(tensor = %info.name, dtype = %info.dtype, "skipping intermediate of unsupported type");
        return Ok(());
    };
    let length = sized(&info.name, &info.shape)?;
    if length == 0 {
        trace!(tensor = %info.name, "skipping empty intermediate");
        return Ok(());
    }
    decls.note_dtype(info.dtype);
    decls.items.push(Item::Global {
        ty: ctype.to_string(),
        name: tensor_var(&info.name),
        length: Some(length),
        init: Some("{}".to_string()),
    });
    Ok(())
}

pub(super) fn sized(name: &str, shape: &[usize]) -> CodegenResult<usize> {
    element_count(shape).ok_or_else(|| CodegenError::ShapeOverflow(name.to_string()))
}

/// Literal text for every element, row-major, and whether any element needed
/// a `<cmath>` macro.
fn literal_values(data: &TensorData) -> (Vec<String>, bool) {
    match data {
        TensorData::F32(values) => (
            values.iter().map(|v| format_f32(*v)).collect(),
            values.iter().any(|v| !v.is_finite()),
        ),
        TensorData::F64(values) => (
            values.iter().map(|v| format_f64(*v)).collect(),
            values.iter().any(|v| !v.is_finite()),
        ),
        TensorData::I32(values) => (values.iter().map(|v| format_i32(*v)).collect(), false),
        TensorData::I64(values) => (values.iter().map(|v| format_i64(*v)).collect(), false),
        TensorData::Raw { .. } => (Vec::new(), false),
    }
}
