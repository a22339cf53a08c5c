use half::f16;
use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::error::{CodegenError, CodegenResult};

use super::{DType, GraphModel, InitializedTensor, OperatorCodegen, TensorData, TensorInfo};

const ID_PLACEHOLDER: &str = "{id}";

/// Operator whose body is a fixed template; every `{id}` is replaced with the
/// operator's numbering token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateOperator {
    name: String,
    body: String,
}

impl TemplateOperator {
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
        }
    }
}

impl OperatorCodegen for TemplateOperator {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate(&self, op_id: &str) -> String {
        self.body.replace(ID_PLACEHOLDER, op_id)
    }
}

/// A graph model held entirely in memory.
///
/// Tensor names are unique per table; adding a tensor under an existing name
/// replaces the previous entry in place.
pub struct InMemoryModel {
    name: String,
    source_file: String,
    parse_time: String,
    operators: Vec<Box<dyn OperatorCodegen>>,
    initialized: Vec<InitializedTensor>,
    intermediates: Vec<TensorInfo>,
    inputs: Vec<TensorInfo>,
    outputs: Vec<String>,
    blas_routines: Vec<String>,
}

impl InMemoryModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_file: String::new(),
            parse_time: String::new(),
            operators: Vec::new(),
            initialized: Vec::new(),
            intermediates: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            blas_routines: Vec::new(),
        }
    }

    pub fn with_source(
        mut self,
        source_file: impl Into<String>,
        parse_time: impl Into<String>,
    ) -> Self {
        self.source_file = source_file.into();
        self.parse_time = parse_time.into();
        self
    }

    pub fn add_operator(&mut self, op: impl OperatorCodegen + 'static) -> &mut Self {
        self.operators.push(Box::new(op));
        self
    }

    pub fn add_initialized(&mut self, tensor: InitializedTensor) -> &mut Self {
        upsert(&mut self.initialized, tensor, |t| &t.name);
        self
    }

    pub fn add_intermediate(&mut self, info: TensorInfo) -> &mut Self {
        upsert(&mut self.intermediates, info, |t| &t.name);
        self
    }

    pub fn add_input(&mut self, info: TensorInfo) -> &mut Self {
        upsert(&mut self.inputs, info, |t| &t.name);
        self
    }

    pub fn add_output(&mut self, name: impl Into<String>) -> &mut Self {
        self.outputs.push(name.into());
        self
    }

    pub fn require_blas(&mut self, routine: impl Into<String>) -> &mut Self {
        let routine = routine.into();
        if !self.blas_routines.contains(&routine) {
            self.blas_routines.push(routine);
        }
        self
    }

    pub fn from_description(desc: GraphDescription) -> CodegenResult<Self> {
        let mut model =
            InMemoryModel::new(desc.name).with_source(desc.source_file, desc.parse_time);
        for op in desc.operators {
            model.add_operator(TemplateOperator::new(op.name, op.body));
        }
        for constant in desc.initialized {
            let data = constant_data(&constant)?;
            model.add_initialized(InitializedTensor::new(constant.name, constant.shape, data));
        }
        for info in desc.intermediates {
            model.add_intermediate(info);
        }
        for info in desc.inputs {
            model.add_input(info);
        }
        for name in desc.outputs {
            model.add_output(name);
        }
        for routine in desc.blas_routines {
            model.require_blas(routine);
        }
        Ok(model)
    }

    pub fn from_json(json: &str) -> CodegenResult<Self> {
        let desc: GraphDescription = serde_json::from_str(json)?;
        Self::from_description(desc)
    }
}

fn upsert<T>(items: &mut Vec<T>, item: T, key: impl Fn(&T) -> &String) {
    match items.iter().position(|existing| key(existing) == key(&item)) {
        Some(idx) => items[idx] = item,
        None => items.push(item),
    }
}

impl GraphModel for InMemoryModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn source_file(&self) -> &str {
        &self.source_file
    }

    fn parse_time(&self) -> &str {
        &self.parse_time
    }

    fn operators(&self) -> Vec<&dyn OperatorCodegen> {
        self.operators.iter().map(|op| op.as_ref()).collect()
    }

    fn initialized_tensors(&self) -> &[InitializedTensor] {
        &self.initialized
    }

    fn intermediate_tensors(&self) -> &[TensorInfo] {
        &self.intermediates
    }

    fn input_tensors(&self) -> &[TensorInfo] {
        &self.inputs
    }

    fn output_tensor_names(&self) -> &[String] {
        &self.outputs
    }

    fn blas_routines(&self) -> &[String] {
        &self.blas_routines
    }
}

/// Serialized form of a graph, as accepted by [`InMemoryModel::from_json`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDescription {
    pub name: String,
    #[serde(default)]
    pub source_file: String,
    #[serde(default)]
    pub parse_time: String,
    #[serde(default)]
    pub operators: Vec<OperatorDescription>,
    #[serde(default)]
    pub initialized: Vec<ConstantDescription>,
    #[serde(default)]
    pub intermediates: Vec<TensorInfo>,
    #[serde(default)]
    pub inputs: Vec<TensorInfo>,
    #[serde(default)]
    pub outputs: Vec<String>,
    #[serde(default)]
    pub blas_routines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorDescription {
    pub name: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantDescription {
    pub name: String,
    pub dtype: DType,
    pub shape: Vec<usize>,
    /// Kept as JSON numbers so integer constants never pass through `f64`.
    pub data: Vec<Number>,
}

/// Every integer up to this magnitude is exact in an `f64`.
const F64_EXACT_INT: f64 = 9_007_199_254_740_992.0;

fn constant_data(desc: &ConstantDescription) -> CodegenResult<TensorData> {
    let data = match desc.dtype {
        DType::Float => TensorData::F32(floats(desc)?.into_iter().map(|v| v as f32).collect()),
        DType::Double => TensorData::F64(floats(desc)?),
        DType::Int32 => TensorData::I32(integers(desc)?),
        DType::Int64 => TensorData::I64(integers(desc)?),
        DType::Int8 => raw(desc, |n| {
            integer::<i8>(desc, n).map(|v| v.to_le_bytes().to_vec())
        })?,
        DType::Uint8 => raw(desc, |n| integer::<u8>(desc, n).map(|v| vec![v]))?,
        DType::Bool => raw(desc, |n| float(desc, n).map(|v| vec![u8::from(v != 0.0)]))?,
        DType::Float16 => raw(desc, |n| {
            float(desc, n).map(|v| f16::from_f64(v).to_le_bytes().to_vec())
        })?,
    };
    Ok(data)
}

fn floats(desc: &ConstantDescription) -> CodegenResult<Vec<f64>> {
    desc.data.iter().map(|n| float(desc, n)).collect()
}

fn integers<T: TryFrom<i128>>(desc: &ConstantDescription) -> CodegenResult<Vec<T>> {
    desc.data.iter().map(|n| integer(desc, n)).collect()
}

fn raw(
    desc: &ConstantDescription,
    encode: impl Fn(&Number) -> CodegenResult<Vec<u8>>,
) -> CodegenResult<TensorData> {
    let mut bytes = Vec::with_capacity(desc.data.len() * desc.dtype.size_in_bytes());
    for value in &desc.data {
        bytes.extend(encode(value)?);
    }
    Ok(TensorData::Raw {
        dtype: desc.dtype,
        bytes,
    })
}

fn float(desc: &ConstantDescription, value: &Number) -> CodegenResult<f64> {
    value.as_f64().ok_or_else(|| unrepresentable(desc, value))
}

/// Integer literals convert exactly. Float literals are accepted only when
/// they are whole and small enough to be exact.
fn integer<T: TryFrom<i128>>(desc: &ConstantDescription, value: &Number) -> CodegenResult<T> {
    let wide = if let Some(v) = value.as_i64() {
        Some(i128::from(v))
    } else if let Some(v) = value.as_u64() {
        Some(i128::from(v))
    } else {
        value
            .as_f64()
            .filter(|v| v.fract() == 0.0 && v.abs() <= F64_EXACT_INT)
            .map(|v| v as i128)
    };
    wide.and_then(|v| T::try_from(v).ok())
        .ok_or_else(|| unrepresentable(desc, value))
}

fn unrepresentable(desc: &ConstantDescription, value: &Number) -> CodegenError {
    let name = &desc.name;
    let dtype = desc.dtype;
    CodegenError::Description(format!(
        "constant '{name}' value {value} is not representable as {dtype}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_operator_substitutes_every_id() {
        let op = TemplateOperator::new("Relu_3", "float r{id} = 0; // op {id}\n");
        assert_eq!(op.generate("7"), "float r7 = 0; // op 7\n");
        assert_eq!(op.name(), "Relu_3");
    }

    #[test]
    fn adding_a_tensor_twice_replaces_it() {
        let mut model = InMemoryModel::new("m");
        model
            .add_intermediate(TensorInfo::new("h", DType::Float, vec![2]))
            .add_intermediate(TensorInfo::new("y", DType::Float, vec![1]))
            .add_intermediate(TensorInfo::new("h", DType::Double, vec![4]));
        let names: Vec<&str> = model
            .intermediate_tensors()
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(names, vec!["h", "y"]);
        assert_eq!(
            model.intermediate_tensor("h").map(|t| t.dtype),
            Some(DType::Double)
        );
    }

    #[test]
    fn from_json_builds_all_tables() {
        let json = r#"{
            "name": "Linear",
            "source_file": "linear.onnx",
            "parse_time": "Thu Oct 16 10:00:00 2026\n",
            "operators": [{"name": "Gemm_0", "body": "// gemm {id}\n"}],
            "initialized": [
                {"name": "W", "dtype": "float", "shape": [2], "data": [0.5, -1.25]},
                {"name": "mask", "dtype": "bool", "shape": [2], "data": [1, 0]}
            ],
            "intermediates": [{"name": "Y", "dtype": "float", "shape": [2]}],
            "inputs": [{"name": "X", "dtype": "float", "shape": [2]}],
            "outputs": ["Y"],
            "blas_routines": ["Gemm", "Gemm", "Trsm"]
        }"#;
        let model = InMemoryModel::from_json(json).expect("description parses");
        assert_eq!(model.name(), "Linear");
        assert_eq!(model.operators().len(), 1);
        assert_eq!(model.operators()[0].generate("0"), "// gemm 0\n");
        assert_eq!(
            model.initialized_tensors()[0].data,
            TensorData::F32(vec![0.5, -1.25])
        );
        assert_eq!(
            model.initialized_tensors()[1].data,
            TensorData::Raw {
                dtype: DType::Bool,
                bytes: vec![1, 0]
            }
        );
        assert_eq!(model.blas_routines(), ["Gemm".to_string(), "Trsm".to_string()]);
        assert_eq!(model.output_tensor_names(), ["Y".to_string()]);
    }

    #[test]
    fn from_json_rejects_fractional_integer_constants() {
        let json = r#"{
            "name": "m",
            "initialized": [{"name": "idx", "dtype": "int64", "shape": [1], "data": [1.5]}]
        }"#;
        let err = InMemoryModel::from_json(json).err().expect("fractional int rejected");
        assert!(matches!(err, CodegenError::Description(msg) if msg.contains("idx")));
    }

    #[test]
    fn from_json_keeps_int64_constants_exact() {
        let json = r#"{
            "name": "m",
            "initialized": [{
                "name": "ids",
                "dtype": "int64",
                "shape": [3],
                "data": [9007199254740993, 9223372036854775807, -9223372036854775808]
            }]
        }"#;
        let model = InMemoryModel::from_json(json).expect("description parses");
        assert_eq!(
            model.initialized_tensors()[0].data,
            TensorData::I64(vec![9_007_199_254_740_993, i64::MAX, i64::MIN])
        );
    }

    #[test]
    fn from_json_rejects_integers_outside_the_element_type() {
        for (dtype, value) in [
            ("int64", "9223372036854775808"),
            ("int32", "2147483648"),
            ("int8", "-129"),
            ("uint8", "-1"),
            ("int64", "1e19"),
        ] {
            let json = format!(
                r#"{{"name": "m", "initialized": [
                    {{"name": "k", "dtype": "{dtype}", "shape": [1], "data": [{value}]}}
                ]}}"#
            );
            let err = InMemoryModel::from_json(&json)
                .err()
                .unwrap_or_else(|| panic!("{value} accepted as {dtype}"));
            assert!(
                matches!(&err, CodegenError::Description(msg) if msg.contains(dtype)),
                "{dtype} {value}: {err}"
            );
        }
    }

    #[test]
    fn from_json_accepts_whole_floats_for_integer_types() {
        let json = r#"{
            "name": "m",
            "initialized": [
                {"name": "a", "dtype": "int32", "shape": [2], "data": [3.0, -2]},
                {"name": "b", "dtype": "uint8", "shape": [1], "data": [255]}
            ]
        }"#;
        let model = InMemoryModel::from_json(json).expect("description parses");
        assert_eq!(model.initialized_tensors()[0].data, TensorData::I32(vec![3, -2]));
        assert_eq!(
            model.initialized_tensors()[1].data,
            TensorData::Raw {
                dtype: DType::Uint8,
                bytes: vec![255]
            }
        );
    }

    #[test]
    fn from_json_reports_malformed_input() {
        let err = InMemoryModel::from_json("{\"operators\": 3}")
            .err()
            .expect("malformed description rejected");
        assert!(matches!(err, CodegenError::Description(_)));
    }
}
