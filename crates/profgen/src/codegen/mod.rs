//! Assembly of the profiled translation unit.
//!
//! The assembler builds a [`TranslationUnit`] in the fixed layout the emitted
//! file uses (provenance, includes, model namespace, BLAS declarations, call
//! history, `GetOpAvgTime`, tensors, `infer`) and hands it to the printer.

mod aggregate;
mod blas;
pub mod ir;
mod printer;
mod profile;
mod tensors;
mod utils;

use std::collections::BTreeSet;

use tracing::debug;

use crate::error::{CodegenError, CodegenResult};
use crate::model::{DType, GraphModel, TensorInfo};
use crate::options::GenerateOptions;

use ir::{Function, Item, Param, Stmt, TranslationUnit};
use profile::{HISTORY_MUTEX, HISTORY_VAR, RESULT_TYPE};
use utils::{c_type, sanitize_symbol, tensor_var};

pub use printer::render;

pub use aggregate::AGGREGATE_FN;

pub const INFER_FN: &str = "infer";

/// A graph model that has been accepted for profiled generation.
pub struct ProfiledModel<M> {
    model: M,
    options: GenerateOptions,
}

impl<M: GraphModel> ProfiledModel<M> {
    /// Wraps `model`, rejecting graphs whose outputs the generated routine
    /// cannot return.
    pub fn new(model: M) -> CodegenResult<Self> {
        check_model(&model)?;
        Ok(Self {
            model,
            options: GenerateOptions::default(),
        })
    }

    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn into_inner(self) -> M {
        self.model
    }

    pub fn translation_unit(&self) -> CodegenResult<TranslationUnit> {
        build_translation_unit(&self.model, &self.options)
    }

    pub fn generate(&self) -> CodegenResult<String> {
        generate_profiled_module(&self.model, &self.options)
    }
}

/// Validates the output contract and returns the output tensor's descriptor.
pub fn check_model<M: GraphModel + ?Sized>(model: &M) -> CodegenResult<&TensorInfo> {
    let outputs = model.output_tensor_names();
    if outputs.len() != 1 {
        return Err(CodegenError::UnsupportedOutputCount(outputs.len()));
    }
    let name = &outputs[0];
    let info = model
        .intermediate_tensor(name)
        .ok_or_else(|| CodegenError::OutputNotFound(name.clone()))?;
    if c_type(info.dtype).is_none() {
        return Err(CodegenError::UnsupportedOutputType {
            name: name.clone(),
            dtype: info.dtype,
        });
    }
    if tensors::sized(name, &info.shape)? == 0 {
        return Err(CodegenError::EmptyOutput(name.clone()));
    }
    Ok(info)
}

pub fn generate_profiled_module<M: GraphModel + ?Sized>(
    model: &M,
    options: &GenerateOptions,
) -> CodegenResult<String> {
    let unit = build_translation_unit(model, options)?;
    let module = render(&unit);
    debug!(
        model = model.name(),
        bytes = module.len(),
        "generated profiled module"
    );
    Ok(module)
}

pub fn build_translation_unit<M: GraphModel + ?Sized>(
    model: &M,
    options: &GenerateOptions,
) -> CodegenResult<TranslationUnit> {
    let output = check_model(model)?;
    debug!(
        model = model.name(),
        operators = model.operators().len(),
        constants = model.initialized_tensors().len(),
        intermediates = model.intermediate_tensors().len(),
        aggregation = %options.aggregation,
        "assembling profiled translation unit"
    );

    let decls = tensors::emit_tensor_declarations(
        model.initialized_tensors(),
        model.intermediate_tensors(),
    )?;

    let mut includes: BTreeSet<&'static str> =
        ["chrono", "string", "unordered_map", "utility", "vector"]
            .into_iter()
            .collect();
    if options.synchronized_history {
        includes.insert("mutex");
    }
    if options.utility_functions {
        includes.insert("cstddef");
    }
    if decls.needs_cmath {
        includes.insert("cmath");
    }
    let inputs: Vec<(&'static str, &TensorInfo)> = model
        .input_tensors()
        .iter()
        .filter_map(|info| c_type(info.dtype).map(|ctype| (ctype, info)))
        .collect();
    let uses_int = inputs
        .iter()
        .map(|(_, info)| info.dtype)
        .chain(std::iter::once(output.dtype))
        .any(|dtype| matches!(dtype, DType::Int32 | DType::Int64));
    if decls.needs_cstdint || uses_int {
        includes.insert("cstdint");
    }

    let mut unit = TranslationUnit::default();
    unit.push(Item::Comment(provenance(model)));
    for header in includes {
        unit.push(Item::Include(header.to_string()));
    }
    unit.push(Item::Blank);

    let mut items = Vec::new();
    if let Some(scope) = blas::emit_blas_declarations(model.blas_routines()) {
        items.push(scope);
        items.push(Item::Blank);
    }

    items.push(Item::Comment(
        "Maps an operator name to its execution time in a run, in microseconds.".to_string(),
    ));
    items.push(Item::TypeAlias {
        name: RESULT_TYPE.to_string(),
        target: "std::unordered_map<std::string, double>".to_string(),
    });
    items.push(Item::Global {
        ty: format!("std::vector<{RESULT_TYPE}>"),
        name: HISTORY_VAR.to_string(),
        length: None,
        init: None,
    });
    if options.synchronized_history {
        items.push(Item::Global {
            ty: "std::mutex".to_string(),
            name: HISTORY_MUTEX.to_string(),
            length: None,
            init: None,
        });
    } else {
        items.push(Item::Comment(
            "Not synchronized: callers must serialize calls to infer.".to_string(),
        ));
    }
    items.push(Item::Blank);

    if options.utility_functions {
        items.push(Item::Function(aggregate::emit_aggregator(
            options.aggregation,
            options.synchronized_history,
        )));
        items.push(Item::Blank);
    }

    if !decls.items.is_empty() {
        items.extend(decls.items);
        items.push(Item::Blank);
    }

    items.push(Item::Function(infer_function(model, output, &inputs, options)));

    unit.push(Item::Namespace {
        name: namespace_name(model, options),
        items,
    });
    Ok(unit)
}

fn provenance<M: GraphModel + ?Sized>(model: &M) -> String {
    let source = model.source_file();
    let parse_time = model.parse_time().trim_end();
    format!(
        "Code for profiling and benchmarking purposes.\n\
         Generated automatically for inference of model file [{source}] at [{parse_time}]"
    )
}

fn namespace_name<M: GraphModel + ?Sized>(model: &M, options: &GenerateOptions) -> String {
    let prefix = &options.namespace_prefix;
    let name = model.name();
    sanitize_symbol(&format!("{prefix}{name}"))
}

fn infer_function<M: GraphModel + ?Sized>(
    model: &M,
    output: &TensorInfo,
    inputs: &[(&'static str, &TensorInfo)],
    options: &GenerateOptions,
) -> Function {
    let out_type = c_type(output.dtype).unwrap_or("float");
    let params = inputs
        .iter()
        .map(|(ctype, info)| Param::new(format!("{ctype}*"), tensor_var(&info.name)))
        .collect();

    let mut body = profile::timer_locals();
    body.push(Stmt::Blank);
    body.extend(profile::weave_operators(&model.operators()));
    body.push(Stmt::Blank);
    body.push(profile::history_append(options.synchronized_history));

    let out = tensor_var(&output.name);
    body.push(Stmt::line(format!(
        "std::vector<{out_type}> ret({out}, {out} + sizeof({out}) / sizeof({out}[0]));"
    )));
    body.push(Stmt::line("return ret;"));

    Function {
        ret: format!("std::vector<{out_type}>"),
        name: INFER_FN.to_string(),
        params,
        body,
    }
}
