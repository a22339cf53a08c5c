use crate::model::OperatorCodegen;

use super::ir::Stmt;
use super::utils::{escape_c_string, push_block};

pub(super) const RESULT_TYPE: &str = "ProfilerResult";
pub(super) const HISTORY_VAR: &str = "profiler_results";
pub(super) const HISTORY_MUTEX: &str = "profiler_results_mutex";
const CURRENT_VAR: &str = "current_execution";

/// Wraps whatever `emit` pushes between a start and a stop capture for the
/// operator at `op_index`.
pub(super) fn emit_profiled_op<F>(body: &mut Vec<Stmt>, op_index: usize, op_name: &str, emit: F)
where
    F: FnOnce(&mut Vec<Stmt>),
{
    body.push(Stmt::TimerStart { op_index });
    emit(body);
    body.push(Stmt::TimerStop {
        op_index,
        op_name: op_name.to_string(),
    });
}

/// Timed statements for every operator, in graph order. Each body is taken
/// from the operator unchanged.
pub(super) fn weave_operators(operators: &[&dyn OperatorCodegen]) -> Vec<Stmt> {
    let mut body = Vec::with_capacity(operators.len() * 3);
    for (op_index, op) in operators.iter().enumerate() {
        let op_id = op_index.to_string();
        emit_profiled_op(&mut body, op_index, op.name(), |body| {
            body.push(Stmt::Verbatim(op.generate(&op_id)));
        });
    }
    body
}

pub(super) fn timer_locals() -> Vec<Stmt> {
    vec![
        Stmt::line("std::chrono::steady_clock::time_point tp_start;"),
        Stmt::line(format!("{RESULT_TYPE} {CURRENT_VAR};")),
    ]
}

/// Appends the finished per-call map to the shared history.
pub(super) fn history_append(synchronized: bool) -> Stmt {
    let push = Stmt::line(format!("{HISTORY_VAR}.push_back(std::move({CURRENT_VAR}));"));
    if synchronized {
        Stmt::block(
            "",
            vec![
                Stmt::line(format!(
                    "std::lock_guard<std::mutex> lock({HISTORY_MUTEX});"
                )),
                push,
            ],
        )
    } else {
        push
    }
}

pub(super) fn emit_timer_start(module: &mut String, indent: usize) {
    push_block(module, indent, "tp_start = std::chrono::steady_clock::now();");
}

pub(super) fn emit_timer_stop(module: &mut String, indent: usize, op_name: &str) {
    let key = escape_c_string(op_name);
    let block = format!(
        r#"
            {CURRENT_VAR}["{key}"] = static_cast<double>(
                std::chrono::duration_cast<std::chrono::microseconds>(
                    std::chrono::steady_clock::now() - tp_start).count());
        "#
    );
    push_block(module, indent, &block);
}
