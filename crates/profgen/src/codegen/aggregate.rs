use crate::options::AggregationPolicy;

use super::ir::{Function, Stmt};
use super::profile::{HISTORY_MUTEX, HISTORY_VAR, RESULT_TYPE};

pub const AGGREGATE_FN: &str = "GetOpAvgTime";

/// `GetOpAvgTime()`: mean time per operator over the whole call history.
/// An empty history yields an empty map.
pub(super) fn emit_aggregator(policy: AggregationPolicy, synchronized: bool) -> Function {
    let mut body = Vec::new();
    if synchronized {
        body.push(Stmt::line(format!(
            "std::lock_guard<std::mutex> lock({HISTORY_MUTEX});"
        )));
    }
    body.push(Stmt::block(
        format!("if ({HISTORY_VAR}.empty())"),
        vec![Stmt::line("return {};")],
    ));
    body.push(Stmt::Blank);
    match policy {
        AggregationPolicy::Union => union_body(&mut body),
        AggregationPolicy::FirstCall => first_call_body(&mut body),
    }
    body.push(Stmt::line("return avg;"));
    Function {
        ret: RESULT_TYPE.to_string(),
        name: AGGREGATE_FN.to_string(),
        params: Vec::new(),
        body,
    }
}

fn union_body(body: &mut Vec<Stmt>) {
    body.push(Stmt::Comment("Accumulation phase".to_string()));
    body.push(Stmt::line(format!("{RESULT_TYPE} avg;")));
    body.push(Stmt::line(
        "std::unordered_map<std::string, std::size_t> counts;",
    ));
    body.push(Stmt::block(
        format!("for (const auto& run : {HISTORY_VAR})"),
        vec![Stmt::block(
            "for (const auto& entry : run)",
            vec![
                Stmt::line("avg[entry.first] += entry.second;"),
                Stmt::line("counts[entry.first] += 1;"),
            ],
        )],
    ));
    body.push(Stmt::Blank);
    body.push(Stmt::Comment(
        "Normalization phase: divide by the calls that recorded each operator".to_string(),
    ));
    body.push(Stmt::block(
        "for (auto& entry : avg)",
        vec![Stmt::line(
            "entry.second /= static_cast<double>(counts[entry.first]);",
        )],
    ));
}

fn first_call_body(body: &mut Vec<Stmt>) {
    body.push(Stmt::Comment(
        "Accumulation phase: the first call fixes the operator set".to_string(),
    ));
    body.push(Stmt::line(format!("{RESULT_TYPE} avg = {HISTORY_VAR}[0];")));
    body.push(Stmt::block(
        format!("for (std::size_t i = 1; i < {HISTORY_VAR}.size(); ++i)"),
        vec![Stmt::block(
            "for (auto& entry : avg)",
            vec![
                Stmt::line(format!(
                    "auto found = {HISTORY_VAR}[i].find(entry.first);"
                )),
                Stmt::block(
                    format!("if (found != {HISTORY_VAR}[i].end())"),
                    vec![Stmt::line("entry.second += found->second;")],
                ),
            ],
        )],
    ));
    body.push(Stmt::Blank);
    body.push(Stmt::Comment("Normalization phase".to_string()));
    body.push(Stmt::block(
        "for (auto& entry : avg)",
        vec![Stmt::line(format!(
            "entry.second /= static_cast<double>({HISTORY_VAR}.size());"
        ))],
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::ir::{Item, TranslationUnit};
    use crate::codegen::printer::render;

    fn lines(function: &Function) -> Vec<String> {
        fn walk(stmts: &[Stmt], out: &mut Vec<String>) {
            for stmt in stmts {
                match stmt {
                    Stmt::Line(text) => out.push(text.clone()),
                    Stmt::Block { header, body } => {
                        out.push(header.clone());
                        walk(body, out);
                    }
                    _ => {}
                }
            }
        }
        let mut out = Vec::new();
        walk(&function.body, &mut out);
        out
    }

    fn rendered(policy: AggregationPolicy, synchronized: bool) -> String {
        let unit = TranslationUnit {
            items: vec![Item::Function(emit_aggregator(policy, synchronized))],
        };
        render(&unit)
    }

    #[test]
    fn union_body_renders_in_full() {
        let expected = r#"ProfilerResult GetOpAvgTime() {
  std::lock_guard<std::mutex> lock(profiler_results_mutex);
  if (profiler_results.empty()) {
    return {};
  }

  // Accumulation phase
  ProfilerResult avg;
  std::unordered_map<std::string, std::size_t> counts;
  for (const auto& run : profiler_results) {
    for (const auto& entry : run) {
      avg[entry.first] += entry.second;
      counts[entry.first] += 1;
    }
  }

  // Normalization phase: divide by the calls that recorded each operator
  for (auto& entry : avg) {
    entry.second /= static_cast<double>(counts[entry.first]);
  }
  return avg;
}
"#;
        assert_eq!(rendered(AggregationPolicy::Union, true), expected);
    }

    #[test]
    fn first_call_body_renders_in_full() {
        let expected = r#"ProfilerResult GetOpAvgTime() {
  if (profiler_results.empty()) {
    return {};
  }

  // Accumulation phase: the first call fixes the operator set
  ProfilerResult avg = profiler_results[0];
  for (std::size_t i = 1; i < profiler_results.size(); ++i) {
    for (auto& entry : avg) {
      auto found = profiler_results[i].find(entry.first);
      if (found != profiler_results[i].end()) {
        entry.second += found->second;
      }
    }
  }

  // Normalization phase
  for (auto& entry : avg) {
    entry.second /= static_cast<double>(profiler_results.size());
  }
  return avg;
}
"#;
        assert_eq!(rendered(AggregationPolicy::FirstCall, false), expected);
    }

    #[test]
    fn empty_history_returns_before_accumulating() {
        let function = emit_aggregator(AggregationPolicy::Union, false);
        let lines = lines(&function);
        assert_eq!(lines[0], "if (profiler_results.empty())");
        assert_eq!(lines[1], "return {};");
        assert_eq!(lines.last().map(String::as_str), Some("return avg;"));
        assert!(function.params.is_empty());
    }

    #[test]
    fn union_policy_counts_occurrences_per_operator() {
        let lines = lines(&emit_aggregator(AggregationPolicy::Union, true));
        assert_eq!(lines[0], "std::lock_guard<std::mutex> lock(profiler_results_mutex);");
        assert!(lines.iter().any(|l| l == "counts[entry.first] += 1;"));
        assert!(lines
            .iter()
            .any(|l| l == "entry.second /= static_cast<double>(counts[entry.first]);"));
    }

    #[test]
    fn first_call_policy_only_looks_up_known_operators() {
        let lines = lines(&emit_aggregator(AggregationPolicy::FirstCall, false));
        assert!(lines.iter().any(|l| l == "ProfilerResult avg = profiler_results[0];"));
        assert!(lines
            .iter()
            .any(|l| l == "auto found = profiler_results[i].find(entry.first);"));
        assert!(!lines.iter().any(|l| l.contains("counts")));
    }
}
