use crate::model::DType;

pub(super) fn escape_c_string(input: &str) -> String {
    input
        .chars()
        .map(|ch| match ch {
            '\\' => "\\\\".to_string(),
            '"' => "\\\"".to_string(),
            '\n' => "\\n".to_string(),
            '\r' => "\\r".to_string(),
            '\t' => "\\t".to_string(),
            _ => ch.to_string(),
        })
        .collect::<Vec<_>>()
        .join("")
}

pub(super) fn sanitize_symbol(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for (idx, ch) in value.chars().enumerate() {
        let is_valid = ch.is_ascii_alphanumeric() || ch == '_';
        if idx == 0 && ch.is_ascii_digit() {
            out.push('_');
        }
        out.push(if is_valid { ch } else { '_' });
    }
    if out.is_empty() {
        out.push_str("model");
    }
    out
}

pub(super) fn tensor_var(name: &str) -> String {
    format!("tensor_{name}")
}

/// C++ element type for the dtypes the generator declares.
pub(super) fn c_type(dtype: DType) -> Option<&'static str> {
    match dtype {
        DType::Float => Some("float"),
        DType::Double => Some("double"),
        DType::Int32 => Some("int32_t"),
        DType::Int64 => Some("int64_t"),
        DType::Int8 | DType::Uint8 | DType::Bool | DType::Float16 => None,
    }
}

/// Shortest literal that parses back to the same `f32` bits.
pub(super) fn format_f32(value: f32) -> String {
    if value.is_nan() {
        "NAN".to_string()
    } else if value.is_infinite() {
        if value.is_sign_negative() {
            "-INFINITY".to_string()
        } else {
            "INFINITY".to_string()
        }
    } else {
        let base = value.to_string();
        let needs_decimal = !base.contains('.') && !base.contains('e') && !base.contains('E');
        let suffix = if needs_decimal { ".0f" } else { "f" };
        format!("{base}{suffix}")
    }
}

pub(super) fn format_f64(value: f64) -> String {
    if value.is_nan() {
        "NAN".to_string()
    } else if value.is_infinite() {
        if value.is_sign_negative() {
            "-INFINITY".to_string()
        } else {
            "INFINITY".to_string()
        }
    } else {
        let base = value.to_string();
        let needs_decimal = !base.contains('.') && !base.contains('e') && !base.contains('E');
        if needs_decimal {
            format!("{base}.0")
        } else {
            base
        }
    }
}

/// `INT64_MIN` has no literal form; spell it as an expression.
pub(super) fn format_i64(value: i64) -> String {
    if value == i64::MIN {
        "(-9223372036854775807LL - 1)".to_string()
    } else {
        format!("{value}LL")
    }
}

pub(super) fn format_i32(value: i32) -> String {
    if value == i32::MIN {
        "(-2147483647 - 1)".to_string()
    } else {
        value.to_string()
    }
}

pub(super) fn push_line(module: &mut String, indent: usize, line: &str) {
    push_block(module, indent, line);
}

pub(super) fn push_block(module: &mut String, indent: usize, block: &str) {
    if block.is_empty() {
        return;
    }
    let pad = "  ".repeat(indent);
    let mut lines: Vec<&str> = block.split('\n').collect();
    if matches!(lines.first(), Some(line) if line.trim().is_empty()) {
        lines.remove(0);
    }
    if matches!(lines.last(), Some(line) if line.trim().is_empty()) {
        lines.pop();
    }

    let mut min_indent = usize::MAX;
    for line in &lines {
        if line.trim().is_empty() {
            continue;
        }
        let count = line.chars().take_while(|c| *c == ' ' || *c == '\t').count();
        min_indent = min_indent.min(count);
    }
    if min_indent == usize::MAX {
        min_indent = 0;
    }

    for line in lines {
        let trimmed = if min_indent > 0 && line.len() >= min_indent {
            &line[min_indent..]
        } else {
            line
        };
        if trimmed.trim().is_empty() {
            module.push('\n');
            continue;
        }
        module.push_str(&pad);
        module.push_str(trimmed);
        module.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_literals_round_trip_bit_patterns() {
        let samples = [
            0.1f32,
            1.0 / 3.0,
            f32::MIN_POSITIVE,
            f32::MAX,
            -2.5e-7,
            16_777_217.0,
            -0.0,
        ];
        for value in samples {
            let literal = format_f32(value);
            let parsed: f32 = literal
                .trim_end_matches('f')
                .parse()
                .expect("literal parses as f32");
            assert_eq!(parsed.to_bits(), value.to_bits(), "literal {literal}");
        }
    }

    #[test]
    fn double_literals_round_trip_bit_patterns() {
        for value in [0.1f64, 1.0 / 7.0, f64::EPSILON, -1e300, 42.0] {
            let literal = format_f64(value);
            let parsed: f64 = literal.parse().expect("literal parses as f64");
            assert_eq!(parsed.to_bits(), value.to_bits(), "literal {literal}");
        }
    }

    #[test]
    fn non_finite_literals_use_cmath_macros() {
        assert_eq!(format_f32(f32::NAN), "NAN");
        assert_eq!(format_f32(f32::NEG_INFINITY), "-INFINITY");
        assert_eq!(format_f64(f64::INFINITY), "INFINITY");
        assert_eq!(format_f32(2.0), "2.0f");
    }

    #[test]
    fn sanitize_symbol_produces_identifiers() {
        assert_eq!(sanitize_symbol("resnet-18.v2"), "resnet_18_v2");
        assert_eq!(sanitize_symbol("3layer"), "_3layer");
        assert_eq!(sanitize_symbol(""), "model");
    }

    #[test]
    fn escape_c_string_escapes_quotes_and_backslashes() {
        assert_eq!(escape_c_string(r#"a"b\c"#), r#"a\"b\\c"#);
    }

    #[test]
    fn push_block_keeps_relative_indent_without_common_prefix() {
        let mut out = String::new();
        push_block(&mut out, 1, "for (;;) {\n    step();\n}");
        assert_eq!(out, "  for (;;) {\n      step();\n  }\n");
    }

    #[test]
    fn push_block_strips_common_indent() {
        let mut out = String::new();
        push_block(
            &mut out,
            1,
            r#"
                if (x) {
                  y();
                }
            "#,
        );
        assert_eq!(out, "  if (x) {\n    y();\n  }\n");
    }
}
