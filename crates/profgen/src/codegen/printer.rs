use super::ir::{Function, Item, Stmt, TranslationUnit};
use super::profile::{emit_timer_start, emit_timer_stop};
use super::utils::push_line;

/// Renders a translation unit. Output is appended front to back; nothing
/// already written is revisited.
pub fn render(unit: &TranslationUnit) -> String {
    let mut module = String::new();
    for item in &unit.items {
        print_item(&mut module, item, 0);
    }
    module
}

fn print_item(module: &mut String, item: &Item, indent: usize) {
    match item {
        Item::Comment(text) => print_comment(module, indent, text),
        Item::Include(header) => push_line(module, indent, &format!("#include <{header}>")),
        Item::Blank => module.push('\n'),
        Item::Namespace { name, items } => {
            push_line(module, indent, &format!("namespace {name} {{"));
            for inner in items {
                print_item(module, inner, indent);
            }
            push_line(module, indent, &format!("}}  // namespace {name}"));
        }
        Item::ExternC { signature } => {
            push_line(module, indent, &format!("extern \"C\" {signature};"));
        }
        Item::TypeAlias { name, target } => {
            push_line(module, indent, &format!("using {name} = {target};"));
        }
        Item::Global {
            ty,
            name,
            length,
            init,
        } => {
            let extent = length.map(|len| format!("[{len}]")).unwrap_or_default();
            let line = match init {
                Some(init) => format!("{ty} {name}{extent} = {init};"),
                None => format!("{ty} {name}{extent};"),
            };
            push_line(module, indent, &line);
        }
        Item::Function(function) => print_function(module, function, indent),
    }
}

fn print_function(module: &mut String, function: &Function, indent: usize) {
    let params = function
        .params
        .iter()
        .map(|param| format!("{} {}", param.ty, param.name))
        .collect::<Vec<_>>()
        .join(", ");
    let ret = &function.ret;
    let name = &function.name;
    push_line(module, indent, &format!("{ret} {name}({params}) {{"));
    for stmt in &function.body {
        print_stmt(module, stmt, indent + 1);
    }
    push_line(module, indent, "}");
}

fn print_stmt(module: &mut String, stmt: &Stmt, indent: usize) {
    match stmt {
        Stmt::Line(text) => push_line(module, indent, text),
        Stmt::Comment(text) => print_comment(module, indent, text),
        Stmt::Blank => module.push('\n'),
        Stmt::Verbatim(text) => {
            if text.is_empty() {
                return;
            }
            module.push_str(text);
            if !text.ends_with('\n') {
                module.push('\n');
            }
        }
        Stmt::Block { header, body } => {
            let open = if header.is_empty() {
                "{".to_string()
            } else {
                format!("{header} {{")
            };
            push_line(module, indent, &open);
            for inner in body {
                print_stmt(module, inner, indent + 1);
            }
            push_line(module, indent, "}");
        }
        Stmt::TimerStart { .. } => emit_timer_start(module, indent),
        Stmt::TimerStop { op_name, .. } => emit_timer_stop(module, indent, op_name),
    }
}

fn print_comment(module: &mut String, indent: usize, text: &str) {
    for line in text.lines() {
        if line.is_empty() {
            push_line(module, indent, "//");
        } else {
            push_line(module, indent, &format!("// {line}"));
        }
    }
}
