//! Tree form of the emitted translation unit. Built by the assembler and
//! rendered by [`super::printer`].

/// Top-level (namespace scope) construct.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Comment(String),
    Include(String),
    Blank,
    Namespace {
        name: String,
        items: Vec<Item>,
    },
    /// `extern "C"` function declaration; `signature` is everything after
    /// the linkage specifier, without the trailing semicolon.
    ExternC {
        signature: String,
    },
    TypeAlias {
        name: String,
        target: String,
    },
    /// Global variable. `length` makes it a fixed-size array; `init` is the
    /// braced initializer text, if any.
    Global {
        ty: String,
        name: String,
        length: Option<usize>,
        init: Option<String>,
    },
    Function(Function),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub ret: String,
    pub name: String,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub ty: String,
    pub name: String,
}

impl Param {
    pub fn new(ty: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            name: name.into(),
        }
    }
}

/// Statement inside a function body.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// One line of code, indented to the enclosing depth.
    Line(String),
    Comment(String),
    Blank,
    /// Operator body text, printed exactly as produced.
    Verbatim(String),
    /// `header {` ... `}`; an empty header opens a bare scope.
    Block { header: String, body: Vec<Stmt> },
    /// Start of the timed region for the operator at `op_index`.
    TimerStart { op_index: usize },
    /// End of the timed region; stores the elapsed time under `op_name`.
    TimerStop { op_index: usize, op_name: String },
}

impl Stmt {
    pub fn line(text: impl Into<String>) -> Self {
        Stmt::Line(text.into())
    }

    pub fn block(header: impl Into<String>, body: Vec<Stmt>) -> Self {
        Stmt::Block {
            header: header.into(),
            body,
        }
    }
}

/// One complete emitted translation unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslationUnit {
    pub items: Vec<Item>,
}

impl TranslationUnit {
    pub fn push(&mut self, item: Item) {
        self.items.push(item);
    }

    /// The single top-level namespace, if the unit has one.
    pub fn namespace(&self) -> Option<(&str, &[Item])> {
        self.items.iter().find_map(|item| match item {
            Item::Namespace { name, items } => Some((name.as_str(), items.as_slice())),
            _ => None,
        })
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        let (_, items) = self.namespace()?;
        items.iter().find_map(|item| match item {
            Item::Function(function) if function.name == name => Some(function),
            _ => None,
        })
    }
}
