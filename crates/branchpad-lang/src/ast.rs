//! Pad syntax tree

use branchpad_core::Value;

/// Binary arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `//`
    FloorDiv,
    /// `%`
    Mod,
}

impl BinOp {
    /// Source form
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::FloorDiv => "//",
            Self::Mod => "%",
        }
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl CmpOp {
    /// Source form
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    /// `-x`
    Neg,
    /// `+x`
    Pos,
    /// `not x`
    Not,
}

/// Expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal constant
    Literal(Value),
    /// Name lookup
    Name(String),
    /// `[a, b, ...]`
    List(Vec<Expr>),
    /// Unary operation
    Unary {
        /// Operator
        op: UnOp,
        /// Operand
        operand: Box<Expr>,
    },
    /// Arithmetic
    Binary {
        /// Operator
        op: BinOp,
        /// Left operand
        lhs: Box<Expr>,
        /// Right operand
        rhs: Box<Expr>,
    },
    /// Comparison chain `a < b <= c`
    Compare {
        /// First operand
        first: Box<Expr>,
        /// Following operator/operand pairs
        rest: Vec<(CmpOp, Expr)>,
    },
    /// Short-circuit `and`
    And(Box<Expr>, Box<Expr>),
    /// Short-circuit `or`
    Or(Box<Expr>, Box<Expr>),
    /// `callee(args...)`
    Call {
        /// Function expression
        callee: Box<Expr>,
        /// Positional arguments
        args: Vec<Expr>,
    },
    /// `object.name`
    Attribute {
        /// Object expression
        object: Box<Expr>,
        /// Attribute name
        name: String,
    },
    /// `object[index]`
    Index {
        /// Indexed expression
        object: Box<Expr>,
        /// Index expression
        index: Box<Expr>,
    },
}

/// Statements
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `name = value`
    Assign {
        /// Bound name
        target: String,
        /// Value expression
        value: Expr,
    },
    /// `name += value` and friends
    AugAssign {
        /// Updated name
        target: String,
        /// Operator applied
        op: BinOp,
        /// Right operand
        value: Expr,
    },
    /// `import a, b`
    Import(Vec<String>),
    /// `from module import a, b`
    FromImport {
        /// Source module
        module: String,
        /// Imported attributes
        names: Vec<String>,
    },
    /// `raise "msg"` or `raise Kind("msg")`
    Raise {
        /// Exception class
        kind: String,
        /// Message expression
        message: Option<Expr>,
    },
    /// `del a, b`
    Del(Vec<String>),
    /// Bare expression
    Expr(Expr),
}

/// Parsed source
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    /// Statements in source order
    pub body: Vec<Stmt>,
}
