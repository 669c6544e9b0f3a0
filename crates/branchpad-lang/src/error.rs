//! Pad errors
//!
//! Every variant maps onto the exception class a user sees in a cell's
//! error text, e.g. `NameError: name 'y' is not defined`.

use branchpad_core::InterpreterError;

/// Error raised while parsing or evaluating Pad code
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PadError {
    /// Malformed source
    #[error("SyntaxError: {message} (line {line}, column {col})")]
    Syntax {
        /// What was wrong
        message: String,
        /// 1-based line
        line: usize,
        /// 1-based column
        col: usize,
    },

    /// Unbound name
    #[error("NameError: name '{0}' is not defined")]
    Name(String),

    /// Operation applied to a value of the wrong type
    #[error("TypeError: {0}")]
    Type(String),

    /// Right type, unusable value
    #[error("ValueError: {0}")]
    Value(String),

    /// Division or modulo by zero
    #[error("ZeroDivisionError: {0}")]
    ZeroDivision(String),

    /// Integer result out of range
    #[error("OverflowError: {0}")]
    Overflow(String),

    /// Value too large to build
    #[error("MemoryError: {0}")]
    Memory(String),

    /// List index out of range
    #[error("IndexError: {0}")]
    Index(String),

    /// Unknown module attribute
    #[error("AttributeError: {0}")]
    Attribute(String),

    /// Import of a package that is not loaded
    #[error("ModuleNotFoundError: No module named '{0}'")]
    ModuleNotFound(String),

    /// Name that cannot be imported from a module
    #[error("ImportError: {0}")]
    Import(String),

    /// User `raise`
    #[error("{kind}: {message}")]
    Raised {
        /// Exception class named by the user
        kind: String,
        /// Message
        message: String,
    },
}

impl PadError {
    /// Syntax error at a position
    #[inline]
    pub fn syntax(message: impl Into<String>, line: usize, col: usize) -> Self {
        Self::Syntax {
            message: message.into(),
            line,
            col,
        }
    }

    /// Exception class name
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::Syntax { .. } => "SyntaxError",
            Self::Name(_) => "NameError",
            Self::Type(_) => "TypeError",
            Self::Value(_) => "ValueError",
            Self::ZeroDivision(_) => "ZeroDivisionError",
            Self::Overflow(_) => "OverflowError",
            Self::Memory(_) => "MemoryError",
            Self::Index(_) => "IndexError",
            Self::Attribute(_) => "AttributeError",
            Self::ModuleNotFound(_) => "ModuleNotFoundError",
            Self::Import(_) => "ImportError",
            Self::Raised { kind, .. } => kind,
        }
    }

    /// Message without the class prefix
    #[must_use]
    pub fn message(&self) -> String {
        let full = self.to_string();
        let prefix = format!("{}: ", self.kind());
        full.strip_prefix(&prefix).map_or(full.clone(), str::to_string)
    }
}

impl From<PadError> for InterpreterError {
    fn from(err: PadError) -> Self {
        InterpreterError::exception(err.kind(), err.message())
    }
}

/// Result alias for Pad operations
pub type PadResult<T> = Result<T, PadError>;
