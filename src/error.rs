// ABOUTME: Error types for lexing, parsing, and evaluation failures in the script engine

use thiserror::Error;

/// A source position: 1-based line and column, plus a byte offset into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub offset: u32,
}

impl Position {
    pub const fn start() -> Self {
        Position { line: 1, column: 1, offset: 0 }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// The numeric error codes preserved from the original dialect for compatibility.
pub mod codes {
    pub const INVALID_PROCEDURE_CALL: i32 = 5;
    pub const OVERFLOW: i32 = 6;
    pub const OUT_OF_MEMORY: i32 = 7;
    pub const SUBSCRIPT_OUT_OF_RANGE: i32 = 9;
    pub const DIVISION_BY_ZERO: i32 = 11;
    pub const TYPE_MISMATCH: i32 = 13;
    pub const BAD_FILE_NAME_OR_NUMBER: i32 = 52;
    pub const OBJECT_REQUIRED: i32 = 424;
    pub const OBJECT_DOESNT_SUPPORT_PROPERTY_OR_METHOD: i32 = 438;
    pub const INVALID_QUALIFIER: i32 = 450;
    pub const VARIABLE_NOT_DEFINED: i32 = 500;
    /// Not part of the original dialect's numbering; used for the cooperative deadline.
    pub const TIMEOUT: i32 = 1001;
}

/// Errors raised while tokenizing or parsing source text. Never resumable: they abort
/// the compilation unit rather than participating in `On Error Resume Next`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("unterminated string literal at {0}")]
    UnterminatedString(Position),

    #[error("unterminated date literal at {0}")]
    UnterminatedDateLiteral(Position),

    #[error("invalid numeric literal '{text}' at {pos}")]
    InvalidNumber { text: String, pos: Position },

    #[error("unexpected character '{ch}' at {pos}")]
    UnexpectedChar { ch: char, pos: Position },

    #[error("unexpected token {found} at {pos}, expected {expected}")]
    UnexpectedToken {
        found: String,
        expected: String,
        pos: Position,
    },

    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: String },

    #[error("'{0}' is not allowed inside a class body at {1}")]
    StatementNotAllowedInClass(String, Position),

    #[error("zero step in For loop at {0}")]
    ZeroStep(Position),
}

/// Runtime error raised by the evaluator. Carries enough context to populate the
/// language-level `Err` object (number, description, source).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("{0}")]
    Syntax(#[from] SyntaxError),

    /// Type mismatch with the coercion or operator that triggered it.
    #[error("Type mismatch: {context}")]
    TypeMismatch { context: String },

    #[error("Overflow: {context}")]
    Overflow { context: String },

    #[error("Subscript out of range: {context}")]
    SubscriptOutOfRange { context: String },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Invalid procedure call or argument: {context}")]
    InvalidProcedureCall { context: String },

    #[error("Variable '{0}' is not defined")]
    VariableNotDefined(String),

    #[error("Object required: '{0}'")]
    ObjectRequired(String),

    #[error("Object doesn't support this property or method: '{0}'")]
    ObjectDoesntSupportPropertyOrMethod(String),

    #[error("Invalid qualifier: '{0}'")]
    InvalidQualifier(String),

    #[error("'{0}' is undefined")]
    UndefinedName(String),

    #[error("Execution exceeded the configured time budget")]
    Timeout,

    /// User-synthesised error via `Err.Raise`.
    #[error("{description}")]
    Raised {
        number: i32,
        source: String,
        description: String,
    },

    /// A control-flow signal escaped past the construct that should have caught it
    /// (e.g. `Exit For` outside any loop). Reported as a hard error.
    #[error("'{0}' is not valid outside its enclosing construct")]
    MisplacedControlFlow(String),
}

impl EngineError {
    /// The numeric code surfaced through the language's `Err.Number`.
    pub fn code(&self) -> i32 {
        match self {
            EngineError::Syntax(_) => 0,
            EngineError::TypeMismatch { .. } => codes::TYPE_MISMATCH,
            EngineError::Overflow { .. } => codes::OVERFLOW,
            EngineError::SubscriptOutOfRange { .. } => codes::SUBSCRIPT_OUT_OF_RANGE,
            EngineError::DivisionByZero => codes::DIVISION_BY_ZERO,
            EngineError::InvalidProcedureCall { .. } => codes::INVALID_PROCEDURE_CALL,
            EngineError::VariableNotDefined(_) => codes::VARIABLE_NOT_DEFINED,
            EngineError::ObjectRequired(_) => codes::OBJECT_REQUIRED,
            EngineError::ObjectDoesntSupportPropertyOrMethod(_) => {
                codes::OBJECT_DOESNT_SUPPORT_PROPERTY_OR_METHOD
            }
            EngineError::InvalidQualifier(_) => codes::INVALID_QUALIFIER,
            EngineError::UndefinedName(_) => codes::VARIABLE_NOT_DEFINED,
            EngineError::Timeout => codes::TIMEOUT,
            EngineError::Raised { number, .. } => *number,
            EngineError::MisplacedControlFlow(_) => codes::INVALID_PROCEDURE_CALL,
        }
    }

    /// Whether `On Error Resume Next` may intercept this error. Syntax errors and
    /// timeouts are never resumable.
    pub fn is_resumable(&self) -> bool {
        !matches!(self, EngineError::Syntax(_) | EngineError::Timeout)
    }

    pub fn type_mismatch(context: impl Into<String>) -> Self {
        EngineError::TypeMismatch { context: context.into() }
    }

    pub fn overflow(context: impl Into<String>) -> Self {
        EngineError::Overflow { context: context.into() }
    }

    pub fn subscript_out_of_range(context: impl Into<String>) -> Self {
        EngineError::SubscriptOutOfRange { context: context.into() }
    }

    pub fn invalid_procedure_call(context: impl Into<String>) -> Self {
        EngineError::InvalidProcedureCall { context: context.into() }
    }
}
