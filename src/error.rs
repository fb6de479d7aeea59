use thiserror::Error;

/// Every way an expression can fail to produce a displayable number.
///
/// The `Display` text is meant to be shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error("Enter an expression first.")]
    EmptyExpression,

    #[error("Expression contains unsupported characters.")]
    UnsupportedCharacters,

    #[error("Unknown function or token in expression: '{0}'.")]
    UnknownToken(String),

    #[error("Unsupported factorial placement.")]
    UnsupportedFactorial,

    #[error("Unsupported percent placement.")]
    UnsupportedPercent,

    #[error("Invalid expression syntax: {0}")]
    Syntax(String),

    #[error("Function '{function}' expects {expected} argument(s), got {found}.")]
    Arity {
        function: String,
        expected: usize,
        found: usize,
    },

    #[error("Factorial only supports non-negative integers.")]
    FactorialDomain,

    #[error("Factorial is too large to compute safely.")]
    FactorialOverflow,

    #[error("Expression produced an invalid result.")]
    InvalidResult,

    #[error("Result is not a finite number.")]
    NonFiniteResult,
}

/// Failures of the key-value store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Malformed timetable data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleError {
    #[error("invalid time '{0}', expected HH:MM")]
    InvalidTime(String),
}
