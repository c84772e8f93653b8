pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Occurs when a tag expression is structurally invalid, e.g. unbalanced parentheses.
    #[error("malformed tag expression \"{expression}\": {reason}")]
    Malformed { expression: String, reason: String },
    /// Occurs when "(" is not preceded by an operator name.
    #[error("operator expected at column {column} in tag expression \"{expression}\"")]
    OperatorExpected { expression: String, column: usize },
    /// Occurs when an operator name is not one of the supported operators.
    #[error("unsupported operator \"{name}\", supported operators are: {supported}")]
    UnsupportedOperator { name: String, supported: String },
    /// Occurs when "not" is given anything other than exactly one operand.
    #[error("\"not\" takes exactly one operand, got {count}")]
    NotArity { count: usize },
    /// Occurs when `tagtree.toml` fails to load.
    #[error("failed to load tagtree.toml: {0}")]
    LoadError(String),
    /// Occurs when a test specification file can't be read or deserialized.
    #[error("failed to load test specification {path}: {reason}")]
    SpecLoad { path: String, reason: String },
}

impl Error {
    /// Returns true if the error stems from an invalid tag expression.
    pub fn is_expression_error(&self) -> bool {
        matches!(
            self,
            Error::Malformed { .. }
                | Error::OperatorExpected { .. }
                | Error::UnsupportedOperator { .. }
                | Error::NotArity { .. }
        )
    }
}
