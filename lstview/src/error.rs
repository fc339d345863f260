/// Malformed trace input. Any of these aborts the conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// No line whose trimmed content starts with `0`.
    NoDataLine,
    /// A brace-nested value that does not close.
    UnbalancedBraces(String),
    /// A signal required by the configuration is not present in the header.
    MissingSignal(String),
}

impl std::fmt::Display for FormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatError::NoDataLine => write!(
                f,
                "first data line not found, make sure the first line of data starts with zero"
            ),
            FormatError::UnbalancedBraces(value) => write!(f, "unbalanced braces in `{value}`"),
            FormatError::MissingSignal(name) => write!(f, "signal `{name}` not found in header"),
        }
    }
}

impl std::error::Error for FormatError {}
