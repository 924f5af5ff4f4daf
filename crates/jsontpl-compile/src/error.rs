use std::fmt;

/// Why a template could not be compiled. No partial output accompanies it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// A value outside the JSON type set, e.g. a native function.
    /// `path` is a JSON pointer to the value; empty for the root.
    UnsupportedType { type_name: String, path: String },
    DepthLimitExceeded { limit: usize },
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::UnsupportedType { type_name, path } => {
                write!(f, "value cannot be of type '{}'", type_name)?;
                if !path.is_empty() {
                    write!(f, " (at {})", path)?;
                }
                Ok(())
            }
            CompileError::DepthLimitExceeded { limit } => {
                write!(f, "template is nested deeper than {} levels", limit)
            }
        }
    }
}

impl std::error::Error for CompileError {}
