//! Core error types with error codes

use thiserror::Error;

pub use super::error_code::*;

/// Errors raised by the resolver, the function catalog and the resolution cache
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TemplateError {
    /// Expression body could not be tokenized (unbalanced quotes or brackets)
    #[error("{error_code}: {message}")]
    Syntax {
        error_code: ErrorCode,
        message: String,
    },

    /// Expression evaluated to undefined while `throw_on_undefined` is set
    #[error("{error_code}: unresolved expression '{expression}'")]
    UnresolvedExpression {
        error_code: ErrorCode,
        expression: String,
    },

    /// No registry tier knows the function
    #[error("{error_code}: unknown function '{name}'")]
    FunctionNotFound { error_code: ErrorCode, name: String },

    /// Nested resolution went deeper than the configured maximum
    #[error("{error_code}: maximum resolution depth {max_depth} exceeded at depth {depth}")]
    DepthExceeded {
        error_code: ErrorCode,
        depth: usize,
        max_depth: usize,
    },

    /// A JSON array/object literal failed to parse
    #[error("{error_code}: malformed literal '{literal}': {message}")]
    MalformedLiteral {
        error_code: ErrorCode,
        literal: String,
        message: String,
    },

    /// A built-in rejected its arguments
    #[error("{error_code}: {function}(): {message}")]
    InvalidArgument {
        error_code: ErrorCode,
        function: String,
        message: String,
    },

    /// A function name is already taken in the registry
    #[error("{error_code}: function '{name}' is already registered")]
    DuplicateFunction { error_code: ErrorCode, name: String },

    /// Stored checksum no longer matches the stored value
    #[error("{error_code}: checksum mismatch for cache entry '{key}'")]
    CacheCorruption { error_code: ErrorCode, key: String },

    /// Disk I/O for cache persistence failed
    #[error("{error_code}: persistence failure at {path}: {message}")]
    Persistence {
        error_code: ErrorCode,
        path: String,
        message: String,
    },
}

impl TemplateError {
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::Syntax {
            error_code: TP0001,
            message: message.into(),
        }
    }

    pub fn unresolved(expression: impl Into<String>) -> Self {
        Self::UnresolvedExpression {
            error_code: TP0051,
            expression: expression.into(),
        }
    }

    pub fn function_not_found(name: impl Into<String>) -> Self {
        Self::FunctionNotFound {
            error_code: TP0052,
            name: name.into(),
        }
    }

    pub fn depth_exceeded(depth: usize, max_depth: usize) -> Self {
        Self::DepthExceeded {
            error_code: TP0053,
            depth,
            max_depth,
        }
    }

    pub fn malformed_literal(literal: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedLiteral {
            error_code: TP0002,
            literal: literal.into(),
            message: message.into(),
        }
    }

    pub fn invalid_argument(function: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            error_code: TP0054,
            function: function.into(),
            message: message.into(),
        }
    }

    pub fn duplicate_function(name: impl Into<String>) -> Self {
        Self::DuplicateFunction {
            error_code: TP0055,
            name: name.into(),
        }
    }

    pub fn cache_corruption(key: impl Into<String>) -> Self {
        Self::CacheCorruption {
            error_code: TP0101,
            key: key.into(),
        }
    }

    pub fn persistence(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Persistence {
            error_code: TP0102,
            path: path.into(),
            message: message.into(),
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Syntax { error_code, .. }
            | Self::UnresolvedExpression { error_code, .. }
            | Self::FunctionNotFound { error_code, .. }
            | Self::DepthExceeded { error_code, .. }
            | Self::MalformedLiteral { error_code, .. }
            | Self::InvalidArgument { error_code, .. }
            | Self::DuplicateFunction { error_code, .. }
            | Self::CacheCorruption { error_code, .. }
            | Self::Persistence { error_code, .. } => *error_code,
        }
    }

    /// Depth violations abort the whole `resolve` call regardless of policy
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::DepthExceeded { .. })
    }
}

/// Result type for template operations
pub type Result<T> = std::result::Result<T, TemplateError>;
