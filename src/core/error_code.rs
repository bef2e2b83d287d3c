//! Error code system for template resolution (TP0001, TP0002, ...)
//!
//! Codes are grouped by the component that raises them, in the same spirit
//! as the Rust compiler's E0001-style codes.

use std::fmt;

/// Error categories for organizing error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Expression syntax errors (TP0001-TP0049)
    Syntax,
    /// Evaluation errors (TP0050-TP0099)
    Evaluation,
    /// Cache errors (TP0100-TP0149)
    Cache,
}

/// Error code following the `TP0000` pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode {
    pub code: u16,
}

impl ErrorCode {
    pub const fn new(code: u16) -> Self {
        Self { code }
    }

    /// Full code string, e.g. "TP0051"
    pub fn code_str(&self) -> String {
        format!("TP{:04}", self.code)
    }

    pub fn category(&self) -> ErrorCategory {
        match self.code {
            0..=49 => ErrorCategory::Syntax,
            50..=99 => ErrorCategory::Evaluation,
            _ => ErrorCategory::Cache,
        }
    }

    /// Short human-readable title
    pub fn title(&self) -> &'static str {
        match self.code {
            1 => "Invalid expression syntax",
            2 => "Malformed literal",
            51 => "Unresolved expression",
            52 => "Function not found",
            53 => "Recursion depth exceeded",
            54 => "Invalid function argument",
            55 => "Duplicate function registration",
            101 => "Cache corruption",
            102 => "Cache persistence failure",
            _ => "Unknown error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TP{:04}", self.code)
    }
}

// Syntax error codes (TP0001-TP0049)
pub const TP0001: ErrorCode = ErrorCode::new(1); // Invalid expression syntax
pub const TP0002: ErrorCode = ErrorCode::new(2); // Malformed JSON literal

// Evaluation error codes (TP0050-TP0099)
pub const TP0051: ErrorCode = ErrorCode::new(51); // Expression resolved to undefined
pub const TP0052: ErrorCode = ErrorCode::new(52); // Unknown function
pub const TP0053: ErrorCode = ErrorCode::new(53); // Recursion depth exceeded
pub const TP0054: ErrorCode = ErrorCode::new(54); // Invalid function argument
pub const TP0055: ErrorCode = ErrorCode::new(55); // Function name already registered

// Cache error codes (TP0100-TP0149)
pub const TP0101: ErrorCode = ErrorCode::new(101); // Checksum mismatch
pub const TP0102: ErrorCode = ErrorCode::new(102); // Persistence I/O failure

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_formatting() {
        assert_eq!(TP0001.to_string(), "TP0001");
        assert_eq!(TP0101.code_str(), "TP0101");
    }

    #[test]
    fn test_categories() {
        assert_eq!(TP0002.category(), ErrorCategory::Syntax);
        assert_eq!(TP0053.category(), ErrorCategory::Evaluation);
        assert_eq!(TP0102.category(), ErrorCategory::Cache);
        assert_eq!(TP0052.title(), "Function not found");
    }
}
