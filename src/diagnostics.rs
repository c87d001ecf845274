//! Diagnostic records shared by all three analysis phases.
//!
//! Each phase reports problems by appending [`Diagnostic`] values to its own
//! list; nothing in the pipeline throws. The per-phase error enums carry the
//! structured detail and render the human-readable message, the flat
//! [`Diagnostic`] record is what callers (and serializers) consume.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// The analysis phase a diagnostic originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Lexical,
    Syntax,
    Semantic,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Lexical => write!(f, "lexical"),
            Phase::Syntax => write!(f, "syntax"),
            Phase::Semantic => write!(f, "semantic"),
        }
    }
}

/// A single reported problem: which phase found it, what it is, and where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub phase: Phase,
    pub message: String,
    pub line: usize,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {} error: {}", self.line, self.phase, self.message)
    }
}

/// Problems detected while scanning source text into tokens.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexicalError {
    #[error("invalid character '{0}'")]
    InvalidCharacter(char),

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("malformed character literal '{0}'")]
    MalformedCharLiteral(String),
}

impl LexicalError {
    pub fn at(self, line: usize) -> Diagnostic {
        Diagnostic {
            phase: Phase::Lexical,
            message: self.to_string(),
            line,
        }
    }
}

/// Problems detected while parsing tokens into an AST.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },

    #[error("unexpected end of input: expected {expected}")]
    UnexpectedEof { expected: String },

    #[error("invalid assignment target")]
    InvalidAssignmentTarget,
}

impl SyntaxError {
    pub fn at(self, line: usize) -> Diagnostic {
        Diagnostic {
            phase: Phase::Syntax,
            message: self.to_string(),
            line,
        }
    }
}

/// Problems detected while walking the AST with the scope stack.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SemanticError {
    #[error("variable '{0}' is already declared in this scope")]
    Redeclaration(String),

    #[error("'{0}' cannot be declared as both a 1D and a 2D array")]
    ArrayDimensionConflict(String),

    #[error("variable '{0}' used before declaration")]
    UndeclaredVariable(String),

    #[error("call to undeclared function '{0}'")]
    UndeclaredFunction(String),

    #[error("type mismatch: expected {expected} value for '{name}', found {found}")]
    TypeMismatch {
        name: String,
        expected: String,
        found: String,
    },

    #[error("struct '{0}' is not defined")]
    UndefinedStruct(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("modulo by zero")]
    ModuloByZero,

    #[error("array '{0}' must be initialized with a brace-enclosed list")]
    MissingBraces(String),

    #[error("2D array '{0}' must be initialized with nested braces")]
    MissingNestedBraces(String),

    #[error("array '{0}' expects {expected} elements, found {found}")]
    ArrayLengthMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("rows of 2D array '{0}' have differing lengths")]
    RaggedRows(String),

    #[error("scalar '{0}' cannot be initialized with a brace list")]
    UnexpectedBraces(String),

    #[error("1D array '{0}' cannot be initialized with nested braces")]
    UnexpectedNestedBraces(String),
}

impl SemanticError {
    pub fn at(self, line: usize) -> Diagnostic {
        Diagnostic {
            phase: Phase::Semantic,
            message: self.to_string(),
            line,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_display() {
        let diag = LexicalError::InvalidCharacter('@').at(3);
        assert_eq!(diag.to_string(), "line 3: lexical error: invalid character '@'");
        assert_eq!(diag.phase, Phase::Lexical);
    }

    #[test]
    fn test_syntax_error_message() {
        let diag = SyntaxError::UnexpectedToken {
            expected: "';'".to_string(),
            found: "'int'".to_string(),
        }
        .at(7);
        assert_eq!(diag.message, "expected ';', found 'int'");
        assert_eq!(diag.line, 7);
    }
}
