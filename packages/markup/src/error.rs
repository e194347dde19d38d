use thiserror::Error;

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unclosed element <{tag}> opened on line {line}")]
    UnclosedElement { line: u64, tag: String },

    #[error("Mismatched closing tag on line {line}: expected </{expected}>, found </{found}>")]
    MismatchedClose {
        line: u64,
        expected: String,
        found: String,
    },

    #[error("Closing tag </{tag}> on line {line} has no matching open element")]
    StrayClose { line: u64, tag: String },

    #[error("Invalid syntax on line {line}: {message}")]
    InvalidSyntax { line: u64, message: String },
}

impl ParseError {
    pub fn unclosed(line: u64, tag: impl Into<String>) -> Self {
        Self::UnclosedElement {
            line,
            tag: tag.into(),
        }
    }

    pub fn mismatched(line: u64, expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::MismatchedClose {
            line,
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn stray(line: u64, tag: impl Into<String>) -> Self {
        Self::StrayClose {
            line,
            tag: tag.into(),
        }
    }

    pub fn invalid_syntax(line: u64, message: impl Into<String>) -> Self {
        Self::InvalidSyntax {
            line,
            message: message.into(),
        }
    }

    /// 1-based source line the error points at
    pub fn line(&self) -> u64 {
        match self {
            Self::UnclosedElement { line, .. }
            | Self::MismatchedClose { line, .. }
            | Self::StrayClose { line, .. }
            | Self::InvalidSyntax { line, .. } => *line,
        }
    }
}
