//! Syntax Error Types
//!
//! - [`SyntaxError`]：词法 / 语法错误，用户可见
//! - [`TreeError`]：原始语法树形状不合法，属于致命的内部错误

use crate::lexer::Token;
use chumsky::error::{Simple, SimpleReason};
use jmm_diagnostics::{Diagnostic, Span, Stage};
use thiserror::Error;

/// 词法 / 语法错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    /// 无法识别的字符序列
    #[error("unrecognized token '{text}'")]
    UnknownToken { text: String, span: Span },

    /// 语法分析失败
    #[error("{message}")]
    Unexpected { message: String, span: Span },
}

impl SyntaxError {
    pub fn span(&self) -> &Span {
        match self {
            Self::UnknownToken { span, .. } => span,
            Self::Unexpected { span, .. } => span,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.to_string())
            .stage(Stage::Syntactic)
            .span(self.span().clone())
    }
}

impl From<Simple<Token>> for SyntaxError {
    fn from(err: Simple<Token>) -> Self {
        let message = match err.reason() {
            SimpleReason::Custom(msg) => msg.clone(),
            SimpleReason::Unclosed { delimiter, .. } => {
                format!("unclosed delimiter {}", delimiter)
            }
            SimpleReason::Unexpected => {
                let found = err
                    .found()
                    .map_or("end of input".to_string(), |t| t.to_string());
                let mut expected: Vec<String> = err
                    .expected()
                    .map(|e| e.as_ref().map_or("end of input".to_string(), |t| t.to_string()))
                    .collect();
                expected.sort();
                expected.dedup();
                if expected.is_empty() {
                    format!("unexpected {}", found)
                } else {
                    format!("unexpected {}, expected {}", found, expected.join(", "))
                }
            }
        };
        SyntaxError::Unexpected {
            message,
            span: err.span(),
        }
    }
}

/// 原始语法树转换错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("unknown node kind '{0}'")]
    UnknownKind(String),

    #[error("node '{kind}' is missing attribute '{attribute}'")]
    MissingAttribute { kind: String, attribute: String },

    #[error("node '{kind}' is missing child #{index}")]
    MissingChild { kind: String, index: usize },

    #[error("node '{kind}' expected {expected}, found '{found}'")]
    UnexpectedChild {
        kind: String,
        expected: &'static str,
        found: String,
    },

    #[error("unknown {context} operator '{op}'")]
    UnknownOperator { context: &'static str, op: String },

    #[error("invalid {kind} literal '{text}'")]
    InvalidLiteral { kind: &'static str, text: String },
}

impl TreeError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.to_string()).stage(Stage::Syntactic)
    }
}
