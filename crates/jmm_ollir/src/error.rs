//! Lowering Error Types
//!
//! IR 生成只在通过语义分析的语法树上保证成功；
//! best-effort 模式下遇到无法生成的结构时返回这些错误，而不是 panic。

use jmm_diagnostics::{Diagnostic, Position, Stage};
use jmm_sema::SymbolTableError;
use thiserror::Error;

/// IR 生成错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoweringError {
    #[error("cannot lower unresolved variable '{name}' in method '{method}'")]
    UnresolvedVariable {
        name: String,
        method: String,
        pos: Position,
    },

    #[error("cannot assign to '{name}'")]
    InvalidAssignTarget { name: String, pos: Position },

    #[error("call to void method '{method}' used as a value")]
    VoidValue { method: String, pos: Position },

    #[error("cannot determine the type of {construct}")]
    UnknownType { construct: String, pos: Position },

    #[error("expected {expected}, found {found}")]
    UnexpectedNode {
        expected: &'static str,
        found: &'static str,
    },

    #[error(transparent)]
    SymbolTable(#[from] SymbolTableError),
}

impl LoweringError {
    pub fn pos(&self) -> Option<Position> {
        match self {
            Self::UnresolvedVariable { pos, .. }
            | Self::InvalidAssignTarget { pos, .. }
            | Self::VoidValue { pos, .. }
            | Self::UnknownType { pos, .. } => Some(*pos),
            Self::UnexpectedNode { .. } | Self::SymbolTable(_) => None,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string()).stage(Stage::Llir);
        match self.pos() {
            Some(pos) => diag.at(pos),
            None => diag,
        }
    }
}

/// IR 生成结果类型
pub type LoweringResult<T> = Result<T, LoweringError>;
