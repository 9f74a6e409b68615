//! Diagnostic - 诊断信息
//!
//! 一条诊断对应 `{stage, level, line, column, message}`，
//! 另外可以携带字节区间、补充注释和修复建议。

use crate::level::DiagnosticLevel;
use crate::span::{Position, Span};
use crate::stage::Stage;
use std::fmt;

/// 修复建议
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub message: String,
    /// 建议的替换内容（如果有）
    pub replacement: Option<String>,
}

impl Suggestion {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            replacement: None,
        }
    }

    pub fn with_replacement(mut self, replacement: impl Into<String>) -> Self {
        self.replacement = Some(replacement.into());
        self
    }
}

/// 诊断信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    /// 产生该诊断的阶段
    pub stage: Option<Stage>,
    pub message: String,
    /// 字节区间（语法阶段才有）
    pub span: Option<Span>,
    /// 行列位置（语法树节点上记录的位置）
    pub position: Option<Position>,
    /// 源文件路径
    pub file: Option<String>,
    pub notes: Vec<String>,
    pub suggestions: Vec<Suggestion>,
}

impl Diagnostic {
    pub fn new(level: DiagnosticLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            stage: None,
            message: message.into(),
            span: None,
            position: None,
            file: None,
            notes: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Warning, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Info, message)
    }

    pub fn note(message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Note, message)
    }

    pub fn stage(mut self, stage: Stage) -> Self {
        self.stage = Some(stage);
        self
    }

    pub fn span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// 设置行列位置，未知位置 `(0, 0)` 会被忽略
    pub fn at(mut self, position: Position) -> Self {
        if position.is_known() {
            self.position = Some(position);
        }
        self
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: Suggestion) -> Self {
        self.suggestions.push(suggestion);
        self
    }

    /// 添加简单建议（仅消息）
    pub fn suggest(self, message: impl Into<String>) -> Self {
        self.with_suggestion(Suggestion::new(message))
    }

    /// 所在行，未知时为 0
    pub fn line(&self) -> u32 {
        self.position.map_or(0, |p| p.line)
    }

    /// 所在列，未知时为 0
    pub fn column(&self) -> u32 {
        self.position.map_or(0, |p| p.column)
    }
}

/// 单行摘要，形如 `error[semantic] 3:9: Variable x not declared`
impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.level)?;
        if let Some(stage) = self.stage {
            write!(f, "[{}]", stage)?;
        }
        if let Some(position) = self.position {
            write!(f, " {}", position)?;
        }
        write!(f, ": {}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_builder() {
        let diag = Diagnostic::error("Field x is duplicated")
            .stage(Stage::Semantic)
            .at(Position::new(4, 5))
            .with_note("first declared at 2:5")
            .suggest("rename one of the fields");

        assert_eq!(diag.level, DiagnosticLevel::Error);
        assert_eq!(diag.stage, Some(Stage::Semantic));
        assert_eq!((diag.line(), diag.column()), (4, 5));
        assert_eq!(diag.notes.len(), 1);
        assert_eq!(diag.suggestions[0].message, "rename one of the fields");
    }

    #[test]
    fn test_unknown_position_is_dropped() {
        let diag = Diagnostic::warning("w").at(Position::default());
        assert!(diag.position.is_none());
        assert_eq!(diag.line(), 0);
    }

    #[test]
    fn test_display_summary() {
        let diag = Diagnostic::error("Variable x not declared")
            .stage(Stage::Semantic)
            .at(Position::new(3, 9));
        assert_eq!(
            diag.to_string(),
            "error[semantic] 3:9: Variable x not declared"
        );

        let bare = Diagnostic::note("plain");
        assert_eq!(bare.to_string(), "note: plain");
    }
}
