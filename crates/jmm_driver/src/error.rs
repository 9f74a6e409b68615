//! Compilation Errors
//!
//! 编译器驱动层的错误类型，集成统一诊断系统

use jmm_diagnostics::{Diagnostic, DiagnosticSink, Emitter, Stage};
use jmm_jasmin::JasminError;
use jmm_ollir::LoweringError;
use jmm_optimizer::OptimizerError;
use jmm_sema::{SemanticError, SymbolTableError};
use jmm_syntax::{SyntaxError, TreeError};
use thiserror::Error;

/// 编译错误
#[derive(Debug, Error)]
pub enum CompileError {
    /// 词法 / 语法错误（可能有多个）
    #[error("Syntax errors:\n{}", format_errors(.0))]
    Syntax(Vec<SyntaxError>),

    /// 原始语法树形状错误
    #[error("Malformed syntax tree: {0}")]
    Tree(#[from] TreeError),

    #[error("Symbol table error: {0}")]
    SymbolTable(#[from] SymbolTableError),

    /// 语义错误（可能有多个）
    #[error("Semantic errors:\n{}", format_errors(.0))]
    SemanticErrors(Vec<SemanticError>),

    #[error("Optimization error: {0}")]
    Optimization(#[from] OptimizerError),

    #[error("OLLIR generation error: {0}")]
    Lowering(#[from] LoweringError),

    #[error("Jasmin generation error: {0}")]
    Jasmin(#[from] JasminError),

    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CompileError {
    /// 转换为诊断列表
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            CompileError::Syntax(errors) => errors.iter().map(SyntaxError::to_diagnostic).collect(),
            CompileError::Tree(err) => vec![err.to_diagnostic()],
            CompileError::SymbolTable(err) => vec![err.to_diagnostic()],
            CompileError::SemanticErrors(errors) => {
                errors.iter().map(SemanticError::to_diagnostic).collect()
            }
            CompileError::Optimization(err) => vec![err.to_diagnostic()],
            CompileError::Lowering(err) => vec![err.to_diagnostic()],
            CompileError::Jasmin(err) => vec![err.to_diagnostic()],
            CompileError::Io(err) => vec![Diagnostic::error(format!("IO error: {}", err))],
        }
    }

    /// 产生错误的阶段，IO 错误没有阶段
    pub fn stage(&self) -> Option<Stage> {
        match self {
            CompileError::Syntax(_) | CompileError::Tree(_) => Some(Stage::Syntactic),
            CompileError::SymbolTable(_) | CompileError::SemanticErrors(_) => Some(Stage::Semantic),
            CompileError::Optimization(_) => Some(Stage::Optimization),
            CompileError::Lowering(_) => Some(Stage::Llir),
            CompileError::Jasmin(_) => Some(Stage::Jasmin),
            CompileError::Io(_) => None,
        }
    }

    /// 转换为诊断列表并收集到 DiagnosticSink
    pub fn collect_to_sink(&self, sink: &mut DiagnosticSink, file_path: Option<&str>) {
        for diag in self.diagnostics() {
            match file_path {
                Some(path) => sink.add(diag.with_file(path)),
                None => sink.add(diag),
            }
        }
    }

    /// 使用统一诊断系统输出错误
    pub fn emit(&self, file_path: Option<&str>, source: Option<&str>) {
        let mut sink = DiagnosticSink::new();
        self.collect_to_sink(&mut sink, file_path);

        let emitter = Emitter::new();
        if let Some(src) = source {
            for diag in sink.diagnostics() {
                emitter.emit_with_source(diag, src);
            }
        } else {
            emitter.emit_all(sink.diagnostics());
        }
    }
}

/// 格式化错误列表
fn format_errors<E: std::fmt::Display>(errors: &[E]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, e)| format!("  {}. {}", i + 1, e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// 编译结果类型
pub type CompileResult<T> = Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;
    use jmm_diagnostics::Position;

    #[test]
    fn test_semantic_errors_are_numbered() {
        let err = CompileError::SemanticErrors(vec![
            SemanticError::UndeclaredVariable {
                name: "x".into(),
                pos: Position::new(2, 5),
            },
            SemanticError::MainNotStatic {
                pos: Position::new(1, 1),
            },
        ]);
        let text = err.to_string();
        assert!(text.starts_with("Semantic errors:\n  1. "));
        assert!(text.contains("\n  2. "));
    }

    #[test]
    fn test_collect_to_sink_attaches_file() {
        let err = CompileError::SymbolTable(SymbolTableError::MissingClass);
        let mut sink = DiagnosticSink::new();
        err.collect_to_sink(&mut sink, Some("A.jmm"));
        assert_eq!(sink.error_count(), 1);
        assert_eq!(sink.diagnostics()[0].file.as_deref(), Some("A.jmm"));
        assert_eq!(sink.diagnostics()[0].stage, Some(Stage::Semantic));
        assert_eq!(err.stage(), Some(Stage::Semantic));
    }
}
