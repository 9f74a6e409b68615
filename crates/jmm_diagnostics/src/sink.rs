//! DiagnosticSink - 诊断收集器
//!
//! 收集编译过程中的所有诊断。诊断是数据而不是异常，
//! 驱动层通过 `has_errors` 决定是否继续后续阶段。

use crate::diagnostic::Diagnostic;
use crate::level::DiagnosticLevel;
use crate::stage::Stage;

#[derive(Debug, Default)]
pub struct DiagnosticSink {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(diagnostics);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    fn count(&self, level: DiagnosticLevel) -> usize {
        self.diagnostics.iter().filter(|d| d.level == level).count()
    }

    pub fn error_count(&self) -> usize {
        self.count(DiagnosticLevel::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(DiagnosticLevel::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.level.is_error())
    }

    /// 某一阶段产生的诊断
    pub fn by_stage(&self, stage: Stage) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(move |d| d.stage == Some(stage))
    }

    /// 第一个报错的阶段；只有警告时为 `None`
    pub fn failed_stage(&self) -> Option<Stage> {
        self.diagnostics
            .iter()
            .find(|d| d.level.is_error())
            .and_then(|d| d.stage)
    }

    /// 按源码位置排序，没有位置的排在最后
    pub fn sort_by_position(&mut self) {
        self.diagnostics
            .sort_by_key(|d| d.position.map_or((u32::MAX, u32::MAX), |p| (p.line, p.column)));
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}
