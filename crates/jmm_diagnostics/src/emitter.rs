//! Emitter - 诊断输出器
//!
//! 无源码时输出简洁的文本格式；有源码时借助 ariadne 渲染带源码片段的报告。

use crate::diagnostic::Diagnostic;
use crate::span::{LineIndex, Span};
use ariadne::{Color, Label, Report, Source};
use colored::*;

/// 诊断输出器
pub struct Emitter {
    use_colors: bool,
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Emitter {
    pub fn new() -> Self {
        Self { use_colors: true }
    }

    pub fn without_colors() -> Self {
        Self { use_colors: false }
    }

    /// 输出单个诊断到 stderr
    pub fn emit(&self, diagnostic: &Diagnostic) {
        eprint!("{}", self.render(diagnostic));
    }

    /// 输出所有诊断
    pub fn emit_all(&self, diagnostics: &[Diagnostic]) {
        for diagnostic in diagnostics {
            self.emit(diagnostic);
            eprintln!();
        }
    }

    /// 带源码片段输出；诊断没有可定位的位置时退回普通输出
    pub fn emit_with_source(&self, diagnostic: &Diagnostic, source: &str) {
        let Some(span) = self.locate(diagnostic, source) else {
            self.emit(diagnostic);
            return;
        };

        let color = if diagnostic.level.is_error() {
            Color::Red
        } else {
            Color::Yellow
        };
        let mut label = Label::new(span.clone()).with_message(&diagnostic.message);
        if self.use_colors {
            label = label.with_color(color);
        }

        let mut report = Report::build(diagnostic.level.report_kind(), (), span.start)
            .with_config(ariadne::Config::default().with_color(self.use_colors))
            .with_message(&diagnostic.message)
            .with_label(label);
        for note in &diagnostic.notes {
            report = report.with_note(note);
        }
        if let Some(suggestion) = diagnostic.suggestions.first() {
            report = report.with_help(&suggestion.message);
        }

        if report.finish().eprint(Source::from(source)).is_err() {
            // stderr 不可写时只能退回纯文本
            self.emit(diagnostic);
        }
    }

    /// 渲染为文本
    pub fn render(&self, diagnostic: &Diagnostic) -> String {
        let mut out = String::new();

        let stage = diagnostic
            .stage
            .map(|s| format!("[{}]", s))
            .unwrap_or_default();
        if self.use_colors {
            out.push_str(&format!(
                "{}{}: {}\n",
                diagnostic.level.colored_name(),
                stage.bright_black(),
                diagnostic.message.bold()
            ));
        } else {
            out.push_str(&format!(
                "{}{}: {}\n",
                diagnostic.level, stage, diagnostic.message
            ));
        }

        let location = match (&diagnostic.file, diagnostic.position) {
            (Some(file), Some(pos)) => Some(format!("{}:{}", file, pos)),
            (Some(file), None) => Some(file.clone()),
            (None, Some(pos)) => Some(pos.to_string()),
            (None, None) => diagnostic.span.as_ref().map(|s| format!("{:?}", s)),
        };
        if let Some(location) = location {
            let arrow = if self.use_colors {
                "-->".blue().bold().to_string()
            } else {
                "-->".to_string()
            };
            out.push_str(&format!("  {} {}\n", arrow, location));
        }

        for note in &diagnostic.notes {
            out.push_str(&format!("  = note: {}\n", note));
        }
        for suggestion in &diagnostic.suggestions {
            out.push_str(&format!("  = help: {}\n", suggestion.message));
            if let Some(replacement) = &suggestion.replacement {
                out.push_str(&format!("        try: {}\n", replacement));
            }
        }
        out
    }

    fn locate(&self, diagnostic: &Diagnostic, source: &str) -> Option<Span> {
        if let Some(span) = &diagnostic.span {
            return Some(span.clone());
        }
        let offset = LineIndex::new(source).offset(diagnostic.position?)?;
        // 标出到词尾为止
        let end = source
            .get(offset..)?
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .map_or(source.len(), |n| offset + n.max(1));
        Some(offset..end.min(source.len()))
    }
}
