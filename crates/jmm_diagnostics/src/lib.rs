//! Jmm Diagnostics
//!
//! 统一的诊断系统，为 Java-- 编译器的各个阶段提供清晰的错误报告。
//!
//! # 核心类型
//!
//! - [`Diagnostic`] - 诊断信息主体
//! - [`DiagnosticLevel`] - 诊断级别（Error/Warning/Info/Note）
//! - [`Stage`] - 产生诊断的编译阶段
//! - [`DiagnosticSink`] - 诊断收集器
//! - [`Emitter`] - 诊断输出器
//! - [`Span`] / [`Position`] - 源码位置信息
//!
//! # 示例
//!
//! ```rust
//! use jmm_diagnostics::{Diagnostic, DiagnosticSink, Emitter, Position, Stage};
//!
//! let mut sink = DiagnosticSink::new();
//!
//! sink.add(
//!     Diagnostic::error("Variable x not declared")
//!         .stage(Stage::Semantic)
//!         .at(Position::new(3, 9))
//!         .suggest("declare 'x' before using it"),
//! );
//!
//! if sink.has_errors() {
//!     let emitter = Emitter::without_colors();
//!     emitter.emit_all(sink.diagnostics());
//! }
//! ```

pub mod diagnostic;
pub mod emitter;
pub mod level;
pub mod sink;
pub mod span;
pub mod stage;

// 重新导出核心类型
pub use diagnostic::{Diagnostic, Suggestion};
pub use emitter::Emitter;
pub use level::DiagnosticLevel;
pub use sink::DiagnosticSink;
pub use span::{LineIndex, Position, Span, SpanExt};
pub use stage::Stage;
