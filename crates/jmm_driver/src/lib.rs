//! Jmm Compiler Driver
//!
//! 编译器驱动模块，串联所有编译阶段：
//!
//! ```text
//! 源码 -> RawNode -> Ast -> SymbolTable -> analyze -> [optimize] -> OLLIR -> Jasmin
//! ```

pub mod error;

pub use error::{CompileError, CompileResult};

use jmm_diagnostics::{Diagnostic, DiagnosticLevel, DiagnosticSink, Stage};
use jmm_jasmin::EmitOptions;
use jmm_sema::{analyze, SymbolTable};
use jmm_syntax::{Ast, BinaryOp, NodeKind, RawNode};
use std::path::Path;

/// 编译选项
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompilerConfig {
    /// 执行常量传播与折叠
    pub optimize: bool,
    /// 语义分析报错后仍然继续生成
    pub best_effort: bool,
    /// 每个方法可用的局部变量寄存器上限
    pub register_allocation: Option<u16>,
}

/// 编译结果
#[derive(Debug)]
pub struct CompilationOutput {
    /// OLLIR 文本
    pub ollir: String,
    /// Jasmin 汇编文本
    pub jasmin: String,
    /// 警告信息
    pub warnings: Vec<Diagnostic>,
}

/// 解析源代码
fn parse_source(source: &str) -> CompileResult<RawNode> {
    jmm_syntax::parse(source).map_err(CompileError::Syntax)
}

/// 编译 Java-- 源代码
///
/// # Example
/// ```no_run
/// use jmm_driver::{compile, CompilerConfig};
///
/// let source = "class A { public int f() { return 1 + 2; } }";
/// let output = compile(source, &CompilerConfig::default()).unwrap();
/// println!("{}", output.jasmin);
/// ```
pub fn compile(source: &str, config: &CompilerConfig) -> CompileResult<CompilationOutput> {
    let raw = parse_source(source)?;
    compile_tree(&raw, config)
}

/// 从原始语法树开始编译
pub fn compile_tree(raw: &RawNode, config: &CompilerConfig) -> CompileResult<CompilationOutput> {
    let mut ast = Ast::from_raw(raw)?;
    let table = SymbolTable::build(&ast)?;
    let mut warnings = Vec::new();

    if let Err(errors) = analyze(&ast, &table) {
        if !config.best_effort {
            return Err(CompileError::SemanticErrors(errors));
        }
        log::warn!(
            "continuing past {} semantic error(s) in best-effort mode",
            errors.len()
        );
        warnings.extend(errors.iter().map(|e| {
            let mut diag = e.to_diagnostic();
            diag.level = DiagnosticLevel::Warning;
            diag
        }));
    }

    if config.optimize {
        let stats = jmm_optimizer::optimize(&mut ast, &table)?;
        log::debug!(
            "optimized in {} rounds: {} propagated, {} folded",
            stats.rounds,
            stats.propagated,
            stats.folded
        );
    }
    warnings.extend(division_by_zero(&ast));

    let unit = jmm_ollir::lower(&ast, &table)?;
    let ollir = unit.to_string();
    let options = EmitOptions {
        register_limit: config.register_allocation,
    };
    let jasmin = jmm_jasmin::emit_with(&unit, &options)?;

    Ok(CompilationOutput {
        ollir,
        jasmin,
        warnings,
    })
}

/// 从文件编译
pub fn compile_file(path: impl AsRef<Path>, config: &CompilerConfig) -> CompileResult<CompilationOutput> {
    let source = std::fs::read_to_string(path)?;
    compile(&source, config)
}

/// 只做检查，收集所有诊断而不生成代码
pub fn check(source: &str) -> DiagnosticSink {
    let mut sink = DiagnosticSink::new();
    let result = parse_source(source).and_then(|raw| {
        let ast = Ast::from_raw(&raw)?;
        let table = SymbolTable::build(&ast)?;
        Ok((ast, table))
    });
    match result {
        Ok((ast, table)) => {
            if let Err(errors) = analyze(&ast, &table) {
                sink.extend(errors.iter().map(|e| e.to_diagnostic()));
            }
            sink.extend(division_by_zero(&ast));
        }
        Err(err) => err.collect_to_sink(&mut sink, None),
    }
    sink.sort_by_position();
    log::debug!(
        "check finished: {} error(s), {} warning(s)",
        sink.error_count(),
        sink.warning_count()
    );
    sink
}

/// 除以字面量 0 不会被折叠，运行时会抛出异常
fn division_by_zero(ast: &Ast) -> Vec<Diagnostic> {
    ast.descendants(ast.root())
        .filter(|&id| match ast.kind(id) {
            NodeKind::BinaryExpr {
                op: BinaryOp::Div,
                rhs,
                ..
            } => matches!(ast.kind(*rhs), NodeKind::IntegerLiteral { value: 0 }),
            _ => false,
        })
        .map(|id| {
            Diagnostic::warning("division by zero")
                .stage(Stage::Optimization)
                .at(ast.pos(id))
                .with_note("this expression throws ArithmeticException at run time")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_simple_return() {
        let source = "class A { public int f() { return 42; } }";
        let result = compile(source, &CompilerConfig::default());
        assert!(result.is_ok(), "Compilation failed: {:?}", result.err());

        let output = result.unwrap();
        assert!(output.ollir.contains("ret.i32 42.i32;"));
        assert!(output.jasmin.contains("bipush 42\n    ireturn"));
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn test_syntax_errors_are_reported() {
        let err = compile("class A { int f( }", &CompilerConfig::default()).unwrap_err();
        assert!(matches!(err, CompileError::Syntax(ref errors) if !errors.is_empty()));
        assert_eq!(err.stage(), Some(Stage::Syntactic));
    }

    #[test]
    fn test_semantic_errors_stop_generation() {
        let source = "class A { public int f() { return x; } }";
        match compile(source, &CompilerConfig::default()).unwrap_err() {
            CompileError::SemanticErrors(errors) => {
                assert!(errors[0].to_string().contains("x"));
            }
            other => panic!("Expected SemanticErrors, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_return_stops_generation() {
        let source = "class A { public int f(boolean b) { if (b) return 1; } }";
        match compile(source, &CompilerConfig::default()).unwrap_err() {
            CompileError::SemanticErrors(errors) => {
                assert_eq!(errors.len(), 1);
                assert!(matches!(
                    &errors[0],
                    jmm_sema::SemanticError::MissingReturn { method, .. } if method == "f"
                ));
            }
            other => panic!("Expected SemanticErrors, got {:?}", other),
        }
    }

    #[test]
    fn test_best_effort_downgrades_to_warnings() {
        // 条件不是布尔值，但仍然可以生成代码
        let source = "class A { public int f(int a) { if (a) a = 1; return a; } }";
        let config = CompilerConfig {
            best_effort: true,
            ..CompilerConfig::default()
        };
        let output = compile(source, &config).unwrap();
        assert_eq!(output.warnings.len(), 1);
        assert_eq!(output.warnings[0].level, DiagnosticLevel::Warning);
        assert!(output.jasmin.contains("ifne if_then_0"));
    }

    #[test]
    fn test_best_effort_never_panics_on_unresolved_names() {
        let source = "class A { public int f() { return y; } }";
        let config = CompilerConfig {
            best_effort: true,
            ..CompilerConfig::default()
        };
        assert!(matches!(
            compile(source, &config),
            Err(CompileError::Lowering(_))
        ));
    }

    #[test]
    fn test_check_collects_everything() {
        let sink = check("class A { public int f(boolean b) { int x; x = b + 1; return y / 0; } }");
        assert!(sink.error_count() >= 2);
        assert_eq!(sink.warning_count(), 1);
        assert_eq!(sink.by_stage(Stage::Optimization).count(), 1);
    }

    #[test]
    fn test_check_clean_program() {
        let sink = check("import io; class A { public static void main(String[] args) { io.println(1); } }");
        assert!(sink.is_empty());
    }
}
