//! Jmm Semantic Analysis
//!
//! 语义分析模块，负责：
//! - 符号表构建 (SymbolTable::build)
//! - 表达式类型解析 (TypeResolver)
//! - 四个独立的检查 pass：重复声明、结构规则、类型检查、名称解析
//!
//! 所有 pass 都会运行，错误作为数据汇总返回，不会因第一个错误中断。

pub mod compat;
pub mod error;
pub mod passes;
pub mod resolver;
pub mod symbol;
pub mod table;
pub mod types;

pub use compat::TypeCompat;
pub use error::{SemanticError, SymbolTableError};
pub use passes::{DuplicateChecker, ResolutionChecker, StructureChecker, TypeChecker};
pub use resolver::{MethodContext, TypeResolver, VarBinding};
pub use symbol::Symbol;
pub use table::{import_simple_name, SymbolTable};
pub use types::Type;

use jmm_syntax::Ast;

pub type SemanticResult<T> = Result<T, Vec<SemanticError>>;

/// 分析整个程序
///
/// 依次执行：
/// 1. **DuplicateChecker**: 重复声明
/// 2. **StructureChecker**: 可变参数、静态规则、类名
/// 3. **TypeChecker**: 类型检查
/// 4. **ResolutionChecker**: 变量与方法调用解析
///
/// # Errors
///
/// 返回所有 pass 收集到的语义错误
pub fn analyze(ast: &Ast, table: &SymbolTable) -> SemanticResult<()> {
    let mut all_errors: Vec<SemanticError> = Vec::new();

    if let Err(errors) = DuplicateChecker::new(ast, table).check() {
        all_errors.extend(errors);
    }
    if let Err(errors) = StructureChecker::new(ast, table).check() {
        all_errors.extend(errors);
    }
    if let Err(errors) = TypeChecker::new(ast, table).check() {
        all_errors.extend(errors);
    }
    if let Err(errors) = ResolutionChecker::new(ast, table).check() {
        all_errors.extend(errors);
    }

    log::debug!(
        "semantic analysis of '{}' finished with {} error(s)",
        table.class_name(),
        all_errors.len()
    );

    if all_errors.is_empty() {
        Ok(())
    } else {
        Err(all_errors)
    }
}
