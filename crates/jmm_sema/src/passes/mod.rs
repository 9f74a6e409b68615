//! Semantic Passes
//!
//! 四个互相独立的检查，每个都遍历整棵树并对 [`NodeKind`] 做穷尽匹配。
//! 错误作为数据收集，检查不会因为某个错误提前结束。

mod duplicates;
mod resolution;
mod structure;
mod type_check;

pub use duplicates::DuplicateChecker;
pub use resolution::ResolutionChecker;
pub use structure::StructureChecker;
pub use type_check::TypeChecker;

use crate::resolver::{MethodContext, TypeResolver};
use crate::table::SymbolTable;
use jmm_syntax::{Ast, NodeId, NodeKind};

/// 先序遍历整棵树，同时维护当前方法的解析器
///
/// 类声明中字段排在方法之前，所以访问字段时解析器为 `None`。
pub(crate) fn walk<'a>(
    ast: &'a Ast,
    table: &'a SymbolTable,
    mut visit: impl FnMut(NodeId, &NodeKind, Option<&TypeResolver<'a>>),
) {
    let mut resolver: Option<TypeResolver<'a>> = None;
    for id in ast.descendants(ast.root()) {
        if let Some(ctx) = MethodContext::of(ast, id) {
            resolver = Some(TypeResolver::new(ast, table, ctx));
        }
        visit(id, ast.kind(id), resolver.as_ref());
    }
}

/// 报错时用来指代表达式的名字
pub(crate) fn describe(ast: &Ast, id: NodeId) -> String {
    match ast.kind(id) {
        NodeKind::VarRef { name } => name.clone(),
        NodeKind::ParenthesisExpr { inner } => describe(ast, *inner),
        other => other.name().to_string(),
    }
}

pub(crate) fn finish<E>(errors: Vec<E>) -> Result<(), Vec<E>> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
