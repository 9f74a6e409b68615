//! 重复声明检查：方法、字段、参数、局部变量和导入

use super::{finish, walk};
use crate::error::SemanticError;
use crate::table::{import_simple_name, SymbolTable};
use jmm_diagnostics::Position;
use jmm_syntax::{Ast, NodeId, NodeKind};
use std::collections::HashSet;

pub struct DuplicateChecker<'a> {
    ast: &'a Ast,
    table: &'a SymbolTable,
}

impl<'a> DuplicateChecker<'a> {
    pub fn new(ast: &'a Ast, table: &'a SymbolTable) -> Self {
        Self { ast, table }
    }

    pub fn check(&self) -> Result<(), Vec<SemanticError>> {
        let ast = self.ast;
        let mut errors = Vec::new();
        let mut imports = HashSet::new();

        walk(ast, self.table, |id, kind, _| match kind {
            NodeKind::ImportDecl { path } => {
                let name = import_simple_name(path);
                if !imports.insert(name.to_string()) {
                    errors.push(SemanticError::DuplicateImport {
                        name: name.to_string(),
                        pos: ast.pos(id),
                    });
                }
            }
            NodeKind::ClassDecl {
                fields, methods, ..
            } => {
                for (name, pos) in duplicates(ast, fields) {
                    errors.push(SemanticError::DuplicateField { name, pos });
                }
                for (name, pos) in duplicates(ast, methods) {
                    errors.push(SemanticError::DuplicateMethod { name, pos });
                }
            }
            NodeKind::MethodDecl { params, locals, .. } => {
                for (name, pos) in duplicates(ast, params) {
                    errors.push(SemanticError::DuplicateParameter { name, pos });
                }
                for (name, pos) in duplicates(ast, locals) {
                    errors.push(SemanticError::DuplicateLocal { name, pos });
                }
            }
            NodeKind::Program { .. }
            | NodeKind::VarDecl { .. }
            | NodeKind::Param { .. }
            | NodeKind::AssignStmt { .. }
            | NodeKind::ArrayAssignStmt { .. }
            | NodeKind::ReturnStmt { .. }
            | NodeKind::IfStmt { .. }
            | NodeKind::WhileStmt { .. }
            | NodeKind::BlockStmt { .. }
            | NodeKind::ExprStmt { .. }
            | NodeKind::BinaryExpr { .. }
            | NodeKind::UnaryExpr { .. }
            | NodeKind::VarRef { .. }
            | NodeKind::IntegerLiteral { .. }
            | NodeKind::BooleanLiteral { .. }
            | NodeKind::ThisExpr
            | NodeKind::NewObjectExpr { .. }
            | NodeKind::NewArrayExpr { .. }
            | NodeKind::ArrayCreationExpr { .. }
            | NodeKind::ArrayAccessExpr { .. }
            | NodeKind::ArrayLengthExpr { .. }
            | NodeKind::MethodCallExpr { .. }
            | NodeKind::ParenthesisExpr { .. } => {}
        });

        finish(errors)
    }
}

/// 第二次及以后出现的声明名及其位置
fn duplicates(ast: &Ast, decls: &[NodeId]) -> Vec<(String, Position)> {
    let mut seen = HashSet::new();
    decls
        .iter()
        .filter_map(|id| Some((ast.kind(*id).declared_name()?, ast.pos(*id))))
        .filter(|(name, _)| !seen.insert(*name))
        .map(|(name, pos)| (name.to_string(), pos))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use jmm_syntax::parse_ast;

    fn check(src: &str) -> Vec<SemanticError> {
        let ast = parse_ast(src).unwrap();
        let table = SymbolTable::build(&ast).unwrap();
        DuplicateChecker::new(&ast, &table).check().err().unwrap_or_default()
    }

    #[test]
    fn test_clean_program() {
        assert!(check("import io; class A { int x; int f(int a) { int b; return a; } }").is_empty());
    }

    #[test]
    fn test_every_duplicate_kind() {
        let errors = check(
            r#"
import a.List;
import b.List;
class A {
    int x;
    boolean x;
    int f(int p, int p) { int l; int l; return 0; }
    int f() { return 1; }
}
"#,
        );
        let messages: Vec<_> = errors.iter().map(|e| e.to_string()).collect();
        assert_eq!(
            messages,
            vec![
                "Import List is duplicated",
                "Field x is duplicated",
                "Method f is duplicated",
                "Parameter p is duplicated",
                "Local Variable l is duplicated",
            ]
        );
    }

    #[test]
    fn test_reports_second_occurrence() {
        let errors = check("class A {\n int x;\n int x;\n}");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].pos().line, 3);
    }
}
