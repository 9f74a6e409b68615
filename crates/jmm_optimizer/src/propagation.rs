//! Constant Propagation
//!
//! 按语句顺序记录"变量 -> 常量"，把读到的已知变量原地替换成字面量。
//! 只跟踪参数和局部变量，字段可能被其他方法修改，从不跟踪。
//!
//! 控制流处理是保守的：
//! - `while` 体内赋值过的变量在条件之前就失效，循环结束后仍然失效
//! - `if` 的两个分支各自在副本上分析，汇合时取交集

use crate::constant::ConstValue;
use jmm_sema::{MethodContext, SymbolTable, TypeResolver};
use jmm_syntax::{Ast, NodeId, NodeKind};
use std::collections::{HashMap, HashSet};

type Env = HashMap<String, ConstValue>;

pub struct ConstantPropagation<'a> {
    table: &'a SymbolTable,
    replaced: usize,
}

impl<'a> ConstantPropagation<'a> {
    pub fn new(table: &'a SymbolTable) -> Self {
        Self { table, replaced: 0 }
    }

    /// 累计替换的变量读取次数
    pub fn replaced(&self) -> usize {
        self.replaced
    }

    /// 执行一遍传播，返回是否修改了语法树
    pub fn run(&mut self, ast: &mut Ast) -> bool {
        let mut changed = false;
        for method in ast.methods() {
            let Some(ctx) = MethodContext::of(ast, method) else {
                continue;
            };
            let tracked = self.tracked_names(ast, ctx);
            let NodeKind::MethodDecl { body, .. } = ast.kind(method) else {
                continue;
            };
            let body = body.clone();

            let mut env = Env::new();
            for stmt in body {
                changed |= self.stmt(ast, stmt, &mut env, &tracked);
            }
        }
        changed
    }

    /// 在该方法中解析为参数或局部变量的名字
    fn tracked_names(&self, ast: &Ast, ctx: MethodContext) -> HashSet<String> {
        let name = ctx.name.clone();
        let resolver = TypeResolver::new(ast, self.table, ctx);
        let params = self.table.try_parameters(&name).unwrap_or_default();
        let locals = self.table.try_local_variables(&name).unwrap_or_default();
        params
            .iter()
            .chain(locals)
            .filter(|s| {
                resolver
                    .lookup_variable(&s.name)
                    .is_some_and(|b| b.is_method_variable())
            })
            .map(|s| s.name.clone())
            .collect()
    }

    fn stmt(&mut self, ast: &mut Ast, id: NodeId, env: &mut Env, tracked: &HashSet<String>) -> bool {
        match ast.kind(id).clone() {
            NodeKind::AssignStmt { target, value } => {
                let changed = self.expr(ast, value, env);
                if tracked.contains(&target) {
                    match ConstValue::of(ast.kind(value)) {
                        Some(constant) => {
                            env.insert(target, constant);
                        }
                        None => {
                            env.remove(&target);
                        }
                    }
                }
                changed
            }
            NodeKind::ArrayAssignStmt { index, value, .. } => {
                let index_changed = self.expr(ast, index, env);
                self.expr(ast, value, env) || index_changed
            }
            NodeKind::ReturnStmt { value } => value.is_some_and(|v| self.expr(ast, v, env)),
            NodeKind::ExprStmt { expr } => self.expr(ast, expr, env),
            NodeKind::BlockStmt { stmts } => {
                let mut changed = false;
                for stmt in stmts {
                    changed |= self.stmt(ast, stmt, env, tracked);
                }
                changed
            }
            NodeKind::IfStmt {
                condition,
                then_branch,
                else_branch,
            } => {
                let mut changed = self.expr(ast, condition, env);
                let mut then_env = env.clone();
                changed |= self.stmt(ast, then_branch, &mut then_env, tracked);
                let mut else_env = env.clone();
                if let Some(else_branch) = else_branch {
                    changed |= self.stmt(ast, else_branch, &mut else_env, tracked);
                }
                then_env.retain(|name, value| else_env.get(name) == Some(value));
                *env = then_env;
                changed
            }
            NodeKind::WhileStmt { condition, body } => {
                for name in assigned_names(ast, body) {
                    env.remove(&name);
                }
                let mut changed = self.expr(ast, condition, env);
                let mut body_env = env.clone();
                changed |= self.stmt(ast, body, &mut body_env, tracked);
                changed
            }
            NodeKind::Program { .. }
            | NodeKind::ImportDecl { .. }
            | NodeKind::ClassDecl { .. }
            | NodeKind::VarDecl { .. }
            | NodeKind::MethodDecl { .. }
            | NodeKind::Param { .. }
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
            | NodeKind::ParenthesisExpr { .. } => false,
        }
    }

    fn expr(&mut self, ast: &mut Ast, id: NodeId, env: &Env) -> bool {
        match ast.kind(id) {
            NodeKind::VarRef { name } => match env.get(name) {
                Some(constant) => {
                    log::trace!("propagating {} = {} into {}", name, constant, id);
                    ast.replace(id, constant.to_node());
                    self.replaced += 1;
                    true
                }
                None => false,
            },
            NodeKind::BinaryExpr { .. }
            | NodeKind::UnaryExpr { .. }
            | NodeKind::NewArrayExpr { .. }
            | NodeKind::ArrayCreationExpr { .. }
            | NodeKind::ArrayAccessExpr { .. }
            | NodeKind::ArrayLengthExpr { .. }
            | NodeKind::MethodCallExpr { .. }
            | NodeKind::ParenthesisExpr { .. } => {
                let mut changed = false;
                for child in ast.children(id) {
                    changed |= self.expr(ast, child, env);
                }
                changed
            }
            NodeKind::IntegerLiteral { .. }
            | NodeKind::BooleanLiteral { .. }
            | NodeKind::ThisExpr
            | NodeKind::NewObjectExpr { .. }
            | NodeKind::Program { .. }
            | NodeKind::ImportDecl { .. }
            | NodeKind::ClassDecl { .. }
            | NodeKind::VarDecl { .. }
            | NodeKind::MethodDecl { .. }
            | NodeKind::Param { .. }
            | NodeKind::AssignStmt { .. }
            | NodeKind::ArrayAssignStmt { .. }
            | NodeKind::ReturnStmt { .. }
            | NodeKind::IfStmt { .. }
            | NodeKind::WhileStmt { .. }
            | NodeKind::BlockStmt { .. }
            | NodeKind::ExprStmt { .. } => false,
        }
    }
}

/// 语句（含嵌套语句）中被整体赋值的变量名
fn assigned_names(ast: &Ast, stmt: NodeId) -> HashSet<String> {
    ast.descendants(stmt)
        .filter_map(|id| match ast.kind(id) {
            NodeKind::AssignStmt { target, .. } => Some(target.clone()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use jmm_syntax::parse_ast;

    fn propagate(body: &str) -> (Ast, bool) {
        let src = format!(
            "import io; class A {{ int f; public int run(int p) {{ int a; int b; boolean c; {} }} }}",
            body
        );
        let mut ast = parse_ast(&src).unwrap();
        let table = SymbolTable::build(&ast).unwrap();
        let changed = ConstantPropagation::new(&table).run(&mut ast);
        (ast, changed)
    }

    /// 所有 `io.println` 调用的实参
    fn printed(ast: &Ast) -> Vec<NodeKind> {
        ast.descendants(ast.root())
            .filter_map(|id| match ast.kind(id) {
                NodeKind::MethodCallExpr { method, args, .. } if method == "println" => {
                    Some(ast.kind(args[0]).clone())
                }
                _ => None,
            })
            .collect()
    }

    fn int(value: i32) -> NodeKind {
        NodeKind::IntegerLiteral { value }
    }

    fn var(name: &str) -> NodeKind {
        NodeKind::VarRef {
            name: name.to_string(),
        }
    }

    #[test]
    fn test_straight_line() {
        let (ast, changed) = propagate("a = 3; io.println(a); c = true; io.println(c); return a;");
        assert!(changed);
        assert_eq!(
            printed(&ast),
            vec![int(3), NodeKind::BooleanLiteral { value: true }]
        );
    }

    #[test]
    fn test_non_literal_kills() {
        let (ast, _) = propagate("a = 3; a = p; io.println(a); return 0;");
        assert_eq!(printed(&ast), vec![var("a")]);
    }

    #[test]
    fn test_fields_not_tracked() {
        let (ast, changed) = propagate("f = 3; io.println(f); return 0;");
        assert!(!changed);
        assert_eq!(printed(&ast), vec![var("f")]);
    }

    #[test]
    fn test_loop_kills_assigned_names() {
        let (ast, _) = propagate(
            "a = 0; b = 5; while (a < b) { io.println(b); a = a + 1; } io.println(a); return 0;",
        );
        // b 在循环内未被赋值，仍可传播；a 在条件和循环后都不能替换
        assert_eq!(printed(&ast), vec![int(5), var("a")]);
        let condition = ast
            .descendants(ast.root())
            .find_map(|id| match ast.kind(id) {
                NodeKind::WhileStmt { condition, .. } => Some(*condition),
                _ => None,
            })
            .unwrap();
        let NodeKind::BinaryExpr { lhs, rhs, .. } = ast.kind(condition) else {
            panic!("expected comparison");
        };
        assert_eq!(ast.kind(*lhs), &var("a"));
        assert_eq!(ast.kind(*rhs), &int(5));
    }

    #[test]
    fn test_if_branches_join_by_intersection() {
        let (ast, _) = propagate(
            "a = 1; b = 2; if (p < 0) { a = 1; b = 3; } else { b = 4; } io.println(a); io.println(b); return 0;",
        );
        assert_eq!(printed(&ast), vec![int(1), var("b")]);
    }

    #[test]
    fn test_each_method_starts_empty() {
        let src = "import io; class A { int g() { int a; a = 1; return a; } int h() { int a; io.println(a); return 0; } }";
        let mut ast = parse_ast(src).unwrap();
        let table = SymbolTable::build(&ast).unwrap();
        ConstantPropagation::new(&table).run(&mut ast);
        assert_eq!(printed(&ast), vec![var("a")]);
    }
}
