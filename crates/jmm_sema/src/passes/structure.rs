//! 结构规则检查
//!
//! - 可变参数只能是最后一个参数，不能出现在字段和局部变量上
//! - 静态方法中不能使用 `this`，也不能给字段赋值
//! - 只有 `main` 是静态的
//! - 类类型必须是导入的类或当前类
//! - 非 void 方法的每条路径都以 `return` 结束

use super::{finish, walk};
use crate::error::SemanticError;
use crate::resolver::TypeResolver;
use crate::table::SymbolTable;
use jmm_diagnostics::Position;
use jmm_syntax::{Ast, NodeId, NodeKind, TypeExpr};

pub struct StructureChecker<'a> {
    ast: &'a Ast,
    table: &'a SymbolTable,
}

impl<'a> StructureChecker<'a> {
    pub fn new(ast: &'a Ast, table: &'a SymbolTable) -> Self {
        Self { ast, table }
    }

    pub fn check(&self) -> Result<(), Vec<SemanticError>> {
        let ast = self.ast;
        let mut errors = Vec::new();

        walk(ast, self.table, |id, kind, resolver| {
            let pos = ast.pos(id);
            match kind {
                NodeKind::VarDecl { name, ty } => {
                    if ty.is_vararg() {
                        errors.push(SemanticError::VarargsNotAllowed {
                            name: name.clone(),
                            pos,
                        });
                    }
                    self.check_class_type(ty, pos, &mut errors);
                }
                NodeKind::Param { ty, .. } => self.check_class_type(ty, pos, &mut errors),
                NodeKind::MethodDecl {
                    name,
                    is_static,
                    return_type,
                    params,
                    body,
                    ..
                } => {
                    if name == "main" && !is_static {
                        errors.push(SemanticError::MainNotStatic { pos });
                    } else if name != "main" && *is_static {
                        errors.push(SemanticError::UnexpectedStatic {
                            name: name.clone(),
                            pos,
                        });
                    }
                    self.check_class_type(return_type, pos, &mut errors);
                    self.check_vararg_position(params, &mut errors);
                    if *return_type != TypeExpr::Void
                        && !body.last().is_some_and(|stmt| self.always_returns(*stmt))
                    {
                        errors.push(SemanticError::MissingReturn {
                            method: name.clone(),
                            pos,
                        });
                    }
                }
                NodeKind::ThisExpr => {
                    if resolver.is_some_and(|r| r.method().is_static) {
                        errors.push(SemanticError::ThisInStaticMethod { pos });
                    }
                }
                NodeKind::NewObjectExpr { class_name } => {
                    if !self.is_declared_class(class_name) {
                        errors.push(SemanticError::ClassNotDeclared {
                            name: class_name.clone(),
                            pos,
                        });
                    }
                }
                NodeKind::NewArrayExpr { element, .. } => {
                    self.check_class_type(element, pos, &mut errors)
                }
                NodeKind::AssignStmt { target, .. } | NodeKind::ArrayAssignStmt { target, .. } => {
                    if let Some(r) = resolver {
                        if self.is_static_field_write(r, target) {
                            errors.push(SemanticError::FieldInStaticMethod {
                                name: target.clone(),
                                pos,
                            });
                        }
                    }
                }
                NodeKind::Program { .. }
                | NodeKind::ImportDecl { .. }
                | NodeKind::ClassDecl { .. }
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
                | NodeKind::ArrayCreationExpr { .. }
                | NodeKind::ArrayAccessExpr { .. }
                | NodeKind::ArrayLengthExpr { .. }
                | NodeKind::MethodCallExpr { .. }
                | NodeKind::ParenthesisExpr { .. } => {}
            }
        });

        finish(errors)
    }

    fn is_declared_class(&self, name: &str) -> bool {
        name == self.table.class_name() || self.table.is_imported(name)
    }

    fn check_class_type(&self, ty: &TypeExpr, pos: Position, errors: &mut Vec<SemanticError>) {
        if let Some(name) = ty.class_name() {
            if !self.is_declared_class(name) {
                errors.push(SemanticError::ClassNotDeclared {
                    name: name.to_string(),
                    pos,
                });
            }
        }
    }

    fn check_vararg_position(&self, params: &[NodeId], errors: &mut Vec<SemanticError>) {
        let Some((_, leading)) = params.split_last() else {
            return;
        };
        for param in leading {
            if matches!(self.ast.kind(*param), NodeKind::Param { ty, .. } if ty.is_vararg()) {
                errors.push(SemanticError::VarargsNotLast {
                    pos: self.ast.pos(*param),
                });
            }
        }
    }

    /// 只认最后一条语句：`return`，两个分支都返回的 `if/else`，或以此结尾的代码块
    fn always_returns(&self, stmt: NodeId) -> bool {
        match self.ast.kind(stmt) {
            NodeKind::ReturnStmt { .. } => true,
            NodeKind::IfStmt {
                then_branch,
                else_branch: Some(else_branch),
                ..
            } => self.always_returns(*then_branch) && self.always_returns(*else_branch),
            NodeKind::BlockStmt { stmts } => stmts.last().is_some_and(|s| self.always_returns(*s)),
            _ => false,
        }
    }

    // 静态上下文中查不到字段，名字又确实是字段
    fn is_static_field_write(&self, resolver: &TypeResolver<'_>, target: &str) -> bool {
        resolver.method().is_static
            && resolver.lookup_variable(target).is_none()
            && self.table.field(target).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jmm_syntax::parse_ast;

    fn check(src: &str) -> Vec<SemanticError> {
        let ast = parse_ast(src).unwrap();
        let table = SymbolTable::build(&ast).unwrap();
        StructureChecker::new(&ast, &table)
            .check()
            .err()
            .unwrap_or_default()
    }

    #[test]
    fn test_valid_structure() {
        let errors = check(
            r#"
import io;
class A {
    A next;
    public int sum(int first, int... rest) { return first; }
    public static void main(String[] args) { A a; a = new A(); io.println(1); }
}
"#,
        );
        assert!(errors.is_empty(), "{:?}", errors);
    }

    #[test]
    fn test_varargs_rules() {
        let errors = check("class A { int... f; int g(int... a, int b) { int... l; return b; } }");
        assert!(matches!(&errors[0], SemanticError::VarargsNotAllowed { name, .. } if name == "f"));
        assert!(errors
            .iter()
            .any(|e| matches!(e, SemanticError::VarargsNotLast { .. })));
        assert!(errors
            .iter()
            .any(|e| matches!(e, SemanticError::VarargsNotAllowed { name, .. } if name == "l")));
    }

    #[test]
    fn test_static_rules() {
        let errors = check(
            r#"
class A {
    int x;
    public void main(String[] args) { }
    public static int helper() { return 0; }
}
"#,
        );
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], SemanticError::MainNotStatic { .. }));
        assert!(matches!(&errors[1], SemanticError::UnexpectedStatic { name, .. } if name == "helper"));
    }

    #[test]
    fn test_this_and_fields_in_main() {
        let errors = check(
            r#"
class A {
    int x;
    public static void main(String[] args) { x = 1; this.foo(); }
    int foo() { x = 2; return x; }
}
"#,
        );
        assert_eq!(errors.len(), 2);
        assert!(matches!(&errors[0], SemanticError::FieldInStaticMethod { name, .. } if name == "x"));
        assert!(matches!(errors[1], SemanticError::ThisInStaticMethod { .. }));
    }

    #[test]
    fn test_missing_return() {
        let errors = check(
            r#"
class A {
    public int f(boolean b) { if (b) return 1; }
    public int g(int x) { while (x < 3) { return x; } }
    public int h(boolean b) { if (b) { return 1; } else { x = 2; } }
}
"#,
        );
        let methods: Vec<_> = errors
            .iter()
            .filter_map(|e| match e {
                SemanticError::MissingReturn { method, .. } => Some(method.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(methods, vec!["f", "g", "h"]);
        assert!(errors[0].to_string().contains("without returning"));
    }

    #[test]
    fn test_every_path_returns() {
        let errors = check(
            r#"
class A {
    public int f(boolean b) { if (b) return 1; else return 2; }
    public int g(boolean b) { if (b) { return 1; } else { if (!b) return 2; else { return 3; } } }
    public int h(int x) { while (x < 3) x = x + 1; { return x; } }
    public void v(boolean b) { if (b) return; }
}
"#,
        );
        assert!(errors.is_empty(), "{:?}", errors);
    }

    #[test]
    fn test_unknown_classes() {
        let errors = check("class A { B b; int f() { b = new C(); return 0; } }");
        let names: Vec<_> = errors
            .iter()
            .filter_map(|e| match e {
                SemanticError::ClassNotDeclared { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(names, vec!["B", "C"]);
    }
}
