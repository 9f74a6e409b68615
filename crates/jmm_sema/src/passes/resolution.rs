//! Name Resolution
//!
//! 变量和赋值目标必须能解析；本类方法调用检查参数个数和类型。
//! 接收者是导入类、或当前类有父类时，找不到的方法假定由外部提供。

use super::{finish, walk};
use crate::compat::TypeCompat;
use crate::error::SemanticError;
use crate::resolver::TypeResolver;
use crate::table::SymbolTable;
use jmm_diagnostics::Position;
use jmm_syntax::{Ast, NodeId, NodeKind};

pub struct ResolutionChecker<'a> {
    ast: &'a Ast,
    table: &'a SymbolTable,
    compat: TypeCompat<'a>,
}

impl<'a> ResolutionChecker<'a> {
    pub fn new(ast: &'a Ast, table: &'a SymbolTable) -> Self {
        Self {
            ast,
            table,
            compat: TypeCompat::new(table),
        }
    }

    pub fn check(&self) -> Result<(), Vec<SemanticError>> {
        let ast = self.ast;
        let mut errors = Vec::new();

        walk(ast, self.table, |id, kind, resolver| {
            let Some(r) = resolver else {
                return;
            };
            let pos = ast.pos(id);
            match kind {
                NodeKind::VarRef { name } => {
                    if r.lookup_variable(name).is_none() {
                        errors.push(SemanticError::UndeclaredVariable {
                            name: name.clone(),
                            pos,
                        });
                    }
                }
                NodeKind::AssignStmt { target, .. } | NodeKind::ArrayAssignStmt { target, .. } => {
                    // 静态方法中写字段由结构检查报告
                    let static_field = r.method().is_static && self.table.field(target).is_some();
                    if r.lookup_variable(target).is_none() && !static_field {
                        errors.push(SemanticError::UndeclaredVariable {
                            name: target.clone(),
                            pos,
                        });
                    }
                }
                NodeKind::MethodCallExpr {
                    receiver,
                    method,
                    args,
                } => self.check_call(r, *receiver, method, args, pos, &mut errors),
                NodeKind::Program { .. }
                | NodeKind::ImportDecl { .. }
                | NodeKind::ClassDecl { .. }
                | NodeKind::VarDecl { .. }
                | NodeKind::MethodDecl { .. }
                | NodeKind::Param { .. }
                | NodeKind::ReturnStmt { .. }
                | NodeKind::IfStmt { .. }
                | NodeKind::WhileStmt { .. }
                | NodeKind::BlockStmt { .. }
                | NodeKind::ExprStmt { .. }
                | NodeKind::BinaryExpr { .. }
                | NodeKind::UnaryExpr { .. }
                | NodeKind::IntegerLiteral { .. }
                | NodeKind::BooleanLiteral { .. }
                | NodeKind::ThisExpr
                | NodeKind::NewObjectExpr { .. }
                | NodeKind::NewArrayExpr { .. }
                | NodeKind::ArrayCreationExpr { .. }
                | NodeKind::ArrayAccessExpr { .. }
                | NodeKind::ArrayLengthExpr { .. }
                | NodeKind::ParenthesisExpr { .. } => {}
            }
        });

        finish(errors)
    }

    fn check_call(
        &self,
        r: &TypeResolver<'_>,
        receiver: NodeId,
        method: &str,
        args: &[NodeId],
        pos: Position,
        errors: &mut Vec<SemanticError>,
    ) {
        let Some(receiver_ty) = r.resolve(receiver) else {
            return;
        };
        if receiver_ty.is_primitive_name() {
            errors.push(SemanticError::InvalidReceiver {
                method: method.to_string(),
                ty: receiver_ty.to_string(),
                pos,
            });
            return;
        }
        if !r.is_local_receiver(receiver) {
            return;
        }
        if !self.table.has_method(method) {
            if self.table.super_class().is_none() {
                errors.push(SemanticError::UndeclaredMethod {
                    name: method.to_string(),
                    pos,
                });
            }
            return;
        }
        self.check_arguments(r, method, args, pos, errors);
    }

    fn check_arguments(
        &self,
        r: &TypeResolver<'_>,
        method: &str,
        args: &[NodeId],
        pos: Position,
        errors: &mut Vec<SemanticError>,
    ) {
        let params = self.table.try_parameters(method).unwrap_or_default();
        let vararg = self.table.has_vararg(method);
        let fixed = if vararg { params.len() - 1 } else { params.len() };

        let count_ok = if vararg {
            args.len() >= fixed
        } else {
            args.len() == fixed
        };
        if !count_ok {
            errors.push(SemanticError::ArgumentCount {
                method: method.to_string(),
                expected: fixed,
                found: args.len(),
                pos,
            });
            return;
        }

        let mut mismatch = |expected: String, found: String| {
            errors.push(SemanticError::ArgumentMismatch {
                method: method.to_string(),
                expected,
                found,
                pos,
            });
        };

        for (param, arg) in params.iter().zip(&args[..fixed]) {
            if let Some(found) = r.resolve(*arg) {
                if !self.compat.assignable(&param.ty, &found) {
                    mismatch(param.ty.to_string(), found.to_string());
                }
            }
        }

        if !vararg {
            return;
        }
        let Some(last) = params.last() else {
            return;
        };
        let trailing = &args[fixed..];
        // 已经是数组的单个实参直接传递
        if let [single] = trailing {
            if let Some(found) = r.resolve(*single).filter(|t| t.is_array) {
                if !self.compat.assignable(&last.ty, &found) {
                    mismatch(last.ty.to_string(), found.to_string());
                }
                return;
            }
        }
        let element = last.ty.element();
        for arg in trailing {
            if let Some(found) = r.resolve(*arg) {
                if !self.compat.assignable(&element, &found) {
                    mismatch(element.to_string(), found.to_string());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jmm_syntax::parse_ast;

    fn check(src: &str) -> Vec<SemanticError> {
        let ast = parse_ast(src).unwrap();
        let table = SymbolTable::build(&ast).unwrap();
        ResolutionChecker::new(&ast, &table)
            .check()
            .err()
            .unwrap_or_default()
    }

    fn class(members: &str) -> String {
        format!("import io; class A {{ {} }}", members)
    }

    #[test]
    fn test_undeclared_names() {
        let errors = check(&class("int f() { y = z; return w; }"));
        let names: Vec<_> = errors
            .iter()
            .map(|e| match e {
                SemanticError::UndeclaredVariable { name, .. } => name.as_str(),
                _ => "?",
            })
            .collect();
        assert_eq!(names, vec!["y", "z", "w"]);
    }

    #[test]
    fn test_undeclared_method_without_superclass() {
        let errors = check(&class("int f() { return this.g(); }"));
        assert!(matches!(&errors[0], SemanticError::UndeclaredMethod { name, .. } if name == "g"));

        let inherited = "import io; import B; class A extends B { int f() { return this.g(); } }";
        assert!(check(inherited).is_empty());
    }

    #[test]
    fn test_external_and_primitive_receivers() {
        let errors = check(&class("int f(int n) { io.anything(n, true); return n.size(); }"));
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            SemanticError::InvalidReceiver { method, ty, .. } if method == "size" && ty == "int"
        ));
    }

    #[test]
    fn test_arity_and_argument_types() {
        let errors = check(&class(
            "int g(int a, boolean b) { return a; } int f() { this.g(1); this.g(true, 1); return 0; }",
        ));
        assert!(matches!(
            errors[0],
            SemanticError::ArgumentCount { expected: 2, found: 1, .. }
        ));
        assert_eq!(
            errors
                .iter()
                .filter(|e| matches!(e, SemanticError::ArgumentMismatch { .. }))
                .count(),
            2
        );
    }

    #[test]
    fn test_varargs_absorb_arguments() {
        let members = "int sum(int first, int... rest) { return first; } int f(int[] xs) { \
                       this.sum(1); this.sum(1, 2, 3); this.sum(1, xs); return this.sum(1, true); }";
        let errors = check(&class(members));
        assert_eq!(errors.len(), 1, "{:?}", errors);
        assert!(matches!(
            &errors[0],
            SemanticError::ArgumentMismatch { expected, found, .. } if expected == "int" && found == "boolean"
        ));

        assert!(matches!(
            check(&class("int sum(int first, int... rest) { return this.sum(); }"))[0],
            SemanticError::ArgumentCount { expected: 1, found: 0, .. }
        ));
    }

    #[test]
    fn test_plain_array_parameter_does_not_absorb() {
        let errors = check(&class("int g(int[] xs) { return this.g(1, 2); }"));
        assert!(matches!(errors[0], SemanticError::ArgumentCount { expected: 1, found: 2, .. }));
    }

    #[test]
    fn test_static_field_write_left_to_structure_pass() {
        let src = "class A { int x; public static void main(String[] args) { x = 1; } }";
        assert!(check(src).is_empty());
    }
}
