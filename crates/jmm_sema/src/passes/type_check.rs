//! Type Checking
//!
//! 运算符、条件、赋值、数组和返回值的类型检查。
//! 无法解析的名字在这里被跳过，由 [`super::ResolutionChecker`] 报告。

use super::{describe, finish, walk};
use crate::compat::TypeCompat;
use crate::error::SemanticError;
use crate::resolver::TypeResolver;
use crate::table::SymbolTable;
use crate::types::Type;
use jmm_diagnostics::Position;
use jmm_syntax::{Ast, BinaryOp, NodeId, NodeKind};

pub struct TypeChecker<'a> {
    ast: &'a Ast,
    table: &'a SymbolTable,
    compat: TypeCompat<'a>,
}

impl<'a> TypeChecker<'a> {
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
                NodeKind::BinaryExpr { op, lhs, rhs } => {
                    self.check_binary(r, *op, *lhs, *rhs, pos, &mut errors)
                }
                NodeKind::UnaryExpr { op, operand } => {
                    if let Some(ty) = r.resolve(*operand) {
                        if !ty.is_boolean() {
                            errors.push(SemanticError::InvalidOperand {
                                op: op.symbol().to_string(),
                                found: ty.to_string(),
                                pos,
                            });
                        }
                    }
                }
                NodeKind::IfStmt { condition, .. } => {
                    self.check_condition(r, *condition, "if", &mut errors)
                }
                NodeKind::WhileStmt { condition, .. } => {
                    self.check_condition(r, *condition, "while", &mut errors)
                }
                NodeKind::AssignStmt { target, value } => {
                    if let (Some(expected), Some(found)) = (r.variable_type(target), r.resolve(*value)) {
                        if !self.compat.assignable(&expected, &found) {
                            errors.push(SemanticError::AssignmentMismatch {
                                name: target.clone(),
                                expected: expected.to_string(),
                                found: found.to_string(),
                                pos,
                            });
                        }
                    }
                }
                NodeKind::ArrayAssignStmt {
                    target,
                    index,
                    value,
                } => {
                    self.check_index(r, *index, &mut errors);
                    let Some(array) = r.variable_type(target) else {
                        return;
                    };
                    if !array.is_array {
                        errors.push(SemanticError::NotAnArray {
                            name: target.clone(),
                            pos,
                        });
                        return;
                    }
                    if let Some(found) = r.resolve(*value) {
                        if !self.compat.assignable(&array.element(), &found) {
                            errors.push(SemanticError::ArrayElementMismatch {
                                name: target.clone(),
                                pos,
                            });
                        }
                    }
                }
                NodeKind::ArrayAccessExpr { array, index } => {
                    self.check_array_operand(r, *array, &mut errors);
                    self.check_index(r, *index, &mut errors);
                }
                NodeKind::ArrayLengthExpr { array } => {
                    self.check_array_operand(r, *array, &mut errors)
                }
                NodeKind::ArrayCreationExpr { elements } => {
                    let types: Vec<Option<Type>> = elements.iter().map(|e| r.resolve(*e)).collect();
                    let mixed = types.windows(2).any(|pair| pair[0] != pair[1]);
                    let nested = types.iter().flatten().any(|t| t.is_array);
                    if mixed || nested {
                        errors.push(SemanticError::ArrayCreationMismatch { pos });
                    }
                }
                NodeKind::ReturnStmt { value } => {
                    let method = &r.method().name;
                    let Some(expected) = self.table.try_return_type(method) else {
                        return;
                    };
                    let found = match value {
                        Some(v) => r.resolve(*v),
                        None => Some(Type::void()),
                    };
                    if let Some(found) = found {
                        if !self.compat.assignable(&expected, &found) {
                            errors.push(SemanticError::ReturnMismatch {
                                method: method.clone(),
                                expected: expected.to_string(),
                                found: found.to_string(),
                                pos,
                            });
                        }
                    }
                }
                NodeKind::Program { .. }
                | NodeKind::ImportDecl { .. }
                | NodeKind::ClassDecl { .. }
                | NodeKind::VarDecl { .. }
                | NodeKind::MethodDecl { .. }
                | NodeKind::Param { .. }
                | NodeKind::BlockStmt { .. }
                | NodeKind::ExprStmt { .. }
                | NodeKind::VarRef { .. }
                | NodeKind::IntegerLiteral { .. }
                | NodeKind::BooleanLiteral { .. }
                | NodeKind::ThisExpr
                | NodeKind::NewObjectExpr { .. }
                | NodeKind::NewArrayExpr { .. }
                | NodeKind::MethodCallExpr { .. }
                | NodeKind::ParenthesisExpr { .. } => {}
            }
        });

        finish(errors)
    }

    fn check_binary(
        &self,
        r: &TypeResolver<'_>,
        op: BinaryOp,
        lhs: NodeId,
        rhs: NodeId,
        pos: Position,
        errors: &mut Vec<SemanticError>,
    ) {
        let (Some(left), Some(right)) = (r.resolve(lhs), r.resolve(rhs)) else {
            return;
        };
        if left != right || left.is_array {
            errors.push(SemanticError::BinaryOperandMismatch {
                left: left.to_string(),
                right: right.to_string(),
                pos,
            });
            return;
        }
        let operand_ok = if op.is_arithmetic() || op.is_relational() {
            left.is_int()
        } else if op.is_logical() {
            left.is_boolean()
        } else {
            !left.is_void()
        };
        if !operand_ok {
            errors.push(SemanticError::InvalidOperand {
                op: op.symbol().to_string(),
                found: left.to_string(),
                pos,
            });
        }
    }

    fn check_condition(
        &self,
        r: &TypeResolver<'_>,
        condition: NodeId,
        construct: &'static str,
        errors: &mut Vec<SemanticError>,
    ) {
        if let Some(ty) = r.resolve(condition) {
            if !ty.is_boolean() {
                errors.push(SemanticError::ConditionNotBoolean {
                    construct,
                    pos: self.ast.pos(condition),
                });
            }
        }
    }

    fn check_index(&self, r: &TypeResolver<'_>, index: NodeId, errors: &mut Vec<SemanticError>) {
        if let Some(ty) = r.resolve(index) {
            if !ty.is_int() {
                errors.push(SemanticError::IndexNotInteger {
                    found: ty.to_string(),
                    pos: self.ast.pos(index),
                });
            }
        }
    }

    fn check_array_operand(
        &self,
        r: &TypeResolver<'_>,
        array: NodeId,
        errors: &mut Vec<SemanticError>,
    ) {
        if let Some(ty) = r.resolve(array) {
            if !ty.is_array {
                errors.push(SemanticError::NotAnArray {
                    name: describe(self.ast, array),
                    pos: self.ast.pos(array),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jmm_syntax::parse_ast;

    fn check(body: &str) -> Vec<SemanticError> {
        let src = format!(
            "import io; class A {{ int f; public int run(int a, boolean b, int[] xs) {{ {} return 0; }} }}",
            body
        );
        let ast = parse_ast(&src).unwrap();
        let table = SymbolTable::build(&ast).unwrap();
        TypeChecker::new(&ast, &table)
            .check()
            .err()
            .unwrap_or_default()
    }

    #[test]
    fn test_well_typed_body() {
        let errors = check(
            "a = a + xs[0] * xs.length; b = a < 3 && !b; if (a == 1) a = 2; while (b) b = false; xs[a] = f; xs = [1, 2]; io.println(a);",
        );
        assert!(errors.is_empty(), "{:?}", errors);
    }

    #[test]
    fn test_binary_operands() {
        let errors = check("a = a + b; b = b < b; a = xs + xs; b = a && a;");
        assert_eq!(errors.len(), 4);
        assert!(matches!(
            &errors[0],
            SemanticError::BinaryOperandMismatch { left, right, .. } if left == "int" && right == "boolean"
        ));
        assert!(matches!(&errors[1], SemanticError::InvalidOperand { op, .. } if op == "<"));
        assert!(matches!(errors[2], SemanticError::BinaryOperandMismatch { .. }));
        assert!(matches!(&errors[3], SemanticError::InvalidOperand { op, .. } if op == "&&"));
    }

    #[test]
    fn test_conditions_and_not() {
        let errors = check("if (a) a = 1; while (xs) a = 2; b = !a;");
        assert!(matches!(errors[0], SemanticError::ConditionNotBoolean { construct: "if", .. }));
        assert!(matches!(errors[1], SemanticError::ConditionNotBoolean { construct: "while", .. }));
        assert!(errors
            .iter()
            .any(|e| matches!(e, SemanticError::InvalidOperand { op, .. } if op == "!")));
    }

    #[test]
    fn test_assignment_and_arrays() {
        let errors = check("a = b; a[0] = 1; xs[b] = 1; xs[0] = true; a = a[0]; a = a.length; xs = [1, true];");
        let kinds: Vec<_> = errors
            .iter()
            .map(|e| match e {
                SemanticError::AssignmentMismatch { .. } => "assign",
                SemanticError::NotAnArray { .. } => "not-array",
                SemanticError::IndexNotInteger { .. } => "index",
                SemanticError::ArrayElementMismatch { .. } => "element",
                SemanticError::ArrayCreationMismatch { .. } => "creation",
                _ => "other",
            })
            .collect();
        assert_eq!(
            kinds,
            vec!["assign", "not-array", "index", "element", "not-array", "not-array", "creation"]
        );
    }

    #[test]
    fn test_return_type() {
        let errors = check("return b;");
        assert!(matches!(
            &errors[0],
            SemanticError::ReturnMismatch { expected, found, .. } if expected == "int" && found == "boolean"
        ));
    }

    #[test]
    fn test_external_calls_adapt_to_context() {
        assert!(check("a = io.read(); b = io.ok(); xs = io.arr(); if (io.ok()) a = 1;").is_empty());
    }
}
