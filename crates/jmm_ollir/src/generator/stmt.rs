//! Statement Lowering
//!
//! 控制流统一展开为"条件为真则跳转"：
//!
//! ```text
//! if:    cond; if (c) goto if_then_N; else...; goto if_end_N; if_then_N: then...; if_end_N:
//! while: while_cond_N: cond; if (c) goto while_body_N; goto while_end_N;
//!        while_body_N: body...; goto while_cond_N; while_end_N:
//! ```

use super::{ExprResult, LabelKind, MethodLowering};
use crate::error::{LoweringError, LoweringResult};
use crate::ir::{ElementType, Expression, Instruction, Variable};
use jmm_sema::VarBinding;
use jmm_syntax::{NodeId, NodeKind};

impl MethodLowering<'_, '_> {
    pub(crate) fn lower_stmt(&mut self, id: NodeId, out: &mut Vec<Instruction>) -> LoweringResult<()> {
        let ast = self.ast;
        match ast.kind(id) {
            NodeKind::AssignStmt { target, value } => self.lower_assign(id, target, *value, out),
            NodeKind::ArrayAssignStmt {
                target,
                index,
                value,
            } => {
                let pos = ast.pos(id);
                let array = match self.resolver.lookup_variable(target) {
                    Some(VarBinding::Param { ty, .. }) | Some(VarBinding::Local(ty)) => {
                        Variable::new(target.clone(), ElementType::from(&ty))
                    }
                    Some(VarBinding::Field(ty)) => {
                        let ty = ElementType::from(&ty);
                        let dest = self.temp(ty.clone());
                        out.push(Instruction::Assign {
                            dest: dest.clone(),
                            value: Expression::GetField {
                                object: self.this(),
                                field: Variable::new(target.clone(), ty),
                            },
                        });
                        dest
                    }
                    Some(VarBinding::Import(_)) => {
                        return Err(LoweringError::InvalidAssignTarget {
                            name: target.clone(),
                            pos,
                        })
                    }
                    None => return Err(self.unresolved(target, id)),
                };
                let index = self.lower_expr(*index)?;
                out.extend(index.computation);
                let value = self.lower_expr(*value)?;
                out.extend(value.computation);
                out.push(Instruction::ArrayStore {
                    array,
                    index: index.code,
                    value: value.code,
                });
                Ok(())
            }
            NodeKind::ReturnStmt { value } => {
                let value = match value {
                    Some(value) => {
                        let value = self.lower_expr(*value)?;
                        out.extend(value.computation);
                        Some(value.code)
                    }
                    None => None,
                };
                out.push(Instruction::Return(value));
                Ok(())
            }
            NodeKind::IfStmt {
                condition,
                then_branch,
                else_branch,
            } => {
                let n = self.ctx.next_label_id(LabelKind::If);
                let then_label = format!("if_then_{}", n);
                let end_label = format!("if_end_{}", n);

                let condition = self.lower_expr(*condition)?;
                out.extend(condition.computation);
                out.push(Instruction::Branch {
                    condition: condition.code,
                    label: then_label.clone(),
                });
                if let Some(else_branch) = else_branch {
                    self.lower_stmt(*else_branch, out)?;
                }
                if !out.last().is_some_and(Instruction::is_terminator) {
                    out.push(Instruction::Goto(end_label.clone()));
                }
                out.push(Instruction::Label(then_label));
                self.lower_stmt(*then_branch, out)?;
                out.push(Instruction::Label(end_label));
                Ok(())
            }
            NodeKind::WhileStmt { condition, body } => {
                let n = self.ctx.next_label_id(LabelKind::While);
                let cond_label = format!("while_cond_{}", n);
                let body_label = format!("while_body_{}", n);
                let end_label = format!("while_end_{}", n);

                out.push(Instruction::Label(cond_label.clone()));
                let condition = self.lower_expr(*condition)?;
                out.extend(condition.computation);
                out.push(Instruction::Branch {
                    condition: condition.code,
                    label: body_label.clone(),
                });
                out.push(Instruction::Goto(end_label.clone()));
                out.push(Instruction::Label(body_label));
                self.lower_stmt(*body, out)?;
                out.push(Instruction::Goto(cond_label));
                out.push(Instruction::Label(end_label));
                Ok(())
            }
            NodeKind::BlockStmt { stmts } => {
                for stmt in stmts {
                    self.lower_stmt(*stmt, out)?;
                }
                Ok(())
            }
            NodeKind::ExprStmt { expr } => {
                let mut expr = *expr;
                while let NodeKind::ParenthesisExpr { inner } = ast.kind(expr) {
                    expr = *inner;
                }
                if matches!(ast.kind(expr), NodeKind::MethodCallExpr { .. }) {
                    let (call, computation) = self.lower_call(expr)?;
                    out.extend(computation);
                    out.push(Instruction::Call(call));
                } else {
                    // 值被丢弃，只保留计算过程
                    let result = self.lower_expr(expr)?;
                    out.extend(result.computation);
                }
                Ok(())
            }
            other @ (NodeKind::Program { .. }
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
            | NodeKind::ParenthesisExpr { .. }) => Err(LoweringError::UnexpectedNode {
                expected: "a statement",
                found: other.name(),
            }),
        }
    }

    fn lower_assign(
        &mut self,
        id: NodeId,
        target: &str,
        value: NodeId,
        out: &mut Vec<Instruction>,
    ) -> LoweringResult<()> {
        let binding = self.resolver.lookup_variable(target);
        let ExprResult {
            code,
            mut computation,
        } = self.lower_expr(value)?;

        match binding {
            Some(VarBinding::Param { ty, .. }) | Some(VarBinding::Local(ty)) => {
                let dest = Variable::new(target, ElementType::from(&ty));
                // 最后一条指令算出的临时变量直接改为目标变量
                if let Some(Instruction::Assign { dest: last, .. }) = computation.last_mut() {
                    if code.as_variable() == Some(&*last) {
                        *last = dest;
                        out.extend(computation);
                        return Ok(());
                    }
                }
                out.extend(computation);
                out.push(Instruction::Assign {
                    dest,
                    value: Expression::Single(code),
                });
            }
            Some(VarBinding::Field(ty)) => {
                out.extend(computation);
                out.push(Instruction::PutField {
                    object: self.this(),
                    field: Variable::new(target, ElementType::from(&ty)),
                    value: code,
                });
            }
            Some(VarBinding::Import(_)) => {
                return Err(LoweringError::InvalidAssignTarget {
                    name: target.to_string(),
                    pos: self.ast.pos(id),
                })
            }
            None => return Err(self.unresolved(target, id)),
        }
        Ok(())
    }

    fn unresolved(&self, name: &str, id: NodeId) -> LoweringError {
        LoweringError::UnresolvedVariable {
            name: name.to_string(),
            method: self.resolver.method().name.clone(),
            pos: self.ast.pos(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{lower_source, method_text};

    const PRELUDE: &str = "import io; class A { int f; int[] xs;";

    fn run_body(stmts: &str) -> Vec<String> {
        let src = format!(
            "{} public int run(int a, boolean b) {{ int[] ys; {} return a; }} }}",
            PRELUDE, stmts
        );
        method_text(&lower_source(&src), "run")
    }

    #[test]
    fn test_if_and_while_layout() {
        assert_eq!(
            run_body("if (b) a = 1; else a = 2; while (a < 10) { a = a + 1; } io.println(a);"),
            vec![
                "if (b.bool) goto if_then_0;",
                "a.i32 :=.i32 2.i32;",
                "goto if_end_0;",
                "if_then_0:",
                "a.i32 :=.i32 1.i32;",
                "if_end_0:",
                "while_cond_0:",
                "tmp0.bool :=.bool a.i32 <.bool 10.i32;",
                "if (tmp0.bool) goto while_body_0;",
                "goto while_end_0;",
                "while_body_0:",
                "a.i32 :=.i32 a.i32 +.i32 1.i32;",
                "goto while_cond_0;",
                "while_end_0:",
                "invokestatic(io, \"println\", a.i32).V;",
                "ret.i32 a.i32;",
            ]
        );
    }

    #[test]
    fn test_else_ending_in_return_skips_goto() {
        let text = run_body("if (b) a = 1; else return 0;");
        assert_eq!(
            &text[..4],
            &["if (b.bool) goto if_then_0;", "ret.i32 0.i32;", "if_then_0:", "a.i32 :=.i32 1.i32;"]
        );
    }

    #[test]
    fn test_sibling_ifs_get_distinct_labels() {
        let text = run_body("if (b) a = 1; if (b) a = 2;").join("\n");
        assert!(text.contains("if_then_0:") && text.contains("if_end_0:"));
        assert!(text.contains("if_then_1:") && text.contains("if_end_1:"));
    }

    #[test]
    fn test_nested_loops() {
        let text = run_body("while (b) { while (b) { a = 1; } }").join("\n");
        assert!(text.contains("while_cond_0:") && text.contains("while_cond_1:"));
        assert!(text.contains("goto while_cond_1;\nwhile_end_1:\ngoto while_cond_0;"));
    }

    #[test]
    fn test_copy_does_not_collapse_earlier_assignment() {
        let text = run_body("int c; c = 1; a = c;");
        assert_eq!(text[0], "c.i32 :=.i32 1.i32;");
        assert_eq!(text[1], "a.i32 :=.i32 c.i32;");
    }

    #[test]
    fn test_array_stores() {
        assert_eq!(
            run_body("ys = new int[2]; ys[0] = a; xs[a] = 3;"),
            vec![
                "ys.array.i32 :=.array.i32 new(array, 2.i32).array.i32;",
                "ys[0.i32].i32 :=.i32 a.i32;",
                "tmp1.array.i32 :=.array.i32 getfield(this.A, xs.array.i32).array.i32;",
                "tmp1[a.i32].i32 :=.i32 3.i32;",
                "ret.i32 a.i32;",
            ]
        );
    }

    #[test]
    fn test_void_method_gets_implicit_return() {
        let src = format!("{} public void g() {{ f = 1; }} }}", PRELUDE);
        assert_eq!(
            method_text(&lower_source(&src), "g"),
            vec!["putfield(this.A, f.i32, 1.i32).V;", "ret.V;"]
        );
    }

    #[test]
    fn test_discarded_expression_keeps_side_effects() {
        let text = run_body("this.run(a, b);");
        assert_eq!(text[0], "invokevirtual(this.A, \"run\", a.i32, b.bool).i32;");
    }
}
