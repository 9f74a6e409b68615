//! Expression Lowering
//!
//! 每个表达式降级为 [`ExprResult`]：结果操作数加上计算它的指令序列。
//! 非平凡的中间结果都存入新的临时变量。

use super::{ExprResult, LabelKind, MethodLowering};
use crate::error::{LoweringError, LoweringResult};
use crate::ir::{
    BinaryOperator, Call, ElementType, Expression, Instruction, Invocation, Operand, Variable,
};
use jmm_diagnostics::Position;
use jmm_sema::{import_simple_name, Type, VarBinding};
use jmm_syntax::{BinaryOp, NodeId, NodeKind, UnaryOp};

fn ir_operator(op: BinaryOp) -> Option<BinaryOperator> {
    Some(match op {
        BinaryOp::Add => BinaryOperator::Add,
        BinaryOp::Sub => BinaryOperator::Sub,
        BinaryOp::Mul => BinaryOperator::Mul,
        BinaryOp::Div => BinaryOperator::Div,
        BinaryOp::Lt => BinaryOperator::Lt,
        BinaryOp::Gt => BinaryOperator::Gt,
        BinaryOp::Le => BinaryOperator::Le,
        BinaryOp::Ge => BinaryOperator::Ge,
        BinaryOp::Eq => BinaryOperator::Eq,
        BinaryOp::Ne => BinaryOperator::Ne,
        BinaryOp::And | BinaryOp::Or => return None,
    })
}

impl MethodLowering<'_, '_> {
    pub(crate) fn lower_expr(&mut self, id: NodeId) -> LoweringResult<ExprResult> {
        let ast = self.ast;
        let pos = ast.pos(id);
        match ast.kind(id) {
            NodeKind::IntegerLiteral { value } => Ok(ExprResult::new(Operand::int(*value))),
            NodeKind::BooleanLiteral { value } => Ok(ExprResult::new(Operand::boolean(*value))),
            NodeKind::VarRef { name } => self.lower_var_ref(name, pos),
            NodeKind::ThisExpr => Ok(ExprResult::new(self.this())),
            NodeKind::ParenthesisExpr { inner } => self.lower_expr(*inner),
            NodeKind::BinaryExpr { op, lhs, rhs } => match ir_operator(*op) {
                Some(ir_op) => self.lower_binary(ir_op, *lhs, *rhs),
                None if *op == BinaryOp::And => self.lower_and(*lhs, *rhs),
                None => self.lower_or(*lhs, *rhs),
            },
            NodeKind::UnaryExpr {
                op: UnaryOp::Not,
                operand,
            } => {
                let operand = self.lower_expr(*operand)?;
                let mut computation = operand.computation;
                let code = self.assign_temp(Expression::Not(operand.code), &mut computation);
                Ok(ExprResult::with_computation(code, computation))
            }
            NodeKind::ArrayAccessExpr { array, index } => {
                let mut computation = Vec::new();
                let array = self.lower_expr(*array)?;
                let array = self.into_variable(array, &mut computation);
                let index = self.lower_expr(*index)?;
                computation.extend(index.computation);
                let code = self.assign_temp(
                    Expression::ArrayLoad {
                        array,
                        index: index.code,
                    },
                    &mut computation,
                );
                Ok(ExprResult::with_computation(code, computation))
            }
            NodeKind::ArrayLengthExpr { array } => {
                let mut computation = Vec::new();
                let array = self.lower_expr(*array)?;
                let array = self.into_variable(array, &mut computation);
                let code = self.assign_temp(Expression::ArrayLength(array), &mut computation);
                Ok(ExprResult::with_computation(code, computation))
            }
            NodeKind::NewObjectExpr { class_name } => {
                let mut computation = Vec::new();
                let code = self.assign_temp(Expression::NewObject(class_name.clone()), &mut computation);
                computation.push(Instruction::Call(Call::constructor(code.clone())));
                Ok(ExprResult::with_computation(code, computation))
            }
            NodeKind::NewArrayExpr { element, size } => {
                let size = self.lower_expr(*size)?;
                let mut computation = size.computation;
                let ty = ElementType::from(&Type::from(element).array());
                let code = self.assign_temp(
                    Expression::NewArray {
                        size: size.code,
                        ty,
                    },
                    &mut computation,
                );
                Ok(ExprResult::with_computation(code, computation))
            }
            NodeKind::ArrayCreationExpr { elements } => {
                let ty = self
                    .resolver
                    .resolve(id)
                    .map(|t| ElementType::from(&t))
                    .unwrap_or_else(|| ElementType::array_of(ElementType::Int32));
                let mut computation = Vec::new();
                let array = self.pack_array(elements, ty, &mut computation)?;
                Ok(ExprResult::with_computation(Operand::Variable(array), computation))
            }
            NodeKind::MethodCallExpr { method, .. } => {
                let (call, mut computation) = self.lower_call(id)?;
                if call.return_type == ElementType::Void {
                    return Err(LoweringError::VoidValue {
                        method: method.clone(),
                        pos,
                    });
                }
                let code = self.assign_temp(Expression::Call(call), &mut computation);
                Ok(ExprResult::with_computation(code, computation))
            }
            other @ (NodeKind::Program { .. }
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
            | NodeKind::ExprStmt { .. }) => Err(LoweringError::UnexpectedNode {
                expected: "an expression",
                found: other.name(),
            }),
        }
    }

    fn lower_var_ref(&mut self, name: &str, pos: Position) -> LoweringResult<ExprResult> {
        match self.resolver.lookup_variable(name) {
            Some(VarBinding::Import(path)) => Ok(ExprResult::new(Operand::Class(
                import_simple_name(&path).to_string(),
            ))),
            Some(VarBinding::Param { ty, .. }) | Some(VarBinding::Local(ty)) => {
                Ok(ExprResult::new(Operand::var(name, ElementType::from(&ty))))
            }
            Some(VarBinding::Field(ty)) => {
                let mut computation = Vec::new();
                let value = Expression::GetField {
                    object: self.this(),
                    field: Variable::new(name, ElementType::from(&ty)),
                };
                let code = self.assign_temp(value, &mut computation);
                Ok(ExprResult::with_computation(code, computation))
            }
            None => Err(LoweringError::UnresolvedVariable {
                name: name.to_string(),
                method: self.resolver.method().name.clone(),
                pos,
            }),
        }
    }

    fn lower_binary(
        &mut self,
        op: BinaryOperator,
        lhs: NodeId,
        rhs: NodeId,
    ) -> LoweringResult<ExprResult> {
        let left = self.lower_expr(lhs)?;
        let right = self.lower_expr(rhs)?;
        let mut computation = left.computation;
        computation.extend(right.computation);
        let value = Expression::Binary {
            op,
            lhs: left.code,
            rhs: right.code,
        };
        let code = self.assign_temp(value, &mut computation);
        Ok(ExprResult::with_computation(code, computation))
    }

    /// `a && b`：`a` 为假时不计算 `b`
    fn lower_and(&mut self, lhs: NodeId, rhs: NodeId) -> LoweringResult<ExprResult> {
        let id = self.ctx.next_label_id(LabelKind::And);
        let true_label = format!("and_true_{}", id);
        let end_label = format!("and_end_{}", id);
        let result = self.temp(ElementType::Boolean);

        let left = self.lower_expr(lhs)?;
        let mut computation = left.computation;
        computation.push(Instruction::Branch {
            condition: left.code,
            label: true_label.clone(),
        });
        computation.push(Instruction::Assign {
            dest: result.clone(),
            value: Expression::Single(Operand::boolean(false)),
        });
        computation.push(Instruction::Goto(end_label.clone()));
        computation.push(Instruction::Label(true_label));

        let right = self.lower_expr(rhs)?;
        computation.extend(right.computation);
        computation.push(Instruction::Assign {
            dest: result.clone(),
            value: Expression::Single(right.code),
        });
        computation.push(Instruction::Label(end_label));
        Ok(ExprResult::with_computation(Operand::Variable(result), computation))
    }

    /// `a || b`：`a` 为真时不计算 `b`
    fn lower_or(&mut self, lhs: NodeId, rhs: NodeId) -> LoweringResult<ExprResult> {
        let id = self.ctx.next_label_id(LabelKind::Or);
        let true_label = format!("or_true_{}", id);
        let end_label = format!("or_end_{}", id);
        let result = self.temp(ElementType::Boolean);

        let left = self.lower_expr(lhs)?;
        let mut computation = left.computation;
        computation.push(Instruction::Branch {
            condition: left.code,
            label: true_label.clone(),
        });

        let right = self.lower_expr(rhs)?;
        computation.extend(right.computation);
        computation.push(Instruction::Assign {
            dest: result.clone(),
            value: Expression::Single(right.code),
        });
        computation.push(Instruction::Goto(end_label.clone()));
        computation.push(Instruction::Label(true_label));
        computation.push(Instruction::Assign {
            dest: result.clone(),
            value: Expression::Single(Operand::boolean(true)),
        });
        computation.push(Instruction::Label(end_label));
        Ok(ExprResult::with_computation(Operand::Variable(result), computation))
    }

    /// 分配长度为元素个数的数组并逐个写入
    fn pack_array(
        &mut self,
        elements: &[NodeId],
        ty: ElementType,
        computation: &mut Vec<Instruction>,
    ) -> LoweringResult<Variable> {
        let array = self.temp(ty.clone());
        computation.push(Instruction::Assign {
            dest: array.clone(),
            value: Expression::NewArray {
                size: Operand::int(elements.len() as i32),
                ty,
            },
        });
        for (index, element) in elements.iter().enumerate() {
            let value = self.lower_expr(*element)?;
            computation.extend(value.computation);
            computation.push(Instruction::ArrayStore {
                array: array.clone(),
                index: Operand::int(index as i32),
                value: value.code,
            });
        }
        Ok(array)
    }

    /// 导入类名作为接收者时是静态调用
    fn static_receiver(&self, receiver: NodeId) -> Option<String> {
        let NodeKind::VarRef { name } = self.ast.kind(receiver) else {
            return None;
        };
        match self.resolver.lookup_variable(name)? {
            VarBinding::Import(path) => Some(import_simple_name(&path).to_string()),
            _ => None,
        }
    }

    /// 降级方法调用，返回调用本身和计算接收者、实参的指令
    pub(crate) fn lower_call(&mut self, id: NodeId) -> LoweringResult<(Call, Vec<Instruction>)> {
        let ast = self.ast;
        let NodeKind::MethodCallExpr {
            receiver,
            method,
            args,
        } = ast.kind(id)
        else {
            return Err(LoweringError::UnexpectedNode {
                expected: "a method call",
                found: ast.kind(id).name(),
            });
        };

        let mut computation = Vec::new();
        let (invocation, target) = match self.static_receiver(*receiver) {
            Some(class) => (Invocation::Static, Operand::Class(class)),
            None => {
                let target = self.lower_expr(*receiver)?;
                computation.extend(target.computation);
                (Invocation::Virtual, target.code)
            }
        };
        let args = self.lower_args(*receiver, method, args, &mut computation)?;
        let param_types = self.declared_params(*receiver, method, args.len());
        let return_type = self
            .resolver
            .resolve(id)
            .map(|t| ElementType::from(&t))
            .ok_or_else(|| LoweringError::UnknownType {
                construct: format!("the call to '{}'", method),
                pos: ast.pos(id),
            })?;

        Ok((
            Call {
                invocation,
                target,
                method: method.clone(),
                args,
                return_type,
                param_types,
            },
            computation,
        ))
    }

    /// 本类方法按声明的形参类型调用，参数个数对不上时交给实参类型
    fn declared_params(
        &self,
        receiver: NodeId,
        method: &str,
        arity: usize,
    ) -> Option<Vec<ElementType>> {
        if !self.resolver.is_local_receiver(receiver) {
            return None;
        }
        let params = self.table.try_parameters(method)?;
        (params.len() == arity).then(|| params.iter().map(|p| ElementType::from(&p.ty)).collect())
    }

    /// 实参按顺序求值；本类的可变参数方法把尾部实参打包成数组
    fn lower_args(
        &mut self,
        receiver: NodeId,
        method: &str,
        args: &[NodeId],
        computation: &mut Vec<Instruction>,
    ) -> LoweringResult<Vec<Operand>> {
        let table = self.table;
        let packs = self.resolver.is_local_receiver(receiver) && table.has_vararg(method);
        let params = table.try_parameters(method).unwrap_or_default();
        let fixed = if packs {
            params.len().saturating_sub(1).min(args.len())
        } else {
            args.len()
        };

        let mut operands = Vec::with_capacity(fixed + 1);
        for arg in &args[..fixed] {
            let value = self.lower_expr(*arg)?;
            computation.extend(value.computation);
            operands.push(value.code);
        }
        if !packs {
            return Ok(operands);
        }

        let trailing = &args[fixed..];
        if let [single] = trailing {
            if self.resolver.resolve(*single).is_some_and(|t| t.is_array) {
                let value = self.lower_expr(*single)?;
                computation.extend(value.computation);
                operands.push(value.code);
                return Ok(operands);
            }
        }
        let ty = params
            .last()
            .map(|p| ElementType::from(&p.ty))
            .unwrap_or_else(|| ElementType::array_of(ElementType::Int32));
        let array = self.pack_array(trailing, ty, computation)?;
        operands.push(Operand::Variable(array));
        Ok(operands)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{lower_source, method_text};

    fn body(stmts: &str) -> Vec<String> {
        let src = format!(
            "import io; class A {{ int f; int[] xs; public int sum(int a, int... rest) {{ return a; }} public int run(int a, boolean b) {{ {} return 0; }} }}",
            stmts
        );
        method_text(&lower_source(&src), "run")
    }

    #[test]
    fn test_arithmetic_uses_temps() {
        assert_eq!(
            body("a = a * 2 + 1;"),
            vec![
                "tmp0.i32 :=.i32 a.i32 *.i32 2.i32;",
                "a.i32 :=.i32 tmp0.i32 +.i32 1.i32;",
                "ret.i32 0.i32;",
            ]
        );
    }

    #[test]
    fn test_field_read_and_write() {
        assert_eq!(
            body("f = f + a;"),
            vec![
                "tmp0.i32 :=.i32 getfield(this.A, f.i32).i32;",
                "tmp1.i32 :=.i32 tmp0.i32 +.i32 a.i32;",
                "putfield(this.A, f.i32, tmp1.i32).V;",
                "ret.i32 0.i32;",
            ]
        );
    }

    #[test]
    fn test_and_short_circuits() {
        assert_eq!(
            body("b = b && a < 3;"),
            vec![
                "if (b.bool) goto and_true_0;",
                "tmp0.bool :=.bool 0.bool;",
                "goto and_end_0;",
                "and_true_0:",
                "tmp1.bool :=.bool a.i32 <.bool 3.i32;",
                "tmp0.bool :=.bool tmp1.bool;",
                "and_end_0:",
                "b.bool :=.bool tmp0.bool;",
                "ret.i32 0.i32;",
            ]
        );
    }

    #[test]
    fn test_or_short_circuits() {
        let text = body("b = b || !b;");
        assert_eq!(text[0], "if (b.bool) goto or_true_0;");
        assert_eq!(text[1], "tmp1.bool :=.bool !.bool b.bool;");
        assert_eq!(text[4], "or_true_0:");
        assert_eq!(text[5], "tmp0.bool :=.bool 1.bool;");
    }

    #[test]
    fn test_static_and_virtual_calls() {
        let text = body("io.println(a); a = this.sum(a, 1, 2);");
        assert_eq!(text[0], "invokestatic(io, \"println\", a.i32).V;");
        assert_eq!(text[1], "tmp0.array.i32 :=.array.i32 new(array, 2.i32).array.i32;");
        assert_eq!(text[2], "tmp0[0.i32].i32 :=.i32 1.i32;");
        assert_eq!(text[3], "tmp0[1.i32].i32 :=.i32 2.i32;");
        assert_eq!(
            text[4],
            "a.i32 :=.i32 invokevirtual(this.A, \"sum\", a.i32, tmp0.array.i32).i32;"
        );
    }

    #[test]
    fn test_empty_vararg_still_passes_array() {
        let text = body("a = this.sum(a);");
        assert_eq!(text[0], "tmp0.array.i32 :=.array.i32 new(array, 0.i32).array.i32;");
        assert!(text[1].contains("\"sum\", a.i32, tmp0.array.i32"));
    }

    #[test]
    fn test_array_argument_passed_through() {
        let text = body("a = this.sum(a, xs);");
        assert_eq!(text[0], "tmp0.array.i32 :=.array.i32 getfield(this.A, xs.array.i32).array.i32;");
        assert!(text[1].contains("\"sum\", a.i32, tmp0.array.i32).i32"));
        assert_eq!(text.len(), 3);
    }

    #[test]
    fn test_object_creation() {
        let text = body("a = new A().sum(1);");
        assert_eq!(text[0], "tmp0.A :=.A new(A).A;");
        assert_eq!(text[1], "invokespecial(tmp0.A, \"<init>\").V;");
    }

    #[test]
    fn test_arrays() {
        let text = body("xs = new int[a]; a = xs[0] + xs.length; xs[1] = 5;");
        assert_eq!(
            text,
            vec![
                "tmp0.array.i32 :=.array.i32 new(array, a.i32).array.i32;",
                "putfield(this.A, xs.array.i32, tmp0.array.i32).V;",
                "tmp1.array.i32 :=.array.i32 getfield(this.A, xs.array.i32).array.i32;",
                "tmp2.i32 :=.i32 tmp1[0.i32].i32;",
                "tmp3.array.i32 :=.array.i32 getfield(this.A, xs.array.i32).array.i32;",
                "tmp4.i32 :=.i32 arraylength(tmp3.array.i32).i32;",
                "a.i32 :=.i32 tmp2.i32 +.i32 tmp4.i32;",
                // tmp5 被合并进了对 a 的赋值
                "tmp6.array.i32 :=.array.i32 getfield(this.A, xs.array.i32).array.i32;",
                "tmp6[1.i32].i32 :=.i32 5.i32;",
                "ret.i32 0.i32;",
            ]
        );
    }
}
