//! OLLIR Generator
//!
//! 把通过语义分析（可能已经优化过）的语法树降级为 [`ClassUnit`]。
//! 表达式和语句的降级分别在 `expr` 和 `stmt` 子模块中。

mod context;
mod expr;
mod stmt;

pub use context::{ExprResult, LabelKind, LoweringContext};

use crate::error::{LoweringError, LoweringResult};
use crate::ir::{ClassUnit, ElementType, Expression, Instruction, Method, Operand, Variable};
use jmm_sema::{MethodContext, SymbolTable, Type, TypeResolver};
use jmm_syntax::{Ast, NodeId, NodeKind};

/// 生成整个类的 IR
pub fn lower(ast: &Ast, table: &SymbolTable) -> LoweringResult<ClassUnit> {
    let mut ctx = LoweringContext::new(table);
    let methods = ast
        .methods()
        .into_iter()
        .map(|method| lower_method(ast, table, &mut ctx, method))
        .collect::<LoweringResult<Vec<_>>>()?;

    let unit = ClassUnit {
        imports: table.imports().to_vec(),
        name: table.class_name().to_string(),
        super_class: table.super_class().map(str::to_string),
        fields: table
            .fields()
            .iter()
            .map(|f| Variable::new(f.name.clone(), ElementType::from(&f.ty)))
            .collect(),
        methods,
    };
    log::debug!(
        "lowered class '{}' into {} method(s)",
        unit.name,
        unit.methods.len()
    );
    Ok(unit)
}

fn lower_method(
    ast: &Ast,
    table: &SymbolTable,
    ctx: &mut LoweringContext,
    method: NodeId,
) -> LoweringResult<Method> {
    let NodeKind::MethodDecl {
        name,
        is_public,
        is_static,
        return_type,
        params,
        body,
        ..
    } = ast.kind(method)
    else {
        return Err(LoweringError::UnexpectedNode {
            expected: "a method declaration",
            found: ast.kind(method).name(),
        });
    };

    let params = params
        .iter()
        .map(|p| match ast.kind(*p) {
            NodeKind::Param { name, ty } => {
                Ok(Variable::new(name.clone(), ElementType::from(&Type::from(ty))))
            }
            other => Err(LoweringError::UnexpectedNode {
                expected: "a parameter",
                found: other.name(),
            }),
        })
        .collect::<LoweringResult<Vec<_>>>()?;
    let return_type = ElementType::from(&Type::from(return_type));

    let resolver = TypeResolver::new(ast, table, MethodContext::new(name.clone(), *is_static));
    let mut lowering = MethodLowering {
        ast,
        table,
        resolver,
        ctx,
    };
    let mut instructions = Vec::new();
    for stmt in body {
        lowering.lower_stmt(*stmt, &mut instructions)?;
    }
    if return_type == ElementType::Void
        && !matches!(instructions.last(), Some(Instruction::Return(_)))
    {
        instructions.push(Instruction::Return(None));
    }

    log::trace!("lowered method '{}' into {} instructions", name, instructions.len());
    Ok(Method {
        name: name.clone(),
        is_public: *is_public,
        is_static: *is_static,
        params,
        return_type,
        instructions,
    })
}

/// 单个方法的降级状态
pub(crate) struct MethodLowering<'a, 'c> {
    ast: &'a Ast,
    table: &'a SymbolTable,
    resolver: TypeResolver<'a>,
    ctx: &'c mut LoweringContext,
}

impl MethodLowering<'_, '_> {
    fn temp(&mut self, ty: ElementType) -> Variable {
        Variable::new(self.ctx.new_temp(), ty)
    }

    /// 把表达式的值存入新的临时变量
    fn assign_temp(&mut self, value: Expression, computation: &mut Vec<Instruction>) -> Operand {
        let dest = self.temp(value.ty());
        computation.push(Instruction::Assign {
            dest: dest.clone(),
            value,
        });
        Operand::Variable(dest)
    }

    /// 需要变量的地方（数组下标访问、`arraylength`）
    fn into_variable(&mut self, result: ExprResult, computation: &mut Vec<Instruction>) -> Variable {
        computation.extend(result.computation);
        match result.code {
            Operand::Variable(var) => var,
            other => {
                let dest = self.temp(other.ty());
                computation.push(Instruction::Assign {
                    dest: dest.clone(),
                    value: Expression::Single(other),
                });
                dest
            }
        }
    }

    fn this(&self) -> Operand {
        Operand::This(self.table.class_name().to_string())
    }
}
