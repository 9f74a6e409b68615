//! Constant Folding
//!
//! 后序遍历，操作数都是字面量的表达式就地替换为结果。
//! 整数运算按 Java `int` 语义回绕；除以字面量 0 不折叠，保留给运行时抛出异常。

use crate::constant::ConstValue;
use jmm_syntax::{Ast, BinaryOp, NodeId, NodeKind, UnaryOp};

#[derive(Default)]
pub struct ConstantFolding {
    folded: usize,
}

impl ConstantFolding {
    pub fn new() -> Self {
        Self::default()
    }

    /// 累计折叠的节点数
    pub fn folded(&self) -> usize {
        self.folded
    }

    /// 执行一遍折叠，返回是否修改了语法树
    pub fn run(&mut self, ast: &mut Ast) -> bool {
        let root = ast.root();
        self.fold(ast, root)
    }

    fn fold(&mut self, ast: &mut Ast, id: NodeId) -> bool {
        let mut changed = false;
        for child in ast.children(id) {
            changed |= self.fold(ast, child);
        }
        if let Some(value) = evaluate(ast, id) {
            log::trace!("folding {} {} into {}", ast.kind(id).name(), id, value);
            ast.replace(id, value.to_node());
            self.folded += 1;
            changed = true;
        }
        changed
    }
}

/// 节点能在编译期求值时返回结果
fn evaluate(ast: &Ast, id: NodeId) -> Option<ConstValue> {
    let literal = |child: &NodeId| ConstValue::of(ast.kind(*child));
    match ast.kind(id) {
        NodeKind::BinaryExpr { op, lhs, rhs } => fold_binary(*op, literal(lhs)?, literal(rhs)?),
        NodeKind::UnaryExpr {
            op: UnaryOp::Not,
            operand,
        } => match literal(operand)? {
            ConstValue::Bool(value) => Some(ConstValue::Bool(!value)),
            ConstValue::Int(_) => None,
        },
        NodeKind::ParenthesisExpr { inner } => literal(inner),
        NodeKind::Program { .. }
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
        | NodeKind::ExprStmt { .. }
        | NodeKind::VarRef { .. }
        | NodeKind::IntegerLiteral { .. }
        | NodeKind::BooleanLiteral { .. }
        | NodeKind::ThisExpr
        | NodeKind::NewObjectExpr { .. }
        | NodeKind::NewArrayExpr { .. }
        | NodeKind::ArrayCreationExpr { .. }
        | NodeKind::ArrayAccessExpr { .. }
        | NodeKind::ArrayLengthExpr { .. }
        | NodeKind::MethodCallExpr { .. } => None,
    }
}

pub fn fold_binary(op: BinaryOp, lhs: ConstValue, rhs: ConstValue) -> Option<ConstValue> {
    use ConstValue::{Bool, Int};

    Some(match (lhs, rhs) {
        (Int(a), Int(b)) => match op {
            BinaryOp::Add => Int(a.wrapping_add(b)),
            BinaryOp::Sub => Int(a.wrapping_sub(b)),
            BinaryOp::Mul => Int(a.wrapping_mul(b)),
            BinaryOp::Div if b == 0 => return None,
            BinaryOp::Div => Int(a.wrapping_div(b)),
            BinaryOp::Lt => Bool(a < b),
            BinaryOp::Gt => Bool(a > b),
            BinaryOp::Le => Bool(a <= b),
            BinaryOp::Ge => Bool(a >= b),
            BinaryOp::Eq => Bool(a == b),
            BinaryOp::Ne => Bool(a != b),
            BinaryOp::And | BinaryOp::Or => return None,
        },
        (Bool(a), Bool(b)) => match op {
            BinaryOp::And => Bool(a && b),
            BinaryOp::Or => Bool(a || b),
            BinaryOp::Eq => Bool(a == b),
            BinaryOp::Ne => Bool(a != b),
            _ => return None,
        },
        _ => return None,
    })
}
