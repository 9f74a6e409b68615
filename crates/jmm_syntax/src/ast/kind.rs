//! Node Kinds
//!
//! 封闭的节点种类枚举。每个 pass 都对它做穷尽匹配，
//! 新增节点种类时编译器会指出所有需要处理的地方。

use super::NodeId;
use std::fmt;

/// 源码中书写的类型
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeExpr {
    Int,
    Boolean,
    String,
    Void,
    Class(String),
    /// `T[]`，只允许一层
    Array(Box<TypeExpr>),
    /// `T...`，只允许出现在最后一个参数上
    VarArgs(Box<TypeExpr>),
}

impl TypeExpr {
    /// 元素类型名（数组取其元素）
    pub fn base_name(&self) -> &str {
        match self {
            TypeExpr::Int => "int",
            TypeExpr::Boolean => "boolean",
            TypeExpr::String => "String",
            TypeExpr::Void => "void",
            TypeExpr::Class(name) => name,
            TypeExpr::Array(elem) | TypeExpr::VarArgs(elem) => elem.base_name(),
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, TypeExpr::Array(_) | TypeExpr::VarArgs(_))
    }

    pub fn is_vararg(&self) -> bool {
        matches!(self, TypeExpr::VarArgs(_))
    }

    /// 类类型名（包括类类型的数组）
    pub fn class_name(&self) -> Option<&str> {
        match self {
            TypeExpr::Class(name) => Some(name),
            TypeExpr::Array(elem) | TypeExpr::VarArgs(elem) => elem.class_name(),
            _ => None,
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Array(elem) => write!(f, "{}[]", elem),
            TypeExpr::VarArgs(elem) => write!(f, "{}...", elem),
            other => f.write_str(other.base_name()),
        }
    }
}

/// 二元运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

impl BinaryOp {
    pub fn parse(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "<" => BinaryOp::Lt,
            ">" => BinaryOp::Gt,
            "<=" => BinaryOp::Le,
            ">=" => BinaryOp::Ge,
            "==" => BinaryOp::Eq,
            "!=" => BinaryOp::Ne,
            "&&" => BinaryOp::And,
            "||" => BinaryOp::Or,
            _ => return None,
        })
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    /// `+ - * /`
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div
        )
    }

    /// `< > <= >=`
    pub fn is_relational(&self) -> bool {
        matches!(
            self,
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge
        )
    }

    /// `&& ||`
    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// 一元运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
}

impl UnaryOp {
    pub fn parse(symbol: &str) -> Option<Self> {
        match symbol {
            "!" => Some(UnaryOp::Not),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
        }
    }
}

/// 语法树节点种类
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// 顶层条目：导入声明和类声明，按源码顺序
    Program {
        items: Vec<NodeId>,
    },
    ImportDecl {
        /// 点分全名，如 `java.util.List`
        path: String,
    },
    ClassDecl {
        name: String,
        superclass: Option<String>,
        fields: Vec<NodeId>,
        methods: Vec<NodeId>,
    },
    VarDecl {
        name: String,
        ty: TypeExpr,
    },
    MethodDecl {
        name: String,
        is_public: bool,
        is_static: bool,
        return_type: TypeExpr,
        params: Vec<NodeId>,
        locals: Vec<NodeId>,
        body: Vec<NodeId>,
    },
    Param {
        name: String,
        ty: TypeExpr,
    },

    // 语句
    AssignStmt {
        target: String,
        value: NodeId,
    },
    ArrayAssignStmt {
        target: String,
        index: NodeId,
        value: NodeId,
    },
    ReturnStmt {
        value: Option<NodeId>,
    },
    IfStmt {
        condition: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
    },
    WhileStmt {
        condition: NodeId,
        body: NodeId,
    },
    BlockStmt {
        stmts: Vec<NodeId>,
    },
    ExprStmt {
        expr: NodeId,
    },

    // 表达式
    BinaryExpr {
        op: BinaryOp,
        lhs: NodeId,
        rhs: NodeId,
    },
    UnaryExpr {
        op: UnaryOp,
        operand: NodeId,
    },
    VarRef {
        name: String,
    },
    IntegerLiteral {
        value: i32,
    },
    BooleanLiteral {
        value: bool,
    },
    ThisExpr,
    NewObjectExpr {
        class_name: String,
    },
    NewArrayExpr {
        element: TypeExpr,
        size: NodeId,
    },
    ArrayCreationExpr {
        elements: Vec<NodeId>,
    },
    ArrayAccessExpr {
        array: NodeId,
        index: NodeId,
    },
    ArrayLengthExpr {
        array: NodeId,
    },
    MethodCallExpr {
        receiver: NodeId,
        method: String,
        args: Vec<NodeId>,
    },
    ParenthesisExpr {
        inner: NodeId,
    },
}

impl NodeKind {
    /// 按源码顺序列出直接子节点
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            NodeKind::Program { items } => items.clone(),
            NodeKind::ClassDecl {
                fields, methods, ..
            } => fields.iter().chain(methods).copied().collect(),
            NodeKind::MethodDecl {
                params,
                locals,
                body,
                ..
            } => params.iter().chain(locals).chain(body).copied().collect(),
            NodeKind::AssignStmt { value, .. } => vec![*value],
            NodeKind::ArrayAssignStmt { index, value, .. } => vec![*index, *value],
            NodeKind::ReturnStmt { value } => value.iter().copied().collect(),
            NodeKind::IfStmt {
                condition,
                then_branch,
                else_branch,
            } => {
                let mut ids = vec![*condition, *then_branch];
                ids.extend(else_branch);
                ids
            }
            NodeKind::WhileStmt { condition, body } => vec![*condition, *body],
            NodeKind::BlockStmt { stmts } => stmts.clone(),
            NodeKind::ExprStmt { expr } => vec![*expr],
            NodeKind::BinaryExpr { lhs, rhs, .. } => vec![*lhs, *rhs],
            NodeKind::UnaryExpr { operand, .. } => vec![*operand],
            NodeKind::NewArrayExpr { size, .. } => vec![*size],
            NodeKind::ArrayCreationExpr { elements } => elements.clone(),
            NodeKind::ArrayAccessExpr { array, index } => vec![*array, *index],
            NodeKind::ArrayLengthExpr { array } => vec![*array],
            NodeKind::MethodCallExpr { receiver, args, .. } => {
                let mut ids = vec![*receiver];
                ids.extend(args);
                ids
            }
            NodeKind::ParenthesisExpr { inner } => vec![*inner],
            NodeKind::ImportDecl { .. }
            | NodeKind::VarDecl { .. }
            | NodeKind::Param { .. }
            | NodeKind::VarRef { .. }
            | NodeKind::IntegerLiteral { .. }
            | NodeKind::BooleanLiteral { .. }
            | NodeKind::ThisExpr
            | NodeKind::NewObjectExpr { .. } => Vec::new(),
        }
    }

    /// 节点种类名，与原始语法树的 `kind` 一致
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Program { .. } => "Program",
            NodeKind::ImportDecl { .. } => "ImportDeclaration",
            NodeKind::ClassDecl { .. } => "ClassDecl",
            NodeKind::VarDecl { .. } => "VarDecl",
            NodeKind::MethodDecl { .. } => "MethodDecl",
            NodeKind::Param { .. } => "Param",
            NodeKind::AssignStmt { .. } => "AssignStmt",
            NodeKind::ArrayAssignStmt { .. } => "ArrayAssignStmt",
            NodeKind::ReturnStmt { .. } => "ReturnStmt",
            NodeKind::IfStmt { .. } => "IfStmt",
            NodeKind::WhileStmt { .. } => "WhileStmt",
            NodeKind::BlockStmt { .. } => "BlockStmt",
            NodeKind::ExprStmt { .. } => "ExprStmt",
            NodeKind::BinaryExpr { .. } => "BinaryExpr",
            NodeKind::UnaryExpr { .. } => "UnaryExpr",
            NodeKind::VarRef { .. } => "VarRef",
            NodeKind::IntegerLiteral { .. } => "IntegerLiteral",
            NodeKind::BooleanLiteral { .. } => "BooleanLiteral",
            NodeKind::ThisExpr => "ThisExpr",
            NodeKind::NewObjectExpr { .. } => "NewObjectExpr",
            NodeKind::NewArrayExpr { .. } => "NewArrayExpr",
            NodeKind::ArrayCreationExpr { .. } => "ArrayCreationExpr",
            NodeKind::ArrayAccessExpr { .. } => "ArrayAccessExpr",
            NodeKind::ArrayLengthExpr { .. } => "ArrayLengthExpr",
            NodeKind::MethodCallExpr { .. } => "MethodCallExpr",
            NodeKind::ParenthesisExpr { .. } => "ParenthesisExpr",
        }
    }

    /// 声明节点引入的名字
    pub fn declared_name(&self) -> Option<&str> {
        match self {
            NodeKind::ClassDecl { name, .. }
            | NodeKind::VarDecl { name, .. }
            | NodeKind::MethodDecl { name, .. }
            | NodeKind::Param { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            NodeKind::IntegerLiteral { .. } | NodeKind::BooleanLiteral { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_expr_queries() {
        let varargs = TypeExpr::VarArgs(Box::new(TypeExpr::Int));
        assert!(varargs.is_array());
        assert!(varargs.is_vararg());
        assert_eq!(varargs.base_name(), "int");
        assert_eq!(varargs.to_string(), "int...");

        let objects = TypeExpr::Array(Box::new(TypeExpr::Class("Node".into())));
        assert_eq!(objects.class_name(), Some("Node"));
        assert_eq!(objects.to_string(), "Node[]");
        assert_eq!(TypeExpr::Boolean.class_name(), None);
    }

    #[test]
    fn test_binary_op_round_trip() {
        for symbol in ["+", "-", "*", "/", "<", ">", "<=", ">=", "==", "!=", "&&", "||"] {
            let op = BinaryOp::parse(symbol).unwrap();
            assert_eq!(op.symbol(), symbol);
        }
        assert_eq!(BinaryOp::parse("%"), None);
        assert!(BinaryOp::Div.is_arithmetic());
        assert!(BinaryOp::Ge.is_relational());
        assert!(BinaryOp::Or.is_logical());
        assert!(!BinaryOp::Eq.is_relational());
    }
}
