//! 编译期常量值

use jmm_syntax::NodeKind;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstValue {
    Int(i32),
    Bool(bool),
}

impl ConstValue {
    /// 字面量节点的值
    pub fn of(kind: &NodeKind) -> Option<Self> {
        match kind {
            NodeKind::IntegerLiteral { value } => Some(ConstValue::Int(*value)),
            NodeKind::BooleanLiteral { value } => Some(ConstValue::Bool(*value)),
            _ => None,
        }
    }

    pub fn to_node(self) -> NodeKind {
        match self {
            ConstValue::Int(value) => NodeKind::IntegerLiteral { value },
            ConstValue::Bool(value) => NodeKind::BooleanLiteral { value },
        }
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Int(v) => write!(f, "{}", v),
            ConstValue::Bool(v) => write!(f, "{}", v),
        }
    }
}
