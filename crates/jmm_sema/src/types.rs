//! Type - 语义层面的类型
//!
//! Java-- 的类型只有名字和"是否数组"两个维度，数组只有一层。

use jmm_syntax::TypeExpr;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Type {
    pub name: String,
    pub is_array: bool,
}

impl Type {
    pub fn new(name: impl Into<String>, is_array: bool) -> Self {
        Self {
            name: name.into(),
            is_array,
        }
    }

    pub fn int() -> Self {
        Self::new("int", false)
    }

    pub fn boolean() -> Self {
        Self::new("boolean", false)
    }

    pub fn void() -> Self {
        Self::new("void", false)
    }

    pub fn int_array() -> Self {
        Self::new("int", true)
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::new(name, false)
    }

    /// 数组的元素类型
    pub fn element(&self) -> Type {
        Self::new(self.name.clone(), false)
    }

    /// 以当前类型为元素的数组
    pub fn array(&self) -> Type {
        Self::new(self.name.clone(), true)
    }

    pub fn is_int(&self) -> bool {
        !self.is_array && self.name == "int"
    }

    pub fn is_boolean(&self) -> bool {
        !self.is_array && self.name == "boolean"
    }

    pub fn is_void(&self) -> bool {
        !self.is_array && self.name == "void"
    }

    /// 基本类型（含其数组）不能作为方法调用的接收者
    pub fn is_primitive_name(&self) -> bool {
        matches!(self.name.as_str(), "int" | "boolean" | "void")
    }

    /// 非数组的类类型（包括 `String`）
    pub fn is_object(&self) -> bool {
        !self.is_array && !self.is_primitive_name()
    }
}

impl From<&TypeExpr> for Type {
    fn from(expr: &TypeExpr) -> Self {
        Type::new(expr.base_name(), expr.is_array())
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_array {
            write!(f, "{}[]", self.name)
        } else {
            f.write_str(&self.name)
        }
    }
}
