//! Type Compatibility
//!
//! 赋值兼容性：类型相同即兼容。除此之外，编译器看不到导入类的继承关系，
//! 只能假定它们兼容，见 [`TypeCompat::assume_external`]。

use crate::table::SymbolTable;
use crate::types::Type;

pub struct TypeCompat<'a> {
    table: &'a SymbolTable,
}

impl<'a> TypeCompat<'a> {
    pub fn new(table: &'a SymbolTable) -> Self {
        Self { table }
    }

    /// `value` 能否赋给 `target`
    pub fn assignable(&self, target: &Type, value: &Type) -> bool {
        target == value || self.assume_external(target, value)
    }

    /// 涉及导入类或父类时的宽松规则
    ///
    /// 这是一个近似：导入类之间、导入类与当前类之间都按兼容处理，
    /// 真正的检查留给 JVM 的校验器。基本类型永远不与类类型兼容。
    pub fn assume_external(&self, target: &Type, value: &Type) -> bool {
        if target.is_array != value.is_array {
            return false;
        }
        if target.is_primitive_name() || value.is_primitive_name() {
            return false;
        }

        let class = self.table.class_name();
        let target_imported = self.table.is_imported(&target.name);
        let value_imported = self.table.is_imported(&value.name);

        if target_imported && value_imported {
            return true;
        }
        if let Some(sup) = self.table.super_class() {
            if (value.name == class && target.name == sup)
                || (target.name == class && value.name == sup)
            {
                return true;
            }
            // 父类是导入的，当前类可能继承了任意类型
            if value.name == class || target.name == class {
                return true;
            }
        }
        if target_imported {
            return true;
        }
        value_imported && target.name != class
    }
}
