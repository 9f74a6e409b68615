//! Jmm Jasmin
//!
//! 把 OLLIR 编译单元翻译为 Jasmin 汇编文本。
//!
//! - [`descriptor`] - 类型描述符与类路径
//! - [`registers`] - 局部变量寄存器分配
//! - [`stack`] - 操作数栈深度模拟
//! - [`method`] - 方法体指令选择

pub mod descriptor;
pub mod error;
pub mod method;
pub mod registers;
pub mod stack;

pub use descriptor::Descriptors;
pub use error::{JasminError, JasminResult};
pub use method::{EmittedMethod, MethodEmitter};

use jmm_ollir::ClassUnit;

/// 生成选项
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitOptions {
    /// 每个方法可用的局部变量寄存器上限
    pub register_limit: Option<u16>,
}

/// 用默认选项生成整个类
pub fn emit(unit: &ClassUnit) -> JasminResult<String> {
    emit_with(unit, &EmitOptions::default())
}

pub fn emit_with(unit: &ClassUnit, options: &EmitOptions) -> JasminResult<String> {
    let descriptors = Descriptors::new(unit);
    let super_path = descriptors.super_path(unit.super_class.as_deref());

    let mut out = format!(".class public {}\n.super {}\n", unit.name, super_path);
    if !unit.fields.is_empty() {
        out.push('\n');
    }
    for field in &unit.fields {
        out.push_str(&format!(
            ".field public {} {}\n",
            field.name,
            descriptors.type_descriptor(&field.ty)
        ));
    }

    // 默认构造函数
    out.push_str("\n.method public <init>()V\n");
    out.push_str("    aload_0\n");
    out.push_str(&format!("    invokespecial {}/<init>()V\n", super_path));
    out.push_str("    return\n");
    out.push_str(".end method\n");

    for method in &unit.methods {
        let emitted = MethodEmitter::new(method, &descriptors).emit(options.register_limit)?;
        out.push('\n');
        out.push_str(&emitted.render());
    }

    log::debug!(
        "emitted Jasmin for class '{}' ({} methods)",
        unit.name,
        unit.methods.len()
    );
    Ok(out)
}
