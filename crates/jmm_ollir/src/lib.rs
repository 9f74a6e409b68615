//! Jmm OLLIR
//!
//! 把语法树降级为 OLLIR 风格的三地址码。
//! [`ir`] 定义中间表示及其文本格式，[`generator`] 负责从语法树生成。

pub mod error;
pub mod generator;
pub mod ir;

pub use error::{LoweringError, LoweringResult};
pub use generator::{lower, ExprResult, LabelKind, LoweringContext};
pub use ir::{
    BinaryOperator, Call, ClassUnit, ElementType, Expression, Instruction, Invocation, Method,
    Operand, Variable,
};
