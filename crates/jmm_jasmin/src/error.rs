//! Jasmin Emission Error Types
//!
//! 字节码生成过程中可能出现的错误

use jmm_diagnostics::{Diagnostic, Stage};
use thiserror::Error;

/// 字节码生成错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JasminError {
    /// 使用了没有分配寄存器的变量
    #[error("variable '{name}' has no register in method '{method}'")]
    UnknownVariable { name: String, method: String },

    /// 类名出现在需要值的位置
    #[error("class '{name}' cannot be used as a value in method '{method}'")]
    ClassAsValue { name: String, method: String },

    /// 虚调用或字段访问的对象不是类类型
    #[error("cannot invoke '{call}' on a value of type {ty} in method '{method}'")]
    InvalidReceiver {
        call: String,
        ty: String,
        method: String,
    },

    /// 局部变量超过 `-r` 给定的上限
    #[error("method '{method}' needs {needed} local registers, but only {limit} are allowed")]
    RegisterLimit {
        method: String,
        needed: usize,
        limit: u16,
    },
}

impl JasminError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string()).stage(Stage::Jasmin);
        match self {
            JasminError::RegisterLimit { .. } => {
                diag.suggest("raise the register limit or split the method")
            }
            _ => diag,
        }
    }
}

/// 字节码生成结果类型
pub type JasminResult<T> = Result<T, JasminError>;
