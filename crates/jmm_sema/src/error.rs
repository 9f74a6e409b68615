//! Semantic Analysis Error Types
//!
//! - [`SemanticError`]：语义诊断，作为数据收集，不中断分析
//! - [`SymbolTableError`]：符号表构建失败或查询不存在的方法，属于致命错误

use jmm_diagnostics::{Diagnostic, Position, Stage, Suggestion};
use thiserror::Error;

/// 语义分析错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SemanticError {
    // ============ 重复声明 ============
    #[error("Method {name} is duplicated")]
    DuplicateMethod { name: String, pos: Position },

    #[error("Field {name} is duplicated")]
    DuplicateField { name: String, pos: Position },

    #[error("Local Variable {name} is duplicated")]
    DuplicateLocal { name: String, pos: Position },

    #[error("Parameter {name} is duplicated")]
    DuplicateParameter { name: String, pos: Position },

    #[error("Import {name} is duplicated")]
    DuplicateImport { name: String, pos: Position },

    // ============ 结构规则 ============
    #[error("Varargs must be the last parameter declared")]
    VarargsNotLast { pos: Position },

    #[error("Varargs cannot be defined in the declaration of {name}")]
    VarargsNotAllowed { name: String, pos: Position },

    #[error("Cannot use this token in a static method")]
    ThisInStaticMethod { pos: Position },

    #[error("Main method not declared static.")]
    MainNotStatic { pos: Position },

    #[error("Method {name} declared static.")]
    UnexpectedStatic { name: String, pos: Position },

    #[error("Class {name} not declared")]
    ClassNotDeclared { name: String, pos: Position },

    #[error("Cannot assign a value to a non static field in a static method")]
    FieldInStaticMethod { name: String, pos: Position },

    #[error("Method {method} can reach its end without returning a value")]
    MissingReturn { method: String, pos: Position },

    // ============ 类型错误 ============
    #[error("Type mismatch in the Binary Expression {right} with {left}")]
    BinaryOperandMismatch {
        left: String,
        right: String,
        pos: Position,
    },

    #[error("Operator '{op}' cannot be applied to {found}")]
    InvalidOperand {
        op: String,
        found: String,
        pos: Position,
    },

    #[error("Type mismatch in the condition of the {construct} statement")]
    ConditionNotBoolean {
        construct: &'static str,
        pos: Position,
    },

    #[error("Type mismatch in the assignment of the variable {name}")]
    AssignmentMismatch {
        name: String,
        expected: String,
        found: String,
        pos: Position,
    },

    #[error("Variable {name} is not an array")]
    NotAnArray { name: String, pos: Position },

    #[error("Array index must be an integer, found {found}")]
    IndexNotInteger { found: String, pos: Position },

    #[error("Type mismatch in the Assignment of the Array {name}")]
    ArrayElementMismatch { name: String, pos: Position },

    #[error("Type mismatch in the array creation expression")]
    ArrayCreationMismatch { pos: Position },

    #[error("Type mismatch in the return of method {method}: expected {expected}, found {found}")]
    ReturnMismatch {
        method: String,
        expected: String,
        found: String,
        pos: Position,
    },

    // ============ 名称解析 ============
    #[error("Variable {name} not declared")]
    UndeclaredVariable { name: String, pos: Position },

    #[error("Method {name} not declared")]
    UndeclaredMethod { name: String, pos: Position },

    #[error("Cannot invoke method {method} on type {ty}")]
    InvalidReceiver {
        method: String,
        ty: String,
        pos: Position,
    },

    #[error("Invalid number of parameters in call to {method}: expected {expected}, found {found}")]
    ArgumentCount {
        method: String,
        expected: usize,
        found: usize,
        pos: Position,
    },

    #[error("Type mismatch in the parameters of the method {method}")]
    ArgumentMismatch {
        method: String,
        expected: String,
        found: String,
        pos: Position,
    },
}

impl SemanticError {
    /// 获取错误发生的位置
    pub fn pos(&self) -> Position {
        match self {
            Self::DuplicateMethod { pos, .. }
            | Self::DuplicateField { pos, .. }
            | Self::DuplicateLocal { pos, .. }
            | Self::DuplicateParameter { pos, .. }
            | Self::DuplicateImport { pos, .. }
            | Self::VarargsNotLast { pos }
            | Self::VarargsNotAllowed { pos, .. }
            | Self::ThisInStaticMethod { pos }
            | Self::MainNotStatic { pos }
            | Self::UnexpectedStatic { pos, .. }
            | Self::ClassNotDeclared { pos, .. }
            | Self::FieldInStaticMethod { pos, .. }
            | Self::MissingReturn { pos, .. }
            | Self::BinaryOperandMismatch { pos, .. }
            | Self::InvalidOperand { pos, .. }
            | Self::ConditionNotBoolean { pos, .. }
            | Self::AssignmentMismatch { pos, .. }
            | Self::NotAnArray { pos, .. }
            | Self::IndexNotInteger { pos, .. }
            | Self::ArrayElementMismatch { pos, .. }
            | Self::ArrayCreationMismatch { pos }
            | Self::ReturnMismatch { pos, .. }
            | Self::UndeclaredVariable { pos, .. }
            | Self::UndeclaredMethod { pos, .. }
            | Self::InvalidReceiver { pos, .. }
            | Self::ArgumentCount { pos, .. }
            | Self::ArgumentMismatch { pos, .. } => *pos,
        }
    }

    /// 转换为统一诊断
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string())
            .stage(Stage::Semantic)
            .at(self.pos());
        match self {
            Self::AssignmentMismatch {
                expected, found, ..
            }
            | Self::ArgumentMismatch {
                expected, found, ..
            } => diag.with_note(format!("expected '{}', found '{}'", expected, found)),
            Self::UndeclaredVariable { name, .. } => {
                diag.suggest(format!("declare '{}' as a field, parameter or local", name))
            }
            Self::ClassNotDeclared { name, .. } => {
                diag.with_suggestion(
                    Suggestion::new(format!("add an import for '{}'", name))
                        .with_replacement(format!("import {};", name)),
                )
            }
            _ => diag,
        }
    }
}

/// 符号表错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SymbolTableError {
    #[error("imports must precede the class declaration")]
    ImportAfterClass,

    #[error("only one class may be declared per file, found a second class '{0}'")]
    MultipleClasses(String),

    #[error("no class declaration found")]
    MissingClass,

    #[error("You cant extend a class that you didnt import: {0}")]
    ExtendsNotImported(String),

    #[error("method '{0}' is not declared")]
    UnknownMethod(String),
}

impl SymbolTableError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.to_string()).stage(Stage::Semantic)
    }
}
