//! Symbol Table
//!
//! 构建完成后只读。每个方法相关的查询都有两个版本：
//! 严格版本返回 `Result`，方法不存在时报 [`SymbolTableError::UnknownMethod`]；
//! `try_` 版本返回 `Option`。

mod builder;

use crate::error::SymbolTableError;
use crate::symbol::Symbol;
use crate::types::Type;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// 导入名取最后一段：`java.util.List` -> `List`
pub fn import_simple_name(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    imports: Vec<String>,
    class_name: String,
    super_class: Option<String>,
    /// 声明顺序，重复的方法名也保留
    methods: Vec<String>,
    fields: Vec<Symbol>,
    return_types: HashMap<String, Type>,
    params: HashMap<String, Vec<Symbol>>,
    locals: HashMap<String, Vec<Symbol>>,
    /// 最后一个参数声明为 `T...` 的方法
    varargs: HashSet<String>,
}

impl SymbolTable {
    pub fn imports(&self) -> &[String] {
        &self.imports
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn super_class(&self) -> Option<&str> {
        self.super_class.as_deref()
    }

    pub fn fields(&self) -> &[Symbol] {
        &self.fields
    }

    pub fn methods(&self) -> &[String] {
        &self.methods
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.iter().any(|m| m == name)
    }

    pub fn field(&self, name: &str) -> Option<&Symbol> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// 返回类型；`main` 固定为 `void`
    pub fn return_type(&self, method: &str) -> Result<Type, SymbolTableError> {
        self.try_return_type(method)
            .ok_or_else(|| SymbolTableError::UnknownMethod(method.to_string()))
    }

    pub fn try_return_type(&self, method: &str) -> Option<Type> {
        if method == "main" {
            return Some(Type::void());
        }
        self.return_types.get(method).cloned()
    }

    pub fn parameters(&self, method: &str) -> Result<&[Symbol], SymbolTableError> {
        self.try_parameters(method)
            .ok_or_else(|| SymbolTableError::UnknownMethod(method.to_string()))
    }

    pub fn try_parameters(&self, method: &str) -> Option<&[Symbol]> {
        self.params.get(method).map(Vec::as_slice)
    }

    pub fn local_variables(&self, method: &str) -> Result<&[Symbol], SymbolTableError> {
        self.try_local_variables(method)
            .ok_or_else(|| SymbolTableError::UnknownMethod(method.to_string()))
    }

    pub fn try_local_variables(&self, method: &str) -> Option<&[Symbol]> {
        self.locals.get(method).map(Vec::as_slice)
    }

    /// 方法的最后一个参数是否为可变参数
    pub fn has_vararg(&self, method: &str) -> bool {
        self.varargs.contains(method)
    }

    /// 按最后一段匹配导入
    pub fn is_imported(&self, name: &str) -> bool {
        self.qualified_import(name).is_some()
    }

    /// 由简单名找到完整的导入路径
    pub fn qualified_import(&self, name: &str) -> Option<&str> {
        self.imports
            .iter()
            .map(String::as_str)
            .find(|path| import_simple_name(path) == name)
    }
}

/// 便于调试的多行摘要
impl fmt::Display for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for import in &self.imports {
            writeln!(f, "import {}", import)?;
        }
        match &self.super_class {
            Some(sup) => writeln!(f, "class {} extends {}", self.class_name, sup)?,
            None => writeln!(f, "class {}", self.class_name)?,
        }
        for field in &self.fields {
            writeln!(f, "  field {}", field)?;
        }
        for method in &self.methods {
            let ret = self.try_return_type(method).unwrap_or_else(Type::void);
            let params: Vec<String> = self
                .try_parameters(method)
                .unwrap_or_default()
                .iter()
                .map(Symbol::to_string)
                .collect();
            writeln!(f, "  method {} {}({})", ret, method, params.join(", "))?;
        }
        Ok(())
    }
}
