//! Raw Syntax Tree
//!
//! 语法分析器输出的通用节点：字符串类型的 `kind`、扁平的字符串属性表和有序子节点。
//! 编译器核心不直接消费它，而是在 [`crate::ast::Ast::from_raw`] 中一次性转换成强类型语法树。
//!
//! 属性约定：
//! - `value`：字面量文本、变量/方法/类/导入名
//! - `name`：类、字段、局部变量、参数名
//! - `ext`：父类名
//! - `methodName`、`isPublic`、`isStatic`：方法声明
//! - `op`：运算符
//! - `line` / `col`：源码位置（从 1 开始）

use jmm_diagnostics::{LineIndex, Position};
use std::collections::BTreeMap;
use std::fmt;

/// 语法分析阶段临时记录的字节偏移属性
pub(crate) const OFFSET_ATTR: &str = "offset";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawNode {
    pub kind: String,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<RawNode>,
}

impl RawNode {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: RawNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = RawNode>) -> Self {
        self.children.extend(children);
        self
    }

    /// 记录源码位置
    pub fn at(self, position: Position) -> Self {
        self.with_attr("line", position.line.to_string())
            .with_attr("col", position.column.to_string())
    }

    pub(crate) fn at_offset(self, offset: usize) -> Self {
        self.with_attr(OFFSET_ATTR, offset.to_string())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// 布尔属性，只有 `"true"` 视为真
    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key) == Some("true")
    }

    pub fn child(&self, index: usize) -> Option<&RawNode> {
        self.children.get(index)
    }

    pub fn is(&self, kind: &str) -> bool {
        self.kind == kind
    }

    /// 节点上记录的位置，缺失时为未知位置
    pub fn position(&self) -> Position {
        let read = |key| self.get(key).and_then(|v| v.parse().ok()).unwrap_or(0);
        Position::new(read("line"), read("col"))
    }

    /// 把分析阶段记录的字节偏移换算成行列号
    pub(crate) fn resolve_positions(&mut self, index: &LineIndex) {
        if let Some(offset) = self.attributes.remove(OFFSET_ATTR) {
            if let Ok(offset) = offset.parse::<usize>() {
                let position = index.position(offset);
                self.attributes
                    .insert("line".to_string(), position.line.to_string());
                self.attributes
                    .insert("col".to_string(), position.column.to_string());
            }
        }
        for child in &mut self.children {
            child.resolve_positions(index);
        }
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        write!(f, "{:indent$}{}", "", self.kind, indent = depth * 2)?;
        let attrs: Vec<String> = self
            .attributes
            .iter()
            .filter(|(k, _)| !matches!(k.as_str(), "line" | "col"))
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        if !attrs.is_empty() {
            write!(f, " ({})", attrs.join(", "))?;
        }
        writeln!(f)?;
        for child in &self.children {
            child.write_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

/// 缩进形式的树，调试用
impl fmt::Display for RawNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}
