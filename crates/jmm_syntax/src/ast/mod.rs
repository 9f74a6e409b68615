//! Typed Syntax Tree
//!
//! 基于 arena 的强类型语法树。节点存放在连续的 `Vec` 中，用 [`NodeId`] 索引，
//! 每个节点记录父节点和源码位置。
//!
//! 优化器通过 [`Ast::replace`] 原地改写节点：新内容写回同一个槽位，
//! 父节点的子节点引用无需修改。

mod convert;
mod kind;

pub use kind::{BinaryOp, NodeKind, TypeExpr, UnaryOp};

use jmm_diagnostics::Position;
use std::fmt;

/// 节点索引
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ast {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Ast {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn pos(&self, id: NodeId) -> Position {
        self.node(id).pos
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.kind(id).children()
    }

    /// 原地替换节点内容，保留位置和父节点
    ///
    /// 新内容引用的子节点会被挂到该节点下。被替换掉的旧子节点仍留在 arena 中，
    /// 但不再能从根节点到达。
    pub fn replace(&mut self, id: NodeId, kind: NodeKind) {
        for child in kind.children() {
            self.nodes[child.index()].parent = Some(id);
        }
        self.nodes[id.index()].kind = kind;
    }

    fn items(&self) -> &[NodeId] {
        match self.kind(self.root) {
            NodeKind::Program { items } => items,
            _ => &[],
        }
    }

    /// 第一个类声明；顶层结构是否合法由符号表构建器检查
    pub fn class_decl(&self) -> Option<NodeId> {
        self.items()
            .iter()
            .copied()
            .find(|id| matches!(self.kind(*id), NodeKind::ClassDecl { .. }))
    }

    pub fn imports(&self) -> Vec<NodeId> {
        self.items()
            .iter()
            .copied()
            .filter(|id| matches!(self.kind(*id), NodeKind::ImportDecl { .. }))
            .collect()
    }

    pub fn methods(&self) -> Vec<NodeId> {
        match self.class_decl().map(|id| self.kind(id)) {
            Some(NodeKind::ClassDecl { methods, .. }) => methods.clone(),
            _ => Vec::new(),
        }
    }

    pub fn fields(&self) -> Vec<NodeId> {
        match self.class_decl().map(|id| self.kind(id)) {
            Some(NodeKind::ClassDecl { fields, .. }) => fields.clone(),
            _ => Vec::new(),
        }
    }

    /// 向上查找最近的满足条件的祖先（不含自身）
    pub fn ancestor(&self, id: NodeId, pred: impl Fn(&NodeKind) -> bool) -> Option<NodeId> {
        let mut current = self.parent(id);
        while let Some(node) = current {
            if pred(self.kind(node)) {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    /// 所在的方法声明
    pub fn enclosing_method(&self, id: NodeId) -> Option<NodeId> {
        self.ancestor(id, |k| matches!(k, NodeKind::MethodDecl { .. }))
    }

    /// 先序遍历 `id` 为根的子树（含自身）
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            ast: self,
            stack: vec![id],
        }
    }

    fn push(&mut self, kind: NodeKind, pos: Position) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        for child in kind.children() {
            self.nodes[child.index()].parent = Some(id);
        }
        self.nodes.push(Node {
            kind,
            parent: None,
            pos,
        });
        id
    }
}

/// 先序遍历迭代器
pub struct Descendants<'a> {
    ast: &'a Ast,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        let children = self.ast.children(id);
        self.stack.extend(children.into_iter().rev());
        Some(id)
    }
}
