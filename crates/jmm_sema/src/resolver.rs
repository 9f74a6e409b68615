//! Type Resolver
//!
//! 计算表达式的语义类型，并回答"这个名字指什么"。
//! 分析器、优化器和 IR 生成器共用同一个解析器，保证各阶段对名字的理解一致。
//!
//! 解析器是纯函数式的：不修改语法树，重复调用结果相同。

use crate::table::SymbolTable;
use crate::types::Type;
use jmm_syntax::{Ast, NodeId, NodeKind};

/// 正在分析的方法
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodContext {
    pub name: String,
    pub is_static: bool,
}

impl MethodContext {
    pub fn new(name: impl Into<String>, is_static: bool) -> Self {
        Self {
            name: name.into(),
            is_static,
        }
    }

    /// 读取方法声明节点
    pub fn of(ast: &Ast, method: NodeId) -> Option<Self> {
        match ast.kind(method) {
            NodeKind::MethodDecl {
                name, is_static, ..
            } => Some(Self::new(name.clone(), *is_static)),
            _ => None,
        }
    }

    /// 节点所在方法（节点本身是方法声明时取自身）
    pub fn for_node(ast: &Ast, id: NodeId) -> Option<Self> {
        Self::of(ast, id).or_else(|| Self::of(ast, ast.enclosing_method(id)?))
    }
}

/// 名字绑定到的实体
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VarBinding {
    /// 导入的类，保存完整路径
    Import(String),
    /// 参数及其在参数列表中的下标（从 0 开始）
    Param { index: usize, ty: Type },
    Field(Type),
    Local(Type),
}

impl VarBinding {
    pub fn ty(&self) -> Type {
        match self {
            VarBinding::Import(path) => Type::class(crate::table::import_simple_name(path)),
            VarBinding::Param { ty, .. } | VarBinding::Field(ty) | VarBinding::Local(ty) => {
                ty.clone()
            }
        }
    }

    /// 参数和局部变量：可以做常量传播、占用寄存器
    pub fn is_method_variable(&self) -> bool {
        matches!(self, VarBinding::Param { .. } | VarBinding::Local(_))
    }
}

/// 类型解析器
pub struct TypeResolver<'a> {
    ast: &'a Ast,
    table: &'a SymbolTable,
    method: MethodContext,
}

impl<'a> TypeResolver<'a> {
    pub fn new(ast: &'a Ast, table: &'a SymbolTable, method: MethodContext) -> Self {
        Self { ast, table, method }
    }

    pub fn method(&self) -> &MethodContext {
        &self.method
    }

    pub fn table(&self) -> &'a SymbolTable {
        self.table
    }

    /// 按 导入 -> 参数 -> 字段 -> 局部变量 的顺序查找名字
    ///
    /// 静态方法中不查字段。
    pub fn lookup_variable(&self, name: &str) -> Option<VarBinding> {
        if let Some(path) = self.table.qualified_import(name) {
            return Some(VarBinding::Import(path.to_string()));
        }
        let params = self.table.try_parameters(&self.method.name).unwrap_or_default();
        if let Some(index) = params.iter().position(|p| p.name == name) {
            return Some(VarBinding::Param {
                index,
                ty: params[index].ty.clone(),
            });
        }
        if !self.method.is_static {
            if let Some(field) = self.table.field(name) {
                return Some(VarBinding::Field(field.ty.clone()));
            }
        }
        self.table
            .try_local_variables(&self.method.name)
            .unwrap_or_default()
            .iter()
            .find(|l| l.name == name)
            .map(|l| VarBinding::Local(l.ty.clone()))
    }

    pub fn variable_type(&self, name: &str) -> Option<Type> {
        self.lookup_variable(name).map(|b| b.ty())
    }

    fn current_class(&self) -> Type {
        Type::class(self.table.class_name())
    }

    /// 表达式的类型；语句、声明以及无法解析的名字返回 `None`
    pub fn resolve(&self, id: NodeId) -> Option<Type> {
        match self.ast.kind(id) {
            NodeKind::IntegerLiteral { .. } => Some(Type::int()),
            NodeKind::BooleanLiteral { .. } => Some(Type::boolean()),
            NodeKind::VarRef { name } => self.variable_type(name),
            NodeKind::BinaryExpr { op, .. } => Some(if op.is_arithmetic() {
                Type::int()
            } else {
                Type::boolean()
            }),
            NodeKind::UnaryExpr { operand, .. } => self.resolve(*operand),
            NodeKind::ParenthesisExpr { inner } => self.resolve(*inner),
            NodeKind::ArrayAccessExpr { array, .. } => self.resolve(*array).map(|t| t.element()),
            NodeKind::ArrayLengthExpr { .. } => Some(Type::int()),
            NodeKind::NewObjectExpr { class_name } => Some(Type::class(class_name.clone())),
            NodeKind::NewArrayExpr { element, .. } => Some(Type::from(element).array()),
            NodeKind::ArrayCreationExpr { elements } => match elements.first() {
                Some(first) => self.resolve(*first).map(|t| t.array()),
                None => Some(Type::int_array()),
            },
            NodeKind::ThisExpr => Some(self.current_class()),
            NodeKind::MethodCallExpr {
                receiver, method, ..
            } => Some(self.call_type(id, *receiver, method)),
            NodeKind::Program { .. }
            | NodeKind::ImportDecl { .. }
            | NodeKind::ClassDecl { .. }
            | NodeKind::VarDecl { .. }
            | NodeKind::MethodDecl { .. }
            | NodeKind::Param { .. }
            | NodeKind::AssignStmt { .. }
            | NodeKind::ArrayAssignStmt { .. }
            | NodeKind::ReturnStmt { .. }
            | NodeKind::IfStmt { .. }
            | NodeKind::WhileStmt { .. }
            | NodeKind::BlockStmt { .. }
            | NodeKind::ExprStmt { .. } => None,
        }
    }

    /// 接收者是否为当前类（`this` 或当前类类型的值）
    pub fn is_local_receiver(&self, receiver: NodeId) -> bool {
        matches!(self.ast.kind(receiver), NodeKind::ThisExpr)
            || self.resolve(receiver) == Some(self.current_class())
    }

    fn call_type(&self, call: NodeId, receiver: NodeId, method: &str) -> Type {
        if self.is_local_receiver(receiver) {
            if let Some(ret) = self.table.try_return_type(method) {
                return ret;
            }
        }
        self.call_context_type(call)
    }

    /// 外部方法调用的类型取决于它出现的位置
    pub fn call_context_type(&self, call: NodeId) -> Type {
        let mut child = call;
        let mut parent = self.ast.parent(call);
        while let Some(p) = parent {
            if !matches!(self.ast.kind(p), NodeKind::ParenthesisExpr { .. }) {
                break;
            }
            child = p;
            parent = self.ast.parent(p);
        }
        let Some(parent) = parent else {
            return Type::int();
        };

        match self.ast.kind(parent) {
            NodeKind::AssignStmt { target, .. } => {
                self.variable_type(target).unwrap_or_else(Type::int)
            }
            NodeKind::ArrayAssignStmt { target, index, .. } => {
                if *index == child {
                    Type::int()
                } else {
                    self.variable_type(target)
                        .map(|t| t.element())
                        .unwrap_or_else(Type::int)
                }
            }
            NodeKind::ReturnStmt { .. } => self
                .table
                .try_return_type(&self.method.name)
                .unwrap_or_else(Type::int),
            NodeKind::ExprStmt { .. } => Type::void(),
            NodeKind::BinaryExpr { op, lhs, rhs } => {
                if op.is_arithmetic() || op.is_relational() {
                    Type::int()
                } else if op.is_logical() {
                    Type::boolean()
                } else {
                    let sibling = if *lhs == child { *rhs } else { *lhs };
                    self.sibling_type(sibling)
                }
            }
            NodeKind::UnaryExpr { .. } => Type::boolean(),
            NodeKind::IfStmt { .. } | NodeKind::WhileStmt { .. } => Type::boolean(),
            NodeKind::ArrayAccessExpr { index, .. } => {
                if *index == child {
                    Type::int()
                } else {
                    Type::int_array()
                }
            }
            NodeKind::ArrayLengthExpr { .. } => Type::int_array(),
            NodeKind::MethodCallExpr {
                receiver,
                method,
                args,
            } => {
                if *receiver == child {
                    return Type::class("Object");
                }
                let position = args.iter().position(|a| *a == child).unwrap_or(0);
                self.argument_type(*receiver, method, position)
            }
            NodeKind::NewArrayExpr { .. } => Type::int(),
            NodeKind::ArrayCreationExpr { elements } => elements
                .iter()
                .find(|e| **e != child && !self.is_call(**e))
                .and_then(|e| self.resolve(*e))
                .unwrap_or_else(Type::int),
            NodeKind::Program { .. }
            | NodeKind::ImportDecl { .. }
            | NodeKind::ClassDecl { .. }
            | NodeKind::VarDecl { .. }
            | NodeKind::MethodDecl { .. }
            | NodeKind::Param { .. }
            | NodeKind::BlockStmt { .. }
            | NodeKind::VarRef { .. }
            | NodeKind::IntegerLiteral { .. }
            | NodeKind::BooleanLiteral { .. }
            | NodeKind::ThisExpr
            | NodeKind::NewObjectExpr { .. }
            | NodeKind::ParenthesisExpr { .. } => Type::int(),
        }
    }

    fn is_call(&self, id: NodeId) -> bool {
        let mut id = id;
        while let NodeKind::ParenthesisExpr { inner } = self.ast.kind(id) {
            id = *inner;
        }
        matches!(self.ast.kind(id), NodeKind::MethodCallExpr { .. })
    }

    // 比较运算中另一侧也是调用时无从推断，退回 int
    fn sibling_type(&self, sibling: NodeId) -> Type {
        if self.is_call(sibling) {
            return Type::int();
        }
        self.resolve(sibling).unwrap_or_else(Type::int)
    }

    /// 本类方法第 `position` 个实参期望的类型
    fn argument_type(&self, receiver: NodeId, method: &str, position: usize) -> Type {
        if !self.is_local_receiver(receiver) {
            return Type::int();
        }
        let Some(params) = self.table.try_parameters(method) else {
            return Type::int();
        };
        let vararg = self.table.has_vararg(method);
        match params.get(position) {
            Some(param) if vararg && position + 1 == params.len() => param.ty.element(),
            Some(param) => param.ty.clone(),
            None if vararg => params
                .last()
                .map(|p| p.ty.element())
                .unwrap_or_else(Type::int),
            None => Type::int(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jmm_syntax::parse_ast;

    const SOURCE: &str = r#"
import io;
import java.util.List;
class A {
    int x;
    A other;
    public int foo(int a, boolean... flags) {
        int[] arr;
        boolean b;
        arr = io.make();
        b = io.check() == 3;
        arr[io.idx()] = io.value();
        io.print(this.foo(io.a(), io.b(), io.c()));
        return (io.get());
    }
    public static void main(String[] args) {
        int x;
        x = 1;
    }
}
"#;

    fn setup() -> (Ast, SymbolTable) {
        let ast = parse_ast(SOURCE).unwrap();
        let table = SymbolTable::build(&ast).unwrap();
        (ast, table)
    }

    fn call(ast: &Ast, name: &str) -> NodeId {
        ast.descendants(ast.root())
            .find(|id| matches!(ast.kind(*id), NodeKind::MethodCallExpr { method, .. } if method == name))
            .unwrap()
    }

    #[test]
    fn test_lookup_order() {
        let (ast, table) = setup();
        let foo = TypeResolver::new(&ast, &table, MethodContext::new("foo", false));
        assert_eq!(
            foo.lookup_variable("List"),
            Some(VarBinding::Import("java.util.List".to_string()))
        );
        assert_eq!(
            foo.lookup_variable("flags"),
            Some(VarBinding::Param {
                index: 1,
                ty: Type::new("boolean", true)
            })
        );
        assert_eq!(foo.lookup_variable("x"), Some(VarBinding::Field(Type::int())));
        assert_eq!(foo.lookup_variable("arr"), Some(VarBinding::Local(Type::int_array())));
        assert_eq!(foo.lookup_variable("missing"), None);

        // 静态方法跳过字段，找到的是同名局部变量
        let main = TypeResolver::new(&ast, &table, MethodContext::new("main", true));
        assert_eq!(main.lookup_variable("x"), Some(VarBinding::Local(Type::int())));
        assert_eq!(main.lookup_variable("other"), None);
    }

    #[test]
    fn test_call_context_types() {
        let (ast, table) = setup();
        let r = TypeResolver::new(&ast, &table, MethodContext::new("foo", false));
        assert_eq!(r.resolve(call(&ast, "make")), Some(Type::int_array()));
        assert_eq!(r.resolve(call(&ast, "check")), Some(Type::int()));
        assert_eq!(r.resolve(call(&ast, "idx")), Some(Type::int()));
        assert_eq!(r.resolve(call(&ast, "value")), Some(Type::int()));
        assert_eq!(r.resolve(call(&ast, "print")), Some(Type::void()));
        assert_eq!(r.resolve(call(&ast, "get")), Some(Type::int()));
        // 可变参数的每个实参取元素类型
        assert_eq!(r.resolve(call(&ast, "a")), Some(Type::int()));
        assert_eq!(r.resolve(call(&ast, "b")), Some(Type::boolean()));
        assert_eq!(r.resolve(call(&ast, "c")), Some(Type::boolean()));
    }

    #[test]
    fn test_local_call_uses_declared_return() {
        let (ast, table) = setup();
        let r = TypeResolver::new(&ast, &table, MethodContext::new("foo", false));
        assert_eq!(r.resolve(call(&ast, "foo")), Some(Type::int()));
    }

    #[test]
    fn test_resolution_is_stable() {
        let (ast, table) = setup();
        let r = TypeResolver::new(&ast, &table, MethodContext::new("foo", false));
        for id in ast.descendants(ast.root()) {
            assert_eq!(r.resolve(id), r.resolve(id));
        }
    }

    #[test]
    fn test_method_context_for_node() {
        let (ast, _) = setup();
        let ctx = MethodContext::for_node(&ast, call(&ast, "make")).unwrap();
        assert_eq!(ctx, MethodContext::new("foo", false));
        assert_eq!(MethodContext::for_node(&ast, ast.root()), None);
    }
}
