//! Raw -> Typed 转换
//!
//! 语法分析器和编译器核心之间唯一的边界。属性名和子节点位置的约定只在这里出现，
//! 转换完成后所有 pass 都只面对强类型的 [`NodeKind`]。

use super::{Ast, BinaryOp, NodeId, NodeKind, TypeExpr, UnaryOp};
use crate::error::TreeError;
use crate::raw::RawNode;

const STATEMENT_KINDS: &[&str] = &[
    "AssignStmt",
    "ArrayAssignStmt",
    "ReturnStmt",
    "IfStmt",
    "WhileStmt",
    "BlockStmt",
    "ExprStmt",
];

const TYPE_KINDS: &[&str] = &[
    "IntType",
    "BooleanType",
    "StringType",
    "VoidType",
    "ClassType",
    "ArrayType",
    "VarArgsType",
];

impl Ast {
    /// 把语法分析器产生的原始树转换为强类型语法树
    pub fn from_raw(raw: &RawNode) -> Result<Ast, TreeError> {
        let mut ast = Ast {
            nodes: Vec::new(),
            root: NodeId(0),
        };
        ast.root = ast.convert(raw)?;
        log::trace!("converted raw tree into {} typed nodes", ast.len());
        Ok(ast)
    }

    fn convert(&mut self, raw: &RawNode) -> Result<NodeId, TreeError> {
        let kind = match raw.kind.as_str() {
            "Program" => {
                let mut items = Vec::with_capacity(raw.children.len());
                for child in &raw.children {
                    if !child.is("ImportDeclaration") && !child.is("ClassDecl") {
                        return Err(unexpected(raw, "an import or class declaration", child));
                    }
                    items.push(self.convert(child)?);
                }
                NodeKind::Program { items }
            }
            "ImportDeclaration" => NodeKind::ImportDecl {
                path: attr(raw, "value")?,
            },
            "ClassDecl" => {
                let mut fields = Vec::new();
                let mut methods = Vec::new();
                for child in &raw.children {
                    match child.kind.as_str() {
                        "VarDecl" => fields.push(self.convert(child)?),
                        "MethodDecl" => methods.push(self.convert(child)?),
                        _ => return Err(unexpected(raw, "a field or method", child)),
                    }
                }
                NodeKind::ClassDecl {
                    name: attr(raw, "name")?,
                    superclass: raw.get("ext").map(str::to_string),
                    fields,
                    methods,
                }
            }
            "VarDecl" => NodeKind::VarDecl {
                name: attr(raw, "name")?,
                ty: convert_type(child(raw, 0)?)?,
            },
            "Param" => NodeKind::Param {
                name: attr(raw, "name")?,
                ty: convert_type(child(raw, 0)?)?,
            },
            "MethodDecl" => self.convert_method(raw)?,
            "AssignStmt" => NodeKind::AssignStmt {
                target: attr(raw, "value")?,
                value: self.convert_child(raw, 0)?,
            },
            "ArrayAssignStmt" => NodeKind::ArrayAssignStmt {
                target: attr(raw, "value")?,
                index: self.convert_child(raw, 0)?,
                value: self.convert_child(raw, 1)?,
            },
            "ReturnStmt" => NodeKind::ReturnStmt {
                value: match raw.child(0) {
                    Some(value) => Some(self.convert(value)?),
                    None => None,
                },
            },
            "IfStmt" => NodeKind::IfStmt {
                condition: self.convert_child(raw, 0)?,
                then_branch: self.convert_child(raw, 1)?,
                else_branch: match raw.child(2) {
                    Some(branch) => Some(self.convert(branch)?),
                    None => None,
                },
            },
            "WhileStmt" => NodeKind::WhileStmt {
                condition: self.convert_child(raw, 0)?,
                body: self.convert_child(raw, 1)?,
            },
            "BlockStmt" => NodeKind::BlockStmt {
                stmts: self.convert_all(&raw.children)?,
            },
            "ExprStmt" => NodeKind::ExprStmt {
                expr: self.convert_child(raw, 0)?,
            },
            "BinaryExpr" => {
                let op = attr(raw, "op")?;
                NodeKind::BinaryExpr {
                    op: BinaryOp::parse(&op).ok_or(TreeError::UnknownOperator {
                        context: "binary",
                        op,
                    })?,
                    lhs: self.convert_child(raw, 0)?,
                    rhs: self.convert_child(raw, 1)?,
                }
            }
            "UnaryExpr" => {
                let op = attr(raw, "op")?;
                NodeKind::UnaryExpr {
                    op: UnaryOp::parse(&op).ok_or(TreeError::UnknownOperator {
                        context: "unary",
                        op,
                    })?,
                    operand: self.convert_child(raw, 0)?,
                }
            }
            "VarRef" => NodeKind::VarRef {
                name: attr(raw, "value")?,
            },
            "IntegerLiteral" => {
                let text = attr(raw, "value")?;
                match text.parse::<i32>() {
                    Ok(value) => NodeKind::IntegerLiteral { value },
                    Err(_) => {
                        return Err(TreeError::InvalidLiteral {
                            kind: "integer",
                            text,
                        })
                    }
                }
            }
            "BooleanLiteral" => match attr(raw, "value")?.as_str() {
                "true" => NodeKind::BooleanLiteral { value: true },
                "false" => NodeKind::BooleanLiteral { value: false },
                other => {
                    return Err(TreeError::InvalidLiteral {
                        kind: "boolean",
                        text: other.to_string(),
                    })
                }
            },
            "ThisExpr" => NodeKind::ThisExpr,
            "NewObjectExpr" => NodeKind::NewObjectExpr {
                class_name: attr(raw, "value")?,
            },
            "NewArrayExpr" => NodeKind::NewArrayExpr {
                // 语法上只有 `new int[n]`，缺省按 int 处理
                element: raw.get("value").map_or(TypeExpr::Int, named_type),
                size: self.convert_child(raw, 0)?,
            },
            "ArrayCreationExpr" => NodeKind::ArrayCreationExpr {
                elements: self.convert_all(&raw.children)?,
            },
            "ArrayAccessExpr" => NodeKind::ArrayAccessExpr {
                array: self.convert_child(raw, 0)?,
                index: self.convert_child(raw, 1)?,
            },
            "ArrayLengthExpr" => NodeKind::ArrayLengthExpr {
                array: self.convert_child(raw, 0)?,
            },
            "MethodCallExpr" => {
                let receiver = self.convert_child(raw, 0)?;
                NodeKind::MethodCallExpr {
                    receiver,
                    method: attr(raw, "value")?,
                    args: self.convert_all(&raw.children[1..])?,
                }
            }
            "ParenthesisExpr" => NodeKind::ParenthesisExpr {
                inner: self.convert_child(raw, 0)?,
            },
            other => return Err(TreeError::UnknownKind(other.to_string())),
        };
        Ok(self.push(kind, raw.position()))
    }

    fn convert_method(&mut self, raw: &RawNode) -> Result<NodeKind, TreeError> {
        let mut return_type = None;
        let mut params = Vec::new();
        let mut locals = Vec::new();
        let mut body = Vec::new();

        for child in &raw.children {
            let kind = child.kind.as_str();
            if TYPE_KINDS.contains(&kind) {
                if return_type.is_some() {
                    return Err(unexpected(raw, "a single return type", child));
                }
                return_type = Some(convert_type(child)?);
            } else if kind == "Param" {
                params.push(self.convert(child)?);
            } else if kind == "VarDecl" {
                locals.push(self.convert(child)?);
            } else if STATEMENT_KINDS.contains(&kind) {
                body.push(self.convert(child)?);
            } else {
                return Err(unexpected(raw, "a parameter, local or statement", child));
            }
        }

        Ok(NodeKind::MethodDecl {
            name: attr(raw, "methodName")?,
            is_public: raw.get_bool("isPublic"),
            is_static: raw.get_bool("isStatic"),
            return_type: return_type.unwrap_or(TypeExpr::Void),
            params,
            locals,
            body,
        })
    }

    fn convert_child(&mut self, raw: &RawNode, index: usize) -> Result<NodeId, TreeError> {
        let node = child(raw, index)?;
        self.convert(node)
    }

    fn convert_all(&mut self, raws: &[RawNode]) -> Result<Vec<NodeId>, TreeError> {
        raws.iter().map(|raw| self.convert(raw)).collect()
    }
}

fn attr(raw: &RawNode, key: &str) -> Result<String, TreeError> {
    raw.get(key)
        .map(str::to_string)
        .ok_or_else(|| TreeError::MissingAttribute {
            kind: raw.kind.clone(),
            attribute: key.to_string(),
        })
}

fn child(raw: &RawNode, index: usize) -> Result<&RawNode, TreeError> {
    raw.child(index).ok_or_else(|| TreeError::MissingChild {
        kind: raw.kind.clone(),
        index,
    })
}

fn unexpected(parent: &RawNode, expected: &'static str, found: &RawNode) -> TreeError {
    TreeError::UnexpectedChild {
        kind: parent.kind.clone(),
        expected,
        found: found.kind.clone(),
    }
}

fn named_type(name: &str) -> TypeExpr {
    match name {
        "int" => TypeExpr::Int,
        "boolean" => TypeExpr::Boolean,
        "String" => TypeExpr::String,
        "void" => TypeExpr::Void,
        other => TypeExpr::Class(other.to_string()),
    }
}

fn convert_type(raw: &RawNode) -> Result<TypeExpr, TreeError> {
    match raw.kind.as_str() {
        "IntType" => Ok(TypeExpr::Int),
        "BooleanType" => Ok(TypeExpr::Boolean),
        "StringType" => Ok(TypeExpr::String),
        "VoidType" => Ok(TypeExpr::Void),
        "ClassType" => Ok(TypeExpr::Class(attr(raw, "value")?)),
        "ArrayType" | "VarArgsType" => {
            let elem = child(raw, 0)?;
            if elem.is("ArrayType") || elem.is("VarArgsType") {
                return Err(unexpected(raw, "a non-array element type", elem));
            }
            let elem = Box::new(convert_type(elem)?);
            Ok(if raw.is("ArrayType") {
                TypeExpr::Array(elem)
            } else {
                TypeExpr::VarArgs(elem)
            })
        }
        _ => Err(TreeError::UnexpectedChild {
            kind: "type".to_string(),
            expected: "a type node",
            found: raw.kind.clone(),
        }),
    }
}
