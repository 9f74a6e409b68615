//! Symbol Table Builder
//!
//! 对语法树做一次遍历，收集导入、类头、字段和方法签名。
//! 顶层结构不合法或父类没有导入时直接失败。

use super::{import_simple_name, SymbolTable};
use crate::error::SymbolTableError;
use crate::symbol::Symbol;
use crate::types::Type;
use jmm_syntax::{Ast, NodeId, NodeKind};

impl SymbolTable {
    /// 从语法树构建符号表
    pub fn build(ast: &Ast) -> Result<SymbolTable, SymbolTableError> {
        let mut table = SymbolTable::default();
        let mut class = None;

        for item in ast.children(ast.root()) {
            match ast.kind(item) {
                NodeKind::ImportDecl { path } => {
                    if class.is_some() {
                        return Err(SymbolTableError::ImportAfterClass);
                    }
                    table.imports.push(path.clone());
                }
                NodeKind::ClassDecl { name, .. } => {
                    if class.is_some() {
                        return Err(SymbolTableError::MultipleClasses(name.clone()));
                    }
                    class = Some(item);
                }
                _ => {}
            }
        }

        let class = class.ok_or(SymbolTableError::MissingClass)?;
        let NodeKind::ClassDecl {
            name,
            superclass,
            fields,
            methods,
        } = ast.kind(class)
        else {
            return Err(SymbolTableError::MissingClass);
        };

        if let Some(sup) = superclass {
            let imported = table
                .imports
                .iter()
                .any(|path| import_simple_name(path) == sup);
            if !imported {
                return Err(SymbolTableError::ExtendsNotImported(sup.clone()));
            }
        }
        table.class_name = name.clone();
        table.super_class = superclass.clone();
        table.fields = fields.iter().filter_map(|id| declared_symbol(ast, *id)).collect();

        for method in methods {
            table.add_method(ast, *method);
        }

        log::debug!(
            "symbol table for '{}': {} imports, {} fields, {} methods",
            table.class_name,
            table.imports.len(),
            table.fields.len(),
            table.methods.len()
        );
        Ok(table)
    }

    fn add_method(&mut self, ast: &Ast, id: NodeId) {
        let NodeKind::MethodDecl {
            name,
            return_type,
            params,
            locals,
            ..
        } = ast.kind(id)
        else {
            return;
        };

        self.methods.push(name.clone());
        // 重复声明的方法以第一次出现为准，重复本身由分析器报告
        if self.params.contains_key(name) {
            return;
        }

        if name != "main" {
            self.return_types.insert(name.clone(), Type::from(return_type));
        }
        let is_vararg = params.last().is_some_and(|last| {
            matches!(ast.kind(*last), NodeKind::Param { ty, .. } if ty.is_vararg())
        });
        if is_vararg {
            self.varargs.insert(name.clone());
        }
        self.params.insert(
            name.clone(),
            params.iter().filter_map(|p| declared_symbol(ast, *p)).collect(),
        );
        self.locals.insert(
            name.clone(),
            locals.iter().filter_map(|l| declared_symbol(ast, *l)).collect(),
        );
    }
}

fn declared_symbol(ast: &Ast, id: NodeId) -> Option<Symbol> {
    match ast.kind(id) {
        NodeKind::VarDecl { name, ty } | NodeKind::Param { name, ty } => {
            Some(Symbol::new(name.clone(), Type::from(ty)))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jmm_syntax::parse_ast;

    fn build(src: &str) -> Result<SymbolTable, SymbolTableError> {
        SymbolTable::build(&parse_ast(src).unwrap())
    }

    #[test]
    fn test_collects_signatures() {
        let table = build(
            r#"
            import io;
            import java.util.List;
            class A extends List {
                int x;
                boolean[] flags;
                public int foo(int a, A other) { int t; boolean u; return a; }
                public static void main(String[] args) { A a; }
            }
            "#,
        )
        .unwrap();

        assert_eq!(table.imports(), ["io", "java.util.List"]);
        assert_eq!(table.class_name(), "A");
        assert_eq!(table.super_class(), Some("List"));
        assert_eq!(
            table.fields(),
            [
                Symbol::new("x", Type::int()),
                Symbol::new("flags", Type::new("boolean", true)),
            ]
        );
        assert_eq!(table.methods(), ["foo", "main"]);
        assert_eq!(table.return_type("foo"), Ok(Type::int()));
        assert_eq!(table.return_type("main"), Ok(Type::void()));
        assert_eq!(
            table.parameters("foo").unwrap(),
            [
                Symbol::new("a", Type::int()),
                Symbol::new("other", Type::class("A")),
            ]
        );
        assert_eq!(
            table.parameters("main").unwrap(),
            [Symbol::new("args", Type::new("String", true))]
        );
        // 局部变量保留各自声明的类型
        assert_eq!(
            table.local_variables("foo").unwrap(),
            [Symbol::new("t", Type::int()), Symbol::new("u", Type::boolean())]
        );
        assert!(table.is_imported("List"));
        assert_eq!(table.qualified_import("List"), Some("java.util.List"));
    }

    #[test]
    fn test_unknown_method_queries() {
        let table = build("class A { }").unwrap();
        assert_eq!(
            table.parameters("nope"),
            Err(SymbolTableError::UnknownMethod("nope".to_string()))
        );
        assert_eq!(table.try_local_variables("nope"), None);
        assert_eq!(table.try_return_type("nope"), None);
    }

    #[test]
    fn test_vararg_recorded() {
        let table = build("class A { int sum(int... xs) { return 0; } int first(int[] xs) { return 0; } }")
            .unwrap();
        assert!(table.has_vararg("sum"));
        assert!(!table.has_vararg("first"));
        assert_eq!(table.parameters("sum").unwrap()[0].ty, Type::int_array());
    }

    #[test]
    fn test_extends_must_be_imported() {
        assert_eq!(
            build("class A extends B { }"),
            Err(SymbolTableError::ExtendsNotImported("B".to_string()))
        );
        assert!(build("import x.y.B; class A extends B { }").is_ok());
    }

    #[test]
    fn test_top_level_shape() {
        assert_eq!(
            build("class A { } import io;"),
            Err(SymbolTableError::ImportAfterClass)
        );
        assert_eq!(
            build("class A { } class B { }"),
            Err(SymbolTableError::MultipleClasses("B".to_string()))
        );
        assert_eq!(build("import io;"), Err(SymbolTableError::MissingClass));
    }
}
