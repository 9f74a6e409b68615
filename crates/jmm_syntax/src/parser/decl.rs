//! Declaration Parser
//!
//! 导入、类、字段、方法、参数

use super::helpers::{ident_parser, type_parser, ParserError};
use super::stmt::stmt_parser;
use crate::lexer::Token;
use crate::raw::RawNode;
use chumsky::prelude::*;

/// import a.b.C;
pub fn import_parser() -> impl Parser<Token, RawNode, Error = ParserError> + Clone {
    just(Token::Import)
        .ignore_then(ident_parser().separated_by(just(Token::Dot)).at_least(1))
        .then_ignore(just(Token::Semicolon))
        .map_with_span(|segments, span| {
            RawNode::new("ImportDeclaration")
                .with_attr("value", segments.join("."))
                .at_offset(span.start)
        })
}

/// 字段或局部变量: `int[] xs;`
pub fn var_decl_parser() -> impl Parser<Token, RawNode, Error = ParserError> + Clone {
    type_parser()
        .then(ident_parser())
        .then_ignore(just(Token::Semicolon))
        .map_with_span(|(ty, name), span| {
            RawNode::new("VarDecl")
                .with_attr("name", name)
                .with_child(ty)
                .at_offset(span.start)
        })
}

fn param_parser() -> impl Parser<Token, RawNode, Error = ParserError> + Clone {
    type_parser()
        .then(ident_parser())
        .map_with_span(|(ty, name), span| {
            RawNode::new("Param")
                .with_attr("name", name)
                .with_child(ty)
                .at_offset(span.start)
        })
}

/// [public] [static] type name(params) { (varDecl | stmt)* }
pub fn method_parser() -> impl Parser<Token, RawNode, Error = ParserError> + Clone {
    let body = var_decl_parser()
        .or(stmt_parser())
        .repeated()
        .delimited_by(just(Token::LBrace), just(Token::RBrace));

    just(Token::Public)
        .or_not()
        .then(just(Token::Static).or_not())
        .then(type_parser())
        .then(ident_parser())
        .then(
            param_parser()
                .separated_by(just(Token::Comma))
                .delimited_by(just(Token::LParen), just(Token::RParen)),
        )
        .then(body)
        .map_with_span(
            |(((((public, is_static), return_type), name), params), body), span| {
                RawNode::new("MethodDecl")
                    .with_attr("methodName", name)
                    .with_attr("isPublic", public.is_some().to_string())
                    .with_attr("isStatic", is_static.is_some().to_string())
                    .with_child(return_type)
                    .with_children(params)
                    .with_children(body)
                    .at_offset(span.start)
            },
        )
}

/// class A [extends B] { (field | method)* }
pub fn class_parser() -> impl Parser<Token, RawNode, Error = ParserError> + Clone {
    just(Token::Class)
        .ignore_then(ident_parser())
        .then(just(Token::Extends).ignore_then(ident_parser()).or_not())
        .then(
            var_decl_parser()
                .or(method_parser())
                .repeated()
                .delimited_by(just(Token::LBrace), just(Token::RBrace)),
        )
        .map_with_span(|((name, superclass), members), span| {
            let mut node = RawNode::new("ClassDecl").with_attr("name", name);
            if let Some(superclass) = superclass {
                node = node.with_attr("ext", superclass);
            }
            node.with_children(members).at_offset(span.start)
        })
}
