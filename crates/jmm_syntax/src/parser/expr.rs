//! Expression Parser
//!
//! 优先级从低到高：`||`、`&&`、`== !=`、`< > <= >=`、`+ -`、`* /`、`!`、后缀（`[i]`、`.length`、`.m(..)`）

use super::helpers::{ident_parser, inherit_offset, ParserError};
use crate::lexer::Token;
use crate::raw::RawNode;
use chumsky::prelude::*;

/// 后缀操作
#[derive(Clone)]
enum Postfix {
    Index(RawNode),
    Length,
    Call(String, Vec<RawNode>),
}

fn binary(op: &str, lhs: RawNode, rhs: RawNode) -> RawNode {
    let node = RawNode::new("BinaryExpr").with_attr("op", op);
    inherit_offset(node, &lhs).with_child(lhs).with_child(rhs)
}

/// 解析表达式 (公共接口)
pub fn expr_parser() -> impl Parser<Token, RawNode, Error = ParserError> + Clone {
    recursive(|expr| {
        let args = expr
            .clone()
            .separated_by(just(Token::Comma))
            .delimited_by(just(Token::LParen), just(Token::RParen));

        // 字面量
        let integer = select! { Token::Integer(value) => value }.map_with_span(|value, span: std::ops::Range<usize>| {
            RawNode::new("IntegerLiteral")
                .with_attr("value", value)
                .at_offset(span.start)
        });
        let boolean = select! {
            Token::True => "true",
            Token::False => "false",
        }
        .map_with_span(|value, span: std::ops::Range<usize>| {
            RawNode::new("BooleanLiteral")
                .with_attr("value", value)
                .at_offset(span.start)
        });

        let this = just(Token::This)
            .map_with_span(|_, span: std::ops::Range<usize>| RawNode::new("ThisExpr").at_offset(span.start));

        let var = ident_parser().map_with_span(|name, span| {
            RawNode::new("VarRef")
                .with_attr("value", name)
                .at_offset(span.start)
        });

        let paren = expr
            .clone()
            .delimited_by(just(Token::LParen), just(Token::RParen))
            .map_with_span(|inner, span: std::ops::Range<usize>| {
                RawNode::new("ParenthesisExpr")
                    .with_child(inner)
                    .at_offset(span.start)
            });

        // new int[n]
        let new_array = just(Token::New)
            .ignore_then(select! {
                Token::TypeInt => "int",
                Token::TypeBoolean => "boolean",
            })
            .then(
                expr.clone()
                    .delimited_by(just(Token::LBracket), just(Token::RBracket)),
            )
            .map_with_span(|(element, size), span: std::ops::Range<usize>| {
                RawNode::new("NewArrayExpr")
                    .with_attr("value", element)
                    .with_child(size)
                    .at_offset(span.start)
            });

        // new A()
        let new_object = just(Token::New)
            .ignore_then(ident_parser())
            .then_ignore(just(Token::LParen))
            .then_ignore(just(Token::RParen))
            .map_with_span(|name, span| {
                RawNode::new("NewObjectExpr")
                    .with_attr("value", name)
                    .at_offset(span.start)
            });

        // [a, b, c]
        let array_literal = expr
            .clone()
            .separated_by(just(Token::Comma))
            .delimited_by(just(Token::LBracket), just(Token::RBracket))
            .map_with_span(|elements, span: std::ops::Range<usize>| {
                RawNode::new("ArrayCreationExpr")
                    .with_children(elements)
                    .at_offset(span.start)
            });

        let atom = choice((
            integer,
            boolean,
            this,
            new_array,
            new_object,
            array_literal,
            paren,
            var,
        ));

        let member = just(Token::Dot)
            .ignore_then(ident_parser())
            .then(args.or_not())
            .try_map(|(name, args), span| match args {
                Some(args) => Ok(Postfix::Call(name, args)),
                None if name == "length" => Ok(Postfix::Length),
                None => Err(Simple::custom(
                    span,
                    format!("expected '(' after '.{}'", name),
                )),
            });
        let index = expr
            .clone()
            .delimited_by(just(Token::LBracket), just(Token::RBracket))
            .map(Postfix::Index);

        let postfix = atom
            .then(index.or(member).repeated())
            .foldl(|lhs, postfix| {
                let node = match postfix {
                    Postfix::Index(index) => RawNode::new("ArrayAccessExpr")
                        .with_child(lhs.clone())
                        .with_child(index),
                    Postfix::Length => RawNode::new("ArrayLengthExpr")
                        .with_attr("value", "length")
                        .with_child(lhs.clone()),
                    Postfix::Call(method, args) => RawNode::new("MethodCallExpr")
                        .with_attr("value", method)
                        .with_child(lhs.clone())
                        .with_children(args),
                };
                inherit_offset(node, &lhs)
            });

        // 一元运算符 (!)
        let unary = just(Token::Bang)
            .map_with_span(|_, span: std::ops::Range<usize>| span.start)
            .repeated()
            .then(postfix)
            .foldr(|start, operand| {
                RawNode::new("UnaryExpr")
                    .with_attr("op", "!")
                    .with_child(operand)
                    .at_offset(start)
            });

        // 乘除
        let product = unary
            .clone()
            .then(
                just(Token::Star)
                    .to("*")
                    .or(just(Token::Slash).to("/"))
                    .then(unary)
                    .repeated(),
            )
            .foldl(|lhs, (op, rhs)| binary(op, lhs, rhs));

        // 加减
        let sum = product
            .clone()
            .then(
                just(Token::Plus)
                    .to("+")
                    .or(just(Token::Minus).to("-"))
                    .then(product)
                    .repeated(),
            )
            .foldl(|lhs, (op, rhs)| binary(op, lhs, rhs));

        // 关系比较
        let relational = sum
            .clone()
            .then(
                choice((
                    just(Token::Leq).to("<="),
                    just(Token::Geq).to(">="),
                    just(Token::Lt).to("<"),
                    just(Token::Gt).to(">"),
                ))
                .then(sum)
                .repeated(),
            )
            .foldl(|lhs, (op, rhs)| binary(op, lhs, rhs));

        // 相等比较
        let equality = relational
            .clone()
            .then(
                just(Token::EqEq)
                    .to("==")
                    .or(just(Token::NotEq).to("!="))
                    .then(relational)
                    .repeated(),
            )
            .foldl(|lhs, (op, rhs)| binary(op, lhs, rhs));

        let and = equality
            .clone()
            .then(just(Token::AndAnd).to("&&").then(equality).repeated())
            .foldl(|lhs, (op, rhs)| binary(op, lhs, rhs));

        and.clone()
            .then(just(Token::OrOr).to("||").then(and).repeated())
            .foldl(|lhs, (op, rhs)| binary(op, lhs, rhs))
    })
}
