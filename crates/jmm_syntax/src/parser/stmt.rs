//! Statement Parser
//!
//! 语句解析：代码块、if/else、while、return、赋值、数组元素赋值、表达式语句

use super::expr::expr_parser;
use super::helpers::{ident_parser, ParserError};
use crate::lexer::Token;
use crate::raw::RawNode;
use chumsky::prelude::*;

/// 解析语句
pub fn stmt_parser() -> impl Parser<Token, RawNode, Error = ParserError> + Clone {
    recursive(|stmt| {
        let expr = expr_parser();
        let condition = expr
            .clone()
            .delimited_by(just(Token::LParen), just(Token::RParen));

        // { ... }
        let block = stmt
            .clone()
            .repeated()
            .delimited_by(just(Token::LBrace), just(Token::RBrace))
            .map_with_span(|stmts, span: std::ops::Range<usize>| {
                RawNode::new("BlockStmt")
                    .with_children(stmts)
                    .at_offset(span.start)
            });

        // if (cond) stmt [else stmt]
        let if_stmt = just(Token::If)
            .ignore_then(condition.clone())
            .then(stmt.clone())
            .then(just(Token::Else).ignore_then(stmt.clone()).or_not())
            .map_with_span(|((cond, then_branch), else_branch), span| {
                RawNode::new("IfStmt")
                    .with_child(cond)
                    .with_child(then_branch)
                    .with_children(else_branch)
                    .at_offset(span.start)
            });

        // while (cond) stmt
        let while_stmt = just(Token::While)
            .ignore_then(condition)
            .then(stmt.clone())
            .map_with_span(|(cond, body), span| {
                RawNode::new("WhileStmt")
                    .with_child(cond)
                    .with_child(body)
                    .at_offset(span.start)
            });

        // return [expr];
        let return_stmt = just(Token::Return)
            .ignore_then(expr.clone().or_not())
            .then_ignore(just(Token::Semicolon))
            .map_with_span(|value, span| {
                RawNode::new("ReturnStmt")
                    .with_children(value)
                    .at_offset(span.start)
            });

        // x = expr;
        let assign = ident_parser()
            .then_ignore(just(Token::Assign))
            .then(expr.clone())
            .then_ignore(just(Token::Semicolon))
            .map_with_span(|(target, value), span| {
                RawNode::new("AssignStmt")
                    .with_attr("value", target)
                    .with_child(value)
                    .at_offset(span.start)
            });

        // a[i] = expr;
        let array_assign = ident_parser()
            .then(
                expr.clone()
                    .delimited_by(just(Token::LBracket), just(Token::RBracket)),
            )
            .then_ignore(just(Token::Assign))
            .then(expr.clone())
            .then_ignore(just(Token::Semicolon))
            .map_with_span(|((target, index), value), span| {
                RawNode::new("ArrayAssignStmt")
                    .with_attr("value", target)
                    .with_child(index)
                    .with_child(value)
                    .at_offset(span.start)
            });

        // expr;
        let expr_stmt = expr
            .then_ignore(just(Token::Semicolon))
            .map_with_span(|expr, span| {
                RawNode::new("ExprStmt")
                    .with_child(expr)
                    .at_offset(span.start)
            });

        choice((
            block,
            if_stmt,
            while_stmt,
            return_stmt,
            assign,
            array_assign,
            expr_stmt,
        ))
    })
}
