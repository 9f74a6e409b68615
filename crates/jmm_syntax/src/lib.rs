//! Jmm Syntax
//!
//! Java-- 前端：词法分析、语法分析、原始语法树以及编译器核心使用的强类型语法树。
//!
//! ```text
//! source --lexer/parser--> RawNode --Ast::from_raw--> Ast
//! ```

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod raw;

pub use ast::{Ast, BinaryOp, Node, NodeId, NodeKind, TypeExpr, UnaryOp};
pub use error::{SyntaxError, TreeError};
pub use raw::RawNode;

use chumsky::{Parser, Stream};
use jmm_diagnostics::LineIndex;
use lexer::Token;
use logos::Logos;

/// 解析源代码，得到带行列位置的原始语法树
pub fn parse(source: &str) -> Result<RawNode, Vec<SyntaxError>> {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();
    for (token, span) in Token::lexer(source).spanned() {
        match token {
            Ok(token) => tokens.push((token, span)),
            Err(()) => errors.push(SyntaxError::UnknownToken {
                text: source[span.clone()].to_string(),
                span,
            }),
        }
    }
    if !errors.is_empty() {
        return Err(errors);
    }
    log::trace!("lexed {} tokens", tokens.len());

    let eoi = source.len()..source.len();
    let mut program = parser::program_parser()
        .parse(Stream::from_iter(eoi, tokens.into_iter()))
        .map_err(|errs| errs.into_iter().map(SyntaxError::from).collect::<Vec<_>>())?;

    program.resolve_positions(&LineIndex::new(source));
    Ok(program)
}

/// 解析并转换为强类型语法树
///
/// 语法错误和树形状错误都以 `Err` 返回，便于测试直接使用。
pub fn parse_ast(source: &str) -> Result<Ast, Vec<String>> {
    let raw = parse(source).map_err(|errs| errs.iter().map(|e| e.to_string()).collect::<Vec<_>>())?;
    Ast::from_raw(&raw).map_err(|e| vec![e.to_string()])
}
