//! Parser Module
//!
//! Java-- 的语法分析器，输出通用的 [`RawNode`] 树。
//! 顶层只做宽松的结构解析，导入和类声明的顺序由符号表构建器检查。

pub mod decl;
pub mod expr;
pub mod helpers;
pub mod stmt;

pub use helpers::ParserError;

use crate::lexer::Token;
use crate::raw::RawNode;
use chumsky::prelude::*;

/// 主入口：解析整个程序
pub fn program_parser() -> impl Parser<Token, RawNode, Error = ParserError> {
    decl::import_parser()
        .or(decl::class_parser())
        .repeated()
        .map_with_span(|items, span: std::ops::Range<usize>| {
            RawNode::new("Program")
                .with_children(items)
                .at_offset(span.start)
        })
        .then_ignore(end())
}
