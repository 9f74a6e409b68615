//! Parser Helper Functions
//!
//! 辅助解析函数：标识符、类型

use crate::lexer::Token;
use crate::raw::{RawNode, OFFSET_ATTR};
use chumsky::prelude::*;

pub type ParserError = Simple<Token>;

/// 解析标识符
pub fn ident_parser() -> impl Parser<Token, String, Error = ParserError> + Clone {
    select! { Token::Ident(ident) => ident }
}

/// 解析类型: `int`、`boolean`、`String`、`void`、类名，后面可跟 `[]` 或 `...`
pub fn type_parser() -> impl Parser<Token, RawNode, Error = ParserError> + Clone {
    let basic = select! {
        Token::TypeInt => RawNode::new("IntType"),
        Token::TypeBoolean => RawNode::new("BooleanType"),
        Token::TypeString => RawNode::new("StringType"),
        Token::TypeVoid => RawNode::new("VoidType"),
    };
    let class = ident_parser().map(|name| RawNode::new("ClassType").with_attr("value", name));

    let suffix = just(Token::LBracket)
        .then(just(Token::RBracket))
        .to("ArrayType")
        .or(just(Token::Ellipsis).to("VarArgsType"));

    basic
        .or(class)
        .then(suffix.or_not())
        .map(|(elem, suffix)| match suffix {
            Some(kind) => RawNode::new(kind).with_child(elem),
            None => elem,
        })
}

/// 新节点沿用 `from` 的起始位置（用于左结合的后缀、二元表达式）
pub(crate) fn inherit_offset(mut node: RawNode, from: &RawNode) -> RawNode {
    if let Some(offset) = from.get(OFFSET_ATTR) {
        node.attributes
            .insert(OFFSET_ATTR.to_string(), offset.to_string());
    }
    node
}
