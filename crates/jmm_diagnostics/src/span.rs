//! Span / Position - 源码位置信息
//!
//! `Span` 是字节偏移区间，语法分析阶段使用；
//! `Position` 是 1 起始的行列号，语法树节点和语义诊断使用。
//! `LineIndex` 负责两者之间的换算。

use std::fmt;

/// 源码位置范围 (字节偏移)
pub type Span = std::ops::Range<usize>;

/// Span 辅助函数
pub trait SpanExt {
    fn new(start: usize, end: usize) -> Self;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool;
    /// 合并两个区间，得到覆盖二者的最小区间
    fn merge(&self, other: &Self) -> Self;
}

impl SpanExt for Span {
    fn new(start: usize, end: usize) -> Self {
        start..end
    }

    fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    fn merge(&self, other: &Self) -> Self {
        self.start.min(other.start)..self.end.max(other.end)
    }
}

/// 行列位置，行列均从 1 开始；`(0, 0)` 表示未知位置
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    pub fn is_known(&self) -> bool {
        self.line > 0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// 行首偏移表
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            line_starts,
            len: source.len(),
        }
    }

    /// 字节偏移 -> 行列号
    pub fn position(&self, offset: usize) -> Position {
        let offset = offset.min(self.len);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let column = offset - self.line_starts[line];
        Position::new(line as u32 + 1, column as u32 + 1)
    }

    /// 行列号 -> 字节偏移，位置未知或越界时返回 `None`
    pub fn offset(&self, position: Position) -> Option<usize> {
        if !position.is_known() || position.column == 0 {
            return None;
        }
        let start = *self.line_starts.get(position.line as usize - 1)?;
        let offset = start + position.column as usize - 1;
        (offset <= self.len).then_some(offset)
    }
}
