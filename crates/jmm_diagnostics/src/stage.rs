//! Stage - 编译阶段
//!
//! 每条诊断都标注它来自哪个阶段，方便驱动层和测试按阶段过滤。

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// 词法 / 语法分析
    Syntactic,
    /// 符号表构建与语义分析
    Semantic,
    /// 常量传播与折叠
    Optimization,
    /// OLLIR 中间表示生成
    Llir,
    /// Jasmin 汇编生成
    Jasmin,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Syntactic => "syntactic",
            Stage::Semantic => "semantic",
            Stage::Optimization => "optimization",
            Stage::Llir => "ollir",
            Stage::Jasmin => "jasmin",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
