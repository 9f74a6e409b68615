//! Lowering Context
//!
//! 整个编译单元共用的计数器：临时变量 `tmpN` 和各类控制流标签。
//! 计数器只增不减，作为参数显式传递，不同的编译互不影响。

use crate::ir::{Instruction, Operand};
use jmm_sema::SymbolTable;
use std::collections::HashSet;

/// 标签种类，每种有独立的编号
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    If,
    While,
    And,
    Or,
}

impl LabelKind {
    fn index(self) -> usize {
        match self {
            LabelKind::If => 0,
            LabelKind::While => 1,
            LabelKind::And => 2,
            LabelKind::Or => 3,
        }
    }
}

#[derive(Debug, Default)]
pub struct LoweringContext {
    next_temp: usize,
    next_label: [usize; 4],
    /// 用户声明过的名字，临时变量不能与之重名
    reserved: HashSet<String>,
}

impl LoweringContext {
    pub fn new(table: &SymbolTable) -> Self {
        let mut reserved: HashSet<String> = table.fields().iter().map(|f| f.name.clone()).collect();
        for method in table.methods() {
            let params = table.try_parameters(method).unwrap_or_default();
            let locals = table.try_local_variables(method).unwrap_or_default();
            reserved.extend(params.iter().chain(locals).map(|s| s.name.clone()));
        }
        Self {
            reserved,
            ..Self::default()
        }
    }

    /// 新的临时变量名
    pub fn new_temp(&mut self) -> String {
        loop {
            let name = format!("tmp{}", self.next_temp);
            self.next_temp += 1;
            if !self.reserved.contains(&name) {
                return name;
            }
        }
    }

    /// 同一个结构（如一个 `if`）的所有标签共用一个编号
    pub fn next_label_id(&mut self, kind: LabelKind) -> usize {
        let slot = &mut self.next_label[kind.index()];
        let id = *slot;
        *slot += 1;
        id
    }
}

/// 表达式生成结果：使用的操作数，以及在它之前必须执行的指令
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExprResult {
    pub code: Operand,
    pub computation: Vec<Instruction>,
}

impl ExprResult {
    pub fn new(code: Operand) -> Self {
        Self {
            code,
            computation: Vec::new(),
        }
    }

    pub fn with_computation(code: Operand, computation: Vec<Instruction>) -> Self {
        Self { code, computation }
    }
}
