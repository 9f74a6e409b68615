//! Optimizer Error Types

use jmm_diagnostics::{Diagnostic, Stage};
use thiserror::Error;

/// 优化错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptimizerError {
    /// 超过轮数上限仍有改写，说明某个 pass 不收敛
    #[error("optimization did not reach a fixpoint after {rounds} rounds")]
    NoFixpoint { rounds: usize },
}

impl OptimizerError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.to_string()).stage(Stage::Optimization)
    }
}

/// 优化结果类型
pub type OptimizerResult<T> = Result<T, OptimizerError>;
