//! Jmm Optimizer
//!
//! 常量传播与常量折叠交替执行，直到某一轮两者都没有改写语法树。
//!
//! 每次传播都把一个变量读取换成字面量，每次折叠都让可达节点变少，
//! 所以循环必然结束。轮数上限只是兜底：超过节点数 + 1 轮时报
//! [`OptimizerError::NoFixpoint`]，而不是挂起。

pub mod constant;
pub mod error;
pub mod folding;
pub mod propagation;

pub use constant::ConstValue;
pub use error::{OptimizerError, OptimizerResult};
pub use folding::ConstantFolding;
pub use propagation::ConstantPropagation;

use jmm_sema::SymbolTable;
use jmm_syntax::Ast;

/// 优化统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptimizationStats {
    /// 执行的轮数（包括最后一轮没有改写的）
    pub rounds: usize,
    /// 被替换为常量的变量读取
    pub propagated: usize,
    /// 被折叠的表达式
    pub folded: usize,
}

impl OptimizationStats {
    pub fn changed(&self) -> bool {
        self.propagated > 0 || self.folded > 0
    }
}

/// 对语法树执行优化直到不动点
pub fn optimize(ast: &mut Ast, table: &SymbolTable) -> OptimizerResult<OptimizationStats> {
    let limit = ast.len() + 1;
    let mut propagation = ConstantPropagation::new(table);
    let mut folding = ConstantFolding::new();
    let mut rounds = 0;

    loop {
        if rounds >= limit {
            return Err(OptimizerError::NoFixpoint { rounds });
        }
        rounds += 1;

        let propagated = propagation.run(ast);
        let folded = folding.run(ast);
        log::trace!(
            "optimization round {}: propagated={}, folded={}",
            rounds,
            propagated,
            folded
        );
        if !propagated && !folded {
            break;
        }
    }

    let stats = OptimizationStats {
        rounds,
        propagated: propagation.replaced(),
        folded: folding.folded(),
    };
    log::debug!(
        "optimizer reached a fixpoint after {} rounds ({} propagated, {} folded)",
        stats.rounds,
        stats.propagated,
        stats.folded
    );
    Ok(stats)
}
