//! Operand Stack Tracking
//!
//! 逐条模拟指令的出栈/入栈，得到 `.limit stack`。
//! 跳转时记录目标标签处的深度；无条件跳转或返回之后的代码不可顺序到达，
//! 深度要等到下一个标签处再恢复。

use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct StackTracker {
    depth: u32,
    max: u32,
    reachable: bool,
    at_labels: HashMap<String, u32>,
}

impl StackTracker {
    pub fn new() -> Self {
        Self {
            reachable: true,
            ..Self::default()
        }
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn apply(&mut self, pops: u32, pushes: u32) {
        if self.depth < pops {
            log::warn!(
                "operand stack underflow: popping {} from depth {}",
                pops,
                self.depth
            );
        }
        self.depth = self.depth.saturating_sub(pops) + pushes;
        self.max = self.max.max(self.depth);
    }

    /// 条件跳转，在出栈之后调用
    pub fn branch(&mut self, label: &str) {
        self.at_labels.entry(label.to_string()).or_insert(self.depth);
    }

    /// 无条件跳转
    pub fn jump(&mut self, label: &str) {
        self.branch(label);
        self.reachable = false;
    }

    /// 返回之后不可顺序到达
    pub fn terminate(&mut self) {
        self.reachable = false;
    }

    pub fn label(&mut self, label: &str) {
        if self.reachable {
            self.at_labels.entry(label.to_string()).or_insert(self.depth);
        } else {
            // 只被向后跳转到达的标签，语句之间栈为空
            self.depth = self.at_labels.get(label).copied().unwrap_or(0);
            self.reachable = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_depth() {
        let mut stack = StackTracker::new();
        stack.apply(0, 1);
        stack.apply(0, 1);
        stack.apply(2, 1);
        stack.apply(0, 1);
        stack.apply(0, 1);
        stack.apply(0, 1);
        assert_eq!(stack.max(), 4);
        assert_eq!(stack.depth(), 4);
    }

    #[test]
    fn test_depth_restored_after_goto() {
        // a < b 转成值: if_icmplt T; iconst_0; goto E; T: iconst_1; E:
        let mut stack = StackTracker::new();
        stack.apply(0, 2);
        stack.apply(2, 0);
        stack.branch("T");
        stack.apply(0, 1);
        stack.jump("E");
        stack.label("T");
        assert_eq!(stack.depth(), 0);
        stack.apply(0, 1);
        stack.label("E");
        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.max(), 2);
    }

    #[test]
    fn test_unknown_label_after_return() {
        let mut stack = StackTracker::new();
        stack.apply(0, 1);
        stack.apply(1, 0);
        stack.terminate();
        stack.label("L");
        assert_eq!(stack.depth(), 0);
    }
}
