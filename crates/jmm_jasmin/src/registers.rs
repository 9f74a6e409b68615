//! Register Assignment
//!
//! 实例方法中 `this` 占 0 号寄存器，随后依次是参数，
//! 其余变量按在指令中首次出现的顺序分配。

use jmm_ollir::{Call, Expression, Instruction, Method, Operand, Variable};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct RegisterMap {
    slots: HashMap<String, u16>,
    next: u16,
}

impl RegisterMap {
    pub fn build(method: &Method) -> Self {
        let mut map = Self {
            next: u16::from(!method.is_static),
            ..Self::default()
        };
        for param in &method.params {
            map.assign(&param.name);
        }
        for inst in &method.instructions {
            for var in instruction_variables(inst) {
                map.assign(&var.name);
            }
        }
        map
    }

    fn assign(&mut self, name: &str) {
        if !self.slots.contains_key(name) {
            self.slots.insert(name.to_string(), self.next);
            self.next += 1;
        }
    }

    pub fn get(&self, name: &str) -> Option<u16> {
        self.slots.get(name).copied()
    }

    /// `.limit locals` 的值
    pub fn locals(&self) -> usize {
        usize::from(self.next)
    }
}

fn operand_variable(operand: &Operand) -> Option<&Variable> {
    operand.as_variable()
}

fn call_variables(call: &Call) -> impl Iterator<Item = &Variable> {
    std::iter::once(&call.target)
        .chain(&call.args)
        .filter_map(operand_variable)
}

fn expression_variables(expr: &Expression) -> Vec<&Variable> {
    match expr {
        Expression::Single(op) | Expression::Not(op) => operand_variable(op).into_iter().collect(),
        Expression::Binary { lhs, rhs, .. } => [lhs, rhs].into_iter().filter_map(operand_variable).collect(),
        Expression::Call(call) => call_variables(call).collect(),
        // 字段名不是局部变量
        Expression::GetField { object, .. } => operand_variable(object).into_iter().collect(),
        Expression::ArrayLoad { array, index } => std::iter::once(array)
            .chain(operand_variable(index))
            .collect(),
        Expression::ArrayLength(array) => vec![array],
        Expression::NewObject(_) => Vec::new(),
        Expression::NewArray { size, .. } => operand_variable(size).into_iter().collect(),
    }
}

/// 指令中按书写顺序出现的局部变量
fn instruction_variables(inst: &Instruction) -> Vec<&Variable> {
    match inst {
        Instruction::Assign { dest, value } => {
            let mut vars = vec![dest];
            vars.extend(expression_variables(value));
            vars
        }
        Instruction::ArrayStore {
            array,
            index,
            value,
        } => std::iter::once(array)
            .chain(operand_variable(index))
            .chain(operand_variable(value))
            .collect(),
        Instruction::PutField { object, value, .. } => [object, value]
            .into_iter()
            .filter_map(operand_variable)
            .collect(),
        Instruction::Call(call) => call_variables(call).collect(),
        Instruction::Branch { condition, .. } => operand_variable(condition).into_iter().collect(),
        Instruction::Return(value) => value.iter().filter_map(operand_variable).collect(),
        Instruction::Goto(_) | Instruction::Label(_) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jmm_ollir::{BinaryOperator, ElementType};

    fn int(name: &str) -> Variable {
        Variable::new(name, ElementType::Int32)
    }

    fn method(is_static: bool, instructions: Vec<Instruction>) -> Method {
        Method {
            name: "f".into(),
            is_public: true,
            is_static,
            params: vec![int("a"), int("b")],
            return_type: ElementType::Int32,
            instructions,
        }
    }

    #[test]
    fn test_this_params_then_first_use() {
        let body = vec![
            Instruction::Assign {
                dest: int("t"),
                value: Expression::Binary {
                    op: BinaryOperator::Add,
                    lhs: Operand::Variable(int("b")),
                    rhs: Operand::Variable(int("u")),
                },
            },
            Instruction::Return(Some(Operand::Variable(int("u")))),
        ];
        let regs = RegisterMap::build(&method(false, body));
        assert_eq!(regs.get("a"), Some(1));
        assert_eq!(regs.get("b"), Some(2));
        assert_eq!(regs.get("t"), Some(3));
        assert_eq!(regs.get("u"), Some(4));
        assert_eq!(regs.locals(), 5);
    }

    #[test]
    fn test_static_method_starts_at_zero() {
        let regs = RegisterMap::build(&method(true, vec![Instruction::Return(None)]));
        assert_eq!(regs.get("a"), Some(0));
        assert_eq!(regs.locals(), 2);
        assert_eq!(regs.get("missing"), None);
    }
}
