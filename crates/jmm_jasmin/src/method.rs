//! Method Emission
//!
//! 把一个 IR 方法翻译为 Jasmin 指令，同时模拟操作数栈。

use crate::descriptor::Descriptors;
use crate::error::{JasminError, JasminResult};
use crate::registers::RegisterMap;
use crate::stack::StackTracker;
use jmm_ollir::{
    BinaryOperator, Call, ElementType, Expression, Instruction, Invocation, Method, Operand,
    Variable,
};

/// 单个方法的生成状态
pub struct MethodEmitter<'a> {
    method: &'a Method,
    descriptors: &'a Descriptors<'a>,
    registers: RegisterMap,
    stack: StackTracker,
    code: Vec<String>,
    /// 比较转值用的 `cmp_true_N`/`cmp_end_N` 编号
    next_cmp: usize,
}

/// 生成好的方法体
#[derive(Debug)]
pub struct EmittedMethod {
    pub header: String,
    pub stack_limit: u32,
    pub locals_limit: usize,
    pub code: Vec<String>,
}

impl EmittedMethod {
    pub fn render(&self) -> String {
        let mut out = format!("{}\n", self.header);
        out.push_str(&format!("    .limit stack {}\n", self.stack_limit));
        out.push_str(&format!("    .limit locals {}\n", self.locals_limit));
        for line in &self.code {
            if line.ends_with(':') {
                out.push_str(&format!("  {}\n", line));
            } else {
                out.push_str(&format!("    {}\n", line));
            }
        }
        out.push_str(".end method\n");
        out
    }
}

fn load_family(ty: &ElementType) -> char {
    if ty.is_reference() {
        'a'
    } else {
        'i'
    }
}

fn register_op(op: &str, family: char, reg: u16) -> String {
    if reg < 4 {
        format!("{}{}_{}", family, op, reg)
    } else {
        format!("{}{} {}", family, op, reg)
    }
}

pub fn int_constant(value: i32) -> String {
    match value {
        -1 => "iconst_m1".to_string(),
        0..=5 => format!("iconst_{}", value),
        v if i8::try_from(v).is_ok() => format!("bipush {}", v),
        v if i16::try_from(v).is_ok() => format!("sipush {}", v),
        v => format!("ldc {}", v),
    }
}

/// 数组元素读写指令的前缀
fn array_prefix(element: &ElementType) -> char {
    match element {
        ElementType::Boolean => 'b',
        ElementType::Int32 | ElementType::Void => 'i',
        ElementType::String | ElementType::Array(_) | ElementType::ClassRef(_) => 'a',
    }
}

impl<'a> MethodEmitter<'a> {
    pub fn new(method: &'a Method, descriptors: &'a Descriptors<'a>) -> Self {
        Self {
            method,
            descriptors,
            registers: RegisterMap::build(method),
            stack: StackTracker::new(),
            code: Vec::new(),
            next_cmp: 0,
        }
    }

    pub fn emit(mut self, register_limit: Option<u16>) -> JasminResult<EmittedMethod> {
        let method = self.method;
        let locals_limit = self.registers.locals();
        if let Some(limit) = register_limit {
            if locals_limit > usize::from(limit) {
                return Err(JasminError::RegisterLimit {
                    method: method.name.clone(),
                    needed: locals_limit,
                    limit,
                });
            }
        }

        for inst in &method.instructions {
            self.instruction(inst)?;
        }

        let mut header = String::from(".method ");
        if method.is_public {
            header.push_str("public ");
        }
        if method.is_static {
            header.push_str("static ");
        }
        let descriptor = self
            .descriptors
            .method_descriptor(method.params.iter().map(|p| &p.ty), &method.return_type);
        header.push_str(&method.name);
        header.push_str(&descriptor);

        log::trace!(
            "emitted '{}': {} lines, stack {}, locals {}",
            method.name,
            self.code.len(),
            self.stack.max(),
            locals_limit
        );
        Ok(EmittedMethod {
            header,
            stack_limit: self.stack.max(),
            locals_limit,
            code: self.code,
        })
    }

    fn push(&mut self, line: impl Into<String>, pops: u32, pushes: u32) {
        self.code.push(line.into());
        self.stack.apply(pops, pushes);
    }

    fn register(&self, var: &Variable) -> JasminResult<u16> {
        self.registers
            .get(&var.name)
            .ok_or_else(|| JasminError::UnknownVariable {
                name: var.name.clone(),
                method: self.method.name.clone(),
            })
    }

    fn load(&mut self, operand: &Operand) -> JasminResult<()> {
        match operand {
            Operand::Literal { value, .. } => self.push(int_constant(*value), 0, 1),
            Operand::Variable(var) => {
                let reg = self.register(var)?;
                self.push(register_op("load", load_family(&var.ty), reg), 0, 1);
            }
            Operand::This(_) => self.push("aload_0", 0, 1),
            Operand::Class(name) => {
                return Err(JasminError::ClassAsValue {
                    name: name.clone(),
                    method: self.method.name.clone(),
                })
            }
        }
        Ok(())
    }

    fn store(&mut self, var: &Variable) -> JasminResult<()> {
        let reg = self.register(var)?;
        self.push(register_op("store", load_family(&var.ty), reg), 1, 0);
        Ok(())
    }

    fn label(&mut self, label: &str) {
        self.code.push(format!("{}:", label));
        self.stack.label(label);
    }

    fn instruction(&mut self, inst: &Instruction) -> JasminResult<()> {
        match inst {
            Instruction::Assign { dest, value } => {
                self.expression(value)?;
                self.store(dest)
            }
            Instruction::ArrayStore {
                array,
                index,
                value,
            } => {
                self.load(&Operand::Variable(array.clone()))?;
                self.load(index)?;
                self.load(value)?;
                let prefix = array_prefix(&array.ty.element());
                self.push(format!("{}astore", prefix), 3, 0);
                Ok(())
            }
            Instruction::PutField {
                object,
                field,
                value,
            } => {
                let owner = self.owner(object, &field.name)?;
                self.load(object)?;
                self.load(value)?;
                let line = format!(
                    "putfield {}/{} {}",
                    owner,
                    field.name,
                    self.descriptors.type_descriptor(&field.ty)
                );
                self.push(line, 2, 0);
                Ok(())
            }
            Instruction::Call(call) => {
                self.call(call)?;
                if call.return_type != ElementType::Void {
                    self.push("pop", 1, 0);
                }
                Ok(())
            }
            Instruction::Goto(label) => {
                self.code.push(format!("goto {}", label));
                self.stack.jump(label);
                Ok(())
            }
            Instruction::Branch { condition, label } => {
                self.load(condition)?;
                self.push(format!("ifne {}", label), 1, 0);
                self.stack.branch(label);
                Ok(())
            }
            Instruction::Return(Some(value)) => {
                self.load(value)?;
                let family = load_family(&value.ty());
                self.push(format!("{}return", family), 1, 0);
                self.stack.terminate();
                Ok(())
            }
            Instruction::Return(None) => {
                self.push("return", 0, 0);
                self.stack.terminate();
                Ok(())
            }
            Instruction::Label(label) => {
                self.label(label);
                Ok(())
            }
        }
    }

    /// 计算表达式，结果留在栈顶
    fn expression(&mut self, expr: &Expression) -> JasminResult<()> {
        match expr {
            Expression::Single(op) => self.load(op),
            Expression::Binary { op, lhs, rhs } => {
                self.load(lhs)?;
                self.load(rhs)?;
                let mnemonic = match op {
                    BinaryOperator::Add => "iadd",
                    BinaryOperator::Sub => "isub",
                    BinaryOperator::Mul => "imul",
                    BinaryOperator::Div => "idiv",
                    BinaryOperator::Lt
                    | BinaryOperator::Gt
                    | BinaryOperator::Le
                    | BinaryOperator::Ge
                    | BinaryOperator::Eq
                    | BinaryOperator::Ne => {
                        let reference = lhs.ty().is_reference() || rhs.ty().is_reference();
                        self.comparison(*op, reference);
                        return Ok(());
                    }
                };
                self.push(mnemonic, 2, 1);
                Ok(())
            }
            Expression::Not(op) => {
                self.load(op)?;
                self.push("iconst_1", 0, 1);
                self.push("ixor", 2, 1);
                Ok(())
            }
            Expression::Call(call) => self.call(call),
            Expression::GetField { object, field } => {
                let owner = self.owner(object, &field.name)?;
                self.load(object)?;
                let line = format!(
                    "getfield {}/{} {}",
                    owner,
                    field.name,
                    self.descriptors.type_descriptor(&field.ty)
                );
                self.push(line, 1, 1);
                Ok(())
            }
            Expression::ArrayLoad { array, index } => {
                self.load(&Operand::Variable(array.clone()))?;
                self.load(index)?;
                let prefix = array_prefix(&array.ty.element());
                self.push(format!("{}aload", prefix), 2, 1);
                Ok(())
            }
            Expression::ArrayLength(array) => {
                self.load(&Operand::Variable(array.clone()))?;
                self.push("arraylength", 1, 1);
                Ok(())
            }
            Expression::NewObject(class) => {
                let path = self.descriptors.class_path(class);
                self.push(format!("new {}", path), 0, 1);
                Ok(())
            }
            Expression::NewArray { size, ty } => {
                self.load(size)?;
                let line = match ty.element() {
                    ElementType::Int32 => "newarray int".to_string(),
                    ElementType::Boolean => "newarray boolean".to_string(),
                    ElementType::ClassRef(name) => {
                        format!("anewarray {}", self.descriptors.class_path(&name))
                    }
                    other => format!("anewarray {}", self.array_component(&other)),
                };
                self.push(line, 1, 1);
                Ok(())
            }
        }
    }

    /// `anewarray` 的操作数：类用内部名，数组用描述符
    fn array_component(&self, element: &ElementType) -> String {
        match element {
            ElementType::String => "java/lang/String".to_string(),
            other => self.descriptors.type_descriptor(other),
        }
    }

    /// 比较结果转为 0/1
    fn comparison(&mut self, op: BinaryOperator, reference: bool) {
        let n = self.next_cmp;
        self.next_cmp += 1;
        let true_label = format!("cmp_true_{}", n);
        let end_label = format!("cmp_end_{}", n);

        let condition = match (op, reference) {
            (BinaryOperator::Eq, true) => "if_acmpeq",
            (BinaryOperator::Ne, true) => "if_acmpne",
            (BinaryOperator::Lt, _) => "if_icmplt",
            (BinaryOperator::Gt, _) => "if_icmpgt",
            (BinaryOperator::Le, _) => "if_icmple",
            (BinaryOperator::Ge, _) => "if_icmpge",
            (BinaryOperator::Ne, _) => "if_icmpne",
            _ => "if_icmpeq",
        };
        self.push(format!("{} {}", condition, true_label), 2, 0);
        self.stack.branch(&true_label);
        self.push("iconst_0", 0, 1);
        self.code.push(format!("goto {}", end_label));
        self.stack.jump(&end_label);
        self.label(&true_label);
        self.push("iconst_1", 0, 1);
        self.label(&end_label);
    }

    /// 字段所属类的内部名
    fn owner(&self, object: &Operand, field: &str) -> JasminResult<String> {
        match object.ty() {
            ElementType::ClassRef(name) => Ok(self.descriptors.class_path(&name)),
            other => Err(JasminError::InvalidReceiver {
                call: field.to_string(),
                ty: other.to_string(),
                method: self.method.name.clone(),
            }),
        }
    }

    /// 调用，非 void 的返回值留在栈顶
    fn call(&mut self, call: &Call) -> JasminResult<()> {
        let (owner, receiver) = match (&call.invocation, &call.target) {
            (Invocation::Static, Operand::Class(name)) => (self.descriptors.class_path(name), 0),
            (Invocation::Static, other) => {
                return Err(JasminError::InvalidReceiver {
                    call: call.method.clone(),
                    ty: other.ty().to_string(),
                    method: self.method.name.clone(),
                })
            }
            (Invocation::Virtual | Invocation::Special, target) => {
                let owner = self.owner(target, &call.method)?;
                self.load(target)?;
                (owner, 1)
            }
        };
        for arg in &call.args {
            self.load(arg)?;
        }

        let descriptor = self
            .descriptors
            .method_descriptor(&call.signature(), &call.return_type);
        let pops = receiver + call.args.len() as u32;
        let pushes = u32::from(call.return_type != ElementType::Void);
        self.push(
            format!("{} {}/{}{}", call.invocation, owner, call.method, descriptor),
            pops,
            pushes,
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jmm_ollir::ClassUnit;

    fn int(name: &str) -> Variable {
        Variable::new(name, ElementType::Int32)
    }

    fn emit(method: Method) -> EmittedMethod {
        let unit = ClassUnit {
            imports: vec!["io".into()],
            name: "A".into(),
            super_class: None,
            fields: Vec::new(),
            methods: Vec::new(),
        };
        let descriptors = Descriptors::new(&unit);
        MethodEmitter::new(&method, &descriptors).emit(None).unwrap()
    }

    fn method(instructions: Vec<Instruction>) -> Method {
        Method {
            name: "f".into(),
            is_public: true,
            is_static: false,
            params: vec![int("a")],
            return_type: ElementType::Int32,
            instructions,
        }
    }

    #[test]
    fn test_constants() {
        assert_eq!(int_constant(-1), "iconst_m1");
        assert_eq!(int_constant(5), "iconst_5");
        assert_eq!(int_constant(6), "bipush 6");
        assert_eq!(int_constant(-128), "bipush -128");
        assert_eq!(int_constant(200), "sipush 200");
        assert_eq!(int_constant(-32768), "sipush -32768");
        assert_eq!(int_constant(40000), "ldc 40000");
    }

    #[test]
    fn test_comparison_as_value() {
        let emitted = emit(method(vec![
            Instruction::Assign {
                dest: Variable::new("t", ElementType::Boolean),
                value: Expression::Binary {
                    op: BinaryOperator::Lt,
                    lhs: Operand::Variable(int("a")),
                    rhs: Operand::int(10),
                },
            },
            Instruction::Return(Some(Operand::int(0))),
        ]));
        assert_eq!(
            emitted.code,
            vec![
                "iload_1",
                "bipush 10",
                "if_icmplt cmp_true_0",
                "iconst_0",
                "goto cmp_end_0",
                "cmp_true_0:",
                "iconst_1",
                "cmp_end_0:",
                "istore_2",
                "iconst_0",
                "ireturn",
            ]
        );
        assert_eq!(emitted.stack_limit, 2);
        assert_eq!(emitted.locals_limit, 3);
    }

    #[test]
    fn test_unused_result_is_popped() {
        let call = Call {
            invocation: Invocation::Virtual,
            target: Operand::This("A".into()),
            method: "f".into(),
            args: vec![Operand::int(1)],
            return_type: ElementType::Int32,
            param_types: None,
        };
        let emitted = emit(method(vec![Instruction::Call(call), Instruction::Return(None)]));
        assert_eq!(
            emitted.code,
            vec!["aload_0", "iconst_1", "invokevirtual A/f(I)I", "pop", "return"]
        );
        assert_eq!(emitted.stack_limit, 2);
    }

    #[test]
    fn test_construction_without_dup() {
        let obj = Variable::new("o", ElementType::ClassRef("A".into()));
        let emitted = emit(method(vec![
            Instruction::Assign {
                dest: obj.clone(),
                value: Expression::NewObject("A".into()),
            },
            Instruction::Call(Call::constructor(Operand::Variable(obj))),
            Instruction::Return(None),
        ]));
        assert_eq!(
            emitted.code,
            vec!["new A", "astore_2", "aload_2", "invokespecial A/<init>()V", "return"]
        );
        assert_eq!(emitted.stack_limit, 1);
    }

    #[test]
    fn test_wide_registers_and_arrays() {
        let arr = Variable::new("arr", ElementType::array_of(ElementType::Boolean));
        let mut body: Vec<Instruction> = ["b", "c", "d"]
            .iter()
            .map(|n| Instruction::Assign {
                dest: int(n),
                value: Expression::Single(Operand::int(0)),
            })
            .collect();
        body.push(Instruction::Assign {
            dest: arr.clone(),
            value: Expression::NewArray {
                size: Operand::int(3),
                ty: arr.ty.clone(),
            },
        });
        body.push(Instruction::ArrayStore {
            array: arr,
            index: Operand::int(0),
            value: Operand::boolean(true),
        });
        let emitted = emit(method(body));
        assert_eq!(emitted.code[5], "istore 4");
        assert_eq!(emitted.code[7], "newarray boolean");
        assert_eq!(emitted.code[8], "astore 5");
        assert_eq!(&emitted.code[9..], &["aload 5", "iconst_0", "iconst_1", "bastore"]);
        assert_eq!(emitted.stack_limit, 3);
    }

    #[test]
    fn test_register_limit() {
        let unit = ClassUnit {
            imports: Vec::new(),
            name: "A".into(),
            super_class: None,
            fields: Vec::new(),
            methods: Vec::new(),
        };
        let descriptors = Descriptors::new(&unit);
        let m = method(vec![Instruction::Return(None)]);
        let err = MethodEmitter::new(&m, &descriptors).emit(Some(1)).unwrap_err();
        assert_eq!(
            err,
            JasminError::RegisterLimit {
                method: "f".into(),
                needed: 2,
                limit: 1
            }
        );
    }
}
