//! OLLIR Intermediate Representation
//!
//! 带类型的三地址码。`Display` 输出 OLLIR 文本：语句以 `;` 结尾，
//! 赋值写作 `:=`，操作数带类型后缀（`x.i32`），标签独占一行（`L:`）。

use jmm_sema::Type;
use std::fmt;

/// 操作数与表达式的类型
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ElementType {
    Int32,
    Boolean,
    Void,
    String,
    Array(Box<ElementType>),
    /// 类引用，保存源码中的简单名
    ClassRef(String),
}

impl ElementType {
    pub fn array_of(element: ElementType) -> Self {
        ElementType::Array(Box::new(element))
    }

    /// 数组的元素类型；非数组返回自身
    pub fn element(&self) -> ElementType {
        match self {
            ElementType::Array(element) => (**element).clone(),
            other => other.clone(),
        }
    }

    /// JVM 上是否为引用类型
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            ElementType::String | ElementType::Array(_) | ElementType::ClassRef(_)
        )
    }
}

impl From<&Type> for ElementType {
    fn from(ty: &Type) -> Self {
        let base = match ty.name.as_str() {
            "int" => ElementType::Int32,
            "boolean" => ElementType::Boolean,
            "void" => ElementType::Void,
            "String" => ElementType::String,
            other => ElementType::ClassRef(other.to_string()),
        };
        if ty.is_array {
            ElementType::array_of(base)
        } else {
            base
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementType::Int32 => f.write_str("i32"),
            ElementType::Boolean => f.write_str("bool"),
            ElementType::Void => f.write_str("V"),
            ElementType::String => f.write_str("String"),
            ElementType::Array(element) => write!(f, "array.{}", element),
            ElementType::ClassRef(name) => f.write_str(name),
        }
    }
}

/// 具名的带类型值：局部变量、参数、临时变量、字段
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Variable {
    pub name: String,
    pub ty: ElementType,
}

impl Variable {
    pub fn new(name: impl Into<String>, ty: ElementType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.name, self.ty)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// 整数或布尔字面量（布尔以 0/1 表示）
    Literal { value: i32, ty: ElementType },
    Variable(Variable),
    /// `this`，带当前类名
    This(String),
    /// 静态调用的接收者：导入类的简单名
    Class(String),
}

impl Operand {
    pub fn int(value: i32) -> Self {
        Operand::Literal {
            value,
            ty: ElementType::Int32,
        }
    }

    pub fn boolean(value: bool) -> Self {
        Operand::Literal {
            value: i32::from(value),
            ty: ElementType::Boolean,
        }
    }

    pub fn var(name: impl Into<String>, ty: ElementType) -> Self {
        Operand::Variable(Variable::new(name, ty))
    }

    pub fn ty(&self) -> ElementType {
        match self {
            Operand::Literal { ty, .. } => ty.clone(),
            Operand::Variable(var) => var.ty.clone(),
            Operand::This(class) | Operand::Class(class) => ElementType::ClassRef(class.clone()),
        }
    }

    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            Operand::Variable(var) => Some(var),
            _ => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal { value, ty } => write!(f, "{}.{}", value, ty),
            Operand::Variable(var) => var.fmt(f),
            Operand::This(class) => write!(f, "this.{}", class),
            Operand::Class(name) => f.write_str(name),
        }
    }
}

/// 三地址码中的二元运算；`&&`/`||` 在生成时已经展开为跳转
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
}

impl BinaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Lt => "<",
            BinaryOperator::Gt => ">",
            BinaryOperator::Le => "<=",
            BinaryOperator::Ge => ">=",
            BinaryOperator::Eq => "==",
            BinaryOperator::Ne => "!=",
        }
    }

    pub fn is_comparison(&self) -> bool {
        !matches!(
            self,
            BinaryOperator::Add | BinaryOperator::Sub | BinaryOperator::Mul | BinaryOperator::Div
        )
    }

    pub fn result_type(&self) -> ElementType {
        if self.is_comparison() {
            ElementType::Boolean
        } else {
            ElementType::Int32
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Invocation {
    Static,
    Virtual,
    Special,
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Invocation::Static => "invokestatic",
            Invocation::Virtual => "invokevirtual",
            Invocation::Special => "invokespecial",
        })
    }
}

/// 方法调用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub invocation: Invocation,
    pub target: Operand,
    pub method: String,
    pub args: Vec<Operand>,
    pub return_type: ElementType,
    /// 本类方法声明的形参类型；外部方法只能按实参类型生成描述符
    pub param_types: Option<Vec<ElementType>>,
}

impl Call {
    /// 构造函数调用 `invokespecial(obj, "<init>").V`
    pub fn constructor(target: Operand) -> Self {
        Self {
            invocation: Invocation::Special,
            target,
            method: "<init>".to_string(),
            args: Vec::new(),
            return_type: ElementType::Void,
            param_types: Some(Vec::new()),
        }
    }

    /// 描述符使用的形参类型
    pub fn signature(&self) -> Vec<ElementType> {
        match &self.param_types {
            Some(types) => types.clone(),
            None => self.args.iter().map(Operand::ty).collect(),
        }
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}, \"{}\"", self.invocation, self.target, self.method)?;
        for arg in &self.args {
            write!(f, ", {}", arg)?;
        }
        write!(f, ").{}", self.return_type)
    }
}

/// 赋值语句的右侧
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    Single(Operand),
    Binary {
        op: BinaryOperator,
        lhs: Operand,
        rhs: Operand,
    },
    Not(Operand),
    Call(Call),
    GetField {
        object: Operand,
        field: Variable,
    },
    ArrayLoad {
        array: Variable,
        index: Operand,
    },
    ArrayLength(Variable),
    NewObject(String),
    NewArray {
        size: Operand,
        ty: ElementType,
    },
}

impl Expression {
    pub fn ty(&self) -> ElementType {
        match self {
            Expression::Single(op) => op.ty(),
            Expression::Binary { op, .. } => op.result_type(),
            Expression::Not(_) => ElementType::Boolean,
            Expression::Call(call) => call.return_type.clone(),
            Expression::GetField { field, .. } => field.ty.clone(),
            Expression::ArrayLoad { array, .. } => array.ty.element(),
            Expression::ArrayLength(_) => ElementType::Int32,
            Expression::NewObject(class) => ElementType::ClassRef(class.clone()),
            Expression::NewArray { ty, .. } => ty.clone(),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Single(op) => op.fmt(f),
            Expression::Binary { op, lhs, rhs } => {
                write!(f, "{} {}.{} {}", lhs, op.symbol(), op.result_type(), rhs)
            }
            Expression::Not(op) => write!(f, "!.bool {}", op),
            Expression::Call(call) => call.fmt(f),
            Expression::GetField { object, field } => {
                write!(f, "getfield({}, {}).{}", object, field, field.ty)
            }
            Expression::ArrayLoad { array, index } => {
                write!(f, "{}[{}].{}", array.name, index, array.ty.element())
            }
            Expression::ArrayLength(array) => write!(f, "arraylength({}).i32", array),
            Expression::NewObject(class) => write!(f, "new({}).{}", class, class),
            Expression::NewArray { size, ty } => write!(f, "new(array, {}).{}", size, ty),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Assign {
        dest: Variable,
        value: Expression,
    },
    ArrayStore {
        array: Variable,
        index: Operand,
        value: Operand,
    },
    PutField {
        object: Operand,
        field: Variable,
        value: Operand,
    },
    /// 作为语句的调用，返回值被丢弃
    Call(Call),
    Goto(String),
    /// 条件为真时跳转
    Branch {
        condition: Operand,
        label: String,
    },
    Return(Option<Operand>),
    Label(String),
}

impl Instruction {
    /// 之后的指令不会顺序执行到
    pub fn is_terminator(&self) -> bool {
        matches!(self, Instruction::Goto(_) | Instruction::Return(_))
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Assign { dest, value } => {
                write!(f, "{} :=.{} {};", dest, dest.ty, value)
            }
            Instruction::ArrayStore {
                array,
                index,
                value,
            } => {
                let element = array.ty.element();
                write!(f, "{}[{}].{} :=.{} {};", array.name, index, element, element, value)
            }
            Instruction::PutField {
                object,
                field,
                value,
            } => write!(f, "putfield({}, {}, {}).V;", object, field, value),
            Instruction::Call(call) => write!(f, "{};", call),
            Instruction::Goto(label) => write!(f, "goto {};", label),
            Instruction::Branch { condition, label } => {
                write!(f, "if ({}) goto {};", condition, label)
            }
            Instruction::Return(Some(value)) => write!(f, "ret.{} {};", value.ty(), value),
            Instruction::Return(None) => f.write_str("ret.V;"),
            Instruction::Label(label) => write!(f, "{}:", label),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    pub name: String,
    pub is_public: bool,
    pub is_static: bool,
    pub params: Vec<Variable>,
    pub return_type: ElementType,
    pub instructions: Vec<Instruction>,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(".method ")?;
        if self.is_public {
            f.write_str("public ")?;
        }
        if self.is_static {
            f.write_str("static ")?;
        }
        let params: Vec<String> = self.params.iter().map(Variable::to_string).collect();
        writeln!(f, "{}({}).{} {{", self.name, params.join(", "), self.return_type)?;
        for inst in &self.instructions {
            match inst {
                Instruction::Label(_) => writeln!(f, "{}", inst)?,
                _ => writeln!(f, "    {}", inst)?,
            }
        }
        f.write_str("}")
    }
}

/// 一个编译单元：一个类
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassUnit {
    /// 点分全名
    pub imports: Vec<String>,
    pub name: String,
    pub super_class: Option<String>,
    pub fields: Vec<Variable>,
    pub methods: Vec<Method>,
}

impl ClassUnit {
    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|m| m.name == name)
    }
}

impl fmt::Display for ClassUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for import in &self.imports {
            writeln!(f, "import {};", import)?;
        }
        if !self.imports.is_empty() {
            writeln!(f)?;
        }
        writeln!(
            f,
            "{} extends {} {{",
            self.name,
            self.super_class.as_deref().unwrap_or("Object")
        )?;
        for field in &self.fields {
            writeln!(f, "    .field public {};", field)?;
        }
        writeln!(f)?;
        writeln!(f, "    .construct {}().V {{", self.name)?;
        writeln!(f, "        invokespecial(this, \"<init>\").V;")?;
        writeln!(f, "    }}")?;
        for method in &self.methods {
            writeln!(f)?;
            for line in method.to_string().lines() {
                writeln!(f, "    {}", line)?;
            }
        }
        writeln!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x() -> Variable {
        Variable::new("x", ElementType::Int32)
    }

    #[test]
    fn test_type_suffixes() {
        assert_eq!(ElementType::from(&Type::int()).to_string(), "i32");
        assert_eq!(ElementType::from(&Type::new("String", true)).to_string(), "array.String");
        assert_eq!(ElementType::from(&Type::class("Foo")).to_string(), "Foo");
        assert_eq!(Operand::boolean(true).to_string(), "1.bool");
        assert_eq!(Operand::This("A".into()).to_string(), "this.A");
    }

    #[test]
    fn test_instruction_text() {
        let assign = Instruction::Assign {
            dest: x(),
            value: Expression::Binary {
                op: BinaryOperator::Lt,
                lhs: Operand::Variable(x()),
                rhs: Operand::int(3),
            },
        };
        assert_eq!(assign.to_string(), "x.i32 :=.i32 x.i32 <.bool 3.i32;");

        let store = Instruction::ArrayStore {
            array: Variable::new("a", ElementType::array_of(ElementType::Int32)),
            index: Operand::int(0),
            value: Operand::Variable(x()),
        };
        assert_eq!(store.to_string(), "a[0.i32].i32 :=.i32 x.i32;");

        let call = Instruction::Call(Call {
            invocation: Invocation::Static,
            target: Operand::Class("io".into()),
            method: "println".into(),
            args: vec![Operand::Variable(x())],
            return_type: ElementType::Void,
            param_types: None,
        });
        assert_eq!(call.to_string(), "invokestatic(io, \"println\", x.i32).V;");
        assert_eq!(Instruction::Return(None).to_string(), "ret.V;");
        assert_eq!(
            Instruction::Branch {
                condition: Operand::boolean(false),
                label: "if_then_0".into()
            }
            .to_string(),
            "if (0.bool) goto if_then_0;"
        );
    }

    #[test]
    fn test_class_text() {
        let unit = ClassUnit {
            imports: vec!["io".into()],
            name: "A".into(),
            super_class: None,
            fields: vec![x()],
            methods: vec![Method {
                name: "main".into(),
                is_public: true,
                is_static: true,
                params: vec![Variable::new(
                    "args",
                    ElementType::array_of(ElementType::String),
                )],
                return_type: ElementType::Void,
                instructions: vec![Instruction::Label("L".into()), Instruction::Return(None)],
            }],
        };
        let text = unit.to_string();
        assert!(text.starts_with("import io;\n\nA extends Object {\n    .field public x.i32;\n"));
        assert!(text.contains(".construct A().V {"));
        assert!(text.contains(".method public static main(args.array.String).V {\n    L:\n        ret.V;\n    }"));
    }
}
