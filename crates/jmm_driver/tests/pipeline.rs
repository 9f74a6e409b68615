//! 端到端测试：源码经过所有阶段

use jmm_diagnostics::{DiagnosticSink, Stage};
use jmm_driver::{check, compile, compile_file, CompileError, CompilerConfig};
use jmm_ollir::Instruction;
use jmm_sema::{analyze, SymbolTable};
use jmm_syntax::{parse_ast, Ast, NodeKind};
use std::collections::HashSet;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn optimizing() -> CompilerConfig {
    CompilerConfig {
        optimize: true,
        ..CompilerConfig::default()
    }
}

fn messages(sink: &DiagnosticSink) -> Vec<String> {
    sink.diagnostics().iter().map(|d| d.message.clone()).collect()
}

#[test]
fn test_round_trip_main() {
    init_logger();
    let source = "class A { public static void main(String[] a){ int x; x = 1 + 2; } }";

    let ast = parse_ast(source).unwrap();
    let table = SymbolTable::build(&ast).unwrap();
    assert_eq!(table.methods(), &["main".to_string()]);
    let locals = table.local_variables("main").unwrap();
    assert_eq!(locals.len(), 1);
    assert_eq!(locals[0].name, "x");
    assert!(locals[0].ty.is_int());
    assert!(analyze(&ast, &table).is_ok());

    let output = compile(source, &optimizing()).unwrap();
    assert!(output.ollir.contains("x.i32 :=.i32 3.i32;"));
    assert!(output
        .jasmin
        .contains(".method public static main([Ljava/lang/String;)V"));
    // a 占 0 号，x 占 1 号
    assert!(output.jasmin.contains("    iconst_3\n    istore_1\n"));
    assert!(output.warnings.is_empty());
}

#[test]
fn test_without_optimization_keeps_the_addition() {
    let source = "class A { public static void main(String[] a){ int x; x = 1 + 2; } }";
    let output = compile(source, &CompilerConfig::default()).unwrap();
    assert!(output.ollir.contains("x.i32 :=.i32 1.i32 +.i32 2.i32;"));
    assert!(output.jasmin.contains("iadd"));
}

#[test]
fn test_undeclared_variable() {
    init_logger();
    let source = "class A { public int f() { int x; x = y + 1; return x; } }";

    let sink = check(source);
    let undeclared: Vec<String> = messages(&sink)
        .into_iter()
        .filter(|m| m.contains("not declared"))
        .collect();
    assert_eq!(undeclared, vec!["Variable y not declared".to_string()]);

    // 后续阶段在错误的语法树上返回错误而不是崩溃
    let config = CompilerConfig {
        optimize: true,
        best_effort: true,
        ..CompilerConfig::default()
    };
    match compile(source, &config) {
        Err(CompileError::Lowering(err)) => assert!(err.to_string().contains("'y'")),
        other => panic!("expected a lowering error, got {:?}", other.map(|o| o.ollir)),
    }
}

#[test]
fn test_duplicate_fields() {
    let dup = check("class A { int x; boolean x; }");
    assert!(messages(&dup).iter().any(|m| m == "Field x is duplicated"));

    let clean = check("class A { int x; boolean y; }");
    assert!(!messages(&clean).iter().any(|m| m.contains("is duplicated")));
}

#[test]
fn test_vararg_positions() {
    let misplaced = check("class A { public int f(int... a, int b) { return b; } }");
    assert_eq!(misplaced.by_stage(Stage::Semantic).count(), 1);

    for args in ["", "1", "1, 2, 3"] {
        let source = format!(
            "class A {{ public int f(int... a) {{ return a.length; }} public int g() {{ return this.f({}); }} }}",
            args
        );
        let sink = check(&source);
        assert!(
            sink.is_empty(),
            "call with ({}) reported {:?}",
            args,
            messages(&sink)
        );
    }
}

fn assigned_value(ast: &Ast, target: &str) -> NodeKind {
    ast.descendants(ast.root())
        .find_map(|id| match ast.kind(id) {
            NodeKind::AssignStmt { target: t, value } if t == target => {
                Some(ast.kind(*value).clone())
            }
            _ => None,
        })
        .unwrap()
}

#[test]
fn test_constant_folding_terminates() {
    let mut ast = parse_ast(
        "class A { public int f() { int a; int b; a = 2 + 3; b = ((1+2)*3)-4; return b; } }",
    )
    .unwrap();
    let table = SymbolTable::build(&ast).unwrap();
    let stats = jmm_optimizer::optimize(&mut ast, &table).unwrap();

    assert_eq!(assigned_value(&ast, "a"), NodeKind::IntegerLiteral { value: 5 });
    assert_eq!(assigned_value(&ast, "b"), NodeKind::IntegerLiteral { value: 5 });
    assert!(stats.rounds <= ast.len() + 1);
}

#[test]
fn test_propagation_is_idempotent() {
    let mut ast = parse_ast(
        "class A { public int f(int k) { int a; int b; a = 4; b = a; while (k < b) k = k + a; return b; } }",
    )
    .unwrap();
    let table = SymbolTable::build(&ast).unwrap();
    let mut propagation = jmm_optimizer::ConstantPropagation::new(&table);
    assert!(propagation.run(&mut ast));
    let snapshot = ast.clone();
    assert!(!propagation.run(&mut ast));
    assert_eq!(ast, snapshot);
}

fn lowered(source: &str) -> jmm_ollir::ClassUnit {
    let ast = parse_ast(source).unwrap();
    let table = SymbolTable::build(&ast).unwrap();
    jmm_ollir::lower(&ast, &table).unwrap()
}

#[test]
fn test_temporaries_are_unique() {
    let unit = lowered(
        "class A { int[] xs; public int f(int a) { a = a * 2 + a / 3 - xs[a + 1]; a = xs.length + this.f(a - 1); return a * a; } }",
    );
    let mut seen = HashSet::new();
    for inst in &unit.method("f").unwrap().instructions {
        if let Instruction::Assign { dest, .. } = inst {
            if dest.name.starts_with("tmp") {
                assert!(seen.insert(dest.name.clone()), "{} assigned twice", dest.name);
            }
        }
    }
    assert!(seen.len() >= 5);
}

#[test]
fn test_sibling_if_labels() {
    let unit = lowered(
        "class A { public int f(boolean b) { int x; x = 0; if (b) x = 1; else x = 2; if (b) x = 3; return x; } }",
    );
    let instructions = &unit.method("f").unwrap().instructions;
    let labels: Vec<&String> = instructions
        .iter()
        .filter_map(|inst| match inst {
            Instruction::Label(label) => Some(label),
            _ => None,
        })
        .collect();
    assert_eq!(labels, vec!["if_then_0", "if_end_0", "if_then_1", "if_end_1"]);

    // 每个标签后面紧跟它标记的指令
    let then_0 = instructions
        .iter()
        .position(|i| *i == Instruction::Label("if_then_0".into()))
        .unwrap();
    assert_eq!(instructions[then_0 + 1].to_string(), "x.i32 :=.i32 1.i32;");
    let end_1 = instructions
        .iter()
        .position(|i| *i == Instruction::Label("if_end_1".into()))
        .unwrap();
    assert_eq!(instructions[end_1 + 1].to_string(), "ret.i32 x.i32;");
}

#[test]
fn test_counters_do_not_leak_between_compilations() {
    let source = "class A { public int f(int a) { if (a < 1) a = 0; return a; } }";
    let first = compile(source, &CompilerConfig::default()).unwrap();
    let second = compile(source, &CompilerConfig::default()).unwrap();
    assert_eq!(first.ollir, second.ollir);
    assert!(second.ollir.contains("if_then_0:"));
}

#[test]
fn test_register_allocation_limit() {
    let source = "class A { public int f(int a, int b) { int c; c = a + b; return c; } }";
    let config = CompilerConfig {
        register_allocation: Some(2),
        ..CompilerConfig::default()
    };
    let err = compile(source, &config).unwrap_err();
    assert!(matches!(err, CompileError::Jasmin(_)));
    assert_eq!(err.stage(), Some(Stage::Jasmin));
}

#[test]
fn test_compile_file() {
    let path = std::env::temp_dir().join(format!("jmm_pipeline_{}.jmm", std::process::id()));
    std::fs::write(&path, "import io; class Hello { public static void main(String[] args) { io.println(42); } }").unwrap();
    let output = compile_file(&path, &CompilerConfig::default()).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert!(output.jasmin.starts_with(".class public Hello\n.super java/lang/Object\n"));
    assert!(output.jasmin.contains("bipush 42\n    invokestatic io/println(I)V"));

    let missing = compile_file(std::env::temp_dir().join("jmm_missing.jmm"), &CompilerConfig::default());
    assert!(matches!(missing, Err(CompileError::Io(_))));
}
