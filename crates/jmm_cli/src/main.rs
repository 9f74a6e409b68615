use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use jmm_diagnostics::{Diagnostic, Emitter};
use jmm_driver::{check, compile, CompilationOutput, CompilerConfig};
use std::fs;

#[derive(Parser)]
#[command(name = "jmmc")]
#[command(about = "Java-- 编译器 - 生成 OLLIR 与 Jasmin", version)]
struct Cli {
    /// 输出调试日志（也可以用 RUST_LOG 控制）
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CompileFlags {
    /// 执行常量传播与折叠
    #[arg(short = 'O', long)]
    optimize: bool,

    /// 语义错误降级为警告，继续生成
    #[arg(long)]
    best_effort: bool,

    /// 每个方法可用的局部变量寄存器上限
    #[arg(short = 'r', long = "registers", value_name = "N")]
    registers: Option<u16>,
}

impl CompileFlags {
    fn config(&self) -> CompilerConfig {
        CompilerConfig {
            optimize: self.optimize,
            best_effort: self.best_effort,
            register_allocation: self.registers,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// 编译 Java-- 源文件为 Jasmin 汇编
    Compile {
        /// 输入文件
        input: String,

        /// 输出文件 (默认: a.j)
        #[arg(short, long, default_value = "a.j")]
        output: String,

        /// 同时写出 OLLIR 到该文件
        #[arg(long, value_name = "FILE")]
        ollir: Option<String>,

        #[command(flatten)]
        flags: CompileFlags,
    },

    /// 检查语法和语义错误
    Check {
        /// 输入文件
        input: String,
    },

    /// 打印 OLLIR
    Ollir {
        /// 输入文件
        input: String,

        #[command(flatten)]
        flags: CompileFlags,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();

    match cli.command {
        Commands::Compile {
            input,
            output,
            ollir,
            flags,
        } => cmd_compile(&input, &output, ollir.as_deref(), &flags.config())?,
        Commands::Check { input } => cmd_check(&input)?,
        Commands::Ollir { input, flags } => cmd_ollir(&input, &flags.config())?,
    }

    Ok(())
}

fn read_source(input: &str) -> Result<String> {
    fs::read_to_string(input).with_context(|| format!("无法读取 {}", input))
}

/// 编译源文件；失败时带源码输出诊断并以状态码 1 退出
fn build(input: &str, source: &str, config: &CompilerConfig) -> CompilationOutput {
    match compile(source, config) {
        Ok(output) => {
            report(input, source, &output.warnings);
            output
        }
        Err(e) => {
            e.emit(Some(input), Some(source));
            eprintln!("❌ 编译失败");
            std::process::exit(1);
        }
    }
}

/// 编译命令
fn cmd_compile(input: &str, output: &str, ollir: Option<&str>, config: &CompilerConfig) -> Result<()> {
    println!("📦 编译 {} ...", input);
    log::debug!("compiler configuration: {:?}", config);

    let source = read_source(input)?;
    let result = build(input, &source, config);

    if let Some(path) = ollir {
        fs::write(path, &result.ollir)?;
        println!("📝 OLLIR 已写入 {}", path);
    }
    fs::write(output, result.jasmin)?;
    println!("✅ 成功生成 {}", output);

    Ok(())
}

/// 检查命令
fn cmd_check(input: &str) -> Result<()> {
    println!("🔍 检查 {} ...", input);

    let source = read_source(input)?;
    let sink = check(&source);
    report(input, &source, sink.diagnostics());

    if let Some(stage) = sink.failed_stage() {
        eprintln!(
            "❌ {} 阶段失败: {} 个错误, {} 个警告",
            stage,
            sink.error_count(),
            sink.warning_count()
        );
        std::process::exit(1);
    }
    if sink.has_errors() {
        eprintln!("❌ 发现 {} 个错误", sink.error_count());
        std::process::exit(1);
    }
    println!("✅ 无错误");
    Ok(())
}

/// OLLIR 命令
fn cmd_ollir(input: &str, config: &CompilerConfig) -> Result<()> {
    let source = read_source(input)?;
    let result = build(input, &source, config);
    print!("{}", result.ollir);
    Ok(())
}

/// 带源码片段输出诊断
fn report(input: &str, source: &str, diagnostics: &[Diagnostic]) {
    let emitter = Emitter::new();
    for diag in diagnostics {
        emitter.emit_with_source(&diag.clone().with_file(input), source);
    }
}
