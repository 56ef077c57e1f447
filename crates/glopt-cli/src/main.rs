//! Shader optimizer CLI.
//!
//! Provides the `glopt` binary with a `demo` subcommand that runs a
//! hand-built vertex or fragment shader through the full validate /
//! optimize / print pipeline and reports the before-and-after source.
//! There is no lexer/parser in this repository (see
//! `glopt_core::frontend`), so this is the `--from-ir` debug path
//! `DirectBuilder` exists for, not a general-purpose shader compiler
//! front end.

mod demo;

use std::process;

use clap::{Parser, Subcommand, ValueEnum};

use glopt_core::frontend::ShaderStage;
use glopt_facade::{CompileOptions, Context};

/// Shader IR optimizer.
#[derive(Parser)]
#[command(name = "glopt", about = "Shader IR optimizer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum StageArg {
    Vertex,
    Fragment,
}

impl From<StageArg> for ShaderStage {
    fn from(stage: StageArg) -> Self {
        match stage {
            StageArg::Vertex => ShaderStage::Vertex,
            StageArg::Fragment => ShaderStage::Fragment,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run a built-in example shader through the optimizer and print
    /// its output before and after the fixed-point driver runs.
    Demo {
        /// Which built-in example shader to run.
        #[arg(short, long, value_enum, default_value_t = StageArg::Vertex)]
        stage: StageArg,

        /// Print the result as JSON instead of plain text.
        #[arg(long)]
        json: bool,

        /// Cap on optimization sweeps before giving up on a fixed point.
        #[arg(long, default_value_t = 1000)]
        max_sweeps: u32,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let exit_code = match cli.command {
        Commands::Demo { stage, json, max_sweeps } => run_demo(stage.into(), json, max_sweeps),
    };
    process::exit(exit_code);
}

/// Runs the `demo` subcommand.
///
/// Returns exit code: 0 = success, 1 = validation or printing error.
fn run_demo(stage: ShaderStage, json: bool, max_sweeps: u32) -> i32 {
    let mut arena = glopt_core::Arena::new();
    let mut reg = glopt_core::TypeRegistry::new();
    let list = demo::build(stage, &mut arena, &mut reg);

    let options = CompileOptions {
        validate: true,
        driver: glopt_passes::DriverConfig { max_sweeps },
    };
    let mut ctx = Context::with_options(options);
    let shader = ctx.optimize_hir(stage, arena, list);

    if json {
        let json = serde_json::to_string_pretty(&ShaderReport::from(&shader))
            .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize result: {}\"}}", e));
        println!("{}", json);
    } else if shader.status {
        println!("-- raw --\n{}", shader.raw_output);
        println!("-- optimized --\n{}", shader.optimized_output);
        if !shader.log.is_empty() {
            println!("-- log --\n{}", shader.log);
        }
    } else {
        eprintln!("Error: {}", shader.log);
    }

    if shader.status {
        0
    } else {
        1
    }
}

#[derive(serde::Serialize)]
struct ShaderReport {
    status: bool,
    raw_output: String,
    optimized_output: String,
    log: String,
}

impl From<&glopt_facade::Shader> for ShaderReport {
    fn from(s: &glopt_facade::Shader) -> Self {
        ShaderReport {
            status: s.status,
            raw_output: s.raw_output.clone(),
            optimized_output: s.optimized_output.clone(),
            log: s.log.clone(),
        }
    }
}
