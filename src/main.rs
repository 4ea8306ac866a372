// ABOUTME: Thin CLI driver for manual smoke-testing: runs a script file or starts a REPL

use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::{Config, DefaultEditor};
use std::path::PathBuf;
use vbs_engine::{EngineError, Interpreter};

/// Runs scripts in the classic BASIC-family scripting dialect this crate implements.
#[derive(Parser, Debug)]
#[command(name = "vbs-engine")]
#[command(version = vbs_engine::VERSION)]
#[command(about = "A tree-walking interpreter for a classic BASIC-family scripting dialect")]
struct CliArgs {
    /// Script file to execute (if omitted, starts an interactive REPL)
    #[arg(value_name = "FILE")]
    script: Option<PathBuf>,

    /// Disable the cooperative execution timeout
    #[arg(long = "no-timeout")]
    no_timeout: bool,

    /// Enforce `Option Explicit` for every script regardless of its own declarations
    #[arg(long = "option-explicit")]
    option_explicit: bool,
}

fn main() {
    let args = CliArgs::parse();

    let mut options = vbs_engine::Options::default();
    if args.no_timeout {
        options.max_execution_time = None;
    }
    options.option_explicit = args.option_explicit;

    let mut interp = Interpreter::with_options(options);

    let status = match &args.script {
        Some(path) => run_script(&mut interp, path),
        None => run_repl(&mut interp),
    };

    if let Err(code) = status {
        std::process::exit(code);
    }
}

fn run_script(interp: &mut Interpreter, path: &PathBuf) -> Result<(), i32> {
    let source = std::fs::read_to_string(path).map_err(|e| {
        eprintln!("cannot read script file {}: {e}", path.display());
        1
    })?;
    interp.add_code(&source).map_err(|e| {
        report(&e);
        1
    })?;
    interp.run().map_err(|e| {
        report(&e);
        1
    })
}

fn run_repl(interp: &mut Interpreter) -> Result<(), i32> {
    println!("vbs-engine {}", vbs_engine::VERSION);
    println!("Enter a statement, or `Exit` to quit.");

    let config = Config::builder().auto_add_history(true).build();
    let mut rl = DefaultEditor::with_config(config).map_err(|e| {
        eprintln!("failed to initialize REPL: {e}");
        1
    })?;

    let history_file = ".vbs_history";
    let _ = rl.load_history(history_file);

    loop {
        match rl.readline("vbs> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line.eq_ignore_ascii_case("exit") {
                    break;
                }
                match interp.execute_statement(line) {
                    Ok(()) => {}
                    Err(e) => report(&e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("readline error: {e}");
                break;
            }
        }
    }

    let _ = rl.save_history(history_file);
    Ok(())
}

fn report(err: &EngineError) {
    eprintln!("Error {}: {err}", err.code());
}
