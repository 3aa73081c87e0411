mod builtins;
mod config;
mod env;
mod error;
mod heap;
mod interpreter;
mod parser;
mod printer;
mod symbol;
mod value;

use clap::Parser;
use config::{GC_STEP_INTERVAL, HISTORY_FILE, WELCOME_MESSAGE, WELCOME_SUBTITLE};
use interpreter::Interpreter;
use rustyline::error::ReadlineError;
use rustyline::{Config, Editor};
use std::path::PathBuf;

/// A small trampolined Lisp interpreter with mark-and-sweep garbage
/// collection.
#[derive(Parser, Debug)]
#[command(name = "rlisp")]
#[command(version = config::VERSION)]
#[command(about = "A small trampolined Lisp interpreter")]
struct CliArgs {
    /// Script file to execute (optional -- if not provided, starts the REPL)
    #[arg(value_name = "FILE")]
    script: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();
    let mut interp = Interpreter::new();

    if let Some(script_path) = args.script {
        run_script(&mut interp, &script_path)?;
        return Ok(());
    }

    run_repl(&mut interp)
}

/// Runs every top-level form in `path`. A form that fails to evaluate is
/// reported and skipped rather than aborting the rest of the file, matching
/// the REPL's own discard-or-report behavior. A final GC runs before exit.
fn run_script(interp: &mut Interpreter, path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read script file {}: {}", path.display(), e))?;

    let exprs = interp
        .read(&contents)
        .map_err(|e| format!("parse error: {}", e))?;

    for expr in exprs {
        if let Err(e) = interp.eval_top(expr) {
            eprintln!("evaluation error: {}", e);
        }
    }

    interp.collect_garbage();
    Ok(())
}

fn run_repl(interp: &mut Interpreter) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::builder().auto_add_history(true).build();
    let mut rl: Editor<(), rustyline::history::DefaultHistory> =
        Editor::with_config(config).map_err(|e| format!("failed to initialize REPL: {}", e))?;

    let _ = rl.load_history(HISTORY_FILE);

    println!("{}", WELCOME_MESSAGE);
    println!("{}", WELCOME_SUBTITLE);
    println!(
        "Garbage collects automatically every {} evaluator steps; (gc) forces one. Ctrl-D to exit.",
        GC_STEP_INTERVAL
    );

    loop {
        let readline = rl.readline("rlisp> ");
        match readline {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                match line.trim() {
                    "(quit)" | "(exit)" => {
                        println!("Goodbye!");
                        break;
                    }
                    "(clear)" => {
                        print!("\x1B[2J\x1B[H");
                        continue;
                    }
                    _ => {}
                }

                match interp.read(&line) {
                    Ok(exprs) => {
                        for expr in exprs {
                            match interp.eval_top(expr) {
                                Ok(result) => println!("=> {}", interp.print(&result)),
                                Err(e) => eprintln!("Error: {}", e),
                            }
                        }
                    }
                    Err(e) => eprintln!("Parse error: {}", e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                eprintln!("Error: {}", err);
                break;
            }
        }
    }

    let _ = rl.save_history(HISTORY_FILE);
    Ok(())
}
