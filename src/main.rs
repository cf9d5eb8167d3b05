//! The minischeme binary: an interactive REPL, or a script runner when
//! given a file argument.
//!
//! For each top-level form: a `Terminate` result (from `(exit)`) stops
//! evaluation, `Void` prints nothing, and any other value prints its
//! canonical representation on its own line. Errors print one diagnostic
//! line and evaluation continues with the next form.

use std::fs;
use std::process;

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use minischeme::env::Environment;
use minischeme::evaluator;
use minischeme::parser;
use minischeme::reader;
use minischeme::value::Value;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [] => run_repl(),
        [script] => run_script(script),
        _ => {
            eprintln!("usage: minischeme [script]");
            process::exit(2);
        }
    }
}

fn run_script(path: &str) {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("minischeme: cannot read {path}: {e}");
            process::exit(1);
        }
    };
    let env = Environment::new();
    run_source(&source, &env);
}

/// Evaluate every form in `source` against `env`, printing results the
/// REPL way. Returns `false` once `(exit)` has been evaluated.
fn run_source(source: &str, env: &Environment) -> bool {
    let forms = match reader::read_all(source) {
        Ok(forms) => forms,
        Err(e) => {
            println!("{e}");
            return true;
        }
    };
    for form in forms {
        let result = parser::parse(&form, env).and_then(|expr| evaluator::eval(&expr, env));
        match result {
            Ok(Value::Terminate) => return false,
            Ok(Value::Void) => {}
            Ok(value) => println!("{value}"),
            Err(e) => println!("{e}"),
        }
    }
    true
}

fn run_repl() {
    println!("minischeme - a small Scheme with exact rational arithmetic");
    println!("Enter forms like: (define (sq x) (* x x))  or  (+ 1/3 2/3)");
    println!("Type :help for commands, :quit or (exit) to leave.");
    println!();

    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            eprintln!("minischeme: cannot initialize line editor: {e}");
            process::exit(1);
        }
    };
    let env = Environment::new();

    loop {
        match editor.readline("minischeme> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line);
                match line {
                    ":help" => {
                        print_help();
                        continue;
                    }
                    ":quit" | ":exit" => break,
                    _ => {}
                }
                if !run_source(line, &env) {
                    break;
                }
            }
            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => break,
            Err(e) => {
                eprintln!("minischeme: {e:?}");
                break;
            }
        }
    }
}

fn print_help() {
    println!("Commands:");
    println!("  :help        show this message");
    println!("  :quit        leave the interpreter (also :exit, Ctrl+D, or (exit))");
    println!();
    println!("Each line is read as a stream of forms; every non-void result");
    println!("prints on its own line. Errors abort the current form only.");
}
