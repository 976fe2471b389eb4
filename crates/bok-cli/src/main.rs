//! Thin interactive front end: a line-oriented REPL over [`bok::Machine`].
//!
//! The core owns parsing and execution; this binary owns the prompt, the
//! history file, word-name tab completion, and error presentation. A file
//! argument switches to non-interactive execution.

use std::path::PathBuf;
use std::process::ExitCode;

use bok::{Error, Machine};
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::FileHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let mut machine = Machine::new();
    if let Some(lib) = std::env::var_os("BOK_LIB_PATH") {
        for dir in std::env::split_paths(&lib) {
            machine.add_lib_path(dir);
        }
    }

    if args.len() > 1 {
        run_file(&mut machine, &args[1])
    } else {
        repl(&mut machine)
    }
}

/// Execute a source file and leave. Errors exit non-zero.
fn run_file(machine: &mut Machine, path: &str) -> ExitCode {
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("{} cannot read {path}: {err}", "Error:".red());
            return ExitCode::FAILURE;
        }
    };
    let result = machine.run_source(&source);
    print!("{}", machine.take_output());
    match result {
        Ok(()) | Err(Error::Exit) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err}", "Error:".red());
            ExitCode::FAILURE
        }
    }
}

/// Prefix completion over the machine's dictionary names.
struct WordCompleter {
    words: Vec<String>,
}

impl WordCompleter {
    /// Alphanumeric-leading names only; the symbolic operators are noise in
    /// a completion menu.
    fn from_machine(machine: &Machine) -> Self {
        let words = machine
            .word_names()
            .into_iter()
            .filter(|name| name.chars().next().is_some_and(char::is_alphanumeric))
            .collect();
        Self { words }
    }
}

impl Completer for WordCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let start = line[..pos]
            .rfind(|c: char| c.is_whitespace() || matches!(c, '[' | ']' | '(' | ')' | ':'))
            .map_or(0, |i| i + 1);
        let prefix = &line[start..pos];
        if prefix.is_empty() {
            return Ok((start, Vec::new()));
        }
        let candidates = self
            .words
            .iter()
            .filter(|word| word.starts_with(prefix))
            .map(|word| Pair {
                display: word.clone(),
                replacement: word.clone(),
            })
            .collect();
        Ok((start, candidates))
    }
}

impl Hinter for WordCompleter {
    type Hint = String;
}

impl Highlighter for WordCompleter {}

impl Validator for WordCompleter {}

impl Helper for WordCompleter {}

fn history_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".bok_history"))
}

fn repl(machine: &mut Machine) -> ExitCode {
    println!("bok {}, type \"[<word>] help\" for help.", env!("CARGO_PKG_VERSION"));
    println!("Hit CTRL+D or type \"exit\" to quit.");

    let mut editor: Editor<WordCompleter, FileHistory> = match Editor::new() {
        Ok(editor) => editor,
        Err(err) => {
            eprintln!("{} cannot start line editor: {err}", "Error:".red());
            return ExitCode::FAILURE;
        }
    };
    let history = history_path();
    if let Some(path) = &history {
        let _ = editor.load_history(path);
    }

    let code = loop {
        // Rebuilt each prompt so newly defined and imported words complete.
        editor.set_helper(Some(WordCompleter::from_machine(machine)));
        match editor.readline(" \u{ab} ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line.as_str());
                match machine.run_source(&line) {
                    Ok(()) => print!("{}", machine.take_output()),
                    Err(Error::Exit) => {
                        print!("{}", machine.take_output());
                        break ExitCode::SUCCESS;
                    }
                    Err(err @ Error::Parse { .. }) => {
                        eprintln!("{} {err}", "Error:".red());
                    }
                    Err(err) => {
                        print!("{}", machine.take_output());
                        eprintln!("{} {err}", "Error:".red());
                        eprintln!("{}", "Stack dumped".red());
                    }
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("{} {err}", "Error:".red());
                break ExitCode::FAILURE;
            }
        }
    };

    if let Some(path) = &history {
        let _ = editor.save_history(path);
    }
    code
}
