//! Spin driver — standalone binary.
//!
//! Thin wrapper around the Wings → Parser → Interpreter pipeline: reads one
//! source path from argv, runs it, and translates any error to
//! `file[line]: code: message` on stderr (spec §6). All language logic
//! lives in `spin-syntax`/`spin-runtime`; this binary only wires the
//! pipeline together and handles process exit codes, the way
//! `logicaffeine_cli`'s `main.rs` wraps `run_cli()`.
//!
//! # Exit codes
//!
//! - `0` — the program ran to completion.
//! - `1` — a file-management, preprocessor, syntax, or evaluation error was
//!   reported to stderr.

use std::path::PathBuf;
use std::process::ExitCode;

use spin_base::{Arena, Interner};
use spin_syntax::ast::{AstContext, ClassMember, Expression, Param, Statement};
use spin_syntax::wings::CodeUnit;
use spin_syntax::{Parser, SyntaxTree};
use spin_runtime::Interpreter;

fn main() -> ExitCode {
    env_logger::init();

    let path = match std::env::args().nth(1) {
        Some(p) => PathBuf::from(p),
        None => {
            eprintln!("usage: spin <path>");
            return ExitCode::FAILURE;
        }
    };

    let mut interner = Interner::new();
    let program = match spin_syntax::resolve(&path, &mut interner) {
        Ok(p) => p,
        Err(e) => {
            // The file that failed couldn't be read (or its import couldn't be
            // resolved) before we had a source buffer for it, so there's no
            // text to resolve the error's span against; the span's line
            // number degrades to 1 in that case.
            eprintln!("{}", e.render(&path.display().to_string(), ""));
            return ExitCode::FAILURE;
        }
    };

    let exprs: Arena<Expression> = Arena::new();
    let stmts: Arena<Statement> = Arena::new();
    let params: Arena<Param> = Arena::new();
    let members: Arena<ClassMember> = Arena::new();
    let ast = AstContext::new(&exprs, &stmts, &params, &members);

    // Wings are parsed and later run in dependency order (deepest first),
    // ahead of the main unit, so forward references to wing-declared
    // classes/functions resolve in the interpreter's single-pass environment.
    let units: Vec<&CodeUnit> = program.wings.iter().chain(std::iter::once(&program.main)).collect();

    let mut trees: Vec<(&CodeUnit, SyntaxTree<'_>)> = Vec::with_capacity(units.len());
    {
        let mut parser = Parser::new(ast, &mut interner);
        for unit in &units {
            match parser.parse(&unit.tokens) {
                Ok(tree) => trees.push((unit, tree)),
                Err(exception) => {
                    for e in &exception.errors {
                        eprintln!("{}", e.render(&unit.name, &unit.contents));
                    }
                    return ExitCode::FAILURE;
                }
            }
        }
    }

    let mut interpreter = Interpreter::new(interner);
    interpreter.install_libraries(&program.libraries);

    for (unit, tree) in &trees {
        if let Err(e) = interpreter.run(std::slice::from_ref(tree)) {
            eprintln!("{}", e.render(&unit.name, &unit.contents));
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}
