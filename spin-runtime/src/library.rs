//! Native library bootstrap (spec §4.5, §6).
//!
//! `Console` is installed as a `Class` whose static members are native
//! routines, grounded directly in the original evaluator's library
//! definer (`Libraries.cpp`): a class, not an instance, because nothing
//! ever constructs a `Console`. `Kronos` and `Maths` are no-ops here —
//! `clock`/`sleep`/`random` are installed unconditionally at interpreter
//! startup regardless of any `import` (spec §9 supplement), and `Maths`
//! has no required entry points.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write as _};
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use spin_base::{ErrorCode, Interner, Result, Span, SpannedError};
use spin_syntax::ast::AccessModifier;
use spin_syntax::LibraryId;

use crate::environment::Environment;
use crate::interpreter::Interpreter;
use crate::value::{ClassData, NativeDef, NativeFn, Object, Routine};

fn native_function<'a>(name: &'static str, arity: Option<usize>, func: NativeFn<'a>) -> Object<'a> {
    Object::Routine(Routine::NativeFunction(Rc::new(NativeDef { name, arity, func }), None))
}

fn native_procedure<'a>(name: &'static str, arity: Option<usize>, func: NativeFn<'a>) -> Object<'a> {
    Object::Routine(Routine::NativeProcedure(Rc::new(NativeDef { name, arity, func }), None))
}

fn stringify_args<'a>(interp: &Interpreter<'a>, args: &[Object<'a>]) -> String {
    args.iter().map(|a| a.stringify(|s| interp.resolve(s).to_string())).collect::<Vec<_>>().join("")
}

fn read_line() -> String {
    let mut buf = String::new();
    let _ = io::stdin().read_line(&mut buf);
    while buf.ends_with('\n') || buf.ends_with('\r') {
        buf.pop();
    }
    buf
}

/// Builds the `\e[{sgr};5;{n}m` / `\e[{sgr};2;{r};{g};{b}m` escape for
/// `setBackground`/`setForeground`, whose single-argument form takes an
/// 8-bit palette index and three-argument form takes RGB channels
/// (spec §4.5; grounded in `Libraries.cpp`'s `setBackground`/`setForeground`).
fn sgr_channel(args: &[Object], sgr: &str, span: Span) -> Result<String> {
    fn channel_value(o: &Object) -> Option<i64> {
        match o {
            Object::Integer(n) => Some(*n),
            Object::Byte(b) => Some(*b as i64),
            _ => None,
        }
    }
    match args.len() {
        1 => {
            let n = channel_value(&args[0])
                .ok_or_else(|| SpannedError::new(ErrorCode::Evaluation, "expected an Integer or Byte palette index", span))?;
            Ok(format!("\x1b[{};5;{}m", sgr, n))
        }
        3 => {
            let mut parts = Vec::with_capacity(3);
            for arg in args {
                let n = channel_value(arg).ok_or_else(|| {
                    SpannedError::new(ErrorCode::Evaluation, "expected Integer or Byte RGB components", span)
                })?;
                parts.push(n.to_string());
            }
            Ok(format!("\x1b[{};2;{};{};{}m", sgr, parts[0], parts[1], parts[2]))
        }
        _ => Err(SpannedError::new(
            ErrorCode::Evaluation,
            "call doesn't match the predefined parameters: expected 1 or 3 arguments",
            span,
        )),
    }
}

/// `sleep`, `clock`, `random` — always in scope, independent of any
/// `import Kronos` (spec §9 supplement to the distilled grammar).
pub fn install_always_available<'a>(globals: &Environment<'a>, interner: &mut Interner) {
    globals.define(
        interner.intern("sleep"),
        native_procedure("sleep", Some(1), Rc::new(|_interp, args, span| {
            let ms = match args.first() {
                Some(Object::Integer(n)) if *n >= 0 => *n as u64,
                _ => {
                    return Err(SpannedError::new(
                        ErrorCode::Evaluation,
                        "sleep expects a non-negative Integer of milliseconds",
                        span,
                    ))
                }
            };
            std::thread::sleep(std::time::Duration::from_millis(ms));
            Ok(None)
        })),
    );
    globals.define(
        interner.intern("clock"),
        native_function("clock", Some(0), Rc::new(|_interp, _args, _span| {
            let millis = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
            Ok(Some(Object::Integer(millis as i64)))
        })),
    );
    globals.define(
        interner.intern("random"),
        native_function("random", Some(0), Rc::new(|_interp, _args, _span| {
            Ok(Some(Object::Real(rand::random::<f64>())))
        })),
    );
}

pub fn install<'a>(library: LibraryId, globals: &Environment<'a>, interner: &mut Interner) {
    match library {
        LibraryId::Console => install_console(globals, interner),
        LibraryId::Kronos | LibraryId::Maths => {}
    }
}

fn install_console<'a>(globals: &Environment<'a>, interner: &mut Interner) {
    let mut statics = HashMap::new();

    statics.insert(
        interner.intern("write"),
        (AccessModifier::Public, native_procedure("write", None, Rc::new(|interp, args, _span| {
            print!("{}", stringify_args(interp, args));
            let _ = io::stdout().flush();
            Ok(None)
        }))),
    );
    statics.insert(
        interner.intern("writeLine"),
        (AccessModifier::Public, native_procedure("writeLine", None, Rc::new(|interp, args, _span| {
            println!("{}", stringify_args(interp, args));
            Ok(None)
        }))),
    );
    statics.insert(
        interner.intern("read"),
        (AccessModifier::Public, native_function("read", None, Rc::new(|interp, args, _span| {
            print!("{}", stringify_args(interp, args));
            let _ = io::stdout().flush();
            Ok(Some(Object::String(read_line())))
        }))),
    );
    statics.insert(
        interner.intern("readLine"),
        (AccessModifier::Public, native_function("readLine", None, Rc::new(|interp, args, _span| {
            println!("{}", stringify_args(interp, args));
            Ok(Some(Object::String(read_line())))
        }))),
    );
    statics.insert(
        interner.intern("setBackground"),
        (AccessModifier::Public, native_procedure("setBackground", None, Rc::new(|_interp, args, span| {
            print!("{}", sgr_channel(args, "48", span)?);
            let _ = io::stdout().flush();
            Ok(None)
        }))),
    );
    statics.insert(
        interner.intern("setForeground"),
        (AccessModifier::Public, native_procedure("setForeground", None, Rc::new(|_interp, args, span| {
            print!("{}", sgr_channel(args, "38", span)?);
            let _ = io::stdout().flush();
            Ok(None)
        }))),
    );
    statics.insert(
        interner.intern("reset"),
        (AccessModifier::Public, native_procedure("reset", Some(0), Rc::new(|_interp, _args, _span| {
            print!("\x1b[0m");
            let _ = io::stdout().flush();
            Ok(None)
        }))),
    );
    statics.insert(
        interner.intern("clean"),
        (AccessModifier::Public, native_procedure("clean", Some(0), Rc::new(|_interp, _args, _span| {
            print!("\x1bc\x1b[3J");
            let _ = io::stdout().flush();
            Ok(None)
        }))),
    );

    let class = Rc::new(ClassData {
        name: interner.intern("Console"),
        static_members: RefCell::new(statics),
        dynamic_attrs: Vec::new(),
        at_create: None,
        at_delete: None,
    });
    globals.define(class.name, Object::Class(class));
}
