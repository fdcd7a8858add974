//! Tree-walking evaluator (spec §4.5).
//!
//! Walks `Statement`/`Expression` by pattern match rather than the
//! original's double-dispatch `Visitor` pair; control flow that the
//! original threw as an `InterpreterReturn` exception (and a pair of
//! `broken`/`continued` booleans) is instead a plain return value —
//! [`Flow`] — propagated up through `?` the same way an error would be.
//! Every binary/unary/assignment/subscript/inner-product operation is
//! delegated to [`crate::processor::Processor`]; this module owns name
//! resolution, scoping, routine calls, and class instantiation.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use spin_base::{ErrorCode, Interner, Result, Span, SpannedError, Symbol};
use spin_syntax::ast::{AccessModifier, BraKetRef, Expression, LiteralValue, Statement};
use spin_syntax::token::TokenKind;
use spin_syntax::SyntaxTree;

use crate::environment::Environment;
use crate::processor::Processor;
use crate::value::{
    BasicType, Class, Complex, Direction, Instance, NativeDef, Object, Routine, RoutineDef, Vector,
};

fn err(message: impl Into<String>, span: Span) -> SpannedError {
    SpannedError::new(ErrorCode::Evaluation, message, span)
}

/// What a just-executed statement wants its enclosing construct to do.
/// Mirrors the `ControlFlow` shape a tree-walker typically reaches for in
/// place of exceptions: `Normal` falls through, the other three unwind one
/// level at a time until something (a loop, a routine call) consumes them.
pub enum Flow<'a> {
    Normal,
    Break,
    Continue,
    Return(Option<Object<'a>>),
}

/// Which kind of runtime value a member-access expression resolved its
/// object operand to. Spec §4.5 gives `.` and `::` identical resolution
/// rules — both accept either an `Instance` or a `Class` — so `DynamicGet`
/// and `StaticGet` share this one path instead of the original's stricter,
/// asymmetric per-operator typing (see `DESIGN.md`).
enum MemberOwner<'a> {
    Instance(Instance<'a>),
    Class(Class<'a>),
}

pub struct Interpreter<'a> {
    interner: Interner,
    globals: Environment<'a>,
    environment: Environment<'a>,
    self_symbol: Symbol,
    current_file: Symbol,
}

impl<'a> Interpreter<'a> {
    pub fn new(mut interner: Interner) -> Self {
        let globals = Environment::root();
        crate::library::install_always_available(&globals, &mut interner);
        let self_symbol = interner.intern("self");
        Interpreter {
            interner,
            environment: globals.clone(),
            globals,
            self_symbol,
            current_file: Symbol::EMPTY,
        }
    }

    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    pub fn resolve(&self, sym: Symbol) -> &str {
        self.interner.resolve(sym)
    }

    /// Looks up a top-level binding by name, interning it first. Exposed for
    /// callers (and integration tests) that only have a name string, not a
    /// `Symbol` already resolved against this interpreter's interner.
    pub fn global(&mut self, name: &str) -> Option<Object<'a>> {
        let sym = self.interner.intern(name);
        self.globals.get_value(sym)
    }

    /// Brings a Wings-resolved library's definitions into scope (spec
    /// §4.5's "library bootstrap"). `Kronos`/`Maths` are no-ops here: the
    /// globals they would add (`clock`) are already always-available
    /// (spec §9 supplement), and `Maths` has no required entry points.
    pub fn install_libraries(&mut self, libraries: &[spin_syntax::LibraryId]) {
        for library in libraries {
            crate::library::install(*library, &self.globals, &mut self.interner);
        }
    }

    /// Runs every code unit's top-level statements against the shared
    /// global environment, in the order Wings returned them (dependency
    /// wings before the main unit), so a wing's class/function/procedure
    /// declarations are visible to everything that imported it.
    pub fn run(&mut self, units: &[SyntaxTree<'a>]) -> Result<()> {
        for unit in units {
            if let Err(e) = self.execute_statements(&unit.statements) {
                log::error!("{}", e);
                return Err(e);
            }
        }
        Ok(())
    }

    fn execute_statements(&mut self, statements: &[&'a Statement<'a>]) -> Result<Flow<'a>> {
        for stmt in statements {
            match self.execute_statement(stmt)? {
                Flow::Normal => {}
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal)
    }

    /// Pushes a child scope, runs `statements` in it, and always restores
    /// the enclosing environment afterwards — including on error, since a
    /// `?` inside the loop would otherwise leak the pushed scope.
    fn execute_block(&mut self, statements: &'a [Statement<'a>]) -> Result<Flow<'a>> {
        let previous = self.environment.clone();
        self.environment = previous.child();
        let result = (|| {
            for stmt in statements {
                match self.execute_statement(stmt)? {
                    Flow::Normal => {}
                    other => return Ok(other),
                }
            }
            Ok(Flow::Normal)
        })();
        self.environment = previous;
        result
    }

    fn execute_statement(&mut self, stmt: &'a Statement<'a>) -> Result<Flow<'a>> {
        match stmt {
            Statement::Block(statements) => self.execute_block(statements),
            Statement::If { condition, then_branch, else_branch, span } => {
                let value = self.evaluate(condition)?;
                let truth = value.as_bool().ok_or_else(|| {
                    err("unsupported evaluation of non logical expression in conditional statement", *span)
                })?;
                if truth {
                    self.execute_statement(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute_statement(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Statement::While { condition, body, span } => {
                loop {
                    let value = self.evaluate(condition)?;
                    let truth = value.as_bool().ok_or_else(|| {
                        err("unsupported evaluation of non logical condition in iteration statement", *span)
                    })?;
                    if !truth {
                        break;
                    }
                    match self.execute_statement(body)? {
                        Flow::Break => break,
                        Flow::Continue | Flow::Normal => {}
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                }
                Ok(Flow::Normal)
            }
            Statement::DoWhile { body, condition, span } => {
                match self.execute_statement(body)? {
                    Flow::Break => return Ok(Flow::Normal),
                    Flow::Continue | Flow::Normal => {}
                    ret @ Flow::Return(_) => return Ok(ret),
                }
                loop {
                    let value = self.evaluate(condition)?;
                    let truth = value.as_bool().ok_or_else(|| {
                        err("unsupported evaluation of non logical condition in iteration statement", *span)
                    })?;
                    if !truth {
                        break;
                    }
                    match self.execute_statement(body)? {
                        Flow::Break => break,
                        Flow::Continue | Flow::Normal => {}
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                }
                Ok(Flow::Normal)
            }
            Statement::Until { condition, body, span } => {
                loop {
                    let value = self.evaluate(condition)?;
                    let truth = value.as_bool().ok_or_else(|| {
                        err("unsupported evaluation of non logical expression in iteration statement", *span)
                    })?;
                    if truth {
                        break;
                    }
                    match self.execute_statement(body)? {
                        Flow::Break => break,
                        Flow::Continue | Flow::Normal => {}
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                }
                Ok(Flow::Normal)
            }
            Statement::RepeatUntil { body, condition, span } => {
                match self.execute_statement(body)? {
                    Flow::Break => return Ok(Flow::Normal),
                    Flow::Continue | Flow::Normal => {}
                    ret @ Flow::Return(_) => return Ok(ret),
                }
                loop {
                    let value = self.evaluate(condition)?;
                    let truth = value.as_bool().ok_or_else(|| {
                        err("unsupported evaluation of non logical expression in iteration statement", *span)
                    })?;
                    if truth {
                        break;
                    }
                    match self.execute_statement(body)? {
                        Flow::Break => break,
                        Flow::Continue | Flow::Normal => {}
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                }
                Ok(Flow::Normal)
            }
            Statement::Loop { body, .. } => loop {
                match self.execute_statement(body)? {
                    Flow::Break => return Ok(Flow::Normal),
                    Flow::Continue | Flow::Normal => {}
                    ret @ Flow::Return(_) => return Ok(ret),
                }
            },
            Statement::For { declaration, condition, stepper, body, span } => {
                let previous = self.environment.clone();
                self.environment = previous.child();
                let result = (|| {
                    self.execute_statement(declaration)?;
                    loop {
                        let value = self.evaluate(condition)?;
                        let truth = value.as_bool().ok_or_else(|| {
                            err("unsupported evaluation of non logical expression in iteration statement", *span)
                        })?;
                        if !truth {
                            break;
                        }
                        match self.execute_statement(body)? {
                            Flow::Break => break,
                            Flow::Continue | Flow::Normal => {}
                            ret @ Flow::Return(_) => return Ok(ret),
                        }
                        self.evaluate(stepper)?;
                    }
                    Ok(Flow::Normal)
                })();
                self.environment = previous;
                result
            }
            Statement::Break { .. } => Ok(Flow::Break),
            Statement::Continue { .. } => Ok(Flow::Continue),
            Statement::Rest { .. } => Ok(Flow::Normal),
            Statement::Return { value, .. } => match value {
                Some(expr) => Ok(Flow::Return(Some(self.evaluate(expr)?))),
                None => Ok(Flow::Return(None)),
            },
            Statement::Delete { name, span } => {
                if self.environment.forget(*name) {
                    Ok(Flow::Normal)
                } else {
                    Err(err(
                        format!(
                            "unexpected identifier '{}'! you can only delete variables defined in the innermost scope",
                            self.resolve(*name)
                        ),
                        *span,
                    ))
                }
            }
            Statement::Variable { type_name, is_basic, name, initializer, span } => {
                let value = self.eval_variable_initial(*type_name, *is_basic, *initializer, *span)?;
                if self.environment.defined_here(*name) {
                    return Err(err(
                        format!("variable redefinition! the identifier '{}' was already declared in the current scope", self.resolve(*name)),
                        *span,
                    ));
                }
                self.environment.define(*name, value);
                Ok(Flow::Normal)
            }
            Statement::Vector { name, is_ket, initializer, span } => {
                let value = self.eval_vector_initial(*is_ket, *initializer, *span)?;
                if self.environment.defined_here(*name) {
                    return Err(err(
                        format!("variable redefinition! the identifier '{}' was already declared in the current scope", self.resolve(*name)),
                        *span,
                    ));
                }
                self.environment.define(*name, value);
                Ok(Flow::Normal)
            }
            Statement::Function { name, params, return_type, body, span } => {
                if self.environment.defined_here(*name) {
                    return Err(err(
                        format!("function redefinition! the object '{}' was already declared within the current scope", self.resolve(*name)),
                        *span,
                    ));
                }
                let def = Rc::new(RoutineDef {
                    name: *name,
                    params,
                    return_type: *return_type,
                    body,
                    closure: self.environment.clone(),
                });
                self.environment.define(*name, Object::Routine(Routine::Function(def, None)));
                Ok(Flow::Normal)
            }
            Statement::Procedure { name, params, body, span } => {
                if self.environment.defined_here(*name) {
                    return Err(err(
                        format!("procedure redefinition! the object '{}' was already declared within the current scope", self.resolve(*name)),
                        *span,
                    ));
                }
                let def = Rc::new(RoutineDef {
                    name: *name,
                    params,
                    return_type: Symbol::EMPTY,
                    body,
                    closure: self.environment.clone(),
                });
                self.environment.define(*name, Object::Routine(Routine::Procedure(def, None)));
                Ok(Flow::Normal)
            }
            Statement::Class { name, members, span } => {
                self.execute_class(*name, members, *span)?;
                Ok(Flow::Normal)
            }
            Statement::Expr(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }
            Statement::File { name, .. } => {
                self.current_file = *name;
                Ok(Flow::Normal)
            }
        }
    }

    fn execute_class(&mut self, name: Symbol, members: &'a [spin_syntax::ast::ClassMember<'a>], span: Span) -> Result<()> {
        let mut static_members = HashMap::new();
        let mut dynamic_attrs = Vec::new();
        let mut at_create = None;
        let mut at_delete = None;

        for member in members {
            match member.declaration {
                Statement::Function { name: fname, params, return_type, body, span: fspan } => {
                    if member.class_scoped {
                        let def = Rc::new(RoutineDef {
                            name: *fname,
                            params,
                            return_type: *return_type,
                            body,
                            closure: self.globals.clone(),
                        });
                        let routine = Object::Routine(Routine::Function(def, None));
                        if static_members.insert(*fname, (member.modifier, routine)).is_some() {
                            return Err(err(
                                format!("function redefinition! the object '{}' was already declared within the current scope", self.resolve(*fname)),
                                *fspan,
                            ));
                        }
                    } else {
                        dynamic_attrs.push(crate::value::AttributeDecl {
                            modifier: member.modifier,
                            declaration: member.declaration,
                        });
                    }
                }
                Statement::Procedure { name: pname, params, body, span: pspan } => {
                    let def = Rc::new(RoutineDef {
                        name: *pname,
                        params,
                        return_type: Symbol::EMPTY,
                        body,
                        closure: self.globals.clone(),
                    });
                    let routine = Routine::Procedure(def, None);
                    if member.is_create {
                        at_create = Some(routine);
                    } else if member.is_delete {
                        at_delete = Some(routine);
                    } else if member.class_scoped {
                        if static_members.insert(*pname, (member.modifier, Object::Routine(routine))).is_some() {
                            return Err(err(
                                format!("procedure redefinition! the object '{}' was already declared within the current scope", self.resolve(*pname)),
                                *pspan,
                            ));
                        }
                    } else {
                        dynamic_attrs.push(crate::value::AttributeDecl {
                            modifier: member.modifier,
                            declaration: member.declaration,
                        });
                    }
                }
                Statement::Variable { type_name, is_basic, name: mname, initializer, span: mspan } => {
                    if member.class_scoped {
                        let value = self.eval_variable_initial(*type_name, *is_basic, *initializer, *mspan)?;
                        if static_members.insert(*mname, (member.modifier, value)).is_some() {
                            return Err(err(
                                format!("variable redefinition! the identifier '{}' was already declared with type in current scope", self.resolve(*mname)),
                                *mspan,
                            ));
                        }
                    } else {
                        dynamic_attrs.push(crate::value::AttributeDecl {
                            modifier: member.modifier,
                            declaration: member.declaration,
                        });
                    }
                }
                Statement::Vector { name: mname, is_ket, initializer, span: mspan } => {
                    if member.class_scoped {
                        let value = self.eval_vector_initial(*is_ket, *initializer, *mspan)?;
                        if static_members.insert(*mname, (member.modifier, value)).is_some() {
                            return Err(err(
                                format!("variable redefinition! the identifier '{}' was already declared with type in current scope", self.resolve(*mname)),
                                *mspan,
                            ));
                        }
                    } else {
                        dynamic_attrs.push(crate::value::AttributeDecl {
                            modifier: member.modifier,
                            declaration: member.declaration,
                        });
                    }
                }
                _ => unreachable!("class members are limited to Variable/Vector/Function/Procedure by the parser"),
            }
        }

        let class_data = Rc::new(crate::value::ClassData {
            name,
            static_members: RefCell::new(static_members),
            dynamic_attrs,
            at_create,
            at_delete,
        });
        if self.environment.defined_here(name) {
            return Err(err(
                format!("object redefinition! the object '{}' was already declared", self.resolve(name)),
                span,
            ));
        }
        self.environment.define(name, Object::Class(class_data));
        Ok(())
    }

    fn eval_variable_initial(
        &mut self,
        type_name: Symbol,
        is_basic: bool,
        initializer: Option<&'a Expression<'a>>,
        span: Span,
    ) -> Result<Object<'a>> {
        if is_basic {
            let basic = BasicType::from_name(self.resolve(type_name))
                .ok_or_else(|| err(format!("unknown basic type '{}'", self.resolve(type_name)), span))?;
            let base = default_for_basic(basic);
            match initializer {
                Some(expr) => {
                    let value = self.evaluate(expr)?;
                    Processor::assign(&base, &value, span)
                }
                None => Ok(base),
            }
        } else {
            let class_obj = self
                .environment
                .get_value(type_name)
                .ok_or_else(|| err(format!("object definition '{}' not found", self.resolve(type_name)), span))?;
            let class = match class_obj {
                Object::Class(c) => c,
                other => {
                    return Err(err(
                        format!("'{}' is not a class definition, found '{}'", self.resolve(type_name), other.type_name()),
                        span,
                    ))
                }
            };
            let bare = Object::Instance(self.instantiate_bare(&class)?);
            match initializer {
                Some(expr) => {
                    let value = self.evaluate(expr)?;
                    Processor::assign(&bare, &value, span)
                }
                None => {
                    if class_arity(&class) > 0 {
                        Err(err("object instantiation requires a constructor call when one is defined", span))
                    } else {
                        Ok(bare)
                    }
                }
            }
        }
    }

    fn eval_vector_initial(
        &mut self,
        is_ket: bool,
        initializer: Option<&'a Expression<'a>>,
        span: Span,
    ) -> Result<Object<'a>> {
        let direction = if is_ket { Direction::Ket } else { Direction::Bra };
        let base = Object::Vector(Vector::new(vec![Complex::new(0.0, 0.0); 2], direction));
        match initializer {
            Some(expr) => {
                let value = self.evaluate(expr)?;
                Processor::assign(&base, &value, span)
            }
            None => Ok(base),
        }
    }

    fn instantiate_bare(&mut self, class: &Class<'a>) -> Result<Instance<'a>> {
        let attrs = self.replay_dynamic_attributes(class)?;
        Ok(Instance::new(class.clone(), attrs))
    }

    fn replay_dynamic_attributes(
        &mut self,
        class: &Class<'a>,
    ) -> Result<HashMap<Symbol, (AccessModifier, Object<'a>)>> {
        let mut attrs = HashMap::new();
        for decl in class.dynamic_attrs.iter() {
            let (name, value) = match decl.declaration {
                Statement::Variable { type_name, is_basic, name, initializer, span } => {
                    (*name, self.eval_variable_initial(*type_name, *is_basic, *initializer, *span)?)
                }
                Statement::Vector { name, is_ket, initializer, span } => {
                    (*name, self.eval_vector_initial(*is_ket, *initializer, *span)?)
                }
                Statement::Function { name, params, return_type, body, .. } => {
                    let def = Rc::new(RoutineDef {
                        name: *name,
                        params,
                        return_type: *return_type,
                        body,
                        closure: self.globals.clone(),
                    });
                    (*name, Object::Routine(Routine::Function(def, None)))
                }
                Statement::Procedure { name, params, body, .. } => {
                    let def = Rc::new(RoutineDef {
                        name: *name,
                        params,
                        return_type: Symbol::EMPTY,
                        body,
                        closure: self.globals.clone(),
                    });
                    (*name, Object::Routine(Routine::Procedure(def, None)))
                }
                _ => unreachable!("class attributes are limited to Variable/Vector/Function/Procedure by the parser"),
            };
            if attrs.contains_key(&name) {
                return Err(err(
                    format!("variable redefinition! the identifier '{}' was already declared within the current scope", self.resolve(name)),
                    decl.declaration.span(),
                ));
            }
            attrs.insert(name, (decl.modifier, value));
        }
        Ok(attrs)
    }

    /// Evaluates a constructor call: a fresh instance with its
    /// (non-static) attributes replayed, then `@create` run against it
    /// with `args` bound, if the class declares one (spec §4.5/§4.3).
    fn construct(&mut self, class: &Class<'a>, args: Vec<Object<'a>>, span: Span) -> Result<Instance<'a>> {
        let instance = self.instantiate_bare(class)?;
        match &class.at_create {
            Some(routine) => {
                let bound = routine.bind(instance.clone());
                self.call_routine(&bound, args, span)?;
            }
            None => {
                if !args.is_empty() {
                    return Err(err("object instantiation requires a constructor call when one is defined", span));
                }
            }
        }
        Ok(instance)
    }

    /// Shared call path for every `Routine` variant: arity and parameter
    /// type checking, `self` binding, and (for user routines) the
    /// return-type contract (spec §4.6).
    fn call_routine(&mut self, routine: &Routine<'a>, args: Vec<Object<'a>>, span: Span) -> Result<Option<Object<'a>>> {
        match routine {
            Routine::Function(def, bound_self) => {
                let value = self.call_user_routine(def, bound_self.as_deref(), &args, span)?;
                match value {
                    Flow::Return(Some(v)) => {
                        if self.value_matches_type(&v, def.return_type) {
                            Ok(Some(v))
                        } else {
                            Err(err(
                                format!(
                                    "function '{}' did not return a valid '{}' value",
                                    self.resolve(def.name),
                                    self.resolve(def.return_type)
                                ),
                                span,
                            ))
                        }
                    }
                    _ => Err(err(
                        format!(
                            "function '{}' reached the end of its body without returning a valid '{}' value",
                            self.resolve(def.name),
                            self.resolve(def.return_type)
                        ),
                        span,
                    )),
                }
            }
            Routine::Procedure(def, bound_self) => {
                let value = self.call_user_routine(def, bound_self.as_deref(), &args, span)?;
                match value {
                    Flow::Return(Some(v)) => Err(err(
                        format!(
                            "procedure '{}' reached an invalid return statement with a value of type '{}'",
                            self.resolve(def.name),
                            v.type_name()
                        ),
                        span,
                    )),
                    _ => Ok(None),
                }
            }
            Routine::NativeFunction(def, _) | Routine::NativeProcedure(def, _) => {
                self.call_native(def, &args, span)
            }
        }
    }

    fn call_user_routine(
        &mut self,
        def: &Rc<RoutineDef<'a>>,
        bound_self: Option<&Instance<'a>>,
        args: &[Object<'a>],
        span: Span,
    ) -> Result<Flow<'a>> {
        if args.len() != def.params.len() {
            return Err(err(
                format!("call of '{}' doesn't match the predefined parameters", self.resolve(def.name)),
                span,
            ));
        }
        for (param, arg) in def.params.iter().zip(args.iter()) {
            if !self.value_matches_param(param, arg) {
                return Err(err(
                    format!("call of '{}' doesn't match the predefined parameters", self.resolve(def.name)),
                    span,
                ));
            }
        }
        let call_env = def.closure.child();
        if let Some(instance) = bound_self {
            call_env.define(self.self_symbol, Object::Instance(instance.clone()));
        }
        for (param, arg) in def.params.iter().zip(args.iter()) {
            call_env.define(param.name, arg.clone());
        }
        let previous = std::mem::replace(&mut self.environment, call_env);
        let result = self.execute_statements_owned(def.body);
        self.environment = previous;
        result
    }

    /// Identical to [`execute_statements`] but over a `&'a [Statement]`
    /// slice (a routine body) rather than a `Vec<&'a Statement>` (a
    /// code unit's top level) — the two containers aren't the same type.
    fn execute_statements_owned(&mut self, statements: &'a [Statement<'a>]) -> Result<Flow<'a>> {
        for stmt in statements {
            match self.execute_statement(stmt)? {
                Flow::Normal => {}
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal)
    }

    fn call_native(&mut self, def: &Rc<NativeDef<'a>>, args: &[Object<'a>], span: Span) -> Result<Option<Object<'a>>> {
        if let Some(arity) = def.arity {
            if args.len() != arity {
                return Err(err(format!("call of '{}' doesn't match the predefined parameters", def.name), span));
            }
        }
        let func = def.func.clone();
        func(self, args, span)
    }

    fn value_matches_param(&self, param: &spin_syntax::ast::Param, arg: &Object<'a>) -> bool {
        if param.is_basic {
            BasicType::from_name(self.resolve(param.type_name)) == arg.basic_type()
        } else {
            match arg {
                Object::Instance(instance) => self.resolve(instance.class.name) == self.resolve(param.type_name),
                _ => false,
            }
        }
    }

    fn value_matches_type(&self, value: &Object<'a>, type_name: Symbol) -> bool {
        match value {
            Object::Instance(instance) => self.resolve(instance.class.name) == self.resolve(type_name),
            _ => match BasicType::from_name(self.resolve(type_name)) {
                Some(basic) => value.basic_type() == Some(basic),
                None => false,
            },
        }
    }

    fn resolve_owner(&self, object: Object<'a>, span: Span) -> Result<MemberOwner<'a>> {
        match object {
            Object::Instance(i) => Ok(MemberOwner::Instance(i)),
            Object::Class(c) => Ok(MemberOwner::Class(c)),
            other => Err(err(
                format!("the resolved object of type '{}' does not provide a member context", other.type_name()),
                span,
            )),
        }
    }

    fn member_not_found(&self, name: Symbol, span: Span) -> SpannedError {
        err(
            format!("the resolved object does not contain any attribute, field or method named '{}'", self.resolve(name)),
            span,
        )
    }

    fn member_lookup(&self, owner: &MemberOwner<'a>, name: Symbol) -> Option<(AccessModifier, Object<'a>)> {
        match owner {
            MemberOwner::Instance(instance) => instance.get(name),
            MemberOwner::Class(class) => class.static_members.borrow().get(&name).cloned(),
        }
    }

    fn eval_member_get(
        &mut self,
        object: &'a Expression<'a>,
        name: Symbol,
        self_reference: bool,
        span: Span,
    ) -> Result<Object<'a>> {
        let object_value = self.evaluate(object)?;
        let owner = self.resolve_owner(object_value, span)?;
        let (modifier, value) = self
            .member_lookup(&owner, name)
            .ok_or_else(|| self.member_not_found(name, span))?;
        if !self_reference && modifier == AccessModifier::Hidden {
            return Err(self.member_not_found(name, span));
        }
        if let Object::Routine(routine) = &value {
            if let MemberOwner::Instance(instance) = &owner {
                return Ok(Object::Routine(routine.bind(instance.clone())));
            }
        }
        Ok(value)
    }

    fn eval_member_set(
        &mut self,
        object: &'a Expression<'a>,
        name: Symbol,
        value_expr: &'a Expression<'a>,
        self_reference: bool,
        span: Span,
    ) -> Result<Object<'a>> {
        let object_value = self.evaluate(object)?;
        let owner = self.resolve_owner(object_value, span)?;
        let (modifier, current) = self
            .member_lookup(&owner, name)
            .ok_or_else(|| self.member_not_found(name, span))?;
        if !self_reference && modifier != AccessModifier::Public {
            return Err(self.member_not_found(name, span));
        }
        let new_value = self.evaluate(value_expr)?;
        let result = Processor::assign(&current, &new_value, span)?;
        match &owner {
            MemberOwner::Instance(instance) => {
                instance.set(name, result.clone());
            }
            MemberOwner::Class(class) => {
                if let Some(slot) = class.static_members.borrow_mut().get_mut(&name) {
                    slot.1 = result.clone();
                }
            }
        }
        Ok(result)
    }

    fn eval_bra_ket(&mut self, which: BraKetRef, want: Direction, span: Span) -> Result<Object<'a>> {
        match which {
            BraKetRef::Basis(n) => Ok(Object::Vector(Vector::basis(n, want))),
            BraKetRef::Named(name) => match self.environment.get_value(name) {
                Some(Object::Vector(v)) => Ok(Object::Vector(v.coerced_to(want))),
                _ => Err(err(format!("unexpected Vector identifier '{}'", self.resolve(name)), span)),
            },
        }
    }

    fn named_vector(&mut self, name: Symbol, want: Direction, span: Span) -> Result<Vector> {
        match self.environment.get_value(name) {
            Some(Object::Vector(v)) => Ok(v.coerced_to(want)),
            _ => Err(err(format!("unexpected Vector identifier '{}'", self.resolve(name)), span)),
        }
    }

    pub fn evaluate(&mut self, expr: &'a Expression<'a>) -> Result<Object<'a>> {
        match expr {
            Expression::Literal { value, .. } => Ok(self.eval_literal(*value)),
            Expression::Identifier { name, span } => self
                .environment
                .get_value(*name)
                .ok_or_else(|| err(format!("unexpected identifier '{}'", self.resolve(*name)), *span)),
            Expression::SelfExpr { span } => self
                .environment
                .get_value(self.self_symbol)
                .ok_or_else(|| err("'self' is not bound in this context", *span)),
            Expression::Grouping(inner) => self.evaluate(inner),
            Expression::List { elements, .. } => {
                let mut values = Vec::with_capacity(elements.len());
                for element in *elements {
                    values.push(self.evaluate(element)?);
                }
                Ok(Object::Array(Rc::new(RefCell::new(values))))
            }
            Expression::Assignment { target, value, span } => {
                let name = match target {
                    Expression::Identifier { name, .. } => *name,
                    _ => unreachable!("the parser only ever produces an identifier assignment target"),
                };
                let current = self
                    .environment
                    .get_value(name)
                    .ok_or_else(|| err(format!("unexpected identifier '{}'", self.resolve(name)), *span))?;
                let new_value = self.evaluate(value)?;
                let result = Processor::assign(&current, &new_value, *span)?;
                self.environment.assign(name, result.clone());
                Ok(result)
            }
            Expression::Mutable { name, op, value, span } => {
                let current = self
                    .environment
                    .get_value(*name)
                    .ok_or_else(|| err(format!("unexpected identifier '{}'", self.resolve(*name)), *span))?;
                let operand = self.evaluate(value)?;
                let result = Processor::apply_compound(*op, &current, &operand, *span)?;
                self.environment.assign(*name, result.clone());
                Ok(result)
            }
            Expression::Binary { left, op, right, span } => {
                let l = self.evaluate(left)?;
                let r = self.evaluate(right)?;
                apply_binary(*op, &l, &r, *span)
            }
            Expression::Comparison { left, op, right, span } => {
                let l = self.evaluate(left)?;
                let r = self.evaluate(right)?;
                Ok(Object::Boolean(apply_comparison(*op, &l, &r, *span)?))
            }
            Expression::Logical { left, op, right, span } => {
                let l = self.evaluate(left)?;
                let l_bool = l.as_bool().ok_or_else(|| {
                    err(format!("unsupported evaluation of non logical operand for operator '{}'", op_symbol(*op)), *span)
                })?;
                match op {
                    TokenKind::AmpAmp if !l_bool => Ok(Object::Boolean(false)),
                    TokenKind::PipePipe if l_bool => Ok(Object::Boolean(true)),
                    _ => {
                        let r = self.evaluate(right)?;
                        let r_bool = r.as_bool().ok_or_else(|| {
                            err(format!("unsupported evaluation of non logical operand for operator '{}'", op_symbol(*op)), *span)
                        })?;
                        Ok(Object::Boolean(r_bool))
                    }
                }
            }
            Expression::Unary { op, operand, postfix, span } => {
                let value = self.evaluate(operand)?;
                apply_unary(*op, *postfix, &value, *span)
            }
            Expression::Subscript { target, index, span } => {
                let target_value = self.evaluate(target)?;
                let index_value = match index {
                    Some(expr) => self.evaluate(expr)?,
                    None => return Err(err("subscript requires an index expression", *span)),
                };
                Processor::subscript_get(&target_value, &index_value, *span)
            }
            Expression::Call { callee, args, is_new, span } => {
                let callee_value = self.evaluate(callee)?;
                let mut arg_values = Vec::with_capacity(args.len());
                for arg in *args {
                    arg_values.push(self.evaluate(arg)?);
                }
                match callee_value {
                    Object::Class(class) => {
                        if !is_new {
                            return Err(err("constructor call is missing the 'new' operator", *span));
                        }
                        let instance = self.construct(&class, arg_values, *span)?;
                        self.environment.orphan(Object::Instance(instance.clone()));
                        Ok(Object::Instance(instance))
                    }
                    Object::Routine(routine) => {
                        if *is_new {
                            return Err(err("operator 'new' doesn't support operands of type 'Routine'", *span));
                        }
                        let result = self.call_routine(&routine, arg_values, *span)?;
                        Ok(result.unwrap_or(Object::Unknown))
                    }
                    other => Err(err(format!("failed call of invalid function (found '{}')", other.type_name()), *span)),
                }
            }
            Expression::DynamicGet { object, name, self_reference, span } => {
                self.eval_member_get(object, *name, *self_reference, *span)
            }
            Expression::StaticGet { object, name, self_reference, span } => {
                self.eval_member_get(object, *name, *self_reference, *span)
            }
            Expression::DynamicSet { object, name, value, self_reference, span } => {
                self.eval_member_set(object, *name, value, *self_reference, *span)
            }
            Expression::StaticSet { object, name, value, self_reference, span } => {
                self.eval_member_set(object, *name, value, *self_reference, *span)
            }
            Expression::Bra { which, span } => self.eval_bra_ket(*which, Direction::Bra, *span),
            Expression::Ket { which, span } => self.eval_bra_ket(*which, Direction::Ket, *span),
            Expression::Inner { bra, ket, span } => {
                let bra_vec = self.named_vector(*bra, Direction::Bra, *span)?;
                let ket_vec = self.named_vector(*ket, Direction::Ket, *span)?;
                let value = Processor::inner_product(&bra_vec, &ket_vec, *span)?;
                Ok(Object::Complex(value))
            }
            Expression::Outer { ket, bra, span } => {
                let ket_vec = self.named_vector(*ket, Direction::Ket, *span)?;
                let bra_vec = self.named_vector(*bra, Direction::Bra, *span)?;
                Processor::outer_product(&ket_vec, &bra_vec, *span).map(|_: Object<'static>| Object::Unknown)
            }
        }
    }

    fn eval_literal(&mut self, value: LiteralValue) -> Object<'a> {
        match value {
            LiteralValue::Boolean(b) => Object::Boolean(b),
            LiteralValue::Integer(i) => Object::Integer(i),
            LiteralValue::Real(r) => Object::Real(r),
            LiteralValue::Imaginary(i) => Object::Imaginary(i),
            LiteralValue::Character(b) => Object::Character(b as char),
            LiteralValue::String(sym) => Object::String(decode_string_literal(self.resolve(sym))),
        }
    }
}

fn class_arity(class: &Class) -> usize {
    match &class.at_create {
        Some(Routine::Procedure(def, _)) => def.params.len(),
        _ => 0,
    }
}

fn default_for_basic<'a>(basic: BasicType) -> Object<'a> {
    match basic {
        BasicType::Boolean => Object::Boolean(false),
        BasicType::Character => Object::Character('\0'),
        BasicType::Byte => Object::Byte(0),
        BasicType::Integer => Object::Integer(0),
        BasicType::Real => Object::Real(0.0),
        BasicType::Imaginary => Object::Imaginary(0.0),
        BasicType::Complex => Object::Complex(Complex::new(0.0, 0.0)),
        BasicType::String => Object::String(String::new()),
    }
}

fn apply_binary<'a>(op: TokenKind, l: &Object<'a>, r: &Object<'a>, span: Span) -> Result<Object<'a>> {
    match op {
        TokenKind::Plus => Processor::add(l, r, span),
        TokenKind::Minus => Processor::sub(l, r, span),
        TokenKind::Star => Processor::mul(l, r, span),
        TokenKind::Slash => Processor::div(l, r, span),
        TokenKind::Percent => Processor::modulus(l, r, span),
        TokenKind::Pipe => Processor::bitor(l, r, span),
        TokenKind::Amp => Processor::bitand(l, r, span),
        TokenKind::Caret => Processor::bitxor(l, r, span),
        _ => Err(err("unsupported binary operator", span)),
    }
}

fn apply_comparison<'a>(op: TokenKind, l: &Object<'a>, r: &Object<'a>, span: Span) -> Result<bool> {
    match op {
        TokenKind::EqualEqual => Processor::equal(l, r, span),
        TokenKind::BangEqual => Processor::not_equal(l, r, span),
        TokenKind::Less => Processor::less(l, r, span),
        TokenKind::LessEqual => Processor::less_equal(l, r, span),
        TokenKind::Greater => Processor::greater(l, r, span),
        TokenKind::GreaterEqual => Processor::greater_equal(l, r, span),
        _ => Err(err("unsupported comparison operator", span)),
    }
}

fn apply_unary<'a>(op: TokenKind, postfix: bool, o: &Object<'a>, span: Span) -> Result<Object<'a>> {
    match (op, postfix) {
        (TokenKind::Minus, false) => Processor::negate(o, span),
        (TokenKind::Plus, false) => Processor::unary_plus(o, span),
        (TokenKind::Bang, false) => Processor::logical_not(o, span),
        (TokenKind::Tilde, false) => Processor::bitwise_not(o, span),
        (TokenKind::Degree, true) => Processor::conjugate(o, span),
        (TokenKind::Apostrophe, true) => Processor::dagger(o, span),
        _ => Err(err("unsupported unary operator", span)),
    }
}

fn op_symbol(op: TokenKind) -> &'static str {
    match op {
        TokenKind::AmpAmp => "&&",
        TokenKind::PipePipe => "||",
        _ => "?",
    }
}

/// Strips the surrounding quotes and decodes the escape set the lexer
/// leaves untouched in a string literal's raw lexeme (spec §4.1): `\\ \0
/// \a \b \f \n \r \t \v \' \"` and `\0xHH`.
fn decode_string_literal(text: &str) -> String {
    let inner = text.strip_prefix('"').and_then(|s| s.strip_suffix('"')).unwrap_or(text);
    let mut out = String::new();
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('a') => out.push('\u{7}'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('v') => out.push('\u{b}'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some('0') => {
                if chars.peek() == Some(&'x') {
                    chars.next();
                    let hex: String = std::iter::from_fn(|| chars.next_if(|c| c.is_ascii_hexdigit())).collect();
                    if let Ok(byte) = u8::from_str_radix(&hex, 16) {
                        out.push(byte as char);
                    }
                } else {
                    out.push('\0');
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use spin_base::Arena;
    use spin_syntax::ast::AstContext;
    use spin_syntax::Lexer;
    use spin_syntax::Parser;

    fn run_source(source: &str) -> (Interpreter<'static>, Result<()>) {
        let exprs: &'static Arena<Expression<'static>> = Box::leak(Box::new(Arena::new()));
        let stmts: &'static Arena<Statement<'static>> = Box::leak(Box::new(Arena::new()));
        let params: &'static Arena<spin_syntax::ast::Param> = Box::leak(Box::new(Arena::new()));
        let members: &'static Arena<spin_syntax::ast::ClassMember<'static>> = Box::leak(Box::new(Arena::new()));
        let mut interner = Interner::new();
        let tokens = Lexer::new(source, &mut interner).tokenize();
        let tokens: &'static [spin_syntax::Token] = Box::leak(tokens.into_boxed_slice());
        let ast = AstContext::new(exprs, stmts, params, members);
        let mut parser = Parser::new(ast, &mut interner);
        let tree = parser.parse(tokens).expect("expected a successful parse");
        let mut interpreter = Interpreter::new(interner);
        let result = interpreter.run(std::slice::from_ref(&tree));
        std::mem::forget(tree);
        (interpreter, result)
    }

    #[test]
    fn arithmetic_precedence_matches_expected_value() {
        let (mut interp, result) = run_source("Integer x = 2 + 3 * 4;");
        result.expect("program should evaluate without error");
        let x = interp.interner.intern("x");
        assert!(matches!(interp.globals.get_value(x), Some(Object::Integer(14))));
    }

    #[test]
    fn string_concatenation_stringifies_the_non_string_operand() {
        let (mut interp, result) = run_source("String s = \"n=\" + 42;");
        result.expect("program should evaluate without error");
        let s = interp.interner.intern("s");
        assert!(matches!(interp.globals.get_value(s), Some(Object::String(ref v)) if v == "n=42"));
    }

    #[test]
    fn recursive_function_computes_fibonacci() {
        let source = "func f(n: Integer) -> Integer { if (n < 2) return n; return f(n-1) + f(n-2); } Integer r = f(10);";
        let (mut interp, result) = run_source(source);
        result.expect("program should evaluate without error");
        let r = interp.interner.intern("r");
        assert!(matches!(interp.globals.get_value(r), Some(Object::Integer(55))));
    }

    #[test]
    fn class_constructor_sets_field_through_self() {
        let source = "class C { @public Integer k; @create proc C(v: Integer) { self.k = v; } } C a = new C(7);";
        let (mut interp, result) = run_source(source);
        result.expect("program should evaluate without error");
        let a = interp.interner.intern("a");
        let k = interp.interner.intern("k");
        match interp.globals.get_value(a) {
            Some(Object::Instance(instance)) => {
                assert!(matches!(instance.get(k), Some((_, Object::Integer(7)))));
            }
            _ => panic!("expected an instance"),
        }
    }

    #[test]
    fn delete_only_removes_from_the_current_frame() {
        let source = "Integer x = 1; { delete x; }";
        let (_interp, result) = run_source(source);
        assert!(result.is_err());
    }

    #[test]
    fn bra_ket_inner_product_of_orthogonal_basis_vectors_is_zero() {
        let source = "Vector <v| = <0|; Vector |w> = |1>; Complex z = <v|w>;";
        let (mut interp, result) = run_source(source);
        result.expect("program should evaluate without error");
        let z = interp.interner.intern("z");
        match interp.globals.get_value(z) {
            Some(Object::Complex(c)) => {
                assert!((c.re).abs() < 1e-9 && (c.im).abs() < 1e-9);
            }
            other => panic!("expected a Complex zero, found {:?}", other),
        }
    }
}
