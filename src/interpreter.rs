// ABOUTME: The embeddable interpreter: global state plus the host-facing API surface

use crate::ast::{Block, ClassDecl, ProcDecl, Stmt};
use crate::bridge::{HostFn, HostObject};
use crate::classes::ClassDescriptor;
use crate::config::Options;
use crate::dialogs::{Dialogs, NullDialogs};
use crate::env::Scope;
use crate::error::EngineError;
use crate::eval;
use crate::parser;
use crate::procs::ProcRegistry;
use crate::value::{ObjectRef, Value};
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Instant;

/// The language-level `Err` object: number, description, source, updated by every
/// raised error and readable/clearable through the embedding API and `Err.Raise`/`Err.Clear`.
#[derive(Debug, Clone, Default)]
pub struct ErrState {
    pub number: i32,
    pub description: String,
    pub source: String,
}

/// The active `On Error` mode for one procedure call frame. Error handling does not
/// cross procedure boundaries: each call starts a fresh frame at `None`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ErrorHandler {
    #[default]
    None,
    ResumeNext,
    Goto(String),
}

/// A running (or not-yet-run) script instance. Owns all global mutable state: the
/// global scope, the procedure and class registries, the `With` stack, the `Err`
/// record, and the cooperative execution deadline.
pub struct Interpreter {
    pub(crate) global: Rc<Scope>,
    pub(crate) procs: ProcRegistry,
    pub(crate) classes: HashMap<String, Rc<ClassDescriptor>>,
    pub(crate) with_stack: Vec<Value>,
    /// One entry per active procedure call frame (plus the top-level frame).
    pub(crate) on_error_stack: Vec<ErrorHandler>,
    pub(crate) err: ErrState,
    pub(crate) options: Options,
    pub(crate) dialogs: Box<dyn Dialogs>,
    pub(crate) deadline: Option<Instant>,
    pub(crate) rng_state: Cell<u64>,
    pending: Block,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_options(Options::default())
    }

    pub fn with_options(options: Options) -> Self {
        let mut interp = Interpreter {
            global: Scope::root(),
            procs: ProcRegistry::new(),
            classes: HashMap::new(),
            with_stack: Vec::new(),
            on_error_stack: vec![ErrorHandler::None],
            err: ErrState::default(),
            options,
            dialogs: Box::new(NullDialogs),
            deadline: None,
            rng_state: Cell::new(0x2545_F491_4F6C_DD1D),
            pending: Vec::new(),
        };
        crate::builtins::register_all(&mut interp.procs);
        interp
    }

    pub fn set_dialogs(&mut self, handler: Box<dyn Dialogs>) {
        self.dialogs = handler;
    }

    /// Parses `source` and absorbs it: top-level `Sub`/`Function`/`Property` and `Class`
    /// declarations are registered immediately (hoisted), everything else is queued for
    /// the next call to [`Interpreter::run`].
    pub fn add_code(&mut self, source: &str) -> Result<(), EngineError> {
        let block = parser::parse_program(source)?;
        let executable = self.absorb_declarations(block)?;
        self.pending.extend(executable);
        Ok(())
    }

    /// Runs every statement queued by [`Interpreter::add_code`] so far, then clears the
    /// queue. A script built from multiple `add_code` calls runs them in the order added.
    pub fn run(&mut self) -> Result<(), EngineError> {
        self.start_deadline();
        let block = std::mem::take(&mut self.pending);
        let global = Rc::clone(&self.global);
        let result = eval::exec_block(self, &global, &block).and_then(eval::finish_flow);
        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                self.record_error(&e);
                Err(e)
            }
        }
    }

    /// Parses and immediately executes a single statement against the current global
    /// state, without queuing. A `Sub`/`Function`/`Class` declaration is registered the
    /// same way it would be via `add_code`.
    pub fn execute_statement(&mut self, source: &str) -> Result<(), EngineError> {
        let stmt = parser::parse_statement_text(source)?;
        let block = self.absorb_declarations(vec![stmt])?;
        if block.is_empty() {
            return Ok(());
        }
        let global = Rc::clone(&self.global);
        eval::exec_block(self, &global, &block).and_then(eval::finish_flow).map_err(|e| {
            self.record_error(&e);
            e
        })
    }

    /// Parses and evaluates a single expression against the current global state.
    pub fn eval(&mut self, source: &str) -> Result<Value, EngineError> {
        let expr = parser::parse_expression_text(source)?;
        let global = Rc::clone(&self.global);
        eval::eval_expr(self, &global, &expr).map_err(|e| {
            self.record_error(&e);
            e
        })
    }

    /// Looks up a user- or host-registered procedure by name and invokes it directly,
    /// bypassing the statement queue. Arguments are passed by value; use `eval` for
    /// expressions that need `ByRef` semantics on caller-side variables.
    pub fn call(&mut self, name: &str, args: &[Value]) -> Result<Value, EngineError> {
        eval::call_named_procedure(self, name, args).map_err(|e| {
            self.record_error(&e);
            e
        })
    }

    pub fn get_variable(&self, name: &str) -> Option<Value> {
        self.global.get(name)
    }

    pub fn set_variable(&mut self, name: &str, value: Value) {
        self.global.declare(name, value);
    }

    /// Registers a host-native callable under `name`, invocable from script code like
    /// any built-in function.
    pub fn register_function(&mut self, name: &str, min_args: usize, max_args: usize, func: HostFn) {
        let func = Rc::new(move |_interp: &mut Interpreter, args: &[Value]| func(args));
        self.procs.declare_native(name, min_args, max_args, func);
    }

    /// Exposes a host object to scripts as a global variable named `name`. When
    /// `include_members` is set (or `Options::inject_globals` is), each name the object
    /// reports through `HostObject::member_names` is also registered as a bare
    /// top-level callable forwarding to `obj.invoke`, so scripts can call `Foo` instead
    /// of `name.Foo`.
    pub fn add_object(&mut self, name: &str, obj: Rc<dyn HostObject>, include_members: bool) {
        self.global.declare(name, Value::Object(Some(ObjectRef::Host(Rc::clone(&obj)))));
        if include_members || self.options.inject_globals {
            for member in obj.member_names() {
                let target = Rc::clone(&obj);
                let member_name = member.clone();
                self.procs.declare_native(
                    member,
                    0,
                    usize::MAX,
                    Rc::new(move |_interp, args| target.invoke(&member_name, args)),
                );
            }
        }
    }

    pub fn last_error(&self) -> Option<ErrState> {
        if self.err.number == 0 {
            None
        } else {
            Some(self.err.clone())
        }
    }

    pub fn clear_error(&mut self) {
        self.err = ErrState::default();
    }

    pub(crate) fn record_error(&mut self, err: &EngineError) {
        self.err = match err {
            EngineError::Raised { number, source, description } => ErrState {
                number: *number,
                description: description.clone(),
                source: source.clone(),
            },
            other => ErrState {
                number: other.code(),
                description: other.to_string(),
                source: String::new(),
            },
        };
    }

    pub(crate) fn error_handler(&self) -> ErrorHandler {
        self.on_error_stack.last().cloned().unwrap_or_default()
    }

    pub(crate) fn set_error_handler(&mut self, handler: ErrorHandler) {
        if let Some(top) = self.on_error_stack.last_mut() {
            *top = handler;
        }
    }

    pub(crate) fn push_call_frame(&mut self) {
        self.on_error_stack.push(ErrorHandler::None);
    }

    pub(crate) fn pop_call_frame(&mut self) {
        self.on_error_stack.pop();
    }

    fn start_deadline(&mut self) {
        self.deadline = self.options.max_execution_time.map(|d| Instant::now() + d);
    }

    pub(crate) fn check_deadline(&self) -> Result<(), EngineError> {
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(EngineError::Timeout);
            }
        }
        Ok(())
    }

    pub(crate) fn next_random(&self) -> f64 {
        // xorshift64*, adequate for `Rnd`'s non-cryptographic requirements.
        let mut x = self.rng_state.get();
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.rng_state.set(x);
        ((x >> 11) as f64) / ((1u64 << 53) as f64)
    }

    pub(crate) fn seed_random(&self, seed: u64) {
        self.rng_state.set(if seed == 0 { 1 } else { seed });
    }

    pub(crate) fn find_class(&self, name: &str) -> Option<Rc<ClassDescriptor>> {
        self.classes.get(&name.to_ascii_lowercase()).cloned()
    }

    /// Walks a block, pulling out `ProcDecl`/`ClassDecl` into the registries and
    /// returning the remaining statements in their original order.
    fn absorb_declarations(&mut self, block: Block) -> Result<Block, EngineError> {
        let mut executable = Vec::with_capacity(block.len());
        for stmt in block {
            match stmt {
                Stmt::ProcDecl(decl) => self.register_proc(decl),
                Stmt::ClassDecl(decl) => self.register_class(decl)?,
                other => executable.push(other),
            }
        }
        Ok(executable)
    }

    fn register_proc(&mut self, decl: ProcDecl) {
        self.procs.declare_user(decl);
    }

    fn register_class(&mut self, decl: ClassDecl) -> Result<(), EngineError> {
        let mut const_values = HashMap::new();
        for (name, expr) in &decl.consts {
            let global = Rc::clone(&self.global);
            let value = eval::eval_expr(self, &global, expr)?;
            const_values.insert(name.to_ascii_lowercase(), value);
        }
        let descriptor = ClassDescriptor::from_decl(&decl, const_values);
        self.classes.insert(decl.name.to_ascii_lowercase(), Rc::new(descriptor));
        Ok(())
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_code_then_run_executes_queued_statements() {
        let mut interp = Interpreter::new();
        interp.add_code("x = 2 + 3").unwrap();
        interp.run().unwrap();
        assert_eq!(interp.get_variable("x"), Some(Value::Long(5)));
    }

    #[test]
    fn execute_statement_runs_immediately() {
        let mut interp = Interpreter::new();
        interp.execute_statement("y = 10").unwrap();
        assert_eq!(interp.get_variable("y"), Some(Value::Long(10)));
    }

    #[test]
    fn eval_returns_an_expression_value() {
        let mut interp = Interpreter::new();
        interp.set_variable("a", Value::Long(4));
        let result = interp.eval("a * 2").unwrap();
        assert_eq!(result, Value::Long(8));
    }

    #[test]
    fn sub_and_function_declarations_are_hoisted_not_executed_inline() {
        let mut interp = Interpreter::new();
        interp.add_code("Function Double(n)\n  Double = n * 2\nEnd Function").unwrap();
        interp.run().unwrap();
        assert_eq!(interp.eval("Double(21)").unwrap(), Value::Long(42));
    }

    #[test]
    fn errors_populate_the_err_state() {
        let mut interp = Interpreter::new();
        assert!(interp.execute_statement("x = 1 / 0").is_err());
        let err = interp.last_error().unwrap();
        assert_eq!(err.number, 11);
    }

    #[derive(Debug)]
    struct Greeter;

    impl crate::bridge::HostObject for Greeter {
        fn type_name(&self) -> String {
            "Greeter".to_string()
        }

        fn invoke(&self, name: &str, _args: &[Value]) -> Result<Value, EngineError> {
            if name.eq_ignore_ascii_case("greet") {
                Ok(Value::String("hi".into()))
            } else {
                Err(EngineError::ObjectDoesntSupportPropertyOrMethod(name.to_string()))
            }
        }

        fn member_names(&self) -> Vec<String> {
            vec!["Greet".to_string()]
        }
    }

    #[test]
    fn add_object_with_include_members_flattens_methods_to_the_top_level() {
        let mut interp = Interpreter::new();
        interp.add_object("helper", Rc::new(Greeter), true);
        assert_eq!(interp.eval("Greet()").unwrap(), Value::String("hi".into()));
        assert_eq!(interp.eval("helper.Greet()").unwrap(), Value::String("hi".into()));
    }

    #[test]
    fn add_object_without_include_members_keeps_methods_scoped_to_the_object() {
        let mut interp = Interpreter::new();
        interp.add_object("helper", Rc::new(Greeter), false);
        assert!(interp.eval("Greet()").is_err());
        assert_eq!(interp.eval("helper.Greet()").unwrap(), Value::String("hi".into()));
    }
}
