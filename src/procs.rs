// ABOUTME: Procedure registry holding user-defined Subs/Functions/Properties and host callables

use crate::ast::{Param, ParamMode, ProcDecl, ProcKind};
use crate::error::EngineError;
use crate::interpreter::Interpreter;
use crate::value::Value;
use std::collections::HashMap;
use std::rc::Rc;

/// A native function registered by the embedding host via `register_function`, or a
/// built-in implemented in [`crate::builtins`]. Takes already-evaluated arguments; the
/// evaluator is responsible for by-ref write-back for user procedures, not natives.
pub type NativeFn = Rc<dyn Fn(&mut Interpreter, &[Value]) -> Result<Value, EngineError>>;

#[derive(Clone)]
pub enum Procedure {
    User(Rc<ProcDecl>),
    Native { name: String, min_args: usize, max_args: usize, func: NativeFn },
}

impl Procedure {
    pub fn name(&self) -> &str {
        match self {
            Procedure::User(decl) => &decl.name,
            Procedure::Native { name, .. } => name,
        }
    }

    pub fn kind(&self) -> ProcKind {
        match self {
            Procedure::User(decl) => decl.kind,
            Procedure::Native { .. } => ProcKind::Function,
        }
    }

    /// Invokes a `Native` procedure. Panics if called on a `User` procedure; the
    /// evaluator dispatches those itself since it needs a fresh scope and by-ref
    /// write-back, neither of which a native closure has access to.
    pub fn call_native(&self, interp: &mut Interpreter, args: &[Value]) -> Result<Value, EngineError> {
        match self {
            Procedure::Native { func, .. } => (*func)(interp, args),
            Procedure::User(_) => unreachable!("call_native invoked on a user-defined procedure"),
        }
    }

    /// Checks the argument count against the procedure's declared parameter list
    /// (accounting for defaulted trailing parameters and `ParamArray`).
    pub fn check_arity(&self, given: usize) -> Result<(), EngineError> {
        match self {
            Procedure::User(decl) => {
                let (min, max) = param_arity(&decl.params);
                if given < min || (max.is_some() && given > max.unwrap()) {
                    return Err(EngineError::invalid_procedure_call(format!(
                        "'{}' expects {}{} argument(s), got {given}",
                        decl.name,
                        min,
                        max.map(|m| if m == min { String::new() } else { format!("..{m}") }).unwrap_or_else(|| "+".to_string())
                    )));
                }
                Ok(())
            }
            Procedure::Native { name, min_args, max_args, .. } => {
                if given < *min_args || given > *max_args {
                    return Err(EngineError::invalid_procedure_call(format!(
                        "'{name}' expects {min_args}..{max_args} argument(s), got {given}"
                    )));
                }
                Ok(())
            }
        }
    }
}

/// The minimum and maximum argument counts a parameter list accepts, `None` max
/// meaning unbounded (a trailing `ParamArray`).
pub fn param_arity(params: &[Param]) -> (usize, Option<usize>) {
    if params.last().map(|p| p.is_param_array).unwrap_or(false) {
        let required = params[..params.len() - 1].iter().filter(|p| p.default.is_none()).count();
        return (required, None);
    }
    let required = params.iter().filter(|p| p.default.is_none()).count();
    (required, Some(params.len()))
}

pub fn is_by_ref(param: &Param) -> bool {
    matches!(param.mode, ParamMode::ByRef)
}

/// Global registry of top-level (non-class-member) procedures, keyed case-insensitively.
#[derive(Default)]
pub struct ProcRegistry {
    entries: HashMap<String, Procedure>,
}

impl ProcRegistry {
    pub fn new() -> Self {
        ProcRegistry { entries: HashMap::new() }
    }

    pub fn declare_user(&mut self, decl: ProcDecl) {
        self.entries.insert(decl.name.to_ascii_lowercase(), Procedure::User(Rc::new(decl)));
    }

    pub fn declare_native(
        &mut self,
        name: impl Into<String>,
        min_args: usize,
        max_args: usize,
        func: NativeFn,
    ) {
        let name = name.into();
        self.entries.insert(
            name.to_ascii_lowercase(),
            Procedure::Native { name, min_args, max_args, func },
        );
    }

    pub fn get(&self, name: &str) -> Option<Procedure> {
        self.entries.get(&name.to_ascii_lowercase()).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_ascii_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Visibility;
    use crate::error::Position;

    fn decl(name: &str, params: Vec<Param>) -> ProcDecl {
        ProcDecl {
            name: name.to_string(),
            kind: ProcKind::Sub,
            visibility: Visibility::Public,
            params,
            body: vec![],
            pos: Position::start(),
        }
    }

    fn param(name: &str, default: Option<bool>) -> Param {
        Param {
            name: name.to_string(),
            mode: ParamMode::ByRef,
            is_param_array: false,
            default: default.map(|_| crate::ast::Expr::BoolLit(true)),
        }
    }

    #[test]
    fn arity_requires_non_defaulted_params() {
        let params = vec![param("a", None), param("b", Some(true))];
        assert_eq!(param_arity(&params), (1, Some(2)));
    }

    #[test]
    fn param_array_makes_max_unbounded() {
        let mut params = vec![param("a", None)];
        let mut rest = param("items", None);
        rest.is_param_array = true;
        params.push(rest);
        assert_eq!(param_arity(&params), (1, None));
    }

    #[test]
    fn registry_lookup_is_case_insensitive() {
        let mut reg = ProcRegistry::new();
        reg.declare_user(decl("DoThing", vec![]));
        assert!(reg.contains("dothing"));
        assert!(reg.get("DOTHING").is_some());
    }

    #[test]
    fn check_arity_rejects_too_few_or_too_many_args() {
        let mut reg = ProcRegistry::new();
        reg.declare_user(decl("Foo", vec![param("a", None)]));
        let p = reg.get("foo").unwrap();
        assert!(p.check_arity(0).is_err());
        assert!(p.check_arity(1).is_ok());
        assert!(p.check_arity(2).is_err());
    }
}
