// ABOUTME: Lexically scoped variable frames with case-insensitive names and parent chaining

use crate::error::EngineError;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Clone)]
struct Slot {
    value: Value,
    is_const: bool,
}

/// One lexical scope: a procedure's locals, a class instance's field scope, or the
/// global scope. Names are folded to lower-case for storage and lookup, matching the
/// dialect's case-insensitive identifiers.
#[derive(Debug)]
pub struct Scope {
    slots: RefCell<HashMap<String, Slot>>,
    parent: Option<Rc<Scope>>,
}

impl Scope {
    pub fn root() -> Rc<Scope> {
        Rc::new(Scope { slots: RefCell::new(HashMap::new()), parent: None })
    }

    pub fn child(parent: &Rc<Scope>) -> Rc<Scope> {
        Rc::new(Scope { slots: RefCell::new(HashMap::new()), parent: Some(Rc::clone(parent)) })
    }

    fn key(name: &str) -> String {
        name.to_ascii_lowercase()
    }

    /// Declares a new variable in this scope, overwriting any prior binding of the
    /// same name in this scope only (shadowing an outer binding is allowed).
    pub fn declare(&self, name: &str, value: Value) {
        self.slots.borrow_mut().insert(Self::key(name), Slot { value, is_const: false });
    }

    pub fn declare_const(&self, name: &str, value: Value) {
        self.slots.borrow_mut().insert(Self::key(name), Slot { value, is_const: true });
    }

    /// True if `name` is bound in this scope or any ancestor.
    pub fn is_defined(&self, name: &str) -> bool {
        let key = Self::key(name);
        if self.slots.borrow().contains_key(&key) {
            return true;
        }
        match &self.parent {
            Some(p) => p.is_defined(name),
            None => false,
        }
    }

    /// True only if `name` is bound directly in this scope, not an ancestor.
    pub fn is_defined_locally(&self, name: &str) -> bool {
        self.slots.borrow().contains_key(&Self::key(name))
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        let key = Self::key(name);
        if let Some(slot) = self.slots.borrow().get(&key) {
            return Some(slot.value.clone());
        }
        self.parent.as_ref().and_then(|p| p.get(name))
    }

    /// Assigns to the nearest scope (walking up the parent chain) that already
    /// declares `name`; if none does, declares it in the current (innermost) scope,
    /// matching the dialect's implicit-variable-creation behaviour.
    pub fn assign(&self, name: &str, value: Value) -> Result<(), EngineError> {
        let key = Self::key(name);
        if let Some(slot) = self.slots.borrow_mut().get_mut(&key) {
            if slot.is_const {
                return Err(EngineError::invalid_procedure_call(format!(
                    "'{name}' is a constant and cannot be assigned to"
                )));
            }
            slot.value = value;
            return Ok(());
        }
        if let Some(parent) = &self.parent {
            if parent.is_defined(name) {
                return parent.assign(name, value);
            }
        }
        self.declare(name, value);
        Ok(())
    }

    pub fn is_const(&self, name: &str) -> bool {
        let key = Self::key(name);
        if let Some(slot) = self.slots.borrow().get(&key) {
            return slot.is_const;
        }
        self.parent.as_ref().map(|p| p.is_const(name)).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_case_insensitive() {
        let scope = Scope::root();
        scope.declare("Foo", Value::Long(1));
        assert_eq!(scope.get("FOO"), Some(Value::Long(1)));
    }

    #[test]
    fn child_scope_sees_parent_bindings() {
        let parent = Scope::root();
        parent.declare("x", Value::Long(5));
        let child = Scope::child(&parent);
        assert_eq!(child.get("x"), Some(Value::Long(5)));
    }

    #[test]
    fn assign_in_child_updates_the_defining_ancestor() {
        let parent = Scope::root();
        parent.declare("x", Value::Long(1));
        let child = Scope::child(&parent);
        child.assign("x", Value::Long(2)).unwrap();
        assert_eq!(parent.get("x"), Some(Value::Long(2)));
        assert!(!child.is_defined_locally("x"));
    }

    #[test]
    fn assign_with_no_existing_binding_declares_locally() {
        let parent = Scope::root();
        let child = Scope::child(&parent);
        child.assign("y", Value::Long(9)).unwrap();
        assert!(child.is_defined_locally("y"));
        assert!(!parent.is_defined_locally("y"));
    }

    #[test]
    fn const_cannot_be_reassigned() {
        let scope = Scope::root();
        scope.declare_const("PI", Value::Double(3.14));
        assert!(scope.assign("PI", Value::Long(0)).is_err());
    }

    #[test]
    fn shadowing_declares_a_new_local_slot() {
        let parent = Scope::root();
        parent.declare("x", Value::Long(1));
        let child = Scope::child(&parent);
        child.declare("x", Value::Long(2));
        assert_eq!(child.get("x"), Some(Value::Long(2)));
        assert_eq!(parent.get("x"), Some(Value::Long(1)));
    }
}
