// ABOUTME: Bidirectional value bridge between host Rust values and script-visible objects

use crate::error::EngineError;
use crate::value::Value;
use std::fmt;

/// Implemented by host-supplied objects exposed to scripts via `Interpreter::add_object`.
/// Property and method dispatch both funnel through `invoke`; a plain property read is
/// `invoke(name, &[])` with no arguments, matching how the evaluator can't tell a
/// no-arg method call from a property access until it asks the object.
pub trait HostObject: fmt::Debug {
    /// The name surfaced by `TypeName(obj)`.
    fn type_name(&self) -> String;

    /// Reads a property or invokes a method/function with the given already-evaluated
    /// arguments. `name` is passed verbatim (not case-folded); implementations should
    /// match case-insensitively themselves, matching the dialect's own member lookup.
    fn invoke(&self, name: &str, args: &[Value]) -> Result<Value, EngineError>;

    /// Handles a property assignment (`obj.Name = value` or `Set obj.Name = value`).
    /// The default implementation rejects all assignment; read-write host objects
    /// override this.
    fn set_property(&self, name: &str, _value: Value) -> Result<(), EngineError> {
        Err(EngineError::ObjectDoesntSupportPropertyOrMethod(name.to_string()))
    }

    /// Member names to mirror as top-level callables when `Interpreter::add_object` is
    /// asked to flatten this object into the global namespace. Empty by default: hosts
    /// that want `obj.Foo` also reachable as bare `Foo` override this to list `Foo`.
    fn member_names(&self) -> Vec<String> {
        Vec::new()
    }
}

/// A host-registered native function exposed via `Interpreter::register_function`.
/// Stored separately from [`crate::procs::Procedure::Native`] so the embedding surface
/// doesn't need to depend on the evaluator's internal procedure representation.
pub type HostFn = Box<dyn Fn(&[Value]) -> Result<Value, EngineError>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Counter {
        value: std::cell::Cell<i32>,
    }

    impl HostObject for Counter {
        fn type_name(&self) -> String {
            "Counter".to_string()
        }

        fn invoke(&self, name: &str, args: &[Value]) -> Result<Value, EngineError> {
            match name.to_ascii_lowercase().as_str() {
                "increment" => {
                    self.value.set(self.value.get() + 1);
                    Ok(Value::Long(self.value.get()))
                }
                "value" => Ok(Value::Long(self.value.get())),
                other => Err(EngineError::ObjectDoesntSupportPropertyOrMethod(other.to_string())),
            }
        }

        fn set_property(&self, name: &str, value: Value) -> Result<(), EngineError> {
            if name.eq_ignore_ascii_case("value") {
                self.value.set(crate::coerce::to_long(&value)?);
                Ok(())
            } else {
                Err(EngineError::ObjectDoesntSupportPropertyOrMethod(name.to_string()))
            }
        }
    }

    #[test]
    fn host_object_dispatches_case_insensitively() {
        let counter = Counter { value: std::cell::Cell::new(0) };
        assert_eq!(counter.invoke("Increment", &[]).unwrap(), Value::Long(1));
        assert_eq!(counter.invoke("VALUE", &[]).unwrap(), Value::Long(1));
    }

    #[test]
    fn unknown_member_reports_the_dialect_style_error() {
        let counter = Counter { value: std::cell::Cell::new(0) };
        assert!(counter.invoke("Nope", &[]).is_err());
    }

    #[test]
    fn set_property_writes_through() {
        let counter = Counter { value: std::cell::Cell::new(0) };
        counter.set_property("Value", Value::Long(9)).unwrap();
        assert_eq!(counter.invoke("value", &[]).unwrap(), Value::Long(9));
    }

    #[test]
    fn member_names_default_to_empty() {
        let counter = Counter { value: std::cell::Cell::new(0) };
        assert!(counter.member_names().is_empty());
    }
}
