// ABOUTME: Type-inspection built-ins: IsNumeric, IsArray, IsObject, VarType, TypeName, etc.

use crate::coerce::{is_numeric_string, to_f64};
use crate::procs::ProcRegistry;
use crate::value::Value;
use std::rc::Rc;

pub fn register(reg: &mut ProcRegistry) {
    reg.declare_native("isnumeric", 1, 1, Rc::new(|_i, a| {
        let numeric = match &a[0] {
            Value::String(s) => is_numeric_string(s),
            v => v.is_numeric(),
        };
        Ok(Value::Boolean(numeric))
    }));

    reg.declare_native("isarray", 1, 1, Rc::new(|_i, a| Ok(Value::Boolean(a[0].is_array()))));
    reg.declare_native("isobject", 1, 1, Rc::new(|_i, a| Ok(Value::Boolean(a[0].is_object()))));
    reg.declare_native("isnull", 1, 1, Rc::new(|_i, a| Ok(Value::Boolean(a[0].is_null()))));
    reg.declare_native("isempty", 1, 1, Rc::new(|_i, a| Ok(Value::Boolean(a[0].is_empty()))));

    // IsDate lives in builtins::date alongside the rest of the date/time family.

    reg.declare_native("vartype", 1, 1, Rc::new(|_i, a| Ok(Value::Long(a[0].var_type()))));
    reg.declare_native("typename", 1, 1, Rc::new(|_i, a| Ok(Value::String(a[0].type_name()))));

    reg.declare_native("isobjectempty", 1, 1, Rc::new(|_i, a| {
        Ok(Value::Boolean(matches!(&a[0], Value::Object(None))))
    }));

    // Not part of the dialect proper but handy for host-side sanity checks: reports
    // whether a value would coerce to a finite number without raising.
    reg.declare_native("isfinitenumber", 1, 1, Rc::new(|_i, a| Ok(Value::Boolean(to_f64(&a[0]).map(|n| n.is_finite()).unwrap_or(false)))));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::Interpreter;

    fn call(reg: &ProcRegistry, interp: &mut Interpreter, name: &str, args: &[Value]) -> Value {
        reg.get(name).unwrap().call_native(interp, args).unwrap()
    }

    #[test]
    fn isnumeric_checks_strings_by_parsing() {
        let mut reg = ProcRegistry::new();
        register(&mut reg);
        let mut interp = Interpreter::new();
        assert_eq!(call(&reg, &mut interp, "isnumeric", &[Value::String("42".into())]), Value::Boolean(true));
        assert_eq!(call(&reg, &mut interp, "isnumeric", &[Value::String("abc".into())]), Value::Boolean(false));
    }

    #[test]
    fn vartype_and_typename_agree_with_value_methods() {
        let mut reg = ProcRegistry::new();
        register(&mut reg);
        let mut interp = Interpreter::new();
        assert_eq!(call(&reg, &mut interp, "vartype", &[Value::Long(1)]), Value::Long(crate::value::vartype::LONG));
        assert_eq!(call(&reg, &mut interp, "typename", &[Value::Long(1)]), Value::String("Long".into()));
    }

    #[test]
    fn isobject_is_false_for_plain_values() {
        let mut reg = ProcRegistry::new();
        register(&mut reg);
        let mut interp = Interpreter::new();
        assert_eq!(call(&reg, &mut interp, "isobject", &[Value::Long(1)]), Value::Boolean(false));
        assert_eq!(call(&reg, &mut interp, "isobject", &[Value::nothing()]), Value::Boolean(true));
    }
}
