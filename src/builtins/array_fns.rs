// ABOUTME: Array built-ins: the Array() literal constructor, UBound, LBound

use crate::array::DynamicArray;
use crate::coerce::to_long;
use crate::error::EngineError;
use crate::procs::ProcRegistry;
use crate::value::Value;
use std::cell::RefCell;
use std::rc::Rc;

fn as_array(v: &Value) -> Result<Rc<RefCell<DynamicArray>>, EngineError> {
    match v {
        Value::Array(arr) => Ok(arr.clone()),
        other => Err(EngineError::type_mismatch(format!("{} is not an array", other.type_name()))),
    }
}

pub fn register(reg: &mut ProcRegistry) {
    reg.declare_native("array", 0, usize::MAX, Rc::new(|_i, a| {
        Ok(Value::Array(Rc::new(RefCell::new(DynamicArray::from_values(a.to_vec())))))
    }));

    reg.declare_native("ubound", 1, 2, Rc::new(|_i, a| {
        let arr = as_array(&a[0])?;
        let dimension = a.get(1).map(|v| to_long(v)).transpose()?.unwrap_or(1);
        Ok(Value::Long(arr.borrow().upper_bound((dimension - 1).max(0) as usize)?))
    }));

    reg.declare_native("lbound", 1, 2, Rc::new(|_i, a| {
        let arr = as_array(&a[0])?;
        let dimension = a.get(1).map(|v| to_long(v)).transpose()?.unwrap_or(1);
        Ok(Value::Long(arr.borrow().lower_bound((dimension - 1).max(0) as usize)?))
    }));

    reg.declare_native("filter", 2, 4, Rc::new(|_i, a| {
        let arr = as_array(&a[0])?;
        let needle = crate::coerce::to_display_string(&a[1])?;
        let include = a.get(2).map(crate::coerce::to_bool).transpose()?.unwrap_or(true);
        let case_insensitive = a.get(3).map(|v| to_long(v)).transpose()?.unwrap_or(1) != 0;
        let arr = arr.borrow();
        let mut kept = Vec::new();
        for v in arr.iter() {
            let text = crate::coerce::to_display_string(v)?;
            let hit = if case_insensitive {
                text.to_lowercase().contains(&needle.to_lowercase())
            } else {
                text.contains(&needle)
            };
            if hit == include {
                kept.push(Value::String(text));
            }
        }
        Ok(Value::Array(Rc::new(RefCell::new(DynamicArray::from_values(kept)))))
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::Interpreter;

    fn call(reg: &ProcRegistry, interp: &mut Interpreter, name: &str, args: &[Value]) -> Value {
        reg.get(name).unwrap().call_native(interp, args).unwrap()
    }

    #[test]
    fn array_literal_builds_a_zero_based_array() {
        let mut reg = ProcRegistry::new();
        register(&mut reg);
        let mut interp = Interpreter::new();
        let result = call(&reg, &mut interp, "array", &[Value::Long(1), Value::Long(2), Value::Long(3)]);
        match result {
            Value::Array(arr) => assert_eq!(arr.borrow().len(), 3),
            _ => panic!("expected array"),
        }
    }

    #[test]
    fn ubound_and_lbound_report_the_default_first_dimension() {
        let mut reg = ProcRegistry::new();
        register(&mut reg);
        let mut interp = Interpreter::new();
        let arr = call(&reg, &mut interp, "array", &[Value::Long(10), Value::Long(20)]);
        assert_eq!(call(&reg, &mut interp, "ubound", &[arr.clone()]), Value::Long(1));
        assert_eq!(call(&reg, &mut interp, "lbound", &[arr]), Value::Long(0));
    }

    #[test]
    fn filter_keeps_only_matching_elements_by_default() {
        let mut reg = ProcRegistry::new();
        register(&mut reg);
        let mut interp = Interpreter::new();
        let arr = call(
            &reg,
            &mut interp,
            "array",
            &[Value::String("apple".into()), Value::String("banana".into()), Value::String("grape".into())],
        );
        let result = call(&reg, &mut interp, "filter", &[arr, Value::String("ap".into())]);
        match result {
            Value::Array(arr) => {
                let arr = arr.borrow();
                assert_eq!(arr.len(), 2);
                assert_eq!(arr.get(&[0]).unwrap(), Value::String("apple".into()));
                assert_eq!(arr.get(&[1]).unwrap(), Value::String("grape".into()));
            }
            _ => panic!("expected array"),
        }
    }
}
