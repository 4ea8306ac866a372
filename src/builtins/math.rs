// ABOUTME: Numeric built-ins: Abs, Int, Fix, Sgn, Sqr, trig, exponentials, Rnd/Randomize

use crate::coerce::to_f64;
use crate::error::EngineError;
use crate::procs::ProcRegistry;
use crate::value::Value;
use std::rc::Rc;

fn f(v: &Value) -> Result<f64, EngineError> {
    to_f64(v)
}

pub fn register(reg: &mut ProcRegistry) {
    reg.declare_native("abs", 1, 1, Rc::new(|_i, a| Ok(Value::Double(f(&a[0])?.abs()))));

    reg.declare_native("int", 1, 1, Rc::new(|_i, a| Ok(Value::Long(f(&a[0])?.floor() as i32))));
    reg.declare_native("fix", 1, 1, Rc::new(|_i, a| Ok(Value::Long(f(&a[0])?.trunc() as i32))));

    reg.declare_native("sgn", 1, 1, Rc::new(|_i, a| {
        let v = f(&a[0])?;
        Ok(Value::Long(if v > 0.0 { 1 } else if v < 0.0 { -1 } else { 0 }))
    }));

    reg.declare_native("sqr", 1, 1, Rc::new(|_i, a| {
        let v = f(&a[0])?;
        if v < 0.0 {
            return Err(EngineError::invalid_procedure_call("Sqr of a negative number"));
        }
        Ok(Value::Double(v.sqrt()))
    }));

    reg.declare_native("exp", 1, 1, Rc::new(|_i, a| Ok(Value::Double(f(&a[0])?.exp()))));
    reg.declare_native("log", 1, 1, Rc::new(|_i, a| {
        let v = f(&a[0])?;
        if v <= 0.0 {
            return Err(EngineError::invalid_procedure_call("Log of a non-positive number"));
        }
        Ok(Value::Double(v.ln()))
    }));

    reg.declare_native("sin", 1, 1, Rc::new(|_i, a| Ok(Value::Double(f(&a[0])?.sin()))));
    reg.declare_native("cos", 1, 1, Rc::new(|_i, a| Ok(Value::Double(f(&a[0])?.cos()))));
    reg.declare_native("tan", 1, 1, Rc::new(|_i, a| Ok(Value::Double(f(&a[0])?.tan()))));
    reg.declare_native("atn", 1, 1, Rc::new(|_i, a| Ok(Value::Double(f(&a[0])?.atan()))));

    reg.declare_native("round", 1, 2, Rc::new(|_i, a| {
        let v = f(&a[0])?;
        let digits = a.get(1).map(|d| f(d)).transpose()?.unwrap_or(0.0) as i32;
        let factor = 10f64.powi(digits);
        Ok(Value::Double((v * factor).round() / factor))
    }));

    reg.declare_native("rnd", 0, 1, Rc::new(|interp, _a| Ok(Value::Double(interp.next_random()))));

    reg.declare_native("randomize", 0, 1, Rc::new(|interp, a| {
        let seed = match a.first() {
            Some(v) => f(v)?.to_bits(),
            None => std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(1),
        };
        interp.seed_random(seed);
        Ok(Value::Empty)
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
    fn int_floors_toward_negative_infinity() {
        let mut reg = ProcRegistry::new();
        register(&mut reg);
        let mut interp = Interpreter::new();
        assert_eq!(call(&reg, &mut interp, "int", &[Value::Double(-2.5)]), Value::Long(-3));
    }

    #[test]
    fn fix_truncates_toward_zero() {
        let mut reg = ProcRegistry::new();
        register(&mut reg);
        let mut interp = Interpreter::new();
        assert_eq!(call(&reg, &mut interp, "fix", &[Value::Double(-2.5)]), Value::Long(-2));
    }

    #[test]
    fn sqr_of_negative_is_an_error() {
        let mut reg = ProcRegistry::new();
        register(&mut reg);
        let mut interp = Interpreter::new();
        assert!(reg.get("sqr").unwrap().call_native(&mut interp, &[Value::Long(-1)]).is_err());
    }

    #[test]
    fn rnd_stays_within_unit_interval() {
        let mut interp = Interpreter::new();
        for _ in 0..50 {
            let v = interp.next_random();
            assert!((0.0..1.0).contains(&v));
        }
    }
}
