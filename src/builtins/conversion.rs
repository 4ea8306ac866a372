// ABOUTME: Explicit type-conversion built-ins: the CXxx family, Hex, Oct, CVErr

use crate::coerce::{to_bool, to_byte, to_currency, to_display_string, to_f64, to_integer, to_long};
use crate::procs::ProcRegistry;
use crate::value::Value;
use std::rc::Rc;

pub fn register(reg: &mut ProcRegistry) {
    reg.declare_native("cstr", 1, 1, Rc::new(|_i, a| Ok(Value::String(to_display_string(&a[0])?))));
    reg.declare_native("cint", 1, 1, Rc::new(|_i, a| Ok(Value::Integer(to_integer(&a[0])?))));
    reg.declare_native("clng", 1, 1, Rc::new(|_i, a| Ok(Value::Long(to_long(&a[0])?))));
    reg.declare_native("cbyte", 1, 1, Rc::new(|_i, a| Ok(Value::Byte(to_byte(&a[0])?))));
    reg.declare_native("cbool", 1, 1, Rc::new(|_i, a| Ok(Value::Boolean(to_bool(&a[0])?))));
    reg.declare_native("cdbl", 1, 1, Rc::new(|_i, a| Ok(Value::Double(to_f64(&a[0])?))));
    reg.declare_native("csng", 1, 1, Rc::new(|_i, a| Ok(Value::Single(to_f64(&a[0])? as f32))));
    reg.declare_native("ccur", 1, 1, Rc::new(|_i, a| Ok(Value::Currency(to_currency(&a[0])?))));

    reg.declare_native("cdate", 1, 1, Rc::new(|_i, a| {
        crate::builtins::date::coerce_to_date(&a[0]).map(Value::Date)
    }));

    reg.declare_native("cverr", 1, 1, Rc::new(|_i, a| Ok(Value::ErrorValue(to_long(&a[0])?))));

    reg.declare_native("cvar", 1, 1, Rc::new(|_i, a| Ok(a[0].clone())));

    // `Str` differs from `CStr` only for non-negative numbers, which get a leading
    // space reserved for the sign (classic dialect convention; strings pass through).
    reg.declare_native("str", 1, 1, Rc::new(|_i, a| {
        let text = to_display_string(&a[0])?;
        if a[0].is_numeric() && !text.starts_with('-') {
            Ok(Value::String(format!(" {text}")))
        } else {
            Ok(Value::String(text))
        }
    }));

    reg.declare_native("hex", 1, 1, Rc::new(|_i, a| Ok(Value::String(format!("{:X}", to_long(&a[0])?)))));
    reg.declare_native("oct", 1, 1, Rc::new(|_i, a| Ok(Value::String(format!("{:o}", to_long(&a[0])?)))));

    reg.declare_native("val", 1, 1, Rc::new(|_i, a| {
        let text = to_display_string(&a[0])?;
        let trimmed = text.trim_start();
        let numeric_prefix: String = {
            let mut out = String::new();
            let mut seen_dot = false;
            let mut chars = trimmed.chars().peekable();
            if matches!(chars.peek(), Some('+') | Some('-')) {
                out.push(chars.next().unwrap());
            }
            while let Some(&c) = chars.peek() {
                if c.is_ascii_digit() || (c == '.' && !seen_dot) {
                    if c == '.' {
                        seen_dot = true;
                    }
                    out.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            out
        };
        Ok(Value::Double(numeric_prefix.parse().unwrap_or(0.0)))
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
    fn cstr_uses_the_dialect_display_rules() {
        let mut reg = ProcRegistry::new();
        register(&mut reg);
        let mut interp = Interpreter::new();
        assert_eq!(call(&reg, &mut interp, "cstr", &[Value::Double(3.0)]), Value::String("3".into()));
    }

    #[test]
    fn hex_and_oct_format_uppercase_and_base8() {
        let mut reg = ProcRegistry::new();
        register(&mut reg);
        let mut interp = Interpreter::new();
        assert_eq!(call(&reg, &mut interp, "hex", &[Value::Long(255)]), Value::String("FF".into()));
        assert_eq!(call(&reg, &mut interp, "oct", &[Value::Long(8)]), Value::String("10".into()));
    }

    #[test]
    fn val_reads_a_leading_numeric_prefix() {
        let mut reg = ProcRegistry::new();
        register(&mut reg);
        let mut interp = Interpreter::new();
        assert_eq!(call(&reg, &mut interp, "val", &[Value::String("   42abc".into())]), Value::Double(42.0));
    }

    #[test]
    fn cvar_passes_the_value_through_unchanged() {
        let mut reg = ProcRegistry::new();
        register(&mut reg);
        let mut interp = Interpreter::new();
        assert_eq!(call(&reg, &mut interp, "cvar", &[Value::Long(7)]), Value::Long(7));
    }

    #[test]
    fn str_reserves_a_leading_space_for_non_negative_numbers() {
        let mut reg = ProcRegistry::new();
        register(&mut reg);
        let mut interp = Interpreter::new();
        assert_eq!(call(&reg, &mut interp, "str", &[Value::Long(42)]), Value::String(" 42".into()));
        assert_eq!(call(&reg, &mut interp, "str", &[Value::Long(-42)]), Value::String("-42".into()));
        assert_eq!(call(&reg, &mut interp, "str", &[Value::String("hi".into())]), Value::String("hi".into()));
    }
}
