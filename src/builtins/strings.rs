// ABOUTME: String manipulation built-ins: Len, Mid, InStr, Split, Join, Trim family, etc.

use crate::coerce::{to_display_string, to_long};
use crate::error::EngineError;
use crate::interpreter::Interpreter;
use crate::procs::ProcRegistry;
use crate::value::Value;
use std::rc::Rc;

fn s(v: &Value) -> Result<String, EngineError> {
    to_display_string(v)
}

fn n(v: &Value) -> Result<i32, EngineError> {
    to_long(v)
}

pub fn register(reg: &mut ProcRegistry) {
    reg.declare_native("len", 1, 1, Rc::new(|_i, a| {
        if let Value::Array(arr) = &a[0] {
            Ok(Value::Long(arr.borrow().len() as i32))
        } else {
            Ok(Value::Long(s(&a[0])?.chars().count() as i32))
        }
    }));

    reg.declare_native("left", 2, 2, Rc::new(|_i, a| {
        let text = s(&a[0])?;
        let count = n(&a[1])?.max(0) as usize;
        Ok(Value::String(text.chars().take(count).collect()))
    }));

    reg.declare_native("right", 2, 2, Rc::new(|_i, a| {
        let text = s(&a[0])?;
        let count = n(&a[1])?.max(0) as usize;
        let chars: Vec<char> = text.chars().collect();
        let start = chars.len().saturating_sub(count);
        Ok(Value::String(chars[start..].iter().collect()))
    }));

    reg.declare_native("mid", 2, 3, Rc::new(|_i, a| {
        let text = s(&a[0])?;
        let start = (n(&a[1])? - 1).max(0) as usize;
        let chars: Vec<char> = text.chars().collect();
        if start >= chars.len() {
            return Ok(Value::String(String::new()));
        }
        let len = if a.len() == 3 {
            n(&a[2])?.max(0) as usize
        } else {
            chars.len() - start
        };
        let end = (start + len).min(chars.len());
        Ok(Value::String(chars[start..end].iter().collect()))
    }));

    reg.declare_native("instr", 2, 4, Rc::new(|_i, a| {
        // Two forms: InStr(str1, str2) and InStr(start, str1, str2[, compare]).
        let (start, hay, needle) = if a.len() == 2 {
            (1usize, s(&a[0])?, s(&a[1])?)
        } else {
            ((n(&a[0])?.max(1)) as usize, s(&a[1])?, s(&a[2])?)
        };
        let hay_chars: Vec<char> = hay.chars().collect();
        if start > hay_chars.len() || needle.is_empty() {
            return Ok(Value::Long(0));
        }
        let haystack: String = hay_chars[start - 1..].iter().collect();
        match haystack.to_lowercase().find(&needle.to_lowercase()) {
            Some(byte_idx) => {
                let char_idx = haystack[..byte_idx].chars().count();
                Ok(Value::Long((start + char_idx) as i32))
            }
            None => Ok(Value::Long(0)),
        }
    }));

    reg.declare_native("instrrev", 2, 4, Rc::new(|_i, a| {
        // InStrRev(str1, str2[, start[, compare]]): searches backward from `start`
        // (or the end of str1 when omitted), returning a 1-based position like InStr.
        let hay = s(&a[0])?;
        let needle = s(&a[1])?;
        let hay_chars: Vec<char> = hay.chars().collect();
        let start = a.get(2).map(n).transpose()?.map(|v| v.max(1) as usize).unwrap_or(hay_chars.len());
        let binary = a.get(3).map(n).transpose()?.unwrap_or(1) == 0;
        if needle.is_empty() {
            return Ok(Value::Long(start.min(hay_chars.len()) as i32));
        }
        let end = start.min(hay_chars.len());
        let window: String = hay_chars[..end].iter().collect();
        let (window_cmp, needle_cmp) = if binary { (window.clone(), needle.clone()) } else { (window.to_lowercase(), needle.to_lowercase()) };
        match window_cmp.rfind(&needle_cmp) {
            Some(byte_idx) => Ok(Value::Long((window[..byte_idx].chars().count() + 1) as i32)),
            None => Ok(Value::Long(0)),
        }
    }));

    reg.declare_native("ucase", 1, 1, Rc::new(|_i, a| Ok(Value::String(s(&a[0])?.to_uppercase()))));
    reg.declare_native("lcase", 1, 1, Rc::new(|_i, a| Ok(Value::String(s(&a[0])?.to_lowercase()))));
    reg.declare_native("trim", 1, 1, Rc::new(|_i, a| Ok(Value::String(s(&a[0])?.trim().to_string()))));
    reg.declare_native("ltrim", 1, 1, Rc::new(|_i, a| Ok(Value::String(s(&a[0])?.trim_start().to_string()))));
    reg.declare_native("rtrim", 1, 1, Rc::new(|_i, a| Ok(Value::String(s(&a[0])?.trim_end().to_string()))));

    reg.declare_native("replace", 3, 6, Rc::new(|_i, a| {
        let text = s(&a[0])?;
        let find = s(&a[1])?;
        let with = s(&a[2])?;
        let start = a.get(3).map(n).transpose()?.unwrap_or(1).max(1) as usize;
        let count = a.get(4).map(n).transpose()?.unwrap_or(-1);
        let binary = a.get(5).map(n).transpose()?.unwrap_or(1) == 0;
        let chars: Vec<char> = text.chars().collect();
        if start > chars.len() || find.is_empty() {
            return Ok(Value::String(chars.get(start.saturating_sub(1)..).map(|c| c.iter().collect()).unwrap_or_default()));
        }
        let tail: String = chars[start - 1..].iter().collect();
        let mut replaced = 0i32;
        let mut out = String::new();
        let mut rest = tail.as_str();
        loop {
            if count >= 0 && replaced >= count {
                out.push_str(rest);
                break;
            }
            let found = if binary {
                rest.find(find.as_str())
            } else {
                rest.to_lowercase().find(&find.to_lowercase())
            };
            match found {
                Some(idx) => {
                    out.push_str(&rest[..idx]);
                    out.push_str(&with);
                    rest = &rest[idx + find.len()..];
                    replaced += 1;
                }
                None => {
                    out.push_str(rest);
                    break;
                }
            }
        }
        Ok(Value::String(out))
    }));

    reg.declare_native("split", 1, 2, Rc::new(|_i, a| {
        let text = s(&a[0])?;
        let delim = if a.len() == 2 { s(&a[1])? } else { " ".to_string() };
        let parts: Vec<Value> = if delim.is_empty() {
            vec![Value::String(text)]
        } else {
            text.split(delim.as_str()).map(|p| Value::String(p.to_string())).collect()
        };
        Ok(Value::Array(std::rc::Rc::new(std::cell::RefCell::new(
            crate::array::DynamicArray::from_values(parts),
        ))))
    }));

    reg.declare_native("join", 1, 2, Rc::new(|_i, a| {
        let delim = if a.len() == 2 { s(&a[1])? } else { " ".to_string() };
        let Value::Array(arr) = &a[0] else {
            return Err(EngineError::type_mismatch("Join expects an array"));
        };
        let arr = arr.borrow();
        let mut parts = Vec::with_capacity(arr.len());
        for v in arr.iter() {
            parts.push(s(v)?);
        }
        Ok(Value::String(parts.join(&delim)))
    }));

    reg.declare_native("strcomp", 2, 3, Rc::new(|_i, a| {
        let x = s(&a[0])?;
        let y = s(&a[1])?;
        let binary = a.get(2).map(|v| n(v)).transpose()?.unwrap_or(1) == 0;
        let ord = if binary { x.cmp(&y) } else { x.to_lowercase().cmp(&y.to_lowercase()) };
        Ok(Value::Long(match ord {
            std::cmp::Ordering::Less => -1,
            std::cmp::Ordering::Equal => 0,
            std::cmp::Ordering::Greater => 1,
        }))
    }));

    reg.declare_native("string", 2, 2, Rc::new(|_i, a| {
        let count = n(&a[0])?.max(0) as usize;
        let ch = s(&a[1])?.chars().next().unwrap_or(' ');
        Ok(Value::String(std::iter::repeat(ch).take(count).collect()))
    }));

    reg.declare_native("space", 1, 1, Rc::new(|_i, a| {
        Ok(Value::String(" ".repeat(n(&a[0])?.max(0) as usize)))
    }));

    reg.declare_native("chr", 1, 1, Rc::new(|_i, a| {
        let code = n(&a[0])?;
        let ch = char::from_u32(code as u32)
            .ok_or_else(|| EngineError::invalid_procedure_call(format!("{code} is not a valid character code")))?;
        Ok(Value::String(ch.to_string()))
    }));

    reg.declare_native("asc", 1, 1, Rc::new(|_i, a| {
        let text = s(&a[0])?;
        let ch = text.chars().next().ok_or_else(|| EngineError::invalid_procedure_call("Asc of an empty string"))?;
        Ok(Value::Long(ch as i32))
    }));

    reg.declare_native("strreverse", 1, 1, Rc::new(|_i, a| Ok(Value::String(s(&a[0])?.chars().rev().collect()))));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(reg: &ProcRegistry, interp: &mut Interpreter, name: &str, args: &[Value]) -> Value {
        let proc = reg.get(name).unwrap();
        proc.check_arity(args.len()).unwrap();
        proc.call_native(interp, args).unwrap()
    }

    #[test]
    fn mid_extracts_a_one_based_substring() {
        let mut reg = ProcRegistry::new();
        register(&mut reg);
        let mut interp = Interpreter::new();
        let result = call(&reg, &mut interp, "mid", &[Value::String("Hello World".into()), Value::Long(7)]);
        assert_eq!(result, Value::String("World".into()));
    }

    #[test]
    fn instr_is_case_insensitive_and_one_based() {
        let mut reg = ProcRegistry::new();
        register(&mut reg);
        let mut interp = Interpreter::new();
        let result = call(&reg, &mut interp, "instr", &[Value::String("Hello World".into()), Value::String("WORLD".into())]);
        assert_eq!(result, Value::Long(7));
    }

    #[test]
    fn split_produces_a_one_dimensional_array() {
        let mut reg = ProcRegistry::new();
        register(&mut reg);
        let mut interp = Interpreter::new();
        let result = call(&reg, &mut interp, "split", &[Value::String("a,b,c".into()), Value::String(",".into())]);
        match result {
            Value::Array(arr) => assert_eq!(arr.borrow().len(), 3),
            _ => panic!("expected array"),
        }
    }

    #[test]
    fn len_reports_character_count_not_byte_count() {
        let mut reg = ProcRegistry::new();
        register(&mut reg);
        let mut interp = Interpreter::new();
        let result = call(&reg, &mut interp, "len", &[Value::String("café".into())]);
        assert_eq!(result, Value::Long(4));
    }

    #[test]
    fn instrrev_searches_backward_and_is_one_based() {
        let mut reg = ProcRegistry::new();
        register(&mut reg);
        let mut interp = Interpreter::new();
        let result = call(
            &reg,
            &mut interp,
            "instrrev",
            &[Value::String("Hello World World".into()), Value::String("World".into())],
        );
        assert_eq!(result, Value::Long(13));
    }

    #[test]
    fn instrrev_honours_the_start_position_and_case_sensitivity() {
        let mut reg = ProcRegistry::new();
        register(&mut reg);
        let mut interp = Interpreter::new();
        let hay = Value::String("abcABCabc".into());
        let result = call(&reg, &mut interp, "instrrev", &[hay.clone(), Value::String("abc".into()), Value::Long(6)]);
        assert_eq!(result, Value::Long(4));

        let binary = call(
            &reg,
            &mut interp,
            "instrrev",
            &[hay, Value::String("ABC".into()), Value::Long(9), Value::Long(0)],
        );
        assert_eq!(binary, Value::Long(4));
    }

    #[test]
    fn replace_honours_start_count_and_compare_mode() {
        let mut reg = ProcRegistry::new();
        register(&mut reg);
        let mut interp = Interpreter::new();

        let limited = call(
            &reg,
            &mut interp,
            "replace",
            &[
                Value::String("a-a-a-a".into()),
                Value::String("a".into()),
                Value::String("b".into()),
                Value::Long(1),
                Value::Long(2),
            ],
        );
        assert_eq!(limited, Value::String("b-b-a-a".into()));

        let from_start = call(
            &reg,
            &mut interp,
            "replace",
            &[
                Value::String("a-a-a-a".into()),
                Value::String("a".into()),
                Value::String("b".into()),
                Value::Long(5),
            ],
        );
        assert_eq!(from_start, Value::String("b-b".into()));

        let binary_mode = call(
            &reg,
            &mut interp,
            "replace",
            &[
                Value::String("AaAa".into()),
                Value::String("a".into()),
                Value::String("x".into()),
                Value::Long(1),
                Value::Long(-1),
                Value::Long(0),
            ],
        );
        assert_eq!(binary_mode, Value::String("AxAx".into()));
    }
}
