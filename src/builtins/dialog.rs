// ABOUTME: MsgBox/InputBox built-ins, delegating to the interpreter's Dialogs host hook

use crate::coerce::{to_display_string, to_long};
use crate::procs::ProcRegistry;
use crate::value::Value;
use std::rc::Rc;

pub fn register(reg: &mut ProcRegistry) {
    reg.declare_native("msgbox", 1, 3, Rc::new(|interp, a| {
        let prompt = to_display_string(&a[0])?;
        let buttons = a.get(1).map(|v| to_long(v)).transpose()?.unwrap_or(0);
        let title = a.get(2).map(|v| to_display_string(v)).transpose()?.unwrap_or_else(|| "".to_string());
        Ok(Value::Long(interp.dialogs.msg_box(&prompt, buttons, &title)))
    }));

    reg.declare_native("inputbox", 1, 4, Rc::new(|interp, a| {
        let prompt = to_display_string(&a[0])?;
        let title = a.get(1).map(|v| to_display_string(v)).transpose()?.unwrap_or_else(|| "".to_string());
        let default = a.get(2).map(|v| to_display_string(v)).transpose()?.unwrap_or_default();
        match interp.dialogs.input_box(&prompt, &title, &default) {
            Some(text) => Ok(Value::String(text)),
            None => Ok(Value::String(String::new())),
        }
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::Interpreter;

    #[test]
    fn msgbox_returns_the_dialogs_answer() {
        let mut reg = ProcRegistry::new();
        register(&mut reg);
        let mut interp = Interpreter::new();
        let result = reg.get("msgbox").unwrap().call_native(&mut interp, &[Value::String("Continue?".into())]).unwrap();
        assert_eq!(result, Value::Long(1));
    }

    #[test]
    fn inputbox_echoes_the_default_text() {
        let mut reg = ProcRegistry::new();
        register(&mut reg);
        let mut interp = Interpreter::new();
        let result = reg
            .get("inputbox")
            .unwrap()
            .call_native(&mut interp, &[Value::String("Name?".into()), Value::String("".into()), Value::String("Ada".into())])
            .unwrap();
        assert_eq!(result, Value::String("Ada".into()));
    }
}
