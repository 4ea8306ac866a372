// ABOUTME: Native procedure categories, registered into a fresh interpreter's ProcRegistry

pub mod array_fns;
pub mod conversion;
pub mod date;
pub mod dialog;
pub mod format;
pub mod inspection;
pub mod math;
pub mod regexp;
pub mod strings;

use crate::procs::ProcRegistry;

/// Installs every built-in category. Called once by [`crate::interpreter::Interpreter::with_options`].
pub fn register_all(reg: &mut ProcRegistry) {
    strings::register(reg);
    math::register(reg);
    conversion::register(reg);
    inspection::register(reg);
    date::register(reg);
    array_fns::register(reg);
    dialog::register(reg);
    format::register(reg);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_all_installs_at_least_one_function_per_category() {
        let mut reg = ProcRegistry::new();
        register_all(&mut reg);
        for name in ["len", "abs", "cstr", "isnumeric", "now", "ubound", "msgbox"] {
            assert!(reg.contains(name), "missing builtin '{name}'");
        }
    }
}
