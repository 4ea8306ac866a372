// ABOUTME: Host-supplied handler for the dialect's modal MsgBox/InputBox built-ins

/// Scripts running under an embedding host have no real screen to pop a dialog on, so
/// `MsgBox`/`InputBox` are routed through this trait instead of touching any UI toolkit
/// directly. Hosts that want real dialogs implement it; everyone else gets
/// [`NullDialogs`], which answers deterministically and writes prompts to stderr.
pub trait Dialogs {
    /// Returns the button code the user "pressed" (1 = OK by convention, matching the
    /// dialect's own `vbOK`).
    fn msg_box(&mut self, prompt: &str, buttons: i32, title: &str) -> i32;

    /// Returns `None` if the user "cancelled".
    fn input_box(&mut self, prompt: &str, title: &str, default: &str) -> Option<String>;
}

/// Default host: never blocks, always answers OK / the supplied default text.
pub struct NullDialogs;

impl Dialogs for NullDialogs {
    fn msg_box(&mut self, prompt: &str, _buttons: i32, title: &str) -> i32 {
        eprintln!("[MsgBox] {title}: {prompt}");
        1
    }

    fn input_box(&mut self, prompt: &str, title: &str, default: &str) -> Option<String> {
        eprintln!("[InputBox] {title}: {prompt}");
        Some(default.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_dialogs_always_answers_ok() {
        let mut d = NullDialogs;
        assert_eq!(d.msg_box("hi", 0, "t"), 1);
    }

    #[test]
    fn null_dialogs_echoes_the_default_text() {
        let mut d = NullDialogs;
        assert_eq!(d.input_box("name?", "t", "Bob"), Some("Bob".to_string()));
    }
}
