// ABOUTME: RegExp built-in object: Pattern/IgnoreCase/Global properties, Test/Execute/Replace methods

use crate::error::EngineError;
use crate::value::{ObjectRef, Value};
use regex::{Regex, RegexBuilder};
use std::cell::RefCell;
use std::rc::Rc;

/// Mutable backing state for a script `New RegExp` object. Properties are read/write
/// and rebuild the compiled `Regex` lazily on the next `Test`/`Execute`/`Replace`.
#[derive(Debug)]
pub struct RegExpObject {
    pub pattern: String,
    pub ignore_case: bool,
    pub global: bool,
    pub multiline: bool,
    compiled: RefCell<Option<Regex>>,
}

impl RegExpObject {
    pub fn new() -> Self {
        RegExpObject {
            pattern: String::new(),
            ignore_case: false,
            global: false,
            multiline: false,
            compiled: RefCell::new(None),
        }
    }

    fn compile(&self) -> Result<(), EngineError> {
        if self.compiled.borrow().is_some() {
            return Ok(());
        }
        let re = RegexBuilder::new(&self.pattern)
            .case_insensitive(self.ignore_case)
            .multi_line(self.multiline)
            .build()
            .map_err(|e| EngineError::invalid_procedure_call(format!("bad RegExp pattern: {e}")))?;
        *self.compiled.borrow_mut() = Some(re);
        Ok(())
    }

    /// Invalidates the cached compiled pattern; call after mutating `pattern`/`ignore_case`.
    pub fn invalidate(&self) {
        *self.compiled.borrow_mut() = None;
    }

    pub fn test(&self, text: &str) -> Result<bool, EngineError> {
        self.compile()?;
        let guard = self.compiled.borrow();
        Ok(guard.as_ref().unwrap().is_match(text))
    }

    pub fn execute(&self, text: &str) -> Result<MatchCollection, EngineError> {
        self.compile()?;
        let guard = self.compiled.borrow();
        let re = guard.as_ref().unwrap();
        let mut matches = Vec::new();
        if self.global {
            for caps in re.captures_iter(text) {
                matches.push(match_from_captures(&caps));
            }
        } else if let Some(caps) = re.captures(text) {
            matches.push(match_from_captures(&caps));
        }
        Ok(MatchCollection { matches })
    }

    pub fn replace(&self, text: &str, replacement: &str) -> Result<String, EngineError> {
        self.compile()?;
        let guard = self.compiled.borrow();
        let re = guard.as_ref().unwrap();
        if self.global {
            Ok(re.replace_all(text, replacement).into_owned())
        } else {
            Ok(re.replace(text, replacement).into_owned())
        }
    }
}

impl Default for RegExpObject {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct Match {
    pub value: String,
    pub first_index: i32,
    pub length: i32,
    pub sub_matches: Vec<Option<String>>,
}

impl Match {
    pub fn sub_match(&self, index: i32) -> Result<Value, EngineError> {
        match self.sub_matches.get(index as usize) {
            Some(Some(s)) => Ok(Value::String(s.clone())),
            Some(None) => Ok(Value::Empty),
            None => Err(EngineError::subscript_out_of_range(format!("SubMatches.Item({index})"))),
        }
    }

    pub fn sub_match_count(&self) -> i32 {
        self.sub_matches.len() as i32
    }
}

fn match_from_captures(caps: &regex::Captures) -> Match {
    let whole = caps.get(0).expect("capture group 0 always matches");
    let sub_matches = (1..caps.len()).map(|i| caps.get(i).map(|g| g.as_str().to_string())).collect();
    Match {
        value: whole.as_str().to_string(),
        first_index: whole.start() as i32,
        length: (whole.end() - whole.start()) as i32,
        sub_matches,
    }
}

/// The immutable result of `RegExp.Execute`.
#[derive(Debug)]
pub struct MatchCollection {
    pub matches: Vec<Match>,
}

impl MatchCollection {
    pub fn count(&self) -> i32 {
        self.matches.len() as i32
    }

    pub fn item(&self, index: i32) -> Result<&Match, EngineError> {
        self.matches
            .get(index as usize)
            .ok_or_else(|| EngineError::subscript_out_of_range(format!("Matches.Item({index})")))
    }
}

/// Constructs a fresh `New RegExp` object, called by the evaluator's `New` dispatch.
pub fn new_regexp_value() -> Value {
    Value::Object(Some(ObjectRef::RegExp(Rc::new(RefCell::new(RegExpObject::new())))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_a_simple_pattern() {
        let mut re = RegExpObject::new();
        re.pattern = "\\d+".to_string();
        assert!(re.test("abc123").unwrap());
        assert!(!re.test("abc").unwrap());
    }

    #[test]
    fn execute_with_global_finds_every_match() {
        let mut re = RegExpObject::new();
        re.pattern = "\\d+".to_string();
        re.global = true;
        let matches = re.execute("a1 b22 c333").unwrap();
        assert_eq!(matches.count(), 3);
        assert_eq!(matches.item(2).unwrap().value, "333");
    }

    #[test]
    fn replace_without_global_touches_only_first_match() {
        let mut re = RegExpObject::new();
        re.pattern = "a".to_string();
        assert_eq!(re.replace("banana", "o").unwrap(), "bonana");
        re.global = true;
        assert_eq!(re.replace("banana", "o").unwrap(), "bonono");
    }

    #[test]
    fn ignore_case_matches_regardless_of_letter_case() {
        let mut re = RegExpObject::new();
        re.pattern = "hello".to_string();
        re.ignore_case = true;
        assert!(re.test("HELLO world").unwrap());
    }
}
