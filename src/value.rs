// ABOUTME: Variant value types representing every runtime value the evaluator manipulates

use crate::array::DynamicArray;
use crate::bridge::HostObject;
use crate::classes::Instance;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// The universal variant value. Every script value carries exactly one of these tags;
/// coercions between them live in [`crate::coerce`].
#[derive(Debug, Clone)]
pub enum Value {
    /// Uninitialized variant; numeric context 0, string context "".
    Empty,
    /// Explicit absence; propagates through arithmetic and comparisons.
    Null,
    Boolean(bool),
    Byte(u8),
    Integer(i16),
    Long(i32),
    Single(f32),
    Double(f64),
    /// Scaled by 10_000 (four decimal places), matching the dialect's fixed-point Currency.
    Currency(i64),
    /// Days since 1899-12-30, fractional part is time-of-day. Matches the classic date serial.
    Date(f64),
    String(String),
    Array(Rc<RefCell<DynamicArray>>),
    /// `None` is the null object reference ("Nothing"); `Some` is a live reference.
    Object(Option<ObjectRef>),
    /// A caught, first-class error code (distinct from a raised `EngineError`), produced by `CVErr`.
    ErrorValue(i32),
}

/// The concrete kinds of thing an `Object` variant can reference.
#[derive(Debug, Clone)]
pub enum ObjectRef {
    /// A user-defined class instance.
    Instance(Rc<Instance>),
    /// A `RegExp` built-in object.
    RegExp(Rc<RefCell<crate::builtins::regexp::RegExpObject>>),
    /// The result of `RegExp.Execute`: an immutable collection of matches.
    MatchCollection(Rc<crate::builtins::regexp::MatchCollection>),
    /// A single `Match` read out of a `MatchCollection` by `Item`/default-index.
    Match(Rc<crate::builtins::regexp::Match>),
    /// The `SubMatches` collection hanging off a single `Match`.
    SubMatches(Rc<crate::builtins::regexp::Match>),
    /// An object supplied by the embedding host (see [`crate::bridge`]).
    Host(Rc<dyn HostObject>),
    /// The language-level `Err` singleton; state lives on [`crate::interpreter::Interpreter`]
    /// rather than here, so every occurrence refers to the same conceptual object.
    ErrObject,
}

impl ObjectRef {
    /// Reference identity, used by the `Is` operator.
    pub fn is_same(&self, other: &ObjectRef) -> bool {
        match (self, other) {
            (ObjectRef::Instance(a), ObjectRef::Instance(b)) => Rc::ptr_eq(a, b),
            (ObjectRef::RegExp(a), ObjectRef::RegExp(b)) => Rc::ptr_eq(a, b),
            (ObjectRef::MatchCollection(a), ObjectRef::MatchCollection(b)) => Rc::ptr_eq(a, b),
            (ObjectRef::Match(a), ObjectRef::Match(b)) => Rc::ptr_eq(a, b),
            (ObjectRef::SubMatches(a), ObjectRef::SubMatches(b)) => Rc::ptr_eq(a, b),
            (ObjectRef::Host(a), ObjectRef::Host(b)) => Rc::ptr_eq(a, b),
            (ObjectRef::ErrObject, ObjectRef::ErrObject) => true,
            _ => false,
        }
    }

    pub fn type_name(&self) -> String {
        match self {
            ObjectRef::Instance(inst) => inst.class.name.clone(),
            ObjectRef::RegExp(_) => "RegExp".to_string(),
            ObjectRef::MatchCollection(_) => "MatchCollection".to_string(),
            ObjectRef::Match(_) => "Match".to_string(),
            ObjectRef::SubMatches(_) => "SubMatches".to_string(),
            ObjectRef::Host(h) => h.type_name(),
            ObjectRef::ErrObject => "ErrObject".to_string(),
        }
    }
}

/// The fixed numeric codes returned by `VarType`.
pub mod vartype {
    pub const EMPTY: i32 = 0;
    pub const NULL: i32 = 1;
    pub const INTEGER: i32 = 2;
    pub const LONG: i32 = 3;
    pub const SINGLE: i32 = 4;
    pub const DOUBLE: i32 = 5;
    pub const CURRENCY: i32 = 6;
    pub const DATE: i32 = 7;
    pub const STRING: i32 = 8;
    pub const OBJECT: i32 = 9;
    pub const ERROR: i32 = 10;
    pub const BOOLEAN: i32 = 11;
    pub const ARRAY: i32 = 8192;
    pub const BYTE: i32 = 17;
}

impl Value {
    /// `TypeName`-style name, also used in error messages.
    pub fn type_name(&self) -> String {
        match self {
            Value::Empty => "Empty".to_string(),
            Value::Null => "Null".to_string(),
            Value::Boolean(_) => "Boolean".to_string(),
            Value::Byte(_) => "Byte".to_string(),
            Value::Integer(_) => "Integer".to_string(),
            Value::Long(_) => "Long".to_string(),
            Value::Single(_) => "Single".to_string(),
            Value::Double(_) => "Double".to_string(),
            Value::Currency(_) => "Currency".to_string(),
            Value::Date(_) => "Date".to_string(),
            Value::String(_) => "String".to_string(),
            Value::Array(_) => "Variant()".to_string(),
            Value::Object(None) => "Nothing".to_string(),
            Value::Object(Some(obj)) => obj.type_name(),
            Value::ErrorValue(_) => "Error".to_string(),
        }
    }

    /// `VarType`-style numeric code.
    pub fn var_type(&self) -> i32 {
        match self {
            Value::Empty => vartype::EMPTY,
            Value::Null => vartype::NULL,
            Value::Boolean(_) => vartype::BOOLEAN,
            Value::Byte(_) => vartype::BYTE,
            Value::Integer(_) => vartype::INTEGER,
            Value::Long(_) => vartype::LONG,
            Value::Single(_) => vartype::SINGLE,
            Value::Double(_) => vartype::DOUBLE,
            Value::Currency(_) => vartype::CURRENCY,
            Value::Date(_) => vartype::DATE,
            Value::String(_) => vartype::STRING,
            Value::Array(_) => vartype::ARRAY,
            Value::Object(_) => vartype::OBJECT,
            Value::ErrorValue(_) => vartype::ERROR,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Value::Byte(_)
                | Value::Integer(_)
                | Value::Long(_)
                | Value::Single(_)
                | Value::Double(_)
                | Value::Currency(_)
                | Value::Date(_)
                | Value::Boolean(_)
        )
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn nothing() -> Value {
        Value::Object(None)
    }
}

impl PartialEq for Value {
    /// Structural equality for tests and internal bookkeeping; this is deliberately
    /// *not* the language-level `=` operator, which lives in [`crate::coerce::values_equal`]
    /// and applies string/numeric coercion rules instead of exact tag matching.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Empty, Value::Empty) => true,
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Byte(a), Value::Byte(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Single(a), Value::Single(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Currency(a), Value::Currency(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(None), Value::Object(None)) => true,
            (Value::Object(Some(a)), Value::Object(Some(b))) => a.is_same(b),
            (Value::ErrorValue(a), Value::ErrorValue(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Empty => write!(f, ""),
            Value::Null => write!(f, ""),
            Value::Boolean(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            Value::Byte(n) => write!(f, "{}", n),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Long(n) => write!(f, "{}", n),
            Value::Single(n) => write!(f, "{}", format_float(*n as f64)),
            Value::Double(n) => write!(f, "{}", format_float(*n)),
            Value::Currency(n) => write!(f, "{}", format_currency(*n)),
            Value::Date(d) => write!(f, "{}", crate::builtins::date::format_date_value(*d)),
            Value::String(s) => write!(f, "{}", s),
            Value::Array(_) => write!(f, ""),
            Value::Object(None) => write!(f, ""),
            Value::Object(Some(_)) => write!(f, ""),
            Value::ErrorValue(n) => write!(f, "{}", n),
        }
    }
}

/// Mirrors the dialect's convention of dropping a trailing `.0` on whole-number floats.
pub(crate) fn format_float(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn format_currency(scaled: i64) -> String {
    let whole = scaled / 10_000;
    let frac = (scaled % 10_000).abs();
    if frac == 0 {
        format!("{}", whole)
    } else {
        format!("{}.{:04}", whole, frac).trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_number_doubles_display_without_decimal() {
        assert_eq!(format!("{}", Value::Double(42.0)), "42");
        assert_eq!(format!("{}", Value::Double(-2.5)), "-2.5");
    }

    #[test]
    fn booleans_display_as_true_false() {
        assert_eq!(format!("{}", Value::Boolean(true)), "True");
        assert_eq!(format!("{}", Value::Boolean(false)), "False");
    }

    #[test]
    fn empty_and_null_display_as_empty_string() {
        assert_eq!(format!("{}", Value::Empty), "");
        assert_eq!(format!("{}", Value::Null), "");
    }

    #[test]
    fn type_name_and_var_type_agree_on_kind() {
        assert_eq!(Value::Long(1).type_name(), "Long");
        assert_eq!(Value::Long(1).var_type(), vartype::LONG);
        assert_eq!(Value::nothing().type_name(), "Nothing");
    }

    #[test]
    fn currency_formats_with_up_to_four_decimals() {
        assert_eq!(format_currency(10_000), "1");
        assert_eq!(format_currency(12_345), "1.2345");
        assert_eq!(format_currency(15_000), "1.5");
    }
}
