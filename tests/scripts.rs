// ABOUTME: Black-box integration tests driving the interpreter through its public embedding API

use vbs_engine::{Interpreter, Value};

fn run(source: &str) -> Interpreter {
    let mut interp = Interpreter::new();
    interp.add_code(source).expect("parse/declare");
    interp.run().expect("execute");
    interp
}

#[test]
fn variables_are_case_insensitive_and_implicitly_declared() {
    let interp = run("MyValue = 5\nmyvalue = MYVALUE + 1");
    assert_eq!(interp.get_variable("myValue"), Some(Value::Long(6)));
}

#[test]
fn string_indexing_and_concatenation_are_one_based() {
    let interp = run(r#"s = "hello"
first = Mid(s, 1, 1)
whole = Left(s, 3) & Right(s, 2)
"#);
    assert_eq!(interp.get_variable("first"), Some(Value::String("h".into())));
    assert_eq!(interp.get_variable("whole"), Some(Value::String("helo".into())));
}

#[test]
fn on_error_resume_next_captures_and_continues() {
    let interp = run(r#"On Error Resume Next
x = 1 / 0
afterError = "reached"
code = Err.Number
"#);
    assert_eq!(interp.get_variable("afterError"), Some(Value::String("reached".into())));
    assert_eq!(interp.get_variable("code"), Some(Value::Long(11)));
}

#[test]
fn unhandled_errors_propagate_to_the_host() {
    let mut interp = Interpreter::new();
    interp.add_code("x = 1 / 0").unwrap();
    let err = interp.run().unwrap_err();
    assert_eq!(err.code(), 11);
}

#[test]
fn for_loop_accumulates_into_the_enclosing_scope() {
    let interp = run(r#"total = 0
For i = 1 To 5
    total = total + i
Next
"#);
    assert_eq!(interp.get_variable("total"), Some(Value::Long(15)));
}

#[test]
fn functions_return_values_through_their_own_name() {
    let interp = run(r#"Function Double(n)
    Double = n * 2
End Function
result = Double(21)
"#);
    assert_eq!(interp.get_variable("result"), Some(Value::Long(42)));
}

#[test]
fn classes_support_property_get_let_and_methods() {
    let interp = run(r#"Class Counter
    Private total

    Private Sub Class_Initialize
        total = 0
    End Sub

    Public Sub Increment
        total = total + 1
    End Sub

    Public Property Get Total
        Total = total
    End Property
End Class

Set c = New Counter
c.Increment
c.Increment
c.Increment
result = c.Total
"#);
    assert_eq!(interp.get_variable("result"), Some(Value::Long(3)));
}

#[test]
fn dynamic_arrays_redim_preserve_keeps_existing_elements() {
    let interp = run(r#"Dim items(2)
items(0) = "a"
items(1) = "b"
items(2) = "c"
ReDim Preserve items(4)
items(4) = "e"
first = items(0)
last = items(4)
upper = UBound(items)
"#);
    assert_eq!(interp.get_variable("first"), Some(Value::String("a".into())));
    assert_eq!(interp.get_variable("last"), Some(Value::String("e".into())));
    assert_eq!(interp.get_variable("upper"), Some(Value::Long(4)));
}

#[test]
fn select_case_matches_in_order() {
    let interp = run(r#"n = 2
Select Case n
    Case 1
        label = "one"
    Case 2
        label = "two"
    Case Else
        label = "other"
End Select
"#);
    assert_eq!(interp.get_variable("label"), Some(Value::String("two".into())));
}

#[test]
fn call_invokes_a_user_function_with_host_supplied_arguments() {
    let mut interp = Interpreter::new();
    interp
        .add_code("Function Add(a, b)\n    Add = a + b\nEnd Function")
        .unwrap();
    interp.run().unwrap();
    let result = interp.call("Add", &[Value::Long(2), Value::Long(3)]).unwrap();
    assert_eq!(result, Value::Long(5));
}

#[test]
fn with_block_resolves_leading_dot_members() {
    let interp = run(r#"Class Point
    Public X
    Public Y
End Class

Set p = New Point
With p
    .X = 10
    .Y = 20
End With
sum = p.X + p.Y
"#);
    assert_eq!(interp.get_variable("sum"), Some(Value::Long(30)));
}

#[test]
fn regexp_test_and_replace_honour_global_flag() {
    let interp = run(r#"Set re = New RegExp
re.Pattern = "\d+"
re.Global = True
matched = re.Test("abc123def456")
replaced = re.Replace("abc123def456", "#")
"#);
    assert_eq!(interp.get_variable("matched"), Some(Value::Boolean(true)));
    assert_eq!(interp.get_variable("replaced"), Some(Value::String("abc#def#".into())));
}

#[test]
fn format_applies_named_and_custom_numeric_styles() {
    let interp = run(r#"a = FormatNumber(1234.5, 2)
b = Format(3.14159, "0.00")
c = FormatCurrency(9.5)
"#);
    assert_eq!(interp.get_variable("a"), Some(Value::String("1,234.50".into())));
    assert_eq!(interp.get_variable("b"), Some(Value::String("3.14".into())));
    assert_eq!(interp.get_variable("c"), Some(Value::String("$9.50".into())));
}
