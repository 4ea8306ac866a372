// ABOUTME: Format/FormatNumber/FormatCurrency/FormatPercent/FormatDateTime built-ins

use crate::builtins::date::serial_to_datetime;
use crate::coerce::{to_display_string, to_f64};
use crate::error::EngineError;
use crate::procs::ProcRegistry;
use crate::value::Value;
use chrono::{Datelike, NaiveDateTime, Timelike};
use std::rc::Rc;

pub fn register(reg: &mut ProcRegistry) {
    reg.declare_native("format", 1, 2, Rc::new(|_i, a| {
        let fmt = a.get(1).map(to_display_string).transpose()?.unwrap_or_default();
        format_value(&a[0], &fmt)
    }));

    reg.declare_native("formatnumber", 1, 2, Rc::new(|_i, a| {
        let digits = a.get(1).map(crate::coerce::to_long).transpose()?.unwrap_or(2).max(0) as usize;
        Ok(Value::String(format_fixed(to_f64(&a[0])?, digits, true)))
    }));

    reg.declare_native("formatcurrency", 1, 2, Rc::new(|_i, a| {
        let digits = a.get(1).map(crate::coerce::to_long).transpose()?.unwrap_or(2).max(0) as usize;
        Ok(Value::String(format!("${}", format_fixed(to_f64(&a[0])?, digits, true))))
    }));

    reg.declare_native("formatpercent", 1, 2, Rc::new(|_i, a| {
        let digits = a.get(1).map(crate::coerce::to_long).transpose()?.unwrap_or(2).max(0) as usize;
        Ok(Value::String(format!("{}%", format_fixed(to_f64(&a[0])? * 100.0, digits, false))))
    }));

    reg.declare_native("formatdatetime", 1, 2, Rc::new(|_i, a| {
        let named = a.get(1).map(crate::coerce::to_long).transpose()?.unwrap_or(0);
        let serial = crate::builtins::date::coerce_to_date(&a[0])?;
        let dt = serial_to_datetime(serial);
        Ok(Value::String(match named {
            1 => format_date(&dt, "dddd, mmmm dd, yyyy"),
            2 => format_date(&dt, "mm/dd/yyyy"),
            3 => format_date(&dt, "hh:nn:ss AM/PM"),
            4 => format_date(&dt, "hh:nn"),
            _ => format_date(&dt, "mm/dd/yyyy hh:nn:ss AM/PM"),
        }))
    }));
}

fn format_value(value: &Value, fmt: &str) -> Result<Value, EngineError> {
    if fmt.trim().is_empty() {
        return Ok(Value::String(to_display_string(value)?));
    }
    let lower = fmt.to_lowercase();
    if let Value::Date(serial) = value {
        let dt = serial_to_datetime(*serial);
        return Ok(Value::String(match lower.as_str() {
            "general date" => format_date(&dt, "mm/dd/yyyy hh:nn:ss AM/PM"),
            "long date" => format_date(&dt, "dddd, mmmm dd, yyyy"),
            "medium date" => format_date(&dt, "dd-mmm-yy"),
            "short date" => format_date(&dt, "mm/dd/yyyy"),
            "long time" | "medium time" => format_date(&dt, "hh:nn:ss AM/PM"),
            "short time" => format_date(&dt, "hh:nn"),
            _ => format_date(&dt, fmt),
        }));
    }
    match lower.as_str() {
        "general number" => return Ok(Value::String(to_display_string(value)?)),
        "currency" => return Ok(Value::String(format!("${}", format_fixed(to_f64(value)?, 2, true)))),
        "fixed" => return Ok(Value::String(format_fixed(to_f64(value)?, 2, false))),
        "standard" => return Ok(Value::String(format_fixed(to_f64(value)?, 2, true))),
        "percent" => return Ok(Value::String(format!("{}%", format_fixed(to_f64(value)? * 100.0, 2, false)))),
        "scientific" => return Ok(Value::String(format!("{:E}", to_f64(value)?))),
        "yes/no" => return Ok(Value::String(if crate::coerce::to_bool(value)? { "Yes" } else { "No" }.to_string())),
        "true/false" => return Ok(Value::String(if crate::coerce::to_bool(value)? { "True" } else { "False" }.to_string())),
        _ => {}
    }
    if fmt.contains('#') || fmt.contains('0') {
        return Ok(Value::String(format_custom_number(to_f64(value)?, fmt)));
    }
    Ok(Value::String(to_display_string(value)?))
}

/// Fixed-point formatting with an optional thousands separator, used by the named
/// numeric formats and the `FormatNumber`/`FormatCurrency` built-ins.
fn format_fixed(n: f64, digits: usize, grouped: bool) -> String {
    let negative = n < 0.0;
    let rounded = n.abs();
    let formatted = format!("{:.*}", digits, rounded);
    let (whole, frac) = match formatted.split_once('.') {
        Some((w, f)) => (w.to_string(), Some(f.to_string())),
        None => (formatted, None),
    };
    let whole = if grouped { group_thousands(&whole) } else { whole };
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&whole);
    if let Some(frac) = frac {
        out.push('.');
        out.push_str(&frac);
    }
    out
}

fn group_thousands(digits: &str) -> String {
    let bytes = digits.as_bytes();
    let mut out = Vec::with_capacity(bytes.len() + bytes.len() / 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 && (bytes.len() - i) % 3 == 0 {
            out.push(b',' as u8);
        }
        out.push(*b);
    }
    String::from_utf8(out).unwrap()
}

/// Walks a custom numeric pattern (`#`/`0`/`.`/`,`/`%`) left to right, substituting
/// digits of `n`; unsupported beyond a single decimal section (no exponent tokens).
fn format_custom_number(n: f64, pattern: &str) -> String {
    let percent = pattern.contains('%');
    let value = if percent { n * 100.0 } else { n };
    let decimals = pattern.split('.').nth(1).map(|frac| frac.chars().filter(|c| *c == '0' || *c == '#').count()).unwrap_or(0);
    let grouped = pattern.contains(',');
    let mut out = format_fixed(value, decimals, grouped);
    if percent {
        out.push('%');
    }
    out
}

/// Walks a custom date pattern translating the dialect's tokens (`yyyy`, `mm`, `dd`,
/// `hh`, `nn`, `ss`, `AM/PM`, month/weekday names) into the formatted text.
fn format_date(dt: &NaiveDateTime, pattern: &str) -> String {
    const MONTHS: [&str; 12] = [
        "January", "February", "March", "April", "May", "June", "July", "August", "September", "October", "November",
        "December",
    ];
    const WEEKDAYS: [&str; 7] = ["Sunday", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday"];

    let hour12 = {
        let h = dt.hour() % 12;
        if h == 0 { 12 } else { h }
    };
    let tokens: [(&str, String); 15] = [
        ("yyyy", format!("{:04}", dt.year())),
        ("yy", format!("{:02}", dt.year() % 100)),
        ("mmmm", MONTHS[dt.month0() as usize].to_string()),
        ("mmm", MONTHS[dt.month0() as usize][..3].to_string()),
        ("mm", format!("{:02}", dt.month())),
        ("dddd", WEEKDAYS[dt.weekday().num_days_from_sunday() as usize].to_string()),
        ("ddd", WEEKDAYS[dt.weekday().num_days_from_sunday() as usize][..3].to_string()),
        ("dd", format!("{:02}", dt.day())),
        ("hh", format!("{:02}", hour12)),
        ("nn", format!("{:02}", dt.minute())),
        ("ss", format!("{:02}", dt.second())),
        ("AM/PM", if dt.hour() < 12 { "AM".to_string() } else { "PM".to_string() }),
        ("am/pm", if dt.hour() < 12 { "am".to_string() } else { "pm".to_string() }),
        ("d", dt.day().to_string()),
        ("m", dt.month().to_string()),
    ];
    let mut out = pattern.to_string();
    for (token, replacement) in tokens {
        out = out.replace(token, &replacement);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::Interpreter;

    fn call(reg: &ProcRegistry, interp: &mut Interpreter, name: &str, args: &[Value]) -> Value {
        reg.get(name).unwrap().call_native(interp, args).unwrap()
    }

    #[test]
    fn formatnumber_rounds_to_the_requested_digits() {
        let mut reg = ProcRegistry::new();
        register(&mut reg);
        let mut interp = Interpreter::new();
        assert_eq!(call(&reg, &mut interp, "formatnumber", &[Value::Double(1234.5), Value::Long(1)]), Value::String("1,234.5".into()));
    }

    #[test]
    fn formatcurrency_adds_a_dollar_sign() {
        let mut reg = ProcRegistry::new();
        register(&mut reg);
        let mut interp = Interpreter::new();
        assert_eq!(call(&reg, &mut interp, "formatcurrency", &[Value::Double(9.5)]), Value::String("$9.50".into()));
    }

    #[test]
    fn format_with_custom_numeric_pattern() {
        let mut reg = ProcRegistry::new();
        register(&mut reg);
        let mut interp = Interpreter::new();
        let result = call(&reg, &mut interp, "format", &[Value::Double(3.14159), Value::String("0.00".into())]);
        assert_eq!(result, Value::String("3.14".into()));
    }

    #[test]
    fn format_date_short_date_named_style() {
        let mut reg = ProcRegistry::new();
        register(&mut reg);
        let mut interp = Interpreter::new();
        let serial = crate::builtins::date::parse_date_text("3/15/2020").unwrap();
        let result = call(&reg, &mut interp, "format", &[Value::Date(serial), Value::String("Short Date".into())]);
        assert_eq!(result, Value::String("03/15/2020".into()));
    }
}
