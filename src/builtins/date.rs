// ABOUTME: Date/time built-ins over the dialect's date serial (days since 1899-12-30)

use crate::coerce::to_display_string;
use crate::error::EngineError;
use crate::procs::ProcRegistry;
use crate::value::Value;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use std::rc::Rc;

/// The dialect's date epoch: serial `0.0` is midnight on 1899-12-30.
fn epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1899, 12, 30).unwrap().and_hms_opt(0, 0, 0).unwrap()
}

pub fn serial_to_datetime(serial: f64) -> NaiveDateTime {
    let days = serial.trunc() as i64;
    let frac_seconds = (serial.fract().abs() * 86_400.0).round() as i64;
    epoch() + Duration::days(days) + Duration::seconds(frac_seconds)
}

pub fn datetime_to_serial(dt: NaiveDateTime) -> f64 {
    let delta = dt - epoch();
    delta.num_milliseconds() as f64 / 86_400_000.0
}

/// Formats a date serial the way `CStr`/string-coercion displays a `Date` value.
pub fn format_date_value(serial: f64) -> String {
    let dt = serial_to_datetime(serial);
    if dt.time().hour() == 0 && dt.time().minute() == 0 && dt.time().second() == 0 {
        dt.format("%-m/%-d/%Y").to_string()
    } else if serial.trunc() == 0.0 {
        dt.format("%-I:%M:%S %p").to_string()
    } else {
        dt.format("%-m/%-d/%Y %-I:%M:%S %p").to_string()
    }
}

/// Parses common date/time textual forms (`#1/1/2020#` literals and `CDate` string
/// input both funnel through here). Not an exhaustive locale-aware parser — covers the
/// `M/D/Y`, `M/D/Y H:MM:SS AM|PM` and ISO `Y-M-D` forms.
pub fn coerce_to_date(v: &Value) -> Result<f64, EngineError> {
    if let Value::Date(d) = v {
        return Ok(*d);
    }
    let text = to_display_string(v)?;
    parse_date_text(text.trim())
}

pub fn parse_date_text(text: &str) -> Result<f64, EngineError> {
    let formats = [
        "%m/%d/%Y %I:%M:%S %p",
        "%m/%d/%Y %H:%M:%S",
        "%m/%d/%Y",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d",
    ];
    for fmt in formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Ok(datetime_to_serial(dt));
        }
        if let Ok(d) = NaiveDate::parse_from_str(text, fmt) {
            return Ok(datetime_to_serial(d.and_hms_opt(0, 0, 0).unwrap()));
        }
    }
    Err(EngineError::type_mismatch(format!("'{text}' is not a recognisable date")))
}

pub fn register(reg: &mut ProcRegistry) {
    reg.declare_native("now", 0, 0, Rc::new(|_i, _a| {
        Ok(Value::Date(datetime_to_serial(chrono::Local::now().naive_local())))
    }));

    reg.declare_native("date", 0, 0, Rc::new(|_i, _a| {
        let today = chrono::Local::now().naive_local().date();
        Ok(Value::Date(datetime_to_serial(today.and_hms_opt(0, 0, 0).unwrap())))
    }));

    reg.declare_native("time", 0, 0, Rc::new(|_i, _a| {
        let now = chrono::Local::now().naive_local();
        let serial = datetime_to_serial(now) - datetime_to_serial(now.date().and_hms_opt(0, 0, 0).unwrap());
        Ok(Value::Date(serial))
    }));

    reg.declare_native("dateserial", 3, 3, Rc::new(|_i, a| {
        let y = crate::coerce::to_long(&a[0])?;
        let m = crate::coerce::to_long(&a[1])?;
        let d = crate::coerce::to_long(&a[2])?;
        let base = NaiveDate::from_ymd_opt(y, 1, 1)
            .ok_or_else(|| EngineError::invalid_procedure_call("invalid year"))?;
        let dt = base + chrono::Months::new((m - 1).max(0) as u32) + Duration::days((d - 1) as i64);
        Ok(Value::Date(datetime_to_serial(dt.and_hms_opt(0, 0, 0).unwrap())))
    }));

    reg.declare_native("dateadd", 3, 3, Rc::new(|_i, a| {
        let interval = to_display_string(&a[0])?.to_lowercase();
        let amount = crate::coerce::to_f64(&a[1])?;
        let serial = coerce_to_date(&a[2])?;
        let dt = serial_to_datetime(serial);
        let result = match interval.as_str() {
            "yyyy" => dt + chrono::Months::new((amount as i32 * 12).unsigned_abs()),
            "q" => dt + chrono::Months::new((amount as i32 * 3).unsigned_abs()),
            "m" => dt + chrono::Months::new((amount as i32).unsigned_abs()),
            "d" | "y" | "w" => dt + Duration::days(amount as i64),
            "ww" => dt + Duration::weeks(amount as i64),
            "h" => dt + Duration::hours(amount as i64),
            "n" => dt + Duration::minutes(amount as i64),
            "s" => dt + Duration::seconds(amount as i64),
            other => {
                return Err(EngineError::invalid_procedure_call(format!("unknown DateAdd interval '{other}'")))
            }
        };
        Ok(Value::Date(datetime_to_serial(result)))
    }));

    reg.declare_native("datediff", 3, 3, Rc::new(|_i, a| {
        let interval = to_display_string(&a[0])?.to_lowercase();
        let d1 = serial_to_datetime(coerce_to_date(&a[1])?);
        let d2 = serial_to_datetime(coerce_to_date(&a[2])?);
        let delta = d2 - d1;
        let result = match interval.as_str() {
            "d" | "y" | "w" => delta.num_days(),
            "ww" => delta.num_weeks(),
            "h" => delta.num_hours(),
            "n" => delta.num_minutes(),
            "s" => delta.num_seconds(),
            "yyyy" => (d2.year() - d1.year()) as i64,
            "q" => {
                let months = (d2.year() - d1.year()) as i64 * 12 + (d2.month() as i64 - d1.month() as i64);
                months / 3
            }
            "m" => (d2.year() - d1.year()) as i64 * 12 + (d2.month() as i64 - d1.month() as i64),
            other => {
                return Err(EngineError::invalid_procedure_call(format!("unknown DateDiff interval '{other}'")))
            }
        };
        Ok(Value::Long(result as i32))
    }));

    reg.declare_native("datepart", 2, 2, Rc::new(|_i, a| {
        let interval = to_display_string(&a[0])?.to_lowercase();
        let dt = serial_to_datetime(coerce_to_date(&a[1])?);
        Ok(Value::Long(match interval.as_str() {
            "yyyy" => dt.year(),
            "q" => (dt.month() as i32 - 1) / 3 + 1,
            "m" => dt.month() as i32,
            "y" => dt.ordinal() as i32,
            "d" => dt.day() as i32,
            "w" => dt.weekday().num_days_from_sunday() as i32 + 1,
            "ww" => dt.iso_week().week() as i32,
            "h" => dt.hour() as i32,
            "n" => dt.minute() as i32,
            "s" => dt.second() as i32,
            other => {
                return Err(EngineError::invalid_procedure_call(format!("unknown DatePart interval '{other}'")))
            }
        }))
    }));

    reg.declare_native("year", 1, 1, Rc::new(|_i, a| Ok(Value::Long(serial_to_datetime(coerce_to_date(&a[0])?).year()))));
    reg.declare_native("month", 1, 1, Rc::new(|_i, a| Ok(Value::Long(serial_to_datetime(coerce_to_date(&a[0])?).month() as i32))));
    reg.declare_native("day", 1, 1, Rc::new(|_i, a| Ok(Value::Long(serial_to_datetime(coerce_to_date(&a[0])?).day() as i32))));
    reg.declare_native("hour", 1, 1, Rc::new(|_i, a| Ok(Value::Long(serial_to_datetime(coerce_to_date(&a[0])?).hour() as i32))));
    reg.declare_native("minute", 1, 1, Rc::new(|_i, a| Ok(Value::Long(serial_to_datetime(coerce_to_date(&a[0])?).minute() as i32))));
    reg.declare_native("second", 1, 1, Rc::new(|_i, a| Ok(Value::Long(serial_to_datetime(coerce_to_date(&a[0])?).second() as i32))));

    reg.declare_native("weekday", 1, 1, Rc::new(|_i, a| {
        // vbSunday == 1, matching the dialect's default `FirstDayOfWeek`.
        let wd = serial_to_datetime(coerce_to_date(&a[0])?).weekday();
        Ok(Value::Long(wd.num_days_from_sunday() as i32 + 1))
    }));

    reg.declare_native("isdate", 1, 1, Rc::new(|_i, a| Ok(Value::Boolean(coerce_to_date(&a[0]).is_ok()))));

    reg.declare_native("monthname", 1, 2, Rc::new(|_i, a| {
        let m = crate::coerce::to_long(&a[0])?;
        let abbreviate = a.get(1).map(crate::coerce::to_bool).transpose()?.unwrap_or(false);
        Ok(Value::String(month_name(m, abbreviate)?))
    }));

    reg.declare_native("weekdayname", 1, 3, Rc::new(|_i, a| {
        let wd = crate::coerce::to_long(&a[0])?;
        let abbreviate = a.get(1).map(crate::coerce::to_bool).transpose()?.unwrap_or(false);
        Ok(Value::String(weekday_name(wd, abbreviate)?))
    }));

    reg.declare_native("timeserial", 3, 3, Rc::new(|_i, a| {
        let h = crate::coerce::to_long(&a[0])?;
        let m = crate::coerce::to_long(&a[1])?;
        let s = crate::coerce::to_long(&a[2])?;
        let seconds = h as i64 * 3600 + m as i64 * 60 + s as i64;
        Ok(Value::Date(seconds as f64 / 86_400.0))
    }));

    reg.declare_native("datevalue", 1, 1, Rc::new(|_i, a| {
        let text = to_display_string(&a[0])?;
        let serial = parse_date_text(text.trim())?;
        Ok(Value::Date(serial.trunc()))
    }));

    reg.declare_native("timevalue", 1, 1, Rc::new(|_i, a| {
        let text = to_display_string(&a[0])?;
        let serial = parse_date_text(text.trim())?;
        Ok(Value::Date(serial.fract()))
    }));

    reg.declare_native("timer", 0, 0, Rc::new(|_i, _a| {
        let now = chrono::Local::now().naive_local();
        let midnight = now.date().and_hms_opt(0, 0, 0).unwrap();
        Ok(Value::Double((now - midnight).num_milliseconds() as f64 / 1000.0))
    }));
}

fn month_name(month: i32, abbreviate: bool) -> Result<String, EngineError> {
    const NAMES: [&str; 12] = [
        "January", "February", "March", "April", "May", "June", "July", "August", "September", "October", "November",
        "December",
    ];
    let name = NAMES
        .get((month - 1) as usize)
        .ok_or_else(|| EngineError::invalid_procedure_call(format!("'{month}' is not a valid month")))?;
    Ok(if abbreviate { name[..3].to_string() } else { name.to_string() })
}

fn weekday_name(weekday: i32, abbreviate: bool) -> Result<String, EngineError> {
    const NAMES: [&str; 7] = ["Sunday", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday"];
    let name = NAMES
        .get((weekday - 1) as usize)
        .ok_or_else(|| EngineError::invalid_procedure_call(format!("'{weekday}' is not a valid weekday")))?;
    Ok(if abbreviate { name[..3].to_string() } else { name.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::Interpreter;

    fn call(reg: &ProcRegistry, interp: &mut Interpreter, name: &str, args: &[Value]) -> Value {
        reg.get(name).unwrap().call_native(interp, args).unwrap()
    }

    #[test]
    fn date_serial_round_trips_through_datetime() {
        let dt = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap().and_hms_opt(12, 0, 0).unwrap();
        let serial = datetime_to_serial(dt);
        let back = serial_to_datetime(serial);
        assert_eq!(back.date(), dt.date());
        assert_eq!(back.hour(), 12);
    }

    #[test]
    fn year_month_day_extract_from_a_date_serial() {
        let mut reg = ProcRegistry::new();
        register(&mut reg);
        let mut interp = Interpreter::new();
        let serial = parse_date_text("3/15/2020").unwrap();
        assert_eq!(call(&reg, &mut interp, "year", &[Value::Date(serial)]), Value::Long(2020));
        assert_eq!(call(&reg, &mut interp, "month", &[Value::Date(serial)]), Value::Long(3));
        assert_eq!(call(&reg, &mut interp, "day", &[Value::Date(serial)]), Value::Long(15));
    }

    #[test]
    fn datepart_reports_quarter_and_day_of_year() {
        let mut reg = ProcRegistry::new();
        register(&mut reg);
        let mut interp = Interpreter::new();
        let d = Value::Date(parse_date_text("3/15/2020").unwrap());
        assert_eq!(call(&reg, &mut interp, "datepart", &[Value::String("q".into()), d.clone()]), Value::Long(1));
        assert_eq!(call(&reg, &mut interp, "datepart", &[Value::String("m".into()), d]), Value::Long(3));
    }

    #[test]
    fn datediff_in_days_counts_whole_days() {
        let mut reg = ProcRegistry::new();
        register(&mut reg);
        let mut interp = Interpreter::new();
        let d1 = Value::Date(parse_date_text("1/1/2020").unwrap());
        let d2 = Value::Date(parse_date_text("1/11/2020").unwrap());
        assert_eq!(call(&reg, &mut interp, "datediff", &[Value::String("d".into()), d1, d2]), Value::Long(10));
    }

    #[test]
    fn isdate_rejects_unparseable_text() {
        let mut reg = ProcRegistry::new();
        register(&mut reg);
        let mut interp = Interpreter::new();
        assert_eq!(call(&reg, &mut interp, "isdate", &[Value::String("not a date".into())]), Value::Boolean(false));
    }

    #[test]
    fn monthname_and_weekdayname_support_abbreviation() {
        let mut reg = ProcRegistry::new();
        register(&mut reg);
        let mut interp = Interpreter::new();
        assert_eq!(call(&reg, &mut interp, "monthname", &[Value::Long(3)]), Value::String("March".into()));
        assert_eq!(
            call(&reg, &mut interp, "monthname", &[Value::Long(3), Value::Boolean(true)]),
            Value::String("Mar".into())
        );
        assert_eq!(call(&reg, &mut interp, "weekdayname", &[Value::Long(1)]), Value::String("Sunday".into()));
    }

    #[test]
    fn timeserial_builds_a_fractional_day_from_hms() {
        let mut reg = ProcRegistry::new();
        register(&mut reg);
        let mut interp = Interpreter::new();
        let serial = call(&reg, &mut interp, "timeserial", &[Value::Long(12), Value::Long(0), Value::Long(0)]);
        assert_eq!(serial, Value::Date(0.5));
    }

    #[test]
    fn datevalue_and_timevalue_split_a_datetime_string() {
        let mut reg = ProcRegistry::new();
        register(&mut reg);
        let mut interp = Interpreter::new();
        let text = Value::String("3/15/2020 12:00:00 PM".into());
        match call(&reg, &mut interp, "datevalue", &[text.clone()]) {
            Value::Date(d) => assert_eq!(d, d.trunc()),
            other => panic!("expected Date, got {other:?}"),
        }
        match call(&reg, &mut interp, "timevalue", &[text]) {
            Value::Date(t) => assert!((t - 0.5).abs() < 1e-9),
            other => panic!("expected Date, got {other:?}"),
        }
    }
}
