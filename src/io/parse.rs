//! Cell-level parsing rules for the two derived fields.
//!
//! Neither function fails: a cell that cannot be read becomes `NaN` (amount)
//! or `None` (date), and later stages leave that row out of the computations
//! that need the field.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::domain::CellValue;

/// Serial number of 1970-01-01 in the 1900-based spreadsheet date system.
pub const UNIX_EPOCH_SERIAL: f64 = 25569.0;

const MS_PER_DAY: f64 = 86_400_000.0;

// Slash and dash dates are read month-first. Day-first is only reached when
// the leading field cannot be a month (`15/03/2024`).
const DATETIME_FMTS: [&str; 10] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

// `%B` accepts full and abbreviated English month names.
const DATE_FMTS: [&str; 9] = [
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%m-%d-%Y",
    "%d-%m-%Y",
    "%Y/%m/%d",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
];

/// Normalize a sale amount.
///
/// The cell is rendered as text, the first `,` becomes `.`, every character
/// other than an ASCII digit or `.` is dropped, and the longest leading
/// `digits[.digits]` prefix is parsed. A minus sign is dropped like any other
/// symbol, and dotted thousands separators are not understood:
/// `"1.234,56"` reads as `1.234`.
pub fn parse_amount(cell: &CellValue) -> f64 {
    let text = match cell {
        CellValue::Text(s) => s.clone(),
        CellValue::Number(v) => v.to_string(),
        CellValue::Empty | CellValue::Bool(_) => return f64::NAN,
    };
    parse_float_prefix(&normalize_amount_text(&text))
}

/// Apply the comma/strip rule without parsing.
pub fn normalize_amount_text(text: &str) -> String {
    text.replacen(',', ".", 1)
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect()
}

/// Parse the longest numeric prefix of a digits-and-dots string.
fn parse_float_prefix(s: &str) -> f64 {
    let mut end = s.len();
    let mut seen_dot = false;
    for (idx, ch) in s.char_indices() {
        if ch == '.' {
            if seen_dot {
                end = idx;
                break;
            }
            seen_dot = true;
        }
    }
    let prefix = &s[..end];
    if !prefix.bytes().any(|b| b.is_ascii_digit()) {
        return f64::NAN;
    }

    let prefix = prefix.trim_end_matches('.');
    let padded;
    let prefix = if prefix.starts_with('.') {
        padded = format!("0{prefix}");
        padded.as_str()
    } else {
        prefix
    };
    prefix.parse::<f64>().unwrap_or(f64::NAN)
}

/// Parse an invoice date.
///
/// Numbers are spreadsheet serials (serial 25569 is 1970-01-01 UTC); text is
/// tried against a fixed set of formats, all read as UTC. `01/02/2024` is
/// January 2nd; `15/03/2024` falls back to day-first; `March 5, 2024` and
/// `5 Mar 2024` are accepted.
pub fn parse_date(cell: &CellValue) -> Option<DateTime<Utc>> {
    match cell {
        CellValue::Number(serial) => serial_to_datetime(*serial),
        CellValue::Text(s) => parse_date_text(s.trim()),
        CellValue::Empty | CellValue::Bool(_) => None,
    }
}

/// Convert a spreadsheet serial to a UTC instant, rounded to the millisecond.
pub fn serial_to_datetime(serial: f64) -> Option<DateTime<Utc>> {
    if !serial.is_finite() {
        return None;
    }
    let ms = ((serial - UNIX_EPOCH_SERIAL) * MS_PER_DAY).round();
    if ms.abs() > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp_millis(ms as i64)
}

fn parse_date_text(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in DATETIME_FMTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc());
        }
    }
    for fmt in DATE_FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Timelike};

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn amount_plain_and_numeric() {
        assert_eq!(parse_amount(&text("1234.56")), 1234.56);
        assert_eq!(parse_amount(&CellValue::Number(1234.56)), 1234.56);
        assert_eq!(parse_amount(&CellValue::Number(0.0)), 0.0);
    }

    #[test]
    fn amount_is_stable_on_normalized_text() {
        let once = parse_amount(&text("1234.56"));
        let twice = parse_amount(&text(&once.to_string()));
        assert_eq!(once, twice);
    }

    #[test]
    fn amount_decimal_comma_and_symbols() {
        assert_eq!(parse_amount(&text("1234,56")), 1234.56);
        assert_eq!(parse_amount(&text("$ 1234,50 €")), 1234.5);
        assert_eq!(parse_amount(&text("EUR 99")), 99.0);
    }

    #[test]
    fn amount_dotted_thousands_is_lossy() {
        assert_eq!(normalize_amount_text("1.234,56"), "1.234.56");
        assert_eq!(parse_amount(&text("1.234,56")), 1.234);
        // Only the first comma is rewritten.
        assert_eq!(normalize_amount_text("1,234,56"), "1.23456");
        assert_eq!(parse_amount(&text("1,234,56")), 1.23456);
    }

    #[test]
    fn amount_drops_minus_sign() {
        assert_eq!(parse_amount(&text("-15.5")), 15.5);
        assert_eq!(parse_amount(&CellValue::Number(-3.0)), 3.0);
    }

    #[test]
    fn amount_unparseable_is_nan() {
        assert!(parse_amount(&text("n/a")).is_nan());
        assert!(parse_amount(&text("")).is_nan());
        assert!(parse_amount(&text(".")).is_nan());
        assert!(parse_amount(&CellValue::Empty).is_nan());
        assert!(parse_amount(&CellValue::Bool(true)).is_nan());
    }

    #[test]
    fn amount_leading_and_trailing_dot() {
        assert_eq!(parse_amount(&text(".5")), 0.5);
        assert_eq!(parse_amount(&text("5.")), 5.0);
    }

    #[test]
    fn serial_epoch_boundaries() {
        let epoch = parse_date(&CellValue::Number(25569.0)).unwrap();
        assert_eq!(epoch, Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(epoch.timestamp_millis(), 0);

        let zero = parse_date(&CellValue::Number(0.0)).unwrap();
        assert_eq!(zero.date_naive(), NaiveDate::from_ymd_opt(1899, 12, 30).unwrap());
        assert_eq!(zero.hour(), 0);
    }

    #[test]
    fn serial_with_time_fraction() {
        let dt = parse_date(&CellValue::Number(45292.5)).unwrap();
        assert_eq!(dt.date_naive(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(dt.hour(), 12);
    }

    #[test]
    fn serial_non_finite_is_none() {
        assert!(parse_date(&CellValue::Number(f64::NAN)).is_none());
        assert!(parse_date(&CellValue::Number(f64::INFINITY)).is_none());
    }

    #[test]
    fn text_dates() {
        let iso = parse_date(&text("2024-03-15")).unwrap();
        assert_eq!((iso.year(), iso.month(), iso.day()), (2024, 3, 15));
        assert_eq!(iso.hour(), 0);

        let dmy = parse_date(&text("15/03/2024")).unwrap();
        assert_eq!(dmy, iso);

        let rfc = parse_date(&text("2024-03-15T10:00:00+02:00")).unwrap();
        assert_eq!(rfc.hour(), 8);

        let naive = parse_date(&text("2024-03-15 10:30")).unwrap();
        assert_eq!((naive.hour(), naive.minute()), (10, 30));
    }

    #[test]
    fn slash_dates_are_month_first() {
        let md = parse_date(&text("01/02/2024")).unwrap();
        assert_eq!((md.year(), md.month(), md.day()), (2024, 1, 2));

        let dashed = parse_date(&text("01-02-2024")).unwrap();
        assert_eq!(dashed, md);

        let timed = parse_date(&text("03/04/2024 18:45")).unwrap();
        assert_eq!((timed.month(), timed.day(), timed.hour()), (3, 4, 18));

        // A leading field above 12 cannot be a month.
        let late = parse_date(&text("25/12/2024 08:00:00")).unwrap();
        assert_eq!((late.month(), late.day(), late.hour()), (12, 25, 8));
    }

    #[test]
    fn month_name_dates() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap();
        assert_eq!(parse_date(&text("March 5, 2024")), Some(expected));
        assert_eq!(parse_date(&text("Mar 5, 2024")), Some(expected));
        assert_eq!(parse_date(&text("march 05 2024")), Some(expected));
        assert_eq!(parse_date(&text("5 March 2024")), Some(expected));
        assert!(parse_date(&text("Smarch 5, 2024")).is_none());
    }

    #[test]
    fn bad_dates_are_none() {
        assert!(parse_date(&text("not a date")).is_none());
        assert!(parse_date(&text("31/02/2024")).is_none());
        assert!(parse_date(&text("   ")).is_none());
        assert!(parse_date(&CellValue::Empty).is_none());
        assert!(parse_date(&CellValue::Bool(false)).is_none());
    }
}
