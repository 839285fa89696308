//! Validation and canonicalization engine.
//!
//! One entry point, [`validate`], dispatching on the parameter kind. On
//! success it returns the canonical stored form; on failure it returns the
//! parameter's default (already canonicalized) together with a structured
//! reason that renders to a one-line display message.

use core::fmt::Write;

use crate::format::canonical_time;
use crate::params::{CHOICE_LABELS, ParamKind, ParamSpec, Value, value_from};

/// Why an input was rejected.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Reason {
    /// Numeric input outside the rule's bounds.
    Range { min: f32, max: f32, decimals: u8 },
    /// Input that does not parse as a number at all.
    NotANumber,
    /// Date with a month outside 1..=12 or malformed digits.
    BadMonth,
    /// Date with day 0.
    BadDay,
    /// Day past the month's length (30-day months and the 31 cap).
    MonthLength { days: u8 },
    /// Day past February's length for the given year.
    FebLength { days: u8 },
    /// Malformed or out-of-range time.
    BadTime,
    /// Password that is not exactly eight digits.
    BadPassword,
}

impl Reason {
    /// Render for the 16-column display row.
    pub fn message(&self) -> Value {
        let mut out = Value::new();
        let _ = match self {
            Reason::Range { min, max, decimals } if *decimals > 0 => {
                write!(out, "Range {:.2$}-{:.2$}", min, max, *decimals as usize)
            }
            Reason::Range { min, max, .. } => {
                write!(out, "Range {} to {}", *min as i32, *max as i32)
            }
            Reason::NotANumber => write!(out, "Invalid number"),
            Reason::BadMonth => write!(out, "Invalid month"),
            Reason::BadDay => write!(out, "Invalid day"),
            Reason::MonthLength { days } => write!(out, "Max {} days", days),
            Reason::FebLength { days } => write!(out, "Feb has {} days", days),
            Reason::BadTime => write!(out, "Invalid time"),
            Reason::BadPassword => write!(out, "Need 8 digits"),
        };
        out
    }
}

/// A rejected input: the substituted fallback plus the reason.
#[derive(Debug, PartialEq)]
pub struct Invalid {
    pub fallback: Value,
    pub reason: Reason,
}

/// Validate a raw input against a parameter's rules and return its
/// canonical stored form, or the parameter's default and the violation.
pub fn validate(spec: &ParamSpec, raw: &str) -> Result<Value, Invalid> {
    match spec.kind {
        ParamKind::Number => validate_number(spec, raw),
        ParamKind::Decimal => validate_decimal(spec, raw),
        ParamKind::Date => validate_date(raw),
        ParamKind::Time => validate_time(raw),
        ParamKind::EnableDisable => Ok(validate_enable_disable(raw)),
        ParamKind::MultipleChoice => Ok(validate_choice(raw)),
        ParamKind::Password => validate_password(spec, raw),
    }
}

/// The canonical form of a parameter's default value.
pub fn canonical_default(spec: &ParamSpec) -> Value {
    match validate(spec, spec.default_value) {
        Ok(value) => value,
        Err(invalid) => invalid.fallback,
    }
}

fn validate_number(spec: &ParamSpec, raw: &str) -> Result<Value, Invalid> {
    let reject = |reason| Invalid {
        fallback: value_from(spec.default_value),
        reason,
    };

    let value: i32 = raw.parse().map_err(|_| reject(Reason::NotANumber))?;
    if (value as f32) < spec.rules.min || (value as f32) > spec.rules.max {
        return Err(reject(Reason::Range {
            min: spec.rules.min,
            max: spec.rules.max,
            decimals: 0,
        }));
    }

    let mut out = Value::new();
    let _ = write!(out, "{}", value);
    Ok(out)
}

fn validate_decimal(spec: &ParamSpec, raw: &str) -> Result<Value, Invalid> {
    let reject = |reason| Invalid {
        fallback: value_from(spec.default_value),
        reason,
    };

    let value: f32 = raw.parse().map_err(|_| reject(Reason::NotANumber))?;
    if !value.is_finite() {
        return Err(reject(Reason::NotANumber));
    }
    if value < spec.rules.min || value > spec.rules.max {
        return Err(reject(Reason::Range {
            min: spec.rules.min,
            max: spec.rules.max,
            decimals: spec.rules.decimal_places,
        }));
    }

    // Re-render to the configured number of decimal places.
    let mut out = Value::new();
    let _ = write!(out, "{:.1$}", value, spec.rules.decimal_places as usize);
    Ok(out)
}

fn two_digits(s: &str, at: usize) -> Option<u8> {
    let chunk = s.get(at..at + 2)?;
    if chunk.bytes().all(|b| b.is_ascii_digit()) {
        chunk.parse().ok()
    } else {
        None
    }
}

/// DDMMYY. Canonical form is the raw six digits; rendering adds slashes.
fn validate_date(raw: &str) -> Result<Value, Invalid> {
    const DEFAULT_DATE: &str = "010123";
    let reject = |reason| Invalid {
        fallback: value_from(DEFAULT_DATE),
        reason,
    };

    if raw.len() != 6 {
        return Err(reject(Reason::BadDay));
    }
    let day = two_digits(raw, 0).ok_or_else(|| reject(Reason::BadDay))?;
    let month = two_digits(raw, 2).ok_or_else(|| reject(Reason::BadMonth))?;
    let year = two_digits(raw, 4).ok_or_else(|| reject(Reason::BadDay))?;

    if !(1..=12).contains(&month) {
        return Err(reject(Reason::BadMonth));
    }
    if day == 0 {
        return Err(reject(Reason::BadDay));
    }

    // 30-day months, February with the two-digit mod-4 leap check, 31 otherwise.
    if month == 2 {
        let feb_days = if year % 4 == 0 { 29 } else { 28 };
        if day > feb_days {
            return Err(reject(Reason::FebLength { days: feb_days }));
        }
    } else {
        let max_days = if matches!(month, 4 | 6 | 9 | 11) { 30 } else { 31 };
        if day > max_days {
            return Err(reject(Reason::MonthLength { days: max_days }));
        }
    }

    Ok(value_from(raw))
}

/// Accepts `HH:MM` or raw `HHMM`; canonical form is `HH:MM`.
fn validate_time(raw: &str) -> Result<Value, Invalid> {
    let reject = || Invalid {
        fallback: value_from("00:00"),
        reason: Reason::BadTime,
    };

    let (hour, minute) = if raw.len() == 5 && raw.as_bytes()[2] == b':' {
        (two_digits(raw, 0), two_digits(raw, 3))
    } else if raw.len() == 4 {
        (two_digits(raw, 0), two_digits(raw, 2))
    } else {
        (None, None)
    };

    match (hour, minute) {
        (Some(h), Some(m)) if h <= 23 && m <= 59 => Ok(canonical_time(h, m)),
        _ => Err(reject()),
    }
}

/// Canonical stored form is the text `Enable`/`Disable`. Numeric `0`/`1`
/// and the texts themselves are accepted; anything else falls back to
/// `Disable` without raising an error.
fn validate_enable_disable(raw: &str) -> Value {
    match raw {
        "1" | "Enable" => value_from("Enable"),
        _ => value_from("Disable"),
    }
}

/// Selector 0..=3 or an existing label; out of range maps to the first.
fn validate_choice(raw: &str) -> Value {
    if let Some(label) = CHOICE_LABELS.iter().find(|l| **l == raw) {
        return value_from(label);
    }
    let selector: usize = raw.parse().unwrap_or(0);
    value_from(CHOICE_LABELS.get(selector).unwrap_or(&CHOICE_LABELS[0]))
}

fn validate_password(spec: &ParamSpec, raw: &str) -> Result<Value, Invalid> {
    let expected = spec.rules.max_len as usize;
    if raw.len() == expected && raw.bytes().all(|b| b.is_ascii_digit()) {
        Ok(value_from(raw))
    } else {
        Err(Invalid {
            fallback: value_from(spec.default_value),
            reason: Reason::BadPassword,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{PARAMETERS, PASSWORD_INDEX};

    fn spec(label: &str) -> &'static ParamSpec {
        PARAMETERS
            .iter()
            .find(|p| p.label.contains(label))
            .expect("parameter in table")
    }

    #[test]
    fn date_accepts_and_keeps_raw_digits() {
        assert_eq!(validate_date("010123").unwrap(), "010123");
        assert_eq!(validate_date("311299").unwrap(), "311299");
    }

    #[test]
    fn date_day_32_rejects_to_default() {
        let err = validate_date("320123").unwrap_err();
        assert_eq!(err.fallback, "010123");
        assert_eq!(err.reason, Reason::MonthLength { days: 31 });
    }

    #[test]
    fn date_leap_year_february() {
        assert_eq!(validate_date("290224").unwrap(), "290224");
        let err = validate_date("290223").unwrap_err();
        assert_eq!(err.fallback, "010123");
        assert_eq!(err.reason, Reason::FebLength { days: 28 });
    }

    #[test]
    fn date_thirty_day_month() {
        let err = validate_date("310423").unwrap_err();
        assert_eq!(err.reason, Reason::MonthLength { days: 30 });
        assert!(validate_date("300423").is_ok());
    }

    #[test]
    fn date_month_zero_and_thirteen_reject() {
        assert_eq!(validate_date("010023").unwrap_err().reason, Reason::BadMonth);
        assert_eq!(validate_date("011323").unwrap_err().reason, Reason::BadMonth);
        assert_eq!(validate_date("000123").unwrap_err().reason, Reason::BadDay);
    }

    #[test]
    fn time_rejects_bad_minute_to_default() {
        let err = validate_time("2361").unwrap_err();
        assert_eq!(err.fallback, "00:00");
        assert_eq!(err.reason, Reason::BadTime);
    }

    #[test]
    fn time_canonicalizes_both_forms_identically() {
        assert_eq!(validate_time("0959").unwrap(), "09:59");
        assert_eq!(validate_time("09:59").unwrap(), "09:59");
        assert_eq!(validate_time("0000").unwrap(), "00:00");
        assert_eq!(validate_time("2359").unwrap(), "23:59");
    }

    #[test]
    fn decimal_out_of_range_resets_to_default() {
        let hi_volt = spec("Hi Volt");
        let err = validate(hi_volt, "1500").unwrap_err();
        assert_eq!(err.fallback, "280.0");
        assert_eq!(err.reason.message(), "Range 0.0-999.9");
    }

    #[test]
    fn decimal_renders_configured_places() {
        let hi_volt = spec("Hi Volt");
        assert_eq!(validate(hi_volt, "280").unwrap(), "280.0");
        assert_eq!(validate(hi_volt, "12.34").unwrap(), "12.3");
        assert_eq!(validate(hi_volt, "999.9").unwrap(), "999.9");
    }

    #[test]
    fn decimal_non_numeric_treated_as_failure() {
        let hi_volt = spec("Hi Volt");
        let err = validate(hi_volt, "28a.0").unwrap_err();
        assert_eq!(err.reason, Reason::NotANumber);
        assert_eq!(err.fallback, "280.0");
    }

    #[test]
    fn number_range_includes_negatives_where_allowed() {
        let backset = spec("BackSet");
        assert_eq!(validate(backset, "-99").unwrap(), "-99");
        let err = validate(backset, "-100").unwrap_err();
        assert_eq!(err.reason.message(), "Range -99 to 99");
        assert_eq!(err.fallback, "0");
    }

    #[test]
    fn enable_disable_canonicalizes() {
        let alarm = spec("Alarm");
        assert_eq!(validate(alarm, "1").unwrap(), "Enable");
        assert_eq!(validate(alarm, "0").unwrap(), "Disable");
        assert_eq!(validate(alarm, "Enable").unwrap(), "Enable");
        assert_eq!(validate(alarm, "garbage").unwrap(), "Disable");
    }

    #[test]
    fn choice_selector_and_labels() {
        let protect = spec("Protect");
        assert_eq!(validate(protect, "0").unwrap(), "All");
        assert_eq!(validate(protect, "2").unwrap(), "Curr");
        assert_eq!(validate(protect, "3").unwrap(), "None");
        // Out-of-range selector maps to the first label.
        assert_eq!(validate(protect, "7").unwrap(), "All");
        // Canonical labels survive re-validation.
        assert_eq!(validate(protect, "Volt").unwrap(), "Volt");
    }

    #[test]
    fn password_shape_is_enforced() {
        let password = &PARAMETERS[PASSWORD_INDEX];
        assert_eq!(validate(password, "12345678").unwrap(), "12345678");
        let short = validate(password, "1234").unwrap_err();
        assert_eq!(short.fallback, "00000000");
        let alpha = validate(password, "1234567a").unwrap_err();
        assert_eq!(alpha.reason, Reason::BadPassword);
    }

    #[test]
    fn canonical_values_are_stable_under_revalidation() {
        for spec in PARAMETERS.iter() {
            let canonical = canonical_default(spec);
            let again = validate(spec, canonical.as_str()).unwrap();
            assert_eq!(again, canonical, "{}", spec.label);
        }
    }
}
