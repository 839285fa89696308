//! Display-side rendering of parameter values.
//!
//! Purely presentational: canonical values (and in-progress edit buffers of
//! fewer digits than the full field) are turned into what the second display
//! row shows. Separators are inserted for dates and times, which is also why
//! cursor placement needs the offset helper at the bottom.

use core::fmt::Write;

use crate::params::{CHOICE_LABELS, ParamKind, Value, value_from};

/// Canonical `HH:MM` rendering of an hour/minute pair.
pub fn canonical_time(hour: u8, minute: u8) -> Value {
    let mut out = Value::new();
    let _ = write!(out, "{:02}:{:02}", hour, minute);
    out
}

/// Canonical `DDMMYY` rendering of a day/month/year triple.
pub fn canonical_date(day: u8, month: u8, year: u8) -> Value {
    let mut out = Value::new();
    let _ = write!(out, "{:02}{:02}{:02}", day, month, year);
    out
}

/// Render a canonical value or partial edit buffer for the display.
///
/// Dates show as `DD/MM/YY`, times as `HH:MM`, with partial inputs rendered
/// as far as they go (`"123"` becomes `"12/3"`). Everything else passes
/// through, with flags and choice selectors mapped to their labels.
pub fn format_for_display(kind: ParamKind, raw: &str) -> Value {
    match kind {
        ParamKind::Date => with_separators(raw, &[2, 4], '/'),
        ParamKind::Time if raw.contains(':') => value_from(raw),
        ParamKind::Time => with_separators(raw, &[2], ':'),
        ParamKind::EnableDisable => match raw {
            "1" => value_from("Enable"),
            "0" => value_from("Disable"),
            other => value_from(other),
        },
        ParamKind::MultipleChoice => match raw.parse::<usize>() {
            Ok(selector) if selector < CHOICE_LABELS.len() => value_from(CHOICE_LABELS[selector]),
            _ => value_from(raw),
        },
        _ => value_from(raw),
    }
}

/// Cursor offset within the rendered value for an edit buffer of `len`
/// keystrokes, accounting for the separators the rendering inserts.
pub fn cursor_offset(kind: ParamKind, len: usize) -> usize {
    match kind {
        ParamKind::Time => {
            if len < 2 {
                len
            } else {
                len + 1
            }
        }
        ParamKind::Date => {
            if len < 2 {
                len
            } else if len < 4 {
                len + 1
            } else {
                len + 2
            }
        }
        _ => len,
    }
}

fn with_separators(raw: &str, after: &[usize], separator: char) -> Value {
    let mut out = Value::new();
    for (i, ch) in raw.chars().enumerate() {
        let _ = out.push(ch);
        if after.contains(&(i + 1)) {
            let _ = out.push(separator);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_date_renders_with_slashes() {
        assert_eq!(format_for_display(ParamKind::Date, "010123"), "01/01/23");
    }

    #[test]
    fn partial_date_renders_as_far_as_typed() {
        assert_eq!(format_for_display(ParamKind::Date, "0"), "0");
        assert_eq!(format_for_display(ParamKind::Date, "01"), "01/");
        assert_eq!(format_for_display(ParamKind::Date, "010"), "01/0");
        assert_eq!(format_for_display(ParamKind::Date, "0101"), "01/01/");
        assert_eq!(format_for_display(ParamKind::Date, "01012"), "01/01/2");
    }

    #[test]
    fn time_renders_both_canonical_and_raw() {
        assert_eq!(format_for_display(ParamKind::Time, "09:59"), "09:59");
        assert_eq!(format_for_display(ParamKind::Time, "0959"), "09:59");
        assert_eq!(format_for_display(ParamKind::Time, "09"), "09:");
        assert_eq!(format_for_display(ParamKind::Time, "095"), "09:5");
        assert_eq!(format_for_display(ParamKind::Time, "9"), "9");
    }

    #[test]
    fn flags_and_choices_map_to_labels() {
        assert_eq!(
            format_for_display(ParamKind::EnableDisable, "1"),
            "Enable"
        );
        assert_eq!(
            format_for_display(ParamKind::EnableDisable, "Disable"),
            "Disable"
        );
        assert_eq!(format_for_display(ParamKind::MultipleChoice, "2"), "Curr");
        assert_eq!(format_for_display(ParamKind::MultipleChoice, "Volt"), "Volt");
    }

    #[test]
    fn plain_kinds_pass_through() {
        assert_eq!(format_for_display(ParamKind::Decimal, "280.0"), "280.0");
        assert_eq!(format_for_display(ParamKind::Number, "-99"), "-99");
        assert_eq!(format_for_display(ParamKind::Password, "00000000"), "00000000");
    }

    #[test]
    fn cursor_offsets_account_for_separators() {
        // Time: HH:MM — colon appears after the second digit.
        assert_eq!(cursor_offset(ParamKind::Time, 1), 1);
        assert_eq!(cursor_offset(ParamKind::Time, 2), 3);
        assert_eq!(cursor_offset(ParamKind::Time, 4), 5);
        // Date: DD/MM/YY — slashes after the second and fourth digits.
        assert_eq!(cursor_offset(ParamKind::Date, 1), 1);
        assert_eq!(cursor_offset(ParamKind::Date, 2), 3);
        assert_eq!(cursor_offset(ParamKind::Date, 3), 4);
        assert_eq!(cursor_offset(ParamKind::Date, 4), 6);
        assert_eq!(cursor_offset(ParamKind::Date, 6), 8);
        // Plain values have no separators.
        assert_eq!(cursor_offset(ParamKind::Decimal, 3), 3);
    }

    #[test]
    fn canonical_helpers_zero_pad() {
        assert_eq!(canonical_time(9, 5), "09:05");
        assert_eq!(canonical_date(1, 1, 23), "010123");
    }
}
