//! The fixed parameter table of the panel.
//!
//! Every operational parameter the panel exposes is described by one
//! [`ParamSpec`] entry. The table is immutable at run time; only the value
//! store in the firmware mutates. Exactly one storage backend per parameter,
//! fixed at definition time.

/// Number of parameters the panel exposes.
pub const PARAM_COUNT: usize = 25;

/// Maximum length of a canonical value string. Key-value storage caps
/// values at this many bytes, so everything else follows suit.
pub const VALUE_CAP: usize = 16;

/// Canonical parameter value. Always either empty-until-loaded or a string
/// that satisfies its parameter's validation rules.
pub type Value = heapless::String<VALUE_CAP>;

/// Labels for the multiple-choice protection mode, indexed by selector.
pub const CHOICE_LABELS: [&str; 4] = ["All", "Volt", "Curr", "None"];

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ParamKind {
    Number,
    Decimal,
    Date,
    Time,
    EnableDisable,
    MultipleChoice,
    Password,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ParamGroup {
    DateTime,
    Protection,
    Staggering,
    CivilTwilight,
    System,
}

/// Storage backend a parameter is routed to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Backend {
    Rtc,
    Eeprom,
    KeyValue,
}

/// Validation rules for one parameter.
#[derive(Clone, Copy, Debug)]
pub struct Rules {
    pub min_len: u8,
    pub max_len: u8,
    pub min: f32,
    pub max: f32,
    pub decimal_places: u8,
    pub allow_negative: bool,
    /// Password only: attempts before the timed lockout kicks in.
    pub max_retries: u8,
    /// Password only: lockout duration in seconds.
    pub lockout_secs: u16,
}

impl Rules {
    const fn number(min_len: u8, max_len: u8, min: f32, max: f32, allow_negative: bool) -> Self {
        Self {
            min_len,
            max_len,
            min,
            max,
            decimal_places: 0,
            allow_negative,
            max_retries: 0,
            lockout_secs: 0,
        }
    }

    const fn decimal(min_len: u8, max_len: u8, min: f32, max: f32) -> Self {
        Self {
            min_len,
            max_len,
            min,
            max,
            decimal_places: 1,
            allow_negative: false,
            max_retries: 0,
            lockout_secs: 0,
        }
    }

    const fn time() -> Self {
        Self::number(4, 4, 0.0, 2359.0, false)
    }

    const fn date() -> Self {
        Self::number(6, 6, 0.0, 311299.0, false)
    }

    const fn flag() -> Self {
        Self::number(1, 1, 0.0, 1.0, false)
    }

    const fn choice() -> Self {
        Self::number(1, 1, 0.0, 3.0, false)
    }

    const fn password(max_retries: u8, lockout_secs: u16) -> Self {
        Self {
            min_len: 8,
            max_len: 8,
            min: 0.0,
            max: 0.0,
            decimal_places: 0,
            allow_negative: false,
            max_retries,
            lockout_secs,
        }
    }
}

/// Static descriptor of one panel parameter.
pub struct ParamSpec {
    /// Stable identifier; doubles as the storage address for the
    /// register- and slot-addressed backends.
    pub id: u16,
    pub label: &'static str,
    pub kind: ParamKind,
    pub group: ParamGroup,
    pub backend: Backend,
    pub default_value: &'static str,
    pub rules: Rules,
}

const fn p(
    id: u16,
    label: &'static str,
    kind: ParamKind,
    group: ParamGroup,
    backend: Backend,
    default_value: &'static str,
    rules: Rules,
) -> ParamSpec {
    ParamSpec {
        id,
        label,
        kind,
        group,
        backend,
        default_value,
        rules,
    }
}

use Backend::{Eeprom, KeyValue, Rtc};
use ParamGroup::{CivilTwilight, DateTime, Protection, Staggering, System};
use ParamKind::{Date, Decimal, EnableDisable, MultipleChoice, Number, Password, Time};

#[rustfmt::skip]
pub static PARAMETERS: [ParamSpec; PARAM_COUNT] = [
    p( 1, "01.Time:",     Time,           DateTime,      Rtc,      "0000",     Rules::time()),
    p( 2, "02.Date:",     Date,           DateTime,      Rtc,      "010123",   Rules::date()),
    p( 3, "03.Hi Volt:",  Decimal,        Protection,    Eeprom,   "280.0",    Rules::decimal(3, 5, 0.0, 999.9)),
    p( 4, "04.Lo Volt:",  Decimal,        Protection,    KeyValue, "180.0",    Rules::decimal(3, 5, 0.0, 999.9)),
    p( 5, "05.R-Low A:",  Decimal,        Protection,    KeyValue, "1.0",      Rules::decimal(1, 3, 0.0, 9.9)),
    p( 6, "06.Y-Low A:",  Decimal,        Protection,    KeyValue, "1.0",      Rules::decimal(1, 3, 0.0, 9.9)),
    p( 7, "07.B-Low A:",  Decimal,        Protection,    KeyValue, "1.0",      Rules::decimal(1, 3, 0.0, 9.9)),
    p( 8, "08.OC %:",     Number,         Protection,    KeyValue, "25",       Rules::number(1, 3, 0.0, 999.0, false)),
    p( 9, "09.Alarm:",    EnableDisable,  Protection,    KeyValue, "0",        Rules::flag()),
    p(10, "10.Protect:",  MultipleChoice, Protection,    KeyValue, "0",        Rules::choice()),
    p(11, "11.Rotate:",   EnableDisable,  Staggering,    KeyValue, "0",        Rules::flag()),
    p(12, "12.R On Tm:",  Time,           Staggering,    KeyValue, "0000",     Rules::time()),
    p(13, "13.Y On Tm:",  Time,           Staggering,    KeyValue, "0000",     Rules::time()),
    p(14, "14.B On Tm:",  Time,           Staggering,    KeyValue, "0000",     Rules::time()),
    p(15, "15.R OffTm:",  Time,           Staggering,    KeyValue, "0000",     Rules::time()),
    p(16, "16.Y OffTm:",  Time,           Staggering,    KeyValue, "0000",     Rules::time()),
    p(17, "17.B OffTm:",  Time,           Staggering,    KeyValue, "0000",     Rules::time()),
    p(18, "18.BackSet:",  Number,         CivilTwilight, KeyValue, "0",        Rules::number(1, 3, -99.0, 99.0, true)),
    p(19, "19.BackRise:", Number,         CivilTwilight, KeyValue, "0",        Rules::number(1, 3, -99.0, 99.0, true)),
    p(20, "20.JanDusk:",  Time,           CivilTwilight, KeyValue, "0000",     Rules::time()),
    p(21, "21.JanDawn:",  Time,           CivilTwilight, KeyValue, "0000",     Rules::time()),
    p(22, "22.DecDusk:",  Time,           CivilTwilight, KeyValue, "0000",     Rules::time()),
    p(23, "23.DecDawn:",  Time,           CivilTwilight, KeyValue, "0000",     Rules::time()),
    p(24, "24.Password:", Password,       System,        KeyValue, "00000000", Rules::password(3, 15)),
    p(25, "25.PassED:",   EnableDisable,  System,        KeyValue, "0",        Rules::flag()),
];

/// Index of `01.Time:` in [`PARAMETERS`].
pub const TIME_INDEX: usize = 0;
/// Index of `02.Date:` in [`PARAMETERS`].
pub const DATE_INDEX: usize = 1;
/// Index of `24.Password:` in [`PARAMETERS`].
pub const PASSWORD_INDEX: usize = 23;
/// Index of `25.PassED:` in [`PARAMETERS`].
pub const PASSWORD_ENABLE_INDEX: usize = 24;

/// Next parameter index, wrapping at the end of the table.
pub fn next_index(index: usize) -> usize {
    (index + 1) % PARAM_COUNT
}

/// Previous parameter index, wrapping at the start of the table.
pub fn prev_index(index: usize) -> usize {
    if index == 0 { PARAM_COUNT - 1 } else { index - 1 }
}

/// Key under which a key-value-backed parameter is stored: its display
/// label, zero-padded to a fixed width.
pub fn kv_key(spec: &ParamSpec) -> [u8; VALUE_CAP] {
    let mut key = [0u8; VALUE_CAP];
    let label = spec.label.as_bytes();
    let n = label.len().min(VALUE_CAP);
    key[..n].copy_from_slice(&label[..n]);
    key
}

/// Copy a `&str` into a fixed-capacity value, truncating past the cap.
pub fn value_from(s: &str) -> Value {
    let mut value = Value::new();
    for ch in s.chars() {
        if value.push(ch).is_err() {
            break;
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_consistent() {
        for (i, spec) in PARAMETERS.iter().enumerate() {
            assert_eq!(spec.id as usize, i + 1, "id must match position");
            assert!(spec.rules.min_len <= spec.rules.max_len, "{}", spec.label);
            assert!(spec.rules.min <= spec.rules.max, "{}", spec.label);
            assert!(spec.default_value.len() <= VALUE_CAP);
        }
        assert_eq!(PARAMETERS[TIME_INDEX].kind, ParamKind::Time);
        assert_eq!(PARAMETERS[DATE_INDEX].kind, ParamKind::Date);
        assert_eq!(PARAMETERS[PASSWORD_INDEX].kind, ParamKind::Password);
        assert_eq!(
            PARAMETERS[PASSWORD_ENABLE_INDEX].kind,
            ParamKind::EnableDisable
        );
    }

    #[test]
    fn exactly_one_backend_per_parameter() {
        let rtc = PARAMETERS.iter().filter(|p| p.backend == Backend::Rtc);
        let eeprom = PARAMETERS.iter().filter(|p| p.backend == Backend::Eeprom);
        assert_eq!(rtc.count(), 2);
        assert_eq!(eeprom.count(), 1);
    }

    #[test]
    fn navigation_wraps_both_ends() {
        assert_eq!(next_index(PARAM_COUNT - 1), 0);
        assert_eq!(prev_index(0), PARAM_COUNT - 1);
        assert_eq!(next_index(0), 1);
        assert_eq!(prev_index(5), 4);
    }

    #[test]
    fn kv_keys_are_unique() {
        for a in 0..PARAM_COUNT {
            for b in (a + 1)..PARAM_COUNT {
                assert_ne!(kv_key(&PARAMETERS[a]), kv_key(&PARAMETERS[b]));
            }
        }
    }
}
