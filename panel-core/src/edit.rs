//! Keystroke accumulation while a parameter is being edited.
//!
//! The buffer holds raw keystrokes (digits, at most one decimal point, an
//! optional leading sign); rendering and separator insertion happen in
//! [`crate::format`]. Discarded on submit, cancel, delete-to-empty, or
//! when the menu exits.

use crate::params::{ParamKind, Rules, VALUE_CAP};

#[derive(Debug, Default)]
pub struct EditBuffer {
    buf: heapless::String<VALUE_CAP>,
}

impl EditBuffer {
    pub const fn new() -> Self {
        Self {
            buf: heapless::String::new(),
        }
    }

    pub fn as_str(&self) -> &str {
        self.buf.as_str()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Append a digit, bounded by the rule's maximum input length.
    pub fn push_digit(&mut self, digit: char, rules: &Rules) -> bool {
        if !digit.is_ascii_digit() || self.buf.len() >= rules.max_len as usize {
            return false;
        }
        self.buf.push(digit).is_ok()
    }

    /// Append the decimal point. Only decimal-typed parameters take one,
    /// and only once.
    pub fn push_decimal_point(&mut self, kind: ParamKind, rules: &Rules) -> bool {
        if kind != ParamKind::Decimal
            || self.buf.contains('.')
            || self.buf.len() >= rules.max_len as usize
        {
            return false;
        }
        self.buf.push('.').is_ok()
    }

    /// Toggle a leading minus sign in place. Only parameters whose rule
    /// allows negative values take one; an empty buffer starts with the
    /// sign alone.
    pub fn toggle_sign(&mut self, rules: &Rules) -> bool {
        if !rules.allow_negative {
            return false;
        }
        if self.buf.starts_with('-') {
            let mut without: heapless::String<VALUE_CAP> = heapless::String::new();
            let _ = without.push_str(&self.buf[1..]);
            self.buf = without;
            true
        } else if self.buf.len() < rules.max_len as usize {
            let mut with: heapless::String<VALUE_CAP> = heapless::String::new();
            let _ = with.push('-');
            let _ = with.push_str(self.buf.as_str());
            self.buf = with;
            true
        } else {
            false
        }
    }

    /// Remove the last keystroke. Returns `false` when already empty.
    pub fn backspace(&mut self) -> bool {
        self.buf.pop().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::PARAMETERS;

    fn rules_of(label: &str) -> (ParamKind, Rules) {
        let spec = PARAMETERS
            .iter()
            .find(|p| p.label.contains(label))
            .expect("parameter in table");
        (spec.kind, spec.rules)
    }

    #[test]
    fn digits_respect_the_length_limit() {
        let (_, rules) = rules_of("OC %");
        let mut edit = EditBuffer::new();
        assert!(edit.push_digit('1', &rules));
        assert!(edit.push_digit('2', &rules));
        assert!(edit.push_digit('3', &rules));
        assert!(!edit.push_digit('4', &rules));
        assert_eq!(edit.as_str(), "123");
    }

    #[test]
    fn second_decimal_point_is_rejected() {
        let (kind, rules) = rules_of("Hi Volt");
        let mut edit = EditBuffer::new();
        edit.push_digit('2', &rules);
        assert!(edit.push_decimal_point(kind, &rules));
        edit.push_digit('5', &rules);
        assert!(!edit.push_decimal_point(kind, &rules));
        assert_eq!(edit.as_str(), "2.5");
    }

    #[test]
    fn decimal_point_only_for_decimal_parameters() {
        let (kind, rules) = rules_of("OC %");
        let mut edit = EditBuffer::new();
        edit.push_digit('5', &rules);
        assert!(!edit.push_decimal_point(kind, &rules));
    }

    #[test]
    fn sign_toggles_in_place() {
        let (_, rules) = rules_of("BackSet");
        let mut edit = EditBuffer::new();
        edit.push_digit('9', &rules);
        edit.push_digit('9', &rules);
        assert!(edit.toggle_sign(&rules));
        assert_eq!(edit.as_str(), "-99");
        assert!(edit.toggle_sign(&rules));
        assert_eq!(edit.as_str(), "99");
    }

    #[test]
    fn sign_on_empty_buffer_starts_the_entry() {
        let (_, rules) = rules_of("BackSet");
        let mut edit = EditBuffer::new();
        assert!(edit.toggle_sign(&rules));
        assert_eq!(edit.as_str(), "-");
    }

    #[test]
    fn sign_rejected_where_rule_forbids_it() {
        let (_, rules) = rules_of("OC %");
        let mut edit = EditBuffer::new();
        edit.push_digit('5', &rules);
        assert!(!edit.toggle_sign(&rules));
        assert_eq!(edit.as_str(), "5");
    }

    #[test]
    fn backspace_to_empty() {
        let (_, rules) = rules_of("OC %");
        let mut edit = EditBuffer::new();
        edit.push_digit('7', &rules);
        assert!(edit.backspace());
        assert!(edit.is_empty());
        assert!(!edit.backspace());
    }
}
