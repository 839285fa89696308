//! Password session: retry counting and the timed lockout window.
//!
//! Timestamps are plain milliseconds supplied by the caller, so the whole
//! state machine runs on the host for tests. The firmware feeds it
//! `Instant::now().as_millis()`.

use crate::params::Rules;

/// Outcome of one password submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Attempt {
    Granted,
    /// Wrong password; `attempt` of `max` used.
    Rejected { attempt: u8, max: u8 },
    /// Lockout is active; the submission was not evaluated.
    LockedOut { remaining_secs: u32 },
}

/// One authentication session. Created fresh on menu entry when password
/// protection is enabled; reset on exit or inactivity timeout.
#[derive(Debug)]
pub struct AuthSession {
    retries: u8,
    authenticated: bool,
    lockout_since_ms: Option<u64>,
}

impl AuthSession {
    pub const fn new() -> Self {
        Self {
            retries: 0,
            authenticated: false,
            lockout_since_ms: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn is_locked_out(&self) -> bool {
        self.lockout_since_ms.is_some()
    }

    /// Mark the session authenticated without a password round trip (used
    /// when protection is disabled).
    pub fn grant(&mut self) {
        self.authenticated = true;
        self.retries = 0;
    }

    /// Back to not-authenticated, clearing retries and any lockout.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Evaluate one submission. While locked out nothing is compared.
    pub fn submit(&mut self, entered: &str, stored: &str, rules: &Rules, now_ms: u64) -> Attempt {
        if let Some(remaining_secs) = self.lockout_remaining_secs(rules, now_ms) {
            return Attempt::LockedOut { remaining_secs };
        }

        if entered == stored {
            self.authenticated = true;
            self.retries = 0;
            return Attempt::Granted;
        }

        self.retries += 1;
        if self.retries >= rules.max_retries {
            self.lockout_since_ms = Some(now_ms);
            Attempt::LockedOut {
                remaining_secs: rules.lockout_secs as u32,
            }
        } else {
            Attempt::Rejected {
                attempt: self.retries,
                max: rules.max_retries,
            }
        }
    }

    /// Seconds left in the lockout window, or `None` when not locked or
    /// already expired. Remaining time is taken from the deadline with
    /// ceiling division so the countdown never shows a stale second.
    pub fn lockout_remaining_secs(&self, rules: &Rules, now_ms: u64) -> Option<u32> {
        let since = self.lockout_since_ms?;
        let deadline = since + rules.lockout_secs as u64 * 1000;
        if now_ms >= deadline {
            None
        } else {
            Some(((deadline - now_ms).div_ceil(1000)) as u32)
        }
    }

    /// Advance the lockout clock. Returns `true` exactly once, when the
    /// window has elapsed; the retry counter is cleared at that point.
    pub fn poll_lockout(&mut self, rules: &Rules, now_ms: u64) -> bool {
        if self.lockout_since_ms.is_some() && self.lockout_remaining_secs(rules, now_ms).is_none() {
            self.lockout_since_ms = None;
            self.retries = 0;
            true
        } else {
            false
        }
    }
}

impl Default for AuthSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STORED: &str = "00000000";

    fn rules() -> Rules {
        crate::params::PARAMETERS[crate::params::PASSWORD_INDEX].rules
    }

    #[test]
    fn correct_password_grants_and_clears_retries() {
        let mut auth = AuthSession::new();
        assert_eq!(
            auth.submit("11111111", STORED, &rules(), 0),
            Attempt::Rejected { attempt: 1, max: 3 }
        );
        assert_eq!(auth.submit(STORED, STORED, &rules(), 100), Attempt::Granted);
        assert!(auth.is_authenticated());
    }

    #[test]
    fn three_wrong_submissions_lock_out() {
        let mut auth = AuthSession::new();
        auth.submit("1", STORED, &rules(), 0);
        auth.submit("2", STORED, &rules(), 100);
        let third = auth.submit("3", STORED, &rules(), 200);
        assert_eq!(third, Attempt::LockedOut { remaining_secs: 15 });
        assert!(auth.is_locked_out());
    }

    #[test]
    fn no_attempt_is_evaluated_while_locked() {
        let mut auth = AuthSession::new();
        for t in 0..3 {
            auth.submit("bad", STORED, &rules(), t);
        }
        // Even the correct password is not evaluated during lockout.
        let outcome = auth.submit(STORED, STORED, &rules(), 5_000);
        assert!(matches!(outcome, Attempt::LockedOut { .. }));
        assert!(!auth.is_authenticated());
    }

    #[test]
    fn lockout_expires_and_clears_retries() {
        let mut auth = AuthSession::new();
        for t in 0..3 {
            auth.submit("bad", STORED, &rules(), t * 100);
        }
        let locked_at = 200u64;
        assert!(!auth.poll_lockout(&rules(), locked_at + 14_999));
        assert!(auth.poll_lockout(&rules(), locked_at + 15_000));
        assert!(!auth.is_locked_out());
        // Retry counter is back to zero: three fresh attempts are allowed.
        assert_eq!(
            auth.submit("bad", STORED, &rules(), locked_at + 16_000),
            Attempt::Rejected { attempt: 1, max: 3 }
        );
    }

    #[test]
    fn countdown_is_derived_from_the_deadline() {
        let mut auth = AuthSession::new();
        for t in 0..3 {
            auth.submit("bad", STORED, &rules(), t);
        }
        let locked_at = 2u64;
        assert_eq!(auth.lockout_remaining_secs(&rules(), locked_at), Some(15));
        assert_eq!(
            auth.lockout_remaining_secs(&rules(), locked_at + 14_001),
            Some(1)
        );
        assert_eq!(auth.lockout_remaining_secs(&rules(), locked_at + 15_000), None);
    }

    #[test]
    fn reset_returns_to_unauthenticated() {
        let mut auth = AuthSession::new();
        auth.grant();
        assert!(auth.is_authenticated());
        auth.reset();
        assert!(!auth.is_authenticated());
        assert!(!auth.is_locked_out());
    }
}
