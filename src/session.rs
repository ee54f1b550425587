/*! Interactive-build session record.

At most one active session at a time, auto-expiring after 300 seconds
of inactivity (§3, §4.9). Grounded on
`examples/original_source/command/session_manager.py`'s `Session`
dataclass and `SessionManager.is_expired`/`_clear_expired_sessions`,
collapsed to a single-slot `Option<Session>` since this gateway's
command driver only ever drives one session at a time (unlike the
source's keyed-by-client `SessionManager`, which exists to serve many
concurrent terminals; this design has exactly one).
*/
use std::time::{Duration, Instant};

use crate::catalogue::CommandEntry;
use crate::record::Value;

/// Inactivity timeout after which a session is discarded (§3, §8 scenario 8).
pub const EXPIRY: Duration = Duration::from_secs(300);

/// An in-progress multi-step command build.
#[derive(Debug, Clone)]
pub struct Session {
    /// Command code being built.
    pub cmd_code: u16,
    /// Current step index, 1-based.
    pub current_step: usize,
    /// Total number of steps this command declares.
    pub total_steps: usize,
    /// Field values collected so far, in collection order.
    pub fields_so_far: Vec<(String, Value)>,
    created_at: Instant,
    last_updated_at: Instant,
}

impl Session {
    /// Start a new session for `entry` at step 1.
    #[must_use]
    pub fn start(entry: &CommandEntry) -> Self {
        let now = Instant::now();
        let total_steps = entry.steps.map_or(0, <[_]>::len);
        Session {
            cmd_code: entry.code,
            current_step: 1,
            total_steps,
            fields_so_far: Vec::new(),
            created_at: now,
            last_updated_at: now,
        }
    }

    /// Record new field values and advance to `next_step`, refreshing
    /// the inactivity clock.
    pub fn advance(&mut self, next_step: usize, mut new_fields: Vec<(String, Value)>) {
        self.fields_so_far.append(&mut new_fields);
        self.current_step = next_step;
        self.last_updated_at = Instant::now();
    }

    /// Whether this session has been idle longer than [`EXPIRY`].
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.last_updated_at.elapsed() >= EXPIRY
    }

    /// How long ago this session was created.
    #[must_use]
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Back-date `last_updated_at` so tests can exercise expiry (§8
    /// scenario 8) without a real 300-second sleep.
    #[cfg(test)]
    pub(crate) fn backdate_for_test(&mut self, by: Duration) {
        self.last_updated_at -= by;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::lookup;

    #[test]
    fn fresh_session_is_not_expired() {
        let entry = lookup(0x5F10).unwrap();
        let s = Session::start(entry);
        assert!(!s.is_expired());
        assert_eq!(s.current_step, 1);
    }

    #[test]
    fn advance_appends_fields_and_updates_step() {
        let entry = lookup(0x5F10).unwrap();
        let mut s = Session::start(entry);
        s.advance(2, vec![("control_strategy".to_string(), Value::U8(3))]);
        assert_eq!(s.current_step, 2);
        assert_eq!(s.fields_so_far.len(), 1);
    }
}
