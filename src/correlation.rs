/*! Sequence allocation and outstanding-command correlation (C7).

A single `parking_lot::Mutex` guards both the sequence counter and the
correlation map, per §4.7 ("a single mutex guards both the counter and
the map"). Grounded structurally on
`examples/original_source/command/session_manager.py`'s `SessionManager`
(a similarly mutex-guarded, lock-on-every-op registry), generalized from
sessions to outstanding commands; and on `mode.py`'s `pending_commands`
dict + `pending_lock` in the `Command` mode class, which this type
directly replaces.
*/
use std::collections::HashMap;

use parking_lot::Mutex;

/// One outstanding outbound command awaiting its short-ack.
#[derive(Debug, Clone)]
pub struct Outstanding {
    /// Command code that was sent.
    pub cmd_code: u16,
    /// Human description, for status reporting.
    pub description: String,
    /// When the command was sent (seconds since an arbitrary epoch, as
    /// supplied by the caller — kept caller-stamped so this module
    /// never needs wall-clock access itself).
    pub sent_at: u64,
    /// Whether the short-ack has arrived.
    pub ack_received: bool,
}

/// The correlation table: sequence counter plus outstanding-command map.
///
/// No retransmission and no timeout-driven reaping (§4.7): an entry
/// persists until acked or the process exits.
#[derive(Default)]
pub struct Correlation {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    seq: u8,
    outstanding: HashMap<u8, Outstanding>,
}

impl Correlation {
    /// Create an empty table with the counter starting at 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next sequence number: `(cur + 1) & 0xFF` (P6),
    /// wrapping 0 to 255 back to 0.
    pub fn next_seq(&self) -> u8 {
        let mut inner = self.inner.lock();
        inner.seq = inner.seq.wrapping_add(1);
        inner.seq
    }

    /// Record `info` as outstanding under `seq`. (I6: allocation and
    /// removal are mutually exclusive under the same lock as `next_seq`.)
    pub fn register(&self, seq: u8, info: Outstanding) {
        self.inner.lock().outstanding.insert(seq, info);
    }

    /// Remove and return the outstanding entry for `seq`, if any
    /// (called when a matching short-ack arrives).
    pub fn ack(&self, seq: u8) -> Option<Outstanding> {
        self.inner.lock().outstanding.remove(&seq)
    }

    /// Snapshot of every currently outstanding command, for the
    /// interactive driver's `status` command.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(u8, Outstanding)> {
        self.inner
            .lock()
            .outstanding
            .iter()
            .map(|(seq, info)| (*seq, info.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_wraps_at_256() {
        let c = Correlation::new();
        for _ in 0..255 {
            c.next_seq();
        }
        assert_eq!(c.next_seq(), 0);
        assert_eq!(c.next_seq(), 1);
    }

    #[test]
    fn sequence_never_repeats_within_a_window() {
        let c = Correlation::new();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..256 {
            assert!(seen.insert(c.next_seq()));
        }
    }

    #[test]
    fn register_and_ack_round_trip() {
        let c = Correlation::new();
        let seq = c.next_seq();
        c.register(
            seq,
            Outstanding {
                cmd_code: 0x5F10,
                description: "control strategy set".to_string(),
                sent_at: 0,
                ack_received: false,
            },
        );
        assert_eq!(c.snapshot().len(), 1);
        let acked = c.ack(seq).unwrap();
        assert_eq!(acked.cmd_code, 0x5F10);
        assert!(c.snapshot().is_empty());
    }

    #[test]
    fn ack_of_unknown_seq_is_none() {
        let c = Correlation::new();
        assert!(c.ack(42).is_none());
    }
}
