//! Identifier generation.

use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Time-derived identifiers: `<prefix>_<YYYYmmdd>_<HHMMSS>_<seq>`.
///
/// The sequence number is monotonic per generator, so ids minted within the
/// same second stay unique.
#[derive(Debug)]
pub struct IdGenerator {
    prefix: &'static str,
    sequence: AtomicU64,
}

impl IdGenerator {
    pub const fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            sequence: AtomicU64::new(0),
        }
    }

    /// Mint the next identifier.
    pub fn next_id(&self) -> String {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        format!(
            "{}_{}_{:04}",
            self.prefix,
            Utc::now().format("%Y%m%d_%H%M%S"),
            seq
        )
    }

    /// Whether `id` has the shape produced by this generator.
    pub fn matches(&self, id: &str) -> bool {
        let Some(rest) = id
            .strip_prefix(self.prefix)
            .and_then(|r| r.strip_prefix('_'))
        else {
            return false;
        };

        let parts: Vec<&str> = rest.split('_').collect();
        matches!(parts.as_slice(), [date, time, seq]
            if date.len() == 8
                && time.len() == 6
                && seq.len() >= 4
                && [date, time, seq].iter().all(|p| p.bytes().all(|b| b.is_ascii_digit())))
    }
}
