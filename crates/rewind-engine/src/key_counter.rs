//! Per-tick call ordinals for Pin/Track keys.

use indexmap::IndexMap;

/// Hands out `0, 1, 2, …` per key until the next [`reset`](Self::reset).
///
/// The session resets both counters at the start of every tick, so the Nth
/// call for a key within a tick always gets ordinal `N - 1`.
#[derive(Debug, Default)]
pub struct KeyCounter {
    counts: IndexMap<u32, u32>,
}

impl KeyCounter {
    /// Create an empty counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the next ordinal for `key`.
    pub fn next(&mut self, key: u32) -> u32 {
        let count = self.counts.entry(key).or_insert(0);
        let index = *count;
        *count = count.wrapping_add(1);
        index
    }

    /// Forget every key.
    pub fn reset(&mut self) {
        self.counts.clear();
    }

    /// Number of distinct keys seen since the last reset.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether no key has been seen since the last reset.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals_are_per_key() {
        let mut c = KeyCounter::new();
        assert_eq!(c.next(7), 0);
        assert_eq!(c.next(7), 1);
        assert_eq!(c.next(3), 0);
        assert_eq!(c.next(7), 2);
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn reset_restarts_every_key() {
        let mut c = KeyCounter::new();
        c.next(1);
        c.next(1);
        c.reset();
        assert!(c.is_empty());
        assert_eq!(c.next(1), 0);
    }
}
