//! Call-site identification and string hashing.
//!
//! Uses 32-bit FNV-1a. These hashes are not cryptographically secure; they
//! identify assertion sites for de-duplication and turn string names into
//! sync-signal ids that are stable across runs and builds.

use std::fmt;
use std::panic::Location;

/// FNV-1a offset basis for 32-bit.
const FNV_OFFSET: u32 = 0x811c_9dc5;
/// FNV-1a prime for 32-bit.
const FNV_PRIME: u32 = 0x0100_0193;
/// Knuth's multiplicative constant, folded in for the line number.
const LINE_MIX: u32 = 2_654_435_761;

#[inline]
fn fnv1a(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .fold(FNV_OFFSET, |h, &b| (h ^ b as u32).wrapping_mul(FNV_PRIME))
}

/// Hash a string to a signal id.
///
/// # Examples
///
/// ```
/// use rewind_core::hash_str;
///
/// assert_eq!(hash_str("Init"), hash_str("Init"));
/// assert_ne!(hash_str("Init"), hash_str("Menu"));
/// ```
pub fn hash_str(s: &str) -> i32 {
    fnv1a(s.as_bytes()) as i32
}

/// Source location of an assertion, sync signal, or Pin/Track call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CallSite {
    /// Source file.
    pub file: &'static str,
    /// 1-based line.
    pub line: u32,
    /// 1-based column.
    pub column: u32,
}

impl CallSite {
    /// The location of the caller of the enclosing `#[track_caller]` chain.
    #[track_caller]
    pub fn caller() -> Self {
        Location::caller().into()
    }

    /// Stable hash of this location.
    pub fn hash(&self) -> u32 {
        let mut h = fnv1a(self.file.as_bytes());
        h ^= self.line.wrapping_mul(LINE_MIX);
        h ^= self.column.wrapping_mul(FNV_PRIME);
        h
    }
}

impl From<&'static Location<'static>> for CallSite {
    fn from(loc: &'static Location<'static>) -> Self {
        Self {
            file: loc.file(),
            line: loc.line(),
            column: loc.column(),
        }
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fnv1a_known_vectors() {
        assert_eq!(fnv1a(b""), FNV_OFFSET);
        assert_eq!(fnv1a(b"a"), 0xe40c_292c);
        assert_eq!(fnv1a(b"foobar"), 0xbf9c_f968);
    }

    #[test]
    fn caller_captures_this_file() {
        let site = CallSite::caller();
        assert!(site.file.ends_with("site.rs"));
        assert!(site.line > 0);
    }

    #[test]
    fn distinct_lines_hash_differently() {
        let a = CallSite::caller();
        let b = CallSite::caller();
        assert_ne!(a, b);
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn display_is_file_line_column() {
        let site = CallSite {
            file: "game.rs",
            line: 12,
            column: 5,
        };
        assert_eq!(site.to_string(), "game.rs:12:5");
    }
}
