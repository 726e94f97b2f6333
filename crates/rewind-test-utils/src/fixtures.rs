//! Snapshot builders for scripting input.

use rewind_core::{InputSnapshot, Key};

/// A snapshot with exactly `keys` held.
pub fn held(keys: &[Key]) -> InputSnapshot {
    let mut snap = InputSnapshot::empty();
    for &key in keys {
        snap.set_key(key, true);
    }
    snap
}

/// One snapshot per step, each holding the listed keys.
///
/// `key_script(&[&[Key::A], &[]])` presses A and then releases it.
pub fn key_script(steps: &[&[Key]]) -> Vec<InputSnapshot> {
    steps.iter().map(|keys| held(keys)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_builds_press_release() {
        let script = key_script(&[&[Key::A], &[]]);
        assert_eq!(script.len(), 2);
        assert!(script[0].is_key_down(Key::A));
        assert_eq!(script[1], InputSnapshot::empty());
    }
}
