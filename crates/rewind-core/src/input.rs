//! Per-tick input snapshot and its platform-independent identifiers.
//!
//! [`InputSnapshot`] bundles every piece of input sampled during one tick:
//! keyboard state, mouse position, wheel, buttons, and a fixed number of
//! gamepad slots. Platform adapters map OS-specific codes to [`Key`] and
//! [`MouseButtons`] at capture and injection time, so recorded traces never
//! contain platform-specific values.

use std::fmt;

/// Value stored in [`InputSnapshot::keys`] for a key that is held down.
pub const KEY_DOWN: u8 = 0x80;

/// Number of gamepad slots carried by every snapshot.
pub const GAMEPAD_SLOTS: usize = 4;

macro_rules! define_keys {
    ($($name:ident),+ $(,)?) => {
        /// Normalized key identifier.
        ///
        /// The discriminant is the index into [`InputSnapshot::keys`] and
        /// [`InputSnapshot::key_repeats`]. `Unknown` (index 0) is never
        /// captured or injected.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u8)]
        #[allow(missing_docs)]
        pub enum Key {
            $($name),+
        }

        impl Key {
            /// Every key in discriminant order.
            pub const ALL: &'static [Key] = &[$(Key::$name),+];
        }
    };
}

define_keys! {
    Unknown,
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,
    Num0, Num1, Num2, Num3, Num4, Num5, Num6, Num7, Num8, Num9,
    F1, F2, F3, F4, F5, F6, F7, F8, F9, F10, F11, F12,
    Up, Down, Left, Right,
    Home, End, PageUp, PageDown, Insert, Delete,
    Backspace, Tab, Enter, Escape, Space, CapsLock,
    LeftShift, RightShift, LeftCtrl, RightCtrl, LeftAlt, RightAlt, LeftSuper, RightSuper,
    Kp0, Kp1, Kp2, Kp3, Kp4, Kp5, Kp6, Kp7, Kp8, Kp9,
    KpDecimal, KpAdd, KpSubtract, KpMultiply, KpDivide, NumLock,
    Minus, Equal, LeftBracket, RightBracket, Backslash, Semicolon,
    Apostrophe, Comma, Period, Slash, Grave,
    PrintScreen, ScrollLock, Pause, Menu,
}

/// Total number of key identifiers, including [`Key::Unknown`].
pub const KEY_COUNT: usize = Key::ALL.len();

impl Key {
    /// Index of this key into the snapshot key arrays.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Look up a key by its array index.
    pub fn from_index(index: usize) -> Option<Key> {
        Key::ALL.get(index).copied()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Bitmask of held mouse buttons.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MouseButtons(pub u8);

impl MouseButtons {
    /// Primary button.
    pub const LEFT: MouseButtons = MouseButtons(1 << 0);
    /// Secondary button.
    pub const RIGHT: MouseButtons = MouseButtons(1 << 1);
    /// Wheel click.
    pub const MIDDLE: MouseButtons = MouseButtons(1 << 2);
    /// Extended button 1 (browser back).
    pub const X1: MouseButtons = MouseButtons(1 << 3);
    /// Extended button 2 (browser forward).
    pub const X2: MouseButtons = MouseButtons(1 << 4);

    /// No buttons held.
    pub const fn empty() -> Self {
        MouseButtons(0)
    }

    /// Whether every bit in `other` is set.
    pub fn contains(self, other: MouseButtons) -> bool {
        self.0 & other.0 == other.0
    }

    /// Set the bits in `other`.
    pub fn insert(&mut self, other: MouseButtons) {
        self.0 |= other.0;
    }

    /// Clear the bits in `other`.
    pub fn remove(&mut self, other: MouseButtons) {
        self.0 &= !other.0;
    }

    /// Bits that differ between `self` and `prev`.
    pub fn changed(self, prev: MouseButtons) -> MouseButtons {
        MouseButtons(self.0 ^ prev.0)
    }
}

/// Bitmask of held gamepad buttons.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct GamepadButtons(pub u16);

impl GamepadButtons {
    /// Whether every bit in `other` is set.
    pub fn contains(self, other: GamepadButtons) -> bool {
        self.0 & other.0 == other.0
    }
}

/// State of one gamepad slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct GamepadState {
    /// Whether a device occupies this slot.
    pub connected: bool,
    /// Held buttons.
    pub buttons: GamepadButtons,
    /// Left stick X axis.
    pub left_x: i16,
    /// Left stick Y axis.
    pub left_y: i16,
    /// Right stick X axis.
    pub right_x: i16,
    /// Right stick Y axis.
    pub right_y: i16,
    /// Left analog trigger.
    pub left_trigger: u8,
    /// Right analog trigger.
    pub right_trigger: u8,
}

/// A key whose held state differs between two snapshots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyChange {
    /// The key that changed.
    pub key: Key,
    /// `true` if the key went down, `false` if it was released.
    pub pressed: bool,
}

/// Everything sampled from the input devices during one tick.
///
/// Two snapshots compare equal exactly when their encoded bytes are equal,
/// which is what the recorder's delta suppression relies on.
///
/// # Examples
///
/// ```
/// use rewind_core::{InputSnapshot, Key};
///
/// let prev = InputSnapshot::empty();
/// let mut next = InputSnapshot::empty();
/// next.set_key(Key::A, true);
///
/// let changes: Vec<_> = next.key_changes(&prev).collect();
/// assert_eq!(changes.len(), 1);
/// assert_eq!(changes[0].key, Key::A);
/// assert!(changes[0].pressed);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct InputSnapshot {
    /// [`KEY_DOWN`] if the key is held, `0` otherwise. Indexed by [`Key`].
    pub keys: [u8; KEY_COUNT],
    /// Auto-repeat key-down events accumulated since the previous tick.
    pub key_repeats: [u8; KEY_COUNT],
    /// Absolute cursor X position in pixels.
    pub mouse_x: i32,
    /// Absolute cursor Y position in pixels.
    pub mouse_y: i32,
    /// Horizontal wheel delta this tick (positive = right).
    pub wheel_x: i32,
    /// Vertical wheel delta this tick (positive = up).
    pub wheel_y: i32,
    /// Held mouse buttons.
    pub mouse_buttons: MouseButtons,
    /// Gamepad slots.
    pub gamepads: [GamepadState; GAMEPAD_SLOTS],
}

impl InputSnapshot {
    /// A snapshot with nothing held and the cursor at the origin.
    pub fn empty() -> Self {
        Self {
            keys: [0; KEY_COUNT],
            key_repeats: [0; KEY_COUNT],
            mouse_x: 0,
            mouse_y: 0,
            wheel_x: 0,
            wheel_y: 0,
            mouse_buttons: MouseButtons::empty(),
            gamepads: [GamepadState::default(); GAMEPAD_SLOTS],
        }
    }

    /// Reset every field to the empty state.
    pub fn clear(&mut self) {
        *self = Self::empty();
    }

    /// Whether `key` is held.
    pub fn is_key_down(&self, key: Key) -> bool {
        self.keys[key.index()] & KEY_DOWN != 0
    }

    /// Press or release `key`.
    pub fn set_key(&mut self, key: Key, down: bool) {
        self.keys[key.index()] = if down { KEY_DOWN } else { 0 };
    }

    /// Keys whose held state differs from `prev`, in [`Key`] order.
    ///
    /// [`Key::Unknown`] is skipped.
    pub fn key_changes<'a>(&'a self, prev: &'a InputSnapshot) -> impl Iterator<Item = KeyChange> + 'a {
        Key::ALL.iter().skip(1).filter_map(move |&key| {
            let now = self.is_key_down(key);
            (now != prev.is_key_down(key)).then_some(KeyChange { key, pressed: now })
        })
    }
}

impl Default for InputSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}
