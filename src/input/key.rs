//! Physical keys and modifier flags

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::common::Error;

macro_rules! keys {
    ($($name:ident),+ $(,)?) => {
        /// A physical key on the keyboard
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub enum Key {
            $($name),+
        }

        impl Key {
            /// Every key, in declaration order
            pub const ALL: &'static [Key] = &[$(Key::$name),+];

            /// The key's canonical name, as accepted by `FromStr`
            pub fn name(self) -> &'static str {
                match self {
                    $(Key::$name => stringify!($name)),+
                }
            }
        }
    };
}

keys! {
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,
    D0, D1, D2, D3, D4, D5, D6, D7, D8, D9,
    F1, F2, F3, F4, F5, F6, F7, F8, F9, F10, F11, F12,
    Back, Tab, Enter, Escape, Space,
    PageUp, PageDown, End, Home,
    Left, Up, Right, Down,
    Insert, Delete,
    CapsLock, NumLock, Scroll,
    LeftShift, RightShift,
    LeftCtrl, RightCtrl,
    LeftAlt, RightAlt,
    LWin, RWin, Apps,
    Add, Subtract, Multiply, Divide,
    OemPlus, OemMinus, OemComma, OemPeriod,
}

impl Key {
    /// The modifier flag this key contributes to while held
    ///
    /// Both left and right variants map to the same flag.
    pub fn modifier(self) -> ModifierKeys {
        match self {
            Key::LeftShift | Key::RightShift => ModifierKeys::SHIFT,
            Key::LeftCtrl | Key::RightCtrl => ModifierKeys::CONTROL,
            Key::LeftAlt | Key::RightAlt => ModifierKeys::ALT,
            Key::LWin | Key::RWin => ModifierKeys::WINDOWS,
            _ => ModifierKeys::NONE,
        }
    }

    pub fn is_modifier(self) -> bool {
        !self.modifier().is_empty()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Key {
    type Err = Error;

    /// Case-insensitive lookup by name; single digits map to `D0`..`D9`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let [digit @ b'0'..=b'9'] = trimmed.as_bytes() {
            return Ok(Key::ALL[Key::D0 as usize + usize::from(digit - b'0')]);
        }
        Key::ALL
            .iter()
            .copied()
            .find(|key| key.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| Error::InvalidKey(s.to_string()))
    }
}

bitflags! {
    /// Logical modifier state
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ModifierKeys: u8 {
        const ALT = 0b0001;
        const CONTROL = 0b0010;
        const SHIFT = 0b0100;
        const WINDOWS = 0b1000;
    }
}

/// The physical key pressed on behalf of each modifier, in press order.
///
/// Deliberately not symmetric: Shift is synthesized with the right-hand key.
const CANONICAL_KEYS: [(ModifierKeys, Key); 4] = [
    (ModifierKeys::CONTROL, Key::LeftCtrl),
    (ModifierKeys::ALT, Key::LeftAlt),
    (ModifierKeys::SHIFT, Key::RightShift),
    (ModifierKeys::WINDOWS, Key::LWin),
];

impl ModifierKeys {
    pub const NONE: Self = Self::empty();

    /// Decompose into the physical keys that produce these modifiers
    pub fn canonical_keys(self) -> Vec<Key> {
        CANONICAL_KEYS
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, key)| *key)
            .collect()
    }
}

impl fmt::Display for ModifierKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("None");
        }
        let names: Vec<&str> = [
            (ModifierKeys::CONTROL, "Ctrl"),
            (ModifierKeys::ALT, "Alt"),
            (ModifierKeys::SHIFT, "Shift"),
            (ModifierKeys::WINDOWS, "Win"),
        ]
        .iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, name)| *name)
        .collect();
        f.write_str(&names.join("+"))
    }
}

impl FromStr for ModifierKeys {
    type Err = Error;

    /// Parse `Ctrl+Shift` style combinations; `None` or an empty string is no modifiers
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut modifiers = ModifierKeys::NONE;
        for part in s.split('+').map(str::trim).filter(|p| !p.is_empty()) {
            modifiers |= match part.to_ascii_lowercase().as_str() {
                "none" => ModifierKeys::NONE,
                "shift" => ModifierKeys::SHIFT,
                "ctrl" | "control" => ModifierKeys::CONTROL,
                "alt" => ModifierKeys::ALT,
                "win" | "windows" | "super" => ModifierKeys::WINDOWS,
                _ => return Err(Error::InvalidModifiers(s.to_string())),
            };
        }
        Ok(modifiers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_names_round_trip() {
        for key in Key::ALL {
            assert_eq!(key.name().parse::<Key>().unwrap(), *key);
        }
    }

    #[test]
    fn test_key_parse_is_case_insensitive() {
        assert_eq!("leftctrl".parse::<Key>().unwrap(), Key::LeftCtrl);
        assert_eq!("ENTER".parse::<Key>().unwrap(), Key::Enter);
        assert_eq!("7".parse::<Key>().unwrap(), Key::D7);
        assert!(matches!("Hyper".parse::<Key>(), Err(Error::InvalidKey(_))));
    }

    #[test]
    fn test_canonical_decomposition_order() {
        let all = ModifierKeys::all();
        assert_eq!(
            all.canonical_keys(),
            vec![Key::LeftCtrl, Key::LeftAlt, Key::RightShift, Key::LWin]
        );
        assert!(ModifierKeys::NONE.canonical_keys().is_empty());
        assert_eq!(ModifierKeys::SHIFT.canonical_keys(), vec![Key::RightShift]);
    }

    #[test]
    fn test_key_modifier_mapping() {
        assert_eq!(Key::LeftShift.modifier(), ModifierKeys::SHIFT);
        assert_eq!(Key::RightShift.modifier(), ModifierKeys::SHIFT);
        assert_eq!(Key::RightAlt.modifier(), ModifierKeys::ALT);
        assert_eq!(Key::RWin.modifier(), ModifierKeys::WINDOWS);
        assert!(!Key::A.is_modifier());
    }

    #[test]
    fn test_parse_modifiers() {
        assert_eq!(
            "Ctrl+Shift".parse::<ModifierKeys>().unwrap(),
            ModifierKeys::CONTROL | ModifierKeys::SHIFT
        );
        assert_eq!("none".parse::<ModifierKeys>().unwrap(), ModifierKeys::NONE);
        assert_eq!("".parse::<ModifierKeys>().unwrap(), ModifierKeys::NONE);
        assert!("Ctrl+Hyper".parse::<ModifierKeys>().is_err());
    }

    #[test]
    fn test_modifiers_display() {
        assert_eq!(ModifierKeys::NONE.to_string(), "None");
        assert_eq!(
            (ModifierKeys::SHIFT | ModifierKeys::ALT | ModifierKeys::CONTROL).to_string(),
            "Ctrl+Alt+Shift"
        );
    }
}
