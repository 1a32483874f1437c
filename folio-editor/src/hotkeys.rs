//! Hotkey actions and their default key bindings
//!
//! Registering the bindings with an input system is the host's job; this
//! module only maps chords such as `Mod-Shift-f` to shell actions.

use crate::{EditorError, EditorResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Shell actions reachable from the keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HotkeyAction {
    /// Save, or ask for a name first (Mod-s)
    Save,
    /// Interrupt running cells (Mod-i)
    Interrupt,
    /// Switch between edit and present mode (Mod-.)
    TogglePresentation,
    /// Reformat every cell (Mod-Shift-f)
    FormatAll,
}

impl HotkeyAction {
    pub fn all() -> [HotkeyAction; 4] {
        [
            HotkeyAction::Save,
            HotkeyAction::Interrupt,
            HotkeyAction::TogglePresentation,
            HotkeyAction::FormatAll,
        ]
    }

    fn default_chord(self) -> &'static str {
        match self {
            HotkeyAction::Save => "Mod-s",
            HotkeyAction::Interrupt => "Mod-i",
            HotkeyAction::TogglePresentation => "Mod-.",
            HotkeyAction::FormatAll => "Mod-Shift-f",
        }
    }
}

/// A key plus modifiers; `Mod` is Ctrl or Cmd depending on the platform
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyChord {
    pub modifier: bool,
    pub shift: bool,
    pub alt: bool,
    /// Lowercased key
    pub key: String,
}

impl KeyChord {
    /// Parse `Mod-Shift-f` style notation
    pub fn parse(chord: &str) -> EditorResult<Self> {
        let invalid = || EditorError::InvalidHotkey(chord.to_string());

        let (modifiers, key) = match chord.rsplit_once('-') {
            // "Mod--" binds the minus key
            Some((rest, "")) if rest.ends_with('-') => (&rest[..rest.len() - 1], "-"),
            Some((rest, key)) => (rest, key),
            None => ("", chord),
        };
        if key.is_empty() || key.chars().any(char::is_whitespace) {
            return Err(invalid());
        }

        let mut parsed = KeyChord {
            modifier: false,
            shift: false,
            alt: false,
            key: key.to_lowercase(),
        };
        if !modifiers.is_empty() {
            for part in modifiers.split('-') {
                let flag = match part {
                    "Mod" | "Ctrl" | "Cmd" => &mut parsed.modifier,
                    "Shift" => &mut parsed.shift,
                    "Alt" => &mut parsed.alt,
                    _ => return Err(invalid()),
                };
                if *flag {
                    return Err(invalid());
                }
                *flag = true;
            }
        }
        Ok(parsed)
    }
}

impl FromStr for KeyChord {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifier {
            f.write_str("Mod-")?;
        }
        if self.shift {
            f.write_str("Shift-")?;
        }
        if self.alt {
            f.write_str("Alt-")?;
        }
        f.write_str(&self.key)
    }
}

/// Chord to action lookup
#[derive(Debug, Clone)]
pub struct HotkeyMap {
    bindings: HashMap<KeyChord, HotkeyAction>,
}

impl HotkeyMap {
    pub fn empty() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Resolve a chord written in `Mod-Shift-f` notation
    pub fn resolve(&self, chord: &str) -> EditorResult<Option<HotkeyAction>> {
        let chord = KeyChord::parse(chord)?;
        Ok(self.bindings.get(&chord).copied())
    }

    /// Bind `chord` to `action`, replacing any previous binding of either
    pub fn bind(&mut self, chord: &str, action: HotkeyAction) -> EditorResult<()> {
        let chord = KeyChord::parse(chord)?;
        self.bindings.retain(|_, bound| *bound != action);
        self.bindings.insert(chord, action);
        Ok(())
    }

    /// Current chord for `action`
    pub fn binding(&self, action: HotkeyAction) -> Option<&KeyChord> {
        self.bindings
            .iter()
            .find(|(_, bound)| **bound == action)
            .map(|(chord, _)| chord)
    }
}

impl Default for HotkeyMap {
    fn default() -> Self {
        let bindings = HotkeyAction::all()
            .into_iter()
            .filter_map(|action| {
                KeyChord::parse(action.default_chord())
                    .ok()
                    .map(|chord| (chord, action))
            })
            .collect();
        Self { bindings }
    }
}
