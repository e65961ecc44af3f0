//! Input events fed to the interaction state machine.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ctrl: false,
        alt: false,
        meta: false,
    };

    /// Ctrl on most platforms, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Keys the state machine reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    Enter,
    Escape,
    Space,
    Delete,
    Backspace,
    Character(char),
    Other,
}

impl Key {
    /// Map a DOM/winit-style key name.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Enter" | "Return" => Key::Enter,
            "Escape" | "Esc" => Key::Escape,
            " " | "Space" => Key::Space,
            "Delete" => Key::Delete,
            "Backspace" => Key::Backspace,
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Key::Character(c),
                    _ => Key::Other,
                }
            }
        }
    }
}

/// One input event. Positions are in screen space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InteractionEvent {
    PointerDown {
        position: Point,
        button: MouseButton,
        modifiers: Modifiers,
    },
    PointerMove {
        position: Point,
        modifiers: Modifiers,
    },
    PointerUp {
        position: Point,
        modifiers: Modifiers,
    },
    /// Sent by the host after the second click of a double click.
    DoubleClick { position: Point },
    KeyDown { key: Key, modifiers: Modifiers },
    KeyUp { key: Key },
    Wheel { position: Point, delta_y: f64 },
    /// Full replacement content of the text being edited.
    TextInput(String),
    /// The text editor lost focus.
    Blur,
}

impl InteractionEvent {
    pub fn pointer_down(position: Point) -> Self {
        InteractionEvent::PointerDown {
            position,
            button: MouseButton::Left,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn pointer_move(position: Point) -> Self {
        InteractionEvent::PointerMove {
            position,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn pointer_up(position: Point) -> Self {
        InteractionEvent::PointerUp {
            position,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn key(key: Key) -> Self {
        InteractionEvent::KeyDown {
            key,
            modifiers: Modifiers::NONE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_names() {
        assert_eq!(Key::from_name("Enter"), Key::Enter);
        assert_eq!(Key::from_name("Esc"), Key::Escape);
        assert_eq!(Key::from_name(" "), Key::Space);
        assert_eq!(Key::from_name("z"), Key::Character('z'));
        assert_eq!(Key::from_name("ArrowLeft"), Key::Other);
    }

    #[test]
    fn test_command_modifier() {
        let mods = Modifiers {
            meta: true,
            ..Default::default()
        };
        assert!(mods.command());
        assert!(!Modifiers::SHIFT.command());
    }
}
