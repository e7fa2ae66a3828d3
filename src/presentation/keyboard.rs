//! egui keyboard events to remote key events

use crate::domain::input::{KeyAction, KeyEvent, MovementKey, RemoteKey};
use eframe::egui;

pub fn map_key(key: egui::Key) -> Option<RemoteKey> {
    use egui::Key;
    let mapped = match key {
        Key::ArrowUp => RemoteKey::Movement(MovementKey::Forward),
        Key::ArrowDown => RemoteKey::Movement(MovementKey::Backward),
        Key::ArrowLeft => RemoteKey::Movement(MovementKey::Left),
        Key::ArrowRight => RemoteKey::Movement(MovementKey::Right),
        Key::N => RemoteKey::Movement(MovementKey::AuxForward),
        Key::M => RemoteKey::Movement(MovementKey::AuxReverse),
        Key::B => RemoteKey::Beep,
        Key::Plus | Key::Equals => RemoteKey::PowerUp,
        Key::Minus => RemoteKey::PowerDown,
        _ => return None,
    };
    Some(mapped)
}

/// Alt arrives as a modifier, so its edges are tracked separately
#[derive(Debug, Default)]
pub struct KeyboardState {
    alt_held: bool,
}

impl KeyboardState {
    /// Translate one frame's input events, in arrival order
    pub fn collect(&mut self, events: &[egui::Event]) -> Vec<KeyEvent> {
        let mut out = Vec::new();
        for event in events {
            if let egui::Event::Key {
                key,
                pressed,
                repeat,
                modifiers,
                ..
            } = event
            {
                self.track_alt(modifiers.alt, &mut out);
                if let Some(remote) = map_key(*key) {
                    out.push(KeyEvent {
                        key: remote,
                        action: if *pressed {
                            KeyAction::Press
                        } else {
                            KeyAction::Release
                        },
                        repeat: *repeat,
                    });
                }
            }
        }
        out
    }

    /// Call with the current modifier state when no key events arrived
    pub fn sync_modifiers(&mut self, modifiers: egui::Modifiers) -> Vec<KeyEvent> {
        let mut out = Vec::new();
        self.track_alt(modifiers.alt, &mut out);
        out
    }

    fn track_alt(&mut self, alt: bool, out: &mut Vec<KeyEvent>) {
        if alt != self.alt_held {
            self.alt_held = alt;
            out.push(if alt {
                KeyEvent::press(RemoteKey::Precision)
            } else {
                KeyEvent::release(RemoteKey::Precision)
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(key: egui::Key, pressed: bool, repeat: bool, alt: bool) -> egui::Event {
        egui::Event::Key {
            key,
            physical_key: None,
            pressed,
            repeat,
            modifiers: egui::Modifiers {
                alt,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_mapping() {
        assert_eq!(
            map_key(egui::Key::ArrowUp),
            Some(RemoteKey::Movement(MovementKey::Forward))
        );
        assert_eq!(map_key(egui::Key::B), Some(RemoteKey::Beep));
        assert_eq!(map_key(egui::Key::Q), None);
    }

    #[test]
    fn test_alt_edges_become_precision_events() {
        let mut state = KeyboardState::default();
        let events = state.collect(&[
            key(egui::Key::ArrowUp, true, false, true),
            key(egui::Key::ArrowUp, true, true, true),
            key(egui::Key::ArrowUp, false, false, false),
        ]);
        assert_eq!(
            events,
            vec![
                KeyEvent::press(RemoteKey::Precision),
                KeyEvent::press(RemoteKey::Movement(MovementKey::Forward)),
                KeyEvent::repeat(RemoteKey::Movement(MovementKey::Forward)),
                KeyEvent::release(RemoteKey::Precision),
                KeyEvent::release(RemoteKey::Movement(MovementKey::Forward)),
            ]
        );
        assert!(state.sync_modifiers(egui::Modifiers::NONE).is_empty());
    }
}
