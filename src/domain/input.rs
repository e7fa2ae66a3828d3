//! Keyboard to motor command translation
//!
//! Ports B and C drive the wheels, port A steers. Left/Right only move
//! port A; the second wheel is left alone.

use crate::infrastructure::bluetooth::protocol::{DirectCommand, MotorIntent, OutputPort};
use tracing::debug;

pub const MIN_POWER_LEVEL: u8 = 50;
pub const MAX_POWER_LEVEL: u8 = 100;
pub const DEFAULT_NORMAL_POWER: u8 = 85;
pub const DEFAULT_PRECISION_POWER: u8 = 62;

/// Keys the remote reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteKey {
    Movement(MovementKey),
    /// Held down to use the precision power level
    Precision,
    PowerUp,
    PowerDown,
    Beep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementKey {
    Forward,
    Backward,
    Left,
    Right,
    /// Port A forward (N)
    AuxForward,
    /// Port A reverse (M)
    AuxReverse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Press,
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: RemoteKey,
    pub action: KeyAction,
    /// Generated by keyboard auto-repeat
    pub repeat: bool,
}

impl KeyEvent {
    pub fn press(key: RemoteKey) -> Self {
        Self {
            key,
            action: KeyAction::Press,
            repeat: false,
        }
    }

    pub fn repeat(key: RemoteKey) -> Self {
        Self {
            key,
            action: KeyAction::Press,
            repeat: true,
        }
    }

    pub fn release(key: RemoteKey) -> Self {
        Self {
            key,
            action: KeyAction::Release,
            repeat: false,
        }
    }
}

/// The two power settings, each kept within 50..=100
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerLevels {
    normal: u8,
    precision: u8,
}

impl PowerLevels {
    pub fn new(normal: u8, precision: u8) -> Self {
        Self {
            normal: clamp_level(normal),
            precision: clamp_level(precision),
        }
    }

    pub fn normal(&self) -> u8 {
        self.normal
    }

    pub fn precision(&self) -> u8 {
        self.precision
    }

    pub fn active(&self, precision: bool) -> u8 {
        if precision {
            self.precision
        } else {
            self.normal
        }
    }

    fn adjust(&mut self, precision: bool, delta: i16) {
        let level = if precision {
            &mut self.precision
        } else {
            &mut self.normal
        };
        *level = clamp_level((*level as i16 + delta).clamp(0, u8::MAX as i16) as u8);
    }
}

impl Default for PowerLevels {
    fn default() -> Self {
        Self::new(DEFAULT_NORMAL_POWER, DEFAULT_PRECISION_POWER)
    }
}

fn clamp_level(level: u8) -> u8 {
    level.clamp(MIN_POWER_LEVEL, MAX_POWER_LEVEL)
}

/// Motor intents for a movement key press, in sending order
pub fn movement_intents(key: MovementKey, levels: &PowerLevels, precision: bool) -> Vec<MotorIntent> {
    // Levels never exceed 100
    let power = levels.active(precision) as i8;
    match key {
        MovementKey::Forward => vec![
            MotorIntent::drive(OutputPort::B, power),
            MotorIntent::drive(OutputPort::C, power),
        ],
        MovementKey::Backward => vec![
            MotorIntent::drive(OutputPort::B, -power),
            MotorIntent::drive(OutputPort::C, -power),
        ],
        MovementKey::Left | MovementKey::AuxReverse => vec![MotorIntent::drive(OutputPort::A, -power)],
        MovementKey::Right | MovementKey::AuxForward => vec![MotorIntent::drive(OutputPort::A, power)],
    }
}

/// Brake every port
pub fn stop_intents(levels: &PowerLevels) -> Vec<MotorIntent> {
    let power = levels.normal() as i8;
    OutputPort::ALL
        .iter()
        .map(|&port| MotorIntent::brake(port, power))
        .collect()
}

/// Turns key events into direct commands
///
/// Releasing any movement key brakes all ports, even if another movement
/// key is still held.
#[derive(Debug, Clone, Default)]
pub struct InputTranslator {
    levels: PowerLevels,
    precision: bool,
}

impl InputTranslator {
    pub fn new(levels: PowerLevels) -> Self {
        Self {
            levels,
            precision: false,
        }
    }

    pub fn levels(&self) -> PowerLevels {
        self.levels
    }

    pub fn precision(&self) -> bool {
        self.precision
    }

    pub fn handle(&mut self, event: KeyEvent) -> Vec<DirectCommand> {
        let commands = match (event.key, event.action) {
            (RemoteKey::PowerUp, KeyAction::Press) => {
                self.levels.adjust(self.precision, 1);
                Vec::new()
            }
            (RemoteKey::PowerDown, KeyAction::Press) => {
                self.levels.adjust(self.precision, -1);
                Vec::new()
            }
            // Everything below ignores auto-repeat
            _ if event.repeat => Vec::new(),
            (RemoteKey::Precision, action) => {
                self.precision = action == KeyAction::Press;
                Vec::new()
            }
            (RemoteKey::Beep, KeyAction::Press) => vec![DirectCommand::Beep],
            (RemoteKey::Movement(key), KeyAction::Press) => {
                movement_intents(key, &self.levels, self.precision)
                    .into_iter()
                    .map(DirectCommand::Motor)
                    .collect()
            }
            (RemoteKey::Movement(_), KeyAction::Release) => stop_intents(&self.levels)
                .into_iter()
                .map(DirectCommand::Motor)
                .collect(),
            _ => Vec::new(),
        };

        if !commands.is_empty() {
            debug!("{:?} -> {} command(s)", event, commands.len());
        }
        commands
    }

    /// Keys seen without a link: only the precision modifier is tracked, so
    /// the mode matches the held keys once a link comes up
    pub fn handle_offline(&mut self, event: KeyEvent) {
        if event.key == RemoteKey::Precision && !event.repeat {
            self.precision = event.action == KeyAction::Press;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::bluetooth::protocol::RunMode;

    fn motors(commands: &[DirectCommand]) -> Vec<MotorIntent> {
        commands
            .iter()
            .map(|c| match c {
                DirectCommand::Motor(intent) => *intent,
                other => panic!("unexpected {:?}", other),
            })
            .collect()
    }

    #[test]
    fn test_forward_press_release_sequence() {
        let mut translator = InputTranslator::new(PowerLevels::new(80, 60));
        let forward = RemoteKey::Movement(MovementKey::Forward);

        let drive = motors(&translator.handle(KeyEvent::press(forward)));
        assert_eq!(
            drive,
            vec![
                MotorIntent::drive(OutputPort::B, 80),
                MotorIntent::drive(OutputPort::C, 80),
            ]
        );

        let stop = motors(&translator.handle(KeyEvent::release(forward)));
        assert_eq!(stop.len(), 3);
        assert!(stop.iter().all(|i| i.mode == RunMode::Brake));
        assert_eq!(
            stop.iter().map(|i| i.port).collect::<Vec<_>>(),
            OutputPort::ALL.to_vec()
        );
    }

    #[test]
    fn test_precision_only_affects_later_presses() {
        let mut translator = InputTranslator::new(PowerLevels::new(80, 60));
        let forward = RemoteKey::Movement(MovementKey::Forward);

        let first = motors(&translator.handle(KeyEvent::press(forward)));
        translator.handle(KeyEvent::release(forward));
        translator.handle(KeyEvent::press(RemoteKey::Precision));
        let second = motors(&translator.handle(KeyEvent::press(forward)));

        assert_eq!(first[0].power, 80);
        assert_eq!(second[0].power, 60);

        translator.handle(KeyEvent::release(RemoteKey::Precision));
        let third = motors(&translator.handle(KeyEvent::press(forward)));
        assert_eq!(third[0].power, 80);
    }

    #[test]
    fn test_precision_release_without_link_is_remembered() {
        let mut translator = InputTranslator::new(PowerLevels::new(80, 60));
        let forward = RemoteKey::Movement(MovementKey::Forward);

        translator.handle(KeyEvent::press(RemoteKey::Precision));
        assert!(translator.precision());

        // Link down: Alt released, other keys have no effect
        translator.handle_offline(KeyEvent::release(RemoteKey::Precision));
        translator.handle_offline(KeyEvent::press(RemoteKey::PowerUp));
        assert!(!translator.precision());
        assert_eq!(translator.levels(), PowerLevels::new(80, 60));

        // Link back up
        let commands = motors(&translator.handle(KeyEvent::press(forward)));
        assert_eq!(commands[0].power, 80);
    }

    #[test]
    fn test_directions() {
        let levels = PowerLevels::new(70, 55);
        let back = movement_intents(MovementKey::Backward, &levels, false);
        assert!(back.iter().all(|i| i.power == -70));

        assert_eq!(
            movement_intents(MovementKey::Left, &levels, false),
            vec![MotorIntent::drive(OutputPort::A, -70)]
        );
        assert_eq!(
            movement_intents(MovementKey::Right, &levels, true),
            vec![MotorIntent::drive(OutputPort::A, 55)]
        );
        assert_eq!(
            movement_intents(MovementKey::AuxForward, &levels, false),
            vec![MotorIntent::drive(OutputPort::A, 70)]
        );
        assert_eq!(
            movement_intents(MovementKey::AuxReverse, &levels, false),
            vec![MotorIntent::drive(OutputPort::A, -70)]
        );
    }

    #[test]
    fn test_stop_uses_normal_level_even_in_precision() {
        let mut translator = InputTranslator::new(PowerLevels::new(90, 50));
        translator.handle(KeyEvent::press(RemoteKey::Precision));
        let key = RemoteKey::Movement(MovementKey::Left);
        translator.handle(KeyEvent::press(key));
        let stop = motors(&translator.handle(KeyEvent::release(key)));
        assert!(stop.iter().all(|i| i.power == 90));
    }

    #[test]
    fn test_auto_repeat_ignored_for_movement() {
        let mut translator = InputTranslator::default();
        let key = RemoteKey::Movement(MovementKey::Forward);
        assert_eq!(translator.handle(KeyEvent::press(key)).len(), 2);
        assert!(translator.handle(KeyEvent::repeat(key)).is_empty());
        assert!(translator.handle(KeyEvent::repeat(RemoteKey::Beep)).is_empty());
    }

    #[test]
    fn test_power_keys_respond_to_repeat_and_clamp() {
        let mut translator = InputTranslator::new(PowerLevels::new(98, 51));
        translator.handle(KeyEvent::press(RemoteKey::PowerUp));
        translator.handle(KeyEvent::repeat(RemoteKey::PowerUp));
        translator.handle(KeyEvent::repeat(RemoteKey::PowerUp));
        assert_eq!(translator.levels().normal(), 100);

        translator.handle(KeyEvent::press(RemoteKey::Precision));
        translator.handle(KeyEvent::press(RemoteKey::PowerDown));
        translator.handle(KeyEvent::repeat(RemoteKey::PowerDown));
        assert_eq!(translator.levels().precision(), 50);
        assert_eq!(translator.levels().normal(), 100);
    }

    #[test]
    fn test_power_keys_send_nothing() {
        let mut translator = InputTranslator::default();
        assert!(translator.handle(KeyEvent::press(RemoteKey::PowerUp)).is_empty());
        assert!(translator.handle(KeyEvent::release(RemoteKey::PowerUp)).is_empty());
        assert!(translator.handle(KeyEvent::press(RemoteKey::Precision)).is_empty());
    }

    #[test]
    fn test_beep() {
        let mut translator = InputTranslator::default();
        assert_eq!(
            translator.handle(KeyEvent::press(RemoteKey::Beep)),
            vec![DirectCommand::Beep]
        );
        assert!(translator.handle(KeyEvent::release(RemoteKey::Beep)).is_empty());
    }

    #[test]
    fn test_levels_are_clamped_on_construction() {
        let levels = PowerLevels::new(120, 10);
        assert_eq!(levels.normal(), MAX_POWER_LEVEL);
        assert_eq!(levels.precision(), MIN_POWER_LEVEL);
        assert_eq!(PowerLevels::default(), PowerLevels::new(85, 62));
    }
}
