//! NXT Direct Command Protocol
//!
//! Encoders for the two direct commands the remote uses. Every frame starts
//! from [`Telegram::new`], so byte 2 is always the "direct command, no reply"
//! type and the opcode follows it.

use crate::infrastructure::bluetooth::telegram::Telegram;
use tracing::trace;

/// RFCOMM channel the brick listens on
pub const RFCOMM_CHANNEL: u8 = 1;

/// Direct command opcodes
pub mod opcode {
    pub const PLAY_TONE: u8 = 0x03;
    pub const SET_OUTPUT_STATE: u8 = 0x04;
}

/// Output mode bits
pub mod mode {
    pub const MOTOR_ON: u8 = 0x01;
    pub const BRAKE: u8 = 0x02;
}

/// Regulation modes
pub mod regulation {
    pub const IDLE: u8 = 0x00;
    pub const MOTOR_SPEED: u8 = 0x01;
}

pub const RUN_STATE_RUNNING: u8 = 0x20;

/// Zero means run until the next command
pub const TACHO_LIMIT_UNLIMITED: u32 = 0;

pub const MAX_POWER: i8 = 100;

/// Tone played by the beep action: 523 Hz for half a second
pub const BEEP_FREQUENCY_HZ: u16 = 523;
pub const BEEP_DURATION_MS: u16 = 500;

/// Output connectors on the brick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputPort {
    A,
    B,
    C,
}

impl OutputPort {
    pub const ALL: [OutputPort; 3] = [OutputPort::A, OutputPort::B, OutputPort::C];

    pub fn as_byte(self) -> u8 {
        match self {
            Self::A => 0x00,
            Self::B => 0x01,
            Self::C => 0x02,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Keep the motor powered at the given power
    Drive,
    /// Stop and hold with the brake
    Brake,
}

/// What one motor should do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotorIntent {
    pub port: OutputPort,
    /// Signed power, sign selects the rotation direction
    pub power: i8,
    pub mode: RunMode,
}

impl MotorIntent {
    pub fn drive(port: OutputPort, power: i8) -> Self {
        Self {
            port,
            power,
            mode: RunMode::Drive,
        }
    }

    pub fn brake(port: OutputPort, power: i8) -> Self {
        Self {
            port,
            power,
            mode: RunMode::Brake,
        }
    }
}

/// Commands the remote can issue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectCommand {
    Motor(MotorIntent),
    Beep,
}

impl DirectCommand {
    pub fn to_telegram(&self) -> Telegram {
        match self {
            Self::Motor(intent) => encode_set_output_state(intent),
            Self::Beep => encode_beep(),
        }
    }
}

/// Encode a SetOutputState direct command
///
/// # Payload (after the opcode)
///
/// ```text
/// [0]    : port
/// [1]    : power (i8, two's complement)
/// [2]    : mode bits
/// [3]    : regulation mode
/// [4]    : turn ratio
/// [5]    : run state
/// [6-9]  : tacho limit (u32 little-endian)
/// ```
///
/// # Panics
///
/// When `intent.power` lies outside `-100..=100`. Clamping belongs to the
/// caller.
pub fn encode_set_output_state(intent: &MotorIntent) -> Telegram {
    assert!(
        (-MAX_POWER..=MAX_POWER).contains(&intent.power),
        "motor power {} out of range",
        intent.power
    );

    let (mode_bits, regulation) = match intent.mode {
        RunMode::Drive => (mode::MOTOR_ON, regulation::IDLE),
        RunMode::Brake => (mode::BRAKE, regulation::MOTOR_SPEED),
    };

    let mut payload = [0u8; 11];
    payload[0] = opcode::SET_OUTPUT_STATE;
    payload[1] = intent.port.as_byte();
    payload[2] = intent.power as u8;
    payload[3] = mode_bits;
    payload[4] = regulation;
    payload[5] = 0x00; // turn ratio
    payload[6] = RUN_STATE_RUNNING;
    payload[7..11].copy_from_slice(&TACHO_LIMIT_UNLIMITED.to_le_bytes());

    build(&payload)
}

/// Encode a PlayTone direct command
pub fn encode_play_tone(frequency_hz: u16, duration_ms: u16) -> Telegram {
    let mut payload = [0u8; 5];
    payload[0] = opcode::PLAY_TONE;
    payload[1..3].copy_from_slice(&frequency_hz.to_le_bytes());
    payload[3..5].copy_from_slice(&duration_ms.to_le_bytes());
    build(&payload)
}

/// The beep bound to the user's beep key
pub fn encode_beep() -> Telegram {
    encode_play_tone(BEEP_FREQUENCY_HZ, BEEP_DURATION_MS)
}

fn build(payload: &[u8]) -> Telegram {
    let mut telegram = Telegram::new();
    // Fixed payloads are far below the body limit
    if let Err(e) = telegram.append_many(payload) {
        unreachable!("fixed-size direct command rejected: {}", e);
    }
    trace!("Encoded telegram: {:02X?}", telegram.as_bytes());
    telegram
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drive_layout() {
        let t = encode_set_output_state(&MotorIntent::drive(OutputPort::B, 85));
        assert_eq!(
            t.as_bytes(),
            &[0x0C, 0x00, 0x80, 0x04, 0x01, 85, 0x01, 0x00, 0x00, 0x20, 0x00, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_brake_layout() {
        let t = encode_set_output_state(&MotorIntent::brake(OutputPort::A, 85));
        assert_eq!(
            t.as_bytes(),
            &[0x0C, 0x00, 0x80, 0x04, 0x00, 85, 0x02, 0x01, 0x00, 0x20, 0x00, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_power_sign_round_trip() {
        let forward = encode_set_output_state(&MotorIntent::drive(OutputPort::C, 60));
        assert_eq!(forward.as_bytes()[5] as i8, 60);

        let reverse = encode_set_output_state(&MotorIntent::drive(OutputPort::C, -60));
        let byte = reverse.as_bytes()[5];
        assert_eq!(byte, 0xC4);
        assert_ne!(byte & 0x80, 0);
        assert_eq!((byte as i8).unsigned_abs(), 60);
    }

    #[test]
    fn test_power_limits_are_accepted() {
        assert_eq!(
            encode_set_output_state(&MotorIntent::drive(OutputPort::A, 100)).as_bytes()[5],
            100
        );
        assert_eq!(
            encode_set_output_state(&MotorIntent::drive(OutputPort::A, -100)).as_bytes()[5],
            0x9C
        );
        // Zero power is a valid coast stop, not a brake
        let coast = encode_set_output_state(&MotorIntent::drive(OutputPort::A, 0));
        assert_eq!(coast.as_bytes()[5], 0);
        assert_eq!(coast.as_bytes()[6], mode::MOTOR_ON);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_power_above_range_panics() {
        encode_set_output_state(&MotorIntent::drive(OutputPort::A, 101));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_power_below_range_panics() {
        encode_set_output_state(&MotorIntent::drive(OutputPort::A, -128));
    }

    #[test]
    fn test_beep_bytes() {
        assert_eq!(
            encode_beep().as_bytes(),
            &[0x06, 0x00, 0x80, 0x03, 0x0B, 0x02, 0xF4, 0x01]
        );
    }

    #[test]
    fn test_port_bytes() {
        let bytes: Vec<u8> = OutputPort::ALL.iter().map(|p| p.as_byte()).collect();
        assert_eq!(bytes, vec![0, 1, 2]);
    }
}
