//! Remote control for a LEGO NXT brick over Bluetooth.
//!
//! - [`domain`] - Key translation, device models, settings
//! - [`infrastructure`] - Telegram framing, command encoding, the brick link
//! - `presentation` - egui front end (feature `gui`)

pub mod domain;
pub mod infrastructure;

#[cfg(feature = "gui")]
pub mod presentation;
