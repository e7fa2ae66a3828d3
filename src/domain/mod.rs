pub mod input;
pub mod models;
pub mod recents;
pub mod settings;
