pub mod app;
pub mod components;
pub mod keyboard;
pub mod labels;
