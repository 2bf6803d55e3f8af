//! egui front end: application shell, state, and components.

pub mod app;
pub mod components;
pub mod state;
pub mod theme;

pub use app::MurmurApp;
pub use state::{AppState, VoiceState};
pub use theme::Theme;
