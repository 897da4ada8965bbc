// Presentation layer - HTTP handlers for the UI
pub mod app_state;
pub mod handlers;
