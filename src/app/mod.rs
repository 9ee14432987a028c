//! Application layer: configuration and the controller that owns all state.

pub mod config;
pub mod controller;

// Re-export commonly used items
pub use config::AppConfig;
pub use controller::AppController;
