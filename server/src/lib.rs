//! Server binary glue: configuration loading and the axum launch sequence.

mod application;
mod settings;

pub use application::launch;
pub use settings::Settings;
