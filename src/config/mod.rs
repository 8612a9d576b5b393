// src/config/mod.rs
pub mod credentials;
pub mod settings;

pub use credentials::Credentials;
pub use settings::Settings;
