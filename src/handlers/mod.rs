// Handlers module
// HTTP handlers for the REST API

pub mod health;

pub use health::health_check;
