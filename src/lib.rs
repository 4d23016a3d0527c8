// Library exports for ai-terminal
// This allows the modules to be imported in tests and external code

pub mod auth;
pub mod config;
pub mod gateway;
pub mod terminal;
