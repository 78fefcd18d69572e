// Weekly Schedule Library
// Exports all modules for testing and reuse

pub mod app;
pub mod models;
pub mod services;
pub mod utils;
