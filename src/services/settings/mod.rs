mod service;

pub use service::{resolve_database_path, ConfigService, CONFIG_ENV_VAR};
