pub mod config;
pub mod store;

pub use config::{config_dir, default_config_path, Config, ConfigError, CONFIG_FILE_NAME};
pub use store::{load_or_seed, JsonFileStore, MemoryStore, RulesetStore, StoreError};
