mod loader;
mod settings;

pub use loader::{load_config, CurldiffConfig, LoadedConfig, CONFIG_FILE};
pub use settings::{load_env_file, EnvMap, Settings, SettingsBuilder, TOKEN_VAR};
