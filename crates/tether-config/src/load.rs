use std::path::Path;

use crate::config::Config;
use crate::error::ConfigError;
use crate::merge::merge_configs;
use crate::validate::validate;

/// Content written into a newly-created default config file.
const DEFAULT_CONFIG_CONTENT: &str = r#"# tether configuration
# Uncomment and edit settings below to override defaults.

# [broker]
# max_sessions = 16
# command_timeout_secs = 5
# connect_timeout_secs = 10
# allowed_hosts = ["localhost", "127.0.0.1", "::1"]

# [sourcemap]
# fetch_http = true
# fetch_timeout_secs = 5

# [log]
# level = "info"
"#;

/// Load and merge configuration.
///
/// 1. Reads the global config from `config_dir/config.toml`.
///    If the file does not exist it is created with commented-out
///    defaults.
/// 2. Optionally reads a project config from
///    `project_dir/.tether/config.toml`.
/// 3. Merges: `Config::default() <- global <- project`.
/// 4. Validates the merged result.
///
/// # Errors
///
/// Returns [`ConfigError`] on I/O failure, parse failure, or
/// validation failure (the first violation).
pub fn load_config(config_dir: &Path, project_dir: Option<&Path>) -> Result<Config, ConfigError> {
    let global_path = config_dir.join("config.toml");

    // Ensure config dir exists
    if !config_dir.exists() {
        std::fs::create_dir_all(config_dir)?;
    }

    // Create the default file on first run.
    if !global_path.exists() {
        std::fs::write(&global_path, DEFAULT_CONFIG_CONTENT)
            .map_err(|e| ConfigError::CreateDefault(e.to_string()))?;
    }

    let mut config = Config::default();

    let global_toml = std::fs::read_to_string(&global_path)?;
    config = merge_configs(&config, &global_toml)?;

    if let Some(project) = project_dir {
        let project_path = project.join(".tether").join("config.toml");
        if project_path.exists() {
            let project_toml = std::fs::read_to_string(&project_path)?;
            config = merge_configs(&config, &project_toml)?;
        }
    }

    validate(&config).map_err(|mut errs| errs.remove(0))?;

    Ok(config)
}
