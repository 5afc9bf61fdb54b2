//! Chat configuration.
//!
//! Loaded via the `config` crate from an optional `toolchat.toml` in the
//! working directory, overridden by environment variables. Variables come
//! from the process and from an optional `.env` file, with the process
//! winning. Nested keys use `__` as the separator, so `MODEL__NAME` sets
//! `model.name`.
//!
//! See [`ModelConfig`] and [`WeatherConfig`] for the per-service settings.

use serde::Deserialize;
use std::path::Path;
use toolchat_ai::ModelConfig;
use toolchat_core::ApiKey;
use toolchat_integration::WeatherConfig;

/// Settings file read from the working directory when present.
pub const SETTINGS_FILE: &str = "toolchat.toml";

/// `KEY=value` file read from the working directory when present.
pub const ENV_FILE: &str = ".env";

/// Top-level configuration for a chat session.
#[derive(Debug, Deserialize)]
pub struct ChatConfig {
    /// Weather service key. Not checked at startup; a missing key makes
    /// weather lookups report that no data was found.
    #[serde(default)]
    pub openweather_api_key: ApiKey,

    /// Model service key.
    #[serde(default)]
    pub groq_api_key: ApiKey,

    /// Model service settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Weather service settings.
    #[serde(default)]
    pub weather: WeatherConfig,

    /// First message of every transcript.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

fn default_system_prompt() -> String {
    "You are a helpful assistant. Use tools only when the user explicitly asks for weather or math help."
        .to_string()
}

fn environment() -> config::Environment {
    config::Environment::default()
        .separator("__")
        .try_parsing(true)
}

/// Reads `env_file` without touching the process environment. A missing
/// file yields no variables.
fn env_file_vars(env_file: &Path) -> Result<config::Map<String, String>, config::ConfigError> {
    let foreign = |e: dotenvy::Error| config::ConfigError::Foreign(Box::new(e));
    match dotenvy::from_path_iter(env_file) {
        Ok(entries) => entries.collect::<Result<_, _>>().map_err(foreign),
        Err(e) if e.not_found() => Ok(config::Map::new()),
        Err(e) => Err(foreign(e)),
    }
}

/// Environment source holding the `.env` variables overlaid by `process`.
fn layered_environment(
    env_file: &Path,
    process: impl IntoIterator<Item = (String, String)>,
) -> Result<config::Environment, config::ConfigError> {
    let mut vars = env_file_vars(env_file)?;
    vars.extend(process);
    Ok(environment().source(Some(vars)))
}

impl ChatConfig {
    /// Loads configuration from [`SETTINGS_FILE`], [`ENV_FILE`] and the
    /// process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if either file is malformed or a value has the
    /// wrong type.
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = layered_environment(Path::new(ENV_FILE), std::env::vars())?;
        Self::load_from(Path::new(SETTINGS_FILE), env)
    }

    fn load_from(
        settings_file: &Path,
        env: config::Environment,
    ) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from(settings_file).required(false))
            .add_source(env)
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env_with(vars: &[(&str, &str)]) -> config::Environment {
        environment().source(Some(
            vars.iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        ))
    }

    #[test]
    fn defaults_apply_without_settings() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = ChatConfig::load_from(&dir.path().join(SETTINGS_FILE), env_with(&[]))
            .expect("load");

        assert!(config.openweather_api_key.is_empty());
        assert!(config.groq_api_key.is_empty());
        assert_eq!(config.model, ModelConfig::default());
        assert_eq!(config.weather, WeatherConfig::default());
        assert!(config.system_prompt.starts_with("You are a helpful assistant."));
    }

    #[test]
    fn environment_sets_keys_and_nested_values() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = ChatConfig::load_from(
            &dir.path().join(SETTINGS_FILE),
            env_with(&[
                ("OPENWEATHER_API_KEY", "ow-key"),
                ("GROQ_API_KEY", "gsk-key"),
                ("MODEL__NAME", "llama-3.1-8b-instant"),
                ("MODEL__MAX_TOKENS", "256"),
                ("WEATHER__TIMEOUT_SECONDS", "5"),
            ]),
        )
        .expect("load");

        assert_eq!(config.openweather_api_key.expose(), "ow-key");
        assert_eq!(config.groq_api_key.expose(), "gsk-key");
        assert_eq!(config.model.name, "llama-3.1-8b-instant");
        assert_eq!(config.model.max_tokens, 256);
        assert_eq!(config.model.timeout_seconds, 30);
        assert_eq!(config.weather.timeout_seconds, 5);
        assert_eq!(config.weather.units, "metric");
    }

    #[test]
    fn environment_overrides_settings_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(SETTINGS_FILE);
        let mut file = std::fs::File::create(&path).expect("create");
        writeln!(
            file,
            r#"
system_prompt = "Be brief."

[model]
name = "from-file"
base_url = "http://localhost:8080/v1"
"#
        )
        .expect("write");

        let config = ChatConfig::load_from(&path, env_with(&[("MODEL__NAME", "from-env")]))
            .expect("load");

        assert_eq!(config.system_prompt, "Be brief.");
        assert_eq!(config.model.name, "from-env");
        assert_eq!(config.model.base_url, "http://localhost:8080/v1");
    }

    #[test]
    fn env_file_supplies_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let env_file = dir.path().join(ENV_FILE);
        std::fs::write(
            &env_file,
            "# keys\nOPENWEATHER_API_KEY=ow-from-file\nGROQ_API_KEY=\"gsk-from-file\"\nMODEL__NAME=from-dotenv\n",
        )
        .expect("write");

        let env = layered_environment(
            &env_file,
            [("MODEL__NAME".to_string(), "from-process".to_string())],
        )
        .expect("env file");
        let config =
            ChatConfig::load_from(&dir.path().join(SETTINGS_FILE), env).expect("load");

        assert_eq!(config.openweather_api_key.expose(), "ow-from-file");
        assert_eq!(config.groq_api_key.expose(), "gsk-from-file");
        assert_eq!(config.model.name, "from-process");
    }

    #[test]
    fn missing_env_file_is_ignored() {
        let dir = tempfile::tempdir().expect("tempdir");
        let vars = env_file_vars(&dir.path().join(ENV_FILE)).expect("no file is fine");
        assert!(vars.is_empty());
    }

    #[test]
    fn malformed_env_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let env_file = dir.path().join(ENV_FILE);
        std::fs::write(&env_file, "GROQ_API_KEY='unterminated\n").expect("write");

        assert!(env_file_vars(&env_file).is_err());
    }
}
