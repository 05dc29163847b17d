use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Runtime configuration for the serving binary.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServeConfig {
    pub model_path: String,
    pub log_path: String,
    pub host: String,
    pub port: u16,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            model_path: "models/classifier.json".to_string(),
            log_path: "data/predictions.csv".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Layered load: serialized defaults, then `fraudwatch.toml`, then
/// `FRAUDWATCH_`-prefixed environment variables.
pub fn load_config() -> Result<ServeConfig, figment::Error> {
    let figment = Figment::from(Serialized::defaults(ServeConfig::default()))
        .merge(Toml::file("fraudwatch.toml"))
        .merge(Env::prefixed("FRAUDWATCH_"));

    let config: ServeConfig = figment.extract()?;

    if config.model_path.trim().is_empty() {
        return Err(figment::Error::from("model_path must be set".to_string()));
    }
    if config.log_path.trim().is_empty() {
        return Err(figment::Error::from("log_path must be set".to_string()));
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_every_field() {
        figment::Jail::expect_with(|_jail| {
            let config = load_config().expect("defaults should load");
            assert_eq!(config.port, 8000);
            assert_eq!(config.model_path, "models/classifier.json");
            Ok(())
        });
    }

    #[test]
    fn env_overrides_file_and_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("fraudwatch.toml", r#"port = 9100"#)?;
            jail.set_env("FRAUDWATCH_MODEL_PATH", "models/other.json");

            let config = load_config().expect("layered config should load");
            assert_eq!(config.port, 9100);
            assert_eq!(config.model_path, "models/other.json");
            Ok(())
        });
    }

    #[test]
    fn empty_model_path_is_rejected() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("FRAUDWATCH_MODEL_PATH", "  ");
            assert!(load_config().is_err());
            Ok(())
        });
    }
}
