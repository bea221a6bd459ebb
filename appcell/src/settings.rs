use config::{Config, ConfigError, Environment, File};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt::Debug;
use std::str::FromStr;
use std::sync::Once;
use crate::{debug, info};

static DOTENV: Once = Once::new();

/// Exports a `.env` file found in the working directory or its parents, at most once per process.
fn load_dotenv() {
    DOTENV.call_once(|| match dotenv::dotenv() {
        Ok(path) => debug!("Exported variables of {}", path.display()),
        Err(e) => debug!("No .env file exported: {}", e),
    });
}

/// Deserializes `path` (any format the `config` crate knows) with `{prefix}__SECTION__KEY`
/// environment variables taking precedence over the file.
pub fn load_config<T>(path: &str, prefix: &str) -> Result<T, ConfigError>
where
    T: DeserializeOwned + Debug,
{
    load_dotenv();
    let overrides = Environment::with_prefix(prefix).separator("__").try_parsing(true);
    let loaded: T = Config::builder()
        .add_source(File::with_name(path))
        .add_source(overrides)
        .build()?
        .try_deserialize()?;
    info!("Loaded {} from {}: {:?}", std::any::type_name::<T>(), path, loaded);
    Ok(loaded)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Memory,
    Redb,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "redb" => Ok(StoreBackend::Redb),
            _ => Err(format!("Invalid value for StoreBackend: {}", s)),
        }
    }
}

impl<'de> serde::Deserialize<'de> for StoreBackend {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        StoreBackend::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub store: StoreSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub enabled: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StoreSettings {
    #[serde(default)]
    pub backend: StoreBackend,
    pub path: Option<String>,
}

impl Settings {
    pub const ENV_PREFIX: &'static str = "APPCELL";

    pub fn new(path: &str) -> Result<Self, ConfigError> {
        let settings: Settings = load_config(path, Self::ENV_PREFIX)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.backend == StoreBackend::Redb && self.store.path.is_none() {
            return Err(ConfigError::Message("store.path is required for the redb backend".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs};

    fn write_config(body: &str) -> String {
        let dir = env::temp_dir().join("appcell").join(format!("settings_{}", rand::random::<u64>()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("appcell.toml");
        fs::write(&path, body).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn parses_backend_case_insensitively() {
        assert_eq!("ReDb".parse::<StoreBackend>(), Ok(StoreBackend::Redb));
        assert_eq!("MEMORY".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert!("sled".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn loads_file_with_defaults() {
        let path = write_config("[store]\nbackend = \"Redb\"\npath = \"/tmp/appcell/state.db\"\n");
        let settings = Settings::new(&path).unwrap();
        assert!(settings.logging.enabled);
        assert_eq!(settings.store.backend, StoreBackend::Redb);
        assert_eq!(settings.store.path.as_deref(), Some("/tmp/appcell/state.db"));
    }

    #[test]
    fn redb_without_path_is_rejected() {
        let path = write_config("[logging]\nenabled = false\n[store]\nbackend = \"redb\"\n");
        assert!(matches!(Settings::new(&path), Err(ConfigError::Message(_))));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(Settings::new("/nonexistent/appcell/settings").is_err());
    }

    #[test]
    fn environment_takes_precedence_over_the_file() {
        let path = write_config("[logging]\nenabled = true\n");
        env::set_var("APPCELLTEST__LOGGING__ENABLED", "false");
        let settings: Settings = load_config(&path, "APPCELLTEST").unwrap();
        env::remove_var("APPCELLTEST__LOGGING__ENABLED");
        assert!(!settings.logging.enabled);
    }
}
