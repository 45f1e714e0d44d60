use std::env;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{self, Path, PathBuf};

use thiserror::Error;
use toml::Value;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("filesystem error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("{0}")]
    Invalid(String),
}

/// Values used when the matching flag is not given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Defaults {
    pub address: Option<String>,
    pub format: Option<String>,
    pub quiet: Option<bool>,
}

pub struct ConfigStore {
    path: PathBuf,
    defaults: Defaults,
}

impl ConfigStore {
    /// Read `config.toml` from the config directory; a missing file yields
    /// empty defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(default_path())
    }

    pub fn load_from(path: PathBuf) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self {
                path,
                defaults: Defaults::default(),
            });
        }
        let content = fs::read_to_string(&path)?;
        let parsed: Value = content.parse::<Value>()?;
        let defaults = parse_value(&parsed)?;
        Ok(Self { path, defaults })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }
}

pub fn default_path() -> PathBuf {
    resolve_config_dir().join("config.toml")
}

fn parse_value(root: &Value) -> Result<Defaults, ConfigError> {
    let mut defaults = Defaults::default();
    let Some(table) = root.get("defaults") else {
        return Ok(defaults);
    };
    let table = table
        .as_table()
        .ok_or_else(|| ConfigError::Invalid("[defaults] must be a table".into()))?;

    for (key, value) in table {
        match key.as_str() {
            "address" => defaults.address = Some(expect_str(key, value)?),
            "format" => defaults.format = Some(expect_str(key, value)?),
            "quiet" => {
                defaults.quiet = Some(value.as_bool().ok_or_else(|| {
                    ConfigError::Invalid(format!("defaults.{key} must be a boolean"))
                })?)
            }
            other => {
                return Err(ConfigError::Invalid(format!(
                    "unknown key defaults.{other}"
                )));
            }
        }
    }
    Ok(defaults)
}

fn expect_str(key: &str, value: &Value) -> Result<String, ConfigError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ConfigError::Invalid(format!("defaults.{key} must be a string")))
}

fn resolve_config_dir() -> PathBuf {
    config_dir_from(env::var_os("NTPTIME_CONFIG_DIR"))
}

/// `NTPTIME_CONFIG_DIR` made absolute, else `<platform config dir>/ntptime`.
fn config_dir_from(override_dir: Option<OsString>) -> PathBuf {
    match override_dir.map(PathBuf::from) {
        Some(dir) => path::absolute(&dir).unwrap_or(dir),
        None => dirs::config_dir()
            .map_or_else(|| PathBuf::from(".ntptime"), |base| base.join("ntptime")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn missing_file_gives_empty_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::load_from(dir.path().join("config.toml")).unwrap();
        assert_eq!(store.defaults(), &Defaults::default());
    }

    #[test]
    fn reads_all_defaults() {
        let (_dir, path) = write_config(
            "[defaults]\naddress = \"time.example:123\"\nformat = \"RFC3339\"\nquiet = true\n",
        );
        let store = ConfigStore::load_from(path.clone()).unwrap();
        assert_eq!(store.path(), path);
        assert_eq!(
            store.defaults(),
            &Defaults {
                address: Some("time.example:123".into()),
                format: Some("RFC3339".into()),
                quiet: Some(true),
            }
        );
    }

    #[test]
    fn rejects_wrong_types_and_unknown_keys() {
        let (_dir, path) = write_config("[defaults]\nquiet = \"yes\"\n");
        assert!(matches!(
            ConfigStore::load_from(path),
            Err(ConfigError::Invalid(_))
        ));

        let (_dir, path) = write_config("[defaults]\ntimeout = 3\n");
        assert!(matches!(
            ConfigStore::load_from(path),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn override_dir_is_made_absolute() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            config_dir_from(Some(dir.path().into())),
            dir.path().to_path_buf()
        );

        let relative = config_dir_from(Some("conf".into()));
        assert!(relative.is_absolute());
        assert!(relative.ends_with("conf"));
    }

    #[test]
    fn platform_dir_is_used_without_override() {
        assert!(config_dir_from(None).ends_with("ntptime"));
    }

    #[test]
    fn rejects_broken_toml() {
        let (_dir, path) = write_config("[defaults\n");
        assert!(matches!(
            ConfigStore::load_from(path),
            Err(ConfigError::Parse(_))
        ));
    }
}
