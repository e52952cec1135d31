use std::path::Path;

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use super::error::Result;

/// Prefix of the environment variables that override configuration keys,
/// e.g. `SAVESYNC_PATHS__REMOTE` for `paths.remote`.
pub const ENV_PREFIX: &str = "SAVESYNC";

/// Configuration file picked up from the working directory when no
/// `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// 远端与本地目录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    pub remote: String,
    pub local: String,
}

/// rsync 调用参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RsyncConfig {
    #[serde(default = "default_rsync_binary")]
    pub binary: String,
    #[serde(default)]
    pub dry_run: bool,
}

fn default_rsync_binary() -> String {
    "rsync".to_string()
}

impl Default for RsyncConfig {
    fn default() -> Self {
        Self {
            binary: default_rsync_binary(),
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Directory of `savesync.log`; the executable's `logs/` directory when unset.
    #[serde(default)]
    pub dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub paths: PathsConfig,
    #[serde(default)]
    pub rsync: RsyncConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Layered configuration: embedded defaults, then a TOML file, then
/// `SAVESYNC_*` environment variables, then explicit overrides.
///
/// Built once at startup and handed down; there is no global instance.
#[derive(Debug, Clone)]
pub struct AppConfig {
    builder: ConfigBuilder<DefaultState>,
    config: config::Config,
}

impl AppConfig {
    /// Defaults plus the optional `./config.toml` and the environment.
    pub fn init(default_config: Option<&str>) -> Result<Self> {
        Self::load(default_config, None)
    }

    /// Like [`AppConfig::init`], but an explicit `config_file` must exist.
    pub fn load(default_config: Option<&str>, config_file: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(contents) = default_config {
            builder = builder.add_source(File::from_str(contents, FileFormat::Toml));
        }

        builder = match config_file {
            Some(path) => builder.add_source(File::from(path).format(FileFormat::Toml).required(true)),
            None => builder.add_source(
                File::from(Path::new(DEFAULT_CONFIG_FILE))
                    .format(FileFormat::Toml)
                    .required(false),
            ),
        };

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        );

        let config = builder.build_cloned()?;
        Ok(Self { builder, config })
    }

    /// Override a single key; wins over every other source.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let builder = self.builder.clone().set_override(key, value)?;
        self.config = builder.build_cloned()?;
        self.builder = builder;
        Ok(())
    }

    pub fn get<'de, T>(&self, key: &str) -> Result<T>
    where
        T: Deserialize<'de>,
    {
        Ok(self.config.get::<T>(key)?)
    }

    /// Deserialize the whole tree into a [`Config`].
    pub fn fetch(&self) -> Result<Config> {
        Ok(self.config.clone().try_deserialize::<Config>()?)
    }
}
