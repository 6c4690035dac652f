use std::{
    fmt, io,
    path::{Path, PathBuf},
};

use config::builder::{ConfigBuilder, DefaultState};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::environment::Environment;
use crate::shared::ValidationError;

/// Directory holding the configuration files, relative to the base path.
const CONFIGURATION_DIR: &str = "configuration";

/// Extensions tried, in order, for each configuration file.
const CONFIG_FILE_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// Prefix of environment variable overrides, as in `APP_SOURCE__HOST`.
const ENV_PREFIX: &str = "APP";

/// Separator between nested keys in environment variable overrides.
const ENV_SEPARATOR: &str = "__";

/// Configuration structures that [`load_config`] can produce.
///
/// The loaded value is validated before it is returned, so callers never see a configuration that
/// deserialized but breaks a constraint.
pub trait Config {
    /// Checks constraints that deserialization alone cannot express.
    fn validate(&self) -> Result<(), ValidationError>;
}

/// One of the two files merged by [`load_config_from`].
#[derive(Debug, Clone, Copy)]
enum ConfigFile {
    Base,
    Environment(Environment),
}

impl ConfigFile {
    fn stem(self) -> &'static str {
        match self {
            ConfigFile::Base => "base",
            ConfigFile::Environment(environment) => environment.as_str(),
        }
    }
}

impl fmt::Display for ConfigFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigFile::Base => f.write_str("base configuration"),
            ConfigFile::Environment(environment) => {
                write!(f, "{environment} environment configuration")
            }
        }
    }
}

/// Errors that can occur while loading the configuration.
#[derive(Debug, Error)]
pub enum LoadConfigError {
    #[error("failed to determine the current directory: {0}")]
    CurrentDir(#[source] io::Error),

    #[error("configuration directory `{0}` does not exist")]
    MissingConfigurationDirectory(PathBuf),

    #[error("could not locate the {file} in `{directory}`; attempted: {attempted}")]
    ConfigurationFileMissing {
        file: String,
        directory: PathBuf,
        attempted: String,
    },

    #[error("failed to load the {file} from `{path}`: {source}")]
    ConfigurationFileLoad {
        file: String,
        path: PathBuf,
        source: config::ConfigError,
    },

    /// `APP_ENVIRONMENT` holds an unknown environment name.
    #[error("failed to determine runtime environment: {0}")]
    Environment(#[from] io::Error),

    /// Merging the files and environment variables failed.
    #[error("failed to merge configuration sources: {0}")]
    Merge(#[source] config::ConfigError),

    #[error("failed to deserialize configuration: {0}")]
    Deserialization(#[source] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Validation(#[from] ValidationError),
}

/// Loads and validates the configuration below the current working directory.
///
/// See [`load_config_from`] for the lookup rules.
pub fn load_config<T>() -> Result<T, LoadConfigError>
where
    T: Config + DeserializeOwned,
{
    let base_path = std::env::current_dir().map_err(LoadConfigError::CurrentDir)?;

    load_config_from(&base_path)
}

/// Loads and validates the configuration below `base_path`.
///
/// Merges, later sources winning:
/// 1. `configuration/base.(yaml|yml|json)`
/// 2. `configuration/{dev|prod}.(yaml|yml|json)`, picked by `APP_ENVIRONMENT`
/// 3. `APP_`-prefixed environment variables, with `__` between nested keys
///    (`APP_SOURCE__PASSWORD` sets `source.password`).
pub fn load_config_from<T>(base_path: &Path) -> Result<T, LoadConfigError>
where
    T: Config + DeserializeOwned,
{
    let configuration_directory = base_path.join(CONFIGURATION_DIR);
    if !configuration_directory.is_dir() {
        return Err(LoadConfigError::MissingConfigurationDirectory(
            configuration_directory,
        ));
    }

    let environment = Environment::load()?;

    let mut builder = config::Config::builder();
    for file in [ConfigFile::Base, ConfigFile::Environment(environment)] {
        let path = find_configuration_file(&configuration_directory, file)?;
        builder = builder.add_source(config::File::from(path.clone()));
        check_source(&builder, file, &path)?;
    }

    let settings = builder
        .add_source(config::Environment::with_prefix(ENV_PREFIX).separator(ENV_SEPARATOR))
        .build()
        .map_err(LoadConfigError::Merge)?;

    let config = settings
        .try_deserialize::<T>()
        .map_err(LoadConfigError::Deserialization)?;
    config.validate()?;

    Ok(config)
}

/// Returns the first existing file for `file`, trying each supported extension.
fn find_configuration_file(directory: &Path, file: ConfigFile) -> Result<PathBuf, LoadConfigError> {
    let candidates: Vec<PathBuf> = CONFIG_FILE_EXTENSIONS
        .iter()
        .map(|extension| directory.join(format!("{}.{extension}", file.stem())))
        .collect();

    if let Some(path) = candidates.iter().find(|path| path.is_file()) {
        return Ok(path.clone());
    }

    let attempted = candidates
        .iter()
        .map(|path| format!("`{}`", path.display()))
        .collect::<Vec<_>>()
        .join(", ");

    Err(LoadConfigError::ConfigurationFileMissing {
        file: file.to_string(),
        directory: directory.to_path_buf(),
        attempted,
    })
}

/// Builds the sources added so far to attribute parse errors to the file that caused them.
fn check_source(
    builder: &ConfigBuilder<DefaultState>,
    file: ConfigFile,
    path: &Path,
) -> Result<(), LoadConfigError> {
    builder
        .clone()
        .build()
        .map(|_| ())
        .map_err(|source| LoadConfigError::ConfigurationFileLoad {
            file: file.to_string(),
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct TestConfig {
        name: String,
        batch_size: usize,
    }

    impl Config for TestConfig {
        fn validate(&self) -> Result<(), ValidationError> {
            if self.batch_size == 0 {
                return Err(ValidationError::InvalidFieldValue {
                    field: "batch_size".to_string(),
                    constraint: "must be greater than 0".to_string(),
                });
            }

            Ok(())
        }
    }

    fn write_configuration(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let configuration_dir = dir.path().join(CONFIGURATION_DIR);
        fs::create_dir(&configuration_dir).unwrap();
        for (name, contents) in files {
            fs::write(configuration_dir.join(name), contents).unwrap();
        }

        dir
    }

    #[test]
    fn missing_configuration_directory_is_reported() {
        let dir = tempfile::tempdir().unwrap();

        let err = load_config_from::<TestConfig>(dir.path()).unwrap_err();

        assert!(matches!(
            err,
            LoadConfigError::MissingConfigurationDirectory(_)
        ));
    }

    #[test]
    fn environment_file_overrides_base_file() {
        let dir = write_configuration(&[
            ("base.yaml", "name: counties\nbatch_size: 5\n"),
            ("dev.yaml", "batch_size: 10\n"),
            ("prod.yaml", "batch_size: 10\n"),
        ]);

        let config = load_config_from::<TestConfig>(dir.path()).unwrap();

        assert_eq!(config.name, "counties");
        assert_eq!(config.batch_size, 10);
    }

    #[test]
    fn missing_environment_file_lists_attempted_paths() {
        let dir = write_configuration(&[("base.json", r#"{"name": "counties", "batch_size": 5}"#)]);

        let err = load_config_from::<TestConfig>(dir.path()).unwrap_err();

        let LoadConfigError::ConfigurationFileMissing { attempted, .. } = err else {
            panic!("expected a missing configuration file error, got {err:?}");
        };
        assert!(attempted.contains(".yaml`"));
        assert!(attempted.contains(".json`"));
    }

    #[test]
    fn loaded_configuration_is_validated() {
        let dir = write_configuration(&[
            ("base.yaml", "name: counties\nbatch_size: 0\n"),
            ("dev.yaml", "name: counties\n"),
            ("prod.yaml", "name: counties\n"),
        ]);

        let err = load_config_from::<TestConfig>(dir.path()).unwrap_err();

        assert!(matches!(
            err,
            LoadConfigError::Validation(ValidationError::InvalidFieldValue { .. })
        ));
    }
}
