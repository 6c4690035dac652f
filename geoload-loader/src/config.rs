use geoload_config::load_config;
use geoload_config::shared::LoaderConfig;

use crate::error::{LoaderError, LoaderResult};

/// Loads the loader configuration.
///
/// Uses the standard configuration loading mechanism from [`geoload_config`], which also
/// validates the resulting [`LoaderConfig`].
pub fn load_loader_config() -> LoaderResult<LoaderConfig> {
    load_config::<LoaderConfig>().map_err(LoaderError::config)
}
