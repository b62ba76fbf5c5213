//! Entry points for loading configuration.

use super::merge::builder_with_defaults;
use super::sources::{environment, global_file, workspace_file};
use super::PossumConfig;
use config::ConfigError;
use config::File;
use std::path::Path;

/// Loads `PossumConfig` from the layered sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults, then the user-level file, then workspace files, then the environment
    pub fn load(workspace_root: &Path) -> Result<PossumConfig, ConfigError> {
        let builder = builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = environment::add_to_builder(builder)?;
        builder.build()?.try_deserialize()
    }

    /// Defaults, then exactly the given file, then the environment
    pub fn load_from_file(path: &Path) -> Result<PossumConfig, ConfigError> {
        let builder = builder_with_defaults()?.add_source(File::from(path).required(true));
        let builder = environment::add_to_builder(builder)?;
        builder.build()?.try_deserialize()
    }
}
