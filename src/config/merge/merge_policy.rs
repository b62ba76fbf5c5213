//! Merge rules: defaults, override order, conflict handling.
//!
//! Later sources win key by key. Lists (passel members, application URIs) are replaced
//! whole, never concatenated across sources.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("server.bind_address", "0.0.0.0")?
        .set_default("server.port", 8080)?
        .set_default("server.cors_allowed", "*")?
        .set_default("storage.path", ".possum/store")
}
