//! Environment source: POSSUM__SECTION__KEY variables, plus the bare PORT and CORS_ALLOWED
//! variables platform launchers set.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

/// Keys whose environment values are comma-separated lists
const LIST_KEYS: [&str; 2] = ["identity.application_uris", "passel.members"];

/// Add environment overrides to builder. Applied last, so they win over every file.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let mut environment = Environment::with_prefix("POSSUM")
        .separator("__")
        .try_parsing(true)
        .list_separator(",");
    for key in LIST_KEYS {
        environment = environment.with_list_parse_key(key);
    }

    builder
        .add_source(environment)
        .set_override_option("server.port", non_empty_var("PORT"))?
        .set_override_option("server.cors_allowed", non_empty_var("CORS_ALLOWED"))
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}
